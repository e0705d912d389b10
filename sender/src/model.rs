use serde::{Deserialize, Serialize};

/// Status literal stamped on every envelope.
pub const STATUS_ONLINE: &str = "Online";

/// Device type tag recognized by the EMS endpoint.
pub const DEVICE_TYPE: &str = "EMS";

/// One meter's synthesized snapshot at a single instant.
///
/// Field names must match the endpoint's schema byte for byte, so every
/// field carries an explicit rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub name: String,
    #[serde(rename = "VRN")]
    pub vrn: f64,
    #[serde(rename = "VYN")]
    pub vyn: f64,
    #[serde(rename = "VBN")]
    pub vbn: f64,
    #[serde(rename = "VRY")]
    pub vry: f64,
    #[serde(rename = "VYB")]
    pub vyb: f64,
    #[serde(rename = "VBR")]
    pub vbr: f64,
    #[serde(rename = "IR")]
    pub ir: f64,
    #[serde(rename = "IY")]
    pub iy: f64,
    #[serde(rename = "IB")]
    pub ib: f64,
    #[serde(rename = "KW-R")]
    pub kw_r: f64,
    #[serde(rename = "KW-Y")]
    pub kw_y: f64,
    #[serde(rename = "KW-B")]
    pub kw_b: f64,
    #[serde(rename = "PF-R")]
    pub pf_r: f64,
    #[serde(rename = "PF-Y")]
    pub pf_y: f64,
    #[serde(rename = "PF-B")]
    pub pf_b: f64,
    #[serde(rename = "Freq")]
    pub freq: f64,
    #[serde(rename = "Kwh")]
    pub kwh: f64,
    #[serde(rename = "KvAh")]
    pub kvah: f64,
    #[serde(rename = "KvArh")]
    pub kvarh: f64,
}

/// Both meter readings, keyed by slot as the endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReadings {
    #[serde(rename = "1")]
    pub mfm1: Reading,
    #[serde(rename = "2")]
    pub mfm2: Reading,
}

/// Per-instant payload posted to the EMS endpoint.
///
/// Constructed fresh per instant, serialized, sent and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Signal")]
    pub signal: u32,
    #[serde(rename = "Location")]
    pub location: String,
    pub data: MeterReadings,
    #[serde(rename = "TS")]
    pub ts: String,
    #[serde(rename = "DT")]
    pub dt: String,
}
