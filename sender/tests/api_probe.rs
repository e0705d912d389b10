//! Live-endpoint probe. Requires a reachable EMS API, so it is ignored by
//! default. Run with:
//!
//!   EMS_API_URL=https://... cargo test -p sender --test api_probe -- --ignored

use std::time::Duration;

use sender::model::{Envelope, MeterReadings, Reading};
use sender::send::ApiClient;

fn canned_reading(name: &str, kwh: f64) -> Reading {
    Reading {
        name: name.to_string(),
        vrn: 231.45,
        vyn: 233.12,
        vbn: 229.78,
        vry: 400.89,
        vyb: 403.26,
        vbr: 398.51,
        ir: 25.34,
        iy: 26.12,
        ib: 24.87,
        kw_r: 5.87,
        kw_y: 6.09,
        kw_b: 5.71,
        pf_r: 0.92,
        pf_y: 0.91,
        pf_b: 0.93,
        freq: 50.12,
        kwh,
        kvah: (kwh * 1.1 * 100.0).round() / 100.0,
        kvarh: (kwh * 0.35 * 100.0).round() / 100.0,
    }
}

fn canned_envelope(device_id: &str) -> Envelope {
    Envelope {
        id: device_id.to_string(),
        status: "Online".to_string(),
        signal: 85,
        location: "TECHNODE OFFICE".to_string(),
        data: MeterReadings {
            mfm1: canned_reading("MFM-1", 1250.5),
            mfm2: canned_reading("MFM-2", 2100.8),
        },
        ts: "2025-10-26T10:30:00".to_string(),
        dt: "EMS".to_string(),
    }
}

#[tokio::test]
#[ignore]
async fn probe_live_endpoint() {
    let api_url = std::env::var("EMS_API_URL").expect("set EMS_API_URL to run this test");
    let device_id =
        std::env::var("EMS_DEVICE_ID").unwrap_or_else(|_| "TN-862360078628612".to_string());

    let client = ApiClient::new(&api_url, Duration::from_secs(30)).unwrap();
    let outcome = client.send(&canned_envelope(&device_id)).await;

    println!("Probe outcome: {}", serde_json::to_string_pretty(&outcome).unwrap());
    assert!(
        outcome.success,
        "endpoint rejected probe: {}",
        outcome.error.as_deref().unwrap_or("unknown")
    );
}
