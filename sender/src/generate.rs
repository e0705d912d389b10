use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::{Config, INSTANT_FORMAT};
use crate::model::{Envelope, MeterReadings, Reading, DEVICE_TYPE, STATUS_ONLINE};

/// The two multifunction meters behind a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meter {
    Mfm1,
    Mfm2,
}

impl Meter {
    pub fn name(&self) -> &'static str {
        match self {
            Meter::Mfm1 => "MFM-1",
            Meter::Mfm2 => "MFM-2",
        }
    }

    /// Counter value at the schedule start, in kWh.
    fn base_energy(&self) -> f64 {
        match self {
            Meter::Mfm1 => 1250.5,
            Meter::Mfm2 => 2100.8,
        }
    }

    /// Average consumption rate, in kW.
    fn avg_rate(&self) -> f64 {
        match self {
            Meter::Mfm1 => 8.5,
            Meter::Mfm2 => 12.3,
        }
    }
}

/// Phase-to-neutral baselines for the R, Y and B phases, in volts.
const BASE_VOLTAGE: [f64; 3] = [230.0, 232.0, 228.0];

const BUSINESS_HOURS: std::ops::Range<u32> = 9..18;

/// Monday through Saturday, 09:00 to 18:00 local time.
pub fn is_business_hours(t: NaiveDateTime) -> bool {
    t.weekday() != Weekday::Sun && BUSINESS_HOURS.contains(&t.hour())
}

/// Rounds to two decimals, half away from zero.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn hours_since(start: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - start).num_seconds() as f64 / 3600.0
}

fn power(voltage: f64, current: f64) -> f64 {
    round2(voltage * current / 1000.0)
}

/// Energy counter growing linearly from the per-meter baseline. `start` is
/// the schedule's start bound and must be passed in explicitly.
pub fn cumulative_energy(meter: Meter, start: NaiveDateTime, t: NaiveDateTime) -> f64 {
    round2(meter.base_energy() + meter.avg_rate() * hours_since(start, t))
}

/// Local-time wire format, no offset suffix.
pub fn format_instant(t: NaiveDateTime) -> String {
    t.format(INSTANT_FORMAT).to_string()
}

/// Synthesizes meter readings with diurnal and business-hour load patterns
/// plus bounded uniform jitter.
///
/// The same seed replays the same draw sequence, so seeded generators make
/// test output fully deterministic.
pub struct ReadingGenerator {
    rng: StdRng,
}

impl ReadingGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        self.rng.gen_range(min..max)
    }

    /// Phase voltage: daily sine swing around the base plus jitter.
    fn voltage(&mut self, base: f64, t: NaiveDateTime) -> f64 {
        let swing = (f64::from(t.hour()) / 24.0 * std::f64::consts::TAU).sin() * 3.0;
        round2(base + swing + self.uniform(-1.5, 1.5))
    }

    /// Line voltage derived from one phase voltage. Each line draws its own
    /// jitter, so line and phase values only agree approximately.
    fn line_voltage(&mut self, phase: f64) -> f64 {
        round2(phase * 3.0_f64.sqrt() + self.uniform(-2.0, 2.0))
    }

    /// Load current, higher during business hours.
    fn current(&mut self, t: NaiveDateTime) -> f64 {
        if is_business_hours(t) {
            round2(self.uniform(15.0, 45.0))
        } else {
            round2(self.uniform(2.0, 12.0))
        }
    }

    fn power_factor(&mut self, t: NaiveDateTime) -> f64 {
        if is_business_hours(t) {
            round2(self.uniform(0.88, 0.96))
        } else {
            round2(self.uniform(0.85, 0.92))
        }
    }

    fn frequency(&mut self) -> f64 {
        round2(self.uniform(49.85, 50.35))
    }

    /// Signal strength sample, 70 to 94.
    pub fn signal(&mut self) -> u32 {
        self.uniform(70.0, 95.0).floor() as u32
    }

    /// One meter's full snapshot at `t`.
    pub fn reading(&mut self, meter: Meter, start: NaiveDateTime, t: NaiveDateTime) -> Reading {
        let vrn = self.voltage(BASE_VOLTAGE[0], t);
        let vyn = self.voltage(BASE_VOLTAGE[1], t);
        let vbn = self.voltage(BASE_VOLTAGE[2], t);

        let vry = self.line_voltage(vrn);
        let vyb = self.line_voltage(vyn);
        let vbr = self.line_voltage(vbn);

        // Each phase draws its own base current, so the three are only
        // loosely correlated.
        let ir = self.current(t);
        let iy = round2(self.current(t) * self.uniform(0.95, 1.05));
        let ib = round2(self.current(t) * self.uniform(0.95, 1.05));

        let kw_r = power(vrn, ir);
        let kw_y = power(vyn, iy);
        let kw_b = power(vbn, ib);

        let pf_r = self.power_factor(t);
        let pf_y = round2(self.power_factor(t) * self.uniform(0.98, 1.02));
        let pf_b = round2(self.power_factor(t) * self.uniform(0.98, 1.02));

        let freq = self.frequency();

        let kwh = cumulative_energy(meter, start, t);
        let kvah = round2(kwh * 1.1);
        let kvarh = round2(kwh * 0.35);

        Reading {
            name: meter.name().to_string(),
            vrn,
            vyn,
            vbn,
            vry,
            vyb,
            vbr,
            ir,
            iy,
            ib,
            kw_r,
            kw_y,
            kw_b,
            pf_r,
            pf_y,
            pf_b,
            freq,
            kwh,
            kvah,
            kvarh,
        }
    }

    /// Builds the complete envelope for one instant: signal sample first,
    /// then both meter readings.
    pub fn envelope(&mut self, config: &Config, t: NaiveDateTime) -> Envelope {
        let signal = self.signal();
        Envelope {
            id: config.device_id.clone(),
            status: STATUS_ONLINE.to_string(),
            signal,
            location: config.location.clone(),
            data: MeterReadings {
                mfm1: self.reading(Meter::Mfm1, config.start, t),
                mfm2: self.reading(Meter::Mfm2, config.start, t),
            },
            ts: format_instant(t),
            dt: DEVICE_TYPE.to_string(),
        }
    }
}
