use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;

const LEVEL_MIN: f64 = 0.0;
const LEVEL_MAX: f64 = 100.0;
const LOW_LEVEL: f64 = 30.0;
const HIGH_LEVEL: f64 = 80.0;
const PUMP_START_LEVEL: f64 = 35.0;
const PUMP_STOP_LEVEL: f64 = 85.0;
const MALFORMED_TIMESTAMP_RATE: f64 = 0.03;

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DAY_FIRST_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
pub const MALFORMED_TIMESTAMP: &str = "sem data";

/// Reading in the shape the dashboard polls for
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub id: u64,
    pub leitura: f64,
    pub status: String,
    #[serde(rename = "bombaLigada")]
    pub bomba_ligada: String,
    pub timestamp: String,
}

/// Water tank whose level drains until the pump kicks in.
#[derive(Debug, Clone)]
pub struct TankModel {
    level: f64,
    pump_on: bool,
    next_id: u64,
}

impl TankModel {
    pub fn new(initial_level: f64) -> Self {
        Self {
            level: initial_level.clamp(LEVEL_MIN, LEVEL_MAX),
            pump_on: false,
            next_id: 1,
        }
    }

    pub fn next_reading(&mut self, rng: &mut impl Rng, now: DateTime<Local>) -> Reading {
        // Hysteresis keeps the pump from toggling on every sample
        if self.level < PUMP_START_LEVEL {
            self.pump_on = true;
        } else if self.level > PUMP_STOP_LEVEL {
            self.pump_on = false;
        }

        let drift = if self.pump_on {
            rng.gen_range(1.0..6.0)
        } else {
            rng.gen_range(-5.0..1.0)
        };
        self.level = (self.level + drift).clamp(LEVEL_MIN, LEVEL_MAX);

        let id = self.next_id;
        self.next_id += 1;

        Reading {
            id,
            leitura: (self.level * 100.0).round() / 100.0,
            status: status_for(self.level).to_string(),
            bomba_ligada: if self.pump_on { "Sim" } else { "Não" }.to_string(),
            timestamp: format_timestamp(id, rng, now),
        }
    }
}

fn status_for(level: f64) -> &'static str {
    if level < LOW_LEVEL {
        "Baixo"
    } else if level > HIGH_LEVEL {
        "Alto"
    } else {
        "Normal"
    }
}

// Alternates between the two timestamp shapes the gateway is known to send.
fn format_timestamp(id: u64, rng: &mut impl Rng, now: DateTime<Local>) -> String {
    if rng.gen_bool(MALFORMED_TIMESTAMP_RATE) {
        MALFORMED_TIMESTAMP.to_string()
    } else if id % 2 == 0 {
        now.format(ISO_FORMAT).to_string()
    } else {
        now.format(DAY_FIRST_FORMAT).to_string()
    }
}

/// Bounded buffer of the most recent readings, oldest first.
#[derive(Debug)]
pub struct ReadingBuffer {
    capacity: usize,
    readings: VecDeque<Reading>,
}

impl ReadingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, reading: Reading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn to_vec(&self) -> Vec<Reading> {
        self.readings.iter().cloned().collect()
    }
}
