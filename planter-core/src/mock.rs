//! Mock hardware for unit tests

use core::cell::Cell;

use embedded_hal::delay::DelayNs;

use crate::traits::{Clock, MoistureSensor, PumpOutput, SensorError};

/// Clock whose time only moves when told to, or when a delay runs on it
pub struct MockClock {
    now_ns: Cell<u64>,
}

impl MockClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ns: Cell::new(start_ms * 1_000_000),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ns.set(self.now_ns.get() + ms * 1_000_000);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }
}

impl DelayNs for &MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns.set(self.now_ns.get() + ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms as u64);
    }
}

/// Pump output recording the last written levels
pub struct MockOutput {
    pub actuator: bool,
    pub indicator: bool,
    pub writes: u32,
}

impl MockOutput {
    pub fn new() -> Self {
        Self {
            actuator: false,
            indicator: false,
            writes: 0,
        }
    }
}

impl PumpOutput for MockOutput {
    fn set_actuator(&mut self, on: bool) {
        self.actuator = on;
        self.writes += 1;
    }

    fn set_indicator(&mut self, on: bool) {
        self.indicator = on;
        self.writes += 1;
    }
}

/// Sensor returning whatever raw value the test put in the shared cell
pub struct MockSensor<'a> {
    pub raw: &'a Cell<Result<u16, SensorError>>,
}

impl MoistureSensor for MockSensor<'_> {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.raw.get()
    }
}
