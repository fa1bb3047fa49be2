//! Controller façade
//!
//! [`Planter`] ties the pump controller, moisture converter and history
//! aggregator together behind one per-cycle entry point, [`Planter::tick`].
//! Every pump stop, whatever caused it, is recorded in the history.
//!
//! ```ignore
//! let mut planter = Planter::new(relay_pump, probe, clock, PlanterConfig::default());
//!
//! loop {
//!     if planter.tick() {
//!         publish(planter.status());
//!     }
//!     delay.delay_ms(100);
//! }
//! ```

use core::fmt::{self, Write};

use embedded_hal::delay::DelayNs;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{
    AutoWaterConfig, PlanterConfig, SamplingConfig, COARSE_LOG_SIZE, FINE_LOG_SIZE,
};
use crate::history::{HistoryAggregator, Tier};
use crate::moisture::MoistureConverter;
use crate::pump::{PumpController, PumpStop};
use crate::traits::{Clock, MoistureSensor, PumpOutput, SensorError};

/// Read-only snapshot for status publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Status {
    /// Pump currently running
    pub pump_on: bool,
    /// Reservoir timeout latched
    pub timed_out: bool,
    /// Pump starts since the last reset
    pub run_count: u32,
    /// Pump runtime since the last reset (s)
    pub run_time_s: u64,
    /// Time since the pump last stopped (s)
    pub since_last_stop_s: u64,
    /// Time since start-up or the last reset (s)
    pub since_reset_s: u64,
    /// Latest moisture reading (%)
    pub moisture_percent: Option<i32>,
    /// Latest probe fault, cleared by the next good sample
    pub sensor_fault: Option<SensorError>,
}

/// Irrigation controller
///
/// Ring capacities of the history default to [`FINE_LOG_SIZE`] and
/// [`COARSE_LOG_SIZE`].
pub struct Planter<P, S, C, const FINE: usize = FINE_LOG_SIZE, const COARSE: usize = COARSE_LOG_SIZE>
{
    pump: PumpController<P>,
    sensor: S,
    clock: C,
    converter: MoistureConverter,
    history: HistoryAggregator<FINE, COARSE>,
    sampling: SamplingConfig,
    auto_water: AutoWaterConfig,
    /// Time of the last sample attempt
    last_sample_ms: Option<u64>,
    /// Latest converted reading
    last_percent: Option<i32>,
    /// Latest probe fault
    sensor_fault: Option<SensorError>,
}

impl<P, S, C, const FINE: usize, const COARSE: usize> Planter<P, S, C, FINE, COARSE>
where
    P: PumpOutput,
    S: MoistureSensor,
    C: Clock,
{
    /// Create a controller
    ///
    /// The pump is forced off and the first history bucket opens now. The
    /// first tick takes a sample.
    pub fn new(output: P, sensor: S, clock: C, config: PlanterConfig) -> Self {
        let now_ms = clock.now_ms();
        info!(
            "planter start: capacity {} ms, pulse {} ms",
            config.reservoir.capacity_ms(),
            config.reservoir.pulse_ms()
        );

        Self {
            pump: PumpController::new(output, config.reservoir, now_ms),
            sensor,
            clock,
            converter: MoistureConverter::new(config.calibration),
            history: HistoryAggregator::new(config.history, now_ms),
            sampling: config.sampling,
            auto_water: config.auto_water,
            last_sample_ms: None,
            last_percent: None,
            sensor_fault: None,
        }
    }

    /// Run one control cycle
    ///
    /// Samples the probe when the interval has elapsed, checks the pump
    /// against capacity and pulse deadline, starts automatic watering when
    /// due, and rolls the history. Returns true if a sample was recorded or
    /// the pump changed state.
    pub fn tick(&mut self) -> bool {
        let now_ms = self.clock.now_ms();

        let sampled = self.sample_due(now_ms) && self.take_sample(now_ms);

        let stopped = match self.pump.periodic_check(now_ms) {
            Some(stop) => {
                self.record_stop(stop, now_ms);
                true
            }
            None => false,
        };

        let watered = self.check_auto_water(now_ms);

        self.history.tick(now_ms);

        sampled || stopped || watered
    }

    /// Turn the pump on
    ///
    /// Refused while running or timed out. The periodic check stops it once
    /// the reservoir is used up.
    pub fn turn_on(&mut self) -> bool {
        self.pump.turn_on(self.clock.now_ms())
    }

    /// Turn the pump off
    ///
    /// Returns true if a running session ended.
    pub fn turn_off(&mut self) -> bool {
        let now_ms = self.clock.now_ms();
        match self.pump.turn_off(now_ms) {
            Some(stop) => {
                self.record_stop(stop, now_ms);
                true
            }
            None => false,
        }
    }

    /// Start a non-blocking pulse of `duration_ms`
    ///
    /// The pump stops on the first tick at or after the deadline.
    pub fn arm_pulse(&mut self, duration_ms: u32) -> bool {
        self.pump.arm_pulse(duration_ms, self.clock.now_ms())
    }

    /// Reset after refilling the reservoir
    pub fn reset(&mut self) {
        let now_ms = self.clock.now_ms();
        if let Some(stop) = self.pump.reset(now_ms) {
            self.record_stop(stop, now_ms);
        }
    }

    /// Read the probe without recording the sample
    pub fn read_moisture_percent(&mut self) -> Result<i32, SensorError> {
        let raw = self.sensor.read_raw()?;
        Ok(self.converter.percent(raw))
    }

    /// Set the reservoir capacity (ms of pump runtime)
    pub fn set_capacity_ms(&mut self, capacity_ms: u32) -> bool {
        self.pump.set_capacity_ms(capacity_ms)
    }

    /// Set the default pulse duration
    pub fn set_pulse_ms(&mut self, pulse_ms: u32) -> bool {
        self.pump.set_pulse_ms(pulse_ms)
    }

    /// Set the dry calibration point
    pub fn set_dry_raw(&mut self, raw: i32) -> bool {
        self.converter.calibration_mut().set_dry_raw(raw)
    }

    /// Set the saturated calibration point
    pub fn set_sat_raw(&mut self, raw: i32) -> bool {
        self.converter.calibration_mut().set_sat_raw(raw)
    }

    /// Clamp converted readings to 0–100 %
    pub fn set_clamp(&mut self, clamp: bool) {
        self.converter.calibration_mut().set_clamp(clamp);
    }

    /// Set the minimum time between samples
    pub fn set_sample_interval_ms(&mut self, interval_ms: u32) -> bool {
        self.sampling.set_interval_ms(interval_ms)
    }

    /// Set or clear the automatic watering trigger
    pub fn set_auto_water_trigger(&mut self, trigger_percent: Option<i32>) -> bool {
        self.auto_water.set_trigger_percent(trigger_percent)
    }

    /// Set the pause between the last stop and an automatic pulse
    pub fn set_auto_water_cooldown_ms(&mut self, cooldown_ms: u32) -> bool {
        self.auto_water.set_cooldown_ms(cooldown_ms)
    }

    /// Pump controller
    pub fn pump(&self) -> &PumpController<P> {
        &self.pump
    }

    /// History aggregator
    pub fn history(&self) -> &HistoryAggregator<FINE, COARSE> {
        &self.history
    }

    /// Moisture converter
    pub fn converter(&self) -> &MoistureConverter {
        &self.converter
    }

    /// Clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Check if the pump is running
    pub fn is_pump_on(&self) -> bool {
        self.pump.is_running()
    }

    /// Check if the reservoir timeout is latched
    pub fn is_timed_out(&self) -> bool {
        self.pump.is_timed_out()
    }

    /// Pump starts since the last reset
    pub fn run_count(&self) -> u32 {
        self.pump.run_count()
    }

    /// Pump runtime since the last reset (s)
    pub fn run_time_s(&self) -> u64 {
        self.pump.cumulative_run_ms() / 1000
    }

    /// Time since the pump last stopped (s)
    pub fn time_since_last_stop_s(&self) -> u64 {
        self.pump.time_since_last_stop_ms(self.clock.now_ms()) / 1000
    }

    /// Time since start-up or the last reset (s)
    pub fn elapsed_since_reset_s(&self) -> u64 {
        self.pump.elapsed_since_reset_ms(self.clock.now_ms()) / 1000
    }

    /// Latest recorded moisture reading (%)
    pub fn moisture_percent(&self) -> Option<i32> {
        self.last_percent
    }

    /// Latest probe fault, if the last sample failed
    pub fn sensor_fault(&self) -> Option<SensorError> {
        self.sensor_fault
    }

    /// Snapshot of the externally visible state
    pub fn status(&self) -> Status {
        Status {
            pump_on: self.is_pump_on(),
            timed_out: self.is_timed_out(),
            run_count: self.run_count(),
            run_time_s: self.run_time_s(),
            since_last_stop_s: self.time_since_last_stop_s(),
            since_reset_s: self.elapsed_since_reset_s(),
            moisture_percent: self.last_percent,
            sensor_fault: self.sensor_fault,
        }
    }

    /// Render a history tier, newest first
    pub fn render_history<W: Write>(&self, tier: Tier, n_most_recent: usize, out: &mut W) -> fmt::Result {
        self.history.render_report(tier, n_most_recent, out)
    }

    /// Render the current parameters, one `name<TAB>value` per line
    pub fn render_parameters<W: Write>(&self, out: &mut W) -> fmt::Result {
        let reservoir = self.pump.config();
        let calibration = self.converter.calibration();

        writeln!(out, "Capacity_ms\t{}", reservoir.capacity_ms())?;
        writeln!(out, "Pulse_ms\t{}", reservoir.pulse_ms())?;
        writeln!(out, "Dry_raw\t{}", calibration.dry_raw())?;
        writeln!(out, "Sat_raw\t{}", calibration.sat_raw())?;
        writeln!(out, "Clamp\t{}", if calibration.clamp() { "on" } else { "off" })?;
        writeln!(out, "Sample_ms\t{}", self.sampling.interval_ms())?;
        match self.auto_water.trigger_percent() {
            Some(trigger) => writeln!(out, "Trigger_pct\t{}", trigger)?,
            None => writeln!(out, "Trigger_pct\t-")?,
        }
        writeln!(out, "Cooldown_ms\t{}", self.auto_water.cooldown_ms())
    }

    fn sample_due(&self, now_ms: u64) -> bool {
        match self.last_sample_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.sampling.interval_ms() as u64,
            None => true,
        }
    }

    fn take_sample(&mut self, now_ms: u64) -> bool {
        self.last_sample_ms = Some(now_ms);

        match self.sensor.read_raw() {
            Ok(raw) => {
                let percent = self.converter.percent(raw);
                self.history.record_sample(percent, now_ms);
                self.last_percent = Some(percent);
                self.sensor_fault = None;
                true
            }
            Err(e) => {
                if self.sensor_fault != Some(e) {
                    warn!("moisture probe fault: {:?}", e);
                }
                self.sensor_fault = Some(e);
                false
            }
        }
    }

    /// Arm a default pulse when the soil is dry enough
    ///
    /// Suspended while the probe is faulted; the last good reading is stale.
    fn check_auto_water(&mut self, now_ms: u64) -> bool {
        let Some(trigger) = self.auto_water.trigger_percent() else {
            return false;
        };
        if self.sensor_fault.is_some() {
            return false;
        }
        let Some(percent) = self.last_percent else {
            return false;
        };

        if percent > trigger || !self.pump.state().start_allowed() {
            return false;
        }
        if self.pump.time_since_last_stop_ms(now_ms) < self.auto_water.cooldown_ms() as u64 {
            return false;
        }

        let before = self.pump.state();
        if self.pump.arm_pulse(self.pump.config().pulse_ms(), now_ms) {
            info!("auto water: {}% <= {}%, pulse armed", percent, trigger);
        }
        self.pump.state() != before
    }

    fn record_stop(&mut self, stop: PumpStop, now_ms: u64) {
        self.history.record_pump_stop(stop.run_ms, now_ms);
        if stop.timed_out {
            info!("reservoir empty after {} pump runs", self.pump.run_count());
        }
    }
}

impl<P, S, C, const FINE: usize, const COARSE: usize> Planter<P, S, C, FINE, COARSE>
where
    P: PumpOutput,
    S: MoistureSensor,
    C: Clock + DelayNs,
{
    /// Run a blocking pulse of the default duration
    pub fn pulse(&mut self) -> bool {
        let duration_ms = self.pump.config().pulse_ms();
        self.pulse_for(duration_ms)
    }

    /// Run a blocking pulse of `duration_ms`, clamped to the pulse limits
    ///
    /// Returns true if the pump ran.
    pub fn pulse_for(&mut self, duration_ms: u32) -> bool {
        match self.pump.pulse(duration_ms, &mut self.clock) {
            Some(stop) => {
                let now_ms = self.clock.now_ms();
                self.record_stop(stop, now_ms);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    use crate::config::{HistoryConfig, ONE_HOUR_MS};
    use crate::mock::{MockClock, MockOutput, MockSensor};

    extern crate std;
    use std::string::String;

    type TestPlanter<'a> = Planter<MockOutput, MockSensor<'a>, &'a MockClock, 4, 2>;

    fn planter<'a>(clock: &'a MockClock, raw: &'a Cell<Result<u16, SensorError>>) -> TestPlanter<'a> {
        let mut config = PlanterConfig::default();
        assert!(config.reservoir.set_capacity_ms(10_000));
        assert!(config.reservoir.set_pulse_ms(2_000));
        config.history = HistoryConfig::new(ONE_HOUR_MS, 2);
        Planter::new(MockOutput::new(), MockSensor { raw }, clock, config)
    }

    #[test]
    fn test_first_tick_samples() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        assert_eq!(planter.moisture_percent(), None);
        assert!(planter.tick());
        assert_eq!(planter.moisture_percent(), Some(50));
        assert_eq!(planter.history().open_bucket().sample_count, 1);
    }

    #[test]
    fn test_sampling_interval() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        assert!(planter.tick());
        clock.advance(500);
        assert!(!planter.tick());
        clock.advance(500);
        assert!(planter.tick());
        assert_eq!(planter.history().open_bucket().sample_count, 2);
    }

    #[test]
    fn test_sensor_fault_skips_sample() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Err(SensorError::Disconnected));
        let mut planter = planter(&clock, &raw);

        assert!(!planter.tick());
        assert_eq!(planter.sensor_fault(), Some(SensorError::Disconnected));
        assert_eq!(planter.history().open_bucket().sample_count, 0);

        raw.set(Ok(1000));
        clock.advance(1_000);
        assert!(planter.tick());
        assert_eq!(planter.sensor_fault(), None);
        assert_eq!(planter.moisture_percent(), Some(100));
    }

    #[test]
    fn test_tick_stops_pump_at_capacity() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);
        planter.tick();

        assert!(planter.turn_on());
        clock.advance(9_999);
        planter.tick();
        assert!(planter.is_pump_on());

        clock.advance(1);
        assert!(planter.tick());
        assert!(!planter.is_pump_on());
        assert!(planter.is_timed_out());
        assert!(!planter.pump().output().actuator);

        let bucket = planter.history().open_bucket();
        assert_eq!(bucket.pump_starts, 1);
        assert_eq!(bucket.pump_run_ms, 10_000);
    }

    #[test]
    fn test_pulse_scenario_through_facade() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        for _ in 0..5 {
            assert!(planter.pulse());
        }
        assert!(planter.is_timed_out());
        assert!(!planter.pulse());
        assert_eq!(planter.pump().cumulative_run_ms(), 10_000);
        assert_eq!(planter.run_time_s(), 10);
        assert_eq!(planter.history().open_bucket().pump_starts, 5);

        assert!(!planter.turn_on());
        assert!(!planter.pump().output().actuator);
    }

    #[test]
    fn test_manual_off_is_recorded() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        planter.turn_on();
        clock.advance(1_500);
        assert!(planter.turn_off());
        assert!(!planter.turn_off());

        assert_eq!(planter.history().open_bucket().pump_run_ms, 1_500);
        clock.advance(4_000);
        assert_eq!(planter.time_since_last_stop_s(), 4);
    }

    #[test]
    fn test_armed_pulse_ends_on_tick() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        assert!(planter.arm_pulse(1_000));
        clock.advance(999);
        planter.tick();
        assert!(planter.is_pump_on());

        clock.advance(1);
        assert!(planter.tick());
        assert!(!planter.is_pump_on());
        assert_eq!(planter.pump().cumulative_run_ms(), 1_000);
    }

    #[test]
    fn test_reset_flushes_and_clears() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        for _ in 0..5 {
            planter.pulse();
        }
        assert!(planter.is_timed_out());

        planter.reset();
        assert!(!planter.is_timed_out());
        assert_eq!(planter.run_count(), 0);
        assert_eq!(planter.run_time_s(), 0);
        assert!(!planter.pump().output().actuator);
        assert!(planter.turn_on());
    }

    #[test]
    fn test_auto_water_respects_trigger_and_cooldown() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(3000)); // 20 %
        let mut planter = planter(&clock, &raw);
        assert!(planter.set_auto_water_trigger(Some(30)));
        assert!(planter.set_auto_water_cooldown_ms(60_000));

        // Cooldown counts from start-up
        planter.tick();
        assert!(!planter.is_pump_on());

        clock.advance(60_000);
        assert!(planter.tick());
        assert!(planter.is_pump_on());

        clock.advance(2_000);
        planter.tick();
        assert!(!planter.is_pump_on());
        assert_eq!(planter.run_count(), 1);

        // Still dry, but cooling down
        clock.advance(30_000);
        planter.tick();
        assert!(!planter.is_pump_on());

        // Wet enough: no pulse
        raw.set(Ok(1500)); // 80 %
        clock.advance(60_000);
        planter.tick();
        assert!(!planter.is_pump_on());
        assert_eq!(planter.run_count(), 1);
    }

    #[test]
    fn test_auto_water_suspended_while_probe_faulted() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(3000)); // 20 %
        let mut planter = planter(&clock, &raw);
        assert!(planter.set_auto_water_trigger(Some(30)));
        assert!(planter.set_auto_water_cooldown_ms(10_000));

        planter.tick();
        raw.set(Err(SensorError::Disconnected));
        for _ in 0..200 {
            clock.advance(1_000);
            planter.tick();
        }

        assert_eq!(planter.sensor_fault(), Some(SensorError::Disconnected));
        assert_eq!(planter.moisture_percent(), Some(20));
        assert_eq!(planter.run_count(), 0);
        assert!(!planter.is_pump_on());

        // A good reading resumes watering
        raw.set(Ok(3000));
        clock.advance(1_000);
        planter.tick();
        assert!(planter.is_pump_on());
    }

    #[test]
    fn test_elapsed_since_reset() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        clock.advance(90_000);
        assert_eq!(planter.elapsed_since_reset_s(), 90);

        planter.reset();
        clock.advance(4_500);
        assert_eq!(planter.status().since_reset_s, 4);
        assert_eq!(planter.status().since_last_stop_s, 94);
    }

    #[test]
    fn test_setters_report_rejection() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        assert!(!planter.set_capacity_ms(400_000));
        assert!(!planter.set_pulse_ms(100));
        assert!(!planter.set_dry_raw(5_000));
        assert!(!planter.set_sat_raw(-5));
        assert!(!planter.set_sample_interval_ms(0));
        assert_eq!(planter.pump().config().capacity_ms(), 10_000);

        assert!(planter.set_dry_raw(3000));
        assert!(planter.set_sat_raw(1000));
        assert_eq!(planter.read_moisture_percent(), Ok(37));
    }

    #[test]
    fn test_history_rolls_over_hours() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);

        for _ in 0..3 {
            planter.tick();
            clock.advance(ONE_HOUR_MS / 2 + 1);
            planter.tick();
            clock.advance(ONE_HOUR_MS / 2 + 1);
        }
        planter.tick();

        assert_eq!(planter.history().fine().len(), 3);
        assert_eq!(planter.history().coarse().len(), 1);

        let mut out = String::new();
        planter.render_history(Tier::Fine, 8, &mut out).unwrap();
        assert_eq!(out.lines().count(), 2 + 1 + 3);
    }

    #[test]
    fn test_status_and_parameters() {
        let clock = MockClock::new(0);
        let raw = Cell::new(Ok(2250));
        let mut planter = planter(&clock, &raw);
        planter.tick();
        planter.pulse();

        let status = planter.status();
        assert!(!status.pump_on);
        assert!(!status.timed_out);
        assert_eq!(status.run_count, 1);
        assert_eq!(status.run_time_s, 2);
        assert_eq!(status.moisture_percent, Some(50));

        let mut out = String::new();
        planter.render_parameters(&mut out).unwrap();
        assert!(out.contains("Capacity_ms\t10000\n"));
        assert!(out.contains("Pulse_ms\t2000\n"));
        assert!(out.contains("Trigger_pct\t-\n"));
    }
}
