//! Pump controller with reservoir timeout
//!
//! Tracks cumulative pump runtime against the reservoir capacity. Once the
//! total reaches capacity the controller latches [`PumpState::TimedOut`]
//! and refuses to start the pump until [`PumpController::reset`] is called,
//! which models someone refilling the reservoir.
//!
//! # Pulses
//!
//! A pulse is clamped to `[MIN_PULSE_MS, MAX_PULSE_MS]` and only starts from
//! [`PumpState::Off`]. If the pulse would push the total past capacity, it
//! does not run and the timeout latches. A pulse that lands exactly on
//! capacity runs, and the stop that follows latches the timeout.
//!
//! [`PumpController::pulse`] blocks on a delay for the whole pulse.
//! [`PumpController::arm_pulse`] starts the pump with a deadline instead and
//! relies on [`PumpController::periodic_check`] to stop it.

use embedded_hal::delay::DelayNs;

use super::state::{PumpState, PumpStop};
use crate::config::ReservoirConfig;
use crate::traits::{Clock, PumpOutput};

/// Pump controller
pub struct PumpController<P> {
    output: P,
    config: ReservoirConfig,
    state: PumpState,
    /// Total runtime since the last reset (ms)
    cumulative_run_ms: u64,
    /// Pump starts since the last reset
    run_count: u32,
    /// Time of the last stop (ms)
    last_stop_ms: u64,
    /// Time of construction or the last reset (ms)
    reset_ms: u64,
}

impl<P: PumpOutput> PumpController<P> {
    /// Create a new pump controller
    ///
    /// The outputs are forced off.
    pub fn new(output: P, config: ReservoirConfig, now_ms: u64) -> Self {
        let mut pump = Self {
            output,
            config,
            state: PumpState::Off,
            cumulative_run_ms: 0,
            run_count: 0,
            last_stop_ms: now_ms,
            reset_ms: now_ms,
        };
        pump.output.set_all(false);
        pump
    }

    /// Get access to the underlying output
    pub fn output(&self) -> &P {
        &self.output
    }

    /// Current reservoir configuration
    pub fn config(&self) -> &ReservoirConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> PumpState {
        self.state
    }

    /// Check if the pump is running
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Check if the reservoir timeout is latched
    pub fn is_timed_out(&self) -> bool {
        self.state.is_timed_out()
    }

    /// Total runtime since the last reset (ms), excluding a running session
    pub fn cumulative_run_ms(&self) -> u64 {
        self.cumulative_run_ms
    }

    /// Pump starts since the last reset
    pub fn run_count(&self) -> u32 {
        self.run_count
    }

    /// Time of the last stop (ms)
    pub fn last_stop_ms(&self) -> u64 {
        self.last_stop_ms
    }

    /// Time since the pump last stopped (ms)
    pub fn time_since_last_stop_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_stop_ms)
    }

    /// Time since construction or the last reset (ms)
    pub fn elapsed_since_reset_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.reset_ms)
    }

    /// Elapsed time of the running session, if any
    pub fn session_elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.state
            .session_start_ms()
            .map(|since| now_ms.saturating_sub(since))
    }

    /// Runtime left before the reservoir is presumed empty (ms)
    pub fn remaining_ms(&self) -> u64 {
        (self.config.capacity_ms() as u64).saturating_sub(self.cumulative_run_ms)
    }

    /// Set the reservoir capacity
    ///
    /// If the pump is off and the new capacity is already used up, the
    /// timeout latches immediately.
    pub fn set_capacity_ms(&mut self, capacity_ms: u32) -> bool {
        if !self.config.set_capacity_ms(capacity_ms) {
            return false;
        }

        if self.state == PumpState::Off && self.remaining_ms() == 0 {
            warn!(
                "capacity {} ms already used ({} ms), reservoir timeout",
                capacity_ms,
                self.cumulative_run_ms
            );
            self.state = PumpState::TimedOut;
        }
        true
    }

    /// Set the default pulse duration
    pub fn set_pulse_ms(&mut self, pulse_ms: u32) -> bool {
        self.config.set_pulse_ms(pulse_ms)
    }

    /// Turn the pump on
    ///
    /// No-op while running or timed out. Returns true if the pump started.
    pub fn turn_on(&mut self, now_ms: u64) -> bool {
        if !self.state.start_allowed() {
            return false;
        }
        self.start(now_ms, None);
        true
    }

    /// Turn the pump off
    ///
    /// The outputs are always forced off. If a session was running, its
    /// runtime is added to the total and returned.
    pub fn turn_off(&mut self, now_ms: u64) -> Option<PumpStop> {
        self.output.set_all(false);

        let since_ms = self.state.session_start_ms()?;
        let run_ms = now_ms.saturating_sub(since_ms);
        self.cumulative_run_ms = self.cumulative_run_ms.saturating_add(run_ms);
        self.last_stop_ms = now_ms;

        let timed_out = self.remaining_ms() == 0;
        if timed_out {
            warn!(
                "reservoir timeout after {} ms of pumping",
                self.cumulative_run_ms
            );
            self.state = PumpState::TimedOut;
        } else {
            self.state = PumpState::Off;
        }

        debug!("pump off after {} ms (total {} ms)", run_ms, self.cumulative_run_ms);

        Some(PumpStop { run_ms, timed_out })
    }

    /// Run a blocking pulse
    ///
    /// Blocks for the clamped duration using the clock's delay, so no
    /// periodic check runs until the pulse is over. Returns the finished
    /// session, or `None` if the pulse was refused.
    pub fn pulse<C>(&mut self, duration_ms: u32, clock: &mut C) -> Option<PumpStop>
    where
        C: Clock + DelayNs,
    {
        let duration_ms = self.admit_pulse(duration_ms)?;

        self.start(clock.now_ms(), None);
        clock.delay_ms(duration_ms);
        self.turn_off(clock.now_ms())
    }

    /// Start a non-blocking pulse
    ///
    /// The pump runs until a periodic check at or after `now_ms + duration`.
    /// Returns true if the pump started.
    pub fn arm_pulse(&mut self, duration_ms: u32, now_ms: u64) -> bool {
        match self.admit_pulse(duration_ms) {
            Some(duration_ms) => {
                self.start(now_ms, Some(now_ms.saturating_add(duration_ms as u64)));
                true
            }
            None => false,
        }
    }

    /// Check the running session against capacity and pulse deadline
    ///
    /// Call every control cycle. Returns the finished session if the pump
    /// was stopped.
    pub fn periodic_check(&mut self, now_ms: u64) -> Option<PumpStop> {
        let PumpState::Running {
            since_ms,
            deadline_ms,
        } = self.state
        else {
            return None;
        };

        let elapsed_ms = now_ms.saturating_sub(since_ms);
        if elapsed_ms.saturating_add(self.cumulative_run_ms) >= self.config.capacity_ms() as u64 {
            // The stop pushes the total to capacity, which latches the timeout
            return self.turn_off(now_ms);
        }

        match deadline_ms {
            Some(deadline) if now_ms >= deadline => self.turn_off(now_ms),
            _ => None,
        }
    }

    /// Reset after the reservoir has been refilled
    ///
    /// Stops a running session first and returns it.
    pub fn reset(&mut self, now_ms: u64) -> Option<PumpStop> {
        let stop = self.turn_off(now_ms);

        self.cumulative_run_ms = 0;
        self.run_count = 0;
        self.state = PumpState::Off;
        self.reset_ms = now_ms;

        info!("pump reset, reservoir capacity {} ms", self.config.capacity_ms());
        stop
    }

    /// Decide whether a pulse may run and for how long
    fn admit_pulse(&mut self, duration_ms: u32) -> Option<u32> {
        if !self.state.start_allowed() {
            return None;
        }

        let duration_ms = ReservoirConfig::clamp_pulse(duration_ms);
        if self.cumulative_run_ms + duration_ms as u64 > self.config.capacity_ms() as u64 {
            warn!(
                "pulse of {} ms would overrun reservoir ({} ms left), reservoir timeout",
                duration_ms,
                self.remaining_ms()
            );
            self.state = PumpState::TimedOut;
            return None;
        }

        Some(duration_ms)
    }

    fn start(&mut self, now_ms: u64, deadline_ms: Option<u64>) {
        self.output.set_all(true);
        self.state = PumpState::Running {
            since_ms: now_ms,
            deadline_ms,
        };
        self.run_count = self.run_count.saturating_add(1);
        debug!("pump on at {} ms (run {})", now_ms, self.run_count);
    }
}
