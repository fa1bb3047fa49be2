//! Pump states
//!
//! A single tagged state replaces separate "running" and "timeout" flags,
//! so a pump that is running while timed out cannot be represented.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pump controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PumpState {
    /// Pump stopped, ready to run
    #[default]
    Off,
    /// Pump running
    Running {
        /// Session start time (ms)
        since_ms: u64,
        /// Stop time of an armed pulse, checked on every periodic check
        deadline_ms: Option<u64>,
    },
    /// Reservoir presumed empty; outputs disabled until reset
    TimedOut,
}

impl PumpState {
    /// Check if the pump is running
    pub fn is_running(&self) -> bool {
        matches!(self, PumpState::Running { .. })
    }

    /// Check if the reservoir timeout is latched
    pub fn is_timed_out(&self) -> bool {
        matches!(self, PumpState::TimedOut)
    }

    /// Check if the pump may be started from this state
    pub fn start_allowed(&self) -> bool {
        matches!(self, PumpState::Off)
    }

    /// Session start time, if running
    pub fn session_start_ms(&self) -> Option<u64> {
        match *self {
            PumpState::Running { since_ms, .. } => Some(since_ms),
            _ => None,
        }
    }
}

/// A finished pump session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PumpStop {
    /// Session runtime (ms)
    pub run_ms: u64,
    /// The session used up the reservoir
    pub timed_out: bool,
}
