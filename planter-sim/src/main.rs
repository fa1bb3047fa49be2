//! Host simulator for the Planter irrigation controller.
//!
//! Runs the controller against a simple soil model on a simulated clock
//! and prints the history tables at the end. Automatic watering keeps the
//! soil above the trigger until the reservoir runs dry; the reservoir is
//! refilled a while after each timeout.
//!
//! ```text
//! planter-sim [DAYS] [TRIGGER_PERCENT]
//! ```
//!
//! Invalid arguments are rejected with a usage message.
//!
//! Set `RUST_LOG=info` (or `debug`) to watch the controller's decisions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use clap::Parser;
use embedded_hal::delay::DelayNs;
use log::info;

use planter_core::config::{HistoryConfig, PlanterConfig, DEFAULT_ROLLUP_EVERY, ONE_HOUR_MS};
use planter_core::traits::{Clock, MoistureSensor, PumpOutput, SensorError};
use planter_core::{Planter, Tier};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Simulated time between control cycles.
const STEP_MS: u64 = 10_000;

/// Soil moisture lost per hour, as a fraction of saturation.
const DRYING_PER_HOUR: f64 = 0.02;

/// Soil moisture gained per millisecond of pumping.
const WETTING_PER_MS: f64 = 0.000_1;

/// Time between a reservoir timeout and the refill.
const REFILL_DELAY_MS: u64 = 12 * ONE_HOUR_MS;

/// Raw probe reading in dry air.
const PROBE_DRY_RAW: f64 = 3500.0;

/// Raw probe reading in water.
const PROBE_SAT_RAW: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Simulated hardware
// ---------------------------------------------------------------------------

/// Shared simulated time, advanced by the main loop and by blocking pulses.
#[derive(Clone)]
struct SimClock {
    now_ms: Rc<Cell<u64>>,
}

impl SimClock {
    fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(ns as u64 / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms as u64);
    }
}

/// Soil water content (0.0 = dry, 1.0 = saturated).
struct Soil {
    moisture: f64,
    pump_on: bool,
}

impl Soil {
    /// Let `dt_ms` pass, drying the soil and wetting it while the pump runs.
    fn step(&mut self, dt_ms: u64) {
        let dt = dt_ms as f64;
        self.moisture -= DRYING_PER_HOUR * dt / ONE_HOUR_MS as f64;
        if self.pump_on {
            self.moisture += WETTING_PER_MS * dt;
        }
        self.moisture = self.moisture.clamp(0.0, 1.0);
    }

    fn raw(&self) -> u16 {
        (PROBE_DRY_RAW - (PROBE_DRY_RAW - PROBE_SAT_RAW) * self.moisture) as u16
    }
}

/// Pump relay wetting the simulated soil.
struct SoilPump {
    soil: Rc<RefCell<Soil>>,
}

impl PumpOutput for SoilPump {
    fn set_actuator(&mut self, on: bool) {
        self.soil.borrow_mut().pump_on = on;
    }

    fn set_indicator(&mut self, _on: bool) {}
}

/// Moisture probe reading the simulated soil.
struct SoilProbe {
    soil: Rc<RefCell<Soil>>,
}

impl MoistureSensor for SoilProbe {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        Ok(self.soil.borrow().raw())
    }
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "planter-sim", about = "Simulate the Planter irrigation controller")]
#[command(version)]
struct Args {
    /// Number of simulated days
    #[arg(default_value_t = 10)]
    days: u64,

    /// Water automatically at or below this moisture (%)
    #[arg(default_value_t = 30, value_parser = clap::value_parser!(i32).range(0..=100))]
    trigger: i32,
}

fn main() {
    let args = Args::parse();
    env_logger::init();

    let Args { days, trigger } = args;
    info!("Simulating {} days, watering below {}%", days, trigger);

    let clock = SimClock {
        now_ms: Rc::new(Cell::new(0)),
    };
    let soil = Rc::new(RefCell::new(Soil {
        moisture: 0.6,
        pump_on: false,
    }));

    let mut config = PlanterConfig::default();
    config.history = HistoryConfig::new(ONE_HOUR_MS, DEFAULT_ROLLUP_EVERY);
    // Range already checked by the argument parser
    config.auto_water.set_trigger_percent(Some(trigger));

    let mut planter: Planter<_, _, _> = Planter::new(
        SoilPump { soil: soil.clone() },
        SoilProbe { soil: soil.clone() },
        clock.clone(),
        config,
    );

    // One blocking pulse at start-up, like a manual button press
    planter.pulse();

    let end_ms = days * 24 * ONE_HOUR_MS;
    let mut refills = 0u32;
    while clock.now_ms() < end_ms {
        clock.advance(STEP_MS);
        soil.borrow_mut().step(STEP_MS);
        planter.tick();

        if planter.is_timed_out()
            && planter.pump().time_since_last_stop_ms(clock.now_ms()) >= REFILL_DELAY_MS
        {
            info!(
                "Refilling reservoir after {} runs ({} s of pumping)",
                planter.run_count(),
                planter.run_time_s()
            );
            planter.reset();
            refills += 1;
        }
    }

    let status = planter.status();
    println!("Status: {:?}", status);
    println!("Refills: {}", refills);
    println!();

    let mut out = String::new();
    let rendered = planter
        .render_parameters(&mut out)
        .and_then(|_| {
            out.push_str("\nHourly history\n");
            planter.render_history(Tier::Fine, 24, &mut out)
        })
        .and_then(|_| {
            out.push_str("\nDaily history\n");
            planter.render_history(Tier::Coarse, 8, &mut out)
        });

    match rendered {
        Ok(()) => print!("{}", out),
        Err(e) => eprintln!("failed to render report: {}", e),
    }

    info!("Simulator exiting");
}
