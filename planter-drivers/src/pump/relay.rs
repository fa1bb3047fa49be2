//! Relay pump output
//!
//! Drives the pump through a GPIO pin (relay module, SSR or MOSFET) and
//! mirrors the pump state on an optional status LED.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use planter_core::traits::PumpOutput;

/// Placeholder for boards without a status LED
pub struct NoIndicator;

impl ErrorType for NoIndicator {
    type Error = Infallible;
}

impl OutputPin for NoIndicator {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Relay pump output
///
/// Each pin can be active-high (default) or active-low. Many cheap relay
/// modules switch on when their input is pulled low.
pub struct RelayPump<A, L = NoIndicator> {
    actuator: A,
    indicator: L,
    /// If true, pump ON = actuator pin LOW
    actuator_inverted: bool,
    /// If true, LED ON = indicator pin LOW
    indicator_inverted: bool,
    /// Current logical pump state
    on: bool,
}

impl<A> RelayPump<A, NoIndicator>
where
    A: OutputPin<Error = Infallible>,
{
    /// Create a pump output without a status LED
    pub fn new(actuator: A, inverted: bool) -> Self {
        Self::with_indicator(actuator, inverted, NoIndicator, false)
    }
}

impl<A, L> RelayPump<A, L>
where
    A: OutputPin<Error = Infallible>,
    L: OutputPin<Error = Infallible>,
{
    /// Create a pump output with a status LED
    ///
    /// # Arguments
    /// - `actuator`: Pin switching the pump
    /// - `actuator_inverted`: If true, the pump runs while the pin is LOW
    /// - `indicator`: Pin driving the status LED
    /// - `indicator_inverted`: If true, the LED lights while the pin is LOW
    pub fn with_indicator(
        actuator: A,
        actuator_inverted: bool,
        indicator: L,
        indicator_inverted: bool,
    ) -> Self {
        let mut pump = Self {
            actuator,
            indicator,
            actuator_inverted,
            indicator_inverted,
            on: false,
        };
        // Ensure pump starts off
        pump.set_all(false);
        pump
    }

    /// Check if the pump is switched on
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Release the pins
    pub fn release(self) -> (A, L) {
        (self.actuator, self.indicator)
    }
}

/// Drive `pin` to the level that means `on`
fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, on: bool, inverted: bool) {
    // Normal: on=true, inverted=false → high
    // Inverted: on=true, inverted=true → low
    let _ = if on != inverted {
        pin.set_high()
    } else {
        pin.set_low()
    };
}

impl<A, L> PumpOutput for RelayPump<A, L>
where
    A: OutputPin<Error = Infallible>,
    L: OutputPin<Error = Infallible>,
{
    fn set_actuator(&mut self, on: bool) {
        self.on = on;
        drive(&mut self.actuator, on, self.actuator_inverted);
        debug!("pump relay {}", on);
    }

    fn set_indicator(&mut self, on: bool) {
        drive(&mut self.indicator, on, self.indicator_inverted);
    }
}
