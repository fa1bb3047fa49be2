//! Pump output trait

/// Trait for the pump actuator and its indicator light
///
/// Implementations drive a relay, MOSFET or SSR for the pump and a GPIO
/// for the indicator. Writes are assumed not to fail; adapters over
/// fallible pins must decide what to do with errors themselves.
pub trait PumpOutput {
    /// Switch the pump actuator
    fn set_actuator(&mut self, on: bool);

    /// Switch the indicator that mirrors the pump state
    fn set_indicator(&mut self, on: bool);

    /// Switch both outputs together
    fn set_all(&mut self, on: bool) {
        self.set_actuator(on);
        self.set_indicator(on);
    }
}
