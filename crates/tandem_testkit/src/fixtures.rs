//! Entity fixtures and snapshot builders.

use tandem_model::{AttributeSet, AttributeValue, Domain, EntityRef};
use tracing_subscriber::EnvFilter;

/// Initializes tracing for a test binary.
///
/// Safe to call from every test; only the first call takes effect. Control
/// verbosity with `RUST_LOG`, e.g. `RUST_LOG=tandem_engine=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A light entity reference.
pub fn light(id: &str) -> EntityRef {
    EntityRef::new(Domain::Light, id)
}

/// A switch entity reference.
pub fn switch(id: &str) -> EntityRef {
    EntityRef::new(Domain::Switch, id)
}

/// A fan entity reference.
pub fn fan(id: &str) -> EntityRef {
    EntityRef::new(Domain::Fan, id)
}

/// A cover entity reference.
pub fn cover(id: &str) -> EntityRef {
    EntityRef::new(Domain::Cover, id)
}

/// A climate entity reference.
pub fn climate(id: &str) -> EntityRef {
    EntityRef::new(Domain::Climate, id)
}

/// A sensor entity reference.
pub fn sensor(id: &str) -> EntityRef {
    EntityRef::new(Domain::Sensor, id)
}

/// A light that is on at the given brightness.
pub fn light_on(level: u8) -> AttributeSet {
    AttributeSet::new()
        .with(AttributeValue::Power(true))
        .with(AttributeValue::Level(level))
}

/// A light that is off.
pub fn light_off() -> AttributeSet {
    AttributeSet::new().with(AttributeValue::Power(false))
}

/// A bare on/off snapshot (switches, basic fans).
pub fn power(on: bool) -> AttributeSet {
    AttributeSet::new().with(AttributeValue::Power(on))
}

/// A fan running at the given speed percentage.
pub fn fan_at(percentage: u8) -> AttributeSet {
    AttributeSet::new()
        .with(AttributeValue::Power(true))
        .with(AttributeValue::Level(percentage))
}

/// A cover at the given position.
pub fn cover_at(position: u8) -> AttributeSet {
    AttributeSet::new()
        .with(AttributeValue::Power(position > 0))
        .with(AttributeValue::Position(position))
}

/// A climate device in a mode with a target setpoint.
pub fn climate_state(mode: &str, setpoint: f64) -> AttributeSet {
    AttributeSet::new()
        .with(AttributeValue::Mode(mode.into()))
        .with(AttributeValue::Setpoint(setpoint))
}

/// A sensor reporting a numeric measurement.
pub fn measurement(value: f64) -> AttributeSet {
    AttributeSet::new().with(AttributeValue::Measurement(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_produce_expected_shapes() {
        assert_eq!(light("x").to_string(), "light.x");
        assert_eq!(light_on(77).level(), Some(77));
        assert_eq!(light_off().power(), Some(false));
        assert_eq!(cover_at(40).position(), Some(40));
        assert_eq!(climate_state("cool", 22.0).mode(), Some("cool"));
        assert_eq!(power(true).len(), 1);
    }
}
