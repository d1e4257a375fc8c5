//! Attribute mapping between paired entities.
//!
//! Pure computation: given the source's snapshot and the target's domain,
//! build the partial update to write. Which attributes travel depends on
//! the pair's sync mode and the source domain; what never happens is two
//! color descriptors in one update (the update type has a single color
//! slot, and the selection below fills it at most once).

use tandem_model::{AttributeKind, AttributeSet, AttributeUpdate, AttributeValue, ColorCommand, Domain, SyncMode};

/// Builds the update to write to the target for a source snapshot.
///
/// - `Full` mode copies the on/off state plus the source domain's relevant
///   secondary attributes.
/// - `Basic` mode copies only the coarse on/off state.
/// - A read-only target yields an empty update; pairs involving sensors
///   are accepted for configuration but never written to.
pub fn map_attributes(
    source: &AttributeSet,
    source_domain: Domain,
    target_domain: Domain,
    mode: SyncMode,
) -> AttributeUpdate {
    if target_domain.is_read_only() {
        return AttributeUpdate::new();
    }

    if mode == SyncMode::Basic {
        return match source.power() {
            Some(on) => AttributeUpdate::power_only(on),
            None => AttributeUpdate::new(),
        };
    }

    match source_domain {
        Domain::Light => map_light(source),
        Domain::Switch => match source.power() {
            Some(on) => AttributeUpdate::power_only(on),
            None => AttributeUpdate::new(),
        },
        Domain::Fan => map_fan(source),
        Domain::Cover => map_cover(source),
        Domain::Climate => map_climate(source),
        // Sensors produce nothing to write; full mode implies a sensor
        // target, already handled above.
        Domain::Sensor => AttributeUpdate::new(),
    }
}

/// Lights: on/off always; level and one color descriptor only while on.
fn map_light(source: &AttributeSet) -> AttributeUpdate {
    let mut update = AttributeUpdate::new();
    update.power = source.power();
    if source.power() == Some(true) {
        update.level = source.level();
        update.color = select_color(source);
    }
    update
}

/// Fans: speed percentage preferred, preset mode only as a fallback.
fn map_fan(source: &AttributeSet) -> AttributeUpdate {
    let mut update = AttributeUpdate::new();
    update.power = source.power();
    if source.power() == Some(true) {
        match source.level() {
            Some(level) => update.level = Some(level),
            None => update.mode = source.mode().map(str::to_owned),
        }
    }
    update
}

/// Covers: a reported position wins over the coarse open/closed state.
fn map_cover(source: &AttributeSet) -> AttributeUpdate {
    let mut update = AttributeUpdate::new();
    match source.position() {
        Some(position) => update.position = Some(position),
        None => update.power = source.power(),
    }
    update.tilt = source.tilt();
    update
}

/// Climate devices: operating mode and target setpoint.
fn map_climate(source: &AttributeSet) -> AttributeUpdate {
    let mut update = AttributeUpdate::new();
    update.mode = source.mode().map(str::to_owned);
    update.setpoint = source.setpoint();
    update
}

/// Selects exactly one color descriptor from the source snapshot.
///
/// Priority: explicit RGB > hue/saturation > color temperature. Hosts
/// reject writes carrying conflicting descriptors, so even when the source
/// reports several, one wins.
fn select_color(source: &AttributeSet) -> Option<ColorCommand> {
    if let Some(AttributeValue::ColorRgb { r, g, b }) = source.get(AttributeKind::ColorRgb) {
        return Some(ColorCommand::Rgb {
            r: *r,
            g: *g,
            b: *b,
        });
    }
    if let Some(AttributeValue::ColorHs { hue, saturation }) = source.get(AttributeKind::ColorHs) {
        return Some(ColorCommand::HueSat {
            hue: *hue,
            saturation: *saturation,
        });
    }
    if let Some(AttributeValue::ColorTemp(kelvin)) = source.get(AttributeKind::ColorTemp) {
        return Some(ColorCommand::Kelvin(*kelvin));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn light_on(level: u8) -> AttributeSet {
        AttributeSet::new()
            .with(AttributeValue::Power(true))
            .with(AttributeValue::Level(level))
    }

    #[test]
    fn full_light_mapping() {
        let source = light_on(127).with(AttributeValue::ColorTemp(2700));
        let update = map_attributes(&source, Domain::Light, Domain::Light, SyncMode::Full);
        assert_eq!(update.power, Some(true));
        assert_eq!(update.level, Some(127));
        assert_eq!(update.color, Some(ColorCommand::Kelvin(2700)));
    }

    #[test]
    fn light_off_drops_secondary_attributes() {
        let source = AttributeSet::new()
            .with(AttributeValue::Power(false))
            .with(AttributeValue::Level(127))
            .with(AttributeValue::ColorTemp(2700));
        let update = map_attributes(&source, Domain::Light, Domain::Light, SyncMode::Full);
        assert_eq!(update.power, Some(false));
        assert_eq!(update.level, None);
        assert_eq!(update.color, None);
    }

    #[test]
    fn color_priority() {
        let source = light_on(255)
            .with(AttributeValue::ColorTemp(4000))
            .with(AttributeValue::ColorHs {
                hue: 30,
                saturation: 50,
            });
        let update = map_attributes(&source, Domain::Light, Domain::Light, SyncMode::Full);
        assert_eq!(
            update.color,
            Some(ColorCommand::HueSat {
                hue: 30,
                saturation: 50
            })
        );

        let source = source.with(AttributeValue::ColorRgb { r: 1, g: 2, b: 3 });
        let update = map_attributes(&source, Domain::Light, Domain::Light, SyncMode::Full);
        assert_eq!(update.color, Some(ColorCommand::Rgb { r: 1, g: 2, b: 3 }));
    }

    #[test]
    fn basic_mode_is_power_only() {
        let source = light_on(200).with(AttributeValue::ColorTemp(3000));
        let update = map_attributes(&source, Domain::Light, Domain::Switch, SyncMode::Basic);
        assert_eq!(update, AttributeUpdate::power_only(true));
    }

    #[test]
    fn read_only_target_yields_empty_update() {
        let source = light_on(80);
        let update = map_attributes(&source, Domain::Light, Domain::Sensor, SyncMode::Basic);
        assert!(update.is_empty());
    }

    #[test]
    fn fan_prefers_percentage_over_preset() {
        let source = AttributeSet::new()
            .with(AttributeValue::Power(true))
            .with(AttributeValue::Level(66))
            .with(AttributeValue::Mode("breeze".into()));
        let update = map_attributes(&source, Domain::Fan, Domain::Fan, SyncMode::Full);
        assert_eq!(update.level, Some(66));
        assert_eq!(update.mode, None);

        let source = AttributeSet::new()
            .with(AttributeValue::Power(true))
            .with(AttributeValue::Mode("breeze".into()));
        let update = map_attributes(&source, Domain::Fan, Domain::Fan, SyncMode::Full);
        assert_eq!(update.level, None);
        assert_eq!(update.mode, Some("breeze".into()));
    }

    #[test]
    fn cover_position_wins_over_power() {
        let source = AttributeSet::new()
            .with(AttributeValue::Power(true))
            .with(AttributeValue::Position(35))
            .with(AttributeValue::Tilt(10));
        let update = map_attributes(&source, Domain::Cover, Domain::Cover, SyncMode::Full);
        assert_eq!(update.position, Some(35));
        assert_eq!(update.tilt, Some(10));
        assert_eq!(update.power, None);

        let source = AttributeSet::new().with(AttributeValue::Power(false));
        let update = map_attributes(&source, Domain::Cover, Domain::Cover, SyncMode::Full);
        assert_eq!(update.power, Some(false));
        assert_eq!(update.position, None);
    }

    #[test]
    fn climate_mapping() {
        let source = AttributeSet::new()
            .with(AttributeValue::Mode("heat".into()))
            .with(AttributeValue::Setpoint(21.5));
        let update = map_attributes(&source, Domain::Climate, Domain::Climate, SyncMode::Full);
        assert_eq!(update.mode, Some("heat".into()));
        assert_eq!(update.setpoint, Some(21.5));
    }

    fn arb_snapshot() -> impl Strategy<Value = AttributeSet> {
        (
            any::<Option<bool>>(),
            any::<Option<u8>>(),
            proptest::option::of((any::<u8>(), any::<u8>(), any::<u8>())),
            proptest::option::of((0u16..360, 0u8..=100)),
            proptest::option::of(1500u16..7000),
        )
            .prop_map(|(power, level, rgb, hs, temp)| {
                let mut set = AttributeSet::new();
                if let Some(on) = power {
                    set.insert(AttributeValue::Power(on));
                }
                if let Some(level) = level {
                    set.insert(AttributeValue::Level(level));
                }
                if let Some((r, g, b)) = rgb {
                    set.insert(AttributeValue::ColorRgb { r, g, b });
                }
                if let Some((hue, saturation)) = hs {
                    set.insert(AttributeValue::ColorHs { hue, saturation });
                }
                if let Some(kelvin) = temp {
                    set.insert(AttributeValue::ColorTemp(kelvin));
                }
                set
            })
    }

    proptest! {
        /// The chosen color descriptor always follows the fixed priority,
        /// no matter which combination the source reports.
        #[test]
        fn color_selection_follows_priority(source in arb_snapshot()) {
            let update = map_attributes(&source, Domain::Light, Domain::Light, SyncMode::Full);
            if source.power() != Some(true) {
                prop_assert!(update.color.is_none());
            } else {
                let expected = match (
                    source.get(AttributeKind::ColorRgb),
                    source.get(AttributeKind::ColorHs),
                    source.get(AttributeKind::ColorTemp),
                ) {
                    (Some(_), _, _) => Some(AttributeKind::ColorRgb),
                    (None, Some(_), _) => Some(AttributeKind::ColorHs),
                    (None, None, Some(_)) => Some(AttributeKind::ColorTemp),
                    (None, None, None) => None,
                };
                prop_assert_eq!(update.color.map(|c| c.kind()), expected);
            }
        }

        /// Basic mode never leaks secondary attributes.
        #[test]
        fn basic_mode_never_leaks(source in arb_snapshot()) {
            let update = map_attributes(&source, Domain::Light, Domain::Switch, SyncMode::Basic);
            prop_assert!(update.level.is_none());
            prop_assert!(update.color.is_none());
            prop_assert!(update.mode.is_none());
        }

        /// Read-only targets never receive anything.
        #[test]
        fn sensors_never_written(source in arb_snapshot()) {
            let update = map_attributes(&source, Domain::Light, Domain::Sensor, SyncMode::Basic);
            prop_assert!(update.is_empty());
        }
    }
}
