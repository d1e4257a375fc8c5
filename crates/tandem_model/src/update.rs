//! Partial attribute updates issued toward a target entity.

use crate::attribute::{AttributeKind, AttributeSet, AttributeValue, ColorCommand};

/// A partial update to write to a target entity.
///
/// Every field is optional; unset fields are left untouched on the target.
/// The color slot holds a single [`ColorCommand`], so an update can never
/// carry two conflicting color descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeUpdate {
    /// On/off state to apply.
    pub power: Option<bool>,
    /// Level (brightness, speed percentage) to apply.
    pub level: Option<u8>,
    /// Color descriptor to apply.
    pub color: Option<ColorCommand>,
    /// Cover position to apply.
    pub position: Option<u8>,
    /// Cover tilt to apply.
    pub tilt: Option<u8>,
    /// Operating mode to apply.
    pub mode: Option<String>,
    /// Target setpoint to apply.
    pub setpoint: Option<f64>,
}

impl AttributeUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an update that only sets the on/off state.
    pub fn power_only(on: bool) -> Self {
        Self {
            power: Some(on),
            ..Self::default()
        }
    }

    /// Returns true if the update sets nothing.
    pub fn is_empty(&self) -> bool {
        self.power.is_none()
            && self.level.is_none()
            && self.color.is_none()
            && self.position.is_none()
            && self.tilt.is_none()
            && self.mode.is_none()
            && self.setpoint.is_none()
    }

    /// Returns the attribute values this update would leave on the target.
    fn values(&self) -> Vec<AttributeValue> {
        let mut values = Vec::new();
        if let Some(on) = self.power {
            values.push(AttributeValue::Power(on));
        }
        if let Some(level) = self.level {
            values.push(AttributeValue::Level(level));
        }
        if let Some(color) = self.color {
            values.push(color.to_attribute());
        }
        if let Some(position) = self.position {
            values.push(AttributeValue::Position(position));
        }
        if let Some(tilt) = self.tilt {
            values.push(AttributeValue::Tilt(tilt));
        }
        if let Some(mode) = &self.mode {
            values.push(AttributeValue::Mode(mode.clone()));
        }
        if let Some(setpoint) = self.setpoint {
            values.push(AttributeValue::Setpoint(setpoint));
        }
        values
    }

    /// Returns true if applying this update to `target` would change nothing.
    ///
    /// Used for idempotence: an update whose every value already matches the
    /// target's current snapshot must not be written at all.
    pub fn is_noop_for(&self, target: &AttributeSet) -> bool {
        self.values()
            .iter()
            .all(|value| target.get(value.kind()) == Some(value))
    }

    /// Returns true if `observed` could be the result of applying this update.
    ///
    /// This is the echo comparison: an attribute kind the update set must
    /// either be absent from the observed snapshot (the host dropped it) or
    /// carry exactly the written value. Any overlapping kind that differs
    /// means someone else changed the entity after the write.
    pub fn consistent_with(&self, observed: &AttributeSet) -> bool {
        self.values().iter().all(|value| {
            observed
                .get(value.kind())
                .map_or(true, |current| current == value)
        })
    }

    /// Applies the update to an attribute set, as the host would.
    ///
    /// Setting any color descriptor clears the other color kinds first:
    /// a light showing a color temperature stops reporting it once an
    /// explicit color is written, and vice versa.
    pub fn apply_to(&self, target: &mut AttributeSet) {
        if self.color.is_some() {
            target.remove(AttributeKind::ColorRgb);
            target.remove(AttributeKind::ColorHs);
            target.remove(AttributeKind::ColorTemp);
        }
        for value in self.values() {
            target.insert(value);
        }
    }
}
