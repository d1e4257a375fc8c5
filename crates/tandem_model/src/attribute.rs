//! The tagged attribute model.
//!
//! Attributes are a closed sum type rather than a string-keyed dictionary.
//! An [`AttributeSet`] holds at most one value per [`AttributeKind`]; a
//! snapshot may carry several color *kinds* at once (hosts commonly report
//! both an explicit color and a color temperature for the same light), but
//! an outgoing write carries exactly one [`ColorCommand`].

use std::collections::BTreeMap;
use std::fmt;

/// Discriminant for [`AttributeValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKind {
    /// On/off state.
    Power,
    /// Continuous level: brightness, fan speed percentage, volume.
    Level,
    /// Explicit RGB color.
    ColorRgb,
    /// Hue/saturation color.
    ColorHs,
    /// Color temperature in kelvin.
    ColorTemp,
    /// Cover position, 0 (closed) to 100 (open).
    Position,
    /// Cover tilt position, 0 to 100.
    Tilt,
    /// Named operating mode (hvac mode, fan preset).
    Mode,
    /// Target setpoint (e.g. temperature).
    Setpoint,
    /// Read-only numeric measurement.
    Measurement,
    /// Read-only text value.
    Text,
}

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// On/off state.
    Power(bool),
    /// Continuous level, 0-255.
    Level(u8),
    /// Explicit RGB color.
    ColorRgb {
        /// Red component.
        r: u8,
        /// Green component.
        g: u8,
        /// Blue component.
        b: u8,
    },
    /// Hue/saturation color.
    ColorHs {
        /// Hue in degrees, 0-360.
        hue: u16,
        /// Saturation percentage, 0-100.
        saturation: u8,
    },
    /// Color temperature in kelvin.
    ColorTemp(u16),
    /// Cover position percentage.
    Position(u8),
    /// Cover tilt percentage.
    Tilt(u8),
    /// Named operating mode.
    Mode(String),
    /// Target setpoint.
    Setpoint(f64),
    /// Read-only numeric measurement.
    Measurement(f64),
    /// Read-only text value.
    Text(String),
}

impl AttributeValue {
    /// Returns the kind this value is stored under.
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Power(_) => AttributeKind::Power,
            AttributeValue::Level(_) => AttributeKind::Level,
            AttributeValue::ColorRgb { .. } => AttributeKind::ColorRgb,
            AttributeValue::ColorHs { .. } => AttributeKind::ColorHs,
            AttributeValue::ColorTemp(_) => AttributeKind::ColorTemp,
            AttributeValue::Position(_) => AttributeKind::Position,
            AttributeValue::Tilt(_) => AttributeKind::Tilt,
            AttributeValue::Mode(_) => AttributeKind::Mode,
            AttributeValue::Setpoint(_) => AttributeKind::Setpoint,
            AttributeValue::Measurement(_) => AttributeKind::Measurement,
            AttributeValue::Text(_) => AttributeKind::Text,
        }
    }
}

/// A set of attributes with at most one value per kind.
#[derive(Clone, Default, PartialEq)]
pub struct AttributeSet {
    values: BTreeMap<AttributeKind, AttributeValue>,
}

impl AttributeSet {
    /// Creates an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value of the same kind.
    pub fn insert(&mut self, value: AttributeValue) {
        self.values.insert(value.kind(), value);
    }

    /// Removes the value of the given kind, if present.
    pub fn remove(&mut self, kind: AttributeKind) -> Option<AttributeValue> {
        self.values.remove(&kind)
    }

    /// Returns the value of the given kind, if present.
    pub fn get(&self, kind: AttributeKind) -> Option<&AttributeValue> {
        self.values.get(&kind)
    }

    /// Builder-style insert.
    pub fn with(mut self, value: AttributeValue) -> Self {
        self.insert(value);
        self
    }

    /// Returns the on/off state, if reported.
    pub fn power(&self) -> Option<bool> {
        match self.get(AttributeKind::Power) {
            Some(AttributeValue::Power(on)) => Some(*on),
            _ => None,
        }
    }

    /// Returns the level, if reported.
    pub fn level(&self) -> Option<u8> {
        match self.get(AttributeKind::Level) {
            Some(AttributeValue::Level(level)) => Some(*level),
            _ => None,
        }
    }

    /// Returns the cover position, if reported.
    pub fn position(&self) -> Option<u8> {
        match self.get(AttributeKind::Position) {
            Some(AttributeValue::Position(position)) => Some(*position),
            _ => None,
        }
    }

    /// Returns the cover tilt, if reported.
    pub fn tilt(&self) -> Option<u8> {
        match self.get(AttributeKind::Tilt) {
            Some(AttributeValue::Tilt(tilt)) => Some(*tilt),
            _ => None,
        }
    }

    /// Returns the operating mode, if reported.
    pub fn mode(&self) -> Option<&str> {
        match self.get(AttributeKind::Mode) {
            Some(AttributeValue::Mode(mode)) => Some(mode.as_str()),
            _ => None,
        }
    }

    /// Returns the setpoint, if reported.
    pub fn setpoint(&self) -> Option<f64> {
        match self.get(AttributeKind::Setpoint) {
            Some(AttributeValue::Setpoint(value)) => Some(*value),
            _ => None,
        }
    }

    /// Iterates over the contained values in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeValue> {
        self.values.values()
    }

    /// Returns the number of attributes in the set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the set holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The kind keys are redundant with the value variants.
        f.debug_set().entries(self.values.values()).finish()
    }
}

/// The single color descriptor of an outgoing write.
///
/// Hosts reject writes that carry two conflicting color descriptors, so
/// the update type holds exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorCommand {
    /// Explicit RGB color.
    Rgb {
        /// Red component.
        r: u8,
        /// Green component.
        g: u8,
        /// Blue component.
        b: u8,
    },
    /// Hue/saturation color.
    HueSat {
        /// Hue in degrees, 0-360.
        hue: u16,
        /// Saturation percentage, 0-100.
        saturation: u8,
    },
    /// Color temperature in kelvin.
    Kelvin(u16),
}

impl ColorCommand {
    /// Converts a legacy mired color temperature to a kelvin command.
    ///
    /// Returns `None` for zero mireds (the conversion is undefined).
    pub fn from_mireds(mireds: u16) -> Option<Self> {
        if mireds == 0 {
            return None;
        }
        Some(ColorCommand::Kelvin((1_000_000 / u32::from(mireds)) as u16))
    }

    /// Returns the attribute value this command would leave on the target.
    pub fn to_attribute(self) -> AttributeValue {
        match self {
            ColorCommand::Rgb { r, g, b } => AttributeValue::ColorRgb { r, g, b },
            ColorCommand::HueSat { hue, saturation } => AttributeValue::ColorHs { hue, saturation },
            ColorCommand::Kelvin(kelvin) => AttributeValue::ColorTemp(kelvin),
        }
    }

    /// Returns the attribute kind this command writes.
    pub fn kind(&self) -> AttributeKind {
        match self {
            ColorCommand::Rgb { .. } => AttributeKind::ColorRgb,
            ColorCommand::HueSat { .. } => AttributeKind::ColorHs,
            ColorCommand::Kelvin(_) => AttributeKind::ColorTemp,
        }
    }
}
