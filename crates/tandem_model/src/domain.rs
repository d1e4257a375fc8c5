//! Entity domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The domain (device class) of an entity.
///
/// Domains are a closed set: the engine only synchronizes device classes it
/// understands, and the attribute mapper branches on this tag to decide
/// which attributes are relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// A dimmable, possibly color-capable light.
    Light,
    /// A plain on/off switch.
    Switch,
    /// A fan with a speed percentage and optional preset modes.
    Fan,
    /// A cover (blind, curtain, garage door) with position and tilt.
    Cover,
    /// A climate device with an operating mode and a target setpoint.
    Climate,
    /// A read-only sensor reporting a measurement or text value.
    Sensor,
}

impl Domain {
    /// Returns true if entities of this domain can never be written to.
    ///
    /// Read-only domains are accepted in pair configurations, but
    /// propagation toward them is a no-op.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Domain::Sensor)
    }

    /// Returns true if state changes in this domain are discrete and
    /// instantaneous (no settling process to debounce).
    ///
    /// Discrete domains bypass the cooldown gate: delaying an on/off flip
    /// is perceptible as lag, and there is no burst to collapse.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Domain::Switch)
    }

    /// Returns true if this domain carries a coarse on/off state that can
    /// be mirrored onto `other` when the domains differ.
    pub fn basic_compatible(&self, other: Domain) -> bool {
        self.has_power() && other.has_power()
    }

    /// Returns true if entities of this domain expose an on/off state.
    pub fn has_power(&self) -> bool {
        matches!(
            self,
            Domain::Light | Domain::Switch | Domain::Fan | Domain::Cover
        )
    }

    /// Returns the lowercase name used in entity references.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Light => "light",
            Domain::Switch => "switch",
            Domain::Fan => "fan",
            Domain::Cover => "cover",
            Domain::Climate => "climate",
            Domain::Sensor => "sensor",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = crate::ParseEntityRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Domain::Light),
            "switch" => Ok(Domain::Switch),
            "fan" => Ok(Domain::Fan),
            "cover" => Ok(Domain::Cover),
            "climate" => Ok(Domain::Climate),
            "sensor" => Ok(Domain::Sensor),
            _ => Err(crate::ParseEntityRefError::UnknownDomain(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_domains() {
        assert!(Domain::Sensor.is_read_only());
        assert!(!Domain::Light.is_read_only());
        assert!(!Domain::Switch.is_read_only());
    }

    #[test]
    fn discrete_domains() {
        assert!(Domain::Switch.is_discrete());
        assert!(!Domain::Light.is_discrete());
        assert!(!Domain::Cover.is_discrete());
    }

    #[test]
    fn basic_compatibility() {
        assert!(Domain::Switch.basic_compatible(Domain::Light));
        assert!(Domain::Light.basic_compatible(Domain::Fan));
        assert!(!Domain::Switch.basic_compatible(Domain::Sensor));
        assert!(!Domain::Climate.basic_compatible(Domain::Light));
    }

    #[test]
    fn round_trip_names() {
        for domain in [
            Domain::Light,
            Domain::Switch,
            Domain::Fan,
            Domain::Cover,
            Domain::Climate,
            Domain::Sensor,
        ] {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), domain);
        }
    }

    #[test]
    fn unknown_domain_rejected() {
        assert!("vacuum".parse::<Domain>().is_err());
    }
}
