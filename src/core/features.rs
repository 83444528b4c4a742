//! Capability descriptor for the target iptables version
//!
//! [`Features`] describes which rendering variants the installed
//! iptables/kernel combination supports. It is detected and owned by the
//! caller; the rule renderer only hands it through to action rendering.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Features {
    /// SNAT supports `--random-fully`
    #[serde(default)]
    pub snat_fully_random: bool,
    /// MASQUERADE supports `--random-fully`
    #[serde(default)]
    pub masq_fully_random: bool,
    /// `iptables-restore` supports `--wait`/lock handling
    #[serde(default)]
    pub restore_supports_lock: bool,
}

impl Features {
    /// Features with every optional capability enabled.
    pub const fn all() -> Self {
        Self {
            snat_fully_random: true,
            masq_fully_random: true,
            restore_supports_lock: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_false() {
        let features: Features = serde_json::from_str(r#"{"masq_fully_random": true}"#).unwrap();
        assert!(features.masq_fully_random);
        assert!(!features.snat_fully_random);
        assert!(!features.restore_supports_lock);
    }
}
