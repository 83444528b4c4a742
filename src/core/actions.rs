//! Rule actions and their iptables rendering
//!
//! [`ActionRender`] is the seam the rule renderer depends on. The concrete
//! [`Action`] enum covers the targets a dataplane typically programs; some
//! of them render differently depending on the [`Features`] of the target
//! iptables version.

use super::features::Features;
use serde::{Deserialize, Serialize};

/// Renders an action to iptables syntax for the given capabilities.
///
/// Must return identical text for identical inputs; rule hashes depend on it.
/// May return an empty string.
pub trait ActionRender {
    fn to_fragment(&self, features: &Features) -> String;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Accept,
    Drop,
    Return,
    /// Jump to another chain, returning on `RETURN`
    Jump { target: String },
    /// Continue in another chain without returning
    Goto { target: String },
    Log { prefix: String },
    SetMark { mark: u32, mask: u32 },
    ClearMark { mark: u32 },
    Masquerade,
    Snat { to_addr: String },
    Dnat {
        dest_addr: String,
        #[serde(default)]
        dest_port: Option<u16>,
    },
    /// No target; the rule only counts packets
    NoOp,
}

impl ActionRender for Action {
    fn to_fragment(&self, features: &Features) -> String {
        match self {
            Action::Accept => "--jump ACCEPT".to_string(),
            Action::Drop => "--jump DROP".to_string(),
            Action::Return => "--jump RETURN".to_string(),
            Action::Jump { target } => format!("--jump {target}"),
            Action::Goto { target } => format!("--goto {target}"),
            Action::Log { prefix } => {
                format!("--jump LOG --log-prefix {prefix}: --log-level 5")
            }
            Action::SetMark { mark, mask } => {
                format!("--jump MARK --set-mark {mark:#x}/{mask:#x}")
            }
            Action::ClearMark { mark } => format!("--jump MARK --set-mark 0/{mark:#x}"),
            Action::Masquerade => {
                if features.masq_fully_random {
                    "--jump MASQUERADE --random-fully".to_string()
                } else {
                    "--jump MASQUERADE".to_string()
                }
            }
            Action::Snat { to_addr } => {
                if features.snat_fully_random {
                    format!("--jump SNAT --to-source {to_addr} --random-fully")
                } else {
                    format!("--jump SNAT --to-source {to_addr}")
                }
            }
            Action::Dnat {
                dest_addr,
                dest_port: Some(port),
            } => format!("--jump DNAT --to-destination {dest_addr}:{port}"),
            Action::Dnat {
                dest_addr,
                dest_port: None,
            } => format!("--jump DNAT --to-destination {dest_addr}"),
            Action::NoOp => String::new(),
        }
    }
}

impl Action {
    /// Short snake_case name of the action kind, for logging.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
