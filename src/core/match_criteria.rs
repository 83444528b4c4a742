//! Match criteria for iptables rules
//!
//! The renderer only needs a match value to turn itself into text, so the
//! seam is the [`MatchRender`] trait. [`MatchCriteria`] is the concrete
//! implementation used by chain files and the CLI: an ordered list of
//! already-rendered fragments, ANDed together by iptables.
//!
//! # Example
//!
//! ```
//! use iptrules::core::match_criteria::{MatchCriteria, MatchRender};
//!
//! let m = MatchCriteria::new()
//!     .protocol("tcp")
//!     .source_ip_set("cali40s:abc");
//! assert_eq!(m.render(), "-p tcp -m set --match-set cali40s:abc src");
//! ```

use serde::{Deserialize, Serialize};

/// Renders match criteria to iptables syntax. May return an empty string.
pub trait MatchRender {
    fn render(&self) -> String;

    /// The rendered criteria split into independent fragments.
    ///
    /// `render()` is these joined with single spaces. Implementations that
    /// have no finer structure return the whole rendering as one fragment.
    fn render_fragments(&self) -> Vec<String> {
        vec![self.render()]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MatchCriteria(Vec<String>);

impl MatchCriteria {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a fragment verbatim.
    pub fn raw(mut self, fragment: impl Into<String>) -> Self {
        self.0.push(fragment.into());
        self
    }

    pub fn protocol(self, protocol: &str) -> Self {
        self.raw(format!("-p {protocol}"))
    }

    pub fn in_interface(self, iface: &str) -> Self {
        self.raw(format!("--in-interface {iface}"))
    }

    pub fn out_interface(self, iface: &str) -> Self {
        self.raw(format!("--out-interface {iface}"))
    }

    pub fn conntrack_state(self, state: &str) -> Self {
        self.raw(format!("-m conntrack --ctstate {state}"))
    }

    pub fn source_net(self, net: &str) -> Self {
        self.raw(format!("--source {net}"))
    }

    pub fn dest_net(self, net: &str) -> Self {
        self.raw(format!("--destination {net}"))
    }

    pub fn source_ip_set(self, set_id: &str) -> Self {
        self.raw(format!("-m set --match-set {set_id} src"))
    }

    pub fn dest_ip_set(self, set_id: &str) -> Self {
        self.raw(format!("-m set --match-set {set_id} dst"))
    }

    pub fn mark_matches(self, mark: u32, mask: u32) -> Self {
        self.raw(format!("-m mark --mark {mark:#x}/{mask:#x}"))
    }

    /// The individual fragments, in order.
    pub fn fragments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl MatchRender for MatchCriteria {
    fn render(&self) -> String {
        self.0.join(" ")
    }

    fn render_fragments(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl From<Vec<String>> for MatchCriteria {
    fn from(fragments: Vec<String>) -> Self {
        Self(fragments)
    }
}
