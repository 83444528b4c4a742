//! iptrules - iptables rule rendering and chain hashing
//!
//! Renders abstract rule descriptions into `iptables-restore` lines and
//! computes a deterministic, position-sensitive identity hash for every
//! rule in a chain, so a reconciler can tell where an installed chain first
//! diverges from the desired one.
//!
//! # Architecture
//!
//! - [`core`] - Rule renderer, chain hasher, IP set extraction
//! - [`validators`] - Comment sanitization and input validation
//! - [`config`] - Configuration persistence for the CLI
//! - [`utils`] - Utility functions (XDG directories)
//!
//! # Example
//!
//! ```
//! use iptrules::{Action, Chain, Features, MatchCriteria, Rule};
//!
//! let chain = Chain::new(
//!     "cali-FORWARD",
//!     vec![Rule::new(MatchCriteria::new(), Action::Accept)],
//! );
//! let features = Features::default();
//!
//! assert_eq!(
//!     chain.rules[0].render_append(&chain.name, "", &features),
//!     "-A cali-FORWARD --jump ACCEPT"
//! );
//! assert_eq!(chain.rule_hashes(&features)[0].len(), 16);
//! ```

#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod core;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use crate::core::actions::{Action, ActionRender};
pub use crate::core::chain::{
    Chain, HASH_LENGTH, chain_rule_hashes, first_divergence, referenced_set_ids,
};
pub use crate::core::error::{Error, Result};
pub use crate::core::features::Features;
pub use crate::core::match_criteria::{MatchCriteria, MatchRender};
pub use crate::core::rules::{Directive, Rule};
