//! Core rule rendering and hashing
//!
//! This module contains the types and logic for turning rule descriptions
//! into `iptables-restore` lines and for identifying rules by hash:
//!
//! - [`rules`]: Rule renderer (append/insert/insert-at/replace)
//! - [`chain`]: Chains, the chained rule hasher and the IP set extractor
//! - [`match_criteria`]: Match criteria seam and concrete implementation
//! - [`actions`]: Action seam and concrete targets
//! - [`features`]: Capability descriptor passed through to actions
//! - [`chain_file`]: Loading chains from JSON files
//! - [`error`]: Error types for the surfaces around the core

pub mod actions;
pub mod chain;
pub mod chain_file;
pub mod error;
pub mod features;
pub mod match_criteria;
pub mod rules;

#[cfg(test)]
pub mod test_helpers;
