//! Chains and chain-scoped rule hashing
//!
//! Every rule in a [`Chain`] gets a short identity hash that covers the
//! chain name, the rule's own rendering and the hash of the rule before it.
//! Comparing the hashes of a desired chain against those recorded on the
//! installed rules locates the first rule that differs, so a reconciler can
//! rewrite only the tail of the chain.
//!
//! # Algorithm
//!
//! ```text
//! running = SHA-224(chain name)
//! for each rule i:
//!     running = SHA-224(running || render_append(chain, HASH_PLACEHOLDER, features))
//!     hash[i] = base64url_nopad(running)[..16]
//! ```
//!
//! The placeholder stands in for the operational prefix (typically a
//! comment carrying the hash itself), so hashes never depend on how the
//! rules were actually applied.
//!
//! # Concurrency
//!
//! Each call owns its digest; concurrent calls for different chains need
//! no locking.

use super::actions::{Action, ActionRender};
use super::features::Features;
use super::match_criteria::{MatchCriteria, MatchRender};
use super::rules::{Directive, Rule, comment_fragment};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224};
use tracing::debug;

/// Length of an encoded rule hash.
///
/// Shorter is better for comment size and readability, longer for collision
/// resistance. 16 base64 characters carry 96 bits.
pub const HASH_LENGTH: usize = 16;

/// Prefix fragment rendered in place of the operational prefix while hashing.
pub const HASH_PLACEHOLDER: &str = "HASH";

/// Match option whose argument names a referenced IP set.
const MATCH_SET_OPTION: &str = "--match-set";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(bound(deserialize = "M: Deserialize<'de> + Default, A: Deserialize<'de>"))]
pub struct Chain<M = MatchCriteria, A = Action> {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule<M, A>>,
}

impl<M, A> Chain<M, A> {
    pub fn new(name: impl Into<String>, rules: Vec<Rule<M, A>>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

impl<M: MatchRender, A: ActionRender> Chain<M, A> {
    /// Identity hash of every rule, in chain order.
    pub fn rule_hashes(&self, features: &Features) -> Vec<String> {
        RuleHasher::new(features).hashes(Some(self))
    }

    /// IDs of the IP sets referenced by the rules' match criteria.
    ///
    /// Each match fragment is scanned on its own, so an option and its
    /// argument must sit in the same fragment. Duplicates are kept, in rule
    /// order.
    pub fn ip_set_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for rule in &self.rules {
            for fragment in rule.match_criteria.render_fragments() {
                let words: Vec<&str> = fragment.split_whitespace().collect();
                for pair in words.windows(2) {
                    if pair[0] == MATCH_SET_OPTION {
                        ids.push(pair[1].to_string());
                    }
                }
            }
        }
        ids
    }

    /// Renders every rule with a prefix comment carrying the rule's identity
    /// hash, e.g. `-m comment --comment "cali:<hash>"`.
    ///
    /// `first` applies to the first rule; numbered directives advance by one
    /// per rule so the output keeps chain order.
    pub fn render_with_hash_comments(
        &self,
        first: Directive,
        hash_prefix: &str,
        features: &Features,
    ) -> Vec<String> {
        self.rule_hashes(features)
            .iter()
            .zip(&self.rules)
            .enumerate()
            .map(|(idx, (hash, rule))| {
                let prefix = comment_fragment(&format!("{hash_prefix}:{hash}"));
                rule.render(first.offset(idx), &self.name, &prefix, features)
            })
            .collect()
    }
}

/// Identity hashes of `chain`'s rules; an absent chain has none.
pub fn chain_rule_hashes<M: MatchRender, A: ActionRender>(
    chain: Option<&Chain<M, A>>,
    features: &Features,
) -> Vec<String> {
    RuleHasher::new(features).hashes(chain)
}

/// IP set IDs referenced by `chain`; an absent chain references none.
pub fn referenced_set_ids<M: MatchRender, A: ActionRender>(
    chain: Option<&Chain<M, A>>,
) -> Vec<String> {
    chain.map(|c| c.ip_set_ids()).unwrap_or_default()
}

/// Index of the first rule whose hash differs between the two sequences.
///
/// If one sequence is a strict prefix of the other, the divergence is at
/// the end of the shorter one. Returns `None` when both are identical.
pub fn first_divergence(desired: &[String], installed: &[String]) -> Option<usize> {
    desired
        .iter()
        .zip(installed)
        .position(|(want, have)| want != have)
        .or_else(|| {
            (desired.len() != installed.len()).then(|| desired.len().min(installed.len()))
        })
}

/// Details of one hashed rule, handed to a [`HashObserver`].
#[derive(Debug, Clone, Copy)]
pub struct RuleHashed<'a> {
    pub chain: &'a str,
    pub position: usize,
    /// The rule as rendered for hashing (with the placeholder prefix)
    pub rendered: &'a str,
    pub hash: &'a str,
}

/// Receives a callback for every rule hashed.
pub trait HashObserver {
    fn rule_hashed(&self, event: &RuleHashed<'_>);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl HashObserver for NoopObserver {
    fn rule_hashed(&self, _event: &RuleHashed<'_>) {}
}

/// Emits a `debug` event per hashed rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl HashObserver for TracingObserver {
    fn rule_hashed(&self, event: &RuleHashed<'_>) {
        debug!(
            chain = event.chain,
            position = event.position,
            rule_fragment = event.rendered,
            hash = event.hash,
            "Hashed rule"
        );
    }
}

/// Computes chained rule hashes for a fixed set of [`Features`].
pub struct RuleHasher<'f, O = NoopObserver> {
    features: &'f Features,
    observer: O,
}

impl<'f> RuleHasher<'f, NoopObserver> {
    pub fn new(features: &'f Features) -> Self {
        Self {
            features,
            observer: NoopObserver,
        }
    }
}

impl<'f, O: HashObserver> RuleHasher<'f, O> {
    pub fn with_observer<P: HashObserver>(self, observer: P) -> RuleHasher<'f, P> {
        RuleHasher {
            features: self.features,
            observer,
        }
    }

    /// Hashes every rule of `chain` in order. An absent chain yields no hashes.
    pub fn hashes<M: MatchRender, A: ActionRender>(
        &self,
        chain: Option<&Chain<M, A>>,
    ) -> Vec<String> {
        let Some(chain) = chain else {
            return Vec::new();
        };

        let mut hashes = Vec::with_capacity(chain.rules.len());

        // Seed with the chain name so identical rules in different chains
        // get different hashes.
        let mut hasher = Sha224::new();
        hasher.update(chain.name.as_bytes());
        let mut running = hasher.finalize_reset();

        for (position, rule) in chain.rules.iter().enumerate() {
            let rendered = rule.render_append(&chain.name, HASH_PLACEHOLDER, self.features);

            // Chain in the previous digest so position and all earlier
            // rules feed into this rule's hash.
            hasher.update(&running);
            hasher.update(rendered.as_bytes());
            running = hasher.finalize_reset();

            let mut hash = URL_SAFE_NO_PAD.encode(&running);
            hash.truncate(HASH_LENGTH);

            self.observer.rule_hashed(&RuleHashed {
                chain: &chain.name,
                position,
                rendered: &rendered,
                hash: &hash,
            });
            hashes.push(hash);
        }

        hashes
    }
}
