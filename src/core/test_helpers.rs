//! Shared test utilities for core module tests
//!
//! Provides fixed-text match/action implementations and chain builders so
//! tests can pin exact rendered output without going through the concrete
//! `MatchCriteria`/`Action` types. Only compiled in test mode.

use crate::core::actions::{Action, ActionRender};
use crate::core::chain::Chain;
use crate::core::features::Features;
use crate::core::match_criteria::{MatchCriteria, MatchRender};
use crate::core::rules::Rule;

/// Match criteria that always renders to the given text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMatch(pub &'static str);

impl MatchRender for FixedMatch {
    fn render(&self) -> String {
        self.0.to_string()
    }
}

/// Action that always renders to the given text, ignoring features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAction(pub &'static str);

impl ActionRender for FixedAction {
    fn to_fragment(&self, _features: &Features) -> String {
        self.0.to_string()
    }
}

/// Creates a rule with the given fixed match and action text.
pub fn fixed_rule(
    match_text: &'static str,
    action_text: &'static str,
) -> Rule<FixedMatch, FixedAction> {
    Rule::new(FixedMatch(match_text), FixedAction(action_text))
}

/// Creates a chain of fixed-text rules.
pub fn fixed_chain(
    name: &str,
    rules: &[(&'static str, &'static str)],
) -> Chain<FixedMatch, FixedAction> {
    Chain::new(name, rules.iter().map(|(m, a)| fixed_rule(m, a)).collect())
}

/// Creates a small workload-dispatch style chain using the concrete types.
pub fn create_test_chain(name: &str) -> Chain {
    Chain::new(
        name,
        vec![
            Rule::new(
                MatchCriteria::new().conntrack_state("INVALID"),
                Action::Drop,
            )
            .with_comment("drop invalid"),
            Rule::new(
                MatchCriteria::new()
                    .protocol("tcp")
                    .source_ip_set("cali40s:web-clients"),
                Action::Accept,
            ),
            Rule::new(
                MatchCriteria::new()
                    .protocol("udp")
                    .dest_ip_set("cali40s:dns-servers"),
                Action::Jump {
                    target: "cali-pi-dns".to_string(),
                },
            ),
        ],
    )
}
