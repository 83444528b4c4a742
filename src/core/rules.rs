//! Rule rendering in `iptables-restore` syntax
//!
//! A [`Rule`] renders to a single line such as
//! `-A cali-FORWARD -m comment --comment "allow dns" -p udp --jump ACCEPT`.
//!
//! Rendering is a pure function of the rule, the [`Directive`], the chain
//! name, the prefix fragment and the [`Features`]. Rule hashes are computed
//! from this output, so the byte layout must never change for existing
//! inputs.
//!
//! # Line Layout
//!
//! ```text
//! <verb> <chain> [<position>] [<prefix>] [-m comment --comment "<c>"]... [<match>] [<action>]
//! ```
//!
//! # Example
//!
//! ```
//! use iptrules::core::actions::Action;
//! use iptrules::core::features::Features;
//! use iptrules::core::match_criteria::MatchCriteria;
//! use iptrules::core::rules::Rule;
//!
//! let rule = Rule::new(MatchCriteria::new().protocol("udp"), Action::Accept)
//!     .with_comment("allow dns");
//! assert_eq!(
//!     rule.render_append("cali-FORWARD", "", &Features::default()),
//!     "-A cali-FORWARD -m comment --comment \"allow dns\" -p udp --jump ACCEPT"
//! );
//! ```

use super::actions::{Action, ActionRender};
use super::features::Features;
use super::match_criteria::{MatchCriteria, MatchRender};
use crate::validators::sanitize_comment;
use serde::{Deserialize, Serialize};

/// How a rendered rule is applied to an existing chain.
///
/// Positions are 1-based, as iptables numbers rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Add at the end of the chain
    Append,
    /// Add at the start of the chain
    Insert,
    /// Add before the rule currently at the given position
    InsertAt(usize),
    /// Overwrite the rule at the given position
    Replace(usize),
}

impl Directive {
    /// The iptables option for this directive.
    pub const fn verb(self) -> &'static str {
        match self {
            Directive::Append => "-A",
            Directive::Insert | Directive::InsertAt(_) => "-I",
            Directive::Replace(_) => "-R",
        }
    }

    pub const fn rule_number(self) -> Option<usize> {
        match self {
            Directive::Append | Directive::Insert => None,
            Directive::InsertAt(n) | Directive::Replace(n) => Some(n),
        }
    }

    /// The directive for the rule `offset` places after this one when
    /// writing consecutive rules. Unnumbered directives are unchanged;
    /// positions saturate at `usize::MAX`.
    pub const fn offset(self, offset: usize) -> Self {
        match self {
            Directive::Append | Directive::Insert => self,
            Directive::InsertAt(n) => Directive::InsertAt(n.saturating_add(offset)),
            Directive::Replace(n) => Directive::Replace(n.saturating_add(offset)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule<M = MatchCriteria, A = Action> {
    #[serde(default)]
    pub match_criteria: M,
    pub action: A,
    /// Free-text comments, each rendered as its own comment match
    #[serde(default)]
    pub comment: Vec<String>,
}

impl<M, A> Rule<M, A> {
    pub fn new(match_criteria: M, action: A) -> Self {
        Self {
            match_criteria,
            action,
            comment: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment.push(comment.into());
        self
    }
}

impl<M: MatchRender, A: ActionRender> Rule<M, A> {
    pub fn render_append(&self, chain: &str, prefix: &str, features: &Features) -> String {
        self.render(Directive::Append, chain, prefix, features)
    }

    pub fn render_insert(&self, chain: &str, prefix: &str, features: &Features) -> String {
        self.render(Directive::Insert, chain, prefix, features)
    }

    pub fn render_insert_at(
        &self,
        chain: &str,
        position: usize,
        prefix: &str,
        features: &Features,
    ) -> String {
        self.render(Directive::InsertAt(position), chain, prefix, features)
    }

    pub fn render_replace(
        &self,
        chain: &str,
        position: usize,
        prefix: &str,
        features: &Features,
    ) -> String {
        self.render(Directive::Replace(position), chain, prefix, features)
    }

    /// Renders the rule as one `iptables-restore` line.
    ///
    /// A non-empty `prefix` is inserted verbatim right after the
    /// chain/position tokens. Empty match or action text is skipped.
    pub fn render(
        &self,
        directive: Directive,
        chain: &str,
        prefix: &str,
        features: &Features,
    ) -> String {
        let mut fragments: Vec<String> = Vec::with_capacity(6 + self.comment.len());
        fragments.push(directive.verb().to_string());
        fragments.push(chain.to_string());
        if let Some(n) = directive.rule_number() {
            fragments.push(n.to_string());
        }

        if !prefix.is_empty() {
            fragments.push(prefix.to_string());
        }

        for comment in &self.comment {
            fragments.push(comment_fragment(comment));
        }

        let match_fragment = self.match_criteria.render();
        if !match_fragment.is_empty() {
            fragments.push(match_fragment);
        }

        let action_fragment = self.action.to_fragment(features);
        if !action_fragment.is_empty() {
            fragments.push(action_fragment);
        }

        fragments.join(" ")
    }
}

/// Builds a `-m comment` fragment from untrusted comment text.
pub fn comment_fragment(comment: &str) -> String {
    format!("-m comment --comment \"{}\"", sanitize_comment(comment))
}
