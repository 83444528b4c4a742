//! Chain file loading
//!
//! A chain file is a JSON array of chains:
//!
//! ```json
//! [
//!   {
//!     "name": "cali-FORWARD",
//!     "rules": [
//!       { "match_criteria": ["-m conntrack --ctstate INVALID"], "action": "drop" },
//!       { "action": { "jump": { "target": "cali-from-hep-forward" } }, "comment": ["from host endpoints"] }
//!     ]
//!   }
//! ]
//! ```
//!
//! Names are validated on load so that every chain handed to the renderer
//! is one iptables would accept.

use crate::core::chain::{Chain, chain_rule_hashes, first_divergence};
use crate::core::error::{Error, Result};
use crate::core::features::Features;
use crate::validators::validate_chain_name;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Maximum number of rules accepted per chain
///
/// Sanity limit applied after parsing; it rejects runaway generated files
/// but does not bound the memory used to parse them.
pub const MAX_RULES_PER_CHAIN: usize = 10_000;

/// Parses and validates chain file contents.
///
/// # Errors
///
/// Returns `Err` if:
/// - The JSON does not describe an array of chains
/// - A chain name is invalid or appears twice
/// - A chain exceeds [`MAX_RULES_PER_CHAIN`]
pub fn parse_chains(json: &str) -> Result<Vec<Chain>> {
    let chains: Vec<Chain> = serde_json::from_str(json)?;

    let mut seen = HashSet::with_capacity(chains.len());
    for (idx, chain) in chains.iter().enumerate() {
        validate_chain_name(&chain.name)
            .map_err(|message| Error::validation(format!("chains[{idx}].name"), message))?;

        if !seen.insert(chain.name.as_str()) {
            return Err(Error::validation(
                format!("chains[{idx}].name"),
                format!("Duplicate chain '{}'", chain.name),
            ));
        }

        if chain.rules.len() > MAX_RULES_PER_CHAIN {
            return Err(Error::validation(
                format!("chains[{idx}].rules"),
                format!("Too many rules (max {MAX_RULES_PER_CHAIN})"),
            ));
        }

        debug!(chain = %chain.name, rules = chain.rules.len(), "Loaded chain");
    }

    Ok(chains)
}

/// Reads and validates a chain file from disk.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or fails [`parse_chains`].
pub fn load_chains(path: &Path) -> Result<Vec<Chain>> {
    let json = std::fs::read_to_string(path)?;
    let chains = parse_chains(&json)?;
    info!("Loaded {} chain(s) from {}", chains.len(), path.display());
    Ok(chains)
}

/// Looks up a chain by name.
pub fn find_chain<'a>(chains: &'a [Chain], name: &str) -> Option<&'a Chain> {
    chains.iter().find(|c| c.name == name)
}

/// Outcome of comparing one chain between a desired and an installed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainComparison {
    pub desired_rules: usize,
    pub installed_rules: usize,
    /// First rule index whose hash differs, `None` when in sync.
    pub divergence: Option<usize>,
}

/// Compares the rule hashes of `name` in two sets of chains.
///
/// A chain present on only one side compares against an empty chain.
///
/// # Errors
///
/// Returns a validation error if `name` is in neither set.
pub fn compare_chain(
    desired: &[Chain],
    installed: &[Chain],
    name: &str,
    features: &Features,
) -> Result<ChainComparison> {
    let want_chain = find_chain(desired, name);
    let have_chain = find_chain(installed, name);
    if want_chain.is_none() && have_chain.is_none() {
        return Err(Error::validation(
            "chain",
            format!("Chain '{name}' not found in either file"),
        ));
    }

    let want = chain_rule_hashes(want_chain, features);
    let have = chain_rule_hashes(have_chain, features);
    Ok(ChainComparison {
        desired_rules: want.len(),
        installed_rules: have.len(),
        divergence: first_divergence(&want, &have),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::Action;

    const SAMPLE: &str = r#"[
        {
            "name": "cali-FORWARD",
            "rules": [
                { "match_criteria": ["-m conntrack --ctstate INVALID"], "action": "drop" },
                {
                    "action": { "jump": { "target": "cali-from-hep-forward" } },
                    "comment": ["from host endpoints"]
                }
            ]
        },
        { "name": "cali-empty" }
    ]"#;

    #[test]
    fn test_parse_sample() {
        let chains = parse_chains(SAMPLE).unwrap();
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].rules.len(), 2);
        assert_eq!(chains[0].rules[0].action, Action::Drop);
        assert_eq!(chains[0].rules[1].comment, vec!["from host endpoints"]);
        assert!(chains[1].rules.is_empty());
    }

    #[test]
    fn test_find_chain() {
        let chains = parse_chains(SAMPLE).unwrap();
        assert!(find_chain(&chains, "cali-empty").is_some());
        assert!(find_chain(&chains, "cali-missing").is_none());
    }

    #[test]
    fn test_rejects_invalid_name() {
        let err = parse_chains(r#"[{"name": "bad name"}]"#).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "chains[0].name"));
    }

    #[test]
    fn test_rejects_duplicate_name() {
        let err = parse_chains(r#"[{"name": "a"}, {"name": "a"}]"#).unwrap_err();
        assert!(err.to_string().contains("Duplicate chain"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = parse_chains(r#"{"name": "not-an-array"}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_compare_chain_in_sync() {
        let chains = parse_chains(SAMPLE).unwrap();
        let cmp = compare_chain(&chains, &chains, "cali-FORWARD", &Features::default()).unwrap();
        assert_eq!(cmp.divergence, None);
        assert_eq!(cmp.desired_rules, 2);
        assert_eq!(cmp.installed_rules, 2);
    }

    #[test]
    fn test_compare_chain_missing_on_one_side() {
        let chains = parse_chains(SAMPLE).unwrap();
        let cmp = compare_chain(&chains, &[], "cali-FORWARD", &Features::default()).unwrap();
        assert_eq!(cmp.divergence, Some(0));
        assert_eq!(cmp.installed_rules, 0);
    }

    #[test]
    fn test_compare_chain_missing_on_both_sides() {
        let chains = parse_chains(SAMPLE).unwrap();
        let err = compare_chain(&chains, &chains, "cali-FORWRD", &Features::default()).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "chain"));
        assert!(err.to_string().contains("cali-FORWRD"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_chains(Path::new("/nonexistent/iptrules/chains.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
