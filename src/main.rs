//! iptrules - render and hash iptables chains from JSON chain files
//!
//! # Usage
//!
//! ```bash
//! iptrules render chains.json --chain cali-FORWARD          # one -A line per rule
//! iptrules render chains.json --hash-comments               # tag each rule with its hash
//! iptrules render chains.json -d replace --position 3       # -R lines starting at rule 3
//! iptrules hashes chains.json                               # <chain> <index> <hash>
//! iptrules ipsets chains.json                               # referenced IP set IDs
//! iptrules diff desired.json installed.json --chain cali-FORWARD
//! ```
//!
//! Rendered lines go to stdout; logs go to stderr (`RUST_LOG`, `-v`).

use clap::{Parser, Subcommand, ValueEnum};
use iptrules::config::{AppConfig, load_config, load_config_from};
use iptrules::core::chain::{RuleHasher, TracingObserver};
use iptrules::core::chain_file::{compare_chain, find_chain, load_chains};
use iptrules::validators::validate_hash_prefix;
use iptrules::{Chain, Directive};
use shadow_rs::shadow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

shadow!(build);

#[derive(Parser)]
#[command(name = "iptrules")]
#[command(about = "Render iptables rules and compute chain rule hashes", long_about = None)]
struct Cli {
    /// Config file (default: $IPTRULES_CONFIG or the XDG config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Enable debug logging, including every hashed rule
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the rules of one or all chains
    Render {
        /// Chain file (JSON array of chains)
        file: PathBuf,
        /// Only render this chain
        #[arg(long)]
        chain: Option<String>,
        /// How the rules are applied
        #[arg(short, long, value_enum, default_value_t = DirectiveArg::Append)]
        directive: DirectiveArg,
        /// 1-based position of the first rule for insert-at and replace
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        position: u32,
        /// Fragment inserted after the chain/position tokens
        #[arg(long, default_value = "", conflicts_with = "hash_comments")]
        prefix: String,
        /// Prefix every rule with a comment carrying its hash
        #[arg(long)]
        hash_comments: bool,
    },
    /// Print the identity hash of every rule
    Hashes {
        /// Chain file (JSON array of chains)
        file: PathBuf,
        /// Only hash this chain
        #[arg(long)]
        chain: Option<String>,
    },
    /// List IP sets referenced by the rules
    Ipsets {
        /// Chain file (JSON array of chains)
        file: PathBuf,
        /// Only scan this chain
        #[arg(long)]
        chain: Option<String>,
    },
    /// Find the first rule where two versions of a chain diverge
    Diff {
        /// Chain file with the desired rules
        desired: PathBuf,
        /// Chain file with the installed rules
        installed: PathBuf,
        /// Chain to compare
        #[arg(long)]
        chain: String,
    },
    /// Show build information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectiveArg {
    Append,
    Insert,
    InsertAt,
    Replace,
}

impl DirectiveArg {
    fn with_position(self, position: usize) -> Directive {
        match self {
            DirectiveArg::Append => Directive::Append,
            DirectiveArg::Insert => Directive::Insert,
            DirectiveArg::InsertAt => Directive::InsertAt(position),
            DirectiveArg::Replace => Directive::Replace(position),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => load_config(),
    };

    init_logging(&config, cli.verbose);

    match handle_cli(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs to stderr so rendered output on stdout stays machine-readable.
fn init_logging(config: &AppConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads a chain file and narrows it to one chain if requested.
fn select_chains(
    file: &Path,
    chain: Option<&str>,
) -> Result<Vec<Chain>, Box<dyn std::error::Error>> {
    let chains = load_chains(file)?;
    match chain {
        Some(name) => {
            let found = find_chain(&chains, name)
                .ok_or_else(|| format!("Chain '{name}' not found in {}", file.display()))?;
            Ok(vec![found.clone()])
        }
        None => Ok(chains),
    }
}

fn handle_cli(command: Commands, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let features = &config.features;

    match command {
        Commands::Render {
            file,
            chain,
            directive,
            position,
            prefix,
            hash_comments,
        } => {
            let first = directive.with_position(position as usize);
            for chain in select_chains(&file, chain.as_deref())? {
                let lines = if hash_comments {
                    validate_hash_prefix(&config.hash_comment_prefix)?;
                    chain.render_with_hash_comments(first, &config.hash_comment_prefix, features)
                } else {
                    chain
                        .rules
                        .iter()
                        .enumerate()
                        .map(|(idx, rule)| {
                            debug!(
                                chain = %chain.name,
                                position = idx,
                                action = rule.action.kind(),
                                "Rendering rule"
                            );
                            rule.render(first.offset(idx), &chain.name, &prefix, features)
                        })
                        .collect()
                };
                for line in lines {
                    println!("{line}");
                }
            }
        }
        Commands::Hashes { file, chain } => {
            let hasher = RuleHasher::new(features).with_observer(TracingObserver);
            for chain in select_chains(&file, chain.as_deref())? {
                for (idx, hash) in hasher.hashes(Some(&chain)).iter().enumerate() {
                    println!("{} {idx} {hash}", chain.name);
                }
            }
        }
        Commands::Ipsets { file, chain } => {
            for chain in select_chains(&file, chain.as_deref())? {
                for id in chain.ip_set_ids() {
                    println!("{id}");
                }
            }
        }
        Commands::Diff {
            desired,
            installed,
            chain,
        } => {
            let desired_chains = load_chains(&desired)?;
            let installed_chains = load_chains(&installed)?;

            let cmp = compare_chain(&desired_chains, &installed_chains, &chain, features)?;

            match cmp.divergence {
                None => println!("{chain}: in sync ({} rules)", cmp.desired_rules),
                Some(idx) => {
                    info!(chain = %chain, index = idx, "Chains diverge");
                    println!(
                        "{chain}: diverges at rule {idx} (iptables position {}), desired {} rules, installed {}",
                        idx + 1,
                        cmp.desired_rules,
                        cmp.installed_rules
                    );
                }
            }
        }
        Commands::Version => {
            println!("iptrules {}", build::PKG_VERSION);
            println!(
                "commit {}{}",
                build::SHORT_COMMIT,
                if build::GIT_CLEAN { "" } else { "-dirty" }
            );
            println!("built {}", build::BUILD_TIME);
        }
    }
    Ok(())
}
