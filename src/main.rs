// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use subzone::api::HttpZoneApi;
use subzone::constants::{
    DEFAULT_RESERVED_FILE, DOMAINS_DIR, ENV_API_TOKEN, ENV_API_URL, ENV_ZONE_ID, ENV_ZONE_NAME,
};
use subzone::definition::{parse_change_feed, subdomain_from_path, ChangeStatus};
use subzone::reconcile::{delete_subdomain, process_changes, RunSummary};
use subzone::reserved::ReservedNameSet;
use subzone::validate::validate;
use tracing::{debug, info};

/// Declarative subdomain registry reconciler.
#[derive(Parser)]
#[command(name = "subzone", version, about)]
struct Cli {
    /// Repository root the definition paths are relative to
    #[arg(long, global = true, default_value = ".")]
    repo_root: PathBuf,

    /// Reserved-subdomain side file, relative to the repository root
    #[arg(long, global = true, default_value = DEFAULT_RESERVED_FILE)]
    reserved_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Provider connection settings shared by network-touching subcommands.
#[derive(Args)]
struct ProviderArgs {
    /// Provider API base URL
    #[arg(
        long,
        env = ENV_API_URL,
        default_value = "https://api.cloudflare.com/client/v4"
    )]
    api_url: String,

    /// Provider zone id for the parent domain
    #[arg(long, env = ENV_ZONE_ID)]
    zone_id: String,

    /// Parent zone name, e.g. example.com
    #[arg(long, env = ENV_ZONE_NAME)]
    zone_name: String,

    /// Provider API bearer token
    #[arg(long, env = ENV_API_TOKEN, hide_env_values = true)]
    api_token: String,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and converge the changed definition files
    Sync {
        /// Change feed file in `git diff --name-status` form
        #[arg(long)]
        changes: PathBuf,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Validate definitions without any network effect (CI gate)
    Check {
        /// Change feed file; when omitted, every definition file is checked
        #[arg(long)]
        changes: Option<PathBuf>,
    },

    /// Delete one subdomain's remote records and redirect rules
    Delete {
        /// The subdomain to tear down
        subdomain: String,

        #[command(flatten)]
        provider: ProviderArgs,
    },
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("subzone")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Sync { changes, provider } => {
            let feed = std::fs::read_to_string(&changes)
                .with_context(|| format!("cannot read change feed '{}'", changes.display()))?;
            let changed = parse_change_feed(&feed)?;
            if changed.is_empty() {
                info!("No definition files changed; nothing to do");
                return Ok(());
            }

            let reserved = ReservedNameSet::load(&cli.repo_root.join(&cli.reserved_file));
            let api = HttpZoneApi::new(&provider.api_url, &provider.zone_id, &provider.api_token)?;

            let summary = process_changes(
                &api,
                &provider.zone_name,
                &cli.repo_root,
                &changed,
                &reserved,
            )
            .await?;
            print_summary(&summary);
        }
        Command::Check { changes } => {
            let reserved = ReservedNameSet::load(&cli.repo_root.join(&cli.reserved_file));
            let paths = match changes {
                Some(changes) => {
                    let feed = std::fs::read_to_string(&changes).with_context(|| {
                        format!("cannot read change feed '{}'", changes.display())
                    })?;
                    parse_change_feed(&feed)?
                        .into_iter()
                        .filter(|c| c.status != ChangeStatus::Deleted)
                        .map(|c| c.path)
                        .collect()
                }
                None => all_definition_paths(&cli.repo_root)?,
            };

            for path in &paths {
                let content = std::fs::read_to_string(cli.repo_root.join(path))
                    .with_context(|| format!("cannot read '{path}'"))?;
                validate(path, &content, &reserved).map_err(|e| anyhow!("{path}: {e}"))?;
                debug!(path = %path, "Definition valid");
            }
            info!(checked = paths.len(), "All definitions valid");
        }
        Command::Delete {
            subdomain,
            provider,
        } => {
            let api = HttpZoneApi::new(&provider.api_url, &provider.zone_id, &provider.api_token)?;
            let mut summary = RunSummary::default();
            delete_subdomain(&api, &provider.zone_name, &subdomain, &mut summary).await?;
            print_summary(&summary);
        }
    }

    Ok(())
}

/// Enumerate every definition file under the domains directory, sorted for
/// deterministic output.
fn all_definition_paths(repo_root: &std::path::Path) -> Result<Vec<String>> {
    let dir = repo_root.join(DOMAINS_DIR);
    let entries = std::fs::read_dir(&dir)
        .with_context(|| format!("cannot read definitions directory '{}'", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry?;
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let path = format!("{DOMAINS_DIR}/{file_name}");
        if subdomain_from_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn print_summary(summary: &RunSummary) {
    println!(
        "subzone: converged ({} created, {} updated, {} deleted, {} ruleset writes)",
        summary.created, summary.updated, summary.deleted, summary.ruleset_writes
    );
}

/// Initialize logging with custom format.
///
/// Respects RUST_LOG environment variable if set, otherwise defaults to INFO level.
/// Respects RUST_LOG_FORMAT environment variable for output format (text or json).
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}
