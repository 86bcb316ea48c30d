#![forbid(unsafe_code)]

//! `solman`: list, select and bulk-delete unmanaged Dataverse solutions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solman_core::{load_or_default, FileSettingsStore, PluginIdentity, SolutionManager};
use solman_dataverse::DataverseClient;

mod cli;
mod commands;
mod paths;
mod prompt;
mod shell;
mod table;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&cli.log))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = FileSettingsStore::new(paths::settings_dir(cli.settings_dir.as_deref())?);
    let identity = PluginIdentity::solution_manager();
    let settings = load_or_default(&store, &identity).context("load settings")?;

    let Some(org_url) = cli.url.clone().or_else(|| settings.last_used_org_url.clone()) else {
        bail!("no organization url; pass --url or set SOLMAN_URL");
    };

    let client = DataverseClient::new(
        &org_url,
        cli.token.clone(),
        Duration::from_secs(cli.timeout_secs),
    )
    .with_context(|| format!("connect to {org_url}"))?;

    let mut mgr = SolutionManager::new(settings);
    mgr.connect(Arc::new(client), org_url)?;

    let result = match cli.cmd {
        Command::List {
            sort,
            desc,
            filter,
            json,
        } => commands::list(&mut mgr, sort, desc, filter, json).await,
        Command::Delete { unique_names, yes } => {
            commands::delete(&mut mgr, &unique_names, yes).await
        }
        Command::Shell => shell::run(&mut mgr).await,
    };

    if let Err(e) = mgr.save_settings(&store, &identity) {
        tracing::warn!(error = %e, "saving settings failed");
    }
    result
}
