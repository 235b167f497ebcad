// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, sync::Arc};

use clap::{ArgMatches, Command, arg};
use colored::Colorize;
use davsync_core::{
    ConcurrencyGate, DavCollection, GateKey, LocalDb, RawBodyBuilder, SyncOrchestrator,
    SyncOutcome, SyncStatus,
};
use davsync_dav::{DavClient, Href};
use tokio_util::sync::CancellationToken;

use crate::config::{CollectionConfig, Config};

#[derive(Debug, Clone)]
pub struct CmdSync {
    /// Only synchronize the collection with this href.
    pub collection: Option<String>,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Synchronize the configured collections")
            .arg(
                arg!(--collection <HREF> "Only synchronize the collection at this href")
                    .required(false),
            )
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            collection: matches.get_one::<String>("collection").cloned(),
        }
    }

    /// Runs one synchronization per selected collection, one after another.
    ///
    /// Fails if any run failed, after all of them were attempted.
    pub async fn run(self, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "synchronizing collections...");

        let collections = self.select(config)?;
        let client = DavClient::new(config.server.clone())?;

        let path = config.database_path()?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| format!("Failed to create state directory {}: {}", dir.display(), e))?;
        }
        let db = LocalDb::open(Some(&path)).await?;

        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted, stopping before the next request");
                    cancel.cancel();
                }
            }
        });

        let gate = Arc::new(ConcurrencyGate::new());
        let mut failed = 0;
        for collection in &collections {
            let kind = collection.kind;
            let sync = SyncOrchestrator::new(
                DavCollection::new(client.clone(), collection.href.as_str(), kind),
                db.collection(collection.href.as_str(), kind),
                RawBodyBuilder::new(kind),
                kind,
                GateKey::new(collection.account.as_str(), collection.href.as_str()),
            )
            .with_config(config.sync.clone())
            .with_gate(gate.clone())
            .with_cancellation(cancel.clone());

            let outcome = sync.run().await;
            report(collection, &outcome);
            if !outcome.is_success() {
                failed += 1;
            }
        }

        interrupt.abort();
        db.close().await;

        if failed > 0 {
            return Err(format!(
                "{failed} of {} collections failed to synchronize",
                collections.len()
            )
            .into());
        }
        Ok(())
    }

    fn select<'a>(&self, config: &'a Config) -> Result<Vec<&'a CollectionConfig>, Box<dyn Error>> {
        let selected: Vec<_> = match &self.collection {
            Some(href) => {
                let href = Href::from(href.as_str());
                config
                    .collections
                    .iter()
                    .filter(|c| href.same_path(&Href::from(c.href.as_str())))
                    .collect()
            }
            None => config.collections.iter().collect(),
        };

        if selected.is_empty() {
            return Err(match &self.collection {
                Some(href) => format!("No configured collection matches {href}"),
                None => "No collections configured".to_string(),
            }
            .into());
        }
        Ok(selected)
    }
}

fn report(collection: &CollectionConfig, outcome: &SyncOutcome) {
    let status = match outcome.status {
        SyncStatus::Completed => "synced".green(),
        SyncStatus::UpToDate => "up to date".green(),
        SyncStatus::Busy => "busy".yellow(),
        SyncStatus::Failed => "failed".red(),
    };
    println!(
        "{} {} ({}): {} new, {} updated, {} deleted, {} skipped; pushed {} changes, {} deletions",
        status.bold(),
        collection.href,
        collection.kind,
        outcome.inserted,
        outcome.updated,
        outcome.deleted,
        outcome.skipped,
        outcome.pushed_dirty,
        outcome.pushed_deleted,
    );
    if let Some(err) = &outcome.error {
        println!("  {} {}", "Error:".red(), err);
    }
}
