pub mod breakdown;
pub mod dashboard;
pub mod entries;
pub mod export;
pub mod extract;
pub mod health;
pub mod revenue;
pub mod schema;
pub mod vat;

use crate::core::{Kind, Snapshot};
use crate::extract::HttpExtractor;
use crate::store::{self, EntryStore, HttpStore, LedgerStore};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

/// Where entries are read from and written to
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Base URL of the bookkeeping service
    #[arg(long, global = true, env = "TVAC_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Local JSON ledger file, used instead of the service when set
    #[arg(long, global = true, env = "TVAC_LEDGER")]
    ledger: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "TVAC_TIMEOUT", default_value_t = 30)]
    timeout: u64,
}

impl SourceArgs {
    pub async fn open_store(&self) -> anyhow::Result<Box<dyn EntryStore>> {
        match &self.ledger {
            Some(path) => {
                log::debug!("Using ledger file {}", path.display());
                Ok(Box::new(LedgerStore::open(path).await?))
            }
            None => {
                log::debug!("Using service at {}", self.api_url);
                Ok(Box::new(HttpStore::new(&self.api_url, self.timeout())?))
            }
        }
    }

    pub fn extractor(&self) -> anyhow::Result<HttpExtractor> {
        Ok(HttpExtractor::new(&self.api_url, self.timeout())?)
    }

    /// Fresh snapshot of every entry; skipped records are reported on stderr
    pub async fn snapshot(&self) -> anyhow::Result<Snapshot> {
        let store = self.open_store().await?;
        let snapshot = store::load_snapshot(store.as_ref()).await?;
        for warning in &snapshot.warnings {
            eprintln!("warning: {}", warning);
        }
        Ok(snapshot)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    #[value(alias = "invoices")]
    Invoice,
    #[value(alias = "expenses")]
    Expense,
}

impl From<KindArg> for Kind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Invoice => Kind::Invoice,
            KindArg::Expense => Kind::Expense,
        }
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Run `work` to completion unless Ctrl-C is pressed first.
///
/// Once a command has listened for Ctrl-C the signal no longer ends the
/// process, so later network calls go through here to stay interruptible.
async fn interruptible<T>(work: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    tokio::select! {
        result = work => result,
        Ok(()) = tokio::signal::ctrl_c() => anyhow::bail!("interrupted"),
    }
}

fn format_eur(amount: Decimal) -> String {
    format!("{:.2} €", amount)
}

fn format_percent(ratio: Decimal) -> String {
    format!("{:.1}%", ratio * Decimal::ONE_HUNDRED)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_skipped(skipped: usize) {
    if skipped > 0 {
        println!("({} malformed entries excluded)", skipped);
    }
}
