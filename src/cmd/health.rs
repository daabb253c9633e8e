//! Health command - check the entry store is reachable

use super::SourceArgs;
use clap::Args;

#[derive(Args, Debug)]
pub struct HealthCommand {}

impl HealthCommand {
    pub async fn exec(&self, source: &SourceArgs) -> anyhow::Result<()> {
        let store = source.open_store().await?;
        let status = store.health().await?;
        println!("{}", status);
        Ok(())
    }
}
