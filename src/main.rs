use clap::{Parser, Subcommand};

mod cmd;
mod core;
mod export;
mod extract;
mod report;
mod store;
mod tax;

use cmd::SourceArgs;

#[derive(Parser, Debug)]
#[command(name = "tvac", version, about = "VAT bookkeeping for French freelancers")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Current month at a glance with a six month activity chart
    Dashboard(cmd::dashboard::DashboardCommand),
    /// VAT declaration: collected, deductible and net VAT by month and rate
    Vat(cmd::vat::VatCommand),
    /// Invoiced and collected revenue for one year
    Revenue(cmd::revenue::RevenueCommand),
    /// Revenue per client or expenses per category
    Breakdown(cmd::breakdown::BreakdownCommand),
    /// List invoices and expenses
    List(cmd::entries::ListCommand),
    /// Record a new invoice or expense
    Add(cmd::entries::AddCommand),
    /// Change fields of an existing entry
    Update(cmd::entries::UpdateCommand),
    /// Mark an invoice paid or unpaid
    SetPaid(cmd::entries::SetPaidCommand),
    /// Delete an entry
    Delete(cmd::entries::DeleteCommand),
    /// Read entry fields from scanned invoices and receipts
    Extract(cmd::extract::ExtractCommand),
    /// Export invoices or expenses as CSV
    Export(cmd::export::ExportCommand),
    /// Print the ledger schema or the CSV export columns
    Schema(cmd::schema::SchemaCommand),
    /// Check the entry store is reachable
    Health(cmd::health::HealthCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let source = &cli.source;
    match &cli.command {
        Command::Dashboard(c) => c.exec(source).await,
        Command::Vat(c) => c.exec(source).await,
        Command::Revenue(c) => c.exec(source).await,
        Command::Breakdown(c) => c.exec(source).await,
        Command::List(c) => c.exec(source).await,
        Command::Add(c) => c.exec(source).await,
        Command::Update(c) => c.exec(source).await,
        Command::SetPaid(c) => c.exec(source).await,
        Command::Delete(c) => c.exec(source).await,
        Command::Extract(c) => c.exec(source).await,
        Command::Export(c) => c.exec(source).await,
        Command::Schema(c) => c.exec(),
        Command::Health(c) => c.exec(source).await,
    }
}
