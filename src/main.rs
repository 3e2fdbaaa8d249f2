use clap::Parser;
use lite_checkout::application::gateway::LiteCheckoutGateway;
use lite_checkout::config::GatewayConfig;
use lite_checkout::domain::ports::{OrderStoreBox, PaymentStoreBox};
use lite_checkout::infrastructure::acquirer::OfflineAcquirer;
use lite_checkout::infrastructure::in_memory::{InMemoryOrderStore, InMemoryPaymentStore};
use lite_checkout::infrastructure::redirect::FormRedirectTransport;
use lite_checkout::interfaces::csv::event_reader::EventReader;
use lite_checkout::interfaces::csv::payment_writer::PaymentWriter;
use lite_checkout::interfaces::replay::replay_event;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input gateway events CSV file
    input: PathBuf,

    /// Gateway configuration JSON file (optional). Defaults apply otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<(OrderStoreBox, PaymentStoreBox)> {
    use lite_checkout::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(db_path) => {
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            Ok((Box::new(store.clone()), Box::new(store)))
        }
        None => Ok(in_memory_stores()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<(OrderStoreBox, PaymentStoreBox)> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> (OrderStoreBox, PaymentStoreBox) {
    (
        Box::new(InMemoryOrderStore::new()),
        Box::new(InMemoryPaymentStore::new()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => GatewayConfig::load(path).into_diagnostic()?,
        None => GatewayConfig::default(),
    };
    let (orders, payments) = open_stores(cli.db_path)?;
    let gateway = LiteCheckoutGateway::new(
        config,
        orders,
        payments,
        Box::new(FormRedirectTransport::new()),
        Box::new(OfflineAcquirer::new()),
    );

    // Replay events
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for (row, event) in reader.events().enumerate() {
        let row = row + 1;
        match event {
            Ok(event) => {
                let kind = event.r#type;
                if let Err(e) = replay_event(&gateway, event).await {
                    warn!(row, event = ?kind, error = %e, "event rejected");
                }
            }
            Err(e) => {
                warn!(row, error = %e, "unreadable event");
            }
        }
    }

    let payments = gateway.into_payments().await.into_diagnostic()?;

    // Output final state
    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer.write_payments(&payments).into_diagnostic()?;

    Ok(())
}
