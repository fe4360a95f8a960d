use clap::Parser;
use komerci::application::checkout::CheckoutService;
use komerci::config::GatewayConfig;
use komerci::domain::ports::ConnectorBox;
use komerci::infrastructure::komerci::KomerciConnector;
use komerci::infrastructure::simulated::SimulatedGateway;
use komerci::interfaces::csv::order_reader::OrderReader;
use komerci::interfaces::csv::report_writer::ReportWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input payment orders CSV file
    input: PathBuf,

    /// Gateway configuration file (TOML). Production endpoints are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Answer every call from an in-process simulated gateway instead of the network.
    #[arg(long)]
    simulate: bool,

    /// Directory where the receipts of captured payments are saved.
    #[arg(long)]
    receipts_dir: Option<PathBuf>,
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

    let connector: ConnectorBox = if cli.simulate {
        Box::new(SimulatedGateway::new().connector())
    } else {
        let config = GatewayConfig::load(cli.config.as_deref()).into_diagnostic()?;
        Box::new(KomerciConnector::new(config))
    };

    let mut service = CheckoutService::new(connector);
    if let Some(dir) = cli.receipts_dir {
        std::fs::create_dir_all(&dir).into_diagnostic()?;
        service = service.with_receipts_dir(dir);
    }

    // Orders are processed strictly one after the other
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OrderReader::new(file);
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    for record in reader.orders() {
        match record {
            Ok(record) => {
                let report = service.process_record(record).await;
                writer.write_report(&report).into_diagnostic()?;
            }
            Err(e) => {
                eprintln!("Error reading order: {}", e);
            }
        }
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}
