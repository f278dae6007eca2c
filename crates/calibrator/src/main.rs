mod script;

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calibration_adapters::{BuiltinTipRacks, FileCalibrationStore, SimulatedHardware};
use calibration_core::ports::CalibrationStore;
use calibration_core::{CalibrationSettings, Mount, SessionManager};
use protocol::CommandResponse;

type Manager = SessionManager<SimulatedHardware, BuiltinTipRacks, FileCalibrationStore>;

#[derive(Parser, Debug)]
#[clap(name = "tipcal")]
#[clap(about = "Run a tip-length calibration session against the simulated gantry", long_about = None)]
struct Args {
    /// Mount to calibrate (left or right)
    #[clap(short, long, default_value = "right")]
    mount: Mount,

    /// Tip rack load name
    #[clap(short, long, default_value = "opentrons_96_tiprack_300ul")]
    tip_rack: String,

    /// Settings file; overrides TIPCAL_CONFIG
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Directory for saved tip lengths
    #[clap(long, default_value = "calibrations")]
    store_dir: PathBuf,

    /// Print saved tip lengths and exit
    #[clap(long)]
    list: bool,

    /// Script of command requests, one per line; reads stdin when omitted or "-"
    script: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Responses go to stdout, logs to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "calibration_core=info,tipcal=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => CalibrationSettings::load_from(path)?,
        None => CalibrationSettings::load()?,
    };
    let store = Arc::new(FileCalibrationStore::new(&args.store_dir));

    if args.list {
        for record in store.list_tip_lengths().await? {
            println!("{}", serde_json::to_string(&record)?);
        }
        return Ok(());
    }

    let manager = SessionManager::new(
        Arc::new(SimulatedHardware::new()),
        Arc::new(BuiltinTipRacks),
        store,
        settings,
    );

    match args.script.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening script {}", path.display()))?;
            run(&manager, &args, BufReader::new(file)).await
        }
        _ => run(&manager, &args, BufReader::new(tokio::io::stdin())).await,
    }
}

async fn run<R: AsyncBufRead + Unpin>(manager: &Manager, args: &Args, reader: R) -> Result<()> {
    let id = manager.create_session(args.mount, &args.tip_rack).await?;
    info!(session = %id, mount = %args.mount, tip_rack = %args.tip_rack, "session open");

    let mut lines = reader.lines();
    let mut line_no = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let response = match script::parse_line(&line, line_no) {
            None => continue,
            Some(Ok(request)) => manager.submit_request(id, request).await,
            Some(Err(e)) => CommandResponse::error("invalid_request", format!("{:#}", e), None, None),
        };
        println!("{}", serde_json::to_string(&response)?);

        if manager.session_for_mount(args.mount).await.is_none() {
            break;
        }
    }

    // Scripts that stop short still release the pipette.
    for (session, result) in manager.exit_all().await {
        match result {
            Ok(outcome) if outcome.warnings.is_empty() => info!(session = %session, "session closed"),
            Ok(outcome) => warn!(session = %session, warnings = ?outcome.warnings, "session closed with warnings"),
            Err(e) => warn!(session = %session, error = %e, "failed to close session"),
        }
    }
    Ok(())
}
