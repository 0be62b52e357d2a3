use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mavftp::application::FtpClient;
use mavftp::core::FtpError;
use mavftp::infrastructure::{FtpConfig, LoopbackLink, loopback};
use mavftp::simulator::{FaultProfile, SimulatedVehicle, VirtualFs};
use mavftp::utils::{format_entry, format_size};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Picked up from the working directory when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "mavftp.json";

#[derive(Parser)]
#[command(author, version, about = "File transfer client for a remote vehicle", long_about = None)]
struct Cli {
    /// JSON client configuration
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Local directory served by the simulated vehicle
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Packet loss probability on the simulated link, each direction
    #[arg(long, global = true, default_value_t = 0.0)]
    loss: f64,

    /// Seed for the simulated link's loss
    #[arg(long, global = true, default_value_t = 0)]
    seed: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a remote directory
    Ls {
        #[arg(default_value = "/")]
        path: String,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download a remote file
    Get {
        path: String,

        /// Where to write the file (defaults to its remote name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove a remote file
    Rm { path: String },
    /// Remove an empty remote directory
    Rmdir { path: String },
    /// Ask the remote for a file's CRC32
    Crc { path: String },
    /// Drop every session on the remote
    Reset,
}

// Returns a WorkerGuard that must be kept alive for logs to be written
fn init_logging(log_file_prefix: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", log_file_prefix);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false);

    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,mavftp=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn sample_filesystem() -> VirtualFs {
    VirtualFs::new()
        .with_file("/params.bin", vec![0x5a; 1800])
        .with_file("/logs/00000001.BIN", (0..=255u8).cycle().take(12_000).collect::<Vec<u8>>())
        .with_file("/logs/00000002.BIN", vec![0u8; 640])
        .with_generated_file("/@SYS/uarts.txt", b"SERIAL0 OUT=115200 IN=115200\n".to_vec())
        .with_directory("/terrain")
        .protect("/params.bin")
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logging("mavftp")?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FtpConfig::load(path)?,
        None => FtpConfig::load_or_default(Some(DEFAULT_CONFIG_PATH)),
    };

    let fs = match &cli.root {
        Some(root) => VirtualFs::load_from_dir(root)
            .await
            .with_context(|| format!("Failed to read {}", root.display()))?,
        None => sample_filesystem(),
    };

    let LoopbackLink {
        transport,
        inbound,
        remote,
    } = loopback();
    let vehicle = SimulatedVehicle::new(fs)
        .with_address(config.target)
        .with_faults(FaultProfile::lossy(cli.loss, cli.seed));
    let _vehicle = vehicle.spawn(remote);

    let (mut client, _downstream) = FtpClient::connect(Arc::new(transport), inbound, &config)?;

    if let Err(e) = run(&mut client, cli.command).await {
        match e.downcast_ref::<FtpError>().and_then(FtpError::remote_code) {
            Some(code) => error!("Vehicle refused the command: {}", code),
            None => error!("Command failed: {:#}", e),
        }
        return Err(e);
    }
    Ok(())
}

async fn run(client: &mut FtpClient, command: Commands) -> Result<()> {
    match command {
        Commands::Ls { path, json } => {
            let entries = client.list_directory(&path).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("{} is empty", path);
            } else {
                for entry in &entries {
                    println!("{}", format_entry(entry));
                }
            }
        }
        Commands::Get { path, output } => {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?,
            );

            let contents = client
                .download_file_with_progress(&path, |progress| {
                    pb.set_length(progress.total_bytes.max(progress.bytes_transferred));
                    pb.set_position(progress.bytes_transferred);
                })
                .await?;
            pb.finish();

            let output = match output {
                Some(output) => output,
                None => PathBuf::from(path.rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("download.bin")),
            };
            tokio::fs::write(&output, &contents)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Saved {} ({}) to {}", path, format_size(contents.len() as u64), output.display());
        }
        Commands::Rm { path } => {
            client.remove_file(&path).await?;
            println!("Removed {}", path);
        }
        Commands::Rmdir { path } => {
            client.remove_directory(&path).await?;
            println!("Removed directory {}", path);
        }
        Commands::Crc { path } => {
            let crc = client.file_crc32(&path).await?;
            println!("{:08x}  {}", crc, path);
        }
        Commands::Reset => {
            client.reset_sessions().await?;
            info!("Session id is now {}", client.session_id());
            println!("Sessions reset");
        }
    }
    Ok(())
}
