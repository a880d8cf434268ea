//! resourced daemon binary.
//!
//! The daemon runs as a single-point broker and manages:
//! - exclusive ownership of shared device resources
//! - priority-based preemption between client processes
//! - IPC communication with resource clients

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use resourced_daemon::core::ManagerCore;
use resourced_daemon::security::AllowAll;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Daemon command line arguments.
#[derive(Parser, Debug)]
#[command(name = "resourced")]
#[command(about = "Device resource policy broker")]
struct Args {
	/// Socket path for IPC
	#[arg(short, long, value_name = "PATH")]
	socket: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	info!("starting resourced");

	let socket_path = args
		.socket
		.unwrap_or_else(resourced_proto::paths::default_socket_path);

	if let Some(parent) = socket_path.parent()
		&& !parent.exists()
	{
		std::fs::create_dir_all(parent)?;
	}

	info!(socket = %socket_path.display(), "IPC socket path");

	let core = ManagerCore::new(Arc::new(AllowAll));
	let shutdown = CancellationToken::new();

	info!("starting IPC server, waiting for clients");
	resourced_daemon::ipc::serve(&socket_path, core, shutdown).await?;

	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::prelude::*;

	// Support RESOURCED_LOG_DIR for smoke testing
	if let Some(log_dir) = std::env::var("RESOURCED_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let pid = std::process::id();
		let log_path = log_dir.join(format!("resourced.{}.log", pid));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
				if verbose {
					EnvFilter::new("resourced_daemon=trace,debug")
				} else {
					EnvFilter::new("resourced_daemon=debug,info")
				}
			});

			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(Arc::new(file))
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);

			tracing_subscriber::registry()
				.with(filter)
				.with(file_layer)
				.init();

			tracing::info!(path = ?log_path, "daemon tracing initialized");
			return;
		}
	}

	// Fallback to stderr-only logging
	tracing_subscriber::fmt()
		.with_max_level(if verbose {
			tracing::Level::DEBUG
		} else {
			tracing::Level::INFO
		})
		.init();
}
