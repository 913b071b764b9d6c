//! Camera stream server
//!
//! Run with: camstream --cameras cameras.json [--bind 0.0.0.0:8080]
//!
//! The camera file is a JSON list of equipment records:
//!
//! ```json
//! [
//!   {
//!     "id": 1,
//!     "name": "Entrance",
//!     "rtsp_url": "rtsp://10.0.0.5:554/Streaming/Channels/101",
//!     "rtsp_username": "admin",
//!     "rtsp_password": "secret",
//!     "stream_enabled": true,
//!     "resolution": "640x480",
//!     "fps": 15,
//!     "stream_quality": "medium"
//!   }
//! ]
//! ```
//!
//! Endpoints:
//!   GET  /camera/{id}/stream              live MJPEG
//!   GET  /camera/{id}/snapshot            single JPEG
//!   POST /camera/{id}/start_stream
//!   POST /camera/{id}/stop_stream
//!   GET  /api/cameras/streams_status

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use camstream::camera::StaticDirectory;
use camstream::source::FfmpegConnector;
use camstream::{CamServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Capture camera streams and serve them over HTTP", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "CAMSTREAM_BIND")]
    bind: SocketAddr,

    /// JSON file listing the cameras
    #[arg(short, long, env = "CAMSTREAM_CAMERAS")]
    cameras: Option<PathBuf>,

    /// ffmpeg binary used to read camera streams
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// RTSP transport passed to ffmpeg (tcp or udp)
    #[arg(long, default_value = "tcp")]
    rtsp_transport: String,

    /// Seconds between sweeps for dead streams
    #[arg(long, default_value = "60")]
    reap_interval: u64,

    /// Answer stream requests with 503
    #[arg(long, env = "CAMSTREAM_DISABLE_STREAMS")]
    disable_streams: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("camstream={}", level).parse()?),
        )
        .init();

    let directory = match &cli.cameras {
        Some(path) => StaticDirectory::load(path).await?,
        None => {
            tracing::warn!("No camera file given, every camera will be unknown");
            StaticDirectory::new()
        }
    };

    let mut config = ServerConfig::default()
        .bind(cli.bind)
        .reap_interval(Duration::from_secs(cli.reap_interval));
    if cli.disable_streams {
        config = config.disable_streaming();
    }

    let connector = FfmpegConnector::with_binary(&cli.ffmpeg).rtsp_transport(cli.rtsp_transport);

    tracing::info!(
        ffmpeg = %cli.ffmpeg.display(),
        transport = %connector.rtsp_transport,
        "Using ffmpeg for camera sources"
    );

    let server = CamServer::new(config, Arc::new(directory), Arc::new(connector));
    server.run_until(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, shutting down");
        }
        _ = terminate() => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
