//! `vscompare` CLI - Correlate and replay events across compared video streams

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use vscompare::{Config, ReportFormat};

#[derive(Parser)]
#[command(name = "vscompare")]
#[command(about = "Cross-stream event correlation and synchronized multi-video comparison")]
#[command(version)]
struct Cli {
    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.config/vscompare/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Analysis backend URL (overrides config and VSCOMPARE_BACKEND_URL)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Cross-stream report output format
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Markdown => ReportFormat::Markdown,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate events of two or more streams and print the cross-stream report
    Compare {
        /// Streams as SLOT=EVENTS.json (or just EVENTS.json for the next free slot)
        streams: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Playback position (seconds) used to mark active events
        #[arg(long)]
        at: Option<f64>,

        /// Video duration in seconds (default: last event timestamp)
        #[arg(long)]
        duration: Option<f64>,

        /// Correlation window in seconds (default from config: 3.0)
        #[arg(long)]
        window: Option<f64>,

        /// Use the sorted-sweep correlator
        #[arg(long)]
        sweep: bool,

        /// Save report to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the text timeline of two or more streams
    Timeline {
        /// Streams as SLOT=EVENTS.json
        streams: Vec<String>,

        /// Video duration in seconds (default: last event timestamp)
        #[arg(long)]
        duration: Option<f64>,

        /// Current playback position in seconds
        #[arg(long, default_value = "0")]
        at: f64,

        /// Bar width in columns
        #[arg(short, long, default_value = "80")]
        width: usize,
    },

    /// Play the comparison on simulated players and print each clock tick
    Simulate {
        /// Streams as SLOT=EVENTS.json; placeholder streams when omitted
        streams: Vec<String>,

        /// Number of placeholder streams when no streams are given
        #[arg(short, long, default_value = "3")]
        count: u32,

        /// Media duration in seconds
        #[arg(long, default_value = "60")]
        duration: f64,

        /// Wall-clock seconds to simulate
        #[arg(short, long, default_value = "20")]
        seconds: f64,

        /// Playback rate (0.5, 1, 1.5 or 2)
        #[arg(short, long, default_value = "1")]
        rate: f64,

        /// Start position in seconds
        #[arg(long, default_value = "0")]
        start: f64,

        /// Seconds between ticks
        #[arg(long, default_value = "1")]
        step: f64,

        /// Layout (2-up, 3-up, 4-up)
        #[arg(short, long)]
        layout: Option<String>,
    },

    /// Upload a video to the analysis backend
    Upload {
        /// Video file
        file: PathBuf,
    },

    /// List uploaded files
    Files,

    /// Delete an uploaded file
    Delete {
        /// Backend file id
        id: String,
    },

    /// Ask a question about an uploaded video
    Chat {
        /// Question
        message: String,

        /// Backend file id the question refers to
        #[arg(long)]
        file_id: Option<String>,
    },

    /// Stream a summary of an uploaded video
    Summarize {
        /// Backend file id
        file_id: String,

        /// Stream slot the summary belongs to
        #[arg(long, default_value = "1")]
        slot: u32,

        /// Model (default from config)
        #[arg(short, long)]
        model: Option<String>,

        /// Summarization prompt (default from config)
        #[arg(short, long)]
        prompt: Option<String>,

        /// Seconds of video per caption chunk
        #[arg(long)]
        chunk_duration: Option<u32>,
    },

    /// List models the backend can summarize with
    Models,

    /// Show recent alerts
    Alerts,

    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("vscompare={default_level}"))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.backend {
        config.backend.base_url = url;
    }

    match cli.command {
        Commands::Compare {
            streams,
            format,
            at,
            duration,
            window,
            sweep,
            output,
        } => {
            cmd::compare::cmd_compare(
                &config, &streams, format, at, duration, window, sweep, output,
            )
            .await?;
        }
        Commands::Timeline {
            streams,
            duration,
            at,
            width,
        } => {
            cmd::timeline::cmd_timeline(&config, &streams, duration, at, width).await?;
        }
        Commands::Simulate {
            streams,
            count,
            duration,
            seconds,
            rate,
            start,
            step,
            layout,
        } => {
            cmd::simulate::cmd_simulate(
                &config,
                &streams,
                count,
                duration,
                seconds,
                rate,
                start,
                step,
                layout.as_deref(),
            )
            .await?;
        }
        Commands::Upload { file } => cmd::backend::cmd_upload(&config, &file).await?,
        Commands::Files => cmd::backend::cmd_files(&config).await?,
        Commands::Delete { id } => cmd::backend::cmd_delete(&config, &id).await?,
        Commands::Chat { message, file_id } => {
            cmd::backend::cmd_chat(&config, &message, file_id.as_deref()).await?;
        }
        Commands::Summarize {
            file_id,
            slot,
            model,
            prompt,
            chunk_duration,
        } => {
            cmd::backend::cmd_summarize(&config, &file_id, slot, model, prompt, chunk_duration)
                .await?;
        }
        Commands::Models => cmd::backend::cmd_models(&config).await?,
        Commands::Alerts => cmd::backend::cmd_alerts(&config).await?,
        Commands::Health => cmd::backend::cmd_health(&config).await?,
    }

    Ok(())
}
