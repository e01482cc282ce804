use std::path::PathBuf;

use anyhow::{ensure, Result};

use vscompare::{Config, CorrelationStrategy};

use super::{load_session, set_duration};
use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_compare(
    config: &Config,
    streams: &[String],
    format: OutputFormat,
    at: Option<f64>,
    duration: Option<f64>,
    window: Option<f64>,
    sweep: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let strategy = if sweep {
        CorrelationStrategy::SortedSweep
    } else {
        CorrelationStrategy::CrossProduct
    };
    let mut options = config.session_options(strategy);
    if let Some(window) = window {
        ensure!(
            window.is_finite() && window >= 0.0,
            "correlation window must be a non-negative number of seconds"
        );
        options.correlation_window = window;
    }

    let mut session = load_session(streams, options).await?;
    eprintln!(
        "🎬 Comparing {} streams ({} events)",
        session.streams().len(),
        session.store().event_count()
    );

    set_duration(&mut session, duration);
    if let Some(at) = at {
        session.seek(at);
    }

    let report = session.cross_stream_report();
    let content = report.generate(format.into())?;

    if let Some(path) = output {
        std::fs::write(&path, &content)?;
        eprintln!("💾 Saved report to {}", path.display());
    } else {
        print!("{content}");
    }

    Ok(())
}
