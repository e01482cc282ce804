use anyhow::Result;

use vscompare::compare::timeline::format_time;
use vscompare::{Config, CorrelationStrategy};

use super::{load_session, set_duration};

pub async fn cmd_timeline(
    config: &Config,
    streams: &[String],
    duration: Option<f64>,
    at: f64,
    width: usize,
) -> Result<()> {
    let options = config.session_options(CorrelationStrategy::default());
    let mut session = load_session(streams, options).await?;

    set_duration(&mut session, duration);
    session.seek(at);

    let timeline = session.timeline();
    println!("{}", timeline.render_text(width)?);

    let active = timeline.active_correlated();
    if !active.is_empty() {
        println!();
        for c in active {
            println!(
                "⚡ {} {} (streams {}, {}; Δt {:.1}s)",
                format_time(c.timestamp),
                c.description,
                c.streams[0],
                c.streams[1],
                c.time_diff
            );
        }
    }

    println!();
    for (index, stream) in session.streams().iter().enumerate() {
        let overlay = session.player_overlay(index);
        let labels: Vec<String> = overlay
            .iter()
            .map(|e| format!("{} {:.0}%", e.event_type, e.confidence * 100.0))
            .collect();
        let marker = if index < session.active_streams().len() {
            "▶"
        } else {
            " "
        };
        println!(
            "{marker} Stream {}: {}",
            stream.id,
            if labels.is_empty() {
                "-".to_string()
            } else {
                labels.join(", ")
            }
        );
    }

    Ok(())
}
