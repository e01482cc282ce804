use std::fmt::Write as _;

use anyhow::{ensure, Result};

use vscompare::compare::controller::REFERENCE_INDEX;
use vscompare::compare::timeline::{format_time, is_allowed_rate, ALLOWED_RATES};
use vscompare::compare::MockEventSource;
use vscompare::{ComparisonSession, Config, CorrelationStrategy, SimulatedPlayer, StreamInput};

use super::load_session;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_simulate(
    config: &Config,
    streams: &[String],
    count: u32,
    duration: f64,
    seconds: f64,
    rate: f64,
    start: f64,
    step: f64,
    layout: Option<&str>,
) -> Result<()> {
    ensure!(
        is_allowed_rate(rate),
        "unsupported playback rate {rate} (choose one of {ALLOWED_RATES:?})"
    );
    ensure!(
        step.is_finite() && step > 0.0,
        "tick step must be a positive number of seconds"
    );
    ensure!(
        duration.is_finite() && duration > 0.0,
        "duration must be a positive number of seconds"
    );

    let mut options = config.session_options(CorrelationStrategy::default());
    if let Some(layout) = layout {
        options.layout = layout.parse()?;
    }

    let mut session = if streams.is_empty() {
        let inputs = (1..=count)
            .map(|slot| {
                StreamInput::new(slot, format!("stream-{slot}.mp4"))
                    .with_events(MockEventSource::generate(slot as usize - 1))
            })
            .collect();
        ComparisonSession::load(inputs, options)?
    } else {
        load_session(streams, options).await?
    };

    let visible = session.active_streams().len();
    let players: Vec<SimulatedPlayer> = (0..visible)
        .map(|_| SimulatedPlayer::new(duration))
        .collect();
    for (index, player) in players.iter().enumerate() {
        session.attach_player(index, Box::new(player.clone()))?;
        session.on_player_duration(index, player.duration());
    }

    let cross_stream = session.correlated_events().len();
    eprintln!(
        "▶️  Playing {} streams ({visible} visible, {} layout) at {rate}x, {cross_stream} \
         cross-stream events",
        session.streams().len(),
        session.layout()
    );

    session.set_rate(rate);
    session.seek(start);
    session.play();

    let mut elapsed = 0.0;
    while elapsed < seconds && session.state().is_playing {
        let dt = step.min(seconds - elapsed);
        for (index, player) in players.iter().enumerate() {
            let position = player.tick(dt);
            session.on_player_time(index, position);
        }
        elapsed += dt;

        let now = session.state().current_time;
        let timeline = session.timeline();
        let mut line = format!(
            "{}  {:>3.0}%",
            format_time(now),
            timeline.progress() * 100.0
        );
        for c in timeline.active_correlated() {
            write!(
                line,
                "  ⚡ {} ({}, {})",
                c.event_type, c.streams[0], c.streams[1]
            )?;
        }
        println!("{line}");

        if players
            .get(REFERENCE_INDEX)
            .is_some_and(|p| !p.is_playing())
        {
            session.pause();
        }
    }

    println!(
        "⏹  Stopped at {} of {} after {elapsed:.1}s",
        format_time(session.state().current_time),
        format_time(session.state().duration)
    );

    Ok(())
}
