pub mod backend;
pub mod compare;
pub mod simulate;
pub mod timeline;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use vscompare::compare::controller::REFERENCE_INDEX;
use vscompare::compare::{JsonFileEventSource, MAX_SLOTS};
use vscompare::{ComparisonSession, SessionOptions, StreamId, StreamInput};

/// Parse `SLOT=PATH` arguments; a bare `PATH` takes the lowest free slot.
pub fn parse_stream_args(args: &[String]) -> Result<Vec<(u32, PathBuf)>> {
    let mut explicit: Vec<Option<u32>> = Vec::with_capacity(args.len());
    for arg in args {
        let slot = match arg.split_once('=') {
            Some((slot, _)) => Some(
                slot.trim()
                    .parse::<u32>()
                    .with_context(|| format!("invalid stream slot in '{arg}'"))?,
            ),
            None => None,
        };
        explicit.push(slot);
    }

    let mut taken: Vec<u32> = explicit.iter().flatten().copied().collect();
    let mut streams = Vec::with_capacity(args.len());
    for (arg, slot) in args.iter().zip(explicit) {
        let (slot, path) = match slot {
            Some(slot) => (slot, arg.split_once('=').map_or(arg.as_str(), |(_, p)| p)),
            None => {
                let Some(free) = (1..=MAX_SLOTS).find(|s| !taken.contains(s)) else {
                    bail!("no free stream slot for '{arg}' (at most {MAX_SLOTS} streams)");
                };
                taken.push(free);
                (free, arg.as_str())
            }
        };
        streams.push((slot, PathBuf::from(path)));
    }
    Ok(streams)
}

/// Load a comparison whose per-stream events come from JSON files
pub async fn load_session(args: &[String], options: SessionOptions) -> Result<ComparisonSession> {
    let mut source = JsonFileEventSource::new();
    let mut inputs = Vec::new();
    for (slot, path) in parse_stream_args(args)? {
        inputs.push(StreamInput::new(slot, path.display().to_string()));
        source.insert(StreamId(slot), path);
    }

    let session = ComparisonSession::load_with_source(inputs, options, &source).await?;
    Ok(session)
}

/// Report a duration as the reference player would; falls back to the last
/// event timestamp when none is given.
pub fn set_duration(session: &mut ComparisonSession, duration: Option<f64>) -> f64 {
    let duration = duration.unwrap_or_else(|| {
        session
            .store()
            .all_events()
            .map(|(_, e)| e.timestamp)
            .fold(0.0, f64::max)
    });
    session.on_player_duration(REFERENCE_INDEX, duration);
    session.state().duration
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn explicit_and_bare_slots() {
        let parsed = parse_stream_args(&args(&["1=a.json", "b.json", "3=c.json"])).unwrap();
        assert_eq!(
            parsed,
            vec![
                (1, PathBuf::from("a.json")),
                (2, PathBuf::from("b.json")),
                (3, PathBuf::from("c.json")),
            ]
        );

        let parsed = parse_stream_args(&args(&["x.json", "1=y.json"])).unwrap();
        assert_eq!(parsed[0].0, 2);
        assert_eq!(parsed[1].0, 1);
    }

    #[test]
    fn invalid_slot_rejected() {
        assert!(parse_stream_args(&args(&["two=a.json"])).is_err());
    }
}
