//! Per-slot video state
//!
//! Tracks what happened to each of the eight stream slots (file attached,
//! upload progress, backend id, summary) and turns the attached slots into
//! the inputs of a comparison session.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::compare::{CompareError, Result, StreamId, StreamInput, MAX_SLOTS};

/// Lifecycle of a slot's video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    #[default]
    Idle,
    Uploading,
    Uploaded,
    Summarizing,
    Summarized,
    Error,
}

/// State of one slot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoState {
    pub stream: StreamId,
    /// Local media reference (path or URL)
    pub file: Option<String>,
    /// Id assigned by the backend after upload
    pub file_id: Option<String>,
    pub status: VideoStatus,
    pub summary: String,
    /// 0..=100
    pub upload_progress: f64,
    pub error: Option<String>,
}

impl VideoState {
    fn new(stream: StreamId) -> Self {
        Self {
            stream,
            ..Self::default()
        }
    }
}

/// All slot states plus the currently selected stream
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: BTreeMap<StreamId, VideoState>,
    selected: Option<StreamId>,
}

impl SlotRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch a slot's state, creating it with defaults first if needed
    pub fn update<F>(&mut self, stream: StreamId, patch: F) -> Result<&VideoState>
    where
        F: FnOnce(&mut VideoState),
    {
        if !(1..=MAX_SLOTS).contains(&stream.0) {
            return Err(CompareError::InvalidSlot(stream.0));
        }
        let state = self
            .slots
            .entry(stream)
            .or_insert_with(|| VideoState::new(stream));
        patch(state);
        debug!("Slot {stream} is now {:?}", state.status);
        Ok(state)
    }

    #[must_use]
    pub fn get(&self, stream: StreamId) -> Option<&VideoState> {
        self.slots.get(&stream)
    }

    /// Forget a slot; clears the selection if it pointed there
    pub fn remove(&mut self, stream: StreamId) -> Option<VideoState> {
        if self.selected == Some(stream) {
            self.selected = None;
        }
        self.slots.remove(&stream)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoState> {
        self.slots.values()
    }

    #[must_use]
    pub fn selected(&self) -> Option<StreamId> {
        self.selected
    }

    /// Change the selection, returning the previous one
    pub fn select(&mut self, stream: Option<StreamId>) -> Option<StreamId> {
        std::mem::replace(&mut self.selected, stream)
    }

    /// Append a streamed summary fragment.
    ///
    /// Ignored unless the slot is still summarizing, so a late fragment can't
    /// reopen a finished or failed summary.
    pub fn append_summary(&mut self, stream: StreamId, text: &str) -> bool {
        match self.slots.get_mut(&stream) {
            Some(state) if state.status == VideoStatus::Summarizing => {
                state.summary.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Inputs for a comparison session: every slot with a file, ascending
    #[must_use]
    pub fn comparison_inputs(&self) -> Vec<StreamInput> {
        self.slots
            .values()
            .filter_map(|state| {
                let file = state.file.as_ref()?;
                let input = StreamInput::new(state.stream.0, file.clone());
                Some(match &state.file_id {
                    Some(id) => input.with_file_id(id.clone()),
                    None => input,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_creates_then_patches() {
        let mut registry = SlotRegistry::new();
        let state = registry
            .update(StreamId(3), |s| s.status = VideoStatus::Uploading)
            .unwrap();
        assert_eq!(state.stream, StreamId(3));
        assert_eq!(state.status, VideoStatus::Uploading);
        assert!(state.summary.is_empty());

        registry
            .update(StreamId(3), |s| {
                s.upload_progress = 100.0;
                s.file_id = Some("file-3".to_string());
                s.status = VideoStatus::Uploaded;
            })
            .unwrap();
        let state = registry.get(StreamId(3)).unwrap();
        assert_eq!(state.file_id.as_deref(), Some("file-3"));
        assert_eq!(state.upload_progress, 100.0);
    }

    #[test]
    fn slots_outside_pool_rejected() {
        let mut registry = SlotRegistry::new();
        assert!(matches!(
            registry.update(StreamId(0), |_| {}),
            Err(CompareError::InvalidSlot(0))
        ));
        assert!(registry.update(StreamId(9), |_| {}).is_err());
        assert!(registry.update(StreamId(8), |_| {}).is_ok());
    }

    #[test]
    fn comparison_inputs_skip_slots_without_files() {
        let mut registry = SlotRegistry::new();
        registry
            .update(StreamId(7), |s| s.file = Some("c.mp4".to_string()))
            .unwrap();
        registry
            .update(StreamId(2), |s| {
                s.file = Some("a.mp4".to_string());
                s.file_id = Some("f-a".to_string());
            })
            .unwrap();
        registry.update(StreamId(5), |_| {}).unwrap();

        let inputs = registry.comparison_inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].stream_slot, 2);
        assert_eq!(inputs[0].backend_file_id.as_deref(), Some("f-a"));
        assert_eq!(inputs[1].stream_slot, 7);
        assert_eq!(inputs[1].backend_file_id, None);
    }

    #[test]
    fn summary_fragments_only_while_summarizing() {
        let mut registry = SlotRegistry::new();
        registry
            .update(StreamId(1), |s| s.status = VideoStatus::Summarizing)
            .unwrap();
        assert!(registry.append_summary(StreamId(1), "A car "));
        assert!(registry.append_summary(StreamId(1), "parks."));

        registry
            .update(StreamId(1), |s| s.status = VideoStatus::Summarized)
            .unwrap();
        assert!(!registry.append_summary(StreamId(1), " late"));
        assert!(!registry.append_summary(StreamId(4), "unknown"));
        assert_eq!(registry.get(StreamId(1)).unwrap().summary, "A car parks.");
    }

    #[test]
    fn removing_selected_slot_clears_selection() {
        let mut registry = SlotRegistry::new();
        registry.update(StreamId(2), |_| {}).unwrap();
        assert_eq!(registry.select(Some(StreamId(2))), None);
        assert_eq!(registry.selected(), Some(StreamId(2)));

        assert!(registry.remove(StreamId(2)).is_some());
        assert_eq!(registry.selected(), None);
        assert!(registry.get(StreamId(2)).is_none());
    }
}
