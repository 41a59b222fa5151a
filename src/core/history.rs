//! Per-session list of generated clips, newest first.

use std::collections::VecDeque;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::tts::SynthesisRequest;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub text: String,
    pub language: String,
    pub voice: String,
    pub speed: f32,
    pub created_at: OffsetDateTime,
    pub audio: Bytes,
}

/// Entry metadata without the audio payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub id: Uuid,
    pub text: String,
    pub language: String,
    pub voice: String,
    pub speed: f32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub size_bytes: usize,
}

impl From<&HistoryEntry> for HistorySummary {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            text: entry.text.clone(),
            language: entry.language.clone(),
            voice: entry.voice.clone(),
            speed: entry.speed,
            created_at: entry.created_at,
            size_bytes: entry.audio.len(),
        }
    }
}

/// Bounded history; pushing past `limit` drops the oldest entry.
#[derive(Debug)]
pub struct History {
    limit: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Mutex::new(VecDeque::with_capacity(limit.min(64))),
        }
    }

    /// Record a finished synthesis and return its entry id.
    pub fn push(&self, request: &SynthesisRequest, audio: Bytes) -> Uuid {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            text: request.text.clone(),
            language: request.language.clone(),
            voice: request.voice.clone(),
            speed: request.speed,
            created_at: OffsetDateTime::now_utc(),
            audio,
        };
        let id = entry.id;

        if self.limit == 0 {
            return id;
        }
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.limit);
        id
    }

    pub fn list(&self) -> Vec<HistorySummary> {
        self.entries.lock().iter().map(HistorySummary::from).collect()
    }

    pub fn get(&self, id: Uuid) -> Option<HistoryEntry> {
        self.entries.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Remove one entry. Returns whether it existed.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest::new(text)
    }

    #[test]
    fn test_newest_first() {
        let history = History::new(5);
        history.push(&request("one"), Bytes::from_static(b"1"));
        history.push(&request("two"), Bytes::from_static(b"22"));

        let texts: Vec<_> = history.list().into_iter().map(|s| s.text).collect();
        assert_eq!(texts, ["two", "one"]);
        assert_eq!(history.list()[0].size_bytes, 2);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let history = History::new(2);
        let first = history.push(&request("a"), Bytes::new());
        history.push(&request("b"), Bytes::new());
        history.push(&request("c"), Bytes::new());

        assert_eq!(history.len(), 2);
        assert!(history.get(first).is_none());
    }

    #[test]
    fn test_get_and_remove() {
        let history = History::new(5);
        let id = history.push(&request("keep me"), Bytes::from_static(b"AUDIO"));

        let entry = history.get(id).unwrap();
        assert_eq!(entry.audio, Bytes::from_static(b"AUDIO"));
        assert_eq!(entry.voice, "en-US-Chirp3-HD-Charon");

        assert!(history.remove(id));
        assert!(!history.remove(id));
        assert!(history.is_empty());
    }

    #[test]
    fn test_zero_limit_keeps_nothing() {
        let history = History::new(0);
        history.push(&request("x"), Bytes::new());
        assert!(history.is_empty());
    }

    #[test]
    fn test_summary_serializes_timestamp_as_rfc3339() {
        let history = History::new(1);
        history.push(&request("x"), Bytes::new());
        let json = serde_json::to_value(&history.list()[0]).unwrap();
        assert!(json["created_at"].as_str().unwrap().contains('T'));
        assert!(json.get("audio").is_none());
    }
}
