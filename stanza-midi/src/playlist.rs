// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The Json Midi Player wire format: a list of timed messages wrapped in a
//! filetype envelope. Field names match the player's expectations verbatim.

use serde::{Deserialize, Serialize};
use stanza_core::{midi::PlaylistEvent, traits::PlaylistSink};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PLAYER_FILETYPE: &str = "Json Midi Player";
pub const PLAYER_URL: &str = "https://github.com/ruiseixasm/JsonMidiPlayer";

#[derive(Debug, Error)]
pub enum PlaylistFileError {
    #[error("couldn't read or write playlist file: {0}")]
    Io(#[from] std::io::Error),
    #[error("playlist JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("'{path}' is not a Json Midi Player file (filetype '{filetype}', url '{url}')")]
    BadEnvelope {
        path: PathBuf,
        filetype: String,
        url: String,
    },
}

/// The on-disk (and over-FFI) envelope around a playlist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerFile {
    pub filetype: String,
    pub url: String,
    pub content: Vec<PlaylistEvent>,
}

impl PlayerFile {
    pub fn new(content: Vec<PlaylistEvent>) -> Self {
        Self {
            filetype: PLAYER_FILETYPE.to_string(),
            url: PLAYER_URL.to_string(),
            content,
        }
    }

    fn is_valid(&self) -> bool {
        self.filetype == PLAYER_FILETYPE && self.url == PLAYER_URL
    }
}

/// The JSON the native player's entry point takes: a one-element array of
/// envelopes.
pub fn player_json(events: &[PlaylistEvent]) -> Result<String, PlaylistFileError> {
    Ok(serde_json::to_string(&[PlayerFile::new(
        events.to_vec(),
    )])?)
}

pub fn save_playlist(path: &Path, events: &[PlaylistEvent]) -> Result<(), PlaylistFileError> {
    let file = PlayerFile::new(events.to_vec());
    std::fs::write(path, serde_json::to_string(&file)?)?;
    Ok(())
}

/// Loads a playlist, rejecting files that don't carry the player envelope.
pub fn load_playlist(path: &Path) -> Result<Vec<PlaylistEvent>, PlaylistFileError> {
    let file: PlayerFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    if !file.is_valid() {
        return Err(PlaylistFileError::BadEnvelope {
            path: path.to_path_buf(),
            filetype: file.filetype,
            url: file.url,
        });
    }
    Ok(file.content)
}

/// A [PlaylistSink] that writes the playlist to a JSON file instead of
/// playing it.
#[derive(Clone, Debug)]
pub struct PlaylistFileSink {
    path: PathBuf,
}

impl PlaylistFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PlaylistSink for PlaylistFileSink {
    fn accept(&mut self, events: &[PlaylistEvent]) -> anyhow::Result<()> {
        save_playlist(&self.path, events)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_core::midi::{status, MidiMessageData};

    fn sample_events() -> Vec<PlaylistEvent> {
        vec![
            PlaylistEvent::new(
                0.0,
                MidiMessageData::pair(status::NOTE_ON, 60, 100, vec!["FLUID".into()]),
            ),
            PlaylistEvent::new(
                500.0,
                MidiMessageData::pair(status::NOTE_OFF, 60, 0, vec!["FLUID".into()]),
            ),
            PlaylistEvent::new(
                250.0,
                MidiMessageData::single(status::CHANNEL_AFTERTOUCH, 90, vec![]),
            ),
        ]
    }

    #[test]
    fn wire_json_matches_the_player_format() {
        let json = player_json(&sample_events()[..1]).unwrap();
        assert!(json.starts_with('['), "the entry point takes an array");
        assert!(json.contains(r#""filetype":"Json Midi Player""#));
        assert!(json.contains(r#""time_ms":0.0"#));
        assert!(json.contains(r#""status_byte":144"#));
        assert!(json.contains(r#""data_byte_1":60"#));
        assert!(
            !json.contains("data_byte\""),
            "absent bytes are omitted, not null"
        );
    }

    #[test]
    fn single_byte_messages_use_data_byte() {
        let json = player_json(&sample_events()[2..]).unwrap();
        assert!(json.contains(r#""data_byte":90"#));
        assert!(!json.contains("data_byte_1"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.json");
        let events = sample_events();

        save_playlist(&path, &events).unwrap();
        let loaded = load_playlist(&path).unwrap();
        assert_eq!(loaded, events);
    }

    #[test]
    fn foreign_envelopes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        std::fs::write(
            &path,
            r#"{"filetype":"Some Other Tool","url":"https://example.com","content":[]}"#,
        )
        .unwrap();

        match load_playlist(&path) {
            Err(PlaylistFileError::BadEnvelope { filetype, .. }) => {
                assert_eq!(filetype, "Some Other Tool");
            }
            other => panic!("expected BadEnvelope, got {other:?}"),
        }
    }
}
