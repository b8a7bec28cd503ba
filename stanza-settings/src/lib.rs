// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Composition persistence: the "Json Midi Creator" JSON file format.
//!
//! A saved file wraps the whole [Composition], staff and parts, in a
//! filetype envelope. Elements serialize tagged with their class name, so
//! saved pieces stay readable and diffable.

use serde::{Deserialize, Serialize};
use stanza_orchestration::Composition;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CREATOR_FILETYPE: &str = "Json Midi Creator";
pub const CREATOR_URL: &str = "https://github.com/ruiseixasm/JsonMidiCreator";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("couldn't read or write composition file: {0}")]
    Io(#[from] std::io::Error),
    #[error("composition JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("'{path}' is not a Json Midi Creator file (filetype '{filetype}', url '{url}')")]
    BadEnvelope {
        path: PathBuf,
        filetype: String,
        url: String,
    },
}

/// The on-disk envelope around a composition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatorFile {
    pub filetype: String,
    pub url: String,
    pub content: Composition,
}

impl CreatorFile {
    pub fn new(content: Composition) -> Self {
        Self {
            filetype: CREATOR_FILETYPE.to_string(),
            url: CREATOR_URL.to_string(),
            content,
        }
    }

    fn is_valid(&self) -> bool {
        self.filetype == CREATOR_FILETYPE && self.url == CREATOR_URL
    }
}

pub fn save_composition(path: &Path, composition: &Composition) -> Result<(), SettingsError> {
    let file = CreatorFile::new(composition.clone());
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

/// Loads a composition, rejecting files that don't carry the creator
/// envelope.
pub fn load_composition(path: &Path) -> Result<Composition, SettingsError> {
    let file: CreatorFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    if !file.is_valid() {
        return Err(SettingsError::BadEnvelope {
            path: path.to_path_buf(),
            filetype: file.filetype,
            url: file.url,
        });
    }
    Ok(file.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_core::{
        midi::{Controller, Track},
        pitch::{Key, Pitch, ScaleKind},
        staff::{Staff, TimeSignature},
        time::{fraction, Beats, Position},
    };
    use stanza_entities::{Chord, ControlChange, Note, Retrigger};
    use stanza_orchestration::Sequence;

    fn sample_composition() -> Composition {
        let staff = Staff::default()
            .with_tempo(96.0)
            .with_time_signature(TimeSignature::new(3, 4));

        let mut melody = Sequence::new();
        melody
            .push(Note::new(Pitch::new(Key::E, 4)).with_gate(fraction(9, 10)))
            .push(Chord::new(Pitch::new(Key::A, 3)).with_scale(ScaleKind::Minor.into()))
            .push(Retrigger::new(Pitch::new(Key::E, 5)).with_division(8))
            .push(
                ControlChange::new(Controller::named("Modulation").unwrap().with_value(40))
                    .at(Position::from_beats(Beats::from_integer(2), &staff)),
            )
            .stack(&staff);

        Composition::new(staff).with_part(Track::new("Melody", 1), melody)
    }

    #[test]
    fn round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("piece.json");
        let composition = sample_composition();

        save_composition(&path, &composition).unwrap();
        let loaded = load_composition(&path).unwrap();
        assert_eq!(loaded, composition);
    }

    #[test]
    fn elements_serialize_with_class_tags() {
        let json = serde_json::to_string(&CreatorFile::new(sample_composition())).unwrap();
        assert!(json.contains(r#""filetype":"Json Midi Creator""#));
        assert!(json.contains(r#""class":"Note""#));
        assert!(json.contains(r#""class":"Chord""#));
        assert!(json.contains(r#""class":"Retrigger""#));
        assert!(json.contains(r#""class":"ControlChange""#));
        assert!(json.contains(r#""parameters""#));
    }

    #[test]
    fn foreign_envelopes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foreign.json");
        std::fs::write(
            &path,
            r#"{"filetype":"Json Midi Player","url":"https://github.com/ruiseixasm/JsonMidiPlayer","content":{"staff":{},"parts":[]}}"#,
        )
        .unwrap();

        // A *player* file is not a *creator* file, even though both are ours.
        assert!(matches!(
            load_composition(&path),
            Err(SettingsError::BadEnvelope { .. }) | Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let missing = Path::new("definitely/not/here.json");
        assert!(matches!(
            load_composition(missing),
            Err(SettingsError::Io(_))
        ));
    }
}
