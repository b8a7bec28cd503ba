// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Stanza is a composition engine: pieces are written as typed musical
//! elements against a staff, then rendered to a timed playlist for the
//! external Json Midi Player, exported as Standard MIDI Files, or saved as
//! JSON compositions.

pub use stanza_core::{
    midi::{Channel, Controller, Track},
    pitch::{Key, KeySignature, Pitch, Scale, ScaleKind},
    staff::{Staff, TimeSignature},
    time::{Beats, Length, Measures, NoteValue, Position, Steps},
    traits::{ExportsMidi, Plays, PlaylistSink, RenderContext, Spans},
};
pub use stanza_entities::{
    Aftertouch, Chord, Clock, ControlChange, Element, Note, PitchBend, PolyAftertouch,
    ProgramChange, Rest, Retrigger, Tuplet,
};
pub use stanza_midi::JsonMidiPlayer;
pub use stanza_orchestration::{Composition, Orchestrator, Part, Performance, Sequence};

/// The version string reported by the tools.
pub fn app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
