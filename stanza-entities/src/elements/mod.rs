// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The composable elements a piece is written with: notes and note
//! aggregates, MIDI automation, and the player sync clock.

pub mod automation;
pub mod chord;
pub mod clock;
pub mod note;
pub mod retrigger;
pub mod tuplet;

pub use automation::{Aftertouch, ControlChange, PitchBend, PolyAftertouch, ProgramChange};
pub use chord::Chord;
pub use clock::Clock;
pub use note::{Note, Rest};
pub use retrigger::Retrigger;
pub use tuplet::Tuplet;

use stanza_core::{
    midi::{ExportEvent, ExportPayload, PlaylistEvent},
    staff::Staff,
    time::{Length, Position},
    traits::{ExportsMidi, Plays, RenderContext, Spans},
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// The fields every element shares. Duration and length are optional so that
/// an element can fall back to the staff default (or its own kind's default)
/// at render time instead of baking a staff into the element.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ElementBase {
    pub position: Position,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub duration: Option<Length>,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub length: Option<Length>,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub channel: Option<stanza_core::midi::Channel>,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub device: Option<Vec<String>>,
}

impl ElementBase {
    pub fn at(position: Position) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// The sounding duration, falling back to the staff default note value.
    pub fn resolved_duration(&self, staff: &Staff) -> Length {
        self.duration
            .unwrap_or_else(|| Length::from_note_value(staff.duration()))
    }

    /// The footprint on the timeline, falling back to the duration. This is
    /// what stacking and linking operate on.
    pub fn resolved_length(&self, staff: &Staff) -> Length {
        self.length.unwrap_or_else(|| self.resolved_duration(staff))
    }

    /// Element override, then track, then staff.
    pub fn channel_on(&self, context: &RenderContext) -> stanza_core::midi::Channel {
        self.channel
            .or(context.track.channel)
            .unwrap_or_else(|| context.staff.channel())
    }

    /// Element override, then track, then staff.
    pub fn device_on(&self, context: &RenderContext) -> Vec<String> {
        self.device.clone().unwrap_or_else(|| context.device())
    }

    /// An export row carrying the shared staff/track context; callers fill in
    /// the payload and, where it differs, the duration.
    pub fn export_event(&self, context: &RenderContext, payload: ExportPayload) -> ExportEvent {
        let staff = context.staff;
        let position = context.offset + self.position;
        ExportEvent {
            track: context.track.number,
            track_name: context.track.name.clone(),
            channel: self.channel_on(context).wire(),
            time_beats: position.to_beats(staff).to_f64(),
            duration_beats: self.resolved_duration(staff).to_beats(staff).to_f64(),
            tempo: staff.tempo(),
            numerator: staff.time_signature().top,
            denominator: staff.time_signature().bottom,
            payload,
        }
    }
}

/// The uniform element type containers hold. Every variant renders itself;
/// the enum dispatches and gives arranging code access to the shared fields.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(tag = "class", content = "parameters"))]
pub enum Element {
    Note(Note),
    Rest(Rest),
    Chord(Chord),
    Retrigger(Retrigger),
    Tuplet(Tuplet),
    Clock(Clock),
    ControlChange(ControlChange),
    PitchBend(PitchBend),
    Aftertouch(Aftertouch),
    PolyAftertouch(PolyAftertouch),
    ProgramChange(ProgramChange),
}

macro_rules! for_each_element {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Element::Note($inner) => $body,
            Element::Rest($inner) => $body,
            Element::Chord($inner) => $body,
            Element::Retrigger($inner) => $body,
            Element::Tuplet($inner) => $body,
            Element::Clock($inner) => $body,
            Element::ControlChange($inner) => $body,
            Element::PitchBend($inner) => $body,
            Element::Aftertouch($inner) => $body,
            Element::PolyAftertouch($inner) => $body,
            Element::ProgramChange($inner) => $body,
        }
    };
}

impl Element {
    pub fn base(&self) -> &ElementBase {
        for_each_element!(self, inner => &inner.base)
    }

    pub fn base_mut(&mut self) -> &mut ElementBase {
        for_each_element!(self, inner => &mut inner.base)
    }

    pub fn position(&self) -> Position {
        self.base().position
    }

    pub fn set_position(&mut self, position: Position) {
        self.base_mut().position = position;
    }

    pub fn set_duration(&mut self, duration: Length) {
        self.base_mut().duration = Some(duration);
    }

    pub fn set_length(&mut self, length: Length) {
        self.base_mut().length = Some(length);
    }

    pub fn resolved_duration(&self, staff: &Staff) -> Length {
        match self {
            // These kinds resolve their own defaults: doubled spans for the
            // subdividers, a measure for chords, the staff length for clocks.
            Element::Retrigger(r) => r.resolved_duration(staff),
            Element::Tuplet(t) => t.resolved_duration(staff),
            Element::Chord(c) => c.resolved_duration(staff),
            Element::Clock(c) => c.resolved_duration(staff),
            _ => self.base().resolved_duration(staff),
        }
    }

    pub fn resolved_length(&self, staff: &Staff) -> Length {
        if let Some(length) = self.base().length {
            return length;
        }
        match self {
            // Point-in-time messages occupy no timeline; stacking an
            // automation event doesn't push its neighbors around.
            Element::ControlChange(_)
            | Element::PitchBend(_)
            | Element::Aftertouch(_)
            | Element::PolyAftertouch(_)
            | Element::ProgramChange(_) => Length::ZERO,
            _ => self.resolved_duration(staff),
        }
    }

    /// Moves any pitched content by raw semitones; unpitched elements are
    /// untouched.
    pub fn transpose(&mut self, semitones: i32) {
        match self {
            Element::Note(n) => n.pitch = n.pitch.transposed(semitones),
            Element::Chord(c) => c.pitch = c.pitch.transposed(semitones),
            Element::Retrigger(r) => r.pitch = r.pitch.transposed(semitones),
            Element::PolyAftertouch(p) => p.pitch = p.pitch.transposed(semitones),
            Element::Tuplet(t) => {
                for child in &mut t.elements {
                    child.transpose(semitones);
                }
            }
            _ => {}
        }
    }

    pub fn as_note(&self) -> Option<&Note> {
        match self {
            Element::Note(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_note_mut(&mut self) -> Option<&mut Note> {
        match self {
            Element::Note(n) => Some(n),
            _ => None,
        }
    }
}

impl Spans for Element {
    fn start(&self) -> Position {
        self.position()
    }

    fn end(&self, staff: &Staff) -> Position {
        self.position() + self.resolved_length(staff)
    }
}

impl Plays for Element {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        for_each_element!(self, inner => inner.playlist(context))
    }
}

impl ExportsMidi for Element {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        for_each_element!(self, inner => inner.midilist(context))
    }
}

macro_rules! element_from {
    ($variant:ident, $type:ty) => {
        impl From<$type> for Element {
            fn from(value: $type) -> Self {
                Element::$variant(value)
            }
        }
    };
}

element_from!(Note, Note);
element_from!(Rest, Rest);
element_from!(Chord, Chord);
element_from!(Retrigger, Retrigger);
element_from!(Tuplet, Tuplet);
element_from!(Clock, Clock);
element_from!(ControlChange, ControlChange);
element_from!(PitchBend, PitchBend);
element_from!(Aftertouch, Aftertouch);
element_from!(PolyAftertouch, PolyAftertouch);
element_from!(ProgramChange, ProgramChange);
