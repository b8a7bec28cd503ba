// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::elements::{ElementBase, Note};
use stanza_core::{
    midi::{ExportEvent, PlaylistEvent},
    pitch::Pitch,
    staff::Staff,
    time::{fraction, Length, Position},
    traits::{ExportsMidi, Plays, RenderContext},
    TimeFraction,
};

#[cfg(test)]
use stanza_core::time::NoteValue;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A pitch repeated `division` times across a doubled nominal duration, with
/// an optional swing: even-numbered hits get the swing fraction of a
/// subdivision pair, odd-numbered hits the remainder.
///
/// The doubling means a retrigger written against a quarter note spans two
/// quarter notes, which is what makes `triplet()` come out right: three hits
/// across a doubled span gives each note 2/3 of the nominal value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Retrigger {
    pub base: ElementBase,
    pub pitch: Pitch,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub velocity: Option<u8>,
    pub gate: TimeFraction,
    pub division: u16,
    pub swing: TimeFraction,
}

impl Default for Retrigger {
    fn default() -> Self {
        Self {
            base: ElementBase::default(),
            pitch: Pitch::default(),
            velocity: None,
            gate: fraction(1, 2),
            division: 16,
            swing: fraction(1, 2),
        }
    }
}

impl Retrigger {
    pub fn new(pitch: Pitch) -> Self {
        Self {
            pitch,
            ..Self::default()
        }
    }

    /// Three evenly-spaced hits: the classic triplet.
    pub fn triplet(pitch: Pitch) -> Self {
        Self {
            pitch,
            division: 3,
            gate: fraction(1, 1),
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }

    /// Sets the nominal duration; the retrigger spans twice this.
    pub fn with_duration(mut self, duration: Length) -> Self {
        self.base.duration = Some(duration * 2);
        self
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity.min(127));
        self
    }

    pub fn with_gate(mut self, gate: TimeFraction) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_division(mut self, division: u16) -> Self {
        if division > 0 {
            self.division = division;
        }
        self
    }

    pub fn with_swing(mut self, swing: TimeFraction) -> Self {
        self.swing = swing
            .max(TimeFraction::from_integer(0))
            .min(TimeFraction::from_integer(1));
        self
    }

    /// The full (doubled) span.
    pub fn resolved_duration(&self, staff: &Staff) -> Length {
        self.base
            .duration
            .unwrap_or_else(|| Length::from_note_value(staff.duration()) * 2)
    }

    /// Expands into the individual hits.
    pub fn notes(&self, staff: &Staff) -> Vec<Note> {
        let total = self.resolved_duration(staff);
        let single = match total.checked_div(self.division as i64) {
            Some(length) => length,
            None => return Vec::new(),
        };

        let mut notes = Vec::with_capacity(self.division as usize);
        let mut position = self.base.position;
        for hit in 0..self.division {
            let ratio = if hit % 2 == 0 {
                self.swing
            } else {
                TimeFraction::from_integer(1) - self.swing
            };
            let duration = single * 2 * ratio;
            let mut note = Note::new(self.pitch)
                .with_gate(self.gate)
                .with_duration(duration)
                .at(position);
            note.base.channel = self.base.channel;
            note.base.device = self.base.device.clone();
            note.velocity = self.velocity;
            notes.push(note);
            position += duration;
        }
        notes
    }
}

impl Plays for Retrigger {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        self.notes(context.staff)
            .iter()
            .flat_map(|note| note.playlist(context))
            .collect()
    }
}

impl ExportsMidi for Retrigger {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        self.notes(context.staff)
            .iter()
            .flat_map(|note| note.midilist(context))
            .collect()
    }
}
