// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::elements::{ElementBase, Note};
use stanza_core::{
    midi::{ExportEvent, PlaylistEvent},
    pitch::{Pitch, Scale},
    staff::Staff,
    time::{Length, Measures, Position},
    traits::{ExportsMidi, Plays, RenderContext},
    TimeFraction,
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A chord built by stacking scale thirds on a root pitch. Size 3 is a triad,
/// 4 a seventh chord, and so on up to the scale's reach. The quality flags
/// bend individual degrees: sus2/sus4 move the third, dominant flattens the
/// seventh, diminished flattens third and fifth, augmented raises the fifth.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Chord {
    pub base: ElementBase,
    pub pitch: Pitch,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub velocity: Option<u8>,
    pub gate: TimeFraction,
    pub scale: Scale,
    pub size: u8,
    pub inversion: u8,
    pub dominant: bool,
    pub diminished: bool,
    pub augmented: bool,
    pub sus2: bool,
    pub sus4: bool,
}

impl Default for Chord {
    fn default() -> Self {
        Self {
            base: ElementBase::default(),
            pitch: Pitch::default(),
            velocity: None,
            gate: TimeFraction::from_integer(1),
            scale: Scale::default(),
            size: 3,
            inversion: 0,
            dominant: false,
            diminished: false,
            augmented: false,
            sus2: false,
            sus4: false,
        }
    }
}

impl Chord {
    pub fn new(pitch: Pitch) -> Self {
        Self {
            pitch,
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }

    pub fn with_duration(mut self, duration: Length) -> Self {
        self.base.duration = Some(duration);
        self
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity.min(127));
        self
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_size(mut self, size: u8) -> Self {
        self.size = size;
        self
    }

    pub fn with_inversion(mut self, inversion: u8) -> Self {
        self.inversion = inversion;
        self
    }

    pub fn dominant(mut self) -> Self {
        self.clear_qualities();
        self.dominant = true;
        self
    }

    pub fn diminished(mut self) -> Self {
        self.clear_qualities();
        self.diminished = true;
        self
    }

    pub fn augmented(mut self) -> Self {
        self.clear_qualities();
        self.augmented = true;
        self
    }

    pub fn sus2(mut self) -> Self {
        self.clear_qualities();
        self.sus2 = true;
        self
    }

    pub fn sus4(mut self) -> Self {
        self.clear_qualities();
        self.sus4 = true;
        self
    }

    // The qualities are mutually exclusive; setting one clears the rest.
    fn clear_qualities(&mut self) {
        self.dominant = false;
        self.diminished = false;
        self.augmented = false;
        self.sus2 = false;
        self.sus4 = false;
    }

    /// Chords default to a full measure, not the staff's note duration.
    pub fn resolved_duration(&self, staff: &Staff) -> Length {
        self.base
            .duration
            .unwrap_or_else(|| Length::from_measures(Measures::from_integer(1), staff))
    }

    /// Expands the chord into its notes, inversion applied.
    pub fn notes(&self, staff: &Staff) -> Vec<Note> {
        let mut max_size = self.scale.tone_count();
        if max_size % 2 == 0 {
            max_size /= 2;
        }
        let size = (self.size as u32).min(max_size);

        let mut notes: Vec<Note> = Vec::with_capacity(size as usize);
        for i in 0..size {
            let mut degree = i * 2 + 1; // stacked thirds: 1, 3, 5, 7...
            if degree == 3 {
                if self.sus2 {
                    degree -= 1;
                }
                if self.sus4 {
                    degree += 1;
                }
            }
            let mut semitones = self.scale.transposition(degree - 1);
            if degree == 7 && self.dominant {
                semitones -= 1;
            }
            if (degree == 3 || degree == 5) && self.diminished {
                semitones -= 1;
            }
            if degree == 5 && self.augmented {
                semitones += 1;
            }

            let mut note = Note::new(self.pitch.transposed(semitones))
                .with_gate(self.gate)
                .with_duration(self.resolved_duration(staff))
                .at(self.base.position);
            note.base.channel = self.base.channel;
            note.base.device = self.base.device.clone();
            note.velocity = self.velocity;
            notes.push(note);
        }

        self.invert(&mut notes);
        notes
    }

    // Raises every note below the inversion pivot an octave at a time until
    // the pivot is the lowest note, staying inside the MIDI range.
    fn invert(&self, notes: &mut [Note]) {
        if notes.is_empty() {
            return;
        }
        let inversion = (self.inversion as usize).min(notes.len() - 1);
        if inversion == 0 {
            return;
        }
        let pivot = notes[inversion].pitch;
        loop {
            let mut moved = false;
            for note in notes.iter_mut() {
                if note.pitch < pivot && note.pitch.midi_note() + 12 < 128 {
                    note.pitch = note.pitch.octave_up();
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }
    }
}

impl Plays for Chord {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        self.notes(context.staff)
            .iter()
            .flat_map(|note| note.playlist(context))
            .collect()
    }
}

impl ExportsMidi for Chord {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        self.notes(context.staff)
            .iter()
            .flat_map(|note| note.midilist(context))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_core::{midi::Track, pitch::Key, pitch::ScaleKind, staff::Staff};

    fn keys(chord: &Chord, staff: &Staff) -> Vec<i32> {
        chord.notes(staff).iter().map(|n| n.pitch.midi_note()).collect()
    }

    #[test]
    fn major_triad() {
        let staff = Staff::default();
        let c = Chord::new(Pitch::default());
        assert_eq!(keys(&c, &staff), vec![60, 64, 67], "C E G");
    }

    #[test]
    fn minor_and_seventh_chords() {
        let staff = Staff::default();
        let cm = Chord::new(Pitch::default()).with_scale(ScaleKind::Minor.into());
        assert_eq!(keys(&cm, &staff), vec![60, 63, 67], "C Eb G");

        let c7 = Chord::new(Pitch::default()).with_size(4).dominant();
        assert_eq!(keys(&c7, &staff), vec![60, 64, 67, 70], "C E G Bb");

        let cmaj7 = Chord::new(Pitch::default()).with_size(4);
        assert_eq!(keys(&cmaj7, &staff), vec![60, 64, 67, 71], "C E G B");
    }

    #[test]
    fn quality_flags() {
        let staff = Staff::default();
        assert_eq!(
            keys(&Chord::new(Pitch::default()).sus2(), &staff),
            vec![60, 62, 67],
            "C D G"
        );
        assert_eq!(
            keys(&Chord::new(Pitch::default()).sus4(), &staff),
            vec![60, 65, 67],
            "C F G"
        );
        assert_eq!(
            keys(&Chord::new(Pitch::default()).diminished(), &staff),
            vec![60, 63, 66],
            "C Eb Gb"
        );
        assert_eq!(
            keys(&Chord::new(Pitch::default()).augmented(), &staff),
            vec![60, 64, 68],
            "C E G#"
        );
    }

    #[test]
    fn qualities_are_mutually_exclusive() {
        let chord = Chord::new(Pitch::default()).diminished().sus4();
        assert!(!chord.diminished);
        assert!(chord.sus4);
    }

    #[test]
    fn inversions_rotate_the_bass() {
        let staff = Staff::default();
        let first = Chord::new(Pitch::default()).with_inversion(1);
        assert_eq!(keys(&first, &staff), vec![72, 64, 67], "E in the bass");

        let second = Chord::new(Pitch::default()).with_inversion(2);
        assert_eq!(keys(&second, &staff), vec![72, 76, 67], "G in the bass");
    }

    #[test]
    fn size_is_bounded_by_the_scale() {
        let staff = Staff::default();
        let tall = Chord::new(Pitch::new(Key::C, 3)).with_size(40);
        assert_eq!(tall.notes(&staff).len(), 7, "major scale tops out at 7 tones");
    }

    #[test]
    fn chord_spans_a_measure_by_default() {
        let staff = Staff::default();
        let chord = Chord::new(Pitch::default());
        let track = Track::default();
        let events = chord.playlist(&RenderContext::new(&staff, &track));
        assert_eq!(events.len(), 6);
        assert!(events.iter().all(|e| e.time_ms == 0.0 || e.time_ms == 2000.0));
    }
}
