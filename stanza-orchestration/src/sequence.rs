// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! [Sequence] is the ordered container elements are arranged in, with the
//! operations that turn a bag of elements into a line of music.

use stanza_core::{
    midi::{ExportEvent, PlaylistEvent},
    staff::Staff,
    time::{fraction, Length, Measures, Position},
    traits::{ExportsMidi, Plays, RenderContext, Spans},
};
use stanza_entities::Element;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Sequence {
    elements: Vec<Element>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: impl Into<Element>) -> &mut Self {
        self.elements.push(element.into());
        self
    }

    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) -> &mut Self {
        self.elements.extend(elements);
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Element> {
        self.elements.iter_mut()
    }

    /// Lays elements end to end: each takes the position after its
    /// predecessor's footprint. The first keeps its own position.
    pub fn stack(&mut self, staff: &Staff) -> &mut Self {
        let mut running: Option<(Position, Length)> = None;
        for element in &mut self.elements {
            match running {
                None => {
                    running = Some((element.position(), element.resolved_length(staff)));
                }
                Some((position, length)) => {
                    let next = position + length;
                    element.set_position(next);
                    running = Some((next, element.resolved_length(staff)));
                }
            }
        }
        self
    }

    /// Sorts by position and stretches each element's footprint to reach the
    /// next one. The last element is extended to the end of its measure.
    pub fn link(&mut self, staff: &Staff) -> &mut Self {
        self.elements
            .sort_by(|a, b| a.position().cmp(&b.position()));
        let positions: Vec<Position> = self.elements.iter().map(|e| e.position()).collect();
        for (index, element) in self.elements.iter_mut().enumerate() {
            if let Some(next) = positions.get(index + 1) {
                element.set_length(*next - element.position());
            } else {
                let measure_end = Position::from_measures(
                    Measures::from_integer(element.position().measure(staff) + 1),
                    staff,
                );
                element.set_length(measure_end - element.position());
            }
        }
        self
    }

    /// After linking, makes the sounds as long as their footprints.
    pub fn join(&mut self, staff: &Staff) -> &mut Self {
        for element in &mut self.elements {
            let length = element.resolved_length(staff);
            element.set_duration(length);
        }
        self
    }

    /// Lets equal-pitch consecutive notes ring into each other by opening
    /// the earlier note's gate fully.
    pub fn tie(&mut self) -> &mut Self {
        let mut previous: Option<usize> = None;
        for index in 0..self.elements.len() {
            if self.elements[index].as_note().is_none() {
                continue;
            }
            if let Some(prev_index) = previous {
                let pitch = self.elements[index].as_note().map(|n| n.pitch);
                let prev_pitch = self.elements[prev_index].as_note().map(|n| n.pitch);
                if pitch == prev_pitch {
                    if let Some(prev) = self.elements[prev_index].as_note_mut() {
                        prev.gate = fraction(1, 1);
                    }
                }
            }
            previous = Some(index);
        }
        self
    }

    /// Moves each note into the register closest to its predecessor: no leap
    /// wider than a tritone survives.
    pub fn smooth(&mut self) -> &mut Self {
        let mut previous: Option<stanza_core::pitch::Pitch> = None;
        for element in &mut self.elements {
            if let Some(note) = element.as_note_mut() {
                if let Some(prev) = previous {
                    while note.pitch > prev {
                        note.pitch = note.pitch.octave_down();
                    }
                    while note.pitch < prev {
                        note.pitch = note.pitch.octave_up();
                    }
                    if note.pitch.midi_note() - prev.midi_note() > 6 {
                        note.pitch = note.pitch.octave_down();
                    }
                }
                previous = Some(note.pitch);
            }
        }
        self
    }

    /// Plays the line backwards from where it started.
    pub fn reverse(&mut self, staff: &Staff) -> &mut Self {
        if self.elements.is_empty() {
            return self;
        }
        self.elements.reverse();
        let original_start = self.elements.last().expect("nonempty").position();
        self.elements
            .first_mut()
            .expect("nonempty")
            .set_position(original_start);
        self.stack(staff)
    }

    /// Repeats the whole line so it occurs `times` times end to end.
    pub fn repeated(&mut self, times: usize, staff: &Staff) -> &mut Self {
        if times == 0 {
            self.elements.clear();
            return self;
        }
        let span = self.end(staff) - self.start();
        let original = self.elements.clone();
        for copy in 1..times {
            let shift = span * copy as i64;
            for element in &original {
                let mut repeated = element.clone();
                repeated.set_position(repeated.position() + shift);
                self.elements.push(repeated);
            }
        }
        self
    }

    pub fn transpose(&mut self, semitones: i32) -> &mut Self {
        for element in &mut self.elements {
            element.transpose(semitones);
        }
        self
    }

    /// Displaces every element; a negative shift bottoms out at the start of
    /// the piece.
    pub fn shift(&mut self, displacement: Length) -> &mut Self {
        for element in &mut self.elements {
            let moved = (element.position() + displacement).max(Position::START);
            element.set_position(moved);
        }
        self
    }

    /// Snaps every position to the staff's step grid.
    pub fn quantize(&mut self, staff: &Staff) -> &mut Self {
        for element in &mut self.elements {
            element.set_position(element.position().quantized(staff));
        }
        self
    }
}

impl Spans for Sequence {
    fn start(&self) -> Position {
        self.elements
            .iter()
            .map(|e| e.position())
            .min()
            .unwrap_or(Position::START)
    }

    fn end(&self, staff: &Staff) -> Position {
        self.elements
            .iter()
            .map(|e| e.end(staff))
            .max()
            .unwrap_or(Position::START)
    }
}

impl Plays for Sequence {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        self.elements
            .iter()
            .flat_map(|element| element.playlist(context))
            .collect()
    }
}

impl ExportsMidi for Sequence {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        self.elements
            .iter()
            .flat_map(|element| element.midilist(context))
            .collect()
    }
}

impl FromIterator<Element> for Sequence {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Sequence {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}
