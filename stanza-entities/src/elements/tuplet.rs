// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::elements::{Element, ElementBase};
use stanza_core::{
    midi::{ExportEvent, PlaylistEvent},
    staff::Staff,
    time::{fraction, Length, Position},
    traits::{ExportsMidi, Plays, RenderContext},
    TimeFraction,
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// An arbitrary run of elements squeezed evenly into a doubled nominal
/// duration, with the same swing treatment as a retrigger. A three-element
/// tuplet is a triplet of whatever its children are.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Tuplet {
    pub base: ElementBase,
    pub swing: TimeFraction,
    pub elements: Vec<Element>,
}

impl Default for Tuplet {
    fn default() -> Self {
        Self {
            base: ElementBase::default(),
            swing: fraction(1, 2),
            elements: Vec::new(),
        }
    }
}

impl Tuplet {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }

    /// Sets the nominal duration; the tuplet spans twice this.
    pub fn with_duration(mut self, duration: Length) -> Self {
        self.base.duration = Some(duration * 2);
        self
    }

    pub fn with_swing(mut self, swing: TimeFraction) -> Self {
        self.swing = swing
            .max(TimeFraction::from_integer(0))
            .min(TimeFraction::from_integer(1));
        self
    }

    pub fn resolved_duration(&self, staff: &Staff) -> Length {
        self.base
            .duration
            .unwrap_or_else(|| Length::from_note_value(staff.duration()) * 2)
    }

    /// Lays the children out across the span: repositioned, re-timed copies.
    fn placed(&self, staff: &Staff) -> Vec<Element> {
        let count = self.elements.len() as i64;
        let single = match self.resolved_duration(staff).checked_div(count) {
            Some(length) => length,
            None => return Vec::new(),
        };

        let mut placed = Vec::with_capacity(self.elements.len());
        let mut position = self.base.position;
        for (index, element) in self.elements.iter().enumerate() {
            let ratio = if index % 2 == 0 {
                self.swing
            } else {
                TimeFraction::from_integer(1) - self.swing
            };
            let duration = single * 2 * ratio;
            let mut child = element.clone();
            child.set_position(position);
            child.set_duration(duration);
            child.set_length(duration);
            placed.push(child);
            position += duration;
        }
        placed
    }
}

impl Plays for Tuplet {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        self.placed(context.staff)
            .iter()
            .flat_map(|element| element.playlist(context))
            .collect()
    }
}

impl ExportsMidi for Tuplet {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        self.placed(context.staff)
            .iter()
            .flat_map(|element| element.midilist(context))
            .collect()
    }
}
