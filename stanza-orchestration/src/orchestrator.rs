// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! [Orchestrator] renders a whole arrangement (staff plus parts) into the
//! playlist the player consumes and the event list the file exporter
//! consumes.

use crate::sequence::Sequence;
use stanza_core::{
    midi::{ExportEvent, PlaylistEvent, Track},
    staff::Staff,
    traits::{ExportsMidi, Plays, PlaylistSink, RenderContext, Spans},
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// One instrumental part: a track identity and the line it plays.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Part {
    pub track: Track,
    pub sequence: Sequence,
}

impl Part {
    pub fn new(track: Track, sequence: Sequence) -> Self {
        Self { track, sequence }
    }
}

/// A complete piece: the staff it is written against and its parts.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Composition {
    pub staff: Staff,
    pub parts: Vec<Part>,
}

impl Composition {
    pub fn new(staff: Staff) -> Self {
        Self {
            staff,
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, track: Track, sequence: Sequence) -> Self {
        self.parts.push(Part::new(track, sequence));
        self
    }

    pub fn add_part(&mut self, track: Track, sequence: Sequence) -> &mut Self {
        self.parts.push(Part::new(track, sequence));
        self
    }

    /// The end of the last sounding part, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.parts
            .iter()
            .map(|part| part.sequence.end(&self.staff).to_ms(&self.staff))
            .fold(0.0, f64::max)
    }
}

/// The rendered playlist, ready for a [PlaylistSink].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Performance {
    pub events: Vec<PlaylistEvent>,
}

impl Performance {
    pub fn duration_ms(&self) -> f64 {
        self.events
            .iter()
            .map(|event| event.time_ms)
            .fold(0.0, f64::max)
    }
}

/// Renders and performs a [Composition].
#[derive(Clone, Debug, Default)]
pub struct Orchestrator {
    composition: Composition,
}

impl Orchestrator {
    pub fn new(composition: Composition) -> Self {
        Self { composition }
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Renders every part and merges the events into one timeline. The sort
    /// is stable, so simultaneous events keep their part order.
    pub fn render(&self) -> Performance {
        let staff = &self.composition.staff;
        let mut events: Vec<PlaylistEvent> = self
            .composition
            .parts
            .iter()
            .flat_map(|part| {
                part.sequence
                    .playlist(&RenderContext::new(staff, &part.track))
            })
            .collect();
        events.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        Performance { events }
    }

    /// Renders the file-export event list, ordered by track then time. The
    /// clock pseudo-track (number 0) never appears here.
    pub fn export(&self) -> Vec<ExportEvent> {
        let staff = &self.composition.staff;
        let mut events: Vec<ExportEvent> = self
            .composition
            .parts
            .iter()
            .filter(|part| part.track.number != 0)
            .flat_map(|part| {
                part.sequence
                    .midilist(&RenderContext::new(staff, &part.track))
            })
            .collect();
        events.sort_by(|a, b| {
            a.track
                .cmp(&b.track)
                .then(a.time_beats.total_cmp(&b.time_beats))
        });
        events
    }

    /// Renders and hands the playlist to a sink (the native player, a file
    /// writer...).
    pub fn perform(&self, sink: &mut dyn PlaylistSink) -> anyhow::Result<()> {
        sink.accept(&self.render().events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_core::{
        midi::Channel,
        pitch::{Key, Pitch},
        time::{Beats, Position},
    };
    use stanza_entities::{Clock, Note};

    fn two_part_composition() -> Composition {
        let staff = Staff::default();

        let mut melody = Sequence::new();
        melody
            .push(Note::new(Pitch::new(Key::E, 4)))
            .push(Note::new(Pitch::new(Key::G, 4)))
            .stack(&staff);

        let mut bass = Sequence::new();
        bass.push(
            Note::new(Pitch::new(Key::C, 2))
                .at(Position::from_beats(Beats::from_integer(1), &staff)),
        );

        Composition::new(staff)
            .with_part(Track::new("Melody", 1), melody)
            .with_part(
                Track::new("Bass", 2).with_channel(Channel::new(2)),
                bass,
            )
    }

    #[test]
    fn render_merges_and_orders_parts() {
        let orchestrator = Orchestrator::new(two_part_composition());
        let performance = orchestrator.render();
        assert_eq!(performance.events.len(), 6);

        let times: Vec<f64> = performance.events.iter().map(|e| e.time_ms).collect();
        let mut sorted = times.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(times, sorted, "events come out time-ordered");

        // Bass note-on lands between the two melody notes, on channel 2.
        let bass_on = performance
            .events
            .iter()
            .find(|e| e.midi_message.status_byte == 0x91)
            .unwrap();
        assert_eq!(bass_on.time_ms, 500.0);
    }

    #[test]
    fn export_skips_the_clock_track() {
        let mut composition = two_part_composition();
        let mut sync = Sequence::new();
        sync.push(Clock::new());
        composition.add_part(Track::clock(), sync);

        let orchestrator = Orchestrator::new(composition);
        let exported = orchestrator.export();
        assert_eq!(exported.len(), 3, "three notes, no clock rows");
        assert!(exported.iter().all(|e| e.track != 0));

        // But the playlist does carry the clock pulses.
        let performance = orchestrator.render();
        assert!(performance
            .events
            .iter()
            .any(|e| e.midi_message.status_byte == 0xF8));
    }

    #[test]
    fn perform_feeds_a_sink() {
        struct Collector(Vec<PlaylistEvent>);
        impl PlaylistSink for Collector {
            fn accept(&mut self, events: &[PlaylistEvent]) -> anyhow::Result<()> {
                self.0.extend_from_slice(events);
                Ok(())
            }
        }

        let orchestrator = Orchestrator::new(two_part_composition());
        let mut collector = Collector(Vec::new());
        orchestrator.perform(&mut collector).unwrap();
        assert_eq!(collector.0.len(), 6);
    }

    #[test]
    fn composition_duration() {
        let composition = two_part_composition();
        assert_eq!(composition.duration_ms(), 1000.0, "bass ends at beat 2");
    }
}
