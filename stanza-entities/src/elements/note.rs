// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::elements::ElementBase;
use stanza_core::{
    midi::{clamp_data_byte, status, ExportEvent, ExportPayload, MidiMessageData, PlaylistEvent},
    pitch::Pitch,
    time::{fraction, Length, Position},
    traits::{ExportsMidi, Plays, RenderContext},
    TimeFraction,
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A single note: a pitch sounded at a position for a duration. The gate is
/// the sounded fraction of the duration; a tied note asks the arranger to
/// merge it with an equal-pitch predecessor.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Note {
    pub base: ElementBase,
    pub pitch: Pitch,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub velocity: Option<u8>,
    pub gate: TimeFraction,
    pub tied: bool,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            base: ElementBase::default(),
            pitch: Pitch::default(),
            velocity: None,
            gate: fraction(1, 1),
            tied: false,
        }
    }
}

impl Note {
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

    pub fn with_gate(mut self, gate: TimeFraction) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_tied(mut self, tied: bool) -> Self {
        self.tied = tied;
        self
    }

    pub fn with_channel(mut self, channel: stanza_core::midi::Channel) -> Self {
        self.base.channel = Some(channel);
        self
    }

    pub fn transposed(mut self, semitones: i32) -> Self {
        self.pitch = self.pitch.transposed(semitones);
        self
    }

    pub fn velocity_on(&self, context: &RenderContext) -> u8 {
        self.velocity.unwrap_or_else(|| context.staff.velocity())
    }

    /// The duration the note actually sounds for: duration scaled by gate.
    pub fn sounded(&self, context: &RenderContext) -> Length {
        self.base.resolved_duration(context.staff) * self.gate
    }
}

impl Plays for Note {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        let staff = context.staff;
        let channel = self.base.channel_on(context).wire();
        let key = clamp_data_byte(self.pitch.midi_note() as i64);
        let device = self.base.device_on(context);

        let on = context.offset + self.base.position;
        let off = on + self.sounded(context);
        vec![
            PlaylistEvent::new(
                on.to_ms(staff),
                MidiMessageData::pair(
                    status::NOTE_ON | channel,
                    key,
                    self.velocity_on(context),
                    device.clone(),
                ),
            ),
            PlaylistEvent::new(
                off.to_ms(staff),
                MidiMessageData::pair(status::NOTE_OFF | channel, key, 0, device),
            ),
        ]
    }
}

impl ExportsMidi for Note {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        let mut event = self.base.export_event(
            context,
            ExportPayload::Note {
                key: clamp_data_byte(self.pitch.midi_note() as i64),
                velocity: self.velocity_on(context),
            },
        );
        event.duration_beats = self.sounded(context).to_beats(context.staff).to_f64();
        vec![event]
    }
}

/// A silence occupying a span. The player format marks rests with a pair of
/// status-only events so the external player can honor them for timing.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Rest {
    pub base: ElementBase,
}

impl Rest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }

    pub fn with_duration(mut self, duration: Length) -> Self {
        self.base.duration = Some(duration);
        self
    }
}

impl Plays for Rest {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        let staff = context.staff;
        let channel = self.base.channel_on(context).wire();
        let device = self.base.device_on(context);

        let start = context.offset + self.base.position;
        let end = start + self.base.resolved_duration(staff);
        vec![
            PlaylistEvent::new(
                start.to_ms(staff),
                MidiMessageData::status_only(channel, device.clone()),
            ),
            PlaylistEvent::new(end.to_ms(staff), MidiMessageData::status_only(channel, device)),
        ]
    }
}

impl ExportsMidi for Rest {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        vec![self.base.export_event(context, ExportPayload::Rest)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_core::{
        midi::Track,
        pitch::Key,
        staff::Staff,
        time::{Beats, NoteValue},
    };

    fn context<'a>(staff: &'a Staff, track: &'a Track) -> RenderContext<'a> {
        RenderContext::new(staff, track)
    }

    #[test]
    fn note_on_off_pair() {
        let staff = Staff::default();
        let track = Track::default();
        let note = Note::new(Pitch::default()); // C4, staff defaults

        let events = note.playlist(&context(&staff, &track));
        assert_eq!(events.len(), 2);

        let on = &events[0];
        assert_eq!(on.time_ms, 0.0);
        assert_eq!(on.midi_message.status_byte, 0x90);
        assert_eq!(on.midi_message.data_byte_1, Some(60));
        assert_eq!(on.midi_message.data_byte_2, Some(100), "staff velocity");

        let off = &events[1];
        assert_eq!(off.time_ms, 500.0, "a quarter note at 120 BPM is 500 ms");
        assert_eq!(off.midi_message.status_byte, 0x80);
        assert_eq!(off.midi_message.data_byte_2, Some(0));
    }

    #[test]
    fn gate_shortens_the_sounded_span() {
        let staff = Staff::default();
        let track = Track::default();
        let note = Note::new(Pitch::default()).with_gate(fraction(1, 2));

        let events = note.playlist(&context(&staff, &track));
        assert_eq!(events[1].time_ms, 250.0);
    }

    #[test]
    fn channel_and_offset_are_honored() {
        let staff = Staff::default();
        let track = Track::default().with_channel(stanza_core::midi::Channel::new(10));
        let note = Note::new(Pitch::new(Key::A, 4))
            .at(Position::from_beats(Beats::from_integer(1), &staff));

        let ctx = context(&staff, &track)
            .with_offset(Position::from_beats(Beats::from_integer(4), &staff));
        let events = note.playlist(&ctx);
        assert_eq!(events[0].time_ms, 2500.0, "beat 5 at 120 BPM");
        assert_eq!(events[0].midi_message.status_byte, 0x90 | 9);
        assert_eq!(events[0].midi_message.data_byte_1, Some(69));
    }

    #[test]
    fn device_routing_prefers_the_most_specific() {
        let staff = Staff::default();
        let track = Track::default();

        // No overrides anywhere: the staff preference list routes.
        let note = Note::new(Pitch::default());
        let events = note.playlist(&context(&staff, &track));
        assert_eq!(
            events[0].midi_message.device,
            vec!["Microsoft", "FLUID", "Apple"]
        );

        // A track device list beats the staff's.
        let track = Track::default().with_device(vec!["loopMIDI".into()]);
        let events = note.playlist(&context(&staff, &track));
        assert_eq!(events[0].midi_message.device, vec!["loopMIDI"]);

        // An element override beats them both.
        let mut routed = note.clone();
        routed.base.device = Some(vec!["Blofeld".into()]);
        let events = routed.playlist(&context(&staff, &track));
        assert_eq!(events[0].midi_message.device, vec!["Blofeld"]);
    }

    #[test]
    fn note_export_row() {
        let staff = Staff::default();
        let track = Track::new("Lead", 2);
        let note = Note::new(Pitch::default())
            .with_duration(Length::from_note_value(NoteValue::HALF))
            .with_velocity(80);

        let rows = note.midilist(&context(&staff, &track));
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.track, 2);
        assert_eq!(row.track_name, "Lead");
        assert_eq!(row.time_beats, 0.0);
        assert_eq!(row.duration_beats, 2.0);
        assert_eq!(row.tempo, 120.0);
        assert_eq!((row.numerator, row.denominator), (4, 4));
        assert_eq!(
            row.payload,
            ExportPayload::Note {
                key: 60,
                velocity: 80
            }
        );
    }

    #[test]
    fn rest_markers() {
        let staff = Staff::default();
        let track = Track::default();
        let rest = Rest::new().with_duration(Length::from_beats(Beats::from_integer(2), &staff));

        let events = rest.playlist(&context(&staff, &track));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].midi_message.status_byte, 0x00);
        assert_eq!(events[0].midi_message.data_byte_1, None);
        assert_eq!(events[1].time_ms, 1000.0);
    }
}
