// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The point-in-time channel messages: control changes, pitch bends,
//! aftertouch and program changes.

use crate::elements::ElementBase;
use stanza_core::{
    midi::{
        clamp_data_byte, status, Controller, ExportEvent, ExportPayload, MidiMessageData,
        PlaylistEvent,
    },
    pitch::Pitch,
    time::Position,
    traits::{ExportsMidi, Plays, RenderContext},
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A controller movement. With no controller set, the staff default (Pan)
/// applies.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ControlChange {
    pub base: ElementBase,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub controller: Option<Controller>,
}

impl ControlChange {
    pub fn new(controller: Controller) -> Self {
        Self {
            base: ElementBase::default(),
            controller: Some(controller),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }

    pub fn with_value(mut self, value: u8) -> Self {
        let controller = self.controller.unwrap_or_default().with_value(value);
        self.controller = Some(controller);
        self
    }

    fn controller_on(&self, context: &RenderContext) -> Controller {
        self.controller.unwrap_or_else(|| context.staff.controller())
    }
}

impl Plays for ControlChange {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        let controller = self.controller_on(context);
        let channel = self.base.channel_on(context).wire();
        vec![PlaylistEvent::new(
            (context.offset + self.base.position).to_ms(context.staff),
            MidiMessageData::pair(
                status::CONTROL_CHANGE | channel,
                controller.number,
                controller.value,
                self.base.device_on(context),
            ),
        )]
    }
}

impl ExportsMidi for ControlChange {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        let controller = self.controller_on(context);
        vec![self.base.export_event(
            context,
            ExportPayload::Controller {
                number: controller.number,
                value: controller.value,
            },
        )]
    }
}

/// A pitch-wheel movement. Bend is signed, -8192..=8191, zero centered; the
/// wire value is the bend plus 8192 split into a 7-bit LSB/MSB pair.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PitchBend {
    pub base: ElementBase,
    pub bend: i16,
}

impl PitchBend {
    pub fn new(bend: i16) -> Self {
        Self {
            base: ElementBase::default(),
            bend: bend.clamp(-8192, 8191),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }

    pub fn wire_value(&self) -> u16 {
        (self.bend as i32 + 8192).clamp(0, 16383) as u16
    }
}

impl Plays for PitchBend {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        let wire = self.wire_value();
        let channel = self.base.channel_on(context).wire();
        vec![PlaylistEvent::new(
            (context.offset + self.base.position).to_ms(context.staff),
            MidiMessageData::pair(
                status::PITCH_BEND | channel,
                (wire & 0x7F) as u8,
                (wire >> 7) as u8,
                self.base.device_on(context),
            ),
        )]
    }
}

impl ExportsMidi for PitchBend {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        vec![self.base.export_event(
            context,
            ExportPayload::PitchWheel {
                value: self.wire_value(),
            },
        )]
    }
}

/// Channel aftertouch: one pressure value for the whole channel.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Aftertouch {
    pub base: ElementBase,
    pub pressure: u8,
}

impl Aftertouch {
    pub fn new(pressure: u8) -> Self {
        Self {
            base: ElementBase::default(),
            pressure: pressure.min(127),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }
}

impl Plays for Aftertouch {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        let channel = self.base.channel_on(context).wire();
        vec![PlaylistEvent::new(
            (context.offset + self.base.position).to_ms(context.staff),
            MidiMessageData::single(
                status::CHANNEL_AFTERTOUCH | channel,
                self.pressure,
                self.base.device_on(context),
            ),
        )]
    }
}

impl ExportsMidi for Aftertouch {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        vec![self.base.export_event(
            context,
            ExportPayload::ChannelPressure {
                pressure: self.pressure,
            },
        )]
    }
}

/// Polyphonic aftertouch: pressure on one held key.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PolyAftertouch {
    pub base: ElementBase,
    pub pitch: Pitch,
    pub pressure: u8,
}

impl PolyAftertouch {
    pub fn new(pitch: Pitch, pressure: u8) -> Self {
        Self {
            base: ElementBase::default(),
            pitch,
            pressure: pressure.min(127),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }
}

impl Plays for PolyAftertouch {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        let channel = self.base.channel_on(context).wire();
        vec![PlaylistEvent::new(
            (context.offset + self.base.position).to_ms(context.staff),
            MidiMessageData::pair(
                status::POLY_AFTERTOUCH | channel,
                clamp_data_byte(self.pitch.midi_note() as i64),
                self.pressure,
                self.base.device_on(context),
            ),
        )]
    }
}

impl ExportsMidi for PolyAftertouch {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        vec![self.base.export_event(
            context,
            ExportPayload::KeyPressure {
                key: clamp_data_byte(self.pitch.midi_note() as i64),
                pressure: self.pressure,
            },
        )]
    }
}

/// A program (patch) change. Programs are one-based for humans, zero-based
/// on the wire.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ProgramChange {
    pub base: ElementBase,
    pub program: u8,
}

impl Default for ProgramChange {
    fn default() -> Self {
        Self {
            base: ElementBase::default(),
            program: 1,
        }
    }
}

impl ProgramChange {
    pub fn new(program: u8) -> Self {
        Self {
            base: ElementBase::default(),
            program: program.clamp(1, 128),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }

    pub fn wire_program(&self) -> u8 {
        self.program.saturating_sub(1).min(127)
    }
}

impl Plays for ProgramChange {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        let channel = self.base.channel_on(context).wire();
        vec![PlaylistEvent::new(
            (context.offset + self.base.position).to_ms(context.staff),
            MidiMessageData::single(
                status::PROGRAM_CHANGE | channel,
                self.wire_program(),
                self.base.device_on(context),
            ),
        )]
    }
}

impl ExportsMidi for ProgramChange {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent> {
        vec![self.base.export_event(
            context,
            ExportPayload::Program {
                program: self.wire_program(),
            },
        )]
    }
}
