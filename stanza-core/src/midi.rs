// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! MIDI primitives: channels, controller numbers, status bytes, and the
//! timed-event types every renderer produces.

use std::fmt::Display;
use std::str::FromStr;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Status bytes for the channel and system real-time messages the playlist
/// carries. Channel messages get the wire channel OR'd into the low nibble.
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_AFTERTOUCH: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_AFTERTOUCH: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;
    pub const TIMING_CLOCK: u8 = 0xF8;
    pub const START: u8 = 0xFA;
    pub const CONTINUE: u8 = 0xFB;
    pub const STOP: u8 = 0xFC;
}

/// Clamps an arbitrary value into the 0..=127 MIDI data-byte range.
pub fn clamp_data_byte(value: i64) -> u8 {
    value.clamp(0, 127) as u8
}

/// A MIDI channel as musicians number them, 1 through 16. The wire nibble is
/// zero-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Channel(u8);

impl Default for Channel {
    fn default() -> Self {
        Channel(1)
    }
}

impl Channel {
    pub fn new(channel: u8) -> Self {
        Channel(channel.clamp(1, 16))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn wire(&self) -> u8 {
        (self.0 - 1) & 0x0F
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The General MIDI controller catalog: number, power-on default, and the
// names it goes by.
const CONTROLLERS: &[(u8, u8, &[&str])] = &[
    (0, 0, &["Bank Select"]),
    (1, 0, &["Modulation Wheel", "Modulation"]),
    (2, 0, &["Breath Controller"]),
    (4, 0, &["Foot Controller", "Foot Pedal"]),
    (5, 0, &["Portamento Time"]),
    (6, 0, &["Data Entry MSB"]),
    (7, 100, &["Main Volume", "Volume"]),
    (8, 64, &["Balance"]),
    (10, 64, &["Pan"]),
    (11, 0, &["Expression"]),
    (12, 0, &["Effect Control 1"]),
    (13, 0, &["Effect Control 2"]),
    (64, 0, &["Sustain", "Damper Pedal"]),
    (65, 0, &["Portamento"]),
    (66, 0, &["Sostenuto"]),
    (67, 0, &["Soft Pedal"]),
    (68, 0, &["Legato Footswitch"]),
    (69, 0, &["Hold 2"]),
    (70, 0, &["Sound Variation"]),
    (71, 0, &["Timbre", "Harmonic Content", "Resonance"]),
    (72, 64, &["Release Time"]),
    (73, 64, &["Attack Time"]),
    (74, 64, &["Brightness", "Frequency Cutoff"]),
    (84, 0, &["Portamento Control"]),
    (91, 0, &["Reverb"]),
    (92, 0, &["Tremolo"]),
    (93, 0, &["Chorus"]),
    (94, 0, &["Detune"]),
    (95, 0, &["Phaser"]),
    (96, 0, &["Data Increment"]),
    (97, 0, &["Data Decrement"]),
    (120, 0, &["All Sounds Off"]),
    (121, 0, &["Reset All Controllers"]),
    (122, 127, &["Local Control", "Local Keyboard"]),
    (123, 0, &["All Notes Off"]),
    (124, 0, &["Omni Off"]),
    (125, 0, &["Omni On"]),
    (126, 0, &["Mono On", "Monophonic"]),
    (127, 0, &["Poly On", "Polyphonic"]),
];

/// A controller number paired with a value. The default is Pan at center.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Controller {
    pub number: u8,
    pub value: u8,
}

impl Default for Controller {
    fn default() -> Self {
        Controller::numbered(10)
    }
}

impl Controller {
    pub fn new(number: u8, value: u8) -> Self {
        Self {
            number: number.min(127),
            value: value.min(127),
        }
    }

    /// A controller set to its catalog default value.
    pub fn numbered(number: u8) -> Self {
        Self::new(number, Self::default_value(number))
    }

    /// Looks a controller up by any of its conventional names.
    pub fn named(name: &str) -> Option<Self> {
        let wanted = name.trim();
        CONTROLLERS.iter().find_map(|(number, _, names)| {
            names
                .iter()
                .any(|n| n.eq_ignore_ascii_case(wanted))
                .then(|| Self::numbered(*number))
        })
    }

    pub fn default_value(number: u8) -> u8 {
        CONTROLLERS
            .iter()
            .find(|(n, _, _)| *n == number)
            .map(|(_, default, _)| *default)
            .unwrap_or(0)
    }

    pub fn name(&self) -> Option<&'static str> {
        CONTROLLERS
            .iter()
            .find(|(n, _, _)| *n == self.number)
            .map(|(_, _, names)| names[0])
    }

    pub fn with_value(mut self, value: u8) -> Self {
        self.value = value.min(127);
        self
    }
}

impl FromStr for Controller {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Controller::named(s).ok_or_else(|| format!("unrecognized controller name '{s}'"))
    }
}

/// The identity of a MIDI track in an arrangement: a name, a one-based track
/// number, and the channel/device the track's elements play on. Track number
/// zero is reserved for the sync clock and never appears in file exports.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Track {
    pub name: String,
    pub number: u16,
    /// None means the staff's default channel.
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub channel: Option<Channel>,
    pub device: Vec<String>,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            name: "Track 1".to_string(),
            number: 1,
            channel: None,
            device: Vec::new(),
        }
    }
}

impl Track {
    pub fn new(name: impl Into<String>, number: u16) -> Self {
        Self {
            name: name.into(),
            number,
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_device(mut self, device: Vec<String>) -> Self {
        self.device = device;
        self
    }

    /// The clock pseudo-track consumed by the player for sync only.
    pub fn clock() -> Self {
        Self {
            name: "Clock".to_string(),
            number: 0,
            channel: None,
            device: Vec::new(),
        }
    }
}

/// The bytes of one wire message plus the device preference list that routes
/// it. Field names are the Json Midi Player wire format, verbatim.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct MidiMessageData {
    pub status_byte: u8,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub data_byte_1: Option<u8>,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub data_byte_2: Option<u8>,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub data_byte: Option<u8>,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub device: Vec<String>,
}

impl MidiMessageData {
    pub fn status_only(status_byte: u8, device: Vec<String>) -> Self {
        Self {
            status_byte,
            device,
            ..Self::default()
        }
    }

    pub fn single(status_byte: u8, data_byte: u8, device: Vec<String>) -> Self {
        Self {
            status_byte,
            data_byte: Some(data_byte),
            device,
            ..Self::default()
        }
    }

    pub fn pair(status_byte: u8, data_byte_1: u8, data_byte_2: u8, device: Vec<String>) -> Self {
        Self {
            status_byte,
            data_byte_1: Some(data_byte_1),
            data_byte_2: Some(data_byte_2),
            device,
            ..Self::default()
        }
    }
}

/// One playlist entry: a message and the moment it plays.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PlaylistEvent {
    pub time_ms: f64,
    pub midi_message: MidiMessageData,
}

impl PlaylistEvent {
    pub fn new(time_ms: f64, midi_message: MidiMessageData) -> Self {
        Self {
            time_ms,
            midi_message,
        }
    }
}

/// The payload of one file-export event.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ExportPayload {
    Note { key: u8, velocity: u8 },
    Controller { number: u8, value: u8 },
    PitchWheel { value: u16 },
    ChannelPressure { pressure: u8 },
    KeyPressure { key: u8, pressure: u8 },
    Program { program: u8 },
    Rest,
}

/// One row of the MIDI-file export list: where and when an event happens, in
/// beats, plus enough staff context (tempo, meter) for the file writer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ExportEvent {
    pub track: u16,
    pub track_name: String,
    pub channel: u8,
    pub time_beats: f64,
    pub duration_beats: f64,
    pub tempo: f64,
    pub numerator: u8,
    pub denominator: u8,
    pub payload: ExportPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_wire_nibble() {
        assert_eq!(Channel::new(1).wire(), 0);
        assert_eq!(Channel::new(16).wire(), 15);
        assert_eq!(Channel::new(0).wire(), 0, "out-of-range clamps");
        assert_eq!(Channel::new(200).wire(), 15);
    }

    #[test]
    fn data_byte_clamping() {
        assert_eq!(clamp_data_byte(-5), 0);
        assert_eq!(clamp_data_byte(64), 64);
        assert_eq!(clamp_data_byte(300), 127);
    }

    #[test]
    fn controller_catalog() {
        let pan = Controller::default();
        assert_eq!(pan.number, 10);
        assert_eq!(pan.value, 64, "Pan defaults to center");
        assert_eq!(pan.name(), Some("Pan"));

        let modulation = Controller::named("modulation").unwrap();
        assert_eq!(modulation.number, 1);
        assert_eq!(Controller::named("Damper Pedal").unwrap().number, 64);
        assert!(Controller::named("flux capacitor").is_none());

        assert_eq!(Controller::default_value(7), 100);
        assert_eq!(Controller::default_value(122), 127);
        assert_eq!(Controller::default_value(3), 0, "unlisted numbers default to 0");
    }

    #[test]
    fn message_constructors_fill_the_right_bytes() {
        let on = MidiMessageData::pair(status::NOTE_ON, 60, 100, vec![]);
        assert_eq!(on.data_byte_1, Some(60));
        assert_eq!(on.data_byte_2, Some(100));
        assert_eq!(on.data_byte, None);

        let touch = MidiMessageData::single(status::CHANNEL_AFTERTOUCH, 80, vec![]);
        assert_eq!(touch.data_byte, Some(80));
        assert_eq!(touch.data_byte_1, None);
    }
}
