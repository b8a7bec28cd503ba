// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The staff: composition-wide defaults that every element falls back to.

use crate::midi::{Channel, Controller};
use crate::pitch::{Key, KeySignature, Pitch};
use crate::time::{fraction, NoteValue};
use crate::{ParameterType, TimeFraction};
use num_traits::ToPrimitive;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A conventional time signature: beats per measure over the note value that
/// gets one beat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TimeSignature {
    pub top: u8,
    pub bottom: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { top: 4, bottom: 4 }
    }
}

impl TimeSignature {
    /// Panics if either part is zero; a zero time signature has no meaning
    /// and would poison every later division.
    pub fn new(top: u8, bottom: u8) -> Self {
        assert!(top > 0 && bottom > 0, "time signature parts must be nonzero");
        Self { top, bottom }
    }

    pub fn beats_per_measure(&self) -> TimeFraction {
        TimeFraction::from_integer(self.top as i64)
    }

    /// The note value of one beat: the reciprocal of the bottom number.
    pub fn beat_note_value(&self) -> TimeFraction {
        fraction(1, self.bottom as i64)
    }

    /// Whole notes per measure: top/bottom.
    pub fn notes_per_measure(&self) -> TimeFraction {
        fraction(self.top as i64, self.bottom as i64)
    }
}

/// The staff holds the defaults a composition is written against: tempo,
/// meter, quantization grid, key signature, and the fallback values elements
/// use when they don't specify their own.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Staff {
    tempo: ParameterType,
    time_signature: TimeSignature,
    quantization: TimeFraction,
    key_signature: KeySignature,
    measures: u32,
    duration: NoteValue,
    octave: i8,
    velocity: u8,
    controller: Controller,
    channel: Channel,
    device: Vec<String>,
}

impl Default for Staff {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            time_signature: TimeSignature::default(),
            quantization: fraction(1, 16),
            key_signature: KeySignature::default(),
            measures: 8,
            duration: NoteValue::QUARTER,
            octave: 4,
            velocity: 100,
            controller: Controller::default(),
            channel: Channel::default(),
            device: vec![
                "Microsoft".to_string(),
                "FLUID".to_string(),
                "Apple".to_string(),
            ],
        }
    }
}

impl Staff {
    pub fn with_tempo(mut self, bpm: ParameterType) -> Self {
        self.set_tempo(bpm);
        self
    }

    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = time_signature;
        self
    }

    pub fn with_quantization(mut self, quantization: TimeFraction) -> Self {
        self.set_quantization(quantization);
        self
    }

    pub fn with_key_signature(mut self, key_signature: KeySignature) -> Self {
        self.key_signature = key_signature;
        self
    }

    pub fn with_measures(mut self, measures: u32) -> Self {
        self.measures = measures;
        self
    }

    pub fn with_duration(mut self, duration: NoteValue) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_octave(mut self, octave: i8) -> Self {
        self.octave = octave;
        self
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity.min(127);
        self
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_device(mut self, device: Vec<String>) -> Self {
        self.device = device;
        self
    }

    pub fn set_tempo(&mut self, bpm: ParameterType) {
        debug_assert!(bpm > 0.0);
        self.tempo = bpm.max(f64::MIN_POSITIVE);
    }

    pub fn set_quantization(&mut self, quantization: TimeFraction) {
        debug_assert!(quantization.to_f64().unwrap_or_default() > 0.0);
        self.quantization = quantization;
    }

    pub fn tempo(&self) -> ParameterType {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn key_signature(&self) -> KeySignature {
        self.key_signature
    }

    pub fn measures(&self) -> u32 {
        self.measures
    }

    pub fn duration(&self) -> NoteValue {
        self.duration
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// A pitch in the staff's default octave.
    pub fn pitch(&self, key: Key) -> Pitch {
        Pitch::new(key, self.octave)
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn controller(&self) -> Controller {
        self.controller
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn device(&self) -> &[String] {
        &self.device
    }

    pub fn beats_per_measure(&self) -> TimeFraction {
        self.time_signature.beats_per_measure()
    }

    pub fn beat_note_value(&self) -> TimeFraction {
        self.time_signature.beat_note_value()
    }

    pub fn notes_per_measure(&self) -> TimeFraction {
        self.time_signature.notes_per_measure()
    }

    /// The quantization grid as a note value. 1/16 by default.
    pub fn quantization(&self) -> TimeFraction {
        self.quantization
    }

    pub fn steps_per_note(&self) -> TimeFraction {
        self.quantization.recip()
    }

    pub fn steps_per_measure(&self) -> TimeFraction {
        self.steps_per_note() * self.notes_per_measure()
    }

    pub fn ms_per_beat(&self) -> f64 {
        60_000.0 / self.tempo
    }
}
