// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Pitch: the twelve keys, octaves, scales and key signatures.

use std::fmt::Display;
use std::str::FromStr;
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// One of the twelve pitch classes, 0 = C through 11 = B.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Key(u8);

const KEY_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "Fb", "E#", "Gb", "G", "Ab", "A", "Bb", "Cb",
];

// The white keys of the piano, i.e. the C major scale.
const MAJOR_KEYS: [bool; 12] = [
    true, false, true, false, true, true, false, true, false, true, false, true,
];

impl Key {
    pub const C: Key = Key(0);
    pub const D: Key = Key(2);
    pub const E: Key = Key(4);
    pub const F: Key = Key(5);
    pub const G: Key = Key(7);
    pub const A: Key = Key(9);
    pub const B: Key = Key(11);

    pub fn new(semitone: i32) -> Self {
        Self(semitone.rem_euclid(12) as u8)
    }

    pub fn semitone(&self) -> u8 {
        self.0
    }

    /// True if this key is a white key (belongs to C major).
    pub fn is_natural(&self) -> bool {
        MAJOR_KEYS[self.0 as usize]
    }

    /// Walks `steps` white keys up (or down, when negative) from this key and
    /// returns the chromatic distance covered. Walking 2 steps up from C
    /// reaches E, 4 semitones away; from E it reaches G, 3 semitones away.
    pub fn semitones_for_steps(&self, steps: i32) -> i32 {
        let start = self.0 as i32;
        let mut remaining = steps;
        let mut semitones = 0i32;
        while remaining > 0 {
            semitones += 1;
            if MAJOR_KEYS[(start + semitones).rem_euclid(12) as usize] {
                remaining -= 1;
            }
        }
        while remaining < 0 {
            semitones -= 1;
            if MAJOR_KEYS[(start + semitones).rem_euclid(12) as usize] {
                remaining += 1;
            }
        }
        semitones
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", KEY_NAMES[self.0 as usize])
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        for (i, name) in KEY_NAMES.iter().enumerate() {
            if name.eq_ignore_ascii_case(wanted) {
                return Ok(Key(i as u8));
            }
        }
        for (i, name) in FLAT_NAMES.iter().enumerate() {
            if name.eq_ignore_ascii_case(wanted) {
                return Ok(Key(i as u8));
            }
        }
        Err(format!("unrecognized key name '{s}'"))
    }
}

/// A key plus an octave. Octave 4 is the middle octave; C4 is MIDI note 60.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Pitch {
    pub key: Key,
    pub octave: i8,
}

// Ordered by sounding height, not field order: B4 sits below C5.
impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.midi_note().cmp(&other.midi_note())
    }
}
impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for Pitch {
    fn default() -> Self {
        Self {
            key: Key::C,
            octave: 4,
        }
    }
}

impl Pitch {
    pub fn new(key: Key, octave: i8) -> Self {
        Self { key, octave }
    }

    /// The unclamped MIDI note number; may fall outside 0..=127 for extreme
    /// octaves. Clamping happens only at the wire boundary.
    pub fn midi_note(&self) -> i32 {
        12 * (self.octave as i32 + 1) + self.key.semitone() as i32
    }

    pub fn from_midi_note(note: i32) -> Self {
        Self {
            key: Key::new(note),
            octave: (note.div_euclid(12) - 1) as i8,
        }
    }

    /// Moves by raw semitones, carrying octaves.
    pub fn transposed(&self, semitones: i32) -> Self {
        Self::from_midi_note(self.midi_note() + semitones)
    }

    /// Moves along the white keys, the way a melody walks a staff.
    pub fn stepped(&self, steps: i32) -> Self {
        self.transposed(self.key.semitones_for_steps(steps))
    }

    pub fn octave_up(&self) -> Self {
        Self {
            key: self.key,
            octave: self.octave + 1,
        }
    }

    pub fn octave_down(&self) -> Self {
        Self {
            key: self.key,
            octave: self.octave - 1,
        }
    }
}

impl Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.key, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = String;

    // "C4", "F#3", "Bb-1"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .char_indices()
            .find(|(i, c)| *i > 0 && (c.is_ascii_digit() || *c == '-'))
            .map(|(i, _)| i);
        match split {
            Some(i) => {
                let key = Key::from_str(&s[..i])?;
                let octave: i8 = s[i..]
                    .parse()
                    .map_err(|_| format!("bad octave in '{s}'"))?;
                Ok(Pitch::new(key, octave))
            }
            None => Ok(Pitch::new(Key::from_str(s)?, 4)),
        }
    }
}

/// The named scales, as masks over the twelve keys.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, StrumDisplay, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum ScaleKind {
    Chromatic,
    #[default]
    #[strum(serialize = "Maj", serialize = "Ionian", to_string = "Major")]
    Major,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    #[strum(serialize = "min", serialize = "Aeolian", to_string = "minor")]
    Minor,
    Locrian,
    Harmonic,
    Melodic,
    OctatonicHw,
    OctatonicWh,
    #[strum(serialize = "Pentatonic", to_string = "PentatonicMajor")]
    PentatonicMajor,
    PentatonicMinor,
    Diminished,
    Augmented,
    Blues,
}

impl ScaleKind {
    fn mask(&self) -> u16 {
        // Bit n set means semitone n above the tonic is in the scale.
        fn bits(degrees: [u8; 12]) -> u16 {
            degrees
                .iter()
                .enumerate()
                .fold(0, |acc, (i, d)| acc | (u16::from(*d) << i))
        }
        match self {
            ScaleKind::Chromatic => bits([1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]),
            ScaleKind::Major => bits([1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1]),
            ScaleKind::Dorian => bits([1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 1, 0]),
            ScaleKind::Phrygian => bits([1, 1, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0]),
            ScaleKind::Lydian => bits([1, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1]),
            ScaleKind::Mixolydian => bits([1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 1, 0]),
            ScaleKind::Minor => bits([1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1, 0]),
            ScaleKind::Locrian => bits([1, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0]),
            ScaleKind::Harmonic => bits([1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 1]),
            ScaleKind::Melodic => bits([1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1]),
            ScaleKind::OctatonicHw => bits([1, 1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0]),
            ScaleKind::OctatonicWh => bits([1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1]),
            ScaleKind::PentatonicMajor => bits([1, 0, 1, 0, 1, 0, 0, 1, 0, 1, 0, 0]),
            ScaleKind::PentatonicMinor => bits([1, 0, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0]),
            ScaleKind::Diminished => bits([1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0]),
            ScaleKind::Augmented => bits([1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1]),
            ScaleKind::Blues => bits([1, 0, 0, 1, 0, 1, 1, 1, 0, 0, 1, 0]),
        }
    }
}

/// A scale as a mask over the twelve semitones above a tonic. Usually built
/// from a [ScaleKind]; modulation can produce rotations that no longer carry
/// a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Scale(u16);

impl Default for Scale {
    fn default() -> Self {
        ScaleKind::Major.into()
    }
}

impl From<ScaleKind> for Scale {
    fn from(kind: ScaleKind) -> Self {
        Scale(kind.mask())
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScaleKind::from_str(s.trim())
            .map(Scale::from)
            .map_err(|_| format!("unrecognized scale name '{s}'"))
    }
}

impl Scale {
    pub fn contains(&self, semitone: i32) -> bool {
        self.0 & (1 << semitone.rem_euclid(12)) != 0
    }

    /// How many of the twelve semitones the scale uses.
    pub fn tone_count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Chromatic distance from the tonic to the scale tone `degrees` steps
    /// up. Degree 0 is the tonic itself; degrees past the octave keep
    /// climbing (degree 7 of a major scale is 12).
    pub fn transposition(&self, degrees: u32) -> i32 {
        let mut remaining = degrees;
        let mut semitones = 0i32;
        while remaining > 0 {
            semitones += 1;
            if self.contains(semitones) {
                remaining -= 1;
            }
        }
        semitones
    }

    /// Rotates the mask so that the given mode degree (0 = first) becomes the
    /// new tonic. Modulating a major scale by 5 yields its relative minor.
    pub fn modulated(&self, mode: u32) -> Scale {
        let shift = self.transposition(mode).rem_euclid(12) as u32;
        Scale((self.0 >> shift | self.0 << (12 - shift)) & 0x0FFF)
    }

    pub fn kind(&self) -> Option<ScaleKind> {
        use strum::IntoEnumIterator;
        ScaleKind::iter().find(|kind| kind.mask() == self.0)
    }
}

/// A key signature: a signed count of accidentals (positive sharps, negative
/// flats) plus a major/minor quality. Seven sharps and seven flats are the
/// conventional limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct KeySignature {
    accidentals: i8,
    minor: bool,
}

impl Default for KeySignature {
    fn default() -> Self {
        Self {
            accidentals: 0,
            minor: false,
        }
    }
}

// The order accidentals accumulate: F C G D A E B sharped, the reverse
// flatted.
static SHARP_ORDER: [Key; 7] = [
    Key(6),  // F#
    Key(1),  // C#
    Key(8),  // G#
    Key(3),  // D#
    Key(10), // A#
    Key(5),  // E# = F
    Key(0),  // B# = C
];
static FLAT_ORDER: [Key; 7] = [
    Key(10), // Bb
    Key(3),  // Eb
    Key(8),  // Ab
    Key(1),  // Db
    Key(6),  // Gb
    Key(11), // Cb = B
    Key(4),  // Fb = E
];

impl KeySignature {
    pub fn new(accidentals: i8) -> Self {
        Self {
            accidentals: accidentals.clamp(-7, 7),
            minor: false,
        }
    }

    pub fn minor(accidentals: i8) -> Self {
        Self {
            accidentals: accidentals.clamp(-7, 7),
            minor: true,
        }
    }

    pub fn accidentals(&self) -> i8 {
        self.accidentals
    }

    pub fn is_minor(&self) -> bool {
        self.minor
    }

    /// The tonic implied by the accidental count: each sharp walks a fifth up
    /// from C, each flat a fifth down. Minor signatures sit three semitones
    /// below their relative major.
    pub fn tonic(&self) -> Key {
        let major = (self.accidentals as i32 * 7).rem_euclid(12);
        if self.minor {
            Key::new(major - 3)
        } else {
            Key::new(major)
        }
    }

    /// The keys this signature sharps, in signature order.
    pub fn sharps(&self) -> &'static [Key] {
        if self.accidentals > 0 {
            &SHARP_ORDER[..self.accidentals as usize]
        } else {
            &[]
        }
    }

    /// The keys this signature flats, in signature order.
    pub fn flats(&self) -> &'static [Key] {
        if self.accidentals < 0 {
            &FLAT_ORDER[..(-self.accidentals) as usize]
        } else {
            &[]
        }
    }

    /// The diatonic scale rooted at this signature's tonic.
    pub fn scale(&self) -> Scale {
        if self.minor {
            ScaleKind::Minor.into()
        } else {
            ScaleKind::Major.into()
        }
    }

    /// Whether a key belongs to this signature's diatonic set.
    pub fn contains(&self, key: Key) -> bool {
        let offset = key.semitone() as i32 - self.tonic().semitone() as i32;
        self.scale().contains(offset)
    }
}
