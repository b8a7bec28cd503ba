// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Musical time, kept exact.
//!
//! Everything here is a rational number of some musical unit. The canonical
//! unit for [Position] and [Length] is the whole note, which keeps conversion
//! between measures, beats and steps lossless no matter the time signature.
//! Wall-clock milliseconds exist only at the playlist boundary, where they are
//! rounded to three decimal places.

use crate::staff::Staff;
use crate::TimeFraction;
use num_traits::{ToPrimitive, Zero};
use std::{
    cmp::Ordering,
    fmt::Display,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Builds a [TimeFraction] from a numerator/denominator pair without going
/// through floating point.
pub fn fraction(numer: i64, denom: i64) -> TimeFraction {
    TimeFraction::new(numer, denom)
}

fn ratio_to_f64(value: TimeFraction) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Rounds a millisecond value the way the playlist wire format expects.
pub fn round_ms(ms: f64) -> f64 {
    (ms * 1000.0).round() / 1000.0
}

macro_rules! time_unit {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
        pub struct $name(pub TimeFraction);

        impl $name {
            pub fn new(value: TimeFraction) -> Self {
                Self(value)
            }

            pub fn from_integer(value: i64) -> Self {
                Self(TimeFraction::from_integer(value))
            }

            pub fn value(&self) -> TimeFraction {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            pub fn to_f64(&self) -> f64 {
                ratio_to_f64(self.0)
            }
        }
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self::from_integer(value)
            }
        }
        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }
        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }
        impl Mul<TimeFraction> for $name {
            type Output = Self;
            fn mul(self, rhs: TimeFraction) -> Self::Output {
                Self(self.0 * rhs)
            }
        }
        impl Mul<i64> for $name {
            type Output = Self;
            fn mul(self, rhs: i64) -> Self::Output {
                Self(self.0 * TimeFraction::from_integer(rhs))
            }
        }
    };
}

time_unit!(
    Measures,
    "A count of measures (bars) on the staff, possibly fractional."
);
time_unit!(
    Beats,
    "A count of beats, the unit the tempo (BPM) is expressed in."
);
time_unit!(
    Steps,
    "A count of quantization steps, by default sixteenth notes."
);
time_unit!(
    NoteValue,
    "A fraction of a whole note: 1/4 is a quarter note, 3/8 a dotted quarter."
);

impl NoteValue {
    pub const WHOLE: NoteValue = NoteValue(TimeFraction::new_raw(1, 1));
    pub const HALF: NoteValue = NoteValue(TimeFraction::new_raw(1, 2));
    pub const QUARTER: NoteValue = NoteValue(TimeFraction::new_raw(1, 4));
    pub const EIGHTH: NoteValue = NoteValue(TimeFraction::new_raw(1, 8));
    pub const SIXTEENTH: NoteValue = NoteValue(TimeFraction::new_raw(1, 16));
    pub const THIRTY_SECOND: NoteValue = NoteValue(TimeFraction::new_raw(1, 32));

    /// A dotted note value is half again as long as its base.
    pub fn dotted(self) -> Self {
        Self(self.0 * fraction(3, 2))
    }

    /// The note value of one beat under the given staff.
    pub fn of_beat(staff: &Staff) -> Self {
        Self(staff.beat_note_value())
    }
}

/// A point on the timeline, measured in whole notes from the start of the
/// piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Position(TimeFraction);

/// A span of time, measured in whole notes. May be zero; negative lengths can
/// arise from subtraction and are legal intermediate values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Length(TimeFraction);

impl Position {
    pub const START: Position = Position(TimeFraction::new_raw(0, 1));

    pub fn from_note_value(value: NoteValue) -> Self {
        Self(value.0)
    }

    pub fn from_measures(measures: Measures, staff: &Staff) -> Self {
        Self(measures.0 * staff.notes_per_measure())
    }

    pub fn from_beats(beats: Beats, staff: &Staff) -> Self {
        Self(beats.0 * staff.beat_note_value())
    }

    pub fn from_steps(steps: Steps, staff: &Staff) -> Self {
        Self(steps.0 * staff.quantization())
    }

    pub fn whole_notes(&self) -> TimeFraction {
        self.0
    }

    pub fn to_measures(&self, staff: &Staff) -> Measures {
        Measures(self.0 / staff.notes_per_measure())
    }

    pub fn to_beats(&self, staff: &Staff) -> Beats {
        Beats(self.0 / staff.beat_note_value())
    }

    pub fn to_steps(&self, staff: &Staff) -> Steps {
        Steps(self.0 / staff.quantization())
    }

    /// The measure this position falls in, counted from zero.
    pub fn measure(&self, staff: &Staff) -> i64 {
        self.to_measures(staff).0.floor().to_integer()
    }

    /// Snaps to the nearest quantization step.
    pub fn quantized(&self, staff: &Staff) -> Self {
        let step = staff.quantization();
        let steps = (self.0 / step).round();
        Self(steps * step)
    }

    pub fn to_ms(&self, staff: &Staff) -> f64 {
        round_ms(self.to_beats(staff).to_f64() * staff.ms_per_beat())
    }
}

impl Length {
    pub const ZERO: Length = Length(TimeFraction::new_raw(0, 1));

    pub fn from_note_value(value: NoteValue) -> Self {
        Self(value.0)
    }

    pub fn from_measures(measures: Measures, staff: &Staff) -> Self {
        Self(measures.0 * staff.notes_per_measure())
    }

    pub fn from_beats(beats: Beats, staff: &Staff) -> Self {
        Self(beats.0 * staff.beat_note_value())
    }

    pub fn from_steps(steps: Steps, staff: &Staff) -> Self {
        Self(steps.0 * staff.quantization())
    }

    pub fn whole_notes(&self) -> TimeFraction {
        self.0
    }

    pub fn note_value(&self) -> NoteValue {
        NoteValue(self.0)
    }

    pub fn to_beats(&self, staff: &Staff) -> Beats {
        Beats(self.0 / staff.beat_note_value())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_ms(&self, staff: &Staff) -> f64 {
        round_ms(self.to_beats(staff).to_f64() * staff.ms_per_beat())
    }

    /// Checked division by an integer count, used when subdividing a span.
    pub fn checked_div(&self, divisor: i64) -> Option<Length> {
        if divisor == 0 {
            None
        } else {
            Some(Length(self.0 / TimeFraction::from_integer(divisor)))
        }
    }
}

impl From<NoteValue> for Length {
    fn from(value: NoteValue) -> Self {
        Self(value.0)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl Display for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<Length> for Position {
    type Output = Position;
    fn add(self, rhs: Length) -> Self::Output {
        Position(self.0 + rhs.0)
    }
}
// Adding two positions composes an offset with a local position.
impl Add for Position {
    type Output = Position;
    fn add(self, rhs: Position) -> Self::Output {
        Position(self.0 + rhs.0)
    }
}
impl AddAssign<Length> for Position {
    fn add_assign(&mut self, rhs: Length) {
        self.0 += rhs.0;
    }
}
impl Sub<Length> for Position {
    type Output = Position;
    fn sub(self, rhs: Length) -> Self::Output {
        Position(self.0 - rhs.0)
    }
}
impl Sub for Position {
    type Output = Length;
    fn sub(self, rhs: Position) -> Self::Output {
        Length(self.0 - rhs.0)
    }
}
impl Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Self::Output {
        Length(self.0 + rhs.0)
    }
}
impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        self.0 += rhs.0;
    }
}
impl Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Self::Output {
        Length(self.0 - rhs.0)
    }
}
impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Length) {
        self.0 -= rhs.0;
    }
}
impl Mul<TimeFraction> for Length {
    type Output = Length;
    fn mul(self, rhs: TimeFraction) -> Self::Output {
        Length(self.0 * rhs)
    }
}
impl Mul<i64> for Length {
    type Output = Length;
    fn mul(self, rhs: i64) -> Self::Output {
        Length(self.0 * TimeFraction::from_integer(rhs))
    }
}
impl Neg for Length {
    type Output = Length;
    fn neg(self) -> Self::Output {
        Length(-self.0)
    }
}

impl PartialOrd<Position> for Length {
    fn partial_cmp(&self, other: &Position) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}
impl PartialEq<Position> for Length {
    fn eq(&self, other: &Position) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staff::{Staff, TimeSignature};
    use float_cmp::approx_eq;

    #[test]
    fn conversions_follow_the_time_signature() {
        let staff = Staff::default(); // 4/4, 120 BPM, 1/16 quantization

        let one_measure = Position::from_measures(Measures::from_integer(1), &staff);
        assert_eq!(one_measure.to_beats(&staff), Beats::from_integer(4));
        assert_eq!(one_measure.to_steps(&staff), Steps::from_integer(16));
        assert_eq!(one_measure.whole_notes(), fraction(1, 1));

        let staff = Staff::default().with_time_signature(TimeSignature::new(3, 4));
        let one_measure = Position::from_measures(Measures::from_integer(1), &staff);
        assert_eq!(one_measure.to_beats(&staff), Beats::from_integer(3));
        assert_eq!(one_measure.whole_notes(), fraction(3, 4));
    }

    #[test]
    fn milliseconds_at_the_boundary() {
        let staff = Staff::default();

        // At 120 BPM a beat is half a second, a 4/4 measure two seconds.
        let one_beat = Length::from_beats(Beats::from_integer(1), &staff);
        assert!(approx_eq!(f64, one_beat.to_ms(&staff), 500.0));
        let one_measure = Length::from_measures(Measures::from_integer(1), &staff);
        assert!(approx_eq!(f64, one_measure.to_ms(&staff), 2000.0));

        // An eighth note is half a beat.
        let eighth = Length::from_note_value(NoteValue::EIGHTH);
        assert!(approx_eq!(f64, eighth.to_ms(&staff), 250.0));
    }

    #[test]
    fn position_length_arithmetic() {
        use more_asserts::assert_gt;

        let staff = Staff::default();
        let p = Position::from_beats(Beats::from_integer(2), &staff);
        let l = Length::from_beats(Beats::from_integer(3), &staff);

        assert_gt!(p + l, p);
        assert_eq!((p + l).to_beats(&staff), Beats::from_integer(5));
        assert_eq!((p + l) - p, l);
        assert_eq!(l.checked_div(0), None);
        assert_eq!(
            l.checked_div(3),
            Some(Length::from_beats(Beats::from_integer(1), &staff))
        );
    }

    #[test]
    fn dotted_values() {
        assert_eq!(NoteValue::QUARTER.dotted().value(), fraction(3, 8));
        assert_eq!(NoteValue::EIGHTH.dotted().value(), fraction(3, 16));
    }

    #[test]
    fn quantize_snaps_to_the_step_grid() {
        let staff = Staff::default();
        let almost = Position::from_note_value(NoteValue::new(fraction(17, 256)));
        assert_eq!(
            almost.quantized(&staff).whole_notes(),
            fraction(1, 16),
            "17/256 of a whole note should snap to the nearest sixteenth"
        );
    }

    #[test]
    fn measure_counting() {
        let staff = Staff::default();
        let p = Position::from_beats(Beats::from_integer(5), &staff);
        assert_eq!(p.measure(&staff), 1);
        assert_eq!(Position::START.measure(&staff), 0);
    }

    #[test]
    fn rounding_matches_the_wire_format() {
        assert_eq!(round_ms(123.4564999), 123.456);
        assert_eq!(round_ms(123.4565001), 123.457);
    }
}
