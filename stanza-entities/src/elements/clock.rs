// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::elements::ElementBase;
use stanza_core::{
    midi::{status, ExportEvent, MidiMessageData, PlaylistEvent},
    staff::Staff,
    time::{round_ms, Length, Measures, Position},
    traits::{ExportsMidi, Plays, RenderContext},
};
use num_traits::ToPrimitive;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// The MIDI beat-clock element: a Start, a steady stream of Timing Clock
/// pulses, and a Stop, spanning a measure count. The external player uses it
/// to sync hardware; it never reaches file exports.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Clock {
    pub base: ElementBase,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub measures: Option<Measures>,
    pub ppqn: u16,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            base: ElementBase::default(),
            measures: None,
            ppqn: 24,
        }
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spanning(measures: Measures) -> Self {
        Self {
            measures: Some(measures),
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.base.position = position;
        self
    }

    pub fn with_ppqn(mut self, ppqn: u16) -> Self {
        if ppqn > 0 {
            self.ppqn = ppqn;
        }
        self
    }

    fn resolved_measures(&self, staff: &Staff) -> Measures {
        self.measures
            .unwrap_or_else(|| Measures::from_integer(staff.measures() as i64))
    }

    pub fn resolved_duration(&self, staff: &Staff) -> Length {
        Length::from_measures(self.resolved_measures(staff), staff)
    }

    fn pulse_count(&self, staff: &Staff) -> i64 {
        // 24 PPQN works out to pulses-per-whole-note scaled by the meter.
        let pulses_per_note = stanza_core::TimeFraction::from_integer(4 * self.ppqn as i64);
        let pulses_per_beat = pulses_per_note * staff.beat_note_value();
        let pulses_per_measure = pulses_per_beat * staff.beats_per_measure();
        (pulses_per_measure * self.resolved_measures(staff).value())
            .round()
            .to_integer()
    }
}

impl Plays for Clock {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent> {
        let staff = context.staff;
        let device = self.base.device_on(context);

        let start = (context.offset + self.base.position).to_ms(staff);
        let span = self.resolved_duration(staff);
        let stop = start + span.to_ms(staff);
        let pulses = self.pulse_count(staff);
        let measure_ms = Length::from_measures(Measures::from_integer(1), staff).to_ms(staff);
        let measures = self.resolved_measures(staff).value().to_f64().unwrap_or_default();

        let mut events = Vec::with_capacity(pulses.max(0) as usize + 2);
        events.push(PlaylistEvent::new(
            round_ms(start),
            MidiMessageData::status_only(status::START, device.clone()),
        ));
        for pulse in 1..pulses {
            events.push(PlaylistEvent::new(
                round_ms(start + measure_ms * measures * pulse as f64 / pulses as f64),
                MidiMessageData::status_only(status::TIMING_CLOCK, device.clone()),
            ));
        }
        events.push(PlaylistEvent::new(
            round_ms(stop),
            MidiMessageData::status_only(status::STOP, device),
        ));
        events
    }
}

impl ExportsMidi for Clock {
    fn midilist(&self, _context: &RenderContext) -> Vec<ExportEvent> {
        Vec::new()
    }
}
