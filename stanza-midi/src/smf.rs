// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Standard MIDI File export.
//!
//! Writes SMF Format 1 (multi-track): track 0 carries tempo and meter, then
//! one track per exported part. Times arrive in beats and become metrical
//! ticks at 480 per quarter note.

use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use stanza_core::midi::{clamp_data_byte, ExportEvent, ExportPayload};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

#[derive(Debug, Error)]
pub enum SmfError {
    #[error("couldn't write MIDI file: {0}")]
    Io(#[from] std::io::Error),
    #[error("nothing to export")]
    Empty,
}

/// Converts an export event list to MIDI and writes it to a file.
pub fn write_midi_file(events: &[ExportEvent], path: &Path) -> Result<(), SmfError> {
    let smf = to_smf(events)?;
    smf.save(path)?;
    Ok(())
}

fn beats_to_ticks(beats: f64, denominator: u8) -> u32 {
    // A beat is 4/denominator quarter notes.
    let quarters = beats * 4.0 / f64::from(denominator.max(1));
    (quarters * f64::from(TICKS_PER_QUARTER)).round().max(0.0) as u32
}

/// Converts an export event list to an in-memory SMF.
pub fn to_smf(events: &[ExportEvent]) -> Result<Smf<'_>, SmfError> {
    let first = events.first().ok_or(SmfError::Empty)?;

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo and time signature. The tempo meta is microseconds per
    // quarter note; the staff tempo is per beat, and a beat is 4/denominator
    // quarter notes.
    let mut tempo_track: Track<'_> = Vec::new();
    let tempo_microseconds =
        (60_000_000.0 / first.tempo * f64::from(first.denominator.max(1)) / 4.0).round() as u32;
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
            first.numerator,
            first.denominator.max(1).ilog2() as u8,
            24,
            8,
        )),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    let mut by_track: BTreeMap<u16, Vec<&ExportEvent>> = BTreeMap::new();
    for event in events {
        by_track.entry(event.track).or_default().push(event);
    }

    for rows in by_track.values() {
        let mut timed: Vec<(u32, TrackEventKind)> = Vec::new();
        let channel = u4::new(rows[0].channel & 0x0F);

        for row in rows {
            let tick = beats_to_ticks(row.time_beats, row.denominator);
            match row.payload {
                ExportPayload::Note { key, velocity } => {
                    let key = u7::new(clamp_data_byte(key as i64));
                    timed.push((
                        tick,
                        TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::NoteOn {
                                key,
                                vel: u7::new(clamp_data_byte(velocity as i64)),
                            },
                        },
                    ));
                    let off_tick = tick + beats_to_ticks(row.duration_beats, row.denominator);
                    timed.push((
                        off_tick,
                        TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::NoteOff {
                                key,
                                vel: u7::new(0),
                            },
                        },
                    ));
                }
                ExportPayload::Controller { number, value } => {
                    timed.push((
                        tick,
                        TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::Controller {
                                controller: u7::new(clamp_data_byte(number as i64)),
                                value: u7::new(clamp_data_byte(value as i64)),
                            },
                        },
                    ));
                }
                ExportPayload::PitchWheel { value } => {
                    timed.push((
                        tick,
                        TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::PitchBend {
                                bend: midly::PitchBend(midly::num::u14::new(value.min(16383))),
                            },
                        },
                    ));
                }
                ExportPayload::ChannelPressure { pressure } => {
                    timed.push((
                        tick,
                        TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::ChannelAftertouch {
                                vel: u7::new(clamp_data_byte(pressure as i64)),
                            },
                        },
                    ));
                }
                ExportPayload::KeyPressure { key, pressure } => {
                    timed.push((
                        tick,
                        TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::Aftertouch {
                                key: u7::new(clamp_data_byte(key as i64)),
                                vel: u7::new(clamp_data_byte(pressure as i64)),
                            },
                        },
                    ));
                }
                ExportPayload::Program { program } => {
                    timed.push((
                        tick,
                        TrackEventKind::Midi {
                            channel,
                            message: MidiMessage::ProgramChange {
                                program: u7::new(clamp_data_byte(program as i64)),
                            },
                        },
                    ));
                }
                // Rests shape the timeline but emit nothing.
                ExportPayload::Rest => {}
            }
        }

        timed.sort_by_key(|(tick, _)| *tick);

        let mut track: Track<'_> = Vec::new();
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(rows[0].track_name.as_bytes())),
        });
        let mut last_tick = 0u32;
        for (tick, kind) in timed {
            track.push(TrackEvent {
                delta: u28::new(tick - last_tick),
                kind,
            });
            last_tick = tick;
        }
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);
    }

    Ok(smf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_row(track: u16, time_beats: f64, duration_beats: f64, key: u8) -> ExportEvent {
        ExportEvent {
            track,
            track_name: format!("Track {track}"),
            channel: 0,
            time_beats,
            duration_beats,
            tempo: 120.0,
            numerator: 4,
            denominator: 4,
            payload: ExportPayload::Note { key, velocity: 100 },
        }
    }

    #[test]
    fn beat_tick_conversion() {
        assert_eq!(beats_to_ticks(1.0, 4), 480, "in x/4 a beat is a quarter");
        assert_eq!(beats_to_ticks(1.0, 8), 240, "in x/8 a beat is an eighth");
        assert_eq!(beats_to_ticks(0.5, 4), 240);
    }

    #[test]
    fn one_track_per_part_plus_tempo() {
        let events = vec![
            note_row(1, 0.0, 1.0, 60),
            note_row(1, 1.0, 1.0, 62),
            note_row(2, 0.0, 2.0, 36),
        ];
        let smf = to_smf(&events).unwrap();
        assert_eq!(smf.tracks.len(), 3);
        assert_eq!(smf.header.format, Format::Parallel);

        // Tempo track: 120 BPM is half a million microseconds per quarter.
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(us)) if us == u24::new(500_000)
        ));
    }

    #[test]
    fn note_pairs_with_correct_deltas() {
        let events = vec![note_row(1, 0.0, 1.0, 60), note_row(1, 2.0, 1.0, 64)];
        let smf = to_smf(&events).unwrap();
        let track = &smf.tracks[1];

        // name, on, off, on, off, end-of-track
        assert_eq!(track.len(), 6);
        assert!(matches!(
            track[1].kind,
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } if key == u7::new(60)
        ));
        assert_eq!(track[1].delta, u28::new(0));
        assert_eq!(track[2].delta, u28::new(480), "off one beat later");
        assert_eq!(track[3].delta, u28::new(480), "next on one beat after that");
    }

    #[test]
    fn rests_emit_nothing() {
        let mut rest = note_row(1, 0.0, 1.0, 0);
        rest.payload = ExportPayload::Rest;
        let rows = [rest];
        let smf = to_smf(&rows).unwrap();
        assert_eq!(smf.tracks[1].len(), 2, "just name and end-of-track");
    }

    #[test]
    fn empty_export_is_an_error() {
        assert!(matches!(to_smf(&[]), Err(SmfError::Empty)));
    }

    #[test]
    fn write_and_reparse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mid");
        write_midi_file(&[note_row(1, 0.0, 1.0, 60)], &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let reloaded = Smf::parse(&bytes).unwrap();
        assert_eq!(reloaded.tracks.len(), 2);
    }
}
