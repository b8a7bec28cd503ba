// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Exercises the arranging operations end to end: a line is written once,
//! then reshaped, and the reshaped playlist is checked.

use stanza::{
    Beats, Key, Length, Note, Pitch, Plays, Position, RenderContext, Sequence, Spans, Staff, Track,
};

fn line(staff: &Staff) -> Sequence {
    let mut sequence = Sequence::new();
    sequence
        .push(Note::new(Pitch::new(Key::C, 4)))
        .push(Note::new(Pitch::new(Key::E, 4)))
        .push(Note::new(Pitch::new(Key::G, 4)))
        .push(Note::new(Pitch::new(Key::C, 5)))
        .stack(staff);
    sequence
}

fn note_on_times(sequence: &Sequence, staff: &Staff) -> Vec<f64> {
    let track = Track::default();
    sequence
        .playlist(&RenderContext::new(staff, &track))
        .iter()
        .filter(|e| e.midi_message.status_byte == 0x90)
        .map(|e| e.time_ms)
        .collect()
}

fn note_keys(sequence: &Sequence) -> Vec<i32> {
    sequence
        .iter()
        .filter_map(|e| e.as_note())
        .map(|n| n.pitch.midi_note())
        .collect()
}

#[test]
fn an_arpeggio_reversed_and_repeated() {
    let staff = Staff::default();
    let mut arpeggio = line(&staff);

    arpeggio.reverse(&staff);
    assert_eq!(note_keys(&arpeggio), vec![72, 67, 64, 60]);
    assert_eq!(note_on_times(&arpeggio, &staff), vec![0.0, 500.0, 1000.0, 1500.0]);

    arpeggio.repeated(2, &staff);
    assert_eq!(arpeggio.len(), 8);
    let times = note_on_times(&arpeggio, &staff);
    assert_eq!(times[4], 2000.0, "second pass starts where the first ended");
}

#[test]
fn transpose_then_shift() {
    let staff = Staff::default();
    let mut melody = line(&staff);

    melody.transpose(12);
    assert_eq!(note_keys(&melody), vec![72, 76, 79, 84]);

    melody.shift(Length::from_beats(Beats::from_integer(2), &staff));
    assert_eq!(melody.start(), Position::from_beats(Beats::from_integer(2), &staff));
    assert_eq!(note_on_times(&melody, &staff)[0], 1000.0);
}

#[test]
fn link_then_join_makes_legato() {
    let staff = Staff::default();
    let mut sparse = Sequence::new();
    sparse
        .push(Note::new(Pitch::new(Key::C, 4)))
        .push(
            Note::new(Pitch::new(Key::G, 4))
                .at(Position::from_beats(Beats::from_integer(3), &staff)),
        )
        .link(&staff)
        .join(&staff);

    let track = Track::default();
    let events = sparse.playlist(&RenderContext::new(&staff, &track));
    // First note sounds right up to the second; second fills out its measure.
    assert_eq!(events[1].time_ms, 1500.0, "note-off meets the next note-on");
    assert_eq!(events[2].time_ms, 1500.0);
    assert_eq!(events[3].time_ms, 2000.0);
}

#[test]
fn smooth_tames_a_jagged_line() {
    let staff = Staff::default();
    let mut jagged = Sequence::new();
    jagged
        .push(Note::new(Pitch::new(Key::C, 4)))
        .push(Note::new(Pitch::new(Key::D, 6)))
        .push(Note::new(Pitch::new(Key::B, 2)))
        .stack(&staff)
        .smooth();

    let keys = note_keys(&jagged);
    for pair in keys.windows(2) {
        assert!(
            (pair[0] - pair[1]).abs() <= 6,
            "no leap wider than a tritone: {pair:?}"
        );
    }
}

#[test]
fn quantize_cleans_up_loose_timing() {
    let staff = Staff::default();
    let mut loose = Sequence::new();
    loose.push(
        Note::new(Pitch::new(Key::C, 4)).at(Position::from_note_value(
            stanza::NoteValue::new(stanza_core::time::fraction(65, 1024)),
        )),
    );
    loose.quantize(&staff);
    assert_eq!(
        loose.elements()[0].position().whole_notes(),
        stanza_core::time::fraction(1, 16)
    );
}
