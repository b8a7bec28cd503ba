// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The elements a Stanza piece is made of.

pub mod elements;

pub use elements::{
    Aftertouch, Chord, Clock, ControlChange, Element, ElementBase, Note, PitchBend,
    PolyAftertouch, ProgramChange, Rest, Retrigger, Tuplet,
};
