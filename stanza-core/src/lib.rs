// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Fundamental structs and traits.

/// The [midi] module holds MIDI primitives and the timed-event types.
pub mod midi;
/// The [pitch] module covers keys, octaves, scales and key signatures.
pub mod pitch;
/// The [staff] module holds composition-wide defaults.
pub mod staff;
/// The [time] module handles exact musical time.
pub mod time;
/// The [traits] module describes the public interfaces that are central to
/// the Stanza system.
pub mod traits;

/// Use [ParameterType] for continuous parameters without range restrictions,
/// like tempo.
pub type ParameterType = f64;

/// The exact rational number musical time is made of.
pub type TimeFraction = num_rational::Rational64;
