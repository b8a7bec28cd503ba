// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Everything that leaves the system as MIDI: the Json Midi Player wire
//! format, the native player binding, and Standard MIDI File export.

pub mod player;
pub mod playlist;
pub mod smf;

pub use player::{JsonMidiPlayer, PlayerError};
pub use playlist::{
    load_playlist, player_json, save_playlist, PlayerFile, PlaylistFileError, PlaylistFileSink,
    PLAYER_FILETYPE, PLAYER_URL,
};
pub use smf::{to_smf, write_midi_file, SmfError, TICKS_PER_QUARTER};
