// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The binding to the native Json Midi Player shared library, which owns the
//! real-time side: scheduling, MIDI port handling, sync.
//!
//! The library is platform-named (`JsonMidiPlayer_ctypes.dll`,
//! `libJsonMidiPlayer_ctypes.dylib`, `libJsonMidiPlayer_ctypes.so`), lives in
//! a `lib/` directory by default, and exposes one entry point:
//!
//! ```c
//! int PlayList_ctypes(const char *json, int verbose);
//! ```

use crate::playlist::{player_json, PlaylistFileError};
use libloading::Library;
use stanza_core::{midi::PlaylistEvent, traits::PlaylistSink};
use std::{
    ffi::{c_char, c_int, CString},
    path::{Path, PathBuf},
};
use thiserror::Error;

type PlayListFn = unsafe extern "C" fn(*const c_char, c_int) -> c_int;

const PLAY_LIST_SYMBOL: &[u8] = b"PlayList_ctypes";

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(
        "player library not found at {0}; compiled libraries are published at \
         https://sourceforge.net/projects/json-midi-player/files/ and sources at \
         https://github.com/ruiseixasm/JsonMidiPlayer"
    )]
    NotFound(PathBuf),
    #[error("couldn't load the player library: {0}")]
    Load(#[from] libloading::Error),
    #[error("couldn't encode the playlist: {0}")]
    Encode(#[from] PlaylistFileError),
    #[error("playlist JSON contains an interior NUL byte")]
    Nul(#[from] std::ffi::NulError),
    #[error("the player rejected the playlist (status {0})")]
    Rejected(i32),
}

/// A lazy handle to the native player. The library is loaded on first play
/// and kept for the life of the handle; a missing library logs its download
/// hint once and keeps failing quietly after that, so a composition loop
/// without hardware attached stays usable.
pub struct JsonMidiPlayer {
    library_path: PathBuf,
    library: Option<Library>,
    hinted: bool,
}

impl Default for JsonMidiPlayer {
    fn default() -> Self {
        Self::with_lib_dir(stanza_utils::Paths::player_lib_dir())
    }
}

impl JsonMidiPlayer {
    /// A player whose library lives in `lib_dir` under the platform name.
    pub fn with_lib_dir(lib_dir: impl AsRef<Path>) -> Self {
        Self::with_library_path(
            lib_dir
                .as_ref()
                .join(stanza_utils::Paths::player_library_name()),
        )
    }

    /// A player bound to an exact library file.
    pub fn with_library_path(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
            library: None,
            hinted: false,
        }
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn is_available(&self) -> bool {
        self.library.is_some() || self.library_path.is_file()
    }

    fn ensure_loaded(&mut self) -> Result<&Library, PlayerError> {
        if self.library.is_none() {
            if !self.library_path.is_file() {
                if !self.hinted {
                    self.hinted = true;
                    log::warn!(
                        "player library not found at {}",
                        self.library_path.display()
                    );
                }
                return Err(PlayerError::NotFound(self.library_path.clone()));
            }
            // Safety: the player library's initialization has no
            // preconditions beyond being the genuine artifact at this path.
            let library = unsafe { Library::new(&self.library_path)? };
            self.library = Some(library);
            log::info!("loaded player library {}", self.library_path.display());
        }
        Ok(self.library.as_ref().expect("just loaded"))
    }

    /// Sends the playlist to the native player and blocks until it finishes
    /// playing.
    pub fn play(&mut self, events: &[PlaylistEvent], verbose: bool) -> Result<(), PlayerError> {
        let json = CString::new(player_json(events)?)?;
        let library = self.ensure_loaded()?;
        // Safety: the symbol has the documented C signature and the JSON is
        // NUL-terminated for the duration of the call.
        let status = unsafe {
            let play_list: libloading::Symbol<PlayListFn> = library.get(PLAY_LIST_SYMBOL)?;
            play_list(json.as_ptr(), c_int::from(verbose))
        };
        if status < 0 {
            return Err(PlayerError::Rejected(status));
        }
        Ok(())
    }
}

impl std::fmt::Debug for JsonMidiPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonMidiPlayer")
            .field("library_path", &self.library_path)
            .field("loaded", &self.library.is_some())
            .finish()
    }
}

impl PlaylistSink for JsonMidiPlayer {
    fn accept(&mut self, events: &[PlaylistEvent]) -> anyhow::Result<()> {
        self.play(events, false)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut player = JsonMidiPlayer::with_lib_dir(dir.path());
        assert!(!player.is_available());

        match player.play(&[], false) {
            Err(PlayerError::NotFound(path)) => {
                assert!(path.starts_with(dir.path()));
                assert!(path
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .contains("JsonMidiPlayer_ctypes"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn library_name_is_platform_specific() {
        let player = JsonMidiPlayer::default();
        let name = player
            .library_path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        if cfg!(windows) {
            assert_eq!(name, "JsonMidiPlayer_ctypes.dll");
        } else if cfg!(target_os = "macos") {
            assert_eq!(name, "libJsonMidiPlayer_ctypes.dylib");
        } else {
            assert_eq!(name, "libJsonMidiPlayer_ctypes.so");
        }
    }
}
