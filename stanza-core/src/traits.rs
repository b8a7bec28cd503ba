// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The public interfaces that are central to the Stanza system.

use crate::midi::{ExportEvent, PlaylistEvent, Track};
use crate::staff::Staff;
use crate::time::Position;

/// Everything a renderer needs to place an element's events: the staff for
/// timing, the track for identity/routing, and the offset the containing
/// arrangement adds to the element's own position.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    pub staff: &'a Staff,
    pub track: &'a Track,
    pub offset: Position,
}

impl<'a> RenderContext<'a> {
    pub fn new(staff: &'a Staff, track: &'a Track) -> Self {
        Self {
            staff,
            track,
            offset: Position::START,
        }
    }

    pub fn with_offset(mut self, offset: Position) -> Self {
        self.offset = offset;
        self
    }

    /// The device routing in effect: the track's device list, or the staff
    /// preference list when the track has none.
    pub fn device(&self) -> Vec<String> {
        if self.track.device.is_empty() {
            self.staff.device().to_vec()
        } else {
            self.track.device.clone()
        }
    }
}

/// Occupies a span of the timeline.
pub trait Spans {
    fn start(&self) -> Position;
    fn end(&self, staff: &Staff) -> Position;
}

/// Renders timed wire messages for the player.
pub trait Plays {
    fn playlist(&self, context: &RenderContext) -> Vec<PlaylistEvent>;
}

/// Renders file-export events for the MIDI writer.
pub trait ExportsMidi {
    fn midilist(&self, context: &RenderContext) -> Vec<ExportEvent>;
}

/// Accepts a finished playlist. Implemented by the native player binding and
/// by file writers.
pub trait PlaylistSink {
    fn accept(&mut self, events: &[PlaylistEvent]) -> anyhow::Result<()>;
}
