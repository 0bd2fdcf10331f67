//! Cursor state over the loaded frame sequence.
//!
//! Cursor 1 is the innermost frame (bottom), `len` the outermost (top).
//! Loading always replaces the whole state.

use crate::error::{Result, TraceError};
use crate::trace::{Frame, FrameSequence};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Loaded {
    sequence: FrameSequence,
    cursor: usize,
}

/// Outcome of a step command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    /// Already at the boundary; cursor unchanged.
    AtBoundary,
}

#[derive(Debug, Default)]
pub struct Navigator {
    state: Option<Loaded>,
    generation: u64,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current state with `sequence`, placing the cursor at
    /// `cursor` clamped to the sequence bounds.
    pub fn load(&mut self, sequence: FrameSequence, cursor: usize) {
        let cursor = cursor.clamp(1, sequence.len());
        log::debug!(
            "Loaded stack trace with {} frames, cursor at {cursor}",
            sequence.len()
        );
        self.state = Some(Loaded { sequence, cursor });
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Bumped on every load; used to tie pick lists to the sequence they
    /// were built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sequence(&self) -> Result<&FrameSequence> {
        self.loaded().map(|l| &l.sequence)
    }

    pub fn cursor(&self) -> Result<usize> {
        self.loaded().map(|l| l.cursor)
    }

    pub fn len(&self) -> usize {
        self.state.as_ref().map_or(0, |l| l.sequence.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frame under the cursor.
    pub fn current(&self) -> Result<&Frame> {
        let loaded = self.loaded()?;
        loaded.sequence.get(loaded.cursor).ok_or_else(|| {
            log::error!(
                "Navigator cursor {} outside 1..={}",
                loaded.cursor,
                loaded.sequence.len()
            );
            TraceError::Internal(format!(
                "cursor {} outside 1..={}",
                loaded.cursor,
                loaded.sequence.len()
            ))
        })
    }

    /// Outermost frame.
    pub fn goto_top(&mut self) -> Result<&Frame> {
        let loaded = self.loaded_mut()?;
        loaded.cursor = loaded.sequence.len();
        self.current()
    }

    /// Innermost frame.
    pub fn goto_bottom(&mut self) -> Result<&Frame> {
        self.loaded_mut()?.cursor = 1;
        self.current()
    }

    pub fn step_toward_top(&mut self) -> Result<Step> {
        let loaded = self.loaded_mut()?;
        if loaded.cursor >= loaded.sequence.len() {
            log::info!("Already at top of stack trace");
            return Ok(Step::AtBoundary);
        }
        loaded.cursor += 1;
        Ok(Step::Moved)
    }

    pub fn step_toward_bottom(&mut self) -> Result<Step> {
        let loaded = self.loaded_mut()?;
        if loaded.cursor <= 1 {
            log::info!("Already at bottom of stack trace");
            return Ok(Step::AtBoundary);
        }
        loaded.cursor -= 1;
        Ok(Step::Moved)
    }

    /// Move to 1-based `index`, which must be within `1..=len`.
    pub fn goto_index(&mut self, index: usize) -> Result<&Frame> {
        let loaded = self.loaded_mut()?;
        let len = loaded.sequence.len();
        if !(1..=len).contains(&index) {
            return Err(TraceError::IndexOutOfRange { index, len });
        }
        loaded.cursor = index;
        self.current()
    }

    fn loaded(&self) -> Result<&Loaded> {
        self.state.as_ref().ok_or(TraceError::NoTraceLoaded)
    }

    fn loaded_mut(&mut self) -> Result<&mut Loaded> {
        self.state.as_mut().ok_or(TraceError::NoTraceLoaded)
    }
}
