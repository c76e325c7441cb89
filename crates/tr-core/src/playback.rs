//! Playback control over a replay engine: autoplay ticking and
//! last-request-wins log loading.
//!
//! All transitions run to completion on the caller's thread; the
//! controller's job is ordering, not parallelism. Autoplay is suspended
//! for the duration of any manual step/jump so a timer tick can never
//! interleave with a user-driven seek on the same frame cursor, and a
//! load that was superseded by a newer request is discarded when its
//! result arrives.

use tracing::debug;

use tr_common::Result;

use crate::engine::ReplayEngine;
use crate::notify::StateSink;

/// Handle for an in-flight log load. Redeem it with
/// [`Playback::finish_load`]; only the most recently issued ticket is
/// still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Playback controller wrapping a [`ReplayEngine`].
pub struct Playback<S: StateSink> {
    engine: ReplayEngine<S>,
    playing: bool,
    period: u32,
    ticks: u64,
    load_generation: u64,
}

impl<S: StateSink> Playback<S> {
    /// Default autoplay period: one step per 30 host ticks.
    pub const DEFAULT_PERIOD: u32 = 30;

    pub fn new(engine: ReplayEngine<S>) -> Playback<S> {
        Playback {
            engine,
            playing: false,
            period: Self::DEFAULT_PERIOD,
            ticks: 0,
            load_generation: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_autoplay(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Host ticks between automatic forward steps. Clamped to at least 1.
    pub fn set_autoplay_period(&mut self, frames: u32) {
        self.period = frames.max(1);
    }

    pub fn autoplay_period(&self) -> u32 {
        self.period
    }

    /// Advance the host clock one tick; steps the engine forward every
    /// `period` ticks while playing. Returns whether a step happened.
    /// Ticking past the end of the log is a quiet no-op.
    pub fn tick(&mut self) -> Result<bool> {
        self.ticks += 1;
        if !self.playing || self.engine.log().is_empty() {
            return Ok(false);
        }
        if self.ticks % u64::from(self.period) != 0 {
            return Ok(false);
        }
        self.engine.step_forward()
    }

    /// Manual forward step; autoplay is suspended while it runs.
    pub fn step_forward(&mut self) -> Result<bool> {
        self.with_autoplay_paused(|e| e.step_forward())
    }

    /// Manual backward step (full rebuild); autoplay suspended.
    pub fn step_backward(&mut self) -> Result<bool> {
        self.with_autoplay_paused(|e| e.step_backward())
    }

    /// Manual jump; autoplay suspended.
    pub fn jump_to(&mut self, frame: usize) -> Result<()> {
        self.with_autoplay_paused(|e| e.jump_to(frame))
    }

    /// Load a log synchronously. Stops autoplay, as loading replaces the
    /// frame range out from under it.
    pub fn load(&mut self, raw: &str) -> Result<()> {
        self.playing = false;
        self.load_generation += 1;
        self.engine.load(raw)
    }

    /// Register intent to load; the returned ticket invalidates all
    /// earlier ones. Fetch the log contents however is convenient, then
    /// redeem with [`Playback::finish_load`].
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket {
            generation: self.load_generation,
        }
    }

    /// Complete a load begun with [`Playback::begin_load`]. Returns
    /// `Ok(false)` without touching any state if a newer load request
    /// superseded this ticket (last request wins).
    pub fn finish_load(&mut self, ticket: LoadTicket, raw: &str) -> Result<bool> {
        if ticket.generation != self.load_generation {
            debug!(
                ticket = ticket.generation,
                current = self.load_generation,
                "discarding superseded load"
            );
            return Ok(false);
        }
        self.playing = false;
        self.engine.load(raw)?;
        Ok(true)
    }

    pub fn engine(&self) -> &ReplayEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ReplayEngine<S> {
        &mut self.engine
    }

    fn with_autoplay_paused<T>(
        &mut self,
        op: impl FnOnce(&mut ReplayEngine<S>) -> Result<T>,
    ) -> Result<T> {
        let was_playing = self.playing;
        self.playing = false;
        let result = op(&mut self.engine);
        self.playing = was_playing;
        result
    }
}
