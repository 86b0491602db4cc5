//! Fixed-step clock and epoch-tagged deferred effects
//!
//! Engines never sleep or hold host timers. The host feeds frame deltas in,
//! `FixedStep` turns them into discrete ticks, and `Timeline` releases delayed
//! effects once they come due. Every delayed effect carries the epoch it was
//! scheduled in; bumping the epoch (on round reset) makes older effects inert.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS};

/// Accumulates host frame time into fixed steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedStep {
    step: f32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            accumulator: 0.0,
        }
    }

    /// Feed a host frame delta (seconds), returning how many fixed steps to run
    pub fn advance(&mut self, dt: f32) -> u32 {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator >= self.step && steps < MAX_SUBSTEPS {
            self.accumulator -= self.step;
            steps += 1;
        }

        // Drop the backlog rather than spiral
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(self.step);
        }
        steps
    }

    /// Forget any partial step
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Deferred<E> {
    due: f32,
    epoch: u32,
    effect: E,
}

/// Queue of delayed effects tagged with the epoch they were scheduled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline<E> {
    now: f32,
    epoch: u32,
    pending: Vec<Deferred<E>>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self {
            now: 0.0,
            epoch: 0,
            pending: Vec::new(),
        }
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `effect` to fire `delay` seconds from now in the current epoch
    pub fn schedule(&mut self, delay: f32, effect: E) {
        self.pending.push(Deferred {
            due: self.now + delay.max(0.0),
            epoch: self.epoch,
            effect,
        });
    }

    /// Start a new epoch; everything scheduled before is discarded when it comes due
    pub fn invalidate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// True when no live (current-epoch) effect is waiting
    pub fn is_idle(&self) -> bool {
        !self.pending.iter().any(|d| d.epoch == self.epoch)
    }

    /// Move time forward by `dt` and return the live effects that came due, oldest first
    pub fn advance(&mut self, dt: f32) -> Vec<E> {
        self.now += dt.max(0.0);

        let now = self.now;
        let epoch = self.epoch;
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|d| d.due <= now);
        self.pending = waiting;

        due.sort_by(|a, b| a.due.total_cmp(&b.due));
        let before = due.len();
        let live: Vec<E> = due
            .into_iter()
            .filter(|d| d.epoch == epoch)
            .map(|d| d.effect)
            .collect();
        if live.len() != before {
            log::debug!("Dropped {} stale deferred effect(s)", before - live.len());
        }
        live
    }
}
