//! Entity lifecycle driver.
//!
//! Simulation entities own no state of their own: they read and write the
//! [`Frame`] handed to them at every phase. [`EpisodeRunner`] sequences the
//! phases of one episode:
//!
//! 1. `initialize` on every entity, then every instance is sealed
//! 2. per tick: `step` on all, `flush_states` on all, optional capture,
//!    `post_step` on all
//! 3. `reset` between episodes

use std::ops::Range;

use tessera_core::{FrameError, TickId};
use tracing::debug;

use crate::frame::Frame;

/// A participant in the episode lifecycle.
pub trait FrameEntity {
    /// Write initial values, including const attributes.
    fn initialize(&mut self, frame: &mut Frame) -> Result<(), FrameError>;

    /// Advance one tick.
    fn step(&mut self, frame: &mut Frame, tick: TickId) -> Result<(), FrameError>;

    /// Push any buffered state into the frame before capture.
    fn flush_states(&mut self, _frame: &mut Frame) -> Result<(), FrameError> {
        Ok(())
    }

    /// Runs after the tick has been captured.
    fn post_step(&mut self, _frame: &mut Frame, _tick: TickId) -> Result<(), FrameError> {
        Ok(())
    }

    /// Drop per-episode state. The frame has already been reset.
    fn reset(&mut self, _frame: &mut Frame) -> Result<(), FrameError> {
        Ok(())
    }
}

impl<E: FrameEntity + ?Sized> FrameEntity for Box<E> {
    fn initialize(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        (**self).initialize(frame)
    }

    fn step(&mut self, frame: &mut Frame, tick: TickId) -> Result<(), FrameError> {
        (**self).step(frame, tick)
    }

    fn flush_states(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        (**self).flush_states(frame)
    }

    fn post_step(&mut self, frame: &mut Frame, tick: TickId) -> Result<(), FrameError> {
        (**self).post_step(frame, tick)
    }

    fn reset(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        (**self).reset(frame)
    }
}

/// Runs a set of entities through initialize, ticks and reset.
#[derive(Debug)]
pub struct EpisodeRunner<E> {
    entities: Vec<E>,
    capture: bool,
    initialized: bool,
}

impl<E: FrameEntity> EpisodeRunner<E> {
    /// A runner over `entities`, in call order. Captures nothing.
    pub fn new(entities: Vec<E>) -> Self {
        Self {
            entities,
            capture: false,
            initialized: false,
        }
    }

    /// Capture a snapshot after every tick's flush phase.
    pub fn capture_snapshots(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    /// The entities.
    pub fn entities(&self) -> &[E] {
        &self.entities
    }

    /// The entities, mutably.
    pub fn entities_mut(&mut self) -> &mut [E] {
        &mut self.entities
    }

    /// Whether `initialize` has run since construction or the last reset.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize every entity, then seal every instance.
    pub fn initialize(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        for entity in &mut self.entities {
            entity.initialize(frame)?;
        }
        frame.seal_all();
        self.initialized = true;
        debug!(entities = self.entities.len(), "episode initialized");
        Ok(())
    }

    /// Run one tick. Initializes first if needed.
    pub fn run_tick(&mut self, frame: &mut Frame, tick: impl Into<TickId>) -> Result<(), FrameError> {
        let tick = tick.into();
        if !self.initialized {
            self.initialize(frame)?;
        }
        for entity in &mut self.entities {
            entity.step(frame, tick)?;
        }
        for entity in &mut self.entities {
            entity.flush_states(frame)?;
        }
        if self.capture {
            frame.take_snapshot(tick)?;
        }
        for entity in &mut self.entities {
            entity.post_step(frame, tick)?;
        }
        Ok(())
    }

    /// Run every tick in `ticks`, in order.
    pub fn run_episode(&mut self, frame: &mut Frame, ticks: Range<u64>) -> Result<(), FrameError> {
        for tick in ticks {
            self.run_tick(frame, tick)?;
        }
        Ok(())
    }

    /// Reset the frame, then every entity. The next tick re-initializes.
    pub fn reset(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        frame.reset()?;
        for entity in &mut self.entities {
            entity.reset(frame)?;
        }
        self.initialized = false;
        Ok(())
    }
}
