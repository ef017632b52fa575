//! The simulation driver: seeding, the step/patch/swap loop, and frame
//! emission at a fixed cadence.

use std::error::Error;
use std::mem;

use ndarray::{Array, Array2};
use rand::Rng;
use thiserror::Error as ThisError;

use super::render::threshold_mask;
use super::{patch_boundary, step, Field, Rates};

/// Fixed run parameters, built once at startup and handed to
/// [`Simulation::new`]. `Default` is the reference run.
#[derive(Debug, Clone)]
pub struct Config {
    pub rows: usize,
    pub cols: usize,
    /// Total number of update steps; the driver never stops early.
    pub steps: usize,
    /// Emit a frame whenever the step counter is a multiple of this.
    pub frame_every: usize,
    /// Number of seed droplets carved into the initial fields.
    pub droplets: usize,
    /// Droplets cover the half-open square `[c - hw, c + hw)` on both axes.
    pub droplet_halfwidth: usize,
    pub rates: Rates,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rows: 200,
            cols: 200,
            steps: 10_000,
            frame_every: 40,
            droplets: 20,
            droplet_halfwidth: 5,
            rates: Rates::default(),
        }
    }
}

impl Config {
    /// Frames a full run emits: the post-seed frame plus one per cadence.
    pub fn frame_count(&self) -> usize {
        1 + self.steps / self.frame_every
    }
}

/// Where the driver is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    Stepping,
    Done,
}

/// Errors from the frame pipeline. Both variants are terminal: the driver
/// propagates them without retrying, skipping, or buffering.
#[derive(Debug, ThisError)]
pub enum FrameError {
    /// The image encoder rejected a frame.
    #[error("frame encoding failed: {0}")]
    Encode(#[source] Box<dyn Error + Send + Sync>),
    /// The video writer could not append a frame or finalize the file.
    #[error("frame write failed: {0}")]
    Write(#[source] Box<dyn Error + Send + Sync>),
}

/// Consumer of rendered frames, in emission order.
pub trait FrameSink {
    fn put_frame(&mut self, mask: &Array2<bool>) -> Result<(), FrameError>;
}

/// Double-buffered two-species state plus the driver state machine.
///
/// `a`/`b` are the current generation, `a_next`/`b_next` the scratch targets
/// for the next one; [`Simulation::step`] swaps them instead of copying.
pub struct Simulation {
    config: Config,
    a: Field,
    b: Field,
    a_next: Field,
    b_next: Field,
    completed: usize,
    phase: Phase,
}

impl Simulation {
    /// Allocates all four fields. Panics if the grid has no interior or the
    /// cadence is zero; those are construction errors, not runtime ones.
    pub fn new(config: Config) -> Self {
        assert!(config.rows >= 3 && config.cols >= 3);
        assert!(config.frame_every >= 1);

        let dim = (config.rows, config.cols);
        Simulation {
            config,
            a: Array::from_elem(dim, 0.0),
            b: Array::from_elem(dim, 0.0),
            a_next: Array::from_elem(dim, 0.0),
            b_next: Array::from_elem(dim, 0.0),
            completed: 0,
            phase: Phase::Seeding,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Steps taken so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Current substrate field.
    pub fn a(&self) -> &Field {
        &self.a
    }

    /// Current activator field.
    pub fn b(&self) -> &Field {
        &self.b
    }

    /// Initializes the fields: substrate at 1 everywhere, activator at 0,
    /// then `droplets` random nucleation sites. Runs exactly once.
    ///
    /// Droplet centers are drawn uniformly over the full grid range, column
    /// before row; squares falling off the edge are clipped, never rejected.
    pub fn seed<R: Rng>(&mut self, rng: &mut R) {
        assert_eq!(self.phase, Phase::Seeding);

        self.a.fill(1.0);
        self.b.fill(0.0);

        for _ in 0..self.config.droplets {
            let col = rng.random_range(0..self.config.cols);
            let row = rng.random_range(0..self.config.rows);
            self.droplet(row, col);
        }

        self.phase = if self.config.steps == 0 {
            Phase::Done
        } else {
            Phase::Stepping
        };
    }

    /// Forces the clipped square around `(row, col)` to activator-dominant
    /// values: B = 1, A = 0. Idempotent, so overlapping droplets are fine.
    pub fn droplet(&mut self, row: usize, col: usize) {
        let hw = self.config.droplet_halfwidth;
        let top = row.saturating_sub(hw);
        let bottom = (row + hw).min(self.config.rows);
        let left = col.saturating_sub(hw);
        let right = (col + hw).min(self.config.cols);

        for i in top..bottom {
            for j in left..right {
                self.b[[i, j]] = 1.0;
                self.a[[i, j]] = 0.0;
            }
        }
    }

    /// One full iteration: interior update of both species, boundary patch,
    /// generation swap.
    pub fn step(&mut self) {
        assert_eq!(self.phase, Phase::Stepping);

        step(
            &self.a,
            &self.b,
            &mut self.a_next,
            &mut self.b_next,
            &self.config.rates,
        );
        patch_boundary(&mut self.a_next);
        patch_boundary(&mut self.b_next);

        mem::swap(&mut self.a, &mut self.a_next);
        mem::swap(&mut self.b, &mut self.b_next);

        self.completed += 1;
        if self.completed == self.config.steps {
            self.phase = Phase::Done;
        }
    }

    /// Runs the whole simulation: seed, emit the initial frame, then step to
    /// completion, emitting a frame after every `frame_every`-th step.
    ///
    /// Any sink error aborts the run immediately.
    pub fn run<R: Rng, S: FrameSink>(&mut self, rng: &mut R, sink: &mut S) -> Result<(), FrameError> {
        self.seed(rng);
        sink.put_frame(&threshold_mask(&self.a, &self.b))?;

        while self.phase == Phase::Stepping {
            self.step();

            if self.completed % self.config.frame_every == 0 {
                sink.put_frame(&threshold_mask(&self.a, &self.b))?;
            }
        }

        Ok(())
    }
}
