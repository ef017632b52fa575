//! Gray-Scott reaction-diffusion simulation on dense 2D grids.
//!
//! The numerics live in [`d2`]: the 9-point Laplacian stencil, the
//! two-species update step, zero-flux boundary handling, and the
//! double-buffered simulation driver. Rendering frames to JPEG and muxing
//! them into an AVI is left to the `video-util` crate in this workspace.

pub mod d2;
