//! Singularity-safe evaluation of the cosmic-string detector response.
//!
//! The crate is organised bottom-up: [`domain`] holds the validated parameter
//! model and error types, [`numerics`] the closed-form summation kernel,
//! and [`modules`] the combiner, the grid sweep and the record sinks built on
//! top of it.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
