//! Defaults and tolerances shared by the kernel, the sweep and the CLI.

/// Charges above this value are accepted but logged as outside the usual regime.
pub const CONVENTIONAL_MAX_CHARGE: u32 = 3;

pub const DEFAULT_COUPLING: f64 = 1.0;

pub const DEFAULT_OMEGA_START: f64 = 0.1;
pub const DEFAULT_OMEGA_END: f64 = 5.0;
pub const DEFAULT_OMEGA_STEP: f64 = 0.1;

pub const DEFAULT_RADIUS_START: f64 = 0.1;
pub const DEFAULT_RADIUS_END: f64 = 5.0;
pub const DEFAULT_RADIUS_STEP: f64 = 0.1;

/// Slack added to an axis end so step accumulation does not drop the last sample.
pub const GRID_END_TOLERANCE: f64 = 1e-9;

/// Absolute threshold below which `4r²sin²θ + T²` counts as zero.
pub const DENOMINATOR_TOLERANCE: f64 = 1e-8;

/// Absolute threshold below which `sin θ` counts as zero and the analytic limit is used.
pub const HARMONIC_ZERO_TOLERANCE: f64 = 1e-8;

pub const CSV_HEADER: &str = "Omega,r,PQ,PC";

/// Upper bound on samples per grid axis; larger requests are rejected up front.
pub const MAX_AXIS_SAMPLES: usize = 10_000_000;
