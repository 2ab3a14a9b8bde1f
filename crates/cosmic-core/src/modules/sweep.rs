//! Fault-isolated sweep over the `(Ω, r)` grid.
//!
//! Records are produced lazily in Omega-major order: the Omega axis is the
//! outer loop and `r` varies fastest. Consumers reshaping the series into a
//! surface rely on that order, see [`GridShape::record_index`].

use super::combiner::{TransitionEstimate, combine_transition_probabilities};
use crate::common::constants::{
    DEFAULT_OMEGA_END, DEFAULT_OMEGA_START, DEFAULT_OMEGA_STEP, DEFAULT_RADIUS_END,
    DEFAULT_RADIUS_START, DEFAULT_RADIUS_STEP, GRID_END_TOLERANCE, MAX_AXIS_SAMPLES,
};
use crate::domain::{ModelParameters, ParameterError};
use crate::numerics::{ClosedFormKernel, ResponseKernel};
use serde::Serialize;
use std::iter::FusedIterator;
use tracing::{debug, info};

/// Inclusive arithmetic progression `start, start + step, ...` up to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridAxis {
    start: f64,
    end: f64,
    step: f64,
    #[serde(skip)]
    len: usize,
}

impl GridAxis {
    pub fn new(
        name: &'static str,
        start: f64,
        end: f64,
        step: f64,
    ) -> Result<Self, ParameterError> {
        let invalid = |reason: String| ParameterError::InvalidAxis { axis: name, reason };

        if !(start.is_finite() && end.is_finite() && step.is_finite()) {
            return Err(invalid(format!(
                "bounds and step must be finite (start={start}, end={end}, step={step})"
            )));
        }
        if step <= 0.0 {
            return Err(invalid(format!("step must be > 0, got {step}")));
        }
        if end < start {
            return Err(invalid(format!("end {end} is below start {start}")));
        }

        let span = ((end - start) / step).floor();
        if span >= MAX_AXIS_SAMPLES as f64 {
            return Err(invalid(format!(
                "{span} steps exceed the limit of {MAX_AXIS_SAMPLES} samples"
            )));
        }

        Ok(Self {
            start,
            end,
            step,
            len: sample_count(start, end, step),
        })
    }

    /// Skips validation; only for bounds known to be well formed.
    fn from_bounds(start: f64, end: f64, step: f64) -> Self {
        Self {
            start,
            end,
            step,
            len: sample_count(start, end, step),
        }
    }

    pub const fn start(&self) -> f64 {
        self.start
    }

    pub const fn end(&self) -> f64 {
        self.end
    }

    pub const fn step(&self) -> f64 {
        self.step
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        (index < self.len).then(|| self.start + index as f64 * self.step)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> {
        let (start, step) = (self.start, self.step);
        (0..self.len).map(move |index| start + index as f64 * step)
    }

    /// Sample closest to zero when the axis straddles it.
    fn sample_nearest_zero(&self) -> Option<f64> {
        if self.start > GRID_END_TOLERANCE || self.end < -GRID_END_TOLERANCE {
            return None;
        }
        let index = (-self.start / self.step).round().max(0.0) as usize;
        self.value_at(index.min(self.len - 1))
    }
}

/// Number of samples `start + i * step` that stay within `end` plus the grid tolerance.
fn sample_count(start: f64, end: f64, step: f64) -> usize {
    let limit = end + GRID_END_TOLERANCE;
    let value_at = |index: usize| start + index as f64 * step;
    let mut count = ((end - start) / step).floor().max(0.0) as usize + 1;
    while count > 1 && value_at(count - 1) > limit {
        count -= 1;
    }
    while value_at(count) <= limit {
        count += 1;
    }
    count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridShape {
    pub omega_count: usize,
    pub radius_count: usize,
}

impl GridShape {
    pub const fn len(&self) -> usize {
        self.omega_count * self.radius_count
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of cell `(omega_index, radius_index)` in the emitted series.
    pub fn record_index(&self, omega_index: usize, radius_index: usize) -> Option<usize> {
        (omega_index < self.omega_count && radius_index < self.radius_count)
            .then(|| omega_index * self.radius_count + radius_index)
    }

    /// Inverse of [`GridShape::record_index`].
    pub fn cell_of(&self, record_index: usize) -> Option<(usize, usize)> {
        (record_index < self.len()).then(|| {
            (
                record_index / self.radius_count,
                record_index % self.radius_count,
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepGrid {
    omega: GridAxis,
    radius: GridAxis,
}

impl SweepGrid {
    /// Rejects a radius axis that samples `r = 0` before any cell is evaluated.
    pub fn new(omega: GridAxis, radius: GridAxis) -> Result<Self, ParameterError> {
        let zero_sample = radius
            .sample_nearest_zero()
            .filter(|value| value.abs() <= GRID_END_TOLERANCE);
        if let Some(value) = zero_sample {
            return Err(ParameterError::ZeroRadius { value });
        }
        Ok(Self { omega, radius })
    }

    pub const fn omega(&self) -> &GridAxis {
        &self.omega
    }

    pub const fn radius(&self) -> &GridAxis {
        &self.radius
    }

    pub const fn shape(&self) -> GridShape {
        GridShape {
            omega_count: self.omega.len(),
            radius_count: self.radius.len(),
        }
    }
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            omega: GridAxis::from_bounds(
                DEFAULT_OMEGA_START,
                DEFAULT_OMEGA_END,
                DEFAULT_OMEGA_STEP,
            ),
            radius: GridAxis::from_bounds(
                DEFAULT_RADIUS_START,
                DEFAULT_RADIUS_END,
                DEFAULT_RADIUS_STEP,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Estimate(TransitionEstimate),
    /// Both estimators failed; the message is the kernel diagnostic.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSample {
    pub omega: f64,
    pub r: f64,
    pub outcome: SampleOutcome,
}

impl GridSample {
    pub fn estimate(&self) -> Option<&TransitionEstimate> {
        match &self.outcome {
            SampleOutcome::Estimate(estimate) => Some(estimate),
            SampleOutcome::Failed(_) => None,
        }
    }

    pub fn quantum(&self) -> Option<f64> {
        self.estimate().map(|estimate| estimate.quantum)
    }

    pub fn classical(&self) -> Option<f64> {
        self.estimate().map(|estimate| estimate.classical)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            SampleOutcome::Estimate(_) => None,
            SampleOutcome::Failed(message) => Some(message),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SampleOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub cells: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SweepSummary {
    pub fn record(&mut self, sample: &GridSample) {
        self.cells += 1;
        if sample.is_failed() {
            self.failed += 1;
        } else {
            self.succeeded += 1;
        }
    }
}

impl<'a> FromIterator<&'a GridSample> for SweepSummary {
    fn from_iter<I: IntoIterator<Item = &'a GridSample>>(iter: I) -> Self {
        let mut summary = Self::default();
        for sample in iter {
            summary.record(sample);
        }
        summary
    }
}

/// Evaluates every grid cell with a [`ResponseKernel`].
///
/// The driver owns no mutable state, so [`SweepDriver::samples`] can be called
/// any number of times and always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SweepDriver<K = ClosedFormKernel> {
    params: ModelParameters,
    grid: SweepGrid,
    kernel: K,
}

impl SweepDriver<ClosedFormKernel> {
    pub fn new(params: ModelParameters, grid: SweepGrid) -> Self {
        Self::with_kernel(params, grid, ClosedFormKernel::default())
    }
}

impl<K: ResponseKernel> SweepDriver<K> {
    pub fn with_kernel(params: ModelParameters, grid: SweepGrid, kernel: K) -> Self {
        params.warn_unconventional_charges();
        Self {
            params,
            grid,
            kernel,
        }
    }

    pub const fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub const fn grid(&self) -> &SweepGrid {
        &self.grid
    }

    pub const fn shape(&self) -> GridShape {
        self.grid.shape()
    }

    /// Evaluates one cell, turning a kernel failure into a failed record.
    pub fn evaluate_cell(&self, omega: f64, r: f64) -> GridSample {
        let outcome = match combine_transition_probabilities(&self.kernel, &self.params, omega, r)
        {
            Ok(estimate) => SampleOutcome::Estimate(estimate),
            Err(error) => {
                debug!(omega, r, %error, "grid cell failed");
                SampleOutcome::Failed(error.to_string())
            }
        };
        GridSample { omega, r, outcome }
    }

    pub fn samples(&self) -> SweepSamples<'_, K> {
        let shape = self.shape();
        info!(
            n = self.params.n.get(),
            m = self.params.m.get(),
            switching_time = self.params.switching_time.get(),
            omega_count = shape.omega_count,
            radius_count = shape.radius_count,
            "starting grid sweep"
        );
        SweepSamples {
            driver: self,
            shape,
            next_index: 0,
        }
    }
}

/// Lazy, finite iterator over the records of one sweep.
#[derive(Debug)]
pub struct SweepSamples<'a, K> {
    driver: &'a SweepDriver<K>,
    shape: GridShape,
    next_index: usize,
}

impl<K: ResponseKernel> Iterator for SweepSamples<'_, K> {
    type Item = GridSample;

    fn next(&mut self) -> Option<Self::Item> {
        let Some((omega_index, radius_index)) = self.shape.cell_of(self.next_index) else {
            if self.next_index == self.shape.len() {
                info!(cells = self.shape.len(), "grid sweep finished");
                self.next_index += 1;
            }
            return None;
        };
        self.next_index += 1;

        let grid = &self.driver.grid;
        let omega = grid.omega.value_at(omega_index)?;
        let r = grid.radius.value_at(radius_index)?;
        Some(self.driver.evaluate_cell(omega, r))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.shape.len().saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl<K: ResponseKernel> ExactSizeIterator for SweepSamples<'_, K> {}

impl<K: ResponseKernel> FusedIterator for SweepSamples<'_, K> {}
