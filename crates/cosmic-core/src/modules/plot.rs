//! Boundary towards 3D visualisation.
//!
//! Rendering is left to a host toolkit; this module only prepares the two
//! labelled point clouds and defines the trait a renderer implements.

use super::sweep::GridSample;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl Default for AxisLabels {
    fn default() -> Self {
        Self {
            x: "Omega (Ω)".to_string(),
            y: "r".to_string(),
            z: "P".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSeries {
    pub label: String,
    pub points: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPlot {
    pub axes: AxisLabels,
    pub quantum: PointSeries,
    pub classical: PointSeries,
}

impl ScatterPlot {
    /// Builds `(Ω, r, P_Q)` and `(Ω, r, P_C)` point sets, dropping failed cells.
    pub fn from_samples<'a, I>(samples: I, axes: AxisLabels) -> Self
    where
        I: IntoIterator<Item = &'a GridSample>,
    {
        let mut quantum = Vec::new();
        let mut classical = Vec::new();
        for sample in samples {
            if let Some(estimate) = sample.estimate() {
                quantum.push([sample.omega, sample.r, estimate.quantum]);
                classical.push([sample.omega, sample.r, estimate.classical]);
            }
        }

        Self {
            axes,
            quantum: PointSeries {
                label: "Quantum".to_string(),
                points: quantum,
            },
            classical: PointSeries {
                label: "Classical".to_string(),
                points: classical,
            },
        }
    }
}

pub trait ScatterRenderer {
    type Error;

    fn render(&mut self, plot: &ScatterPlot) -> Result<(), Self::Error>;
}
