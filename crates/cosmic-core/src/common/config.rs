//! JSON run configuration.
//!
//! Every field is optional so a file can carry only the values a user wants
//! to pin; command-line values are merged on top with [`SweepConfig::merge`].

use super::constants::{
    DEFAULT_COUPLING, DEFAULT_OMEGA_END, DEFAULT_OMEGA_START, DEFAULT_OMEGA_STEP,
    DEFAULT_RADIUS_END, DEFAULT_RADIUS_START, DEFAULT_RADIUS_STEP,
};
use crate::domain::{CosmicError, ModelParameters, ParameterError};
use crate::modules::serialization::OutputFormat;
use crate::modules::sweep::{GridAxis, SweepGrid};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub step: Option<f64>,
}

impl AxisConfig {
    fn merge(self, overrides: Self) -> Self {
        Self {
            start: overrides.start.or(self.start),
            end: overrides.end.or(self.end),
            step: overrides.step.or(self.step),
        }
    }

    fn to_axis(
        self,
        name: &'static str,
        defaults: (f64, f64, f64),
    ) -> Result<GridAxis, ParameterError> {
        let (start, end, step) = defaults;
        GridAxis::new(
            name,
            self.start.unwrap_or(start),
            self.end.unwrap_or(end),
            self.step.unwrap_or(step),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SweepConfig {
    pub n: Option<i64>,
    pub m: Option<i64>,
    pub switching_time: Option<f64>,
    pub coupling: Option<f64>,
    #[serde(default)]
    pub omega: AxisConfig,
    #[serde(default)]
    pub r: AxisConfig,
    pub format: Option<OutputFormat>,
}

#[derive(Debug, thiserror::Error)]
pub enum SweepConfigError {
    #[error("failed to read sweep configuration '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse sweep configuration '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("missing required parameter '{field}' (set it on the command line or in the configuration file)")]
    Missing { field: &'static str },
    #[error(transparent)]
    Invalid(#[from] ParameterError),
}

impl From<SweepConfigError> for CosmicError {
    fn from(error: SweepConfigError) -> Self {
        match error {
            SweepConfigError::Read { .. } => CosmicError::io_system("IO.CONFIG", error.to_string()),
            SweepConfigError::Parse { .. } => {
                CosmicError::input_validation("INPUT.CONFIG", error.to_string())
            }
            SweepConfigError::Missing { .. } => {
                CosmicError::input_validation("INPUT.MISSING_PARAMETER", error.to_string())
            }
            SweepConfigError::Invalid(source) => source.into(),
        }
    }
}

impl SweepConfig {
    /// Field-wise merge where values present in `overrides` win.
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            n: overrides.n.or(self.n),
            m: overrides.m.or(self.m),
            switching_time: overrides.switching_time.or(self.switching_time),
            coupling: overrides.coupling.or(self.coupling),
            omega: self.omega.merge(overrides.omega),
            r: self.r.merge(overrides.r),
            format: overrides.format.or(self.format),
        }
    }

    pub fn model_parameters(&self) -> Result<ModelParameters, SweepConfigError> {
        let n = self.n.ok_or(SweepConfigError::Missing { field: "n" })?;
        let m = self.m.ok_or(SweepConfigError::Missing { field: "m" })?;
        let switching_time = self
            .switching_time
            .ok_or(SweepConfigError::Missing {
                field: "switchingTime",
            })?;
        let coupling = self.coupling.unwrap_or(DEFAULT_COUPLING);
        Ok(ModelParameters::from_raw(n, m, switching_time, coupling)?)
    }

    pub fn grid(&self) -> Result<SweepGrid, ParameterError> {
        let omega = self.omega.to_axis(
            "Omega",
            (DEFAULT_OMEGA_START, DEFAULT_OMEGA_END, DEFAULT_OMEGA_STEP),
        )?;
        let radius = self.r.to_axis(
            "r",
            (DEFAULT_RADIUS_START, DEFAULT_RADIUS_END, DEFAULT_RADIUS_STEP),
        )?;
        SweepGrid::new(omega, radius)
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

pub fn load_sweep_config(path: impl AsRef<Path>) -> Result<SweepConfig, SweepConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| SweepConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| SweepConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
