//! Validated scalar inputs of one sweep.
//!
//! Everything here is checked once at construction so the kernel and the
//! sweep driver can treat the values as read-only facts for the whole run.

use super::errors::CosmicError;
use crate::common::constants::{CONVENTIONAL_MAX_CHARGE, DEFAULT_COUPLING};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("charge {name} must be a positive integer, got {value}")]
    InvalidCharge { name: &'static str, value: i64 },
    #[error("switching time T must be finite and > 0, got {value}")]
    InvalidSwitchingTime { value: f64 },
    #[error("parameter '{field}' must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("radial separation r must be non-zero, got {value}")]
    ZeroRadius { value: f64 },
    #[error("{axis} axis is invalid: {reason}")]
    InvalidAxis { axis: &'static str, reason: String },
}

impl ParameterError {
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::InvalidCharge { .. } => "INPUT.CHARGE",
            Self::InvalidSwitchingTime { .. } => "INPUT.SWITCHING_TIME",
            Self::NonFinite { .. } => "INPUT.NON_FINITE",
            Self::ZeroRadius { .. } => "INPUT.RADIUS",
            Self::InvalidAxis { .. } => "INPUT.GRID_AXIS",
        }
    }
}

impl From<ParameterError> for CosmicError {
    fn from(error: ParameterError) -> Self {
        CosmicError::input_validation(error.placeholder(), error.to_string())
    }
}

/// Topological charge: number of image points spread uniformly on a circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Charge(NonZeroU32);

impl Charge {
    pub fn new(value: u32) -> Result<Self, ParameterError> {
        Self::named("D", i64::from(value))
    }

    /// Validates a raw integer, naming the charge (`N`, `M`, ...) in the error.
    pub fn named(name: &'static str, value: i64) -> Result<Self, ParameterError> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(ParameterError::InvalidCharge { name, value })
    }

    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Charges above 3 are accepted but fall outside the modelled regime.
    pub const fn exceeds_convention(self) -> bool {
        self.0.get() > CONVENTIONAL_MAX_CHARGE
    }
}

impl Display for Charge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SwitchingTime(f64);

impl SwitchingTime {
    pub fn new(value: f64) -> Result<Self, ParameterError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(ParameterError::InvalidSwitchingTime { value })
        }
    }

    pub const fn get(self) -> f64 {
        self.0
    }
}

/// The λ⁴ prefactor shared by the classical and quantum estimators.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct CouplingConstant(f64);

impl CouplingConstant {
    pub fn new(value: f64) -> Result<Self, ParameterError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(ParameterError::NonFinite {
                field: "coupling",
                value,
            })
        }
    }

    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Default for CouplingConstant {
    fn default() -> Self {
        Self(DEFAULT_COUPLING)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelParameters {
    pub n: Charge,
    pub m: Charge,
    pub switching_time: SwitchingTime,
    pub coupling: CouplingConstant,
}

impl ModelParameters {
    pub fn new(n: Charge, m: Charge, switching_time: SwitchingTime) -> Self {
        Self {
            n,
            m,
            switching_time,
            coupling: CouplingConstant::default(),
        }
    }

    pub fn with_coupling(mut self, coupling: CouplingConstant) -> Self {
        self.coupling = coupling;
        self
    }

    /// Builds the model from unvalidated numbers, failing on the first bad field.
    pub fn from_raw(
        n: i64,
        m: i64,
        switching_time: f64,
        coupling: f64,
    ) -> Result<Self, ParameterError> {
        Ok(Self {
            n: Charge::named("N", n)?,
            m: Charge::named("M", m)?,
            switching_time: SwitchingTime::new(switching_time)?,
            coupling: CouplingConstant::new(coupling)?,
        })
    }

    /// Named charges above the conventional bound, in `N`, `M` order.
    pub fn unconventional_charges(&self) -> Vec<(&'static str, Charge)> {
        [("N", self.n), ("M", self.m)]
            .into_iter()
            .filter(|(_, charge)| charge.exceeds_convention())
            .collect()
    }

    /// Logs one warning per charge above the conventional bound.
    pub fn warn_unconventional_charges(&self) {
        for (name, charge) in self.unconventional_charges() {
            warn!(
                charge = name,
                value = charge.get(),
                bound = CONVENTIONAL_MAX_CHARGE,
                "charge exceeds the conventional bound"
            );
        }
    }
}

pub fn ensure_radius(value: f64) -> Result<f64, ParameterError> {
    if !value.is_finite() {
        return Err(ParameterError::NonFinite { field: "r", value });
    }
    if value == 0.0 {
        return Err(ParameterError::ZeroRadius { value });
    }
    Ok(value)
}

pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Charge, CouplingConstant, ModelParameters, ParameterError, SwitchingTime, ensure_radius,
    };
    use crate::domain::CosmicError;

    #[test]
    fn charge_rejects_zero_and_negative_values() {
        assert_eq!(
            Charge::named("N", 0),
            Err(ParameterError::InvalidCharge { name: "N", value: 0 })
        );
        assert_eq!(
            Charge::named("M", -2),
            Err(ParameterError::InvalidCharge { name: "M", value: -2 })
        );
        assert_eq!(Charge::new(3).map(Charge::get), Ok(3));
    }

    #[test]
    fn charges_above_three_are_accepted_but_flagged() {
        let charge = Charge::new(5).expect("large charges are valid");
        assert!(charge.exceeds_convention());
        assert!(!Charge::new(3).expect("valid").exceeds_convention());
    }

    #[test]
    fn unconventional_charges_are_listed_by_name() {
        let params = ModelParameters::from_raw(5, 2, 1.0, 1.0).expect("valid");
        let flagged: Vec<(&str, u32)> = params
            .unconventional_charges()
            .into_iter()
            .map(|(name, charge)| (name, charge.get()))
            .collect();
        assert_eq!(flagged, vec![("N", 5)]);

        let both = ModelParameters::from_raw(4, 7, 1.0, 1.0).expect("valid");
        assert_eq!(both.unconventional_charges().len(), 2);

        let regular = ModelParameters::from_raw(3, 3, 1.0, 1.0).expect("valid");
        assert!(regular.unconventional_charges().is_empty());
    }

    #[test]
    fn switching_time_must_be_strictly_positive() {
        assert!(SwitchingTime::new(0.0).is_err());
        assert!(SwitchingTime::new(-1.0).is_err());
        assert!(SwitchingTime::new(f64::NAN).is_err());
        assert!(SwitchingTime::new(f64::INFINITY).is_err());
        assert_eq!(SwitchingTime::new(0.5).map(SwitchingTime::get), Ok(0.5));
    }

    #[test]
    fn model_defaults_coupling_to_one() {
        let params = ModelParameters::new(
            Charge::new(1).expect("valid"),
            Charge::new(2).expect("valid"),
            SwitchingTime::new(1.0).expect("valid"),
        );
        assert_eq!(params.coupling.get(), 1.0);

        let scaled = params.with_coupling(CouplingConstant::new(0.25).expect("valid"));
        assert_eq!(scaled.coupling.get(), 0.25);
        assert_eq!(scaled.n.get(), 1);
    }

    #[test]
    fn from_raw_reports_first_invalid_field() {
        let error = ModelParameters::from_raw(1, 0, -1.0, 1.0).expect_err("M is invalid");
        assert_eq!(error, ParameterError::InvalidCharge { name: "M", value: 0 });

        let error = ModelParameters::from_raw(1, 1, 0.0, 1.0).expect_err("T is invalid");
        assert_eq!(error.placeholder(), "INPUT.SWITCHING_TIME");
    }

    #[test]
    fn radius_zero_is_rejected() {
        assert_eq!(
            ensure_radius(0.0),
            Err(ParameterError::ZeroRadius { value: 0.0 })
        );
        assert_eq!(ensure_radius(-0.5), Ok(-0.5));
    }

    #[test]
    fn parameter_errors_map_to_input_validation_exit_code() {
        let error: CosmicError = ParameterError::ZeroRadius { value: 0.0 }.into();
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.placeholder(), "INPUT.RADIUS");
    }
}
