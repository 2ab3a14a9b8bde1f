//! Closed-form summation kernel for the cosmic-string detector response.
//!
//! Both response functions are finite sums over the image points of the
//! string:
//!
//! ```text
//! term1 = (T²/16) e^{-|Ω|T} Σ 1 / (4r² sin²θ + T²)
//! term2 = Θ(Ω) (T³/8) Σ sin(k sinθ) / (2r sinθ (4r² sin²θ + T²))
//! ```
//!
//! with `θ = πd/D`, `k = 2ΩT` for the single-charge response `P_D`, and
//! `θ = π(n/N - m/M)`, `k = 2rΩ` for the cross term `L_{N,M}`. Whenever
//! `sin θ` vanishes the second summand is a removable `0/0`; it is replaced by
//! its first-order limit (`Ω/(rT)` and `Ω/T²` respectively). A vanishing
//! `4r² sin²θ + T²` has no finite limit and is reported as an error.

use super::CompensatedSum;
use crate::common::constants::{DENOMINATOR_TOLERANCE, HARMONIC_ZERO_TOLERANCE};
use crate::domain::{
    Charge, CosmicError, ParameterError, SwitchingTime, ensure_finite, ensure_radius,
};
use std::f64::consts::PI;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummationTerm {
    First,
    Second,
}

impl Display for SummationTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Second => f.write_str("second"),
        }
    }
}

/// Position inside a summation: one image index for `P_D`, a pair for `L_{N,M}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SumIndex {
    Single { d: u32 },
    Pair { n: u32, m: u32 },
}

impl Display for SumIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single { d } => write!(f, "d={d}"),
            Self::Pair { n, m } => write!(f, "n={n}, m={m}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),
    #[error(
        "{function}: singular denominator {denominator:e} in {sum} sum at {index} (r={r}, T={switching_time})"
    )]
    Singularity {
        function: &'static str,
        sum: SummationTerm,
        index: SumIndex,
        denominator: f64,
        r: f64,
        switching_time: f64,
    },
    #[error("{function}: non-finite result {value} at Omega={omega}, r={r}")]
    NonFiniteResult {
        function: &'static str,
        value: f64,
        omega: f64,
        r: f64,
    },
}

impl From<KernelError> for CosmicError {
    fn from(error: KernelError) -> Self {
        match error {
            KernelError::InvalidParameter(source) => source.into(),
            KernelError::Singularity { .. } => {
                CosmicError::computation("RUN.SINGULARITY", error.to_string())
            }
            KernelError::NonFiniteResult { .. } => {
                CosmicError::computation("RUN.NON_FINITE", error.to_string())
            }
        }
    }
}

/// Absolute thresholds used to classify a summand as singular.
///
/// Both default to `1e-8` and do not scale with `r` or `T`. Changing them
/// changes which grid cells are reported as singular.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelTolerances {
    pub denominator: f64,
    pub harmonic_zero: f64,
}

impl Default for KernelTolerances {
    fn default() -> Self {
        Self {
            denominator: DENOMINATOR_TOLERANCE,
            harmonic_zero: HARMONIC_ZERO_TOLERANCE,
        }
    }
}

pub trait ResponseKernel {
    /// Single-charge transition probability `P_D(Ω, r)`.
    fn single_charge(
        &self,
        charge: Charge,
        omega: f64,
        r: f64,
        switching_time: SwitchingTime,
    ) -> Result<f64, KernelError>;

    /// Cross-correlation term `L_{N,M}(Ω, r)`.
    fn cross_charge(
        &self,
        n: Charge,
        m: Charge,
        omega: f64,
        r: f64,
        switching_time: SwitchingTime,
    ) -> Result<f64, KernelError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClosedFormKernel {
    tolerances: KernelTolerances,
}

impl ClosedFormKernel {
    pub const fn new(tolerances: KernelTolerances) -> Self {
        Self { tolerances }
    }

    pub const fn tolerances(&self) -> KernelTolerances {
        self.tolerances
    }
}

impl ResponseKernel for ClosedFormKernel {
    fn single_charge(
        &self,
        charge: Charge,
        omega: f64,
        r: f64,
        switching_time: SwitchingTime,
    ) -> Result<f64, KernelError> {
        let point = EvaluationPoint::new(omega, r, switching_time)?;
        let d = charge.get();
        let images = (0..d).map(move |index| {
            let angle = PI * f64::from(index) / f64::from(d);
            (SumIndex::Single { d: index }, angle)
        });

        let response = HarmonicResponse {
            function: "P_D",
            phase_scale: 2.0 * point.omega * point.switching_time,
            limit: point.omega / (point.r * point.switching_time),
        };
        response.evaluate(point, images, self.tolerances)
    }

    fn cross_charge(
        &self,
        n: Charge,
        m: Charge,
        omega: f64,
        r: f64,
        switching_time: SwitchingTime,
    ) -> Result<f64, KernelError> {
        let point = EvaluationPoint::new(omega, r, switching_time)?;
        let (n, m) = (n.get(), m.get());
        let images = (0..n).flat_map(move |n_index| {
            (0..m).map(move |m_index| {
                let angle = PI
                    * (f64::from(n_index) / f64::from(n) - f64::from(m_index) / f64::from(m));
                (
                    SumIndex::Pair {
                        n: n_index,
                        m: m_index,
                    },
                    angle,
                )
            })
        });

        let response = HarmonicResponse {
            function: "L_NM",
            phase_scale: 2.0 * point.r * point.omega,
            limit: point.omega / (point.switching_time * point.switching_time),
        };
        response.evaluate(point, images, self.tolerances)
    }
}

/// `P_D(Ω, r)` with the default tolerances.
pub fn single_charge_response(
    charge: Charge,
    omega: f64,
    r: f64,
    switching_time: SwitchingTime,
) -> Result<f64, KernelError> {
    ClosedFormKernel::default().single_charge(charge, omega, r, switching_time)
}

/// `L_{N,M}(Ω, r)` with the default tolerances.
pub fn cross_charge_response(
    n: Charge,
    m: Charge,
    omega: f64,
    r: f64,
    switching_time: SwitchingTime,
) -> Result<f64, KernelError> {
    ClosedFormKernel::default().cross_charge(n, m, omega, r, switching_time)
}

#[derive(Debug, Clone, Copy)]
struct EvaluationPoint {
    omega: f64,
    r: f64,
    switching_time: f64,
}

impl EvaluationPoint {
    fn new(omega: f64, r: f64, switching_time: SwitchingTime) -> Result<Self, ParameterError> {
        Ok(Self {
            omega: ensure_finite("Omega", omega)?,
            r: ensure_radius(r)?,
            switching_time: switching_time.get(),
        })
    }
}

struct HarmonicResponse {
    function: &'static str,
    phase_scale: f64,
    limit: f64,
}

impl HarmonicResponse {
    fn evaluate<I>(
        &self,
        point: EvaluationPoint,
        images: I,
        tolerances: KernelTolerances,
    ) -> Result<f64, KernelError>
    where
        I: Iterator<Item = (SumIndex, f64)> + Clone,
    {
        let EvaluationPoint {
            omega,
            r,
            switching_time: t,
        } = point;

        let mut first = CompensatedSum::default();
        for (index, angle) in images.clone() {
            let denominator = self.checked_denominator(
                SummationTerm::First,
                index,
                angle.sin(),
                point,
                tolerances,
            )?;
            first.add(1.0 / denominator);
        }
        let term1 = t * t / 16.0 * (-omega.abs() * t).exp() * first.value();

        let term2 = if omega > 0.0 {
            let mut second = CompensatedSum::default();
            for (index, angle) in images {
                let s = angle.sin();
                if s.abs() < tolerances.harmonic_zero {
                    second.add(self.limit);
                    continue;
                }
                let denominator =
                    self.checked_denominator(SummationTerm::Second, index, s, point, tolerances)?;
                second.add((self.phase_scale * s).sin() / (2.0 * r * s * denominator));
            }
            t * t * t / 8.0 * second.value()
        } else {
            0.0
        };

        let value = term1 + term2;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(KernelError::NonFiniteResult {
                function: self.function,
                value,
                omega,
                r,
            })
        }
    }

    fn checked_denominator(
        &self,
        sum: SummationTerm,
        index: SumIndex,
        s: f64,
        point: EvaluationPoint,
        tolerances: KernelTolerances,
    ) -> Result<f64, KernelError> {
        let t = point.switching_time;
        let denominator = 4.0 * point.r * point.r * s * s + t * t;
        if denominator.abs() < tolerances.denominator {
            return Err(KernelError::Singularity {
                function: self.function,
                sum,
                index,
                denominator,
                r: point.r,
                switching_time: t,
            });
        }
        Ok(denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ClosedFormKernel, KernelError, KernelTolerances, ResponseKernel, SumIndex, SummationTerm,
        cross_charge_response, single_charge_response,
    };
    use crate::domain::{Charge, CosmicError, ParameterError, SwitchingTime};
    use std::f64::consts::PI;

    fn charge(value: u32) -> Charge {
        Charge::new(value).expect("test charge should be valid")
    }

    fn time(value: f64) -> SwitchingTime {
        SwitchingTime::new(value).expect("test switching time should be valid")
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual} (tolerance {tolerance})"
        );
    }

    fn first_term_only(d: u32, omega: f64, r: f64, t: f64) -> f64 {
        let sum: f64 = (0..d)
            .map(|index| {
                let s = (PI * f64::from(index) / f64::from(d)).sin();
                1.0 / (4.0 * r * r * s * s + t * t)
            })
            .sum();
        t * t / 16.0 * (-omega.abs() * t).exp() * sum
    }

    /// Direct double loop over both sums, written without the shared evaluator.
    fn direct_sum(angles: &[f64], omega: f64, r: f64, t: f64, phase: f64, limit: f64) -> f64 {
        let mut first = 0.0;
        let mut second = 0.0;
        for &angle in angles {
            let s = angle.sin();
            let denominator = 4.0 * r * r * s * s + t * t;
            first += 1.0 / denominator;
            second += if s.abs() < 1e-8 {
                limit
            } else {
                (phase * s).sin() / (2.0 * r * s * denominator)
            };
        }
        let step = if omega > 0.0 { 1.0 } else { 0.0 };
        t * t / 16.0 * (-omega.abs() * t).exp() * first + step * t * t * t / 8.0 * second
    }

    fn direct_single(d: u32, omega: f64, r: f64, t: f64) -> f64 {
        let angles: Vec<f64> = (0..d)
            .map(|index| PI * f64::from(index) / f64::from(d))
            .collect();
        direct_sum(&angles, omega, r, t, 2.0 * omega * t, omega / (r * t))
    }

    fn direct_cross(n: u32, m: u32, omega: f64, r: f64, t: f64) -> f64 {
        let angles: Vec<f64> = (0..n)
            .flat_map(|i| {
                (0..m).map(move |j| {
                    PI * (f64::from(i) / f64::from(n) - f64::from(j) / f64::from(m))
                })
            })
            .collect();
        direct_sum(&angles, omega, r, t, 2.0 * r * omega, omega / (t * t))
    }

    #[test]
    fn single_image_matches_closed_form() {
        let value = single_charge_response(charge(1), 0.5, 2.0, time(1.0)).expect("finite");
        let expected = (-0.5_f64).exp() / 16.0 + 0.5 / 16.0;
        assert_close(value, expected, 1e-6);
    }

    #[test]
    fn single_image_closed_form_holds_across_parameters() {
        let cases = [
            (0.1, 0.1, 1.0),
            (2.5, 4.0, 0.5),
            (5.0, 0.3, 2.0),
            (-1.5, 1.0, 1.5),
        ];
        for (omega, r, t) in cases {
            let value = single_charge_response(charge(1), omega, r, time(t)).expect("finite");
            let step = if omega > 0.0 { 1.0 } else { 0.0 };
            let expected = (-omega.abs() * t).exp() / 16.0 + step * t * t * omega / (8.0 * r);
            assert_close(value, expected, 1e-12);
        }
    }

    #[test]
    fn non_positive_omega_keeps_only_first_term() {
        for d in 1..=3 {
            let value = single_charge_response(charge(d), -1.0, 1.3, time(0.8)).expect("finite");
            assert_close(value, first_term_only(d, -1.0, 1.3, 0.8), 1e-14);
        }

        let at_zero = single_charge_response(charge(2), 0.0, 0.7, time(1.0)).expect("finite");
        assert_close(at_zero, first_term_only(2, 0.0, 0.7, 1.0), 1e-14);
    }

    #[test]
    fn cross_term_with_non_positive_omega_keeps_only_first_term() {
        let n = 2;
        let m = 3;
        let (omega, r, t): (f64, f64, f64) = (-1.0, 0.9, 1.2);
        let sum: f64 = (0..n)
            .flat_map(|i| (0..m).map(move |j| (i, j)))
            .map(|(i, j)| {
                let s = (PI * (f64::from(i) / f64::from(n) - f64::from(j) / f64::from(m))).sin();
                1.0 / (4.0 * r * r * s * s + t * t)
            })
            .sum();
        let expected = t * t / 16.0 * (-omega.abs() * t).exp() * sum;

        let value = cross_charge_response(charge(n), charge(m), omega, r, time(t)).expect("finite");
        assert_close(value, expected, 1e-14);
    }

    #[test]
    fn multi_image_response_pins_reference_values() {
        let p2 = single_charge_response(charge(2), 0.8, 1.3, time(0.9)).expect("finite");
        assert_close(p2, 0.10057522236218162, 1e-13);

        let p3 = single_charge_response(charge(3), 1.7, 0.6, time(1.1)).expect("finite");
        assert_close(p3, 0.4347649923674283, 1e-13);

        let l23 = cross_charge_response(charge(2), charge(3), 0.8, 1.3, time(0.9)).expect("finite");
        assert_close(l23, 0.2175768587127609, 1e-13);
    }

    #[test]
    fn positive_omega_matches_direct_summation() {
        let points: [(f64, f64, f64); 4] = [
            (0.1, 0.1, 1.0),
            (0.8, 1.3, 0.9),
            (2.4, 0.35, 1.7),
            (4.9, 5.0, 0.6),
        ];
        for &(omega, r, t) in &points {
            for d in 2..=3 {
                let value = single_charge_response(charge(d), omega, r, time(t)).expect("finite");
                let expected = direct_single(d, omega, r, t);
                assert_close(value, expected, 1e-12 * expected.abs().max(1.0));
            }
            for (n, m) in [(1, 2), (2, 3), (3, 1), (3, 3)] {
                let value =
                    cross_charge_response(charge(n), charge(m), omega, r, time(t)).expect("finite");
                let expected = direct_cross(n, m, omega, r, t);
                assert_close(value, expected, 1e-12 * expected.abs().max(1.0));
            }
        }
    }

    #[test]
    fn cross_term_is_symmetric_in_charges() {
        for n in 1..=3 {
            for m in 1..=3 {
                for &(omega, r) in &[(0.1, 0.1), (1.7, 2.3), (4.9, 5.0), (-0.6, 1.1)] {
                    let forward = cross_charge_response(charge(n), charge(m), omega, r, time(1.0))
                        .expect("finite");
                    let backward = cross_charge_response(charge(m), charge(n), omega, r, time(1.0))
                        .expect("finite");
                    assert_close(forward, backward, 1e-12);
                }
            }
        }
    }

    #[test]
    fn cross_term_of_unit_charges_uses_analytic_limit() {
        let (omega, r, t): (f64, f64, f64) = (0.8, 1.5, 2.0);
        let value = cross_charge_response(charge(1), charge(1), omega, r, time(t)).expect("finite");
        let expected = (-omega * t).exp() / 16.0 + t * t * t / 8.0 * omega / (t * t);
        assert_close(value, expected, 1e-12);
    }

    #[test]
    fn diagonal_limit_is_continuous_with_neighbouring_angles() {
        // As r -> 0 every off-diagonal summand tends to the Omega/T^2 used on the diagonal.
        let limit = cross_charge_response(charge(2), charge(2), 1.0, 1e-12, time(1.0))
            .expect("finite");
        let nearby = cross_charge_response(charge(2), charge(2), 1.0, 1e-6, time(1.0))
            .expect("finite");
        assert_close(limit, nearby, 1e-6);
    }

    #[test]
    fn tiny_switching_time_is_reported_as_singularity() {
        let error = single_charge_response(charge(2), 1.0, 0.5, time(1e-5))
            .expect_err("T^2 below tolerance is singular at d=0");

        match &error {
            KernelError::Singularity {
                function,
                sum,
                index,
                r,
                switching_time,
                ..
            } => {
                assert_eq!(*function, "P_D");
                assert_eq!(*sum, SummationTerm::First);
                assert_eq!(*index, SumIndex::Single { d: 0 });
                assert_eq!(*r, 0.5);
                assert_eq!(*switching_time, 1e-5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let message = error.to_string();
        assert!(message.contains("first sum"), "{message}");
        assert!(message.contains("d=0"), "{message}");
        assert!(message.contains("r=0.5"), "{message}");
        assert!(message.contains("T=0.00001"), "{message}");
    }

    #[test]
    fn cross_term_singularity_names_both_indices() {
        let error = cross_charge_response(charge(2), charge(3), 0.5, 2.0, time(1e-6))
            .expect_err("singular at n=0, m=0");
        assert!(error.to_string().contains("n=0, m=0"), "{error}");
        assert!(error.to_string().starts_with("L_NM"), "{error}");
    }

    #[test]
    fn loosened_tolerance_changes_classification() {
        let strict = ClosedFormKernel::default();
        let loose = ClosedFormKernel::new(KernelTolerances {
            denominator: 0.5,
            ..KernelTolerances::default()
        });

        assert!(strict.single_charge(charge(1), 1.0, 1.0, time(0.5)).is_ok());
        assert!(matches!(
            loose.single_charge(charge(1), 1.0, 1.0, time(0.5)),
            Err(KernelError::Singularity { .. })
        ));
    }

    #[test]
    fn zero_radius_and_non_finite_omega_are_invalid_parameters() {
        let error = single_charge_response(charge(1), 1.0, 0.0, time(1.0)).expect_err("r = 0");
        assert_eq!(
            error,
            KernelError::InvalidParameter(ParameterError::ZeroRadius { value: 0.0 })
        );

        let error =
            cross_charge_response(charge(1), charge(2), f64::NAN, 1.0, time(1.0)).expect_err("NaN");
        assert!(matches!(
            error,
            KernelError::InvalidParameter(ParameterError::NonFinite { field: "Omega", .. })
        ));
    }

    #[test]
    fn kernel_errors_map_to_exit_categories() {
        let singular: CosmicError = single_charge_response(charge(1), 1.0, 1.0, time(1e-6))
            .expect_err("singular")
            .into();
        assert_eq!(singular.placeholder(), "RUN.SINGULARITY");
        assert_eq!(singular.exit_code(), 4);

        let invalid: CosmicError = single_charge_response(charge(1), 1.0, 0.0, time(1.0))
            .expect_err("invalid")
            .into();
        assert_eq!(invalid.placeholder(), "INPUT.RADIUS");
        assert_eq!(invalid.exit_code(), 2);
    }
}
