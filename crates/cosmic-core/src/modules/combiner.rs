use crate::domain::ModelParameters;
use crate::numerics::{KernelError, ResponseKernel};
use serde::Serialize;

/// Responses of one grid cell and the two estimators folded from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEstimate {
    /// `P_A = P_N(Ω, r)`
    pub response_n: f64,
    /// `P_B = P_M(Ω, r)`
    pub response_m: f64,
    /// `L_AB = L_{N,M}(Ω, r)`
    pub cross_term: f64,
    pub classical: f64,
    pub quantum: f64,
}

impl TransitionEstimate {
    /// `P_Q - P_C`, which equals `λ⁴ · L_AB`.
    pub fn interference(&self) -> f64 {
        self.quantum - self.classical
    }
}

/// Combines the single-charge responses and the cross term into
///
/// ```text
/// P_C = (λ⁴/2) (P_A + P_B)
/// P_Q = (λ⁴/2) (P_A + P_B + 2 L_AB)
/// ```
///
/// Fails as soon as any of the three kernel evaluations fails.
pub fn combine_transition_probabilities<K>(
    kernel: &K,
    params: &ModelParameters,
    omega: f64,
    r: f64,
) -> Result<TransitionEstimate, KernelError>
where
    K: ResponseKernel + ?Sized,
{
    let t = params.switching_time;
    let response_n = kernel.single_charge(params.n, omega, r, t)?;
    let response_m = kernel.single_charge(params.m, omega, r, t)?;
    let cross_term = kernel.cross_charge(params.n, params.m, omega, r, t)?;

    let half_coupling = 0.5 * params.coupling.get();
    let incoherent = response_n + response_m;

    Ok(TransitionEstimate {
        response_n,
        response_m,
        cross_term,
        classical: half_coupling * incoherent,
        quantum: half_coupling * (incoherent + 2.0 * cross_term),
    })
}
