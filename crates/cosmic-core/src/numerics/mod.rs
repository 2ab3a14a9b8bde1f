pub mod kernel;

pub use kernel::{
    ClosedFormKernel, KernelError, KernelTolerances, ResponseKernel, SumIndex, SummationTerm,
    cross_charge_response, single_charge_response,
};

/// Kahan-compensated running sum.
///
/// The harmonic sums mix terms of very different magnitude (the `d = 0`
/// image dominates when `r` is large), so plain accumulation loses the small
/// contributions first.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompensatedSum {
    sum: f64,
    correction: f64,
}

impl CompensatedSum {
    pub fn add(&mut self, value: f64) {
        let corrected = value - self.correction;
        let next = self.sum + corrected;
        self.correction = (next - self.sum) - corrected;
        self.sum = next;
    }

    pub const fn value(&self) -> f64 {
        self.sum
    }
}

impl FromIterator<f64> for CompensatedSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sum = Self::default();
        for value in iter {
            sum.add(value);
        }
        sum
    }
}
