pub mod errors;
pub mod parameters;

pub use errors::{CosmicError, CosmicErrorCategory};
pub use parameters::{
    Charge, CouplingConstant, ModelParameters, ParameterError, SwitchingTime, ensure_finite,
    ensure_radius,
};
