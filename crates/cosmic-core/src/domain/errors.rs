use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CosmicErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl CosmicErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Run-level error carried out of the core and mapped onto a process exit code.
///
/// The `placeholder` is a stable dotted tag (`INPUT.CHARGE`, `IO.OUTPUT`, ...)
/// that diagnostics and tests can match on without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmicError {
    category: CosmicErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl CosmicError {
    pub fn new(
        category: CosmicErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            CosmicErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(CosmicErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(CosmicErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(CosmicErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> CosmicErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for CosmicError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for CosmicError {}

#[cfg(test)]
mod tests {
    use super::{CosmicError, CosmicErrorCategory};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (
                CosmicErrorCategory::InputValidationError,
                2,
                "InputValidationError",
            ),
            (CosmicErrorCategory::IoSystemError, 3, "IoSystemError"),
            (CosmicErrorCategory::ComputationError, 4, "ComputationError"),
            (CosmicErrorCategory::InternalError, 5, "InternalError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = CosmicError::input_validation("INPUT.CHARGE", "charge N must be >= 1, got 0");

        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.category(), CosmicErrorCategory::InputValidationError);
        assert_eq!(error.message(), "charge N must be >= 1, got 0");
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.CHARGE] charge N must be >= 1, got 0"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
        assert_eq!(
            error.to_string(),
            "InputValidationError [INPUT.CHARGE] charge N must be >= 1, got 0"
        );
    }

    #[test]
    fn every_category_renders_its_own_exit_line() {
        let errors = [
            CosmicError::io_system("IO.CONFIG", "missing file"),
            CosmicError::computation("RUN.SINGULARITY", "singular"),
            CosmicError::internal("INTERNAL.REPORT", "serialize"),
        ];
        let lines: Vec<String> = errors.iter().map(CosmicError::fatal_exit_line).collect();
        assert_eq!(
            lines,
            vec![
                "FATAL EXIT CODE: 3",
                "FATAL EXIT CODE: 4",
                "FATAL EXIT CODE: 5"
            ]
        );
        assert_eq!(errors[2].diagnostic_line(), "ERROR: [INTERNAL.REPORT] serialize");
    }
}
