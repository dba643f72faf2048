//! Range and format checks shared by the config sections

pub use crate::error::ValidationError;

/// One `[section]` of the config file
pub trait ConfigSection: Default {
    /// Every out-of-range or malformed field, not just the first
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Table name in the TOML file
    fn section_name(&self) -> &'static str;
}

pub struct Validator;

impl Validator {
    /// Inclusive range check
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Platform account ids are purely numeric
    pub fn digits_only(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            Err(ValidationError::with_value(field, "must contain only digits", value))
        } else {
            Ok(())
        }
    }

    /// Keeps the failures, in order
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
