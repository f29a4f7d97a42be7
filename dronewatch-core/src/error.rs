use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid MAC address '{0}' (expected XX:XX:XX:XX:XX:XX)")]
    InvalidMac(String),

    #[error("{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),
}

impl From<ValidationErrors> for ModelError {
    fn from(errors: ValidationErrors) -> Self {
        ModelError::Validation(errors)
    }
}

/// Joins every validation message into one line, ordered by field name so the
/// output is stable.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| field.to_string());

    let mut messages = Vec::new();
    for (field, errors) in fields {
        for error in errors.iter() {
            let message = match &error.message {
                Some(msg) => msg.to_string(),
                None => format!("{}: {}", field, error.code),
            };
            messages.push(message);
        }
    }
    messages.join("; ")
}
