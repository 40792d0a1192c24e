use super::catalog::{AnswerFormat, QuestionDefinition, QuestionKind};
use super::domain::AnswerValue;

/// Raw input that cannot be accepted for the current question. The question is re-asked.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{raw}' is not a number")]
    NotANumber { raw: String },
    #[error("{value} must be greater than zero")]
    NotPositive { value: f64 },
    #[error("'{raw}' is not a yes/no answer")]
    NotYesNo { raw: String },
    #[error("answer is empty")]
    Empty,
}

impl ValidationError {
    /// Guidance sent to the user before the question is repeated.
    pub fn guidance(&self) -> &'static str {
        match self {
            ValidationError::NotANumber { .. } | ValidationError::NotPositive { .. } => {
                "Please enter a number greater than zero."
            }
            ValidationError::NotYesNo { .. } => "Please answer Yes or No.",
            ValidationError::Empty => "Please type an answer.",
        }
    }
}

/// Converts raw chat input into a typed answer for one question.
///
/// Choice answers are never rejected: the selected value is stored even when it is not one of
/// the declared options, and the matcher decides what it is worth.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerGuard;

impl AnswerGuard {
    pub fn parse(
        &self,
        question: &QuestionDefinition,
        raw: &str,
    ) -> Result<AnswerValue, ValidationError> {
        match question.kind {
            QuestionKind::Choice { .. } => Ok(parse_choice(question.format, raw)),
            QuestionKind::FreeText => parse_typed(question.format, raw),
        }
    }
}

fn parse_choice(format: AnswerFormat, raw: &str) -> AnswerValue {
    let fallback = || AnswerValue::Text(raw.to_string());
    match format {
        AnswerFormat::Text => fallback(),
        AnswerFormat::Number => parse_number(raw).map_or_else(|_| fallback(), AnswerValue::Number),
        AnswerFormat::YesNo => parse_yes_no(raw).map_or_else(fallback, AnswerValue::Boolean),
    }
}

fn parse_typed(format: AnswerFormat, raw: &str) -> Result<AnswerValue, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    match format {
        AnswerFormat::Text => Ok(AnswerValue::Text(trimmed.to_string())),
        AnswerFormat::Number => parse_number(trimmed).map(AnswerValue::Number),
        AnswerFormat::YesNo => parse_yes_no(trimmed)
            .map(AnswerValue::Boolean)
            .ok_or_else(|| ValidationError::NotYesNo {
                raw: trimmed.to_string(),
            }),
    }
}

fn parse_number(raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            raw: trimmed.to_string(),
        })?;

    if value <= 0.0 {
        return Err(ValidationError::NotPositive { value });
    }

    Ok(value)
}

fn parse_yes_no(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" => Some(true),
        "no" | "n" | "false" => Some(false),
        _ => None,
    }
}
