pub mod questionnaire;
pub mod schemes;
