use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Button shown for a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// Rows of buttons; grouping only affects presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceLayout {
    pub rows: Vec<Vec<ChoiceOption>>,
}

impl ChoiceLayout {
    pub fn from_rows(rows: &[&[(&str, &str)]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|(label, value)| ChoiceOption {
                            label: (*label).to_string(),
                            value: (*value).to_string(),
                        })
                        .collect()
                })
                .collect(),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|option| option.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    Choice { layout: ChoiceLayout },
    FreeText,
}

/// Typed value a question produces once accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerFormat {
    Text,
    Number,
    YesNo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub key: String,
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub format: AnswerFormat,
}

impl QuestionDefinition {
    pub fn choice(key: &str, prompt: &str, rows: &[&[(&str, &str)]]) -> Self {
        Self {
            key: key.to_string(),
            prompt: prompt.to_string(),
            kind: QuestionKind::Choice {
                layout: ChoiceLayout::from_rows(rows),
            },
            format: AnswerFormat::Text,
        }
    }

    pub fn typed(key: &str, prompt: &str, format: AnswerFormat) -> Self {
        Self {
            key: key.to_string(),
            prompt: prompt.to_string(),
            kind: QuestionKind::FreeText,
            format,
        }
    }

    pub fn with_format(mut self, format: AnswerFormat) -> Self {
        self.format = format;
        self
    }

    pub fn layout(&self) -> Option<&ChoiceLayout> {
        match &self.kind {
            QuestionKind::Choice { layout } => Some(layout),
            QuestionKind::FreeText => None,
        }
    }

    pub fn is_free_text(&self) -> bool {
        matches!(self.kind, QuestionKind::FreeText)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("question catalog must contain at least one question")]
    Empty,
    #[error("question key '{0}' is declared more than once")]
    DuplicateKey(String),
}

/// Fixed, ordered questionnaire. Every question is mandatory.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<QuestionDefinition>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<QuestionDefinition>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.key.as_str()) {
                return Err(CatalogError::DuplicateKey(question.key.clone()));
            }
        }

        Ok(Self { questions })
    }

    pub fn standard() -> Self {
        Self {
            questions: standard_questions(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&QuestionDefinition> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[QuestionDefinition] {
        &self.questions
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.questions.iter().position(|question| question.key == key)
    }
}

fn standard_questions() -> Vec<QuestionDefinition> {
    vec![
        QuestionDefinition::choice(
            "state",
            "Which State/UT do you live in?",
            &[
                &[("Karnataka", "Karnataka"), ("Maharashtra", "Maharashtra")],
                &[
                    ("Uttar Pradesh", "Uttar Pradesh"),
                    ("West Bengal", "West Bengal"),
                ],
                &[("Madhya Pradesh", "Madhya Pradesh"), ("Other", "Other")],
            ],
        ),
        QuestionDefinition::choice(
            "area",
            "Do you live in a Rural or Urban area?",
            &[&[("Rural", "Rural"), ("Urban", "Urban")]],
        ),
        QuestionDefinition::choice(
            "category",
            "What is your social category?",
            &[
                &[("General", "General"), ("OBC", "OBC")],
                &[("SC", "SC"), ("ST", "ST")],
            ],
        ),
        QuestionDefinition::choice(
            "gender",
            "What is your gender?",
            &[&[
                ("Female", "Female"),
                ("Male", "Male"),
                ("Transgender", "Transgender"),
            ]],
        ),
        QuestionDefinition::choice(
            "occupation",
            "What is your main occupation?",
            &[
                &[("Farmer", "Farmer"), ("Student", "Student")],
                &[
                    ("Street Vendor", "Street Vendor"),
                    ("Artisan", "Artisan"),
                ],
                &[
                    ("Salaried", "Salaried"),
                    ("Unemployed", "Unemployed"),
                ],
            ],
        ),
        QuestionDefinition::typed(
            "age",
            "What is your age? (Please type just the number)",
            AnswerFormat::Number,
        ),
        QuestionDefinition::choice(
            "disability",
            "Do you have a disability certificate?",
            &[&[("Yes", "Yes"), ("No", "No")]],
        )
        .with_format(AnswerFormat::YesNo),
    ]
}
