use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::workflows::error::ValidationError;
use crate::workflows::ids::{OptionId, QuestionId, QuestionnaireId, TopicId};

/// Points a TEXT question is worth when the author gives no explicit value.
pub const DEFAULT_TEXT_POINTS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    Text,
    YesNo,
}

impl QuestionType {
    pub const fn label(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Text => "text",
            QuestionType::YesNo => "yes_no",
        }
    }

    /// Exactly one option must be picked.
    pub fn is_single_select(self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::YesNo)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single_choice" => Ok(QuestionType::SingleChoice),
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "text" => Ok(QuestionType::Text),
            "yes_no" => Ok(QuestionType::YesNo),
            _ => Err(ValidationError::UnknownVariant {
                field: "question_type",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub label: String,
    pub points: u32,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: QuestionnaireId,
    pub title: String,
    pub description: String,
    passing_score: u8,
    pub topics: Vec<Topic>,
}

impl Questionnaire {
    pub fn new(
        id: QuestionnaireId,
        title: impl Into<String>,
        description: impl Into<String>,
        passing_score: u8,
        topics: Vec<Topic>,
    ) -> Result<Self, ValidationError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::field("title", "must not be empty"));
        }
        if passing_score > 100 {
            return Err(ValidationError::field(
                "passing_score",
                format!("must be between 0 and 100, got {passing_score}"),
            ));
        }
        let mut seen = BTreeSet::new();
        if let Some(topic) = topics.iter().find(|topic| !seen.insert(&topic.id)) {
            return Err(ValidationError::field(
                "topics",
                format!("topic {} is listed twice", topic.id),
            ));
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            passing_score,
            topics,
        })
    }

    /// Default passing percentage when the requirement carries no override.
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    pub fn has_topic(&self, topic_id: &TopicId) -> bool {
        self.topics.iter().any(|topic| &topic.id == topic_id)
    }
}

/// Author-supplied question content; scoring metadata is derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub topic_id: TopicId,
    pub text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub must_pass: bool,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Only meaningful for TEXT questions.
    #[serde(default)]
    pub text_points: Option<u32>,
    #[serde(default)]
    pub order: u32,
}

fn default_weight() -> f64 {
    1.0
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub questionnaire_id: QuestionnaireId,
    pub topic_id: TopicId,
    pub text: String,
    question_type: QuestionType,
    options: Vec<QuestionOption>,
    pub weight: f64,
    pub must_pass: bool,
    pub required: bool,
    text_points: Option<u32>,
    max_points: u32,
    pub order: u32,
}

impl Question {
    pub fn new(
        id: QuestionId,
        questionnaire_id: QuestionnaireId,
        definition: QuestionDefinition,
    ) -> Result<Self, ValidationError> {
        validate_definition(&definition)?;
        let max_points = derive_max_points(&definition)?;

        Ok(Self {
            id,
            questionnaire_id,
            topic_id: definition.topic_id,
            text: definition.text.trim().to_string(),
            question_type: definition.question_type,
            options: definition.options,
            weight: definition.weight,
            must_pass: definition.must_pass,
            required: definition.required,
            text_points: definition.text_points,
            max_points,
            order: definition.order,
        })
    }

    /// Replace the content, recomputing the derived maximum.
    pub fn redefine(&mut self, definition: QuestionDefinition) -> Result<(), ValidationError> {
        let updated = Self::new(self.id.clone(), self.questionnaire_id.clone(), definition)?;
        *self = updated;
        Ok(())
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    pub fn option(&self, id: &OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|option| &option.id == id)
    }

    pub fn text_points(&self) -> Option<u32> {
        self.text_points
    }

    pub fn max_points(&self) -> u32 {
        self.max_points
    }

    /// Max points scaled by weight. Aggregation does not use it.
    pub fn weighted_max_points(&self) -> f64 {
        f64::from(self.max_points) * self.weight
    }
}

fn validate_definition(definition: &QuestionDefinition) -> Result<(), ValidationError> {
    if definition.text.trim().is_empty() {
        return Err(ValidationError::field("text", "must not be empty"));
    }
    if !definition.weight.is_finite() || definition.weight < 0.0 {
        return Err(ValidationError::field(
            "weight",
            "must be a non-negative number",
        ));
    }

    let options = &definition.options;
    match definition.question_type {
        QuestionType::Text => {
            if !options.is_empty() {
                return Err(ValidationError::field(
                    "options",
                    "text questions take no options",
                ));
            }
        }
        QuestionType::YesNo if options.len() != 2 => {
            return Err(ValidationError::field(
                "options",
                format!("yes/no questions need exactly 2 options, got {}", options.len()),
            ));
        }
        _ if options.is_empty() => {
            return Err(ValidationError::field(
                "options",
                "choice questions need at least one option",
            ));
        }
        _ => {}
    }

    let mut seen = BTreeSet::new();
    if let Some(option) = options.iter().find(|option| !seen.insert(&option.id)) {
        return Err(ValidationError::field(
            "options",
            format!("option {} is listed twice", option.id),
        ));
    }
    Ok(())
}

fn derive_max_points(definition: &QuestionDefinition) -> Result<u32, ValidationError> {
    let options = &definition.options;
    match definition.question_type {
        QuestionType::SingleChoice | QuestionType::YesNo => Ok(options
            .iter()
            .map(|option| option.points)
            .max()
            .unwrap_or(0)),
        QuestionType::MultipleChoice => options
            .iter()
            .filter(|option| option.is_correct)
            .try_fold(0u32, |total, option| total.checked_add(option.points))
            .ok_or_else(|| {
                ValidationError::field("options", "correct option points exceed the point range")
            }),
        QuestionType::Text => Ok(definition.text_points.unwrap_or(DEFAULT_TEXT_POINTS)),
    }
}
