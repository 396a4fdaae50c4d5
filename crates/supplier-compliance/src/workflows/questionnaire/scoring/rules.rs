use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::super::domain::{Question, QuestionType};
use crate::workflows::ids::{OptionId, QuestionId};

/// A supplier's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    #[serde(default)]
    pub selected_options: Vec<OptionId>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Answer {
    pub fn choice(question_id: impl Into<QuestionId>, options: &[&str]) -> Self {
        Self {
            question_id: question_id.into(),
            selected_options: options.iter().map(|id| OptionId::new(*id)).collect(),
            text: None,
        }
    }

    pub fn text(question_id: impl Into<QuestionId>, text: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            selected_options: Vec::new(),
            text: Some(text.into()),
        }
    }

    fn has_text(&self) -> bool {
        self.text
            .as_deref()
            .map_or(false, |text| !text.trim().is_empty())
    }
}

/// Answer rejected before scoring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("question {0} is not part of this questionnaire")]
    UnknownQuestion(QuestionId),
    #[error("question {0} was answered more than once")]
    DuplicateAnswer(QuestionId),
    #[error("question {question_id} takes exactly {expected} option(s), got {found}")]
    WrongOptionCount {
        question_id: QuestionId,
        expected: usize,
        found: usize,
    },
    #[error("option {option_id} does not belong to question {question_id}")]
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[error("question {0} is free text and takes no options")]
    OptionsOnTextQuestion(QuestionId),
    #[error("question {0} requires a non-empty answer")]
    EmptyText(QuestionId),
}

/// Points earned by `answer` on `question`, after validating its shape.
pub fn score_answer(question: &Question, answer: &Answer) -> Result<u32, AnswerError> {
    let question_id = &question.id;

    if question.question_type() == QuestionType::Text {
        if !answer.selected_options.is_empty() {
            return Err(AnswerError::OptionsOnTextQuestion(question_id.clone()));
        }
        if answer.has_text() {
            return Ok(question.max_points());
        }
        if question.required {
            return Err(AnswerError::EmptyText(question_id.clone()));
        }
        return Ok(0);
    }

    let mut options = Vec::with_capacity(answer.selected_options.len());
    for option_id in &answer.selected_options {
        let option = question
            .option(option_id)
            .ok_or_else(|| AnswerError::UnknownOption {
                question_id: question_id.clone(),
                option_id: option_id.clone(),
            })?;
        options.push(option);
    }

    if question.question_type().is_single_select() {
        return match options.as_slice() {
            [option] => Ok(option.points),
            _ => Err(AnswerError::WrongOptionCount {
                question_id: question_id.clone(),
                expected: 1,
                found: options.len(),
            }),
        };
    }

    // Repeated selections of one option count once.
    let mut counted = BTreeSet::new();
    Ok(options
        .into_iter()
        .filter(|option| option.is_correct && counted.insert(option.id.clone()))
        .map(|option| option.points)
        .sum())
}
