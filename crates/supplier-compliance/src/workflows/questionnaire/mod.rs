//! Questionnaire catalogue and the scoring engine applied to submissions.

mod domain;
mod repository;
pub mod scoring;
mod service;


pub use domain::{
    Question, QuestionDefinition, QuestionOption, QuestionType, Questionnaire, Topic,
    DEFAULT_TEXT_POINTS,
};
pub use repository::{QuestionRepository, QuestionnaireRepository};
pub use scoring::{Answer, AnswerError, ScoreCard, ScoredAnswer, ScoringEngine, TopicScore};
pub use service::QuestionnaireService;
