//! Turns submitted answers into points, topic rollups and a pass verdict.

mod aggregate;
mod rules;

pub use aggregate::{ScoreCard, ScoredAnswer, ScoringEngine, TopicScore};
pub use rules::{score_answer, Answer, AnswerError};
