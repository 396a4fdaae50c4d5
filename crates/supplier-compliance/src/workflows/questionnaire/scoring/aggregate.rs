use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::super::domain::Question;
use super::rules::{score_answer, Answer, AnswerError};
use crate::workflows::ids::{OptionId, QuestionId, TopicId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub question_id: QuestionId,
    pub topic_id: TopicId,
    pub selected_options: Vec<OptionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub points_earned: u32,
    pub max_points: u32,
    /// Present only for must-pass questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_pass_met: Option<bool>,
    pub answered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic_id: TopicId,
    pub points_earned: u64,
    pub max_points: u64,
    pub percentage: f64,
}

/// Scored snapshot of a full set of answers. Totals are widened to `u64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub answers: Vec<ScoredAnswer>,
    pub topics: Vec<TopicScore>,
    pub total_points: u64,
    pub max_points: u64,
    pub percentage: f64,
    pub passing_score: u8,
    pub passed: bool,
    pub must_pass_failed: bool,
}

impl ScoreCard {
    /// The `n` lowest scoring topics, ties broken by topic id.
    pub fn weakest_topics(&self, n: usize) -> Vec<&TopicScore> {
        let mut topics: Vec<&TopicScore> = self.topics.iter().collect();
        topics.sort_by(|a, b| {
            a.percentage
                .total_cmp(&b.percentage)
                .then_with(|| a.topic_id.cmp(&b.topic_id))
        });
        topics.truncate(n);
        topics
    }
}

/// Stateless scorer bound to one passing threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringEngine {
    passing_score: u8,
}

impl ScoringEngine {
    pub fn new(passing_score: u8) -> Self {
        Self {
            passing_score: passing_score.min(100),
        }
    }

    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    pub fn score(
        &self,
        questions: &[Question],
        answers: &[Answer],
    ) -> Result<ScoreCard, AnswerError> {
        let by_id: BTreeMap<&QuestionId, &Question> =
            questions.iter().map(|question| (&question.id, question)).collect();

        let mut earned = BTreeMap::new();
        let mut seen = BTreeSet::new();
        for answer in answers {
            let question = by_id
                .get(&answer.question_id)
                .ok_or_else(|| AnswerError::UnknownQuestion(answer.question_id.clone()))?;
            if !seen.insert(&answer.question_id) {
                return Err(AnswerError::DuplicateAnswer(answer.question_id.clone()));
            }
            earned.insert(&answer.question_id, (score_answer(question, answer)?, answer));
        }

        let mut scored = Vec::new();
        for question in questions {
            let entry = earned.get(&question.id);
            if entry.is_none() && !question.required && !question.must_pass {
                continue;
            }
            let points_earned = entry.map_or(0, |(points, _)| *points);
            let max_points = question.max_points();

            scored.push(ScoredAnswer {
                question_id: question.id.clone(),
                topic_id: question.topic_id.clone(),
                selected_options: entry
                    .map(|(_, answer)| answer.selected_options.clone())
                    .unwrap_or_default(),
                text: entry.and_then(|(_, answer)| answer.text.clone()),
                points_earned,
                max_points,
                must_pass_met: question
                    .must_pass
                    .then_some(points_earned >= max_points),
                answered: entry.is_some(),
            });
        }

        Ok(self.aggregate(scored))
    }

    fn aggregate(&self, answers: Vec<ScoredAnswer>) -> ScoreCard {
        let total_points: u64 = answers
            .iter()
            .map(|answer| u64::from(answer.points_earned))
            .sum();
        let max_points: u64 = answers
            .iter()
            .map(|answer| u64::from(answer.max_points))
            .sum();
        let overall = percentage(total_points, max_points);
        let must_pass_failed = answers
            .iter()
            .any(|answer| answer.must_pass_met == Some(false));

        let mut rollup: BTreeMap<&TopicId, (u64, u64)> = BTreeMap::new();
        for answer in &answers {
            let entry = rollup.entry(&answer.topic_id).or_default();
            entry.0 += u64::from(answer.points_earned);
            entry.1 += u64::from(answer.max_points);
        }
        let topics = rollup
            .into_iter()
            .map(|(topic_id, (points_earned, max_points))| TopicScore {
                topic_id: topic_id.clone(),
                points_earned,
                max_points,
                percentage: percentage(points_earned, max_points),
            })
            .collect();

        ScoreCard {
            passed: !must_pass_failed && overall >= f64::from(self.passing_score),
            answers,
            topics,
            total_points,
            max_points,
            percentage: overall,
            passing_score: self.passing_score,
            must_pass_failed,
        }
    }
}

fn percentage(earned: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        earned as f64 * 100.0 / max as f64
    }
}
