use std::sync::Arc;

use super::domain::{Question, QuestionDefinition, Questionnaire};
use super::repository::{QuestionRepository, QuestionnaireRepository};
use crate::workflows::error::{ComplianceError, ValidationError};
use crate::workflows::ids::{QuestionId, QuestionnaireId};
use crate::workflows::repository::{Page, PageRequest};

/// Authoring operations for questionnaires and their questions.
pub struct QuestionnaireService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for QuestionnaireService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> QuestionnaireService<S>
where
    S: QuestionnaireRepository + QuestionRepository + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, questionnaire: Questionnaire) -> Result<Questionnaire, ComplianceError> {
        Ok(self.store.insert_questionnaire(questionnaire)?)
    }

    pub fn get(&self, id: &QuestionnaireId) -> Result<Questionnaire, ComplianceError> {
        self.store
            .fetch_questionnaire(id)?
            .ok_or_else(|| ComplianceError::not_found("questionnaire", id))
    }

    pub fn list(&self, page: PageRequest) -> Result<Page<Questionnaire>, ComplianceError> {
        Ok(self.store.list_questionnaires(page)?)
    }

    /// Add a question under one of the questionnaire's topics.
    pub fn add_question(
        &self,
        questionnaire_id: &QuestionnaireId,
        definition: QuestionDefinition,
    ) -> Result<Question, ComplianceError> {
        let questionnaire = self.get(questionnaire_id)?;
        ensure_topic(&questionnaire, &definition)?;

        let question = Question::new(
            QuestionId::generate(),
            questionnaire_id.clone(),
            definition,
        )?;
        Ok(self.store.insert_question(question)?)
    }

    pub fn update_question(
        &self,
        id: &QuestionId,
        definition: QuestionDefinition,
    ) -> Result<Question, ComplianceError> {
        let mut question = self
            .store
            .fetch_question(id)?
            .ok_or_else(|| ComplianceError::not_found("question", id))?;
        let questionnaire = self.get(&question.questionnaire_id)?;
        ensure_topic(&questionnaire, &definition)?;

        question.redefine(definition)?;
        self.store.update_question(question.clone())?;
        Ok(question)
    }

    pub fn questions(&self, id: &QuestionnaireId) -> Result<Vec<Question>, ComplianceError> {
        self.get(id)?;
        Ok(self.store.list_questions(id)?)
    }
}

fn ensure_topic(
    questionnaire: &Questionnaire,
    definition: &QuestionDefinition,
) -> Result<(), ValidationError> {
    if questionnaire.has_topic(&definition.topic_id) {
        Ok(())
    } else {
        Err(ValidationError::field(
            "topic_id",
            format!(
                "topic {} is not part of questionnaire {}",
                definition.topic_id, questionnaire.id
            ),
        ))
    }
}
