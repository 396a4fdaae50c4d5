use super::domain::{Question, Questionnaire};
use crate::workflows::ids::{QuestionId, QuestionnaireId};
use crate::workflows::repository::{Page, PageRequest, RepositoryError};

pub trait QuestionnaireRepository: Send + Sync {
    fn insert_questionnaire(
        &self,
        questionnaire: Questionnaire,
    ) -> Result<Questionnaire, RepositoryError>;
    fn fetch_questionnaire(
        &self,
        id: &QuestionnaireId,
    ) -> Result<Option<Questionnaire>, RepositoryError>;
    fn list_questionnaires(&self, page: PageRequest) -> Result<Page<Questionnaire>, RepositoryError>;
}

pub trait QuestionRepository: Send + Sync {
    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError>;
    fn update_question(&self, question: Question) -> Result<(), RepositoryError>;
    fn fetch_question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError>;
    /// Every question of a questionnaire, ordered by `order` then id.
    fn list_questions(
        &self,
        questionnaire_id: &QuestionnaireId,
    ) -> Result<Vec<Question>, RepositoryError>;
}
