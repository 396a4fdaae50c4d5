//! Process-local store implementing every repository, used by the demo, the
//! local server and tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::ids::{
    QuestionId, QuestionnaireId, RelationshipId, RequirementId, ResponseId, SubmissionId,
    SupplierId, VerificationId,
};
use super::questionnaire::{Question, QuestionRepository, Questionnaire, QuestionnaireRepository};
use super::relationship::{Relationship, RelationshipFilter, RelationshipRepository};
use super::repository::{Page, PageRequest, RepositoryError};
use super::requirement::{Requirement, RequirementFilter, RequirementRepository};
use super::submission::{
    QuestionnaireSubmission, ResponseRepository, SubmissionFilter, SubmissionRepository,
    SupplierResponse,
};
use super::verification::{CheckFixVerification, VerificationFilter, VerificationRepository};

#[derive(Debug, Default)]
pub struct InMemoryComplianceStore {
    relationships: Mutex<BTreeMap<RelationshipId, Relationship>>,
    requirements: Mutex<BTreeMap<RequirementId, Requirement>>,
    responses: Mutex<BTreeMap<ResponseId, SupplierResponse>>,
    submissions: Mutex<BTreeMap<SubmissionId, QuestionnaireSubmission>>,
    verifications: Mutex<BTreeMap<VerificationId, CheckFixVerification>>,
    questionnaires: Mutex<BTreeMap<QuestionnaireId, Questionnaire>>,
    questions: Mutex<BTreeMap<QuestionId, Question>>,
}

impl InMemoryComplianceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
}

fn bound_pair_taken(
    relationships: &BTreeMap<RelationshipId, Relationship>,
    candidate: &Relationship,
) -> bool {
    let Some(supplier_id) = &candidate.supplier_id else {
        return false;
    };
    relationships.values().any(|existing| {
        existing.id != candidate.id
            && existing.company_id == candidate.company_id
            && existing.is_bound_to(supplier_id)
    })
}

impl RelationshipRepository for InMemoryComplianceStore {
    fn insert_relationship(
        &self,
        relationship: Relationship,
    ) -> Result<Relationship, RepositoryError> {
        let mut guard = lock(&self.relationships)?;
        if guard.contains_key(&relationship.id) || bound_pair_taken(&guard, &relationship) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(relationship.id.clone(), relationship.clone());
        Ok(relationship)
    }

    fn update_relationship(&self, relationship: Relationship) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.relationships)?;
        if !guard.contains_key(&relationship.id) {
            return Err(RepositoryError::not_found("relationship", &relationship.id));
        }
        if bound_pair_taken(&guard, &relationship) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(relationship.id.clone(), relationship);
        Ok(())
    }

    fn fetch_relationship(
        &self,
        id: &RelationshipId,
    ) -> Result<Option<Relationship>, RepositoryError> {
        Ok(lock(&self.relationships)?.get(id).cloned())
    }

    fn list_relationships(
        &self,
        filter: &RelationshipFilter,
        page: PageRequest,
    ) -> Result<Page<Relationship>, RepositoryError> {
        let guard = lock(&self.relationships)?;
        let mut matches: Vec<Relationship> = guard
            .values()
            .filter(|relationship| filter.matches(relationship))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.paginate(matches))
    }
}

impl RequirementRepository for InMemoryComplianceStore {
    fn insert_requirement(&self, requirement: Requirement) -> Result<Requirement, RepositoryError> {
        let mut guard = lock(&self.requirements)?;
        if guard.contains_key(&requirement.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(requirement.id.clone(), requirement.clone());
        Ok(requirement)
    }

    fn update_requirement(&self, requirement: Requirement) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.requirements)?;
        let Some(slot) = guard.get_mut(&requirement.id) else {
            return Err(RepositoryError::not_found("requirement", &requirement.id));
        };
        *slot = requirement;
        Ok(())
    }

    fn fetch_requirement(&self, id: &RequirementId) -> Result<Option<Requirement>, RepositoryError> {
        Ok(lock(&self.requirements)?.get(id).cloned())
    }

    fn list_requirements(
        &self,
        filter: &RequirementFilter,
        page: PageRequest,
    ) -> Result<Page<Requirement>, RepositoryError> {
        let guard = lock(&self.requirements)?;
        let mut matches: Vec<Requirement> = guard
            .values()
            .filter(|requirement| filter.matches(requirement))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.paginate(matches))
    }
}

impl ResponseRepository for InMemoryComplianceStore {
    fn insert_response(
        &self,
        response: SupplierResponse,
    ) -> Result<SupplierResponse, RepositoryError> {
        let mut guard = lock(&self.responses)?;
        let duplicate = guard.contains_key(&response.id)
            || guard
                .values()
                .any(|existing| existing.requirement_id == response.requirement_id);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(response.id.clone(), response.clone());
        Ok(response)
    }

    fn update_response(&self, response: SupplierResponse) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.responses)?;
        let Some(slot) = guard.get_mut(&response.id) else {
            return Err(RepositoryError::not_found("response", &response.id));
        };
        *slot = response;
        Ok(())
    }

    fn fetch_response(&self, id: &ResponseId) -> Result<Option<SupplierResponse>, RepositoryError> {
        Ok(lock(&self.responses)?.get(id).cloned())
    }

    fn fetch_response_for_requirement(
        &self,
        requirement_id: &RequirementId,
    ) -> Result<Option<SupplierResponse>, RepositoryError> {
        Ok(lock(&self.responses)?
            .values()
            .find(|response| &response.requirement_id == requirement_id)
            .cloned())
    }

    fn list_responses(
        &self,
        supplier_id: &SupplierId,
        page: PageRequest,
    ) -> Result<Page<SupplierResponse>, RepositoryError> {
        let guard = lock(&self.responses)?;
        let mut matches: Vec<SupplierResponse> = guard
            .values()
            .filter(|response| &response.supplier_id == supplier_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.paginate(matches))
    }
}

impl SubmissionRepository for InMemoryComplianceStore {
    fn insert_submission(
        &self,
        submission: QuestionnaireSubmission,
    ) -> Result<QuestionnaireSubmission, RepositoryError> {
        let mut guard = lock(&self.submissions)?;
        let duplicate = guard.contains_key(&submission.id)
            || guard.values().any(|existing| {
                existing.response_id == submission.response_id
                    && existing.attempt == submission.attempt
            });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(submission.id.clone(), submission.clone());
        Ok(submission)
    }

    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<QuestionnaireSubmission>, RepositoryError> {
        Ok(lock(&self.submissions)?.get(id).cloned())
    }

    fn fetch_submission_for_attempt(
        &self,
        response_id: &ResponseId,
        attempt: u32,
    ) -> Result<Option<QuestionnaireSubmission>, RepositoryError> {
        Ok(lock(&self.submissions)?
            .values()
            .find(|submission| &submission.response_id == response_id && submission.attempt == attempt)
            .cloned())
    }

    fn list_submissions(
        &self,
        filter: &SubmissionFilter,
        page: PageRequest,
    ) -> Result<Page<QuestionnaireSubmission>, RepositoryError> {
        let guard = lock(&self.submissions)?;
        let mut matches: Vec<QuestionnaireSubmission> = guard
            .values()
            .filter(|submission| filter.matches(submission))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.attempt.cmp(&b.attempt))
        });
        Ok(page.paginate(matches))
    }
}

impl VerificationRepository for InMemoryComplianceStore {
    fn insert_verification(
        &self,
        verification: CheckFixVerification,
    ) -> Result<CheckFixVerification, RepositoryError> {
        let mut guard = lock(&self.verifications)?;
        let duplicate = guard.contains_key(&verification.id)
            || guard.values().any(|existing| {
                existing.response_id == verification.response_id
                    && existing.attempt == verification.attempt
            });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(verification.id.clone(), verification.clone());
        Ok(verification)
    }

    fn fetch_verification(
        &self,
        id: &VerificationId,
    ) -> Result<Option<CheckFixVerification>, RepositoryError> {
        Ok(lock(&self.verifications)?.get(id).cloned())
    }

    fn fetch_verification_for_attempt(
        &self,
        response_id: &ResponseId,
        attempt: u32,
    ) -> Result<Option<CheckFixVerification>, RepositoryError> {
        Ok(lock(&self.verifications)?
            .values()
            .find(|verification| {
                &verification.response_id == response_id && verification.attempt == attempt
            })
            .cloned())
    }

    fn list_verifications(
        &self,
        filter: &VerificationFilter,
        page: PageRequest,
    ) -> Result<Page<CheckFixVerification>, RepositoryError> {
        let guard = lock(&self.verifications)?;
        let mut matches: Vec<CheckFixVerification> = guard
            .values()
            .filter(|verification| filter.matches(verification))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.verified_at
                .cmp(&b.verified_at)
                .then_with(|| a.attempt.cmp(&b.attempt))
        });
        Ok(page.paginate(matches))
    }
}

impl QuestionnaireRepository for InMemoryComplianceStore {
    fn insert_questionnaire(
        &self,
        questionnaire: Questionnaire,
    ) -> Result<Questionnaire, RepositoryError> {
        let mut guard = lock(&self.questionnaires)?;
        if guard.contains_key(&questionnaire.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(questionnaire.id.clone(), questionnaire.clone());
        Ok(questionnaire)
    }

    fn fetch_questionnaire(
        &self,
        id: &QuestionnaireId,
    ) -> Result<Option<Questionnaire>, RepositoryError> {
        Ok(lock(&self.questionnaires)?.get(id).cloned())
    }

    fn list_questionnaires(
        &self,
        page: PageRequest,
    ) -> Result<Page<Questionnaire>, RepositoryError> {
        let guard = lock(&self.questionnaires)?;
        Ok(page.paginate(guard.values().cloned().collect()))
    }
}

impl QuestionRepository for InMemoryComplianceStore {
    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError> {
        let mut guard = lock(&self.questions)?;
        if guard.contains_key(&question.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(question.id.clone(), question.clone());
        Ok(question)
    }

    fn update_question(&self, question: Question) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.questions)?;
        let Some(slot) = guard.get_mut(&question.id) else {
            return Err(RepositoryError::not_found("question", &question.id));
        };
        *slot = question;
        Ok(())
    }

    fn fetch_question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError> {
        Ok(lock(&self.questions)?.get(id).cloned())
    }

    fn list_questions(
        &self,
        questionnaire_id: &QuestionnaireId,
    ) -> Result<Vec<Question>, RepositoryError> {
        let guard = lock(&self.questions)?;
        let mut questions: Vec<Question> = guard
            .values()
            .filter(|question| &question.questionnaire_id == questionnaire_id)
            .cloned()
            .collect();
        questions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(questions)
    }
}
