use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::CheckFixVerification;
use super::grade::Grade;
use crate::workflows::requirement::GradeConfig;

pub const DEFAULT_MINIMUM_GRADE: Grade = Grade::C;
pub const DEFAULT_MAX_REPORT_AGE_DAYS: i64 = 90;

/// Reason a verification did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PolicyFailure {
    Invalidated,
    Expired {
        expires_at: DateTime<Utc>,
    },
    DomainMismatch {
        reported: String,
        registered: String,
    },
    GradeBelowMinimum {
        grade: Grade,
        minimum: Grade,
    },
    ReportTooOld {
        age_days: i64,
        max_days: i64,
    },
}

impl PolicyFailure {
    pub fn summary(&self) -> String {
        match self {
            PolicyFailure::Invalidated => "report was invalidated by the provider".to_string(),
            PolicyFailure::Expired { expires_at } => {
                format!("verification expired at {}", expires_at.to_rfc3339())
            }
            PolicyFailure::DomainMismatch {
                reported,
                registered,
            } => format!("report covers {reported} but the account is registered to {registered}"),
            PolicyFailure::GradeBelowMinimum { grade, minimum } => {
                format!("grade {grade} is below the required {minimum}")
            }
            PolicyFailure::ReportTooOld { age_days, max_days } => {
                format!("report is {age_days} days old (limit {max_days})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationVerdict {
    pub passed: bool,
    pub failures: Vec<PolicyFailure>,
}

/// Pass/fail rules for a grade verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    minimum_grade: Grade,
    max_report_age_days: Option<i64>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MINIMUM_GRADE, Some(DEFAULT_MAX_REPORT_AGE_DAYS))
    }
}

impl VerificationPolicy {
    /// A non-positive maximum age disables the age check.
    pub fn new(minimum_grade: Grade, max_report_age_days: Option<i64>) -> Self {
        Self {
            minimum_grade,
            max_report_age_days: max_report_age_days.filter(|days| *days > 0),
        }
    }

    pub fn from_config(config: &GradeConfig) -> Self {
        Self::new(
            config.effective_minimum_grade(),
            config.effective_max_report_age_days(),
        )
    }

    pub fn minimum_grade(&self) -> Grade {
        self.minimum_grade
    }

    pub fn max_report_age_days(&self) -> Option<i64> {
        self.max_report_age_days
    }

    pub fn evaluate(
        &self,
        verification: &CheckFixVerification,
        now: DateTime<Utc>,
    ) -> VerificationVerdict {
        let mut failures = Vec::new();

        if !verification.is_valid {
            failures.push(PolicyFailure::Invalidated);
        }
        if now >= verification.expires_at {
            failures.push(PolicyFailure::Expired {
                expires_at: verification.expires_at,
            });
        }
        if !verification.domain_match {
            failures.push(PolicyFailure::DomainMismatch {
                reported: verification.reported_domain.clone(),
                registered: verification.registered_domain.clone(),
            });
        }
        if !verification.grade.meets_minimum(self.minimum_grade) {
            failures.push(PolicyFailure::GradeBelowMinimum {
                grade: verification.grade,
                minimum: self.minimum_grade,
            });
        }
        if let Some(max_days) = self.max_report_age_days {
            let age_days = verification.report_age_days(now);
            if age_days > max_days {
                failures.push(PolicyFailure::ReportTooOld { age_days, max_days });
            }
        }

        VerificationVerdict {
            passed: failures.is_empty(),
            failures,
        }
    }

    pub fn passes(&self, verification: &CheckFixVerification, now: DateTime<Utc>) -> bool {
        self.evaluate(verification, now).passed
    }
}
