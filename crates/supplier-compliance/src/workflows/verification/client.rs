use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::FindingCounts;
use super::grade::Grade;
use crate::workflows::clock::Clock;

/// Failure talking to the grading provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("grading provider unreachable: {0}")]
    Transport(String),
    #[error("grading provider returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("report {0} not found")]
    ReportNotFound(String),
    #[error("account {0} is not accessible with the configured credentials")]
    AccessDenied(String),
    #[error("grading provider sent a malformed report: {0}")]
    MalformedReport(String),
}

/// Category line of a provider report, kept as the provider spells it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCategory {
    pub name: String,
    pub grade: String,
    pub score: u32,
}

/// Report as delivered by the grading provider, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    pub report_hash: String,
    pub grade: String,
    pub score: u32,
    pub categories: Vec<ReportCategory>,
    pub findings: FindingCounts,
    pub domain: String,
    pub is_valid: bool,
    pub report_date: DateTime<Utc>,
}

/// Boundary to the third-party security-grade provider.
pub trait VerificationClient: Send + Sync {
    fn verify_report(&self, report_hash: &str) -> Result<GradeReport, ClientError>;
    fn account_domain(&self, account_id: &str) -> Result<String, ClientError>;
    fn validate_account_access(&self, account_id: &str) -> bool;
}

/// Deterministic client used by the demo, local server and tests.
///
/// Reports are dated from the injected clock, so they age along with the
/// workflow that reads them.
#[derive(Clone)]
pub struct StaticVerificationClient {
    domain: String,
    grade: Grade,
    clock: Arc<dyn Clock>,
    report_age: Duration,
}

impl StaticVerificationClient {
    pub fn new(domain: impl Into<String>, grade: Grade, clock: Arc<dyn Clock>) -> Self {
        Self {
            domain: domain.into(),
            grade,
            clock,
            report_age: Duration::zero(),
        }
    }

    /// Date each report this far before the clock's current instant.
    pub fn with_report_age(mut self, report_age: Duration) -> Self {
        self.report_age = report_age;
        self
    }

    fn report_date(&self) -> DateTime<Utc> {
        self.clock.now() - self.report_age
    }
}

impl fmt::Debug for StaticVerificationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticVerificationClient")
            .field("domain", &self.domain)
            .field("grade", &self.grade)
            .field("report_age", &self.report_age)
            .finish_non_exhaustive()
    }
}

impl VerificationClient for StaticVerificationClient {
    fn verify_report(&self, report_hash: &str) -> Result<GradeReport, ClientError> {
        let report_hash = report_hash.trim();
        if report_hash.is_empty() {
            return Err(ClientError::ReportNotFound(String::new()));
        }

        let score = u32::from(self.grade.score()) * 20;
        let categories = ["network", "dns", "email", "web_application", "tls"]
            .into_iter()
            .map(|name| ReportCategory {
                name: name.to_string(),
                grade: self.grade.label().to_string(),
                score,
            })
            .collect();

        Ok(GradeReport {
            report_hash: report_hash.to_string(),
            grade: self.grade.label().to_string(),
            score,
            categories,
            findings: FindingCounts {
                critical: 0,
                high: u32::from(5 - self.grade.score()),
                medium: 2,
                low: 4,
            },
            domain: self.domain.clone(),
            is_valid: true,
            report_date: self.report_date(),
        })
    }

    fn account_domain(&self, account_id: &str) -> Result<String, ClientError> {
        if account_id.trim().is_empty() {
            return Err(ClientError::AccessDenied(account_id.to_string()));
        }
        Ok(self.domain.clone())
    }

    fn validate_account_access(&self, account_id: &str) -> bool {
        !account_id.trim().is_empty()
    }
}
