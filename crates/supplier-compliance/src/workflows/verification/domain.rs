use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::client::{ClientError, GradeReport};
use super::grade::Grade;
use super::policy::{PolicyFailure, VerificationPolicy};
use crate::workflows::error::ValidationError;
use crate::workflows::ids::{RequirementId, ResponseId, SupplierId, VerificationId};

/// Days a recorded verification stays valid.
pub const VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Network,
    Dns,
    Email,
    WebApplication,
    Tls,
    Other,
}

impl FromStr for CategoryKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "network" => Ok(CategoryKind::Network),
            "dns" => Ok(CategoryKind::Dns),
            "email" => Ok(CategoryKind::Email),
            "web_application" | "web" => Ok(CategoryKind::WebApplication),
            "tls" | "ssl" => Ok(CategoryKind::Tls),
            "other" => Ok(CategoryKind::Other),
            _ => Err(ValidationError::UnknownVariant {
                field: "category",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub kind: CategoryKind,
    pub grade: Grade,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl FindingCounts {
    pub fn total(&self) -> u32 {
        self.critical
            .saturating_add(self.high)
            .saturating_add(self.medium)
            .saturating_add(self.low)
    }
}

/// Attempt-scoped reference to the response a verification belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationTarget {
    pub response_id: ResponseId,
    pub requirement_id: RequirementId,
    pub supplier_id: SupplierId,
    pub attempt: u32,
}

/// Immutable record of one grade verification for a response attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFixVerification {
    pub id: VerificationId,
    pub response_id: ResponseId,
    pub requirement_id: RequirementId,
    pub supplier_id: SupplierId,
    pub attempt: u32,
    pub report_hash: String,
    pub account_id: String,
    pub grade: Grade,
    pub score: u32,
    pub categories: Vec<CategoryResult>,
    pub findings: FindingCounts,
    pub reported_domain: String,
    pub registered_domain: String,
    pub domain_match: bool,
    pub is_valid: bool,
    pub report_date: DateTime<Utc>,
    pub verified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub passed: bool,
    pub failures: Vec<PolicyFailure>,
}

impl CheckFixVerification {
    /// Interpret a provider report and stamp the policy verdict on it.
    pub fn from_report(
        target: VerificationTarget,
        account_id: &str,
        registered_domain: &str,
        report: GradeReport,
        policy: &VerificationPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, ClientError> {
        let malformed = |error: ValidationError| ClientError::MalformedReport(error.to_string());

        let grade = report.grade.parse::<Grade>().map_err(malformed)?;
        let categories = report
            .categories
            .iter()
            .map(|category| {
                Ok(CategoryResult {
                    kind: category.name.parse().map_err(malformed)?,
                    grade: category.grade.parse().map_err(malformed)?,
                    score: category.score,
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        let mut verification = Self {
            id: VerificationId::generate(),
            response_id: target.response_id,
            requirement_id: target.requirement_id,
            supplier_id: target.supplier_id,
            attempt: target.attempt,
            report_hash: report.report_hash,
            account_id: account_id.to_string(),
            grade,
            score: report.score,
            categories,
            findings: report.findings,
            domain_match: domains_match(&report.domain, registered_domain),
            reported_domain: report.domain,
            registered_domain: registered_domain.to_string(),
            is_valid: report.is_valid,
            report_date: report.report_date,
            verified_at: now,
            expires_at: now + Duration::days(VALIDITY_DAYS),
            passed: false,
            failures: Vec::new(),
        };

        let verdict = policy.evaluate(&verification, now);
        verification.passed = verdict.passed;
        verification.failures = verdict.failures;
        Ok(verification)
    }

    pub fn is_currently_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_valid && now < self.expires_at && self.domain_match
    }

    /// Whole days since the provider produced the report.
    pub fn report_age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.report_date).num_days()
    }

    /// True once `now` is within `days_before_expiry` of expiry, or past it.
    pub fn needs_refresh(&self, days_before_expiry: i64, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::days(days_before_expiry)
    }
}

/// Compare two domains ignoring case, a `www.` prefix and a trailing dot.
pub fn domains_match(reported: &str, registered: &str) -> bool {
    let reported = normalize_domain(reported);
    !reported.is_empty() && reported == normalize_domain(registered)
}

fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().to_ascii_lowercase();
    let domain = domain.trim_end_matches('.');
    domain.strip_prefix("www.").unwrap_or(domain).to_string()
}
