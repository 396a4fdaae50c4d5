//! Third-party security grade verification: the provider boundary, the
//! recorded verification and the policy that judges it.

mod client;
mod domain;
mod grade;
mod policy;
mod repository;


pub use client::{
    ClientError, GradeReport, ReportCategory, StaticVerificationClient, VerificationClient,
};
pub use domain::{
    domains_match, CategoryKind, CategoryResult, CheckFixVerification, FindingCounts,
    VerificationTarget, VALIDITY_DAYS,
};
pub use grade::Grade;
pub use policy::{
    PolicyFailure, VerificationPolicy, VerificationVerdict, DEFAULT_MAX_REPORT_AGE_DAYS,
    DEFAULT_MINIMUM_GRADE,
};
pub use repository::{VerificationFilter, VerificationRepository};
