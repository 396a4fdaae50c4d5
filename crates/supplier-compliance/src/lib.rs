//! Compliance workflow engine tracking whether suppliers meet a company's
//! security requirements.
//!
//! Relationships between a company and a supplier gate the creation of
//! requirements. Each requirement is satisfied either by a scored questionnaire
//! or by a third-party security-grade verification, and moves through a review
//! lifecycle driven by [`workflows::submission::SubmissionOrchestrator`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
