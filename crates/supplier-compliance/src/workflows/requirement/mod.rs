//! Requirements a company places on a supplier, their review lifecycle and
//! due-date scheduling.

mod domain;
mod repository;
mod schedule;
mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    GradeConfig, NewRequirement, Priority, QuestionnaireConfig, Requirement, RequirementKind,
    RequirementStatus,
};
pub use repository::{RequirementFilter, RequirementRepository};
pub use service::RequirementService;
