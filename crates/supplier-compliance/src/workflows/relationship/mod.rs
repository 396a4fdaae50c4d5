//! Company to supplier relationships and the invitation lifecycle that gates
//! requirement creation.

mod domain;
mod repository;
mod service;


pub use domain::{Classification, Relationship, RelationshipStatus};
pub use repository::{RelationshipFilter, RelationshipRepository};
pub use service::RelationshipService;
