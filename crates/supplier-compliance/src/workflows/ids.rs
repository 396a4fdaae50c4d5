//! Identifier newtypes shared across the workflow modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_identifier(prefix: &str) -> String {
    let id = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Allocate a fresh process-unique identifier.
            pub fn generate() -> Self {
                Self(next_identifier($prefix))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

identifier!(
    /// The requesting organization.
    CompanyId,
    "co"
);
identifier!(
    /// The assessed organization.
    SupplierId,
    "sup"
);
identifier!(
    /// A user acting on behalf of a company or supplier.
    ActorId,
    "usr"
);
identifier!(RelationshipId, "rel");
identifier!(RequirementId, "req");
identifier!(ResponseId, "resp");
identifier!(SubmissionId, "sub");
identifier!(VerificationId, "ver");
identifier!(QuestionnaireId, "qnr");
identifier!(QuestionId, "q");
identifier!(TopicId, "topic");
identifier!(OptionId, "opt");
