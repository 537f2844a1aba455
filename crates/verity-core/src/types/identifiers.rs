//! String-backed identifier newtypes.
//!
//! Each ID type wraps a shared `Arc<str>` so clones stay cheap inside the
//! estimator loops, and distinct types prevent cross-type confusion: a
//! `ParticipantId` cannot be passed where a `QuestionId` is expected.
//! Ordering is lexicographic on the underlying string, which is the stable
//! tie-break every estimator relies on.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create a new ID from anything string-like.
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(Arc::from(value.as_ref()))
            }

            /// Borrow the underlying string.
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
                Self(Arc::from(value))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }

        impl From<&$name> for $name {
            fn from(value: &$name) -> Self {
                value.clone()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// A crowd worker, rater, or automated observer.
    ParticipantId
);

define_id!(
    /// An item that participants answer (a media unit, a patient, a defect candidate).
    QuestionId
);

define_id!(
    /// One categorical label a participant can pick for a question.
    ChoiceId
);
