//! Text-backed enumerations stored in `TEXT` columns guarded by CHECK
//! constraints.
//!
//! Each enum serializes to the exact string persisted in the database, so the
//! same value flows unchanged through the REST API, the WebSocket protocol and
//! the SQL layer.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The persisted string form.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            /// Parse the persisted string form. Matching is exact.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $( $text => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse(value).ok_or_else(|| {
                    let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                    CoreError::Validation(format!(
                        "Invalid {} '{value}'. Must be one of: {}",
                        stringify!($name),
                        allowed.join(", ")
                    ))
                })
            }
        }
    };
}

define_text_enum! {
    /// Project lifecycle status.
    ProjectStatus {
        NotStarted => "Not Started",
        InProgress => "In Progress",
        Completed => "Completed",
        OnHold => "On Hold",
        Cancelled => "Cancelled",
    }
}

define_text_enum! {
    /// Priority shared by projects and tasks.
    Priority {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Critical => "Critical",
    }
}

define_text_enum! {
    /// Task lifecycle status.
    TaskStatus {
        Todo => "To Do",
        InProgress => "In Progress",
        /// Completion requested by the assignee, awaiting the creator.
        InReview => "In Review",
        Blocked => "Blocked",
        Done => "Done",
    }
}

define_text_enum! {
    /// Entities a comment can be attached to.
    CommentTarget {
        Project => "Project",
        Task => "Task",
    }
}

define_text_enum! {
    /// Entities a notification can point back to.
    RelatedEntityType {
        Project => "Project",
        Task => "Task",
        Comment => "Comment",
        User => "User",
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::NotStarted
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl From<CommentTarget> for RelatedEntityType {
    fn from(target: CommentTarget) -> Self {
        match target {
            CommentTarget::Project => RelatedEntityType::Project,
            CommentTarget::Task => RelatedEntityType::Task,
        }
    }
}
