//! Project-level capability checks.
//!
//! Every handler that touches a project, or something that belongs to one,
//! resolves a [`ProjectAccess`] for the acting user and asks it whether the
//! requested [`ProjectAction`] is permitted. The owner always counts as a
//! member, whether or not a membership row exists for them.

use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, ROLE_PROJECT_MANAGER};
use crate::types::DbId;

/// How the acting user relates to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectRelation {
    Owner,
    Member,
    Outsider,
}

/// Things a user may attempt against a project or its tasks and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectAction {
    /// Read the project, its tasks and its comments; join its live room.
    View,
    /// Create tasks and assign or unassign project members to them.
    ManageTasks,
    /// Post comments on the project or its tasks.
    Comment,
    /// Edit project fields.
    Update,
    /// Add or remove members.
    ManageMembers,
    /// Archive (soft-delete) the project.
    Archive,
}

impl ProjectAction {
    fn denial_message(self) -> &'static str {
        match self {
            ProjectAction::View => "Access denied to this project",
            ProjectAction::ManageTasks | ProjectAction::Comment => {
                "Only project members can perform this action"
            }
            ProjectAction::Update | ProjectAction::ManageMembers => {
                "Only the project owner or an admin can perform this action"
            }
            ProjectAction::Archive => {
                "Only an admin or a project manager who owns the project can archive it"
            }
        }
    }
}

/// The resolved access of one user to one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectAccess {
    pub relation: ProjectRelation,
    pub is_admin: bool,
    pub is_manager: bool,
}

impl ProjectAccess {
    /// Resolve access from the actor's identity and role and the project's
    /// owner and membership.
    pub fn resolve(actor_id: DbId, actor_role: &str, owner_id: DbId, is_member: bool) -> Self {
        let relation = if actor_id == owner_id {
            ProjectRelation::Owner
        } else if is_member {
            ProjectRelation::Member
        } else {
            ProjectRelation::Outsider
        };

        Self {
            relation,
            is_admin: actor_role == ROLE_ADMIN,
            is_manager: actor_role == ROLE_PROJECT_MANAGER,
        }
    }

    /// Every action this access permits.
    pub fn actions(&self) -> Vec<ProjectAction> {
        [
            ProjectAction::View,
            ProjectAction::ManageTasks,
            ProjectAction::Comment,
            ProjectAction::Update,
            ProjectAction::ManageMembers,
            ProjectAction::Archive,
        ]
        .into_iter()
        .filter(|action| self.can(*action))
        .collect()
    }

    pub fn can(&self, action: ProjectAction) -> bool {
        let is_owner = self.relation == ProjectRelation::Owner;
        let in_project = self.relation != ProjectRelation::Outsider;

        match action {
            ProjectAction::View | ProjectAction::ManageTasks | ProjectAction::Comment => {
                self.is_admin || in_project
            }
            ProjectAction::Update | ProjectAction::ManageMembers => self.is_admin || is_owner,
            ProjectAction::Archive => self.is_admin || (self.is_manager && is_owner),
        }
    }

    /// Like [`can`](Self::can) but returns a `Forbidden` error on denial.
    pub fn require(&self, action: ProjectAction) -> Result<(), CoreError> {
        if self.can(action) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(action.denial_message().to_string()))
        }
    }
}
