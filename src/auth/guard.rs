//! Authorization decisions.
//!
//! [`authorize`] is a pure function of the caller, the action and the target
//! resource. Rules, in order:
//!
//! 1. no identity: deny everything;
//! 2. administrative actions need [`Role::Admin`], and an admin can never
//!    delete their own account through them;
//! 3. self-scoped actions on a task are allowed only to its owner. Anyone else
//!    is told the task was not found, so other users' tasks cannot be probed.
//!
//! Changing a user's admin flag is only reachable through
//! [`Action::AdminUpdate`], which rule 2 gates.

use uuid::Uuid;

use crate::error::AppError;
use crate::users::model::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Standard,
    Admin,
}

impl Role {
    pub fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Role::Admin
        } else {
            Role::Standard
        }
    }
}

/// The authenticated user a request acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            role: Role::from_admin_flag(u.is_admin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    AdminList,
    AdminUpdate,
    AdminDelete,
}

impl Action {
    pub fn is_administrative(self) -> bool {
        matches!(self, Action::AdminList | Action::AdminUpdate | Action::AdminDelete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The caller's own user record.
    Profile,
    /// The caller's own task collection.
    OwnTasks,
    Task { owner: Uuid },
    Users,
    AllTasks,
    User { id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    NotFound,
    Forbidden,
    SelfDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    /// Turns a denial into the error the caller sees; `what` names the
    /// resource in not-found messages.
    pub fn require(self, what: &'static str) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Unauthenticated) => Err(AppError::MissingCredential),
            Decision::Deny(DenyReason::NotFound) => Err(AppError::NotFound(what)),
            Decision::Deny(DenyReason::Forbidden) => Err(AppError::Forbidden),
            Decision::Deny(DenyReason::SelfDelete) => Err(AppError::SelfDeleteForbidden),
        }
    }
}

pub fn authorize(identity: Option<&Identity>, action: Action, resource: Resource) -> Decision {
    let Some(who) = identity else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    if action.is_administrative() {
        if who.role != Role::Admin {
            return Decision::Deny(DenyReason::Forbidden);
        }
        if action == Action::AdminDelete && resource == (Resource::User { id: who.id }) {
            return Decision::Deny(DenyReason::SelfDelete);
        }
        return Decision::Allow;
    }

    match (action, resource) {
        (Action::Read, Resource::Profile) => Decision::Allow,
        (Action::Read | Action::Create, Resource::OwnTasks) => Decision::Allow,
        (_, Resource::Task { owner }) if owner == who.id => Decision::Allow,
        (_, Resource::Task { .. }) => Decision::Deny(DenyReason::NotFound),
        _ => Decision::Deny(DenyReason::Forbidden),
    }
}
