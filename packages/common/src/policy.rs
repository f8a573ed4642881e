//! Role-based authorization and record visibility.
//!
//! Everything here is a pure function of the caller and the resource being
//! touched. Handlers re-read the caller's account on every request and consult
//! these functions before running any query, so a role change takes effect on
//! the very next request.
//!
//! Two questions are answered separately:
//!
//! * [`visibility`]: which rows of a resource a caller may see at all. Rows
//!   outside that set are reported as missing rather than forbidden.
//! * [`check`] / [`check_object`]: whether a caller may perform an operation,
//!   either on the collection or on one specific row.

use crate::Role;

/// The authenticated account behind a request, as loaded for this request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    /// `None` when the stored role string is not one we recognise.
    pub role: Option<Role>,
    pub is_staff: bool,
}

impl Caller {
    pub fn new(user_id: i32, role: Option<Role>, is_staff: bool) -> Self {
        Self {
            user_id,
            role,
            is_staff,
        }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Competition,
    Participant,
    Submission,
    Rubric,
    RubricVersion,
    Judge,
    Score,
    User,
    DashboardStats,
    ScoreExport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
    /// Upload a file onto an existing row.
    Attach,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Which rows of a resource a caller may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    All,
    /// Only rows owned by this user id.
    OwnedBy(i32),
    Nothing,
}

impl Visibility {
    /// Whether a row owned by `owner_user_id` is inside the visible set.
    pub fn permits(&self, owner_user_id: i32) -> bool {
        match self {
            Self::All => true,
            Self::OwnedBy(user_id) => *user_id == owner_user_id,
            Self::Nothing => false,
        }
    }
}

/// Visible set of `resource` for `caller`.
pub fn visibility(caller: &Caller, resource: Resource) -> Visibility {
    match resource {
        Resource::Submission => match caller.role {
            Some(Role::Admin | Role::Committee | Role::Judge) => Visibility::All,
            Some(Role::Participant) => Visibility::OwnedBy(caller.user_id),
            None => Visibility::Nothing,
        },
        Resource::Score => match caller.role {
            Some(Role::Admin | Role::Committee) => Visibility::All,
            Some(Role::Judge) => Visibility::OwnedBy(caller.user_id),
            Some(Role::Participant) | None => Visibility::Nothing,
        },
        Resource::User => match caller.role {
            Some(Role::Admin) => Visibility::All,
            _ => Visibility::OwnedBy(caller.user_id),
        },
        Resource::Competition
        | Resource::Participant
        | Resource::Rubric
        | Resource::RubricVersion
        | Resource::Judge => Visibility::All,
        Resource::DashboardStats | Resource::ScoreExport => {
            Visibility::from_decision(check(caller, resource, Operation::Retrieve))
        }
    }
}

impl Visibility {
    fn from_decision(decision: Decision) -> Self {
        match decision {
            Decision::Allow => Self::All,
            Decision::Deny => Self::Nothing,
        }
    }
}

/// Collection-level permission: may `caller` perform `op` on `resource` at all?
///
/// For per-row rules (ownership), use [`check_object`].
pub fn check(caller: &Caller, resource: Resource, op: Operation) -> Decision {
    use Operation::*;

    let allowed = match (resource, op) {
        (Resource::Competition, List | Retrieve) => true,
        (Resource::Competition, Create | Update | Delete) => caller.is_staff,

        (Resource::Participant, List | Retrieve) => true,

        (Resource::Submission, List | Retrieve) => true,
        (Resource::Submission, Create) => caller.is(Role::Participant),
        (Resource::Submission, Update | Delete) => caller.is_staff,
        (Resource::Submission, Attach) => caller.is_staff || caller.is(Role::Participant),

        (Resource::Rubric | Resource::RubricVersion, List | Retrieve) => true,
        (Resource::Rubric | Resource::RubricVersion, Create | Update | Delete) => {
            caller.is(Role::Admin)
        }

        (Resource::Judge, List | Retrieve) => true,
        (Resource::Judge, Update | Delete) => caller.is_staff,

        (Resource::Score, List | Retrieve) => true,
        (Resource::Score, Create) => caller.is(Role::Judge),
        (Resource::Score, Update | Delete | Attach) => {
            caller.is(Role::Admin) || caller.is(Role::Judge)
        }

        (Resource::User, Retrieve) => true,
        (Resource::User, List | Delete) => caller.is(Role::Admin),

        (Resource::DashboardStats, Retrieve) => {
            caller.is(Role::Admin) || caller.is(Role::Committee)
        }
        (Resource::ScoreExport, Retrieve) => caller.is_staff,

        _ => false,
    };

    Decision::from_bool(allowed)
}

/// Row-level permission for a row owned by `owner_user_id`.
///
/// Callers are expected to have already filtered the row through
/// [`visibility`]; this only answers the ownership question.
pub fn check_object(
    caller: &Caller,
    resource: Resource,
    op: Operation,
    owner_user_id: i32,
) -> Decision {
    if !check(caller, resource, op).is_allowed() {
        return Decision::Deny;
    }

    let is_owner = caller.user_id == owner_user_id;
    let allowed = match (resource, op) {
        (Resource::Score, Operation::Update | Operation::Delete | Operation::Attach) => {
            caller.is(Role::Admin) || is_owner
        }
        (Resource::Submission, Operation::Attach) => caller.is_staff || is_owner,
        _ => true,
    };

    Decision::from_bool(allowed)
}

/// Roles a caller may hand out through registration.
///
/// Anonymous callers and non-admins can only create participant accounts.
pub fn may_register_role(caller: Option<&Caller>, requested: Role) -> bool {
    if requested == Role::Participant {
        return true;
    }
    caller.is_some_and(|c| c.is(Role::Admin))
}
