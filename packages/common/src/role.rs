use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The single attribute that decides what an account may do.
///
/// Stored as its upper-case name. Rows holding any other string parse to no role
/// at all, and the policy treats such callers as having no access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full control; the only role that carries the staff flag.
    Admin,
    /// Scores submissions in assigned competitions.
    Judge,
    /// Read-only oversight of submissions, scores and statistics.
    Committee,
    /// Enters competitions and owns submissions.
    Participant,
}

impl Role {
    /// Role assigned when a registration request does not name one.
    pub const DEFAULT: Role = Role::Participant;

    pub const ALL: &'static [Role] = &[
        Self::Admin,
        Self::Judge,
        Self::Committee,
        Self::Participant,
    ];

    /// The staff flag stored next to the role. True only for administrators.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Staff flag for a role as stored in the database.
    ///
    /// Parses the same way a request does, so a row the policy treats as an
    /// administrator is always a staff row and vice versa.
    pub fn staff_flag(stored: &str) -> bool {
        stored.parse::<Role>().is_ok_and(|role| role.is_staff())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Judge => "JUDGE",
            Self::Committee => "COMMITTEE",
            Self::Participant => "PARTICIPANT",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown role: {s}"))
    }
}
