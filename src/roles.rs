use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Role
///
/// The privilege levels recognised by the portal, forming a fixed total order:
/// `User < Moderator < Admin`. A higher role always carries every capability
/// of the roles below it.
///
/// All privilege comparisons in the application go through [`Role::satisfies`];
/// no handler compares role values (or the raw database strings) directly.
/// Inserting a new level only requires extending the enum and [`Role::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    /// Position of the role in the total order. Only used for comparisons;
    /// the numeric values themselves are not persisted anywhere.
    pub fn rank(self) -> u8 {
        match self {
            Role::User => 0,
            Role::Moderator => 1,
            Role::Admin => 2,
        }
    }

    /// Returns true iff `self` carries at least the capabilities of `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// The stored string form, matching the `profiles.role` column values.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the directory's stored role string. Anything unrecognised is an
/// error: callers treat a principal without a valid role as unauthenticated
/// rather than silently downgrading it to `User`.
impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}
