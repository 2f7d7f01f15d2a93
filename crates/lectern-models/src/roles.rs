//! Role names.
//!
//! A user holds a set of roles. Checks are plain set membership on the exact
//! name: there is no hierarchy, so `ADMIN` does not satisfy a `TEACHER`
//! check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Teacher, Role::User];

    /// Name as stored in the `roles` table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-sensitive: `"admin"` is not a role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_names() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("TEACHER".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!("USER".parse::<Role>(), Ok(Role::User));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("admin".parse::<Role>().is_err());
        assert!("Teacher".parse::<Role>().is_err());
        assert!("SUPERADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_stored_names() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"TEACHER\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
