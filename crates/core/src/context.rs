//! Caller identity handed to every core operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unibus_common::{AppError, AppResult};

/// Capability held by an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A registered student.
    Student,
    /// Transport office staff.
    Admin,
}

impl Role {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::BadRequest(format!("Unknown role: {other}"))),
        }
    }
}

/// Authenticated caller, already verified upstream.
///
/// For students `identity` is also the student id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Opaque identity supplied by the identity provider.
    pub identity: String,
    /// Capability granted to the caller.
    pub role: Role,
}

impl CallerContext {
    /// Create a caller context.
    #[must_use]
    pub fn new(identity: impl Into<String>, role: Role) -> Self {
        Self {
            identity: identity.into(),
            role,
        }
    }

    /// A student caller.
    #[must_use]
    pub fn student(identity: impl Into<String>) -> Self {
        Self::new(identity, Role::Student)
    }

    /// An admin caller.
    #[must_use]
    pub fn admin(identity: impl Into<String>) -> Self {
        Self::new(identity, Role::Admin)
    }

    /// Whether the caller holds the admin capability.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the caller is an admin.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}
