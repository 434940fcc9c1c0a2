//! Role-based access decisions.
//!
//! Roles form a closed set of tags. Every mutating operation declares the
//! roles it requires and asks [`AccessGate::authorize`] whether the acting
//! principal holds at least one of them. Ownership of a specific token is a
//! separate predicate (see [`super::OwnedByDoctor`]) because it depends on
//! data the gate never sees.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Role tag carried by an acting principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Staff,
}

impl Role {
    /// Every role the system knows about.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Doctor, Role::Nurse, Role::Staff];

    /// Stable lowercase name, as stored and as carried in claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "staff" => Ok(Role::Staff),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// An unordered set of roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Creates an empty set.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Creates a set from a slice of roles.
    pub fn of(roles: &[Role]) -> Self {
        Self(roles.iter().copied().collect())
    }

    /// Adds a role; returns false if it was already present.
    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// True if the two sets share at least one role.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.0.iter().any(|role| other.0.contains(role))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Pure role-intersection check.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    /// Roles allowed to issue tokens and manage patients.
    pub fn front_desk() -> RoleSet {
        RoleSet::of(&[Role::Staff, Role::Admin])
    }

    /// Roles allowed to advance a token.
    pub fn clinician() -> RoleSet {
        RoleSet::of(&[Role::Doctor])
    }

    /// Allowed iff the actor holds at least one required role.
    ///
    /// An empty requirement set admits nobody.
    pub fn authorize(actor_roles: &RoleSet, required_roles: &RoleSet) -> bool {
        actor_roles.intersects(required_roles)
    }
}
