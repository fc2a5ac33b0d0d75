//! Actors whose permissions are resolved: users, groups, and the directory
//! that turns group ids into groups.
//!
//! Users and groups are owned by the surrounding application. The resolver
//! only reads them through these traits.

use std::collections::HashMap;

use crate::authz::errors::AuthzError;
use crate::authz::types::{PermissionBits, Tri};

pub trait HasPermissions {
    /// The actor's own stored value for the slot at `bit` of `permission`.
    fn permission_bit(&self, permission: &str, bit: u8) -> Result<Tri, AuthzError>;
}

/// A user belongs to at most one group.
pub trait UserActor: HasPermissions {
    fn group(&self) -> Option<&str>;
}

/// Groups form a tree through their parent links.
pub trait GroupActor: HasPermissions {
    fn id(&self) -> &str;
    fn parent(&self) -> Option<&str>;
}

/// Injected lookup from group id to group.
pub trait GroupDirectory {
    type Group: GroupActor;

    fn group(&self, id: &str) -> Option<&Self::Group>;
}

impl<G: GroupActor> GroupDirectory for HashMap<String, G> {
    type Group = G;

    fn group(&self, id: &str) -> Option<&G> {
        self.get(id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct User {
    pub name: String,
    pub group: Option<String>,
    pub permissions: PermissionBits,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

impl HasPermissions for User {
    fn permission_bit(&self, permission: &str, bit: u8) -> Result<Tri, AuthzError> {
        self.permissions.get(permission, bit)
    }
}

impl UserActor for User {
    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Group {
    pub name: String,
    pub parent: Option<String>,
    pub permissions: PermissionBits,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

impl HasPermissions for Group {
    fn permission_bit(&self, permission: &str, bit: u8) -> Result<Tri, AuthzError> {
        self.permissions.get(permission, bit)
    }
}

impl GroupActor for Group {
    fn id(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// Index groups by id for use as a `GroupDirectory`.
pub fn directory<I: IntoIterator<Item = Group>>(groups: I) -> HashMap<String, Group> {
    groups.into_iter().map(|g| (g.name.clone(), g)).collect()
}
