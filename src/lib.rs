//! permtree - tri-state permission resolution
//!
//! Decides whether a user may perform an operation on a permission by
//! reading the user's own setting and, while it is unresolved, the settings
//! of the user's group and that group's ancestors.

pub mod authz;
pub mod settings;

pub use authz::actor::{GroupActor, GroupDirectory, HasPermissions, UserActor};
pub use authz::engine::PermissionResolver;
pub use authz::errors::AuthzError;
pub use authz::types::{PermissionBits, Tri};
pub use authz::voter::{PermissionVoter, Subject, Vote};
pub use authz::PermissionSchema;
