pub mod actor;
pub mod document;
pub mod engine;
pub mod errors;
pub mod loader;
pub mod source;
pub mod types;
pub mod voter;

use std::collections::HashMap;

use errors::AuthzError;
use source::SchemaSource;
use types::PermissionDef;

/// Catalog of permissions, their operations and each operation's bit index.
/// Immutable after construction; schema changes require a process restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSchema {
    /// permission name -> PermissionDef
    pub(crate) permissions: HashMap<String, PermissionDef>,
    /// Permission names in declaration order
    pub(crate) order: Vec<String>,
}

impl PermissionSchema {
    /// Load and validate a schema from `source`.
    pub fn load(source: &dyn SchemaSource) -> Result<Self, AuthzError> {
        loader::load_schema(source)
    }

    pub fn bit_index_of(&self, permission: &str, operation: &str) -> Result<u8, AuthzError> {
        let def = self.definition(permission)?;
        def.operation(operation)
            .map(|op| op.bit)
            .ok_or_else(|| AuthzError::UnknownOperation {
                permission: permission.to_string(),
                operation: operation.to_string(),
            })
    }

    pub fn is_valid_permission(&self, permission: &str) -> bool {
        self.permissions.contains_key(permission)
    }

    /// Operation names of `permission`, in declaration order.
    pub fn operations_of(&self, permission: &str) -> Result<Vec<&str>, AuthzError> {
        let def = self.definition(permission)?;
        Ok(def.operations.iter().map(|op| op.name.as_str()).collect())
    }

    pub fn permission(&self, permission: &str) -> Option<&PermissionDef> {
        self.permissions.get(permission)
    }

    pub fn permission_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.permissions.values().map(|p| p.operations.len()).sum()
    }

    fn definition(&self, permission: &str) -> Result<&PermissionDef, AuthzError> {
        self.permissions
            .get(permission)
            .ok_or_else(|| AuthzError::UnknownPermission(permission.to_string()))
    }
}
