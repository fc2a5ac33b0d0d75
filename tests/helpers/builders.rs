use std::sync::Arc;

use permtree::authz::actor::{Group, User};
use permtree::authz::source::InlineSource;
use permtree::{PermissionSchema, Tri};

/// The schema shipped in `config/permissions.kdl`.
pub fn bundled_schema() -> Arc<PermissionSchema> {
    let source = InlineSource::new(
        "config/permissions.kdl",
        include_str!("../../config/permissions.kdl"),
    );
    Arc::new(PermissionSchema::load(&source).expect("Bundled schema must load"))
}

/// Builder for creating test groups
pub struct GroupBuilder {
    name: String,
    parent: Option<String>,
    values: Vec<(String, String, Tri)>,
}

impl GroupBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            values: Vec::new(),
        }
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn allow(self, permission: &str, operation: &str) -> Self {
        self.value(permission, operation, Tri::Allow)
    }

    pub fn disallow(self, permission: &str, operation: &str) -> Self {
        self.value(permission, operation, Tri::Disallow)
    }

    fn value(mut self, permission: &str, operation: &str, value: Tri) -> Self {
        self.values
            .push((permission.to_string(), operation.to_string(), value));
        self
    }

    pub fn build(self, schema: &PermissionSchema) -> Group {
        let mut group = Group::new(self.name);
        group.parent = self.parent;
        for (permission, operation, value) in &self.values {
            group
                .permissions
                .set_operation(schema, permission, operation, *value)
                .expect("Failed to set group permission");
        }
        group
    }
}

/// Builder for creating test users
pub struct UserBuilder {
    name: String,
    group: Option<String>,
    values: Vec<(String, String, Tri)>,
}

impl UserBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            group: None,
            values: Vec::new(),
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn allow(self, permission: &str, operation: &str) -> Self {
        self.value(permission, operation, Tri::Allow)
    }

    pub fn disallow(self, permission: &str, operation: &str) -> Self {
        self.value(permission, operation, Tri::Disallow)
    }

    fn value(mut self, permission: &str, operation: &str, value: Tri) -> Self {
        self.values
            .push((permission.to_string(), operation.to_string(), value));
        self
    }

    pub fn build(self, schema: &PermissionSchema) -> User {
        let mut user = User::new(self.name);
        user.group = self.group;
        for (permission, operation, value) in &self.values {
            user.permissions
                .set_operation(schema, permission, operation, *value)
                .expect("Failed to set user permission");
        }
        user
    }
}
