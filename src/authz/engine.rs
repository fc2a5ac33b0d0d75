use std::collections::HashSet;
use std::sync::Arc;

use crate::authz::actor::{GroupActor, GroupDirectory, HasPermissions, UserActor};
use crate::authz::errors::AuthzError;
use crate::authz::source::source_for_path;
use crate::authz::types::Tri;
use crate::authz::PermissionSchema;
use crate::settings::Permissions;

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Answers tri-state permission queries against a shared schema.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    schema: Arc<PermissionSchema>,
    max_depth: usize,
}

impl PermissionResolver {
    pub fn new(schema: Arc<PermissionSchema>) -> Self {
        Self {
            schema,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit on the number of groups a single resolution may visit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Load the configured schema and build a resolver around it.
    pub fn from_settings(settings: &Permissions) -> Result<Self, AuthzError> {
        let source = source_for_path(&settings.schema_path);
        let schema = PermissionSchema::load(&*source)?;
        Ok(Self {
            schema: Arc::new(schema),
            max_depth: settings.max_depth,
        })
    }

    pub fn schema(&self) -> &PermissionSchema {
        &self.schema
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The actor's own value, without consulting any parent.
    pub fn own_value<A>(
        &self,
        actor: &A,
        permission: &str,
        operation: &str,
    ) -> Result<Tri, AuthzError>
    where
        A: HasPermissions + ?Sized,
    {
        let bit = self.schema.bit_index_of(permission, operation)?;
        actor.permission_bit(permission, bit)
    }

    /// Resolve `user`'s value, climbing its group chain while the value is
    /// unresolved. The nearest non-unresolved value wins. `Unresolved` is
    /// returned as-is when no group in the chain sets a value.
    ///
    /// A chain that reaches a group twice fails with `HierarchyCycle`. A chain
    /// longer than `max_depth` fails with `HierarchyTooDeep`, unless the parent
    /// links beyond the limit lead back into the chain: such a ring is still
    /// reported as `HierarchyCycle`. No permission is read past the limit.
    pub fn resolve<U, D>(
        &self,
        user: &U,
        groups: &D,
        permission: &str,
        operation: &str,
    ) -> Result<Tri, AuthzError>
    where
        U: UserActor + ?Sized,
        D: GroupDirectory + ?Sized,
    {
        let bit = self.schema.bit_index_of(permission, operation)?;

        let own = user.permission_bit(permission, bit)?;
        if own.is_resolved() {
            return Ok(own);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut chain: Vec<&str> = Vec::new();
        let mut current = user.group();
        let mut too_deep = false;

        while let Some(id) = current {
            if !visited.insert(id) {
                chain.push(id);
                let path = chain.join(" -> ");
                tracing::warn!(
                    permission,
                    operation,
                    chain = %path,
                    "group hierarchy cycle"
                );
                return Err(AuthzError::HierarchyCycle(path));
            }

            let group = groups
                .group(id)
                .ok_or_else(|| AuthzError::UnknownGroup(id.to_string()))?;
            chain.push(group.id());
            current = group.parent();

            if too_deep || chain.len() > self.max_depth {
                too_deep = true;
                continue;
            }

            let value = group.permission_bit(permission, bit)?;
            if value.is_resolved() {
                tracing::debug!(
                    permission,
                    operation,
                    group = group.id(),
                    %value,
                    "resolved from group"
                );
                return Ok(value);
            }
        }

        if too_deep {
            tracing::warn!(
                permission,
                operation,
                depth = chain.len(),
                limit = self.max_depth,
                "group hierarchy too deep"
            );
            return Err(AuthzError::HierarchyTooDeep {
                limit: self.max_depth,
            });
        }

        Ok(Tri::Unresolved)
    }

    /// Resolve every operation of `permission`, in declaration order.
    pub fn resolve_all<U, D>(
        &self,
        user: &U,
        groups: &D,
        permission: &str,
    ) -> Result<Vec<(String, Tri)>, AuthzError>
    where
        U: UserActor + ?Sized,
        D: GroupDirectory + ?Sized,
    {
        self.schema
            .operations_of(permission)?
            .into_iter()
            .map(|op| {
                let value = self.resolve(user, groups, permission, op)?;
                Ok((op.to_string(), value))
            })
            .collect()
    }
}
