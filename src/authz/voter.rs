//! Authorization call site on top of the resolver.
//!
//! Attributes name a permission and one of its operations as
//! `permission.operation` (a leading `@` is accepted). Call sites that check
//! against a subject pass a short attribute instead, which is qualified with
//! the subject's permission prefix: on a part, `name.edit` means
//! `parts_name.edit` and `edit` means `parts.edit`. Anything the resolver
//! leaves unresolved is denied here.

use crate::authz::actor::{GroupDirectory, UserActor};
use crate::authz::engine::PermissionResolver;
use crate::authz::errors::AuthzError;
use crate::authz::types::Tri;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Granted,
    Denied,
    /// The attribute is not a known permission operation.
    Abstain,
}

/// Kind of object a call site checks a permission against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Part,
    User,
    Group,
    Category,
    Footprint,
    StoreLocation,
}

impl Subject {
    /// Name of the permission covering the subject as a whole.
    pub fn prefix(self) -> &'static str {
        match self {
            Subject::Part => "parts",
            Subject::User => "users",
            Subject::Group => "groups",
            Subject::Category => "categories",
            Subject::Footprint => "footprints",
            Subject::StoreLocation => "storelocations",
        }
    }
}

/// Qualify a subject-relative attribute: `field.op` becomes
/// `{prefix}_field.op`, a bare `op` becomes `{prefix}.op`.
pub fn scoped_attribute(subject: Subject, attribute: &str) -> String {
    let attribute = attribute.strip_prefix('@').unwrap_or(attribute);
    match attribute.split_once('.') {
        Some((field, operation)) => format!("{}_{field}.{operation}", subject.prefix()),
        None => format!("{}.{attribute}", subject.prefix()),
    }
}

/// Split `permission.operation` at its last dot.
pub fn parse_attribute(attribute: &str) -> Option<(&str, &str)> {
    let attribute = attribute.strip_prefix('@').unwrap_or(attribute);
    let (permission, operation) = attribute.rsplit_once('.')?;
    if permission.is_empty() || operation.is_empty() {
        return None;
    }
    Some((permission, operation))
}

pub struct PermissionVoter<'a, D: ?Sized> {
    resolver: &'a PermissionResolver,
    groups: &'a D,
}

impl<'a, D> PermissionVoter<'a, D>
where
    D: GroupDirectory + ?Sized,
{
    pub fn new(resolver: &'a PermissionResolver, groups: &'a D) -> Self {
        Self { resolver, groups }
    }

    pub fn supports(&self, attribute: &str) -> bool {
        self.target(attribute).is_some()
    }

    pub fn vote<U>(&self, user: &U, attribute: &str) -> Result<Vote, AuthzError>
    where
        U: UserActor + ?Sized,
    {
        let Some((permission, operation)) = self.target(attribute) else {
            return Ok(Vote::Abstain);
        };

        let vote = match self
            .resolver
            .resolve(user, self.groups, permission, operation)?
        {
            Tri::Allow => Vote::Granted,
            Tri::Disallow | Tri::Unresolved => Vote::Denied,
        };
        Ok(vote)
    }

    pub fn is_granted<U>(&self, user: &U, attribute: &str) -> Result<bool, AuthzError>
    where
        U: UserActor + ?Sized,
    {
        Ok(self.vote(user, attribute)? == Vote::Granted)
    }

    pub fn supports_on(&self, subject: Subject, attribute: &str) -> bool {
        self.supports(&scoped_attribute(subject, attribute))
    }

    /// Vote on an attribute relative to `subject`, see [`scoped_attribute`].
    pub fn vote_on<U>(
        &self,
        user: &U,
        subject: Subject,
        attribute: &str,
    ) -> Result<Vote, AuthzError>
    where
        U: UserActor + ?Sized,
    {
        self.vote(user, &scoped_attribute(subject, attribute))
    }

    pub fn is_granted_on<U>(
        &self,
        user: &U,
        subject: Subject,
        attribute: &str,
    ) -> Result<bool, AuthzError>
    where
        U: UserActor + ?Sized,
    {
        Ok(self.vote_on(user, subject, attribute)? == Vote::Granted)
    }

    fn target<'s>(&self, attribute: &'s str) -> Option<(&'s str, &'s str)> {
        let (permission, operation) = parse_attribute(attribute)?;
        let known = self
            .resolver
            .schema()
            .operations_of(permission)
            .map(|ops| ops.contains(&operation))
            .unwrap_or(false);
        known.then_some((permission, operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::actor::{directory, Group, User};
    use crate::authz::source::InlineSource;
    use crate::authz::PermissionSchema;
    use std::sync::Arc;

    fn resolver() -> PermissionResolver {
        let schema = PermissionSchema::load(&InlineSource::new(
            "inline",
            r#"
permission "parts" {
    operation "read" bit=0
    operation "edit" bit=2
}
permission "parts_name" {
    operation "read" bit=0
    operation "edit" bit=2
}
permission "users" {
    operation "read" bit=0
    operation "edit_username" bit=2
}
"#,
        ))
        .unwrap();
        PermissionResolver::new(Arc::new(schema))
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            parse_attribute("parts_name.edit"),
            Some(("parts_name", "edit"))
        );
        assert_eq!(
            parse_attribute("@parts_name.edit"),
            Some(("parts_name", "edit"))
        );
        assert_eq!(parse_attribute("a.b.c"), Some(("a.b", "c")));
        assert_eq!(parse_attribute("edit"), None);
        assert_eq!(parse_attribute(".edit"), None);
        assert_eq!(parse_attribute("parts_name."), None);
    }

    #[test]
    fn test_scoped_attribute() {
        assert_eq!(
            scoped_attribute(Subject::Part, "name.edit"),
            "parts_name.edit"
        );
        assert_eq!(scoped_attribute(Subject::Part, "@edit"), "parts.edit");
        assert_eq!(
            scoped_attribute(Subject::User, "edit_username"),
            "users.edit_username"
        );
        assert_eq!(
            scoped_attribute(Subject::StoreLocation, "move"),
            "storelocations.move"
        );
    }

    #[test]
    fn test_supports() {
        let r = resolver();
        let groups = directory([]);
        let voter = PermissionVoter::new(&r, &groups);
        assert!(voter.supports("parts_name.edit"));
        assert!(!voter.supports("parts_name.delete"));
        assert!(!voter.supports("users.edit"));
        assert!(!voter.supports("edit_username"));

        assert!(voter.supports_on(Subject::Part, "name.edit"));
        assert!(voter.supports_on(Subject::Part, "edit"));
        assert!(voter.supports_on(Subject::User, "edit_username"));
        assert!(!voter.supports_on(Subject::Part, "edit_username"));
        assert!(!voter.supports_on(Subject::Part, "lots.create"));
    }

    #[test]
    fn test_vote_unresolved_is_denied() {
        let r = resolver();
        let groups = directory([Group::new("everyone")]);
        let user = User::new("alice").in_group("everyone");
        let voter = PermissionVoter::new(&r, &groups);
        assert_eq!(voter.vote(&user, "parts_name.edit").unwrap(), Vote::Denied);
        assert!(!voter.is_granted(&user, "parts_name.edit").unwrap());
    }

    #[test]
    fn test_vote_inherited_allow_is_granted() {
        let r = resolver();
        let mut everyone = Group::new("everyone");
        everyone
            .permissions
            .set_operation(r.schema(), "parts_name", "read", Tri::Allow)
            .unwrap();
        let groups = directory([everyone]);
        let user = User::new("alice").in_group("everyone");
        let voter = PermissionVoter::new(&r, &groups);
        assert_eq!(
            voter.vote(&user, "@parts_name.read").unwrap(),
            Vote::Granted
        );
        assert!(voter.is_granted(&user, "parts_name.read").unwrap());
    }

    #[test]
    fn test_vote_on_subject() {
        let r = resolver();
        let mut staff = Group::new("staff");
        staff
            .permissions
            .set_operation(r.schema(), "parts_name", "edit", Tri::Allow)
            .unwrap();
        staff
            .permissions
            .set_operation(r.schema(), "parts", "edit", Tri::Disallow)
            .unwrap();
        staff
            .permissions
            .set_operation(r.schema(), "users", "edit_username", Tri::Allow)
            .unwrap();
        let groups = directory([staff]);
        let user = User::new("alice").in_group("staff");
        let voter = PermissionVoter::new(&r, &groups);

        assert_eq!(
            voter.vote_on(&user, Subject::Part, "name.edit").unwrap(),
            Vote::Granted
        );
        assert_eq!(
            voter.vote_on(&user, Subject::Part, "edit").unwrap(),
            Vote::Denied
        );
        assert!(voter
            .is_granted_on(&user, Subject::User, "edit_username")
            .unwrap());
        assert_eq!(
            voter.vote_on(&user, Subject::Part, "edit_username").unwrap(),
            Vote::Abstain
        );
    }

    #[test]
    fn test_vote_unknown_attribute_abstains() {
        let r = resolver();
        let groups = directory([]);
        let user = User::new("alice");
        let voter = PermissionVoter::new(&r, &groups);
        assert_eq!(voter.vote(&user, "edit_username").unwrap(), Vote::Abstain);
        assert!(!voter.is_granted(&user, "footprints.read").unwrap());
    }

    #[test]
    fn test_vote_propagates_cycle() {
        let r = resolver();
        let groups = directory([
            Group::new("a").with_parent("b"),
            Group::new("b").with_parent("a"),
        ]);
        let user = User::new("alice").in_group("a");
        let voter = PermissionVoter::new(&r, &groups);
        assert!(matches!(
            voter.vote(&user, "parts_name.edit").unwrap_err(),
            AuthzError::HierarchyCycle(_)
        ));
    }
}
