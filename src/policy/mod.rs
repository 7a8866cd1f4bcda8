//! Visibility and ownership rules for blog resources.
//!
//! Reads are filtered through [`Visibility`]; mutations go through
//! [`authorize`]. Checks for update/delete run in a fixed order:
//! unauthenticated, then not-found (via visibility), then forbidden.

use thiserror::Error;

/// Identity resolved from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

/// Requester of an operation. Absent credentials mean `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(AuthUser),
}

impl Actor {
    pub fn user(user_id: i64, username: impl Into<String>) -> Self {
        Actor::User(AuthUser {
            user_id,
            username: username.into(),
        })
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Actor::Anonymous => None,
            Actor::User(user) => Some(user.user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }

    /// Identity string used in logs and audit records
    pub fn identity(&self) -> String {
        match self {
            Actor::Anonymous => "anonymous".to_string(),
            Actor::User(user) => format!("{}#{}", user.username, user.user_id),
        }
    }

    pub fn require_authenticated(&self) -> Result<&AuthUser, PolicyError> {
        match self {
            Actor::Anonymous => Err(PolicyError::Unauthenticated),
            Actor::User(user) => Ok(user),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn is_safe(self) -> bool {
        matches!(self, Action::Read)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error("You do not have permission to perform this action.")]
    Forbidden,
}

/// Decide whether `actor` may perform `action`.
///
/// `owner` is the author of the target instance, or `None` when the target
/// has no owner (categories) or does not exist yet (create). Visibility is
/// not checked here; callers resolve the instance through [`Visibility`]
/// first so hidden instances surface as not-found.
pub fn authorize(actor: &Actor, action: Action, owner: Option<i64>) -> Result<(), PolicyError> {
    if action.is_safe() {
        return Ok(());
    }

    let user = actor.require_authenticated()?;

    match (action, owner) {
        (Action::Create, _) => Ok(()),
        (_, Some(author)) if author != user.user_id => Err(PolicyError::Forbidden),
        _ => Ok(()),
    }
}

/// Read filter applied to collection and single-instance queries.
///
/// Stores must evaluate it as one predicate in the same query that orders
/// and pages the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Everything,
    Published,
    PublishedOrAuthoredBy(i64),
}

impl Visibility {
    /// Post filter: published posts, plus the requester's own drafts
    pub fn posts_for(actor: &Actor) -> Self {
        match actor.user_id() {
            None => Visibility::Published,
            Some(user_id) => Visibility::PublishedOrAuthoredBy(user_id),
        }
    }

    pub fn admits_post(&self, published: bool, author: i64) -> bool {
        match *self {
            Visibility::Everything => true,
            Visibility::Published => published,
            Visibility::PublishedOrAuthoredBy(user_id) => published || author == user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Actor {
        Actor::user(1, "alice")
    }

    #[test]
    fn reads_are_always_allowed() {
        assert!(authorize(&Actor::Anonymous, Action::Read, Some(1)).is_ok());
        assert!(authorize(&alice(), Action::Read, Some(2)).is_ok());
    }

    #[test]
    fn anonymous_mutations_are_unauthenticated_before_ownership() {
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert_eq!(
                authorize(&Actor::Anonymous, action, Some(1)),
                Err(PolicyError::Unauthenticated)
            );
            assert_eq!(
                authorize(&Actor::Anonymous, action, None),
                Err(PolicyError::Unauthenticated)
            );
        }
    }

    #[test]
    fn create_needs_no_ownership() {
        assert!(authorize(&alice(), Action::Create, None).is_ok());
        assert!(authorize(&alice(), Action::Create, Some(99)).is_ok());
    }

    #[test]
    fn owned_instances_only_mutable_by_author() {
        assert!(authorize(&alice(), Action::Update, Some(1)).is_ok());
        assert!(authorize(&alice(), Action::Delete, Some(1)).is_ok());
        assert_eq!(authorize(&alice(), Action::Update, Some(2)), Err(PolicyError::Forbidden));
        assert_eq!(authorize(&alice(), Action::Delete, Some(2)), Err(PolicyError::Forbidden));
    }

    #[test]
    fn unowned_instances_mutable_by_any_user() {
        assert!(authorize(&alice(), Action::Update, None).is_ok());
        assert!(authorize(&alice(), Action::Delete, None).is_ok());
    }

    #[test]
    fn post_visibility_is_published_or_own() {
        let anonymous = Visibility::posts_for(&Actor::Anonymous);
        assert_eq!(anonymous, Visibility::Published);
        assert!(anonymous.admits_post(true, 1));
        assert!(!anonymous.admits_post(false, 1));

        let own = Visibility::posts_for(&alice());
        assert_eq!(own, Visibility::PublishedOrAuthoredBy(1));
        assert!(own.admits_post(true, 2));
        assert!(own.admits_post(false, 1));
        assert!(!own.admits_post(false, 2));

        assert!(Visibility::Everything.admits_post(false, 2));
    }

    #[test]
    fn identity_strings() {
        assert_eq!(Actor::Anonymous.identity(), "anonymous");
        assert_eq!(alice().identity(), "alice#1");
    }
}
