//! Session identity passed explicitly into every component.
//!
//! The identity provider itself is external; this module only defines
//! the shape of what it hands to core and the transitions it reports.

use crate::model::user::{NormalizedEmail, UserId};
use crate::model::validation::ValidationError;

/// Signed-in user: stable id plus verified, normalized email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub email: NormalizedEmail,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, email: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: UserId::new(id),
            email: NormalizedEmail::parse(email)?,
        })
    }
}

/// Sign-in state transition reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(SessionUser),
    SignedOut,
}

impl AuthEvent {
    /// Maps "current user or nobody" into a transition event.
    pub fn from_session(user: Option<SessionUser>) -> Self {
        match user {
            Some(user) => Self::SignedIn(user),
            None => Self::SignedOut,
        }
    }
}

/// Source of the active session.
pub trait IdentityProvider {
    /// The signed-in user, or `None` when signed out.
    fn current_user(&self) -> Option<SessionUser>;
}

#[cfg(test)]
mod tests {
    use super::{AuthEvent, SessionUser};

    #[test]
    fn session_user_normalizes_email() {
        let user = SessionUser::new("u1", "  Owner@Example.COM").unwrap();
        assert_eq!(user.email.as_str(), "owner@example.com");
        assert_eq!(user.id.as_str(), "u1");
    }

    #[test]
    fn from_session_maps_absence_to_signed_out() {
        assert_eq!(AuthEvent::from_session(None), AuthEvent::SignedOut);
    }
}
