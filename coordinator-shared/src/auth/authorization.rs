/// Authorization helpers and permission checks
///
/// Two kinds of checks exist:
///
/// 1. **Account type**: some actions are reserved to certain account types,
///    e.g. only producers and studios create projects.
/// 2. **Ownership / participation**: the caller must own the resource (project
///    creator, payer, message recipient, ...) or take part in it.
///
/// # Example
///
/// ```
/// use coordinator_shared::auth::authorization::{require_owner, require_user_type};
/// use coordinator_shared::auth::middleware::AuthContext;
/// use coordinator_shared::models::user::UserType;
/// use uuid::Uuid;
///
/// let auth = AuthContext::new(Uuid::new_v4(), UserType::Producer);
///
/// assert!(require_user_type(&auth, &[UserType::Producer, UserType::Studio]).is_ok());
/// assert!(require_owner(&auth, Uuid::new_v4()).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserType;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    /// Caller's account type may not perform the action
    #[error("Account type '{actual}' cannot perform this action")]
    WrongUserType { actual: UserType },

    /// Caller doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotOwner,

    /// Caller neither owns nor takes part in the resource
    #[error("Not a participant of this resource")]
    NotParticipant,
}

/// Account types allowed to organize projects and sessions
pub const ORGANIZER_TYPES: &[UserType] = &[UserType::Producer, UserType::Studio];

/// Requires the caller's account type to be one of `allowed`
pub fn require_user_type(auth: &AuthContext, allowed: &[UserType]) -> Result<(), AuthzError> {
    if !allowed.contains(&auth.user_type) {
        return Err(AuthzError::WrongUserType {
            actual: auth.user_type,
        });
    }

    Ok(())
}

/// Requires the caller to be `owner_id`
pub fn require_owner(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != owner_id {
        return Err(AuthzError::NotOwner);
    }

    Ok(())
}

/// Requires the caller to be one of `participants`
pub fn require_participant(auth: &AuthContext, participants: &[Uuid]) -> Result<(), AuthzError> {
    if !participants.contains(&auth.user_id) {
        return Err(AuthzError::NotParticipant);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_user_type() {
        let musician = AuthContext::new(Uuid::new_v4(), UserType::Musician);
        let studio = AuthContext::new(Uuid::new_v4(), UserType::Studio);

        assert_eq!(
            require_user_type(&musician, ORGANIZER_TYPES),
            Err(AuthzError::WrongUserType {
                actual: UserType::Musician
            })
        );
        assert!(require_user_type(&studio, ORGANIZER_TYPES).is_ok());
        assert!(require_user_type(&musician, &[UserType::Musician]).is_ok());
    }

    #[test]
    fn test_require_owner() {
        let user_id = Uuid::new_v4();
        let auth = AuthContext::new(user_id, UserType::Producer);

        assert!(require_owner(&auth, user_id).is_ok());
        assert_eq!(require_owner(&auth, Uuid::new_v4()), Err(AuthzError::NotOwner));
    }

    #[test]
    fn test_require_participant() {
        let user_id = Uuid::new_v4();
        let auth = AuthContext::new(user_id, UserType::Musician);

        assert!(require_participant(&auth, &[Uuid::new_v4(), user_id]).is_ok());
        assert_eq!(
            require_participant(&auth, &[Uuid::new_v4()]),
            Err(AuthzError::NotParticipant)
        );
        assert!(require_participant(&auth, &[]).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = AuthzError::WrongUserType {
            actual: UserType::Musician,
        };
        assert_eq!(err.to_string(), "Account type 'musician' cannot perform this action");
    }
}
