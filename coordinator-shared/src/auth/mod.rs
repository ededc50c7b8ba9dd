/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: JWT access/refresh token generation and validation
/// - [`middleware`]: Axum middleware and the `AuthContext` extractor
/// - [`authorization`]: account-type and ownership checks
///
/// # Example
///
/// ```no_run
/// use coordinator_shared::auth::jwt::{create_token, Claims, TokenType};
/// use coordinator_shared::auth::password::{hash_password, verify_password};
/// use coordinator_shared::models::user::UserType;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password1")?;
/// assert!(verify_password("user_password1", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), UserType::Musician, TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
