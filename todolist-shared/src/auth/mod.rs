/// Authentication primitives
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: access/refresh token issuing and validation
/// - [`middleware`]: bearer-token request authentication yielding [`middleware::AuthContext`]

pub mod jwt;
pub mod middleware;
pub mod password;
