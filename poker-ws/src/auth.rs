use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
}

/// Verifies a bearer token and resolves it to a user id. Real JWT
/// verification lives outside this crate's scope; this trait is the seam a
/// production auth stack plugs into.
pub trait AuthProvider: Send + Sync {
    fn verify(&self, token: &str) -> Result<u64, AuthError>;
}

/// Treats the token text as the decimal user id. Suitable for local runs and
/// tests, standing in for a real verifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticAuthProvider;

impl AuthProvider for StaticAuthProvider {
    fn verify(&self, token: &str) -> Result<u64, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        token.parse().map_err(|_| AuthError::InvalidToken)
    }
}
