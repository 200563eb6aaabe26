use std::fmt;

/// Server-level configuration for the operation framework.
///
/// Controls operation timeouts, session tokens, and password hashing cost.
#[derive(Clone)]
pub struct ServerConfig {
    /// Default timeout for operations in milliseconds.
    pub default_operation_timeout_ms: u64,
    /// HMAC secret used to sign session tokens.
    pub jwt_secret: String,
    /// Lifetime of an issued session token in seconds.
    pub token_ttl_secs: u64,
    /// Minimum accepted password length, in characters.
    pub min_password_len: usize,
    /// Argon2 memory cost in KiB.
    pub password_memory_kib: u32,
    /// Argon2 iteration count.
    pub password_iterations: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_operation_timeout_ms: 30_000,
            jwt_secret: String::new(),
            token_ttl_secs: 3_600,
            min_password_len: 8,
            password_memory_kib: 19_456,
            password_iterations: 2,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("default_operation_timeout_ms", &self.default_operation_timeout_ms)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("min_password_len", &self.min_password_len)
            .field("password_memory_kib", &self.password_memory_kib)
            .field("password_iterations", &self.password_iterations)
            .finish()
    }
}
