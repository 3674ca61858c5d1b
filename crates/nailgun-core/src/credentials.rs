//! Keystone login credentials.

use std::fmt;

/// Credentials exchanged with keystone for an auth token.
///
/// Holds the username, password and tenant (project) the token is scoped to.
/// Credentials are immutable once constructed.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use nailgun_core::Credentials;
///
/// let creds = Credentials::new("admin", "admin", "admin");
/// assert_eq!(creds.username(), "admin");
/// assert_eq!(creds.tenant_name(), "admin");
/// ```
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
    tenant_name: String,
}

impl Credentials {
    /// Create new credentials.
    ///
    /// # Arguments
    ///
    /// * `username` - The keystone user name
    /// * `password` - The user's password
    /// * `tenant_name` - The tenant (project) to scope the token to
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        tenant_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            tenant_name: tenant_name.into(),
        }
    }

    /// Returns the user name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing the auth exchange request.
    /// Never log or display this value.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the tenant (project) name.
    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }
}

// Intentionally hide password in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("tenant_name", &self.tenant_name)
            .finish()
    }
}
