//! Default administrator configuration from environment variables.
//!
//! `DEFAULT_ADMIN_USERNAME`, `DEFAULT_ADMIN_EMAIL` and `DEFAULT_ADMIN_PASSWORD`
//! must all be set and non-empty for a bootstrap admin to be created.

/// Environment variable holding the admin username
pub const ADMIN_USERNAME_ENV: &str = "DEFAULT_ADMIN_USERNAME";
/// Environment variable holding the admin email
pub const ADMIN_EMAIL_ENV: &str = "DEFAULT_ADMIN_EMAIL";
/// Environment variable holding the admin password
pub const ADMIN_PASSWORD_ENV: &str = "DEFAULT_ADMIN_PASSWORD";

/// Credentials for the bootstrap administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
    /// Plain-text password, hashed before storage
    pub password: String,
}

/// Builds credentials from an arbitrary variable lookup.
///
/// Returns `None` if any of the three values is missing or empty.
pub fn credentials_from<F>(lookup: F) -> Option<AdminCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

    Some(AdminCredentials {
        username: non_empty(ADMIN_USERNAME_ENV)?,
        email: non_empty(ADMIN_EMAIL_ENV)?,
        password: non_empty(ADMIN_PASSWORD_ENV)?,
    })
}

/// Reads the bootstrap admin credentials from the process environment.
#[must_use]
pub fn admin_credentials_from_env() -> Option<AdminCredentials> {
    credentials_from(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| vars.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn test_all_variables_present() {
        let vars = HashMap::from([
            (ADMIN_USERNAME_ENV, "admin"),
            (ADMIN_EMAIL_ENV, "admin@example.com"),
            (ADMIN_PASSWORD_ENV, "secret-pass"),
        ]);
        let creds = credentials_from(lookup(&vars));
        assert_eq!(
            creds.map(|c| c.username),
            Some("admin".to_string())
        );
    }

    #[test]
    fn test_missing_or_empty_variable_skips() {
        let missing = HashMap::from([(ADMIN_USERNAME_ENV, "admin"), (ADMIN_EMAIL_ENV, "a@b.c")]);
        assert!(credentials_from(lookup(&missing)).is_none());

        let empty = HashMap::from([
            (ADMIN_USERNAME_ENV, "admin"),
            (ADMIN_EMAIL_ENV, ""),
            (ADMIN_PASSWORD_ENV, "secret-pass"),
        ]);
        assert!(credentials_from(lookup(&empty)).is_none());
    }
}
