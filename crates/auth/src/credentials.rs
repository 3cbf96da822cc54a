//! Credential store and password verification

use std::collections::HashMap;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use medisecure_config::AuthConfig;
use medisecure_core::{Error, Result};

/// Pre-created demo accounts, mirroring the seeded doctor database.
const DEMO_USERS: &[(&str, &str)] = &[("abhimanyu", "doctor123"), ("dr_singh", "secure456")];

/// Username -> Argon2 hash mapping, loaded at process start.
pub struct CredentialStore {
    users: HashMap<String, String>,
    /// Hash verified for unknown usernames so lookup misses cost the same
    /// as a wrong password.
    dummy_hash: String,
}

impl CredentialStore {
    /// Build a store from pre-hashed entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        Ok(Self {
            users: entries.into_iter().collect(),
            dummy_hash: hash_password("placeholder-password")?,
        })
    }

    /// Build a store with the built-in demo doctors, hashing their passwords
    /// at startup.
    pub fn demo() -> Result<Self> {
        let mut users = HashMap::new();
        for (username, password) in DEMO_USERS {
            users.insert((*username).to_string(), hash_password(password)?);
        }
        tracing::info!(count = users.len(), "Loaded demo credential store");
        Self::from_entries(users)
    }

    /// Build a store from configuration; empty user list falls back to the
    /// demo accounts.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        if config.users.is_empty() {
            return Self::demo();
        }
        Self::from_entries(
            config
                .users
                .iter()
                .map(|u| (u.username.clone(), u.password_hash.clone())),
        )
    }

    /// Verify a submitted password.
    ///
    /// Returns false for both an unknown username and a wrong password;
    /// callers must not surface which case occurred.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let hash = self.users.get(username).unwrap_or(&self.dummy_hash);
        let known = self.users.contains_key(username);

        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(username, error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        let matched = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();

        matched && known
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::other(format!("Password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> CredentialStore {
        CredentialStore::from_entries([(
            "abhimanyu".to_string(),
            hash_password("doctor123").unwrap(),
        )])
        .unwrap()
    }

    #[test]
    fn test_correct_password() {
        let store = test_store();
        assert!(store.verify("abhimanyu", "doctor123"));
    }

    #[test]
    fn test_wrong_password() {
        let store = test_store();
        assert!(!store.verify("abhimanyu", "doctor124"));
    }

    #[test]
    fn test_unknown_user() {
        let store = test_store();
        assert!(!store.verify("nobody", "doctor123"));
    }

    #[test]
    fn test_demo_store() {
        let store = CredentialStore::demo().unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.verify("dr_singh", "secure456"));
        assert!(!store.verify("dr_singh", "secure457"));
    }
}
