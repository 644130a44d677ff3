//! Registered users and password checks
//!
//! Passwords are kept only as SHA-256 digests. Users are never removed; the
//! store lives as long as the server process.

use crate::error::CommandError;
use log::info;
use sha2::{Digest, Sha256};
use shared::ANONYMOUS_USER;
use std::collections::HashMap;

pub type PasswordDigest = [u8; 32];

fn digest(password: &str) -> PasswordDigest {
    Sha256::digest(password.as_bytes()).into()
}

/// A registered user
#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    password: PasswordDigest,
}

impl User {
    pub fn new(name: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            password: digest(password),
        }
    }

    /// Checks `password` against the stored digest
    pub fn verify(&self, password: &str) -> bool {
        self.password == digest(password)
    }
}

#[derive(Debug, Default)]
pub struct CredentialStore {
    users: HashMap<String, User>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, refusing names that are taken or reserved
    pub fn register(&mut self, name: &str, password: &str) -> Result<(), CommandError> {
        if name.is_empty() || name == ANONYMOUS_USER {
            return Err(CommandError::InvalidUserName(name.to_string()));
        }
        if self.users.contains_key(name) {
            return Err(CommandError::UserExists(name.to_string()));
        }

        self.users.insert(name.to_string(), User::new(name, password));
        info!("Registered user {}", name);
        Ok(())
    }

    pub fn authenticate(&self, name: &str, password: &str) -> Result<(), CommandError> {
        let user = self
            .users
            .get(name)
            .ok_or_else(|| CommandError::NoSuchUser(name.to_string()))?;

        if user.verify(password) {
            Ok(())
        } else {
            Err(CommandError::BadPassword(name.to_string()))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
