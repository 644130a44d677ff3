//! The server's collection of sessions, keyed by session name
//!
//! Sessions live in a plain vector. Removal swaps the last session into the
//! freed slot, so listing order is not stable across removals.

use crate::error::CommandError;
use crate::session::{Session, SessionSummary};
use log::info;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stopped session owned by `owner`
    pub fn add(
        &mut self,
        owner: &str,
        name: &str,
        tick_interval: Duration,
    ) -> Result<&Session, CommandError> {
        if self.lookup(name).is_some() {
            return Err(CommandError::SessionExists(name.to_string()));
        }

        self.sessions.push(Session::new(name, owner, tick_interval));
        info!("User {} created session {}", owner, name);
        Ok(&self.sessions[self.sessions.len() - 1])
    }

    /// Position of the session called `name`
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.sessions.iter().position(|session| session.name() == name)
    }

    pub fn get(&self, name: &str) -> Result<&Session, CommandError> {
        self.sessions
            .iter()
            .find(|session| session.name() == name)
            .ok_or_else(|| CommandError::NoSuchSession(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Session, CommandError> {
        self.sessions
            .iter_mut()
            .find(|session| session.name() == name)
            .ok_or_else(|| CommandError::NoSuchSession(name.to_string()))
    }

    /// Removes a stopped session
    ///
    /// Running sessions must be stopped first; removing one is refused.
    pub fn remove(&mut self, name: &str) -> Result<Session, CommandError> {
        let index = self
            .lookup(name)
            .ok_or_else(|| CommandError::NoSuchSession(name.to_string()))?;

        if self.sessions[index].is_running() {
            return Err(CommandError::AlreadyRunning(name.to_string()));
        }

        Ok(self.sessions.swap_remove(index))
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(Session::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
