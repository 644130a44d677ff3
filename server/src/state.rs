//! Shared server state and the operations requests are mapped onto
//!
//! Every operation returns the human readable response on success and a
//! [`CommandError`] describing the failure otherwise. Users and sessions sit
//! behind separate `RwLock`s because many connection tasks dispatch at once.

use crate::config::ServerConfig;
use crate::credentials::CredentialStore;
use crate::error::CommandError;
use crate::registry::SessionRegistry;
use log::info;
use shared::Life;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::RwLock;

pub struct ServerState {
    users: RwLock<CredentialStore>,
    sessions: RwLock<SessionRegistry>,
    configs_dir: PathBuf,
    tick_interval: Duration,
}

impl ServerState {
    pub fn new(configs_dir: impl Into<PathBuf>, tick_interval: Duration) -> Self {
        Self {
            users: RwLock::new(CredentialStore::new()),
            sessions: RwLock::new(SessionRegistry::new()),
            configs_dir: configs_dir.into(),
            tick_interval,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.configs_dir.clone(), config.tick_interval())
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<String, CommandError> {
        self.users.write().await.register(username, password)?;
        Ok(format!("registered user {}", username))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, CommandError> {
        self.users.read().await.authenticate(username, password)?;
        info!("User {} logged in", username);
        Ok(format!("user {} logged in", username))
    }

    /// Creates a stopped session owned by `caller`
    pub async fn add(&self, caller: &str, name: &str) -> Result<String, CommandError> {
        if !self.users.read().await.contains(caller) {
            return Err(CommandError::NoSuchUser(caller.to_string()));
        }

        self.sessions
            .write()
            .await
            .add(caller, name, self.tick_interval)?;
        Ok(format!("successfully created session {}", name))
    }

    /// Loads `config` into the session and starts it
    pub async fn start(
        &self,
        caller: &str,
        name: &str,
        config: &str,
    ) -> Result<String, CommandError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(name)?;
        if !session.authorize(caller) {
            return Err(CommandError::NotAuthorized(caller.to_string()));
        }
        if session.is_running() {
            return Err(CommandError::AlreadyRunning(name.to_string()));
        }

        let life = Life::load(&self.configs_dir, config)?;
        session.start(life)?;
        Ok(format!("successfully started session {}", name))
    }

    pub async fn resume(&self, caller: &str, name: &str) -> Result<String, CommandError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(name)?;
        if !session.authorize(caller) {
            return Err(CommandError::NotAuthorized(caller.to_string()));
        }

        session.resume()?;
        Ok(format!("successfully resumed session {}", name))
    }

    /// Stops the session and waits for its tick loop to exit
    ///
    /// The wait happens after the registry lock is released.
    pub async fn stop(&self, caller: &str, name: &str) -> Result<String, CommandError> {
        let stopping = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(name)?;
            if !session.authorize(caller) {
                return Err(CommandError::NotAuthorized(caller.to_string()));
            }
            session.halt()?
        };

        stopping.join().await;
        Ok(format!("session {} successfully stopped", name))
    }

    /// Stops the session if needed and removes it for good
    pub async fn kill(&self, caller: &str, name: &str) -> Result<String, CommandError> {
        let stopping = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(name)?;
            if !session.authorize(caller) {
                return Err(CommandError::NotAuthorized(caller.to_string()));
            }

            let stopping = if session.is_running() {
                Some(session.halt()?)
            } else {
                None
            };
            sessions.remove(name)?;
            stopping
        };

        if let Some(stopping) = stopping {
            stopping.join().await;
        }
        info!("Session {} killed by {}", name, caller);
        Ok(format!("session {} successfully killed", name))
    }

    /// Current board of a session; open to every caller
    pub async fn watch(&self, name: &str) -> Result<String, CommandError> {
        let sessions = self.sessions.read().await;
        sessions.get(name)?.render().await
    }

    pub async fn list(&self) -> String {
        let sessions = self.sessions.read().await;
        let summaries = sessions.list();

        let mut listing = String::new();
        for summary in &summaries {
            listing.push_str(&summary.to_string());
            listing.push('\n');
        }
        listing.push_str(&format!("{} total", summaries.len()));
        listing
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_running(&self, name: &str) -> Result<bool, CommandError> {
        Ok(self.sessions.read().await.get(name)?.is_running())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::sleep;

    const TEST_USER: &str = "test_user";
    const TEST_PASSWORD: &str = "1234";
    const TEST_SESSION: &str = "test_session0";
    const TICK: Duration = Duration::from_millis(10);

    /// Server with one user owning ten stopped sessions
    async fn test_server() -> (ServerState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blinker"), "3 3\n---\n***\n---\n").unwrap();
        fs::write(dir.path().join("broken"), "3 3\n---\n*o*\n---\n").unwrap();

        let state = ServerState::new(dir.path(), TICK);
        state.register(TEST_USER, TEST_PASSWORD).await.unwrap();
        for i in 0..10 {
            state
                .add(TEST_USER, &format!("test_session{}", i))
                .await
                .unwrap();
        }
        (state, dir)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (state, _dir) = test_server().await;

        assert_eq!(
            state.register("test_user1", "asdf").await.unwrap(),
            "registered user test_user1"
        );
        assert_eq!(
            state.register(TEST_USER, "asdf").await.unwrap_err().to_string(),
            "user test_user already exists"
        );
        assert_eq!(
            state.login(TEST_USER, TEST_PASSWORD).await.unwrap(),
            "user test_user logged in"
        );
        assert_eq!(
            state.login("test_userX", TEST_PASSWORD).await.unwrap_err().to_string(),
            "user test_userX does not exist"
        );
        assert_eq!(
            state.login(TEST_USER, "....").await.unwrap_err().to_string(),
            "invalid password for test_user"
        );
    }

    #[tokio::test]
    async fn test_add() {
        let (state, _dir) = test_server().await;
        assert_eq!(
            state.add(TEST_USER, "new_session").await.unwrap(),
            "successfully created session new_session"
        );
        assert_eq!(
            state.add(TEST_USER, TEST_SESSION).await.unwrap_err().to_string(),
            "session with the name test_session0 already exists"
        );
        assert_eq!(
            state.add("ghost", "ghost_session").await.unwrap_err(),
            CommandError::NoSuchUser("ghost".to_string())
        );
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let (state, _dir) = test_server().await;

        assert_eq!(
            state.start(TEST_USER, TEST_SESSION, "blinker").await.unwrap(),
            "successfully started session test_session0"
        );
        assert!(state.is_running(TEST_SESSION).await.unwrap());

        assert_eq!(
            state.start(TEST_USER, TEST_SESSION, "blinker").await.unwrap_err().to_string(),
            "session test_session0 is already running"
        );

        assert_eq!(
            state.stop(TEST_USER, TEST_SESSION).await.unwrap(),
            "session test_session0 successfully stopped"
        );
        assert!(!state.is_running(TEST_SESSION).await.unwrap());
        assert_eq!(
            state.stop(TEST_USER, TEST_SESSION).await.unwrap_err().to_string(),
            "session test_session0 is already stopped"
        );
    }

    #[tokio::test]
    async fn test_start_errors() {
        let (state, _dir) = test_server().await;

        assert_eq!(
            state.start(TEST_USER, "test_sessionX", "blinker").await.unwrap_err().to_string(),
            "no session with the name test_sessionX found"
        );
        assert_eq!(
            state.start("userX", TEST_SESSION, "blinker").await.unwrap_err().to_string(),
            "user userX not authorized"
        );
        assert_eq!(
            state.start(TEST_USER, TEST_SESSION, "asdf").await.unwrap_err().to_string(),
            "the configuration you specified does not exist"
        );
        assert!(matches!(
            state.start(TEST_USER, TEST_SESSION, "broken").await,
            Err(CommandError::InvalidConfig(_))
        ));
        assert!(!state.is_running(TEST_SESSION).await.unwrap());
    }

    #[tokio::test]
    async fn test_resume() {
        let (state, _dir) = test_server().await;

        assert_eq!(
            state.resume(TEST_USER, TEST_SESSION).await.unwrap_err().to_string(),
            "the session test_session0 has not been started"
        );

        state.start(TEST_USER, TEST_SESSION, "blinker").await.unwrap();
        sleep(TICK * 3).await;
        state.stop(TEST_USER, TEST_SESSION).await.unwrap();

        assert_eq!(
            state.resume(TEST_USER, TEST_SESSION).await.unwrap(),
            "successfully resumed session test_session0"
        );
        assert!(state.is_running(TEST_SESSION).await.unwrap());
        assert_eq!(
            state.resume(TEST_USER, TEST_SESSION).await.unwrap_err().to_string(),
            "session test_session0 is already running"
        );

        state.stop(TEST_USER, TEST_SESSION).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_owner_is_refused() {
        let (state, _dir) = test_server().await;
        state.register("mallory", "pw").await.unwrap();
        state.start(TEST_USER, TEST_SESSION, "blinker").await.unwrap();

        let refused = CommandError::NotAuthorized("mallory".to_string());
        assert_eq!(state.stop("mallory", TEST_SESSION).await.unwrap_err(), refused);
        assert_eq!(state.kill("mallory", TEST_SESSION).await.unwrap_err(), refused);
        assert_eq!(
            state.start("mallory", "test_session1", "blinker").await.unwrap_err(),
            refused
        );
        assert_eq!(state.resume("mallory", "test_session1").await.unwrap_err(), refused);
        assert!(state.is_running(TEST_SESSION).await.unwrap());

        // watching and listing are open to everyone
        assert!(state.watch(TEST_SESSION).await.is_ok());
        assert!(state.list().await.ends_with("10 total"));

        state.stop(TEST_USER, TEST_SESSION).await.unwrap();
    }

    #[tokio::test]
    async fn test_kill() {
        let (state, _dir) = test_server().await;

        assert_eq!(
            state.kill(TEST_USER, TEST_SESSION).await.unwrap(),
            "session test_session0 successfully killed"
        );
        assert_eq!(
            state.kill(TEST_USER, "no_session").await.unwrap_err().to_string(),
            "no session with the name no_session found"
        );
        assert_eq!(
            state.kill("no_user", "test_session1").await.unwrap_err().to_string(),
            "user no_user not authorized"
        );
        assert_eq!(state.session_count().await, 9);
    }

    #[tokio::test]
    async fn test_kill_running_session() {
        let (state, _dir) = test_server().await;
        state.start(TEST_USER, TEST_SESSION, "blinker").await.unwrap();

        assert_eq!(
            state.kill(TEST_USER, TEST_SESSION).await.unwrap(),
            "session test_session0 successfully killed"
        );
        assert_eq!(
            state.is_running(TEST_SESSION).await.unwrap_err(),
            CommandError::NoSuchSession(TEST_SESSION.to_string())
        );
    }

    #[tokio::test]
    async fn test_stop_does_not_block_other_sessions() {
        let (state, _dir) = test_server().await;
        state.start(TEST_USER, TEST_SESSION, "blinker").await.unwrap();
        state.start(TEST_USER, "test_session1", "blinker").await.unwrap();

        let (stopped, killed) = tokio::join!(
            state.stop(TEST_USER, TEST_SESSION),
            state.kill(TEST_USER, "test_session1"),
        );
        assert_eq!(stopped.unwrap(), "session test_session0 successfully stopped");
        assert_eq!(killed.unwrap(), "session test_session1 successfully killed");

        assert!(!state.is_running(TEST_SESSION).await.unwrap());
        assert!(state.list().await.ends_with("9 total"));
    }

    #[tokio::test]
    async fn test_watch() {
        let (state, _dir) = test_server().await;

        assert_eq!(
            state.watch(TEST_SESSION).await.unwrap_err().to_string(),
            "the session test_session0 has not been started"
        );
        assert_eq!(
            state.watch("missing").await.unwrap_err().to_string(),
            "no session with the name missing found"
        );

        state.start(TEST_USER, TEST_SESSION, "blinker").await.unwrap();
        state.stop(TEST_USER, TEST_SESSION).await.unwrap();
        assert_eq!(
            state.watch(TEST_SESSION).await.unwrap(),
            "         \n *  *  * \n         \n"
        );
    }

    #[tokio::test]
    async fn test_list() {
        let (state, _dir) = test_server().await;
        let listing = state.list().await;
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines.len(), 11);
        assert_eq!(lines[10], "10 total");
        assert!(lines[..10].iter().all(|line| line.starts_with("session test_session")));
    }

    #[tokio::test]
    async fn test_list_empty() {
        let state = ServerState::new("unused", TICK);
        assert_eq!(state.list().await, "0 total");
    }
}
