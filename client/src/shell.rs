//! Interactive command loop
//!
//! Lines typed by the user are checked against a local command table, then
//! either handled locally (`connect`, `logout`, `exit`, ...) or forwarded to
//! the server as one request frame. The shell remembers which user the
//! connection is logged in as and refuses privileged commands locally while
//! nobody is.

use crate::input::Console;
use crate::network::{reconnect, Connection, RetryPolicy};
use crate::rendering::{watch_frame, CLEAR_SCREEN};
use log::{info, warn};
use shared::protocol::{
    join_request, split_request, CMD_ADD, CMD_KILL, CMD_LIST, CMD_LOGIN, CMD_REGISTER, CMD_RESUME,
    CMD_START, CMD_STOP, CMD_WATCH,
};
use shared::ANONYMOUS_USER;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::time::{interval, MissedTickBehavior};

pub const NOT_CONNECTED: &str = "not connected to server";
pub const NOT_LOGGED_IN: &str = "not logged in";
pub const CONNECTION_LOST: &str = "connection to the server has been lost";

const CMD_CONNECT: &str = "connect";
const CMD_DISCONNECT: &str = "disconnect";
const CMD_LOGOUT: &str = "logout";
const CMD_EXIT: &str = "exit";

/// Commands the shell accepts and how many arguments each takes
pub const LOCAL_COMMANDS: [(&str, usize); 13] = [
    (CMD_CONNECT, 1),
    (CMD_DISCONNECT, 0),
    (CMD_REGISTER, 1),
    (CMD_LOGIN, 1),
    (CMD_LOGOUT, 0),
    (CMD_ADD, 1),
    (CMD_START, 2),
    (CMD_RESUME, 1),
    (CMD_STOP, 1),
    (CMD_KILL, 1),
    (CMD_LIST, 0),
    (CMD_WATCH, 1),
    (CMD_EXIT, 0),
];

const PRIVILEGED: [&str; 5] = [CMD_ADD, CMD_START, CMD_RESUME, CMD_STOP, CMD_KILL];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Exit,
}

pub struct Shell<R, W> {
    console: Console<R, W>,
    /// Address used by `connect` last, and by reconnects
    server: String,
    connection: Option<Connection>,
    logged_as: String,
    policy: RetryPolicy,
    watch_interval: Duration,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(console: Console<R, W>, server: &str, policy: RetryPolicy) -> Self {
        Self {
            console,
            server: server.to_string(),
            connection: None,
            logged_as: ANONYMOUS_USER.to_string(),
            policy,
            watch_interval: Duration::from_secs(1),
        }
    }

    pub fn with_watch_interval(mut self, watch_interval: Duration) -> Self {
        self.watch_interval = watch_interval;
        self
    }

    pub fn logged_as(&self) -> &str {
        &self.logged_as
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    /// Reads and runs commands until `exit`, end of input or Ctrl-C
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            self.console.write("> ").await?;
            let line = tokio::select! {
                line = self.console.read_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else { break };

            match self.execute(line.trim()).await? {
                Outcome::Reply(text) => self.console.println(&text).await?,
                Outcome::Exit => break,
            }
        }

        self.disconnect();
        Ok(())
    }

    /// Runs a single command line
    pub async fn execute(&mut self, line: &str) -> io::Result<Outcome> {
        let (name, args) = split_request(line);

        let arity = match LOCAL_COMMANDS.iter().find(|(command, _)| *command == name) {
            Some((_, arity)) => *arity,
            None => return Ok(Outcome::Reply(format!("{} is not a valid action", name))),
        };
        if args.len() != arity {
            return Ok(Outcome::Reply(format!(
                "wrong number of arguments passed to {}, expected {}, got {}",
                name,
                arity,
                args.len()
            )));
        }

        if PRIVILEGED.contains(&name) && self.logged_as == ANONYMOUS_USER {
            return Ok(Outcome::Reply(NOT_LOGGED_IN.to_string()));
        }

        let reply = match name {
            CMD_CONNECT => self.connect(args[0]).await,
            CMD_DISCONNECT => self.disconnect(),
            CMD_REGISTER => self.register(args[0]).await?,
            CMD_LOGIN => self.login(args[0]).await?,
            CMD_LOGOUT => self.logout().await,
            CMD_WATCH => self.watch(args[0], tokio::signal::ctrl_c()).await?,
            CMD_EXIT => return Ok(Outcome::Exit),
            _ => self.request(line).await,
        };
        Ok(Outcome::Reply(reply))
    }

    /// Replaces the current connection with one to `addr`
    pub async fn connect(&mut self, addr: &str) -> String {
        self.disconnect();
        self.server = addr.to_string();

        match Connection::connect(addr).await {
            Ok(connection) => {
                let peer = connection.peer_addr();
                self.connection = Some(connection);
                format!("connected to {}", peer)
            }
            Err(e) => {
                warn!("Failed to connect to {}: {}", addr, e);
                format!("failed to connect to {}: {}", addr, e)
            }
        }
    }

    pub fn disconnect(&mut self) -> String {
        self.logged_as = ANONYMOUS_USER.to_string();
        match self.connection.take() {
            Some(connection) => format!("disconnected from {}", connection.peer_addr()),
            None => NOT_CONNECTED.to_string(),
        }
    }

    async fn register(&mut self, username: &str) -> io::Result<String> {
        if username == ANONYMOUS_USER || username.is_empty() {
            return Ok(format!("user name {} not allowed", username));
        }
        let Some(password) = self.console.confirm_password().await? else {
            return Ok(String::new());
        };

        let reply = self
            .request(&join_request(CMD_REGISTER, &[username, &password]))
            .await;
        if reply == format!("registered user {}", username) {
            self.logged_as = username.to_string();
        }
        Ok(reply)
    }

    async fn login(&mut self, username: &str) -> io::Result<String> {
        let Some(password) = self.console.read_password("input password: ").await? else {
            return Ok(String::new());
        };

        let reply = self
            .request(&join_request(CMD_LOGIN, &[username, &password]))
            .await;
        if reply == format!("user {} logged in", username) {
            self.logged_as = username.to_string();
        }
        Ok(reply)
    }

    /// Forgets the login; the server only forgets it with a fresh connection
    async fn logout(&mut self) -> String {
        if self.logged_as == ANONYMOUS_USER {
            return NOT_LOGGED_IN.to_string();
        }

        let user = std::mem::replace(&mut self.logged_as, ANONYMOUS_USER.to_string());
        if self.connection.is_some() {
            let server = self.server.clone();
            let status = self.connect(&server).await;
            info!("Logged out {}: {}", user, status);
        }
        format!("user {} logged out", user)
    }

    /// Redraws the board of `session` every watch interval until `stop` resolves
    pub async fn watch<F: Future>(&mut self, session: &str, stop: F) -> io::Result<String> {
        if self.connection.is_none() {
            return Ok(NOT_CONNECTED.to_string());
        }

        tokio::pin!(stop);
        let request = join_request(CMD_WATCH, &[session]);
        let mut ticker = interval(self.watch_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    let board = self.request(&request).await;
                    self.console.write(&watch_frame(session, &board)).await?;
                    if self.connection.is_none() {
                        return Ok(board);
                    }
                }
            }
        }

        self.console.write(CLEAR_SCREEN).await?;
        Ok(format!("stopped watching {}", session))
    }

    /// Sends `line` to the server, reconnecting if the connection is lost
    async fn request(&mut self, line: &str) -> String {
        let Some(connection) = self.connection.as_mut() else {
            return NOT_CONNECTED.to_string();
        };

        match connection.request(line).await {
            Ok(Some(reply)) => reply,
            Ok(None) => self.connection_lost().await,
            Err(e) => {
                warn!("Request to {} failed: {}", self.server, e);
                self.connection_lost().await
            }
        }
    }

    async fn connection_lost(&mut self) -> String {
        self.connection = None;
        self.logged_as = ANONYMOUS_USER.to_string();

        self.connection = reconnect(&self.server, &self.policy).await;
        match &self.connection {
            Some(connection) => format!("{}, reconnected to {}", CONNECTION_LOST, connection.peer_addr()),
            None => format!("{}, giving up on {}", CONNECTION_LOST, self.server),
        }
    }
}
