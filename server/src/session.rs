//! A single Game of Life session and its background tick loop
//!
//! A session moves between two states:
//!
//! - `Stopped`: the initial state. No task touches the engine.
//! - `Running`: a tokio task owns the tick loop and advances the engine once
//!   per tick interval.
//!
//! The handle used to stop the loop only exists inside
//! [`SessionState::Running`], so a stop signal can never be sent to a loop
//! that is not running. [`Session::stop`] waits for the loop task to finish
//! before reporting the session as stopped.
//!
//! The engine sits behind an `RwLock`: the loop takes the write half for each
//! generation and [`Session::render`] takes the read half, so a rendered
//! board is always one complete generation.

use crate::error::CommandError;
use chrono::{DateTime, Local};
use log::{debug, error, info};
use shared::Life;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const CREATED_AT_FORMAT: &str = "%a %b %-d %Y %H:%M";

/// Control handle for a running tick loop
#[derive(Debug)]
struct TickLoop {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// A tick loop that has been told to stop but may not have exited yet
#[derive(Debug)]
pub struct StoppingLoop {
    session: String,
    handle: JoinHandle<()>,
}

impl StoppingLoop {
    /// Waits until the loop task has exited
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            error!("Tick loop for session {} ended abnormally: {}", self.session, e);
        }
        info!("Session {} stopped", self.session);
    }
}

#[derive(Debug)]
enum SessionState {
    Stopped,
    Running(TickLoop),
}

/// Listing entry for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub name: String,
    pub created_at: DateTime<Local>,
    pub running: bool,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session {}, created at {}, {}",
            self.name,
            self.created_at.format(CREATED_AT_FORMAT),
            if self.running { "running" } else { "stopped" }
        )
    }
}

#[derive(Debug)]
pub struct Session {
    name: String,
    /// Name of the owning user in the credential store
    owner: String,
    created_at: DateTime<Local>,
    tick_interval: Duration,
    engine: Option<Arc<RwLock<Life>>>,
    state: SessionState,
}

impl Session {
    pub fn new(name: &str, owner: &str, tick_interval: Duration) -> Self {
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            created_at: Local::now(),
            tick_interval,
            engine: None,
            state: SessionState::Stopped,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Running(_))
    }

    pub fn authorize(&self, user: &str) -> bool {
        self.owner == user
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            name: self.name.clone(),
            created_at: self.created_at,
            running: self.is_running(),
        }
    }

    /// Installs `engine` and begins ticking it
    ///
    /// Replaces any engine left over from an earlier run.
    pub fn start(&mut self, engine: Life) -> Result<(), CommandError> {
        if self.is_running() {
            return Err(CommandError::AlreadyRunning(self.name.clone()));
        }

        let engine = Arc::new(RwLock::new(engine));
        self.engine = Some(Arc::clone(&engine));
        self.spawn_tick_loop(engine);
        info!("Session {} started", self.name);
        Ok(())
    }

    /// Continues ticking the engine from where the last run stopped
    pub fn resume(&mut self) -> Result<(), CommandError> {
        if self.is_running() {
            return Err(CommandError::AlreadyRunning(self.name.clone()));
        }
        let engine = self
            .engine
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| CommandError::NotStarted(self.name.clone()))?;

        self.spawn_tick_loop(engine);
        info!("Session {} resumed", self.name);
        Ok(())
    }

    /// Signals the tick loop to stop and marks the session stopped
    ///
    /// The loop may still be finishing its current generation; join the
    /// returned handle before reporting the stop.
    pub fn halt(&mut self) -> Result<StoppingLoop, CommandError> {
        let tick_loop = match std::mem::replace(&mut self.state, SessionState::Stopped) {
            SessionState::Running(tick_loop) => tick_loop,
            SessionState::Stopped => return Err(CommandError::AlreadyStopped(self.name.clone())),
        };

        // The receiver is gone only if the task already ended
        let _ = tick_loop.stop.send(());
        Ok(StoppingLoop {
            session: self.name.clone(),
            handle: tick_loop.handle,
        })
    }

    /// Stops the tick loop and waits until it has exited
    pub async fn stop(&mut self) -> Result<(), CommandError> {
        self.halt()?.join().await;
        Ok(())
    }

    /// Renders the current generation
    pub async fn render(&self) -> Result<String, CommandError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| CommandError::NotStarted(self.name.clone()))?;
        Ok(engine.read().await.render())
    }

    /// Generation counter of the engine, if the session was ever started
    pub async fn generation(&self) -> Option<u64> {
        match &self.engine {
            Some(engine) => Some(engine.read().await.generation()),
            None => None,
        }
    }

    fn spawn_tick_loop(&mut self, engine: Arc<RwLock<Life>>) {
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run_tick_loop(
            self.name.clone(),
            engine,
            stop_rx,
            self.tick_interval,
        ));
        self.state = SessionState::Running(TickLoop {
            stop: stop_tx,
            handle,
        });
    }
}

/// Advances `engine` once per `period` until told to stop
///
/// Dropping the sender also ends the loop, so a session that is dropped
/// while running does not leak its task.
async fn run_tick_loop(
    name: String,
    engine: Arc<RwLock<Life>>,
    mut stop: oneshot::Receiver<()>,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = &mut stop => break,

            _ = ticker.tick() => {
                let mut life = engine.write().await;
                life.step();
                debug!("Session {} advanced to generation {}", name, life.generation());
            }
        }
    }

    debug!("Tick loop for session {} exited", name);
}
