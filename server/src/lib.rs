//! # Game of Life Session Server
//!
//! This library implements a multi-user server hosting independent Conway's
//! Game of Life simulations. Clients connect over TCP, register or log in,
//! create named sessions, start them from predefined grid configurations,
//! and watch the boards evolve while each session ticks on its own.
//!
//! ## Core Responsibilities
//!
//! ### Request Handling
//! Every request is one NUL-terminated text frame holding a command and its
//! space separated arguments. Every request gets exactly one text reply, and
//! failures are reported as ordinary replies rather than dropped connections.
//!
//! ### Session Lifecycle
//! Sessions belong to the user who created them. Only the owner may start,
//! resume, stop or kill a session, while anyone may list sessions or watch
//! a board. Stopping waits for the session's tick loop to exit, so a
//! stopped session never advances again until it is resumed.
//!
//! ### Credentials
//! Users are kept in memory with their passwords hashed. Nothing is
//! persisted across restarts.
//!
//! ## Architecture Design
//!
//! ### Task per Connection
//! The accept loop spawns one task per client connection. Each connection
//! remembers which user it is logged in as and supplies that identity to
//! the dispatcher; the wire requests never name the caller.
//!
//! ### Task per Running Session
//! Starting or resuming a session spawns a tick loop that advances the
//! engine once per tick interval. The loop listens on a oneshot channel for
//! its stop signal.
//!
//! ### Shared State
//! Users and sessions each sit behind a `tokio::sync::RwLock` inside
//! [`state::ServerState`], which all connection tasks share through an
//! `Arc`. Each session's engine has its own lock, so a watcher always reads
//! a complete generation.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Command line flags and the optional TOML settings file.
//!
//! ### Credentials Module (`credentials`)
//! Registration and password checks.
//!
//! ### Dispatcher Module (`dispatcher`)
//! The command table: names, argument counts, login requirements and the
//! handler for each command.
//!
//! ### Network Module (`network`)
//! TCP listener and the per-connection request loop.
//!
//! ### Registry and Session Modules (`registry`, `session`)
//! Named sessions, their owners and their tick loops.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::NetworkServer;
//! use server::state::ServerState;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = Arc::new(ServerState::new("predefined_configs", Duration::from_secs(1)));
//!     let server = NetworkServer::bind("127.0.0.1:8088", state).await?;
//!
//!     // Serves clients until the task is dropped
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod network;
pub mod registry;
pub mod session;
pub mod state;

pub use dispatcher::{Dispatcher, Reply};
pub use error::{CommandError, ServerError};
pub use network::NetworkServer;
pub use state::ServerState;
