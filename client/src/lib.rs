//! # Game of Life Terminal Client
//!
//! This library provides a line-oriented terminal client for the Game of
//! Life session server. It reads commands from standard input, forwards the
//! ones the server understands as NUL-terminated request frames, and prints
//! each reply.
//!
//! ## Behaviour Overview
//!
//! ### Local Login Tracking
//! The client remembers which user the connection is logged in as. Commands
//! that change sessions (`add`, `start`, `resume`, `stop`, `kill`) are
//! refused locally with `not logged in` until a `register` or `login`
//! succeeds.
//!
//! ### Watching
//! `watch S` redraws the board of session `S` once per second until Ctrl-C.
//!
//! ### Reconnecting
//! When the server closes the connection the client reconnects with a
//! linear backoff, capped at ten seconds between attempts. A reconnected
//! client is logged out.
//!
//! ## Module Organization
//!
//! ### Input Module (`input`)
//! Reading command lines and passwords, with password confirmation.
//!
//! ### Network Module (`network`)
//! The TCP connection, request/reply exchange and the retry policy.
//!
//! ### Rendering Module (`rendering`)
//! Screen clearing and the watch view.
//!
//! ### Shell Module (`shell`)
//! The local command table and the interactive loop.

pub mod input;
pub mod network;
pub mod rendering;
pub mod shell;

pub use input::Console;
pub use network::{Connection, RetryPolicy};
pub use shell::{Outcome, Shell};
