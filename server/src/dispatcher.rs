//! Maps request lines onto server operations
//!
//! The supported commands live in a fixed table. Each entry names the
//! command, the number of arguments it takes (not counting the caller, which
//! the connection supplies), whether the caller must be logged in, and the
//! handler that runs it. Every outcome, success or failure, comes back as a
//! single [`Reply`]; nothing is reported to the connection as an error.

use crate::error::CommandError;
use crate::state::ServerState;
use shared::protocol::{
    split_request, CMD_ADD, CMD_KILL, CMD_LIST, CMD_LOGIN, CMD_REGISTER, CMD_RESUME, CMD_START,
    CMD_STOP, CMD_WATCH,
};
use shared::ANONYMOUS_USER;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Response to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Set when the request authenticated the connection as this user
    pub authenticated: Option<String>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            authenticated: None,
        }
    }

    pub fn authenticated(user: &str, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            authenticated: Some(user.to_string()),
        }
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Self::text(err.to_string())
    }
}

impl From<Result<String, CommandError>> for Reply {
    fn from(result: Result<String, CommandError>) -> Self {
        match result {
            Ok(text) => Self::text(text),
            Err(err) => Self::from(err),
        }
    }
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Reply> + Send + 'a>>;

/// Runs one command with its already arity-checked arguments
pub type Handler = for<'a> fn(&'a ServerState, &'a str, &'a [&'a str]) -> HandlerFuture<'a>;

pub struct CommandSpec {
    pub name: &'static str,
    pub arity: usize,
    pub requires_login: bool,
    handler: Handler,
}

static COMMANDS: [CommandSpec; 9] = [
    CommandSpec {
        name: CMD_REGISTER,
        arity: 2,
        requires_login: false,
        handler: handle_register,
    },
    CommandSpec {
        name: CMD_LOGIN,
        arity: 2,
        requires_login: false,
        handler: handle_login,
    },
    CommandSpec {
        name: CMD_ADD,
        arity: 1,
        requires_login: true,
        handler: handle_add,
    },
    CommandSpec {
        name: CMD_START,
        arity: 2,
        requires_login: true,
        handler: handle_start,
    },
    CommandSpec {
        name: CMD_RESUME,
        arity: 1,
        requires_login: true,
        handler: handle_resume,
    },
    CommandSpec {
        name: CMD_STOP,
        arity: 1,
        requires_login: true,
        handler: handle_stop,
    },
    CommandSpec {
        name: CMD_KILL,
        arity: 1,
        requires_login: true,
        handler: handle_kill,
    },
    CommandSpec {
        name: CMD_WATCH,
        arity: 1,
        requires_login: false,
        handler: handle_watch,
    },
    CommandSpec {
        name: CMD_LIST,
        arity: 0,
        requires_login: false,
        handler: handle_list,
    },
];

/// Every command the server understands
pub fn commands() -> &'static [CommandSpec] {
    &COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

fn handle_register<'a>(
    state: &'a ServerState,
    _caller: &'a str,
    args: &'a [&'a str],
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let (username, password) = (args[0], args[1]);
        match state.register(username, password).await {
            Ok(text) => Reply::authenticated(username, text),
            Err(err) => Reply::from(err),
        }
    })
}

fn handle_login<'a>(
    state: &'a ServerState,
    _caller: &'a str,
    args: &'a [&'a str],
) -> HandlerFuture<'a> {
    Box::pin(async move {
        let (username, password) = (args[0], args[1]);
        match state.login(username, password).await {
            Ok(text) => Reply::authenticated(username, text),
            Err(err) => Reply::from(err),
        }
    })
}

fn handle_add<'a>(state: &'a ServerState, caller: &'a str, args: &'a [&'a str]) -> HandlerFuture<'a> {
    Box::pin(async move { state.add(caller, args[0]).await.into() })
}

fn handle_start<'a>(
    state: &'a ServerState,
    caller: &'a str,
    args: &'a [&'a str],
) -> HandlerFuture<'a> {
    Box::pin(async move { state.start(caller, args[0], args[1]).await.into() })
}

fn handle_resume<'a>(
    state: &'a ServerState,
    caller: &'a str,
    args: &'a [&'a str],
) -> HandlerFuture<'a> {
    Box::pin(async move { state.resume(caller, args[0]).await.into() })
}

fn handle_stop<'a>(state: &'a ServerState, caller: &'a str, args: &'a [&'a str]) -> HandlerFuture<'a> {
    Box::pin(async move { state.stop(caller, args[0]).await.into() })
}

fn handle_kill<'a>(state: &'a ServerState, caller: &'a str, args: &'a [&'a str]) -> HandlerFuture<'a> {
    Box::pin(async move { state.kill(caller, args[0]).await.into() })
}

fn handle_watch<'a>(
    state: &'a ServerState,
    _caller: &'a str,
    args: &'a [&'a str],
) -> HandlerFuture<'a> {
    Box::pin(async move { state.watch(args[0]).await.into() })
}

fn handle_list<'a>(
    state: &'a ServerState,
    _caller: &'a str,
    _args: &'a [&'a str],
) -> HandlerFuture<'a> {
    Box::pin(async move { Reply::text(state.list().await) })
}

/// Resolves request lines against the command table
#[derive(Clone)]
pub struct Dispatcher {
    state: Arc<ServerState>,
}

impl Dispatcher {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Runs `line` on behalf of `caller`
    pub async fn dispatch(&self, caller: &str, line: &str) -> Reply {
        let (name, args) = split_request(line);

        let spec = match find_command(name) {
            Some(spec) => spec,
            None => return CommandError::UnknownCommand(name.to_string()).into(),
        };

        if args.len() != spec.arity {
            return CommandError::ArityMismatch {
                command: name.to_string(),
                expected: spec.arity,
                got: args.len(),
            }
            .into();
        }

        if spec.requires_login && caller == ANONYMOUS_USER {
            return CommandError::NotLoggedIn.into();
        }

        (spec.handler)(&self.state, caller, &args).await
    }
}
