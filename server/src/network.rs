//! TCP front end: accepts connections and serves one request frame at a time
//!
//! Each connection runs in its own task and carries its own identity, which
//! starts out anonymous and changes whenever a `register` or `login` request
//! succeeds on that connection. A connection that fails or disconnects only
//! ends its own task.

use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::state::ServerState;
use log::{debug, error, info, warn};
use shared::protocol::{
    read_frame, split_request, write_frame, CMD_LOGIN, CMD_REGISTER, CMD_WATCH,
};
use shared::ANONYMOUS_USER;
use std::borrow::Cow;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::{TcpListener, ToSocketAddrs};

pub struct NetworkServer {
    listener: TcpListener,
    dispatcher: Dispatcher,
}

impl NetworkServer {
    pub async fn bind<A: ToSocketAddrs>(
        addr: A,
        state: Arc<ServerState>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            dispatcher: Dispatcher::new(state),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the task is dropped
    pub async fn run(self) -> io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                    }

                    let dispatcher = self.dispatcher.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, peer, dispatcher).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Serves requests from one client until it disconnects
pub async fn handle_connection<S>(stream: S, peer: SocketAddr, dispatcher: Dispatcher)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("Client connected from {}", peer);

    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut identity = ANONYMOUS_USER.to_string();

    loop {
        let request = match read_frame(&mut reader).await {
            Ok(Some(request)) => request,
            Ok(None) => break,
            Err(e) => {
                warn!("Dropping connection from {}: {}", peer, e);
                break;
            }
        };

        let reply = dispatcher.dispatch(&identity, &request).await;
        let outcome = reply.text.lines().next().unwrap_or_default();
        if is_watch(&request) {
            debug!("{} ({}) {} -> {}", peer, identity, request, outcome);
        } else {
            info!("{} ({}) {} -> {}", peer, identity, redact(&request), outcome);
        }

        if let Some(user) = reply.authenticated {
            identity = user;
        }

        if let Err(e) = write_frame(&mut write_half, &reply.text).await {
            warn!("Failed to reply to {}: {}", peer, e);
            break;
        }
    }

    info!("Client {} ({}) disconnected", peer, identity);
}

fn is_watch(request: &str) -> bool {
    split_request(request).0 == CMD_WATCH
}

/// Request text safe to write to the log
fn redact(request: &str) -> Cow<'_, str> {
    let (command, args) = split_request(request);
    if (command == CMD_REGISTER || command == CMD_LOGIN) && args.len() >= 2 {
        Cow::Owned(format!("{} {} ***", command, args[0]))
    } else {
        Cow::Borrowed(request)
    }
}
