//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! SSH listener
//!
//! Any username is accepted with any password or with no authentication at
//! all. The first `session` channel the client opens becomes the session's
//! transport; PTY and shell requests are simply acknowledged.

use super::{ACCEPT_BACKOFF, serve};
use crate::config::SshConfig;
use crate::context::ServerContext;
use crate::transport::SshTransport;
use async_trait::async_trait;
use russh::server::{Auth, Config, Handler, Msg, Session as SshSession};
use russh::{Channel, ChannelId, Disconnect, MethodSet, Pty};
use russh_keys::key::KeyPair;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// SSH server
pub struct SshServer {
    context: ServerContext,
    config: Arc<Config>,
    channel_timeout: Duration,
}

impl SshServer {
    /// Create a new SSH server presenting `host_key`
    pub fn new(context: ServerContext, host_key: KeyPair, settings: &SshConfig) -> Self {
        let config = Config {
            keys: vec![host_key],
            methods: MethodSet::NONE | MethodSet::PASSWORD,
            auth_rejection_time: Duration::from_millis(250),
            auth_rejection_time_initial: Some(Duration::ZERO),
            inactivity_timeout: settings.inactivity_timeout(),
            ..Default::default()
        };
        Self {
            context,
            config: Arc::new(config),
            channel_timeout: settings.channel_timeout(),
        }
    }

    /// Accept connections until the task is dropped
    pub async fn run(self, listener: TcpListener) {
        tracing::info!("SSH server accepting connections...");

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::info!("New SSH connection from {}", addr);
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!("Unable to set TCP_NODELAY for {}: {}", addr, e);
                    }

                    let context = self.context.clone();
                    let config = self.config.clone();
                    let channel_timeout = self.channel_timeout;
                    tokio::spawn(async move {
                        handle_connection(stream, addr, config, context, channel_timeout).await;
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting SSH connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

/// Handshake, wait for a session channel, then run the BBS over it
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    config: Arc<Config>,
    context: ServerContext,
    channel_timeout: Duration,
) {
    let (channel_tx, channel_rx) = oneshot::channel();
    let handler = ConnectionHandler {
        addr,
        channel_tx: Some(channel_tx),
    };

    let running = match russh::server::run_stream(config, stream, handler).await {
        Ok(running) => running,
        Err(e) => {
            tracing::debug!("SSH handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let handle = running.handle();

    let channel = match tokio::time::timeout(channel_timeout, channel_rx).await {
        Ok(Ok(channel)) => channel,
        Ok(Err(_)) => {
            tracing::debug!("SSH connection from {} closed without a session channel", addr);
            return;
        }
        Err(_) => {
            tracing::info!(
                "No session channel from {} within {:?}, closing",
                addr,
                channel_timeout
            );
            let _ = handle
                .disconnect(
                    Disconnect::ByApplication,
                    "No session channel opened".to_string(),
                    "en".to_string(),
                )
                .await;
            return;
        }
    };

    serve(Box::new(SshTransport::new(channel.into_stream())), addr, context).await;

    let _ = handle
        .disconnect(Disconnect::ByApplication, "Goodbye".to_string(), "en".to_string())
        .await;
    if let Err(e) = running.await {
        tracing::debug!("SSH connection from {} ended with error: {}", addr, e);
    }
}

/// Per-connection SSH protocol callbacks
struct ConnectionHandler {
    addr: SocketAddr,
    channel_tx: Option<oneshot::Sender<Channel<Msg>>>,
}

#[async_trait]
impl Handler for ConnectionHandler {
    type Error = russh::Error;

    async fn auth_none(&mut self, user: &str) -> Result<Auth, Self::Error> {
        tracing::debug!("SSH user '{}' from {} authenticated without password", user, self.addr);
        Ok(Auth::Accept)
    }

    async fn auth_password(&mut self, user: &str, _password: &str) -> Result<Auth, Self::Error> {
        tracing::debug!("SSH user '{}' from {} authenticated with password", user, self.addr);
        Ok(Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut SshSession,
    ) -> Result<bool, Self::Error> {
        match self.channel_tx.take() {
            Some(tx) => Ok(tx.send(channel).is_ok()),
            None => {
                tracing::debug!("Rejecting additional session channel from {}", self.addr);
                Ok(false)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        tracing::debug!(
            "PTY request from {}: {} {}x{}",
            self.addr,
            term,
            col_width,
            row_height
        );
        session.channel_success(channel);
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel);
        Ok(())
    }
}
