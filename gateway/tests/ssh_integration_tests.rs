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

use aibbs_gateway::config::{EffectsConfig, SshConfig};
use aibbs_gateway::{ServerContext, SshServer};
use aibbs_llm::{ChatConnector, Conversation, LlmError};
use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg};
use russh_keys::key::{KeyPair, PublicKey};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{Duration, Instant, timeout};

const WAIT: Duration = Duration::from_secs(5);

struct OfflineConnector;

impl ChatConnector for OfflineConnector {
    fn connect(&self) -> Result<Conversation, LlmError> {
        Err(LlmError::Config("offline".into()))
    }

    fn model(&self) -> &str {
        "offline"
    }
}

/// Client side that trusts whatever host key the server presents
struct TrustingClient;

#[async_trait]
impl client::Handler for TrustingClient {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _key: &PublicKey) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Start an SSH server on an ephemeral port
async fn start_server(channel_timeout: u64) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let context = ServerContext::new(Arc::new(OfflineConnector), EffectsConfig::disabled());
    let settings = SshConfig {
        channel_timeout,
        ..SshConfig::default()
    };
    let host_key = KeyPair::generate_ed25519().unwrap();
    tokio::spawn(SshServer::new(context, host_key, &settings).run(listener));
    addr
}

async fn connect(addr: SocketAddr) -> Handle<TrustingClient> {
    let config = Arc::new(client::Config::default());
    timeout(WAIT, client::connect(config, addr, TrustingClient))
        .await
        .expect("handshake timed out")
        .unwrap()
}

/// Open a session channel with a PTY and a shell, as an interactive client does
async fn open_shell(handle: &Handle<TrustingClient>) -> Channel<Msg> {
    let channel = handle.channel_open_session().await.unwrap();
    channel
        .request_pty(true, "xterm-256color", 80, 24, 0, 0, &[])
        .await
        .unwrap();
    channel.request_shell(true).await.unwrap();
    channel
}

/// Collected output of a channel
#[derive(Default)]
struct Transcript {
    data: Vec<u8>,
    successes: usize,
}

impl Transcript {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Read until `needle` shows up in the channel data
    async fn read_until(&mut self, channel: &mut Channel<Msg>, needle: &str) {
        let reading = async {
            while !self.text().contains(needle) {
                match channel.wait().await {
                    Some(ChannelMsg::Data { data }) => self.data.extend_from_slice(&data),
                    Some(ChannelMsg::Success) => self.successes += 1,
                    Some(_) => {}
                    None => break,
                }
            }
        };
        timeout(WAIT, reading).await.ok();
        assert!(
            self.text().contains(needle),
            "expected {needle:?} in output, got {:?}",
            self.text()
        );
    }
}

#[tokio::test]
async fn test_password_login_reaches_handle_prompt() {
    let addr = start_server(20).await;
    let mut handle = connect(addr).await;
    assert!(handle.authenticate_password("neo", "whatever").await.unwrap());

    let mut channel = open_shell(&handle).await;
    let mut transcript = Transcript::default();
    transcript.read_until(&mut channel, "Enter your handle: ").await;
    assert!(
        !transcript.data.contains(&0xff),
        "telnet negotiation leaked onto the SSH channel"
    );

    channel.data(&b"neo\r"[..]).await.unwrap();
    transcript.read_until(&mut channel, "Welcome aboard, neo!").await;
    assert_eq!(transcript.successes, 2, "pty and shell requests should be granted");
}

#[tokio::test]
async fn test_no_auth_login_is_accepted() {
    let addr = start_server(20).await;
    let mut handle = connect(addr).await;
    assert!(handle.authenticate_none("guest").await.unwrap());

    let mut channel = open_shell(&handle).await;
    let mut transcript = Transcript::default();
    transcript.read_until(&mut channel, "Enter your handle: ").await;

    channel.data(&b"\r"[..]).await.unwrap();
    transcript.read_until(&mut channel, "Welcome aboard, Guest!").await;
}

#[tokio::test]
async fn test_connection_without_session_channel_is_closed() {
    let addr = start_server(1).await;
    let mut handle = connect(addr).await;
    assert!(handle.authenticate_password("idle", "").await.unwrap());
    assert!(!handle.is_closed());

    let deadline = Instant::now() + WAIT;
    while !handle.is_closed() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(handle.is_closed(), "server kept an idle connection past the channel timeout");
}
