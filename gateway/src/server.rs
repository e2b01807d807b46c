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

//! Connection acceptors
//!
//! Each listener accepts connections forever and hands every connection to
//! its own task. A session never shares mutable state with another one, so
//! a stalled client or a slow chat request only parks its own task.

mod ssh;
mod telnet;

pub use self::ssh::SshServer;
pub use self::telnet::TelnetServer;

use crate::console::LineConsole;
use crate::context::ServerContext;
use crate::session::Session;
use crate::transport::Transport;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// Back-off after a failed `accept`, e.g. when out of file descriptors
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Run one session to completion inside its own tracing span
pub async fn serve(transport: Box<dyn Transport>, peer: SocketAddr, context: ServerContext) {
    let session_id = Uuid::new_v4();
    let kind = transport.kind();
    let span = tracing::info_span!("session", id = %session_id, %peer, %kind);

    async move {
        tracing::info!("Session started");
        let session = Session::new(peer, LineConsole::new(transport), context);
        match session.run().await {
            Ok(()) => tracing::info!("Session ended"),
            Err(e) if e.is_disconnect() => tracing::info!("Client disconnected"),
            Err(e) => tracing::error!("Session failed: {}", e),
        }
    }
    .instrument(span)
    .await
}
