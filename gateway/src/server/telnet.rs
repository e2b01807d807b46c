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

use super::{ACCEPT_BACKOFF, serve};
use crate::context::ServerContext;
use crate::transport::TelnetTransport;
use tokio::net::TcpListener;

/// Telnet server
pub struct TelnetServer {
    context: ServerContext,
}

impl TelnetServer {
    /// Create a new telnet server
    pub fn new(context: ServerContext) -> Self {
        Self { context }
    }

    /// Accept connections until the task is dropped
    pub async fn run(self, listener: TcpListener) {
        tracing::info!("Telnet server accepting connections...");

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::info!("New telnet connection from {}", addr);
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!("Unable to set TCP_NODELAY for {}: {}", addr, e);
                    }

                    let context = self.context.clone();
                    tokio::spawn(async move {
                        serve(Box::new(TelnetTransport::new(stream)), addr, context).await;
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting telnet connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}
