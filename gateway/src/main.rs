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

use aibbs_gateway::config::{Arguments, Configuration};
use aibbs_gateway::{ServerContext, SshServer, TelnetServer, hostkey};
use clap::Parser;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type ServerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load arguments from the command line
    let arguments: Arguments = Parser::parse();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load environment variables from the env file when present
    if std::path::Path::new(&arguments.env_file).exists() {
        debug!("Loading environment variables from file: {}", arguments.env_file);
        dotenv::from_filename(&arguments.env_file).ok();
    }

    // Load configuration from a file with environment variable substitution
    let config = Configuration::load(&arguments.config_file)
        .inspect_err(|err| tracing::error!("Configuration load error: {}", err))?;

    debug!("Configuration loaded: {:?}", config);
    info!("Starting AI BBS...");

    if config.llm.api_key.is_empty() {
        warn!("OPENROUTER_API_KEY is not set; the chat room will be unavailable");
    }
    let connector = config.llm.to_connector();
    let context = ServerContext::new(Arc::new(connector), config.effects.clone());

    let mut servers: Vec<ServerFuture> = Vec::new();

    if arguments.telnet {
        let listener = TcpListener::bind(config.telnet.addr.to_addr())
            .await
            .inspect_err(|e| tracing::error!("Unable to bind to telnet port: {}", e))?;
        info!(
            "Telnet Server listening on {} ({}:{})",
            config.telnet.addr,
            config.telnet.addr.to_ip(),
            config.telnet.addr.to_port(),
        );
        servers.push(Box::pin(TelnetServer::new(context.clone()).run(listener)));
    }

    if arguments.ssh {
        let key_path = config.ssh.host_key.as_path().to_path_buf();
        let host_key = tokio::task::spawn_blocking(move || hostkey::load_or_generate(&key_path))
            .await?
            .inspect_err(|e| tracing::error!("Unable to load SSH host key: {}", e))?;
        let listener = TcpListener::bind(config.ssh.addr.to_addr())
            .await
            .inspect_err(|e| tracing::error!("Unable to bind to SSH port: {}", e))?;
        info!(
            "SSH Server listening on {} ({}:{})",
            config.ssh.addr,
            config.ssh.addr.to_ip(),
            config.ssh.addr.to_port(),
        );
        servers.push(Box::pin(
            SshServer::new(context.clone(), host_key, &config.ssh).run(listener),
        ));
    }

    if servers.is_empty() {
        warn!("Both listeners are disabled, nothing to do");
        return Ok(());
    }

    let listeners = async move {
        let mut tasks = Vec::with_capacity(servers.len());
        for server in servers {
            tasks.push(tokio::spawn(server));
        }
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!("Listener task failed: {}", e);
            }
        }
    };

    tokio::select! {
        _ = listeners => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Unable to listen for shutdown signal: {}", e);
            }
            info!("Shutting down...");
        }
    }

    Ok(())
}
