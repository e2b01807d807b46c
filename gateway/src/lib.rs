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

//! AI BBS Gateway Library
//!
//! This library provides the terminal front end of the AI BBS: telnet and SSH
//! listeners, the byte-level line console, and the per-connection menu
//! session that fronts the AI chat room.

pub mod config;
pub mod console;
pub mod context;
pub mod hostkey;
pub mod screens;
pub mod server;
pub mod session;
pub mod telnet;
pub mod transport;

// Re-export commonly used types
pub use console::{ConsoleError, LineConsole};
pub use context::ServerContext;
pub use server::{SshServer, TelnetServer};
pub use session::{MenuState, Session, SessionError};
pub use transport::{SshTransport, TelnetTransport, Transport, TransportError, TransportKind};
