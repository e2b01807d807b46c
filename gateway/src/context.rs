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

use crate::config::EffectsConfig;
use aibbs_llm::ChatConnector;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Server context containing shared, read-only resources.
///
/// Cloned into every session task; nothing here is mutated after startup.
#[derive(Clone)]
pub struct ServerContext {
    /// Factory for per-session chat conversations
    connector: Arc<dyn ChatConnector>,

    /// Cosmetic pacing
    effects: Arc<EffectsConfig>,

    /// Process start, for the uptime display
    started: Instant,
}

impl ServerContext {
    /// Create a new server context
    pub fn new(connector: Arc<dyn ChatConnector>, effects: EffectsConfig) -> Self {
        Self {
            connector,
            effects: Arc::new(effects),
            started: Instant::now(),
        }
    }

    /// Get the chat connector
    pub fn connector(&self) -> &Arc<dyn ChatConnector> {
        &self.connector
    }

    /// Get the effects configuration
    pub fn effects(&self) -> &EffectsConfig {
        &self.effects
    }

    /// Time since the server started
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Render an uptime as `1d 02h 03m 04s`, omitting leading zero units
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, hours, minutes, seconds) = (
        secs / 86_400,
        secs % 86_400 / 3_600,
        secs % 3_600 / 60,
        secs % 60,
    );
    if days > 0 {
        format!("{days}d {hours:02}h {minutes:02}m {seconds:02}s")
    } else if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
