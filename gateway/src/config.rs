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

use aibbs_llm::{DEFAULT_MODEL, LlmConfig, OPENROUTER_ENDPOINT, OpenAiConnector};
use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::convert::Infallible;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration used when the configuration file does not exist
pub const DEFAULT_CONFIG: &str = include_str!("../config.yaml");

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        default_value = "config.yaml"
    )]
    pub config_file: String,

    #[arg(
        short = 'e',
        long = "env",
        help = "Path to environment file",
        default_value = ".env"
    )]
    pub env_file: String,

    #[arg(
        short = 't',
        long = "telnet",
        help = "Enable telnet server",
        action = ArgAction::Set,
        default_value_t = true
    )]
    pub telnet: bool,

    #[arg(
        short = 's',
        long = "ssh",
        help = "Enable SSH server",
        action = ArgAction::Set,
        default_value_t = true
    )]
    pub ssh: bool,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub telnet: TelnetConfig,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub effects: EffectsConfig,
}

impl Configuration {
    /// Load the configuration file, falling back to [`DEFAULT_CONFIG`] when
    /// it does not exist
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            tracing::debug!("No configuration file at {}, using built-in defaults", path);
            return Self::parse(DEFAULT_CONFIG);
        }
        tracing::debug!("Loading configuration from file: {}", path);
        let file = std::fs::File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Parse a YAML configuration document
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TelnetConfig {
    #[serde(default)]
    pub addr: EnvField<TelnetBinding>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TelnetBinding(SocketAddr);

impl TelnetBinding {
    pub fn to_addr(&self) -> SocketAddr {
        self.0
    }
    pub fn to_ip(&self) -> IpAddr {
        self.0.ip()
    }
    pub fn to_port(&self) -> u16 {
        self.0.port()
    }
}

impl FromStr for TelnetBinding {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(SocketAddr::from_str(s)?))
    }
}

impl Default for TelnetBinding {
    fn default() -> Self {
        Self(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(0, 0, 0, 0),
            2323,
        )))
    }
}

impl std::fmt::Display for TelnetBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SshConfig {
    #[serde(default)]
    pub addr: EnvField<SshBinding>,

    /// PKCS#8 PEM host key, generated on first start
    #[serde(default)]
    pub host_key: EnvField<HostKeyPath>,

    /// Seconds to wait for a session channel after authentication (default: 20)
    #[serde(default = "default_channel_timeout")]
    pub channel_timeout: u64,

    /// Idle seconds before the SSH layer drops the connection
    #[serde(default)]
    pub inactivity_timeout: Option<u64>,
}

fn default_channel_timeout() -> u64 {
    20
}

impl SshConfig {
    pub fn channel_timeout(&self) -> Duration {
        Duration::from_secs(self.channel_timeout)
    }

    pub fn inactivity_timeout(&self) -> Option<Duration> {
        self.inactivity_timeout.map(Duration::from_secs)
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        SshConfig {
            addr: Default::default(),
            host_key: Default::default(),
            channel_timeout: default_channel_timeout(),
            inactivity_timeout: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SshBinding(SocketAddr);

impl SshBinding {
    pub fn to_addr(&self) -> SocketAddr {
        self.0
    }
    pub fn to_ip(&self) -> IpAddr {
        self.0.ip()
    }
    pub fn to_port(&self) -> u16 {
        self.0.port()
    }
}

impl FromStr for SshBinding {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(SocketAddr::from_str(s)?))
    }
}

impl Default for SshBinding {
    fn default() -> Self {
        Self(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(0, 0, 0, 0),
            2222,
        )))
    }
}

impl std::fmt::Display for SshBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HostKeyPath(PathBuf);

impl HostKeyPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl FromStr for HostKeyPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl Default for HostKeyPath {
    fn default() -> Self {
        Self(PathBuf::from("data/ssh_host_key"))
    }
}

impl std::fmt::Display for HostKeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Chat backend settings
#[derive(Debug, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub endpoint: EnvField<LlmEndpoint>,

    /// Empty means no key
    #[serde(default)]
    pub api_key: EnvField<ApiKey>,

    #[serde(default)]
    pub model: EnvField<ModelName>,

    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    /// Cap on stored chat turns; unbounded when absent
    #[serde(default)]
    pub max_history: Option<usize>,

    /// Replaces the built-in persona
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_llm_retries() -> u32 {
    2
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_llm_max_tokens() -> u32 {
    500
}

impl LlmSettings {
    /// Provider configuration for these settings
    pub fn to_llm_config(&self) -> LlmConfig {
        let mut config =
            LlmConfig::openrouter(Some(self.api_key.as_str().to_string()), self.model.as_str());
        config.endpoint = self.endpoint.as_str().to_string();
        config.timeout_seconds = self.timeout_seconds;
        config.max_retries = self.max_retries;
        config.temperature = self.temperature;
        config.max_tokens = self.max_tokens;
        config
    }

    /// Chat connector built from these settings
    pub fn to_connector(&self) -> OpenAiConnector {
        let connector =
            OpenAiConnector::new(self.to_llm_config()).with_max_history(self.max_history);
        match &self.system_prompt {
            Some(prompt) => connector.with_system_prompt(prompt.as_str()),
            None => connector,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        LlmSettings {
            endpoint: Default::default(),
            api_key: Default::default(),
            model: Default::default(),
            timeout_seconds: default_llm_timeout(),
            max_retries: default_llm_retries(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
            max_history: None,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LlmEndpoint(String);

impl LlmEndpoint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LlmEndpoint {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl Default for LlmEndpoint {
    fn default() -> Self {
        Self(OPENROUTER_ENDPOINT.to_string())
    }
}

impl std::fmt::Display for LlmEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl FromStr for ApiKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

// Keep the key out of the startup debug log
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "ApiKey(unset)")
        } else {
            write!(f, "ApiKey(****)")
        }
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelName(String);

impl ModelName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ModelName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl Default for ModelName {
    fn default() -> Self {
        Self(DEFAULT_MODEL.to_string())
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cosmetic pacing of screens and animations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectsConfig {
    #[serde(default = "default_effects_enabled")]
    pub enabled: bool,

    /// Delay between characters of an AI reply
    #[serde(default = "default_typing_delay")]
    pub typing_delay_ms: u64,

    /// Delay between frames of the connect animation
    #[serde(default = "default_frame_delay")]
    pub frame_delay_ms: u64,

    /// Delay between the "AI is thinking" dots
    #[serde(default = "default_thinking_delay")]
    pub thinking_delay_ms: u64,

    /// Short pause after notices and between gallery pieces
    #[serde(default = "default_pause")]
    pub pause_ms: u64,

    #[serde(default = "default_goodbye_delay")]
    pub goodbye_delay_ms: u64,
}

fn default_effects_enabled() -> bool {
    true
}

fn default_typing_delay() -> u64 {
    10
}

fn default_frame_delay() -> u64 {
    100
}

fn default_thinking_delay() -> u64 {
    300
}

fn default_pause() -> u64 {
    1000
}

fn default_goodbye_delay() -> u64 {
    3000
}

impl EffectsConfig {
    /// No delays at all
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn delay(&self, millis: u64) -> Duration {
        if self.enabled {
            Duration::from_millis(millis)
        } else {
            Duration::ZERO
        }
    }

    pub fn typing_delay(&self) -> Duration {
        self.delay(self.typing_delay_ms)
    }

    pub fn frame_delay(&self) -> Duration {
        self.delay(self.frame_delay_ms)
    }

    pub fn thinking_delay(&self) -> Duration {
        self.delay(self.thinking_delay_ms)
    }

    pub fn pause(&self) -> Duration {
        self.delay(self.pause_ms)
    }

    pub fn goodbye_delay(&self) -> Duration {
        self.delay(self.goodbye_delay_ms)
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        EffectsConfig {
            enabled: default_effects_enabled(),
            typing_delay_ms: default_typing_delay(),
            frame_delay_ms: default_frame_delay(),
            thinking_delay_ms: default_thinking_delay(),
            pause_ms: default_pause(),
            goodbye_delay_ms: default_goodbye_delay(),
        }
    }
}
