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

//! Per-connection menu state machine
//!
//! ```text
//! Welcome -> MainMenu -> {Chat, Boards, Gallery, Info, Eggs} -> MainMenu
//!                     -> Goodbye
//! ```
//!
//! Every state writes its screen and then blocks on one console read. All
//! state here belongs to exactly one connection and dies with it.

use crate::console::{ConsoleError, LineConsole};
use crate::context::{ServerContext, format_uptime};
use crate::screens;
use crate::telnet::ansi::{RESET, fg};
use aibbs_llm::Conversation;
use std::net::SocketAddr;
use std::time::Duration;

/// Handle used until the user picks one
pub const DEFAULT_HANDLE: &str = "Guest";

/// Longest accepted handle, in characters
pub const MAX_HANDLE_CHARS: usize = 20;

const CONTINUE_PROMPT: &str = "Press ENTER to continue...";

/// Menu states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuState {
    /// Logo and handle prompt
    Welcome,
    /// Top level menu
    MainMenu,
    /// AI chat room
    Chat,
    /// Static message board listing
    Boards,
    /// ASCII art gallery
    Gallery,
    /// System information
    Info,
    /// Easter eggs
    Eggs,
    /// Farewell; the connection closes afterwards
    Goodbye,
}

/// Map a main menu answer onto the next state; `None` for anything unknown
pub fn parse_main_choice(input: &str) -> Option<MenuState> {
    let choice = input.trim();
    match choice {
        "1" => Some(MenuState::Chat),
        "2" => Some(MenuState::Boards),
        "3" => Some(MenuState::Gallery),
        "4" => Some(MenuState::Info),
        "5" => Some(MenuState::Eggs),
        _ if ["q", "quit", "exit"]
            .iter()
            .any(|word| choice.eq_ignore_ascii_case(word)) =>
        {
            Some(MenuState::Goodbye)
        }
        _ => None,
    }
}

/// A line typed in the chat room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    /// Nothing typed
    Empty,
    /// `/exit`, `/quit` or `/back`
    Leave,
    /// `/reset`
    Reset,
    /// `/help`
    Help,
    /// Text for the AI
    Message(&'a str),
}

impl<'a> ChatCommand<'a> {
    /// Commands are matched on the trimmed line; messages keep what was typed
    pub fn parse(line: &'a str) -> Self {
        let command = line.trim();
        if command.is_empty() {
            return ChatCommand::Empty;
        }
        match command.to_lowercase().as_str() {
            "/exit" | "/quit" | "/back" => ChatCommand::Leave,
            "/reset" => ChatCommand::Reset,
            "/help" => ChatCommand::Help,
            _ => ChatCommand::Message(line),
        }
    }
}

/// Trimmed handle limited to [`MAX_HANDLE_CHARS`]; `None` when blank
pub fn sanitize_handle(input: &str) -> Option<String> {
    let handle = input.trim();
    if handle.is_empty() {
        None
    } else {
        Some(handle.chars().take(MAX_HANDLE_CHARS).collect())
    }
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Console(#[from] ConsoleError),
}

impl SessionError {
    /// Whether the peer simply went away
    pub fn is_disconnect(&self) -> bool {
        matches!(self, SessionError::Console(ConsoleError::Disconnected { .. }))
    }
}

/// One connected user
pub struct Session {
    peer: SocketAddr,
    handle: String,
    state: MenuState,
    console: LineConsole,
    chat: Option<Conversation>,
    context: ServerContext,
}

impl Session {
    pub fn new(peer: SocketAddr, console: LineConsole, context: ServerContext) -> Self {
        Self {
            peer,
            handle: DEFAULT_HANDLE.to_string(),
            state: MenuState::Welcome,
            console,
            chat: None,
            context,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// The conversation, once the chat room has been entered successfully
    pub fn chat(&self) -> Option<&Conversation> {
        self.chat.as_ref()
    }

    /// Drive the session until Goodbye or disconnect. The transport is
    /// closed on every exit path.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let result = self.drive().await;
        if let Err(e) = self.console.close().await {
            tracing::debug!("Error closing transport: {}", e);
        }
        result
    }

    async fn drive(&mut self) -> Result<(), SessionError> {
        self.console.negotiate().await?;
        loop {
            let finished = self.state == MenuState::Goodbye;
            self.step().await?;
            if finished {
                return Ok(());
            }
        }
    }

    /// Run the current state once and move to the next one
    pub async fn step(&mut self) -> Result<MenuState, SessionError> {
        let next = match self.state {
            MenuState::Welcome => self.welcome().await?,
            MenuState::MainMenu => self.main_menu().await?,
            MenuState::Chat => self.chat_room().await?,
            MenuState::Boards => self.boards().await?,
            MenuState::Gallery => self.gallery().await?,
            MenuState::Info => self.info().await?,
            MenuState::Eggs => self.eggs().await?,
            MenuState::Goodbye => self.goodbye().await?,
        };
        if next != self.state {
            tracing::debug!("Session state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        Ok(next)
    }

    async fn linger(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn press_enter(&mut self) -> Result<(), SessionError> {
        self.console.read_line(CONTINUE_PROMPT).await?;
        Ok(())
    }

    async fn welcome(&mut self) -> Result<MenuState, SessionError> {
        self.console.write(screens::clear()).await?;
        self.console.write(&screens::logo()).await?;
        self.console.write(&screens::welcome_banner()).await?;

        let prompt = screens::colorize("Enter your handle: ", fg::BRIGHT_YELLOW);
        let answer = self.console.read_line(&prompt).await?;
        if let Some(handle) = sanitize_handle(&answer) {
            self.handle = handle;
        }
        tracing::info!("User logged in as {}", self.handle);

        let greeting = format!("Welcome aboard, {}!", self.handle);
        self.console
            .write(&format!("\n{}\n", screens::emphasize(&greeting, fg::BRIGHT_GREEN)))
            .await?;
        Self::linger(self.context.effects().pause()).await;
        Ok(MenuState::MainMenu)
    }

    async fn main_menu(&mut self) -> Result<MenuState, SessionError> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.console.write(screens::clear()).await?;
        self.console.write(&screens::logo()).await?;
        self.console.write(&screens::main_menu()).await?;
        self.console
            .write(&screens::menu_status(&self.handle, &now))
            .await?;

        let prompt = screens::colorize("Enter your choice: ", fg::BRIGHT_YELLOW);
        let choice = self.console.read_line(&prompt).await?;
        match parse_main_choice(&choice) {
            Some(next) => Ok(next),
            None => {
                let notice = screens::colorize("Invalid choice! Please try again.", fg::BRIGHT_RED);
                self.console.write(&format!("\n{notice}\n")).await?;
                Self::linger(self.context.effects().pause()).await;
                Ok(MenuState::MainMenu)
            }
        }
    }

    async fn loading_animation(&mut self, message: &str) -> Result<(), SessionError> {
        let delay = self.context.effects().frame_delay();
        self.console
            .write(&format!("\n{}{message}... {RESET}", fg::BRIGHT_CYAN))
            .await?;
        for step in 0..screens::LOADING_FRAME_COUNT {
            let frame = screens::loading_frame(step);
            self.console.write(&format!("\r{message}... {frame}")).await?;
            Self::linger(delay).await;
        }
        self.console.write("\n").await?;
        Ok(())
    }

    async fn chat_room(&mut self) -> Result<MenuState, SessionError> {
        self.console.write(screens::clear()).await?;
        self.console.write(&screens::chat_header()).await?;
        self.console.write(&screens::robot_art()).await?;
        self.console.write("\n").await?;

        if self.chat.is_none() {
            self.loading_animation("Connecting to AI").await?;
            match self.context.connector().connect() {
                Ok(conversation) => {
                    tracing::info!("Chat connected using model {}", conversation.model());
                    let ok = screens::colorize("✓ Connected successfully!", fg::BRIGHT_GREEN);
                    let model = screens::colorize(
                        &format!("Using model: {}", conversation.model()),
                        fg::BRIGHT_BLACK,
                    );
                    self.console.write(&format!("{ok}\n{model}\n\n")).await?;
                    self.chat = Some(conversation);
                }
                Err(e) => {
                    tracing::warn!("Chat connection failed: {}", e);
                    let error = screens::colorize(&format!("✗ Error: {e}"), fg::BRIGHT_RED);
                    let hint = screens::colorize(
                        "Make sure OPENROUTER_API_KEY is set in .env file",
                        fg::BRIGHT_YELLOW,
                    );
                    self.console.write(&format!("{error}\n{hint}\n\n")).await?;
                    self.press_enter().await?;
                    return Ok(MenuState::MainMenu);
                }
            }
        }

        let prompt = format!("{}{}>{RESET} ", fg::BRIGHT_CYAN, self.handle);
        loop {
            let line = self.console.read_line(&prompt).await?;
            match ChatCommand::parse(&line) {
                ChatCommand::Empty => {}
                ChatCommand::Leave => return Ok(MenuState::MainMenu),
                ChatCommand::Reset => {
                    if let Some(chat) = self.chat.as_mut() {
                        chat.reset();
                    }
                    let notice = screens::colorize("Conversation reset!", fg::BRIGHT_YELLOW);
                    self.console.write(&format!("{notice}\n\n")).await?;
                }
                ChatCommand::Help => self.chat_help().await?,
                ChatCommand::Message(text) => self.ask(text).await?,
            }
        }
    }

    async fn chat_help(&mut self) -> Result<(), SessionError> {
        let y = fg::BRIGHT_YELLOW;
        let g = fg::BRIGHT_GREEN;
        self.console
            .write(&format!(
                "\n{y}Commands:{RESET}\n  {g}/exit{RESET}  - Return to main menu\n  {g}/reset{RESET} - Clear conversation history\n  {g}/help{RESET}  - Show this help\n\n"
            ))
            .await?;
        Ok(())
    }

    async fn ask(&mut self, text: &str) -> Result<(), SessionError> {
        let Some(chat) = self.chat.as_mut() else {
            return Ok(());
        };
        let effects = self.context.effects();

        self.console
            .write(&screens::colorize("AI is thinking", fg::BRIGHT_MAGENTA))
            .await?;
        for _ in 0..3 {
            self.console.write(".").await?;
            Self::linger(effects.thinking_delay()).await;
        }
        self.console.write("\n\n").await?;

        match chat.send(text).await {
            Ok(reply) => {
                self.console
                    .write(&format!("{}AI>{RESET} ", fg::BRIGHT_MAGENTA))
                    .await?;
                let delay = effects.typing_delay();
                if delay.is_zero() {
                    self.console.write(&reply).await?;
                } else {
                    let mut buf = [0u8; 4];
                    for ch in reply.chars() {
                        self.console.write(ch.encode_utf8(&mut buf)).await?;
                        Self::linger(delay).await;
                    }
                }
                self.console.write("\n\n").await?;
            }
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                let error =
                    screens::colorize(&format!("Error communicating with AI: {e}"), fg::BRIGHT_RED);
                self.console.write(&format!("{error}\n\n")).await?;
            }
        }
        Ok(())
    }

    async fn boards(&mut self) -> Result<MenuState, SessionError> {
        self.console.write(screens::clear()).await?;
        self.console.write(&screens::board_listing()).await?;
        self.press_enter().await?;
        Ok(MenuState::MainMenu)
    }

    async fn gallery(&mut self) -> Result<MenuState, SessionError> {
        self.console.write(screens::clear()).await?;
        self.console
            .write(&screens::section_header("ASCII ART GALLERY"))
            .await?;
        for art in [screens::computer_art(), screens::robot_art()] {
            self.console.write(&art).await?;
            self.console.write("\n").await?;
            Self::linger(self.context.effects().pause()).await;
        }
        self.console.write("\n").await?;
        self.press_enter().await?;
        Ok(MenuState::MainMenu)
    }

    async fn info(&mut self) -> Result<MenuState, SessionError> {
        let (provider, model) = match &self.chat {
            Some(chat) => (chat.provider_name(), chat.model().to_string()),
            None => ("OpenRouter (Free Tier)".to_string(), "Not connected".to_string()),
        };
        let rows = [
            ("BBS Name", "AI BBS (Retro Edition)".to_string()),
            ("Version", env!("CARGO_PKG_VERSION").to_string()),
            ("Established", "2026".to_string()),
            ("AI Provider", provider),
            ("AI Model", model),
            ("Your Handle", self.handle.clone()),
            ("Connection", self.peer.to_string()),
            (
                "Server Time",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            ("Uptime", format_uptime(self.context.uptime())),
        ];

        let mut screen = screens::section_header("SYSTEM INFORMATION");
        for (key, value) in &rows {
            screen.push_str(&screens::info_row(key, value));
        }
        screen.push_str(&format!(
            "\n{}« Powered by Rust & OpenRouter AI »{RESET}\n\n",
            fg::BRIGHT_YELLOW
        ));

        self.console.write(screens::clear()).await?;
        self.console.write(&screen).await?;
        self.press_enter().await?;
        Ok(MenuState::MainMenu)
    }

    async fn eggs(&mut self) -> Result<MenuState, SessionError> {
        self.console.write(screens::clear()).await?;
        self.console.write(&screens::section_header("EASTER EGGS")).await?;
        self.console.write(&screens::matrix_egg()).await?;
        self.console.write("\n").await?;
        for message in screens::EGG_MESSAGES {
            self.console.write(&screens::egg_line(message)).await?;
            Self::linger(self.context.effects().pause() / 2).await;
        }
        self.console
            .write(&format!(
                "\n{}[More secrets hidden throughout the BBS...]{RESET}\n\n",
                fg::BRIGHT_BLACK
            ))
            .await?;
        self.press_enter().await?;
        Ok(MenuState::MainMenu)
    }

    async fn goodbye(&mut self) -> Result<MenuState, SessionError> {
        let effects = self.context.effects();
        let delay = effects.goodbye_delay();
        let seconds = delay.as_secs() + u64::from(delay.subsec_nanos() > 0);
        self.console.write(screens::clear()).await?;
        self.console.write(&screens::goodbye(seconds)).await?;
        Self::linger(delay).await;
        tracing::info!("User {} logged off", self.handle);
        Ok(MenuState::Goodbye)
    }
}
