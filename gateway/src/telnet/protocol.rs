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

//! Telnet protocol constants and utilities
//!
//! This module defines telnet protocol commands, options, and helper functions
//! for the fixed option negotiation sent at session start.

/// Telnet command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelnetCommand {
    /// Interpret As Command
    IAC = 255,
    /// Don't do option
    DONT = 254,
    /// Do option
    DO = 253,
    /// Won't do option
    WONT = 252,
    /// Will do option
    WILL = 251,
    /// Subnegotiation begin
    SB = 250,
    /// Go ahead
    GA = 249,
    /// Erase line
    EL = 248,
    /// Erase character
    EC = 247,
    /// Are you there
    AYT = 246,
    /// Abort output
    AO = 245,
    /// Interrupt process
    IP = 244,
    /// Break
    BRK = 243,
    /// Data mark
    DM = 242,
    /// No operation
    NOP = 241,
    /// Subnegotiation end
    SE = 240,
}

impl TelnetCommand {
    /// Convert byte to telnet command
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            255 => Some(Self::IAC),
            254 => Some(Self::DONT),
            253 => Some(Self::DO),
            252 => Some(Self::WONT),
            251 => Some(Self::WILL),
            250 => Some(Self::SB),
            249 => Some(Self::GA),
            248 => Some(Self::EL),
            247 => Some(Self::EC),
            246 => Some(Self::AYT),
            245 => Some(Self::AO),
            244 => Some(Self::IP),
            243 => Some(Self::BRK),
            242 => Some(Self::DM),
            241 => Some(Self::NOP),
            240 => Some(Self::SE),
            _ => None,
        }
    }

    /// Convert command to byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// WILL, WONT, DO and DONT are followed by a single option byte
    pub fn is_negotiation(self) -> bool {
        matches!(self, Self::WILL | Self::WONT | Self::DO | Self::DONT)
    }
}

/// Telnet option codes used by the BBS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelnetOption {
    /// Binary transmission
    Binary = 0,
    /// Echo
    Echo = 1,
    /// Suppress go ahead
    SuppressGoAhead = 3,
    /// Linemode
    Linemode = 34,
}

impl TelnetOption {
    /// Convert option to byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Build a telnet negotiation sequence
pub fn build_negotiation(command: TelnetCommand, option: TelnetOption) -> [u8; 3] {
    [
        TelnetCommand::IAC.to_byte(),
        command.to_byte(),
        option.to_byte(),
    ]
}

/// Negotiation sent when a telnet session starts.
///
/// Forces the client into character-at-a-time mode with server-side echo
/// and 8-bit clean transfer in both directions, so multi-byte UTF-8 survives.
pub fn startup_negotiation() -> Vec<u8> {
    [
        build_negotiation(TelnetCommand::WILL, TelnetOption::Echo),
        build_negotiation(TelnetCommand::WILL, TelnetOption::SuppressGoAhead),
        build_negotiation(TelnetCommand::WONT, TelnetOption::Linemode),
        build_negotiation(TelnetCommand::DO, TelnetOption::Binary),
        build_negotiation(TelnetCommand::WILL, TelnetOption::Binary),
    ]
    .concat()
}

/// ANSI escape sequences
pub mod ansi {
    /// Reset all attributes
    pub const RESET: &str = "\x1b[0m";

    /// Bold/bright
    pub const BOLD: &str = "\x1b[1m";

    /// Clear the screen and home the cursor
    pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

    /// Foreground colors
    pub mod fg {
        pub const WHITE: &str = "\x1b[37m";

        /// Bright colors
        pub const BRIGHT_BLACK: &str = "\x1b[90m";
        pub const BRIGHT_RED: &str = "\x1b[91m";
        pub const BRIGHT_GREEN: &str = "\x1b[92m";
        pub const BRIGHT_YELLOW: &str = "\x1b[93m";
        pub const BRIGHT_BLUE: &str = "\x1b[94m";
        pub const BRIGHT_MAGENTA: &str = "\x1b[95m";
        pub const BRIGHT_CYAN: &str = "\x1b[96m";
        pub const BRIGHT_WHITE: &str = "\x1b[97m";
    }
}
