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

//! Inline IAC stripping for a byte-at-a-time telnet input stream

use super::protocol::TelnetCommand;

/// Subnegotiation payloads longer than this are abandoned
const MAX_SUBNEGOTIATION: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterState {
    /// Plain data
    Data,
    /// Saw IAC, next byte is the command
    Command,
    /// Saw IAC WILL/WONT/DO/DONT, next byte is the option
    Option,
    /// Inside IAC SB ... IAC SE
    Subnegotiation(usize),
    /// Saw IAC inside a subnegotiation
    SubnegotiationIac(usize),
}

/// Removes telnet command sequences from incoming bytes.
///
/// Option negotiation (3 bytes) and subnegotiation blocks are discarded
/// without reply, `IAC IAC` yields one literal `0xFF` data byte, and any
/// other two-byte command is dropped.
#[derive(Debug, Clone)]
pub struct TelnetFilter {
    state: FilterState,
}

impl TelnetFilter {
    pub fn new() -> Self {
        Self {
            state: FilterState::Data,
        }
    }

    /// Feed one raw byte; returns it back when it is application data
    pub fn push(&mut self, byte: u8) -> Option<u8> {
        let iac = TelnetCommand::IAC.to_byte();
        match self.state {
            FilterState::Data => {
                if byte == iac {
                    self.state = FilterState::Command;
                    None
                } else {
                    Some(byte)
                }
            }
            FilterState::Command => match TelnetCommand::from_byte(byte) {
                Some(TelnetCommand::IAC) => {
                    self.state = FilterState::Data;
                    Some(iac)
                }
                Some(command) if command.is_negotiation() => {
                    self.state = FilterState::Option;
                    None
                }
                Some(TelnetCommand::SB) => {
                    self.state = FilterState::Subnegotiation(0);
                    None
                }
                other => {
                    tracing::trace!("Discarding telnet command {:?} ({})", other, byte);
                    self.state = FilterState::Data;
                    None
                }
            },
            FilterState::Option => {
                tracing::trace!("Ignoring telnet option negotiation for option {}", byte);
                self.state = FilterState::Data;
                None
            }
            FilterState::Subnegotiation(len) => {
                self.state = if byte == iac {
                    FilterState::SubnegotiationIac(len + 1)
                } else if len + 1 >= MAX_SUBNEGOTIATION {
                    tracing::debug!("Abandoning oversized telnet subnegotiation");
                    FilterState::Data
                } else {
                    FilterState::Subnegotiation(len + 1)
                };
                None
            }
            FilterState::SubnegotiationIac(len) => {
                self.state = if byte == TelnetCommand::SE.to_byte() {
                    FilterState::Data
                } else {
                    FilterState::Subnegotiation(len + 1)
                };
                None
            }
        }
    }

    /// Whether the filter is between sequences
    pub fn is_idle(&self) -> bool {
        self.state == FilterState::Data
    }
}

impl Default for TelnetFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_all(input: &[u8]) -> Vec<u8> {
        let mut filter = TelnetFilter::new();
        input.iter().filter_map(|&b| filter.push(b)).collect()
    }

    #[test]
    fn test_plain_data_passes_through() {
        assert_eq!(filter_all(b"hello\r\n"), b"hello\r\n");
    }

    #[test]
    fn test_option_negotiation_is_removed() {
        // IAC DO ECHO, IAC WONT LINEMODE, IAC WILL NAWS, IAC DONT BINARY
        let input = [
            b'a', 255, 253, 1, b'b', 255, 252, 34, 255, 251, 31, 255, 254, 0, b'c',
        ];
        assert_eq!(filter_all(&input), b"abc");
    }

    #[test]
    fn test_escaped_iac_is_one_data_byte() {
        assert_eq!(filter_all(&[255, 255]), vec![255]);
        assert_eq!(filter_all(&[b'x', 255, 255, b'y']), vec![b'x', 255, b'y']);
    }

    #[test]
    fn test_two_byte_commands_are_dropped() {
        // IAC NOP, IAC AYT, IAC GA
        assert_eq!(filter_all(&[b'1', 255, 241, 255, 246, 255, 249, b'2']), b"12");
    }

    #[test]
    fn test_negotiation_option_may_be_iac_value() {
        // The option byte is consumed even when it looks like IAC
        assert_eq!(filter_all(&[255, 251, 255, b'z']), b"z");
    }

    #[test]
    fn test_subnegotiation_is_removed() {
        // IAC SB NAWS 0 80 0 24 IAC SE
        let input = [b'<', 255, 250, 31, 0, 80, 0, 24, 255, 240, b'>'];
        assert_eq!(filter_all(&input), b"<>");
    }

    #[test]
    fn test_subnegotiation_with_escaped_iac() {
        let input = [255, 250, 24, 255, 255, b'q', 255, 240, b'k'];
        assert_eq!(filter_all(&input), b"k");
    }

    #[test]
    fn test_oversized_subnegotiation_is_abandoned() {
        let mut input = vec![255, 250, 24];
        input.extend(std::iter::repeat_n(b'x', MAX_SUBNEGOTIATION - 1));
        input.extend_from_slice(b"ok");
        assert_eq!(filter_all(&input), b"ok");
    }

    #[test]
    fn test_sequence_split_across_pushes_keeps_state() {
        let mut filter = TelnetFilter::new();
        assert_eq!(filter.push(255), None);
        assert!(!filter.is_idle());
        assert_eq!(filter.push(253), None);
        assert_eq!(filter.push(3), None);
        assert!(filter.is_idle());
        assert_eq!(filter.push(b'A'), Some(b'A'));
    }
}
