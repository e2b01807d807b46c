//
// Copyright 2025 Hans W. Uhlig. All Rights Reserved.
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

//! Telnet protocol support for the AI BBS gateway
//!
//! The BBS speaks a deliberately small subset of telnet:
//! - a fixed startup negotiation forcing character mode and 8-bit transfer
//! - inline removal of IAC command sequences from client input
//! - the `IAC IAC` escape for a literal `0xFF` data byte

pub mod filter;
pub mod protocol;

pub use filter::TelnetFilter;
pub use protocol::{TelnetCommand, TelnetOption, ansi, build_negotiation, startup_negotiation};
