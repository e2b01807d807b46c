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

//! Transport adapter layer
//!
//! A telnet TCP socket and an SSH session channel are both reduced to the same
//! byte-stream capability so that the line console and the session logic never
//! know which listener a client came in on.

use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::io;

mod ssh;
mod telnet;

pub use self::ssh::SshTransport;
pub use self::telnet::TelnetTransport;

/// Which listener produced a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Raw TCP carrying telnet framing
    Telnet,
    /// SSH session channel
    Ssh,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Telnet => write!(f, "telnet"),
            TransportKind::Ssh => write!(f, "ssh"),
        }
    }
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The SSH channel stopped accepting data
    #[error("Channel closed")]
    ChannelClosed,

    /// The transport was closed locally
    #[error("Transport closed")]
    Closed,
}

/// Blocking byte-stream capability shared by every transport.
///
/// A transport is exclusively owned by one session; no method is ever called
/// concurrently.
#[async_trait]
pub trait Transport: Send {
    /// Get the transport kind
    fn kind(&self) -> TransportKind;

    /// Write every byte of `data`
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read the next byte; `Ok(None)` at end of stream
    async fn recv_byte(&mut self) -> Result<Option<u8>, TransportError>;

    /// Close the transport. Calling this more than once is harmless.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if the transport is still open
    fn is_open(&self) -> bool;
}

/// Convert every bare `\n` into `\r\n`, leaving existing `\r\n` untouched.
///
/// `after_cr` tells whether the byte sent just before `data` was a `\r`.
/// Naive terminals treat `\n` as a pure line feed, which makes box-drawing art
/// stagger to the right.
pub fn normalize_newlines(data: &[u8], after_cr: bool) -> Cow<'_, [u8]> {
    let mut previous = after_cr.then_some(b'\r');
    let mut bare = 0;
    for &byte in data {
        if byte == b'\n' && previous != Some(b'\r') {
            bare += 1;
        }
        previous = Some(byte);
    }
    if bare == 0 {
        return Cow::Borrowed(data);
    }

    let mut out = Vec::with_capacity(data.len() + bare);
    let mut previous = after_cr.then_some(b'\r');
    for &byte in data {
        if byte == b'\n' && previous != Some(b'\r') {
            out.push(b'\r');
        }
        out.push(byte);
        previous = Some(byte);
    }
    Cow::Owned(out)
}

/// Newline normalization that carries the trailing `\r` across sends, so a
/// `\r\n` written one byte at a time goes out unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NewlineNormalizer {
    after_cr: bool,
}

impl NewlineNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply<'a>(&mut self, data: &'a [u8]) -> Cow<'a, [u8]> {
        let normalized = normalize_newlines(data, self.after_cr);
        if let Some(&last) = data.last() {
            self.after_cr = last == b'\r';
        }
        normalized
    }
}

/// Map end-of-file from `read_u8` onto `None`
fn eof_to_none(result: io::Result<u8>) -> Result<Option<u8>, TransportError> {
    match result {
        Ok(byte) => Ok(Some(byte)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}
