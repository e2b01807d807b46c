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

//! Line console
//!
//! Turns a one-byte-at-a-time [`Transport`] into edited lines of text.
//! Input passes through three stages:
//!
//! 1. [`TelnetFilter`] removes IAC sequences (telnet transports only)
//! 2. [`Utf8Accumulator`] assembles data bytes into characters
//! 3. [`LineEditor`] applies backspace and enter handling
//!
//! Output is written verbatim; newline normalization is the transport's job.

use crate::telnet::{TelnetFilter, startup_negotiation};
use crate::transport::{Transport, TransportError, TransportKind};

/// Longest line the editor will hold, in characters
pub const MAX_LINE_CHARS: usize = 1024;

/// Longest UTF-8 encoding of one scalar value
const MAX_UTF8_BYTES: usize = 4;

/// Erase one glyph on the remote terminal
const ERASE_SEQUENCE: &[u8] = b"\x08 \x08";

/// Console errors
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The peer closed the stream; carries whatever had been typed
    #[error("Client disconnected")]
    Disconnected { partial: String },

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Incremental UTF-8 decoder fed one byte at a time
#[derive(Debug, Default, Clone)]
pub struct Utf8Accumulator {
    pending: Vec<u8>,
}

impl Utf8Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a byte; returns a character once a complete scalar is available.
    ///
    /// An invalid sequence drops the bytes before the offending byte, which
    /// is then retried as the start of a new sequence.
    pub fn push(&mut self, byte: u8) -> Option<char> {
        self.pending.push(byte);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    let ch = text.chars().next();
                    self.pending.clear();
                    return ch;
                }
                Err(e) if e.error_len().is_none() => {
                    if self.pending.len() >= MAX_UTF8_BYTES {
                        tracing::trace!("Discarding {} undecodable bytes", self.pending.len());
                        self.pending.clear();
                    }
                    return None;
                }
                Err(_) => {
                    if self.pending.len() <= 1 {
                        self.pending.clear();
                        return None;
                    }
                    let last = self.pending[self.pending.len() - 1];
                    self.pending.clear();
                    self.pending.push(last);
                }
            }
        }
    }

    /// Number of bytes waiting for completion
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Byte-to-character decoder for one transport
#[derive(Debug, Clone)]
pub struct InputDecoder {
    telnet: Option<TelnetFilter>,
    utf8: Utf8Accumulator,
}

impl InputDecoder {
    pub fn new(kind: TransportKind) -> Self {
        Self {
            telnet: match kind {
                TransportKind::Telnet => Some(TelnetFilter::new()),
                TransportKind::Ssh => None,
            },
            utf8: Utf8Accumulator::new(),
        }
    }

    pub fn push(&mut self, byte: u8) -> Option<char> {
        let byte = match self.telnet.as_mut() {
            Some(filter) => filter.push(byte)?,
            None => byte,
        };
        self.utf8.push(byte)
    }
}

/// Result of feeding one character to the [`LineEditor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Nothing to show
    Ignored,
    /// Character was appended; echo it
    Echo(char),
    /// Last character was removed; erase it on screen
    Erase,
    /// Enter was pressed; the completed line
    Submit(String),
}

/// Line buffer with backspace and enter handling
#[derive(Debug, Default, Clone)]
pub struct LineEditor {
    line: String,
    chars: usize,
    after_cr: bool,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ch: char) -> Edit {
        let after_cr = std::mem::take(&mut self.after_cr);
        match ch {
            '\n' | '\0' if after_cr => Edit::Ignored,
            '\r' | '\n' => {
                self.after_cr = ch == '\r';
                self.chars = 0;
                Edit::Submit(std::mem::take(&mut self.line))
            }
            '\x08' | '\x7f' => match self.line.pop() {
                Some(_) => {
                    self.chars -= 1;
                    Edit::Erase
                }
                None => Edit::Ignored,
            },
            ch if ch.is_control() => Edit::Ignored,
            _ if self.chars >= MAX_LINE_CHARS => Edit::Ignored,
            ch => {
                self.line.push(ch);
                self.chars += 1;
                Edit::Echo(ch)
            }
        }
    }

    /// The line typed so far
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Take the unfinished line, leaving the editor empty
    pub fn take(&mut self) -> String {
        self.chars = 0;
        std::mem::take(&mut self.line)
    }
}

/// Text console over one transport
pub struct LineConsole {
    transport: Box<dyn Transport>,
    decoder: InputDecoder,
    editor: LineEditor,
}

impl LineConsole {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        let kind = transport.kind();
        Self {
            transport,
            decoder: InputDecoder::new(kind),
            editor: LineEditor::new(),
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Send the startup option negotiation; a no-op over SSH
    pub async fn negotiate(&mut self) -> Result<(), ConsoleError> {
        if self.kind() == TransportKind::Telnet {
            self.transport.send(&startup_negotiation()).await?;
        }
        Ok(())
    }

    /// Write styled text verbatim
    pub async fn write(&mut self, text: &str) -> Result<(), ConsoleError> {
        self.transport.send(text.as_bytes()).await?;
        Ok(())
    }

    /// Write `prompt` and read one edited line.
    ///
    /// An empty submission is returned as an empty string. End of stream
    /// yields [`ConsoleError::Disconnected`] with the unfinished line.
    pub async fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        if !prompt.is_empty() {
            self.write(prompt).await?;
        }
        loop {
            let Some(byte) = self.transport.recv_byte().await? else {
                return Err(ConsoleError::Disconnected {
                    partial: self.editor.take(),
                });
            };
            let Some(ch) = self.decoder.push(byte) else {
                continue;
            };
            match self.editor.push(ch) {
                Edit::Ignored => {}
                Edit::Echo(ch) => {
                    let mut buf = [0u8; MAX_UTF8_BYTES];
                    self.transport.send(ch.encode_utf8(&mut buf).as_bytes()).await?;
                }
                Edit::Erase => self.transport.send(ERASE_SEQUENCE).await?,
                Edit::Submit(line) => {
                    self.transport.send(b"\r\n").await?;
                    return Ok(line);
                }
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), ConsoleError> {
        self.transport.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{SshTransport, TelnetTransport};
    use proptest::prelude::*;
    use proptest::sample::Index;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

    fn decode_all(kind: TransportKind, bytes: &[u8]) -> String {
        let mut decoder = InputDecoder::new(kind);
        bytes.iter().filter_map(|&b| decoder.push(b)).collect()
    }

    fn edit_all(input: &str) -> Vec<Edit> {
        let mut editor = LineEditor::new();
        input.chars().map(|ch| editor.push(ch)).collect()
    }

    async fn telnet_console(input: &[u8]) -> (LineConsole, DuplexStream) {
        let (mut client, server) = duplex(8192);
        client.write_all(input).await.unwrap();
        // End of input for the console; echoes still flow back to the client
        client.shutdown().await.unwrap();
        (LineConsole::new(Box::new(TelnetTransport::new(server))), client)
    }

    async fn drain(mut client: DuplexStream) -> Vec<u8> {
        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        out
    }

    #[test]
    fn test_ascii_decodes_immediately() {
        let mut utf8 = Utf8Accumulator::new();
        assert_eq!(utf8.push(b'h'), Some('h'));
        assert_eq!(utf8.pending(), 0);
    }

    #[test]
    fn test_split_multibyte_char_yields_one_char() {
        for ch in ['é', '€', '界', '🦀'] {
            let mut buf = [0u8; 4];
            let bytes = ch.encode_utf8(&mut buf).as_bytes();
            let mut utf8 = Utf8Accumulator::new();
            let emitted: Vec<char> = bytes.iter().filter_map(|&b| utf8.push(b)).collect();
            assert_eq!(emitted, vec![ch]);
            assert_eq!(utf8.pending(), 0);
        }
    }

    #[test]
    fn test_invalid_byte_is_retried_as_new_start() {
        let mut utf8 = Utf8Accumulator::new();
        assert_eq!(utf8.push(0xC3), None);
        assert_eq!(utf8.push(b'A'), Some('A'));

        assert_eq!(utf8.push(0xE2), None);
        assert_eq!(utf8.push(0xC3), None);
        assert_eq!(utf8.push(0xA9), Some('é'));
    }

    #[test]
    fn test_stray_bytes_are_dropped() {
        let mut utf8 = Utf8Accumulator::new();
        assert_eq!(utf8.push(0x80), None);
        assert_eq!(utf8.push(0xFF), None);
        assert_eq!(utf8.pending(), 0);
        assert_eq!(utf8.push(b'z'), Some('z'));
    }

    /// Command sequences a client may interleave with its keystrokes
    const IAC_SEQUENCES: [&[u8]; 4] = [
        &[255, 251, 1],
        &[255, 241],
        &[255, 254, 34],
        &[255, 250, 31, 0, 80, 0, 24, 255, 240],
    ];

    #[test]
    fn test_decoding_matches_utf8_with_iac_removed() {
        let samples = [
            "hello",
            "Привет, мир!",
            "naïve café ☕",
            "日本語テキスト",
            "mixed 🦀 crab 🚀 rocket",
            "",
        ];

        for sample in samples {
            let bytes = sample.as_bytes();
            for iac in IAC_SEQUENCES {
                // Insert the sequence at every byte boundary, including mid-character
                for at in 0..=bytes.len() {
                    let mut input = bytes[..at].to_vec();
                    input.extend_from_slice(iac);
                    input.extend_from_slice(&bytes[at..]);
                    assert_eq!(
                        decode_all(TransportKind::Telnet, &input),
                        sample,
                        "sequence {:?} inserted at {}",
                        iac,
                        at
                    );
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_decoding_equals_utf8_without_iac(
            text in any::<String>(),
            inserts in proptest::collection::vec((any::<Index>(), 0..IAC_SEQUENCES.len()), 0..8),
        ) {
            let bytes = text.as_bytes();
            let mut inserts: Vec<(usize, usize)> = inserts
                .into_iter()
                .map(|(at, which)| (at.index(bytes.len() + 1), which))
                .collect();
            inserts.sort();

            let mut input = Vec::new();
            let mut copied = 0;
            for (at, which) in inserts {
                input.extend_from_slice(&bytes[copied..at]);
                input.extend_from_slice(IAC_SEQUENCES[which]);
                copied = at;
            }
            input.extend_from_slice(&bytes[copied..]);

            prop_assert_eq!(decode_all(TransportKind::Telnet, &input), text.clone());
            prop_assert_eq!(decode_all(TransportKind::Ssh, bytes), text);
        }
    }

    #[test]
    fn test_escaped_iac_is_not_a_character() {
        let mut decoder = InputDecoder::new(TransportKind::Telnet);
        assert_eq!(decoder.push(255), None);
        assert_eq!(decoder.push(255), None);
        assert_eq!(decoder.utf8.pending(), 0);
        assert_eq!(decoder.telnet.as_ref().map(TelnetFilter::is_idle), Some(true));
    }

    #[test]
    fn test_ssh_decoder_does_not_strip_iac() {
        assert_eq!(decode_all(TransportKind::Telnet, &[255, 251, b'A', b'x']), "x");
        assert_eq!(decode_all(TransportKind::Ssh, &[255, 251, b'A', b'x']), "Ax");
    }

    #[test]
    fn test_editor_submits_on_cr_and_lf() {
        assert_eq!(
            edit_all("hi\r"),
            vec![Edit::Echo('h'), Edit::Echo('i'), Edit::Submit("hi".into())]
        );
        assert_eq!(edit_all("\n"), vec![Edit::Submit(String::new())]);
    }

    #[test]
    fn test_editor_swallows_lf_and_nul_after_cr() {
        assert_eq!(
            edit_all("a\r\nb\r\0"),
            vec![
                Edit::Echo('a'),
                Edit::Submit("a".into()),
                Edit::Ignored,
                Edit::Echo('b'),
                Edit::Submit("b".into()),
                Edit::Ignored,
            ]
        );
        // LF LF is two empty lines, CR CR likewise
        assert_eq!(
            edit_all("\n\n\r\r"),
            vec![
                Edit::Submit(String::new()),
                Edit::Submit(String::new()),
                Edit::Submit(String::new()),
                Edit::Submit(String::new()),
            ]
        );
    }

    #[test]
    fn test_backspace_on_empty_is_noop() {
        let mut editor = LineEditor::new();
        assert_eq!(editor.push('\x08'), Edit::Ignored);
        assert_eq!(editor.push('\x7f'), Edit::Ignored);
        assert_eq!(editor.line(), "");
    }

    #[test]
    fn test_append_then_backspace_restores_empty() {
        let mut editor = LineEditor::new();
        assert_eq!(editor.push('X'), Edit::Echo('X'));
        assert_eq!(editor.push('\x7f'), Edit::Erase);
        assert_eq!(editor.line(), "");
        assert_eq!(editor.push('界'), Edit::Echo('界'));
        assert_eq!(editor.push('\x08'), Edit::Erase);
        assert_eq!(editor.line(), "");
    }

    #[test]
    fn test_control_chars_are_ignored() {
        assert_eq!(
            edit_all("\x1b\x07ok"),
            vec![Edit::Ignored, Edit::Ignored, Edit::Echo('o'), Edit::Echo('k')]
        );
    }

    #[test]
    fn test_line_length_is_capped() {
        let mut editor = LineEditor::new();
        for _ in 0..MAX_LINE_CHARS {
            assert_eq!(editor.push('é'), Edit::Echo('é'));
        }
        assert_eq!(editor.push('x'), Edit::Ignored);
        assert_eq!(editor.push('\x08'), Edit::Erase);
        assert_eq!(editor.push('x'), Edit::Echo('x'));
        assert_eq!(editor.line().chars().count(), MAX_LINE_CHARS);
    }

    #[tokio::test]
    async fn test_read_line_hi_crlf() {
        let (mut console, client) = telnet_console(b"hi\r\n").await;
        assert_eq!(console.read_line("").await.unwrap(), "hi");
        console.close().await.unwrap();
        assert_eq!(drain(client).await, b"hi\r\n");
    }

    #[tokio::test]
    async fn test_read_line_writes_prompt_and_erase_sequence() {
        let (mut console, client) = telnet_console(b"ab\x7fc\r").await;
        assert_eq!(console.read_line("> ").await.unwrap(), "ac");
        console.close().await.unwrap();
        assert_eq!(drain(client).await, b"> ab\x08 \x08c\r\n");
    }

    #[tokio::test]
    async fn test_read_line_empty_submission() {
        let (mut console, _client) = telnet_console(b"\r\n\r\n").await;
        assert_eq!(console.read_line("").await.unwrap(), "");
        assert_eq!(console.read_line("").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_line_strips_inline_negotiation() {
        let mut input = vec![255, 253, 24];
        input.extend_from_slice("Zoë".as_bytes());
        input.extend_from_slice(&[255, 255, 255, 241, b'\r']);
        let (mut console, _client) = telnet_console(&input).await;
        assert_eq!(console.read_line("").await.unwrap(), "Zoë");
    }

    #[tokio::test]
    async fn test_read_line_reports_partial_on_eof() {
        let (mut console, _client) = telnet_console(b"unfinish").await;
        match console.read_line("").await {
            Err(ConsoleError::Disconnected { partial }) => assert_eq!(partial, "unfinish"),
            other => panic!("expected disconnect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lines_split_across_reads() {
        let (mut client, server) = duplex(256);
        let mut console = LineConsole::new(Box::new(TelnetTransport::new(server)));
        let writer = tokio::spawn(async move {
            for byte in "héllo\r\nnext\r\n".bytes() {
                client.write_all(&[byte]).await.unwrap();
                tokio::task::yield_now().await;
            }
            client
        });
        assert_eq!(console.read_line("").await.unwrap(), "héllo");
        assert_eq!(console.read_line("").await.unwrap(), "next");
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_negotiation_only_on_telnet() {
        let (mut console, client) = telnet_console(b"").await;
        console.negotiate().await.unwrap();
        console.close().await.unwrap();
        assert_eq!(drain(client).await, startup_negotiation());

        let (client, server) = duplex(256);
        let mut console = LineConsole::new(Box::new(SshTransport::new(server)));
        console.negotiate().await.unwrap();
        console.write("ready\n").await.unwrap();
        console.close().await.unwrap();
        assert_eq!(drain(client).await, b"ready\r\n");
    }
}
