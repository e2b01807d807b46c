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

//! Telnet transport over a raw TCP stream

use super::{NewlineNormalizer, Transport, TransportError, TransportKind, eof_to_none};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Telnet connection wrapper
pub struct TelnetTransport<S = TcpStream> {
    /// Buffered TCP stream; writes pass straight through
    stream: BufReader<S>,

    /// Carries a trailing CR between sends
    newlines: NewlineNormalizer,

    /// Set once `close` has run
    closed: bool,
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a new telnet transport
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            newlines: NewlineNormalizer::new(),
            closed: false,
        }
    }
}

#[async_trait]
impl<S> Transport for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn kind(&self) -> TransportKind {
        TransportKind::Telnet
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let data = self.newlines.apply(data);
        self.stream.write_all(&data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv_byte(&mut self) -> Result<Option<u8>, TransportError> {
        if self.closed {
            return Ok(None);
        }
        eof_to_none(self.stream.read_u8().await)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.get_mut().shutdown().await?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed
    }
}
