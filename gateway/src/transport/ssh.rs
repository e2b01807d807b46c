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

//! SSH transport over an interactive session channel
//!
//! The channel may accept fewer bytes than offered on a single write, so
//! `send` keeps writing until everything is taken or the channel stops
//! making progress.

use super::{NewlineNormalizer, Transport, TransportError, TransportKind, eof_to_none};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// SSH channel wrapper
pub struct SshTransport<S> {
    channel: BufReader<S>,
    newlines: NewlineNormalizer,
    closed: bool,
}

impl<S> SshTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an SSH channel stream
    pub fn new(channel: S) -> Self {
        Self {
            channel: BufReader::new(channel),
            newlines: NewlineNormalizer::new(),
            closed: false,
        }
    }
}

#[async_trait]
impl<S> Transport for SshTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn kind(&self) -> TransportKind {
        TransportKind::Ssh
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let data = self.newlines.apply(data);
        let mut remaining: &[u8] = &data;
        while !remaining.is_empty() {
            let written = self.channel.get_mut().write(remaining).await?;
            if written == 0 {
                tracing::debug!("SSH channel accepted no bytes, treating as closed");
                return Err(TransportError::ChannelClosed);
            }
            remaining = &remaining[written..];
        }
        self.channel.get_mut().flush().await?;
        Ok(())
    }

    async fn recv_byte(&mut self) -> Result<Option<u8>, TransportError> {
        if self.closed {
            return Ok(None);
        }
        eof_to_none(self.channel.read_u8().await)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.channel.get_mut().shutdown().await?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed
    }
}
