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

//! SSH host identity key persistence

use russh_keys::key::{KeyPair, SignatureHash};
use std::fs;
use std::io;
use std::path::Path;

/// RSA modulus size for generated host keys
pub const HOST_KEY_BITS: usize = 2048;

/// Host key errors
#[derive(Debug, thiserror::Error)]
pub enum HostKeyError {
    #[error("Host key IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Host key error: {0}")]
    Key(#[from] russh_keys::Error),

    #[error("Failed to generate host key")]
    Generate,
}

/// Load the host key at `path`, generating and saving a new one when the
/// file does not exist yet
pub fn load_or_generate(path: &Path) -> Result<KeyPair, HostKeyError> {
    if path.exists() {
        tracing::info!("Loading SSH host key from {}", path.display());
        return Ok(russh_keys::load_secret_key(path, None)?);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    tracing::info!(
        "Generating new {}-bit RSA SSH host key at {}",
        HOST_KEY_BITS,
        path.display()
    );
    let key =
        KeyPair::generate_rsa(HOST_KEY_BITS, SignatureHash::SHA2_256).ok_or(HostKeyError::Generate)?;
    russh_keys::encode_pkcs8_pem(&key, create_private(path)?)?;
    Ok(key)
}

#[cfg(unix)]
fn create_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}
