//! Domain-separated message signed by the wallet to authorize viewing-key derivation
//!
//! The message is pure static content. The same wallet must reproduce the same signature
//! in every session, so nothing per-session (nonce, timestamp, origin) may be embedded.
//! Bumping the tag version rotates every user's derived keys.

use std::fmt;

/// Human-readable preamble shown by the wallet before the domain tag.
pub const MESSAGE_PREAMBLE: &str = "WaveSwap Confidential Vault\n\n\
Sign this message to derive the viewing keys for your stealth vault.\n\
This request will not send a transaction or cost any fees.\n\n\
Domain: ";

/// Current protocol version tag.
pub const VIEWING_KEYS_TAG: &str = "WaveSwap:ViewingKeys:v1";

/// Exact bytes a wallet signs for a given protocol version
#[derive(Clone, PartialEq, Eq)]
pub struct DomainMessage {
    tag: String,
    bytes: Vec<u8>,
}

impl DomainMessage {
    /// Message for the compiled-in protocol version
    pub fn current() -> Self {
        Self::for_tag(VIEWING_KEYS_TAG)
    }

    /// Message for an explicit version tag
    pub fn for_tag(tag: &str) -> Self {
        let mut bytes = Vec::with_capacity(MESSAGE_PREAMBLE.len() + tag.len());
        bytes.extend_from_slice(MESSAGE_PREAMBLE.as_bytes());
        bytes.extend_from_slice(tag.as_bytes());
        Self {
            tag: tag.to_string(),
            bytes,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Version number from a trailing `:v<N>` tag segment
    pub fn version(&self) -> Option<u32> {
        self.tag
            .rsplit(':')
            .next()
            .and_then(|segment| segment.strip_prefix('v'))
            .and_then(|digits| digits.parse().ok())
    }
}

impl Default for DomainMessage {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for DomainMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Preamble and tag are both UTF-8 by construction
        f.write_str(MESSAGE_PREAMBLE)?;
        f.write_str(&self.tag)
    }
}

impl fmt::Debug for DomainMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainMessage")
            .field("tag", &self.tag)
            .field("len", &self.bytes.len())
            .finish()
    }
}
