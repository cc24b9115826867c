use std::io;

use thiserror::Error;

/// Failure taxonomy shared by both peers.
///
/// Nothing in here is ever retried: the client treats every variant as
/// process-fatal, the server treats every variant as fatal to the current
/// session and then resumes its dispatch loop.
#[derive(Debug, Error)]
pub enum TftpError {
    /// Socket create/bind/send/receive failure.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// Decode-time size or structure violation.
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// Semantic violation: wrong opcode, non-matching block number.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// File open/create/read/write failure.
    #[error("file error: {0}")]
    Resource(#[source] io::Error),

    /// The remote side aborted the session with an ERROR packet.
    #[error("peer error {code}: {message}")]
    Peer { code: u16, message: String },
}

impl TftpError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        TftpError::Malformed(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        TftpError::Protocol(msg.into())
    }
}
