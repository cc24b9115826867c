use std::fs::File;
use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;

use log::{info, warn};

use crate::tftp::shared::err_packet::ErrorCode;
use crate::tftp::shared::error::TftpError;
use crate::tftp::shared::{parse_packet, transfer, TftpPacket, MAX_PACKET_LEN};

/// A TFTP server that answers read and write requests out of one storage
/// directory, one client at a time.
///
/// The dispatch loop is fully serializing: a session runs to completion (or
/// error) before the next datagram is read off the socket, and every reply
/// goes out on the single bound socket. Filenames taken off the wire are
/// joined onto the root without sanitization; see DESIGN.md.
pub struct Server {
    socket: UdpSocket,
    root: PathBuf,
}

impl Server {
    pub fn bind(addr: &str, root: impl Into<PathBuf>) -> Result<Self, TftpError> {
        let socket = UdpSocket::bind(addr).map_err(TftpError::Transport)?;
        Ok(Server {
            socket,
            root: root.into(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TftpError> {
        self.socket.local_addr().map_err(TftpError::Transport)
    }

    /// Perpetual receive-and-route cycle. A failed receive is logged and
    /// skipped; a failed session is logged and the loop resumes. Only
    /// killing the process stops the server.
    pub fn run(&self) -> ! {
        match self.local_addr() {
            Ok(addr) => info!("serving [{}] on {}", self.root.display(), addr),
            Err(e) => warn!("serving [{}]: {}", self.root.display(), e),
        }

        loop {
            let mut buf = [0u8; MAX_PACKET_LEN];
            let (len, peer) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) => {
                    warn!("receive failed: {}", e);
                    continue;
                }
            };
            self.dispatch(&buf[..len], peer);
        }
    }

    /// Routes one datagram: read requests and write requests start a
    /// session, everything else is rejected as an illegal operation.
    fn dispatch(&self, buf: &[u8], peer: SocketAddr) {
        match parse_packet(buf) {
            Ok(TftpPacket::Rrq(req)) => {
                info!("RRQ [{}] from {}", req.filename(), peer);
                if let Err(e) = self.serve_read(peer, req.filename()) {
                    warn!("read session for {} failed: {}", peer, e);
                }
            }
            Ok(TftpPacket::Wrq(req)) => {
                info!("WRQ [{}] from {}", req.filename(), peer);
                if let Err(e) = self.serve_write(peer, req.filename()) {
                    warn!("write session for {} failed: {}", peer, e);
                }
            }
            Ok(other) => {
                info!("rejecting {} from {}", other, peer);
                self.reject(peer);
            }
            Err(e) => {
                info!("rejecting undecodable datagram from {}: {}", peer, e);
                self.reject(peer);
            }
        }
    }

    /// Streams a stored file back to the requesting peer.
    fn serve_read(&self, peer: SocketAddr, filename: &str) -> Result<(), TftpError> {
        let path = self.root.join(filename);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                transfer::send_error(&self.socket, peer, ErrorCode::FileNotFound, "File not found.")?;
                return Err(TftpError::Resource(e));
            }
        };

        let sent = transfer::send_blocks(&self.socket, peer, &mut file)?;
        info!("served [{}] to {} ({} bytes)", path.display(), peer, sent);
        Ok(())
    }

    /// Accepts an upload into the storage directory. An aborted session
    /// leaves whatever was written so far; nothing is cleaned up.
    fn serve_write(&self, peer: SocketAddr, filename: &str) -> Result<(), TftpError> {
        if filename.is_empty() {
            transfer::send_error(&self.socket, peer, ErrorCode::NotDefined, "Filename is missing.")?;
            return Err(TftpError::protocol("write request with empty filename"));
        }

        let path = self.root.join(filename);
        let mut file = match File::create(&path) {
            Ok(file) => file,
            Err(e) => {
                transfer::send_error(
                    &self.socket,
                    peer,
                    ErrorCode::NotDefined,
                    "Failed to open or create file",
                )?;
                return Err(TftpError::Resource(e));
            }
        };

        transfer::send_ack(&self.socket, peer, 0)?;
        let received = transfer::recv_blocks(&self.socket, &mut file)?;
        info!("stored [{}] from {} ({} bytes)", path.display(), peer, received);
        Ok(())
    }

    fn reject(&self, peer: SocketAddr) {
        let sent = transfer::send_error(
            &self.socket,
            peer,
            ErrorCode::IllegalOperation,
            "Illegal TFTP operation.",
        );
        if let Err(e) = sent {
            warn!("could not send rejection to {}: {}", peer, e);
        }
    }
}
