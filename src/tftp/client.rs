use std::fs::File;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::Path;

use log::info;
use pretty_bytes::converter::convert;

use crate::tftp::shared::error::TftpError;
use crate::tftp::shared::request_packet::{RequestKind, RequestPacket};
use crate::tftp::shared::transfer;

const TRANSFER_MODE: &str = "octet";

/// Downloads `filename` from the server into `root`, creating or truncating
/// the local file. The read request needs no readiness ack: the server's
/// first reply is DATA block 1.
pub fn download(server: &str, root: &Path, filename: &str) -> Result<u64, TftpError> {
    let socket = bind_any()?;
    let peer = resolve_peer(server)?;
    let path = root.join(filename);
    let mut file = File::create(&path).map_err(TftpError::Resource)?;

    let rrq = RequestPacket::new(RequestKind::Read, filename, TRANSFER_MODE);
    socket
        .send_to(&rrq.to_bytes(), peer)
        .map_err(TftpError::Transport)?;
    info!("requested download of [{}] from {}", filename, peer);

    let received = transfer::recv_blocks(&socket, &mut file)?;
    println!("{} transferred successfully.", convert(received as f64));
    Ok(received)
}

/// Uploads `root/filename` to the server. The write request must be met by
/// the server's ACK #0 readiness signal before any data flows.
pub fn upload(server: &str, root: &Path, filename: &str) -> Result<u64, TftpError> {
    let socket = bind_any()?;
    let peer = resolve_peer(server)?;
    let path = root.join(filename);
    let mut file = File::open(&path).map_err(TftpError::Resource)?;

    let wrq = RequestPacket::new(RequestKind::Write, filename, TRANSFER_MODE);
    socket
        .send_to(&wrq.to_bytes(), peer)
        .map_err(TftpError::Transport)?;
    info!("requested upload of [{}] to {}", filename, peer);

    transfer::await_ack(&socket, 0)?;

    let sent = transfer::send_blocks(&socket, peer, &mut file)?;
    println!("{} transferred successfully.", convert(sent as f64));
    Ok(sent)
}

fn bind_any() -> Result<UdpSocket, TftpError> {
    UdpSocket::bind("0.0.0.0:0").map_err(TftpError::Transport)
}

fn resolve_peer(server: &str) -> Result<SocketAddr, TftpError> {
    server
        .to_socket_addrs()
        .map_err(TftpError::Transport)?
        .next()
        .ok_or_else(|| TftpError::protocol(format!("cannot resolve server address {}", server)))
}
