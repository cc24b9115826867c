//! Sender and receiver halves of a transfer session.
//!
//! Both halves run lock-step: exactly one packet is in flight at any time,
//! every receive call blocks indefinitely, and no packet is ever
//! retransmitted. A lost datagram therefore stalls the session; recovery is
//! left to whoever kills the process.

use std::io;
use std::io::{Read, Write};
use std::net::{SocketAddr, UdpSocket};

use log::debug;

use crate::tftp::shared::ack_packet::AckPacket;
use crate::tftp::shared::data_packet::DataPacket;
use crate::tftp::shared::err_packet::{ErrorCode, ErrorPacket};
use crate::tftp::shared::error::TftpError;
use crate::tftp::shared::{parse_packet, TftpPacket, MAX_DATA_LEN, MAX_PACKET_LEN, MIN_PACKET_LEN};

/// Streams `source` to `peer` as numbered DATA blocks, waiting for the
/// matching ACK after every block. Returns the number of payload bytes sent.
///
/// The final block is the first one shorter than 512 bytes. A source whose
/// length is an exact multiple of 512 re-enters the loop once more and ends
/// with a zero-length block.
pub fn send_blocks<R: Read>(
    socket: &UdpSocket,
    peer: SocketAddr,
    source: &mut R,
) -> Result<u64, TftpError> {
    let mut block: u16 = 1;
    let mut total: u64 = 0;

    loop {
        let mut chunk = [0u8; MAX_DATA_LEN];
        let n = read_chunk(source, &mut chunk).map_err(TftpError::Resource)?;

        let packet = DataPacket::new(block, chunk[..n].to_vec());
        socket
            .send_to(&packet.to_bytes(), peer)
            .map_err(TftpError::Transport)?;
        debug!("sent DATA #{} ({} bytes)", block, n);

        await_ack(socket, block)?;
        total += n as u64;

        if n < MAX_DATA_LEN {
            return Ok(total);
        }
        // Block numbers wrap at 65535; transfers that long are out of
        // contract (see DESIGN.md) but must not panic.
        block = block.wrapping_add(1);
    }
}

/// Blocks until one datagram arrives and checks that it is the ACK for
/// `block`. A decodable ERROR packet surfaces the peer's message; anything
/// else is a protocol violation.
pub(crate) fn await_ack(socket: &UdpSocket, block: u16) -> Result<(), TftpError> {
    let mut buf = [0u8; MAX_PACKET_LEN];
    let (len, _) = socket.recv_from(&mut buf).map_err(TftpError::Transport)?;

    match parse_packet(&buf[..len]) {
        Ok(TftpPacket::Ack(ack)) if ack.block() == block => {
            debug!("got ACK #{}", block);
            Ok(())
        }
        Ok(TftpPacket::Err(err)) => Err(TftpError::Peer {
            code: u16::from(err.code()),
            message: err.message().to_string(),
        }),
        _ => Err(TftpError::protocol(format!(
            "incorrect ACK for block {}",
            block
        ))),
    }
}

/// Accepts numbered DATA blocks, appends each payload to `sink` in order and
/// acknowledges it. Returns the number of payload bytes written.
///
/// Replies go to the source address of each received datagram. The first
/// datagram shorter than 516 bytes ends the transfer. Out-of-order blocks
/// and undecodable datagrams are answered with an ERROR packet and abort
/// the session; there is no resynchronization.
pub fn recv_blocks<W: Write>(socket: &UdpSocket, sink: &mut W) -> Result<u64, TftpError> {
    let mut expected: u16 = 1;
    let mut total: u64 = 0;

    loop {
        let mut buf = [0u8; MAX_PACKET_LEN];
        let (len, from) = socket.recv_from(&mut buf).map_err(TftpError::Transport)?;

        if len < MIN_PACKET_LEN {
            send_error(socket, from, ErrorCode::IllegalOperation, "Invalid packet size")?;
            return Err(TftpError::malformed(format!(
                "{} byte datagram where a header was expected",
                len
            )));
        }

        match parse_packet(&buf[..len]) {
            Ok(TftpPacket::Data(data)) if data.block() == expected => {
                debug!("got DATA #{} ({} bytes)", expected, data.data().len());
                sink.write_all(data.data()).map_err(TftpError::Resource)?;
                total += data.data().len() as u64;

                send_ack(socket, from, expected)?;

                if len < MAX_PACKET_LEN {
                    return Ok(total);
                }
                expected = expected.wrapping_add(1);
            }
            Ok(TftpPacket::Err(err)) => {
                return Err(TftpError::Peer {
                    code: u16::from(err.code()),
                    message: err.message().to_string(),
                });
            }
            _ => {
                send_error(socket, from, ErrorCode::NotDefined, "Unexpected block number")?;
                return Err(TftpError::protocol(format!(
                    "expected DATA block {}",
                    expected
                )));
            }
        }
    }
}

pub(crate) fn send_ack(
    socket: &UdpSocket,
    peer: SocketAddr,
    block: u16,
) -> Result<(), TftpError> {
    debug!("sending ACK #{}", block);
    socket
        .send_to(&AckPacket::new(block).to_bytes(), peer)
        .map_err(TftpError::Transport)?;
    Ok(())
}

pub(crate) fn send_error(
    socket: &UdpSocket,
    peer: SocketAddr,
    code: ErrorCode,
    message: &str,
) -> Result<(), TftpError> {
    debug!("sending ERR [{}]: {}", u16::from(code), message);
    socket
        .send_to(&ErrorPacket::new(code, message).to_bytes(), peer)
        .map_err(TftpError::Transport)?;
    Ok(())
}

/// Fills `buf` from `source`, tolerating short reads. Returns the number of
/// bytes placed in the buffer; anything under `buf.len()` means EOF.
fn read_chunk<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
