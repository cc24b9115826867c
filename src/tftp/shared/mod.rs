use std::fmt;
use std::fmt::{Display, Formatter};

use byteorder::{ByteOrder, NetworkEndian};

use crate::tftp::shared::ack_packet::AckPacket;
use crate::tftp::shared::data_packet::DataPacket;
use crate::tftp::shared::err_packet::ErrorPacket;
use crate::tftp::shared::error::TftpError;
use crate::tftp::shared::request_packet::RequestPacket;

pub mod ack_packet;
pub mod data_packet;
pub mod err_packet;
pub mod error;
pub mod request_packet;
pub mod transfer;

pub(crate) const OP_LEN: usize = 2;
/// Payload carried by a single DATA packet.
pub const MAX_DATA_LEN: usize = 512;
/// Largest datagram either peer handles: 4 byte header + 512 bytes of data.
pub const MAX_PACKET_LEN: usize = MAX_DATA_LEN + 4;
/// Smallest non-request packet: opcode plus one more 2-byte field.
pub const MIN_PACKET_LEN: usize = 4;

/// Op code for Read Request
pub(crate) const OP_RRQ: u16 = 0x001;
/// Op code for Write Request
pub(crate) const OP_WRQ: u16 = 0x002;
/// Op code for Data packet
pub(crate) const OP_DATA: u16 = 0x003;
/// Op code for ACK packet
pub(crate) const OP_ACK: u16 = 0x004;
/// Op code for Error packet
pub(crate) const OP_ERR: u16 = 0x005;

#[derive(Debug, Eq, PartialEq)]
pub enum TftpPacket {
    Rrq(RequestPacket),
    Wrq(RequestPacket),
    Data(DataPacket),
    Ack(AckPacket),
    Err(ErrorPacket),
}

impl Display for TftpPacket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TftpPacket::Rrq(p) => write!(f, "RRQ [{}] [{}]", p.filename(), p.mode()),
            TftpPacket::Wrq(p) => write!(f, "WRQ [{}] [{}]", p.filename(), p.mode()),
            TftpPacket::Data(p) => write!(f, "DATA [{}] ({} bytes)", p.block(), p.data().len()),
            TftpPacket::Ack(p) => write!(f, "ACK [{}]", p.block()),
            TftpPacket::Err(p) => write!(f, "ERR [{}]: {}", u16::from(p.code()), p.message()),
        }
    }
}

/// Decodes one received datagram into a packet.
///
/// The length check runs before any field past the opcode is touched, so a
/// truncated datagram can never cause an out-of-bounds read. Every string
/// scan inside the per-packet parsers is bounded by `buf`.
pub fn parse_packet(buf: &[u8]) -> Result<TftpPacket, TftpError> {
    if buf.len() < MIN_PACKET_LEN {
        return Err(TftpError::malformed(format!(
            "packet too short: {} bytes",
            buf.len()
        )));
    }

    match NetworkEndian::read_u16(&buf[0..OP_LEN]) {
        OP_RRQ | OP_WRQ => RequestPacket::parse(buf),
        OP_DATA => DataPacket::parse(buf),
        OP_ACK => AckPacket::parse(buf),
        OP_ERR => ErrorPacket::parse(buf),
        op => Err(TftpError::malformed(format!("unknown opcode [{}]", op))),
    }
}
