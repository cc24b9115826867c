/// ACK packets echo the block number of the DATA packet being acknowledged.
/// A WRQ is acknowledged with an ACK carrying block number zero.
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};

use crate::tftp::shared::error::TftpError;
use crate::tftp::shared::{TftpPacket, OP_ACK, OP_LEN};

const ACK_LEN: usize = 4;
const BLK_NUM_OFFSET: usize = 2;

#[derive(Debug, Eq, PartialEq)]
pub struct AckPacket {
    block: u16,
}

impl AckPacket {
    pub fn new(block: u16) -> Self {
        AckPacket { block }
    }

    pub fn block(&self) -> u16 {
        self.block
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ACK_LEN);
        buf.write_u16::<NetworkEndian>(OP_ACK).unwrap();
        buf.write_u16::<NetworkEndian>(self.block).unwrap();
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<TftpPacket, TftpError> {
        let op = NetworkEndian::read_u16(&buf[0..OP_LEN]);
        if op != OP_ACK {
            return Err(TftpError::malformed(format!("bad ACK opcode [{}]", op)));
        }
        if buf.len() != ACK_LEN {
            return Err(TftpError::malformed(format!(
                "ACK must be {} bytes, got {}",
                ACK_LEN,
                buf.len()
            )));
        }

        let block = NetworkEndian::read_u16(&buf[BLK_NUM_OFFSET..]);
        Ok(TftpPacket::Ack(AckPacket::new(block)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_ack_packet() {
        let p = AckPacket::new(42);
        assert_eq!(p.to_bytes(), vec![0x0, 0x4, 0x0, 42]);
    }

    #[test]
    fn deserialize_ack_packet() {
        let buf = [0x0, 0x4, 0x30, 0x39];
        match AckPacket::parse(&buf).unwrap() {
            TftpPacket::Ack(p) => assert_eq!(p.block(), 12345),
            other => panic!("wrong packet type: {}", other),
        }
    }

    #[test]
    fn deserialize_wrong_opcode() {
        let buf = [0x0, 0x5, 0x0, 42];
        assert!(matches!(
            AckPacket::parse(&buf),
            Err(TftpError::Malformed(_))
        ));
    }

    #[test]
    fn deserialize_trailing_bytes() {
        let buf = [0x0, 0x4, 0x0, 42, 0x0];
        assert!(matches!(
            AckPacket::parse(&buf),
            Err(TftpError::Malformed(_))
        ));
    }
}
