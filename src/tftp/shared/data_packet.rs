use std::io::Write;

use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};

use crate::tftp::shared::error::TftpError;
use crate::tftp::shared::{TftpPacket, MAX_DATA_LEN, OP_DATA, OP_LEN};

const BLK_NUM_LEN: usize = 2;

/// DATA: opcode, block number, then 0..512 payload bytes. A payload under
/// 512 bytes marks the final block of a transfer.
#[derive(Debug, Eq, PartialEq)]
pub struct DataPacket {
    block: u16,
    data: Vec<u8>,
}

impl DataPacket {
    pub fn new(block: u16, data: Vec<u8>) -> Self {
        debug_assert!(data.len() <= MAX_DATA_LEN);
        DataPacket { block, data }
    }

    pub fn block(&self) -> u16 {
        self.block
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(OP_LEN + BLK_NUM_LEN + self.data.len());
        buf.write_u16::<NetworkEndian>(OP_DATA).unwrap();
        buf.write_u16::<NetworkEndian>(self.block).unwrap();
        buf.write_all(&self.data).unwrap();
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<TftpPacket, TftpError> {
        let op = NetworkEndian::read_u16(&buf[0..OP_LEN]);
        if op != OP_DATA {
            return Err(TftpError::malformed(format!("bad DATA opcode [{}]", op)));
        }

        let block = NetworkEndian::read_u16(&buf[OP_LEN..OP_LEN + BLK_NUM_LEN]);
        let data = &buf[OP_LEN + BLK_NUM_LEN..];
        if data.len() > MAX_DATA_LEN {
            return Err(TftpError::malformed(format!(
                "DATA payload of {} bytes exceeds {}",
                data.len(),
                MAX_DATA_LEN
            )));
        }

        Ok(TftpPacket::Data(DataPacket::new(block, data.to_vec())))
    }
}
