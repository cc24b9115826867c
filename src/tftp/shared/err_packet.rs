/// ERROR packets can acknowledge any other packet kind. The code is one of
/// the RFC 1350 error codes; the message is a NUL-terminated string meant
/// for humans. An ERROR is never acknowledged or retransmitted.
use std::io::Write;
use std::str;

use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};

use crate::tftp::shared::error::TftpError;
use crate::tftp::shared::{TftpPacket, OP_ERR, OP_LEN};

const CODE_LEN: usize = 2;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ErrorCode {
    NotDefined,
    FileNotFound,
    AccessViolation,
    DiskFull,
    IllegalOperation,
    UnknownTid,
    FileExists,
    NoSuchUser,
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        match code {
            1 => ErrorCode::FileNotFound,
            2 => ErrorCode::AccessViolation,
            3 => ErrorCode::DiskFull,
            4 => ErrorCode::IllegalOperation,
            5 => ErrorCode::UnknownTid,
            6 => ErrorCode::FileExists,
            7 => ErrorCode::NoSuchUser,
            _ => ErrorCode::NotDefined,
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::NotDefined => 0,
            ErrorCode::FileNotFound => 1,
            ErrorCode::AccessViolation => 2,
            ErrorCode::DiskFull => 3,
            ErrorCode::IllegalOperation => 4,
            ErrorCode::UnknownTid => 5,
            ErrorCode::FileExists => 6,
            ErrorCode::NoSuchUser => 7,
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct ErrorPacket {
    code: ErrorCode,
    message: String,
}

impl ErrorPacket {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        ErrorPacket {
            code,
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(OP_LEN + CODE_LEN + self.message.len() + 1);
        buf.write_u16::<NetworkEndian>(OP_ERR).unwrap();
        buf.write_u16::<NetworkEndian>(u16::from(self.code)).unwrap();
        buf.write_all(self.message.as_bytes()).unwrap();
        buf.write_u8(0).unwrap();
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<TftpPacket, TftpError> {
        let op = NetworkEndian::read_u16(&buf[0..OP_LEN]);
        if op != OP_ERR {
            return Err(TftpError::malformed(format!("bad ERROR opcode [{}]", op)));
        }

        let code = NetworkEndian::read_u16(&buf[OP_LEN..OP_LEN + CODE_LEN]);
        let rest = &buf[OP_LEN + CODE_LEN..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| TftpError::malformed("unterminated error message"))?;
        let message = str::from_utf8(&rest[..nul])
            .map_err(|_| TftpError::malformed("error message is not valid UTF-8"))?;

        Ok(TftpPacket::Err(ErrorPacket::new(code.into(), message)))
    }
}
