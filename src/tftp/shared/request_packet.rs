use std::io::Write;
use std::str;

use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};

use crate::tftp::shared::error::TftpError;
use crate::tftp::shared::{TftpPacket, OP_LEN, OP_RRQ, OP_WRQ};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum RequestKind {
    Read,
    Write,
}

/// RRQ/WRQ: opcode, then filename and transfer mode, each NUL-terminated.
#[derive(Debug, Eq, PartialEq)]
pub struct RequestPacket {
    kind: RequestKind,
    filename: String,
    mode: String,
}

impl RequestPacket {
    pub fn new(kind: RequestKind, filename: &str, mode: &str) -> Self {
        RequestPacket {
            kind,
            filename: filename.to_string(),
            mode: mode.to_string(),
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let length = OP_LEN + self.filename.len() + 1 + self.mode.len() + 1;
        let mut buf = Vec::with_capacity(length);

        let op = match self.kind {
            RequestKind::Read => OP_RRQ,
            RequestKind::Write => OP_WRQ,
        };
        buf.write_u16::<NetworkEndian>(op).unwrap();
        buf.write_all(self.filename.as_bytes()).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_all(self.mode.as_bytes()).unwrap();
        buf.write_u8(0).unwrap();
        buf
    }

    /// Parses a request from a received datagram.
    ///
    /// Both string scans stop at the datagram boundary; a request whose
    /// filename or mode never terminates is rejected instead of read past
    /// the buffer. An empty filename parses fine, the server rejects it
    /// when handling the request.
    pub fn parse(buf: &[u8]) -> Result<TftpPacket, TftpError> {
        let op = NetworkEndian::read_u16(&buf[0..OP_LEN]);
        let kind = match op {
            OP_RRQ => RequestKind::Read,
            OP_WRQ => RequestKind::Write,
            _ => return Err(TftpError::malformed(format!("bad request opcode [{}]", op))),
        };

        let (filename, rest) = read_cstr(&buf[OP_LEN..], "filename")?;
        let (mode, _) = read_cstr(rest, "mode")?;

        let packet = RequestPacket::new(kind, filename, mode);
        Ok(match kind {
            RequestKind::Read => TftpPacket::Rrq(packet),
            RequestKind::Write => TftpPacket::Wrq(packet),
        })
    }
}

/// Splits one NUL-terminated string off the front of `buf`.
fn read_cstr<'a>(buf: &'a [u8], field: &str) -> Result<(&'a str, &'a [u8]), TftpError> {
    let nul = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| TftpError::malformed(format!("unterminated {} field", field)))?;
    let s = str::from_utf8(&buf[..nul])
        .map_err(|_| TftpError::malformed(format!("{} field is not valid UTF-8", field)))?;
    Ok((s, &buf[nul + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE_NAME: &str = "notes.txt";
    const MODE: &str = "octet";

    fn wire(op: u8) -> Vec<u8> {
        let mut buf = vec![0x0, op];
        buf.extend_from_slice(FILE_NAME.as_bytes());
        buf.push(0);
        buf.extend_from_slice(MODE.as_bytes());
        buf.push(0);
        buf
    }

    #[test]
    fn serialize_rrq() {
        let p = RequestPacket::new(RequestKind::Read, FILE_NAME, MODE);
        assert_eq!(p.to_bytes(), wire(0x1));
    }

    #[test]
    fn serialize_wrq() {
        let p = RequestPacket::new(RequestKind::Write, FILE_NAME, MODE);
        assert_eq!(p.to_bytes(), wire(0x2));
    }

    #[test]
    fn deserialize_rrq() {
        match RequestPacket::parse(&wire(0x1)).unwrap() {
            TftpPacket::Rrq(p) => {
                assert_eq!(p.kind(), RequestKind::Read);
                assert_eq!(p.filename(), FILE_NAME);
                assert_eq!(p.mode(), MODE);
            }
            other => panic!("wrong packet type: {}", other),
        }
    }

    #[test]
    fn deserialize_empty_filename() {
        let buf = [0x0, 0x2, 0x0, b'o', b'c', b't', b'e', b't', 0x0];
        match RequestPacket::parse(&buf).unwrap() {
            TftpPacket::Wrq(p) => assert_eq!(p.filename(), ""),
            other => panic!("wrong packet type: {}", other),
        }
    }

    #[test]
    fn deserialize_unterminated_filename() {
        let buf = [0x0, 0x1, b'a', b'b', b'c'];
        assert!(matches!(
            RequestPacket::parse(&buf),
            Err(TftpError::Malformed(_))
        ));
    }

    #[test]
    fn deserialize_missing_mode() {
        let buf = [0x0, 0x1, b'a', 0x0, b'o'];
        assert!(matches!(
            RequestPacket::parse(&buf),
            Err(TftpError::Malformed(_))
        ));
    }

    #[test]
    fn deserialize_bad_utf8() {
        let buf = [0x0, 0x1, 0xFF, 0xFE, 0x0, b'o', 0x0];
        assert!(matches!(
            RequestPacket::parse(&buf),
            Err(TftpError::Malformed(_))
        ));
    }

    #[test]
    fn round_trip() {
        let p = RequestPacket::new(RequestKind::Write, "dir/report.bin", "octet");
        let bytes = p.to_bytes();
        assert_eq!(
            RequestPacket::parse(&bytes).unwrap(),
            TftpPacket::Wrq(RequestPacket::new(RequestKind::Write, "dir/report.bin", "octet"))
        );
    }
}
