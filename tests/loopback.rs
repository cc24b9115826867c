//! End-to-end tests over UDP loopback: a real server thread, the real
//! client entry points, per-test storage directories.

use std::fs;
use std::net::UdpSocket;
use std::thread;

use tempfile::TempDir;

use minitftp::tftp::client;
use minitftp::tftp::server::Server;
use minitftp::tftp::shared::err_packet::ErrorCode;
use minitftp::tftp::shared::error::TftpError;
use minitftp::tftp::shared::request_packet::{RequestKind, RequestPacket};
use minitftp::tftp::shared::{parse_packet, TftpPacket, MAX_PACKET_LEN};

/// Binds a server on an ephemeral loopback port, runs it on a background
/// thread, and hands back its address string plus the storage root.
fn start_server() -> (String, TempDir) {
    let root = TempDir::new().unwrap();
    let server = Server::bind("127.0.0.1:0", root.path()).unwrap();
    let addr = server.local_addr().unwrap().to_string();
    thread::spawn(move || server.run());
    (addr, root)
}

fn pattern(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

#[test]
fn upload_then_download_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (server, server_root) = start_server();

    for size in [0usize, 511, 512, 513, 1024, 10_000] {
        let name = format!("blob_{}.bin", size);
        let data = pattern(size);

        let upload_root = TempDir::new().unwrap();
        fs::write(upload_root.path().join(&name), &data).unwrap();
        let sent = client::upload(&server, upload_root.path(), &name).unwrap();
        assert_eq!(sent, size as u64);
        assert_eq!(fs::read(server_root.path().join(&name)).unwrap(), data);

        let download_root = TempDir::new().unwrap();
        let received = client::download(&server, download_root.path(), &name).unwrap();
        assert_eq!(received, size as u64);
        assert_eq!(fs::read(download_root.path().join(&name)).unwrap(), data);
    }
}

#[test]
fn illegal_opcode_gets_error_reply_and_loop_survives() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (server, server_root) = start_server();

    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.send_to(&[0x0, 0x9, 0x0, 0x0], &server).unwrap();

    let mut buf = [0u8; MAX_PACKET_LEN];
    let (len, _) = socket.recv_from(&mut buf).unwrap();
    match parse_packet(&buf[..len]).unwrap() {
        TftpPacket::Err(e) => {
            assert_eq!(e.code(), ErrorCode::IllegalOperation);
            assert_eq!(e.message(), "Illegal TFTP operation.");
        }
        other => panic!("expected ERR, got {}", other),
    }

    // The dispatch loop must still serve a valid request afterwards.
    let client_root = TempDir::new().unwrap();
    let data = pattern(600);
    fs::write(client_root.path().join("after.bin"), &data).unwrap();
    client::upload(&server, client_root.path(), "after.bin").unwrap();
    assert_eq!(fs::read(server_root.path().join("after.bin")).unwrap(), data);
}

#[test]
fn short_datagram_gets_error_reply_not_a_crash() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (server, server_root) = start_server();

    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.send_to(&[0x0, 0x1], &server).unwrap();

    let mut buf = [0u8; MAX_PACKET_LEN];
    let (len, _) = socket.recv_from(&mut buf).unwrap();
    match parse_packet(&buf[..len]).unwrap() {
        TftpPacket::Err(e) => assert_eq!(e.code(), ErrorCode::IllegalOperation),
        other => panic!("expected ERR, got {}", other),
    }

    let client_root = TempDir::new().unwrap();
    fs::write(client_root.path().join("still-up.bin"), pattern(17)).unwrap();
    client::upload(&server, client_root.path(), "still-up.bin").unwrap();
    assert!(server_root.path().join("still-up.bin").exists());
}

#[test]
fn empty_filename_write_is_rejected_and_creates_nothing() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (server, server_root) = start_server();

    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let wrq = RequestPacket::new(RequestKind::Write, "", "octet");
    socket.send_to(&wrq.to_bytes(), &server).unwrap();

    let mut buf = [0u8; MAX_PACKET_LEN];
    let (len, _) = socket.recv_from(&mut buf).unwrap();
    match parse_packet(&buf[..len]).unwrap() {
        TftpPacket::Err(e) => assert_eq!(e.message(), "Filename is missing."),
        other => panic!("expected ERR, got {}", other),
    }

    assert_eq!(fs::read_dir(server_root.path()).unwrap().count(), 0);
}

#[test]
fn download_of_missing_file_surfaces_peer_error() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (server, _server_root) = start_server();

    let client_root = TempDir::new().unwrap();
    let err = client::download(&server, client_root.path(), "no-such-file").unwrap_err();
    match err {
        TftpError::Peer { code, message } => {
            assert_eq!(code, u16::from(ErrorCode::FileNotFound));
            assert_eq!(message, "File not found.");
        }
        other => panic!("unexpected error: {}", other),
    }
}
