use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use minitftp::tftp::{client, server::Server, DEFAULT_PORT};

/// Minimal TFTP file transfer over UDP.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Opts {
    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Transfer a single file to or from a TFTP server.
    Client(ClientArgs),
    /// Serve files out of a storage directory, one client at a time.
    Server(ServerArgs),
}

#[derive(Args, Debug)]
struct ClientArgs {
    /// r downloads the file, w uploads it.
    direction: Direction,
    /// Name of the file to transfer.
    filename: String,
    /// Server address.
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,
    /// Server UDP port.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Local storage directory.
    #[arg(long, default_value = "client-files")]
    dir: PathBuf,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum Direction {
    /// Download from the server.
    R,
    /// Upload to the server.
    W,
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0")]
    address: String,
    /// UDP port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Storage directory served to clients.
    #[arg(long, default_value = "server-files")]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    match Opts::parse().subcmd {
        SubCommand::Client(args) => {
            let server = format!("{}:{}", args.address, args.port);
            match args.direction {
                Direction::R => {
                    println!("[DOWNLOAD] FILE: ({}) SERVER: {}", args.filename, server);
                    client::download(&server, &args.dir, &args.filename)
                        .with_context(|| format!("download of {} failed", args.filename))?;
                }
                Direction::W => {
                    println!("[UPLOAD] FILE: ({}) TO SERVER: {}", args.filename, server);
                    client::upload(&server, &args.dir, &args.filename)
                        .with_context(|| format!("upload of {} failed", args.filename))?;
                }
            }
            Ok(())
        }
        SubCommand::Server(args) => {
            let addr = format!("{}:{}", args.address, args.port);
            let server = Server::bind(&addr, args.dir)
                .with_context(|| format!("cannot bind {}", addr))?;
            server.run()
        }
    }
}
