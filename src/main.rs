// SPDX-License-Identifier: MIT
// Copyright 2025. Thomas Bertschinger

use clap::Parser;
use log::*;
use thiserror::Error;

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

/// The position record sent once on every connection: latitude 46.344877,
/// longitude -1.466214 in the server's binary encoding. The simulator
/// transmits it verbatim and never interprets it.
const POSITION_MSG: [u8; 10] = [0x00, 0x08, 0x02, 0xc3, 0x2a, 0xad, 0xff, 0xe9, 0xa0, 0x9a];

const RECV_BUF_SIZE: usize = 1024;

#[derive(Parser)]
struct Args {
    /// Target host, an IP literal or a resolvable name.
    #[arg(long)]
    ip: String,

    /// Target TCP port.
    #[arg(long, default_value_t = 1664, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Number of concurrent simulated clients.
    #[arg(long, default_value_t = 10)]
    connections: usize,

    /// Clients launched per batch; 0 launches everything at once.
    #[arg(long, default_value_t = 10)]
    batch_size: usize,

    /// Pause before each launch batch, in milliseconds.
    #[arg(long, default_value_t = 200)]
    batch_delay_ms: u64,
}

/// Single failure class for a connection attempt, wrapping whatever I/O
/// error ended it. Logged by the owning worker, never returned to the driver.
#[derive(Debug, Error)]
#[error("failed to connect to {target}: {cause}")]
struct ConnectionAttemptFailed {
    target: String,
    cause: io::Error,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!(
        "{} v{}: {} connection(s) to {}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        args.connections,
        args.ip,
        args.port,
    );

    let mut handles = Vec::with_capacity(args.connections);
    for id in 0..args.connections {
        if args.batch_size != 0 && id % args.batch_size == 0 {
            thread::sleep(Duration::from_millis(args.batch_delay_ms));
        }

        let host = args.ip.clone();
        let port = args.port;
        handles.push(thread::spawn(move || simulate_client(id, &host, port)));
    }

    // Individual failures have already been logged; the exit code stays 0.
    for handle in handles {
        if handle.join().is_err() {
            error!("client thread panicked");
        }
    }
}

/// One simulated client. The outcome is reported through the log only, so a
/// failed attempt cannot take down its siblings or the driver.
fn simulate_client(id: usize, host: &str, port: u16) {
    if let Err(cause) = connection_attempt(id, host, port) {
        let e = ConnectionAttemptFailed {
            target: format!("{host}:{port}"),
            cause,
        };
        warn!("client {id}: {e}");
    }
}

/// Connect, send the position message once, then drain whatever the server
/// streams back until it closes the connection.
fn connection_attempt(id: usize, host: &str, port: u16) -> io::Result<()> {
    // The (host, port) tuple goes through ToSocketAddrs, so names resolve
    // and IPv6 literals work without bracket handling.
    let mut stream = TcpStream::connect((host, port))?;
    info!("client {id}: connected to {host}:{port}");

    stream.write_all(&POSITION_MSG)?;

    let mut buf = [0u8; RECV_BUF_SIZE];
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
    }

    drop(stream);
    info!("client {id}: disconnected from {host}:{port}");

    Ok(())
}
