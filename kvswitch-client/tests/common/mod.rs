#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use kvswitch_client::settings::Settings;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

/// In-process RESP responder standing in for a store.
///
/// Replies: `PING` -> `+PONG` (or an error when `refuse_ping` is set),
/// `ECHO x` -> bulk `x`, `BOOM` -> error, `SLOW` -> `+OK` after 300ms,
/// anything else -> `+OK`.
pub struct MockStore {
    pub port: u16,
    log: Arc<Mutex<Vec<Vec<String>>>>,
    accepted: Arc<AtomicUsize>,
}

impl MockStore {
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    pub async fn start_refusing_ping() -> Self {
        Self::start_with(true).await
    }

    async fn start_with(refuse_ping: bool) -> Self {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let log = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let accept_log = Arc::clone(&log);
        let accept_count = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accept_count.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, Arc::clone(&accept_log), refuse_ping));
            }
        });

        Self {
            port,
            log,
            accepted,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            port: self.port,
            ..Settings::default()
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Command names seen so far, without connection handshake traffic.
    pub fn commands(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|args| args[0].clone())
            .filter(|name| name != "CLIENT" && name != "HELLO")
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.commands().iter().filter(|c| *c == name).count()
    }

    pub fn args_of(&self, name: &str) -> Vec<Vec<String>> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args[0] == name)
            .map(|args| args[1..].to_vec())
            .collect()
    }
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn serve(stream: TcpStream, log: Arc<Mutex<Vec<Vec<String>>>>, refuse_ping: bool) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    while let Some(args) = read_command(&mut reader).await {
        if args.is_empty() {
            break;
        }

        let name = args[0].to_ascii_uppercase();
        let mut logged = args.clone();
        logged[0] = name.clone();
        log.lock().unwrap().push(logged);

        let reply = match name.as_str() {
            "PING" if refuse_ping => b"-ERR ping refused\r\n".to_vec(),
            "PING" => b"+PONG\r\n".to_vec(),
            "ECHO" => bulk(args.get(1).map(String::as_str).unwrap_or("")),
            "BOOM" => b"-ERR boom\r\n".to_vec(),
            "SLOW" => {
                tokio::time::sleep(Duration::from_millis(300)).await;
                b"+OK\r\n".to_vec()
            }
            _ => b"+OK\r\n".to_vec(),
        };

        if write(&mut write_half, &reply).await.is_err() {
            break;
        }
    }
}

async fn write(stream: &mut OwnedWriteHalf, data: &[u8]) -> std::io::Result<()> {
    stream.write_all(data).await?;
    stream.flush().await
}

fn bulk(data: &str) -> Vec<u8> {
    format!("${}\r\n{}\r\n", data.len(), data).into_bytes()
}

async fn read_command(reader: &mut BufReader<OwnedReadHalf>) -> Option<Vec<String>> {
    let header = read_line(reader).await?;
    let count: usize = header.strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let len: usize = read_line(reader).await?.strip_prefix('$')?.parse().ok()?;
        let mut data = vec![0u8; len + 2];
        reader.read_exact(&mut data).await.ok()?;
        data.truncate(len);
        args.push(String::from_utf8_lossy(&data).into_owned());
    }

    Some(args)
}

async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> Option<String> {
    let mut line = String::new();
    let read = reader.read_line(&mut line).await.ok()?;
    if read == 0 {
        return None;
    }

    Some(line.trim_end_matches("\r\n").to_string())
}
