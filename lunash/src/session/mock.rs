//! In-memory channel for tests.
//!
//! Every session is a `tokio::io::duplex` pair. Starting a shell or a
//! command spawns a scripted remote on the far end.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

use super::{PtyConfig, Session, SessionFactory, SessionIo, StreamIo};
use crate::error::{ChannelError, Result};

/// Session lifecycle events seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Opened,
    Pty { rows: u32, cols: u32, echo_off: bool },
    Shell,
    Exec(String),
    Closed,
}

/// What the remote was asked to run.
#[derive(Debug, Clone)]
pub(crate) enum Start {
    Shell,
    Exec(String),
}

type RemoteFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Remote = Arc<dyn Fn(Start, DuplexStream) -> RemoteFuture + Send + Sync>;

pub(crate) const PROMPT: &str = "lunash:>";

pub(crate) struct MockFactory {
    remote: Remote,
    events: Arc<Mutex<Vec<Event>>>,
    fail_open: bool,
    fail_close: bool,
}

impl MockFactory {
    pub(crate) fn new<F>(remote: F) -> Self
    where
        F: Fn(Start, DuplexStream) -> RemoteFuture + Send + Sync + 'static,
    {
        Self {
            remote: Arc::new(remote),
            events: Arc::new(Mutex::new(Vec::new())),
            fail_open: false,
            fail_close: false,
        }
    }

    /// A remote that never answers.
    pub(crate) fn idle() -> Self {
        Self::new(|_, _| Box::pin(async {}))
    }

    /// An appliance shell: echoes each command, then `reply(command)`,
    /// then the prompt. Output is written `chunk` bytes at a time.
    pub(crate) fn shell<R>(chunk: usize, reply: R) -> Self
    where
        R: Fn(&str) -> String + Send + Sync + 'static,
    {
        let reply = Arc::new(reply);
        Self::new(move |start, stream| {
            let reply = reply.clone();
            Box::pin(async move {
                if let Start::Shell = start {
                    appliance_shell(stream, chunk, reply.as_ref()).await;
                }
            })
        })
    }

    /// An `scp` sink/source backed by `store`.
    pub(crate) fn scp(store: Arc<Mutex<HashMap<String, Vec<u8>>>>) -> Self {
        Self::new(move |start, stream| {
            let store = store.clone();
            Box::pin(async move {
                if let Start::Exec(command) = start {
                    scp_remote(stream, &command, store).await;
                }
            })
        })
    }

    pub(crate) fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, event: Event) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }
}

impl SessionFactory for MockFactory {
    type Session = MockSession;

    async fn open_session(&self) -> Result<MockSession> {
        if self.fail_open {
            return Err(ChannelError::OpenFailed(russh::Error::Disconnect).into());
        }
        self.events.lock().unwrap().push(Event::Opened);
        let (local, remote_end) = tokio::io::duplex(4096);
        Ok(MockSession {
            io: StreamIo(local),
            remote_end: Some(remote_end),
            remote: self.remote.clone(),
            events: self.events.clone(),
            fail_close: self.fail_close,
            task: None,
        })
    }
}

pub(crate) struct MockSession {
    io: StreamIo<DuplexStream>,
    remote_end: Option<DuplexStream>,
    remote: Remote,
    events: Arc<Mutex<Vec<Event>>>,
    fail_close: bool,
    task: Option<JoinHandle<()>>,
}

impl MockSession {
    fn start(&mut self, start: Start) {
        if let Some(stream) = self.remote_end.take() {
            self.task = Some(tokio::spawn((self.remote)(start, stream)));
        }
    }
}

impl SessionIo for MockSession {
    async fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.io.write_all(data).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.io.read(buf).await
    }
}

impl Session for MockSession {
    async fn request_pty(&mut self, pty: &PtyConfig) -> Result<()> {
        self.events.lock().unwrap().push(Event::Pty {
            rows: pty.rows,
            cols: pty.cols,
            echo_off: pty.echo_disabled(),
        });
        Ok(())
    }

    async fn request_shell(&mut self) -> Result<()> {
        self.events.lock().unwrap().push(Event::Shell);
        self.start(Start::Shell);
        Ok(())
    }

    async fn exec(&mut self, command: &str) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Exec(command.to_string()));
        self.start(Start::Exec(command.to_string()));
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.events.lock().unwrap().push(Event::Closed);
        drop(self.io);
        drop(self.remote_end);
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
            }
        }
        if self.fail_close {
            return Err(ChannelError::CloseFailed {
                source: Box::new(std::io::Error::other("close refused")),
            }
            .into());
        }
        Ok(())
    }
}

async fn write_chunked(stream: &mut DuplexStream, data: &[u8], chunk: usize) -> bool {
    for piece in data.chunks(chunk.max(1)) {
        if stream.write_all(piece).await.is_err() {
            return false;
        }
        tokio::task::yield_now().await;
    }
    true
}

async fn read_line(stream: &mut DuplexStream) -> Option<String> {
    let mut line = Vec::new();
    loop {
        match stream.read_u8().await {
            Ok(b'\n') => return Some(String::from_utf8_lossy(&line).into_owned()),
            Ok(b) => line.push(b),
            Err(_) => return None,
        }
    }
}

async fn appliance_shell<R>(mut stream: DuplexStream, chunk: usize, reply: &R)
where
    R: Fn(&str) -> String + Send + Sync,
{
    let banner = format!("Last login: Mon Oct 19 16:40:00 2026\r\n\r\n{PROMPT}");
    if !write_chunked(&mut stream, banner.as_bytes(), chunk).await {
        return;
    }
    while let Some(line) = read_line(&mut stream).await {
        let command = line.trim_end_matches('\r');
        let text = format!("{command}\r\n{}\r\n{PROMPT}", reply(command));
        if !write_chunked(&mut stream, text.as_bytes(), chunk).await {
            return;
        }
    }
}

async fn scp_remote(
    mut stream: DuplexStream,
    command: &str,
    store: Arc<Mutex<HashMap<String, Vec<u8>>>>,
) {
    if let Some(path) = command.strip_prefix("scp -t ") {
        stream.write_all(&[0]).await.unwrap();
        let header = read_line(&mut stream).await.unwrap();
        let mut parts = header.splitn(3, ' ');
        assert_eq!(parts.next(), Some("C0644"));
        let len: usize = parts.next().unwrap().parse().unwrap();
        assert_eq!(parts.next(), Some(path));
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await.unwrap();
        store.lock().unwrap().insert(path.to_string(), payload);
        stream.write_all(&[0]).await.unwrap();
        assert_eq!(stream.read_u8().await.unwrap(), 0);
        stream.write_all(&[0]).await.unwrap();
    } else if let Some(path) = command.strip_prefix("scp -f ") {
        assert_eq!(stream.read_u8().await.unwrap(), 0);
        let file = store.lock().unwrap().get(path).cloned();
        let Some(file) = file else {
            let msg = format!("\x01scp: {path}: No such file or directory\n");
            stream.write_all(msg.as_bytes()).await.unwrap();
            return;
        };
        let name = path.rsplit('/').next().unwrap_or(path);
        let header = format!("C0644 {} {}\n", file.len(), name);
        stream.write_all(header.as_bytes()).await.unwrap();
        assert_eq!(stream.read_u8().await.unwrap(), 0);
        write_chunked(&mut stream, &file, 1000).await;
        assert_eq!(stream.read_u8().await.unwrap(), 0);
    } else {
        panic!("unexpected command: {command}");
    }
}
