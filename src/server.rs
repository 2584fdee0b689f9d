//! Unix domain socket transport.
//!
//! Every accepted connection gets its own thread, which decodes a stream of
//! JSON requests and answers each with one line of JSON. The threads share
//! nothing but a copy of the evaluator settings.

use std::fs;
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::net::Shutdown;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};
use serde_json::Value;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::{self, Signals};

use crate::config::Config;
use crate::error::ServerError;
use crate::eval::Evaluator;
use crate::rpc::{self, Response};

pub struct Server {
    listener: UnixListener,
    path: PathBuf,
    evaluator: Evaluator,
    shutdown: Arc<AtomicBool>,
}

/// Stops a running server from another thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    path: PathBuf,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }
        // accept() blocks, so knock on the door to make it look at the flag
        if let Err(e) = UnixStream::connect(&self.path) {
            debug!("could not wake up the accept loop: {}", e);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

struct Connection {
    id: u64,
    stream: UnixStream,
    handle: JoinHandle<()>,
}

impl Connection {
    fn close(self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!("connection {} already closed: {}", self.id, e);
        }
        if self.handle.join().is_err() {
            error!("connection {} thread panicked", self.id);
        }
    }
}

impl Server {
    /// Binds the socket, replacing any file left behind at that path.
    pub fn bind(config: &Config) -> Result<Server, ServerError> {
        let path = config.socket_path.clone();
        remove_socket_file(&path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ServerError::Bind {
                path: path.clone(),
                source,
            })?;
        }
        let listener = UnixListener::bind(&path).map_err(|source| ServerError::Bind {
            path: path.clone(),
            source,
        })?;
        info!("server started, listening on {}", path.display());
        Ok(Server {
            listener,
            path,
            evaluator: config.evaluator(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            path: self.path.clone(),
        }
    }

    /// Accepts connections until shut down, then closes the live ones and
    /// removes the socket file.
    pub fn run(self) {
        let mut connections: Vec<Connection> = Vec::new();
        let mut next_id = 0;

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("failed to accept connection: {}", e);
                    continue;
                }
            };

            connections.retain(|connection| !connection.handle.is_finished());
            next_id += 1;
            match self.spawn(stream, next_id) {
                Ok(connection) => connections.push(connection),
                Err(e) => warn!("failed to start connection {}: {}", next_id, e),
            }
        }

        info!("shutting down, closing {} connection(s)", connections.len());
        for connection in connections {
            connection.close();
        }
    }

    fn spawn(&self, stream: UnixStream, id: u64) -> io::Result<Connection> {
        let control = stream.try_clone()?;
        let evaluator = self.evaluator;
        let handle = thread::Builder::new()
            .name(format!("connection-{}", id))
            .spawn(move || {
                debug!("connection {} opened", id);
                match handle_connection(stream, &evaluator) {
                    Ok(()) => debug!("connection {} closed", id),
                    Err(e) if is_disconnect(&e) => info!("client {} closed the connection", id),
                    Err(e) => warn!("connection {} failed: {}", id, e),
                }
            })?;
        Ok(Connection {
            id,
            stream: control,
            handle,
        })
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        cleanup_socket(&self.path);
    }
}

/// Serves requests on one stream until the peer goes away.
///
/// Structural problems in a request are answered and the loop goes on.
/// Bytes that are not JSON at all get one error reply, then the connection
/// is dropped: there is no way to find where the next request starts.
///
pub fn handle_connection(stream: UnixStream, evaluator: &Evaluator) -> io::Result<()> {
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    let values = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();
    for value in values {
        let value = match value {
            Ok(value) => value,
            Err(e) if e.is_io() => return Err(e.into()),
            Err(e) if e.is_eof() => {
                debug!("client hung up in the middle of a request");
                return Ok(());
            }
            Err(e) => {
                warn!("failed to decode request: {}", e);
                write_response(&mut writer, &Response::malformed(&e))?;
                return Ok(());
            }
        };
        let response = rpc::handle_value(value, evaluator);
        write_response(&mut writer, &response)?;
    }
    Ok(())
}

fn write_response<W: Write>(writer: &mut W, response: &Response) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, response)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}

fn remove_socket_file(path: &Path) -> Result<(), ServerError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("removed stale socket file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ServerError::RemoveSocket {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn cleanup_socket(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("removed socket file {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => error!("failed to remove socket file {}: {}", path.display(), e),
    }
}

/// Shuts the server down on SIGINT or SIGTERM. The returned handle stops
/// listening for signals when closed.
pub fn install_signal_handler(shutdown: ShutdownHandle) -> Result<iterator::Handle, ServerError> {
    let mut signals = Signals::new(&[SIGINT, SIGTERM]).map_err(ServerError::Signal)?;
    let handle = signals.handle();
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!("received signal {}, shutting down", signal);
                shutdown.shutdown();
            }
        })
        .map_err(ServerError::Signal)?;
    Ok(handle)
}
