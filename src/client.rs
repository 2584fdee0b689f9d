use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use log::debug;
use serde_json::{json, Value};

use crate::error::ClientError;
use crate::rpc::{Outcome, Request, Response, EVALUATE};

/// A blocking client for the socket server. Requests are sent one at a time
/// and each waits for its response.
pub struct Client {
    writer: UnixStream,
    reader: BufReader<UnixStream>,
    next_id: u64,
}

impl Client {
    pub fn connect<P: AsRef<Path>>(path: P) -> Result<Client, ClientError> {
        let writer = UnixStream::connect(path.as_ref())?;
        let reader = BufReader::new(writer.try_clone()?);
        Ok(Client {
            writer,
            reader,
            next_id: 1,
        })
    }

    pub fn call(&mut self, method: &str, params: Value) -> Result<Response, ClientError> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&Request::new(id, method, params))
    }

    pub fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        self.read_response()
    }

    /// Reads the next response line, however it was provoked.
    pub fn read_response(&mut self) -> Result<Response, ClientError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(ClientError::Closed);
        }
        debug!("received {}", line.trim_end());
        Ok(serde_json::from_str(&line)?)
    }

    /// Sends raw bytes, bypassing request encoding.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Evaluates `expression` remotely and returns the printed result.
    pub fn evaluate(&mut self, expression: &str) -> Result<String, ClientError> {
        let response = self.call(EVALUATE, json!({ "expression": expression }))?;
        match response.outcome {
            Outcome::Result(result) => match result.get("expression").and_then(Value::as_str) {
                Some(expression) => Ok(expression.to_string()),
                None => Err(ClientError::UnexpectedResult(result)),
            },
            Outcome::Error(err) => Err(ClientError::Remote(err)),
        }
    }
}
