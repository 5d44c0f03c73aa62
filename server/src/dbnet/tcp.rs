/*
 * Created on Sat Oct 02 2021
 *
 * This file is a part of Treebase
 * Treebase (formerly known as ConcurrentDB) is a free and open-source
 * concurrent key/value database written by Sayan Nandan ("the Author") with
 * the vision to provide a heavily concurrent storage core without
 * compromising on correctness or simplicity.
 *
 * Copyright (c) 2021, Sayan Nandan <ohsayan@outlook.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

use super::connection::ConnectionHandler;
use super::{BaseListener, Terminator};
use crate::IoResult;
use std::cell::Cell;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;

/// This is a "marker trait" that ensures that no silly types are
/// passed into the [`Connection`] type
pub trait BufferedSocketStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl BufferedSocketStream for TcpStream {}

/// A backoff implementation that is meant to be used in connection loops
pub(super) struct NetBackoff {
    c: Cell<u8>,
}

impl NetBackoff {
    /// The maximum backoff duration
    const MAX_BACKOFF: u8 = 64;
    /// Create a new [`NetBackoff`] instance
    pub const fn new() -> Self {
        Self { c: Cell::new(1) }
    }
    /// Wait for the current backoff duration
    pub async fn spin(&self) {
        time::sleep(Duration::from_secs(self.c.get() as _)).await;
        self.c.set(self.c.get() << 1);
    }
    /// Should we disconnect the stream?
    pub fn should_disconnect(&self) -> bool {
        self.c.get() > Self::MAX_BACKOFF
    }
}

/// A buffered line transport over a duplex byte stream. One request line in,
/// one response line out
pub struct Connection<T> {
    stream: BufReader<T>,
    line: String,
}

impl<T: BufferedSocketStream> Connection<T> {
    pub fn new(stream: T) -> Self {
        Connection {
            stream: BufReader::new(stream),
            line: String::new(),
        }
    }
    /// Read one request line. `None` is the peer's half-close
    pub async fn read_line(&mut self) -> IoResult<Option<String>> {
        self.line.clear();
        match self.stream.read_line(&mut self.line).await? {
            0 => Ok(None),
            _ => Ok(Some(
                self.line
                    .trim_end_matches(|ch| ch == '\r' || ch == '\n')
                    .to_owned(),
            )),
        }
    }
    /// Write one response line and flush it out
    pub async fn write_line(&mut self, response: &str) -> IoResult<()> {
        self.stream.write_all(response.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await
    }
}

/// The TCP listener: accepts connections and spawns one session handler per
/// accepted stream
pub struct Listener {
    pub base: BaseListener,
}

impl Listener {
    pub fn new(base: BaseListener) -> Self {
        Listener { base }
    }
    /// Accept an incoming connection
    async fn accept(&mut self) -> IoResult<(TcpStream, SocketAddr)> {
        let backoff = NetBackoff::new();
        loop {
            match self.base.listener.accept().await {
                Ok((stream, peer)) => return Ok((stream, peer)),
                Err(e) => {
                    if backoff.should_disconnect() {
                        // Too many retries, goodbye user
                        return Err(e);
                    }
                }
            }
            // spin to wait for the backoff duration
            backoff.spin().await;
        }
    }
    /// Run the accept loop
    pub async fn run(&mut self) -> IoResult<()> {
        loop {
            // Take the permit first, but we won't use it right now
            // that's why we will forget it
            self.base.climit.acquire().await.unwrap().forget();
            /*
             SECURITY: Ignore any errors that may arise in the accept
             loop. If we apply the try operator here, we will immediately
             terminate the run loop causing the entire server to go down.
             Also, do not log any errors because many connection errors
             can arise and it will flood the log and might also result
             in a crash
            */
            let (stream, peer) = skip_loop_err!(self.accept().await);
            let mut chandle = ConnectionHandler::new(
                self.base.db.clone(),
                Connection::new(stream),
                peer,
                self.base.supervisor.clone(),
                self.base.climit.clone(),
                Terminator::new(self.base.signal.subscribe()),
                self.base.terminate_tx.clone(),
            );
            tokio::spawn(async move {
                if let Err(e) = chandle.run().await {
                    log::error!("Error: {}", e);
                }
            });
        }
    }
}
