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

//! # `dbnet` - The network and session layer
//!
//! This module provides the TCP listener, the per-session connection
//! handlers and the supervisor that watches over them. Sessions are
//! cancelled cooperatively: every handler owns a [`Terminator`] and consults
//! it at each of its suspension points, so a session that is inside a tree
//! operation always finishes it (and releases its locks) before it can
//! observe a cancellation.

use crate::coredb::CoreDB;
use crate::util::error::{Error, TreeResult};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Semaphore};

use self::supervisor::Supervisor;

#[macro_use]
mod macros;
mod connection;
pub mod supervisor;
mod tcp;

pub use self::tcp::Listener;

/// The ceiling on simultaneously connected sessions
pub const MAXIMUM_CONNECTION_LIMIT: usize = 50000;

/// Responsible for gracefully shutting down a worker instead of dying
/// randomly
pub struct Terminator {
    terminate: bool,
    signal: broadcast::Receiver<()>,
}

impl Terminator {
    /// Create a new `Terminator` instance
    pub const fn new(signal: broadcast::Receiver<()>) -> Self {
        Terminator {
            terminate: false,
            signal,
        }
    }
    /// Check if the signal is a termination signal
    pub const fn is_termination_signal(&self) -> bool {
        self.terminate
    }
    /// Wait to receive a cancellation signal
    pub async fn receive_signal(&mut self) {
        if self.terminate {
            return;
        }
        let _ = self.signal.recv().await;
        self.terminate = true;
    }
    /// Poll for a pending cancellation without suspending; the cancellation
    /// point between the lines of a command file
    pub fn check_terminate(&mut self) -> bool {
        use broadcast::error::TryRecvError;
        if self.terminate {
            return true;
        }
        match self.signal.try_recv() {
            Ok(()) | Err(TryRecvError::Closed) | Err(TryRecvError::Lagged(_)) => {
                self.terminate = true;
                true
            }
            Err(TryRecvError::Empty) => false,
        }
    }
}

/// The base TCP listener
pub struct BaseListener {
    /// an atomic reference to the shared store
    pub db: CoreDB,
    /// the session supervisor
    pub supervisor: Arc<Supervisor>,
    /// The incoming connection listener (binding)
    pub listener: TcpListener,
    /// The maximum number of connections
    pub climit: Arc<Semaphore>,
    /// The cancellation broadcaster
    pub signal: broadcast::Sender<()>,
    // When all `Sender`s are dropped - the `Receiver` gets a `None` value;
    // we send a clone of `terminate_tx` to each session handler
    pub terminate_tx: mpsc::Sender<()>,
    pub terminate_rx: mpsc::Receiver<()>,
}

impl BaseListener {
    pub async fn init(
        db: &CoreDB,
        supervisor: Arc<Supervisor>,
        host: IpAddr,
        port: u16,
        semaphore: Arc<Semaphore>,
        signal: broadcast::Sender<()>,
    ) -> TreeResult<Self> {
        let (terminate_tx, terminate_rx) = mpsc::channel(1);
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| Error::ioerror_extra(e, format!("binding to port {port}")))?;
        Ok(Self {
            db: db.clone(),
            supervisor,
            listener,
            climit: semaphore,
            signal,
            terminate_tx,
            terminate_rx,
        })
    }
    /// The drain barrier: give up our own handles on the cancellation and
    /// drain channels, then wait until the last session has dropped its
    /// sender
    pub async fn release_self(self) {
        let Self {
            mut terminate_rx,
            terminate_tx,
            signal,
            ..
        } = self;
        drop(signal);
        drop(terminate_tx);
        let _ = terminate_rx.recv().await;
    }
}

/// Initialize the database networking
pub async fn connect(
    port: u16,
    db: CoreDB,
    supervisor: Arc<Supervisor>,
    signal: broadcast::Sender<()>,
) -> TreeResult<Listener> {
    let climit = Arc::new(Semaphore::new(MAXIMUM_CONNECTION_LIMIT));
    let base = BaseListener::init(
        &db,
        supervisor,
        IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        port,
        climit,
        signal,
    )
    .await?;
    log::info!("Server started on 0.0.0.0:{}", port);
    Ok(Listener::new(base))
}
