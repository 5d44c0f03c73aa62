/*
 * Created on Sun Oct 03 2021
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

use super::supervisor::{self, Supervisor};
use super::tcp::{BufferedSocketStream, Connection};
use super::Terminator;
use crate::coredb::CoreDB;
use crate::queryengine::{self, ActionError};
use crate::IoResult;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// A generic session handler: one per accepted connection
pub struct ConnectionHandler<T> {
    /// an atomic reference to the shared store
    db: CoreDB,
    /// the connection
    con: Connection<T>,
    /// the peer address, kept for the registry entry
    peer: SocketAddr,
    /// the session supervisor
    supervisor: Arc<Supervisor>,
    /// the semaphore used to impose limits on the number of connections
    climit: Arc<Semaphore>,
    /// check for cancellation signals
    terminator: Terminator,
    /// the sender that we drop when we're done with handling a connection
    /// (used for graceful exit)
    _term_sig_tx: mpsc::Sender<()>,
}

impl<T: BufferedSocketStream> ConnectionHandler<T> {
    /// Create a new connection handler
    pub fn new(
        db: CoreDB,
        con: Connection<T>,
        peer: SocketAddr,
        supervisor: Arc<Supervisor>,
        climit: Arc<Semaphore>,
        terminator: Terminator,
        _term_sig_tx: mpsc::Sender<()>,
    ) -> Self {
        Self {
            db,
            con,
            peer,
            supervisor,
            climit,
            terminator,
            _term_sig_tx,
        }
    }
    pub async fn run(&mut self) -> IoResult<()> {
        // the admission gate comes first: a session turned away never joins
        // the registry. The token's drop deregisters us on every exit path,
        // and dropping the handler itself releases the drain sender and the
        // connection permit
        let _token = match self.supervisor.admit(self.peer) {
            Some(token) => token,
            None => return Ok(()),
        };
        let mut latch = self.supervisor.pause_watch();
        log::debug!("ConnectionHandler initialized to handle a remote client");
        loop {
            tokio::select! {
                _ = supervisor::wait_if_paused(&mut latch) => {}
                _ = self.terminator.receive_signal() => return Ok(()),
            }
            let read = tokio::select! {
                ret = self.con.read_line() => ret?,
                _ = self.terminator.receive_signal() => return Ok(()),
            };
            let cmd = match read {
                Some(cmd) => cmd,
                // the peer half-closed; we're done here
                None => return Ok(()),
            };
            // a command that arrived while the latch was being engaged is
            // not dispatched until the operator releases the latch
            tokio::select! {
                _ = supervisor::wait_if_paused(&mut latch) => {}
                _ = self.terminator.receive_signal() => return Ok(()),
            }
            let response = match queryengine::execute(&self.db, &mut self.terminator, &cmd).await {
                Ok(response) => response,
                Err(ActionError::Terminated) => return Ok(()),
            };
            self.con.write_line(&response).await?;
        }
    }
}

impl<T> Drop for ConnectionHandler<T> {
    fn drop(&mut self) {
        // Make sure that the permit is returned to the semaphore
        // in the case that there is a panic inside
        self.climit.add_permits(1);
    }
}
