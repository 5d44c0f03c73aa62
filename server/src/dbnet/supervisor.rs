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

//! # The session supervisor
//!
//! Everything the server knows about its sessions lives here: the registry
//! of who is connected, the admission gate that shutdown closes, the pause
//! latch the operator toggles and the cancellation fan-out. The pieces are
//! deliberately small; each field is guarded by its own primitive and none
//! of them is ever held across a node-lock acquisition

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// What the supervisor records about one live session
#[derive(Debug)]
pub struct SessionProfile {
    pub addr: SocketAddr,
}

pub struct Supervisor {
    /// the registry of live sessions
    registry: Mutex<HashMap<u64, SessionProfile>>,
    /// worker identities handed out so far
    next_id: AtomicU64,
    /// the admission gate; closed exactly once, during shutdown
    accepting: Mutex<bool>,
    /// the pause latch
    pause: watch::Sender<bool>,
    /// cancellation fan-out to every live session
    signal: broadcast::Sender<()>,
}

impl Supervisor {
    pub fn new(signal: broadcast::Sender<()>) -> Arc<Self> {
        let (pause, _) = watch::channel(false);
        Arc::new(Supervisor {
            registry: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            accepting: Mutex::new(true),
            pause,
            signal,
        })
    }
    /// Consult the admission gate and, if it is open, join the registry.
    /// A session turned away never registers; an admitted session owns a
    /// token whose drop is guaranteed to unlink it again
    pub fn admit(self: &Arc<Self>, addr: SocketAddr) -> Option<SessionToken> {
        if !*self.accepting.lock() {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.lock().insert(id, SessionProfile { addr });
        log::debug!("Session {} from {} joined", id, addr);
        Some(SessionToken {
            supervisor: self.clone(),
            id,
        })
    }
    /// Close the admission gate. There is no reopening it
    pub fn close_gate(&self) {
        *self.accepting.lock() = false;
    }
    /// Engage the pause latch: sessions hold between commands
    pub fn pause_all(&self) {
        let _ = self.pause.send(true);
    }
    /// Clear the latch and wake every parked session
    pub fn release_all(&self) {
        let _ = self.pause.send(false);
    }
    /// A latch subscription for one session
    pub fn pause_watch(&self) -> watch::Receiver<bool> {
        self.pause.subscribe()
    }
    /// Ask every live session to cancel itself at its next cancellation
    /// point. Sessions that already exited hold no receiver anymore and are
    /// skipped by construction. Returns how many sessions were registered
    /// at the time of the request
    pub fn cancel_all(&self) -> usize {
        let targets = self.session_count();
        let _ = self.signal.send(());
        targets
    }
    pub fn session_count(&self) -> usize {
        self.registry.lock().len()
    }
}

/// Registration handle for one session. Dropping it unlinks the session
/// from the registry on every exit path - EOF, transport error,
/// cancellation or panic
pub struct SessionToken {
    supervisor: Arc<Supervisor>,
    id: u64,
}

impl Drop for SessionToken {
    fn drop(&mut self) {
        match self.supervisor.registry.lock().remove(&self.id) {
            Some(profile) => log::debug!("Session {} from {} left", self.id, profile.addr),
            None => debug_assert!(false, "a session was deregistered twice"),
        }
    }
}

/// Park while the pause latch is engaged. Nothing is held across the
/// suspension, so a waiter cancelled in here leaves no state behind
pub async fn wait_if_paused(latch: &mut watch::Receiver<bool>) {
    while *latch.borrow_and_update() {
        if latch.changed().await.is_err() {
            // the supervisor is gone; there is nothing left to wait for
            break;
        }
    }
}
