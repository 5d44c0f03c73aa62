/*
 * Created on Sat Oct 09 2021
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

use crate::dbnet::supervisor::Supervisor;
use std::sync::Arc;

/// The interrupt monitor: the one worker that consumes SIGINT. Every
/// delivery cancels all live sessions; none of them stops the server.
/// Registering the handler also strips SIGINT of its default
/// kill-the-process disposition for the whole program
#[cfg(unix)]
pub async fn monitor_interrupts(supervisor: Arc<Supervisor>) {
    use tokio::signal::unix::{signal, SignalKind};
    let mut interrupts = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("Failed to bind to SIGINT with: {}", e);
            return;
        }
    };
    while interrupts.recv().await.is_some() {
        // the notice goes to stdout, next to the operator's own messages
        println!("SIGINT received, cancelling all clients");
        let asked = supervisor.cancel_all();
        log::debug!("Cancellation requested for {} sessions", asked);
    }
}

#[cfg(not(unix))]
pub async fn monitor_interrupts(supervisor: Arc<Supervisor>) {
    loop {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        println!("SIGINT received, cancelling all clients");
        let asked = supervisor.cancel_all();
        log::debug!("Cancellation requested for {} sessions", asked);
    }
}
