/*
 * Created on Wed Oct 13 2021
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

use crate::coredb::CoreDB;
use crate::dbnet;
use crate::dbnet::supervisor::Supervisor;
use crate::services;
use crate::util::error::TreeResult;
use tokio::sync::broadcast;

/// Start the server and drive it until the operator's input closes, then
/// run the shutdown sequence: silence the interrupt monitor, close the
/// admission gate, cancel every session, drain to zero, tear the tree down
pub async fn run(port: u16) -> TreeResult<CoreDB> {
    // the broadcast channel that fans cancellations out to the sessions
    let (signal, _) = broadcast::channel(1);
    let db = CoreDB::new();
    let supervisor = Supervisor::new(signal.clone());

    // the interrupt monitor only ever cancels sessions; the server itself
    // outlives any number of SIGINTs
    let sigmon = tokio::spawn(services::signal::monitor_interrupts(supervisor.clone()));

    let mut server = dbnet::connect(port, db.clone(), supervisor.clone(), signal.clone()).await?;

    // the listener and the REPL race; whichever returns first (for the
    // REPL: the operator's EOF) cancels the other and begins shutdown. A
    // listener that dies on its own is a fatal condition
    tokio::select! {
        ret = server.run() => ret?,
        _ = services::repl::operator_loop(db.clone(), supervisor.clone()) => {}
    }

    log::info!("Signalling all workers to shut down");
    // the interrupt monitor goes first so that a late SIGINT cannot
    // interleave with the drain
    sigmon.abort();
    let _ = sigmon.await;
    // no session may join the registry past this point
    supervisor.close_gate();
    // every live session unblocks at its next cancellation point
    supervisor.cancel_all();
    drop(signal);
    // the drain barrier: wait for the last session to give up its sender
    server.base.release_self().await;
    assert_eq!(
        supervisor.session_count(),
        0,
        "all sessions drained but the registry is not empty"
    );
    db.teardown();
    Ok(db)
}
