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

use crate::coredb::CoreDB;
use crate::dbnet::supervisor::Supervisor;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::task;

/// Serve the operator until their input closes. Returning from here is what
/// sets the shutdown sequence in motion
pub async fn operator_loop(db: CoreDB, supervisor: Arc<Supervisor>) {
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            // EOF: the operator is done with us
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read from the terminal with: {}", e);
                break;
            }
        };
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("p") => {
                let path = tokens.next().map(ToOwned::to_owned);
                let handle = db.clone();
                // the dump blocks on node locks, so it runs off the async
                // workers
                let outcome = task::spawn_blocking(move || handle.print(path.as_deref()))
                    .await
                    .expect("Something caused the print task to panic");
                if let Err(e) = outcome {
                    log::error!("Failed to print the tree with: {}", e);
                }
            }
            Some("s") => {
                println!("stopping all clients");
                supervisor.pause_all();
            }
            Some("g") => {
                println!("releasing all clients");
                supervisor.release_all();
            }
            // anything else, blank lines included, just reprompts
            _ => continue,
        }
    }
    log::info!("The operator REPL has exited");
}
