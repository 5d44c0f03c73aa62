/*
 * Created on Wed Sep 15 2021
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

//! # Treebase
//!
//! The `treed` crate is Treebase's database server: a line protocol over
//! TCP in front of an in-memory key/value tree that many sessions read and
//! write concurrently. See the modules for their respective documentation.

use env_logger::Builder;
use libtree::util::terminal;
use std::env;
use std::process;
use std::sync::Arc;

mod arbiter;
mod coredb;
mod dbnet;
mod protocol;
mod queryengine;
mod services;
mod util;

use crate::util::error::{Error, TreeResult};

/// A generic result of type `T` with an I/O error bound
pub type IoResult<T> = std::io::Result<T>;

#[cfg(all(not(target_env = "msvc"), not(miri)))]
use jemallocator::Jemalloc;

#[cfg(all(not(target_env = "msvc"), not(miri)))]
#[global_allocator]
/// Jemallocator - this is the default memory allocator for platforms other than msvc
static GLOBAL: Jemalloc = Jemalloc;

fn main() {
    Builder::new()
        .parse_filters(&env::var("TREE_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    // a disconnecting peer must never take the server down with it
    util::os::dismiss_sigpipe();
    let port = match check_args_and_get_port() {
        Ok(port) => port,
        Err(e) => {
            log::error!("{}", e);
            process::exit(0x100);
        }
    };
    println!("Treebase v{} | {}", libtree::VERSION, libtree::URL);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("server")
        .enable_all()
        .build()
        .unwrap();
    let db = match runtime.block_on(arbiter::run(port)) {
        Ok(db) => db,
        Err(e) => {
            log::error!("{}", e);
            process::exit(0x100);
        }
    };
    // Make sure all background workers terminate
    drop(runtime);
    assert_eq!(
        Arc::strong_count(&db.shared),
        1,
        "Maybe the compiler reordered the drop causing more than one instance of CoreDB to live at this point"
    );
    log::info!("Stopped accepting incoming connections");
    terminal::write_info("Goodbye :)\n").unwrap();
}

/// This function checks the command line arguments: the server takes
/// exactly one, the port to listen on
fn check_args_and_get_port() -> TreeResult<u16> {
    let mut args = env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(port), None) => port
            .parse()
            .map_err(|_| Error::OtherError(format!("invalid port: '{}'", port))),
        _ => Err(Error::OtherError("Usage: treed <port>".to_owned())),
    }
}
