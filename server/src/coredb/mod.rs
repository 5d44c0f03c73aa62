/*
 * Created on Tue Sep 21 2021
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

//! The shared store: a cloneable handle over the storage tree

use std::fmt;
use std::fs::File;
use std::io;
use std::sync::Arc;

pub(crate) mod tree;
#[cfg(test)]
mod tests;

pub use tree::MAX_PAYLOAD;

pub type DbResult<T> = Result<T, DbError>;

/// Outcomes the store reports back to its callers; the query engine turns
/// these into wire responses
#[derive(Debug, PartialEq)]
pub enum DbError {
    /// the key is not in the database
    NotFound,
    /// an insert collided with an existing key
    DuplicateKey,
    /// a key or value larger than a node may carry
    OversizeInput,
    /// the print target could not be opened or written
    BadFile,
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "the key is not in the database"),
            Self::DuplicateKey => write!(f, "the key is already in the database"),
            Self::OversizeInput => write!(f, "the key or value is too large"),
            Self::BadFile => write!(f, "the print target could not be written"),
        }
    }
}

/// A handle to the shared in-memory store. Cloning is cheap and every clone
/// operates on the same tree
#[derive(Clone)]
pub struct CoreDB {
    pub(crate) shared: Arc<tree::Tree>,
}

impl CoreDB {
    pub fn new() -> Self {
        CoreDB {
            shared: Arc::new(tree::Tree::new()),
        }
    }
    /// Copy the value stored under `key` out of the tree
    pub fn query(&self, key: &str) -> DbResult<String> {
        self.shared.query(key).ok_or(DbError::NotFound)
    }
    /// Add a fresh key/value pair
    pub fn add(&self, key: &str, value: &str) -> DbResult<()> {
        self.shared.insert(key, value)
    }
    /// Remove a key and its value
    pub fn remove(&self, key: &str) -> DbResult<()> {
        self.shared.remove(key)
    }
    /// Print the tree to the given path, or to stdout when the path is
    /// absent or blank
    pub fn print(&self, path: Option<&str>) -> DbResult<()> {
        let path = path.map(str::trim).filter(|path| !path.is_empty());
        let outcome = match path {
            Some(path) => File::create(path).and_then(|mut file| self.shared.dump(&mut file)),
            None => self.shared.dump(&mut io::stdout().lock()),
        };
        outcome.map_err(|e| {
            log::error!("Failed to print the tree with: {}", e);
            DbError::BadFile
        })
    }
    /// Drop every node below the sentinel. The caller is responsible for
    /// having drained all sessions first
    pub fn teardown(&self) {
        self.shared.teardown()
    }
}
