/*
 * Created on Mon Sep 27 2021
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

//! Pre-defined response lines

/// The literals the interpreter answers with
pub mod groups {
    /// an insert went through
    pub const ADDED: &str = "added";
    /// an insert hit an existing key
    pub const ALREADY_IN_DB: &str = "already in database";
    /// a delete went through
    pub const REMOVED: &str = "removed";
    /// a delete missed
    pub const NOT_IN_DB: &str = "not in database";
    /// a query missed
    pub const NOT_FOUND: &str = "not found";
    /// a command file was played to the end
    pub const FILE_PROCESSED: &str = "file processed";
    /// a file path could not be opened
    pub const BAD_FILE_NAME: &str = "bad file name";
    /// the line failed to parse as any command
    pub const ILL_FORMED: &str = "ill-formed command";
    /// commands that succeed without anything to say
    pub const EMPTY: &str = "";
}
