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

//! Long-running workers that accompany the listener: the operator REPL and
//! the interrupt monitor

pub mod repl;
pub mod signal;
