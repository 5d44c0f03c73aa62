/*
 * Created on Tue Oct 05 2021
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

//! # The query engine
//!
//! One command line goes in, one response line comes out. The verb is the
//! first non-blank character; whatever follows it is tokenized into runs of
//! at most 255 non-whitespace bytes. The interpreter never fails: anything
//! it cannot make sense of becomes an `ill-formed command` response. The
//! single exception is cancellation, which surfaces as an error so the
//! session can unwind through its cleanup

use crate::coredb::{CoreDB, DbError};
use crate::dbnet::Terminator;
use crate::protocol::responses::groups;
use crate::protocol::Tokens;
use std::future::Future;
use std::pin::Pin;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

#[cfg(test)]
mod tests;

/// The one way an action can end without producing a response
#[derive(Debug, PartialEq)]
pub enum ActionError {
    /// the session was asked to cancel mid-action
    Terminated,
}

pub type ActionResult<T> = Result<T, ActionError>;

/// Interpret one command line and produce the response for it.
///
/// Boxed because `f` plays files back through this same entry point, which
/// makes the future recursive
pub fn execute<'a>(
    db: &'a CoreDB,
    terminator: &'a mut Terminator,
    cmd: &'a str,
) -> Pin<Box<dyn Future<Output = ActionResult<String>> + Send + 'a>> {
    Box::pin(async move {
        // a single byte cannot be verb plus argument
        if cmd.len() <= 1 {
            return Ok(groups::ILL_FORMED.to_owned());
        }
        let trimmed = cmd.trim_start();
        let mut chars = trimmed.chars();
        let verb = match chars.next() {
            Some(verb) => verb,
            None => return Ok(groups::ILL_FORMED.to_owned()),
        };
        let mut tokens = Tokens::new(chars.as_str());
        let response = match verb {
            'q' => match tokens.next() {
                Some(key) => match db.query(key) {
                    Ok(value) => value,
                    Err(_) => groups::NOT_FOUND.to_owned(),
                },
                None => groups::ILL_FORMED.to_owned(),
            },
            'a' => match (tokens.next(), tokens.next()) {
                (Some(key), Some(value)) => match db.add(key, value) {
                    Ok(()) => groups::ADDED.to_owned(),
                    Err(DbError::DuplicateKey) => groups::ALREADY_IN_DB.to_owned(),
                    Err(_) => groups::ILL_FORMED.to_owned(),
                },
                _ => groups::ILL_FORMED.to_owned(),
            },
            'd' => match tokens.next() {
                Some(key) => match db.remove(key) {
                    Ok(()) => groups::REMOVED.to_owned(),
                    Err(_) => groups::NOT_IN_DB.to_owned(),
                },
                None => groups::ILL_FORMED.to_owned(),
            },
            'f' => match tokens.next() {
                Some(path) => run_file(db, terminator, path).await?,
                None => groups::ILL_FORMED.to_owned(),
            },
            'p' => match db.print(tokens.next()) {
                Ok(()) => groups::EMPTY.to_owned(),
                Err(_) => groups::BAD_FILE_NAME.to_owned(),
            },
            _ => groups::ILL_FORMED.to_owned(),
        };
        Ok(response)
    })
}

/// Play every line of the file at `path` through the interpreter. The
/// responses of the individual lines are dropped; the file's own response is
/// `file processed` once the last line ran
async fn run_file(
    db: &CoreDB,
    terminator: &mut Terminator,
    path: &str,
) -> ActionResult<String> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(_) => return Ok(groups::BAD_FILE_NAME.to_owned()),
    };
    let mut lines = BufReader::new(file).lines();
    loop {
        // a cancellation point between every two lines of the file
        if terminator.is_termination_signal() || terminator.check_terminate() {
            return Err(ActionError::Terminated);
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::debug!("Stopped reading the command file with: {}", e);
                break;
            }
        };
        execute(db, &mut *terminator, &line).await?;
    }
    Ok(groups::FILE_PROCESSED.to_owned())
}
