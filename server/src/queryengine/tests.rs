/*
 * Created on Thu Oct 07 2021
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

use super::{execute, ActionError};
use crate::coredb::CoreDB;
use crate::dbnet::Terminator;
use std::path::PathBuf;
use tokio::sync::broadcast;

/// A terminator with its sender kept alive so no cancellation fires
fn quiet_terminator() -> (broadcast::Sender<()>, Terminator) {
    let (tx, rx) = broadcast::channel(1);
    (tx, Terminator::new(rx))
}

async fn run(db: &CoreDB, term: &mut Terminator, cmd: &str) -> String {
    execute(db, term, cmd).await.unwrap()
}

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("treed_qe_{}_{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_basic_wire_flow() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    assert_eq!(run(&db, &mut term, "a apple red").await, "added");
    assert_eq!(run(&db, &mut term, "q apple").await, "red");
    assert_eq!(run(&db, &mut term, "d apple").await, "removed");
    assert_eq!(run(&db, &mut term, "q apple").await, "not found");
}

#[tokio::test]
async fn test_duplicate_and_missing() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    assert_eq!(run(&db, &mut term, "a k v1").await, "added");
    assert_eq!(run(&db, &mut term, "a k v2").await, "already in database");
    assert_eq!(run(&db, &mut term, "q k").await, "v1");
    assert_eq!(run(&db, &mut term, "d ghost").await, "not in database");
}

#[tokio::test]
async fn test_ill_formed_commands() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    for cmd in ["", "q", " ", "  ", "x foo", "a key", "a", "d", "f", "zz"] {
        assert_eq!(run(&db, &mut term, cmd).await, "ill-formed command", "cmd: {:?}", cmd);
    }
}

#[tokio::test]
async fn test_verb_glued_to_its_argument() {
    // the verb is the first non-blank character; a separator is optional
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    assert_eq!(run(&db, &mut term, "afoo bar").await, "added");
    assert_eq!(run(&db, &mut term, "qfoo").await, "bar");
    assert_eq!(run(&db, &mut term, " q foo").await, "bar");
}

#[tokio::test]
async fn test_trailing_tokens_are_ignored() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    assert_eq!(run(&db, &mut term, "a k v junk trailing").await, "added");
    assert_eq!(run(&db, &mut term, "q k and more").await, "v");
}

#[tokio::test]
async fn test_overlong_token_splits_like_sscanf() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    let run_of_keys = "k".repeat(300);
    // the first 255 bytes become the key, the next 45 become the value
    assert_eq!(run(&db, &mut term, &format!("a {} v", run_of_keys)).await, "added");
    let key = "k".repeat(255);
    assert_eq!(run(&db, &mut term, &format!("q {}", key)).await, "k".repeat(45));
}

#[tokio::test]
async fn test_file_playback() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    let path = scratch_file("playback", "a k1 v1\na k2 v2\nd k1\nnot a command\n");
    let response = run(&db, &mut term, &format!("f {}", path.display())).await;
    assert_eq!(response, "file processed");
    assert_eq!(run(&db, &mut term, "q k1").await, "not found");
    assert_eq!(run(&db, &mut term, "q k2").await, "v2");
    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn test_nested_file_playback() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    let inner = scratch_file("nested_inner", "a deep value\n");
    let outer = scratch_file("nested_outer", &format!("a top level\nf {}\n", inner.display()));
    assert_eq!(
        run(&db, &mut term, &format!("f {}", outer.display())).await,
        "file processed"
    );
    assert_eq!(run(&db, &mut term, "q top").await, "level");
    assert_eq!(run(&db, &mut term, "q deep").await, "value");
    std::fs::remove_file(inner).unwrap();
    std::fs::remove_file(outer).unwrap();
}

#[tokio::test]
async fn test_file_with_bad_name() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    assert_eq!(
        run(&db, &mut term, "f /definitely/not/a/real/path").await,
        "bad file name"
    );
}

#[tokio::test]
async fn test_file_playback_observes_cancellation() {
    let db = CoreDB::new();
    let (tx, mut term) = quiet_terminator();
    let path = scratch_file("cancelled", "a k1 v1\na k2 v2\n");
    // the signal is already pending, so the first between-lines check trips
    tx.send(()).unwrap();
    assert_eq!(
        execute(&db, &mut term, &format!("f {}", path.display())).await,
        Err(ActionError::Terminated)
    );
    assert!(term.is_termination_signal());
    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn test_print_to_file_and_to_stdout() {
    let db = CoreDB::new();
    let (_tx, mut term) = quiet_terminator();
    assert_eq!(run(&db, &mut term, "a b 2").await, "added");
    let path = std::env::temp_dir().join(format!("treed_qe_{}_print", std::process::id()));
    assert_eq!(run(&db, &mut term, &format!("p {}", path.display())).await, "");
    let dumped = std::fs::read_to_string(&path).unwrap();
    assert_eq!(dumped, "(root)\n (null)\n b 2\n  (null)\n  (null)\n");
    // no path: the tree lands on stdout, the response stays empty
    assert_eq!(run(&db, &mut term, "p").await, "");
    assert_eq!(
        run(&db, &mut term, "p /definitely/not/a/real/dir/x").await,
        "bad file name"
    );
    std::fs::remove_file(path).unwrap();
}
