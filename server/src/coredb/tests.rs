/*
 * Created on Thu Sep 23 2021
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

mod single_session {
    use super::super::{CoreDB, DbError};

    #[test]
    fn test_add_query_remove_roundtrip() {
        let db = CoreDB::new();
        assert_eq!(db.add("apple", "red"), Ok(()));
        assert_eq!(db.query("apple"), Ok("red".to_owned()));
        assert_eq!(db.remove("apple"), Ok(()));
        assert_eq!(db.query("apple"), Err(DbError::NotFound));
    }

    #[test]
    fn test_duplicate_add_keeps_first_value() {
        let db = CoreDB::new();
        assert_eq!(db.add("k", "v1"), Ok(()));
        assert_eq!(db.add("k", "v2"), Err(DbError::DuplicateKey));
        assert_eq!(db.query("k"), Ok("v1".to_owned()));
    }

    #[test]
    fn test_remove_is_idempotent_in_outcome() {
        let db = CoreDB::new();
        assert_eq!(db.add("k", "v"), Ok(()));
        assert_eq!(db.remove("k"), Ok(()));
        assert_eq!(db.remove("k"), Err(DbError::NotFound));
    }

    #[test]
    fn test_query_missing() {
        let db = CoreDB::new();
        assert_eq!(db.query("ghost"), Err(DbError::NotFound));
    }

    #[test]
    fn test_oversize_payloads_are_rejected() {
        let db = CoreDB::new();
        let big = "x".repeat(super::super::MAX_PAYLOAD + 1);
        assert_eq!(db.add(&big, "v"), Err(DbError::OversizeInput));
        assert_eq!(db.add("k", &big), Err(DbError::OversizeInput));
        assert_eq!(db.query(&big), Err(DbError::NotFound));
    }

    #[test]
    fn test_teardown_leaves_a_usable_sentinel() {
        let db = CoreDB::new();
        for key in ["m", "f", "t"] {
            db.add(key, "v").unwrap();
        }
        db.teardown();
        assert_eq!(db.query("m"), Err(DbError::NotFound));
        // the sentinel survives, so the store keeps working
        assert_eq!(db.add("m", "again"), Ok(()));
        assert_eq!(db.query("m"), Ok("again".to_owned()));
    }
}

mod delete_shapes {
    use super::super::{CoreDB, DbError};

    fn seeded() -> CoreDB {
        // m is the subtree root; f/t its children; c/j and p/z below them
        let db = CoreDB::new();
        for (key, value) in [
            ("m", "1"),
            ("f", "2"),
            ("t", "3"),
            ("c", "4"),
            ("j", "5"),
            ("p", "6"),
            ("z", "7"),
        ] {
            db.add(key, value).unwrap();
        }
        db
    }

    #[test]
    fn test_remove_leaf() {
        let db = seeded();
        assert_eq!(db.remove("c"), Ok(()));
        assert_eq!(db.query("c"), Err(DbError::NotFound));
        assert_eq!(db.query("f"), Ok("2".to_owned()));
        assert_eq!(db.query("j"), Ok("5".to_owned()));
    }

    #[test]
    fn test_remove_node_with_only_left_child() {
        let db = CoreDB::new();
        db.add("m", "1").unwrap();
        db.add("f", "2").unwrap();
        db.add("c", "3").unwrap();
        assert_eq!(db.remove("f"), Ok(()));
        assert_eq!(db.query("f"), Err(DbError::NotFound));
        assert_eq!(db.query("c"), Ok("3".to_owned()));
        assert_eq!(db.query("m"), Ok("1".to_owned()));
    }

    #[test]
    fn test_remove_node_with_only_right_child() {
        let db = CoreDB::new();
        db.add("m", "1").unwrap();
        db.add("t", "2").unwrap();
        db.add("z", "3").unwrap();
        assert_eq!(db.remove("t"), Ok(()));
        assert_eq!(db.query("t"), Err(DbError::NotFound));
        assert_eq!(db.query("z"), Ok("3".to_owned()));
    }

    #[test]
    fn test_remove_with_two_children_uses_the_successor() {
        let db = seeded();
        assert_eq!(db.remove("m"), Ok(()));
        assert_eq!(db.query("m"), Err(DbError::NotFound));
        for (key, value) in [("f", "2"), ("t", "3"), ("c", "4"), ("j", "5"), ("p", "6"), ("z", "7")]
        {
            assert_eq!(db.query(key), Ok(value.to_owned()));
        }
        // the subtree root's slot now carries the successor's payload
        let inorder = db.shared.collect_inorder();
        let keys: Vec<&str> = inorder.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["c", "f", "j", "p", "t", "z"]);
    }

    #[test]
    fn test_remove_successor_with_a_right_subtree() {
        // the successor itself has a right child that must be hoisted
        let db = CoreDB::new();
        for (key, value) in [("m", "1"), ("t", "2"), ("p", "3"), ("r", "4"), ("z", "5"), ("f", "6")]
        {
            db.add(key, value).unwrap();
        }
        assert_eq!(db.remove("m"), Ok(()));
        let inorder = db.shared.collect_inorder();
        let keys: Vec<&str> = inorder.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["f", "p", "r", "t", "z"]);
        assert_eq!(db.query("r"), Ok("4".to_owned()));
    }

    #[test]
    fn test_remove_walks_a_deep_left_spine_to_the_successor() {
        // the right subtree's left spine is three edges long: the walk goes
        // z, t, p before it reaches the successor n, and n's own right
        // child o is hoisted into p's left edge
        let db = CoreDB::new();
        for (key, value) in [
            ("m", "1"),
            ("f", "7"),
            ("z", "2"),
            ("t", "3"),
            ("p", "4"),
            ("n", "5"),
            ("o", "6"),
        ] {
            db.add(key, value).unwrap();
        }
        assert_eq!(db.remove("m"), Ok(()));
        assert_eq!(db.query("m"), Err(DbError::NotFound));
        assert_eq!(db.query("f"), Ok("7".to_owned()));
        assert_eq!(db.query("n"), Ok("5".to_owned()));
        assert_eq!(db.query("o"), Ok("6".to_owned()));
        let inorder = db.shared.collect_inorder();
        let keys: Vec<&str> = inorder.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["f", "n", "o", "p", "t", "z"]);
    }

    #[test]
    fn test_insert_after_successor_delete() {
        let db = seeded();
        db.remove("m").unwrap();
        // the old key is free again, the successor's key is not
        assert_eq!(db.add("m", "fresh"), Ok(()));
        assert_eq!(db.add("p", "stale"), Err(DbError::DuplicateKey));
        assert_eq!(db.query("m"), Ok("fresh".to_owned()));
    }
}

mod dump_format {
    use super::super::CoreDB;

    fn dumped(db: &CoreDB) -> String {
        let mut out = Vec::new();
        db.shared.dump(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_dump_empty_tree() {
        let db = CoreDB::new();
        assert_eq!(dumped(&db), "(root)\n (null)\n (null)\n");
    }

    #[test]
    fn test_dump_single_key() {
        let db = CoreDB::new();
        db.add("b", "2").unwrap();
        assert_eq!(
            dumped(&db),
            "(root)\n (null)\n b 2\n  (null)\n  (null)\n"
        );
    }

    #[test]
    fn test_dump_left_and_right_children() {
        let db = CoreDB::new();
        db.add("b", "2").unwrap();
        db.add("a", "1").unwrap();
        db.add("c", "3").unwrap();
        let expected = "\
(root)
 (null)
 b 2
  a 1
   (null)
   (null)
  c 3
   (null)
   (null)
";
        assert_eq!(dumped(&db), expected);
    }
}

mod concurrency {
    use super::super::CoreDB;
    use rand::seq::SliceRandom;
    use rand::thread_rng;
    use std::thread;

    #[test]
    fn test_two_writers_insert_disjoint_keysets() {
        let db = CoreDB::new();
        let mut handles = Vec::new();
        for worker in 0..2u32 {
            let db = db.clone();
            handles.push(thread::spawn(move || {
                let mut keys: Vec<u32> = (0..1000).map(|i| worker * 1000 + i).collect();
                keys.shuffle(&mut thread_rng());
                for key in keys {
                    db.add(&format!("k{:04}", key), &format!("v{}", key)).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let inorder = db.shared.collect_inorder();
        assert_eq!(inorder.len(), 2000);
        // in-order traversal must come out strictly sorted: order and
        // uniqueness in one check
        for pair in inorder.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
        for (key, value) in inorder {
            assert_eq!(format!("k{:04}", &value[1..].parse::<u32>().unwrap()), key);
        }
    }

    #[test]
    fn test_readers_see_consistent_values_during_writes() {
        let db = CoreDB::new();
        for i in 0..100u32 {
            db.add(&format!("stable{:03}", i), "anchor").unwrap();
        }
        let mut handles = Vec::new();
        // two writers churn a disjoint keyspace
        for worker in 0..2u32 {
            let db = db.clone();
            handles.push(thread::spawn(move || {
                for round in 0..50u32 {
                    for i in 0..20u32 {
                        let key = format!("churn{}-{}", worker, i);
                        db.add(&key, &format!("r{}", round)).unwrap();
                    }
                    for i in 0..20u32 {
                        db.remove(&format!("churn{}-{}", worker, i)).unwrap();
                    }
                }
            }));
        }
        // readers only ever observe the anchored keys fully intact
        for _ in 0..2 {
            let db = db.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    for i in [0u32, 57, 99] {
                        assert_eq!(db.query(&format!("stable{:03}", i)).unwrap(), "anchor");
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let inorder = db.shared.collect_inorder();
        assert_eq!(inorder.len(), 100);
        for pair in inorder.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }

    #[test]
    fn test_concurrent_removals_of_inner_nodes() {
        let db = CoreDB::new();
        for i in 0..400u32 {
            db.add(&format!("n{:03}", i), &format!("{}", i)).unwrap();
        }
        let mut handles = Vec::new();
        for worker in 0..4u32 {
            let db = db.clone();
            handles.push(thread::spawn(move || {
                // each worker deletes its own residue class
                for i in (worker..400).step_by(4) {
                    if i % 2 == 0 {
                        db.remove(&format!("n{:03}", i)).unwrap();
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let inorder = db.shared.collect_inorder();
        assert_eq!(inorder.len(), 200);
        for (key, value) in inorder {
            let i: u32 = value.parse().unwrap();
            assert_eq!(i % 2, 1);
            assert_eq!(key, format!("n{:03}", i));
        }
    }
}
