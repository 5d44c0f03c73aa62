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

//! # The storage tree
//!
//! An unbalanced binary search tree in which every node carries its own
//! reader/writer lock. Lookups and mutations descend the tree with lock
//! coupling: the lock on a child is always acquired *before* the lock on its
//! parent is released, so a descent never observes a half-rewired edge and
//! never holds more than the locks along one parent/child window. Locks are
//! always taken in root-to-leaf order, which is what makes the whole scheme
//! deadlock free.
//!
//! The root of the tree is a sentinel: a permanent node with the empty key.
//! Every user key compares greater than the empty string, so the entire
//! database hangs off the sentinel's right subtree and no operation ever has
//! to special-case an empty tree or a parentless node.

use super::{DbError, DbResult};
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};
use std::io::{self, Write};
use std::mem;
use std::ops::Deref;
use std::sync::Arc;

/// The most bytes a key or a value may occupy
pub const MAX_PAYLOAD: usize = 256;

/// A shared handle to a node. The handle itself proves nothing; a node's
/// fields may only be touched while its lock is held
pub type NodeRef = Arc<RwLock<Node>>;
type ReadGuard = ArcRwLockReadGuard<RawRwLock, Node>;
type WriteGuard = ArcRwLockWriteGuard<RawRwLock, Node>;

/// One cell of the tree. The node's rwlock guards every field here: the
/// payload pair as well as both child edges
pub struct Node {
    key: String,
    value: String,
    left: Option<NodeRef>,
    right: Option<NodeRef>,
}

impl Node {
    /// Create a detached node, rejecting payloads that are too large
    fn new(key: &str, value: &str) -> DbResult<NodeRef> {
        if key.len() > MAX_PAYLOAD || value.len() > MAX_PAYLOAD {
            return Err(DbError::OversizeInput);
        }
        Ok(Arc::new(RwLock::new(Node {
            key: key.to_owned(),
            value: value.to_owned(),
            left: None,
            right: None,
        })))
    }
}

/// Hang `child` off the side of `parent` that `key` sorts into
fn attach(parent: &mut Node, key: &str, child: Option<NodeRef>) {
    if key < parent.key.as_str() {
        parent.left = child;
    } else {
        parent.right = child;
    }
}

/// The sentinel-rooted tree
pub struct Tree {
    root: NodeRef,
}

impl Tree {
    pub fn new() -> Self {
        Tree {
            root: Arc::new(RwLock::new(Node {
                key: String::new(),
                value: String::new(),
                left: None,
                right: None,
            })),
        }
    }
    /// The locked descent shared by every operation.
    ///
    /// Walks from the sentinel towards `key`, coupling locks along the way.
    /// On return the parent pair is still held (the read paths drop it
    /// immediately); the target pair is held too if the key was found. At no
    /// point are more than two locks held, and the second of the two is
    /// always acquired before the first is released
    fn descend<G, F>(&self, key: &str, lock: F) -> (Option<(NodeRef, G)>, (NodeRef, G))
    where
        F: Fn(&NodeRef) -> G,
        G: Deref<Target = Node>,
    {
        let mut parent = self.root.clone();
        let mut parent_guard = lock(&parent);
        loop {
            let next = if key < parent_guard.key.as_str() {
                parent_guard.left.clone()
            } else {
                parent_guard.right.clone()
            };
            let Some(child) = next else {
                return (None, (parent, parent_guard));
            };
            let child_guard = lock(&child);
            if child_guard.key == key {
                return (Some((child, child_guard)), (parent, parent_guard));
            }
            // hand over: rebinding releases the old parent after the child
            // lock above was taken
            parent = child;
            parent_guard = child_guard;
        }
    }
    /// Look a key up and copy its value out
    pub fn query(&self, key: &str) -> Option<String> {
        let (target, parent) = self.descend(key, |n: &NodeRef| n.read_arc());
        drop(parent);
        target.map(|(_, guard)| guard.value.clone())
    }
    /// Insert a fresh key. Duplicates are rejected, not overwritten
    pub fn insert(&self, key: &str, value: &str) -> DbResult<()> {
        let (target, (_, mut parent_guard)) = self.descend(key, |n: &NodeRef| n.write_arc());
        if let Some((_, target_guard)) = target {
            drop(target_guard);
            drop(parent_guard);
            return Err(DbError::DuplicateKey);
        }
        let node = Node::new(key, value)?;
        attach(&mut parent_guard, key, Some(node));
        Ok(())
    }
    /// Remove a key.
    ///
    /// A target with at most one child is spliced out from under its parent.
    /// A target with two children is instead rewritten in place with the
    /// payload of its in-order successor, so the node's identity survives
    /// the delete and no subtree ever needs re-parenting
    pub fn remove(&self, key: &str) -> DbResult<()> {
        let (target, (_, mut parent_guard)) = self.descend(key, |n: &NodeRef| n.write_arc());
        let Some((_, mut target_guard)) = target else {
            drop(parent_guard);
            return Err(DbError::NotFound);
        };
        match (target_guard.left.clone(), target_guard.right.clone()) {
            // no right child: the left subtree takes the target's place
            (orphan, None) => {
                attach(&mut parent_guard, &target_guard.key, orphan);
                drop(target_guard);
                drop(parent_guard);
            }
            // no left child: ditto with the right subtree
            (None, orphan) => {
                attach(&mut parent_guard, &target_guard.key, orphan);
                drop(target_guard);
                drop(parent_guard);
            }
            // two children: in-place successor replacement
            (Some(_), Some(right)) => {
                // lock the top of the right subtree, then let go of the
                // parent: the target is not being unlinked, only rewritten
                let mut walk_ref = right;
                let mut walk_guard = walk_ref.write_arc();
                drop(parent_guard);
                // walk the left spine hand-over-hand. The guard on the node
                // owning the edge into the current one is retained so the
                // unlink below happens inside a write critical section; the
                // guard two levels back is released before the next child
                // lock is taken, so the walk never holds more than its
                // parent/child pair
                let mut link: Option<(NodeRef, WriteGuard)> = None;
                while let Some(next_ref) = walk_guard.left.clone() {
                    link = Some((walk_ref, walk_guard));
                    let next_guard = next_ref.write_arc();
                    walk_ref = next_ref;
                    walk_guard = next_guard;
                }
                // unlink the successor: its right subtree moves up into the
                // edge that held it
                let hoist = walk_guard.right.take();
                match link {
                    Some((_, mut link_guard)) => link_guard.left = hoist,
                    None => target_guard.right = hoist,
                }
                // the successor's payload lands in the target
                target_guard.key = mem::take(&mut walk_guard.key);
                target_guard.value = mem::take(&mut walk_guard.value);
                drop(walk_guard);
                drop(target_guard);
                // walk_ref going out of scope frees the successor node
            }
        }
        Ok(())
    }
    /// Depth-first print of the whole tree: one node per line, indented by
    /// depth, with `(root)` for the sentinel and `(null)` for absent
    /// children.
    ///
    /// The traversal couples locks the same way a descent does, so it only
    /// ever blocks writers along the spine it is currently visiting
    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        let guard = self.root.read_arc();
        self.dump_recurs(Some((self.root.clone(), guard)), 0, out)
    }
    fn dump_recurs(
        &self,
        frame: Option<(NodeRef, ReadGuard)>,
        depth: usize,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        for _ in 0..depth {
            write!(out, " ")?;
        }
        let Some((node, guard)) = frame else {
            return writeln!(out, "(null)");
        };
        if Arc::ptr_eq(&node, &self.root) {
            writeln!(out, "(root)")?;
        } else {
            writeln!(out, "{} {}", guard.key, guard.value)?;
        }
        // the right edge is snapshotted now; its lock is taken only after
        // the left subtree is done
        let right = guard.right.clone();
        let left = guard.left.clone().map(|n| {
            let g = n.read_arc();
            (n, g)
        });
        drop(guard);
        self.dump_recurs(left, depth + 1, out)?;
        let right = right.map(|n| {
            let g = n.read_arc();
            (n, g)
        });
        self.dump_recurs(right, depth + 1, out)
    }
    /// Free everything below the sentinel. Only legal once the supervisor
    /// has proven there are no sessions left
    pub fn teardown(&self) {
        fn scrap(edge: Option<NodeRef>) {
            if let Some(node) = edge {
                let (left, right) = {
                    let mut guard = node.write();
                    (guard.left.take(), guard.right.take())
                };
                scrap(left);
                scrap(right);
            }
        }
        let (left, right) = {
            let mut guard = self.root.write();
            (guard.left.take(), guard.right.take())
        };
        scrap(left);
        scrap(right);
    }
}

#[cfg(test)]
impl Tree {
    /// In-order walk for the test suite; single-threaded use only
    pub(super) fn collect_inorder(&self) -> Vec<(String, String)> {
        fn walk(edge: &Option<NodeRef>, out: &mut Vec<(String, String)>) {
            if let Some(node) = edge {
                let guard = node.read();
                walk(&guard.left, out);
                out.push((guard.key.clone(), guard.value.clone()));
                walk(&guard.right, out);
            }
        }
        let mut out = Vec::new();
        let guard = self.root.read();
        walk(&guard.right, &mut out);
        out
    }
}
