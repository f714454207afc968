// Copyright 2023 Shin Yoshida
//
// "LGPL-3.0-or-later OR Apache-2.0"
//
// This is part of rbset
//
//  rbset is free software: you can redistribute it and/or modify
//  it under the terms of the GNU Lesser General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  rbset is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU Lesser General Public License for more details.
//
//  You should have received a copy of the GNU Lesser General Public License
//  along with rbset.  If not, see <http://www.gnu.org/licenses/>.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod iter;
mod node;

pub use self::iter::Iter;
pub use self::node::{Color, Direction, NodeRef};

use self::node::{Link, Node};
use crate::arena::{Arena, Index};
use std::alloc::{GlobalAlloc, System};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

/// Red-red violation found walking up from a newly inserted node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertCase {
    RedUncle {
        parent: Index,
        grand: Index,
        uncle: Index,
    },
    // The node hangs opposite to `side`, the side of the parent under the grand parent.
    InnerGrandchild {
        parent: Index,
        side: Direction,
    },
    OuterGrandchild {
        parent: Index,
        grand: Index,
        side: Direction,
    },
}

/// Double black position lacking one black node.
/// The nephews are named from the lacking side; the near one is on the same side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteCase {
    RedSibling { sibling: Index },
    BlackNephews { sibling: Index },
    NearNephewRed { sibling: Index, near: Index },
    FarNephewRed { sibling: Index, far: Index },
}

/// Ordered set implemented as a red black tree.
///
/// The nodes are stored in an arena whose memory chunks are acquired from the backend allocator
/// `B` . The height is O(log n) regardless of the insertion order.
///
/// Inserting a key which is already present and deleting a key which is absent are silently
/// ignored.
///
/// # Thread safety
///
/// All the mutable methods require `&mut self` ; the tree does no internal synchronization.
///
/// # Examples
///
/// ```
/// use rbset::RBTree;
///
/// let mut tree = RBTree::new();
/// tree.insert(30);
/// tree.insert(20);
/// tree.insert(10);
/// tree.insert(20);
///
/// assert_eq!(3, tree.len());
/// assert_eq!(Some(&20), tree.root().map(|root| root.key()));
///
/// tree.delete(&20);
/// assert_eq!(false, tree.contains(&20));
/// assert_eq!(vec![10, 30], tree.iter().cloned().collect::<Vec<_>>());
/// ```
pub struct RBTree<K, B = System>
where
    B: GlobalAlloc,
{
    root: Link,
    arena: Arena<Node<K>, B>,
}

impl<K> RBTree<K, System> {
    /// Creates an empty tree acquiring the node memory from `System` .
    pub fn new() -> Self {
        Self::with_backend(System)
    }
}

impl<K, B> Default for RBTree<K, B>
where
    B: GlobalAlloc + Default,
{
    fn default() -> Self {
        Self::with_backend(B::default())
    }
}

impl<K, B> RBTree<K, B>
where
    B: GlobalAlloc,
{
    /// Creates an empty tree.
    ///
    /// `backend` is an allocator to acquire memory chunks for the nodes. It is also used to
    /// release them on the drop.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbset::RBTree;
    /// use std::alloc::System;
    ///
    /// let tree = RBTree::<u32, System>::with_backend(System);
    /// assert!(tree.is_empty());
    /// ```
    pub fn with_backend(backend: B) -> Self {
        Self {
            root: None,
            arena: Arena::new(backend),
        }
    }

    /// Provides a reference to the backend allocator.
    pub fn backend(&self) -> &B {
        self.arena.backend()
    }

    /// Returns the number of the keys.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns true if the tree holds no key.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns a read-only cursor to the root node, or `None` if empty.
    pub fn root(&self) -> Option<NodeRef<'_, K, B>> {
        self.root.map(|root| NodeRef::new(self, root))
    }

    /// Returns an iterator visiting the keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K, B> {
        Iter::new(self)
    }

    /// Drops all the keys.
    ///
    /// The memory chunks are kept to be reused; they are released on the drop.
    pub fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
    }

    /// Returns the number of the black nodes on every path from the root to the leaves, or `None`
    /// if the paths disagree. An empty tree returns `Some(0)` .
    pub fn black_height(&self) -> Option<usize> {
        self.subtree_black_height(self.root)
    }

    fn subtree_black_height(&self, link: Link) -> Option<usize> {
        let index = match link {
            None => return Some(0),
            Some(index) => index,
        };

        let node = self.node(index);
        let left = self.subtree_black_height(node.left)?;
        let right = self.subtree_black_height(node.right)?;

        if left == right {
            Some(left + (node.color == Color::Black) as usize)
        } else {
            None
        }
    }
}

impl<K, B> RBTree<K, B>
where
    B: GlobalAlloc,
{
    pub(crate) fn node(&self, index: Index) -> &Node<K> {
        self.arena.get(index)
    }

    fn node_mut(&mut self, index: Index) -> &mut Node<K> {
        self.arena.get_mut(index)
    }

    fn set_color(&mut self, index: Index, color: Color) {
        self.node_mut(index).color = color;
    }

    /// Absent node is black.
    fn red(&self, link: Link) -> Link {
        link.filter(|&index| self.node(index).color == Color::Red)
    }

    fn side_of(&self, parent: Index, child: Index) -> Direction {
        let node = self.node(parent);
        if node.left == Some(child) {
            Direction::Left
        } else {
            debug_assert_eq!(Some(child), node.right);
            Direction::Right
        }
    }

    /// Returns the parent of `index` and the side `index` hangs on.
    fn position_of(&self, index: Index) -> Option<(Index, Direction)> {
        self.node(index)
            .parent
            .map(|parent| (parent, self.side_of(parent, index)))
    }

    pub(crate) fn leftmost(&self, mut index: Index) -> Index {
        while let Some(left) = self.node(index).left {
            index = left;
        }
        index
    }

    /// Returns the next node in order.
    pub(crate) fn successor(&self, index: Index) -> Link {
        if let Some(right) = self.node(index).right {
            return Some(self.leftmost(right));
        }

        let mut child = index;
        while let Some(parent) = self.node(child).parent {
            if self.node(parent).left == Some(child) {
                return Some(parent);
            }
            child = parent;
        }

        None
    }

    fn find<Q>(&self, key: &Q) -> Link
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut it = self.root;

        while let Some(index) = it {
            let node = self.node(index);
            match key.cmp(node.key.borrow()) {
                Ordering::Less => it = node.left,
                Ordering::Equal => return it,
                Ordering::Greater => it = node.right,
            }
        }

        None
    }
}

// Primitives shared by the insertion and the deletion.
impl<K, B> RBTree<K, B>
where
    B: GlobalAlloc,
{
    /// Puts `new` into the place of `old` in the parent of `old` (or makes `new` the root.)
    /// The children of either node are not touched.
    fn replace(&mut self, old: Index, new: Link) {
        let parent = self.node(old).parent;

        match parent {
            None => self.root = new,
            Some(parent) => {
                let d = self.side_of(parent, old);
                self.node_mut(parent).set_child(new, d);
            }
        }

        if let Some(new) = new {
            self.node_mut(new).parent = parent;
        }
    }

    /// Moves `x` down to `direction` ; the child of `x` on the other side (the pivot) takes the
    /// place of `x` .
    ///
    /// # Panics
    ///
    /// Panics if `x` has no child on the other side of `direction` .
    fn rotate(&mut self, x: Index, direction: Direction) {
        let pivot = match self.node(x).child(direction.alter()) {
            Some(pivot) => pivot,
            None => {
                log::error!("Rotating {:?} to {:?} without the pivot", x, direction);
                panic!("no pivot to rotate {:?}", direction);
            }
        };
        let middle = self.node(pivot).child(direction);

        self.replace(x, Some(pivot));

        self.node_mut(x).set_child(middle, direction.alter());
        if let Some(middle) = middle {
            self.node_mut(middle).parent = Some(x);
        }

        self.node_mut(pivot).set_child(Some(x), direction);
        self.node_mut(x).parent = Some(pivot);
    }
}

// Insertion
impl<K, B> RBTree<K, B>
where
    K: Ord,
    B: GlobalAlloc,
{
    /// Adds `key` to the tree. Does nothing if `key` is already present.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbset::RBTree;
    ///
    /// let mut tree = RBTree::new();
    /// tree.insert(1);
    /// tree.insert(1);
    /// assert_eq!(1, tree.len());
    /// ```
    pub fn insert(&mut self, key: K) {
        let mut parent = match self.root {
            None => {
                let root = self.arena.alloc(Node::new(key, Color::Black, None));
                self.root = Some(root);
                return;
            }
            Some(root) => root,
        };

        loop {
            let node = self.node(parent);
            let d = match key.cmp(&node.key) {
                Ordering::Less => Direction::Left,
                Ordering::Equal => return,
                Ordering::Greater => Direction::Right,
            };

            match node.child(d) {
                Some(child) => parent = child,
                None => {
                    let z = self.arena.alloc(Node::new(key, Color::Red, Some(parent)));
                    self.node_mut(parent).set_child(Some(z), d);
                    self.insert_fixup(z);
                    return;
                }
            }
        }
    }

    /// Returns `None` if the parent of `z` is black or absent.
    fn insert_case(&self, z: Index) -> Option<InsertCase> {
        let parent = self.node(z).parent?;
        if self.node(parent).color == Color::Black {
            return None;
        }

        // Red root is fixed by painting black.
        let grand = self.node(parent).parent?;
        let side = self.side_of(grand, parent);

        let case = match self.red(self.node(grand).child(side.alter())) {
            Some(uncle) => InsertCase::RedUncle {
                parent,
                grand,
                uncle,
            },
            None if self.side_of(parent, z) != side => InsertCase::InnerGrandchild { parent, side },
            None => InsertCase::OuterGrandchild {
                parent,
                grand,
                side,
            },
        };

        Some(case)
    }

    fn insert_fixup(&mut self, mut z: Index) {
        while let Some(case) = self.insert_case(z) {
            match case {
                InsertCase::RedUncle {
                    parent,
                    grand,
                    uncle,
                } => {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                }
                InsertCase::InnerGrandchild { parent, side } => {
                    // Turns into the outer case. The old parent is the outer grandchild then.
                    self.rotate(parent, side);
                    z = parent;
                }
                InsertCase::OuterGrandchild {
                    parent,
                    grand,
                    side,
                } => {
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate(grand, side.alter());
                    break;
                }
            }
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }
}

// Deletion
impl<K, B> RBTree<K, B>
where
    K: Ord,
    B: GlobalAlloc,
{
    /// Removes `key` from the tree. Does nothing if `key` is absent.
    pub fn delete<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key);
    }

    /// Removes `key` from the tree and returns the key that was stored, or `None` if absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbset::RBTree;
    ///
    /// let mut tree: RBTree<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    /// assert_eq!(Some("b".to_string()), tree.take("b"));
    /// assert_eq!(None, tree.take("b"));
    /// assert_eq!(2, tree.len());
    /// ```
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let target = self.find(key)?;

        // Splice out the successor instead if target has 2 children. It has no left child.
        let spliced = match (self.node(target).left, self.node(target).right) {
            (Some(_), Some(right)) => self.leftmost(right),
            _ => target,
        };

        let (child, color) = {
            let node = self.node(spliced);
            (node.left.or(node.right), node.color)
        };
        let position = self.position_of(spliced);

        self.replace(spliced, child);

        // Removing a red node changes no black height.
        if color == Color::Black {
            self.delete_fixup(child, position);
        }

        let node = self.arena.free(spliced);
        if spliced == target {
            Some(node.key)
        } else {
            Some(std::mem::replace(&mut self.node_mut(target).key, node.key))
        }
    }

    /// `parent` is black or red; `side` is the side lacking a black node.
    fn delete_case(&self, parent: Index, side: Direction) -> DeleteCase {
        // The lacking side has black height 1 or larger before the deletion, so does the sibling.
        let sibling = match self.node(parent).child(side.alter()) {
            Some(sibling) => sibling,
            None => {
                log::error!("Double black {:?} of {:?} has no sibling", side, parent);
                panic!("red black tree is corrupted");
            }
        };

        if self.node(sibling).color == Color::Red {
            return DeleteCase::RedSibling { sibling };
        }

        let near = self.node(sibling).child(side);
        let far = self.node(sibling).child(side.alter());

        match (self.red(near), self.red(far)) {
            (_, Some(far)) => DeleteCase::FarNephewRed { sibling, far },
            (Some(near), None) => DeleteCase::NearNephewRed { sibling, near },
            (None, None) => DeleteCase::BlackNephews { sibling },
        }
    }

    /// `x` is the (maybe absent) node at `position` lacking one black node.
    /// `position` is the parent and the side, or `None` if `x` is the root.
    fn delete_fixup(&mut self, mut x: Link, mut position: Option<(Index, Direction)>) {
        loop {
            if let Some(index) = self.red(x) {
                self.set_color(index, Color::Black);
                return;
            }

            let (parent, side) = match position {
                None => return,
                Some(position) => position,
            };

            match self.delete_case(parent, side) {
                DeleteCase::RedSibling { sibling } => {
                    // Makes the sibling black. x stays at the same position.
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate(parent, side);
                }
                DeleteCase::BlackNephews { sibling } => {
                    self.set_color(sibling, Color::Red);
                    x = Some(parent);
                    position = self.position_of(parent);
                }
                DeleteCase::NearNephewRed { sibling, near } => {
                    // Turns into the far nephew case.
                    self.set_color(near, Color::Black);
                    self.set_color(sibling, Color::Red);
                    self.rotate(sibling, side.alter());
                }
                DeleteCase::FarNephewRed { sibling, far } => {
                    let color = self.node(parent).color;
                    self.set_color(sibling, color);
                    self.set_color(parent, Color::Black);
                    self.set_color(far, Color::Black);
                    self.rotate(parent, side);
                    return;
                }
            }
        }
    }
}

impl<K, B> RBTree<K, B>
where
    K: Ord,
    B: GlobalAlloc,
{
    /// Returns true if `key` is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }
}

impl<K, B> fmt::Debug for RBTree<K, B>
where
    K: fmt::Debug,
    B: GlobalAlloc,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, B> Extend<K> for RBTree<K, B>
where
    K: Ord,
    B: GlobalAlloc,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        iter.into_iter().for_each(|key| self.insert(key));
    }
}

impl<K, B> std::iter::FromIterator<K> for RBTree<K, B>
where
    K: Ord,
    B: GlobalAlloc + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::default();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, B> IntoIterator for &'a RBTree<K, B>
where
    B: GlobalAlloc,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
