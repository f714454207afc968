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

use super::RBTree;
use crate::arena::Index;
use std::alloc::GlobalAlloc;
use std::fmt;

pub(crate) type Link = Option<Index>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn alter(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

pub(crate) struct Node<K> {
    pub key: K,
    pub color: Color,
    pub left: Link,
    pub right: Link,
    // Not owning. None only for the root.
    pub parent: Link,
}

impl<K> Node<K> {
    pub fn new(key: K, color: Color, parent: Link) -> Self {
        Self {
            key,
            color,
            left: None,
            right: None,
            parent,
        }
    }

    pub fn child(&self, direction: Direction) -> Link {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn set_child(&mut self, child: Link, direction: Direction) {
        match direction {
            Direction::Left => self.left = child,
            Direction::Right => self.right = child,
        }
    }
}

/// Read-only cursor pointing to a node of [`RBTree`].
///
/// The color and the links can be inspected but never modified through the cursor.
pub struct NodeRef<'a, K, B>
where
    B: GlobalAlloc,
{
    tree: &'a RBTree<K, B>,
    index: Index,
}

impl<K, B> Clone for NodeRef<'_, K, B>
where
    B: GlobalAlloc,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, B> Copy for NodeRef<'_, K, B> where B: GlobalAlloc {}

impl<'a, K, B> NodeRef<'a, K, B>
where
    B: GlobalAlloc,
{
    pub(crate) fn new(tree: &'a RBTree<K, B>, index: Index) -> Self {
        Self { tree, index }
    }

    fn node(&self) -> &'a Node<K> {
        self.tree.node(self.index)
    }

    fn to(&self, link: Link) -> Option<Self> {
        link.map(|index| Self::new(self.tree, index))
    }

    pub fn key(&self) -> &'a K {
        &self.node().key
    }

    pub fn color(&self) -> Color {
        self.node().color
    }

    pub fn child(&self, direction: Direction) -> Option<Self> {
        self.to(self.node().child(direction))
    }

    pub fn left(&self) -> Option<Self> {
        self.child(Direction::Left)
    }

    pub fn right(&self) -> Option<Self> {
        self.child(Direction::Right)
    }

    /// Returns `None` if `self` is the root.
    pub fn parent(&self) -> Option<Self> {
        self.to(self.node().parent)
    }
}

impl<K, B> PartialEq for NodeRef<'_, K, B>
where
    B: GlobalAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }
}

impl<K, B> Eq for NodeRef<'_, K, B> where B: GlobalAlloc {}

impl<K, B> fmt::Debug for NodeRef<'_, K, B>
where
    K: fmt::Debug,
    B: GlobalAlloc,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("color", &self.color())
            .finish()
    }
}
