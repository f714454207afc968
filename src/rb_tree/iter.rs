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

use super::node::Link;
use super::RBTree;
use std::alloc::GlobalAlloc;
use std::iter::FusedIterator;

/// In-order iterator over the keys of [`RBTree`].
///
/// It walks up through the parent links instead of holding a stack.
pub struct Iter<'a, K, B>
where
    B: GlobalAlloc,
{
    tree: &'a RBTree<K, B>,
    next: Link,
    remaining: usize,
}

impl<'a, K, B> Iter<'a, K, B>
where
    B: GlobalAlloc,
{
    pub(crate) fn new(tree: &'a RBTree<K, B>) -> Self {
        Self {
            tree,
            next: tree.root.map(|root| tree.leftmost(root)),
            remaining: tree.len(),
        }
    }
}

impl<K, B> Clone for Iter<'_, K, B>
where
    B: GlobalAlloc,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, B> Iterator for Iter<'a, K, B>
where
    B: GlobalAlloc,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        self.next = self.tree.successor(index);
        self.remaining -= 1;

        Some(&self.tree.node(index).key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, B> ExactSizeIterator for Iter<'_, K, B> where B: GlobalAlloc {}

impl<K, B> FusedIterator for Iter<'_, K, B> where B: GlobalAlloc {}

#[cfg(test)]
mod tests {
    use super::*;
    use gharial::GAlloc;

    #[test]
    fn empty() {
        let tree = RBTree::<usize, GAlloc>::default();
        let mut it = tree.iter();

        assert_eq!(0, it.len());
        assert_eq!(None, it.next());
        assert_eq!(None, it.next());
    }

    #[test]
    fn should_visit_all() {
        let mut tree = RBTree::<u8, GAlloc>::default();
        for i in (0..250_u8).rev() {
            tree.insert(i);
        }

        let mut it = tree.iter();
        assert_eq!(250, it.len());

        let mut expected = 0_u8;
        while let Some(&k) = it.next() {
            assert_eq!(expected, k);
            expected += 1;
            assert_eq!(250 - expected as usize, it.len());
        }

        assert_eq!(250, expected);
    }

    #[test]
    fn after_delete() {
        let mut tree = RBTree::<usize, GAlloc>::default();
        tree.extend(0..64);
        for i in (0..64).step_by(2) {
            tree.delete(&i);
        }

        let keys: Vec<usize> = tree.iter().cloned().collect();
        let expected: Vec<usize> = (1..64).step_by(2).collect();
        assert_eq!(expected, keys);
    }
}
