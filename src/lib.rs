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

//! `rbset` provides [`RBTree`] , an ordered set implemented as a red black tree.
//!
//! The nodes refer to each other by stable indices into an arena instead of owning pointers.
//! The arena acquires memory chunks from a [`GlobalAlloc`] backend chosen by the caller, caches
//! the freed nodes, and releases all the chunks on the drop at once.
//!
//! [`GlobalAlloc`]: std::alloc::GlobalAlloc

mod arena;
mod rb_tree;

pub use crate::rb_tree::{Color, Direction, Iter, NodeRef, RBTree};

/// Memory chunk size the node arena acquires from the backend.
///
/// A chunk holds at least one node even if the node is larger than this.
pub const MEMORY_CHUNK_SIZE: usize = 8 * 1024;
