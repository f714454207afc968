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

use crate::MEMORY_CHUNK_SIZE;
use std::alloc::{handle_alloc_error, GlobalAlloc, Layout};
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ptr::NonNull;

/// Stable handle to an element stored in [`Arena`].
///
/// The handle stays valid until the element is freed; chunks are never moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Index(usize);

enum Slot<T> {
    // Forms forward linked list of the vacant slots.
    Vacant(Option<Index>),
    Occupied(T),
}

/// `Arena` stores elements in memory chunks acquired from the backend allocator.
///
/// Each chunk is about [`MEMORY_CHUNK_SIZE`] bytes and holds at least one element. Method `alloc`
/// reuses a freed slot if there is; otherwise, it writes the element to the first slot which has
/// never been used, acquiring a new chunk from the backend at first if necessary.
///
/// Method `free` moves the element out and caches the slot. The chunks are not returned to the
/// backend until the instance is dropped.
///
/// # Panics
///
/// Accessing or freeing a slot which is not occupied causes a panic.
/// If the backend fails to allocate a chunk, [`handle_alloc_error`] is called.
///
/// [`MEMORY_CHUNK_SIZE`]: crate::MEMORY_CHUNK_SIZE
pub struct Arena<T, B>
where
    B: GlobalAlloc,
{
    chunks: Vec<NonNull<Slot<T>>>,
    // Count of the slots ever written. They are placed at the head of the chunks.
    initialized: usize,
    free: Option<Index>,
    len: usize,
    backend_: B,
    _marker: PhantomData<Slot<T>>,
}

unsafe impl<T, B> Send for Arena<T, B>
where
    T: Send,
    B: Send + GlobalAlloc,
{
}

unsafe impl<T, B> Sync for Arena<T, B>
where
    T: Sync,
    B: Sync + GlobalAlloc,
{
}

impl<T, B> Drop for Arena<T, B>
where
    B: GlobalAlloc,
{
    fn drop(&mut self) {
        self.clear();

        let layout = Self::chunk_layout();
        for chunk in self.chunks.drain(..) {
            log::trace!("Releasing node chunk {:?} ({} bytes)", chunk, layout.size());
            unsafe { self.backend_.dealloc(chunk.as_ptr().cast(), layout) };
        }
    }
}

impl<T, B> Arena<T, B>
where
    B: GlobalAlloc,
{
    /// Number of the slots in one chunk.
    //
    // Slot<T> is never zero sized because of the vacant variant.
    const SLOTS_PER_CHUNK: usize = if MEMORY_CHUNK_SIZE < 2 * size_of::<Slot<T>>() {
        1
    } else {
        MEMORY_CHUNK_SIZE / size_of::<Slot<T>>()
    };

    fn chunk_layout() -> Layout {
        // The size is not larger than max(MEMORY_CHUNK_SIZE, size_of::<Slot<T>>()).
        let size = size_of::<Slot<T>>() * Self::SLOTS_PER_CHUNK;
        unsafe { Layout::from_size_align_unchecked(size, align_of::<Slot<T>>()) }
    }
}

impl<T, B> Arena<T, B>
where
    B: GlobalAlloc,
{
    /// Creates a new instance without any chunk.
    pub fn new(backend: B) -> Self {
        Self {
            chunks: Vec::new(),
            initialized: 0,
            free: None,
            len: 0,
            backend_: backend,
            _marker: PhantomData,
        }
    }

    /// Provides a reference to the backend allocator.
    pub fn backend(&self) -> &B {
        &self.backend_
    }

    /// Returns the number of the occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Stores `element` and returns the handle to it.
    pub fn alloc(&mut self, element: T) -> Index {
        let index = match self.free {
            Some(index) => {
                let slot = unsafe { &mut *self.slot(index) };
                match slot {
                    Slot::Vacant(next) => self.free = *next,
                    Slot::Occupied(_) => Self::corrupted(index),
                }
                *slot = Slot::Occupied(element);
                index
            }
            None => {
                if self.initialized == self.chunks.len() * Self::SLOTS_PER_CHUNK {
                    self.acquire_chunk();
                }

                let index = Index(self.initialized);
                unsafe { self.slot(index).write(Slot::Occupied(element)) };
                self.initialized += 1;
                index
            }
        };

        self.len += 1;
        index
    }

    /// Moves the element out of the slot `index` points to and caches the slot.
    pub fn free(&mut self, index: Index) -> T {
        debug_assert!(index.0 < self.initialized);

        let ptr = self.slot(index);
        match unsafe { ptr.replace(Slot::Vacant(self.free)) } {
            Slot::Occupied(element) => {
                self.free = Some(index);
                self.len -= 1;
                element
            }
            Slot::Vacant(next) => {
                unsafe { ptr.write(Slot::Vacant(next)) };
                log::error!("Double free of arena slot {:?}", index);
                panic!("arena slot {:?} is already vacant", index);
            }
        }
    }

    /// Provides a reference to the element `index` points to.
    pub fn get(&self, index: Index) -> &T {
        debug_assert!(index.0 < self.initialized);
        match unsafe { &*self.slot(index) } {
            Slot::Occupied(element) => element,
            Slot::Vacant(_) => Self::vacant(index),
        }
    }

    /// Provides a mutable reference to the element `index` points to.
    pub fn get_mut(&mut self, index: Index) -> &mut T {
        debug_assert!(index.0 < self.initialized);
        match unsafe { &mut *self.slot(index) } {
            Slot::Occupied(element) => element,
            Slot::Vacant(_) => Self::vacant(index),
        }
    }

    /// Drops all the elements. The chunks are kept to be reused.
    pub fn clear(&mut self) {
        // Forget the slots before dropping so that a panicking destructor causes leak rather
        // than double drop.
        let initialized = std::mem::replace(&mut self.initialized, 0);
        self.free = None;
        self.len = 0;

        for i in 0..initialized {
            unsafe { std::ptr::drop_in_place(self.slot(Index(i))) };
        }
    }

    fn slot(&self, index: Index) -> *mut Slot<T> {
        let chunk = self.chunks[index.0 / Self::SLOTS_PER_CHUNK];
        unsafe { chunk.as_ptr().add(index.0 % Self::SLOTS_PER_CHUNK) }
    }

    fn acquire_chunk(&mut self) {
        let layout = Self::chunk_layout();
        let ptr = unsafe { self.backend_.alloc(layout) };

        match NonNull::new(ptr.cast::<Slot<T>>()) {
            Some(chunk) => {
                log::trace!("Acquired node chunk {:?} ({} bytes)", chunk, layout.size());
                self.chunks.push(chunk);
            }
            None => {
                log::error!("Failed to acquire node chunk of {} bytes", layout.size());
                handle_alloc_error(layout);
            }
        }
    }

    fn vacant(index: Index) -> ! {
        log::error!("Access to vacant arena slot {:?}", index);
        panic!("arena slot {:?} is vacant", index);
    }

    fn corrupted(index: Index) -> ! {
        log::error!("Arena free list points to occupied slot {:?}", index);
        panic!("arena free list is corrupted at {:?}", index);
    }
}
