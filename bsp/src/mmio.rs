// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Memory-mapped sync and router registers of the target.
//!
//! The sync block is four consecutive words: own-arrived, global-start,
//! global-end and the read-only core id. The router exposes one send register
//! per flit tag.

use std::ptr;

use crate::flit::FlitKind;
use crate::hw::{NetworkInterface, SyncFlag, SyncRegisters};
use crate::{CoreId, Word};

/// Base of the sync register block.
pub const SYNC_BASE: usize = 0xFD00_0000;
/// Base of the router send registers.
pub const ROUTER_SEND_BASE: usize = 0xFE00_0000;
/// Start of the scratch region remote writes land in.
pub const SCRATCH_START: usize = 0x3800;

const CORE_ID_INDEX: usize = 3;

fn flag_index(flag: SyncFlag) -> usize {
    match flag {
        SyncFlag::OwnArrived => 0,
        SyncFlag::GlobalStart => 1,
        SyncFlag::GlobalEnd => 2,
    }
}

pub struct MmioSync {
    base: *mut Word,
}

impl MmioSync {
    /// # Safety
    ///
    /// `base` must point to four readable and writable, word-aligned
    /// registers that stay mapped for the lifetime of the returned value.
    pub unsafe fn new(base: *mut Word) -> Self {
        Self { base }
    }

    /// The sync block at its fixed address on the target.
    ///
    /// # Safety
    ///
    /// Only valid when running on the target.
    pub unsafe fn at_default_address() -> Self {
        Self::new(SYNC_BASE as *mut Word)
    }

    fn register(&self, index: usize) -> *mut Word {
        // in bounds by the constructor contract
        unsafe { self.base.add(index) }
    }
}

impl SyncRegisters for MmioSync {
    fn read_flag(&self, flag: SyncFlag) -> bool {
        unsafe { ptr::read_volatile(self.register(flag_index(flag))) != 0 }
    }

    fn write_flag(&self, flag: SyncFlag, value: bool) {
        unsafe { ptr::write_volatile(self.register(flag_index(flag)), value as Word) }
    }

    fn core_id(&self) -> CoreId {
        unsafe { ptr::read_volatile(self.register(CORE_ID_INDEX)) as CoreId }
    }
}

pub struct MmioNetwork {
    base: *mut Word,
}

impl MmioNetwork {
    /// # Safety
    ///
    /// `base` must point to three writable, word-aligned send registers
    /// (header, body, tail) that stay mapped for the lifetime of the returned
    /// value.
    pub unsafe fn new(base: *mut Word) -> Self {
        Self { base }
    }

    /// The send registers at their fixed address on the target.
    ///
    /// # Safety
    ///
    /// Only valid when running on the target.
    pub unsafe fn at_default_address() -> Self {
        Self::new(ROUTER_SEND_BASE as *mut Word)
    }
}

impl NetworkInterface for MmioNetwork {
    fn send_flit(&mut self, kind: FlitKind, payload: Word) {
        unsafe { ptr::write_volatile(self.base.add(kind.tag() as usize), payload) }
    }
}
