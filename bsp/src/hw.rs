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

//! Typed access to the per-core hardware the communication layer drives.

use crate::flit::FlitKind;
use crate::{CoreId, Word};

/// The three one-bit sync registers seen by a core.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SyncFlag {
    /// Written only by the owning core.
    OwnArrived,
    /// Asserted by the controller once every core has arrived, cleared by
    /// the core.
    GlobalStart,
    /// Asserted by the controller once every core has departed, cleared by
    /// the core.
    GlobalEnd,
}

/// The sync register block of one core, including its identity register.
pub trait SyncRegisters {
    fn read_flag(&self, flag: SyncFlag) -> bool;

    fn write_flag(&self, flag: SyncFlag, value: bool);

    /// Reads the core identity register.
    fn core_id(&self) -> CoreId;

    /// Blocks until `flag` reads as set.
    ///
    /// There is no timeout: if the controller never asserts the flag, the
    /// caller spins forever.
    fn wait_flag(&self, flag: SyncFlag) {
        while !self.read_flag(flag) {
            std::hint::spin_loop();
        }
    }
}

/// The write-only flit send interface of the router.
///
/// Every call transmits exactly one flit. There is no acknowledgement:
/// back-pressure, if any, is applied by the implementation blocking.
pub trait NetworkInterface {
    fn send_flit(&mut self, kind: FlitKind, payload: Word);
}

impl<T: SyncRegisters + ?Sized> SyncRegisters for &T {
    fn read_flag(&self, flag: SyncFlag) -> bool {
        (**self).read_flag(flag)
    }

    fn write_flag(&self, flag: SyncFlag, value: bool) {
        (**self).write_flag(flag, value)
    }

    fn core_id(&self) -> CoreId {
        (**self).core_id()
    }

    fn wait_flag(&self, flag: SyncFlag) {
        (**self).wait_flag(flag)
    }
}

impl<T: NetworkInterface + ?Sized> NetworkInterface for &mut T {
    fn send_flit(&mut self, kind: FlitKind, payload: Word) {
        (**self).send_flit(kind, payload)
    }
}

/// Collects every flit sent, e.g. for tests and benchmarks.
impl NetworkInterface for Vec<(FlitKind, Word)> {
    fn send_flit(&mut self, kind: FlitKind, payload: Word) {
        self.push((kind, payload));
    }
}
