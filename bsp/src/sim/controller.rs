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

//! A software barrier controller.
//!
//! Every core sees its own copy of the global-start and global-end flags. The
//! controller asserts all start copies when the last core sets its arrival
//! flag, and all end copies when the last core clears it.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use super::trace::{Trace, TraceEvent};
use crate::hw::{SyncFlag, SyncRegisters};
use crate::{CoreId, Error};

#[derive(Debug, Default)]
struct CoreFlags {
    arrived: AtomicBool,
    start: AtomicBool,
    end: AtomicBool,
}

impl CoreFlags {
    fn flag(&self, flag: SyncFlag) -> &AtomicBool {
        match flag {
            SyncFlag::OwnArrived => &self.arrived,
            SyncFlag::GlobalStart => &self.start,
            SyncFlag::GlobalEnd => &self.end,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Expecting {
    Arrivals,
    Departures,
}

#[derive(Debug)]
struct Tally {
    expecting: Expecting,
    count: usize,
}

#[derive(Debug)]
pub struct BarrierController {
    flags: Vec<CoreFlags>,
    tally: Mutex<Tally>,
}

impl BarrierController {
    pub fn new(num_cores: usize) -> Self {
        Self {
            flags: (0..num_cores).map(|_| CoreFlags::default()).collect(),
            tally: Mutex::new(Tally {
                expecting: Expecting::Arrivals,
                count: 0,
            }),
        }
    }

    pub fn num_cores(&self) -> usize {
        self.flags.len()
    }

    fn read(&self, core: CoreId, flag: SyncFlag) -> bool {
        self.flags[core].flag(flag).load(Ordering::Acquire)
    }

    /// The controller-facing side of a core's arrival flag.
    fn arrival_written(&self, core: CoreId, value: bool) {
        let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        if self.flags[core].arrived.swap(value, Ordering::AcqRel) == value {
            return;
        }
        let (global, next) = match (tally.expecting, value) {
            (Expecting::Arrivals, true) => (SyncFlag::GlobalStart, Expecting::Departures),
            (Expecting::Departures, false) => (SyncFlag::GlobalEnd, Expecting::Arrivals),
            (expecting, _) => {
                log::warn!(
                    "core {} wrote arrival flag {} while expecting {:?}",
                    core,
                    value,
                    expecting
                );
                return;
            }
        };
        tally.count += 1;
        if tally.count == self.num_cores() {
            log::trace!("controller: all {} cores done, asserting {:?}", tally.count, global);
            for flags in &self.flags {
                flags.flag(global).store(true, Ordering::Release);
            }
            tally.expecting = next;
            tally.count = 0;
        }
    }
}

/// The sync register block of one simulated core.
pub struct SimSync {
    core: CoreId,
    controller: Arc<BarrierController>,
    trace: Trace,
    superstep: Cell<usize>,
}

impl SimSync {
    pub fn new(
        core: CoreId,
        controller: Arc<BarrierController>,
        trace: Trace,
    ) -> Result<Self, Error> {
        if core >= controller.num_cores() {
            return Err(Error::InvalidCore(core));
        }
        Ok(Self {
            core,
            controller,
            trace,
            superstep: Cell::new(0),
        })
    }
}

impl SyncRegisters for SimSync {
    fn read_flag(&self, flag: SyncFlag) -> bool {
        self.controller.read(self.core, flag)
    }

    fn write_flag(&self, flag: SyncFlag, value: bool) {
        match flag {
            SyncFlag::OwnArrived => {
                if value {
                    self.trace.log(TraceEvent::Arrived {
                        core: self.core,
                        superstep: self.superstep.get(),
                    });
                }
                self.controller.arrival_written(self.core, value);
            }
            SyncFlag::GlobalStart => {
                self.controller.flags[self.core]
                    .start
                    .store(value, Ordering::Release);
            }
            SyncFlag::GlobalEnd => {
                self.controller.flags[self.core]
                    .end
                    .store(value, Ordering::Release);
                if !value {
                    self.trace.log(TraceEvent::Resumed {
                        core: self.core,
                        superstep: self.superstep.get(),
                    });
                    self.superstep.set(self.superstep.get() + 1);
                }
            }
        }
    }

    fn core_id(&self) -> CoreId {
        self.core
    }

    fn wait_flag(&self, flag: SyncFlag) {
        // simulated cores share host cpus, so give the slot away while spinning
        while !self.read_flag(flag) {
            thread::yield_now();
        }
    }
}
