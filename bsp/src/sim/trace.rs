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

use std::sync::{Arc, Mutex, PoisonError};

use crate::flit::Flit;
use crate::CoreId;

/// Observable events of a simulation, in global order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TraceEvent {
    /// The core set its arrival flag for `superstep`.
    Arrived { core: CoreId, superstep: usize },
    /// The core wrote a flit to its send interface.
    Injected { core: CoreId, flit: Flit },
    /// The router discarded a flit sent by `core`.
    Dropped { core: CoreId, flit: Flit },
    /// The core left the barrier ending `superstep`.
    Resumed { core: CoreId, superstep: usize },
}

/// A shared, append-only event log.
#[derive(Clone, Debug, Default)]
pub struct Trace(Arc<Mutex<Vec<TraceEvent>>>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, event: TraceEvent) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Returns all events and clears the log.
    pub fn take(&self) -> Vec<TraceEvent> {
        let mut events = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }
}
