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

//! Bulk-synchronous communication layer for a packet-switched core array.
//!
//! Each core owns an [`OutgoingQueue`] of flits. Messages are appended with
//! [`Core::enqueue`] during the compute phase of a superstep and are drained
//! to the network by [`Core::barrier`], which runs the two-phase arrive/depart
//! handshake against the barrier controller.
//!
//! The hardware is reached only through the [`SyncRegisters`] and
//! [`NetworkInterface`] traits. [`mmio`] implements them on the real target,
//! [`sim`] implements them for a multi-threaded simulation of the array.

mod barrier;
mod config;
mod error;
mod flit;
mod hw;
mod inject;
pub mod mmio;
mod node;
mod queue;
pub mod sim;

/// A core's integer identity.
pub type CoreId = usize;

/// The network word size.
pub type Word = u32;

pub use crate::barrier::{SuperstepPhase, Synchronizer};
pub use crate::config::{AddressPolicy, SystemConfiguration};
pub use crate::error::Error;
pub use crate::flit::{Flit, FlitKind, Header};
pub use crate::flit::{ADDRESS_BITS, ADDRESS_SPACE, CORE_BITS, MAX_BURST, MAX_CORES, TAIL_SENTINEL};
pub use crate::hw::{NetworkInterface, SyncFlag, SyncRegisters};
pub use crate::inject::inject;
pub use crate::node::Core;
pub use crate::queue::{OutgoingQueue, DEFAULT_QUEUE_CAPACITY, MAX_QUEUE_CAPACITY};
pub use crate::sim::{LocalMemory, SimCore, Simulation, TraceEvent};
