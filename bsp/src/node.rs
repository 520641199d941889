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

use crate::barrier::{SuperstepPhase, Synchronizer};
use crate::config::{AddressPolicy, SystemConfiguration};
use crate::hw::{NetworkInterface, SyncRegisters};
use crate::queue::OutgoingQueue;
use crate::{CoreId, Error, Word};

/// One core of the array: its outgoing queue, its sync registers and its
/// port into the network.
///
/// A kernel calls [`Core::enqueue`] any number of times during a superstep,
/// then [`Core::barrier`] exactly as many times as every other core.
pub struct Core<S: SyncRegisters, N: NetworkInterface> {
    id: CoreId,
    num_cores: usize,
    address_policy: AddressPolicy,
    queue: OutgoingQueue,
    synchronizer: Synchronizer<S>,
    network: N,
}

impl<S: SyncRegisters, N: NetworkInterface> Core<S, N> {
    pub fn new(config: &SystemConfiguration, registers: S, network: N) -> Self {
        let id = registers.core_id();
        Self {
            id,
            num_cores: config.num_cores,
            address_policy: config.address_policy,
            queue: OutgoingQueue::new(config.queue_capacity),
            synchronizer: Synchronizer::new(registers),
            network,
        }
    }

    pub fn id(&self) -> CoreId {
        self.id
    }

    pub fn num_cores(&self) -> usize {
        self.num_cores
    }

    pub fn queue(&self) -> &OutgoingQueue {
        &self.queue
    }

    pub fn phase(&self) -> SuperstepPhase {
        self.synchronizer.phase()
    }

    /// Number of barriers this core has completed.
    pub fn superstep(&self) -> usize {
        self.synchronizer.superstep()
    }

    /// Queues `words` to be written at `destination` in the local memory of
    /// core `target` at the next barrier.
    ///
    /// On error the queue is left exactly as it was.
    pub fn enqueue(&mut self, target: CoreId, words: &[Word], destination: usize) -> Result<(), Error> {
        let header =
            self.address_policy
                .header(target, destination, words.len(), self.num_cores)?;
        self.queue.push_message(header, words)?;
        log::trace!(
            "core {}: queued {} words for core {} at {:#x}",
            self.id,
            words.len(),
            header.core(),
            header.destination()
        );
        Ok(())
    }

    /// Ends the superstep. Returns once every core has sent everything it
    /// queued for this superstep.
    pub fn barrier(&mut self) {
        self.synchronizer.sync(&mut self.queue, &mut self.network);
    }

    /// Renders the queue and logs it. Does not change the queue.
    pub fn dump(&self) -> String {
        let dump = self.queue.to_string();
        log::debug!("core {} queue ({} flits):\n{}", self.id, self.queue.len(), dump);
        dump
    }
}

impl<S: SyncRegisters, N: NetworkInterface> Drop for Core<S, N> {
    fn drop(&mut self) {
        if !self.queue.is_empty() {
            log::warn!(
                "core {}: {} flits queued after the last barrier were never sent",
                self.id,
                self.queue.len()
            );
        }
    }
}
