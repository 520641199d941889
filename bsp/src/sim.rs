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

//! A single-process simulation of the core array.
//!
//! Every core runs its kernel on its own thread. The barrier controller and
//! the router are software models sharing the process with the cores.

mod controller;
mod fabric;
mod trace;

use std::sync::{mpsc, Arc};
use std::thread;

use crate::config::SystemConfiguration;
use crate::node::Core;
use crate::{CoreId, Error};

pub use self::controller::{BarrierController, SimSync};
pub use self::fabric::{Fabric, LocalMemory, SimPort};
pub use self::trace::{Trace, TraceEvent};

/// A core wired to the simulated controller and router.
pub type SimCore = Core<SimSync, SimPort>;

pub struct Simulation {
    config: SystemConfiguration,
    controller: Arc<BarrierController>,
    fabric: Arc<Fabric>,
    trace: Trace,
}

impl Simulation {
    pub fn new(config: SystemConfiguration) -> Result<Self, Error> {
        config.validate()?;
        log::info!(
            "simulating {} cores ({} flit queues, {} word memories, {:?} addressing)",
            config.num_cores,
            config.queue_capacity,
            config.local_memory_words,
            config.address_policy
        );
        let trace = Trace::new();
        Ok(Self {
            controller: Arc::new(BarrierController::new(config.num_cores)),
            fabric: Arc::new(Fabric::new(
                config.num_cores,
                config.local_memory_words,
                trace.clone(),
            )),
            trace,
            config,
        })
    }

    pub fn config(&self) -> &SystemConfiguration {
        &self.config
    }

    pub fn num_cores(&self) -> usize {
        self.config.num_cores
    }

    /// Builds the core with identity `id`.
    ///
    /// Each id must be driven by exactly one core at a time, otherwise the
    /// barrier controller miscounts.
    pub fn core(&self, id: CoreId) -> Result<SimCore, Error> {
        if id >= self.num_cores() {
            return Err(Error::InvalidCore(id));
        }
        Ok(Core::new(
            &self.config,
            SimSync::new(id, self.controller.clone(), self.trace.clone())?,
            SimPort::new(id, self.fabric.clone()),
        ))
    }

    pub fn local_memory(&self, id: CoreId) -> Result<LocalMemory, Error> {
        self.fabric
            .memory(id)
            .cloned()
            .ok_or(Error::InvalidCore(id))
    }

    /// Returns the events recorded so far and clears the trace.
    pub fn take_trace(&self) -> Vec<TraceEvent> {
        self.trace.take()
    }

    /// Runs `kernel` on every core concurrently and returns the results in
    /// core order.
    ///
    /// No kernel starts until every core thread has been spawned. If a thread
    /// cannot be spawned, the cores already started exit without running the
    /// kernel and the run fails with [`Error::CoreFailed`].
    ///
    /// All kernels must call [`Core::barrier`] the same number of times. A
    /// kernel that returns or panics early leaves its peers waiting at the
    /// barrier forever.
    pub fn run<F, R>(&self, kernel: F) -> Result<Vec<R>, Error>
    where
        F: Fn(&mut SimCore, &LocalMemory) -> R + Sync,
        R: Send,
    {
        let cores = (0..self.num_cores())
            .map(|id| -> Result<_, Error> { Ok((self.core(id)?, self.local_memory(id)?)) })
            .collect::<Result<Vec<_>, Error>>()?;
        let kernel = &kernel;
        let results = thread::scope(|scope| {
            let mut gates = Vec::with_capacity(cores.len());
            let mut handles = Vec::with_capacity(cores.len());
            for (mut core, memory) in cores {
                let id = core.id();
                let (go, gate) = mpsc::channel::<()>();
                let spawned = thread::Builder::new()
                    .name(format!("core{}", id))
                    .spawn_scoped(scope, move || {
                        // never enter the barrier unless every peer is running
                        if gate.recv().is_err() {
                            return None;
                        }
                        let result = kernel(&mut core, &memory);
                        Some((result, core.superstep()))
                    });
                match spawned {
                    Ok(handle) => {
                        gates.push(go);
                        handles.push(handle);
                    }
                    Err(error) => {
                        log::error!("failed to start core {}: {}", id, error);
                        return Err(Error::CoreFailed(id));
                    }
                }
            }
            for go in gates {
                // a closed gate means that core already exited
                let _ = go.send(());
            }
            handles
                .into_iter()
                .enumerate()
                .map(|(id, handle)| match handle.join() {
                    Ok(Some(result)) => Ok(result),
                    _ => Err(Error::CoreFailed(id)),
                })
                .collect::<Result<Vec<_>, Error>>()
        })?;
        let supersteps = results.iter().map(|(_, supersteps)| *supersteps).max();
        log::info!(
            "all {} cores finished after {} supersteps",
            self.num_cores(),
            supersteps.unwrap_or(0)
        );
        Ok(results.into_iter().map(|(result, _)| result).collect())
    }
}
