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

//! Sample bulk-synchronous kernels running on the simulated core array.
//!
//! Core 0 distributes work and collects results; the other cores are workers.
//! Remote data always lands in the scratch region of the target core.

use anyhow::Context;
use bsp::{LocalMemory, SimCore, Simulation, SystemConfiguration, Word};

pub mod dividesort;
pub mod dotproduct;
pub mod matmul;
mod modes;

pub use modes::Kernel;

/// Where remote writes land in every core's local memory.
pub use bsp::mmio::SCRATCH_START as SCRATCH;

/// The verified output of a kernel run.
#[derive(Clone, Debug)]
pub struct Report {
    pub kernel: Kernel,
    pub result: Vec<Word>,
    pub passed: bool,
}

/// What a core returns: the collector returns the kernel output, the others
/// `None`.
pub type CoreOutput = Result<Option<Vec<Word>>, bsp::Error>;

type KernelFn = fn(&mut SimCore, &LocalMemory, bool) -> CoreOutput;

impl Kernel {
    pub fn num_cores(self) -> usize {
        match self {
            Kernel::SyncTest => sync_test::NUM_CORES,
            Kernel::DotProduct => dotproduct::NUM_CORES,
            Kernel::DivideSort => dividesort::NUM_CORES,
            Kernel::MatMul => matmul::NUM_CORES,
        }
    }

    /// Runs the kernel on a simulated array and checks its output.
    pub fn run(self, config: SystemConfiguration, dump: bool) -> anyhow::Result<Report> {
        anyhow::ensure!(
            config.num_cores == self.num_cores(),
            "{} needs {} cores, the configuration has {}",
            self,
            self.num_cores(),
            config.num_cores
        );
        log::info!("running {}", self);
        let (kernel, verify): (KernelFn, fn(&[Word]) -> bool) = match self {
            Kernel::SyncTest => (sync_test::kernel, sync_test::verify),
            Kernel::DotProduct => (dotproduct::kernel, dotproduct::verify),
            Kernel::DivideSort => (dividesort::kernel, dividesort::verify),
            Kernel::MatMul => (matmul::kernel, matmul::verify),
        };
        let result = simulate(config, |core, memory| kernel(core, memory, dump))?;
        let passed = verify(&result);
        if passed {
            log::info!("{}: result is: True", self);
        } else {
            log::error!("{}: result is: False ({:?})", self, result);
        }
        Ok(Report {
            kernel: self,
            result,
            passed,
        })
    }
}

/// Outcome of the supersteps a core has run so far.
pub(crate) type Status = Result<(), bsp::Error>;

/// Runs `body` unless an earlier superstep failed, then ends the superstep,
/// logging the queue first if asked to.
///
/// A core that failed still takes part in every remaining barrier, otherwise
/// its peers would wait for it forever.
pub(crate) fn superstep<F>(core: &mut SimCore, dump: bool, status: &mut Status, body: F)
where
    F: FnOnce(&mut SimCore) -> Status,
{
    if status.is_ok() {
        *status = body(core);
        if let Err(error) = status {
            log::warn!("core {} failed: {}", core.id(), error);
        }
    }
    if dump {
        core.dump();
    }
    core.barrier();
}

fn simulate<F>(config: SystemConfiguration, kernel: F) -> anyhow::Result<Vec<Word>>
where
    F: Fn(&mut SimCore, &LocalMemory) -> CoreOutput + Sync,
{
    let sim = Simulation::new(config)?;
    let outputs = sim.run(kernel)?;
    let mut result = None;
    for (id, output) in outputs.into_iter().enumerate() {
        if let Some(words) = output.with_context(|| format!("core {} failed", id))? {
            result = Some(words);
        }
    }
    result.context("no core produced a result")
}
