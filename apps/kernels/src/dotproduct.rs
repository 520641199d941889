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

//! Distributed dot product of two 128-element vectors over eight workers.
//!
//! Superstep 1 scatters the first vector, superstep 2 the second, superstep 3
//! returns one partial sum per worker to core 0 at `SCRATCH + id`.

use bsp::{LocalMemory, SimCore, Word, MAX_BURST};

use crate::{superstep, CoreOutput, SCRATCH};

pub const NUM_CORES: usize = 9;
const WORKERS: usize = NUM_CORES - 1;
const LEN: usize = WORKERS * MAX_BURST;

fn v1() -> Vec<Word> {
    (1..=LEN as Word).collect()
}

fn v2() -> Vec<Word> {
    vec![1; LEN]
}

/// Sends slice `i` of `vector` to worker `i + 1` at `offset`.
fn scatter(core: &mut SimCore, vector: &[Word], offset: usize) -> Result<(), bsp::Error> {
    for (worker, slice) in vector.chunks(MAX_BURST).enumerate() {
        core.enqueue(worker + 1, slice, offset)?;
    }
    Ok(())
}

pub fn kernel(core: &mut SimCore, memory: &LocalMemory, dump: bool) -> CoreOutput {
    let id = core.id();
    let mut status = Ok(());
    superstep(core, dump, &mut status, |core| {
        if id == 0 {
            scatter(core, &v1(), SCRATCH)?;
        }
        Ok(())
    });

    superstep(core, dump, &mut status, |core| {
        if id == 0 {
            scatter(core, &v2(), SCRATCH + MAX_BURST)?;
        }
        Ok(())
    });

    superstep(core, dump, &mut status, |core| {
        if id != 0 {
            let a = memory.read_range(SCRATCH, MAX_BURST)?;
            let b = memory.read_range(SCRATCH + MAX_BURST, MAX_BURST)?;
            let sum = a
                .iter()
                .zip(&b)
                .fold(0 as Word, |acc, (x, y)| acc.wrapping_add(x.wrapping_mul(*y)));
            log::debug!("core {}: partial sum {}", id, sum);
            memory.write(SCRATCH, sum)?;
            core.enqueue(0, &[sum], SCRATCH + id)?;
        }
        Ok(())
    });
    status?;

    if id == 0 {
        let partials = memory.read_range(SCRATCH + 1, WORKERS)?;
        let sum = partials.iter().fold(0 as Word, |acc, x| acc.wrapping_add(*x));
        memory.write(SCRATCH, sum)?;
        return Ok(Some(vec![sum]));
    }
    Ok(None)
}

pub fn expected() -> Word {
    v1().iter().zip(v2()).map(|(x, y)| x * y).sum()
}

pub fn verify(result: &[Word]) -> bool {
    result == [expected()]
}
