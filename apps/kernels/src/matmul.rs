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

//! Dense 8x8 matrix multiply, one row of the result per worker.
//!
//! Worker `w` receives row `w - 1` of A at `SCRATCH` and all of B right after
//! it, computes its row of C and returns it to core 0.

use bsp::{LocalMemory, SimCore, Word, MAX_BURST};

use crate::{superstep, CoreOutput, SCRATCH};

pub const NUM_CORES: usize = 9;
pub const SIZE: usize = NUM_CORES - 1;

/// Row-major `a[i][k] = i`.
pub fn a() -> Vec<Word> {
    (0..SIZE * SIZE).map(|n| (n / SIZE) as Word).collect()
}

/// Row-major `b[k][j] = k + j`.
pub fn b() -> Vec<Word> {
    (0..SIZE * SIZE)
        .map(|n| (n / SIZE + n % SIZE) as Word)
        .collect()
}

pub fn kernel(core: &mut SimCore, memory: &LocalMemory, dump: bool) -> CoreOutput {
    let id = core.id();
    let b_offset = SCRATCH + SIZE;
    let mut status = Ok(());
    superstep(core, dump, &mut status, |core| {
        if id == 0 {
            let a = a();
            let b = b();
            for (row, a_row) in a.chunks(SIZE).enumerate() {
                let worker = row + 1;
                core.enqueue(worker, a_row, SCRATCH)?;
                for (chunk, words) in b.chunks(MAX_BURST).enumerate() {
                    core.enqueue(worker, words, b_offset + chunk * MAX_BURST)?;
                }
            }
            log::debug!("core 0 queued {} flits", core.queue().len());
        }
        Ok(())
    });

    superstep(core, dump, &mut status, |core| {
        if id != 0 {
            let a_row = memory.read_range(SCRATCH, SIZE)?;
            let b = memory.read_range(b_offset, SIZE * SIZE)?;
            let c_row = (0..SIZE)
                .map(|j| {
                    (0..SIZE).fold(0 as Word, |acc, k| {
                        acc.wrapping_add(a_row[k].wrapping_mul(b[k * SIZE + j]))
                    })
                })
                .collect::<Vec<_>>();
            core.enqueue(0, &c_row, SCRATCH + SIZE * (id - 1))?;
        }
        Ok(())
    });
    status?;

    if id == 0 {
        return Ok(Some(memory.read_range(SCRATCH, SIZE * SIZE)?));
    }
    Ok(None)
}

/// `c[i][j] = i * sum_k (k + j)`.
pub fn expected() -> Vec<Word> {
    let column_sum = |j: usize| (0..SIZE).map(|k| k + j).sum::<usize>();
    (0..SIZE * SIZE)
        .map(|n| ((n / SIZE) * column_sum(n % SIZE)) as Word)
        .collect()
}

pub fn verify(result: &[Word]) -> bool {
    result == expected().as_slice()
}
