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

//! Sorts 128 values: eight workers sort a 16-value block each, core 0 merges
//! the sorted blocks.

use itertools::Itertools;

use bsp::{LocalMemory, SimCore, Word, MAX_BURST};

use crate::{superstep, CoreOutput, SCRATCH};

pub const NUM_CORES: usize = 9;
const WORKERS: usize = NUM_CORES - 1;

const PATTERN: [Word; 32] = [
    5, 8, 1, 2, 2, 0, 6, 9, 9, 5, 4, 7, 2, 1, 7, 3, 1, 2, 1, 4, 4, 7, 5, 5, 5, 3, 8, 9, 1, 3, 3, 7,
];

pub fn input() -> Vec<Word> {
    PATTERN
        .iter()
        .copied()
        .cycle()
        .take(WORKERS * MAX_BURST)
        .collect()
}

pub fn kernel(core: &mut SimCore, memory: &LocalMemory, dump: bool) -> CoreOutput {
    let id = core.id();
    let mut status = Ok(());
    superstep(core, dump, &mut status, |core| {
        if id == 0 {
            for (worker, block) in input().chunks(MAX_BURST).enumerate() {
                core.enqueue(worker + 1, block, SCRATCH)?;
            }
        }
        Ok(())
    });

    superstep(core, dump, &mut status, |core| {
        if id != 0 {
            let mut block = memory.read_range(SCRATCH, MAX_BURST)?;
            block.sort_unstable();
            memory.write_slice(SCRATCH, &block)?;
            core.enqueue(0, &block, SCRATCH + MAX_BURST * (id - 1))?;
        }
        Ok(())
    });
    status?;

    if id == 0 {
        let blocks = (0..WORKERS)
            .map(|worker| memory.read_range(SCRATCH + MAX_BURST * worker, MAX_BURST))
            .collect::<Result<Vec<_>, _>>()?;
        let sorted = blocks.into_iter().kmerge().collect::<Vec<_>>();
        log::info!("final sorted: {:?}", sorted);
        return Ok(Some(sorted));
    }
    Ok(None)
}

pub fn verify(result: &[Word]) -> bool {
    let mut expected = input();
    expected.sort_unstable();
    result == expected.as_slice()
}
