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

//! The two-phase superstep handshake.
//!
//!```text
//!   Computing --set arrived--> ArrivedWaitingStart --start seen--> Draining
//!       ^                                                             |
//!       |                                                   inject, clear arrived
//!       +------------end seen------- DepartedWaitingEnd <-------------+
//!```
//!
//! No flit leaves the core before every core has arrived, and no core resumes
//! computing before every core has drained.

use std::fmt;

use crate::hw::{NetworkInterface, SyncFlag, SyncRegisters};
use crate::inject::inject;
use crate::queue::OutgoingQueue;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SuperstepPhase {
    Computing,
    ArrivedWaitingStart,
    Draining,
    DepartedWaitingEnd,
}

impl fmt::Display for SuperstepPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Runs the barrier protocol of one core against its sync registers.
#[derive(Debug)]
pub struct Synchronizer<S> {
    registers: S,
    phase: SuperstepPhase,
    superstep: usize,
}

impl<S: SyncRegisters> Synchronizer<S> {
    pub fn new(registers: S) -> Self {
        Self {
            registers,
            phase: SuperstepPhase::Computing,
            superstep: 0,
        }
    }

    pub fn registers(&self) -> &S {
        &self.registers
    }

    pub fn phase(&self) -> SuperstepPhase {
        self.phase
    }

    /// Number of completed barriers.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    fn advance(&mut self, next: SuperstepPhase) {
        log::trace!(
            "core {} superstep {}: {} -> {}",
            self.registers.core_id(),
            self.superstep,
            self.phase,
            next
        );
        self.phase = next;
    }

    /// Completes the current superstep: drains `queue` to `network` once every
    /// core has arrived, then waits until every core has drained.
    ///
    /// Blocks forever if any core never reaches the same barrier. Returns the
    /// number of flits injected.
    pub fn sync<N: NetworkInterface + ?Sized>(
        &mut self,
        queue: &mut OutgoingQueue,
        network: &mut N,
    ) -> usize {
        self.registers.write_flag(SyncFlag::OwnArrived, true);
        self.advance(SuperstepPhase::ArrivedWaitingStart);
        self.registers.wait_flag(SyncFlag::GlobalStart);

        self.registers.write_flag(SyncFlag::GlobalStart, false);
        self.advance(SuperstepPhase::Draining);
        let sent = inject(queue, network);

        self.registers.write_flag(SyncFlag::OwnArrived, false);
        self.advance(SuperstepPhase::DepartedWaitingEnd);
        self.registers.wait_flag(SyncFlag::GlobalEnd);

        self.registers.write_flag(SyncFlag::GlobalEnd, false);
        self.advance(SuperstepPhase::Computing);
        log::debug!(
            "core {} completed superstep {} ({} flits sent)",
            self.registers.core_id(),
            self.superstep,
            sent
        );
        self.superstep += 1;
        sent
    }
}

#[cfg(test)]
mod barrier_tests {
    use super::*;
    use crate::flit::{FlitKind, Header};
    use crate::{CoreId, Word};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Debug, Eq, PartialEq)]
    enum Op {
        Write(SyncFlag, bool),
        Wait(SyncFlag),
        Send(FlitKind),
    }

    /// Registers whose global flags always read as asserted; records every
    /// access in a log shared with the network.
    struct RecordingRegisters {
        ops: Rc<RefCell<Vec<Op>>>,
    }

    impl SyncRegisters for RecordingRegisters {
        fn read_flag(&self, _flag: SyncFlag) -> bool {
            true
        }

        fn write_flag(&self, flag: SyncFlag, value: bool) {
            self.ops.borrow_mut().push(Op::Write(flag, value));
        }

        fn core_id(&self) -> CoreId {
            0
        }

        fn wait_flag(&self, flag: SyncFlag) {
            self.ops.borrow_mut().push(Op::Wait(flag));
        }
    }

    struct RecordingNetwork {
        ops: Rc<RefCell<Vec<Op>>>,
    }

    impl NetworkInterface for RecordingNetwork {
        fn send_flit(&mut self, kind: FlitKind, _payload: Word) {
            self.ops.borrow_mut().push(Op::Send(kind));
        }
    }

    #[test]
    fn test_handshake_order() {
        let ops = Rc::new(RefCell::new(Vec::new()));
        let mut sync = Synchronizer::new(RecordingRegisters { ops: ops.clone() });
        let mut network = RecordingNetwork { ops: ops.clone() };
        let mut queue = OutgoingQueue::default();
        queue
            .push_message(Header::new(1, 0, 1).unwrap(), &[9])
            .unwrap();

        assert_eq!(sync.sync(&mut queue, &mut network), 3);
        assert_eq!(
            *ops.borrow(),
            vec![
                Op::Write(SyncFlag::OwnArrived, true),
                Op::Wait(SyncFlag::GlobalStart),
                Op::Write(SyncFlag::GlobalStart, false),
                Op::Send(FlitKind::Header),
                Op::Send(FlitKind::Body),
                Op::Send(FlitKind::Tail),
                Op::Write(SyncFlag::OwnArrived, false),
                Op::Wait(SyncFlag::GlobalEnd),
                Op::Write(SyncFlag::GlobalEnd, false),
            ]
        );
        assert!(queue.is_empty());
        assert_eq!(sync.phase(), SuperstepPhase::Computing);
        assert_eq!(sync.superstep(), 1);
    }

    #[test]
    fn test_empty_superstep_still_handshakes() {
        let ops = Rc::new(RefCell::new(Vec::new()));
        let mut sync = Synchronizer::new(RecordingRegisters { ops: ops.clone() });
        let mut network = RecordingNetwork { ops: ops.clone() };
        let mut queue = OutgoingQueue::default();
        for _ in 0..3 {
            assert_eq!(sync.sync(&mut queue, &mut network), 0);
        }
        assert_eq!(sync.superstep(), 3);
        assert_eq!(ops.borrow().len(), 3 * 6);
        assert!(!ops.borrow().iter().any(|op| matches!(op, Op::Send(_))));
    }
}
