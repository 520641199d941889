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

//! The simulated router and the local memories it writes into.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::trace::{Trace, TraceEvent};
use crate::flit::{Flit, FlitKind, Header};
use crate::hw::NetworkInterface;
use crate::{CoreId, Error, Word};

/// A core's local memory, shared between the core and the router.
#[derive(Clone, Debug)]
pub struct LocalMemory(Arc<[AtomicU32]>);

impl LocalMemory {
    pub fn new(words: usize) -> Self {
        Self((0..words).map(|_| AtomicU32::new(0)).collect::<Vec<_>>().into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn read(&self, offset: usize) -> Result<Word, Error> {
        self.0
            .get(offset)
            .map(|word| word.load(Ordering::Relaxed))
            .ok_or(Error::AddressOutOfRange(offset))
    }

    pub fn write(&self, offset: usize, value: Word) -> Result<(), Error> {
        let word = self.0.get(offset).ok_or(Error::AddressOutOfRange(offset))?;
        word.store(value, Ordering::Relaxed);
        Ok(())
    }

    pub fn read_range(&self, offset: usize, len: usize) -> Result<Vec<Word>, Error> {
        (offset..offset + len).map(|addr| self.read(addr)).collect()
    }

    pub fn write_slice(&self, offset: usize, values: &[Word]) -> Result<(), Error> {
        if offset + values.len() > self.len() {
            return Err(Error::AddressOutOfRange(offset + values.len() - 1));
        }
        for (addr, value) in (offset..).zip(values) {
            self.write(addr, *value)?;
        }
        Ok(())
    }
}

/// The local memories of every core, as reached through the network.
#[derive(Debug)]
pub struct Fabric {
    memories: Vec<LocalMemory>,
    trace: Trace,
}

impl Fabric {
    pub fn new(num_cores: usize, memory_words: usize, trace: Trace) -> Self {
        Self {
            memories: (0..num_cores).map(|_| LocalMemory::new(memory_words)).collect(),
            trace,
        }
    }

    pub fn memory(&self, core: CoreId) -> Option<&LocalMemory> {
        self.memories.get(core)
    }
}

/// Where the next body word of an open message goes.
#[derive(Clone, Copy, Debug)]
struct Burst {
    header: Header,
    written: usize,
}

/// One core's send interface. Deposits body words into the target memory in
/// the order they are received.
#[derive(Debug)]
pub struct SimPort {
    core: CoreId,
    fabric: Arc<Fabric>,
    burst: Option<Burst>,
}

impl SimPort {
    pub fn new(core: CoreId, fabric: Arc<Fabric>) -> Self {
        Self {
            core,
            fabric,
            burst: None,
        }
    }

    fn drop_flit(&self, flit: Flit, reason: &str) {
        log::warn!("router: dropped {:?} from core {}: {}", flit, self.core, reason);
        self.fabric.trace.log(TraceEvent::Dropped {
            core: self.core,
            flit,
        });
    }

    fn deliver(&mut self, word: Word) {
        let flit = Flit::Body(word);
        let Some(burst) = self.burst.as_mut() else {
            self.drop_flit(flit, "body outside of a message");
            return;
        };
        if burst.written == burst.header.burst_length() {
            self.drop_flit(flit, "body past the announced burst length");
            return;
        }
        let header = burst.header;
        let address = header.destination() + burst.written;
        burst.written += 1;
        let delivered = self
            .fabric
            .memory(header.core())
            .map(|memory| memory.write(address, word));
        match delivered {
            Some(Ok(())) => log::trace!(
                "router: core {} -> core {} [{:#x}] = {}",
                self.core,
                header.core(),
                address,
                word
            ),
            Some(Err(_)) => self.drop_flit(flit, "address outside of the target memory"),
            None => self.drop_flit(flit, "no such core"),
        }
    }
}

impl NetworkInterface for SimPort {
    fn send_flit(&mut self, kind: FlitKind, payload: Word) {
        let flit = Flit::from_raw(kind, payload);
        self.fabric.trace.log(TraceEvent::Injected {
            core: self.core,
            flit,
        });
        match flit {
            Flit::Header(header) => {
                if let Some(open) = self.burst.take() {
                    log::warn!(
                        "router: core {} started a message before ending {:?}",
                        self.core,
                        open.header
                    );
                }
                self.burst = Some(Burst { header, written: 0 });
            }
            Flit::Body(word) => self.deliver(word),
            Flit::Tail => match self.burst.take() {
                Some(burst) if burst.written != burst.header.burst_length() => {
                    log::warn!(
                        "router: core {} ended a message after {} of {} words",
                        self.core,
                        burst.written,
                        burst.header.burst_length()
                    );
                }
                Some(_) => {}
                None => self.drop_flit(flit, "tail outside of a message"),
            },
        }
    }
}

#[cfg(test)]
mod fabric_tests {
    use super::*;

    fn fabric(num_cores: usize, memory_words: usize) -> (Arc<Fabric>, Trace) {
        let trace = Trace::new();
        (
            Arc::new(Fabric::new(num_cores, memory_words, trace.clone())),
            trace,
        )
    }

    fn send_message(port: &mut SimPort, header: Header, words: &[Word]) {
        port.send_flit(FlitKind::Header, header.encode());
        for word in words {
            port.send_flit(FlitKind::Body, *word);
        }
        port.send_flit(FlitKind::Tail, 0);
    }

    #[test]
    fn test_local_memory_bounds() {
        let memory = LocalMemory::new(4);
        memory.write_slice(1, &[1, 2, 3]).unwrap();
        assert_eq!(memory.read_range(0, 4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(memory.read(4), Err(Error::AddressOutOfRange(4)));
        assert_eq!(
            memory.write_slice(2, &[1, 2, 3]),
            Err(Error::AddressOutOfRange(4))
        );
        assert_eq!(memory.read_range(2, 2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_message_lands_in_target_memory() {
        let (fabric, trace) = fabric(2, 64);
        let mut port = SimPort::new(0, fabric.clone());
        send_message(&mut port, Header::new(1, 8, 4).unwrap(), &[10, 20, 30, 40]);
        assert_eq!(
            fabric.memory(1).unwrap().read_range(8, 4).unwrap(),
            vec![10, 20, 30, 40]
        );
        assert_eq!(fabric.memory(0).unwrap().read(8).unwrap(), 0);
        let events = trace.take();
        assert_eq!(events.len(), 6);
        assert!(events
            .iter()
            .all(|event| matches!(event, TraceEvent::Injected { core: 0, .. })));
    }

    #[test]
    fn test_malformed_traffic_dropped() {
        let (fabric, trace) = fabric(2, 4);
        let mut port = SimPort::new(0, fabric.clone());
        port.send_flit(FlitKind::Body, 1);
        port.send_flit(FlitKind::Tail, 0);
        // the last two words fall outside the 4-word memory
        send_message(&mut port, Header::new(1, 2, 4).unwrap(), &[5, 6, 7, 8]);
        // core 3 does not exist
        send_message(&mut port, Header::new(3, 0, 1).unwrap(), &[9]);

        assert_eq!(
            fabric.memory(1).unwrap().read_range(0, 4).unwrap(),
            vec![0, 0, 5, 6]
        );
        let dropped = trace
            .take()
            .into_iter()
            .filter(|event| matches!(event, TraceEvent::Dropped { .. }))
            .collect::<Vec<_>>();
        assert_eq!(
            dropped,
            vec![
                TraceEvent::Dropped {
                    core: 0,
                    flit: Flit::Body(1)
                },
                TraceEvent::Dropped {
                    core: 0,
                    flit: Flit::Tail
                },
                TraceEvent::Dropped {
                    core: 0,
                    flit: Flit::Body(7)
                },
                TraceEvent::Dropped {
                    core: 0,
                    flit: Flit::Body(8)
                },
                TraceEvent::Dropped {
                    core: 0,
                    flit: Flit::Body(9)
                },
            ]
        );
    }

    #[test]
    fn test_ports_keep_separate_bursts() {
        let (fabric, _trace) = fabric(3, 16);
        let mut port0 = SimPort::new(0, fabric.clone());
        let mut port1 = SimPort::new(1, fabric.clone());
        port0.send_flit(FlitKind::Header, Header::new(2, 0, 2).unwrap().encode());
        port1.send_flit(FlitKind::Header, Header::new(2, 8, 2).unwrap().encode());
        port0.send_flit(FlitKind::Body, 1);
        port1.send_flit(FlitKind::Body, 3);
        port0.send_flit(FlitKind::Body, 2);
        port1.send_flit(FlitKind::Body, 4);
        port0.send_flit(FlitKind::Tail, 0);
        port1.send_flit(FlitKind::Tail, 0);
        let memory = fabric.memory(2).unwrap();
        assert_eq!(memory.read_range(0, 2).unwrap(), vec![1, 2]);
        assert_eq!(memory.read_range(8, 2).unwrap(), vec![3, 4]);
    }
}
