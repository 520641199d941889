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

use std::fmt;

use crate::flit::{Flit, Header, ADDRESS_SPACE, MAX_BURST, MAX_CORES};
use crate::{Error, Word};

/// The reference queue sizing, in flits.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// The largest queue a configuration may ask for, in flits: one full message
/// to every address of every core.
pub const MAX_QUEUE_CAPACITY: usize = MAX_CORES * ADDRESS_SPACE / MAX_BURST * (MAX_BURST + 2);

/// Flits waiting for the next barrier, in send order.
///
/// The queue never grows past its capacity: a message that does not fit is
/// refused as a whole and leaves the queue untouched.
#[derive(Clone, Debug)]
pub struct OutgoingQueue {
    flits: Vec<Flit>,
    capacity: usize,
}

impl OutgoingQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            flits: Vec::with_capacity(capacity.min(DEFAULT_QUEUE_CAPACITY)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.flits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flits.is_empty()
    }

    /// Free slots left in this superstep.
    pub fn available(&self) -> usize {
        self.capacity - self.flits.len()
    }

    /// Appends a whole message: the header, one body flit per word and the
    /// tail.
    pub fn push_message(&mut self, header: Header, words: &[Word]) -> Result<(), Error> {
        if words.len() != header.burst_length() {
            return Err(Error::InvalidBurstLength(words.len()));
        }
        let requested = header.message_flits();
        if requested > self.available() {
            return Err(Error::QueueCapacityExceeded {
                requested,
                available: self.available(),
            });
        }
        self.flits.push(Flit::Header(header));
        self.flits.extend(words.iter().copied().map(Flit::Body));
        self.flits.push(Flit::Tail);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Flit> {
        self.flits.iter()
    }

    /// Removes every flit, front to back. The queue is empty once the
    /// iterator is dropped.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Flit> {
        self.flits.drain(..)
    }

    pub fn clear(&mut self) {
        self.flits.clear();
    }
}

impl Default for OutgoingQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// One `<tag>|<payload>` line per queued flit.
impl fmt::Display for OutgoingQueue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for flit in &self.flits {
            writeln!(f, "{}", flit)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a OutgoingQueue {
    type Item = &'a Flit;
    type IntoIter = std::slice::Iter<'a, Flit>;

    fn into_iter(self) -> Self::IntoIter {
        self.flits.iter()
    }
}

#[cfg(test)]
mod queue_tests {
    use super::*;
    use crate::flit::{FlitKind, MAX_BURST};

    fn message(core: usize, destination: usize, words: &[Word]) -> (Header, Vec<Word>) {
        (
            Header::new(core, destination, words.len()).unwrap(),
            words.to_vec(),
        )
    }

    #[test]
    fn test_huge_capacity_not_preallocated() {
        let mut queue = OutgoingQueue::new(usize::MAX);
        assert_eq!(queue.capacity(), usize::MAX);
        let (header, words) = message(1, 0, &[7]);
        queue.push_message(header, &words).unwrap();
        assert_eq!(queue.available(), usize::MAX - 3);
    }

    #[test]
    fn test_message_layout() {
        let mut queue = OutgoingQueue::default();
        let (header, words) = message(1, 0, &[10, 20, 30, 40]);
        queue.push_message(header, &words).unwrap();
        assert_eq!(queue.len(), 6);
        assert_eq!(
            queue.iter().copied().collect::<Vec<_>>(),
            vec![
                Flit::Header(header),
                Flit::Body(10),
                Flit::Body(20),
                Flit::Body(30),
                Flit::Body(40),
                Flit::Tail
            ]
        );
    }

    #[test]
    fn test_messages_keep_fifo_order() {
        let mut queue = OutgoingQueue::default();
        let (first, first_words) = message(1, 0, &[1]);
        let (second, second_words) = message(2, 8, &[2, 3]);
        queue.push_message(first, &first_words).unwrap();
        queue.push_message(second, &second_words).unwrap();
        let kinds = queue.iter().map(|flit| flit.kind()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                FlitKind::Header,
                FlitKind::Body,
                FlitKind::Tail,
                FlitKind::Header,
                FlitKind::Body,
                FlitKind::Body,
                FlitKind::Tail
            ]
        );
        assert_eq!(queue.iter().nth(3), Some(&Flit::Header(second)));
    }

    #[test]
    fn test_capacity_boundary() {
        let mut queue = OutgoingQueue::default();
        let words = [7; MAX_BURST];
        let header = Header::new(3, 0, MAX_BURST).unwrap();
        let fits = DEFAULT_QUEUE_CAPACITY / (MAX_BURST + 2);
        for _ in 0..fits {
            queue.push_message(header, &words).unwrap();
        }
        assert_eq!(queue.len(), fits * (MAX_BURST + 2));
        let before = queue.clone();
        assert_eq!(
            queue.push_message(header, &words),
            Err(Error::QueueCapacityExceeded {
                requested: MAX_BURST + 2,
                available: DEFAULT_QUEUE_CAPACITY - fits * (MAX_BURST + 2),
            })
        );
        assert_eq!(queue.iter().collect::<Vec<_>>(), before.iter().collect::<Vec<_>>());

        // a smaller message still fits in the remaining slots
        let small = Header::new(3, 0, 1).unwrap();
        queue.push_message(small, &[1]).unwrap();
        assert_eq!(queue.available(), before.available() - 3);
    }

    #[test]
    fn test_mismatched_words_rejected() {
        let mut queue = OutgoingQueue::default();
        let header = Header::new(0, 0, 4).unwrap();
        assert_eq!(
            queue.push_message(header, &[1, 2, 3]),
            Err(Error::InvalidBurstLength(3))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = OutgoingQueue::new(32);
        let (header, words) = message(1, 4, &[5, 6]);
        queue.push_message(header, &words).unwrap();
        queue.push_message(header, &words).unwrap();
        assert_eq!(queue.drain().count(), 8);
        assert!(queue.is_empty());
        assert_eq!(queue.available(), 32);
    }

    #[test]
    fn test_dump() {
        let mut queue = OutgoingQueue::new(16);
        let header = Header::new(1, 0, 2).unwrap();
        queue.push_message(header, &[3, 4]).unwrap();
        let dump = queue.to_string();
        assert_eq!(
            dump,
            format!("0|{}\n1|3\n1|4\n2|0\n", header.encode() as i32)
        );
        assert_eq!(queue.len(), 4);
    }
}
