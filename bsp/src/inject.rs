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

use crate::hw::NetworkInterface;
use crate::queue::OutgoingQueue;

/// Writes every queued flit to the network in queue order and leaves the
/// queue empty. Returns the number of flits sent.
///
/// Each flit goes to the send register selected by its tag. Acceptance is not
/// observed, so nothing is retried.
pub fn inject<N: NetworkInterface + ?Sized>(queue: &mut OutgoingQueue, network: &mut N) -> usize {
    let mut sent = 0;
    for flit in queue.drain() {
        log::trace!("inject: {:?}", flit);
        network.send_flit(flit.kind(), flit.payload());
        sent += 1;
    }
    sent
}

#[cfg(test)]
mod inject_tests {
    use super::*;
    use crate::flit::{Flit, FlitKind, Header, TAIL_SENTINEL};
    use crate::Word;

    #[test]
    fn test_inject_in_queue_order() {
        let mut queue = OutgoingQueue::default();
        let first = Header::new(1, 0, 2).unwrap();
        let second = Header::new(2, 16, 1).unwrap();
        queue.push_message(first, &[11, 12]).unwrap();
        queue.push_message(second, &[21]).unwrap();

        let mut wire: Vec<(FlitKind, Word)> = Vec::new();
        assert_eq!(inject(&mut queue, &mut wire), 7);
        assert_eq!(
            wire,
            vec![
                (FlitKind::Header, first.encode()),
                (FlitKind::Body, 11),
                (FlitKind::Body, 12),
                (FlitKind::Tail, TAIL_SENTINEL),
                (FlitKind::Header, second.encode()),
                (FlitKind::Body, 21),
                (FlitKind::Tail, TAIL_SENTINEL),
            ]
        );
        assert!(queue.is_empty());
        assert_eq!(
            wire.iter()
                .map(|(kind, payload)| Flit::from_raw(*kind, *payload))
                .next(),
            Some(Flit::Header(first))
        );
    }

    #[test]
    fn test_inject_empty_queue() {
        let mut queue = OutgoingQueue::default();
        let mut wire: Vec<(FlitKind, Word)> = Vec::new();
        assert_eq!(inject(&mut queue, &mut wire), 0);
        assert!(wire.is_empty());
    }

    #[test]
    fn test_queue_restarts_after_inject() {
        let mut queue = OutgoingQueue::new(8);
        let header = Header::new(1, 0, 4).unwrap();
        queue.push_message(header, &[1, 2, 3, 4]).unwrap();
        assert!(queue.push_message(header, &[1, 2, 3, 4]).is_err());

        let mut wire: Vec<(FlitKind, Word)> = Vec::new();
        inject(&mut queue, &mut wire);
        queue.push_message(header, &[5, 6, 7, 8]).unwrap();
        assert_eq!(queue.iter().next(), Some(&Flit::Header(header)));
        assert_eq!(queue.len(), 6);
    }
}
