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

//! Flit encoding.
//!
//! A message is a header flit, one body flit per data word and a tail flit.
//! The header packs the destination into a single word:
//!
//!```text
//!   31      22 21    18 17    14 13                  0
//!  +----------+--------+--------+---------------------+
//!  |  unused  |  core  | len-1  | destination address |
//!  +----------+--------+--------+---------------------+
//!```

use std::fmt;
use std::ops::Range;

use bitvec::prelude::*;

use crate::{CoreId, Error, Word};

/// Width of the destination address field.
pub const ADDRESS_BITS: usize = 14;
/// Width of the burst length field.
pub const BURST_BITS: usize = 4;
/// Width of the target core field.
pub const CORE_BITS: usize = 4;

/// Number of addressable words in a core's local memory.
pub const ADDRESS_SPACE: usize = 1 << ADDRESS_BITS;
/// The hardware burst ceiling.
pub const MAX_BURST: usize = 1 << BURST_BITS;
/// Number of cores a header can address.
pub const MAX_CORES: usize = 1 << CORE_BITS;

/// Payload of every tail flit.
pub const TAIL_SENTINEL: Word = 0;

const ADDRESS_FIELD: Range<usize> = 0..ADDRESS_BITS;
const BURST_FIELD: Range<usize> = ADDRESS_BITS..ADDRESS_BITS + BURST_BITS;
const CORE_FIELD: Range<usize> = ADDRESS_BITS + BURST_BITS..ADDRESS_BITS + BURST_BITS + CORE_BITS;

/// The flit tag. The discriminant is the offset of the matching send register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FlitKind {
    Header = 0,
    Body = 1,
    Tail = 2,
}

impl FlitKind {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Decoded header fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    core: CoreId,
    destination: usize,
    burst_length: usize,
}

fn check_burst_length(burst_length: usize) -> Result<(), Error> {
    if burst_length < 1 || burst_length > MAX_BURST {
        return Err(Error::InvalidBurstLength(burst_length));
    }
    Ok(())
}

impl Header {
    /// Builds a header, rejecting fields that do not fit their bit width.
    pub fn new(core: CoreId, destination: usize, burst_length: usize) -> Result<Self, Error> {
        check_burst_length(burst_length)?;
        if core >= MAX_CORES {
            return Err(Error::InvalidCore(core));
        }
        if destination >= ADDRESS_SPACE {
            return Err(Error::AddressOutOfRange(destination));
        }
        Ok(Self {
            core,
            destination,
            burst_length,
        })
    }

    /// Builds a header the way the hardware sees it: core and destination are
    /// masked to their field widths. The burst length is still checked.
    pub fn truncating(core: CoreId, destination: usize, burst_length: usize) -> Result<Self, Error> {
        check_burst_length(burst_length)?;
        Ok(Self {
            core: core & (MAX_CORES - 1),
            destination: destination & (ADDRESS_SPACE - 1),
            burst_length,
        })
    }

    pub fn core(&self) -> CoreId {
        self.core
    }

    pub fn destination(&self) -> usize {
        self.destination
    }

    pub fn burst_length(&self) -> usize {
        self.burst_length
    }

    /// Number of flits in the message this header starts.
    pub fn message_flits(&self) -> usize {
        self.burst_length + 2
    }

    pub fn encode(&self) -> Word {
        let mut word: Word = 0;
        let bits = word.view_bits_mut::<Lsb0>();
        bits[ADDRESS_FIELD].store_le(self.destination as u16);
        bits[BURST_FIELD].store_le((self.burst_length - 1) as u8);
        bits[CORE_FIELD].store_le(self.core as u8);
        word
    }

    /// Decodes a header word. Bits above the core field are ignored.
    pub fn decode(word: Word) -> Self {
        let bits = word.view_bits::<Lsb0>();
        Self {
            destination: bits[ADDRESS_FIELD].load_le::<u16>() as usize,
            burst_length: bits[BURST_FIELD].load_le::<u8>() as usize + 1,
            core: bits[CORE_FIELD].load_le::<u8>() as CoreId,
        }
    }
}

/// The atomic network transfer unit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flit {
    Header(Header),
    Body(Word),
    Tail,
}

impl Flit {
    pub fn kind(&self) -> FlitKind {
        match self {
            Self::Header(_) => FlitKind::Header,
            Self::Body(_) => FlitKind::Body,
            Self::Tail => FlitKind::Tail,
        }
    }

    /// The word written to the send register for this flit.
    pub fn payload(&self) -> Word {
        match self {
            Self::Header(header) => header.encode(),
            Self::Body(word) => *word,
            Self::Tail => TAIL_SENTINEL,
        }
    }

    /// Rebuilds a flit from what the network observed on a send register.
    pub fn from_raw(kind: FlitKind, payload: Word) -> Self {
        match kind {
            FlitKind::Header => Self::Header(Header::decode(payload)),
            FlitKind::Body => Self::Body(payload),
            FlitKind::Tail => Self::Tail,
        }
    }
}

impl fmt::Display for Flit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // signed, matching the integer dump of the target's console
        write!(f, "{}|{}", self.kind().tag(), self.payload() as i32)
    }
}
