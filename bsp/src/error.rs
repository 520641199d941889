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

use crate::CoreId;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A message body must hold between 1 and `MAX_BURST` words.
    InvalidBurstLength(usize),
    /// The outgoing queue cannot hold the message for this superstep.
    QueueCapacityExceeded { requested: usize, available: usize },
    /// A local-memory offset outside the addressable space.
    AddressOutOfRange(usize),
    /// A core id outside the configured array.
    InvalidCore(CoreId),
    InvalidConfiguration(String),
    /// A simulated core terminated abnormally.
    CoreFailed(CoreId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidBurstLength(len) => {
                write!(f, "ERROR: Invalid burst length {}", len)
            }
            Self::QueueCapacityExceeded {
                requested,
                available,
            } => {
                write!(
                    f,
                    "ERROR: Queue capacity exceeded ({} flits requested, {} available)",
                    requested, available
                )
            }
            Self::AddressOutOfRange(address) => {
                write!(f, "ERROR: Address {:#x} out of range", address)
            }
            Self::InvalidCore(id) => write!(f, "ERROR: Invalid core {}", id),
            Self::InvalidConfiguration(reason) => {
                write!(f, "ERROR: Invalid configuration: {}", reason)
            }
            Self::CoreFailed(id) => write!(f, "ERROR: Core {} failed", id),
        }
    }
}

impl std::error::Error for Error {}
