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
use std::str::FromStr;

/// The sample kernels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kernel {
    SyncTest,
    DotProduct,
    DivideSort,
    MatMul,
}

impl Kernel {
    pub const ALL: [Kernel; 4] = [
        Kernel::SyncTest,
        Kernel::DotProduct,
        Kernel::DivideSort,
        Kernel::MatMul,
    ];
}

impl FromStr for Kernel {
    type Err = std::io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SyncTest" => Ok(Kernel::SyncTest),
            "DotProduct" => Ok(Kernel::DotProduct),
            "DivideSort" => Ok(Kernel::DivideSort),
            "MatMul" => Ok(Kernel::MatMul),
            _ => Err(Self::Err::new(
                std::io::ErrorKind::Other,
                format!("Invalid kernel: {}", s),
            )),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
