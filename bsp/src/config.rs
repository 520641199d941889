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

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::flit::{Header, ADDRESS_SPACE, MAX_CORES};
use crate::queue::{DEFAULT_QUEUE_CAPACITY, MAX_QUEUE_CAPACITY};
use crate::{CoreId, Error};

/// Number of cores in the reference array.
const DEFAULT_NUM_CORES: usize = 9;

/// What to do with a target core or destination that does not fit the header.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum AddressPolicy {
    /// Refuse the message.
    Reject,
    /// Mask the fields to their widths, as the hardware does.
    Truncate,
}

impl AddressPolicy {
    /// Builds the header for a message of `burst_length` words sent to
    /// `destination` on core `target` of an array of `num_cores` cores.
    pub fn header(
        self,
        target: CoreId,
        destination: usize,
        burst_length: usize,
        num_cores: usize,
    ) -> Result<Header, Error> {
        match self {
            Self::Truncate => Header::truncating(target, destination, burst_length),
            Self::Reject => {
                let header = Header::new(target, destination, burst_length)?;
                if target >= num_cores {
                    return Err(Error::InvalidCore(target));
                }
                // the last word of the burst must be addressable too
                if destination + burst_length > ADDRESS_SPACE {
                    return Err(Error::AddressOutOfRange(destination + burst_length - 1));
                }
                Ok(header)
            }
        }
    }
}

impl Default for AddressPolicy {
    fn default() -> Self {
        Self::Reject
    }
}

/// The compile-time shape of the core array.
///
/// constructed programmatically or read from a config file.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfiguration {
    pub num_cores: usize,
    /// Outgoing queue size per core, in flits.
    pub queue_capacity: usize,
    /// Local memory size per core, in words.
    pub local_memory_words: usize,
    pub address_policy: AddressPolicy,
}

impl Default for SystemConfiguration {
    fn default() -> Self {
        Self {
            num_cores: DEFAULT_NUM_CORES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            local_memory_words: ADDRESS_SPACE,
            address_policy: AddressPolicy::default(),
        }
    }
}

impl SystemConfiguration {
    pub fn with_cores(num_cores: usize) -> Self {
        Self {
            num_cores,
            ..Default::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open configuration {}", path.display()))?;
        let config: Self = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_str(config: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(config).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.num_cores == 0 || self.num_cores > MAX_CORES {
            return Err(Error::InvalidConfiguration(format!(
                "num_cores must be in 1..={}, got {}",
                MAX_CORES, self.num_cores
            )));
        }
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(Error::InvalidConfiguration(format!(
                "queue_capacity must be in 1..={}, got {}",
                MAX_QUEUE_CAPACITY, self.queue_capacity
            )));
        }
        if self.local_memory_words == 0 || self.local_memory_words > ADDRESS_SPACE {
            return Err(Error::InvalidConfiguration(format!(
                "local_memory_words must be in 1..={}, got {}",
                ADDRESS_SPACE, self.local_memory_words
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use crate::flit::MAX_BURST;

    #[test]
    fn read_yaml_config() {
        let config = SystemConfiguration::from_str(
            r#"
num_cores: 4
queue_capacity: 256
local_memory_words: 1024
address_policy: Truncate
"#,
        )
        .unwrap();
        assert_eq!(config.num_cores, 4);
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.local_memory_words, 1024);
        assert_eq!(config.address_policy, AddressPolicy::Truncate);
    }

    #[test]
    fn read_partial_yaml_config() {
        let config = SystemConfiguration::from_str("num_cores: 2\n").unwrap();
        assert_eq!(config.num_cores, 2);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.address_policy, AddressPolicy::Reject);
    }

    #[test]
    fn write_yaml_config() {
        let config = SystemConfiguration::default();
        let text = serde_yaml::to_string(&config).unwrap();
        let read_back = SystemConfiguration::from_str(&text).unwrap();
        assert_eq!(read_back.num_cores, config.num_cores);
        assert_eq!(read_back.local_memory_words, config.local_memory_words);
    }

    #[test]
    fn read_yaml_file() {
        let path = std::env::temp_dir().join(format!("bsp_config_{}.yaml", std::process::id()));
        std::fs::write(&path, "num_cores: 16\naddress_policy: Reject\n").unwrap();
        let config = SystemConfiguration::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.num_cores, 16);
        assert!(SystemConfiguration::from_file(&path).is_err());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(SystemConfiguration::with_cores(0).validate().is_err());
        assert!(SystemConfiguration::with_cores(MAX_CORES + 1).validate().is_err());
        assert!(SystemConfiguration::with_cores(MAX_CORES).validate().is_ok());
        let config = SystemConfiguration {
            local_memory_words: ADDRESS_SPACE + 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(SystemConfiguration::from_str("num_cores: 0\n").is_err());
    }

    #[test]
    fn test_queue_capacity_bounded() {
        let config = SystemConfiguration {
            queue_capacity: MAX_QUEUE_CAPACITY,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let config = SystemConfiguration {
            queue_capacity: MAX_QUEUE_CAPACITY + 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(SystemConfiguration::from_str(
            "num_cores: 2\nqueue_capacity: 18446744073709551615\n"
        )
        .is_err());
    }

    #[test]
    fn test_reject_policy() {
        let policy = AddressPolicy::Reject;
        assert!(policy.header(3, 0, MAX_BURST, 4).is_ok());
        assert_eq!(policy.header(4, 0, 1, 4), Err(Error::InvalidCore(4)));
        assert_eq!(policy.header(20, 0, 1, 4), Err(Error::InvalidCore(20)));
        assert_eq!(
            policy.header(0, ADDRESS_SPACE, 1, 4),
            Err(Error::AddressOutOfRange(ADDRESS_SPACE))
        );
        assert_eq!(
            policy.header(0, ADDRESS_SPACE - 2, 4, 4),
            Err(Error::AddressOutOfRange(ADDRESS_SPACE + 1))
        );
        assert_eq!(
            policy.header(0, 0, MAX_BURST + 1, 4),
            Err(Error::InvalidBurstLength(MAX_BURST + 1))
        );
    }

    #[test]
    fn test_truncate_policy() {
        let policy = AddressPolicy::Truncate;
        let header = policy.header(18, ADDRESS_SPACE + 3, 2, 4).unwrap();
        assert_eq!(header.core(), 2);
        assert_eq!(header.destination(), 3);
        assert_eq!(
            policy.header(0, 0, 0, 4),
            Err(Error::InvalidBurstLength(0))
        );
    }
}
