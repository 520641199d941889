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

use std::path::PathBuf;

use env_logger::Target;
use structopt::StructOpt;

use bsp::SystemConfiguration;
use kernels::Kernel;

#[derive(StructOpt)]
#[structopt(name = "kernels", about = "Sample BSP kernels on a simulated core array")]
struct Arguments {
    /// supported kernels: SyncTest, DotProduct, DivideSort, MatMul
    #[structopt(short, long, default_value = "DotProduct")]
    kernel: Kernel,
    /// YAML system configuration; defaults to the kernel's core count
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// log every outgoing queue before it is drained
    #[structopt(short, long)]
    dump: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::from_args();

    // queue dumps are logged by the communication layer at debug level
    let bsp_level = if args.dump {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::builder()
        .filter(Some("kernels"), log::LevelFilter::Info)
        .filter(Some("bsp"), bsp_level)
        .target(Target::Stderr)
        .init();

    let config = match &args.config {
        Some(path) => SystemConfiguration::from_file(path)?,
        None => SystemConfiguration::with_cores(args.kernel.num_cores()),
    };
    let report = args.kernel.run(config, args.dump)?;
    if !report.passed {
        std::process::exit(1);
    }
    Ok(())
}
