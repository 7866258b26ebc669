// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// CLI command definitions

use super::operator::{CrdCommand, RenderCommand, RunCommand};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "springboot-operator",
    version,
    about = "Kubernetes operator for SpringBootApplication resources",
    long_about = "Watches SpringBootApplication resources and keeps a Service and a Deployment per application in sync with them"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the controller against the current cluster
    Run(RunCommand),

    /// Print the SpringBootApplication CustomResourceDefinition
    Crd(CrdCommand),

    /// Print the Service and Deployment a manifest would produce
    Render(RenderCommand),
}
