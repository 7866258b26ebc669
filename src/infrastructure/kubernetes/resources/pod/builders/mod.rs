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

//! Builders for the pieces of the application pod template

pub mod affinity;
pub mod env;
pub mod lifecycle;
pub mod probe;
pub mod traits;

pub use self::affinity::AffinityBuilder;
pub use self::env::EnvironmentBuilder;
pub use self::lifecycle::LifecycleBuilder;
pub use self::probe::ProbeBuilder;
pub use self::traits::LabeledResourceBuilder;
