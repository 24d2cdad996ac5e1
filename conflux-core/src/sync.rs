// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The mutex used throughout the crate for short, uncontended critical sections.

pub use parking_lot::{Mutex, MutexGuard};
