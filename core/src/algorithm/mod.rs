//! CHRONOS Algorithm Framework
//! Graph algorithms behind a common parameter and execution protocol
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod traits;
pub mod graph;

pub use self::traits::*;
pub use self::graph::*;
