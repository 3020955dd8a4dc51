//! Utility helpers: math extensions, lane math, logging and profiling.

pub mod logging;
pub mod math;
pub mod profiling;
pub mod simd;

pub use math::*;
pub use profiling::StepProfiler;
