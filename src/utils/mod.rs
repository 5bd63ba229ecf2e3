//! Utility helpers: arena allocation, logging and profiling scopes, math extensions.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, EntityId};
pub use math::*;
pub use profiling::QueryStats;
