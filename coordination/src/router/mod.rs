//! Worker Routing
//!
//! Maps a problem to the experts that should solve it. The policy is
//! pluggable; the keyword policy is the default.
//!
//! ```text
//! Capability | Keywords (sample)
//! -----------|------------------------------------------
//! geometry   | area, square, triangle, circle, 面積, 円
//! algebra    | equation, ratio, percent, times, 倍, 割合
//! (none)     | generalist fallback
//! ```

pub mod assignment;

pub use assignment::{AssignmentPolicy, KeywordAssignmentPolicy};
