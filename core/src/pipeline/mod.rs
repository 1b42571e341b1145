// ferry/src/pipeline/mod.rs

//! Defines the hook specification, its activation into a `HookPipeline`, and
//! phase execution.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::{ActivatedHook, HookPipeline, HookSpec};
