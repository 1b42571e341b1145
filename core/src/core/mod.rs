pub mod context;
pub mod context_data;
pub mod hook;
pub mod value_path;

// Re-export key types for easier access from other ferry modules (and lib.rs)
pub use context::{HookContext, HookParams, HookType, Output};
pub use context_data::ContextData;
pub use hook::{hook_fn, sync_hook_fn, HookFactory, HookFn, HookFuture};
pub use value_path::{PathError, PathSegment, ValuePath};
