// src/lib.rs

//! Ferry: hook orchestration and store resolution for data-ingestion tasks.
//!
//! A task fetches or receives a raw artifact and hands it to an ordered chain
//! of named hooks that transform, merge or persist it. Ferry provides:
//!  - A name-keyed [`HookRegistry`] that turns a declarative [`HookSpec`] into
//!    an executable [`HookPipeline`] with `before` and `after` phases.
//!  - A shared, mutable [`HookContext`] every hook of a task works on.
//!  - A [`Store`] abstraction over filesystem, in-memory and object-storage
//!    backends, resolved per hook through [`StoreLookup`] with lazy,
//!    idempotent creation in a [`StoresService`].
//!  - Built-in hooks for JSON, GeoJSON, XML, YAML, CSV and templates.

pub mod config;
pub mod core;
pub mod error;
pub mod hooks;
pub mod pipeline;
pub mod registry;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::core::context::{HookContext, HookParams, HookType, Output};
pub use crate::core::context_data::ContextData;
pub use crate::core::hook::{hook_fn, sync_hook_fn, HookFactory, HookFn, HookFuture};
pub use crate::core::value_path::{PathError, ValuePath};

pub use crate::pipeline::{ActivatedHook, HookPipeline, HookSpec};
pub use crate::registry::HookRegistry;

pub use crate::store::{
  Addressing, BucketStore, FsStore, MemoryStore, ObjectClient, Store, StoreConfig, StoreDescriptor, StoreHandle,
  StoreLookup, StoreRequirement, StoresService, WriteParams,
};

pub use crate::config::{Job, JobConfig};
pub use crate::error::{ErrorKind, FerryError, FerryResult};

/*
    Typical flow:
    1. Build a `HookRegistry::with_builtins()` once and register host hooks on it.
    2. Load a `JobConfig` (JSON or YAML) and `build` it against the registry.
    3. For each task, `job.run(id, action)`: before hooks, the primary action
       (which fills `output`), then after hooks.
    4. Read the written artifacts back from `ctx.outputs`.
*/
