// ferry/src/pipeline/hooks.rs

//! Methods for appending hand-built hooks to an activated [`HookPipeline`],
//! next to the ones compiled from a [`HookSpec`](crate::pipeline::HookSpec).

use crate::core::context::{HookContext, HookType};
use crate::core::context_data::ContextData;
use crate::core::hook::{hook_fn, HookFn};
use crate::error::FerryResult;
use crate::pipeline::definition::{ActivatedHook, HookPipeline};
use std::future::Future;
use tracing::{event, Level};

impl HookPipeline {
  /// Appends an already bound hook to `phase`.
  pub fn push_hook(&mut self, phase: HookType, name: &str, hook: HookFn) {
    self.phase_mut(phase).push(ActivatedHook {
      name: name.to_string(),
      hook,
    });
    event!(Level::DEBUG, hook = name, %phase, "Hook appended.");
  }

  /// Appends a `before` hook built from an async closure.
  pub fn before_hook<F>(
    &mut self,
    name: &str,
    handler_fn: impl Fn(ContextData<HookContext>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = FerryResult<()>> + Send + 'static,
  {
    self.push_hook(HookType::Before, name, hook_fn(handler_fn));
  }

  /// Appends an `after` hook built from an async closure.
  pub fn after_hook<F>(
    &mut self,
    name: &str,
    handler_fn: impl Fn(ContextData<HookContext>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = FerryResult<()>> + Send + 'static,
  {
    self.push_hook(HookType::After, name, hook_fn(handler_fn));
  }

  /// Removes every hook named `name` from both phases.
  pub fn remove_hook(&mut self, name: &str) {
    self.before.retain(|h| h.name != name);
    self.after.retain(|h| h.name != name);
  }
}
