// ferry/src/core/hook.rs

//! Hook function and hook factory types.

use crate::core::context::HookContext;
use crate::core::context_data::ContextData;
use crate::error::FerryResult;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type HookFuture = Pin<Box<dyn Future<Output = FerryResult<()>> + Send>>;

/// A bound hook: an asynchronous function over the shared run context.
///
/// Hooks receive a clone of the run's `ContextData<HookContext>` handle,
/// mutate it in place and resolve once their work, including any I/O, is
/// done. They must drop lock guards before every `.await`.
pub type HookFn = Arc<dyn Fn(ContextData<HookContext>) -> HookFuture + Send + Sync>;

/// Binds a hook from its configuration object.
pub type HookFactory = Arc<dyn Fn(&Value) -> FerryResult<HookFn> + Send + Sync>;

/// Wraps an async closure into a [`HookFn`].
pub fn hook_fn<F, Fut>(f: F) -> HookFn
where
  F: Fn(ContextData<HookContext>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = FerryResult<()>> + Send + 'static,
{
  Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wraps a synchronous closure over the locked context into a [`HookFn`].
pub fn sync_hook_fn<F>(f: F) -> HookFn
where
  F: Fn(&mut HookContext) -> FerryResult<()> + Send + Sync + 'static,
{
  let f = Arc::new(f);
  Arc::new(move |ctx: ContextData<HookContext>| {
    let f = f.clone();
    Box::pin(async move { ctx.update(|c| f(c)) })
  })
}
