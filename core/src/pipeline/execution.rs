// ferry/src/pipeline/execution.rs

//! Executes the phases of a [`HookPipeline`] against a run context.
//!
//! Hooks of a phase run strictly one after the other: the next hook starts only
//! once the previous one's future has resolved. The first failing hook aborts
//! the rest of the phase and its error is returned unchanged.

use crate::core::context::{HookContext, HookType};
use crate::core::context_data::ContextData;
use crate::error::FerryResult;
use crate::pipeline::definition::HookPipeline;
use std::future::Future;
use tracing::{event, instrument, span, Instrument, Level};

impl HookPipeline {
  /// Runs every hook of `phase` in declaration order.
  ///
  /// Sets the context's `kind` to `phase` first; hooks themselves never change it.
  #[instrument(
    name = "HookPipeline::run_phase",
    skip_all,
    fields(phase = %phase, num_hooks = self.phase(phase).len()),
    err(Display)
  )]
  pub async fn run_phase(&self, phase: HookType, ctx_data: ContextData<HookContext>) -> FerryResult<()> {
    ctx_data.update(|ctx| ctx.kind = phase);
    event!(Level::DEBUG, "Phase execution starting.");

    for (hook_idx, activated) in self.phase(phase).iter().enumerate() {
      let hook_span = span!(Level::DEBUG, "hook_execution", hook = %activated.name, hook_index = hook_idx);
      // Clone ctx_data for each hook; all clones share the same context.
      if let Err(e) = (activated.hook)(ctx_data.clone()).instrument(hook_span).await {
        event!(Level::ERROR, hook = %activated.name, error = %e, "Hook failed, aborting phase.");
        return Err(e);
      }
    }

    event!(Level::DEBUG, "Phase execution completed.");
    Ok(())
  }

  pub async fn run_before(&self, ctx_data: ContextData<HookContext>) -> FerryResult<()> {
    self.run_phase(HookType::Before, ctx_data).await
  }

  pub async fn run_after(&self, ctx_data: ContextData<HookContext>) -> FerryResult<()> {
    self.run_phase(HookType::After, ctx_data).await
  }

  /// Runs the before hooks, the task's primary `action`, then the after hooks.
  #[instrument(name = "HookPipeline::run", skip_all, err(Display))]
  pub async fn run<A, Fut>(&self, ctx_data: ContextData<HookContext>, action: A) -> FerryResult<()>
  where
    A: FnOnce(ContextData<HookContext>) -> Fut,
    Fut: Future<Output = FerryResult<()>>,
  {
    let task_id = ctx_data.with(|ctx| ctx.id().map(str::to_string));
    event!(Level::INFO, task_id = ?task_id, "Task run starting.");
    self.run_before(ctx_data.clone()).await?;
    event!(Level::DEBUG, "Running primary action.");
    action(ctx_data.clone()).await?;
    self.run_after(ctx_data).await
  }
}
