//! Pipeline construction: turning a registration's processors (construction,
//! member injection, lifetime wrapping) into one cached callable, via either
//! the interpreted or the compiled strategy.

use crate::context::{ResolutionContext, Resolver};
use crate::error::{FailureKind, ResolutionError};
use crate::key::Instance;
use crate::lifetime::Lifetime;
use crate::registration::{Recipe, Registration};
use crate::selector::{MemberSelector, SelectorPolicy};
use tracing::trace;

/// How a container assembles resolution pipelines. Chosen once per container
/// at creation time; never mixed within one resolve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStrategy {
  /// Each processor wraps the next in a boxed closure. Cheap to build,
  /// moderate per-call overhead.
  Interpreted,
  /// Processors are flattened once into a fused step plan executed by a
  /// single callable. Higher build cost, lower steady-state cost.
  Compiled,
}

type RunFn =
  Box<dyn Fn(&ResolutionContext<'_>, &Registration) -> Result<Instance, ResolutionError> + Send + Sync>;

/// A single callable performing one resolution for one registration.
///
/// Immutable once built and cached on the registration; re-registration
/// replaces the whole record, never mutates a pipeline in place.
pub struct Pipeline {
  run: RunFn,
  strategy: PipelineStrategy,
}

impl Pipeline {
  pub(crate) fn execute(
    &self,
    ctx: &ResolutionContext<'_>,
    registration: &Registration,
  ) -> Result<Instance, ResolutionError> {
    (self.run)(ctx, registration)
  }

  pub fn strategy(&self) -> PipelineStrategy {
    self.strategy
  }
}

/// Builds the pipeline for `registration` with the given strategy.
///
/// Malformed registration shapes are rejected here, before any instance is
/// built: member directives on a value registration, a selector pointing past
/// the directive list, or a pool with no capacity.
pub(crate) fn build_pipeline(
  registration: &Registration,
  strategy: PipelineStrategy,
  selector: &dyn MemberSelector,
) -> Result<Pipeline, ResolutionError> {
  let order = match registration.policies().get::<SelectorPolicy>() {
    Some(policy) => policy.0.select(registration),
    None => selector.select(registration),
  };

  for &index in &order {
    if index >= registration.members().len() {
      return Err(invalid(registration, format!("member selector produced index {} out of range", index)));
    }
  }
  if matches!(registration.recipe, Recipe::Value) && !registration.members().is_empty() {
    return Err(invalid(
      registration,
      "member directives require a factory-built registration".to_owned(),
    ));
  }
  if let Lifetime::Pooled { capacity: 0 } = registration.lifetime_scope() {
    return Err(invalid(registration, "pooled lifetime requires a non-zero capacity".to_owned()));
  }

  trace!(key = %registration.key(), ?strategy, steps = order.len() + 1, "building pipeline");

  let scope = registration.lifetime_scope();
  let body = match strategy {
    PipelineStrategy::Interpreted => interpreted_body(scope, order),
    PipelineStrategy::Compiled => compiled_body(scope, order),
  };

  Ok(Pipeline { run: with_lifetime_guard(scope, body), strategy })
}

fn invalid(registration: &Registration, reason: String) -> ResolutionError {
  ResolutionError::new(FailureKind::InvalidRegistration {
    key: registration.key().clone(),
    reason,
  })
}

/// The construction processor: produces the base instance from the recipe.
fn construct(
  ctx: &ResolutionContext<'_>,
  registration: &Registration,
) -> Result<Instance, ResolutionError> {
  match &registration.recipe {
    Recipe::Factory(factory) => {
      let resolver = Resolver { ctx };
      factory(&resolver)
    }
    Recipe::Value => Err(ResolutionError::new(FailureKind::InvalidRegistration {
      key: registration.key().clone(),
      reason: "no stored instance available; an externally controlled value may have been dropped"
        .to_owned(),
    })),
    Recipe::Alias { target, coerce } => {
      let inner = ctx
        .container()
        .resolve_erased(target.clone(), Some(ctx), ctx.call)?;
      coerce(&inner).ok_or_else(|| {
        ResolutionError::new(FailureKind::InvalidRegistration {
          key: registration.key().clone(),
          reason: "alias target payload does not match the concrete registration".to_owned(),
        })
      })
    }
  }
}

fn apply_member(
  ctx: &ResolutionContext<'_>,
  registration: &Registration,
  index: usize,
  instance: &Instance,
) -> Result<(), ResolutionError> {
  let member = &registration.members()[index];
  let resolver = Resolver { ctx };
  (member.apply)(instance, &resolver)
    .map_err(|e| e.annotate(ctx.key().clone(), Some((member.kind, member.name.clone()))))
}

/// Interpreted strategy: onion composition. The constructor sits innermost;
/// the early-store step and each selected member directive wrap it in turn.
fn interpreted_body(scope: Lifetime, order: Vec<usize>) -> RunFn {
  let mut run: RunFn = Box::new(construct);

  if scope.stores_early() {
    let prev = run;
    run = Box::new(move |ctx, registration| {
      let instance = prev(ctx, registration)?;
      registration.lifetime.store(Some(ctx), instance.clone());
      Ok(instance)
    });
  }

  for index in order {
    let prev = run;
    run = Box::new(move |ctx, registration| {
      let instance = prev(ctx, registration)?;
      apply_member(ctx, registration, index, &instance)?;
      Ok(instance)
    });
  }

  run
}

/// Compiled strategy: the same steps, fused once into a flat plan executed by
/// a single callable.
fn compiled_body(scope: Lifetime, order: Vec<usize>) -> RunFn {
  let store_early = scope.stores_early();
  let plan: Vec<usize> = order;

  Box::new(move |ctx, registration| {
    let instance = construct(ctx, registration)?;
    if store_early {
      registration.lifetime.store(Some(ctx), instance.clone());
    }
    for &index in &plan {
      apply_member(ctx, registration, index, &instance)?;
    }
    Ok(instance)
  })
}

/// The lifetime processor, wrapped outermost around either body: probe the
/// scope slot, serialize first-build where the scope demands it, and publish
/// the finished instance.
fn with_lifetime_guard(scope: Lifetime, body: RunFn) -> RunFn {
  Box::new(move |ctx, registration| {
    if let Some(cached) = registration.lifetime.value(Some(ctx)) {
      trace!(key = %ctx.key(), "lifetime cache hit");
      return Ok(cached);
    }

    let build = |ctx: &ResolutionContext<'_>, registration: &Registration| {
      let instance = body(ctx, registration)?;
      if !scope.stores_early() {
        registration.lifetime.store(Some(ctx), instance.clone());
      }
      Ok(instance)
    };

    if scope.serializes_build() {
      let _guard = registration.build_lock.lock();
      // Double-checked: another caller may have finished while we waited.
      if let Some(cached) = registration.lifetime.value(Some(ctx)) {
        return Ok(cached);
      }
      if !registration.lifetime.may_build() {
        return Err(ResolutionError::new(FailureKind::PoolExhausted(ctx.key().clone())));
      }
      build(ctx, registration)
    } else {
      build(ctx, registration)
    }
  })
}
