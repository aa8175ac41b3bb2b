//! The container hierarchy, the registration surface, and the resolution
//! engine.

use crate::context::{CallState, Override, ResolutionContext, Resolver, MAX_DEPTH};
use crate::error::{
  DefaultDiagnostics, DiagnosticsFormatter, FailureKind, MemberKind, ResolutionError,
};
use crate::key::{erase, recover, Instance, ServiceKey};
use crate::lifetime::{ExternalLifetime, Lifetime};
use crate::pipeline::{build_pipeline, Pipeline, PipelineStrategy};
use crate::registration::{
  ApplyFn, CoerceFn, FactoryFn, MemberDirective, Policies, Recipe, Registration,
};
use crate::registry::Registry;
use crate::selector::{DeclaredOrder, MemberSelector};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

struct ContainerInner {
  registry: Registry,
  parent: Option<Container>,
  strategy: PipelineStrategy,
  selector: Arc<dyn MemberSelector>,
  diagnostics: Arc<dyn DiagnosticsFormatter>,
  disposed: AtomicBool,
}

/// A node of the composition hierarchy.
///
/// Each node owns its own slice of registrations; resolution walks the
/// self -> parent chain, so a child can shadow an ancestor's key. The handle
/// is cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct Container {
  inner: Arc<ContainerInner>,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// Creates a new root container using the interpreted pipeline strategy.
  pub fn new() -> Self {
    Self::with_strategy(PipelineStrategy::Interpreted)
  }

  /// Creates a new root container with an explicit pipeline strategy.
  pub fn with_strategy(strategy: PipelineStrategy) -> Self {
    ContainerBuilder::new().strategy(strategy).build()
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::new()
  }

  /// Creates a child container. The child starts with an empty registration
  /// slice and inherits the parent's strategy, selector, and diagnostics.
  pub fn create_child(&self) -> Container {
    Container {
      inner: Arc::new(ContainerInner {
        registry: Registry::new(),
        parent: Some(self.clone()),
        strategy: self.inner.strategy,
        selector: self.inner.selector.clone(),
        diagnostics: self.inner.diagnostics.clone(),
        disposed: AtomicBool::new(false),
      }),
    }
  }

  pub fn parent(&self) -> Option<Container> {
    self.inner.parent.clone()
  }

  pub fn strategy(&self) -> PipelineStrategy {
    self.inner.strategy
  }

  /// Marks this node disposed. Subsequent resolutions through it fail with
  /// [`FailureKind::ContainerDisposed`]; registrations it owns are released
  /// when the last handle drops. Ancestors are unaffected.
  pub fn dispose(&self) {
    self.inner.disposed.store(true, Ordering::SeqCst);
    debug!("container disposed");
  }

  pub fn is_disposed(&self) -> bool {
    self.inner.disposed.load(Ordering::SeqCst)
  }

  /// Renders a failure with this container's diagnostics formatter.
  pub fn explain(&self, error: &ResolutionError) -> String {
    if error.trail().is_empty() {
      error.kind().to_string()
    } else {
      format!("{}\n{}", error.kind(), self.inner.diagnostics.format(error.trail()))
    }
  }

  // --- Registration ---

  /// Starts a registration of `T` built by an infallible factory. Finish the
  /// builder with [`Registrar::done`].
  pub fn register<T: Send + Sync + 'static>(
    &self,
    factory: impl Fn(&Resolver<'_>) -> T + Send + Sync + 'static,
  ) -> Registrar<'_, T> {
    let erased: FactoryFn = Box::new(move |resolver| Ok(erase(Arc::new(factory(resolver)))));
    Registrar::new(self, erased)
  }

  /// Starts a registration of `T` built by a fallible factory. Factory
  /// failures surface as construction failures carrying the registration key.
  pub fn try_register<T: Send + Sync + 'static>(
    &self,
    factory: impl Fn(&Resolver<'_>) -> Result<T, Box<dyn std::error::Error + Send + Sync>>
      + Send
      + Sync
      + 'static,
  ) -> Registrar<'_, T> {
    let erased: FactoryFn = Box::new(move |resolver| match factory(resolver) {
      Ok(value) => Ok(erase(Arc::new(value))),
      Err(source) => Err(ResolutionError::new(FailureKind::Construction {
        key: resolver.key().clone(),
        source,
      })),
    });
    Registrar::new(self, erased)
  }

  /// Registers an already built instance under singleton scope.
  pub fn register_instance<T: Send + Sync + 'static>(&self, name: Option<&str>, value: T) {
    let key = ServiceKey::with_name::<T>(name);
    let registration = Registration::new(key, Recipe::Value, Lifetime::Singleton);
    registration.lifetime.store(None, erase(Arc::new(value)));
    self.install(registration);
  }

  /// Registers a back-reference to an instance the container does not own.
  /// Resolution succeeds for as long as the caller keeps the `Arc` alive; the
  /// container never disposes it.
  pub fn register_external<T: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    value: &Arc<T>,
  ) {
    let key = ServiceKey::with_name::<T>(name);
    let weak = Arc::downgrade(value);
    let registration = Registration {
      key,
      recipe: Recipe::Value,
      lifetime: Box::new(ExternalLifetime::watching(Box::new(move || {
        weak.upgrade().map(erase::<T>)
      }))),
      members: Vec::new(),
      policies: Policies::default(),
      pipeline: OnceCell::new(),
      build_lock: Mutex::new(()),
    };
    self.install(registration);
  }

  /// Registers a trait object produced by a factory, e.g.
  ///
  /// ```ignore
  /// container.register_trait::<dyn Greeter>(None, Lifetime::Singleton, |_| Arc::new(English));
  /// ```
  pub fn register_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    lifetime: Lifetime,
    factory: impl Fn(&Resolver<'_>) -> Arc<I> + Send + Sync + 'static,
  ) {
    let key = ServiceKey::with_name::<I>(name);
    let erased: FactoryFn = Box::new(move |resolver| Ok(erase(factory(resolver))));
    let registration = Registration::new(key, Recipe::Factory(erased), lifetime);
    self.install(registration);
  }

  fn install(&self, registration: Registration) {
    let key = registration.key().clone();
    if let Some(previous) = self.inner.registry.register(registration) {
      // The displaced record, lifetime slot included, disposes once the last
      // outstanding handle to it is gone.
      debug!(key = %previous.key(), "replaced registration");
    } else {
      trace!(key = %key, "registered");
    }
  }

  /// Number of registrations held by this node alone.
  pub fn len(&self) -> usize {
    self.inner.registry.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  // --- Resolution ---

  /// Resolves the registration of `T` qualified by `name`, constructing and
  /// wiring its transitive dependencies.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
  ) -> Result<Arc<T>, ResolutionError> {
    self.resolve_with::<T>(name, &[])
  }

  /// Like [`Container::resolve`], with per-call overrides substituting
  /// matching keys anywhere in the object graph.
  pub fn resolve_with<T: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    overrides: &[Override],
  ) -> Result<Arc<T>, ResolutionError> {
    let key = ServiceKey::with_name::<T>(name);
    let call = CallState {
      container: self,
      overrides,
      per_resolve: RefCell::new(HashMap::new()),
    };
    let erased = self.resolve_erased(key.clone(), None, &call).map_err(|error| {
      debug!(key = %key, %error, "resolution failed");
      error
    })?;
    recover::<T>(&erased).ok_or_else(|| {
      ResolutionError::new(FailureKind::InvalidRegistration {
        key,
        reason: "registered payload does not match the requested type".to_owned(),
      })
    })
  }

  /// Resolves an unregistered concrete type through its `Default`
  /// constructor, realizing an implicit transient registration on first
  /// request. Explicit registrations anywhere in the chain take precedence.
  pub fn resolve_default<T: Default + Send + Sync + 'static>(
    &self,
  ) -> Result<Arc<T>, ResolutionError> {
    let key = ServiceKey::of::<T>();
    if self.lookup_chain(&key).is_none() {
      self.inner.registry.get_or_create(key.clone(), || {
        let factory: FactoryFn = Box::new(|_| Ok(erase(Arc::new(T::default()))));
        Registration::new(key.clone(), Recipe::Factory(factory), Lifetime::Transient)
      });
    }
    self.resolve::<T>(None)
  }

  /// Lazily resolves every named registration of `T` across the hierarchy,
  /// one entry per distinct qualifier; a name registered on a child shadows
  /// the identically named entry of any ancestor. Each call restarts the
  /// sequence from the store's current state.
  pub fn resolve_all<T: ?Sized + Any + Send + Sync>(&self) -> ResolveAll<T> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keys = Vec::new();
    let mut node = Some(self.clone());
    while let Some(container) = node {
      for key in container.inner.registry.named_keys_of(TypeId::of::<T>()) {
        if let Some(name) = key.name() {
          if seen.insert(name.to_owned()) {
            keys.push(key);
          }
        }
      }
      node = container.inner.parent.clone();
    }
    ResolveAll {
      container: self.clone(),
      keys: keys.into_iter(),
      _marker: PhantomData,
    }
  }

  /// Hands a pooled instance back for reuse. Returns `false` if the key is
  /// not registered as pooled, or the pool was full and the instance was
  /// disposed instead.
  pub fn checkin<T: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    instance: Arc<T>,
  ) -> bool {
    let key = ServiceKey::with_name::<T>(name);
    match self.lookup_chain(&key) {
      Some(registration) => registration.lifetime.checkin(erase(instance)),
      None => false,
    }
  }

  /// The registration currently bound to `(T, name)`, if any, searching the
  /// whole chain.
  pub fn registration_of<T: ?Sized + Any>(&self, name: Option<&str>) -> Option<Arc<Registration>> {
    self.lookup_chain(&ServiceKey::with_name::<T>(name))
  }

  // --- Engine ---

  fn lookup_chain(&self, key: &ServiceKey) -> Option<Arc<Registration>> {
    match self.inner.registry.lookup(key) {
      Some(registration) => Some(registration),
      None => self.inner.parent.as_ref().and_then(|parent| parent.lookup_chain(key)),
    }
  }

  /// One step of the recursive resolution: push a child context, detect
  /// cycles, then execute the registration's cached pipeline.
  pub(crate) fn resolve_erased<'c>(
    &self,
    key: ServiceKey,
    parent: Option<&'c ResolutionContext<'c>>,
    call: &'c CallState<'c>,
  ) -> Result<Instance, ResolutionError> {
    if self.is_disposed() {
      return Err(ResolutionError::new(FailureKind::ContainerDisposed));
    }
    if let Some(substitute) = call.overrides.iter().find(|o| o.matches(&key)) {
      trace!(key = %key, "override substituted");
      return Ok(substitute.instance());
    }

    let depth = parent.map(|p| p.depth + 1).unwrap_or(0);
    if depth > MAX_DEPTH {
      return Err(ResolutionError::new(FailureKind::DepthExceeded(MAX_DEPTH)));
    }

    let registration = self
      .lookup_chain(&key)
      .ok_or_else(|| ResolutionError::new(FailureKind::NotRegistered(key.clone())))?;

    let ctx = ResolutionContext { key, parent, call, depth };

    if ctx.has_ancestor(&ctx.key) {
      // Structural recurrence. Only a value already published within this
      // call tree (the per-resolve early store) legitimizes it; anything else
      // is a genuine cycle.
      if registration.lifetime_scope() == Lifetime::PerResolve {
        if let Some(shared) = registration.lifetime.value(Some(&ctx)) {
          trace!(key = %ctx.key, "recurrence satisfied by per-resolve value");
          return Ok(shared);
        }
      }
      return Err(ResolutionError::new(FailureKind::CircularDependency(ctx.key.clone())));
    }

    let pipeline = self.pipeline_of(&registration)?;
    pipeline
      .execute(&ctx, &registration)
      .map_err(|error| error.annotate(ctx.key.clone(), None))
  }

  /// Returns the registration's cached pipeline, building it with this
  /// container's strategy on first use. Rebuilds happen only through
  /// re-registration, which replaces the whole record.
  fn pipeline_of(&self, registration: &Registration) -> Result<Arc<Pipeline>, ResolutionError> {
    registration
      .pipeline
      .get_or_try_init(|| {
        build_pipeline(registration, self.inner.strategy, &*self.inner.selector).map(Arc::new)
      })
      .cloned()
  }
}

/// Configures a root container.
pub struct ContainerBuilder {
  strategy: PipelineStrategy,
  selector: Arc<dyn MemberSelector>,
  diagnostics: Arc<dyn DiagnosticsFormatter>,
}

impl Default for ContainerBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self {
      strategy: PipelineStrategy::Interpreted,
      selector: Arc::new(DeclaredOrder),
      diagnostics: Arc::new(DefaultDiagnostics),
    }
  }

  pub fn strategy(mut self, strategy: PipelineStrategy) -> Self {
    self.strategy = strategy;
    self
  }

  /// Container-wide member selector; individual registrations may still
  /// override it through their policy map.
  pub fn selector(mut self, selector: Arc<dyn MemberSelector>) -> Self {
    self.selector = selector;
    self
  }

  pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsFormatter>) -> Self {
    self.diagnostics = diagnostics;
    self
  }

  pub fn build(self) -> Container {
    Container {
      inner: Arc::new(ContainerInner {
        registry: Registry::new(),
        parent: None,
        strategy: self.strategy,
        selector: self.selector,
        diagnostics: self.diagnostics,
        disposed: AtomicBool::new(false),
      }),
    }
  }
}

type KeyMakerFn = Box<dyn FnOnce(Option<&str>) -> ServiceKey + Send>;

/// Builder for one type registration: qualifier, lifetime policy, injection
/// directives, and additional abstractions the implementation serves.
#[must_use = "the registration only takes effect when `done()` is called"]
pub struct Registrar<'c, T: Send + Sync + 'static> {
  container: &'c Container,
  name: Option<String>,
  lifetime: Lifetime,
  factory: FactoryFn,
  members: Vec<MemberDirective>,
  aliases: Vec<(KeyMakerFn, CoerceFn)>,
  policies: Policies,
  _marker: PhantomData<fn() -> T>,
}

impl<'c, T: Send + Sync + 'static> Registrar<'c, T> {
  fn new(container: &'c Container, factory: FactoryFn) -> Self {
    Self {
      container,
      name: None,
      lifetime: Lifetime::Transient,
      factory,
      members: Vec::new(),
      aliases: Vec::new(),
      policies: Policies::default(),
      _marker: PhantomData,
    }
  }

  /// Qualifies the registration with a name.
  pub fn named(mut self, name: &str) -> Self {
    self.name = Some(name.to_owned());
    self
  }

  /// Selects the lifetime scope. Defaults to [`Lifetime::Transient`].
  pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
    self.lifetime = lifetime;
    self
  }

  /// Adds a property-injection directive, applied after construction.
  pub fn property(
    self,
    name: &str,
    inject: impl Fn(&T, &Resolver<'_>) -> Result<(), ResolutionError> + Send + Sync + 'static,
  ) -> Self {
    self.member(MemberKind::Property, name, inject)
  }

  /// Adds a field-injection directive, applied after construction.
  pub fn field(
    self,
    name: &str,
    inject: impl Fn(&T, &Resolver<'_>) -> Result<(), ResolutionError> + Send + Sync + 'static,
  ) -> Self {
    self.member(MemberKind::Field, name, inject)
  }

  /// Adds a method-call directive, applied after construction.
  pub fn method(
    self,
    name: &str,
    inject: impl Fn(&T, &Resolver<'_>) -> Result<(), ResolutionError> + Send + Sync + 'static,
  ) -> Self {
    self.member(MemberKind::Method, name, inject)
  }

  fn member(
    mut self,
    kind: MemberKind,
    name: &str,
    inject: impl Fn(&T, &Resolver<'_>) -> Result<(), ResolutionError> + Send + Sync + 'static,
  ) -> Self {
    let apply: ApplyFn = Box::new(move |instance, resolver| {
      let target = instance.downcast_ref::<Arc<T>>().ok_or_else(|| {
        ResolutionError::new(FailureKind::InvalidRegistration {
          key: resolver.key().clone(),
          reason: "member directive applied to a mismatched payload".to_owned(),
        })
      })?;
      inject(target, resolver)
    });
    self.members.push(MemberDirective { kind, name: name.to_owned(), apply });
    self
  }

  /// Also serves the abstraction `I` under the same qualifier, coercing the
  /// concrete instance on resolve, e.g.
  ///
  /// ```ignore
  /// .implements::<dyn Greeter>(|svc| svc)
  /// ```
  pub fn implements<I: ?Sized + Any + Send + Sync>(
    mut self,
    coerce: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
  ) -> Self {
    let make_key: KeyMakerFn = Box::new(|name| ServiceKey::with_name::<I>(name));
    let coerce_fn: CoerceFn = Box::new(move |instance| {
      instance
        .downcast_ref::<Arc<T>>()
        .map(|concrete| erase(coerce(concrete.clone())))
    });
    self.aliases.push((make_key, coerce_fn));
    self
  }

  /// Attaches an arbitrary policy to the registration's capability map.
  pub fn policy<P: Any + Send + Sync>(self, policy: P) -> Self {
    self.policies.set(policy);
    self
  }

  /// Installs the registration (and its alias slots), replacing whatever the
  /// key previously held.
  pub fn done(self) {
    let Registrar {
      container,
      name,
      lifetime,
      factory,
      members,
      aliases,
      policies,
      _marker,
    } = self;

    let key = ServiceKey::with_name::<T>(name.as_deref());
    let mut registration = Registration::new(key.clone(), Recipe::Factory(factory), lifetime);
    registration.members = members;
    registration.policies = policies;
    container.install(registration);

    // Alias slots delegate to the concrete key, so the concrete registration's
    // lifetime policy governs caching for every abstraction it serves.
    for (make_key, coerce) in aliases {
      let alias_key = make_key(name.as_deref());
      let alias = Registration::new(
        alias_key,
        Recipe::Alias { target: key.clone(), coerce },
        Lifetime::Transient,
      );
      container.install(alias);
    }
  }
}

/// Lazy sequence over every named registration of `T` in the hierarchy,
/// produced by [`Container::resolve_all`]. Each item resolves on demand.
pub struct ResolveAll<T: ?Sized> {
  container: Container,
  keys: std::vec::IntoIter<ServiceKey>,
  _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Any + Send + Sync> Iterator for ResolveAll<T> {
  type Item = Result<Arc<T>, ResolutionError>;

  fn next(&mut self) -> Option<Self::Item> {
    let key = self.keys.next()?;
    Some(self.container.resolve::<T>(key.name()))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.keys.size_hint()
  }
}
