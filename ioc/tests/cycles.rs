use once_cell::sync::OnceCell;
use std::sync::Arc;
use weave_ioc::{Container, FailureKind, Lifetime};

// --- Cycle Detection Tests ---

#[test]
fn constructor_cycle_is_detected_not_overflowed() {
  // A -> B -> A through constructors must fail cleanly, never recurse
  // forever or deadlock.
  #[derive(Debug)]
  struct ServiceA {
    _b: Arc<ServiceB>,
  }
  #[derive(Debug)]
  struct ServiceB {
    _a: Arc<ServiceA>,
  }

  // Arrange
  let container = Container::new();
  container
    .try_register(|r| -> Result<ServiceA, Box<dyn std::error::Error + Send + Sync>> {
      Ok(ServiceA { _b: r.resolve::<ServiceB>()? })
    })
    .done();
  container
    .try_register(|r| -> Result<ServiceB, Box<dyn std::error::Error + Send + Sync>> {
      Ok(ServiceB { _a: r.resolve::<ServiceA>()? })
    })
    .done();

  // Act
  let error = container.resolve::<ServiceA>(None).unwrap_err();

  // Assert: the root cause is the detected cycle.
  assert!(error.to_string().contains("circular dependency"));
}

#[test]
fn self_referencing_member_directive_is_a_cycle() {
  #[derive(Debug)]
  struct Selfish {
    _peer: OnceCell<Arc<Selfish>>,
  }

  // Arrange: a transient whose member resolves its own key.
  let container = Container::new();
  container
    .register(|_| Selfish { _peer: OnceCell::new() })
    .property("peer", |this: &Selfish, r| {
      let peer = r.resolve::<Selfish>()?;
      let _ = this._peer.set(peer);
      Ok(())
    })
    .done();

  // Act
  let error = container.resolve::<Selfish>(None).unwrap_err();

  // Assert: the kind survives unwrapped and the trail names the member.
  assert!(matches!(error.kind(), FailureKind::CircularDependency(_)));
  assert!(error.to_string().contains("while injecting property `peer`"));
}

#[test]
fn per_resolve_scope_closes_a_member_injection_cycle() {
  // Hub and Spoke reference each other. Hub is per-resolve scoped and wires
  // its Spoke through a member directive, so by the time Spoke's factory asks
  // for Hub, the partially wired Hub is already published to the call tree.
  struct Hub {
    spoke: OnceCell<Arc<Spoke>>,
  }
  struct Spoke {
    hub: Arc<Hub>,
  }

  // Arrange
  let container = Container::new();
  container
    .register(|_| Hub { spoke: OnceCell::new() })
    .lifetime(Lifetime::PerResolve)
    .property("spoke", |hub: &Hub, r| {
      let spoke = r.resolve::<Spoke>()?;
      let _ = hub.spoke.set(spoke);
      Ok(())
    })
    .done();
  container
    .try_register(|r| -> Result<Spoke, Box<dyn std::error::Error + Send + Sync>> {
      Ok(Spoke { hub: r.resolve::<Hub>()? })
    })
    .done();

  // Act
  let hub = container.resolve::<Hub>(None).unwrap();

  // Assert: the cycle closed onto one shared Hub instance.
  let spoke = hub.spoke.get().expect("spoke was wired");
  assert!(Arc::ptr_eq(&spoke.hub, &hub));
}

#[test]
fn the_transient_side_of_a_half_scoped_cycle_still_fails() {
  // Same shape as above, but entered from the transient Spoke: when Spoke's
  // context is the root of the call tree, Hub's member directive asking for
  // Spoke again has no published instance to fall back on.
  #[derive(Debug)]
  struct Hub {
    spoke: OnceCell<Arc<Spoke>>,
  }
  #[derive(Debug)]
  struct Spoke {
    _hub: Arc<Hub>,
  }

  // Arrange
  let container = Container::new();
  container
    .register(|_| Hub { spoke: OnceCell::new() })
    .lifetime(Lifetime::PerResolve)
    .property("spoke", |hub: &Hub, r| {
      let spoke = r.resolve::<Spoke>()?;
      let _ = hub.spoke.set(spoke);
      Ok(())
    })
    .done();
  container
    .try_register(|r| -> Result<Spoke, Box<dyn std::error::Error + Send + Sync>> {
      Ok(Spoke { _hub: r.resolve::<Hub>()? })
    })
    .done();

  // Act
  let error = container.resolve::<Spoke>(None).unwrap_err();

  // Assert
  assert!(error.to_string().contains("circular dependency"));
}

#[test]
fn runaway_dependency_depth_is_bounded() {
  // Distinct keys defeat cycle detection by design; the depth guard is the
  // backstop that keeps a mis-registered graph from exhausting the stack.
  let container = Container::new();
  for i in 0..200_u32 {
    let next = format!("level_{}", i + 1);
    container
      .try_register(move |r| -> Result<u32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(*r.resolve_named::<u32>(Some(&next))? + 1)
      })
      .named(&format!("level_{}", i))
      .done();
  }

  // Act
  let error = container.resolve::<u32>(Some("level_0")).unwrap_err();

  // Assert
  assert!(error.to_string().contains("maximum dependency depth"));
}
