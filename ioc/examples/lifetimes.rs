use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use weave_ioc::{Container, FailureKind, Lifetime};

static CONNECTION_COUNTER: AtomicUsize = AtomicUsize::new(0);

// A resource worth recycling: think database or socket connections.
#[derive(Debug)]
struct Connection {
  id: usize,
}

// A per-resolve scoped collaborator shared within one object graph.
struct RequestId(usize);

struct Handler {
  request: Arc<RequestId>,
}
struct Auditor {
  request: Arc<RequestId>,
}
struct Endpoint {
  handler: Arc<Handler>,
  auditor: Arc<Auditor>,
}

fn main() {
  let container = Container::new();

  // --- Pooled scope ---
  container
    .register(|_| Connection {
      id: CONNECTION_COUNTER.fetch_add(1, Ordering::SeqCst),
    })
    .lifetime(Lifetime::Pooled { capacity: 2 })
    .done();

  println!("--- Pooled connections (capacity 2) ---");
  let first = container.resolve::<Connection>(None).unwrap();
  let second = container.resolve::<Connection>(None).unwrap();
  println!("Checked out connections {} and {}.", first.id, second.id);

  // The pool is drained; a third checkout is refused rather than unbounded.
  let error = container.resolve::<Connection>(None).unwrap_err();
  assert!(matches!(error.kind(), FailureKind::PoolExhausted(_)));
  println!("Third checkout refused: {}", error);

  // Handing one back makes it available again.
  let recycled_id = first.id;
  container.checkin::<Connection>(None, first);
  let recycled = container.resolve::<Connection>(None).unwrap();
  assert_eq!(recycled.id, recycled_id);
  println!("Connection {} was recycled.\n", recycled.id);
  drop(second);
  drop(recycled);

  // --- Per-resolve scope ---
  static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(0);
  container
    .register(|_| RequestId(REQUEST_COUNTER.fetch_add(1, Ordering::SeqCst)))
    .lifetime(Lifetime::PerResolve)
    .done();
  container
    .register(|r| Handler { request: r.resolve::<RequestId>().unwrap() })
    .done();
  container
    .register(|r| Auditor { request: r.resolve::<RequestId>().unwrap() })
    .done();
  container
    .register(|r| Endpoint {
      handler: r.resolve::<Handler>().unwrap(),
      auditor: r.resolve::<Auditor>().unwrap(),
    })
    .done();

  println!("--- Per-resolve request IDs ---");
  let call_a = container.resolve::<Endpoint>(None).unwrap();
  let call_b = container.resolve::<Endpoint>(None).unwrap();

  // Within one resolve call, handler and auditor share the same RequestId;
  // the next call gets a fresh one.
  assert!(Arc::ptr_eq(&call_a.handler.request, &call_a.auditor.request));
  assert_ne!(call_a.handler.request.0, call_b.handler.request.0);
  println!(
    "Call A used request id {}, call B used request id {}.",
    call_a.handler.request.0, call_b.handler.request.0
  );
}
