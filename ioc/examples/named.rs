use std::sync::Arc;
use weave_ioc::{Container, Lifetime};

// --- Abstraction and Implementations ---
trait MessageSender: Send + Sync {
  fn send(&self, to: &str, message: &str) -> String;
}

struct EmailSender;
impl MessageSender for EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email to {}: '{}'", to, message)
  }
}

struct SmsSender;
impl MessageSender for SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}

fn main() {
  let container = Container::new();

  // --- Registration ---
  // Register both implementations with unique names.
  container.register_trait::<dyn MessageSender>(Some("email"), Lifetime::Singleton, |_| {
    Arc::new(EmailSender)
  });
  container.register_trait::<dyn MessageSender>(Some("sms"), Lifetime::Singleton, |_| {
    Arc::new(SmsSender)
  });

  // --- Resolution ---
  // Choose the implementation at the point of resolution.
  let email_notifier = container.resolve::<dyn MessageSender>(Some("email")).unwrap();
  let sms_notifier = container.resolve::<dyn MessageSender>(Some("sms")).unwrap();

  let result1 = email_notifier.send("test@example.com", "Hello from Weave!");
  let result2 = sms_notifier.send("+123456789", "Hello from Weave!");

  println!("{}", result1);
  println!("{}", result2);

  assert!(result1.contains("email"));
  assert!(result2.contains("SMS"));

  // --- Fan-out ---
  // Or broadcast through every named implementation at once.
  println!("\nBroadcasting through every registered sender:");
  for sender in container.resolve_all::<dyn MessageSender>() {
    println!("{}", sender.unwrap().send("everyone", "System maintenance at noon."));
  }
}
