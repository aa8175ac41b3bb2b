//! The failure taxonomy, the resolution trail, and diagnostics formatting.

use crate::key::ServiceKey;
use std::fmt;
use thiserror::Error;

/// The flavor of member a directive injects into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
  Property,
  Field,
  Method,
}

impl fmt::Display for MemberKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MemberKind::Property => f.write_str("property"),
      MemberKind::Field => f.write_str("field"),
      MemberKind::Method => f.write_str("method"),
    }
  }
}

/// One frame of the failure trail: the key being resolved when the failure
/// passed through, and the member directive being applied, if any.
#[derive(Debug, Clone)]
pub struct TrailFrame {
  pub key: ServiceKey,
  pub member: Option<(MemberKind, String)>,
}

/// Why a resolution could not complete.
#[derive(Debug, Error)]
pub enum FailureKind {
  #[error("no registration found for {0}")]
  NotRegistered(ServiceKey),

  #[error("circular dependency detected while resolving {0}")]
  CircularDependency(ServiceKey),

  #[error("invalid registration for {key}: {reason}")]
  InvalidRegistration { key: ServiceKey, reason: String },

  #[error("pool for {0} is exhausted")]
  PoolExhausted(ServiceKey),

  #[error("container has been disposed")]
  ContainerDisposed,

  #[error("construction of {key} failed: {source}")]
  Construction {
    key: ServiceKey,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("resolution exceeded the maximum dependency depth of {0}")]
  DepthExceeded(usize),
}

/// The single failure surfaced to callers.
///
/// Nested resolutions annotate the error with a [`TrailFrame`] and re-raise it
/// unchanged; by the time the outermost `resolve` call returns, the trail
/// identifies where in the object graph the failure occurred, innermost frame
/// first.
#[derive(Debug)]
pub struct ResolutionError {
  kind: FailureKind,
  trail: Vec<TrailFrame>,
}

impl ResolutionError {
  pub(crate) fn new(kind: FailureKind) -> Self {
    Self { kind, trail: Vec::new() }
  }

  pub(crate) fn annotate(mut self, key: ServiceKey, member: Option<(MemberKind, String)>) -> Self {
    self.trail.push(TrailFrame { key, member });
    self
  }

  pub fn kind(&self) -> &FailureKind {
    &self.kind
  }

  /// The accumulated trail, innermost frame first.
  pub fn trail(&self) -> &[TrailFrame] {
    &self.trail
  }
}

impl fmt::Display for ResolutionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "resolution failed: {}", self.kind)?;
    if !self.trail.is_empty() {
      write!(f, "\n{}", DefaultDiagnostics.format(&self.trail))?;
    }
    Ok(())
  }
}

impl std::error::Error for ResolutionError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    Some(&self.kind)
  }
}

/// Renders a failure trail to a human-readable string.
///
/// The engine only produces the trail; how it reads is a pluggable concern.
pub trait DiagnosticsFormatter: Send + Sync {
  fn format(&self, trail: &[TrailFrame]) -> String;
}

/// The built-in formatter: one indented line per frame, innermost first.
pub struct DefaultDiagnostics;

impl DiagnosticsFormatter for DefaultDiagnostics {
  fn format(&self, trail: &[TrailFrame]) -> String {
    let mut out = String::new();
    for frame in trail {
      match &frame.member {
        Some((kind, name)) => {
          out.push_str(&format!("  while injecting {} `{}` of {}\n", kind, name, frame.key));
        }
        None => {
          out.push_str(&format!("  while resolving {}\n", frame.key));
        }
      }
    }
    // Drop the trailing newline for clean embedding in log lines.
    out.pop();
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trail_renders_innermost_first() {
    let err = ResolutionError::new(FailureKind::NotRegistered(ServiceKey::of::<u32>()))
      .annotate(
        ServiceKey::of::<String>(),
        Some((MemberKind::Property, "count".to_owned())),
      )
      .annotate(ServiceKey::of::<String>(), None);

    let rendered = err.to_string();
    assert!(rendered.contains("no registration found for u32"));
    assert!(rendered.contains("while injecting property `count`"));
    assert!(rendered.contains("while resolving alloc::string::String"));
  }
}
