//! Error types for setup-time failures and per-frame protocol violations.

use thiserror::Error;

use crate::interaction::InteractableId;

/// Errors surfaced to the caller when building or configuring an interactor.
#[derive(Debug, Error)]
pub enum HpuiError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The interactor was built without a detection logic.
    #[error("interactor has no detection logic")]
    MissingDetectionLogic,
    /// An s-expression could not be parsed or is missing a field.
    #[error("parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Internally inconsistent per-frame input.
///
/// Never returned from `GestureLogic::compute_interaction`; the engine logs it,
/// cancels any gesture in flight and resets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolViolation {
    #[error("selecting candidate {0} has no resolvable interaction position")]
    UnresolvableSelection(InteractableId),
    #[error("tracking candidate {0} has no resolvable interaction position")]
    UnresolvableTracking(InteractableId),
    #[error("priority candidate {0} has no resolvable interaction position")]
    UnresolvablePriority(InteractableId),
    #[error("selection reported but no active candidate to track")]
    NoTrackingCandidate,
}
