//! HPUI core - hand-to-surface touch gesture arbitration for XR hand tracking.
//!
//! A tracked fingertip is measured against a set of candidate surfaces every
//! tick. Detection logics turn geometry into per-candidate heuristics; the
//! gesture logic decides which surface is touched, which one receives events,
//! and drives the `CommitPending → Started → Updated* → Stopped|Canceled`
//! lifecycle.

pub mod config;
pub mod detection;
pub mod error;
pub mod interaction;
pub mod replay;
pub mod sexp;

pub use config::{GestureLogicConfig, InteractorConfig};
pub use error::{HpuiError, ProtocolViolation};
pub use interaction::{
    GestureEventArgs, GestureLogic, GesturePhase, GestureState, HpuiInteractor, Interactable,
    InteractableRef, InteractionInfo, Interactor,
};
