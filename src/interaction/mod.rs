//! Touch interaction core: candidate contracts, per-candidate state,
//! gesture arbitration, and the interactor that drives them per tick.
//!
//! Provides:
//! - `GestureLogic`: commit/tracking/priority arbitration state machine
//! - `InteractionStateTracker`: per-candidate bookkeeping owned by the logic
//! - `HpuiInteractor`: detection → arbitration → dispatch for one fingertip
//! - `RectSurface`: planar interactable
//! - `GestureClassifier`: tap/swipe classification of finished gestures

pub mod candidate;
pub mod classifier;
pub mod gesture_logic;
pub mod interactor;
pub mod state;
pub mod surface;

pub use candidate::{
    CandidateFrame, Interactable, InteractableId, InteractableRef, InteractionInfo, Interactor,
    InteractorId,
};
pub use classifier::{ClassifiedGesture, GestureClassifier, SwipeDirection};
pub use gesture_logic::{GestureEventArgs, GestureLogic, GesturePhase, GestureState};
pub use interactor::{Fingertip, FingertipPose, HpuiInteractor, HpuiInteractorBuilder};
pub use state::{InteractionState, InteractionStateTracker};
pub use surface::RectSurface;
