//! Gesture arbitration: picks the touched surface, the surface that receives
//! events, and drives the commit/gesture lifecycle.
//!
//! Called exactly once per tick with the complete candidate frame. Emits at
//! most one [`GestureEventArgs`] per tick. Internal inconsistencies never
//! escape: they are logged, a `Canceled` event is synthesized if a gesture was
//! in flight, and all state is reset.

use std::fmt;

use glam::Vec2;
use tracing::{debug, trace, warn};

use super::candidate::{InteractableId, InteractableRef, Interactor, InteractionInfo, InteractorId};
use super::state::InteractionStateTracker;
use crate::config::GestureLogicConfig;
use crate::error::ProtocolViolation;

/// Guards the tracking-switch ratio against a zero tracked heuristic.
const HEURISTIC_EPSILON: f32 = 1e-5;

// ── Gesture state ──────────────────────────────────────────

/// Session state of the interactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureState {
    NoGesture,
    /// Selection began; the receiving candidate may still change.
    AwaitingCommit,
    /// Commit window closed; the receiving candidate is fixed.
    Gesturing,
}

impl GestureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoGesture => "no-gesture",
            Self::AwaitingCommit => "awaiting-commit",
            Self::Gesturing => "gesturing",
        }
    }
}

/// Lifecycle phase carried by an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    CommitPending,
    Started,
    Updated,
    Stopped,
    Canceled,
}

impl GesturePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommitPending => "commit-pending",
            Self::Started => "started",
            Self::Updated => "updated",
            Self::Stopped => "stopped",
            Self::Canceled => "canceled",
        }
    }

    /// `Stopped` or `Canceled`.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::Stopped | Self::Canceled)
    }
}

// ── Event args ─────────────────────────────────────────────

/// Gesture event produced by [`GestureLogic::compute_interaction`].
///
/// The engine owns a single instance and refills it in place each tick; a
/// borrowed event is only valid until the next call.
#[derive(Clone)]
pub struct GestureEventArgs {
    pub interactor: InteractorId,
    /// Candidate receiving the event; `None` when no candidate is eligible.
    pub interactable: Option<InteractableRef>,
    pub phase: GesturePhase,
    /// Milliseconds since selection onset.
    pub time_delta_ms: f64,
    pub start_time_ms: f64,
    /// Position on the receiving candidate when it became selectable.
    pub start_position: Vec2,
    pub cumulative_direction: Vec2,
    pub cumulative_distance: f32,
    /// Movement since the previous tick.
    pub delta_direction: Vec2,
    /// Candidate whose position drives motion; may differ from `interactable`.
    pub tracking_interactable: Option<InteractableRef>,
    pub current_position: Vec2,
}

impl Default for GestureEventArgs {
    fn default() -> Self {
        Self {
            interactor: InteractorId::default(),
            interactable: None,
            phase: GesturePhase::Canceled,
            time_delta_ms: 0.0,
            start_time_ms: 0.0,
            start_position: Vec2::ZERO,
            cumulative_direction: Vec2::ZERO,
            cumulative_distance: 0.0,
            delta_direction: Vec2::ZERO,
            tracking_interactable: None,
            current_position: Vec2::ZERO,
        }
    }
}

impl GestureEventArgs {
    pub fn interactable_id(&self) -> Option<InteractableId> {
        self.interactable.as_ref().map(|i| i.id())
    }

    pub fn tracking_id(&self) -> Option<InteractableId> {
        self.tracking_interactable.as_ref().map(|i| i.id())
    }
}

impl fmt::Debug for GestureEventArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureEventArgs")
            .field("interactor", &self.interactor)
            .field("interactable", &self.interactable_id())
            .field("phase", &self.phase)
            .field("time_delta_ms", &self.time_delta_ms)
            .field("start_time_ms", &self.start_time_ms)
            .field("start_position", &self.start_position)
            .field("cumulative_direction", &self.cumulative_direction)
            .field("cumulative_distance", &self.cumulative_distance)
            .field("delta_direction", &self.delta_direction)
            .field("tracking_interactable", &self.tracking_id())
            .field("current_position", &self.current_position)
            .finish()
    }
}

// ── Engine ─────────────────────────────────────────────────

/// Per-interactor gesture arbitration engine.
pub struct GestureLogic {
    config: GestureLogicConfig,
    tracker: InteractionStateTracker,
    state: GestureState,
    start_time_ms: f64,
    /// End time of the previous gesture; survives per-gesture resets.
    debounce_start_ms: Option<f64>,
    tracking: Option<InteractableRef>,
    tracking_heuristic: f32,
    force_tracking_update: bool,
    active_priority: Option<InteractableRef>,
    cumulative_distance: f32,
    cumulative_direction: Vec2,
    previous_position: Vec2,
    current_position: Vec2,
    /// Candidate `current_position` was last resolved against.
    position_reference: Option<InteractableId>,
    selection_happened_last_frame: bool,
    frame_index: u64,
    event: GestureEventArgs,
}

impl GestureLogic {
    pub fn new(config: GestureLogicConfig) -> Self {
        Self {
            config,
            tracker: InteractionStateTracker::new(),
            state: GestureState::NoGesture,
            start_time_ms: 0.0,
            debounce_start_ms: None,
            tracking: None,
            tracking_heuristic: 0.0,
            force_tracking_update: false,
            active_priority: None,
            cumulative_distance: 0.0,
            cumulative_direction: Vec2::ZERO,
            previous_position: Vec2::ZERO,
            current_position: Vec2::ZERO,
            position_reference: None,
            selection_happened_last_frame: false,
            frame_index: 0,
            event: GestureEventArgs::default(),
        }
    }

    pub fn config(&self) -> &GestureLogicConfig {
        &self.config
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn tracker(&self) -> &InteractionStateTracker {
        &self.tracker
    }

    pub fn tracking_id(&self) -> Option<InteractableId> {
        self.tracking.as_ref().map(|i| i.id())
    }

    pub fn priority_id(&self) -> Option<InteractableId> {
        self.active_priority.as_ref().map(|i| i.id())
    }

    /// Run one tick.
    ///
    /// Returns the event to dispatch (if any) and the candidate that should
    /// receive it. The event borrow ends at the next call.
    pub fn compute_interaction(
        &mut self,
        now_ms: f64,
        interactor: &dyn Interactor,
        frame: &[(InteractableRef, InteractionInfo)],
    ) -> (Option<&GestureEventArgs>, Option<InteractableRef>) {
        self.frame_index += 1;
        match self.step(now_ms, interactor, frame) {
            Ok(Some(_)) => (Some(&self.event), self.event.interactable.clone()),
            Ok(None) => (None, None),
            Err(violation) => {
                warn!(
                    interactor = %interactor.id(),
                    "gesture protocol violation: {}",
                    violation
                );
                if !self.selection_happened_last_frame {
                    // Nothing was emitted for this gesture yet.
                    self.reset_gesture();
                    return (None, None);
                }
                self.fill_event(interactor.id(), now_ms, GesturePhase::Canceled, Vec2::ZERO);
                self.debounce_start_ms = Some(now_ms);
                self.reset_gesture();
                (Some(&self.event), self.event.interactable.clone())
            }
        }
    }

    fn step(
        &mut self,
        now_ms: f64,
        interactor: &dyn Interactor,
        frame: &[(InteractableRef, InteractionInfo)],
    ) -> Result<Option<GesturePhase>, ProtocolViolation> {
        let selection_happening = frame.iter().any(|(_, info)| info.is_selection);

        if !selection_happening && !self.selection_happened_last_frame {
            // Hover-only frames keep no state.
            if !self.tracker.is_empty() {
                self.tracker.clear();
            }
            return Ok(None);
        }

        // Phase 1: ingest.
        if selection_happening && self.state == GestureState::NoGesture {
            self.state = GestureState::AwaitingCommit;
            self.start_time_ms = now_ms;
            self.force_tracking_update = true;
            debug!(interactor = %interactor.id(), "gesture awaiting commit at {:.1}ms", now_ms);
        }

        let tracking_id = self.tracking_id();
        for (candidate, info) in frame {
            let id = candidate.id();
            let record = self.tracker.get_or_insert(candidate, info.heuristic);
            record.active = true;
            record.last_seen_frame = self.frame_index;
            record.current_heuristic = info.heuristic;
            record.lowest_heuristic = record.lowest_heuristic.min(info.heuristic);
            if tracking_id == Some(id) {
                self.tracking_heuristic = info.heuristic;
            }
            if info.is_selection
                && self.state == GestureState::AwaitingCommit
                && !record.selectable_target
            {
                record.start_position = candidate
                    .interaction_position(interactor)
                    .ok_or(ProtocolViolation::UnresolvableSelection(id))?;
                record.start_time_ms = now_ms;
                record.selectable_target = true;
            }
        }

        // Phase 2: maintenance, pick the candidates to track and to receive events.
        let mut to_track: Option<(InteractableRef, f32)> = None;
        let mut to_be_active: Option<(InteractableRef, i32, f32)> = None;
        for record in self.tracker.iter_mut() {
            if record.active && record.last_seen_frame != self.frame_index {
                record.active = false;
                if tracking_id == Some(record.id()) {
                    self.force_tracking_update = true;
                }
            }

            if record.active {
                let better = match &to_track {
                    Some((_, best)) => record.current_heuristic < *best,
                    None => true,
                };
                if better {
                    to_track = Some((record.interactable.clone(), record.current_heuristic));
                }
            }

            if record.selectable_target && record.interactable.handles_gestures() {
                let z = record.interactable.z_order();
                let better = match &to_be_active {
                    Some((_, best_z, best_h)) => {
                        z < *best_z || (z == *best_z && record.lowest_heuristic < *best_h)
                    }
                    None => true,
                };
                if better {
                    to_be_active = Some((record.interactable.clone(), z, record.lowest_heuristic));
                }
            }
        }

        // Phase 3: exit.
        if !selection_happening {
            let outside_debounce = match self.debounce_start_ms {
                Some(end) => self.start_time_ms - end >= self.config.debounce_window_ms,
                None => true,
            };
            let phase = if self.state == GestureState::Gesturing && outside_debounce {
                GesturePhase::Stopped
            } else {
                GesturePhase::Canceled
            };
            self.fill_event(interactor.id(), now_ms, phase, Vec2::ZERO);
            debug!(
                interactor = %interactor.id(),
                "gesture {} after {:.1}ms",
                phase.as_str(),
                now_ms - self.start_time_ms
            );
            self.debounce_start_ms = Some(now_ms);
            self.reset_gesture();
            return Ok(Some(phase));
        }

        // Phase 4: tracking stabilization.
        let (to_track, to_track_heuristic) = to_track.ok_or(ProtocolViolation::NoTrackingCandidate)?;
        let should_switch = match &self.tracking {
            None => true,
            Some(current) if current.id() == to_track.id() => false,
            Some(_) => {
                self.force_tracking_update
                    || to_track_heuristic / self.tracking_heuristic.max(HEURISTIC_EPSILON)
                        <= self.config.switch_tracking_threshold
            }
        };
        if should_switch {
            trace!(
                "tracking switched {:?} -> {} (heuristic {:.4})",
                self.tracking_id(),
                to_track.id(),
                to_track_heuristic
            );
            self.tracking = Some(to_track);
            self.tracking_heuristic = to_track_heuristic;
        }
        self.force_tracking_update = false;

        // Phase 5: receiver and positions.
        let tracking = match &self.tracking {
            Some(t) => t.clone(),
            None => return Err(ProtocolViolation::NoTrackingCandidate),
        };
        let time_delta = now_ms - self.start_time_ms;
        let within_commit = time_delta < self.config.commit_delay_ms;
        // The receiver is fixed once the commit delay has been exceeded.
        let receiver_open = self.state == GestureState::AwaitingCommit
            && time_delta <= self.config.commit_delay_ms;
        if receiver_open {
            match to_be_active {
                Some((candidate, _, _)) => {
                    if self.priority_id() != Some(candidate.id()) {
                        debug!(
                            "priority candidate {:?} -> {}",
                            self.priority_id(),
                            candidate.id()
                        );
                        self.active_priority = Some(candidate);
                    }
                }
                None => self.active_priority = None,
            }
        }

        // While the receiver is open, positions are in its local frame.
        let (reference, violation) = match &self.active_priority {
            Some(priority) if receiver_open => (
                priority.clone(),
                ProtocolViolation::UnresolvablePriority(priority.id()),
            ),
            _ => (
                tracking.clone(),
                ProtocolViolation::UnresolvableTracking(tracking.id()),
            ),
        };
        self.current_position = reference
            .interaction_position(interactor)
            .ok_or(violation)?;
        if self.position_reference != Some(reference.id()) {
            // New frame of reference; no motion across the change.
            self.previous_position = self.current_position;
            self.position_reference = Some(reference.id());
        }

        // Phase 6: emission.
        let delta = self.current_position - self.previous_position;
        self.cumulative_distance += delta.length();
        self.cumulative_direction += delta;

        let phase = if within_commit {
            GesturePhase::CommitPending
        } else if self.state == GestureState::AwaitingCommit {
            self.state = GestureState::Gesturing;
            debug!(
                interactor = %interactor.id(),
                "gesture committed to {:?} after {:.1}ms",
                self.priority_id(),
                time_delta
            );
            GesturePhase::Started
        } else {
            GesturePhase::Updated
        };

        self.fill_event(interactor.id(), now_ms, phase, delta);
        self.previous_position = self.current_position;
        self.selection_happened_last_frame = true;
        Ok(Some(phase))
    }

    /// Refill the pooled event from current session state.
    fn fill_event(&mut self, interactor: InteractorId, now_ms: f64, phase: GesturePhase, delta: Vec2) {
        let start_position = self
            .active_priority
            .as_ref()
            .and_then(|p| self.tracker.get(p.id()))
            .map(|s| s.start_position)
            .unwrap_or(Vec2::ZERO);

        let event = &mut self.event;
        event.interactor = interactor;
        event.interactable = self.active_priority.clone();
        event.phase = phase;
        event.time_delta_ms = now_ms - self.start_time_ms;
        event.start_time_ms = self.start_time_ms;
        event.start_position = start_position;
        event.cumulative_direction = self.cumulative_direction;
        event.cumulative_distance = self.cumulative_distance;
        event.delta_direction = delta;
        event.tracking_interactable = self.tracking.clone();
        event.current_position = self.current_position;
    }

    /// Clear session and per-candidate state after a gesture ends.
    /// The debounce reference is kept.
    fn reset_gesture(&mut self) {
        self.tracker.clear();
        self.state = GestureState::NoGesture;
        self.start_time_ms = 0.0;
        self.tracking = None;
        self.tracking_heuristic = 0.0;
        self.force_tracking_update = false;
        self.active_priority = None;
        self.cumulative_distance = 0.0;
        self.cumulative_direction = Vec2::ZERO;
        self.previous_position = Vec2::ZERO;
        self.current_position = Vec2::ZERO;
        self.position_reference = None;
        self.selection_happened_last_frame = false;
    }

    /// Clear all session and per-candidate state. Safe to call when idle.
    pub fn reset(&mut self) {
        self.reset_gesture();
        self.debounce_start_ms = None;
    }

    /// S-expression for status output.
    pub fn status_sexp(&self) -> String {
        let id_sexp = |id: Option<InteractableId>| {
            id.map(|i| i.to_string())
                .unwrap_or_else(|| "nil".to_string())
        };
        format!(
            "(:state :{} :tracking {} :priority {} :candidates {} :cumulative-distance {:.4})",
            self.state.as_str(),
            id_sexp(self.tracking_id()),
            id_sexp(self.priority_id()),
            self.tracker.len(),
            self.cumulative_distance,
        )
    }
}

// ── Test helpers ───────────────────────────────────────────


// ── Tests ──────────────────────────────────────────────────
