//! Per-candidate interaction bookkeeping owned by the gesture logic.

use std::collections::HashMap;

use glam::Vec2;

use super::candidate::{InteractableId, InteractableRef};

/// Engine-owned record for one candidate, persisting across frames of a gesture.
#[derive(Clone)]
pub struct InteractionState {
    pub interactable: InteractableRef,
    /// Running minimum of the heuristic since the record was created.
    pub lowest_heuristic: f32,
    /// This frame's heuristic.
    pub current_heuristic: f32,
    /// Interaction position when the candidate became selectable.
    pub start_position: Vec2,
    pub start_time_ms: f64,
    /// Reported by the detection logic this frame.
    pub active: bool,
    /// Selected during the commit window of the current gesture.
    pub selectable_target: bool,
    /// Frame index of the last frame this candidate appeared in.
    pub last_seen_frame: u64,
}

impl InteractionState {
    fn new(interactable: InteractableRef, heuristic: f32) -> Self {
        Self {
            interactable,
            lowest_heuristic: heuristic,
            current_heuristic: heuristic,
            start_position: Vec2::ZERO,
            start_time_ms: 0.0,
            active: false,
            selectable_target: false,
            last_seen_frame: 0,
        }
    }

    pub fn id(&self) -> InteractableId {
        self.interactable.id()
    }
}

impl std::fmt::Debug for InteractionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionState")
            .field("interactable", &self.interactable.id())
            .field("lowest_heuristic", &self.lowest_heuristic)
            .field("current_heuristic", &self.current_heuristic)
            .field("start_position", &self.start_position)
            .field("start_time_ms", &self.start_time_ms)
            .field("active", &self.active)
            .field("selectable_target", &self.selectable_target)
            .finish()
    }
}

/// Table of [`InteractionState`] keyed by candidate id.
///
/// Records live in a dense vector in insertion order so iteration is
/// deterministic; the map gives O(1) lookup into it.
#[derive(Debug, Default)]
pub struct InteractionStateTracker {
    states: Vec<InteractionState>,
    index: HashMap<InteractableId, usize>,
}

impl InteractionStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for `interactable`, creating it on first appearance.
    pub fn get_or_insert(
        &mut self,
        interactable: &InteractableRef,
        heuristic: f32,
    ) -> &mut InteractionState {
        let id = interactable.id();
        let idx = match self.index.get(&id) {
            Some(&idx) => idx,
            None => {
                let idx = self.states.len();
                self.states
                    .push(InteractionState::new(interactable.clone(), heuristic));
                self.index.insert(id, idx);
                idx
            }
        };
        &mut self.states[idx]
    }

    pub fn get(&self, id: InteractableId) -> Option<&InteractionState> {
        self.index.get(&id).map(|&idx| &self.states[idx])
    }

    pub fn contains(&self, id: InteractableId) -> bool {
        self.index.contains_key(&id)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &InteractionState> {
        self.states.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InteractionState> {
        self.states.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::candidate::{Interactable, Interactor};
    use std::rc::Rc;

    struct Dummy(u64);

    impl Interactable for Dummy {
        fn id(&self) -> InteractableId {
            InteractableId(self.0)
        }
        fn z_order(&self) -> i32 {
            0
        }
        fn handles_gestures(&self) -> bool {
            true
        }
        fn interaction_position(&self, _interactor: &dyn Interactor) -> Option<Vec2> {
            Some(Vec2::ZERO)
        }
    }

    fn dummy(id: u64) -> InteractableRef {
        Rc::new(Dummy(id))
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut tracker = InteractionStateTracker::new();
        let a = dummy(1);
        tracker.get_or_insert(&a, 0.5).active = true;
        assert_eq!(tracker.len(), 1);
        let state = tracker.get(InteractableId(1)).unwrap();
        assert!(state.active);
        assert_eq!(state.lowest_heuristic, 0.5);
        assert!(tracker.get(InteractableId(2)).is_none());
    }

    #[test]
    fn test_existing_record_reused() {
        let mut tracker = InteractionStateTracker::new();
        let a = dummy(1);
        tracker.get_or_insert(&a, 0.5).lowest_heuristic = 0.1;
        let state = tracker.get_or_insert(&a, 0.9);
        assert_eq!(state.lowest_heuristic, 0.1);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_iteration_in_insertion_order() {
        let mut tracker = InteractionStateTracker::new();
        for id in [5, 2, 9] {
            tracker.get_or_insert(&dummy(id), 1.0);
        }
        let ids: Vec<u64> = tracker.iter().map(|s| s.id().0).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn test_clear() {
        let mut tracker = InteractionStateTracker::new();
        tracker.get_or_insert(&dummy(1), 1.0);
        tracker.get_or_insert(&dummy(2), 1.0);
        tracker.clear();
        assert!(tracker.is_empty());
        assert!(!tracker.contains(InteractableId(1)));
        // Indices are rebuilt from scratch after a clear.
        tracker.get_or_insert(&dummy(2), 3.0);
        assert_eq!(tracker.get(InteractableId(2)).unwrap().current_heuristic, 3.0);
    }
}
