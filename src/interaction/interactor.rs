//! Interactor role: owns a gesture logic and a detection logic, feeds one
//! into the other every tick and dispatches the results.

use std::fmt;

use glam::{Quat, Vec3};
use tracing::{debug, info};

use super::candidate::{
    CandidateFrame, InteractableId, InteractableRef, InteractionInfo, Interactor, InteractorId,
};
use super::classifier::{ClassifiedGesture, GestureClassifier};
use super::gesture_logic::{GestureEventArgs, GestureLogic, GesturePhase};
use crate::config::InteractorConfig;
use crate::detection::DetectionLogic;
use crate::error::HpuiError;

type GestureListener = Box<dyn FnMut(&GestureEventArgs)>;
type HoverListener = Box<dyn FnMut(InteractorId, &[(InteractableRef, InteractionInfo)])>;
type ClassifiedListener = Box<dyn FnMut(&ClassifiedGesture)>;

// ── Fingertip ──────────────────────────────────────────────

/// Tracked fingertip pose for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingertipPose {
    /// World position in meters.
    pub position: Vec3,
    /// Orientation; the fingertip points along local -Z.
    pub rotation: Quat,
    /// Fingertip radius in meters.
    pub radius: f32,
}

impl FingertipPose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            radius: 0.0,
        }
    }

    /// View of this pose as the interactor with the given id.
    pub fn fingertip(&self, id: u64) -> Fingertip<'_> {
        Fingertip {
            id: InteractorId(id),
            pose: self,
        }
    }
}

/// [`Interactor`] backed by a [`FingertipPose`].
#[derive(Debug, Clone, Copy)]
pub struct Fingertip<'a> {
    id: InteractorId,
    pose: &'a FingertipPose,
}

impl Interactor for Fingertip<'_> {
    fn id(&self) -> InteractorId {
        self.id
    }

    fn interaction_point(&self) -> Vec3 {
        self.pose.position
    }

    fn interaction_rotation(&self) -> Quat {
        self.pose.rotation
    }

    fn interaction_radius(&self) -> f32 {
        self.pose.radius
    }
}

// ── Interactor ─────────────────────────────────────────────

/// Drives detection, arbitration and dispatch for one fingertip.
pub struct HpuiInteractor {
    id: InteractorId,
    config: InteractorConfig,
    logic: GestureLogic,
    detection: Box<dyn DetectionLogic>,
    classifier: GestureClassifier,
    candidates: Vec<InteractableRef>,
    gesture_listeners: Vec<GestureListener>,
    hover_listeners: Vec<HoverListener>,
    classified_listeners: Vec<ClassifiedListener>,
}

impl HpuiInteractor {
    pub fn builder(id: u64) -> HpuiInteractorBuilder {
        HpuiInteractorBuilder::new(id)
    }

    pub fn id(&self) -> InteractorId {
        self.id
    }

    pub fn config(&self) -> &InteractorConfig {
        &self.config
    }

    pub fn logic(&self) -> &GestureLogic {
        &self.logic
    }

    pub fn detection_name(&self) -> &'static str {
        self.detection.name()
    }

    /// Register a candidate; a candidate with the same id is replaced.
    pub fn register(&mut self, candidate: InteractableRef) {
        let id = candidate.id();
        self.candidates.retain(|c| c.id() != id);
        self.candidates.push(candidate);
    }

    /// Returns true if a candidate was removed.
    pub fn unregister(&mut self, id: InteractableId) -> bool {
        let before = self.candidates.len();
        self.candidates.retain(|c| c.id() != id);
        self.candidates.len() < before
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn add_gesture_listener(&mut self, listener: impl FnMut(&GestureEventArgs) + 'static) {
        self.gesture_listeners.push(Box::new(listener));
    }

    /// Called every tick with the detected candidates, including pure hover.
    pub fn add_hover_listener(
        &mut self,
        listener: impl FnMut(InteractorId, &[(InteractableRef, InteractionInfo)]) + 'static,
    ) {
        self.hover_listeners.push(Box::new(listener));
    }

    /// Called with taps and swipes when a gesture ends.
    pub fn add_classified_listener(&mut self, listener: impl FnMut(&ClassifiedGesture) + 'static) {
        self.classified_listeners.push(Box::new(listener));
    }

    /// Run one tick: detect, arbitrate, dispatch.
    ///
    /// The event goes to the priority candidate first, then to this
    /// interactor's gesture listeners. Returns the emitted phase.
    pub fn process(&mut self, now_ms: f64, pose: &FingertipPose) -> Option<GesturePhase> {
        let fingertip = Fingertip { id: self.id, pose };
        let frame: CandidateFrame = self
            .detection
            .detect_interactables(&fingertip, &self.candidates);

        for listener in self.hover_listeners.iter_mut() {
            listener(self.id, &frame);
        }

        let (event, priority) = self.logic.compute_interaction(now_ms, &fingertip, &frame);
        let event = event?;

        if let Some(candidate) = &priority {
            candidate.on_gesture(event);
        }
        for listener in self.gesture_listeners.iter_mut() {
            listener(event);
        }

        if event.phase.is_end() {
            if let Some(classified) = self.classifier.classify(event) {
                debug!(interactor = %self.id, "classified {:?}", classified);
                for listener in self.classified_listeners.iter_mut() {
                    listener(&classified);
                }
            }
        }
        Some(event.phase)
    }

    /// Drop any gesture in progress. The next tick's detection feed should be
    /// suppressed by the caller if the contact is still present.
    pub fn reset(&mut self) {
        self.logic.reset();
    }

    pub fn status_sexp(&self) -> String {
        format!(
            "(:interactor {} :detection :{} :candidates {} :logic {})",
            self.id,
            self.detection.name(),
            self.candidates.len(),
            self.logic.status_sexp(),
        )
    }
}

impl fmt::Debug for HpuiInteractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HpuiInteractor")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("detection", &self.detection.name())
            .field("candidates", &self.candidates.len())
            .field("state", &self.logic.state())
            .finish()
    }
}

// ── Builder ────────────────────────────────────────────────

/// Setup-time construction; configuration errors surface from [`build`](Self::build).
pub struct HpuiInteractorBuilder {
    id: InteractorId,
    config: InteractorConfig,
    detection: Option<Box<dyn DetectionLogic>>,
    candidates: Vec<InteractableRef>,
}

impl HpuiInteractorBuilder {
    pub fn new(id: u64) -> Self {
        Self {
            id: InteractorId(id),
            config: InteractorConfig::default(),
            detection: None,
            candidates: Vec::new(),
        }
    }

    pub fn config(mut self, config: InteractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn detection_logic(mut self, detection: impl DetectionLogic + 'static) -> Self {
        self.detection = Some(Box::new(detection));
        self
    }

    pub fn boxed_detection_logic(mut self, detection: Box<dyn DetectionLogic>) -> Self {
        self.detection = Some(detection);
        self
    }

    pub fn candidate(mut self, candidate: InteractableRef) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn build(self) -> Result<HpuiInteractor, HpuiError> {
        let detection = self.detection.ok_or(HpuiError::MissingDetectionLogic)?;
        self.config.validate()?;
        info!(
            interactor = %self.id,
            "interactor ready: detection={} candidates={}",
            detection.name(),
            self.candidates.len()
        );
        let mut interactor = HpuiInteractor {
            id: self.id,
            logic: GestureLogic::new(self.config.gesture.clone()),
            classifier: GestureClassifier::new(&self.config),
            config: self.config,
            detection,
            candidates: Vec::new(),
            gesture_listeners: Vec::new(),
            hover_listeners: Vec::new(),
            classified_listeners: Vec::new(),
        };
        for candidate in self.candidates {
            interactor.register(candidate);
        }
        Ok(interactor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureLogicConfig;
    use crate::detection::DistanceDetectionLogic;
    use crate::interaction::surface::RectSurface;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn surface(id: u64, z_order: i32) -> Rc<RectSurface> {
        Rc::new(
            RectSurface::new(id, Vec3::ZERO, Quat::IDENTITY, Vec2::splat(0.05)).with_z_order(z_order),
        )
    }

    fn config(commit_delay_ms: f64) -> InteractorConfig {
        InteractorConfig {
            gesture: GestureLogicConfig {
                debounce_window_ms: 0.0,
                commit_delay_ms,
                switch_tracking_threshold: 0.15,
            },
            ..Default::default()
        }
    }

    fn touching() -> FingertipPose {
        FingertipPose::at(Vec3::new(0.0, 0.0, 0.002))
    }

    fn lifted() -> FingertipPose {
        FingertipPose::at(Vec3::new(0.0, 0.0, 0.2))
    }

    #[test]
    fn test_build_requires_detection_logic() {
        let result = HpuiInteractor::builder(1).build();
        assert!(matches!(result, Err(HpuiError::MissingDetectionLogic)));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut bad = InteractorConfig::default();
        bad.gesture.switch_tracking_threshold = -0.5;
        let result = HpuiInteractor::builder(1)
            .config(bad)
            .detection_logic(DistanceDetectionLogic::default())
            .build();
        assert!(matches!(result, Err(HpuiError::InvalidConfig(_))));
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut interactor = HpuiInteractor::builder(1)
            .detection_logic(DistanceDetectionLogic::default())
            .candidate(surface(1, 0))
            .candidate(surface(1, 3))
            .build()
            .unwrap();
        assert_eq!(interactor.candidate_count(), 1);
        interactor.register(surface(2, 0));
        assert_eq!(interactor.candidate_count(), 2);
        assert!(interactor.unregister(InteractableId(1)));
        assert!(!interactor.unregister(InteractableId(1)));
        assert_eq!(interactor.candidate_count(), 1);
    }

    #[test]
    fn test_dispatch_order_candidate_then_interactor() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let target = surface(1, 0);
        let sink = order.clone();
        target.add_gesture_listener(move |args| {
            sink.borrow_mut().push(format!("surface:{}", args.phase.as_str()))
        });

        let mut interactor = HpuiInteractor::builder(1)
            .config(config(100.0))
            .detection_logic(DistanceDetectionLogic::default())
            .candidate(target.clone())
            .build()
            .unwrap();
        let sink = order.clone();
        interactor.add_gesture_listener(move |args| {
            sink.borrow_mut().push(format!("interactor:{}", args.phase.as_str()))
        });

        assert_eq!(interactor.process(0.0, &touching()), Some(GesturePhase::CommitPending));
        assert_eq!(
            *order.borrow(),
            vec![
                "surface:commit-pending".to_string(),
                "interactor:commit-pending".to_string()
            ]
        );
        assert_eq!(target.last_phase(), Some(GesturePhase::CommitPending));
    }

    #[test]
    fn test_tap_classified() {
        let taps = Rc::new(RefCell::new(Vec::new()));
        let target = surface(5, 0);
        let mut interactor = HpuiInteractor::builder(1)
            .config(config(100.0))
            .detection_logic(DistanceDetectionLogic::default())
            .candidate(target.clone())
            .build()
            .unwrap();
        let sink = taps.clone();
        interactor.add_classified_listener(move |g| sink.borrow_mut().push(g.clone()));

        interactor.process(0.0, &touching());
        interactor.process(16.0, &touching());
        assert_eq!(interactor.process(32.0, &lifted()), Some(GesturePhase::Canceled));
        assert_eq!(taps.borrow().len(), 1);
        assert!(matches!(
            taps.borrow()[0],
            ClassifiedGesture::Tap { interactable: InteractableId(5), .. }
        ));
        assert_eq!(target.last_phase(), Some(GesturePhase::Canceled));
    }

    #[test]
    fn test_swipe_classified() {
        let swipes = Rc::new(RefCell::new(Vec::new()));
        let mut interactor = HpuiInteractor::builder(1)
            .config(config(50.0))
            .detection_logic(DistanceDetectionLogic::default())
            .candidate(surface(1, 0))
            .build()
            .unwrap();
        let sink = swipes.clone();
        interactor.add_classified_listener(move |g| sink.borrow_mut().push(g.clone()));

        for i in 0..8 {
            let pose = FingertipPose::at(Vec3::new(0.005 * i as f32, 0.0, 0.002));
            interactor.process(i as f64 * 25.0, &pose);
        }
        assert_eq!(interactor.process(200.0, &lifted()), Some(GesturePhase::Stopped));
        match &swipes.borrow()[..] {
            [ClassifiedGesture::Swipe { direction, .. }] => {
                assert_eq!(*direction, crate::interaction::SwipeDirection::Right);
            }
            other => panic!("expected one swipe, got {:?}", other),
        };
    }

    #[test]
    fn test_hover_listener_sees_every_tick() {
        let hovered = Rc::new(RefCell::new(Vec::new()));
        let mut interactor = HpuiInteractor::builder(1)
            .detection_logic(DistanceDetectionLogic::default())
            .candidate(surface(1, 0))
            .build()
            .unwrap();
        let sink = hovered.clone();
        interactor.add_hover_listener(move |_, frame| sink.borrow_mut().push(frame.len()));

        let hovering = FingertipPose::at(Vec3::new(0.0, 0.0, 0.02));
        assert_eq!(interactor.process(0.0, &hovering), None);
        assert_eq!(interactor.process(16.0, &lifted()), None);
        assert_eq!(*hovered.borrow(), vec![1, 0]);
    }

    #[test]
    fn test_priority_follows_z_order() {
        let back = surface(1, 1);
        let front = surface(2, 0);
        let mut interactor = HpuiInteractor::builder(1)
            .config(config(50.0))
            .detection_logic(DistanceDetectionLogic::default())
            .candidate(back.clone())
            .candidate(front.clone())
            .build()
            .unwrap();
        for i in 0..4 {
            interactor.process(i as f64 * 25.0, &touching());
        }
        assert_eq!(interactor.logic().priority_id(), Some(InteractableId(2)));
        assert_eq!(back.gesture_events(), 0);
        assert_eq!(front.gesture_events(), 4);
    }

    #[test]
    fn test_reset_and_status() {
        let mut interactor = HpuiInteractor::builder(3)
            .detection_logic(DistanceDetectionLogic::default())
            .candidate(surface(1, 0))
            .build()
            .unwrap();
        interactor.process(0.0, &touching());
        assert!(interactor.status_sexp().contains(":state :awaiting-commit"));
        interactor.reset();
        let status = interactor.status_sexp();
        assert!(status.contains(":interactor 3"));
        assert!(status.contains(":detection :distance"));
        assert!(status.contains(":state :no-gesture"));
    }
}
