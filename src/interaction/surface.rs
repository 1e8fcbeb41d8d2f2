//! Planar rectangular touch surface.

use std::cell::{Cell, RefCell};
use std::fmt;

use glam::{Quat, Vec2, Vec3};
use tracing::trace;

use super::candidate::{Interactable, InteractableId, Interactor};
use super::gesture_logic::{GestureEventArgs, GesturePhase};
use crate::detection::{Collider, RectCollider};

type GestureListener = Box<dyn FnMut(&GestureEventArgs)>;

/// A rectangle in 3D space that receives gesture callbacks.
///
/// Interaction positions are the fingertip projected into the rectangle's
/// local XY frame, in meters from its center.
pub struct RectSurface {
    id: InteractableId,
    z_order: i32,
    handles_gestures: Cell<bool>,
    collider: RectCollider,
    listeners: RefCell<Vec<GestureListener>>,
    last_phase: Cell<Option<GesturePhase>>,
    gesture_events: Cell<u64>,
}

impl RectSurface {
    pub fn new(id: u64, center: Vec3, rotation: Quat, half_extents: Vec2) -> Self {
        Self {
            id: InteractableId(id),
            z_order: 0,
            handles_gestures: Cell::new(true),
            collider: RectCollider::new(center, rotation, half_extents),
            listeners: RefCell::new(Vec::new()),
            last_phase: Cell::new(None),
            gesture_events: Cell::new(0),
        }
    }

    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn with_handles_gestures(self, handles: bool) -> Self {
        self.handles_gestures.set(handles);
        self
    }

    /// Toggle whether this surface accepts gesture callbacks.
    pub fn set_handles_gestures(&self, handles: bool) {
        self.handles_gestures.set(handles);
    }

    /// Listeners must not register further listeners on this surface from
    /// inside the callback.
    pub fn add_gesture_listener(&self, listener: impl FnMut(&GestureEventArgs) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    pub fn rect(&self) -> &RectCollider {
        &self.collider
    }

    /// Phase of the most recent gesture callback.
    pub fn last_phase(&self) -> Option<GesturePhase> {
        self.last_phase.get()
    }

    /// Number of gesture callbacks received.
    pub fn gesture_events(&self) -> u64 {
        self.gesture_events.get()
    }
}

impl fmt::Debug for RectSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RectSurface")
            .field("id", &self.id)
            .field("z_order", &self.z_order)
            .field("handles_gestures", &self.handles_gestures.get())
            .field("collider", &self.collider)
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl Interactable for RectSurface {
    fn id(&self) -> InteractableId {
        self.id
    }

    fn z_order(&self) -> i32 {
        self.z_order
    }

    fn handles_gestures(&self) -> bool {
        self.handles_gestures.get()
    }

    fn interaction_position(&self, interactor: &dyn Interactor) -> Option<Vec2> {
        let position = self.collider.local_position(interactor.interaction_point());
        position.is_finite().then_some(position)
    }

    fn on_gesture(&self, args: &GestureEventArgs) {
        trace!("surface {} gesture {}", self.id, args.phase.as_str());
        self.last_phase.set(Some(args.phase));
        self.gesture_events.set(self.gesture_events.get() + 1);
        for listener in self.listeners.borrow_mut().iter_mut() {
            listener(args);
        }
    }

    fn collider(&self) -> Option<&dyn Collider> {
        Some(&self.collider)
    }
}
