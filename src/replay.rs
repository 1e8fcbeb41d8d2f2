//! Replay scripts: surfaces plus timed fingertip samples, driven through an
//! interactor with event output rendered as s-expressions.
//!
//! One form per line, `;` starts a comment line:
//!
//! ```text
//! (:surface :id 1 :z-order 0 :center (0 0 0) :half-extents (0.02 0.02) :handles-gestures t)
//! (:frame :t 0 :tip (0 0 0.003))
//! ```
//!
//! Surfaces accept an optional `:rotation (x y z w)`; frames accept
//! `:rotation (x y z w)` and `:radius`.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use lexpr::Value;
use tracing::{debug, info};

use crate::config::InteractorConfig;
use crate::detection::{ConeRayCastDetectionLogic, DetectionLogic, DistanceDetectionLogic};
use crate::error::HpuiError;
use crate::interaction::{
    ClassifiedGesture, FingertipPose, GestureEventArgs, HpuiInteractor, InteractableId,
    RectSurface,
};
use crate::sexp::{self, bool_sexp, format_event, get_bool, get_float, get_floats, get_int};

/// Which detection logic drives the replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DetectionKind {
    Distance,
    Cone,
}

impl DetectionKind {
    fn build(&self) -> Box<dyn DetectionLogic> {
        match self {
            Self::Distance => Box::new(DistanceDetectionLogic::default()),
            Self::Cone => Box::new(ConeRayCastDetectionLogic::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDef {
    pub id: u64,
    pub z_order: i32,
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec2,
    pub handles_gestures: bool,
}

impl SurfaceDef {
    fn build(&self) -> RectSurface {
        RectSurface::new(self.id, self.center, self.rotation, self.half_extents)
            .with_z_order(self.z_order)
            .with_handles_gestures(self.handles_gestures)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub time_ms: f64,
    pub pose: FingertipPose,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayScript {
    pub surfaces: Vec<SurfaceDef>,
    pub frames: Vec<FrameSample>,
}

impl ReplayScript {
    pub fn parse(raw: &str) -> Result<Self, HpuiError> {
        let mut script = Self::default();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let lineno = idx + 1;
            let value = sexp::parse(line).map_err(|e| at_line(lineno, &e.to_string()))?;
            match head_keyword(&value).as_deref() {
                Some("surface") => {
                    let surface = parse_surface(&value).map_err(|e| at_line(lineno, &e))?;
                    script.surfaces.push(surface);
                }
                Some("frame") => {
                    let frame = parse_frame(&value).map_err(|e| at_line(lineno, &e))?;
                    if let Some(prev) = script.frames.last() {
                        if frame.time_ms < prev.time_ms {
                            return Err(at_line(lineno, "frame time goes backwards"));
                        }
                    }
                    script.frames.push(frame);
                }
                Some(other) => return Err(at_line(lineno, &format!("unknown form :{other}"))),
                None => return Err(at_line(lineno, "expected (:surface ...) or (:frame ...)")),
            }
        }
        debug!(
            "replay script: {} surfaces, {} frames",
            script.surfaces.len(),
            script.frames.len()
        );
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self, HpuiError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }
}

fn at_line(lineno: usize, reason: &str) -> HpuiError {
    HpuiError::Parse(format!("line {lineno}: {reason}"))
}

/// Leading keyword of a form, without the colon.
fn head_keyword(value: &Value) -> Option<String> {
    match value {
        Value::Cons(pair) => match pair.car() {
            Value::Keyword(k) => Some(k.to_string()),
            Value::Symbol(s) => s.strip_prefix(':').map(str::to_string),
            _ => None,
        },
        _ => None,
    }
}

fn vec3(value: &Value, key: &str) -> Result<Option<Vec3>, String> {
    match get_floats(value, key) {
        None => Ok(None),
        Some(v) if v.len() == 3 => Ok(Some(Vec3::new(v[0], v[1], v[2]))),
        Some(_) => Err(format!(":{key} needs 3 numbers")),
    }
}

fn rotation(value: &Value) -> Result<Quat, String> {
    match get_floats(value, "rotation") {
        None => Ok(Quat::IDENTITY),
        Some(v) if v.len() == 4 => {
            let q = Quat::from_xyzw(v[0], v[1], v[2], v[3]);
            if q.is_finite() && q.length_squared() > 1e-12 {
                Ok(q.normalize())
            } else {
                Err(":rotation is degenerate".to_string())
            }
        }
        Some(_) => Err(":rotation needs 4 numbers".to_string()),
    }
}

fn parse_surface(value: &Value) -> Result<SurfaceDef, String> {
    let id = get_int(value, "id").ok_or(":surface needs :id")?;
    let half = match get_floats(value, "half-extents") {
        Some(v) if v.len() == 2 => Vec2::new(v[0], v[1]),
        _ => return Err(":surface needs :half-extents (w h)".to_string()),
    };
    Ok(SurfaceDef {
        id: u64::try_from(id).map_err(|_| ":id must be non-negative".to_string())?,
        z_order: i32::try_from(get_int(value, "z-order").unwrap_or(0))
            .map_err(|_| ":z-order is out of range".to_string())?,
        center: vec3(value, "center")?.unwrap_or(Vec3::ZERO),
        rotation: rotation(value)?,
        half_extents: half,
        handles_gestures: get_bool(value, "handles-gestures").unwrap_or(true),
    })
}

fn parse_frame(value: &Value) -> Result<FrameSample, String> {
    let time_ms = get_float(value, "t").ok_or(":frame needs :t")?;
    let position = vec3(value, "tip")?.ok_or(":frame needs :tip (x y z)")?;
    Ok(FrameSample {
        time_ms,
        pose: FingertipPose {
            position,
            rotation: rotation(value)?,
            radius: get_float(value, "radius").unwrap_or(0.0) as f32,
        },
    })
}

// ── Running ────────────────────────────────────────────────

fn id_sexp(id: Option<InteractableId>) -> String {
    id.map(|i| i.to_string())
        .unwrap_or_else(|| "nil".to_string())
}

pub fn gesture_event_sexp(args: &GestureEventArgs) -> String {
    format_event(
        "gesture",
        &[
            ("phase", &format!(":{}", args.phase.as_str())),
            ("t", &format!("{:.0}", args.start_time_ms + args.time_delta_ms)),
            ("interactable", &id_sexp(args.interactable_id())),
            ("tracking", &id_sexp(args.tracking_id())),
            ("x", &format!("{:.4}", args.current_position.x)),
            ("y", &format!("{:.4}", args.current_position.y)),
            ("distance", &format!("{:.4}", args.cumulative_distance)),
        ],
    )
}

pub fn classified_sexp(gesture: &ClassifiedGesture) -> String {
    match gesture {
        ClassifiedGesture::Tap {
            interactable,
            position,
            duration_ms,
        } => format_event(
            "tap",
            &[
                ("interactable", &interactable.to_string()),
                ("x", &format!("{:.4}", position.x)),
                ("y", &format!("{:.4}", position.y)),
                ("duration-ms", &format!("{:.0}", duration_ms)),
            ],
        ),
        ClassifiedGesture::Swipe {
            interactable,
            direction,
            distance,
            duration_ms,
            ..
        } => format_event(
            "swipe",
            &[
                ("interactable", &interactable.to_string()),
                ("direction", &format!(":{}", direction.as_str())),
                ("distance", &format!("{:.4}", distance)),
                ("duration-ms", &format!("{:.0}", duration_ms)),
            ],
        ),
    }
}

/// Run `script` and return the emitted events, one s-expression per entry.
pub fn run(
    script: &ReplayScript,
    config: InteractorConfig,
    detection: DetectionKind,
) -> Result<Vec<String>, HpuiError> {
    let mut builder = HpuiInteractor::builder(0)
        .config(config)
        .boxed_detection_logic(detection.build());
    for surface in &script.surfaces {
        builder = builder.candidate(Rc::new(surface.build()));
    }
    let mut interactor = builder.build()?;

    let output = Rc::new(RefCell::new(Vec::new()));
    let sink = output.clone();
    interactor.add_gesture_listener(move |args| sink.borrow_mut().push(gesture_event_sexp(args)));
    let sink = output.clone();
    interactor.add_classified_listener(move |g| sink.borrow_mut().push(classified_sexp(g)));

    for frame in &script.frames {
        interactor.process(frame.time_ms, &frame.pose);
    }
    info!(
        "replayed {} frames, {} events, final {}",
        script.frames.len(),
        output.borrow().len(),
        interactor.status_sexp()
    );
    let lines = output.take();
    Ok(lines)
}

/// Summary line describing a parsed script.
pub fn script_summary_sexp(script: &ReplayScript) -> String {
    let duration = match (script.frames.first(), script.frames.last()) {
        (Some(first), Some(last)) => last.time_ms - first.time_ms,
        _ => 0.0,
    };
    let all_handle = script.surfaces.iter().all(|s| s.handles_gestures);
    format!(
        "(:surfaces {} :frames {} :duration-ms {:.0} :all-handle-gestures {})",
        script.surfaces.len(),
        script.frames.len(),
        duration,
        bool_sexp(all_handle),
    )
}
