//! Direct manipulation of stickers and freeflow photos.
//!
//! The engine is a small state machine driven by pointer and touch events.
//! It is the only writer of entity geometry in the [`TransformStore`].
//!
//! ```text
//! Idle ──down on entity──▶ Moving ──up/leave/cancel──▶ Selected
//! Selected ──down on handle──▶ Resizing | Rotating ──end──▶ Selected
//! Selected ──down on delete──▶ Idle
//! ```

use crate::entity::{EntityId, MIN_ENTITY_SIZE};
use crate::event::{InputEvent, PointerEvent, PointerKind, PointerPhase, TouchEvent, TouchPhase};
use crate::geometry::{rotate_point, Point, Size};
use crate::schedule::Redraw;
use crate::store::{EntityFrame, TransformStore};

/// Distance of the corner handles from the entity's corners.
pub const HANDLE_OFFSET: f32 = 12.0;
/// Distance of the rotate handle above the top edge.
pub const ROTATE_HANDLE_OFFSET: f32 = 36.0;
/// Hit radius of a handle for a mouse pointer.
pub const HANDLE_RADIUS: f32 = 18.0;
/// Per-frame blend of the applied resize scale toward the raw target.
pub const RESIZE_BLEND: f32 = 0.2;
/// Added to the pointer angle so the rotate handle sits above the centre.
pub const ROTATION_OFFSET_DEGREES: f32 = 90.0;
/// Hit-area multiplier for mouse input.
pub const MOUSE_FORGIVENESS: f32 = 1.0;
/// Hit-area multiplier for touch input.
pub const TOUCH_FORGIVENESS: f32 = 1.25;

const MIN_INITIAL_DISTANCE: f32 = 1.0;

/// Hit-area multiplier for a device kind.
#[must_use]
pub fn forgiveness(kind: PointerKind) -> f32 {
    match kind {
        PointerKind::Mouse => MOUSE_FORGIVENESS,
        PointerKind::Touch => TOUCH_FORGIVENESS,
    }
}

/// Control drawn around a selected entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    /// Remove the entity.
    Delete,
    /// Rotate around the centre.
    Rotate,
    /// Scale, preserving aspect ratio.
    Resize,
}

/// An affordance and its page position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffordanceHandle {
    /// What the handle does.
    pub kind: Affordance,
    /// Handle centre in page space.
    pub center: Point,
}

/// Handles for an entity, rotated with it.
///
/// Stickers get delete (top-left), rotate (above top-centre) and resize
/// (bottom-right). Free photos only resize.
#[must_use]
pub fn affordance_handles(id: EntityId, frame: &EntityFrame) -> Vec<AffordanceHandle> {
    let center = frame.rect.center();
    let hx = frame.rect.width / 2.0;
    let hy = frame.rect.height / 2.0;

    let resize = (
        Affordance::Resize,
        Point::new(hx + HANDLE_OFFSET, hy + HANDLE_OFFSET),
    );
    let local: Vec<(Affordance, Point)> = match id {
        EntityId::Sticker(_) => vec![
            (
                Affordance::Delete,
                Point::new(-hx - HANDLE_OFFSET, -hy - HANDLE_OFFSET),
            ),
            (
                Affordance::Rotate,
                Point::new(0.0, -hy - ROTATE_HANDLE_OFFSET),
            ),
            resize,
        ],
        EntityId::Image(_) => vec![resize],
    };

    local
        .into_iter()
        .map(|(kind, offset)| AffordanceHandle {
            kind,
            center: rotate_point(center + offset, center, frame.rotation),
        })
        .collect()
}

/// Captured at pointer-down: pointer offset from the entity centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveAnchor {
    /// `pointer - centre` at gesture start.
    pub offset: Point,
}

/// Resize state for the two kinds of entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeAnchor {
    /// Smoothed, centre-anchored sticker resize. Captured lazily on the
    /// first move of the gesture.
    Sticker {
        /// Pointer-to-centre distance on the first move.
        initial_distance: Option<f32>,
        /// Size on the first move.
        initial_size: Option<Size>,
        /// Scale currently applied to `initial_size`.
        applied_scale: f32,
    },
    /// Direct, top-left-anchored photo resize. Captured at pointer-down.
    Image {
        /// Pointer position at pointer-down.
        start: Point,
        /// Size at pointer-down.
        start_size: Size,
    },
}

impl ResizeAnchor {
    fn sticker() -> Self {
        Self::Sticker {
            initial_distance: None,
            initial_size: None,
            applied_scale: 1.0,
        }
    }
}

/// Rotation state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotateAnchor {
    /// Set once when a second finger joins.
    pub two_finger: Option<TwoFingerAnchor>,
}

/// Captured when a two-finger rotation starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoFingerAnchor {
    /// Angle of the finger line in degrees.
    pub initial_angle: f32,
    /// Entity rotation at that moment.
    pub initial_rotation: f32,
}

/// Gesture engine state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// Nothing selected.
    #[default]
    Idle,
    /// An entity is selected; no gesture in progress.
    Selected(EntityId),
    /// Dragging an entity.
    Moving {
        /// Target entity.
        id: EntityId,
        /// Gesture anchor.
        anchor: MoveAnchor,
    },
    /// Resizing an entity.
    Resizing {
        /// Target entity.
        id: EntityId,
        /// Gesture anchor.
        anchor: ResizeAnchor,
    },
    /// Rotating a sticker.
    Rotating {
        /// Target entity.
        id: EntityId,
        /// Gesture anchor.
        anchor: RotateAnchor,
    },
}

impl GestureState {
    /// Entity the state refers to, if any.
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        match *self {
            Self::Idle => None,
            Self::Selected(id)
            | Self::Moving { id, .. }
            | Self::Resizing { id, .. }
            | Self::Rotating { id, .. } => Some(id),
        }
    }

    /// Whether a gesture (not just a selection) is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Moving { .. } | Self::Resizing { .. } | Self::Rotating { .. }
        )
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selected(_) => "selected",
            Self::Moving { .. } => "moving",
            Self::Resizing { .. } => "resizing",
            Self::Rotating { .. } => "rotating",
        }
    }
}

/// Pointer and touch state machine over a [`TransformStore`].
#[derive(Debug, Clone, Default)]
pub struct GestureEngine {
    state: GestureState,
}

impl GestureEngine {
    /// Create an idle engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Selected (or manipulated) entity.
    #[must_use]
    pub fn selected(&self) -> Option<EntityId> {
        self.state.entity()
    }

    /// Replace the selection, ending any gesture.
    pub fn select(&mut self, id: Option<EntityId>) {
        self.transition(id.map_or(GestureState::Idle, GestureState::Selected));
    }

    /// Drop selection and gesture.
    pub fn reset(&mut self) {
        self.transition(GestureState::Idle);
    }

    /// Dispatch any input event.
    pub fn handle(&mut self, store: &mut TransformStore, event: &InputEvent) -> Redraw {
        match event {
            InputEvent::Pointer(pointer) => self.handle_pointer(store, pointer),
            InputEvent::Touch(touch) => self.handle_touch(store, touch),
        }
    }

    /// Dispatch a pointer event.
    pub fn handle_pointer(&mut self, store: &mut TransformStore, event: &PointerEvent) -> Redraw {
        match event.phase {
            PointerPhase::Down => self.pointer_down(store, event.position(), event.kind),
            PointerPhase::Move => self.pointer_move(store, event.position()),
            PointerPhase::Up | PointerPhase::Leave | PointerPhase::Cancel => self.end(store),
        }
    }

    /// Dispatch a touch event; two or more fingers rotate the active sticker.
    pub fn handle_touch(&mut self, store: &mut TransformStore, event: &TouchEvent) -> Redraw {
        match (event.phase, event.finger_angle()) {
            (TouchPhase::Start | TouchPhase::Move, Some(angle)) => {
                self.two_finger_rotate(store, angle)
            }
            _ => event
                .as_pointer()
                .map_or(Redraw::Skip, |pointer| self.handle_pointer(store, &pointer)),
        }
    }

    /// Start a gesture: affordances of the selection first, then entities.
    pub fn pointer_down(
        &mut self,
        store: &mut TransformStore,
        point: Point,
        kind: PointerKind,
    ) -> Redraw {
        let forgiveness = forgiveness(kind);

        if let Some(id) = self.selected() {
            if let Some(frame) = store.frame(id) {
                let radius = HANDLE_RADIUS * forgiveness;
                let hit = affordance_handles(id, &frame)
                    .into_iter()
                    .find(|h| h.center.distance(point) <= radius);
                if let Some(handle) = hit {
                    return self.begin_affordance(store, id, handle.kind, point);
                }
            }
        }

        let Some(id) = store.hit_test(point, forgiveness) else {
            let was_selected = self.selected().is_some();
            self.transition(GestureState::Idle);
            return Redraw::from(was_selected);
        };

        store.bring_to_front(id);
        let Some(frame) = store.frame(id) else {
            self.transition(GestureState::Idle);
            return Redraw::Needed;
        };
        let anchor = MoveAnchor {
            offset: point - frame.rect.center(),
        };
        self.transition(GestureState::Moving { id, anchor });
        Redraw::Needed
    }

    fn begin_affordance(
        &mut self,
        store: &mut TransformStore,
        id: EntityId,
        affordance: Affordance,
        point: Point,
    ) -> Redraw {
        match affordance {
            Affordance::Delete => {
                if let Err(err) = store.remove(id) {
                    tracing::debug!(%id, %err, "delete target already gone");
                }
                self.transition(GestureState::Idle);
            }
            Affordance::Rotate => {
                self.transition(GestureState::Rotating {
                    id,
                    anchor: RotateAnchor::default(),
                });
            }
            Affordance::Resize => {
                let anchor = match id {
                    EntityId::Sticker(_) => ResizeAnchor::sticker(),
                    EntityId::Image(index) => match store.placement(index) {
                        Some(p) => ResizeAnchor::Image {
                            start: point,
                            start_size: p.size,
                        },
                        None => return self.abort(store, "placement vanished"),
                    },
                };
                self.transition(GestureState::Resizing { id, anchor });
            }
        }
        Redraw::Needed
    }

    /// Apply a pointer move to the active gesture.
    pub fn pointer_move(&mut self, store: &mut TransformStore, point: Point) -> Redraw {
        match self.state {
            GestureState::Idle | GestureState::Selected(_) => Redraw::Skip,
            GestureState::Moving { id, anchor } => self.apply_move(store, id, anchor, point),
            GestureState::Resizing { id, anchor } => match anchor {
                ResizeAnchor::Sticker { .. } => self.apply_sticker_resize(store, id, point),
                ResizeAnchor::Image { start, start_size } => {
                    self.apply_image_resize(store, id, start, start_size, point)
                }
            },
            GestureState::Rotating { id, .. } => {
                let EntityId::Sticker(sid) = id else {
                    return self.abort(store, "photos do not rotate");
                };
                let Some(sticker) = store.sticker_mut(sid) else {
                    return self.abort(store, "sticker vanished");
                };
                sticker.rotation = sticker.center().angle_to(point) + ROTATION_OFFSET_DEGREES;
                Redraw::Needed
            }
        }
    }

    fn apply_move(
        &mut self,
        store: &mut TransformStore,
        id: EntityId,
        anchor: MoveAnchor,
        point: Point,
    ) -> Redraw {
        let page = store.page();
        let target = point - anchor.offset;
        let center = Point::new(
            target.x.clamp(0.0, page.width),
            target.y.clamp(0.0, page.height),
        );
        let moved = match id {
            EntityId::Sticker(sid) => store.sticker_mut(sid).map(|s| {
                s.position = Point::new(center.x - s.size.width / 2.0, center.y - s.size.height / 2.0);
            }),
            EntityId::Image(index) => store.placement_mut(index).map(|p| {
                p.position = Point::new(center.x - p.size.width / 2.0, center.y - p.size.height / 2.0);
            }),
        };
        match moved {
            Some(()) => Redraw::Needed,
            None => self.abort(store, "moved entity vanished"),
        }
    }

    fn apply_sticker_resize(
        &mut self,
        store: &mut TransformStore,
        id: EntityId,
        point: Point,
    ) -> Redraw {
        let GestureState::Resizing {
            anchor:
                ResizeAnchor::Sticker {
                    initial_distance,
                    initial_size,
                    applied_scale,
                },
            ..
        } = self.state
        else {
            return Redraw::Skip;
        };
        let limits = store.limits();
        let EntityId::Sticker(sid) = id else {
            return self.abort(store, "sticker resize on a photo");
        };
        let Some(sticker) = store.sticker_mut(sid) else {
            return self.abort(store, "resized sticker vanished");
        };

        let distance = point.distance(sticker.center());
        // first move of the gesture captures the baseline exactly once
        let d0 = initial_distance.unwrap_or_else(|| distance.max(MIN_INITIAL_DISTANCE));
        let base = initial_size.unwrap_or(sticker.size);

        let raw = (distance / d0).sqrt();
        let blended = applied_scale + (raw - applied_scale) * RESIZE_BLEND;
        let scale = limits.clamp_scale(base, blended);
        sticker.set_size_centered(base.scaled(scale));

        self.state = GestureState::Resizing {
            id,
            anchor: ResizeAnchor::Sticker {
                initial_distance: Some(d0),
                initial_size: Some(base),
                applied_scale: scale,
            },
        };
        Redraw::Needed
    }

    fn apply_image_resize(
        &mut self,
        store: &mut TransformStore,
        id: EntityId,
        start: Point,
        start_size: Size,
        point: Point,
    ) -> Redraw {
        let page = store.page();
        let EntityId::Image(index) = id else {
            return self.abort(store, "photo resize on a sticker");
        };
        let Some(placement) = store.placement_mut(index) else {
            return self.abort(store, "resized photo vanished");
        };

        let dx = point.x - start.x;
        let dy = point.y - start.y;
        let scale = if dx.abs() >= dy.abs() {
            1.0 + dx / start_size.width.max(f32::EPSILON)
        } else {
            1.0 + dy / start_size.height.max(f32::EPSILON)
        };

        let aspect = placement.aspect;
        let upper = (page.width - placement.position.x)
            .min((page.height - placement.position.y) * aspect);
        let lower = MIN_ENTITY_SIZE.max(MIN_ENTITY_SIZE * aspect);
        let width = (start_size.width * scale).clamp(lower.min(upper), upper.max(0.0));
        placement.set_width(width);
        Redraw::Needed
    }

    /// Rotate the active sticker with two fingers.
    pub fn two_finger_rotate(&mut self, store: &mut TransformStore, angle: f32) -> Redraw {
        let Some(id) = self.selected() else {
            return Redraw::Skip;
        };
        let EntityId::Sticker(sid) = id else {
            return Redraw::Skip;
        };
        let Some(sticker) = store.sticker_mut(sid) else {
            return self.abort(store, "rotated sticker vanished");
        };

        let anchor = match self.state {
            GestureState::Rotating {
                anchor:
                    RotateAnchor {
                        two_finger: Some(anchor),
                    },
                ..
            } => anchor,
            _ => {
                let anchor = TwoFingerAnchor {
                    initial_angle: angle,
                    initial_rotation: sticker.rotation,
                };
                self.transition(GestureState::Rotating {
                    id,
                    anchor: RotateAnchor {
                        two_finger: Some(anchor),
                    },
                });
                anchor
            }
        };

        sticker.rotation = anchor.initial_rotation + (angle - anchor.initial_angle);
        Redraw::Needed
    }

    /// End any gesture (pointer up, leave or cancel).
    pub fn end(&mut self, store: &TransformStore) -> Redraw {
        let was_active = self.state.is_active();
        let next = match self.state.entity() {
            Some(id) if store.contains(id) => GestureState::Selected(id),
            _ => GestureState::Idle,
        };
        let changed = next != self.state;
        self.transition(next);
        Redraw::from(was_active || changed)
    }

    fn abort(&mut self, store: &TransformStore, reason: &str) -> Redraw {
        tracing::debug!(state = self.state.name(), reason, "gesture aborted");
        let next = match self.state.entity() {
            Some(id) if store.contains(id) => GestureState::Selected(id),
            _ => GestureState::Idle,
        };
        self.transition(next);
        Redraw::Needed
    }

    fn transition(&mut self, next: GestureState) {
        if std::mem::discriminant(&self.state) != std::mem::discriminant(&next)
            || self.state.entity() != next.entity()
        {
            tracing::debug!(
                from = self.state.name(),
                to = next.name(),
                entity = ?next.entity(),
                "gesture transition"
            );
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ImageSource;
    use crate::entity::{FreeImagePlacement, StickerEntity, StickerId};

    const PAGE: Size = Size::new(1240.0, 1754.0);

    fn store_with_sticker(size: Size) -> (TransformStore, StickerId) {
        let mut store = TransformStore::new(PAGE);
        let sticker = StickerEntity::new(ImageSource::new("leaf.png"), size, Some(size), PAGE);
        let id = store.add_sticker(sticker);
        (store, id)
    }

    fn sticker_center(store: &TransformStore, id: StickerId) -> Point {
        store.sticker(id).map(StickerEntity::center).unwrap_or_default()
    }

    fn handle(store: &TransformStore, id: EntityId, kind: Affordance) -> Point {
        let frame = store.frame(id).expect("entity exists");
        affordance_handles(id, &frame)
            .into_iter()
            .find(|h| h.kind == kind)
            .map(|h| h.center)
            .expect("handle exists")
    }

    #[test]
    fn test_down_on_sticker_starts_move() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 200.0));
        let mut engine = GestureEngine::new();
        let c = sticker_center(&store, id);

        let redraw = engine.pointer_down(&mut store, c + Point::new(10.0, 5.0), PointerKind::Mouse);
        assert!(redraw.is_needed());
        match engine.state() {
            GestureState::Moving { id: active, anchor } => {
                assert_eq!(*active, EntityId::Sticker(id));
                assert!((anchor.offset.x - 10.0).abs() < 1e-4);
            }
            other => panic!("expected moving, got {other:?}"),
        }
    }

    #[test]
    fn test_move_follows_pointer_and_clamps_center() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 200.0));
        let mut engine = GestureEngine::new();
        let c = sticker_center(&store, id);
        engine.pointer_down(&mut store, c, PointerKind::Mouse);

        engine.pointer_move(&mut store, Point::new(300.0, 400.0));
        let moved = sticker_center(&store, id);
        assert!((moved.x - 300.0).abs() < 1e-3);
        assert!((moved.y - 400.0).abs() < 1e-3);

        engine.pointer_move(&mut store, Point::new(-500.0, 5000.0));
        let clamped = sticker_center(&store, id);
        assert!(clamped.x.abs() < 1e-3);
        assert!((clamped.y - PAGE.height).abs() < 1e-3);
    }

    #[test]
    fn test_up_returns_to_selected() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 200.0));
        let mut engine = GestureEngine::new();
        let c = sticker_center(&store, id);
        engine.pointer_down(&mut store, c, PointerKind::Mouse);
        engine.end(&store);
        assert_eq!(*engine.state(), GestureState::Selected(EntityId::Sticker(id)));
    }

    #[test]
    fn test_down_on_empty_space_deselects() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 200.0));
        let mut engine = GestureEngine::new();
        engine.select(Some(EntityId::Sticker(id)));
        let redraw = engine.pointer_down(&mut store, Point::new(5.0, 5.0), PointerKind::Mouse);
        assert!(redraw.is_needed());
        assert_eq!(*engine.state(), GestureState::Idle);
    }

    #[test]
    fn test_touch_forgiveness_reaches_further() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 200.0));
        let c = sticker_center(&store, id);
        // 110 px from the centre: outside the 100 px half-extent, inside 125
        let outside = c + Point::new(110.0, 0.0);

        let mut mouse = GestureEngine::new();
        mouse.pointer_down(&mut store, outside, PointerKind::Mouse);
        assert_eq!(*mouse.state(), GestureState::Idle);

        let mut touch = GestureEngine::new();
        touch.pointer_down(&mut store, outside, PointerKind::Touch);
        assert!(touch.state().is_active());
    }

    #[test]
    fn test_rotate_handle_assigns_angle() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 200.0));
        let eid = EntityId::Sticker(id);
        let mut engine = GestureEngine::new();
        engine.select(Some(eid));
        let h = handle(&store, eid, Affordance::Rotate);
        engine.pointer_down(&mut store, h, PointerKind::Mouse);
        assert!(matches!(engine.state(), GestureState::Rotating { .. }));

        // pointer straight to the right of the centre: 0 + 90 degrees
        let c = sticker_center(&store, id);
        engine.pointer_move(&mut store, c + Point::new(100.0, 0.0));
        let rotation = store.sticker(id).map(|s| s.rotation).unwrap_or_default();
        assert!((rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_handles_follow_rotation() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 100.0));
        let eid = EntityId::Sticker(id);
        if let Some(s) = store.sticker_mut(id) {
            s.rotation = 90.0;
        }
        let c = sticker_center(&store, id);
        let h = handle(&store, eid, Affordance::Rotate);
        // above the top edge locally; after a quarter turn it sits to the right
        assert!((h.x - (c.x + 50.0 + ROTATE_HANDLE_OFFSET)).abs() < 1e-3);
        assert!((h.y - c.y).abs() < 1e-3);
    }

    #[test]
    fn test_two_finger_rotation_is_relative() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 200.0));
        if let Some(s) = store.sticker_mut(id) {
            s.rotation = 30.0;
        }
        let mut engine = GestureEngine::new();
        engine.select(Some(EntityId::Sticker(id)));

        engine.two_finger_rotate(&mut store, 10.0);
        engine.two_finger_rotate(&mut store, 55.0);
        let rotation = store.sticker(id).map(|s| s.rotation).unwrap_or_default();
        assert!((rotation - 75.0).abs() < 1e-3);
    }

    #[test]
    fn test_photo_exposes_only_resize() {
        let mut store = TransformStore::new(PAGE);
        store.set_placement(FreeImagePlacement::new(
            0,
            Size::new(400.0, 300.0),
            Point::new(100.0, 100.0),
            PAGE,
        ));
        let frame = store.frame(EntityId::Image(0)).expect("placement");
        let handles = affordance_handles(EntityId::Image(0), &frame);
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].kind, Affordance::Resize);
    }

    #[test]
    fn test_photo_resize_keeps_top_left_and_aspect() {
        let mut store = TransformStore::new(PAGE);
        store.set_placement(FreeImagePlacement::new(
            0,
            Size::new(400.0, 300.0),
            Point::new(100.0, 100.0),
            PAGE,
        ));
        let eid = EntityId::Image(0);
        let mut engine = GestureEngine::new();
        engine.select(Some(eid));
        let h = handle(&store, eid, Affordance::Resize);
        engine.pointer_down(&mut store, h, PointerKind::Mouse);
        assert!(matches!(engine.state(), GestureState::Resizing { .. }));

        // horizontal displacement dominates: +180 on a 360 px width = 1.5x
        engine.pointer_move(&mut store, h + Point::new(180.0, 20.0));
        let p = store.placement(0).expect("placement");
        assert!((p.position.x - 100.0).abs() < 1e-4);
        assert!((p.position.y - 100.0).abs() < 1e-4);
        assert!((p.size.width - 540.0).abs() < 1e-3);
        assert!((p.size.width / p.size.height - 4.0 / 3.0).abs() < 1e-4);

        // far past the page edge: bounded by the remaining width
        engine.pointer_move(&mut store, h + Point::new(5000.0, 0.0));
        let p = store.placement(0).expect("placement");
        assert!((p.size.width - (PAGE.width - 100.0)).abs() < 1e-3);
    }

    #[test]
    fn test_vanished_entity_aborts_to_idle() {
        let (mut store, id) = store_with_sticker(Size::new(200.0, 200.0));
        let mut engine = GestureEngine::new();
        let c = sticker_center(&store, id);
        engine.pointer_down(&mut store, c, PointerKind::Mouse);
        store.remove_sticker(id).expect("remove");

        engine.pointer_move(&mut store, Point::new(10.0, 10.0));
        assert_eq!(*engine.state(), GestureState::Idle);
    }
}
