//! Gesture Engine Integration Tests
//!
//! Drives the engine through whole gestures against a transform store:
//! - Smoothed sticker resize convergence
//! - Deleting through the delete handle
//! - Aspect ratio and hit-test properties

use journal_core::{
    affordance_handles, rotate_point, Affordance, EntityId, FreeImagePlacement, GestureEngine,
    GestureState, ImageSource, Point, PointerKind, Size, StickerEntity, StickerId,
    TransformStore,
};
use proptest::prelude::*;

const PAGE: Size = Size::new(1240.0, 1754.0);

/// Store holding one sticker of exactly `size`, centred on the page.
fn store_with(size: Size) -> (TransformStore, StickerId) {
    let mut store = TransformStore::new(PAGE);
    let sticker = StickerEntity::new(ImageSource::new("shell.png"), size, Some(size), PAGE);
    let id = store.add_sticker(sticker);
    (store, id)
}

fn handle_of(store: &TransformStore, id: EntityId, kind: Affordance) -> Point {
    let frame = store.frame(id).expect("entity exists");
    affordance_handles(id, &frame)
        .into_iter()
        .find(|h| h.kind == kind)
        .map(|h| h.center)
        .expect("handle exists")
}

fn size_of(store: &TransformStore, id: StickerId) -> Size {
    store.sticker(id).map(|s| s.size).expect("sticker exists")
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_converges_to_sqrt_two_without_overshoot() {
    let (mut store, id) = store_with(Size::new(400.0, 300.0));
    let eid = EntityId::Sticker(id);
    let mut engine = GestureEngine::new();
    engine.select(Some(eid));

    let handle = handle_of(&store, eid, Affordance::Resize);
    let _ = engine.pointer_down(&mut store, handle, PointerKind::Mouse);
    assert!(matches!(engine.state(), GestureState::Resizing { .. }));

    let center = store.sticker(id).map(StickerEntity::center).expect("sticker");
    let reach = handle - center;

    // first move captures the baseline distance
    let _ = engine.pointer_move(&mut store, center + reach);
    let start = size_of(&store, id);
    assert!((start.width - 400.0).abs() < 1e-3);

    let target_width = 400.0 * 2.0_f32.sqrt();
    let doubled = center + Point::new(reach.x * 2.0, reach.y * 2.0);
    let mut previous = start.width;
    for _ in 0..80 {
        let _ = engine.pointer_move(&mut store, doubled);
        let size = size_of(&store, id);
        assert!(size.width <= target_width + 1e-2, "overshoot: {}", size.width);
        assert!(size.width >= previous - 1e-3, "shrank while growing");
        assert!((size.width / size.height - 4.0 / 3.0).abs() < 1e-4);
        previous = size.width;
    }
    assert!((previous - target_width).abs() < 0.05);

    // centre stays put
    let after = store.sticker(id).map(StickerEntity::center).expect("sticker");
    assert!(after.distance(center) < 1e-2);

    let _ = engine.end(&store);
    assert_eq!(*engine.state(), GestureState::Selected(eid));
}

#[test]
fn test_resize_respects_floor() {
    let (mut store, id) = store_with(Size::new(120.0, 80.0));
    let eid = EntityId::Sticker(id);
    let mut engine = GestureEngine::new();
    engine.select(Some(eid));

    let handle = handle_of(&store, eid, Affordance::Resize);
    let _ = engine.pointer_down(&mut store, handle, PointerKind::Mouse);
    let center = store.sticker(id).map(StickerEntity::center).expect("sticker");
    let _ = engine.pointer_move(&mut store, handle);
    for _ in 0..200 {
        let _ = engine.pointer_move(&mut store, center + Point::new(0.5, 0.0));
    }
    let size = size_of(&store, id);
    assert!(size.height >= journal_core::MIN_ENTITY_SIZE - 1e-3);
    assert!((size.width / size.height - 1.5).abs() < 1e-4);
}

// ============================================================================
// Delete
// ============================================================================

#[test]
fn test_delete_handle_removes_and_goes_idle() {
    let (mut store, id) = store_with(Size::new(200.0, 200.0));
    let eid = EntityId::Sticker(id);
    let mut engine = GestureEngine::new();

    let center = store.sticker(id).map(StickerEntity::center).expect("sticker");
    let _ = engine.pointer_down(&mut store, center, PointerKind::Touch);
    let _ = engine.end(&store);
    assert_eq!(*engine.state(), GestureState::Selected(eid));

    let delete = handle_of(&store, eid, Affordance::Delete);
    let redraw = engine.pointer_down(&mut store, delete, PointerKind::Touch);
    assert!(redraw.is_needed());
    assert!(store.sticker(id).is_none());
    assert_eq!(*engine.state(), GestureState::Idle);

    // nothing left to manipulate
    assert!(!engine.pointer_move(&mut store, center).is_needed());
    let _ = engine.end(&store);
    assert_eq!(*engine.state(), GestureState::Idle);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_sticker_resize_keeps_aspect(
        width in 40.0f32..600.0,
        height in 40.0f32..600.0,
        distances in prop::collection::vec(0.0f32..2000.0, 1..40),
    ) {
        let (mut store, id) = store_with(Size::new(width, height));
        let eid = EntityId::Sticker(id);
        let aspect = size_of(&store, id).aspect();
        let mut engine = GestureEngine::new();
        engine.select(Some(eid));
        let handle = handle_of(&store, eid, Affordance::Resize);
        let _ = engine.pointer_down(&mut store, handle, PointerKind::Mouse);
        let center = store.sticker(id).map(StickerEntity::center).expect("sticker");

        for d in distances {
            let _ = engine.pointer_move(&mut store, center + Point::new(d, 0.0));
            let size = size_of(&store, id);
            prop_assert!((size.aspect() - aspect).abs() <= aspect * 1e-4);
            prop_assert!(size.width <= PAGE.width * journal_core::MAX_RELATIVE_SIZE + 1e-2);
            prop_assert!(size.height <= PAGE.height * journal_core::MAX_RELATIVE_SIZE + 1e-2);
        }
    }

    #[test]
    fn prop_photo_resize_keeps_aspect(
        natural_w in 50.0f32..4000.0,
        natural_h in 50.0f32..4000.0,
        moves in prop::collection::vec((-800.0f32..800.0, -800.0f32..800.0), 1..30),
    ) {
        let mut store = TransformStore::new(PAGE);
        store.set_placement(FreeImagePlacement::new(
            0,
            Size::new(natural_w, natural_h),
            Point::new(120.0, 300.0),
            PAGE,
        ));
        let aspect = natural_w / natural_h;
        let eid = EntityId::Image(0);
        let mut engine = GestureEngine::new();
        engine.select(Some(eid));
        let handle = handle_of(&store, eid, Affordance::Resize);
        let _ = engine.pointer_down(&mut store, handle, PointerKind::Mouse);

        for (dx, dy) in moves {
            let _ = engine.pointer_move(&mut store, handle + Point::new(dx, dy));
            let p = store.placement(0).expect("placement");
            prop_assert!((p.size.width / p.size.height - aspect).abs() <= aspect * 1e-4);
            prop_assert!((p.position.x - 120.0).abs() < 1e-4);
            prop_assert!(p.rect().right() <= PAGE.width + 1e-2);
            prop_assert!(p.rect().bottom() <= PAGE.height + 1e-2);
        }
    }

    #[test]
    fn prop_hit_test_is_rotation_invariant(
        width in 40.0f32..500.0,
        height in 40.0f32..500.0,
        fx in -0.98f32..0.98,
        fy in -0.98f32..0.98,
    ) {
        let (mut store, id) = store_with(Size::new(width, height));
        let size = size_of(&store, id);
        let center = store.sticker(id).map(StickerEntity::center).expect("sticker");
        let local = center + Point::new(fx * size.width / 2.0, fy * size.height / 2.0);

        for degrees in 0..360u16 {
            let rotation = f32::from(degrees);
            if let Some(s) = store.sticker_mut(id) {
                s.rotation = rotation;
            }
            let point = rotate_point(local, center, rotation);
            prop_assert_eq!(store.hit_test(point, 1.0), Some(EntityId::Sticker(id)));
        }
    }
}
