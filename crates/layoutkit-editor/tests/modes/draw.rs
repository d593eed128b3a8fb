use layoutkit_core::{Error, GeometryError, Point2D, StructureError};
use layoutkit_editor::model::NodeKind;
use layoutkit_editor::modes::{
    Behavior, DrawBehavior, DrawTarget, EditKey, EditMode, ModeHooks, Unwound,
};

use crate::common::{click, fixture, key, move_to, session};

#[test]
fn test_region_closes_on_repeated_click() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::CreateRegion);
    for (i, (x, y)) in [(600.0, 100.0), (900.0, 100.0), (900.0, 300.0), (600.0, 300.0)]
        .into_iter()
        .enumerate()
    {
        session.dispatch(&mut scene, &click(x, y, i as u64)).unwrap();
    }
    assert!(scene.node("r2").is_none());

    // a second click within the close tolerance of the last point ends it
    session.dispatch(&mut scene, &click(601.0, 301.0, 10)).unwrap();

    let region = scene.node("r2").unwrap();
    assert_eq!(region.kind, NodeKind::TextRegion);
    assert_eq!(region.points().len(), 4);
    assert_eq!(scene.selected(), Some("r2"));
}

#[test]
fn test_line_drawn_inside_region() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::CreateLine);
    session.dispatch(&mut scene, &click(150.0, 350.0, 0)).unwrap();
    session.dispatch(&mut scene, &click(350.0, 350.0, 1)).unwrap();
    session.dispatch(&mut scene, &key(EditKey::Finish)).unwrap();

    let line = scene.node("r1_l3").unwrap();
    assert_eq!(
        line.baseline.as_deref(),
        Some(&[Point2D::new(150.0, 350.0), Point2D::new(350.0, 350.0)][..])
    );
    assert!(line.coords.is_derived());
    assert_eq!(line.points()[0], Point2D::new(150.0, 342.5));
}

#[test]
fn test_line_outside_any_region_is_discarded() {
    let mut scene = fixture();
    let before = scene.document().clone();
    let mut session = session(&mut scene, EditMode::CreateLine);
    session.dispatch(&mut scene, &click(600.0, 600.0, 0)).unwrap();
    session.dispatch(&mut scene, &click(800.0, 600.0, 1)).unwrap();

    let err = session
        .dispatch(&mut scene, &key(EditKey::Finish))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Structure(StructureError::UnsupportedOperation { .. })
    ));
    assert_eq!(scene.document(), &before);
    // nothing is left pending
    assert_eq!(session.escape(&mut scene), Unwound::Nothing);
}

#[test]
fn test_two_point_region_is_discarded() {
    let mut scene = fixture();
    let before = scene.document().clone();
    let mut session = session(&mut scene, EditMode::CreateRegion);
    session.dispatch(&mut scene, &click(600.0, 100.0, 0)).unwrap();
    session.dispatch(&mut scene, &click(900.0, 100.0, 1)).unwrap();

    let err = session
        .dispatch(&mut scene, &key(EditKey::Finish))
        .unwrap_err();

    assert_eq!(
        err,
        Error::Geometry(GeometryError::TooFewPoints { min: 3, got: 2 })
    );
    assert_eq!(scene.document(), &before);
}

#[test]
fn test_table_finishes_after_four_corners() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::CreateTable { rows: 2, cols: 3 });
    for (i, (x, y)) in [(600.0, 100.0), (900.0, 100.0), (900.0, 300.0), (600.0, 300.0)]
        .into_iter()
        .enumerate()
    {
        session.dispatch(&mut scene, &click(x, y, i as u64)).unwrap();
    }

    let table = scene.node("t1").unwrap();
    assert_eq!(table.kind, NodeKind::TableRegion { rows: 2, cols: 3 });
    assert_eq!(table.children.len(), 6);
    assert_eq!(scene.selected(), Some("t1"));
    assert!(scene.is_grid_table("t1").unwrap());
}

#[test]
fn test_glyph_needs_a_word_under_first_point() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::CreateGlyph);
    for (i, (x, y)) in [(155.0, 185.0), (165.0, 185.0), (165.0, 205.0), (155.0, 205.0)]
        .into_iter()
        .enumerate()
    {
        session.dispatch(&mut scene, &click(x, y, i as u64)).unwrap();
    }
    session.dispatch(&mut scene, &key(EditKey::Finish)).unwrap();

    assert_eq!(
        scene.document().parent_of("r1_l1_w1_g1").unwrap().id,
        "r1_l1_w1"
    );
}

#[test]
fn test_escape_cancels_draw_before_selection() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::CreateRegion);
    scene.select(Some("r1")).unwrap();
    session.dispatch(&mut scene, &click(600.0, 100.0, 0)).unwrap();

    assert_eq!(session.escape(&mut scene), Unwound::Draw);
    assert_eq!(scene.selected(), Some("r1"));
    assert_eq!(session.escape(&mut scene), Unwound::Selection);
    assert_eq!(session.escape(&mut scene), Unwound::Nothing);
}

#[test]
fn test_preview_follows_pointer() {
    let mut scene = fixture();
    let mut hooks = ModeHooks::default();
    let mut draw = DrawBehavior::new(DrawTarget::Region).on_page("page1");

    // moves before the first point are not a preview
    draw.handle(&mut scene, &move_to(10.0, 10.0, 0), &mut hooks)
        .unwrap();
    assert!(draw.preview_shape().is_empty());

    draw.handle(&mut scene, &click(600.0, 100.0, 1), &mut hooks)
        .unwrap();
    draw.handle(&mut scene, &move_to(700.0, 150.0, 2), &mut hooks)
        .unwrap();
    assert_eq!(
        draw.preview_shape(),
        vec![Point2D::new(600.0, 100.0), Point2D::new(700.0, 150.0)]
    );
    assert_eq!(draw.points().len(), 1);
}

#[test]
fn test_point_limit_finishes_draw() {
    let mut scene = fixture();
    let mut hooks = ModeHooks::default();
    let mut draw = DrawBehavior::new(DrawTarget::Region).with_point_limit(3);
    for (i, (x, y)) in [(600.0, 100.0), (900.0, 100.0), (750.0, 300.0)]
        .into_iter()
        .enumerate()
    {
        draw.handle(&mut scene, &click(x, y, i as u64), &mut hooks)
            .unwrap();
    }
    assert!(draw.points().is_empty());
    assert_eq!(scene.node("r2").unwrap().points().len(), 3);
}
