use layoutkit_core::{signed_area, Error, GeometryError, Point2D, StructureError};
use layoutkit_editor::model::{Band, NodeKind};
use layoutkit_editor::scene::Scene;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2D> {
    vec![
        Point2D::new(x0, y0),
        Point2D::new(x1, y0),
        Point2D::new(x1, y1),
        Point2D::new(x0, y1),
    ]
}

fn line(x0: f64, x1: f64, y: f64) -> Vec<Point2D> {
    vec![Point2D::new(x0, y), Point2D::new(x1, y)]
}

/// A 1000x800 page with region `r1` covering (100,100)-(500,400).
fn scene_with_region() -> (Scene, String, String) {
    let mut scene = Scene::default();
    let page = scene.create_page(1000.0, 800.0, None).unwrap();
    let region = scene
        .create_node(&page, NodeKind::TextRegion, rect(100.0, 100.0, 500.0, 400.0))
        .unwrap();
    (scene, page, region)
}

#[test]
fn test_ids_follow_parent_prefixes() {
    let (mut scene, page, region) = scene_with_region();
    assert_eq!(page, "page1");
    assert_eq!(region, "r1");

    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    let w1 = scene
        .create_node(&l1, NodeKind::Word, rect(150.0, 180.0, 200.0, 210.0))
        .unwrap();
    let g1 = scene
        .create_node(&w1, NodeKind::Glyph, rect(150.0, 180.0, 160.0, 210.0))
        .unwrap();

    assert_eq!(l1, "r1_l1");
    assert_eq!(w1, "r1_l1_w1");
    assert_eq!(g1, "r1_l1_w1_g1");
}

#[test]
fn test_created_polygons_are_clockwise() {
    let (mut scene, page, _) = scene_with_region();
    let counter_clockwise = vec![
        Point2D::new(600.0, 100.0),
        Point2D::new(600.0, 300.0),
        Point2D::new(900.0, 300.0),
        Point2D::new(900.0, 100.0),
    ];
    let id = scene
        .create_node(&page, NodeKind::TextRegion, counter_clockwise)
        .unwrap();
    assert!(signed_area(scene.node(&id).unwrap().points()) > 0.0);
}

#[test]
fn test_two_point_region_is_rejected() {
    let (mut scene, page, _) = scene_with_region();
    let before = scene.document().clone();

    let err = scene
        .create_node(&page, NodeKind::TextRegion, line(600.0, 700.0, 100.0))
        .unwrap_err();

    assert_eq!(
        err,
        Error::Geometry(GeometryError::TooFewPoints { min: 3, got: 2 })
    );
    assert_eq!(scene.document(), &before);
}

#[test]
fn test_region_outside_page_is_rejected() {
    let (mut scene, page, _) = scene_with_region();
    let err = scene
        .create_node(&page, NodeKind::TextRegion, rect(900.0, 700.0, 1100.0, 790.0))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Geometry(GeometryError::OutOfBounds { .. })
    ));
}

#[test]
fn test_words_need_a_line_parent() {
    let (mut scene, _, region) = scene_with_region();
    let err = scene
        .create_node(&region, NodeKind::Word, rect(150.0, 150.0, 200.0, 180.0))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Structure(StructureError::InvalidParent { .. })
    ));
}

#[test]
fn test_text_only_on_text_carriers() {
    let (mut scene, page, region) = scene_with_region();
    let err = scene.set_text(&page, "nope").unwrap_err();
    assert!(matches!(
        err,
        Error::Structure(StructureError::TextNotAllowed { .. })
    ));

    scene.set_text(&region, "first line\nsecond line").unwrap();
    let node = scene.node(&region).unwrap();
    assert_eq!(
        node.text,
        Some(vec!["first line".to_string(), "second line".to_string()])
    );
    assert_eq!(node.text_string(), "first line\nsecond line");
}

#[test]
fn test_unchanged_text_records_nothing() {
    let (mut scene, _, region) = scene_with_region();
    scene.set_text(&region, "hello").unwrap();
    let serial = scene.history().current().unwrap().serial();
    scene.set_text(&region, "hello").unwrap();
    assert_eq!(scene.history().current().unwrap().serial(), serial);
}

#[test]
fn test_protected_region_refuses_child_text() {
    let (mut scene, _, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    scene.set_text(&l1, "original").unwrap();
    scene.set_protected(&region, true).unwrap();

    let err = scene.set_text(&l1, "changed").unwrap_err();

    assert!(err.is_read_only());
    assert_eq!(scene.node(&l1).unwrap().text_string(), "original");
    assert!(scene.delete_node(&l1).unwrap_err().is_read_only());
}

#[test]
fn test_protect_flag_locked_under_protected_ancestor() {
    let (mut scene, _, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    scene.set_protected(&region, true).unwrap();
    let err = scene.set_protected(&l1, true).unwrap_err();
    assert_eq!(err, Error::read_only(region.clone()));

    scene.set_protected(&region, false).unwrap();
    scene.set_protected(&l1, true).unwrap();
    assert!(scene.is_read_only(&l1).unwrap());
    assert!(!scene.is_read_only(&region).unwrap());
}

#[test]
fn test_delete_cascades_and_clears_selection() {
    let (mut scene, _, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    scene.select(Some(&l1)).unwrap();

    scene.delete_node(&region).unwrap();

    assert!(scene.node(&region).is_none());
    assert!(scene.node(&l1).is_none());
    assert_eq!(scene.selected(), None);
}

#[test]
fn test_root_and_cells_cannot_be_deleted() {
    let (mut scene, page, _) = scene_with_region();
    let table = scene
        .create_table(&page, rect(600.0, 100.0, 900.0, 400.0), 2, 2)
        .unwrap();
    let cell = format!("{}_1_1", table);

    let err = scene.delete_node("doc").unwrap_err();
    assert!(matches!(
        err,
        Error::Structure(StructureError::UnsupportedOperation { .. })
    ));
    let err = scene.delete_node(&cell).unwrap_err();
    assert!(matches!(
        err,
        Error::Structure(StructureError::UnsupportedOperation { .. })
    ));
    assert!(scene.node(&cell).is_some());
}

#[test]
fn test_baseline_change_regenerates_band() {
    let (mut scene, _, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    assert!(scene.node(&l1).unwrap().coords.is_derived());

    let moved = line(150.0, 350.0, 250.0);
    scene.set_baseline(&l1, moved.clone()).unwrap();

    let node = scene.node(&l1).unwrap();
    assert_eq!(node.baseline.as_deref(), Some(moved.as_slice()));
    assert_eq!(node.points(), Band::stripe(30.0, 0.25).build(&moved).as_slice());
}

#[test]
fn test_geometry_edit_detaches_band() {
    let (mut scene, _, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    scene
        .set_geometry(&l1, rect(140.0, 170.0, 360.0, 230.0))
        .unwrap();
    assert!(!scene.node(&l1).unwrap().coords.is_derived());
}

#[test]
fn test_rejected_baseline_keeps_node() {
    let (mut scene, _, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    let before = scene.node(&l1).unwrap().clone();

    let short = line(150.0, 152.0, 200.0);
    let err = scene.set_baseline(&l1, short).unwrap_err();

    assert!(err.is_geometry_error());
    assert_eq!(scene.node(&l1).unwrap(), &before);
}

#[test]
fn test_move_translates_subtree() {
    let (mut scene, _, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();

    let id = scene.move_node(&region, 10.0, 5.0, None).unwrap();

    assert_eq!(id, region);
    assert_eq!(scene.node(&region).unwrap().points()[0], Point2D::new(110.0, 105.0));
    assert_eq!(
        scene.node(&l1).unwrap().baseline.as_deref().unwrap()[0],
        Point2D::new(160.0, 205.0)
    );
}

#[test]
fn test_move_off_page_is_rejected() {
    let (mut scene, _, region) = scene_with_region();
    let before = scene.document().clone();
    let err = scene.move_node(&region, 600.0, 0.0, None).unwrap_err();
    assert!(err.is_geometry_error());
    assert_eq!(scene.document(), &before);
}

#[test]
fn test_reparent_renames_subtree_and_references() {
    let (mut scene, page, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    let l2 = scene.create_text_line(&region, line(150.0, 350.0, 300.0)).unwrap();
    let w1 = scene
        .create_node(&l1, NodeKind::Word, rect(150.0, 180.0, 200.0, 210.0))
        .unwrap();
    let g1 = scene
        .create_node(&w1, NodeKind::Glyph, rect(150.0, 180.0, 160.0, 210.0))
        .unwrap();
    let group = scene.create_group(&page, &[w1.as_str(), g1.as_str()]).unwrap();
    scene.select(Some(&w1)).unwrap();

    let new_id = scene.reparent(&w1, &l2).unwrap();

    assert_eq!(new_id, "r1_l2_w1");
    assert!(scene.node(&w1).is_none());
    assert!(scene.node("r1_l2_w1_g1").is_some());
    assert_eq!(scene.document().parent_of(&new_id).unwrap().id, l2);
    let members: Vec<&str> = scene
        .node(&group)
        .unwrap()
        .members
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(members, vec!["r1_l2_w1", "r1_l2_w1_g1"]);
    assert_eq!(scene.selected(), Some("r1_l2_w1"));
}

#[test]
fn test_reparent_into_wrong_kind_is_rejected() {
    let (mut scene, page, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    let err = scene.reparent(&l1, &page).unwrap_err();
    assert!(matches!(
        err,
        Error::Structure(StructureError::InvalidParent { .. })
    ));
}

#[test]
fn test_hit_test_prefers_deepest() {
    let (mut scene, _, region) = scene_with_region();
    let l1 = scene.create_text_line(&region, line(150.0, 350.0, 200.0)).unwrap();
    let w1 = scene
        .create_node(&l1, NodeKind::Word, rect(150.0, 180.0, 200.0, 210.0))
        .unwrap();

    let all = |_: &layoutkit_editor::Node| true;
    assert_eq!(scene.hit_test(Point2D::new(170.0, 195.0), 1.0, &all), Some(w1));
    assert_eq!(scene.hit_test(Point2D::new(300.0, 195.0), 1.0, &all), Some(l1));
    assert_eq!(
        scene.hit_test(Point2D::new(300.0, 350.0), 1.0, &all),
        Some(region)
    );
    assert_eq!(scene.hit_test(Point2D::new(800.0, 700.0), 1.0, &all), None);
}

#[test]
fn test_validate_node_reports_bad_geometry() {
    let (scene, _, region) = scene_with_region();
    assert!(scene.validate_node(&region).is_ok());
    assert!(scene.validate_node("missing").unwrap_err().is_structure_error());
}
