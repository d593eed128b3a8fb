use layoutkit_core::{shared, Point2D};
use layoutkit_editor::model::NodeKind;
use layoutkit_editor::modes::{EditKey, EditMode, EditSession, Handled, Unwound};

use crate::common::{add_click, click, down, fixture, key, move_to, rect, session, up};

#[test]
fn test_activation_replaces_mode_and_releases_selection() {
    let mut scene = fixture();
    let events = shared(Vec::new());
    let mut session = EditSession::default();
    {
        let log = events.clone();
        session.hooks_mut().on_select = Some(Box::new(move |id: &str| {
            log.borrow_mut().push(format!("select {}", id))
        }));
        let log = events.clone();
        session.hooks_mut().on_unselect = Some(Box::new(move |id: &str| {
            log.borrow_mut().push(format!("unselect {}", id))
        }));
        let log = events.clone();
        session.hooks_mut().on_mode_off = Some(Box::new(move |name: &str| {
            log.borrow_mut().push(format!("off {}", name))
        }));
    }

    session.activate(&mut scene, EditMode::RegionEdit);
    session.dispatch(&mut scene, &click(300.0, 350.0, 0)).unwrap();
    session.activate(&mut scene, EditMode::LineEdit);

    assert_eq!(session.mode(), Some(EditMode::LineEdit));
    assert_eq!(scene.selected(), None);
    assert_eq!(
        *events.borrow(),
        vec![
            "select r1".to_string(),
            "unselect r1".to_string(),
            "off region edit".to_string(),
        ]
    );

    session.deactivate(&mut scene);
    assert_eq!(session.mode(), None);
    assert_eq!(
        session.dispatch(&mut scene, &click(300.0, 350.0, 1)).unwrap(),
        Handled::Ignored
    );
}

#[test]
fn test_select_mode_prefers_deepest() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::Select);

    session.dispatch(&mut scene, &click(175.0, 195.0, 0)).unwrap();
    assert_eq!(scene.selected(), Some("r1_l1_w1"));
    session.dispatch(&mut scene, &click(300.0, 205.0, 1)).unwrap();
    assert_eq!(scene.selected(), Some("r1_l1"));
    session.dispatch(&mut scene, &click(900.0, 700.0, 2)).unwrap();
    assert_eq!(scene.selected(), None);
}

#[test]
fn test_mode_filters_selectable_kinds() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::RegionEdit);
    // the word sits inside the region; only the region is pickable here
    session.dispatch(&mut scene, &click(175.0, 195.0, 0)).unwrap();
    assert_eq!(scene.selected(), Some("r1"));
}

#[test]
fn test_delete_key_removes_selection() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::WordEdit);
    session.dispatch(&mut scene, &click(175.0, 195.0, 0)).unwrap();

    session
        .dispatch(&mut scene, &key(EditKey::DeleteSelected))
        .unwrap();

    assert!(scene.node("r1_l1_w1").is_none());
    assert_eq!(scene.selected(), None);
    assert_eq!(
        session
            .dispatch(&mut scene, &key(EditKey::DeleteSelected))
            .unwrap(),
        Handled::Ignored
    );
}

#[test]
fn test_delete_key_refuses_protected_node() {
    let mut scene = fixture();
    scene.set_protected("r1_l1_w1", true).unwrap();
    let mut session = session(&mut scene, EditMode::WordEdit);
    session.dispatch(&mut scene, &click(175.0, 195.0, 0)).unwrap();

    let err = session
        .dispatch(&mut scene, &key(EditKey::DeleteSelected))
        .unwrap_err();

    assert!(err.is_read_only());
    assert_eq!(scene.selected(), Some("r1_l1_w1"));
}

#[test]
fn test_group_mode_collects_and_groups() {
    let mut scene = fixture();
    scene
        .create_node("r1_l1", NodeKind::Word, rect(220.0, 180.0, 300.0, 210.0))
        .unwrap();
    let mut session = session(&mut scene, EditMode::GroupEdit);

    session.dispatch(&mut scene, &add_click(175.0, 195.0, 0)).unwrap();
    session.dispatch(&mut scene, &add_click(250.0, 195.0, 1)).unwrap();
    session.dispatch(&mut scene, &key(EditKey::Finish)).unwrap();

    let members: Vec<String> = scene
        .get_group_members("grp1", false)
        .unwrap()
        .into_iter()
        .map(|n| n.id.clone())
        .collect();
    assert_eq!(members, vec!["r1_l1_w1", "r1_l1_w2"]);
    assert_eq!(scene.selected(), Some("grp1"));
}

#[test]
fn test_escape_unwinds_one_construct_at_a_time() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::GroupEdit);
    session.dispatch(&mut scene, &click(300.0, 205.0, 0)).unwrap();
    session.dispatch(&mut scene, &add_click(175.0, 195.0, 1)).unwrap();
    session.dispatch(&mut scene, &add_click(300.0, 305.0, 2)).unwrap();

    assert_eq!(session.escape(&mut scene), Unwound::MultiSelection);
    assert_eq!(scene.selected(), Some("r1_l1"));
    assert_eq!(session.escape(&mut scene), Unwound::Selection);
    assert_eq!(session.escape(&mut scene), Unwound::Nothing);
    // nothing was grouped
    assert!(scene.node("grp1").is_none());
}

#[test]
fn test_table_mode_drags_grid_line() {
    let mut scene = fixture();
    scene
        .create_table("page1", rect(600.0, 100.0, 900.0, 400.0), 3, 3)
        .unwrap();
    let mut session = session(&mut scene, EditMode::TableEdit);
    session.dispatch(&mut scene, &click(650.0, 150.0, 0)).unwrap();
    assert_eq!(scene.selected(), Some("t1_1_1"));

    // the handle of the first interior column line sits at its midpoint
    session.dispatch(&mut scene, &down(700.0, 250.0, 10)).unwrap();
    session.dispatch(&mut scene, &move_to(730.0, 250.0, 20)).unwrap();
    session.dispatch(&mut scene, &up(730.0, 250.0, 30)).unwrap();

    assert_eq!(
        scene.node("t1_2_1").unwrap().points(),
        rect(600.0, 200.0, 730.0, 300.0).as_slice()
    );
    assert_eq!(scene.node("t1_2_2").unwrap().points()[0], Point2D::new(730.0, 200.0));
    assert!(scene.is_grid_table("t1").unwrap());
}

#[test]
fn test_table_mode_edits_cells_of_irregular_tables() {
    let mut scene = fixture();
    scene
        .create_table("page1", rect(600.0, 100.0, 900.0, 400.0), 3, 3)
        .unwrap();
    scene
        .set_geometry("t1_3_3", rect(810.0, 310.0, 890.0, 390.0))
        .unwrap();
    let mut session = session(&mut scene, EditMode::TableEdit);
    session.dispatch(&mut scene, &click(850.0, 350.0, 0)).unwrap();

    session.dispatch(&mut scene, &down(890.0, 390.0, 10)).unwrap();
    session.dispatch(&mut scene, &move_to(895.0, 395.0, 20)).unwrap();
    session.dispatch(&mut scene, &up(895.0, 395.0, 30)).unwrap();

    assert_eq!(scene.node("t1_3_3").unwrap().points()[2], Point2D::new(895.0, 395.0));
    assert_eq!(scene.node("t1_2_2").unwrap().points()[2], Point2D::new(800.0, 300.0));
}

#[test]
fn test_undo_through_mode_change() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::CreateRegion);
    for (i, (x, y)) in [(600.0, 100.0), (900.0, 100.0), (900.0, 300.0)]
        .into_iter()
        .enumerate()
    {
        session.dispatch(&mut scene, &click(x, y, i as u64)).unwrap();
    }
    session.dispatch(&mut scene, &key(EditKey::Finish)).unwrap();
    assert!(scene.node("r2").is_some());

    session.activate(&mut scene, EditMode::Select);
    assert!(scene.undo());
    assert!(scene.node("r2").is_none());
}
