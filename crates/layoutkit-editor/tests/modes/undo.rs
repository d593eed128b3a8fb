use layoutkit_core::shared;
use layoutkit_editor::modes::{Behavior, EditKey, EditMode, Handled};

use crate::common::{click, fixture, key, session, typed};

#[test]
fn test_undo_releases_bound_text_buffer() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::LineEdit);
    session.dispatch(&mut scene, &click(300.0, 205.0, 0)).unwrap();
    session.dispatch(&mut scene, &typed("A")).unwrap();
    session.dispatch(&mut scene, &click(300.0, 305.0, 1)).unwrap();
    assert_eq!(scene.node("r1_l1").unwrap().text_string(), "A");
    assert_eq!(scene.selected(), Some("r1_l2"));

    assert!(session.undo(&mut scene));
    assert_eq!(scene.node("r1_l1").unwrap().text_string(), "");
    assert_eq!(scene.selected(), None);

    // nothing is bound any more, so typing goes nowhere
    let handled = session.dispatch(&mut scene, &typed("B")).unwrap();
    assert_eq!(handled, Handled::Ignored);
    session.dispatch(&mut scene, &key(EditKey::Finish)).unwrap();
    assert_eq!(scene.node("r1_l1").unwrap().text_string(), "");
    assert_eq!(scene.node("r1_l2").unwrap().text_string(), "");
}

#[test]
fn test_redo_rebinds_restored_selection() {
    let mut scene = fixture();
    let selected = shared(Vec::new());
    let sink = selected.clone();
    let mut session = session(&mut scene, EditMode::LineEdit);
    session.hooks_mut().on_select = Some(Box::new(move |id: &str| {
        sink.borrow_mut().push(id.to_string())
    }));
    session.dispatch(&mut scene, &click(300.0, 205.0, 0)).unwrap();
    session.dispatch(&mut scene, &typed("A")).unwrap();
    session.dispatch(&mut scene, &click(300.0, 305.0, 1)).unwrap();
    assert!(session.undo(&mut scene));
    selected.borrow_mut().clear();

    assert!(session.redo(&mut scene));
    assert_eq!(scene.selected(), Some("r1_l1"));
    assert_eq!(*selected.borrow(), vec!["r1_l1".to_string()]);

    session.dispatch(&mut scene, &typed("C")).unwrap();
    session.dispatch(&mut scene, &key(EditKey::Finish)).unwrap();
    assert_eq!(scene.node("r1_l1").unwrap().text_string(), "C");
    assert_eq!(scene.node("r1_l2").unwrap().text_string(), "");
}

#[test]
fn test_undo_drops_uncommitted_text() {
    let mut scene = fixture();
    let mut session = session(&mut scene, EditMode::LineEdit);
    session.dispatch(&mut scene, &click(300.0, 205.0, 0)).unwrap();
    session.dispatch(&mut scene, &typed("one")).unwrap();
    session.dispatch(&mut scene, &key(EditKey::Finish)).unwrap();
    session.dispatch(&mut scene, &typed("two")).unwrap();

    assert!(session.undo(&mut scene));
    assert_eq!(scene.node("r1_l1").unwrap().text_string(), "");

    assert!(session.redo(&mut scene));
    assert_eq!(scene.node("r1_l1").unwrap().text_string(), "one");
    assert_eq!(scene.selected(), Some("r1_l1"));
    assert!(session.behavior().unwrap().pending().is_none());
}

#[test]
fn test_restored_selection_outside_mode_is_dropped() {
    let mut scene = fixture();
    scene.select(Some("r1_l1")).unwrap();
    scene.set_protected("r1_l2", true).unwrap();
    scene.set_text("r1", "heading").unwrap();
    let mut session = session(&mut scene, EditMode::RegionEdit);

    assert!(session.undo(&mut scene));
    assert_eq!(scene.node("r1").unwrap().text_string(), "");
    // region editing cannot hold a text line
    assert_eq!(scene.selected(), None);
}
