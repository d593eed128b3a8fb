use layoutkit_core::{Error, Point2D, StructureError};
use layoutkit_editor::model::{NodeKind, Property};
use layoutkit_editor::scene::Scene;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2D> {
    vec![
        Point2D::new(x0, y0),
        Point2D::new(x1, y0),
        Point2D::new(x1, y1),
        Point2D::new(x0, y1),
    ]
}

/// Page `page1`, region `r1`, line `r1_l1` and words `r1_l1_w1`, `r1_l1_w2`.
fn scene_with_words() -> Scene {
    let mut scene = Scene::default();
    let page = scene.create_page(1000.0, 800.0, None).unwrap();
    let region = scene
        .create_node(&page, NodeKind::TextRegion, rect(100.0, 100.0, 500.0, 400.0))
        .unwrap();
    let line = scene
        .create_text_line(
            &region,
            vec![Point2D::new(150.0, 200.0), Point2D::new(350.0, 200.0)],
        )
        .unwrap();
    scene
        .create_node(&line, NodeKind::Word, rect(150.0, 180.0, 200.0, 210.0))
        .unwrap();
    scene
        .create_node(&line, NodeKind::Word, rect(220.0, 180.0, 300.0, 210.0))
        .unwrap();
    scene
}

fn member_ids(scene: &Scene, group: &str) -> Vec<String> {
    scene
        .get_group_members(group, false)
        .unwrap()
        .into_iter()
        .map(|n| n.id.clone())
        .collect()
}

#[test]
fn test_create_group_deduplicates_members() {
    let mut scene = scene_with_words();
    let group = scene
        .create_group("page1", &["r1_l1_w1", "r1_l1_w2", "r1_l1_w1"])
        .unwrap();
    assert_eq!(group, "grp1");
    assert_eq!(member_ids(&scene, &group), vec!["r1_l1_w1", "r1_l1_w2"]);
}

#[test]
fn test_empty_group_is_rejected() {
    let mut scene = scene_with_words();
    assert!(scene.create_group("page1", &[]).is_err());
    assert!(scene.create_group("page1", &["missing"]).is_err());
}

#[test]
fn test_recursive_members_survive_cycles() {
    let mut scene = scene_with_words();
    let inner = scene.create_group("page1", &["r1_l1_w1"]).unwrap();
    let outer = scene.create_group("page1", &[inner.as_str(), "r1_l1_w2"]).unwrap();
    scene.add_group_member(&inner, &outer, None).unwrap();

    let flat: Vec<String> = scene
        .get_group_members(&outer, true)
        .unwrap()
        .into_iter()
        .map(|n| n.id.clone())
        .collect();
    assert_eq!(flat, vec!["r1_l1_w1", "r1_l1_w2"]);
    assert_eq!(member_ids(&scene, &outer), vec![inner, "r1_l1_w2".to_string()]);
}

#[test]
fn test_group_cannot_contain_itself() {
    let mut scene = scene_with_words();
    let group = scene.create_group("page1", &["r1_l1_w1"]).unwrap();
    assert!(scene.add_group_member(&group, &group, None).is_err());
}

#[test]
fn test_not_a_group() {
    let mut scene = scene_with_words();
    let err = scene.add_group_member("r1", "r1_l1_w1", None).unwrap_err();
    assert_eq!(
        err,
        Error::Structure(StructureError::NotAGroup {
            id: "r1".to_string()
        })
    );
}

#[test]
fn test_member_confidence() {
    let mut scene = scene_with_words();
    let group = scene.create_group("page1", &["r1_l1_w1"]).unwrap();
    scene
        .set_member_confidence(&group, "r1_l1_w1", Some(0.75))
        .unwrap();
    assert_eq!(scene.node(&group).unwrap().members[0].confidence, Some(0.75));
    assert!(scene
        .set_member_confidence(&group, "r1_l1_w2", Some(0.5))
        .is_err());
}

#[test]
fn test_removing_last_member_deletes_group() {
    let mut scene = scene_with_words();
    let group = scene
        .create_group("page1", &["r1_l1_w1", "r1_l1_w2"])
        .unwrap();

    assert!(scene.remove_group_member(&group, "r1_l1_w1").unwrap());
    assert!(!scene.remove_group_member(&group, "r1_l1_w1").unwrap());
    assert!(scene.node(&group).is_some());

    assert!(scene.remove_group_member(&group, "r1_l1_w2").unwrap());
    assert!(scene.node(&group).is_none());
}

#[test]
fn test_deleting_members_removes_empty_groups() {
    let mut scene = scene_with_words();
    let inner = scene.create_group("page1", &["r1_l1_w1"]).unwrap();
    let outer = scene.create_group("page1", &[inner.as_str()]).unwrap();
    let other = scene
        .create_group("page1", &["r1_l1_w1", "r1_l1_w2"])
        .unwrap();

    scene.delete_node("r1_l1_w1").unwrap();

    assert!(scene.node(&inner).is_none());
    assert!(scene.node(&outer).is_none());
    assert_eq!(member_ids(&scene, &other), vec!["r1_l1_w2"]);
}

#[test]
fn test_break_pair_is_cleared_with_partner() {
    let mut scene = scene_with_words();
    scene.set_break_pair("r1_l1_w1", "r1_l1_w2").unwrap();
    assert_eq!(
        scene.node("r1_l1_w1").unwrap().break_pair.as_deref(),
        Some("r1_l1_w2")
    );
    assert_eq!(
        scene.node("r1_l1_w2").unwrap().break_pair.as_deref(),
        Some("r1_l1_w1")
    );

    scene.delete_node("r1_l1_w2").unwrap();
    assert_eq!(scene.node("r1_l1_w1").unwrap().break_pair, None);
}

#[test]
fn test_break_pair_only_between_words() {
    let mut scene = scene_with_words();
    assert!(scene.set_break_pair("r1_l1_w1", "r1_l1").is_err());
    assert!(scene.set_break_pair("r1_l1_w1", "r1_l1_w1").is_err());
    assert!(!scene.clear_break_pair("r1_l1_w1").unwrap());
}

#[test]
fn test_uniq_property_replaces_key() {
    let mut scene = scene_with_words();
    scene
        .set_property("r1", Property::new("type", "heading"), false)
        .unwrap();
    scene
        .set_property("r1", Property::new("type", "caption"), false)
        .unwrap();
    assert_eq!(scene.properties("r1", "type").unwrap().len(), 2);

    scene
        .set_property("r1", Property::new("type", "paragraph"), true)
        .unwrap();
    let values: Vec<&str> = scene
        .properties("r1", "type")
        .unwrap()
        .into_iter()
        .map(|p| p.value.as_str())
        .collect();
    assert_eq!(values, vec!["paragraph"]);
}

#[test]
fn test_identical_property_updates_in_place() {
    let mut scene = scene_with_words();
    scene
        .set_property("r1", Property::new("lang", "en"), false)
        .unwrap();
    let mut rated = Property::new("lang", "en");
    rated.confidence = Some(0.9);
    scene.set_property("r1", rated, false).unwrap();

    let found = scene.properties("r1", "lang").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].confidence, Some(0.9));
}

#[test]
fn test_toggle_and_delete_property() {
    let mut scene = scene_with_words();
    assert!(scene.toggle_property("r1", "flag", "checked").unwrap());
    assert!(!scene.toggle_property("r1", "flag", "checked").unwrap());
    assert!(scene.properties("r1", "flag").unwrap().is_empty());

    scene.set_property("r1", Property::new("k", "a"), false).unwrap();
    scene.set_property("r1", Property::new("k", "b"), false).unwrap();
    assert!(scene.delete_property("r1", "k", Some("a")).unwrap());
    assert_eq!(scene.properties("r1", "k").unwrap().len(), 1);
    assert!(scene.delete_property("r1", "k", None).unwrap());
    assert!(!scene.delete_property("r1", "k", None).unwrap());
}
