use layoutkit_core::{Error, Point2D, StructureError};
use layoutkit_editor::model::NodeKind;
use layoutkit_editor::scene::Scene;
use layoutkit_editor::table::{cell_id, Axis};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2D> {
    vec![
        Point2D::new(x0, y0),
        Point2D::new(x1, y0),
        Point2D::new(x1, y1),
        Point2D::new(x0, y1),
    ]
}

/// A 3x3 table `t1` on (600,100)-(900,400), every cell labelled `row,col`.
fn scene_with_table() -> (Scene, String) {
    let mut scene = Scene::default();
    let page = scene.create_page(1000.0, 800.0, None).unwrap();
    let table = scene
        .create_table(&page, rect(600.0, 100.0, 900.0, 400.0), 3, 3)
        .unwrap();
    for row in 1..=3 {
        for col in 1..=3 {
            scene
                .set_text(&cell_id(&table, row, col), &format!("{},{}", row, col))
                .unwrap();
        }
    }
    (scene, table)
}

fn cell_ids(scene: &Scene, table: &str) -> Vec<String> {
    scene
        .node(table)
        .unwrap()
        .children
        .iter()
        .map(|c| c.id.clone())
        .collect()
}

fn text(scene: &Scene, id: &str) -> String {
    scene.node(id).unwrap().text_string()
}

#[test]
fn test_create_table_subdivides_outline() {
    let (scene, table) = scene_with_table();
    assert_eq!(table, "t1");
    assert_eq!(cell_ids(&scene, &table).len(), 9);
    assert_eq!(
        scene.node("t1_2_3").unwrap().points(),
        rect(800.0, 200.0, 900.0, 300.0).as_slice()
    );
    assert!(matches!(
        scene.node("t1_2_3").unwrap().kind,
        NodeKind::TableCell { row: 2, col: 3 }
    ));
    assert!(scene.is_grid_table(&table).unwrap());
}

#[test]
fn test_delete_interior_column_renumbers_cells() {
    let (mut scene, table) = scene_with_table();
    scene.delete_col(&table, 2).unwrap();

    assert!(matches!(
        scene.node(&table).unwrap().kind,
        NodeKind::TableRegion { rows: 3, cols: 2 }
    ));
    assert_eq!(
        cell_ids(&scene, &table),
        vec!["t1_1_1", "t1_1_2", "t1_2_1", "t1_2_2", "t1_3_1", "t1_3_2"]
    );
    assert_eq!(text(&scene, "t1_1_2"), "1,3");
    assert_eq!(text(&scene, "t1_3_1"), "3,1");
    assert!(scene.node("t1_1_3").is_none());

    // the neighbours meet halfway across the removed column
    assert_eq!(
        scene.node("t1_2_1").unwrap().points(),
        rect(600.0, 200.0, 750.0, 300.0).as_slice()
    );
    assert!(scene.is_grid_table(&table).unwrap());
}

#[test]
fn test_delete_first_row_shrinks_table() {
    let (mut scene, table) = scene_with_table();
    scene.delete_row(&table, 1).unwrap();

    assert_eq!(text(&scene, "t1_1_1"), "2,1");
    assert_eq!(
        scene.node(&table).unwrap().points(),
        rect(600.0, 200.0, 900.0, 400.0).as_slice()
    );
}

#[test]
fn test_insert_row_splits_at_midline() {
    let (mut scene, table) = scene_with_table();
    scene.insert_row(&table, 2).unwrap();

    assert!(matches!(
        scene.node(&table).unwrap().kind,
        NodeKind::TableRegion { rows: 4, cols: 3 }
    ));
    assert_eq!(text(&scene, "t1_2_1"), "2,1");
    assert_eq!(text(&scene, "t1_3_1"), "");
    assert_eq!(text(&scene, "t1_4_1"), "3,1");
    assert_eq!(
        scene.node("t1_2_1").unwrap().points(),
        rect(600.0, 200.0, 700.0, 250.0).as_slice()
    );
    assert_eq!(
        scene.node("t1_3_1").unwrap().points(),
        rect(600.0, 250.0, 700.0, 300.0).as_slice()
    );
}

#[test]
fn test_insert_column_keeps_content() {
    let (mut scene, table) = scene_with_table();
    scene.insert_col(&table, 3).unwrap();
    assert_eq!(cell_ids(&scene, &table).len(), 12);
    assert_eq!(text(&scene, "t1_1_3"), "1,3");
    assert_eq!(text(&scene, "t1_1_4"), "");
}

#[test]
fn test_structure_indices_are_checked() {
    let (mut scene, table) = scene_with_table();
    for at in [0, 4] {
        let err = scene.delete_row(&table, at).unwrap_err();
        assert_eq!(
            err,
            Error::Structure(StructureError::IndexOutOfRange {
                index: at,
                count: 3
            })
        );
    }
}

#[test]
fn test_last_column_cannot_be_deleted() {
    let mut scene = Scene::default();
    let page = scene.create_page(1000.0, 800.0, None).unwrap();
    let table = scene
        .create_table(&page, rect(100.0, 100.0, 400.0, 200.0), 2, 1)
        .unwrap();
    let err = scene.delete_col(&table, 1).unwrap_err();
    assert!(matches!(
        err,
        Error::Structure(StructureError::UnsupportedOperation { .. })
    ));
    assert_eq!(cell_ids(&scene, &table).len(), 2);
}

#[test]
fn test_protected_cell_blocks_structure_change() {
    let (mut scene, table) = scene_with_table();
    scene.set_protected("t1_3_3", true).unwrap();
    let before = scene.document().clone();

    let err = scene.delete_row(&table, 1).unwrap_err();

    assert_eq!(err, Error::read_only("t1_3_3"));
    assert_eq!(scene.document(), &before);
}

#[test]
fn test_deleted_cells_leave_groups() {
    let (mut scene, table) = scene_with_table();
    let group = scene
        .create_group("page1", &["t1_1_2", "t1_1_3"])
        .unwrap();

    scene.delete_col(&table, 2).unwrap();

    let members: Vec<&str> = scene
        .node(&group)
        .unwrap()
        .members
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    // the old third column is now the second
    assert_eq!(members, vec!["t1_1_2"]);
    assert_eq!(text(&scene, "t1_1_2"), "1,3");
}

#[test]
fn test_line_drag_keeps_grid() {
    let (mut scene, table) = scene_with_table();
    let mut grid = scene.table_grid(&table).unwrap();
    grid.drag_line(Axis::Col, 1, Point2D::new(20.0, 0.0));

    scene.set_grid(&table, &grid).unwrap();

    assert_eq!(
        scene.node("t1_1_1").unwrap().points(),
        rect(600.0, 100.0, 720.0, 200.0).as_slice()
    );
    assert_eq!(
        scene.node("t1_3_2").unwrap().points(),
        rect(720.0, 300.0, 800.0, 400.0).as_slice()
    );
    assert!(scene.is_grid_table(&table).unwrap());
}

#[test]
fn test_grid_leaving_page_is_rejected() {
    let (mut scene, table) = scene_with_table();
    let before = scene.document().clone();
    let mut grid = scene.table_grid(&table).unwrap();
    grid.drag_line(Axis::Col, 3, Point2D::new(200.0, 0.0));

    assert!(scene.set_grid(&table, &grid).unwrap_err().is_geometry_error());
    assert_eq!(scene.document(), &before);
}

#[test]
fn test_misaligned_cell_is_not_a_grid() {
    let (mut scene, table) = scene_with_table();
    scene
        .set_geometry("t1_2_2", rect(710.0, 210.0, 790.0, 290.0))
        .unwrap();
    assert!(!scene.is_grid_table(&table).unwrap());
}
