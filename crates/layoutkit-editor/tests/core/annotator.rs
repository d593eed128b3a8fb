use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use layoutkit_core::{Error, IoFailure, Point2D, StructureError};
use layoutkit_editor::io::{DocumentCodec, ImageInfo, ImageProvider, SizeMismatch};
use layoutkit_editor::model::NodeKind;
use layoutkit_editor::modes::{Behavior, EditKey, InputEvent};
use layoutkit_editor::scene::Scene;
use layoutkit_editor::{Annotator, EditMode, JsonCodec};

/// Image provider answering from a fixed table of sizes.
struct FixedImages(HashMap<String, ImageInfo>);

impl ImageProvider for FixedImages {
    fn resolve(&self, source: &str, frame: usize) -> Result<ImageInfo, IoFailure> {
        self.0.get(source).copied().ok_or_else(|| IoFailure::Image {
            path: source.to_string(),
            frame,
            reason: "not found".to_string(),
        })
    }
}

/// Two pages: 1000x800 backed by `a.png` and 800x600 backed by `b.png`.
fn two_page_json() -> String {
    let mut scene = Scene::default();
    scene
        .create_page(1000.0, 800.0, Some("a.png".to_string()))
        .unwrap();
    scene
        .create_page(800.0, 600.0, Some("b.png".to_string()))
        .unwrap();
    JsonCodec::new().serialize(scene.document()).unwrap()
}

/// One page with region `r1` on (100,100)-(500,400) holding line `r1_l1`
/// along y=200.
fn one_line_json() -> String {
    let mut scene = Scene::default();
    let page = scene.create_page(1000.0, 800.0, None).unwrap();
    let region = scene
        .create_node(
            &page,
            NodeKind::TextRegion,
            vec![
                Point2D::new(100.0, 100.0),
                Point2D::new(500.0, 100.0),
                Point2D::new(500.0, 400.0),
                Point2D::new(100.0, 400.0),
            ],
        )
        .unwrap();
    scene
        .create_text_line(
            &region,
            vec![Point2D::new(150.0, 200.0), Point2D::new(350.0, 200.0)],
        )
        .unwrap();
    JsonCodec::new().serialize(scene.document()).unwrap()
}

fn drag_start(x: f64, y: f64, time_ms: u64) -> Vec<InputEvent> {
    let pos = Point2D::new(x, y);
    vec![
        InputEvent::PointerDown { pos, time_ms },
        InputEvent::PointerMove {
            pos: Point2D::new(x + 20.0, y),
            time_ms: time_ms + 10,
        },
    ]
}

fn images(entries: &[(&str, u32, u32)]) -> FixedImages {
    FixedImages(
        entries
            .iter()
            .map(|(name, width, height)| {
                (
                    name.to_string(),
                    ImageInfo {
                        width: *width,
                        height: *height,
                    },
                )
            })
            .collect(),
    )
}

#[test]
fn test_busy_guard_during_load() {
    let mut annotator = Annotator::default();
    annotator.load_from_str(&two_page_json()).unwrap();

    annotator.begin_load().unwrap();
    assert!(annotator.is_loading());
    assert!(annotator.goto_page(1).unwrap_err().is_busy());
    assert!(annotator.begin_load().unwrap_err().is_busy());
    let err = annotator
        .save_document(Some(Path::new("/nonexistent/doc.json")))
        .unwrap_err();
    assert_eq!(
        err,
        Error::Busy {
            operation: "save the document".to_string(),
            activity: "load".to_string(),
        }
    );

    let failure = IoFailure::Read {
        path: "doc.json".to_string(),
        reason: "gone".to_string(),
    };
    assert!(annotator.complete_load(None, Err(failure)).is_err());
    assert!(!annotator.is_loading());
    assert_eq!(annotator.page_count(), 2);
    annotator.goto_page(1).unwrap();
}

#[test]
fn test_busy_guard_during_save() {
    let mut annotator = Annotator::default();
    annotator.load_from_str(&two_page_json()).unwrap();

    let contents = annotator.begin_save().unwrap();
    assert!(contents.contains("\"version\""));
    assert!(annotator.is_saving());
    assert!(annotator.load_from_str(&two_page_json()).unwrap_err().is_busy());
    assert!(!annotator.is_loading());

    let failure = IoFailure::Write {
        path: "doc.json".to_string(),
        reason: "disk full".to_string(),
    };
    let err = annotator
        .complete_save(Path::new("doc.json"), Err(failure))
        .unwrap_err();
    assert!(matches!(err, Error::Io(IoFailure::Write { .. })));
    assert!(!annotator.is_saving());
    assert_eq!(annotator.path(), None);
}

#[test]
fn test_save_without_path_is_an_error() {
    let mut annotator = Annotator::default();
    assert!(annotator.save_document(None).is_err());
    assert!(!annotator.is_saving());
}

#[test]
fn test_goto_page_checks_range() {
    let mut annotator = Annotator::default();
    annotator.load_from_str(&two_page_json()).unwrap();
    assert_eq!(annotator.current_page().unwrap().id, "page1");

    let err = annotator.goto_page(2).unwrap_err();
    assert_eq!(
        err,
        Error::Structure(StructureError::IndexOutOfRange { index: 2, count: 2 })
    );

    annotator.goto_page(1).unwrap();
    assert_eq!(annotator.current_page_index(), 1);
    assert_eq!(annotator.current_page().unwrap().id, "page2");
}

#[test]
fn test_page_image_barrier() {
    let mut annotator = Annotator::default();
    annotator.load_from_str(&two_page_json()).unwrap();
    annotator.begin_page_images(2);

    let first = ImageInfo {
        width: 1000,
        height: 800,
    };
    assert!(!annotator.page_image_loaded(0, Ok(first)).unwrap());
    // reporting the same page again does not complete the barrier
    assert!(!annotator.page_image_loaded(0, Ok(first)).unwrap());
    assert!(!annotator.is_layout_ready());

    let failure = IoFailure::Image {
        path: "b.png".to_string(),
        frame: 0,
        reason: "decode error".to_string(),
    };
    assert!(annotator.page_image_loaded(1, Err(failure)).is_err());
    assert!(annotator.is_layout_ready());
    assert_eq!(annotator.scene().viewport().content_size(), (1000.0, 1400.0));

    assert!(annotator
        .page_image_loaded(5, Ok(first))
        .unwrap_err()
        .is_structure_error());
}

#[test]
fn test_goto_page_scrolls_once_laid_out() {
    let mut annotator = Annotator::default()
        .with_image_provider(images(&[("a.png", 1000, 800), ("b.png", 800, 600)]));
    annotator.load_from_str(&two_page_json()).unwrap();

    annotator.load_page_images().unwrap();
    assert!(annotator.is_layout_ready());

    annotator.goto_page(1).unwrap();
    assert_eq!(annotator.scene().viewport().view().y, 800.0);
    annotator.goto_page(0).unwrap();
    assert_eq!(annotator.scene().viewport().view().y, 0.0);
}

#[test]
fn test_size_mismatch_goes_through_policy() {
    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reported);
    let mut annotator = Annotator::default()
        .with_image_provider(images(&[("a.png", 1000, 800), ("b.png", 400, 300)]))
        .with_size_policy(Box::new(move |mismatch: &SizeMismatch| {
            sink.borrow_mut().push(mismatch.page.clone());
            false
        }));
    annotator.load_from_str(&two_page_json()).unwrap();

    annotator.load_page_images().unwrap();

    assert_eq!(*reported.borrow(), vec!["page2".to_string()]);
    // the declared size wins
    assert_eq!(annotator.scene().viewport().content_size(), (1000.0, 1400.0));
}

#[test]
fn test_missing_image_still_completes_layout() {
    let mut annotator =
        Annotator::default().with_image_provider(images(&[("a.png", 1000, 800)]));
    annotator.load_from_str(&two_page_json()).unwrap();

    let err = annotator.load_page_images().unwrap_err();

    assert!(matches!(err, Error::Io(IoFailure::Image { .. })));
    assert!(annotator.is_layout_ready());
}

#[test]
fn test_load_resets_mode_target_page() {
    let mut annotator = Annotator::default();
    annotator.activate(EditMode::CreateRegion);
    annotator.load_from_str(&two_page_json()).unwrap();

    assert_eq!(annotator.session().mode(), Some(EditMode::CreateRegion));
    assert!(!annotator.has_unsaved_changes());
    assert!(!annotator.scene().can_undo());
}

#[test]
fn test_save_commits_typed_text() {
    let mut annotator = Annotator::default();
    annotator.load_from_str(&one_line_json()).unwrap();
    annotator.activate(EditMode::LineEdit);
    annotator
        .dispatch(&InputEvent::Click {
            pos: Point2D::new(300.0, 205.0),
            time_ms: 0,
            additive: false,
        })
        .unwrap();
    annotator
        .dispatch(&InputEvent::TextInput("Typed words".to_string()))
        .unwrap();

    let contents = annotator.begin_save().unwrap();

    assert!(contents.contains("Typed words"));
    assert!(annotator.is_saving());
    assert_eq!(
        annotator.scene().node("r1_l1").unwrap().text_string(),
        "Typed words"
    );
    assert_eq!(annotator.scene().selected(), Some("r1_l1"));
}

#[test]
fn test_save_leaves_out_unfinished_drag() {
    let mut annotator = Annotator::default();
    annotator.load_from_str(&one_line_json()).unwrap();
    annotator.activate(EditMode::RegionEdit);
    annotator
        .dispatch(&InputEvent::Click {
            pos: Point2D::new(450.0, 350.0),
            time_ms: 0,
            additive: false,
        })
        .unwrap();
    for event in drag_start(450.0, 350.0, 10) {
        annotator.dispatch(&event).unwrap();
    }
    assert_eq!(
        annotator.scene().node("r1").unwrap().points()[0],
        Point2D::new(120.0, 100.0)
    );

    let contents = annotator.begin_save().unwrap();

    let saved = JsonCodec::new().parse(&contents).unwrap();
    assert_eq!(
        saved.node("r1").unwrap().points()[0],
        Point2D::new(100.0, 100.0)
    );
}

#[test]
fn test_undo_abandons_text_being_typed() {
    let mut annotator = Annotator::default();
    annotator.load_from_str(&one_line_json()).unwrap();
    annotator.activate(EditMode::LineEdit);
    let click = InputEvent::Click {
        pos: Point2D::new(300.0, 205.0),
        time_ms: 0,
        additive: false,
    };
    annotator.dispatch(&click).unwrap();
    annotator
        .dispatch(&InputEvent::TextInput("kept".to_string()))
        .unwrap();
    annotator.dispatch(&InputEvent::Key(EditKey::Finish)).unwrap();
    annotator
        .dispatch(&InputEvent::TextInput("abandoned".to_string()))
        .unwrap();

    assert!(annotator.undo());
    assert_eq!(annotator.scene().node("r1_l1").unwrap().text_string(), "");
    assert_eq!(annotator.scene().selected(), None);

    assert!(annotator.redo());
    assert_eq!(annotator.scene().node("r1_l1").unwrap().text_string(), "kept");
    assert_eq!(annotator.scene().selected(), Some("r1_l1"));
    assert!(annotator.session().behavior().unwrap().pending().is_none());
}
