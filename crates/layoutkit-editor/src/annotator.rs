//! The engine entry point used by application shells.
//!
//! An [`Annotator`] owns the scene, the edit session and the collaborators
//! that read documents and page images. Loads and saves may complete
//! asynchronously in the shell: `begin_*` raises a guard flag and the
//! matching `complete_*` lowers it. While a flag is raised, page navigation
//! and further loads or saves are rejected with [`Error::Busy`].

use std::path::{Path, PathBuf};

use layoutkit_core::{Error, IoFailure, Result, StructureError};
use layoutkit_settings::Config;

use crate::io::{
    warn_always, DocumentCodec, FileImageProvider, FsPersistence, ImageInfo, ImageProvider,
    Persistence, SizeMismatch, SizeMismatchPolicy,
};
use crate::model::{Document, Node, NodeKind};
use crate::modes::{EditMode, EditSession, Handled, InputEvent, Unwound};
use crate::scene::Scene;
use crate::serialization::JsonCodec;

/// Join barrier over the page images of the open document.
#[derive(Debug, Clone, Default)]
struct PageImages {
    expected: usize,
    reported: Vec<bool>,
    failed: usize,
}

impl PageImages {
    fn new(expected: usize) -> Self {
        Self {
            expected,
            reported: vec![false; expected],
            failed: 0,
        }
    }

    fn done(&self) -> usize {
        self.reported.iter().filter(|r| **r).count()
    }

    fn is_complete(&self) -> bool {
        self.done() == self.expected
    }
}

/// Scene, edit session and collaborators behind one API.
pub struct Annotator {
    scene: Scene,
    session: EditSession,
    codec: Box<dyn DocumentCodec>,
    persistence: Box<dyn Persistence>,
    images: Box<dyn ImageProvider>,
    size_policy: SizeMismatchPolicy,
    path: Option<PathBuf>,
    loading: bool,
    saving: bool,
    current_page: usize,
    page_images: PageImages,
    layout_ready: bool,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Annotator {
    /// An annotator with an empty document and the file-system collaborators.
    pub fn new(config: &Config) -> Self {
        Self {
            scene: Scene::new(config),
            session: EditSession::new(config.editing.drag_grace_ms),
            codec: Box::new(JsonCodec::new().with_rect_tolerance(config.editing.rect_tolerance)),
            persistence: Box::new(FsPersistence),
            images: Box::new(FileImageProvider::default()),
            size_policy: warn_always(),
            path: None,
            loading: false,
            saving: false,
            current_page: 0,
            page_images: PageImages::default(),
            layout_ready: false,
        }
    }

    pub fn with_codec(mut self, codec: impl DocumentCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn with_persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    pub fn with_image_provider(mut self, images: impl ImageProvider + 'static) -> Self {
        self.images = Box::new(images);
        self
    }

    /// Installs the callback deciding whether a page size mismatch is logged.
    pub fn with_size_policy(mut self, policy: SizeMismatchPolicy) -> Self {
        self.size_policy = policy;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// The open document.
    pub fn get_document(&self) -> &Document {
        self.scene.document()
    }

    /// Where the document was last loaded from or saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.scene.has_unsaved_changes()
    }

    fn ensure_idle(&self, operation: &str) -> Result<()> {
        let activity = if self.loading {
            "load"
        } else if self.saving {
            "save"
        } else {
            return Ok(());
        };
        tracing::warn!("Rejected {} during document {}", operation, activity);
        Err(Error::Busy {
            operation: operation.to_string(),
            activity: activity.to_string(),
        })
    }

    /// Reads, parses and installs the document at `path`.
    pub fn load_document(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.begin_load()?;
        let contents = self.persistence.load(path);
        self.complete_load(Some(path.to_path_buf()), contents)
    }

    /// Raises the load guard.
    pub fn begin_load(&mut self) -> Result<()> {
        self.ensure_idle("load a document")?;
        self.loading = true;
        tracing::debug!("Document load started");
        Ok(())
    }

    /// Lowers the load guard and installs the document when `contents` is
    /// readable and parses. On failure the open document stays untouched.
    pub fn complete_load(
        &mut self,
        path: Option<PathBuf>,
        contents: std::result::Result<String, IoFailure>,
    ) -> Result<()> {
        self.loading = false;
        let document = self.codec.parse(&contents?)?;
        self.install(document);
        if let Some(path) = &path {
            tracing::info!("Loaded {}", path.display());
        }
        self.path = path;
        Ok(())
    }

    /// Parses `contents` directly, without persistence.
    pub fn load_from_str(&mut self, contents: &str) -> Result<()> {
        self.begin_load()?;
        self.complete_load(None, Ok(contents.to_string()))
    }

    fn install(&mut self, document: Document) {
        let mode = self.session.mode();
        self.session.deactivate(&mut self.scene);
        self.scene.load(document);
        self.current_page = 0;
        self.page_images = PageImages::default();
        self.layout_ready = false;
        let first = self.page_id(0);
        self.session.set_page(first);
        if let Some(mode) = mode {
            self.session.activate(&mut self.scene, mode);
        }
    }

    /// Serializes the document and writes it to `path`, or to the path it
    /// was loaded from. Returns the path written.
    pub fn save_document(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.path.clone())
            .ok_or_else(|| Error::other("No path to save the document to"))?;
        let contents = self.begin_save()?;
        let written = self.persistence.save(&target, &contents);
        self.complete_save(&target, written)?;
        Ok(target)
    }

    /// Raises the save guard and returns the serialized document.
    pub fn begin_save(&mut self) -> Result<String> {
        self.ensure_idle("save the document")?;
        if let Err(err) = self.session.commit_pending(&mut self.scene) {
            tracing::warn!("Saving without the pending edit: {}", err);
        }
        // the last committed state; live previews of unfinished gestures are left out
        let document = match self.scene.history().current() {
            Some(entry) => &entry.document,
            None => self.scene.document(),
        };
        let contents = self.codec.serialize(document)?;
        self.saving = true;
        tracing::debug!("Document save started ({} bytes)", contents.len());
        Ok(contents)
    }

    /// Lowers the save guard; a successful write marks the document saved.
    pub fn complete_save(
        &mut self,
        path: &Path,
        written: std::result::Result<(), IoFailure>,
    ) -> Result<()> {
        self.saving = false;
        written?;
        self.scene.mark_saved();
        self.path = Some(path.to_path_buf());
        tracing::info!("Saved {}", path.display());
        Ok(())
    }

    fn page_id(&self, index: usize) -> Option<String> {
        self.scene.document().pages().nth(index).map(|p| p.id.clone())
    }

    pub fn page_count(&self) -> usize {
        self.scene.document().pages().count()
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    pub fn current_page(&self) -> Option<&Node> {
        self.scene.document().pages().nth(self.current_page)
    }

    /// Makes page `index` the target of create modes and scrolls to it once
    /// the pages are laid out.
    pub fn goto_page(&mut self, index: usize) -> Result<()> {
        self.ensure_idle("change page")?;
        let count = self.page_count();
        let Some(id) = self.page_id(index) else {
            return Err(StructureError::IndexOutOfRange { index, count }.into());
        };
        self.current_page = index;
        self.session.set_page(Some(id.clone()));
        if let Some(mode) = self.session.mode() {
            self.session.activate(&mut self.scene, mode);
        }
        if self.layout_ready {
            let offset: f64 = self
                .scene
                .document()
                .pages()
                .take(index)
                .map(page_size)
                .map(|(_, h)| h)
                .sum();
            self.scene.viewport_mut().pan_to(0.0, offset);
        }
        tracing::debug!("Now on page {} ({})", index + 1, id);
        Ok(())
    }

    /// Starts waiting for `count` page images. The layout is ready once each
    /// of them has reported through [`page_image_loaded`](Self::page_image_loaded).
    pub fn begin_page_images(&mut self, count: usize) {
        self.page_images = PageImages::new(count);
        self.layout_ready = false;
        if count == 0 {
            self.finish_layout();
        }
    }

    /// Records the outcome of loading page image `index` and returns whether
    /// the layout is now ready. A failed image still counts towards the
    /// barrier; the page keeps its declared size and the failure is returned.
    pub fn page_image_loaded(
        &mut self,
        index: usize,
        result: std::result::Result<ImageInfo, IoFailure>,
    ) -> Result<bool> {
        let expected = self.page_images.expected;
        let Some(slot) = self.page_images.reported.get_mut(index) else {
            return Err(StructureError::IndexOutOfRange {
                index,
                count: expected,
            }
            .into());
        };
        if std::mem::replace(slot, true) {
            tracing::debug!("Page image {} reported twice", index);
            return Ok(self.layout_ready);
        }
        let outcome = match result {
            Ok(info) => {
                self.check_size(index, info);
                Ok(())
            }
            Err(err) => {
                self.page_images.failed += 1;
                tracing::warn!("Page image {} failed to load: {}", index, err);
                Err(err)
            }
        };
        if self.page_images.is_complete() {
            self.finish_layout();
        }
        outcome?;
        Ok(self.layout_ready)
    }

    /// Resolves every page image through the image provider in turn.
    pub fn load_page_images(&mut self) -> Result<()> {
        let sources: Vec<Option<(String, usize)>> = self
            .scene
            .document()
            .pages()
            .map(|page| match &page.kind {
                NodeKind::Page {
                    image: Some(image),
                    frame,
                    ..
                } => Some((image.clone(), *frame)),
                _ => None,
            })
            .collect();
        self.begin_page_images(sources.len());
        let mut first_error = None;
        for (index, source) in sources.into_iter().enumerate() {
            let result = match source {
                Some((image, frame)) => self.images.resolve(&image, frame),
                None => Ok(self.declared_size(index)),
            };
            if let Err(err) = self.page_image_loaded(index, result) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn declared_size(&self, index: usize) -> ImageInfo {
        let (width, height) = self
            .scene
            .document()
            .pages()
            .nth(index)
            .map(page_size)
            .unwrap_or_default();
        ImageInfo {
            width: width.round() as u32,
            height: height.round() as u32,
        }
    }

    fn check_size(&mut self, index: usize, info: ImageInfo) {
        let Some(page) = self.scene.document().pages().nth(index) else {
            return;
        };
        if let Some(mismatch) = SizeMismatch::check(&page.id, page_size(page), info) {
            if (self.size_policy)(&mismatch) {
                tracing::warn!(
                    "Page {} declares {}x{} but its image is {}x{}",
                    mismatch.page,
                    mismatch.declared.0,
                    mismatch.declared.1,
                    mismatch.actual.width,
                    mismatch.actual.height
                );
            }
        }
    }

    fn finish_layout(&mut self) {
        let (width, height) = self
            .scene
            .document()
            .pages()
            .map(page_size)
            .fold((0.0_f64, 0.0_f64), |(w, h), (pw, ph)| (w.max(pw), h + ph));
        self.scene.viewport_mut().set_content_size(width, height);
        self.layout_ready = true;
        tracing::info!(
            "Layout ready: {} pages, {}x{} ({} image failures)",
            self.page_images.expected,
            width,
            height,
            self.page_images.failed
        );
    }

    pub fn is_layout_ready(&self) -> bool {
        self.layout_ready
    }

    /// Switches the active edit mode.
    pub fn activate(&mut self, mode: EditMode) {
        self.session.activate(&mut self.scene, mode);
    }

    /// Leaves the annotator without an active mode.
    pub fn deactivate(&mut self) {
        self.session.deactivate(&mut self.scene);
    }

    /// Routes a pointer or keyboard event into the active mode.
    pub fn dispatch(&mut self, event: &InputEvent) -> Result<Handled> {
        self.session.dispatch(&mut self.scene, event)
    }

    /// Unwinds one construct of the active mode.
    pub fn escape(&mut self) -> Unwound {
        self.session.escape(&mut self.scene)
    }

    /// Undoes the last change, abandoning any edit in progress first. The
    /// active mode follows the restored selection.
    pub fn undo(&mut self) -> bool {
        self.session.undo(&mut self.scene)
    }

    /// Re-applies the last undone change.
    pub fn redo(&mut self) -> bool {
        self.session.redo(&mut self.scene)
    }
}

fn page_size(page: &Node) -> (f64, f64) {
    match page.kind {
        NodeKind::Page { width, height, .. } => (width, height),
        _ => (0.0, 0.0),
    }
}
