//! The edit session: exactly one active mode.

use std::fmt;

use layoutkit_core::Result;

use super::{
    AcceptAll, Behavior, Composite, DragBehavior, DrawBehavior, DrawTarget, GroupBehavior,
    Handled, InputEvent, ModeHooks, PointsBehavior, SelectBehavior, Selectable, TextBehavior,
    TextValidator, Unwound, XmlFragmentValidator,
};
use crate::model::ElementType;
use crate::scene::Scene;
use crate::table::TableBehavior;

/// Element kinds that can be picked by a plain click.
const PICKABLE: [ElementType; 6] = [
    ElementType::TextRegion,
    ElementType::TableRegion,
    ElementType::TableCell,
    ElementType::TextLine,
    ElementType::Word,
    ElementType::Glyph,
];

/// Element kinds that can join a group.
const GROUPABLE: [ElementType; 5] = [
    ElementType::TextRegion,
    ElementType::TableCell,
    ElementType::TextLine,
    ElementType::Word,
    ElementType::Glyph,
];

/// Preset modes offered to the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Select,
    RegionEdit,
    RegionRectEdit,
    LineEdit,
    WordEdit,
    GlyphEdit,
    TableEdit,
    GroupEdit,
    CreateRegion,
    CreateLine,
    CreateWord,
    CreateGlyph,
    CreateTable { rows: usize, cols: usize },
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "select"),
            Self::RegionEdit => write!(f, "region edit"),
            Self::RegionRectEdit => write!(f, "region rectangle edit"),
            Self::LineEdit => write!(f, "line edit"),
            Self::WordEdit => write!(f, "word edit"),
            Self::GlyphEdit => write!(f, "glyph edit"),
            Self::TableEdit => write!(f, "table edit"),
            Self::GroupEdit => write!(f, "group edit"),
            Self::CreateRegion => write!(f, "create region"),
            Self::CreateLine => write!(f, "create line"),
            Self::CreateWord => write!(f, "create word"),
            Self::CreateGlyph => write!(f, "create glyph"),
            Self::CreateTable { rows, cols } => write!(f, "create {}x{} table", rows, cols),
        }
    }
}

impl EditMode {
    /// Builds the behavior for this mode. Regions and tables are drawn on
    /// `page` when given.
    pub fn build(self, page: Option<&str>, xml_text: bool) -> Box<dyn Behavior> {
        let text = || {
            let validator: Box<dyn TextValidator> = if xml_text {
                Box::new(XmlFragmentValidator)
            } else {
                Box::new(AcceptAll)
            };
            TextBehavior::new(validator)
        };
        let draw = |target| {
            let draw = DrawBehavior::new(target);
            match page {
                Some(page) => draw.on_page(page),
                None => draw,
            }
        };
        let editable = |kind: ElementType, drag: DragBehavior| {
            Selectable::new(
                SelectBehavior::new(vec![kind]),
                Composite::new(
                    "edit",
                    PointsBehavior::coords(),
                    Composite::new("move and type", drag, text()),
                ),
            )
        };
        match self {
            Self::Select => Box::new(SelectBehavior::new(PICKABLE)),
            Self::RegionEdit => Box::new(editable(ElementType::TextRegion, DragBehavior::new())),
            Self::RegionRectEdit => Box::new(Selectable::new(
                SelectBehavior::new(vec![ElementType::TextRegion]),
                PointsBehavior::rect(),
            )),
            Self::LineEdit => Box::new(Selectable::new(
                SelectBehavior::new(vec![ElementType::TextLine]),
                Composite::new("line edit", PointsBehavior::line(), text()),
            )),
            Self::WordEdit => Box::new(editable(
                ElementType::Word,
                DragBehavior::with_reparenting(),
            )),
            Self::GlyphEdit => Box::new(editable(
                ElementType::Glyph,
                DragBehavior::with_reparenting(),
            )),
            Self::TableEdit => Box::new(Selectable::new(
                SelectBehavior::new(vec![ElementType::TableRegion, ElementType::TableCell]),
                Composite::new("table edit", TableBehavior::new(), text()),
            )),
            Self::GroupEdit => Box::new(Selectable::new(
                SelectBehavior::new(GROUPABLE),
                GroupBehavior::new(GROUPABLE),
            )),
            Self::CreateRegion => Box::new(draw(DrawTarget::Region)),
            Self::CreateLine => Box::new(draw(DrawTarget::Line)),
            Self::CreateWord => Box::new(draw(DrawTarget::Word)),
            Self::CreateGlyph => Box::new(draw(DrawTarget::Glyph)),
            Self::CreateTable { rows, cols } => Box::new(draw(DrawTarget::Table { rows, cols })),
        }
    }
}

/// Owns the active mode and the shell's callbacks.
///
/// Activating a mode always deactivates the previous one first: its pending
/// constructs are cancelled, its selection released and the mode-off hook
/// fired.
pub struct EditSession {
    active: Option<(EditMode, Box<dyn Behavior>)>,
    hooks: ModeHooks,
    page: Option<String>,
    xml_text: bool,
    drag_grace_ms: u64,
    pointer_down: bool,
    pointer_moved: bool,
    suppress_clicks_until: Option<u64>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(150)
    }
}

impl EditSession {
    pub fn new(drag_grace_ms: u64) -> Self {
        Self {
            active: None,
            hooks: ModeHooks::default(),
            page: None,
            xml_text: false,
            drag_grace_ms,
            pointer_down: false,
            pointer_moved: false,
            suppress_clicks_until: None,
        }
    }

    /// Validate typed text as XML fragments in modes built from now on.
    pub fn with_xml_text(mut self) -> Self {
        self.xml_text = true;
        self
    }

    pub fn hooks_mut(&mut self) -> &mut ModeHooks {
        &mut self.hooks
    }

    pub fn mode(&self) -> Option<EditMode> {
        self.active.as_ref().map(|(mode, _)| *mode)
    }

    /// The behavior of the active mode.
    pub fn behavior(&self) -> Option<&dyn Behavior> {
        self.active.as_ref().map(|(_, b)| &**b)
    }

    /// Page that create modes draw regions and tables on.
    pub fn set_page(&mut self, page: Option<String>) {
        self.page = page;
    }

    /// Replaces the active mode.
    pub fn activate(&mut self, scene: &mut Scene, mode: EditMode) {
        self.deactivate(scene);
        tracing::debug!("Activating {} mode", mode);
        let behavior = mode.build(self.page.as_deref(), self.xml_text);
        self.active = Some((mode, behavior));
    }

    /// Leaves the session without an active mode.
    pub fn deactivate(&mut self, scene: &mut Scene) {
        if let Some((mode, mut behavior)) = self.active.take() {
            behavior.deactivate(scene, &mut self.hooks);
            self.pointer_down = false;
            self.pointer_moved = false;
            self.suppress_clicks_until = None;
            tracing::debug!("Deactivated {} mode", mode);
            self.hooks.mode_off(&mode.to_string());
        }
    }

    /// Whether a drag ended less than the grace period before `now_ms`.
    pub fn is_dragging(&self, now_ms: u64) -> bool {
        (self.pointer_down && self.pointer_moved)
            || self.suppress_clicks_until.is_some_and(|until| now_ms <= until)
    }

    /// Routes an input event into the active mode.
    ///
    /// Clicks arriving within the grace period after a drag are swallowed so
    /// that releasing a drag does not also change the selection.
    pub fn dispatch(&mut self, scene: &mut Scene, event: &InputEvent) -> Result<Handled> {
        match event {
            InputEvent::PointerDown { .. } => {
                self.pointer_down = true;
                self.pointer_moved = false;
            }
            InputEvent::PointerMove { .. } if self.pointer_down => self.pointer_moved = true,
            InputEvent::PointerUp { time_ms, .. } => {
                if self.pointer_moved {
                    self.suppress_clicks_until = Some(time_ms + self.drag_grace_ms);
                }
                self.pointer_down = false;
                self.pointer_moved = false;
            }
            InputEvent::Click { time_ms, .. } if self.is_dragging(*time_ms) => {
                tracing::trace!("Click at {} suppressed after drag", time_ms);
                return Ok(Handled::Ignored);
            }
            _ => {}
        }
        let Some((_, behavior)) = self.active.as_mut() else {
            return Ok(Handled::Ignored);
        };
        behavior.handle(scene, event, &mut self.hooks)
    }

    /// Cancels every pending construct of the active mode, keeping the
    /// selection. Returns whether anything was cancelled.
    pub fn cancel_pending(&mut self, scene: &mut Scene) -> bool {
        let Some((_, behavior)) = self.active.as_mut() else {
            return false;
        };
        let mut cancelled = false;
        while let Some(pending) = behavior.pending() {
            if !behavior.cancel(scene, pending) {
                break;
            }
            cancelled = true;
        }
        cancelled
    }

    /// Writes finished edits of the active mode, such as a valid text
    /// buffer, into the scene. Other constructs stay in progress.
    pub fn commit_pending(&mut self, scene: &mut Scene) -> Result<()> {
        match self.active.as_mut() {
            Some((_, behavior)) => behavior.commit_pending(scene, &mut self.hooks),
            None => Ok(()),
        }
    }

    /// Restores the previous history entry. Returns false at the oldest one.
    ///
    /// Pending edits are abandoned and the selection released through the
    /// active mode before the snapshot is installed; the restored selection
    /// is then handed back to the mode when it can hold it.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        if !scene.can_undo() {
            return false;
        }
        self.step_history(scene, Scene::undo)
    }

    /// Re-applies the next history entry. Returns false at the newest one.
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        if !scene.can_redo() {
            return false;
        }
        self.step_history(scene, Scene::redo)
    }

    fn step_history(&mut self, scene: &mut Scene, step: fn(&mut Scene) -> bool) -> bool {
        self.cancel_pending(scene);
        self.pointer_down = false;
        self.pointer_moved = false;
        let Some((_, behavior)) = self.active.as_mut() else {
            return step(scene);
        };
        if let Err(err) = behavior.unselect(scene, &mut self.hooks) {
            tracing::warn!("Releasing the selection before a history step failed: {}", err);
        }
        if !step(scene) {
            return false;
        }

        let Some(restored) = scene.selected().map(str::to_string) else {
            return true;
        };
        // hand the selection back through the mode so its bindings follow it
        if scene.select(None).is_ok()
            && scene
                .node(&restored)
                .is_some_and(|node| behavior.accepts_selection(node))
        {
            if let Err(err) = behavior.select(scene, &restored, &mut self.hooks) {
                tracing::warn!("Could not reselect {} after a history step: {}", restored, err);
            }
        }
        true
    }

    /// Unwinds exactly one construct: an in-progress draw, then an active
    /// point or text edit, then a multi-selection, then the selection.
    pub fn escape(&mut self, scene: &mut Scene) -> Unwound {
        let Some((_, behavior)) = self.active.as_mut() else {
            if scene.selected().is_some() && scene.select(None).is_ok() {
                return Unwound::Selection;
            }
            return Unwound::Nothing;
        };
        if let Some(pending) = behavior.pending() {
            if behavior.cancel(scene, pending) {
                tracing::debug!("Escape cancelled {:?}", pending);
                return pending.into();
            }
        }
        match behavior.unselect(scene, &mut self.hooks) {
            Ok(true) => Unwound::Selection,
            Ok(false) => Unwound::Nothing,
            Err(err) => {
                tracing::warn!("Escape released the selection with an error: {}", err);
                Unwound::Selection
            }
        }
    }
}
