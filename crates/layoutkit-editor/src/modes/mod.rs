//! Edit modes: composable behaviors that turn input into scene mutations.
//!
//! Each mode is a [`Behavior`] built from small primitives:
//!
//! - [`select`]: click selection with a kind filter and optional predicate
//! - [`points`]: vertex handles, insertion and deletion, rectangle mirroring
//! - [`text`]: text buffer with a pluggable validator
//! - [`drag`]: whole-subtree translation with drop-target reparenting
//! - [`draw`]: click-sequence creation of new elements
//! - [`group`]: additive multi-selection that becomes a group
//! - [`composite`]: two primitives active on the same target
//!
//! An [`EditSession`] holds the one active mode.

pub mod composite;
pub mod drag;
pub mod draw;
pub mod group;
pub mod points;
pub mod select;
pub mod session;
pub mod text;

pub use composite::Composite;
pub use drag::DragBehavior;
pub use draw::{DrawBehavior, DrawTarget};
pub use group::GroupBehavior;
pub use points::PointsBehavior;
pub use select::{SelectBehavior, Selectable};
pub use session::{EditMode, EditSession};
pub use text::{AcceptAll, TextBehavior, TextValidator, XmlFragmentValidator};

use layoutkit_core::{InvalidTextCallback, NodeCallback, Point2D, ReparentCallback, Result};

use crate::model::Node;
use crate::scene::Scene;

/// Edit commands routed from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    /// Ends a draw, commits text or a group selection.
    Finish,
    /// Inserts a point after the active one.
    InsertPoint,
    /// Deletes the active point.
    DeletePoint,
    /// Deletes the selected node.
    DeleteSelected,
}

/// Raw input in document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Point2D, time_ms: u64 },
    PointerMove { pos: Point2D, time_ms: u64 },
    PointerUp { pos: Point2D, time_ms: u64 },
    /// A press and release without movement. `additive` extends a selection.
    Click {
        pos: Point2D,
        time_ms: u64,
        additive: bool,
    },
    /// The full new content of the text input surface.
    TextInput(String),
    Key(EditKey),
}

impl InputEvent {
    pub fn pos(&self) -> Option<Point2D> {
        match self {
            Self::PointerDown { pos, .. }
            | Self::PointerMove { pos, .. }
            | Self::PointerUp { pos, .. }
            | Self::Click { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    pub fn time_ms(&self) -> Option<u64> {
        match self {
            Self::PointerDown { time_ms, .. }
            | Self::PointerMove { time_ms, .. }
            | Self::PointerUp { time_ms, .. }
            | Self::Click { time_ms, .. } => Some(*time_ms),
            _ => None,
        }
    }
}

/// Whether a behavior used an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Ignored,
    Consumed,
}

impl Handled {
    pub fn is_consumed(self) -> bool {
        self == Self::Consumed
    }
}

/// A construct that escape can cancel, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pending {
    Draw,
    Edit,
    MultiSelection,
}

/// What one escape press cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unwound {
    Draw,
    Edit,
    MultiSelection,
    Selection,
    Nothing,
}

impl From<Pending> for Unwound {
    fn from(pending: Pending) -> Self {
        match pending {
            Pending::Draw => Self::Draw,
            Pending::Edit => Self::Edit,
            Pending::MultiSelection => Self::MultiSelection,
        }
    }
}

/// Callbacks the application shell attaches to the session.
#[derive(Default)]
pub struct ModeHooks {
    pub on_select: Option<NodeCallback>,
    pub on_unselect: Option<NodeCallback>,
    /// Fired after a drop moved a node under a new parent.
    pub on_parent_change: Option<ReparentCallback>,
    /// Fired when invalid text is discarded as its node loses focus.
    pub on_invalid_text: Option<InvalidTextCallback>,
    /// Fired with the mode name when a mode is deactivated.
    pub on_mode_off: Option<NodeCallback>,
}

impl ModeHooks {
    pub(crate) fn selected(&mut self, id: &str) {
        if let Some(cb) = self.on_select.as_mut() {
            cb(id);
        }
    }

    pub(crate) fn unselected(&mut self, id: &str) {
        if let Some(cb) = self.on_unselect.as_mut() {
            cb(id);
        }
    }

    pub(crate) fn parent_changed(&mut self, id: &str, parent: &str) {
        if let Some(cb) = self.on_parent_change.as_mut() {
            cb(id, parent);
        }
    }

    pub(crate) fn invalid_text(&mut self, id: &str, text: &str) {
        if let Some(cb) = self.on_invalid_text.as_mut() {
            cb(id, text);
        }
    }

    pub(crate) fn mode_off(&mut self, name: &str) {
        if let Some(cb) = self.on_mode_off.as_mut() {
            cb(name);
        }
    }
}

/// An interaction primitive or a mode built from them.
pub trait Behavior {
    fn name(&self) -> &'static str;

    /// Handle an input event, mutating the scene through its API.
    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled>;

    /// Called after `id` became the selection.
    fn on_select(&mut self, _scene: &mut Scene, _id: &str, _hooks: &mut ModeHooks) -> Result<()> {
        Ok(())
    }

    /// Called before `id` stops being the selection.
    fn on_unselect(&mut self, _scene: &mut Scene, _id: &str, _hooks: &mut ModeHooks) -> Result<()> {
        Ok(())
    }

    /// Whether this behavior may hold `node` as its selection.
    fn accepts_selection(&self, _node: &Node) -> bool {
        true
    }

    /// The highest-priority construct in progress.
    fn pending(&self) -> Option<Pending> {
        None
    }

    /// Cancels one construct. Returns false when there was nothing to cancel.
    fn cancel(&mut self, _scene: &mut Scene, _what: Pending) -> bool {
        false
    }

    /// Writes edits that are complete as they stand into the scene, leaving
    /// everything else in progress.
    fn commit_pending(&mut self, _scene: &mut Scene, _hooks: &mut ModeHooks) -> Result<()> {
        Ok(())
    }

    /// Makes `id` the unique selection, releasing the previous one first.
    fn select(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        if scene.selected() == Some(id) {
            return Ok(());
        }
        self.unselect(scene, hooks)?;
        scene.select(Some(id))?;
        tracing::debug!("{} selected {}", self.name(), id);
        hooks.selected(id);
        self.on_select(scene, id, hooks)
    }

    /// Clears the selection. Returns false when nothing was selected.
    fn unselect(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<bool> {
        let Some(id) = scene.selected().map(str::to_string) else {
            return Ok(false);
        };
        let released = self.on_unselect(scene, &id, hooks);
        scene.select(None)?;
        hooks.unselected(&id);
        released.map(|_| true)
    }

    /// Tears the behavior down when its mode is replaced.
    fn deactivate(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) {
        self.cancel(scene, Pending::Draw);
        self.cancel(scene, Pending::MultiSelection);
        if let Err(err) = self.unselect(scene, hooks) {
            tracing::warn!("{} left an edit behind on deactivation: {}", self.name(), err);
        }
    }
}

impl<B: Behavior + ?Sized> Behavior for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        (**self).handle(scene, event, hooks)
    }

    fn on_select(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        (**self).on_select(scene, id, hooks)
    }

    fn on_unselect(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        (**self).on_unselect(scene, id, hooks)
    }

    fn accepts_selection(&self, node: &Node) -> bool {
        (**self).accepts_selection(node)
    }

    fn pending(&self) -> Option<Pending> {
        (**self).pending()
    }

    fn cancel(&mut self, scene: &mut Scene, what: Pending) -> bool {
        (**self).cancel(scene, what)
    }

    fn commit_pending(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<()> {
        (**self).commit_pending(scene, hooks)
    }

    fn select(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        (**self).select(scene, id, hooks)
    }

    fn unselect(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<bool> {
        (**self).unselect(scene, hooks)
    }

    fn deactivate(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) {
        (**self).deactivate(scene, hooks)
    }
}
