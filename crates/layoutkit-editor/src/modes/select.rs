//! Click selection.

use layoutkit_core::{Point2D, Predicate, Result};

use super::{Behavior, EditKey, Handled, InputEvent, ModeHooks, Pending};
use crate::model::{ElementType, Node};
use crate::scene::Scene;

/// Picks the topmost node of the accepted kinds under a click.
pub struct SelectBehavior {
    kinds: Vec<ElementType>,
    predicate: Option<Predicate<Node>>,
}

impl SelectBehavior {
    pub fn new(kinds: impl Into<Vec<ElementType>>) -> Self {
        Self {
            kinds: kinds.into(),
            predicate: None,
        }
    }

    /// Adds a filter evaluated on every candidate at click time.
    pub fn with_predicate(mut self, predicate: Predicate<Node>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn kinds(&self) -> &[ElementType] {
        &self.kinds
    }

    pub fn accepts(&self, node: &Node) -> bool {
        self.kinds.contains(&node.element_type())
            && self.predicate.as_ref().map_or(true, |p| p(node))
    }

    /// The candidate under `pos`, if any.
    pub fn pick(&self, scene: &Scene, pos: Point2D) -> Option<String> {
        scene.hit_test(pos, scene.pick_radius(), &|node| self.accepts(node))
    }
}

impl Behavior for SelectBehavior {
    fn name(&self) -> &'static str {
        "select"
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        select_on_click(self, scene, event, hooks, None::<&mut NoInner>)
    }

    fn accepts_selection(&self, node: &Node) -> bool {
        self.accepts(node)
    }
}

/// A behavior acting on the node chosen by a [`SelectBehavior`].
///
/// Events go to the inner behavior first; clicks it leaves alone change the
/// selection.
pub struct Selectable<B> {
    select: SelectBehavior,
    inner: B,
}

impl<B: Behavior> Selectable<B> {
    pub fn new(select: SelectBehavior, inner: B) -> Self {
        Self { select, inner }
    }

    pub fn selector(&self) -> &SelectBehavior {
        &self.select
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }
}

impl<B: Behavior> Behavior for Selectable<B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        if self.inner.handle(scene, event, hooks)?.is_consumed() {
            return Ok(Handled::Consumed);
        }
        let Self { select, inner } = self;
        select_on_click(select, scene, event, hooks, Some(inner))
    }

    fn on_select(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        self.inner.on_select(scene, id, hooks)
    }

    fn on_unselect(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        self.inner.on_unselect(scene, id, hooks)
    }

    fn accepts_selection(&self, node: &Node) -> bool {
        self.select.accepts(node) && self.inner.accepts_selection(node)
    }

    fn pending(&self) -> Option<Pending> {
        self.inner.pending()
    }

    fn cancel(&mut self, scene: &mut Scene, what: Pending) -> bool {
        self.inner.cancel(scene, what)
    }

    fn commit_pending(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<()> {
        self.inner.commit_pending(scene, hooks)
    }
}

/// Placeholder inner behavior for a bare selector.
struct NoInner;

impl Behavior for NoInner {
    fn name(&self) -> &'static str {
        "select"
    }

    fn handle(&mut self, _: &mut Scene, _: &InputEvent, _: &mut ModeHooks) -> Result<Handled> {
        Ok(Handled::Ignored)
    }
}

/// Selection changes shared by the bare selector and [`Selectable`].
///
/// The inner behavior, when present, is notified through its own
/// select/unselect hooks.
fn select_on_click<B: Behavior>(
    select: &SelectBehavior,
    scene: &mut Scene,
    event: &InputEvent,
    hooks: &mut ModeHooks,
    inner: Option<&mut B>,
) -> Result<Handled> {
    let mut fallback = NoInner;
    match event {
        InputEvent::Click {
            pos,
            additive: false,
            ..
        } => match (select.pick(scene, *pos), inner) {
            (Some(id), Some(inner)) => inner.select(scene, &id, hooks).map(|_| Handled::Consumed),
            (Some(id), None) => fallback
                .select(scene, &id, hooks)
                .map(|_| Handled::Consumed),
            (None, Some(inner)) => unselected(inner.unselect(scene, hooks)?),
            (None, None) => unselected(fallback.unselect(scene, hooks)?),
        },
        InputEvent::Key(EditKey::DeleteSelected) => {
            let Some(id) = scene.selected().map(str::to_string) else {
                return Ok(Handled::Ignored);
            };
            match inner {
                Some(inner) => delete_selected(inner, scene, &id, hooks),
                None => delete_selected(&mut fallback, scene, &id, hooks),
            }
        }
        _ => Ok(Handled::Ignored),
    }
}

fn unselected(released: bool) -> Result<Handled> {
    Ok(if released {
        Handled::Consumed
    } else {
        Handled::Ignored
    })
}

fn delete_selected<B: Behavior>(
    inner: &mut B,
    scene: &mut Scene,
    id: &str,
    hooks: &mut ModeHooks,
) -> Result<Handled> {
    scene.ensure_writable(id)?;
    inner.unselect(scene, hooks)?;
    if let Err(err) = scene.delete_node(id) {
        inner.select(scene, id, hooks)?;
        return Err(err);
    }
    Ok(Handled::Consumed)
}
