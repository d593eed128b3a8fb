//! Additive multi-selection that becomes a group.

use layoutkit_core::Result;

use super::{Behavior, EditKey, Handled, InputEvent, ModeHooks, Pending, SelectBehavior};
use crate::model::ElementType;
use crate::scene::{unsupported, Scene};

/// Additive clicks collect nodes; [`EditKey::Finish`] groups them on the
/// page of the first one.
pub struct GroupBehavior {
    candidates: SelectBehavior,
    picked: Vec<String>,
}

impl GroupBehavior {
    pub fn new(kinds: impl Into<Vec<ElementType>>) -> Self {
        Self {
            candidates: SelectBehavior::new(kinds),
            picked: Vec::new(),
        }
    }

    /// Nodes collected so far, in click order.
    pub fn picked(&self) -> &[String] {
        &self.picked
    }

    fn toggle(&mut self, id: String) {
        match self.picked.iter().position(|p| *p == id) {
            Some(i) => {
                self.picked.remove(i);
            }
            None => self.picked.push(id),
        }
    }

    fn finish(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<Handled> {
        let picked = std::mem::take(&mut self.picked);
        let Some(first) = picked.first() else {
            return Ok(Handled::Ignored);
        };
        let page = scene
            .document()
            .page_of(first)
            .map(|p| p.id.clone())
            .ok_or_else(|| unsupported(format!("{} is not on a page", first)))?;
        let members: Vec<&str> = picked.iter().map(String::as_str).collect();
        let id = scene.create_group(&page, &members)?;
        self.select(scene, &id, hooks)?;
        Ok(Handled::Consumed)
    }
}

impl Behavior for GroupBehavior {
    fn name(&self) -> &'static str {
        "group"
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        match event {
            InputEvent::Click {
                pos,
                additive: true,
                ..
            } => {
                let Some(id) = self.candidates.pick(scene, *pos) else {
                    return Ok(Handled::Ignored);
                };
                self.toggle(id);
                tracing::debug!("{} nodes picked for grouping", self.picked.len());
                Ok(Handled::Consumed)
            }
            InputEvent::Key(EditKey::Finish) if !self.picked.is_empty() => {
                self.finish(scene, hooks)
            }
            _ => Ok(Handled::Ignored),
        }
    }

    fn pending(&self) -> Option<Pending> {
        (!self.picked.is_empty()).then_some(Pending::MultiSelection)
    }

    fn cancel(&mut self, _scene: &mut Scene, what: Pending) -> bool {
        if what != Pending::MultiSelection || self.picked.is_empty() {
            return false;
        }
        self.picked.clear();
        true
    }
}
