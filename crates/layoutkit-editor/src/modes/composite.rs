//! Two behaviors active on the same target.

use layoutkit_core::Result;

use super::{Behavior, Handled, InputEvent, ModeHooks, Pending};
use crate::scene::Scene;

/// Offers every event to `first`, then to `second` if `first` ignored it.
/// Select and unselect notifications reach both.
pub struct Composite<A, B> {
    first: A,
    second: B,
    name: &'static str,
}

impl<A: Behavior, B: Behavior> Composite<A, B> {
    pub fn new(name: &'static str, first: A, second: B) -> Self {
        Self {
            first,
            second,
            name,
        }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A: Behavior, B: Behavior> Behavior for Composite<A, B> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        if self.first.handle(scene, event, hooks)?.is_consumed() {
            return Ok(Handled::Consumed);
        }
        self.second.handle(scene, event, hooks)
    }

    fn on_select(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        self.first.on_select(scene, id, hooks)?;
        self.second.on_select(scene, id, hooks)
    }

    fn on_unselect(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        let first = self.first.on_unselect(scene, id, hooks);
        let second = self.second.on_unselect(scene, id, hooks);
        first.and(second)
    }

    fn pending(&self) -> Option<Pending> {
        match (self.first.pending(), self.second.pending()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn cancel(&mut self, scene: &mut Scene, what: Pending) -> bool {
        let first = self.first.cancel(scene, what);
        let second = self.second.cancel(scene, what);
        first || second
    }

    fn commit_pending(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<()> {
        let first = self.first.commit_pending(scene, hooks);
        let second = self.second.commit_pending(scene, hooks);
        first.and(second)
    }
}
