//! Text editing of the selected node.
//!
//! Typing replaces a buffer, never the node. The buffer is checked by a
//! [`TextValidator`] on every change; invalid content is flagged but typing
//! continues. The buffer is committed when the node loses the selection or on
//! [`EditKey::Finish`], and only when it is valid, non-empty and changed.

use quick_xml::events::Event;
use quick_xml::Reader;

use layoutkit_core::Result;

use super::{Behavior, EditKey, Handled, InputEvent, ModeHooks, Pending};
use crate::scene::Scene;

/// Decides whether a text buffer may be committed.
pub trait TextValidator {
    fn validate(&self, text: &str) -> bool;
}

/// Accepts any text.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl TextValidator for AcceptAll {
    fn validate(&self, _text: &str) -> bool {
        true
    }
}

/// Accepts text that is a well-formed XML fragment: balanced tags and valid
/// entity references, any number of top-level nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFragmentValidator;

impl TextValidator for XmlFragmentValidator {
    fn validate(&self, text: &str) -> bool {
        let wrapped = format!("<fragment>{}</fragment>", text);
        let mut reader = Reader::from_str(&wrapped);
        let mut buf = Vec::new();
        let mut depth = 0usize;
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(_)) => depth += 1,
                Ok(Event::End(_)) => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                Ok(Event::Text(t)) => {
                    if t.unescape().is_err() {
                        return false;
                    }
                }
                Ok(Event::Eof) => return depth == 0,
                Ok(_) => {}
                Err(err) => {
                    tracing::trace!("text is not a well-formed fragment: {}", err);
                    return false;
                }
            }
            buf.clear();
        }
    }
}

#[derive(Debug, Clone)]
struct TextBuffer {
    id: String,
    original: String,
    text: String,
    valid: bool,
}

/// Binds a text buffer to the selected node.
pub struct TextBehavior {
    validator: Box<dyn TextValidator>,
    buffer: Option<TextBuffer>,
}

impl Default for TextBehavior {
    fn default() -> Self {
        Self::new(Box::new(AcceptAll))
    }
}

impl TextBehavior {
    pub fn new(validator: Box<dyn TextValidator>) -> Self {
        Self {
            validator,
            buffer: None,
        }
    }

    /// Current buffer content.
    pub fn text(&self) -> Option<&str> {
        self.buffer.as_ref().map(|b| b.text.as_str())
    }

    /// Whether the buffer passed its validator.
    pub fn is_valid(&self) -> bool {
        self.buffer.as_ref().map_or(true, |b| b.valid)
    }

    fn is_dirty(&self) -> bool {
        self.buffer.as_ref().is_some_and(|b| b.text != b.original)
    }

    /// Writes the buffer into the node when it is valid, non-empty and
    /// changed. Invalid text is reported and dropped.
    fn commit(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<()> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Ok(());
        };
        if buffer.text == buffer.original {
            return Ok(());
        }
        if !buffer.valid {
            tracing::warn!("Discarding invalid text for {}", buffer.id);
            hooks.invalid_text(&buffer.id, &buffer.text);
            buffer.text = buffer.original.clone();
            buffer.valid = true;
            return Ok(());
        }
        if buffer.text.is_empty() {
            buffer.text = buffer.original.clone();
            return Ok(());
        }
        scene.set_text(&buffer.id, &buffer.text)?;
        buffer.original = buffer.text.clone();
        Ok(())
    }
}

impl Behavior for TextBehavior {
    fn name(&self) -> &'static str {
        "text"
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        match event {
            InputEvent::TextInput(text) => {
                let Some(buffer) = self.buffer.as_mut() else {
                    return Ok(Handled::Ignored);
                };
                buffer.valid = self.validator.validate(text);
                if !buffer.valid {
                    tracing::debug!("Text for {} flagged invalid", buffer.id);
                }
                buffer.text = text.clone();
                Ok(Handled::Consumed)
            }
            InputEvent::Key(EditKey::Finish) if self.buffer.is_some() => {
                self.commit(scene, hooks)?;
                Ok(Handled::Consumed)
            }
            _ => Ok(Handled::Ignored),
        }
    }

    fn on_select(&mut self, scene: &mut Scene, id: &str, _hooks: &mut ModeHooks) -> Result<()> {
        let node = scene.document().get(id)?;
        self.buffer = node.element_type().carries_text().then(|| {
            let text = node.text_string();
            TextBuffer {
                id: id.to_string(),
                original: text.clone(),
                text,
                valid: true,
            }
        });
        Ok(())
    }

    fn on_unselect(&mut self, scene: &mut Scene, _id: &str, hooks: &mut ModeHooks) -> Result<()> {
        let result = self.commit(scene, hooks);
        self.buffer = None;
        result
    }

    fn pending(&self) -> Option<Pending> {
        self.is_dirty().then_some(Pending::Edit)
    }

    fn cancel(&mut self, _scene: &mut Scene, what: Pending) -> bool {
        if what != Pending::Edit || !self.is_dirty() {
            return false;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.text = buffer.original.clone();
            buffer.valid = true;
        }
        true
    }

    /// Commits a valid, non-empty buffer. Invalid or empty text stays in the
    /// buffer for the user to finish.
    fn commit_pending(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<()> {
        if self
            .buffer
            .as_ref()
            .is_some_and(|b| b.valid && !b.text.is_empty())
        {
            self.commit(scene, hooks)?;
        }
        Ok(())
    }
}
