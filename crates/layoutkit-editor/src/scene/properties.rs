//! Keyed properties on nodes.

use layoutkit_core::Result;

use super::Scene;
use crate::history::ChangeType;
use crate::model::Property;

impl Scene {
    /// Adds a property to a node.
    ///
    /// With `uniq` every existing entry with the same key is replaced.
    /// Otherwise the entry is appended unless an identical key/value pair is
    /// already present, in which case only its confidence and author update.
    pub fn set_property(&mut self, id: &str, property: Property, uniq: bool) -> Result<()> {
        self.document().get(id)?;
        self.ensure_writable(id)?;
        let node = self.document_mut().get_mut(id)?;
        if uniq {
            node.properties.retain(|p| p.key != property.key);
            node.properties.push(property);
        } else if let Some(existing) = node
            .properties
            .iter_mut()
            .find(|p| p.key == property.key && p.value == property.value)
        {
            if *existing == property {
                return Ok(());
            }
            *existing = property;
        } else {
            node.properties.push(property);
        }
        self.commit(ChangeType::EditProperty);
        Ok(())
    }

    /// Removes entries with `key`, or only those with `key` and `value`.
    ///
    /// Returns whether anything was removed.
    pub fn delete_property(&mut self, id: &str, key: &str, value: Option<&str>) -> Result<bool> {
        self.document().get(id)?;
        self.ensure_writable(id)?;
        let node = self.document_mut().get_mut(id)?;
        let before = node.properties.len();
        node.properties
            .retain(|p| p.key != key || value.is_some_and(|v| p.value != v));
        let removed = node.properties.len() != before;
        if removed {
            self.commit(ChangeType::EditProperty);
        }
        Ok(removed)
    }

    /// Removes the key/value pair if present, adds it otherwise.
    ///
    /// Returns whether the pair is present afterwards.
    pub fn toggle_property(&mut self, id: &str, key: &str, value: &str) -> Result<bool> {
        let present = self
            .document()
            .get(id)?
            .properties
            .iter()
            .any(|p| p.key == key && p.value == value);
        if present {
            self.delete_property(id, key, Some(value))?;
        } else {
            self.set_property(id, Property::new(key, value), false)?;
        }
        Ok(!present)
    }

    /// All properties of a node with the given key, in insertion order.
    pub fn properties(&self, id: &str, key: &str) -> Result<Vec<&Property>> {
        Ok(self
            .document()
            .get(id)?
            .properties
            .iter()
            .filter(|p| p.key == key)
            .collect())
    }
}
