//! Groups and word-break partners: id references between nodes.
//!
//! A group lists member ids rather than owning its members, so references
//! may dangle after edits elsewhere. Resolution skips missing ids and tolerates
//! cycles between groups.

use std::collections::HashSet;

use layoutkit_core::{Error, Result, StructureError};

use super::{repair_references, unsupported, Scene};
use crate::history::ChangeType;
use crate::model::{ElementType, Member, Node, NodeKind};

impl Scene {
    fn group(&self, id: &str) -> Result<&Node> {
        let node = self.document().get(id)?;
        if node.element_type() != ElementType::Group {
            return Err(StructureError::NotAGroup { id: id.to_string() }.into());
        }
        Ok(node)
    }

    /// Creates a group on `page_id` holding `members` and returns its id.
    pub fn create_group(&mut self, page_id: &str, members: &[&str]) -> Result<String> {
        if members.is_empty() {
            return Err(unsupported("a group needs at least one member"));
        }
        for id in members {
            self.document().get(id)?;
        }
        self.ensure_writable(page_id)?;
        let prefix = self.document().child_prefix(page_id, ElementType::Group)?;
        let id = self.document().unique_id(&prefix);

        let mut group = Node::new(id.clone(), NodeKind::Group);
        for member in members {
            if !group.members.iter().any(|m| m.id == *member) {
                group.members.push(Member::new(*member));
            }
        }
        self.document_mut().insert(page_id, group, None)?;
        tracing::debug!("Created group {} with {} members", id, members.len());
        self.commit(ChangeType::EditGroup);
        Ok(id)
    }

    /// Members of a group in order.
    ///
    /// With `recursive`, member groups are expanded into their own members.
    /// Missing ids are omitted and each node appears at most once.
    pub fn get_group_members(&self, group_id: &str, recursive: bool) -> Result<Vec<&Node>> {
        let group = self.group(group_id)?;
        let mut visited = HashSet::from([group.id.clone()]);
        let mut out = Vec::new();
        self.collect_members(group, recursive, &mut visited, &mut out);
        Ok(out)
    }

    fn collect_members<'a>(
        &'a self,
        group: &Node,
        recursive: bool,
        visited: &mut HashSet<String>,
        out: &mut Vec<&'a Node>,
    ) {
        for member in &group.members {
            let Some(node) = self.document().node(&member.id) else {
                continue;
            };
            if !visited.insert(node.id.clone()) {
                continue;
            }
            if recursive && node.element_type() == ElementType::Group {
                self.collect_members(node, recursive, visited, out);
            } else {
                out.push(node);
            }
        }
    }

    /// Adds `member_id` to a group. Adding an existing member changes nothing.
    pub fn add_group_member(
        &mut self,
        group_id: &str,
        member_id: &str,
        confidence: Option<f64>,
    ) -> Result<()> {
        let group = self.group(group_id)?;
        self.document().get(member_id)?;
        if member_id == group_id {
            return Err(unsupported("a group cannot contain itself"));
        }
        if group.members.iter().any(|m| m.id == member_id) {
            return Ok(());
        }
        self.ensure_writable(group_id)?;
        let mut member = Member::new(member_id);
        member.confidence = confidence;
        self.document_mut().get_mut(group_id)?.members.push(member);
        self.commit(ChangeType::EditGroup);
        Ok(())
    }

    /// Removes `member_id` from a group; an emptied group is deleted.
    ///
    /// Returns whether the member was present.
    pub fn remove_group_member(&mut self, group_id: &str, member_id: &str) -> Result<bool> {
        let group = self.group(group_id)?;
        if !group.members.iter().any(|m| m.id == member_id) {
            return Ok(false);
        }
        self.ensure_writable(group_id)?;

        let mut doc = self.document().clone();
        let node = doc.get_mut(group_id)?;
        node.members.retain(|m| m.id != member_id);
        if node.members.is_empty() {
            doc.remove(group_id)?;
            let mut gone = HashSet::from([group_id.to_string()]);
            repair_references(&mut doc, &mut gone);
            if self.selected().is_some_and(|s| gone.contains(s)) {
                self.select(None)?;
            }
        }
        self.replace_document(doc);
        self.commit(ChangeType::EditGroup);
        Ok(true)
    }

    /// Sets the confidence attached to one membership.
    pub fn set_member_confidence(
        &mut self,
        group_id: &str,
        member_id: &str,
        confidence: Option<f64>,
    ) -> Result<()> {
        let group = self.group(group_id)?;
        if !group.members.iter().any(|m| m.id == member_id) {
            return Err(Error::not_found(member_id));
        }
        self.ensure_writable(group_id)?;
        let node = self.document_mut().get_mut(group_id)?;
        for member in node.members.iter_mut().filter(|m| m.id == member_id) {
            member.confidence = confidence;
        }
        self.commit(ChangeType::EditGroup);
        Ok(())
    }

    /// Links two words split across a line break.
    pub fn set_break_pair(&mut self, first: &str, second: &str) -> Result<()> {
        for id in [first, second] {
            let node = self.document().get(id)?;
            if node.element_type() != ElementType::Word {
                return Err(unsupported(format!("{} is not a word", id)));
            }
            self.ensure_writable(id)?;
        }
        if first == second {
            return Err(unsupported("a word cannot pair with itself"));
        }
        let mut doc = self.document().clone();
        for (id, partner) in [(first, second), (second, first)] {
            // drop any previous partner's back reference
            if let Some(old) = doc.get(id)?.break_pair.clone() {
                if let Some(old_node) = doc.node_mut(&old) {
                    old_node.break_pair = None;
                }
            }
            doc.get_mut(id)?.break_pair = Some(partner.to_string());
        }
        self.replace_document(doc);
        self.commit(ChangeType::Other("word break".to_string()));
        Ok(())
    }

    /// Unlinks a word from its break partner. Returns whether it had one.
    pub fn clear_break_pair(&mut self, id: &str) -> Result<bool> {
        let Some(partner) = self.document().get(id)?.break_pair.clone() else {
            return Ok(false);
        };
        self.ensure_writable(id)?;
        let doc = self.document_mut();
        doc.get_mut(id)?.break_pair = None;
        if let Some(node) = doc.node_mut(&partner) {
            node.break_pair = None;
        }
        self.commit(ChangeType::Other("word break".to_string()));
        Ok(true)
    }
}
