//! Hierarchical group tree
//!
//! Groups namespace parameter entries. Each node composes its parent's
//! fragments with fixed delimiters: keys with '.', topic paths with '/',
//! friendly names with ' '. Nodes are created on first reference and live
//! for the process lifetime; the tree owns all nodes in insertion order and
//! hands out index-based [`GroupId`] handles.

use core::fmt::Write;
use heapless::{String, Vec};

use super::{GroupId, MAX_GROUPS, MAX_NAME_LEN};
use crate::error::ParamsError;

/// Local (single-segment) key capacity
const LOCAL_KEY_LEN: usize = 24;

/// One namespace node
#[derive(Debug)]
pub struct GroupNode {
    parent: Option<GroupId>,
    local: String<LOCAL_KEY_LEN>,
    key: String<MAX_NAME_LEN>,
    topic: String<MAX_NAME_LEN>,
    friendly: String<MAX_NAME_LEN>,
}

impl GroupNode {
    /// Composite '.'-joined key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Composite '/'-joined topic path
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Composite display name
    pub fn friendly(&self) -> &str {
        &self.friendly
    }

    /// Parent node, if any
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }
}

/// Insertion-ordered group tree
#[derive(Debug, Default)]
pub struct GroupTree {
    nodes: Vec<GroupNode, MAX_GROUPS>,
}

fn compose(
    parent: Option<&str>,
    delimiter: char,
    local: &str,
) -> Result<String<MAX_NAME_LEN>, ParamsError> {
    let mut out = String::new();
    match parent {
        Some(p) if !p.is_empty() => {
            write!(out, "{}{}{}", p, delimiter, local).map_err(|_| ParamsError::TopicBuild)?
        }
        _ => out.push_str(local).map_err(|_| ParamsError::TopicBuild)?,
    }
    Ok(out)
}

impl GroupTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by id
    pub fn get(&self, id: GroupId) -> Option<&GroupNode> {
        self.nodes.get(id.0)
    }

    /// Find an existing node by (parent, local key), case-insensitive
    pub fn find(&self, parent: Option<GroupId>, local: &str) -> Option<GroupId> {
        self.nodes
            .iter()
            .position(|n| n.parent == parent && n.local.eq_ignore_ascii_case(local))
            .map(GroupId)
    }

    /// Get or create a node under `parent`
    ///
    /// Idempotent on (parent, local key): a repeated call returns the
    /// existing node untouched. A composite key longer than
    /// `warn_key_len` raises a warning but still creates the node.
    pub fn get_or_create(
        &mut self,
        parent: Option<GroupId>,
        local: &str,
        topic: &str,
        friendly: &str,
        warn_key_len: usize,
    ) -> Result<GroupId, ParamsError> {
        if let Some(id) = self.find(parent, local) {
            return Ok(id);
        }

        let (parent_key, parent_topic, parent_friendly) = match parent {
            Some(id) => {
                let node = self.get(id).ok_or(ParamsError::NotFound)?;
                (Some(node.key()), Some(node.topic()), Some(node.friendly()))
            }
            None => (None, None, None),
        };

        let key = compose(parent_key, '.', local)?;
        let topic = compose(parent_topic, '/', topic)?;
        let friendly = compose(parent_friendly, ' ', friendly)?;

        if key.len() > warn_key_len {
            crate::log_warn!("Group key \"{}\" exceeds {} characters", key.as_str(), warn_key_len);
        }

        let mut local_key = String::new();
        local_key.push_str(local).map_err(|_| ParamsError::TopicBuild)?;

        self.nodes
            .push(GroupNode {
                parent,
                local: local_key,
                key,
                topic,
                friendly,
            })
            .map_err(|_| ParamsError::GroupsFull)?;

        Ok(GroupId(self.nodes.len() - 1))
    }

    /// Composite key of `id`, or "" for no group
    pub fn key_of(&self, id: Option<GroupId>) -> &str {
        id.and_then(|g| self.get(g)).map(GroupNode::key).unwrap_or("")
    }

    /// Composite topic path of `id`, or "" for no group
    pub fn topic_of(&self, id: Option<GroupId>) -> &str {
        id.and_then(|g| self.get(g)).map(GroupNode::topic).unwrap_or("")
    }
}
