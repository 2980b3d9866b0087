// Core Layer: namespace tree for dotted operator names
//
// Registered operators are addressable by dotted path. Intermediate path
// segments are created lazily; a path may never pass through or land on an
// existing terminal entry.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::{OpError, Result};
use super::operator::{OpKind, Operator};
use super::parameterized::ParameterizedOp;

/// A namespace slot: either a further namespace node or a terminal leaf
#[derive(Debug)]
pub enum Entry {
    Node(Namespace),
    Op(Arc<Operator>),
    Factory(Arc<ParameterizedOp>),
}

/// Tree node mapping path segments to child entries
#[derive(Debug, Default)]
pub struct Namespace {
    children: BTreeMap<String, Entry>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry at a dotted path, if present
    pub fn get(&self, dotted: &str) -> Option<&Entry> {
        let mut node = self;
        let mut segments = dotted.split('.').peekable();
        while let Some(segment) = segments.next() {
            let entry = node.children.get(segment)?;
            if segments.peek().is_none() {
                return Some(entry);
            }
            match entry {
                Entry::Node(child) => node = child,
                _ => return None,
            }
        }
        None
    }

    /// Verify that `dotted` can be inserted without touching the tree.
    ///
    /// Fails with `NameConflict` if any intermediate segment exists as a
    /// terminal entry, or if the leaf slot is already occupied.
    pub fn check(&self, dotted: &str) -> Result<()> {
        let mut node = self;
        let mut walked = String::new();
        let mut segments = dotted.split('.').peekable();
        while let Some(segment) = segments.next() {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);
            let last = segments.peek().is_none();
            match node.children.get(segment) {
                None => return Ok(()), // remainder of the path is fresh
                Some(Entry::Node(child)) if !last => node = child,
                Some(_) => {
                    return Err(OpError::NameConflict { path: walked });
                }
            }
        }
        Ok(())
    }

    /// Insert `entry` at a dotted path, creating intermediate nodes.
    ///
    /// The whole path is validated before any node is created, so a
    /// conflict leaves the tree untouched.
    pub fn insert(&mut self, dotted: &str, entry: Entry) -> Result<()> {
        self.check(dotted)?;
        let mut node = self;
        let mut segments = dotted.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                node.children.insert(segment.to_string(), entry);
                return Ok(());
            }
            node = match node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| Entry::Node(Namespace::new()))
            {
                Entry::Node(child) => child,
                // check() rejected terminal intermediates already
                _ => {
                    return Err(OpError::NameConflict {
                        path: dotted.to_string(),
                    })
                }
            };
        }
        Ok(())
    }

    /// Operator at a plain (undotted) name, creating it when absent.
    /// Used by builtin discovery, which accretes specializations onto the
    /// same name across several symbol patterns.
    pub fn get_or_insert_op(&mut self, name: &str, kind: OpKind) -> Result<Arc<Operator>> {
        match self
            .children
            .entry(name.to_string())
            .or_insert_with(|| Entry::Op(Arc::new(Operator::new(name, kind))))
        {
            Entry::Op(op) => Ok(op.clone()),
            _ => Err(OpError::NameConflict {
                path: name.to_string(),
            }),
        }
    }

    /// Remove and return the entry at a plain name
    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.children.remove(name)
    }

    /// Direct children of this node
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Convenience: operator leaf at a dotted path
    pub fn op(&self, dotted: &str) -> Option<Arc<Operator>> {
        match self.get(dotted) {
            Some(Entry::Op(op)) => Some(op.clone()),
            _ => None,
        }
    }

    /// Convenience: factory leaf at a dotted path
    pub fn factory(&self, dotted: &str) -> Option<Arc<ParameterizedOp>> {
        match self.get(dotted) {
            Some(Entry::Factory(f)) => Some(f.clone()),
            _ => None,
        }
    }
}
