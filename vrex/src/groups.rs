//! Capture group numbering
//!
//! Groups receive 1-based numbers in the order their opening bracket appears
//! in the generated pattern, named groups included. A label made only of
//! digits does not name the group: it states the number the group is
//! expected to receive. Backreferences are resolved against the registry
//! once the whole tree is known, so `match<2>` may precede group 2.

use std::collections::HashMap;

use thiserror::Error;

use crate::ast::Backreference;

/// One capture group of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub index: u32,
    /// `None` for unnamed and positional groups
    pub name: Option<String>,
}

/// Capture groups in numbering order
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Vec<GroupInfo>,
    by_name: HashMap<String, u32>,
}

/// A label that states a group number rather than a name
pub(crate) fn is_positional(label: &str) -> bool {
    !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit())
}

impl GroupRegistry {
    pub fn new() -> Self {
        GroupRegistry::default()
    }

    /// The number the next opened group receives
    pub fn next_index(&self) -> u32 {
        self.groups.len() as u32 + 1
    }

    /// Open a capture group with an optional label
    ///
    /// Returns the number assigned to the group. Nothing is registered when
    /// an error is returned.
    pub fn open(&mut self, label: Option<&str>) -> Result<u32, GroupRegistryError> {
        let index = self.next_index();
        let name = match label {
            Some(label) if is_positional(label) => {
                if label != index.to_string() {
                    return Err(GroupRegistryError::NumberMismatch {
                        found: label.to_string(),
                        expected: index,
                    });
                }
                None
            }
            Some(label) => {
                if self.by_name.contains_key(label) {
                    return Err(GroupRegistryError::DuplicateName(label.to_string()));
                }
                self.by_name.insert(label.to_string(), index);
                Some(label.to_string())
            }
            None => None,
        };
        self.groups.push(GroupInfo { index, name });
        Ok(index)
    }

    /// The group number a backreference points at
    pub fn resolve(&self, backreference: &Backreference) -> Result<u32, GroupRegistryError> {
        match backreference {
            Backreference::Number(n) if (1..self.next_index()).contains(n) => Ok(*n),
            Backreference::Number(n) => Err(GroupRegistryError::UnknownNumber(*n)),
            Backreference::Named(name) => self
                .index_of(name)
                .ok_or_else(|| GroupRegistryError::UnknownName(name.clone())),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Name of group `index`, if it has one
    pub fn name_of(&self, index: u32) -> Option<&str> {
        let position = index.checked_sub(1)? as usize;
        self.groups.get(position)?.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupInfo> {
        self.groups.iter()
    }
}

/// Rejected group label or backreference
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupRegistryError {
    #[error("duplicate group name: {0}")]
    DuplicateName(String),

    #[error("group labelled {found} receives number {expected}")]
    NumberMismatch { found: String, expected: u32 },

    #[error("no group named {0}")]
    UnknownName(String),

    #[error("no group number {0}")]
    UnknownNumber(u32),
}
