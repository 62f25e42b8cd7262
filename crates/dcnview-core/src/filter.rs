//! Subscription filter: pattern-based allow-list over identifiers
//!
//! Patterns are given per component (mac, service, category, name). Each
//! component is compiled on its own and matched against its own segment of
//! the identifier, so anchors like `^reboot$` bind to that segment. An empty
//! component matches any segment. Matching uses substring search, not full
//! match.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifier::{EntityKind, Identifier, SEPARATOR};

/// Regex components for a subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionPattern {
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub name: String,
}

impl SubscriptionPattern {
    pub fn new(
        mac: impl Into<String>,
        service: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            mac: mac.into(),
            service: service.into(),
            category: category.into(),
            name: name.into(),
        }
    }

    /// Pattern with every component empty
    pub fn any() -> Self {
        Self::default()
    }

    fn compile(&self) -> Result<CompiledPattern> {
        let component = |source: &str| -> Result<Option<Regex>> {
            if source.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Regex::new(source)?))
            }
        };
        Ok(CompiledPattern {
            pattern: self.clone(),
            mac: component(&self.mac)?,
            service: component(&self.service)?,
            category: component(&self.category)?,
            name: component(&self.name)?,
        })
    }
}

impl fmt::Display for SubscriptionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mac={:?} service={:?} category={:?} name={:?}",
            self.mac, self.service, self.category, self.name
        )
    }
}

/// One regex per non-empty component
#[derive(Debug, Clone)]
struct CompiledPattern {
    pattern: SubscriptionPattern,
    mac: Option<Regex>,
    service: Option<Regex>,
    category: Option<Regex>,
    name: Option<Regex>,
}

impl CompiledPattern {
    fn matches(&self, kind: EntityKind, identifier: &Identifier) -> bool {
        let mut segments = identifier.as_str().split(SEPARATOR);
        let (Some(mac), Some(service), Some(segment), Some(category), Some(name), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return false;
        };
        let hit = |regex: &Option<Regex>, text: &str| {
            regex.as_ref().map_or(true, |r| r.is_match(text))
        };

        segment == kind.segment()
            && hit(&self.mac, mac)
            && hit(&self.service, service)
            && hit(&self.category, category)
            && hit(&self.name, name)
    }
}

/// Independent allow-lists for commands and info fields
///
/// Grows by `add`; `withdraw` only undoes an add whose transport
/// subscription failed. Readers on other threads receive immutable snapshots.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    commands: Vec<CompiledPattern>,
    info: Vec<CompiledPattern>,
}

impl SubscriptionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command_filter(&mut self, pattern: &SubscriptionPattern) -> Result<bool> {
        self.add(EntityKind::Command, pattern)
    }

    pub fn add_info_filter(&mut self, pattern: &SubscriptionPattern) -> Result<bool> {
        self.add(EntityKind::Info, pattern)
    }

    /// Compile and store a pattern.
    ///
    /// Returns `Ok(false)` if an identical pattern is already stored.
    pub fn add(&mut self, kind: EntityKind, pattern: &SubscriptionPattern) -> Result<bool> {
        let set = self.set_mut(kind);
        if set.iter().any(|p| &p.pattern == pattern) {
            return Ok(false);
        }
        set.push(pattern.compile()?);
        Ok(true)
    }

    /// Drop a stored pattern. Returns whether it was present.
    pub fn withdraw(&mut self, kind: EntityKind, pattern: &SubscriptionPattern) -> bool {
        let set = self.set_mut(kind);
        let before = set.len();
        set.retain(|p| &p.pattern != pattern);
        set.len() != before
    }

    /// Empty set accepts everything; otherwise any pattern must match
    pub fn accepts(&self, identifier: &Identifier, kind: EntityKind) -> bool {
        let set = self.set(kind);
        set.is_empty() || set.iter().any(|p| p.matches(kind, identifier))
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.set(kind).len()
    }

    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.set(kind).is_empty()
    }

    fn set(&self, kind: EntityKind) -> &Vec<CompiledPattern> {
        match kind {
            EntityKind::Command => &self.commands,
            EntityKind::Info => &self.info,
        }
    }

    fn set_mut(&mut self, kind: EntityKind) -> &mut Vec<CompiledPattern> {
        match kind {
            EntityKind::Command => &mut self.commands,
            EntityKind::Info => &mut self.info,
        }
    }
}
