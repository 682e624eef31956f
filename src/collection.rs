// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Insertion-ordered element store keyed by id

use crate::config::IdPolicy;
use crate::element::{Element, AUTO_ID};
use crate::error::CollectionError;
use crate::geometry::BoundingBox;
use ahash::AHashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Collection shared between loader workers and the scene
pub type SharedCollection = Arc<RwLock<ElementCollection>>;

/// Elements in insertion order, addressable by id.
///
/// Elements added with a negative id get the next free automatic id.
/// Adding an element whose id is already present replaces that element and
/// keeps its position.
#[derive(Debug, Clone, Default)]
pub struct ElementCollection {
    order: Vec<i64>,
    elements: AHashMap<i64, Element>,
    next_id: i64,
    policy: IdPolicy,
}

impl ElementCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: IdPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }

    pub fn into_shared(self) -> SharedCollection {
        Arc::new(RwLock::new(self))
    }

    /// Store an element and return its id
    pub fn add(&mut self, mut element: Element) -> i64 {
        let id = if element.id() < 0 {
            let id = self.next_free_id();
            element.set_id(id);
            id
        } else {
            element.id()
        };
        self.next_id = self.next_id.max(id.saturating_add(1));

        if self.elements.insert(id, element).is_some() {
            debug!(id, "replaced element");
        } else {
            self.order.push(id);
        }
        id
    }

    fn next_free_id(&mut self) -> i64 {
        while self.elements.contains_key(&self.next_id) {
            self.next_id += 1;
        }
        self.next_id
    }

    pub fn remove(&mut self, id: i64) -> Result<Element, CollectionError> {
        let element = self
            .elements
            .remove(&id)
            .ok_or(CollectionError::UnknownId(id))?;
        self.order.retain(|&i| i != id);
        if self.order.is_empty() && self.policy == IdPolicy::ResetWhenEmpty {
            self.next_id = 0;
        }
        Ok(element)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.elements.clear();
        if self.policy == IdPolicy::ResetWhenEmpty {
            self.next_id = 0;
        }
    }

    pub fn get(&self, id: i64) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    /// Lookup that reports unknown ids as errors
    pub fn try_get(&self, id: i64) -> Result<&Element, CollectionError> {
        self.get(id).ok_or(CollectionError::UnknownId(id))
    }

    pub fn try_get_mut(&mut self, id: i64) -> Result<&mut Element, CollectionError> {
        self.elements
            .get_mut(&id)
            .ok_or(CollectionError::UnknownId(id))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.order
    }

    /// Id of the most recently inserted element, [`AUTO_ID`] when empty
    pub fn last_id(&self) -> i64 {
        self.order.last().copied().unwrap_or(AUTO_ID)
    }

    /// Elements in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    pub fn visible(&self) -> impl Iterator<Item = &Element> {
        self.iter().filter(|e| e.is_visible())
    }

    /// Bounds of all visible elements
    pub fn bounding_box(&self) -> BoundingBox {
        self.visible()
            .map(Element::bounding_box)
            .fold(BoundingBox::empty(), |acc, b| acc.union(&b))
    }
}
