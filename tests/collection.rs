// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Element collection identity and concurrent insertion

use mineview::{ElementBuilder, ElementCollection, IdPolicy, AUTO_ID};
use rayon::prelude::*;
use std::collections::HashSet;

fn line(name: &str) -> mineview::Element {
    ElementBuilder::line()
        .vertices(vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]])
        .name(name)
        .build()
        .unwrap()
}

#[test]
fn test_concurrent_adds_get_unique_ids() {
    let collection = ElementCollection::new().into_shared();

    let ids: Vec<i64> = (0..256)
        .into_par_iter()
        .map(|i| {
            let element = line(&format!("hole-{}", i));
            collection.write().unwrap().add(element)
        })
        .collect();

    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 256);
    assert_eq!(collection.read().unwrap().len(), 256);
    assert!(ids.iter().all(|&id| (0..256).contains(&id)));
}

#[test]
fn test_ids_follow_insertion_order() {
    let mut collection = ElementCollection::new();
    assert_eq!(collection.last_id(), AUTO_ID);

    let a = collection.add(line("a"));
    let b = collection.add(line("b"));
    assert_eq!((a, b), (0, 1));
    assert_eq!(collection.last_id(), 1);
    assert_eq!(collection.ids(), &[0, 1]);

    let names: Vec<&str> = collection.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_auto_ids_skip_explicit_ones() {
    let mut collection = ElementCollection::new();
    let explicit = ElementBuilder::line()
        .vertices(vec![[0.0; 3], [1.0, 0.0, 0.0]])
        .id(1)
        .build()
        .unwrap();
    collection.add(line("zero"));
    collection.add(explicit);
    assert_eq!(collection.add(line("next")), 2);
}

#[test]
fn test_clear_respects_policy() {
    let mut monotonic = ElementCollection::new();
    monotonic.add(line("a"));
    monotonic.add(line("b"));
    monotonic.clear();
    assert!(monotonic.is_empty());
    assert_eq!(monotonic.add(line("c")), 2);

    let mut resetting = ElementCollection::with_policy(IdPolicy::ResetWhenEmpty);
    resetting.add(line("a"));
    resetting.add(line("b"));
    resetting.clear();
    assert_eq!(resetting.add(line("c")), 0);
}

#[test]
fn test_remove_keeps_numbering_while_not_empty() {
    let mut collection = ElementCollection::with_policy(IdPolicy::ResetWhenEmpty);
    let a = collection.add(line("a"));
    collection.add(line("b"));
    collection.remove(a).unwrap();
    assert_eq!(collection.add(line("c")), 2);
    assert!(collection.remove(a).is_err());
}

#[test]
fn test_bounding_box_covers_visible_elements() {
    let mut collection = ElementCollection::new();
    let hidden = collection.add(
        ElementBuilder::line()
            .vertices(vec![[-50.0, 0.0, 0.0], [-40.0, 0.0, 0.0]])
            .build()
            .unwrap(),
    );
    collection.add(line("shown"));
    collection.get_mut(hidden).unwrap().set_visible(false);

    let bbox = collection.bounding_box();
    assert_eq!(bbox.to_array(), [0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    assert_eq!(collection.visible().count(), 1);
}
