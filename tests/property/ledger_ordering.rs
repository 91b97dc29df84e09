//! Property-based tests for ledger placement and pagination.
//!
//! Uses proptest to verify:
//! 1. A placement update lands the task at `min(order, len)` in its target
//!    section and removes it from every other section.
//! 2. Walking every page of a section, for any page size, yields the lane.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use taskboard_proto::ledger::Ledger;
use taskboard_proto::{Section, SectionId, Task, TaskId, TaskPatch};

const SECTIONS: [&str; 2] = ["a", "b"];

fn ledger(sizes: (usize, usize)) -> Ledger {
    let mut ledger = Ledger::new();
    for (order, id) in (0u32..).zip(SECTIONS) {
        ledger.add_section(Section::new(id, "p", id.to_uppercase(), order));
    }
    for n in 0..sizes.0 {
        ledger
            .insert_task(&SectionId::from("a"), Task::new(format!("a{n}"), "A", "p"))
            .unwrap();
    }
    for n in 0..sizes.1 {
        ledger
            .insert_task(&SectionId::from("b"), Task::new(format!("b{n}"), "B", "p"))
            .unwrap();
    }
    ledger
}

fn lane(ledger: &Ledger, section: &str) -> Vec<TaskId> {
    ledger.lane(&SectionId::from(section)).unwrap().to_vec()
}

proptest! {
    #[test]
    fn placement_lands_clamped(
        sizes in (1usize..6, 0usize..6),
        pick in any::<prop::sample::Index>(),
        cross in any::<bool>(),
        order in 0usize..10,
    ) {
        let mut ledger = ledger(sizes);
        let moved = lane(&ledger, "a")[pick.index(sizes.0)].clone();
        let target = if cross { "b" } else { "a" };

        let mut expected = lane(&ledger, target);
        expected.retain(|id| id != &moved);
        let index = order.min(expected.len());
        expected.insert(index, moved.clone());

        let patch = if cross {
            TaskPatch::placement(SectionId::from("b"), order)
        } else {
            TaskPatch::order(order)
        };
        ledger.update(&moved, &patch).unwrap();

        prop_assert_eq!(lane(&ledger, target), expected);
        prop_assert_eq!(ledger.section_of(&moved), Some(&SectionId::from(target)));
        prop_assert_eq!(ledger.len(), sizes.0 + sizes.1);
        if cross {
            prop_assert!(!lane(&ledger, "a").contains(&moved));
        }
    }

    #[test]
    fn pages_concatenate_to_lane(len in 0usize..20, size in 1usize..7) {
        let ledger = ledger((len, 0));
        let section = SectionId::from("a");

        let mut collected = Vec::new();
        let mut page = 0;
        loop {
            let chunk = ledger.page(&section, page, size).unwrap();
            prop_assert_eq!(chunk.total_elements, len);
            collected.extend(chunk.content.into_iter().map(|t| t.id));
            if chunk.last {
                break;
            }
            page += 1;
        }
        prop_assert_eq!(collected, lane(&ledger, "a"));
    }
}
