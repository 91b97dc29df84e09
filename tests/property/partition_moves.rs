//! Property-based tests for the board partition.
//!
//! Uses proptest to verify:
//! 1. Reordering a task to `j` and back to `i` restores the lane.
//! 2. A cross-section move lands at `min(k, len)` and the task sits in no
//!    other lane; every other task keeps its relative order.
//! 3. Installing an authoritative lane never leaves a task id in two lanes.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use proptest::prelude::*;
use taskboard::board::Partition;
use taskboard_proto::{Section, SectionId, Task, TaskId};

const SECTIONS: [&str; 3] = ["s0", "s1", "s2"];

/// Builds a partition whose lanes hold `sizes[i]` tasks, ids unique.
fn partition(sizes: &[usize]) -> Partition {
    let sections = SECTIONS
        .iter()
        .zip(0u32..)
        .map(|(id, order)| Section::new(*id, "p", format!("Section {order}"), order))
        .collect();
    let mut partition = Partition::new(sections);
    let mut next = 0;
    for (section, &size) in SECTIONS.iter().zip(sizes) {
        let tasks = (next..next + size)
            .map(|n| Task::new(format!("t{n}"), format!("Task {n}"), "p"))
            .collect();
        next += size;
        partition.replace_lane(&SectionId::from(*section), tasks);
    }
    partition
}

fn lane_ids(partition: &Partition, section: &str) -> Vec<TaskId> {
    partition.ids(&SectionId::from(section))
}

fn arb_sizes() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..6, SECTIONS.len())
}

proptest! {
    #[test]
    fn reorder_there_and_back_restores_lane(
        size in 1usize..8,
        i in any::<prop::sample::Index>(),
        j in any::<prop::sample::Index>(),
    ) {
        let mut partition = partition(&[size, 0, 0]);
        let section = SectionId::from("s0");
        let before = lane_ids(&partition, "s0");
        let i = i.index(size);
        let j = j.index(size);
        let moved = before[i].clone();

        let landed = partition.reorder(&section, &moved, j).unwrap();
        prop_assert_eq!(landed, j);
        prop_assert_eq!(partition.position(&section, &moved), Some(j));

        partition.reorder(&section, &moved, i).unwrap();
        prop_assert_eq!(lane_ids(&partition, "s0"), before);
    }

    #[test]
    fn move_lands_clamped_and_exclusive(
        sizes in arb_sizes(),
        from in 0usize..3,
        to in 0usize..3,
        pick in any::<prop::sample::Index>(),
        k in 0usize..12,
    ) {
        prop_assume!(sizes[from] > 0);
        let mut partition = partition(&sizes);
        let (from_id, to_id) = (SectionId::from(SECTIONS[from]), SectionId::from(SECTIONS[to]));
        let source = lane_ids(&partition, SECTIONS[from]);
        let moved = source[pick.index(source.len())].clone();
        let total = partition.task_count();

        let mut expected_dest = lane_ids(&partition, SECTIONS[to]);
        expected_dest.retain(|id| id != &moved);
        let expected_index = k.min(expected_dest.len());
        expected_dest.insert(expected_index, moved.clone());

        let landed = partition.move_task(&moved, &from_id, &to_id, k).unwrap();

        prop_assert_eq!(landed, expected_index);
        prop_assert_eq!(lane_ids(&partition, SECTIONS[to]), expected_dest);
        prop_assert_eq!(partition.task_count(), total);
        prop_assert_eq!(partition.locate(&moved).map(|(s, i)| (s.clone(), i)), Some((to_id, landed)));
        for (section, tasks) in partition.iter() {
            if section.id.as_str() != SECTIONS[to] {
                prop_assert!(tasks.iter().all(|t| t.id != moved));
            }
        }
        if from != to {
            let mut rest = source.clone();
            rest.retain(|id| id != &moved);
            prop_assert_eq!(lane_ids(&partition, SECTIONS[from]), rest);
        }
    }

    #[test]
    fn replace_lane_keeps_ids_unique(
        sizes in arb_sizes(),
        target in 0usize..3,
        incoming in prop::collection::vec(0usize..20, 0..10),
    ) {
        let mut partition = partition(&sizes);
        let tasks = incoming
            .iter()
            .map(|n| Task::new(format!("t{n}"), format!("Task {n}"), "p"))
            .collect();

        prop_assert!(partition.replace_lane(&SectionId::from(SECTIONS[target]), tasks));

        let mut seen = HashSet::new();
        for (_, tasks) in partition.iter() {
            for task in tasks {
                prop_assert!(seen.insert(task.id.clone()), "duplicate id {}", task.id);
            }
        }
        let mut first_seen = HashSet::new();
        let expected: Vec<TaskId> = incoming
            .iter()
            .map(|n| TaskId::from(format!("t{n}")))
            .filter(|id| first_seen.insert(id.clone()))
            .collect();
        prop_assert_eq!(lane_ids(&partition, SECTIONS[target]), expected);
    }
}
