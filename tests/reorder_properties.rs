//! Property tests for the reorder coordinator: whatever sequence of drops
//! and cancels arrives, every channel stays listed by exactly one section,
//! and each write describes the order the model ended up with.

use std::collections::BTreeSet;

use proptest::prelude::*;

use chanbar::model::{Channel, ChannelId, Hierarchy, Section};
use chanbar::ops::drag::{DragItem, Position};
use chanbar::ops::persist::PersistRequest;
use chanbar::ops::reorder::{DragEnd, ReorderCoordinator};
use chanbar::ops::resolve::DropTarget;

/// Sections `s0..` holding `sizes[i]` channels named `s{i}c{j}`.
fn build(sizes: &[usize]) -> Hierarchy {
    let mut sections = Vec::new();
    let mut channels = Vec::new();
    for (i, n) in sizes.iter().enumerate() {
        let mut section = Section::new(format!("s{}", i), format!("S{}", i), i);
        for j in 0..*n {
            let id = format!("s{}c{}", i, j);
            section.channels.push(ChannelId::from(id.as_str()));
            channels.push(Channel::new(id.as_str(), id.as_str()));
        }
        sections.push(section);
    }
    Hierarchy::new(sections, channels).unwrap()
}

/// A gesture in terms of indices, mapped onto whatever the hierarchy holds
/// at the time it runs.
#[derive(Debug, Clone)]
enum Gesture {
    SectionOnSection { from: usize, onto: usize },
    ChannelOnChannel { from: usize, onto: usize },
    ChannelOnSection { from: usize, onto: usize },
    /// Start dragging a channel, hover over another, then cancel
    Cancelled { from: usize, onto: usize },
}

fn arb_gesture() -> impl Strategy<Value = Gesture> {
    (0usize..4, any::<usize>(), any::<usize>()).prop_map(|(kind, from, onto)| match kind {
        0 => Gesture::SectionOnSection { from, onto },
        1 => Gesture::ChannelOnChannel { from, onto },
        2 => Gesture::ChannelOnSection { from, onto },
        _ => Gesture::Cancelled { from, onto },
    })
}

fn all_channels(h: &Hierarchy) -> Vec<ChannelId> {
    h.sections()
        .iter()
        .flat_map(|s| s.channels.iter().cloned())
        .collect()
}

/// `(item, hits)` for a gesture, or `None` if there is nothing to drag.
fn plan(h: &Hierarchy, gesture: &Gesture) -> Option<(DragItem, Vec<DropTarget>)> {
    let sections = h.sections();
    let channels = all_channels(h);
    match *gesture {
        Gesture::SectionOnSection { from, onto } => {
            let item = DragItem::Section(sections[from % sections.len()].id.clone());
            let hits = vec![DropTarget::Section(sections[onto % sections.len()].id.clone())];
            Some((item, hits))
        }
        Gesture::ChannelOnChannel { from, onto } | Gesture::Cancelled { from, onto } => {
            if channels.is_empty() {
                return None;
            }
            let target = channels[onto % channels.len()].clone();
            let (owner, _) = h.owner_of(&target)?;
            let item = DragItem::Channel(channels[from % channels.len()].clone());
            let hits = vec![
                DropTarget::Section(sections[owner].id.clone()),
                DropTarget::Channel(target),
            ];
            Some((item, hits))
        }
        Gesture::ChannelOnSection { from, onto } => {
            if channels.is_empty() {
                return None;
            }
            let item = DragItem::Channel(channels[from % channels.len()].clone());
            let hits = vec![DropTarget::Section(sections[onto % sections.len()].id.clone())];
            Some((item, hits))
        }
    }
}

proptest! {
    /// Every channel is listed by exactly one section after every gesture.
    #[test]
    fn channels_keep_exactly_one_owner(
        sizes in prop::collection::vec(0usize..5, 1..5),
        gestures in prop::collection::vec(arb_gesture(), 0..40),
    ) {
        let mut coordinator = ReorderCoordinator::new(build(&sizes), Vec::<PersistRequest>::new());
        let expected: BTreeSet<ChannelId> = all_channels(coordinator.hierarchy()).into_iter().collect();
        let section_count = coordinator.hierarchy().sections().len();
        let mut commits = 0usize;

        for gesture in &gestures {
            let Some((item, hits)) = plan(coordinator.hierarchy(), gesture) else {
                continue;
            };

            if let Gesture::Cancelled { .. } = gesture {
                let before = coordinator.hierarchy().clone();
                prop_assert!(coordinator.begin_drag(item, Position::new(0, 0)).is_ok());
                coordinator.hover(Position::new(3, 3), &hits);
                prop_assert!(coordinator.cancel());
                prop_assert_eq!(coordinator.hierarchy(), &before);
                prop_assert!(!coordinator.is_dragging());
                continue;
            }

            match coordinator.drop_onto(item, &hits) {
                Ok(DragEnd::Committed(_)) => commits += 1,
                Ok(DragEnd::Cancelled(_)) => {}
                Err(e) => prop_assert!(false, "drop failed: {}", e),
            }

            let h = coordinator.hierarchy();
            prop_assert!(h.validate().is_ok());
            prop_assert_eq!(h.sections().len(), section_count);

            let listed = all_channels(h);
            let unique: BTreeSet<ChannelId> = listed.iter().cloned().collect();
            prop_assert_eq!(listed.len(), unique.len());
            prop_assert_eq!(&unique, &expected);

            for (rank, section) in h.sections().iter().enumerate() {
                prop_assert_eq!(section.order, rank);
            }
        }

        prop_assert_eq!(coordinator.sink().len(), commits);
    }

    /// The latest write carries the model's order for the sections it names.
    #[test]
    fn writes_match_the_committed_model(
        sizes in prop::collection::vec(1usize..4, 2..4),
        gestures in prop::collection::vec(arb_gesture(), 1..20),
    ) {
        let mut coordinator = ReorderCoordinator::new(build(&sizes), Vec::<PersistRequest>::new());

        for gesture in &gestures {
            if let Gesture::Cancelled { .. } = gesture {
                continue;
            }
            let Some((item, hits)) = plan(coordinator.hierarchy(), gesture) else {
                continue;
            };
            let Ok(DragEnd::Committed(commit)) = coordinator.drop_onto(item, &hits) else {
                continue;
            };

            let h = coordinator.hierarchy();
            prop_assert_eq!(coordinator.sink().last(), Some(&commit.request));
            match &commit.request {
                PersistRequest::SectionOrder { ordered_section_ids } => {
                    prop_assert_eq!(ordered_section_ids, &h.section_ids());
                }
                PersistRequest::ChannelOrder(order) => {
                    let source = h.section(&order.source_section_id).unwrap();
                    let dest = h.section(&order.destination_section_id).unwrap();
                    prop_assert_eq!(&order.source_channel_ids, &source.channels);
                    prop_assert_eq!(&order.destination_channel_ids, &dest.channels);
                }
            }
        }
    }
}
