//! The reorder coordinator: the one writer of the hierarchy.
//!
//! A gesture runs `Idle → Dragging → Resolving → Committed → Idle`, or
//! `Dragging → Cancelled → Idle`. Nothing is mutated while dragging; the
//! hierarchy changes only inside [`ReorderCoordinator::release`], in one
//! synchronous step, after which the matching write is handed to the sink
//! and not awaited.

use crate::model::{ChannelId, Hierarchy, HierarchyError, SectionId};

use super::drag::{DragConfig, DragItem, DragSession, Position};
use super::persist::{ChannelOrder, PersistRequest, PersistSink};
use super::resolve::{self, Container, DropTarget, Resolution};

/// Error type for starting a drag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("a drag is already in progress")]
    AlreadyDragging,
    #[error("unknown {0}")]
    UnknownItem(DragItem),
}

/// Where the coordinator is in a gesture
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Dragging(DragSession),
    /// Only observable from inside `release`
    Resolving,
}

/// Why a drag ended without a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit cancel (Escape)
    Requested,
    /// Released where the resolver found nothing to do
    NoTarget,
}

/// A committed drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub item: DragItem,
    pub resolution: Resolution,
    pub request: PersistRequest,
    /// Sequence number the sink assigned to the write
    pub seq: u64,
}

/// How a gesture ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEnd {
    Committed(Commit),
    Cancelled(CancelReason),
}

pub struct ReorderCoordinator<S> {
    hierarchy: Hierarchy,
    phase: Phase,
    config: DragConfig,
    sink: S,
}

impl<S: PersistSink> ReorderCoordinator<S> {
    pub fn new(hierarchy: Hierarchy, sink: S) -> Self {
        ReorderCoordinator {
            hierarchy,
            phase: Phase::Idle,
            config: DragConfig::default(),
            sink,
        }
    }

    pub fn with_config(mut self, config: DragConfig) -> Self {
        self.config = config;
        self
    }

    /// Read-only view of the current hierarchy
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.phase {
            Phase::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Swap in a freshly loaded hierarchy (e.g. after an external change).
    ///
    /// An active drag survives and its previewed target is re-resolved
    /// against the new hierarchy, so stale ids resolve to nothing.
    pub fn replace_hierarchy(&mut self, hierarchy: Hierarchy) {
        tracing::debug!(
            sections = hierarchy.sections().len(),
            channels = hierarchy.channel_count(),
            "hierarchy replaced"
        );
        self.hierarchy = hierarchy;
        if let Phase::Dragging(session) = &mut self.phase {
            session.target = resolve::resolve(&self.hierarchy, &session.item, &session.hits);
        }
    }

    /// `Idle → Dragging`
    pub fn begin_drag(&mut self, item: DragItem, at: Position) -> Result<(), DragError> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(DragError::AlreadyDragging);
        }
        let origin = match &item {
            DragItem::Section(id) => {
                if self.hierarchy.section(id).is_none() {
                    return Err(DragError::UnknownItem(item));
                }
                None
            }
            DragItem::Channel(id) => match self.hierarchy.owner_of(id) {
                Some((si, _)) => Some(self.hierarchy.sections()[si].id.clone()),
                None => return Err(DragError::UnknownItem(item)),
            },
        };
        tracing::debug!(%item, ?origin, "drag started");
        self.phase = Phase::Dragging(DragSession::new(item, origin, at));
        Ok(())
    }

    /// Pointer moved while dragging: record the position and re-resolve.
    pub fn hover(&mut self, at: Position, hits: &[DropTarget]) -> Resolution {
        let Phase::Dragging(session) = &mut self.phase else {
            return Resolution::Ignore;
        };
        session.current = at;
        if session.hits != hits {
            session.hits = hits.to_vec();
            session.target = resolve::resolve(&self.hierarchy, &session.item, hits);
        }
        session.target.clone()
    }

    /// `Dragging → Cancelled → Idle`. Returns whether a drag was active.
    pub fn cancel(&mut self) -> bool {
        if let Phase::Dragging(session) = &self.phase {
            tracing::debug!(item = %session.item, "drag cancelled");
            self.phase = Phase::Idle;
            true
        } else {
            false
        }
    }

    /// Pointer released: `Dragging → Resolving → Committed | Cancelled → Idle`.
    ///
    /// The last targets seen by [`hover`](Self::hover) are classified against
    /// the hierarchy as of the latest commit. An `InvariantViolation` (or any
    /// other mutator error) leaves the hierarchy unchanged and is returned to
    /// the caller as a defect. Returns `None` when no drag was active.
    pub fn release(&mut self) -> Option<Result<DragEnd, HierarchyError>> {
        let session = match std::mem::replace(&mut self.phase, Phase::Resolving) {
            Phase::Dragging(session) => session,
            other => {
                self.phase = other;
                return None;
            }
        };

        let resolution = resolve::resolve(&self.hierarchy, &session.item, &session.hits);
        let result = self.commit(session.item, resolution);
        self.phase = Phase::Idle;
        Some(result)
    }

    /// Run a whole gesture at once: start dragging `item`, hover over
    /// `hits`, release. Used by the CLI and the keyboard move path.
    pub fn drop_onto(&mut self, item: DragItem, hits: &[DropTarget]) -> Result<DragEnd, DropError> {
        self.begin_drag(item, Position::default())?;
        self.hover(Position::default(), hits);
        match self.release() {
            Some(result) => Ok(result?),
            None => Ok(DragEnd::Cancelled(CancelReason::NoTarget)),
        }
    }

    fn commit(&mut self, item: DragItem, resolution: Resolution) -> Result<DragEnd, HierarchyError> {
        let request = match &resolution {
            Resolution::Ignore => {
                tracing::debug!(%item, "released over no valid target");
                return Ok(DragEnd::Cancelled(CancelReason::NoTarget));
            }
            Resolution::ReorderWithinContainer {
                container: Container::Sections,
                from,
                to,
            } => {
                self.hierarchy.reorder_sections(*from, *to)?;
                PersistRequest::SectionOrder {
                    ordered_section_ids: self.hierarchy.section_ids(),
                }
            }
            Resolution::ReorderWithinContainer {
                container: Container::Section(section),
                from,
                to,
            } => {
                self.hierarchy
                    .reorder_channels_within_section(section, *from, *to)?;
                let order = self.channel_ids(section);
                PersistRequest::ChannelOrder(ChannelOrder {
                    source_section_id: section.clone(),
                    destination_section_id: section.clone(),
                    source_channel_ids: order.clone(),
                    destination_channel_ids: order,
                })
            }
            Resolution::TransferBeforeItem {
                from_section,
                from_index,
                to_section,
                to_index,
            } => {
                self.hierarchy.move_channel_across_sections(
                    from_section,
                    *from_index,
                    to_section,
                    Some(*to_index),
                )?;
                self.transfer_request(from_section, to_section)
            }
            Resolution::TransferToEmptyContainer {
                from_section,
                from_index,
                to_section,
            } => {
                self.hierarchy.move_channel_across_sections(
                    from_section,
                    *from_index,
                    to_section,
                    None,
                )?;
                self.transfer_request(from_section, to_section)
            }
        };

        let seq = self.sink.submit(request.clone());
        tracing::info!(%item, seq, ?resolution, "drop committed");
        Ok(DragEnd::Committed(Commit {
            item,
            resolution,
            request,
            seq,
        }))
    }

    fn channel_ids(&self, section: &SectionId) -> Vec<ChannelId> {
        self.hierarchy
            .section(section)
            .map(|s| s.channels.clone())
            .unwrap_or_default()
    }

    fn transfer_request(&self, from: &SectionId, to: &SectionId) -> PersistRequest {
        PersistRequest::ChannelOrder(ChannelOrder {
            source_section_id: from.clone(),
            destination_section_id: to.clone(),
            source_channel_ids: self.channel_ids(from),
            destination_channel_ids: self.channel_ids(to),
        })
    }
}

/// Error type for one-shot drops
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropError {
    #[error("{0}")]
    Drag(#[from] DragError),
    #[error("{0}")]
    Hierarchy(#[from] HierarchyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::hierarchy::fixtures::{hierarchy, ids, section_order};
    use pretty_assertions::assert_eq;

    fn coordinator(spec: &[(&str, &[&str])]) -> ReorderCoordinator<Vec<PersistRequest>> {
        ReorderCoordinator::new(hierarchy(spec), Vec::new())
    }

    fn ch(id: &str) -> DropTarget {
        DropTarget::Channel(id.into())
    }

    fn sec(id: &str) -> DropTarget {
        DropTarget::Section(id.into())
    }

    fn committed(end: DragEnd) -> Commit {
        match end {
            DragEnd::Committed(commit) => commit,
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[test]
    fn reorder_channel_within_section() {
        let mut c = coordinator(&[("s", &["a", "b", "c", "d"])]);
        let commit = committed(c.drop_onto(DragItem::Channel("d".into()), &[sec("s"), ch("b")]).unwrap());
        assert_eq!(ids(c.hierarchy(), "s"), vec!["a", "d", "b", "c"]);
        assert_eq!(commit.seq, 1);
        assert_eq!(
            c.sink(),
            &vec![PersistRequest::ChannelOrder(ChannelOrder {
                source_section_id: "s".into(),
                destination_section_id: "s".into(),
                source_channel_ids: vec!["a".into(), "d".into(), "b".into(), "c".into()],
                destination_channel_ids: vec!["a".into(), "d".into(), "b".into(), "c".into()],
            })]
        );
    }

    #[test]
    fn reorder_sections_persists_full_order() {
        let mut c = coordinator(&[("s1", &[]), ("s2", &[]), ("s3", &[])]);
        c.drop_onto(DragItem::Section("s3".into()), &[sec("s1")]).unwrap();
        assert_eq!(section_order(c.hierarchy()), vec!["s3", "s1", "s2"]);
        assert_eq!(
            c.sink(),
            &vec![PersistRequest::SectionOrder {
                ordered_section_ids: vec!["s3".into(), "s1".into(), "s2".into()],
            }]
        );
    }

    #[test]
    fn transfer_before_item_persists_both_sections_once() {
        let mut c = coordinator(&[("s1", &["a", "b"]), ("s2", &["c", "d"])]);
        c.drop_onto(DragItem::Channel("b".into()), &[sec("s2"), ch("d")]).unwrap();
        assert_eq!(ids(c.hierarchy(), "s1"), vec!["a"]);
        assert_eq!(ids(c.hierarchy(), "s2"), vec!["c", "b", "d"]);
        assert_eq!(
            c.sink(),
            &vec![PersistRequest::ChannelOrder(ChannelOrder {
                source_section_id: "s1".into(),
                destination_section_id: "s2".into(),
                source_channel_ids: vec!["a".into()],
                destination_channel_ids: vec!["c".into(), "b".into(), "d".into()],
            })]
        );
    }

    #[test]
    fn transfer_into_empty_section() {
        let mut c = coordinator(&[("s1", &["a"]), ("s2", &[])]);
        c.drop_onto(DragItem::Channel("a".into()), &[sec("s2")]).unwrap();
        assert!(ids(c.hierarchy(), "s1").is_empty());
        assert_eq!(ids(c.hierarchy(), "s2"), vec!["a"]);
        match &c.sink()[0] {
            PersistRequest::ChannelOrder(order) => {
                assert!(order.is_transfer());
                assert!(order.source_channel_ids.is_empty());
                assert_eq!(order.destination_channel_ids, vec![ChannelId::from("a")]);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn drop_on_own_position_changes_nothing() {
        let mut c = coordinator(&[("s1", &["a", "b"]), ("s2", &["c"])]);
        let before = c.hierarchy().clone();
        let end = c.drop_onto(DragItem::Channel("a".into()), &[sec("s1"), ch("a")]).unwrap();
        assert_eq!(end, DragEnd::Cancelled(CancelReason::NoTarget));
        assert_eq!(c.hierarchy(), &before);
        assert!(c.sink().is_empty());
        assert_eq!(c.phase(), &Phase::Idle);
    }

    #[test]
    fn cancel_mid_drag_leaves_model_untouched() {
        let mut c = coordinator(&[("s1", &["a", "b"]), ("s2", &["c"])]);
        let before = c.hierarchy().clone();
        c.begin_drag(DragItem::Channel("a".into()), Position::new(2, 3)).unwrap();
        let target = c.hover(Position::new(2, 6), &[sec("s2"), ch("c")]);
        assert!(!target.is_ignore());
        assert_eq!(c.hierarchy(), &before);

        assert!(c.cancel());
        assert_eq!(c.hierarchy(), &before);
        assert!(c.sink().is_empty());
        assert!(c.session().is_none());
        assert!(!c.cancel());
    }

    #[test]
    fn no_reentrant_drag() {
        let mut c = coordinator(&[("s1", &["a", "b"])]);
        c.begin_drag(DragItem::Channel("a".into()), Position::default()).unwrap();
        assert_eq!(
            c.begin_drag(DragItem::Channel("b".into()), Position::default()),
            Err(DragError::AlreadyDragging)
        );
    }

    #[test]
    fn unknown_item_does_not_start() {
        let mut c = coordinator(&[("s1", &["a"])]);
        assert!(matches!(
            c.begin_drag(DragItem::Channel("nope".into()), Position::default()),
            Err(DragError::UnknownItem(_))
        ));
        assert!(matches!(
            c.begin_drag(DragItem::Section("nope".into()), Position::default()),
            Err(DragError::UnknownItem(_))
        ));
        assert_eq!(c.phase(), &Phase::Idle);
    }

    #[test]
    fn session_tracks_origin_and_target() {
        let mut c = coordinator(&[("s1", &["a"]), ("s2", &[])]);
        c.begin_drag(DragItem::Channel("a".into()), Position::new(1, 1)).unwrap();
        c.hover(Position::new(1, 4), &[sec("s2")]);
        let session = c.session().unwrap();
        assert_eq!(session.origin, Some("s1".into()));
        assert_eq!(session.current, Position::new(1, 4));
        assert!(matches!(
            session.target,
            Resolution::TransferToEmptyContainer { .. }
        ));
    }

    #[test]
    fn release_resolves_against_replaced_hierarchy() {
        let mut c = coordinator(&[("s1", &["a"]), ("s2", &["c"])]);
        c.begin_drag(DragItem::Channel("a".into()), Position::default()).unwrap();
        c.hover(Position::default(), &[sec("s2"), ch("c")]);
        // Target channel deleted elsewhere while the drag was in flight.
        c.replace_hierarchy(hierarchy(&[("s1", &["a"]), ("s2", &[])]));
        assert!(c.session().unwrap().target.is_ignore());
        let end = c.release().unwrap().unwrap();
        assert_eq!(end, DragEnd::Cancelled(CancelReason::NoTarget));
        assert!(c.sink().is_empty());
    }

    #[test]
    fn replace_hierarchy_refreshes_previewed_target() {
        let mut c = coordinator(&[("s1", &["a", "b"]), ("s2", &["c"])]);
        c.begin_drag(DragItem::Channel("a".into()), Position::default()).unwrap();
        c.hover(Position::default(), &[sec("s2"), ch("c")]);
        assert!(matches!(
            c.session().unwrap().target,
            Resolution::TransferBeforeItem { to_index: 0, .. }
        ));

        // "a" now lives beside "c"; the same hover is a plain reorder.
        c.replace_hierarchy(hierarchy(&[("s1", &["b"]), ("s2", &["c", "a"])]));
        assert_eq!(
            c.session().unwrap().target,
            Resolution::ReorderWithinContainer {
                container: Container::Section("s2".into()),
                from: 1,
                to: 0,
            }
        );
        assert_eq!(c.sink().len(), 0);
    }

    #[test]
    fn release_without_drag_is_none() {
        let mut c = coordinator(&[("s1", &[])]);
        assert!(c.release().is_none());
        assert_eq!(c.phase(), &Phase::Idle);
    }

    #[test]
    fn successive_commits_get_increasing_seq() {
        let mut c = coordinator(&[("s1", &["a", "b"]), ("s2", &[])]);
        let first = committed(c.drop_onto(DragItem::Channel("b".into()), &[ch("a")]).unwrap());
        let second = committed(c.drop_onto(DragItem::Channel("a".into()), &[sec("s2")]).unwrap());
        assert!(second.seq > first.seq);
        assert_eq!(c.sink().len(), 2);
        c.hierarchy().validate().unwrap();
    }
}
