use std::collections::HashMap;
use tracing::debug;

use crate::common::{CutKey, RobustCut};

/// Opaque index of a cut inside the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CutHandle(usize);

impl CutHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Marks the pool size when a search node was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Row pool of robust cuts, owned by the master problem.
#[derive(Debug, Clone, Default)]
pub struct CutPool {
    cuts: Vec<RobustCut>,
    index: HashMap<CutKey, CutHandle>,
}

impl CutPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `cut`, or returns the handle of an identical cut already in
    /// the pool.
    pub fn insert(&mut self, cut: RobustCut) -> CutHandle {
        let key = cut.key();
        if let Some(&handle) = self.index.get(&key) {
            debug!("cut {} already in pool as {handle:?}", cut.name());
            return handle;
        }

        let handle = CutHandle(self.cuts.len());
        debug!("add cut {cut} as {handle:?}");
        self.cuts.push(cut);
        self.index.insert(key, handle);
        handle
    }

    pub fn get(&self, handle: CutHandle) -> Option<&RobustCut> {
        self.cuts.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CutHandle, &RobustCut)> {
        self.cuts
            .iter()
            .enumerate()
            .map(|(idx, cut)| (CutHandle(idx), cut))
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.cuts.len())
    }

    /// Drops every cut added after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        if checkpoint.0 >= self.cuts.len() {
            return;
        }
        debug!(
            "roll back cut pool from {} to {} cuts",
            self.cuts.len(),
            checkpoint.0
        );
        for cut in self.cuts.drain(checkpoint.0..) {
            self.index.remove(&cut.key());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CutKind, EdgeTime};
    use crate::map::{Direction, Edge};

    fn cut(a1: usize, a2: usize, t: usize) -> RobustCut {
        RobustCut::new(
            format!("cut({a1},{a2},{t})"),
            CutKind::TwoEdge,
            a1,
            a2,
            vec![EdgeTime::new(Edge::new(0, Direction::East), t)],
            vec![EdgeTime::new(Edge::new(1, Direction::West), t)],
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn test_duplicates_share_handle() {
        let mut pool = CutPool::new();
        let first = pool.insert(cut(0, 1, 2));
        let second = pool.insert(cut(0, 2, 2));
        let again = pool.insert(cut(0, 1, 2));

        assert_eq!(first, again);
        assert_ne!(first, second);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(second).unwrap().a2(), 2);
        assert_eq!(second.index(), 1);
    }

    #[test]
    fn test_rollback() {
        let mut pool = CutPool::new();
        pool.insert(cut(0, 1, 0));
        let checkpoint = pool.checkpoint();
        pool.insert(cut(0, 1, 1));
        pool.insert(cut(1, 2, 1));
        assert_eq!(pool.len(), 3);

        pool.rollback(checkpoint);
        assert_eq!(pool.len(), 1);
        assert!(pool.get(CutHandle(1)).is_none());

        // A rolled back cut can be registered again.
        let handle = pool.insert(cut(1, 2, 1));
        assert_eq!(handle.index(), 1);
        assert_eq!(pool.iter().count(), 2);
    }
}
