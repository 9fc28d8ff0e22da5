use std::fmt;

use super::path::{Agent, EdgeTime};
use crate::error::{Error, Result};
use crate::usage::AgentUsage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CutKind {
    TwoEdge,
    RectangleKnapsack,
}

/// Offsets of the four rectangle boundaries inside a cut's edge list.
/// Agent 1's in-edges start at 0, agent 2's out-edges run to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RectangleBoundaries {
    pub out1_begin: usize,
    pub in2_begin: usize,
    pub out2_begin: usize,
}

/// Two-agent robust cut `sum(a1 edges) + sum(a2 edges) <= rhs`.
///
/// The edge list holds agent 1's edge-times followed by agent 2's and is
/// never modified after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RobustCut {
    name: String,
    kind: CutKind,
    a1: Agent,
    a2: Agent,
    edge_times: Vec<EdgeTime>,
    a1_len: usize,
    rhs: f64,
    boundaries: Option<RectangleBoundaries>,
}

impl RobustCut {
    pub fn new(
        name: String,
        kind: CutKind,
        a1: Agent,
        a2: Agent,
        a1_edges: Vec<EdgeTime>,
        a2_edges: Vec<EdgeTime>,
        rhs: f64,
    ) -> Result<Self> {
        if a1 >= a2 {
            return Err(Error::InvalidCutAgents { a1, a2 });
        }
        if a1_edges.is_empty() || a2_edges.is_empty() {
            return Err(Error::EmptyCutSupport { a1, a2 });
        }

        let a1_len = a1_edges.len();
        let mut edge_times = a1_edges;
        edge_times.extend(a2_edges);

        Ok(RobustCut {
            name,
            kind,
            a1,
            a2,
            edge_times,
            a1_len,
            rhs,
            boundaries: None,
        })
    }

    /// Builds a rectangle knapsack cut from its four boundary sets.
    pub fn rectangle(
        name: String,
        a1: Agent,
        a2: Agent,
        [in1, out1, in2, out2]: [Vec<EdgeTime>; 4],
        rhs: f64,
    ) -> Result<Self> {
        let boundaries = RectangleBoundaries {
            out1_begin: in1.len(),
            in2_begin: in1.len() + out1.len(),
            out2_begin: in1.len() + out1.len() + in2.len(),
        };
        let mut a1_edges = in1;
        a1_edges.extend(out1);
        let mut a2_edges = in2;
        a2_edges.extend(out2);

        let mut cut = Self::new(
            name,
            CutKind::RectangleKnapsack,
            a1,
            a2,
            a1_edges,
            a2_edges,
            rhs,
        )?;
        cut.boundaries = Some(boundaries);
        Ok(cut)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CutKind {
        self.kind
    }

    pub fn a1(&self) -> Agent {
        self.a1
    }

    pub fn a2(&self) -> Agent {
        self.a2
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn edge_times(&self) -> &[EdgeTime] {
        &self.edge_times
    }

    pub fn edge_times_a1(&self) -> &[EdgeTime] {
        &self.edge_times[..self.a1_len]
    }

    pub fn edge_times_a2(&self) -> &[EdgeTime] {
        &self.edge_times[self.a1_len..]
    }

    pub fn boundaries(&self) -> Option<RectangleBoundaries> {
        self.boundaries
    }

    /// The four rectangle sets `[in1, out1, in2, out2]`, if this is a
    /// rectangle cut.
    pub fn rectangle_sets(&self) -> Option<[&[EdgeTime]; 4]> {
        self.boundaries.map(|b| {
            [
                &self.edge_times[..b.out1_begin],
                &self.edge_times[b.out1_begin..b.in2_begin],
                &self.edge_times[b.in2_begin..b.out2_begin],
                &self.edge_times[b.out2_begin..],
            ]
        })
    }

    /// Left-hand side on the fractional point described by the two agents'
    /// usage tables.
    pub fn lhs(&self, usage_a1: &AgentUsage, usage_a2: &AgentUsage) -> f64 {
        let lhs_a1: f64 = self
            .edge_times_a1()
            .iter()
            .map(|et| usage_a1.edge_weight(et))
            .sum();
        let lhs_a2: f64 = self
            .edge_times_a2()
            .iter()
            .map(|et| usage_a2.edge_weight(et))
            .sum();
        lhs_a1 + lhs_a2
    }

    /// Identity used by the cut pool to spot geometrically identical cuts.
    pub(crate) fn key(&self) -> CutKey {
        CutKey {
            a1: self.a1,
            a2: self.a2,
            a1_len: self.a1_len,
            edge_times: self.edge_times.clone(),
            rhs_bits: self.rhs.to_bits(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CutKey {
    a1: Agent,
    a2: Agent,
    a1_len: usize,
    edge_times: Vec<EdgeTime>,
    rhs_bits: u64,
}

impl fmt::Display for RobustCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} + {} edge-times <= {}]",
            self.name,
            self.a1_len,
            self.edge_times.len() - self.a1_len,
            self.rhs
        )
    }
}
