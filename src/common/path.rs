use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::map::{Direction, Edge, Map, Node};

pub type Agent = usize;
pub type Time = usize;

/// Occupancy of `node` at time `t`. Ordered by time, then node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeTime {
    pub node: Node,
    pub t: Time,
}

impl NodeTime {
    pub fn new(node: Node, t: Time) -> Self {
        NodeTime { node, t }
    }
}

impl Ord for NodeTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t.cmp(&other.t).then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for NodeTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Edge `e` taken at time `t`. Ordered by time, then node, then direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeTime {
    pub e: Edge,
    pub t: Time,
}

impl EdgeTime {
    pub fn new(e: Edge, t: Time) -> Self {
        EdgeTime { e, t }
    }

    pub fn node_time(&self) -> NodeTime {
        NodeTime::new(self.e.node, self.t)
    }
}

impl Ord for EdgeTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t
            .cmp(&other.t)
            .then_with(|| self.e.node.cmp(&other.e.node))
            .then_with(|| self.e.dir.cmp(&other.e.dir))
    }
}

impl PartialOrd for EdgeTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Time-expanded path: `edges[t]` is the cell occupied at `t` and the move
/// taken from it. The last entry is normally a wait at the goal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    edges: Vec<Edge>,
}

impl Path {
    pub fn new(edges: Vec<Edge>) -> Self {
        Path { edges }
    }

    /// Walks `moves` from `start` and closes the path with a wait.
    pub fn from_moves(map: &Map, start: Node, moves: &[Direction]) -> Result<Self> {
        if !map.is_passable_node(start) {
            let (x, y) = (map.get_x(start), map.get_y(start));
            return Err(Error::BlockedCell { x, y });
        }

        let mut edges = Vec::with_capacity(moves.len() + 1);
        let mut current = start;
        for (time, &dir) in moves.iter().enumerate() {
            let next = map.neighbor(current, dir).ok_or_else(|| {
                let (x, y) = map.get_xy(current);
                Error::BlockedMove { x, y, dir, time }
            })?;
            edges.push(Edge::new(current, dir));
            current = next;
        }
        edges.push(Edge::new(current, Direction::Wait));

        Ok(Path { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_times(&self) -> impl Iterator<Item = EdgeTime> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(t, &e)| EdgeTime::new(e, t))
    }

    pub fn node_at(&self, t: Time) -> Node {
        self.edges[t].node
    }

    pub fn dir_at(&self, t: Time) -> Direction {
        self.edges[t].dir
    }

    /// Every move lands on the cell recorded at the next time step.
    pub fn is_consistent(&self, map: &Map) -> bool {
        self.edges
            .iter()
            .all(|&edge| map.is_passable_node(edge.node) && map.destination(edge).is_some())
            && self
                .edges
                .windows(2)
                .all(|pair| map.destination(pair[0]) == Some(pair[1].node))
    }

    /// Formats the path as a list of coordinates, one per time step.
    pub fn format(&self, map: &Map) -> String {
        let cells: Vec<String> = self
            .edges
            .iter()
            .map(|edge| {
                let (x, y) = map.get_xy(edge.node);
                format!("({x},{y})")
            })
            .collect();
        cells.join(" ")
    }
}

/// One candidate path of one agent with its value in the relaxed master.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub agent: Agent,
    pub path: Path,
    pub value: f64,
}

impl Column {
    pub fn new(agent: Agent, path: Path, value: f64) -> Self {
        Column { agent, path, value }
    }
}
