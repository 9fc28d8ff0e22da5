use std::collections::BTreeMap;
use tracing::debug;

use crate::common::{Agent, Column, EdgeTime, NodeTime, Time};
use crate::map::{Direction, Edge, Map, Node};
use crate::num::Tolerance;

/// Fractional usage of one agent, folded over all of its positive columns.
#[derive(Debug, Clone, Default)]
pub struct AgentUsage<'a> {
    columns: Vec<&'a Column>,
    edges: BTreeMap<EdgeTime, f64>,
    vertices: Vec<NodeTime>,
}

impl<'a> AgentUsage<'a> {
    /// Columns of this agent with a positive value, in input order.
    pub fn columns(&self) -> &[&'a Column] {
        &self.columns
    }

    /// Accumulated weight of every edge-time, ordered by time, node, direction.
    pub fn edges(&self) -> &BTreeMap<EdgeTime, f64> {
        &self.edges
    }

    /// Sorted, deduplicated node-times visited with positive weight.
    pub fn vertices(&self) -> &[NodeTime] {
        &self.vertices
    }

    pub fn edge_weight(&self, et: &EdgeTime) -> f64 {
        self.edges.get(et).copied().unwrap_or(0.0)
    }

    /// Total weight leaving `node` at time `t`.
    pub fn outflow(&self, node: Node, t: Time) -> f64 {
        Direction::ALL
            .iter()
            .map(|&dir| self.edge_weight(&EdgeTime::new(Edge::new(node, dir), t)))
            .sum()
    }

    /// Total weight arriving at `node` at time `t`, i.e. moves taken at `t - 1`.
    pub fn inflow(&self, map: &Map, node: Node, t: Time) -> f64 {
        if t == 0 {
            return 0.0;
        }
        Direction::ALL
            .iter()
            .filter_map(|&dir| {
                map.neighbor(node, dir.reverse())
                    .map(|source| EdgeTime::new(Edge::new(source, dir), t - 1))
            })
            .map(|et| self.edge_weight(&et))
            .sum()
    }

    fn add_column(&mut self, column: &'a Column) {
        self.columns.push(column);
        for et in column.path.edge_times() {
            *self.edges.entry(et).or_insert(0.0) += column.value;
            self.vertices.push(et.node_time());
        }
    }

    fn finish(&mut self) {
        self.vertices.sort_unstable();
        self.vertices.dedup();
    }
}

/// Usage tables of all agents for the current fractional solution. Rebuilt
/// from scratch on every separation call.
#[derive(Debug, Clone)]
pub struct UsageTables<'a> {
    agents: Vec<AgentUsage<'a>>,
}

impl<'a> UsageTables<'a> {
    pub fn aggregate(
        map: &Map,
        num_agents: usize,
        columns: &'a [Column],
        tolerance: &Tolerance,
    ) -> Self {
        let mut agents = vec![AgentUsage::default(); num_agents];

        for column in columns {
            debug_assert!(
                column.agent < num_agents,
                "column of agent {} with only {num_agents} agents",
                column.agent
            );
            debug_assert!(
                column.path.is_consistent(map),
                "inconsistent path for agent {}: {}",
                column.agent,
                column.path.format(map)
            );
            if tolerance.is_positive(column.value) {
                agents[column.agent].add_column(column);
            }
        }

        for (agent, usage) in agents.iter_mut().enumerate() {
            usage.finish();
            debug!(
                "agent {agent}: {} columns, {} edge-times, {} node-times",
                usage.columns.len(),
                usage.edges.len(),
                usage.vertices.len()
            );
            debug_assert!(
                usage
                    .vertices
                    .iter()
                    .all(|nt| tolerance.is_sum_le(usage.outflow(nt.node, nt.t), 1.0)),
                "agent {agent} uses more than one unit of flow at some node-time"
            );
        }

        UsageTables { agents }
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn agent(&self, agent: Agent) -> &AgentUsage<'a> {
        &self.agents[agent]
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentUsage<'a>> {
        self.agents.iter()
    }

    /// Agent pairs `(a1, a2)` with `a1 < a2`, in scanning order.
    pub fn agent_pairs(&self) -> Vec<(Agent, Agent)> {
        let n = self.agents.len();
        (0..n)
            .flat_map(|a1| (a1 + 1..n).map(move |a2| (a1, a2)))
            .collect()
    }
}

/// Node-times used by both agents, via a linear merge of the sorted lists.
pub fn common_vertices(a: &[NodeTime], b: &[NodeTime]) -> Vec<NodeTime> {
    let mut common = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                common.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    common
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::common::Path;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use Direction::*;

    /// Random fractional solution: every agent gets a few random-walk
    /// columns whose values sum to one.
    pub(crate) fn random_columns(
        map: &Map,
        num_agents: usize,
        horizon: usize,
        rng: &mut StdRng,
    ) -> Vec<Column> {
        let passable: Vec<Node> = (0..map.size())
            .filter(|&node| map.is_passable_node(node))
            .collect();
        let mut columns = Vec::new();

        for agent in 0..num_agents {
            let num_columns = rng.gen_range(1..=3);
            let mut remaining = 4;
            for k in 0..num_columns {
                let quarters = if k + 1 == num_columns {
                    remaining
                } else {
                    rng.gen_range(1..=remaining - (num_columns - k - 1))
                };
                remaining -= quarters;

                let start = *passable.choose(rng).unwrap();
                let mut moves = Vec::with_capacity(horizon);
                let mut current = start;
                for _ in 0..horizon {
                    let (dir, next) = *map.get_neighbors(current).choose(rng).unwrap();
                    moves.push(dir);
                    current = next;
                }
                let path = Path::from_moves(map, start, &moves).unwrap();
                columns.push(Column::new(agent, path, quarters as f64 / 4.0));
            }
        }
        columns
    }

    fn corridor() -> Map {
        Map::from_rows(&["....."]).unwrap()
    }

    #[test]
    fn test_weights_accumulate_across_columns() {
        let map = corridor();
        let columns = vec![
            Column::new(0, Path::from_moves(&map, 0, &[East, East]).unwrap(), 0.5),
            Column::new(0, Path::from_moves(&map, 0, &[East, Wait]).unwrap(), 0.25),
            Column::new(0, Path::from_moves(&map, 0, &[Wait, East]).unwrap(), 0.25),
        ];
        let usage = UsageTables::aggregate(&map, 1, &columns, &Tolerance::default());
        let agent = usage.agent(0);

        assert_eq!(agent.columns().len(), 3);
        assert_eq!(agent.edge_weight(&EdgeTime::new(Edge::new(0, East), 0)), 0.75);
        assert_eq!(agent.edge_weight(&EdgeTime::new(Edge::new(0, Wait), 0)), 0.25);
        assert_eq!(agent.edge_weight(&EdgeTime::new(Edge::new(1, East), 1)), 0.5);
        assert_eq!(agent.edge_weight(&EdgeTime::new(Edge::new(3, East), 1)), 0.0);
        assert_eq!(agent.outflow(0, 0), 1.0);
        assert_eq!(agent.inflow(&map, 1, 1), 0.75);
    }

    #[test]
    fn test_vertices_sorted_and_unique() {
        let map = corridor();
        let columns = vec![
            Column::new(0, Path::from_moves(&map, 2, &[West, East]).unwrap(), 0.5),
            Column::new(0, Path::from_moves(&map, 2, &[East, West]).unwrap(), 0.5),
        ];
        let usage = UsageTables::aggregate(&map, 1, &columns, &Tolerance::default());

        assert_eq!(
            usage.agent(0).vertices(),
            &[
                NodeTime::new(2, 0),
                NodeTime::new(1, 1),
                NodeTime::new(3, 1),
                NodeTime::new(2, 2),
            ]
        );
    }

    #[test]
    fn test_zero_columns_ignored() {
        let map = corridor();
        let columns = vec![
            Column::new(1, Path::from_moves(&map, 4, &[West]).unwrap(), 0.0),
            Column::new(1, Path::from_moves(&map, 4, &[Wait]).unwrap(), 1.0),
        ];
        let usage = UsageTables::aggregate(&map, 2, &columns, &Tolerance::default());

        assert!(usage.agent(0).edges().is_empty());
        assert_eq!(usage.agent(1).columns().len(), 1);
        assert_eq!(
            usage.agent(1).edge_weight(&EdgeTime::new(Edge::new(4, West), 0)),
            0.0
        );
        assert_eq!(usage.agent_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn test_common_vertices() {
        let a = [NodeTime::new(3, 0), NodeTime::new(1, 1), NodeTime::new(5, 2)];
        let b = [NodeTime::new(1, 1), NodeTime::new(4, 2), NodeTime::new(5, 2)];
        assert_eq!(
            common_vertices(&a, &b),
            vec![NodeTime::new(1, 1), NodeTime::new(5, 2)]
        );
        assert!(common_vertices(&a, &[]).is_empty());
    }

    #[test]
    fn test_flow_conservation_on_random_fixtures() {
        let map = Map::from_rows(&["......", ".@@...", "......", "...@..", "......"]).unwrap();
        let tolerance = Tolerance::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let columns = random_columns(&map, 4, 6, &mut rng);
            let usage = UsageTables::aggregate(&map, 4, &columns, &tolerance);
            for agent in usage.iter() {
                for nt in agent.vertices() {
                    let outflow = agent.outflow(nt.node, nt.t);
                    assert!(tolerance.is_sum_le(outflow, 1.0));
                    if nt.t > 0 {
                        let inflow = agent.inflow(&map, nt.node, nt.t);
                        assert!((inflow - outflow).abs() < 1e-9);
                    }
                }
            }
        }
    }
}
