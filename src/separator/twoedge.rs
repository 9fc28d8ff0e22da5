use std::collections::BTreeMap;
use tracing::{debug, instrument, trace};

use super::{scan_pairs, SeparationContext, Separator};
use crate::common::{Agent, CutKind, EdgeTime, RobustCut, Time};
use crate::error::Result;
use crate::map::{Direction, Edge, Map};
use crate::stat::Stats;

pub const TWO_EDGE_PRIORITY: i32 = 550_000;

/// Separates two-edge conflicts: agent 1 leaving a cell along `e1` or
/// entering it along `e2` while agent 2 uses the reverse of either edge at
/// the same time step. At most one unit of flow fits on the four edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct TwoEdgeSeparator;

impl TwoEdgeSeparator {
    pub fn new() -> Self {
        TwoEdgeSeparator
    }
}

/// The edges entering `node` from its south, north, west and east
/// neighbours.
fn entering_edges(map: &Map, node: usize) -> [Option<Edge>; 4] {
    [
        map.get_south(node).map(|n| Edge::new(n, Direction::North)),
        map.get_north(node).map(|n| Edge::new(n, Direction::South)),
        map.get_west(node).map(|n| Edge::new(n, Direction::East)),
        map.get_east(node).map(|n| Edge::new(n, Direction::West)),
    ]
}

fn create_cut(
    map: &Map,
    a1: Agent,
    a2: Agent,
    [a1_e1, a1_e2, a2_e1, a2_e2]: [Edge; 4],
    t: Time,
) -> Result<RobustCut> {
    let name = format!(
        "twoedge_conflict({a1},{a2},{},{},{t})",
        map.format_edge(a1_e1),
        map.format_edge(a1_e2)
    );
    RobustCut::new(
        name,
        CutKind::TwoEdge,
        a1,
        a2,
        vec![EdgeTime::new(a1_e1, t), EdgeTime::new(a1_e2, t)],
        vec![EdgeTime::new(a2_e1, t), EdgeTime::new(a2_e2, t)],
        1.0,
    )
}

/// Fractional edge-times of one agent. Integral usage is left out of the
/// two-edge scan entirely, both as a starting edge and in the sums.
pub(crate) type FractionalEdges = BTreeMap<EdgeTime, f64>;

pub(crate) fn fractional_edges(ctx: &SeparationContext<'_>) -> Vec<FractionalEdges> {
    ctx.usage
        .iter()
        .map(|usage| {
            usage
                .edges()
                .iter()
                .filter(|&(_, &val)| !ctx.tolerance.is_integral(val))
                .map(|(&et, &val)| (et, val))
                .collect()
        })
        .collect()
}

fn weight(edges: &FractionalEdges, et: &EdgeTime) -> f64 {
    edges.get(et).copied().unwrap_or(0.0)
}

/// First violated two-edge conflict between `a1` and `a2`, scanning agent
/// 1's fractional edges in time order.
pub(crate) fn find_two_edge_conflict(
    ctx: &SeparationContext<'_>,
    fractional: &[FractionalEdges],
    a1: Agent,
    a2: Agent,
) -> Result<Option<RobustCut>> {
    let map = ctx.map;
    let edges_a1 = &fractional[a1];
    let edges_a2 = &fractional[a2];
    if edges_a2.is_empty() {
        return Ok(None);
    }

    for (&a1_et1, &a1_et1_val) in edges_a1 {
        let t = a1_et1.t;
        let a1_e1 = a1_et1.e;
        if a1_e1.dir == Direction::Wait {
            continue;
        }
        // Consistent paths never leave the map.
        let Some(a2_e1) = map.opposite_edge(a1_e1) else {
            continue;
        };
        let a2_et1_val = weight(edges_a2, &EdgeTime::new(a2_e1, t));

        for a1_e2 in entering_edges(map, a1_e1.node).into_iter().flatten() {
            if a1_e2 == a1_e1 {
                continue;
            }
            let Some(a2_e2) = map.opposite_edge(a1_e2) else {
                continue;
            };

            let a1_et2_val = weight(edges_a1, &EdgeTime::new(a1_e2, t));
            let a2_et2_val = weight(edges_a2, &EdgeTime::new(a2_e2, t));

            let lhs = a1_et1_val + a1_et2_val + a2_et1_val + a2_et2_val;
            if ctx.tolerance.is_gt(lhs, 1.0) {
                let cut = create_cut(map, a1, a2, [a1_e1, a1_e2, a2_e1, a2_e2], t)?;
                debug!(
                    "Creating two-edge conflict cut {} for agents {a1} and {a2} at time {t} with value {lhs}",
                    cut.name()
                );
                return Ok(Some(cut));
            }
        }
    }

    trace!("no two-edge conflict between agents {a1} and {a2}");
    Ok(None)
}

impl Separator for TwoEdgeSeparator {
    fn name(&self) -> &'static str {
        "twoedge_conflicts"
    }

    fn priority(&self) -> i32 {
        TWO_EDGE_PRIORITY
    }

    #[instrument(skip_all, name = "twoedge_conflicts", fields(max_cuts = max_cuts), level = "debug")]
    fn separate(
        &mut self,
        ctx: &SeparationContext<'_>,
        max_cuts: usize,
        stats: &mut Stats,
    ) -> Result<Vec<RobustCut>> {
        let fractional = fractional_edges(ctx);
        if ctx.debug_output {
            for (agent, edges) in fractional.iter().enumerate() {
                for (et, val) in edges {
                    if et.e.dir != Direction::Wait {
                        debug!(
                            "agent {agent} fractional edge ({},{}) val {val:.4}",
                            ctx.map.format_edge(et.e),
                            et.t
                        );
                    }
                }
            }
        }

        let (cuts, pairs_checked) = scan_pairs(ctx, max_cuts, |a1, a2| {
            find_two_edge_conflict(ctx, &fractional, a1, a2)
        })?;
        stats.pairs_checked += pairs_checked;
        stats.two_edge_cuts += cuts.len();
        Ok(cuts)
    }
}
