use std::cmp::Ordering;
use tracing::{debug, instrument, trace};

use super::{scan_pairs, SeparationContext, Separator};
use crate::common::{Agent, Column, EdgeTime, NodeTime, Path, RobustCut, Time};
use crate::error::Result;
use crate::map::{Direction, Edge, Map, Node};
use crate::stat::Stats;
use crate::usage::common_vertices;

pub const RECTANGLE_PRIORITY: i32 = 500_000;

/// Separates rectangle knapsack conflicts. Two agents crossing a box on
/// shortest paths must meet inside it, so at most three of their four
/// boundary crossings (agent 1 in/out, agent 2 in/out) can be used.
#[derive(Debug, Default, Clone, Copy)]
pub struct RectangleKnapsackSeparator;

impl RectangleKnapsackSeparator {
    pub fn new() -> Self {
        RectangleKnapsackSeparator
    }
}

/// Space-time box spanned by two paths between `start_t` and `end_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RectangleCorners {
    pub(crate) start_t: Time,
    pub(crate) end_t: Time,
    pub(crate) start: [Node; 2],
    pub(crate) end: [Node; 2],
    pub(crate) x_dir: Direction,
    pub(crate) y_dir: Direction,
}

/// First vertical and first horizontal move of either path from `t0` on.
/// Gives up when a wait comes before the axis is known.
fn movement_directions(
    path1: &Path,
    path2: &Path,
    t0: Time,
    min_len: usize,
) -> Option<(Direction, Direction)> {
    let first_along = |on_axis: fn(Direction) -> bool| -> Option<Direction> {
        for t in t0..min_len {
            let (d1, d2) = (path1.dir_at(t), path2.dir_at(t));
            if on_axis(d1) {
                return Some(d1);
            } else if on_axis(d2) {
                return Some(d2);
            } else if d1 == Direction::Wait || d2 == Direction::Wait {
                return None;
            }
        }
        None
    };

    let y_dir = first_along(Direction::is_vertical)?;
    let x_dir = first_along(Direction::is_horizontal)?;
    Some((x_dir, y_dir))
}

/// Finds the box around the shared node-time `nt` of two paths.
pub(crate) fn find_corners(path1: &Path, path2: &Path, nt: NodeTime) -> Option<RectangleCorners> {
    let min_len = path1.len().min(path2.len());
    let t0 = nt.t;
    if !(0 < t0
        && t0 + 1 < min_len
        && path1.node_at(t0) == nt.node
        && path2.node_at(t0) == nt.node)
    {
        return None;
    }

    let (x_dir, y_dir) = movement_directions(path1, path2, t0, min_len)?;
    let confined = |t: Time| {
        [path1.dir_at(t), path2.dir_at(t)]
            .iter()
            .all(|&d| d == x_dir || d == y_dir)
    };
    if !confined(t0) {
        return None;
    }

    let mut start_t = t0;
    while start_t > 0 && confined(start_t - 1) {
        start_t -= 1;
    }
    let mut end_t = t0;
    while end_t + 1 < min_len && confined(end_t) {
        end_t += 1;
    }
    if end_t <= start_t + 2 {
        return None;
    }

    // No box if both agents enter it from the same cell.
    let start = [path1.node_at(start_t), path2.node_at(start_t)];
    if start[0] == start[1] {
        return None;
    }

    Some(RectangleCorners {
        start_t,
        end_t,
        start,
        end: [path1.node_at(end_t), path2.node_at(end_t)],
        x_dir,
        y_dir,
    })
}

/// Coordinates flipped so both agents move towards growing `u` and `v`.
#[derive(Debug, Clone, Copy)]
struct Frame {
    sx: i64,
    sy: i64,
}

impl Frame {
    fn new(x_dir: Direction, y_dir: Direction) -> Self {
        Frame {
            sx: if x_dir == Direction::East { 1 } else { -1 },
            sy: if y_dir == Direction::South { 1 } else { -1 },
        }
    }

    fn to_uv(self, map: &Map, node: Node) -> (i64, i64) {
        let (x, y) = map.get_xy(node);
        (self.sx * x as i64, self.sy * y as i64)
    }

    fn to_xy(self, u: i64, v: i64) -> (i64, i64) {
        (self.sx * u, self.sy * v)
    }
}

/// Boundary edge-times `[in1, out1, in2, out2]` of the box.
///
/// In the `(u, v)` frame both agents advance `u + v` by one per step and
/// agree on it, since they meet inside the box. The agent starting at the
/// smaller `u` crosses the box along `u` (horizontal agent), the other
/// along `v`. The box runs from `(u` of the vertical start, `v` of the
/// horizontal start`)` to `(u` of the vertical end, `v` of the horizontal
/// end`)`, and only exists when the agents swap order on both axes. In-edges
/// cross the entry border exactly on time, out-edges the exit border;
/// crossings touching blocked cells are left out.
pub(crate) fn compute_rectangle(
    map: &Map,
    corners: &RectangleCorners,
) -> Option<[Vec<EdgeTime>; 4]> {
    let frame = Frame::new(corners.x_dir, corners.y_dir);
    let s = corners.start.map(|node| frame.to_uv(map, node));
    let e = corners.end.map(|node| frame.to_uv(map, node));
    debug_assert_eq!(s[0].0 + s[0].1, s[1].0 + s[1].1);
    debug_assert_eq!(e[0].0 + e[0].1, e[1].0 + e[1].1);

    let (h, v) = match s[0].0.cmp(&s[1].0) {
        Ordering::Less => (0, 1),
        Ordering::Greater => (1, 0),
        Ordering::Equal => return None,
    };
    if !(e[h].0 > e[v].0 && e[h].1 < e[v].1) {
        return None;
    }

    let rs = (s[v].0, s[h].1);
    let rg = (e[v].0, e[h].1);
    if rs.0 > rg.0 || rs.1 > rg.1 {
        return None;
    }

    let start_t = corners.start_t as i64;
    let edge_at = |u: i64, v: i64, dir: Direction, t: i64| -> Option<EdgeTime> {
        let (x, y) = frame.to_xy(u, v);
        let node = map.passable_id(x, y)?;
        map.neighbor(node, dir)?;
        Some(EdgeTime::new(Edge::new(node, dir), t as Time))
    };

    let h_in: Vec<EdgeTime> = (rs.1..=rg.1)
        .filter_map(|vv| {
            let t = start_t + (rs.0 - 1 - s[h].0) + (vv - s[h].1);
            edge_at(rs.0 - 1, vv, corners.x_dir, t)
        })
        .collect();
    let h_out: Vec<EdgeTime> = (rs.1..=rg.1)
        .filter_map(|vv| {
            let t = start_t + (rg.0 - s[h].0) + (vv - s[h].1);
            edge_at(rg.0, vv, corners.x_dir, t)
        })
        .collect();
    let v_in: Vec<EdgeTime> = (rs.0..=rg.0)
        .filter_map(|uu| {
            let t = start_t + (uu - s[v].0) + (rs.1 - 1 - s[v].1);
            edge_at(uu, rs.1 - 1, corners.y_dir, t)
        })
        .collect();
    let v_out: Vec<EdgeTime> = (rs.0..=rg.0)
        .filter_map(|uu| {
            let t = start_t + (uu - s[v].0) + (rg.1 - s[v].1);
            edge_at(uu, rg.1, corners.y_dir, t)
        })
        .collect();

    if (h_in.is_empty() && h_out.is_empty()) || (v_in.is_empty() && v_out.is_empty()) {
        return None;
    }

    Some(if h == 0 {
        [h_in, h_out, v_in, v_out]
    } else {
        [v_in, v_out, h_in, h_out]
    })
}

fn rectangle_name(map: &Map, a1: Agent, a2: Agent, corners: &RectangleCorners) -> String {
    let [(sx1, sy1), (sx2, sy2)] = corners.start.map(|node| map.get_xy(node));
    let [(ex1, ey1), (ex2, ey2)] = corners.end.map(|node| map.get_xy(node));
    format!(
        "rectangle_knapsack_conflict({a1},{a2},(({sx1},{sy1}),({sx2},{sy2}),{}),(({ex1},{ey1}),({ex2},{ey2}),{}))",
        corners.start_t, corners.end_t
    )
}

fn format_edge_times(map: &Map, edge_times: &[EdgeTime]) -> String {
    let parts: Vec<String> = edge_times
        .iter()
        .map(|et| format!("{}@{}", map.format_edge(et.e), et.t))
        .collect();
    format!("{{{}}}", parts.join(","))
}

/// Violated rectangle cut on one pair of columns meeting at `nt`.
fn find_rectangle(
    ctx: &SeparationContext<'_>,
    a1: Agent,
    a2: Agent,
    nt: NodeTime,
    column1: &Column,
    column2: &Column,
) -> Result<Option<RobustCut>> {
    let Some(corners) = find_corners(&column1.path, &column2.path, nt) else {
        return Ok(None);
    };
    let Some(sets) = compute_rectangle(ctx.map, &corners) else {
        return Ok(None);
    };

    let usage_a1 = ctx.usage.agent(a1);
    let usage_a2 = ctx.usage.agent(a2);
    let lhs: f64 = sets[..2]
        .iter()
        .flatten()
        .map(|et| usage_a1.edge_weight(et))
        .chain(sets[2..].iter().flatten().map(|et| usage_a2.edge_weight(et)))
        .sum();
    debug_assert!(ctx.tolerance.is_sum_le(lhs, 4.0));
    if ctx.tolerance.is_sum_le(lhs, 3.0) {
        trace!("rectangle {corners:?} of agents {a1} and {a2} not violated, lhs {lhs}");
        return Ok(None);
    }

    if ctx.debug_output {
        debug!(
            "agent {a1} in {} out {} and agent {a2} in {} out {}",
            format_edge_times(ctx.map, &sets[0]),
            format_edge_times(ctx.map, &sets[1]),
            format_edge_times(ctx.map, &sets[2]),
            format_edge_times(ctx.map, &sets[3])
        );
    }

    let name = rectangle_name(ctx.map, a1, a2, &corners);
    debug!("Creating rectangle knapsack cut {name} with value {lhs}");
    RobustCut::rectangle(name, a1, a2, sets, 3.0).map(Some)
}

pub(crate) fn find_rectangle_conflict(
    ctx: &SeparationContext<'_>,
    a1: Agent,
    a2: Agent,
) -> Result<Option<RobustCut>> {
    let usage_a1 = ctx.usage.agent(a1);
    let usage_a2 = ctx.usage.agent(a2);

    for nt in common_vertices(usage_a1.vertices(), usage_a2.vertices()) {
        trace!(
            "Checking conflict at ({},{}) time {}",
            ctx.map.get_x(nt.node),
            ctx.map.get_y(nt.node),
            nt.t
        );
        for column1 in usage_a1.columns() {
            for column2 in usage_a2.columns() {
                if let Some(cut) = find_rectangle(ctx, a1, a2, nt, column1, column2)? {
                    return Ok(Some(cut));
                }
            }
        }
    }
    Ok(None)
}

impl Separator for RectangleKnapsackSeparator {
    fn name(&self) -> &'static str {
        "rectangle_knapsack_conflicts"
    }

    fn priority(&self) -> i32 {
        RECTANGLE_PRIORITY
    }

    #[instrument(skip_all, name = "rectangle_knapsack_conflicts", fields(max_cuts = max_cuts), level = "debug")]
    fn separate(
        &mut self,
        ctx: &SeparationContext<'_>,
        max_cuts: usize,
        stats: &mut Stats,
    ) -> Result<Vec<RobustCut>> {
        if ctx.debug_output {
            for (agent, usage) in ctx.usage.iter().enumerate() {
                for column in usage.columns() {
                    debug!(
                        "agent {agent:2} value {:.4} path {}",
                        column.value,
                        column.path.format(ctx.map)
                    );
                }
            }
        }

        let (cuts, pairs_checked) =
            scan_pairs(ctx, max_cuts, |a1, a2| find_rectangle_conflict(ctx, a1, a2))?;
        stats.pairs_checked += pairs_checked;
        stats.rectangle_cuts += cuts.len();
        Ok(cuts)
    }
}
