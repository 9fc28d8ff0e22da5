mod rectangle;
mod twoedge;

pub use rectangle::{RectangleKnapsackSeparator, RECTANGLE_PRIORITY};
pub use twoedge::{TwoEdgeSeparator, TWO_EDGE_PRIORITY};

use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

use crate::common::{Agent, RobustCut};
use crate::config::Config;
use crate::error::Result;
use crate::map::Map;
use crate::master::{CutHandle, MasterProblem};
use crate::num::Tolerance;
use crate::stat::Stats;
use crate::usage::UsageTables;

/// Read-only view of one separation round.
pub struct SeparationContext<'a> {
    pub map: &'a Map,
    pub usage: &'a UsageTables<'a>,
    pub tolerance: Tolerance,
    pub parallel: bool,
    pub debug_output: bool,
}

impl<'a> SeparationContext<'a> {
    pub fn new(map: &'a Map, usage: &'a UsageTables<'a>, tolerance: Tolerance) -> Self {
        SeparationContext {
            map,
            usage,
            tolerance,
            parallel: false,
            debug_output: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_debug_output(mut self, debug_output: bool) -> Self {
        self.debug_output = debug_output;
        self
    }
}

pub trait Separator: Send {
    fn name(&self) -> &'static str;

    /// Higher priorities run first.
    fn priority(&self) -> i32;

    /// Returns at most `max_cuts` violated cuts, at most one per agent pair.
    fn separate(
        &mut self,
        ctx: &SeparationContext<'_>,
        max_cuts: usize,
        stats: &mut Stats,
    ) -> Result<Vec<RobustCut>>;
}

/// Runs `find` over agent pairs in lexicographic order and keeps the first
/// `max_cuts` hits. Returns the cuts and the number of pairs examined.
///
/// The parallel scan checks every pair and truncates afterwards, so both
/// modes return the same cuts.
pub(crate) fn scan_pairs<F>(
    ctx: &SeparationContext<'_>,
    max_cuts: usize,
    find: F,
) -> Result<(Vec<RobustCut>, usize)>
where
    F: Fn(Agent, Agent) -> Result<Option<RobustCut>> + Sync,
{
    let pairs = ctx.usage.agent_pairs();
    if max_cuts == 0 {
        return Ok((Vec::new(), 0));
    }

    if ctx.parallel {
        let found: Vec<Option<RobustCut>> = pairs
            .par_iter()
            .map(|&(a1, a2)| find(a1, a2))
            .collect::<Result<_>>()?;
        let mut cuts: Vec<RobustCut> = found.into_iter().flatten().collect();
        cuts.truncate(max_cuts);
        return Ok((cuts, pairs.len()));
    }

    let mut cuts = Vec::new();
    let mut pairs_checked = 0;
    for (a1, a2) in pairs {
        pairs_checked += 1;
        if let Some(cut) = find(a1, a2)? {
            cuts.push(cut);
            if cuts.len() >= max_cuts {
                break;
            }
        }
    }
    Ok((cuts, pairs_checked))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SepaResult {
    Separated(Vec<CutHandle>),
    DidNotFind,
}

/// Runs the enabled separators on the current fractional solution of a
/// master problem and registers what they find.
pub struct SeparationEngine {
    separators: Vec<Box<dyn Separator>>,
    config: Config,
    stats: Stats,
}

impl SeparationEngine {
    pub fn new(config: Config) -> Self {
        let mut separators: Vec<Box<dyn Separator>> = Vec::new();
        if config.two_edge {
            separators.push(Box::new(TwoEdgeSeparator::new()));
        }
        if config.rectangle {
            separators.push(Box::new(RectangleKnapsackSeparator::new()));
        }
        separators.sort_by_key(|sepa| std::cmp::Reverse(sepa.priority()));

        SeparationEngine {
            separators,
            config,
            stats: Stats::default(),
        }
    }

    pub fn separator_names(&self) -> Vec<&'static str> {
        self.separators.iter().map(|sepa| sepa.name()).collect()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// One separation round. Cuts are computed against a snapshot of the
    /// master's columns, then added through [`MasterProblem::add_cut`]. Cuts
    /// the master already holds do not count as separated.
    pub fn separate<M: MasterProblem>(&mut self, master: &mut M) -> Result<SepaResult> {
        let start_time = Instant::now();
        self.stats.rounds += 1;

        let cuts = {
            let tolerance = self.config.tolerance();
            let usage = UsageTables::aggregate(
                master.map(),
                master.num_agents(),
                master.columns(),
                &tolerance,
            );
            let ctx = SeparationContext::new(master.map(), &usage, tolerance)
                .with_parallel(self.config.parallel)
                .with_debug_output(self.config.debug_output);

            let mut cuts = Vec::new();
            for sepa in self.separators.iter_mut() {
                let budget = self.config.max_cuts_per_round - cuts.len();
                if budget == 0 {
                    debug!("cut limit reached, skipping {}", sepa.name());
                    break;
                }
                let found = sepa.separate(&ctx, budget, &mut self.stats)?;
                debug!("{} found {} cuts", sepa.name(), found.len());
                cuts.extend(found);
            }
            cuts
        };

        let mut handles = Vec::with_capacity(cuts.len());
        for cut in cuts {
            if self.config.debug_output {
                debug!("{cut}");
            }
            match master.add_cut(cut)? {
                Some(handle) => handles.push(handle),
                None => self.stats.duplicate_cuts += 1,
            }
        }

        self.stats.time_us += start_time.elapsed().as_micros() as usize;
        if handles.is_empty() {
            info!("round {}: no violated conflict cuts", self.stats.rounds);
            return Ok(SepaResult::DidNotFind);
        }

        self.stats.rounds_with_cuts += 1;
        self.stats.cuts_registered += handles.len();
        info!("round {}: separated {} cuts", self.stats.rounds, handles.len());
        Ok(SepaResult::Separated(handles))
    }
}
