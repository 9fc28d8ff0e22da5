mod pool;

pub use pool::{Checkpoint, CutHandle, CutPool};

use crate::common::{Agent, Column, RobustCut};
use crate::error::{Error, Result};
use crate::map::Map;

/// What the separation engine needs from the master problem: the current
/// fractional solution and a place to put new cuts.
pub trait MasterProblem {
    fn num_agents(&self) -> usize;

    fn map(&self) -> &Map;

    /// Columns with their values in the current relaxed solution. Columns
    /// with zero value may be included, the engine skips them.
    fn columns(&self) -> &[Column];

    /// Registers `cut`. Returns `None` when an identical cut is already in
    /// the master's pool.
    fn add_cut(&mut self, cut: RobustCut) -> Result<Option<CutHandle>>;
}

/// In-memory master holding a fixed fractional solution and its cut pool.
#[derive(Debug, Clone)]
pub struct RelaxedMaster {
    map: Map,
    num_agents: usize,
    columns: Vec<Column>,
    pool: CutPool,
}

impl RelaxedMaster {
    pub fn new(map: Map, num_agents: usize) -> Self {
        RelaxedMaster {
            map,
            num_agents,
            columns: Vec::new(),
            pool: CutPool::new(),
        }
    }

    pub fn add_column(&mut self, column: Column) -> Result<()> {
        self.check_agent(column.agent)?;
        if !(0.0..=1.0).contains(&column.value) {
            return Err(Error::InvalidColumnValue(column.value));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replaces the values of all columns, e.g. after the LP is re-solved.
    pub fn set_values(&mut self, values: &[f64]) -> Result<()> {
        debug_assert_eq!(values.len(), self.columns.len());
        if let Some(&bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(Error::InvalidColumnValue(bad));
        }
        for (column, &value) in self.columns.iter_mut().zip(values) {
            column.value = value;
        }
        Ok(())
    }

    pub fn pool(&self) -> &CutPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut CutPool {
        &mut self.pool
    }

    fn check_agent(&self, agent: Agent) -> Result<()> {
        if agent >= self.num_agents {
            return Err(Error::AgentOutOfRange {
                agent,
                num_agents: self.num_agents,
            });
        }
        Ok(())
    }
}

impl MasterProblem for RelaxedMaster {
    fn num_agents(&self) -> usize {
        self.num_agents
    }

    fn map(&self) -> &Map {
        &self.map
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn add_cut(&mut self, cut: RobustCut) -> Result<Option<CutHandle>> {
        self.check_agent(cut.a2())?;
        let num_cuts = self.pool.len();
        let handle = self.pool.insert(cut);
        Ok((self.pool.len() > num_cuts).then_some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CutKind, EdgeTime, Path};
    use crate::map::{Direction, Edge};

    #[test]
    fn test_column_validation() {
        let map = Map::from_rows(&["..."]).unwrap();
        let path = Path::from_moves(&map, 0, &[Direction::East]).unwrap();
        let mut master = RelaxedMaster::new(map, 2);

        assert!(master.add_column(Column::new(1, path.clone(), 0.5)).is_ok());
        assert_eq!(
            master.add_column(Column::new(2, path.clone(), 0.5)),
            Err(Error::AgentOutOfRange {
                agent: 2,
                num_agents: 2
            })
        );
        assert_eq!(
            master.add_column(Column::new(0, path, 1.5)),
            Err(Error::InvalidColumnValue(1.5))
        );
        assert_eq!(master.columns().len(), 1);

        master.set_values(&[0.25]).unwrap();
        assert_eq!(master.columns()[0].value, 0.25);
        assert!(master.set_values(&[-0.5]).is_err());
    }

    #[test]
    fn test_cut_for_unknown_agent_rejected() {
        let map = Map::from_rows(&["..."]).unwrap();
        let mut master = RelaxedMaster::new(map, 2);
        let cut = RobustCut::new(
            "cut".to_string(),
            CutKind::TwoEdge,
            0,
            5,
            vec![EdgeTime::new(Edge::new(0, Direction::East), 0)],
            vec![EdgeTime::new(Edge::new(1, Direction::West), 0)],
            1.0,
        )
        .unwrap();

        assert!(master.add_cut(cut).is_err());
        assert!(master.pool().is_empty());
    }

    #[test]
    fn test_duplicate_cut_not_added() {
        let map = Map::from_rows(&["..."]).unwrap();
        let mut master = RelaxedMaster::new(map, 2);
        let cut = RobustCut::new(
            "cut".to_string(),
            CutKind::TwoEdge,
            0,
            1,
            vec![EdgeTime::new(Edge::new(0, Direction::East), 0)],
            vec![EdgeTime::new(Edge::new(1, Direction::West), 0)],
            1.0,
        )
        .unwrap();

        let handle = master.add_cut(cut.clone()).unwrap();
        assert!(handle.is_some());
        assert_eq!(master.add_cut(cut).unwrap(), None);
        assert_eq!(master.pool().len(), 1);
    }
}
