use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

use crate::common::{Agent, Column, Path};
use crate::error::{Error, Result};
use crate::map::{Direction, Map};
use crate::master::RelaxedMaster;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnYaml {
    pub agent: Agent,
    pub start: [usize; 2],
    #[serde(default)]
    pub moves: Vec<Direction>,
    pub value: f64,
}

/// A fractional master solution written down for replaying one
/// separation round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub map: Vec<String>,
    pub num_agents: usize,
    pub columns: Vec<ColumnYaml>,
}

impl Snapshot {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("cannot parse snapshot")
    }

    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("cannot open snapshot {path}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).with_context(|| format!("cannot parse snapshot {path}"))
    }

    pub fn into_master(self) -> Result<RelaxedMaster> {
        let map = Map::from_rows(&self.map)?;
        let mut master = RelaxedMaster::new(map.clone(), self.num_agents);
        for column in self.columns {
            let [x, y] = column.start;
            let start = map
                .get_id(x, y)
                .filter(|&node| map.is_passable_node(node))
                .ok_or(Error::BlockedCell { x, y })?;
            let path = Path::from_moves(&map, start, &column.moves)?;
            master.add_column(Column::new(column.agent, path, column.value))?;
        }
        Ok(master)
    }
}
