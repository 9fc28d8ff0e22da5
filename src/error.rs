use thiserror::Error;

use crate::map::Direction;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Map has no passable rows")]
    EmptyMap,
    #[error("Map row {row} has width {found}, expected {expected}")]
    RaggedMap {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Map header is malformed: {0}")]
    MapHeader(String),
    #[error("Cell ({x},{y}) is outside the map or blocked")]
    BlockedCell { x: usize, y: usize },
    #[error("Move {dir:?} from ({x},{y}) at time {time} leaves the passable grid")]
    BlockedMove {
        x: usize,
        y: usize,
        dir: Direction,
        time: usize,
    },
    #[error("Agent {agent} is out of range, the problem has {num_agents} agents")]
    AgentOutOfRange { agent: usize, num_agents: usize },
    #[error("Column value {0} is not in [0, 1]")]
    InvalidColumnValue(f64),
    #[error("Cut between agents {a1} and {a2} has no edges for one of the agents")]
    EmptyCutSupport { a1: usize, a2: usize },
    #[error("Cut refers to agents {a1} and {a2}, which must be distinct and ordered")]
    InvalidCutAgents { a1: usize, a2: usize },
}
