mod cut;
mod path;

pub use cut::{CutKind, RectangleBoundaries, RobustCut};
pub(crate) use cut::CutKey;
pub use path::{Agent, Column, EdgeTime, NodeTime, Path, Time};
