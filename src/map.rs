use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Identifier of one cell, `y * width + x`.
pub type Node = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Wait,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Wait,
    ];

    pub fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Wait => Direction::Wait,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }

    /// Unit displacement `(dx, dy)`, with `y` growing southwards.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::Wait => (0, 0),
        }
    }
}

/// A move starting at `node` in direction `dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub node: Node,
    pub dir: Direction,
}

impl Edge {
    pub fn new(node: Node, dir: Direction) -> Self {
        Edge { node, dir }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    passable: bool,
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    grid: Vec<Tile>,
}

impl Map {
    /// Builds a map from text rows, `.` is passable and anything else blocked.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if height == 0 || width == 0 {
            return Err(Error::EmptyMap);
        }

        let mut grid = Vec::with_capacity(height * width);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(Error::RaggedMap {
                    row: y,
                    expected: width,
                    found,
                });
            }
            grid.extend(row.chars().map(|ch| Tile { passable: ch == '.' }));
        }

        Ok(Map {
            height,
            width,
            grid,
        })
    }

    /// Parses the octile `.map` format: `type`, `height`, `width` and `map`
    /// header lines followed by the rows.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim_end);

        let _type = lines
            .next()
            .ok_or_else(|| Error::MapHeader("missing type line".to_string()))?;
        let height = Self::parse_header_value(lines.next(), "height")?;
        let width = Self::parse_header_value(lines.next(), "width")?;
        match lines.next() {
            Some("map") => {}
            other => {
                return Err(Error::MapHeader(format!(
                    "expected `map`, found {other:?}"
                )))
            }
        }

        let rows: Vec<&str> = lines.take(height).collect();
        let map = Self::from_rows(&rows)?;
        if map.height != height || map.width != width {
            return Err(Error::MapHeader(format!(
                "header says {height}x{width}, rows give {}x{}",
                map.height, map.width
            )));
        }
        Ok(map)
    }

    fn parse_header_value(line: Option<&str>, key: &str) -> Result<usize> {
        let line = line.ok_or_else(|| Error::MapHeader(format!("missing {key} line")))?;
        let mut parts = line.split_whitespace();
        if parts.next() != Some(key) {
            return Err(Error::MapHeader(format!("expected `{key}`, found {line:?}")));
        }
        parts
            .next()
            .and_then(|value| value.parse::<usize>().ok())
            .ok_or_else(|| Error::MapHeader(format!("bad {key} value in {line:?}")))
    }

    pub fn size(&self) -> usize {
        self.grid.len()
    }

    pub fn get_id(&self, x: usize, y: usize) -> Option<Node> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Like [`Map::get_id`] but only for passable cells, accepting signed
    /// coordinates so callers can probe one step past the border.
    pub fn passable_id(&self, x: i64, y: i64) -> Option<Node> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get_id(x as usize, y as usize)
            .filter(|&node| self.grid[node].is_passable())
    }

    pub fn get_xy(&self, node: Node) -> (usize, usize) {
        debug_assert!(node < self.grid.len(), "node {node} outside map");
        (node % self.width, node / self.width)
    }

    pub fn get_x(&self, node: Node) -> usize {
        node % self.width
    }

    pub fn get_y(&self, node: Node) -> usize {
        node / self.width
    }

    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        self.get_id(x, y)
            .is_some_and(|node| self.grid[node].is_passable())
    }

    pub fn is_passable_node(&self, node: Node) -> bool {
        self.grid.get(node).is_some_and(Tile::is_passable)
    }

    /// Passable cell reached from `node` by moving in `dir`.
    pub fn neighbor(&self, node: Node, dir: Direction) -> Option<Node> {
        if !self.is_passable_node(node) {
            return None;
        }
        let (x, y) = self.get_xy(node);
        let (dx, dy) = dir.offset();
        self.passable_id(x as i64 + dx, y as i64 + dy)
    }

    pub fn get_north(&self, node: Node) -> Option<Node> {
        self.neighbor(node, Direction::North)
    }

    pub fn get_south(&self, node: Node) -> Option<Node> {
        self.neighbor(node, Direction::South)
    }

    pub fn get_east(&self, node: Node) -> Option<Node> {
        self.neighbor(node, Direction::East)
    }

    pub fn get_west(&self, node: Node) -> Option<Node> {
        self.neighbor(node, Direction::West)
    }

    /// All moves available from `node`, waiting included.
    pub fn get_neighbors(&self, node: Node) -> Vec<(Direction, Node)> {
        Direction::ALL
            .iter()
            .filter_map(|&dir| self.neighbor(node, dir).map(|next| (dir, next)))
            .collect()
    }

    pub fn destination(&self, edge: Edge) -> Option<Node> {
        self.neighbor(edge.node, edge.dir)
    }

    /// The same segment traversed in reverse. A wait is its own opposite.
    pub fn opposite_edge(&self, edge: Edge) -> Option<Edge> {
        self.destination(edge)
            .map(|node| Edge::new(node, edge.dir.reverse()))
    }

    /// Formats an edge as `((x1,y1),(x2,y2))`.
    pub fn format_edge(&self, edge: Edge) -> String {
        let (x1, y1) = self.get_xy(edge.node);
        let (dx, dy) = edge.dir.offset();
        format!(
            "(({x1},{y1}),({},{}))",
            x1 as i64 + dx,
            y1 as i64 + dy
        )
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.grid.chunks(self.width) {
            let line: String = row
                .iter()
                .map(|tile| if tile.passable { '.' } else { '@' })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> Map {
        Map::from_rows(&["....", ".@..", "...."]).unwrap()
    }

    #[test]
    fn test_read_map() {
        let map = Map::parse("type octile\nheight 3\nwidth 4\nmap\n....\n.@..\n....\n").unwrap();

        assert_eq!(map.height, 3);
        assert_eq!(map.width, 4);
        assert_eq!(map, small_map());

        assert!(map.is_passable(0, 0));
        assert!(!map.is_passable(1, 1));
        assert!(!map.is_passable(4, 0));

        let node = map.get_id(0, 1).unwrap();
        let neighbors = map.get_neighbors(node);
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.contains(&(Direction::North, map.get_id(0, 0).unwrap())));
        assert!(neighbors.contains(&(Direction::South, map.get_id(0, 2).unwrap())));
        assert!(neighbors.contains(&(Direction::Wait, node)));
    }

    #[test]
    fn test_bad_maps() {
        assert_eq!(Map::from_rows::<&str>(&[]), Err(Error::EmptyMap));
        assert_eq!(
            Map::from_rows(&["...", ".."]),
            Err(Error::RaggedMap {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert!(matches!(
            Map::parse("type octile\nheight 2\nwidth 3\nmap\n...\n"),
            Err(Error::MapHeader(_))
        ));
        assert!(matches!(
            Map::parse("type octile\nwidth 3\nheight 1\nmap\n...\n"),
            Err(Error::MapHeader(_))
        ));
    }

    #[test]
    fn test_coordinates() {
        let map = small_map();
        for node in 0..map.size() {
            let (x, y) = map.get_xy(node);
            assert_eq!(map.get_id(x, y), Some(node));
            assert_eq!(map.get_x(node), x);
            assert_eq!(map.get_y(node), y);
        }
        assert_eq!(map.get_id(4, 0), None);
        assert_eq!(map.passable_id(-1, 0), None);
        assert_eq!(map.passable_id(1, 1), None);
        assert_eq!(map.passable_id(2, 1), map.get_id(2, 1));
    }

    #[test]
    fn test_directional_lookups() {
        let map = small_map();
        let corner = map.get_id(0, 0).unwrap();
        assert_eq!(map.get_north(corner), None);
        assert_eq!(map.get_west(corner), None);
        assert_eq!(map.get_east(corner), map.get_id(1, 0));
        assert_eq!(map.get_south(corner), map.get_id(0, 1));

        // Blocked cell below.
        let top = map.get_id(1, 0).unwrap();
        assert_eq!(map.get_south(top), None);
        assert_eq!(map.neighbor(top, Direction::Wait), Some(top));
    }

    #[test]
    fn test_opposite_edge() {
        let map = small_map();
        let a = map.get_id(2, 0).unwrap();
        let b = map.get_id(3, 0).unwrap();

        let east = Edge::new(a, Direction::East);
        assert_eq!(map.destination(east), Some(b));
        assert_eq!(map.opposite_edge(east), Some(Edge::new(b, Direction::West)));
        assert_eq!(
            map.opposite_edge(Edge::new(a, Direction::Wait)),
            Some(Edge::new(a, Direction::Wait))
        );
        assert_eq!(map.opposite_edge(Edge::new(a, Direction::North)), None);
        assert_eq!(map.format_edge(east), "((2,0),(3,0))");
    }

    #[test]
    fn test_display() {
        assert_eq!(small_map().to_string(), "....\n.@..\n....\n");
    }
}
