//! Key name → pixel coordinate map supplied by the host.
//!
//! Entries keep the order in which the host sent them. Re-sending a name
//! replaces its coordinate but keeps its original position, so iteration
//! order (and the resolver's tie-break) only depends on first appearance.

use ckb_transport::ProtocolError;
use std::collections::HashMap;
use std::str::FromStr;

/// Integer pixel coordinate on the host's keyboard layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Parses the wire form `"x,y"`.
impl FromStr for Point {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidCoordinate(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self { x, y })
    }
}

/// Ordered key name → coordinate map plus the layout's extent
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    entries: Vec<(String, Point)>,
    index: HashMap<String, usize>,
    max_x: i32,
    max_y: i32,
    declared_count: Option<usize>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty map expecting `count` keys (the `keycount` announcement).
    pub fn with_declared_count(count: usize) -> Self {
        Self {
            entries: Vec::with_capacity(count),
            index: HashMap::with_capacity(count),
            declared_count: Some(count),
            ..Self::default()
        }
    }

    /// Insert or replace a key, returning the previous coordinate.
    ///
    /// `max_x`/`max_y` only ever grow, so a replaced coordinate still counts
    /// towards the extent.
    pub fn insert(&mut self, name: impl Into<String>, pos: Point) -> Option<Point> {
        let name = name.into();
        if self.entries.is_empty() {
            self.max_x = pos.x;
            self.max_y = pos.y;
        } else {
            self.max_x = self.max_x.max(pos.x);
            self.max_y = self.max_y.max(pos.y);
        }

        match self.index.get(&name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, pos)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, pos));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Point> {
        self.index.get(name).map(|&i| self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> + '_ {
        self.entries.iter().map(|(name, pos)| (name.as_str(), *pos))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest x seen (0 for an empty map)
    pub fn max_x(&self) -> i32 {
        self.max_x
    }

    /// Largest y seen (0 for an empty map)
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    pub fn declared_count(&self) -> Option<usize> {
        self.declared_count
    }
}
