//! Raw (x, y) event → nearest key name.

use crate::error::ResolutionError;
use crate::keymap::{KeyMap, Point};

/// Return the key nearest to `(x, y)`.
///
/// A key mapped exactly to `(x, y)` wins immediately, even when other keys
/// share that coordinate. Otherwise the key with the smallest Euclidean
/// distance wins; on equal distances the key that came first in the keymap
/// is kept.
pub fn nearest(keymap: &KeyMap, x: i32, y: i32) -> Result<&str, ResolutionError> {
    let target = Point::new(x, y);
    let mut best: Option<(&str, f64)> = None;

    for (name, pos) in keymap.iter() {
        if pos == target {
            return Ok(name);
        }
        let distance = pos.distance(target);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((name, distance)),
        }
    }

    best.map(|(name, _)| name)
        .ok_or(ResolutionError::EmptyKeymap { x, y })
}
