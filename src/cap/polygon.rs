//! CAP polygon strings to closed GeoJSON rings.
//!
//! CAP writes `lat,lon` pairs separated by whitespace. GeoJSON wants
//! `[lon, lat]`, so every pair is swapped on the way through.

use crate::feature::{Position, Ring};

/// Fewest distinct valid positions a ring may have
pub const MIN_RING_POSITIONS: usize = 3;

/// Parse one `lat,lon` pair into a `[lon, lat]` position.
pub fn parse_pair(pair: &str) -> Option<Position> {
    let (lat, lon) = pair.split_once(',')?;
    if lon.contains(',') {
        return None;
    }

    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    (lat.is_finite() && lon.is_finite()).then_some([lon, lat])
}

/// Parse a polygon string into a closed ring.
///
/// Invalid pairs are dropped individually. The ring itself is dropped
/// when fewer than [`MIN_RING_POSITIONS`] distinct valid positions remain.
pub fn parse_ring(raw: &str) -> Option<Ring> {
    let mut ring = Vec::new();
    for token in raw.split_whitespace() {
        match parse_pair(token) {
            Some(position) => ring.push(position),
            None => tracing::warn!(pair = token, "dropping invalid coordinate pair"),
        }
    }

    if !has_min_distinct(&ring) {
        tracing::warn!(
            valid = ring.len(),
            "dropping polygon with fewer than {MIN_RING_POSITIONS} distinct positions"
        );
        return None;
    }

    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(first);
        }
    }
    Some(ring)
}

fn has_min_distinct(ring: &[Position]) -> bool {
    let mut seen: Vec<Position> = Vec::with_capacity(MIN_RING_POSITIONS);
    for position in ring {
        if !seen.contains(position) {
            seen.push(*position);
            if seen.len() == MIN_RING_POSITIONS {
                return true;
            }
        }
    }
    false
}
