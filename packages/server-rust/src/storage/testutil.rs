//! Shared fixtures for the storage engine tests: a deterministic point
//! generator and a generic contract battery every engine runs.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pointdb_core::{Filter, Point, Query};
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::pointio::PointIo;

const ANIMALS: [&str; 5] = ["cat", "dog", "horse", "pig", "cow"];
const SHAPES: [&str; 6] = ["circle", "square", "rhombus", "rectangle", "triangle", "pentagon"];
const COLORS: [&str; 10] = [
    "red", "green", "blue", "yellow", "orange", "purple", "pink", "gray", "black", "white",
];

/// Base timestamp all generated points hang off.
pub(crate) fn start_ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 23, 1, 2).unwrap()
}

/// A deterministic point `i` minutes past [`start_ts`]: attributes cycle
/// through fixed tables and values trace sin/cos, so filters select
/// predictable subsets.
pub(crate) fn minute_point(i: u32) -> Point {
    let fi = f64::from(i);
    Point::new(start_ts() + Duration::minutes(i64::from(i)))
        .with_val("area", fi.sin())
        .with_val("temp", fi.cos())
        .with_attr("animal", ANIMALS[i as usize % ANIMALS.len()])
        .with_attr("shape", SHAPES[i as usize % SHAPES.len()])
        .with_attr("color", COLORS[i as usize % COLORS.len()])
}

/// `n` consecutive minute points starting at offset `a`, shuffled with a
/// fixed seed.
pub(crate) fn sample_points_shuffled(a: u32, n: u32) -> Vec<Point> {
    let mut points: Vec<Point> = (a..a + n).map(minute_point).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    points.shuffle(&mut rng);
    points
}

/// Drains a search over `[lo, hi]` with `True` in batches of `batch` and
/// checks the result against `expected` (any order).
fn check_query(
    io: &dyn PointIo,
    lo: DateTime<Utc>,
    hi: DateTime<Utc>,
    batch: usize,
    expected: &[Point],
) {
    let query = Query::new(lo, hi, Filter::True);
    let mut cur = io.search(&query).expect("search");

    let mut got = Vec::new();
    loop {
        let chunk = cur.fetch(batch).expect("fetch");
        if chunk.is_empty() {
            break;
        }
        // Every batch but the final one is full.
        if got.len() + chunk.len() < expected.len() {
            assert_eq!(chunk.len(), batch);
        }
        got.extend(chunk);
    }
    assert!(cur.fetch(batch).is_err(), "fetch after done must fail");

    assert_eq!(got.len(), expected.len());
    for pair in got.windows(2) {
        assert!(pair[0].key() <= pair[1].key(), "results out of order");
    }

    let mut expected = expected.to_vec();
    expected.sort_by_key(Point::key);
    for (g, e) in got.iter().zip(&expected) {
        assert!(g.identical(e), "expected {e}, got {g}");
    }
}

/// Generic `PointIo` contract battery: ingest `n` shuffled points in
/// batches of `add_batch`, tracking first/last/len, then sweep queries
/// over, before, and after the stored window.
pub(crate) fn battery(io: &mut dyn PointIo, n: u32, add_batch: usize) {
    let points = sample_points_shuffled(0, n);

    assert_eq!(io.len(), 0);
    assert!(io.first().is_none());
    assert!(io.last().is_none());

    let mut min_ts = points[0].ts;
    let mut max_ts = points[0].ts;
    for chunk in points.chunks(add_batch) {
        for p in chunk {
            min_ts = min_ts.min(p.ts);
            max_ts = max_ts.max(p.ts);
        }
        io.add(chunk.to_vec()).expect("add");
        assert_eq!(io.first().expect("first").ts, min_ts);
        assert_eq!(io.last().expect("last").ts, max_ts);
    }
    assert_eq!(io.len(), n as usize);

    io.vacuum().expect("vacuum");

    check_query(io, min_ts, max_ts, 10, &points);
    check_query(io, min_ts - Duration::hours(1), min_ts - Duration::minutes(1), 10, &[]);
    check_query(io, max_ts + Duration::minutes(1), max_ts + Duration::hours(1), 10, &[]);
}
