//! Vector map shapes.
//!
//! The world map is a line-oriented text file. Each line starts with a tag:
//! `R` for a shape whose vertices are deltas from the previous vertex, `A` for
//! a shape whose vertices are absolute positions relative to the shape origin,
//! and `#` for a comment. Any other line is skipped. The tag is followed by
//! whitespace-separated numbers in pairs: the shape origin first, then the
//! vertices.

use crate::sync::Snapshot;
use glam::{DVec2, IVec2};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Fixed-point scale applied to every shape coordinate before flooring.
pub const POLYGON_SCALE: f64 = 10.0;

/// Minimum number of coordinate pairs (origin included) in a shape record.
const MIN_PAIRS: usize = 3;

/// Largest magnitude a coordinate, or a position accumulated from deltas, may have.
/// Keeps every fixed-point value well inside `i32`.
pub const MAX_COORDINATE: f64 = 1.0e6;

/// Errors raised while reading the map file.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("invalid coordinate {token:?}")]
    InvalidNumber { token: String },

    #[error("coordinate {value} is outside the supported range of +/-1000000")]
    OutOfRange { value: f64 },

    #[error("odd number of coordinates ({count})")]
    DanglingCoordinate { count: usize },

    #[error("shape has {pairs} coordinate pair(s), at least 3 are required")]
    TooFewPoints { pairs: usize },

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<ParseError>,
    },
}

/// How the vertices of a shape are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Each vertex is a delta from the previous one.
    Relative,
    /// Each vertex is offset from the shape origin independently.
    Absolute,
}

impl Encoding {
    fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'R' => Some(Encoding::Relative),
            'A' => Some(Encoding::Absolute),
            _ => None,
        }
    }

    /// Computes the next fixed-point vertex.
    ///
    /// `cursor` is the previously emitted point (the scaled origin before the
    /// first vertex). Relative shapes accumulate onto it; absolute shapes
    /// ignore it.
    pub fn step(self, cursor: IVec2, origin: DVec2, vertex: DVec2) -> IVec2 {
        match self {
            Encoding::Relative => cursor.saturating_add(scale_floor(vertex)),
            Encoding::Absolute => scale_floor(vertex).saturating_add(scale_floor(origin)),
        }
    }
}

/// Scales a coordinate into fixed point, flooring each axis.
pub fn scale_floor(v: DVec2) -> IVec2 {
    (v * POLYGON_SCALE).floor().as_ivec2()
}

/// A revealed outline in fixed-point world units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Polygon {
    points: Vec<IVec2>,
}

impl Polygon {
    pub fn new(points: Vec<IVec2>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[IVec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates the points as world-plane coordinates.
    pub fn world_points(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.points.iter().map(|p| p.as_dvec2())
    }
}

/// One outline from the map file together with its reveal state.
///
/// The geometry is immutable. The reveal target is raised by the UI and the
/// published polygon is replaced by the reveal scheduler.
#[derive(Debug)]
pub struct MapShape {
    encoding: Encoding,
    origin: DVec2,
    vertices: Vec<DVec2>,
    target: AtomicUsize,
    polygon: Snapshot<Polygon>,
}

impl MapShape {
    /// Creates an unrevealed shape. `vertices` must start with the implicit `(0, 0)`.
    pub fn new(encoding: Encoding, origin: DVec2, vertices: Vec<DVec2>) -> Self {
        Self {
            encoding,
            origin,
            vertices,
            target: AtomicUsize::new(0),
            polygon: Snapshot::default(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of reveal steps until the shape is complete.
    ///
    /// Relative shapes take one extra step for the point that closes the ring.
    pub fn max_reveal(&self) -> usize {
        match self.encoding {
            Encoding::Relative => self.vertices.len() + 1,
            Encoding::Absolute => self.vertices.len(),
        }
    }

    /// Number of points the scheduler has been asked to reveal.
    pub fn target_count(&self) -> usize {
        self.target.load(Ordering::Acquire)
    }

    /// Number of points in the currently published polygon.
    pub fn revealed_count(&self) -> usize {
        self.polygon.load().len()
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.revealed_count() == self.max_reveal()
    }

    /// Latest published polygon snapshot.
    pub fn polygon(&self) -> Arc<Polygon> {
        self.polygon.load()
    }

    pub(crate) fn publish(&self, polygon: Polygon) {
        debug_assert!(polygon.len() <= self.max_reveal());
        self.polygon.publish(polygon);
    }

    /// Asks for one more vertex to be revealed. Returns the new target.
    pub fn request_new_vertex(&self) -> usize {
        let max = self.max_reveal();
        match self
            .target
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| {
                (t < max).then_some(t + 1)
            }) {
            Ok(previous) => previous + 1,
            Err(current) => current,
        }
    }

    /// Asks for the whole shape to be revealed.
    pub fn reveal_all(&self) {
        self.target.fetch_max(self.max_reveal(), Ordering::AcqRel);
    }

    /// Builds the complete polygon in one pass.
    pub fn full_polygon(&self) -> Polygon {
        let start = scale_floor(self.origin);
        let mut cursor = start;
        let mut points = Vec::with_capacity(self.max_reveal());

        for vertex in &self.vertices {
            cursor = self.encoding.step(cursor, self.origin, *vertex);
            points.push(cursor);
        }
        if self.encoding == Encoding::Relative {
            points.push(start);
        }

        Polygon::new(points)
    }
}

/// Parses one map file record.
///
/// Returns `Ok(None)` for comments, blank lines and unrecognized tags.
pub fn parse_shape(record: &str) -> Result<Option<MapShape>, ParseError> {
    let record = record.trim_end();
    let mut chars = record.chars();
    let Some(encoding) = chars.next().and_then(Encoding::from_tag) else {
        return Ok(None);
    };

    let values = chars
        .as_str()
        .split_whitespace()
        .map(parse_coordinate)
        .collect::<Result<Vec<f64>, ParseError>>()?;

    if values.len() < MIN_PAIRS * 2 {
        return Err(ParseError::TooFewPoints {
            pairs: values.len() / 2,
        });
    }
    if values.len() % 2 != 0 {
        return Err(ParseError::DanglingCoordinate {
            count: values.len(),
        });
    }

    let origin = DVec2::new(values[0], values[1]);
    // The origin already captures the first position, so the first vertex is (0, 0).
    let vertices: Vec<DVec2> = std::iter::once(DVec2::ZERO)
        .chain(values[2..].chunks_exact(2).map(|c| DVec2::new(c[0], c[1])))
        .collect();

    if encoding == Encoding::Relative {
        let mut position = origin;
        for delta in &vertices {
            position += *delta;
            check_range(position.x)?;
            check_range(position.y)?;
        }
    }

    Ok(Some(MapShape::new(encoding, origin, vertices)))
}

/// Parses one finite, in-range coordinate token.
fn parse_coordinate(token: &str) -> Result<f64, ParseError> {
    let value = token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            token: token.to_string(),
        })?;
    check_range(value)?;
    Ok(value)
}

fn check_range(value: f64) -> Result<(), ParseError> {
    if value.abs() > MAX_COORDINATE {
        return Err(ParseError::OutOfRange { value });
    }
    Ok(())
}

/// Parses a complete map file. Any malformed shape fails the whole load.
pub fn parse_map_file(text: &str) -> Result<Vec<MapShape>, ParseError> {
    let mut shapes = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        match parse_shape(line) {
            Ok(Some(shape)) => shapes.push(shape),
            Ok(None) => {}
            Err(e) => {
                return Err(ParseError::Line {
                    line: idx + 1,
                    source: Box::new(e),
                })
            }
        }
    }

    log::debug!("Parsed {} map shapes", shapes.len());
    Ok(shapes)
}
