//! Chain-code contours: a start pixel plus a sequence of unit moves.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::polygon::Polygon;
use crate::raster::Point;

/// Unit move between neighbouring pixels. Codes increase clockwise on
/// screen, starting from `Up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::UpRight,
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::DownLeft,
        Direction::Left,
        Direction::UpLeft,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// `(dx, dy)` of the move in raster coordinates.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::UpRight => (1, -1),
            Direction::Right => (1, 0),
            Direction::DownRight => (1, 1),
            Direction::Down => (0, 1),
            Direction::DownLeft => (-1, 1),
            Direction::Left => (-1, 0),
            Direction::UpLeft => (-1, -1),
        }
    }

    /// Rotates clockwise by `steps` eighths of a turn.
    pub fn rotate_cw(self, steps: u8) -> Self {
        Self::ALL[((self as u8 + steps) % 8) as usize]
    }

    pub fn opposite(self) -> Self {
        self.rotate_cw(4)
    }

    pub fn is_diagonal(self) -> bool {
        self as u8 % 2 == 1
    }

    /// Euclidean length of the move.
    pub fn step_length(self) -> f64 {
        if self.is_diagonal() {
            std::f64::consts::SQRT_2
        } else {
            1.0
        }
    }

    pub fn apply(self, p: Point) -> Point {
        let (dx, dy) = self.delta();
        p.offset(dx, dy)
    }
}

/// Closed boundary walk anchored at `start`.
///
/// External contours run clockwise on screen, internal contours (holes)
/// counter-clockwise. An isolated pixel has an empty chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Contour {
    pub start: Point,
    pub chain: Vec<Direction>,
}

impl Contour {
    pub fn new(start: Point, chain: Vec<Direction>) -> Self {
        Self { start, chain }
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Pixels visited by the walk: `start`, then the pixel reached by every
    /// move except the final one, which returns to `start`.
    pub fn pixels(&self) -> impl Iterator<Item = Point> + '_ {
        let steps = self.chain.len().saturating_sub(1);
        std::iter::once(self.start).chain(self.chain[..steps].iter().scan(
            self.start,
            |p, d| {
                *p = d.apply(*p);
                Some(*p)
            },
        ))
    }

    /// Pixel reached after the last move.
    pub fn end(&self) -> Point {
        self.chain.iter().fold(self.start, |p, d| d.apply(p))
    }

    pub fn is_closed(&self) -> bool {
        self.end() == self.start
    }

    /// Length of the walk: 1 per axis move, sqrt(2) per diagonal move.
    pub fn perimeter(&self) -> f64 {
        self.chain.iter().map(|d| d.step_length()).sum()
    }

    /// Polygon through the start pixel and every pixel where the walk turns.
    /// No information about the traced path is lost.
    pub fn to_polygon(&self) -> Polygon {
        let mut vertices = vec![self.start];
        let mut p = self.start;
        let mut previous: Option<Direction> = None;
        for &d in &self.chain {
            if previous.is_some_and(|prev| prev != d) {
                vertices.push(p);
            }
            p = d.apply(p);
            previous = Some(d);
        }
        Polygon::new(vertices)
    }
}
