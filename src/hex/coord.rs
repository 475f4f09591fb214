//! Hexagonal Efficient Coordinate System (HECS)
//!
//! A coordinate is the triple `(a, r, c)`: `a` selects one of the two
//! interleaved rectangular arrays (even or odd offset rows), `r` and `c`
//! index the row and column inside that array. Addition, negation and the
//! six neighbor operators are closed over the triple.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// √3 as used by the render-plane projection
pub const SQRT_3: f32 = 1.732_050_8;

/// One of the six directions out of a hex cell, in clockwise order.
///
/// The discriminant is the bit index used by [`HexBoundary`](super::HexBoundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HexDirection {
    UpRight = 0,
    Right = 1,
    DownRight = 2,
    DownLeft = 3,
    Left = 4,
    UpLeft = 5,
}

impl HexDirection {
    /// Clockwise, starting at UpRight
    pub const ALL: [HexDirection; 6] = [
        HexDirection::UpRight,
        HexDirection::Right,
        HexDirection::DownRight,
        HexDirection::DownLeft,
        HexDirection::Left,
        HexDirection::UpLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Displacement from the origin to its neighbor in this direction
    pub fn offset(self) -> HecsCoord {
        HecsCoord::ORIGIN.neighbor(self)
    }
}

/// Largest `|r|` or `|c|` accepted from the wire
pub const COORD_LIMIT: i32 = 1 << 24;

/// Axial hex coordinate. `a` is always 0 or 1.
///
/// Arithmetic wraps at the `i32` range instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawHecsCoord")]
pub struct HecsCoord {
    pub a: i32,
    pub r: i32,
    pub c: i32,
}

#[derive(Deserialize)]
struct RawHecsCoord {
    a: i32,
    r: i32,
    c: i32,
}

impl TryFrom<RawHecsCoord> for HecsCoord {
    type Error = String;

    fn try_from(raw: RawHecsCoord) -> Result<Self, Self::Error> {
        if raw.a != 0 && raw.a != 1 {
            return Err(format!("hecs parity bit must be 0 or 1, got {}", raw.a));
        }
        let limit = COORD_LIMIT.unsigned_abs();
        if raw.r.unsigned_abs() > limit || raw.c.unsigned_abs() > limit {
            return Err(format!("hecs coordinate ({}, {}) out of range", raw.r, raw.c));
        }
        Ok(Self {
            a: raw.a,
            r: raw.r,
            c: raw.c,
        })
    }
}

impl HecsCoord {
    pub const ORIGIN: Self = Self { a: 0, r: 0, c: 0 };

    pub const fn new(a: i32, r: i32, c: i32) -> Self {
        debug_assert!(a == 0 || a == 1);
        Self { a, r, c }
    }

    /// Convert "odd-r" offset coordinates. Row parity becomes `a`.
    pub fn from_offset(row: i32, col: i32) -> Self {
        Self::new(row.rem_euclid(2), row.div_euclid(2), col)
    }

    /// Inverse of [`HecsCoord::from_offset`], returns `(row, col)`.
    pub fn to_offset(self) -> (i32, i32) {
        (self.r.wrapping_mul(2).wrapping_add(self.a), self.c)
    }

    pub fn up_right(self) -> Self {
        Self::new(1 - self.a, self.r.wrapping_sub(1 - self.a), self.c.wrapping_add(self.a))
    }

    pub fn right(self) -> Self {
        Self::new(self.a, self.r, self.c.wrapping_add(1))
    }

    pub fn down_right(self) -> Self {
        Self::new(1 - self.a, self.r.wrapping_add(self.a), self.c.wrapping_add(self.a))
    }

    pub fn down_left(self) -> Self {
        Self::new(1 - self.a, self.r.wrapping_add(self.a), self.c.wrapping_sub(1 - self.a))
    }

    pub fn left(self) -> Self {
        Self::new(self.a, self.r, self.c.wrapping_sub(1))
    }

    pub fn up_left(self) -> Self {
        Self::new(
            1 - self.a,
            self.r.wrapping_sub(1 - self.a),
            self.c.wrapping_sub(1 - self.a),
        )
    }

    pub fn neighbor(self, direction: HexDirection) -> Self {
        match direction {
            HexDirection::UpRight => self.up_right(),
            HexDirection::Right => self.right(),
            HexDirection::DownRight => self.down_right(),
            HexDirection::DownLeft => self.down_left(),
            HexDirection::Left => self.left(),
            HexDirection::UpLeft => self.up_left(),
        }
    }

    /// All six neighbors, clockwise from UpRight. Index `i` is boundary bit `i`.
    pub fn neighbors(self) -> [Self; 6] {
        HexDirection::ALL.map(|d| self.neighbor(d))
    }

    /// Neighbor the given heading points into. Headings are bucketed into
    /// 60° sextants; negative headings wrap (`-10° -> sextant 5`).
    pub fn neighbor_at_heading(self, heading_degrees: f32) -> Self {
        let sextant = (heading_degrees / 60.0).floor() as i64;
        let index = sextant.rem_euclid(6) as usize;
        self.neighbors()[index]
    }

    /// Direction of `other` if it is an immediate neighbor
    pub fn direction_to(self, other: Self) -> Option<HexDirection> {
        let displacement = other - self;
        HexDirection::ALL
            .into_iter()
            .find(|d| d.offset() == displacement)
    }

    pub fn is_adjacent_to(self, other: Self) -> bool {
        self.direction_to(other).is_some()
    }

    /// Heading pointing at the middle of the sextant containing `other`.
    /// Only meaningful for adjacent coordinates.
    pub fn degrees_to(self, other: Self) -> Option<f32> {
        self.direction_to(other)
            .map(|d| d.index() as f32 * 60.0 + 30.0)
    }

    /// Projection onto the render plane, unit distance between neighbors.
    pub fn cartesian(self) -> (f32, f32) {
        let a = self.a as f32;
        (0.5 * a + self.c as f32, SQRT_3 * (0.5 * a + self.r as f32))
    }
}

impl Add for HecsCoord {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let carry = self.a & other.a;
        Self::new(
            self.a ^ other.a,
            self.r.wrapping_add(other.r).wrapping_add(carry),
            self.c.wrapping_add(other.c).wrapping_add(carry),
        )
    }
}

impl Neg for HecsCoord {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(
            self.a,
            self.r.wrapping_neg().wrapping_sub(self.a),
            self.c.wrapping_neg().wrapping_sub(self.a),
        )
    }
}

impl Sub for HecsCoord {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl fmt::Display for HecsCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.a, self.r, self.c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_coords(seed: u64, n: usize) -> Vec<HecsCoord> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                HecsCoord::new(
                    rng.gen_range(0..=1),
                    rng.gen_range(-50..50),
                    rng.gen_range(-50..50),
                )
            })
            .collect()
    }

    #[test]
    fn add_negation_is_origin() {
        for x in random_coords(1, 500) {
            assert_eq!(x + (-x), HecsCoord::ORIGIN, "x = {x}");
            assert_eq!(x - x, HecsCoord::ORIGIN);
        }
    }

    #[test]
    fn neighbor_operators_invert() {
        for x in random_coords(2, 500) {
            assert_eq!(x.right().left(), x);
            assert_eq!(x.left().right(), x);
            assert_eq!(x.up_right().down_left(), x);
            assert_eq!(x.down_left().up_right(), x);
            assert_eq!(x.down_right().up_left(), x);
            assert_eq!(x.up_left().down_right(), x);
        }
    }

    #[test]
    fn neighbor_is_addition_of_canonical_offset() {
        for x in random_coords(3, 200) {
            for d in HexDirection::ALL {
                assert_eq!(x.neighbor(d), x + d.offset());
                assert_eq!(x.neighbor(d) - x, d.offset());
                assert_eq!(x.neighbor(d).neighbor(d.opposite()), x);
            }
        }
    }

    #[test]
    fn origin_neighbors_in_clockwise_order() {
        assert_eq!(
            HecsCoord::ORIGIN.neighbors(),
            [
                HecsCoord::new(1, -1, 0),
                HecsCoord::new(0, 0, 1),
                HecsCoord::new(1, 0, 0),
                HecsCoord::new(1, 0, -1),
                HecsCoord::new(0, 0, -1),
                HecsCoord::new(1, -1, -1),
            ]
        );
    }

    #[test]
    fn offset_round_trip() {
        for row in -20..20 {
            for col in -20..20 {
                let coord = HecsCoord::from_offset(row, col);
                assert!(coord.a == 0 || coord.a == 1);
                assert_eq!(coord.to_offset(), (row, col));
            }
        }
    }

    #[test]
    fn neighbors_are_unit_distance_apart() {
        for x in random_coords(4, 100) {
            let (x0, y0) = x.cartesian();
            for n in x.neighbors() {
                let (x1, y1) = n.cartesian();
                let dist = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
                assert!((dist - 1.0).abs() < 1e-3, "{x} -> {n}: {dist}");
            }
        }
    }

    #[test]
    fn cartesian_projection() {
        assert_eq!(HecsCoord::ORIGIN.cartesian(), (0.0, 0.0));
        assert_eq!(HecsCoord::new(0, 0, 1).cartesian(), (1.0, 0.0));
        let (x, y) = HecsCoord::new(1, 2, 3).cartesian();
        assert_eq!(x, 3.5);
        assert_eq!(y, SQRT_3 * 2.5);
    }

    #[test]
    fn heading_buckets_wrap_negative() {
        let x = HecsCoord::new(0, 3, 3);
        let n = x.neighbors();
        assert_eq!(x.neighbor_at_heading(0.0), n[0]);
        assert_eq!(x.neighbor_at_heading(59.9), n[0]);
        assert_eq!(x.neighbor_at_heading(60.0), n[1]);
        assert_eq!(x.neighbor_at_heading(359.0), n[5]);
        assert_eq!(x.neighbor_at_heading(360.0), n[0]);
        assert_eq!(x.neighbor_at_heading(-10.0), n[5]);
        assert_eq!(x.neighbor_at_heading(-370.0), n[5]);
    }

    #[test]
    fn degrees_to_round_trips_through_heading() {
        for x in random_coords(5, 50) {
            for n in x.neighbors() {
                let heading = x.degrees_to(n).unwrap();
                assert_eq!(x.neighbor_at_heading(heading), n);
            }
            assert_eq!(x.degrees_to(x), None);
        }
    }

    #[test]
    fn deserialize_rejects_bad_parity() {
        let ok: HecsCoord = serde_json::from_str(r#"{"a":1,"r":-2,"c":4}"#).unwrap();
        assert_eq!(ok, HecsCoord::new(1, -2, 4));
        assert!(serde_json::from_str::<HecsCoord>(r#"{"a":2,"r":0,"c":0}"#).is_err());
    }

    #[test]
    fn deserialize_rejects_huge_components() {
        let edge = format!(r#"{{"a":0,"r":{COORD_LIMIT},"c":-{COORD_LIMIT}}}"#);
        assert!(serde_json::from_str::<HecsCoord>(&edge).is_ok());
        assert!(serde_json::from_str::<HecsCoord>(r#"{"a":0,"r":2147483647,"c":0}"#).is_err());
        assert!(serde_json::from_str::<HecsCoord>(r#"{"a":1,"r":0,"c":-2147483648}"#).is_err());
    }

    #[test]
    fn arithmetic_at_i32_extremes_wraps() {
        let top = HecsCoord::new(1, i32::MAX, i32::MAX);
        let bottom = HecsCoord::new(0, i32::MIN, i32::MIN);
        for x in [top, bottom] {
            assert_eq!(x + (-x), HecsCoord::ORIGIN);
            for d in HexDirection::ALL {
                assert_eq!(x.neighbor(d).neighbor(d.opposite()), x);
            }
        }
        assert_eq!(
            HecsCoord::new(0, i32::MAX, 0) + HecsCoord::new(0, 1, 0),
            HecsCoord::new(0, i32::MIN, 0)
        );
    }
}
