//! A single falling petal.
//!
//! Petals never die. When one drops out of the bottom of the surface it is
//! re-randomized in place and re-enters just above the top edge, so the
//! population size stays fixed for the lifetime of the loop.
//!
//! # Depth
//!
//! Each petal has a depth factor `z` in `[0.5, 1.0)`. Size and fall speed
//! are both derived from it, which gives the parallax effect: closer petals
//! (larger `z`) are bigger and fall faster.
//!
//! | attribute  | derivation          |
//! |------------|---------------------|
//! | size       | `20·z + 10`         |
//! | fall speed | `1.5·z + 0.5`       |
//!
//! The three are only ever written together, in [`Petal::reset`].

use glam::Vec2;

use crate::canvas::Placement;
use crate::rng::{RandomSource, UNIT_CEIL};

/// Smallest depth factor.
pub const DEPTH_MIN: f32 = 0.5;
const DEPTH_SPAN: f32 = 0.5;

const SIZE_BASE: f32 = 10.0;
const SIZE_PER_DEPTH: f32 = 20.0;

const FALL_BASE: f32 = 0.5;
const FALL_PER_DEPTH: f32 = 1.5;

/// Horizontal sway amplitude at depth 1.0, in pixels per tick.
const SWAY_PER_DEPTH: f32 = 2.0;

const SWING_MIN: f32 = 50.0;
const SWING_SPAN: f32 = 100.0;

/// Rendered edge length of a petal at the given depth.
#[inline]
pub fn size_for_depth(depth: f32) -> f32 {
    depth * SIZE_PER_DEPTH + SIZE_BASE
}

/// Vertical distance travelled per tick at the given depth.
#[inline]
pub fn fall_speed_for_depth(depth: f32) -> f32 {
    depth * FALL_PER_DEPTH + FALL_BASE
}

/// One simulated petal.
///
/// Angles are in degrees. Positions are surface pixels with the origin in
/// the top-left corner and `y` growing downwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Petal {
    /// Centre of the petal.
    pub position: Vec2,
    depth: f32,
    size: f32,
    fall_speed: f32,
    /// Constant horizontal drift per tick, in `[-0.5, 0.5)`.
    pub drift: f32,
    /// Current rotation in degrees.
    pub angle: f32,
    /// Rotation per tick in degrees, in `[-1, 1)`.
    pub spin: f32,
    /// Wavelength divisor of the sideways sway, in `[50, 150)`.
    pub swing: f32,
}

impl Petal {
    /// Create a petal for a freshly populated surface.
    ///
    /// The petal is placed at a random height above the surface (somewhere
    /// within one surface height of the top edge) so the initial population
    /// trickles in instead of arriving as a single wave.
    ///
    /// Draw order: the six [`reset`](Self::reset) samples, then the
    /// vertical offset.
    pub fn spawn<R: RandomSource + ?Sized>(bounds: Vec2, rng: &mut R) -> Self {
        let mut petal = Self::randomized(bounds.x, rng);
        petal.position.y = -(petal.size + rng.next_unit() * bounds.y.max(0.0));
        petal
    }

    /// Petal with a fixed depth and no drift, spin or initial rotation.
    ///
    /// `depth` is clamped into `[0.5, 1.0)`.
    pub fn at(position: Vec2, depth: f32) -> Self {
        let depth = depth.clamp(DEPTH_MIN, UNIT_CEIL);
        Self {
            position,
            depth,
            size: size_for_depth(depth),
            fall_speed: fall_speed_for_depth(depth),
            drift: 0.0,
            angle: 0.0,
            spin: 0.0,
            swing: SWING_MIN + SWING_SPAN * 0.5,
        }
    }

    fn randomized<R: RandomSource + ?Sized>(width: f32, rng: &mut R) -> Self {
        let x = within_width(rng.next_unit() * width, width);
        let depth = (DEPTH_MIN + DEPTH_SPAN * rng.next_unit()).min(UNIT_CEIL);
        let size = size_for_depth(depth);

        Self {
            position: Vec2::new(x, -size),
            depth,
            size,
            fall_speed: fall_speed_for_depth(depth),
            drift: rng.range(-0.5, 0.5),
            angle: rng.range(0.0, 360.0),
            spin: rng.range(-1.0, 1.0),
            swing: rng.range(SWING_MIN, SWING_MIN + SWING_SPAN),
        }
    }

    /// Re-randomize every attribute and move the petal just above the top
    /// edge of a surface `width` pixels wide.
    ///
    /// Draw order: x, depth, drift, angle, spin, swing.
    pub fn reset<R: RandomSource + ?Sized>(&mut self, width: f32, rng: &mut R) {
        *self = Self::randomized(width, rng);
    }

    /// Advance one tick. Returns `true` if the petal left the surface and
    /// was reset.
    pub fn update<R: RandomSource + ?Sized>(&mut self, bounds: Vec2, rng: &mut R) -> bool {
        self.position.y += self.fall_speed;
        let sway = ((self.position.y + self.angle) / self.swing).sin();
        self.position.x += sway * self.depth * SWAY_PER_DEPTH + self.drift;
        self.angle += self.spin;

        if self.is_below(bounds.y) {
            self.reset(bounds.x, rng);
            true
        } else {
            false
        }
    }

    /// Whether the whole sprite is below a surface of the given height.
    ///
    /// Sprites are drawn centred on [`position`](Self::position), so the top
    /// edge sits half a size above it. On an 800px surface a size-30 petal
    /// at y = 825 is already out of view and resets on its next tick; a
    /// `y > height + size` cutoff would keep it alive for several more.
    #[inline]
    pub fn is_below(&self, height: f32) -> bool {
        self.position.y - self.size * 0.5 > height
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.depth
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    #[inline]
    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    /// Where and how to draw this petal.
    pub fn placement(&self) -> Placement {
        Placement {
            center: self.position,
            size: self.size,
            rotation: self.angle.to_radians(),
        }
    }
}

/// Keep a sampled x coordinate inside `[0, width)`.
///
/// `u * width` can round up to `width` itself for `u` just below 1.
fn within_width(x: f32, width: f32) -> f32 {
    if !(width > 0.0) {
        0.0
    } else if x < width {
        x
    } else {
        f32::from_bits(width.to_bits() - 1)
    }
}
