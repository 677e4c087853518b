//! Listener-relative coordinates.
//!
//! `y` is up. Elevation is measured from straight up (0) through ear level
//! (π/2) to straight down (π). Azimuth 0 points straight ahead along +x and
//! grows toward the listener's left (+z), so azimuths θ and 2π−θ are
//! left/right mirror images.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::ops::{Add, AddAssign, Sub};

/// Smallest representable source distance.
pub const MIN_RADIUS: f32 = 1.0e-3;

/// Cartesian position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(xyz: [f32; 3]) -> Self {
        Self::new(xyz[0], xyz[1], xyz[2])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    #[inline]
    pub fn lerp(self, other: Vec3, t: f32) -> Self {
        self + (other - self).scale(t)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Spherical position. Construct through [`Spherical::new`] to keep the
/// invariants: `radius >= MIN_RADIUS`, `azimuth` in `[0, 2π)`, `elevation`
/// in `[0, π]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    radius: f32,
    azimuth: f32,
    elevation: f32,
}

impl Default for Spherical {
    /// One unit straight ahead at ear level.
    fn default() -> Self {
        Self {
            radius: 1.0,
            azimuth: 0.0,
            elevation: FRAC_PI_2,
        }
    }
}

impl Spherical {
    pub fn new(radius: f32, azimuth: f32, elevation: f32) -> Self {
        let defaults = Self::default();
        let radius = if radius.is_finite() {
            radius.max(MIN_RADIUS)
        } else {
            defaults.radius
        };
        let azimuth = if azimuth.is_finite() {
            wrap_azimuth(azimuth)
        } else {
            defaults.azimuth
        };
        let elevation = if elevation.is_finite() {
            elevation.clamp(0.0, PI)
        } else {
            defaults.elevation
        };
        Self {
            radius,
            azimuth,
            elevation,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    #[inline]
    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn to_cartesian(&self) -> Vec3 {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        Vec3::new(
            self.radius * sin_el * cos_az,
            self.radius * cos_el,
            self.radius * sin_el * sin_az,
        )
    }

    /// Converts a cartesian point. Points closer than [`MIN_RADIUS`] keep
    /// their direction if it is defined and are pushed out to `MIN_RADIUS`.
    pub fn from_cartesian(point: Vec3) -> Self {
        if !point.is_finite() {
            return Self::default();
        }
        let radius = point.length();
        if radius <= f32::EPSILON {
            return Self::new(MIN_RADIUS, 0.0, FRAC_PI_2);
        }
        let elevation = (point.y / radius).clamp(-1.0, 1.0).acos();
        let azimuth = point.z.atan2(point.x);
        Self::new(radius, azimuth, elevation)
    }

    /// Applies a relative spherical move: radius scales, angles add.
    pub fn offset(&self, radius_factor: f32, d_azimuth: f32, d_elevation: f32) -> Self {
        Self::new(
            self.radius * radius_factor,
            self.azimuth + d_azimuth,
            self.elevation + d_elevation,
        )
    }
}

#[inline]
pub fn wrap_azimuth(azimuth: f32) -> f32 {
    let wrapped = azimuth.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
