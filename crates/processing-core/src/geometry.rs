//! Angle and distance primitives over landmarks.
//!
//! Both functions are pure. `angle` is computed from the dot product of the
//! two arms at the vertex, so swapping the outer points yields the exact
//! same bits.

use repsense_common::config::GeometryProjection;
use repsense_exercise_model::landmark::Landmark;

/// Minimal vector type for landmark arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Landmark position under a projection. `Planar` drops depth.
    pub fn from_landmark(landmark: &Landmark, projection: GeometryProjection) -> Self {
        let z = match projection {
            GeometryProjection::Planar => 0.0,
            GeometryProjection::Spatial => landmark.z,
        };
        Self::new(landmark.x, landmark.y, z)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Why an angle could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("an arm of the angle has zero length")]
    ZeroLengthVector,

    #[error("landmark coordinates are not finite")]
    NonFiniteCoordinate,
}

/// Angle at vertex `b` between `b→a` and `b→c`, in degrees `[0, 180]`.
pub fn angle(
    a: &Landmark,
    b: &Landmark,
    c: &Landmark,
    projection: GeometryProjection,
) -> Result<f64, GeometryError> {
    let a = Vec3::from_landmark(a, projection);
    let b = Vec3::from_landmark(b, projection);
    let c = Vec3::from_landmark(c, projection);
    angle_between(a, b, c)
}

/// [`angle`] over raw vectors.
pub fn angle_between(a: Vec3, b: Vec3, c: Vec3) -> Result<f64, GeometryError> {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(GeometryError::NonFiniteCoordinate);
    }

    let ba = a.sub(b);
    let bc = c.sub(b);
    let denom = ba.length() * bc.length();
    if denom == 0.0 {
        return Err(GeometryError::ZeroLengthVector);
    }
    if !denom.is_finite() {
        return Err(GeometryError::NonFiniteCoordinate);
    }

    // Rounding can push the ratio just past ±1 for (anti)parallel arms.
    let cos = (ba.dot(bc) / denom).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// Euclidean distance in normalized frame units.
pub fn distance(a: &Landmark, b: &Landmark, projection: GeometryProjection) -> f64 {
    Vec3::from_landmark(a, projection)
        .sub(Vec3::from_landmark(b, projection))
        .length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PLANAR: GeometryProjection = GeometryProjection::Planar;

    fn lm(x: f64, y: f64) -> Landmark {
        Landmark::new(x, y, 0.0)
    }

    #[test]
    fn test_right_angle() {
        let deg = angle(&lm(0.5, 0.2), &lm(0.5, 0.5), &lm(0.8, 0.5), PLANAR).unwrap();
        assert!((deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_and_folded() {
        let straight = angle(&lm(0.1, 0.5), &lm(0.5, 0.5), &lm(0.9, 0.5), PLANAR).unwrap();
        assert!((straight - 180.0).abs() < 1e-9);

        let folded = angle(&lm(0.9, 0.5), &lm(0.5, 0.5), &lm(0.7, 0.5), PLANAR).unwrap();
        assert!(folded.abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_arm_is_degenerate() {
        let p = lm(0.5, 0.5);
        assert_eq!(
            angle(&p, &p, &lm(0.6, 0.6), PLANAR),
            Err(GeometryError::ZeroLengthVector)
        );
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let result = angle(&lm(f64::NAN, 0.1), &lm(0.5, 0.5), &lm(0.6, 0.6), PLANAR);
        assert_eq!(result, Err(GeometryError::NonFiniteCoordinate));
    }

    #[test]
    fn test_planar_ignores_depth() {
        let a = Landmark::new(0.5, 0.2, 0.9);
        let b = Landmark::new(0.5, 0.5, 0.0);
        let c = Landmark::new(0.8, 0.5, -0.4);
        let planar = angle(&a, &b, &c, PLANAR).unwrap();
        let spatial = angle(&a, &b, &c, GeometryProjection::Spatial).unwrap();
        assert!((planar - 90.0).abs() < 1e-9);
        assert!((spatial - planar).abs() > 1.0);
    }

    #[test]
    fn test_distance() {
        let d = distance(&lm(0.0, 0.0), &lm(0.3, 0.4), PLANAR);
        assert!((d - 0.5).abs() < 1e-12);
        let spatial = distance(
            &Landmark::new(0.0, 0.0, 0.0),
            &Landmark::new(0.0, 0.0, 0.2),
            GeometryProjection::Spatial,
        );
        assert!((spatial - 0.2).abs() < 1e-12);
    }

    fn coord() -> impl Strategy<Value = f64> {
        -2.0f64..2.0
    }

    fn landmark() -> impl Strategy<Value = Landmark> {
        (coord(), coord(), coord()).prop_map(|(x, y, z)| Landmark::new(x, y, z))
    }

    fn projection() -> impl Strategy<Value = GeometryProjection> {
        prop_oneof![
            Just(GeometryProjection::Planar),
            Just(GeometryProjection::Spatial)
        ]
    }

    proptest! {
        #[test]
        fn prop_angle_symmetric_and_bounded(a in landmark(), b in landmark(), c in landmark(), p in projection()) {
            let forward = angle(&a, &b, &c, p);
            let backward = angle(&c, &b, &a, p);
            match (forward, backward) {
                (Ok(f), Ok(r)) => {
                    prop_assert_eq!(f.to_bits(), r.to_bits());
                    prop_assert!((0.0..=180.0).contains(&f));
                }
                (Err(f), Err(r)) => prop_assert_eq!(f, r),
                (f, r) => prop_assert!(false, "asymmetric result: {:?} vs {:?}", f, r),
            }
        }

        #[test]
        fn prop_distance_symmetric(a in landmark(), b in landmark(), p in projection()) {
            let ab = distance(&a, &b, p);
            prop_assert_eq!(ab.to_bits(), distance(&b, &a, p).to_bits());
            prop_assert!(ab >= 0.0);
            prop_assert_eq!(distance(&a, &a, p), 0.0);
        }
    }
}
