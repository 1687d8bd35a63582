use nalgebra::Vector3;
use serde::Serialize;

pub type Vec3 = Vector3<f64>;

/// Unit vector plus the norm it was scaled by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Normalized {
    pub unit: Vec3,
    pub norm: f64,
}

impl Normalized {
    pub fn is_zero(&self) -> bool {
        self.norm == 0.0
    }
}

/// `v/|v|`, or the zero vector with norm 0 when `|v| == 0`.
pub fn normalize(v: &Vec3) -> Normalized {
    let norm = v.norm();
    if norm != 0.0 {
        Normalized { unit: v / norm, norm }
    } else {
        Normalized {
            unit: Vec3::zeros(),
            norm: 0.0,
        }
    }
}

/// Angle between `u` and `v` in degrees, `None` if either has zero norm.
pub fn angle_deg(u: &Vec3, v: &Vec3) -> Option<f64> {
    let (a, b) = (normalize(u), normalize(v));
    if a.is_zero() || b.is_zero() {
        return None;
    }
    // rounding can push the dot product just past ±1
    Some(a.unit.dot(&b.unit).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Angle of `v` with the body +Z axis.
pub fn angle_with_z_deg(v: &Vec3) -> Option<f64> {
    angle_deg(v, &Vec3::z())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_vec() -> impl Strategy<Value = Vec3> {
        (-1e3f64..1e3, -1e3f64..1e3, -1e3f64..1e3).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        let n = normalize(&Vec3::zeros());
        assert_eq!(n.unit, Vec3::zeros());
        assert_eq!(n.norm, 0.0);
        assert_eq!(angle_deg(&Vec3::zeros(), &Vec3::x()), None);
    }

    #[test]
    fn near_parallel_does_not_escape_acos_domain() {
        let u = Vec3::new(0.1, 0.2, 0.3);
        let a = angle_deg(&(u * 3.0), &u).unwrap();
        assert!(!a.is_nan());
        assert!(a.abs() < 1e-4);
    }

    #[test]
    fn z_axis_angles() {
        assert_eq!(angle_with_z_deg(&Vec3::new(0.0, 0.0, 2.0)), Some(0.0));
        assert!((angle_with_z_deg(&Vec3::x()).unwrap() - 90.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn normalized_norm_is_zero_or_one(v in any_vec()) {
            let n = normalize(&v);
            let len = n.unit.norm();
            prop_assert!(len == 0.0 || (len - 1.0).abs() < 1e-12);
        }

        #[test]
        fn angle_bounds_and_extremes(u in any_vec(), v in any_vec()) {
            prop_assume!(u.norm() > 1e-6 && v.norm() > 1e-6);
            let a = angle_deg(&u, &v).unwrap();
            prop_assert!((0.0..=180.0).contains(&a));
            prop_assert!(angle_deg(&u, &u).unwrap() < 1e-4);
            prop_assert!((angle_deg(&u, &-u).unwrap() - 180.0).abs() < 1e-4);
        }
    }
}
