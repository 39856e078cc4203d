//! Rotation-representation algebra
//!
//! Stateless conversions between rotation matrix, ZYX Euler angles
//! (roll-pitch-yaw, R = Rz(roll)·Ry(pitch)·Rx(yaw)), quaternion [w, x, y, z]
//! and axis-angle, plus the Euler-rate <-> angular-velocity mappings and the
//! damped pseudo-inverse used by the IK solver.
//!
//! All functions are pure. Degenerate configurations (gimbal lock,
//! pitch = ±π/2 in the rate map) surface as [`KinematicsError::SingularMatrix`]
//! instead of propagating NaN.

use nalgebra::{DMatrix, Matrix3, Vector3};

use crate::error::KinematicsError;
use crate::types::{Jacobian, Quat, RotationMatrix, Rpy};

/// Below this, cos(pitch) is treated as zero (gimbal lock).
const GIMBAL_EPS: f64 = 1e-9;

/// Band around zero in which a quaternion component square root is
/// indeterminate and forced to 0 to avoid sign oscillation.
const QUAT_EPS: f64 = 1e-6;

/// Below this, 2·sin(angle) cannot be used as an axis divisor.
const AXIS_EPS: f64 = 1e-12;

/// Default damping term for [`damped_pseudo_inverse`].
pub const DEFAULT_DAMPING: f64 = 1e-7;

/// Build a rotation matrix from ZYX Euler angles: Rz(roll)·Ry(pitch)·Rx(yaw).
pub fn rpy_to_rotation(rpy: &Rpy) -> RotationMatrix {
    let (sr, cr) = rpy[0].sin_cos();
    let (sp, cp) = rpy[1].sin_cos();
    let (sy, cy) = rpy[2].sin_cos();

    #[rustfmt::skip]
    let rz = Matrix3::new(
         cr, -sr, 0.0,
         sr,  cr, 0.0,
        0.0, 0.0, 1.0,
    );
    #[rustfmt::skip]
    let ry = Matrix3::new(
         cp, 0.0,  sp,
        0.0, 1.0, 0.0,
        -sp, 0.0,  cp,
    );
    #[rustfmt::skip]
    let rx = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0,  cy, -sy,
        0.0,  sy,  cy,
    );

    rz * ry * rx
}

/// Extract ZYX Euler angles from a rotation matrix.
///
/// Errors with `SingularMatrix` when cos(pitch) ≈ 0 (gimbal lock), where
/// roll and yaw are no longer separable.
pub fn rotation_to_rpy(r: &RotationMatrix) -> Result<Rpy, KinematicsError> {
    let pitch = (-r[(2, 0)]).atan2((r[(2, 1)].powi(2) + r[(2, 2)].powi(2)).sqrt());
    let cp = pitch.cos();
    if cp.abs() < GIMBAL_EPS {
        return Err(KinematicsError::SingularMatrix {
            context: "euler extraction at gimbal lock",
        });
    }
    let roll = (r[(1, 0)] / cp).atan2(r[(0, 0)] / cp);
    let yaw = (r[(2, 1)] / cp).atan2(r[(2, 2)] / cp);
    Ok(Rpy::new(roll, pitch, yaw))
}

/// Euler extraction with per-axis unwrapping against the previous sample.
///
/// Keeps each angle within π of `previous`, so a sequence of rotations
/// sweeping through ±π produces a continuous angle trace suitable for
/// numerical differentiation.
pub fn rotation_to_rpy_unwrapped(
    r: &RotationMatrix,
    previous: &Rpy,
) -> Result<Rpy, KinematicsError> {
    let mut rpy = rotation_to_rpy(r)?;
    for i in 0..3 {
        if rpy[i] <= previous[i] - std::f64::consts::PI {
            rpy[i] += 2.0 * std::f64::consts::PI;
        } else if rpy[i] >= previous[i] + std::f64::consts::PI {
            rpy[i] -= 2.0 * std::f64::consts::PI;
        }
    }
    Ok(rpy)
}

/// Extract the axis-angle representation of a rotation matrix.
///
/// Returns `(angle, axis)`. When the rotation is degenerate (angle ≈ 0, or
/// angle ≈ π where the skew-symmetric part vanishes) the axis is the zero
/// vector; this is a defined fallback, not an error.
pub fn rotation_to_axis_angle(r: &RotationMatrix) -> (f64, Vector3<f64>) {
    let sx = r[(2, 1)] - r[(1, 2)];
    let sy = r[(0, 2)] - r[(2, 0)];
    let sz = r[(1, 0)] - r[(0, 1)];
    let skew_norm = (sx * sx + sy * sy + sz * sz).sqrt();
    let angle = (0.5 * skew_norm).atan2(0.5 * (r.trace() - 1.0));

    let divisor = 2.0 * angle.sin();
    if divisor.abs() < AXIS_EPS {
        return (angle, Vector3::zeros());
    }
    (angle, Vector3::new(sx, sy, sz) / divisor)
}

/// Rodrigues' formula: rotation matrix from a unit axis and an angle.
pub fn axis_angle_to_rotation(angle: f64, axis: &Vector3<f64>) -> RotationMatrix {
    let k = skew(axis);
    Matrix3::identity() + k * angle.sin() + k * k * (1.0 - angle.cos())
}

/// Convert a rotation matrix to a quaternion [w, x, y, z].
///
/// Each vector component comes from a sign-selected square root; components
/// whose diagonal expression falls inside a 1e-6 band of zero are forced to
/// 0 so the sign selection cannot oscillate near indeterminate
/// configurations.
pub fn rotation_to_quaternion(r: &RotationMatrix) -> Quat {
    let w = 0.5 * (r.trace() + 1.0).max(0.0).sqrt();

    let dx = r[(0, 0)] - r[(1, 1)] - r[(2, 2)] + 1.0;
    let dy = r[(1, 1)] - r[(2, 2)] - r[(0, 0)] + 1.0;
    let dz = r[(2, 2)] - r[(0, 0)] - r[(1, 1)] + 1.0;

    let x = if dx.abs() < QUAT_EPS {
        0.0
    } else {
        0.5 * (r[(2, 1)] - r[(1, 2)]).signum() * dx.max(0.0).sqrt()
    };
    let y = if dy.abs() < QUAT_EPS {
        0.0
    } else {
        0.5 * (r[(0, 2)] - r[(2, 0)]).signum() * dy.max(0.0).sqrt()
    };
    let z = if dz.abs() < QUAT_EPS {
        0.0
    } else {
        0.5 * (r[(1, 0)] - r[(0, 1)]).signum() * dz.max(0.0).sqrt()
    };

    Quat::new(w, x, y, z)
}

/// Convert a quaternion [w, x, y, z] to a rotation matrix.
pub fn quaternion_to_rotation(q: &Quat) -> RotationMatrix {
    let (w, x, y, z) = (q[0], q[1], q[2], q[3]);
    #[rustfmt::skip]
    let r = Matrix3::new(
        1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - w * z),       2.0 * (x * z + w * y),
        2.0 * (x * y + w * z),       1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - w * x),
        2.0 * (x * z - w * y),       2.0 * (y * z + w * x),       1.0 - 2.0 * (x * x + y * y),
    );
    r
}

/// Small-signal quaternion error Qe = Qdes · Qmeas*.
///
/// The vector part is directly usable as a control or solver error term;
/// the scalar part goes to 0 when the two quaternions coincide.
pub fn quaternion_error(q_des: &Quat, q_meas: &Quat) -> Quat {
    let vd = Vector3::new(q_des[1], q_des[2], q_des[3]);
    let vm = Vector3::new(q_meas[1], q_meas[2], q_meas[3]);

    let we = q_des[0] * q_meas[0] + vd.dot(&vm) - 1.0;
    let e = -q_des[0] * vm + q_meas[0] * vd - vd.cross(&vm);

    Quat::new(we, e[0], e[1], e[2])
}

/// World-frame orientation error between a desired and a measured rotation,
/// as an axis scaled by angle.
pub fn axis_angle_error(r_des: &RotationMatrix, r_meas: &RotationMatrix) -> Vector3<f64> {
    let r_e = r_meas.transpose() * r_des;
    let (angle, axis) = rotation_to_axis_angle(&r_e);
    r_meas * (axis * angle)
}

/// Mapping matrix E(rpy) from ZYX Euler-angle rates to world-frame angular
/// velocity. Singular at pitch = ±π/2.
fn euler_rate_map(rpy: &Rpy) -> Matrix3<f64> {
    let (sr, cr) = rpy[0].sin_cos();
    let (sp, cp) = rpy[1].sin_cos();
    #[rustfmt::skip]
    let e = Matrix3::new(
        0.0, -sr, cr * cp,
        0.0,  cr, sr * cp,
        1.0, 0.0, -sp,
    );
    e
}

/// Angular velocity from Euler angles and their rates: ω = E(rpy)·drpy.
pub fn rpy_rates_to_angular_velocity(rpy: &Rpy, drpy: &Rpy) -> Vector3<f64> {
    euler_rate_map(rpy) * drpy
}

/// Euler-angle rates from angular velocity: drpy = E(rpy)⁻¹·ω.
///
/// Errors with `SingularMatrix` at pitch = ±π/2, where E loses rank.
pub fn angular_velocity_to_rpy_rates(
    w: &Vector3<f64>,
    rpy: &Rpy,
) -> Result<Rpy, KinematicsError> {
    if rpy[1].cos().abs() < GIMBAL_EPS {
        return Err(KinematicsError::SingularMatrix {
            context: "euler rate map at pitch = ±π/2",
        });
    }
    let inv = euler_rate_map(rpy)
        .try_inverse()
        .ok_or(KinematicsError::SingularMatrix {
            context: "euler rate map",
        })?;
    Ok(inv * w)
}

/// Angular acceleration from Euler angles, rates and accelerations:
/// ω̇ = Ė(rpy, drpy)·drpy + E(rpy)·ddrpy.
pub fn rpy_to_angular_acceleration(rpy: &Rpy, drpy: &Rpy, ddrpy: &Rpy) -> Vector3<f64> {
    let (sr, cr) = rpy[0].sin_cos();
    let (sp, cp) = rpy[1].sin_cos();
    let e0 = euler_rate_map(rpy);
    #[rustfmt::skip]
    let e1 = Matrix3::new(
        0.0, -cr * drpy[0], -sr * drpy[0] * cp - cr * sp * drpy[1],
        0.0, -sr * drpy[0],  cr * drpy[0] * cp - sr * sp * drpy[1],
        0.0,  0.0,          -cp * drpy[1],
    );
    e1 * drpy + e0 * ddrpy
}

/// Damped pseudo-inverse M⁺ = Mᵀ·(M·Mᵀ + λI)⁻¹.
///
/// For λ > 0 the result is finite for any M, including rank-deficient
/// Jacobians; λ trades bias for conditioning.
pub fn damped_pseudo_inverse(m: &Jacobian, lambda: f64) -> Result<Jacobian, KinematicsError> {
    let ntask = m.nrows();
    let normal = m * m.transpose() + DMatrix::identity(ntask, ntask) * lambda;
    let inv = normal
        .try_inverse()
        .ok_or(KinematicsError::SingularMatrix {
            context: "damped pseudo-inverse",
        })?;
    Ok(m.transpose() * inv)
}

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    #[rustfmt::skip]
    let m = Matrix3::new(
        0.0, -v[2], v[1],
        v[2], 0.0, -v[0],
        -v[1], v[0], 0.0,
    );
    m
}
