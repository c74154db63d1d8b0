//! Built-in dimensions and defaults shared by the generator, the codec and the editor.

/// Standard key spacing (1U) in millimeters, written `U` in configurations.
pub const KEY_UNIT: f64 = 19.05;

/// The rounded choc-style spacing, written `u` in configurations.
pub const SMALL_UNIT: f64 = 19.0;

/// Default key cap footprint in millimeters.
pub const DEFAULT_KEY_WIDTH: f64 = 18.0;
pub const DEFAULT_KEY_HEIGHT: f64 = 18.0;

pub const DEFAULT_KEY_COLOR: &str = "#cccccc";

/// Engine version written to `meta.engine` for new documents.
pub const DEFAULT_ENGINE_VERSION: &str = "4.1.0";

/// Distance tolerance used when clustering detached keys into columns and rows.
pub const POSITION_TOLERANCE: f64 = 0.1;

/// Angle tolerance (degrees) used when inferring splay.
pub const ANGLE_TOLERANCE: f64 = 0.5;

/// Normalizes an angle into `(-180, 180]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % 360.0;
    if a <= -180.0 {
        a += 360.0;
    } else if a > 180.0 {
        a -= 360.0;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::normalize_angle;

    #[test]
    fn normalize_wraps_into_half_open_range() {
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_eq!(normalize_angle(270.0), -90.0);
        assert_eq!(normalize_angle(-450.0), -90.0);
        assert_eq!(normalize_angle(45.0), 45.0);
    }
}
