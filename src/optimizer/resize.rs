use crate::utils::num::f64_to_u32_clamped;

/// Target size for an image of `width x height` bounded by `max_width x max_height`.
///
/// The aspect ratio is preserved and images already within bounds keep their size.
#[must_use]
pub fn target_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
        return (width, height);
    }
    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height));
    (
        f64_to_u32_clamped(f64::from(width) * scale, 1, max_width.max(1)),
        f64_to_u32_clamped(f64::from(height) * scale, 1, max_height.max(1)),
    )
}

/// Scales `width x height` to fit inside a `size x size` box, up or down.
#[must_use]
pub fn fit_within(width: u32, height: u32, size: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (size, size);
    }
    let scale = (f64::from(size) / f64::from(width)).min(f64::from(size) / f64::from(height));
    (
        f64_to_u32_clamped(f64::from(width) * scale, 1, size.max(1)),
        f64_to_u32_clamped(f64::from(height) * scale, 1, size.max(1)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_bounds_is_untouched() {
        assert_eq!(target_dimensions(800, 600, 1024, 1024), (800, 600));
        assert_eq!(target_dimensions(1024, 1024, 1024, 1024), (1024, 1024));
    }

    #[test]
    fn landscape_is_bounded_by_width() {
        assert_eq!(target_dimensions(2000, 1000, 1024, 1024), (1024, 512));
    }

    #[test]
    fn portrait_is_bounded_by_height() {
        assert_eq!(target_dimensions(1500, 3000, 1024, 1024), (512, 1024));
    }

    #[test]
    fn one_side_over_bound_still_scales() {
        assert_eq!(target_dimensions(1100, 200, 1024, 1024), (1024, 186));
    }

    #[test]
    fn thumbnails_fit_box() {
        assert_eq!(fit_within(600, 300, 150), (150, 75));
        assert_eq!(fit_within(50, 100, 150), (75, 150));
    }
}
