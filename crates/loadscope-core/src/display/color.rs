// ── Load-to-color mapping for the LED strip ──
//
// The load is projected onto a 0..=1020 hue line and split into four
// piecewise segments: red at idle, through violet and blue, to green at
// link saturation.

const SPACE_MAX: f64 = 1020.0;
const BLUE_RISES_UNTIL: u16 = 255;
const RED_FADES_UNTIL: u16 = 510;
const GREEN_RISES_UNTIL: u16 = 765;

/// Map a load value against the link bandwidth to an RGB triple.
pub fn load_color(value: f64, link_bandwidth: u64) -> (u8, u8, u8) {
    let k = (value * SPACE_MAX / link_bandwidth as f64)
        .round()
        .clamp(0.0, SPACE_MAX) as u16;
    color_for_point(k)
}

/// RGB components for a point on the hue line; input above 1020 clamps.
pub fn color_for_point(k: u16) -> (u8, u8, u8) {
    let k = k.min(SPACE_MAX as u16);
    if k <= BLUE_RISES_UNTIL {
        (255, 0, k as u8)
    } else if k <= RED_FADES_UNTIL {
        ((RED_FADES_UNTIL - k) as u8, 0, 255)
    } else if k <= GREEN_RISES_UNTIL {
        (0, (k - RED_FADES_UNTIL) as u8, 255)
    } else {
        (0, 255, (SPACE_MAX as u16 - k) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_red() {
        assert_eq!(load_color(0.0, 10_000), (255, 0, 0));
    }

    #[test]
    fn quarter_load_hits_the_violet_transition() {
        // value 2500 of 10000 -> k = 255
        assert_eq!(load_color(2500.0, 10_000), (255, 0, 255));
    }

    #[test]
    fn saturation_is_green() {
        assert_eq!(load_color(10_000.0, 10_000), (0, 255, 0));
    }

    #[test]
    fn overload_clamps_to_green() {
        assert_eq!(load_color(25_000.0, 10_000), (0, 255, 0));
        assert_eq!(load_color(-3.0, 10_000), (255, 0, 0));
    }

    #[test]
    fn segment_boundaries() {
        assert_eq!(color_for_point(255), (255, 0, 255));
        assert_eq!(color_for_point(256), (254, 0, 255));
        assert_eq!(color_for_point(510), (0, 0, 255));
        assert_eq!(color_for_point(511), (0, 1, 255));
        assert_eq!(color_for_point(765), (0, 255, 255));
        assert_eq!(color_for_point(766), (0, 255, 254));
        assert_eq!(color_for_point(1020), (0, 255, 0));
    }

    #[test]
    fn total_intensity_stays_bounded() {
        for k in 0..=1020u16 {
            let (r, g, b) = color_for_point(k);
            let total = r as u16 + g as u16 + b as u16;
            assert!((255..=510).contains(&total), "k={k} total={total}");
        }
    }
}
