//! Whole-image rotation applied after tile assembly.
//!
//! Quarter turns are exact pixel remaps. Any other angle is resolved by
//! inverse-mapped bilinear sampling into an expanded bounding box, with
//! transparent fill for the exposed corners. Angles are counter-clockwise.

use crate::canvas::Canvas;

/// Rotates `canvas` counter-clockwise by `degrees`.
///
/// A rotation that normalizes to 0 returns the canvas unchanged, without
/// copying.
pub fn rotate(canvas: Canvas, degrees: f64) -> Canvas {
    let norm = degrees.rem_euclid(360.0);
    if norm == 0.0 {
        return canvas;
    }
    match norm {
        90.0 => rotate_quarter(&canvas, Quarter::Ccw90),
        180.0 => rotate_quarter(&canvas, Quarter::Half),
        270.0 => rotate_quarter(&canvas, Quarter::Cw90),
        _ => rotate_arbitrary(&canvas, norm),
    }
}

#[derive(Clone, Copy)]
enum Quarter {
    Ccw90,
    Half,
    Cw90,
}

fn rotate_quarter(src: &Canvas, quarter: Quarter) -> Canvas {
    let (w, h) = (src.width, src.height);
    let mut out = match quarter {
        Quarter::Half => Canvas::new(w, h),
        Quarter::Ccw90 | Quarter::Cw90 => Canvas::new(h, w),
    };

    for y in 0..h {
        for x in 0..w {
            let px = src.pixel(x, y);
            match quarter {
                Quarter::Ccw90 => out.put_pixel(y, w - 1 - x, px),
                Quarter::Half => out.put_pixel(w - 1 - x, h - 1 - y, px),
                Quarter::Cw90 => out.put_pixel(h - 1 - y, x, px),
            }
        }
    }
    out
}

fn rotate_arbitrary(src: &Canvas, degrees: f64) -> Canvas {
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();

    let w = f64::from(src.width);
    let h = f64::from(src.height);
    let out_w = ((w * cos.abs() + h * sin.abs()).ceil() as u32).max(1);
    let out_h = ((w * sin.abs() + h * cos.abs()).ceil() as u32).max(1);
    let mut out = Canvas::new(out_w, out_h);

    let src_cx = w / 2.0;
    let src_cy = h / 2.0;
    let out_cx = f64::from(out_w) / 2.0;
    let out_cy = f64::from(out_h) / 2.0;

    for dy in 0..out_h {
        for dx in 0..out_w {
            let rx = f64::from(dx) + 0.5 - out_cx;
            let ry = f64::from(dy) + 0.5 - out_cy;
            let sx = rx * cos - ry * sin + src_cx - 0.5;
            let sy = rx * sin + ry * cos + src_cy - 0.5;
            out.put_pixel(dx, dy, sample_bilinear(src, sx, sy));
        }
    }
    out
}

fn sample_bilinear(src: &Canvas, x: f64, y: f64) -> [u8; 4] {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let taps = [
        (0i64, 0i64, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ];

    let mut acc = [0.0f64; 4];
    for (ox, oy, weight) in taps {
        let px = fetch_or_transparent(src, x0 as i64 + ox, y0 as i64 + oy);
        for (a, c) in acc.iter_mut().zip(px) {
            *a += f64::from(c) * weight;
        }
    }
    acc.map(|c| c.round().clamp(0.0, 255.0) as u8)
}

fn fetch_or_transparent(src: &Canvas, x: i64, y: i64) -> [u8; 4] {
    if x < 0 || y < 0 || x >= i64::from(src.width) || y >= i64::from(src.height) {
        return [0, 0, 0, 0];
    }
    src.pixel(x as u32, y as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_one(a: [u8; 4], b: [u8; 4]) -> Canvas {
        let mut c = Canvas::new(2, 1);
        c.put_pixel(0, 0, a);
        c.put_pixel(1, 0, b);
        c
    }

    #[test]
    fn zero_degrees_is_identity() {
        let src = two_by_one([1, 2, 3, 4], [5, 6, 7, 8]);
        let before = src.data.clone();
        let out = rotate(src, 0.0);
        assert_eq!(out.data, before);

        let out = rotate(out, 360.0);
        assert_eq!(out.data, before);
    }

    #[test]
    fn ccw_90_moves_right_edge_to_top() {
        let a = [10, 0, 0, 255];
        let b = [0, 10, 0, 255];
        let out = rotate(two_by_one(a, b), 90.0);
        assert_eq!((out.width, out.height), (1, 2));
        assert_eq!(out.pixel(0, 0), b);
        assert_eq!(out.pixel(0, 1), a);
    }

    #[test]
    fn half_turn_reverses_both_axes() {
        let a = [10, 0, 0, 255];
        let b = [0, 10, 0, 255];
        let out = rotate(two_by_one(a, b), 180.0);
        assert_eq!((out.width, out.height), (2, 1));
        assert_eq!(out.pixel(0, 0), b);
        assert_eq!(out.pixel(1, 0), a);
    }

    #[test]
    fn cw_90_is_ccw_270() {
        let a = [10, 0, 0, 255];
        let b = [0, 10, 0, 255];
        let out = rotate(two_by_one(a, b), 270.0);
        assert_eq!((out.width, out.height), (1, 2));
        assert_eq!(out.pixel(0, 0), a);
        assert_eq!(out.pixel(0, 1), b);
    }

    #[test]
    fn four_quarter_turns_round_trip() {
        let src = two_by_one([9, 8, 7, 255], [1, 2, 3, 255]);
        let original = src.data.clone();
        let mut out = src;
        for _ in 0..4 {
            out = rotate(out, 90.0);
        }
        assert_eq!(out.data, original);
    }

    #[test]
    fn negative_angles_normalize() {
        let a = [10, 0, 0, 255];
        let b = [0, 10, 0, 255];
        let ccw = rotate(two_by_one(a, b), 90.0);
        let neg = rotate(two_by_one(a, b), -270.0);
        assert_eq!(ccw.data, neg.data);
    }

    #[test]
    fn diagonal_rotation_expands_bounds_with_transparent_corners() {
        let mut src = Canvas::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                src.put_pixel(x, y, [200, 100, 50, 255]);
            }
        }

        let out = rotate(src, 45.0);
        assert_eq!((out.width, out.height), (6, 6));
        // Center still shows the source color; exposed corners are
        // transparent.
        assert_eq!(out.pixel(3, 3), [200, 100, 50, 255]);
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(5, 5)[3], 0);
    }
}
