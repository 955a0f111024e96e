// ============================================================================
// FLOOD FILL - 4-connected region replacement with a colour tolerance
// ============================================================================

use image::{Rgba, RgbaImage};

use crate::colour::Colour;

/// Per-channel match.  `tolerance` is the largest allowed absolute channel
/// difference; 0 means exact.  Fully transparent pixels match each other
/// regardless of their colour channels.
#[inline]
fn matches(p: [u8; 4], target: [u8; 4], tolerance: u8) -> bool {
    if p[3] == 0 && target[3] == 0 {
        return true;
    }
    Colour::from_array(p).max_channel_distance(&Colour::from_array(target)) <= tolerance
}

/// Mask (255 = filled) of the region connected to the seed.  Empty when the
/// seed is outside the image.
pub fn fill_mask(src: &RgbaImage, start_x: u32, start_y: u32, tolerance: u8) -> Vec<u8> {
    let (w, h) = src.dimensions();
    let (wu, hu) = (w as usize, h as usize);
    let mut mask = vec![0u8; wu * hu];
    if start_x >= w || start_y >= h {
        return mask;
    }

    let raw = src.as_raw();
    let pix = |idx: usize| -> [u8; 4] {
        let o = idx * 4;
        [raw[o], raw[o + 1], raw[o + 2], raw[o + 3]]
    };

    let seed = start_y as usize * wu + start_x as usize;
    let target = pix(seed);
    let mut stack: Vec<usize> = Vec::with_capacity(4096);
    mask[seed] = 255;
    stack.push(seed);

    while let Some(idx) = stack.pop() {
        let x = idx % wu;
        let y = idx / wu;
        let mut visit = |n: usize| {
            if mask[n] == 0 && matches(pix(n), target, tolerance) {
                mask[n] = 255;
                stack.push(n);
            }
        };
        if x > 0 {
            visit(idx - 1);
        }
        if x + 1 < wu {
            visit(idx + 1);
        }
        if y > 0 {
            visit(idx - wu);
        }
        if y + 1 < hu {
            visit(idx + wu);
        }
    }
    mask
}

/// Replace the region connected to `(start_x, start_y)` with `colour`.
/// Returns `None` when nothing would change (seed outside, or the region
/// already has exactly `colour`).
pub fn flood_fill(
    src: &RgbaImage,
    start_x: u32,
    start_y: u32,
    colour: Rgba<u8>,
    tolerance: u8,
) -> Option<RgbaImage> {
    if start_x >= src.width() || start_y >= src.height() {
        return None;
    }
    if tolerance == 0 && *src.get_pixel(start_x, start_y) == colour {
        return None;
    }
    let mask = fill_mask(src, start_x, start_y, tolerance);
    let mut out = src.clone();
    for (px, m) in out.pixels_mut().zip(mask.iter()) {
        if *m != 0 {
            *px = colour;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn uniform_canvas_fills_completely() {
        let img = RgbaImage::from_pixel(4, 4, WHITE);
        let out = flood_fill(&img, 0, 0, RED, 0);
        assert!(out.is_some_and(|o| o.pixels().all(|p| *p == RED)));
    }

    #[test]
    fn walls_stop_the_fill() {
        let mut img = RgbaImage::from_pixel(5, 3, WHITE);
        for y in 0..3 {
            img.put_pixel(2, y, BLACK);
        }
        let Some(out) = flood_fill(&img, 0, 1, RED, 0) else {
            panic!("fill should change the image");
        };
        assert_eq!(*out.get_pixel(1, 2), RED);
        assert_eq!(*out.get_pixel(2, 0), BLACK);
        assert_eq!(*out.get_pixel(3, 0), WHITE);
    }

    #[test]
    fn diagonal_neighbours_are_not_connected() {
        let mut img = RgbaImage::from_pixel(2, 2, BLACK);
        img.put_pixel(0, 0, WHITE);
        img.put_pixel(1, 1, WHITE);
        let mask = fill_mask(&img, 0, 0, 0);
        assert_eq!(mask, vec![255, 0, 0, 0]);
    }

    #[test]
    fn tolerance_widens_the_match() {
        let mut img = RgbaImage::from_pixel(3, 1, WHITE);
        img.put_pixel(1, 0, Rgba([250, 250, 250, 255]));
        assert_eq!(fill_mask(&img, 0, 0, 0), vec![255, 0, 0]);
        assert_eq!(fill_mask(&img, 0, 0, 5), vec![255, 255, 255]);
    }

    #[test]
    fn same_colour_or_outside_is_a_no_op() {
        let img = RgbaImage::from_pixel(2, 2, RED);
        assert!(flood_fill(&img, 0, 0, RED, 0).is_none());
        assert!(flood_fill(&img, 2, 0, WHITE, 0).is_none());
    }
}
