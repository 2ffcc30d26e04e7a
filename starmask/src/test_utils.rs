//! Synthetic images shared by unit tests.

use common::Buffer2;

/// Zero image with a flat disk of `value` centered at column `cx`, row `cy`.
///
/// A pixel belongs to the disk when its squared distance from the center is
/// at most `radius^2`.
pub fn disk_image(
    width: usize,
    height: usize,
    cx: usize,
    cy: usize,
    radius: f32,
    value: f32,
) -> Buffer2<f32> {
    let mut image = Buffer2::new_filled(width, height, 0.0f32);
    add_disk(&mut image, cx, cy, radius, value);
    image
}

/// Overwrite the disk of `radius` around (`cx`, `cy`) with `value`.
pub fn add_disk(image: &mut Buffer2<f32>, cx: usize, cy: usize, radius: f32, value: f32) {
    let r2 = radius * radius;
    for y in 0..image.height() {
        for x in 0..image.width() {
            let dx = x as f32 - cx as f32;
            let dy = y as f32 - cy as f32;
            if dx * dx + dy * dy <= r2 {
                image[(x, y)] = value;
            }
        }
    }
}
