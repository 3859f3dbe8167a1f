use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw a circle outline with the midpoint algorithm
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }

    let (mut x, mut y) = (radius, 0);
    let mut err = 1 - radius;

    while x >= y {
        for (dx, dy) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
            canvas.set_pixel_signed(cx + dx, cy + dy);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Draw a filled circle
pub fn draw_disc(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Fill one dot column from `top` down to `bottom` inclusive
pub fn fill_column(canvas: &mut BrailleCanvas, x: i32, top: i32, bottom: i32) {
    let (top, bottom) = if top <= bottom { (top, bottom) } else { (bottom, top) };
    for y in top..=bottom {
        canvas.set_pixel_signed(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dots(canvas: &BrailleCanvas) -> usize {
        canvas.cells().map(|(_, _, ch)| (ch as u32 - 0x2800).count_ones() as usize).sum()
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.row_to_string(0), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(dots(&canvas), 8);
    }

    #[test]
    fn test_ring_is_hollow() {
        let mut canvas = BrailleCanvas::new(10, 5);
        draw_ring(&mut canvas, 8, 8, 5);
        assert_eq!(canvas.char_at(4, 2), crate::braille::BLANK);
        // Top of the ring
        assert_ne!(canvas.char_at(4, 0), crate::braille::BLANK);
    }

    #[test]
    fn test_disc_covers_center() {
        let mut canvas = BrailleCanvas::new(10, 5);
        draw_disc(&mut canvas, 8, 8, 5);
        assert_ne!(canvas.char_at(4, 2), crate::braille::BLANK);
        assert!(dots(&canvas) > 60);
    }

    #[test]
    fn test_zero_radius_ring_is_a_dot() {
        let mut canvas = BrailleCanvas::new(2, 1);
        draw_ring(&mut canvas, 1, 1, 0);
        assert_eq!(dots(&canvas), 1);
    }

    #[test]
    fn test_fill_column_any_order() {
        let mut canvas = BrailleCanvas::new(1, 1);
        fill_column(&mut canvas, 0, 3, 0);
        assert_eq!(canvas.row_to_string(0), "⡇");
    }
}
