use std::{collections::HashMap, io::Cursor};

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{
        draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut,
        draw_line_segment_mut,
    },
    rect::Rect,
};
use lazor_core::{Direction, LatticePoint, Laser};

use crate::{
    lattice::{
        LatticeMap, BEAM_GLYPH, OPEN_GLYPH, ORIGIN_GLYPH, TARGET_GLYPH, UNAVAILABLE_GLYPH,
    },
    RenderingError,
};

/// Side length, in pixels, of the square drawn for each lattice point.
pub const POINT_PIXELS: u32 = 30;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID_LINE: Rgb<u8> = Rgb([0, 0, 0]);
const ORIGIN: Rgb<u8> = Rgb([255, 0, 0]);
const ARROW: Rgb<u8> = Rgb([255, 255, 255]);
const TARGET: Rgb<u8> = Rgb([0, 128, 0]);
const BEAM: Rgb<u8> = Rgb([255, 0, 0]);
const OPEN_CELL: Rgb<u8> = Rgb([128, 128, 128]);
const UNAVAILABLE_CELL: Rgb<u8> = Rgb([64, 64, 64]);

const TARGET_OUTLINE: u32 = 3;
const BEAM_DOT_RADIUS: i32 = 2;
const ARROWHEAD_PIXELS: f32 = 6.0;

fn block_colour(glyph: char) -> Option<Rgb<u8>> {
    match glyph {
        'A' => Some(Rgb([0, 0, 255])),
        'B' => Some(Rgb([255, 165, 0])),
        'C' => Some(Rgb([255, 255, 0])),
        _ => None,
    }
}

/// Paints a lattice map as an image, one square per lattice point.
///
/// Blocks and cell centres are filled, targets outlined, beam points dotted
/// and laser origins filled with an arrow along the laser direction.
pub fn render_image(lattice: &LatticeMap, lasers: &[Laser]) -> Result<RgbImage, RenderingError> {
    let oversized = || RenderingError::Oversized {
        width: lattice.width(),
        height: lattice.height(),
    };
    let columns = u32::try_from(lattice.width()).map_err(|_| oversized())?;
    let rows = u32::try_from(lattice.height()).map_err(|_| oversized())?;
    let width = columns.checked_mul(POINT_PIXELS).ok_or_else(oversized)?;
    let height = rows.checked_mul(POINT_PIXELS).ok_or_else(oversized)?;
    if i32::try_from(width.max(height)).is_err() {
        return Err(oversized());
    }

    let directions: HashMap<LatticePoint, Direction> = lasers
        .iter()
        .rev()
        .map(|laser| (laser.origin(), laser.direction()))
        .collect();

    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    for row in 0..rows {
        for column in 0..columns {
            let point = LatticePoint::new(i64::from(column), i64::from(row));
            if let Some(glyph) = lattice.glyph(point) {
                paint_point(&mut image, column, row, glyph, directions.get(&point).copied());
            }
        }
    }
    draw_grid_lines(&mut image, columns, rows);
    Ok(image)
}

/// Encodes an image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderingError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

fn paint_point(
    image: &mut RgbImage,
    column: u32,
    row: u32,
    glyph: char,
    direction: Option<Direction>,
) {
    // Bounds were checked against i32 by the caller.
    let left = (column * POINT_PIXELS) as i32;
    let top = (row * POINT_PIXELS) as i32;
    let square = Rect::at(left, top).of_size(POINT_PIXELS, POINT_PIXELS);
    let centre = (left + POINT_PIXELS as i32 / 2, top + POINT_PIXELS as i32 / 2);

    match glyph {
        ORIGIN_GLYPH => {
            draw_filled_rect_mut(image, square, ORIGIN);
            if let Some(direction) = direction {
                draw_arrow(image, centre, direction);
            }
        }
        TARGET_GLYPH => {
            for inset in 0..TARGET_OUTLINE {
                let size = POINT_PIXELS - 2 * inset;
                let inset = inset as i32;
                draw_hollow_rect_mut(
                    image,
                    Rect::at(left + inset, top + inset).of_size(size, size),
                    TARGET,
                );
            }
        }
        BEAM_GLYPH => draw_filled_circle_mut(image, centre, BEAM_DOT_RADIUS, BEAM),
        OPEN_GLYPH => draw_filled_rect_mut(image, square, OPEN_CELL),
        UNAVAILABLE_GLYPH => draw_filled_rect_mut(image, square, UNAVAILABLE_CELL),
        other => {
            if let Some(colour) = block_colour(other) {
                draw_filled_rect_mut(image, square, colour);
            }
        }
    }
}

fn draw_arrow(image: &mut RgbImage, centre: (i32, i32), direction: Direction) {
    let (dx, dy) = (f32::from(direction.dx()), f32::from(direction.dy()));
    let start = (centre.0 as f32, centre.1 as f32);
    let reach = (POINT_PIXELS / 2) as f32;
    let tip = (start.0 + reach * dx, start.1 + reach * dy);

    let heading = dy.atan2(dx);
    let spread = std::f32::consts::FRAC_PI_6;
    let barbs = [heading + spread, heading - spread].map(|angle| {
        (
            tip.0 - ARROWHEAD_PIXELS * angle.cos(),
            tip.1 - ARROWHEAD_PIXELS * angle.sin(),
        )
    });

    // Two pixels wide.
    for offset in [0.0, 1.0] {
        let shift = |(x, y): (f32, f32)| (x + offset, y);
        draw_line_segment_mut(image, shift(start), shift(tip), ARROW);
        for barb in barbs {
            draw_line_segment_mut(image, shift(tip), shift(barb), ARROW);
        }
    }
}

fn draw_grid_lines(image: &mut RgbImage, columns: u32, rows: u32) {
    let width = image.width() as f32;
    let height = image.height() as f32;
    for column in 1..columns {
        let x = (column * POINT_PIXELS) as f32;
        draw_line_segment_mut(image, (x, 0.0), (x, height - 1.0), GRID_LINE);
    }
    for row in 1..rows {
        let y = (row * POINT_PIXELS) as f32;
        draw_line_segment_mut(image, (0.0, y), (width - 1.0, y), GRID_LINE);
    }
}
