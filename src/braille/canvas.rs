/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell holds a 2x4 dot grid (8 dots).
/// Unicode Braille patterns: U+2800 to U+28FF
#[derive(Clone, PartialEq, Eq)]
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>, // Row-major bit patterns, one per char
}

/// Empty Braille pattern, skipped when compositing layers
pub const BLANK: char = '\u{2800}';

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective dot resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Width in dots
    pub fn dot_width(&self) -> usize {
        self.width * 2
    }

    /// Height in dots
    pub fn dot_height(&self) -> usize {
        self.height * 4
    }

    /// Erase every dot, keeping dimensions
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Set a dot at the given coordinates.
    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        const BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];
        self.cells[cy * self.width + cx] |= BITS[x % 2][y % 4];
    }

    /// Set a dot using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Whether any dot is set
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&b| b == 0)
    }

    /// Character at a cell position
    pub fn char_at(&self, col: usize, row: usize) -> char {
        if col >= self.width || row >= self.height {
            return BLANK;
        }
        glyph(self.cells[row * self.width + col])
    }

    /// Non-blank cells as (col, row, glyph), row-major
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(idx, &bits)| {
            (bits != 0).then(|| (idx % self.width, idx / self.width, glyph(bits)))
        })
    }

    /// A row rendered as a string of Braille characters
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| glyph(b))
            .collect()
    }

    /// All rows as strings (for tests and debugging)
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(|i| self.row_to_string(i))
    }
}

#[inline(always)]
fn glyph(bits: u8) -> char {
    char::from_u32(0x2800 + bits as u32).unwrap_or(' ')
}
