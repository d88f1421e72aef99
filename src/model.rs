/// Axis-aligned rectangle in page space: origin at the top-left corner,
/// y grows downwards (points).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    pub fn area(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.width() * self.height() }
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        (!r.is_empty()).then_some(r)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    pub fn expand(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x0 - dx, self.y0 - dy, self.x1 + dx, self.y1 + dy)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    /// Same size, top-left corner kept, width/height replaced.
    pub fn with_size(&self, width: f32, height: f32) -> Rect {
        Rect::new(self.x0, self.y0, self.x0 + width, self.y0 + height)
    }
}

/// Standard-14 face a span is set in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FontFace {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontFace {
    pub fn from_style(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => FontFace::BoldItalic,
            (true, false) => FontFace::Bold,
            (false, true) => FontFace::Italic,
            (false, false) => FontFace::Regular,
        }
    }
}

/// One text-extraction span: literal text plus its bounding box and font.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSpan {
    pub rect: Rect,
    pub text: String,
    pub font_family: String,
    pub face: FontFace,
    pub font_size: f32,
    /// 0xRRGGBB
    pub color: u32,
}

/// A laid-out page as the extraction and table collaborators see it.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub spans: Vec<TextSpan>,
    pub table_cells: Vec<Rect>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

pub struct Document {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub line_spacing: f32, // auto line spacing factor (e.g. 278/240)
    pub blocks: Vec<Block>,
}

pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

pub struct Paragraph {
    pub runs: Vec<Run>,
    pub space_before: f32,
    pub space_after: f32,
    pub alignment: Alignment,
    pub indent_left: f32,
}

pub struct Run {
    pub text: String,
    pub font_size: f32,
    pub font_name: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<[u8; 3]>, // None = automatic (black)
}

pub struct Table {
    pub column_widths: Vec<f32>, // points, may be empty
    pub rows: Vec<Vec<TableCell>>,
}

pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
    pub span: usize, // w:gridSpan
}
