//! Flow a parsed document onto fixed-size pages.
//!
//! Coordinates are page space with the origin at the top-left corner and y
//! growing downwards. Every word becomes its own span; a word made of
//! several differently styled runs becomes adjacent spans with no gap.

use crate::fonts;
use crate::model::{Alignment, Block, Document, FontFace, Page, Paragraph, Rect, Run, Table, TextSpan};

/// Baseline distance below the top of a span, in font sizes.
pub(crate) const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.25;
const LINE_HEIGHT: f32 = 1.2;
/// Height of a paragraph without text.
const EMPTY_LINE_FONT_SIZE: f32 = 11.0;
const CELL_PADDING_X: f32 = 5.4;
const CELL_PADDING_Y: f32 = 2.0;
const MIN_ROW_HEIGHT: f32 = 18.0;

struct Piece<'a> {
    text: String,
    run: &'a Run,
}

struct Word<'a> {
    pieces: Vec<Piece<'a>>,
    /// Width of the whitespace in front of the word.
    gap: f32,
}

/// One laid-out line; span rects are relative to the line's top-left corner.
struct Line {
    spans: Vec<TextSpan>,
    height: f32,
}

fn face(run: &Run) -> FontFace {
    FontFace::from_style(run.bold, run.italic)
}

fn pack_color(color: Option<[u8; 3]>) -> u32 {
    let [r, g, b] = color.unwrap_or([0, 0, 0]);
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

fn piece_width(piece: &Piece) -> f32 {
    fonts::text_width(&piece.text, face(piece.run), piece.run.font_size)
}

fn word_width(word: &Word) -> f32 {
    word.pieces.iter().map(piece_width).sum()
}

fn translate(rect: Rect, dx: f32, dy: f32) -> Rect {
    Rect::new(rect.x0 + dx, rect.y0 + dy, rect.x1 + dx, rect.y1 + dy)
}

fn split_words(runs: &[Run]) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut current: Vec<Piece> = Vec::new();
    let mut gap = 0.0;
    for run in runs {
        for c in run.text.chars() {
            if c.is_whitespace() {
                if !current.is_empty() {
                    words.push(Word { pieces: std::mem::take(&mut current), gap });
                    gap = 0.0;
                }
                gap += fonts::char_width(' ', face(run), run.font_size);
                continue;
            }
            match current.last_mut() {
                Some(piece) if std::ptr::eq(piece.run, run) => piece.text.push(c),
                _ => current.push(Piece { text: c.to_string(), run }),
            }
        }
    }
    if !current.is_empty() {
        words.push(Word { pieces: current, gap });
    }
    words
}

/// Break a word wider than `width` into chunks that fit, one char minimum.
fn split_long_word<'a>(word: Word<'a>, width: f32) -> Vec<Word<'a>> {
    let mut chunks = Vec::new();
    let mut chunk: Vec<Piece> = Vec::new();
    let mut chunk_width = 0.0;
    let mut gap = word.gap;
    for piece in word.pieces {
        for c in piece.text.chars() {
            let w = fonts::char_width(c, face(piece.run), piece.run.font_size);
            if !chunk.is_empty() && chunk_width + w > width {
                chunks.push(Word { pieces: std::mem::take(&mut chunk), gap });
                gap = 0.0;
                chunk_width = 0.0;
            }
            chunk_width += w;
            match chunk.last_mut() {
                Some(p) if std::ptr::eq(p.run, piece.run) => p.text.push(c),
                _ => chunk.push(Piece { text: c.to_string(), run: piece.run }),
            }
        }
    }
    if !chunk.is_empty() {
        chunks.push(Word { pieces: chunk, gap });
    }
    chunks
}

fn finish_line(placed: Vec<(f32, &Piece)>, line_width: f32, width: f32, para: &Paragraph, line_spacing: f32) -> Line {
    let max_size = placed
        .iter()
        .map(|(_, p)| p.run.font_size)
        .fold(0.0_f32, f32::max);
    let baseline = max_size * ASCENT;
    let shift = match para.alignment {
        Alignment::Left => 0.0,
        Alignment::Center => ((width - line_width) / 2.0).max(0.0),
        Alignment::Right => (width - line_width).max(0.0),
    };
    let spans = placed
        .into_iter()
        .map(|(x, piece)| {
            let size = piece.run.font_size;
            let x0 = shift + x;
            TextSpan {
                rect: Rect::new(x0, baseline - size * ASCENT, x0 + piece_width(piece), baseline + size * DESCENT),
                text: piece.text.clone(),
                font_family: piece.run.font_name.clone(),
                face: face(piece.run),
                font_size: size,
                color: pack_color(piece.run.color),
            }
        })
        .collect();
    Line { spans, height: max_size * LINE_HEIGHT * line_spacing }
}

/// Break a paragraph into lines no wider than `width`.
fn break_lines(para: &Paragraph, width: f32, line_spacing: f32) -> Vec<Line> {
    let mut words = Vec::new();
    for word in split_words(&para.runs) {
        if word_width(&word) > width {
            words.extend(split_long_word(word, width));
        } else {
            words.push(word);
        }
    }
    if words.is_empty() {
        return vec![Line { spans: Vec::new(), height: EMPTY_LINE_FONT_SIZE * LINE_HEIGHT * line_spacing }];
    }

    let mut lines = Vec::new();
    let mut placed: Vec<(f32, &Piece)> = Vec::new();
    let mut x = 0.0;
    for word in &words {
        let w = word_width(word);
        if !placed.is_empty() && x + word.gap + w > width {
            lines.push(finish_line(std::mem::take(&mut placed), x, width, para, line_spacing));
            x = 0.0;
        }
        if !placed.is_empty() {
            x += word.gap;
        }
        for piece in &word.pieces {
            placed.push((x, piece));
            x += piece_width(piece);
        }
    }
    lines.push(finish_line(placed, x, width, para, line_spacing));
    lines
}

struct Flow<'d> {
    doc: &'d Document,
    pages: Vec<Page>,
    current: Page,
    y: f32,
}

impl<'d> Flow<'d> {
    fn new(doc: &'d Document) -> Self {
        Flow { doc, pages: Vec::new(), current: Self::blank(doc), y: doc.margin_top }
    }

    fn blank(doc: &Document) -> Page {
        Page { width: doc.page_width, height: doc.page_height, ..Page::default() }
    }

    fn bottom(&self) -> f32 {
        self.doc.page_height - self.doc.margin_bottom
    }

    fn content_width(&self) -> f32 {
        (self.doc.page_width - self.doc.margin_left - self.doc.margin_right).max(1.0)
    }

    /// Start a new page unless `height` still fits or the page is untouched.
    fn reserve(&mut self, height: f32) {
        if self.y + height > self.bottom() && self.y > self.doc.margin_top {
            let page = std::mem::replace(&mut self.current, Self::blank(self.doc));
            self.pages.push(page);
            self.y = self.doc.margin_top;
        }
    }

    fn paragraph(&mut self, para: &Paragraph) {
        let x = self.doc.margin_left + para.indent_left;
        let width = (self.content_width() - para.indent_left).max(1.0);
        self.y += para.space_before;
        for line in break_lines(para, width, self.doc.line_spacing) {
            self.reserve(line.height);
            let y = self.y;
            self.current
                .spans
                .extend(line.spans.into_iter().map(|s| TextSpan { rect: translate(s.rect, x, y), ..s }));
            self.y += line.height;
        }
        self.y += para.space_after;
    }

    fn column_widths(&self, table: &Table) -> Vec<f32> {
        let content_width = self.content_width();
        let cols = table
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.span).sum::<usize>())
            .max()
            .unwrap_or(0)
            .max(table.column_widths.len());
        if cols == 0 {
            return Vec::new();
        }
        let known: f32 = table.column_widths.iter().sum();
        if known <= 0.0 {
            return vec![content_width / cols as f32; cols];
        }
        let average = known / table.column_widths.len() as f32;
        let mut widths = table.column_widths.clone();
        widths.resize(cols, average);
        let total: f32 = widths.iter().sum();
        if total > content_width {
            widths.iter_mut().for_each(|w| *w *= content_width / total);
        }
        widths
    }

    fn table(&mut self, table: &Table) {
        let widths = self.column_widths(table);
        for row in &table.rows {
            let mut col = 0;
            let mut x = self.doc.margin_left;
            let mut cells: Vec<(Rect, Vec<TextSpan>)> = Vec::new();
            let mut row_height = MIN_ROW_HEIGHT;
            for cell in row {
                let end = (col + cell.span).min(widths.len());
                let cell_width: f32 = widths[col.min(end)..end].iter().sum();
                col = end;

                let inner = (cell_width - 2.0 * CELL_PADDING_X).max(1.0);
                let mut spans = Vec::new();
                let mut y = CELL_PADDING_Y;
                for para in &cell.paragraphs {
                    y += para.space_before;
                    for line in break_lines(para, inner, self.doc.line_spacing) {
                        let (dx, dy) = (x + CELL_PADDING_X + para.indent_left, y);
                        spans.extend(line.spans.into_iter().map(|s| TextSpan { rect: translate(s.rect, dx, dy), ..s }));
                        y += line.height;
                    }
                    y += para.space_after;
                }
                row_height = row_height.max(y + CELL_PADDING_Y);
                cells.push((Rect::new(x, 0.0, x + cell_width, 0.0), spans));
                x += cell_width;
            }

            self.reserve(row_height);
            let top = self.y;
            for (rect, spans) in cells {
                self.current.table_cells.push(Rect::new(rect.x0, top, rect.x1, top + row_height));
                self.current
                    .spans
                    .extend(spans.into_iter().map(|s| TextSpan { rect: translate(s.rect, 0.0, top), ..s }));
            }
            self.y += row_height;
        }
    }

    fn finish(mut self) -> Vec<Page> {
        self.pages.push(self.current);
        self.pages
    }
}

/// Lay out `doc`. Always yields at least one page.
pub fn layout(doc: &Document) -> Vec<Page> {
    let mut flow = Flow::new(doc);
    for block in &doc.blocks {
        match block {
            Block::Paragraph(para) => flow.paragraph(para),
            Block::Table(table) => flow.table(table),
        }
    }
    let pages = flow.finish();
    log::debug!("laid out {} page(s)", pages.len());
    pages
}
