//! Line breaking for the PDF body using approximate glyph widths.

use std::ops::Range;

pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Approximate Helvetica advance width of `c`, in ems
fn char_width_em(c: char) -> f32 {
    match c {
        ' ' | 'i' | 'j' | 'l' | '.' | ',' | ';' | ':' | '\'' | '!' | '|' | 'í' | 'ì' => 0.278,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '/' | '"' => 0.333,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.833,
        '0'..='9' => 0.556,
        c if c.is_uppercase() => 0.667,
        _ => 0.556,
    }
}

/// Width of `text` set at `font_size_pt`, in millimetres.
///
/// `scale` widens the estimate for fonts broader than Helvetica.
pub fn text_width_mm(text: &str, font_size_pt: f32, scale: f32) -> f32 {
    text.chars().map(char_width_em).sum::<f32>() * font_size_pt * MM_PER_PT * scale
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub words: Vec<String>,
    /// Last line of a paragraph; set flush left instead of justified
    pub ends_paragraph: bool,
}

impl Line {
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub font_size_pt: f32,
    pub width_scale: f32,
    pub max_width_mm: f32,
}

impl Metrics {
    pub fn width(&self, text: &str) -> f32 {
        text_width_mm(text, self.font_size_pt, self.width_scale)
    }
}

/// Breaks `text` into lines no wider than `metrics.max_width_mm`.
///
/// Every `\n` starts a new paragraph, so an empty input line becomes an
/// empty output line. Words wider than a full line are split.
pub fn wrap_paragraphs(text: &str, metrics: &Metrics) -> Vec<Line> {
    let space = metrics.width(" ");
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut words: Vec<String> = Vec::new();
        let mut width = 0.0;

        for word in paragraph.split_whitespace().flat_map(|w| split_word(w, metrics)) {
            let word_width = metrics.width(&word);
            let needed = if words.is_empty() {
                word_width
            } else {
                width + space + word_width
            };

            if needed > metrics.max_width_mm && !words.is_empty() {
                lines.push(Line {
                    words: std::mem::take(&mut words),
                    ends_paragraph: false,
                });
                width = word_width;
            } else {
                width = needed;
            }
            words.push(word);
        }

        lines.push(Line {
            words,
            ends_paragraph: true,
        });
    }

    lines
}

fn split_word(word: &str, metrics: &Metrics) -> Vec<String> {
    if metrics.width(word) <= metrics.max_width_mm {
        return vec![word.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if metrics.width(&current) > metrics.max_width_mm && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Splits `line_count` lines into per-page ranges.
///
/// The first page holds fewer lines because of the title block.
pub fn paginate(line_count: usize, first_page: usize, per_page: usize) -> Vec<Range<usize>> {
    let first_page = first_page.max(1);
    let per_page = per_page.max(1);

    let mut pages = vec![0..line_count.min(first_page)];
    let mut start = pages[0].end;
    while start < line_count {
        let end = (start + per_page).min(line_count);
        pages.push(start..end);
        start = end;
    }
    pages
}
