use std::{
    fs::File,
    io::BufWriter,
    ops::Range,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::{
    layout::{paginate, text_width_mm, wrap_paragraphs, Line, Metrics, MM_PER_PT},
    DocumentRenderer,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 25.4;
const SPACER_MM: f32 = 7.62;

const TITLE: &str = "Resumo do Vídeo do YouTube";
const TITLE_SIZE_PT: f32 = 18.0;
const TITLE_LEADING_PT: f32 = 22.0;
const BODY_SIZE_PT: f32 = 11.0;
const BODY_LEADING_PT: f32 = 14.0;

/// DejaVu Sans runs noticeably wider than Helvetica
const EMBEDDED_WIDTH_SCALE: f32 = 1.12;

const LAYER_NAME: &str = "Layer 1";

/// Renders a summary as an A4 PDF with a centered title and a justified body
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    font_path: Option<PathBuf>,
}

impl PdfRenderer {
    pub const DEFAULT_FONT: &'static str = "DejaVuSans.ttf";

    pub fn new() -> Self {
        Self::default()
    }

    /// TrueType font to embed; Helvetica is used when it cannot be loaded
    pub fn with_font(mut self, font_path: Option<PathBuf>) -> Self {
        self.font_path = font_path;
        self
    }

    fn load_font(&self, doc: &PdfDocumentReference) -> anyhow::Result<(IndirectFontRef, f32)> {
        if let Some(path) = &self.font_path {
            let embedded = File::open(path)
                .map_err(anyhow::Error::from)
                .and_then(|file| doc.add_external_font(file).map_err(|e| anyhow!("{e:?}")));

            match embedded {
                Ok(font) => return Ok((font, EMBEDDED_WIDTH_SCALE)),
                Err(e) => {
                    tracing::info!(path = ?path, error = %e, "Font unavailable, falling back to Helvetica")
                }
            }
        }

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load built-in font: {e:?}"))?;
        Ok((font, 1.0))
    }

    fn write_document(&self, text: &str, out: &mut File) -> anyhow::Result<()> {
        let (doc, page, layer) =
            PdfDocument::new(TITLE, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        let (font, width_scale) = self.load_font(&doc)?;

        let metrics = body_metrics(width_scale);
        let (lines, pages) = plan_pages(text, &metrics);
        let leading = BODY_LEADING_PT * MM_PER_PT;
        let top = PAGE_HEIGHT_MM - MARGIN_MM;

        let mut current = doc.get_page(page).get_layer(layer);
        let title_width = text_width_mm(TITLE, TITLE_SIZE_PT, width_scale);
        current.use_text(
            TITLE,
            TITLE_SIZE_PT,
            Mm((PAGE_WIDTH_MM - title_width).max(0.0) / 2.0),
            Mm(top - TITLE_SIZE_PT * MM_PER_PT),
            &font,
        );
        let mut body_top = top - title_block_height();

        for (index, range) in pages.into_iter().enumerate() {
            if index > 0 {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
                current = doc.get_page(page).get_layer(layer);
                body_top = top;
            }

            for (row, line) in lines[range].iter().enumerate() {
                let baseline = body_top - BODY_SIZE_PT * MM_PER_PT - row as f32 * leading;
                draw_line(&current, line, baseline, &metrics, &font);
            }
        }

        doc.save(&mut BufWriter::new(out))
            .map_err(|e| anyhow!("Failed to write PDF: {e:?}"))
    }
}

impl DocumentRenderer for PdfRenderer {
    #[tracing::instrument(skip(self, text), fields(chars = text.len()))]
    fn render(&self, text: &str, destination: &Path) -> anyhow::Result<()> {
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("Refusing to render an empty document");
        }

        // Each render owns its partial file; a dropped one is removed
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        tempfile::Builder::new()
            .suffix(".pdf.part")
            .tempfile_in(parent)
            .with_context(|| format!("Failed to create a partial file in {}", parent.display()))
            .and_then(|mut partial| {
                self.write_document(text, partial.as_file_mut())?;
                partial.persist(destination).map_err(|e| e.error)?;
                Ok(())
            })
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to render PDF"))?;

        tracing::info!(path = ?destination, "PDF rendered");
        Ok(())
    }
}

fn body_metrics(width_scale: f32) -> Metrics {
    Metrics {
        font_size_pt: BODY_SIZE_PT,
        width_scale,
        max_width_mm: PAGE_WIDTH_MM - 2.0 * MARGIN_MM,
    }
}

fn title_block_height() -> f32 {
    TITLE_LEADING_PT * MM_PER_PT + SPACER_MM
}

/// Wrapped body lines and the range of lines placed on each page
fn plan_pages(text: &str, metrics: &Metrics) -> (Vec<Line>, Vec<Range<usize>>) {
    let lines = wrap_paragraphs(text, metrics);
    let leading = BODY_LEADING_PT * MM_PER_PT;
    let body_height = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;

    let first_page = ((body_height - title_block_height()) / leading).floor() as usize;
    let per_page = (body_height / leading).floor() as usize;
    let pages = paginate(lines.len(), first_page, per_page);

    (lines, pages)
}

fn draw_line(
    layer: &PdfLayerReference,
    line: &Line,
    baseline: f32,
    metrics: &Metrics,
    font: &IndirectFontRef,
) {
    if line.words.is_empty() {
        return;
    }

    if line.ends_paragraph || line.words.len() == 1 {
        layer.use_text(line.text(), BODY_SIZE_PT, Mm(MARGIN_MM), Mm(baseline), font);
        return;
    }

    let widths = line.words.iter().map(|w| metrics.width(w)).collect::<Vec<_>>();
    let slack = metrics.max_width_mm - widths.iter().sum::<f32>();
    let gap = (slack / (line.words.len() - 1) as f32).max(metrics.width(" "));

    let mut x = MARGIN_MM;
    for (word, width) in line.words.iter().zip(widths) {
        layer.use_text(word.as_str(), BODY_SIZE_PT, Mm(x), Mm(baseline), font);
        x += width + gap;
    }
}
