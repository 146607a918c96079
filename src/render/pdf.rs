//! Multi-page PDF output built with `lopdf`.
//!
//! The output file is opened when the sink is created, pages are appended to an
//! in-memory document as they are flushed, and the document (page tree,
//! outline, catalog) is written once on `finish`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::domain::{Align, Color, Dash, LineStyle, Style};
use crate::error::AppError;
use crate::render::scene::paint_page;
use crate::render::{Font, Surface, printable, text_width};
use crate::report::options::CanvasSpec;
use crate::report::page::Page;

fn real(v: f64) -> Object {
    Object::Real(v as _)
}

fn rgb(color: Color) -> Vec<Object> {
    let (r, g, b) = color.unit_rgb();
    vec![real(r as f64), real(g as f64), real(b as f64)]
}

/// Collects content-stream operations for one page.
#[derive(Default)]
pub struct PdfSurface {
    ops: Vec<Operation>,
}

impl PdfSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.ops
    }

    fn path(&mut self, points: &[(f64, f64)]) {
        for (i, &(x, y)) in points.iter().enumerate() {
            let op = if i == 0 { "m" } else { "l" };
            self.ops.push(Operation::new(op, vec![real(x), real(y)]));
        }
    }
}

impl Surface for PdfSurface {
    fn stroke(&mut self, points: &[(f64, f64)], line: &LineStyle) -> Result<(), AppError> {
        if points.len() < 2 {
            return Ok(());
        }
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("RG", rgb(line.color)));
        self.ops.push(Operation::new("w", vec![real(line.width)]));
        let dash: Vec<Object> = match line.dash {
            Dash::Solid => vec![],
            Dash::Dashed => vec![real(4.0), real(2.0)],
            Dash::Dotted => vec![real(1.0), real(1.5)],
        };
        self.ops.push(Operation::new("d", vec![Object::Array(dash), 0.into()]));
        self.path(points);
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
        Ok(())
    }

    fn fill(&mut self, points: &[(f64, f64)], color: Color) -> Result<(), AppError> {
        if points.len() < 3 {
            return Ok(());
        }
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("rg", rgb(color)));
        self.path(points);
        self.ops.push(Operation::new("h", vec![]));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
        Ok(())
    }

    fn text(&mut self, text: &str, (x, y): (f64, f64), font: &Font) -> Result<(), AppError> {
        let text = printable(text);
        if text.is_empty() || !(font.size > 0.0) {
            return Ok(());
        }
        let shift = match font.align {
            Align::Left => 0.0,
            Align::Center => 0.5 * text_width(&text, font.size),
            Align::Right => text_width(&text, font.size),
        };
        let name = if font.bold { "F2" } else { "F1" };
        let matrix = if font.vertical {
            vec![real(0.0), real(1.0), real(-1.0), real(0.0), real(x), real(y - shift)]
        } else {
            vec![real(1.0), real(0.0), real(0.0), real(1.0), real(x - shift), real(y)]
        };
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("rg", rgb(font.color)));
        self.ops
            .push(Operation::new("Tf", vec![Object::Name(name.as_bytes().to_vec()), real(font.size)]));
        self.ops.push(Operation::new("Tm", matrix));
        self.ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        self.ops.push(Operation::new("ET", vec![]));
        Ok(())
    }
}

struct OutlineEntry {
    object_id: ObjectId,
    page_id: ObjectId,
    title: String,
}

/// Incrementally built PDF document.
pub struct PdfSink {
    path: PathBuf,
    file: File,
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    size: (f64, f64),
    style: Style,
    page_ids: Vec<ObjectId>,
    outline: Vec<OutlineEntry>,
}

impl PdfSink {
    /// Open `path` for writing. Fails when the file cannot be created.
    pub fn create(path: &Path, canvas: &CanvasSpec, style: Style) -> Result<Self, AppError> {
        let file = File::create(path)
            .map_err(|e| AppError::config(format!("Cannot open output '{}': {e}", path.display())))?;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        Ok(Self {
            path: path.to_path_buf(),
            file,
            doc,
            pages_id,
            resources_id,
            size: canvas.page_size(),
            style,
            page_ids: Vec::new(),
            outline: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Render `page` and append it; its title becomes an outline entry.
    pub fn emit(&mut self, page: &Page) -> Result<(), AppError> {
        let mut surface = PdfSurface::new();
        paint_page(page, &self.style, self.size, &mut surface)?;
        let content = Content {
            operations: surface.into_operations(),
        };
        let bytes = content
            .encode()
            .map_err(|e| AppError::render(format!("Failed to encode page {}: {e}", self.page_ids.len() + 1)))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, bytes));

        let (w, h) = self.size;
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => self.resources_id,
            "MediaBox" => vec![0.into(), 0.into(), real(w), real(h)],
        });
        self.page_ids.push(page_id);

        if !page.title.is_empty() {
            let object_id = self.doc.new_object_id();
            self.outline.push(OutlineEntry {
                object_id,
                page_id,
                title: printable(&page.title),
            });
        }
        Ok(())
    }

    /// Write the document and return the number of pages.
    pub fn finish(mut self) -> Result<usize, AppError> {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        };
        if !self.outline.is_empty() {
            let outlines_id = self.doc.new_object_id();
            self.link_outline(outlines_id);
            catalog.set("Outlines", Object::Reference(outlines_id));
            catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
        }
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut writer = BufWriter::new(&self.file);
        self.doc
            .save_to(&mut writer)
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", self.path.display())))?;
        writer
            .flush()
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", self.path.display())))?;
        Ok(self.page_ids.len())
    }

    fn link_outline(&mut self, outlines_id: ObjectId) {
        let entries = &self.outline;
        for (index, entry) in entries.iter().enumerate() {
            let mut dictionary = Dictionary::new();
            dictionary.set("Title", Object::string_literal(entry.title.as_str()));
            dictionary.set(
                "Dest",
                Object::Array(vec![Object::Reference(entry.page_id), Object::Name("Fit".into())]),
            );
            dictionary.set("Parent", Object::Reference(outlines_id));
            if index > 0 {
                dictionary.set("Prev", Object::Reference(entries[index - 1].object_id));
            }
            if index + 1 < entries.len() {
                dictionary.set("Next", Object::Reference(entries[index + 1].object_id));
            }
            self.doc.objects.insert(entry.object_id, Object::Dictionary(dictionary));
        }

        let mut root = Dictionary::new();
        root.set("Type", Object::Name("Outlines".into()));
        root.set("Count", Object::Integer(entries.len() as i64));
        if let Some(first) = entries.first() {
            root.set("First", Object::Reference(first.object_id));
        }
        if let Some(last) = entries.last() {
            root.set("Last", Object::Reference(last.object_id));
        }
        self.doc.objects.insert(outlines_id, Object::Dictionary(root));
    }
}

/// Write a single page as its own PDF file.
pub fn write_single_page_pdf(page: &Page, style: &Style, canvas: &CanvasSpec, path: &Path) -> Result<(), AppError> {
    let mut sink = PdfSink::create(path, canvas, style.clone())?;
    sink.emit(page)?;
    sink.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::page::PageKind;

    #[test]
    fn text_is_positioned_with_alignment() {
        let mut surface = PdfSurface::new();
        let font = Font {
            size: 10.0,
            color: Color::BLACK,
            bold: true,
            align: Align::Right,
            vertical: false,
        };
        surface.text("abcd", (100.0, 50.0), &font).unwrap();
        let ops = surface.into_operations();
        let tm = ops.iter().find(|op| op.operator == "Tm").unwrap();
        // 4 chars * 0.52 * 10pt shifted left.
        match tm.operands[4] {
            Object::Real(x) => assert!((x as f64 - 79.2).abs() < 1e-3),
            ref other => panic!("unexpected operand {other:?}"),
        }
        let tf = ops.iter().find(|op| op.operator == "Tf").unwrap();
        assert!(matches!(&tf.operands[0], Object::Name(n) if n == b"F2"));
    }

    #[test]
    fn degenerate_paths_are_skipped() {
        let mut surface = PdfSurface::new();
        surface.stroke(&[(0.0, 0.0)], &LineStyle::default()).unwrap();
        surface.fill(&[(0.0, 0.0), (1.0, 1.0)], Color::RED).unwrap();
        assert!(surface.into_operations().is_empty());
    }

    #[test]
    fn pages_and_outline_are_written() {
        let dir = std::env::temp_dir().join("sipm_report_pdf_sink_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sink.pdf");

        let mut sink = PdfSink::create(&path, &CanvasSpec::default(), Style::default()).unwrap();
        sink.emit(&Page::title_page(PageKind::Cover, 0, "Cover")).unwrap();
        sink.emit(&Page::title_page(PageKind::BackCover, 0, "End")).unwrap();
        assert_eq!(sink.page_count(), 2);
        assert_eq!(sink.finish().unwrap(), 2);

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        let catalog = doc.catalog().unwrap();
        assert!(catalog.get(b"Outlines").is_ok());
    }
}
