//! 直接讀取 .docx 容器（zip + `word/document.xml`），取出文件本文中的表格文字。
//!
//! - 只有本文最外層的表格有索引；巢狀表格的文字併入外層儲存格
//! - 儲存格文字為各段落以 `\n` 串接，`w:tab` → `\t`，`w:br` / `w:cr` → `\n`
//! - 橫向合併（`w:gridSpan`）的儲存格依跨欄數重複輸出
//! - 舊式表單勾選框（`w:ffData/w:checkBox`）轉成 ☒ / ☐，與內容控制項勾選框的文字一致

use crate::domain::model::DocumentTables;
use crate::utils::error::DocumentReadError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";
const CHECKED_GLYPH: char = '☒';
const UNCHECKED_GLYPH: char = '☐';

pub fn read_tables(
    path: &Path,
    filter: Option<&BTreeSet<usize>>,
) -> Result<DocumentTables, DocumentReadError> {
    if !path.is_file() {
        return Err(DocumentReadError::NotFound(path.to_path_buf()));
    }

    let io_error = |source| DocumentReadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let not_a_document = |source| DocumentReadError::NotADocument {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let mut archive = zip::ZipArchive::new(file).map_err(not_a_document)?;
    let mut xml = String::new();
    {
        let mut part = archive.by_name(DOCUMENT_PART).map_err(not_a_document)?;
        part.read_to_string(&mut xml).map_err(io_error)?;
    }

    let tables = parse_tables(&xml, filter).map_err(|e| DocumentReadError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::debug!("Read {} tables from {}", tables.len(), path.display());
    Ok(tables)
}

/// 解析 `word/document.xml` 的內容
pub fn parse_tables(
    xml: &str,
    filter: Option<&BTreeSet<usize>>,
) -> Result<DocumentTables, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut builder = TableBuilder::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => builder.open(&e),
            Event::Empty(e) => {
                builder.open(&e);
                builder.close(e.name().as_ref());
            }
            Event::End(e) => builder.close(e.name().as_ref()),
            Event::Text(e) if builder.in_text => builder.push_text(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder
        .tables
        .into_iter()
        .enumerate()
        .filter(|(index, _)| filter.map_or(true, |f| f.contains(index)))
        .collect())
}

#[derive(Debug, Default)]
struct FormCheckbox {
    default: bool,
    checked: Option<bool>,
}

impl FormCheckbox {
    fn glyph(&self) -> char {
        if self.checked.unwrap_or(self.default) {
            CHECKED_GLYPH
        } else {
            UNCHECKED_GLYPH
        }
    }
}

#[derive(Debug, Default)]
struct TableBuilder {
    tables: Vec<Vec<Vec<String>>>,
    /// `w:tbl` 巢狀層數，1 為最外層表格
    table_depth: usize,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell_span: usize,
    paragraphs: Vec<String>,
    paragraph: String,
    paragraph_depth: usize,
    in_run: bool,
    in_text: bool,
    checkbox: Option<FormCheckbox>,
}

impl TableBuilder {
    fn in_table(&self) -> bool {
        self.table_depth > 0
    }

    fn open(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.rows.clear();
                }
            }
            b"w:tr" if self.table_depth == 1 => self.row.clear(),
            b"w:tc" if self.table_depth == 1 => {
                self.paragraphs.clear();
                self.cell_span = 1;
            }
            b"w:gridSpan" if self.table_depth == 1 => {
                self.cell_span = attr_value(e, "w:val")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(1)
                    .max(1);
            }
            b"w:p" if self.in_table() => {
                self.paragraph_depth += 1;
                if self.paragraph_depth == 1 {
                    self.paragraph.clear();
                }
            }
            b"w:r" => self.in_run = true,
            b"w:t" => self.in_text = true,
            b"w:tab" if self.in_run => self.push_text("\t"),
            b"w:br" | b"w:cr" if self.in_run => self.push_text("\n"),
            b"w:checkBox" => self.checkbox = Some(FormCheckbox::default()),
            b"w:default" => {
                if let Some(checkbox) = self.checkbox.as_mut() {
                    checkbox.default = attr_value(e, "w:val").as_deref() == Some("1");
                }
            }
            b"w:checked" => {
                if let Some(checkbox) = self.checkbox.as_mut() {
                    checkbox.checked = Some(is_on(attr_value(e, "w:val").as_deref()));
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:tbl" => {
                if self.table_depth == 1 {
                    self.tables.push(std::mem::take(&mut self.rows));
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            b"w:tr" if self.table_depth == 1 => {
                self.rows.push(std::mem::take(&mut self.row));
            }
            b"w:tc" if self.table_depth == 1 => {
                let text = std::mem::take(&mut self.paragraphs).join("\n");
                for _ in 0..self.cell_span {
                    self.row.push(text.clone());
                }
            }
            b"w:p" if self.in_table() && self.paragraph_depth > 0 => {
                if self.paragraph_depth == 1 {
                    self.paragraphs.push(std::mem::take(&mut self.paragraph));
                }
                self.paragraph_depth -= 1;
            }
            b"w:r" => self.in_run = false,
            b"w:t" => self.in_text = false,
            b"w:checkBox" => {
                if let Some(checkbox) = self.checkbox.take() {
                    self.push_text(&checkbox.glyph().to_string());
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_table() && self.paragraph_depth > 0 {
            self.paragraph.push_str(text);
        }
    }
}

fn attr_value(e: &BytesStart, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// OOXML 開關屬性：未設定即為開啟
fn is_on(value: Option<&str>) -> bool {
    !matches!(value, Some("0") | Some("false") | Some("off"))
}
