//! Minimal SpreadsheetML (`.xlsx`) writer for the two-column result sheet.
//!
//! The package is assembled in memory and only then written to disk with a single call.
//! Cells are inline strings; the header row uses style 1 (bold, centered).

use crate::config::OutputConfig;
use crate::error::{Result, TitleGrabError};
use crate::extractor::ExtractedEntry;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

type XmlResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const SHEET_PART: &str = "xl/worksheets/sheet1.xml";
const HEADER_STYLE: &str = "1";
const COLUMNS: [&str; 2] = ["A", "B"];

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font><font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1" applyAlignment="1"><alignment horizontal="center"/></xf></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

pub struct WorkbookWriter {
    layout: OutputConfig,
}

impl WorkbookWriter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            layout: config.clone(),
        }
    }

    /// Fixed location of the workbook for a scanned directory.
    pub fn destination(&self, directory: &Path) -> PathBuf {
        directory.join(&self.layout.file_name)
    }

    /// Writes the header plus one row per entry, replacing any previous workbook.
    pub fn write(&self, entries: &[ExtractedEntry], destination: &Path) -> Result<()> {
        let write_failure = |message: String| TitleGrabError::WriteFailure {
            path: destination.display().to_string(),
            message,
        };

        let bytes = self.to_bytes(entries).map_err(|e| write_failure(e.to_string()))?;
        fs::write(destination, bytes).map_err(|e| write_failure(e.to_string()))?;

        tracing::debug!(
            path = %destination.display(),
            rows = entries.len(),
            "workbook written"
        );

        Ok(())
    }

    pub fn to_bytes(
        &self,
        entries: &[ExtractedEntry],
    ) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error>> {
        // Fixed timestamps keep the archive identical for identical input.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let parts: [(&str, Cow<'_, [u8]>); 6] = [
            ("[Content_Types].xml", Cow::Borrowed(CONTENT_TYPES_XML.as_bytes())),
            ("_rels/.rels", Cow::Borrowed(ROOT_RELS_XML.as_bytes())),
            ("xl/workbook.xml", Cow::Owned(self.workbook_xml()?)),
            ("xl/_rels/workbook.xml.rels", Cow::Borrowed(WORKBOOK_RELS_XML.as_bytes())),
            ("xl/styles.xml", Cow::Borrowed(STYLES_XML.as_bytes())),
            (SHEET_PART, Cow::Owned(self.sheet_xml(entries)?)),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            zip.start_file(name, options)?;
            zip.write_all(&content)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn workbook_xml(&self) -> XmlResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        write_declaration(&mut writer)?;
        writer.write_event(Event::Start(BytesStart::new("workbook").with_attributes([
            ("xmlns", SPREADSHEET_NS),
            ("xmlns:r", RELATIONSHIPS_NS),
        ])))?;
        writer.write_event(Event::Start(BytesStart::new("sheets")))?;
        writer.write_event(Event::Empty(BytesStart::new("sheet").with_attributes([
            ("name", self.layout.sheet_name.as_str()),
            ("sheetId", "1"),
            ("r:id", "rId1"),
        ])))?;
        writer.write_event(Event::End(BytesEnd::new("sheets")))?;
        writer.write_event(Event::End(BytesEnd::new("workbook")))?;
        Ok(writer.into_inner())
    }

    fn sheet_xml(&self, entries: &[ExtractedEntry]) -> XmlResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        write_declaration(&mut writer)?;
        writer.write_event(Event::Start(
            BytesStart::new("worksheet").with_attributes([("xmlns", SPREADSHEET_NS)]),
        ))?;

        writer.write_event(Event::Start(BytesStart::new("cols")))?;
        let widths = [
            self.layout.content_column_width,
            self.layout.source_column_width,
        ];
        for (index, width) in widths.iter().enumerate() {
            let column = (index + 1).to_string();
            let width = width.to_string();
            writer.write_event(Event::Empty(BytesStart::new("col").with_attributes([
                ("min", column.as_str()),
                ("max", column.as_str()),
                ("width", width.as_str()),
                ("customWidth", "1"),
            ])))?;
        }
        writer.write_event(Event::End(BytesEnd::new("cols")))?;

        writer.write_event(Event::Start(BytesStart::new("sheetData")))?;
        write_row(
            &mut writer,
            1,
            [
                self.layout.content_header.as_str(),
                self.layout.source_header.as_str(),
            ],
            Some(HEADER_STYLE),
        )?;
        for (index, entry) in entries.iter().enumerate() {
            write_row(
                &mut writer,
                index + 2,
                [entry.content.as_str(), entry.source_file_name.as_str()],
                None,
            )?;
        }
        writer.write_event(Event::End(BytesEnd::new("sheetData")))?;

        writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
        Ok(writer.into_inner())
    }
}

fn write_declaration(writer: &mut Writer<Vec<u8>>) -> XmlResult<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(())
}

fn write_row(
    writer: &mut Writer<Vec<u8>>,
    row: usize,
    values: [&str; 2],
    style: Option<&str>,
) -> XmlResult<()> {
    let row_ref = row.to_string();
    writer.write_event(Event::Start(
        BytesStart::new("row").with_attributes([("r", row_ref.as_str())]),
    ))?;

    for (column, value) in COLUMNS.iter().zip(values) {
        let cell_ref = format!("{}{}", column, row);
        let mut cell = BytesStart::new("c");
        cell.push_attribute(("r", cell_ref.as_str()));
        if let Some(style) = style {
            cell.push_attribute(("s", style));
        }
        cell.push_attribute(("t", "inlineStr"));

        let text = encode_cell_text(value);
        writer.write_event(Event::Start(cell))?;
        writer.write_event(Event::Start(BytesStart::new("is")))?;
        writer.write_event(Event::Start(
            BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(&text)))?;
        writer.write_event(Event::End(BytesEnd::new("t")))?;
        writer.write_event(Event::End(BytesEnd::new("is")))?;
        writer.write_event(Event::End(BytesEnd::new("c")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

/// Reads every row (header included) of the first sheet of a workbook written by
/// [`WorkbookWriter`].
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    parse_rows(&bytes).map_err(|e| TitleGrabError::InvalidWorkbook {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn parse_rows(bytes: &[u8]) -> XmlResult<Vec<Vec<String>>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = Vec::new();
    archive.by_name(SHEET_PART)?.read_to_end(&mut xml)?;

    let mut reader = Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"c" => cell = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Text(text) if in_text => {
                if let Some(cell) = cell.as_mut() {
                    cell.push_str(&text.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"c" => {
                    if let Some(cell) = cell.take() {
                        row.push(decode_cell_text(&cell));
                    }
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

/// Characters XML cannot carry literally (or would normalize away) are stored as `_xHHHH_`.
fn needs_escape(c: char) -> bool {
    (c.is_control() && c != '\t' && c != '\n') || c == '\u{FFFE}' || c == '\u{FFFF}'
}

fn encode_cell_text(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_escape) && !text.contains("_x") {
        return Cow::Borrowed(text);
    }

    let mut encoded = String::with_capacity(text.len() + 8);
    for (index, c) in text.char_indices() {
        if needs_escape(c) {
            encoded.push_str(&format!("_x{:04X}_", c as u32));
        } else if c == '_' && parse_escape(&text[index..]).is_some() {
            // A literal `_xHHHH_` must not be mistaken for an escape on the way back.
            encoded.push_str("_x005F_");
        } else {
            encoded.push(c);
        }
    }
    Cow::Owned(encoded)
}

fn decode_cell_text(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(position) = rest.find("_x") {
        decoded.push_str(&rest[..position]);
        let candidate = &rest[position..];
        match parse_escape(candidate) {
            Some(c) => {
                decoded.push(c);
                rest = &candidate[7..];
            }
            None => {
                decoded.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

fn parse_escape(text: &str) -> Option<char> {
    let bytes = text.as_bytes();
    if bytes.len() < 7 || !text.starts_with("_x") || bytes[6] != b'_' {
        return None;
    }

    let hex = text.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}
