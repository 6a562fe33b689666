//! Row and column visibility from the xlsx package
//!
//! calamine yields cell data only. Hidden flags live on the `<row>` and
//! `<col>` elements of each worksheet part, located through
//! `xl/workbook.xml` and its relationships.

use crate::error::{TabellaError, TabellaResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Hidden 1-based row numbers and 1-based column indices of one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetLayout {
    pub hidden_rows: BTreeSet<usize>,
    pub hidden_columns: BTreeSet<u32>,
}

/// Worksheet parts of an xlsx package, by sheet name
pub struct PackageLayout<R: Read + Seek> {
    archive: ZipArchive<R>,
    parts: HashMap<String, String>,
}

impl<R: Read + Seek> PackageLayout<R> {
    pub fn open(reader: R) -> TabellaResult<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| TabellaError::Workbook(format!("Failed to open workbook package: {}", e)))?;

        let workbook = read_part(&mut archive, WORKBOOK_PART)?;
        let rels = read_part(&mut archive, WORKBOOK_RELS_PART)?;
        let parts = match (workbook, rels) {
            (Some(workbook), Some(rels)) => sheet_parts(&workbook, &rels)?,
            _ => HashMap::new(),
        };

        Ok(Self { archive, parts })
    }

    /// Layout of the named sheet, empty when no worksheet part is found
    pub fn sheet(&mut self, name: &str) -> TabellaResult<SheetLayout> {
        let Some(part) = self.parts.get(name) else {
            tracing::debug!("no worksheet part for sheet '{}'", name);
            return Ok(SheetLayout::default());
        };

        match read_part(&mut self.archive, part)? {
            Some(xml) => parse_sheet_layout(&xml),
            None => Ok(SheetLayout::default()),
        }
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> TabellaResult<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(TabellaError::Workbook(format!("Failed to read '{}': {}", name, e)));
        }
    };

    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// Sheet name → package path of its worksheet part
fn sheet_parts(workbook: &str, rels: &str) -> TabellaResult<HashMap<String, String>> {
    let targets: HashMap<String, String> = element_attributes(rels, b"Relationship")?
        .into_iter()
        .filter_map(|mut attrs| Some((attrs.remove("Id")?, attrs.remove("Target")?)))
        .collect();

    Ok(element_attributes(workbook, b"sheet")?
        .into_iter()
        .filter_map(|mut attrs| {
            // r:id, matched on its local name
            let target = targets.get(&attrs.remove("id")?)?;
            Some((attrs.remove("name")?, part_path(target)))
        })
        .collect())
}

/// Relationship targets are relative to `xl/` unless rooted
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(rooted) => rooted.to_string(),
        None => format!("xl/{}", target),
    }
}

/// Collect hidden `<row>` and `<col>` flags from a worksheet part
pub fn parse_sheet_layout(xml: &str) -> TabellaResult<SheetLayout> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut layout = SheetLayout::default();
    let mut next_row = 1usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    let attrs = attributes(e)?;
                    // r is optional, rows then follow on from the previous one
                    let number = attrs
                        .get("r")
                        .and_then(|r| r.parse().ok())
                        .unwrap_or(next_row);
                    next_row = number + 1;
                    if is_hidden(&attrs) {
                        layout.hidden_rows.insert(number);
                    }
                }
                b"col" => {
                    let attrs = attributes(e)?;
                    let min = attrs.get("min").and_then(|v| v.parse::<u32>().ok());
                    let max = attrs.get("max").and_then(|v| v.parse::<u32>().ok());
                    if let (true, Some(min)) = (is_hidden(&attrs), min) {
                        layout.hidden_columns.extend(min..=max.unwrap_or(min));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(layout)
}

fn is_hidden(attrs: &HashMap<String, String>) -> bool {
    matches!(attrs.get("hidden").map(String::as_str), Some("1") | Some("true"))
}

/// Attributes of every `element`, keyed by local name
fn element_attributes(xml: &str, element: &[u8]) -> TabellaResult<Vec<HashMap<String, String>>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut found = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.local_name().as_ref() == element => {
                found.push(attributes(e)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(found)
}

fn attributes(element: &BytesStart) -> TabellaResult<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in element.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn xml_error(e: quick_xml::Error) -> TabellaError {
    TabellaError::Workbook(format!("Malformed workbook XML: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hidden_rows_and_column_ranges() {
        let xml = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
            <cols>
                <col min="1" max="1" width="12"/>
                <col min="2" max="4" hidden="1" customWidth="1"/>
            </cols>
            <sheetData>
                <row r="1"><c r="A1"/></row>
                <row r="3" hidden="1"><c r="A3"/></row>
                <row hidden="true"/>
                <row r="9" hidden="0"/>
            </sheetData>
        </worksheet>"#;

        let layout = parse_sheet_layout(xml).unwrap();
        assert_eq!(layout.hidden_rows, BTreeSet::from([3, 4]));
        assert_eq!(layout.hidden_columns, BTreeSet::from([2, 3, 4]));
    }

    #[test]
    fn test_sheet_parts_follow_relationships() {
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
                <sheet name="Prices &amp; Fees" sheetId="1" r:id="rId2"/>
                <sheet name="Archive" sheetId="2" r:id="rId1"/>
            </sheets>
        </workbook>"#;
        let rels = r#"<Relationships>
            <Relationship Id="rId1" Target="/xl/worksheets/sheet2.xml"/>
            <Relationship Id="rId2" Target="worksheets/sheet1.xml"/>
        </Relationships>"#;

        let parts = sheet_parts(workbook, rels).unwrap();
        assert_eq!(parts["Prices & Fees"], "xl/worksheets/sheet1.xml");
        assert_eq!(parts["Archive"], "xl/worksheets/sheet2.xml");
    }
}
