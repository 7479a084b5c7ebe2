//! Office Open XML package helpers shared by the workbook parts
use crate::error::SalesMatrixError;
use crate::helpers::xml::StartTagExt;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;
use zip::ZipArchive;

/// XML tag name for relationship elements in Excel files
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Workbook package held entirely in memory
pub(crate) type WorkbookArchive = ZipArchive<Cursor<Vec<u8>>>;

/// Opens an in-memory workbook package and loads its structure
///
/// # Arguments
/// * `bytes` - Raw package content
/// * `load_workbook` - Function to load the sheet list and date system
/// * `load_number_formats` - Function to load number formatting information
///
/// # Returns
/// Tuple containing:
/// - Zip archive handle
/// - Number format mappings
/// - List of sheet names and their paths
pub(super) fn open<W, F>(bytes: Vec<u8>, load_workbook: W, load_number_formats: F) -> Result<(
    WorkbookArchive,
    Vec<CellType>,
    Vec<(String, String)>
), SalesMatrixError>
where
    W: Fn(&mut WorkbookArchive) -> Result<(Vec<(String, String)>, bool), SalesMatrixError>,
    F: Fn(&mut WorkbookArchive, bool) -> Result<Vec<CellType>, SalesMatrixError>,
{
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let (sheets, is_1904) = load_workbook(&mut zip)?;
    if sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError)?
    }

    let number_formats = load_number_formats(&mut zip, is_1904)?;
    Ok((zip, number_formats, sheets))
}

/// Loads worksheet relationships from the package
///
/// # Arguments
/// * `zip` - Zip archive handle
/// * `path` - Path to the relationships XML file within the archive
///
/// # Returns
/// Mapping of relationship IDs to worksheet paths
pub(super) fn load_relationships(zip: &mut WorkbookArchive, path: &str) -> Result<HashMap<String, String>, SalesMatrixError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.attribute("Id")?;
            let kind = event.attribute("Type")?;
            let target = event.attribute("Target")?;
            // Only worksheets; chartsheets and dialog sheets hold no cell data
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Maps cell style format ids to cell types using custom and built-in formats
///
/// # Arguments
/// * `format_indexes` - Number format id of each cell style, in style order
/// * `custom_formats` - Custom format mappings defined in the workbook
/// * `is_1904` - Whether the workbook uses the 1904 date system
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to a path inside the package
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn zip_paths() {
        assert_eq!(to_zip_path(Cow::Borrowed("worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path(Cow::Borrowed("/xl/worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path(Cow::Borrowed("xl/worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
    }

    #[test]
    fn number_format_mapping() {
        let mut custom = HashMap::new();
        custom.insert("164".to_owned(), CellType::NumberDate1900);
        let formats = load_number_formats(
            vec!["0".to_owned(), "164".to_owned(), "22".to_owned(), "49".to_owned()],
            custom,
            false,
        );
        assert_eq!(formats, vec![
            CellType::Number,
            CellType::NumberDate1900,
            CellType::NumberDateTime1900,
            CellType::Number,
        ]);
    }

    #[test]
    fn relationships_keep_worksheets_only() {
        let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/_rels/workbook.xml.rels", SimpleFileOptions::default()).unwrap();
        writer.write_all(rels.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let relationships = load_relationships(&mut zip, "xl/_rels/workbook.xml.rels").unwrap();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships.get("rId1").map(String::as_str), Some("xl/worksheets/sheet1.xml"));
        assert!(load_relationships(&mut zip, "xl/_rels/missing.rels").is_err());
    }
}
