use crate::error::ResultMessage;
use crate::error::SalesMatrixError;
use crate::helpers::xml::append_reference;
use crate::helpers::xml::append_text;
use crate::helpers::xml::StartTagExt;
use crate::helpers::xml::XmlReader;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::WorkbookArchive;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::HashMap;
use std::io::BufRead;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELATIONSHIPS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// `xl/workbook.xml`
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");

/// `xl/styles.xml`
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_CELL_FORMATS: QName = QName(b"cellXfs");
const TAG_CELL_FORMAT: QName = QName(b"xf");

/// `xl/sharedStrings.xml` and inline strings
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");

/// `xl/worksheets/*.xml`
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// An Office Open XML workbook (.xlsx, .xlsm) opened from memory
pub(crate) struct XlsxWorkbook {
    zip: WorkbookArchive,
    /// Cell type of every cell style, indexed by style id
    number_formats: Vec<CellType>,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook {
    /// Opens a workbook package and parses its structure
    ///
    /// # Arguments
    /// * `bytes` - Raw package content
    pub(crate) fn open(bytes: Vec<u8>) -> Result<XlsxWorkbook, SalesMatrixError> {
        let (zip, number_formats, sheets) = excel::open(bytes, load_workbook, load_number_formats)?;
        Ok(XlsxWorkbook {
            zip,
            number_formats,
            sheets,
        })
    }

    /// Names of the worksheets in workbook order
    pub(crate) fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// First worksheet accepted by `criteria`, as (name, zip_path)
    fn select_sheet(&self, criteria: &Criteria) -> Result<(String, String), SpreadsheetError> {
        self.sheets
            .iter()
            .find(|(name, _)| criteria.accept(name))
            .cloned()
            .ok_or_else(|| {
                let pattern = criteria.sheet_name_pattern
                    .as_ref()
                    .map(|pattern| pattern.as_str().to_owned())
                    .unwrap_or_default();
                SpreadsheetError::SheetNotFoundError(pattern)
            })
    }

    /// Loads the shared string table; workbooks without one yield an empty table.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, SalesMatrixError> {
        let Some(mut reader) = self.zip.xml_reader(SHARED_STRINGS_PART)? else {
            return Ok(Vec::new());
        };

        let mut shared_strings = Vec::<String>::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }

    /// Reads the first worksheet accepted by `criteria`
    ///
    /// Shared strings are resolved and error cells are kept or dropped
    /// according to `criteria.error_as_null`. Cells without a value are not
    /// recorded.
    ///
    /// # Returns
    /// The selected sheet with its cells ordered by position
    pub(crate) fn read_sheet(&mut self, criteria: &Criteria) -> Result<Sheet, SalesMatrixError> {
        let (sheet_name, zip_path) = self.select_sheet(criteria)?;
        let shared_strings = self.load_shared_strings().with_prefix(SHARED_STRINGS_PART)?;
        let number_formats = &self.number_formats;
        let mut reader = self.zip.xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;

        let mut sheet = Sheet::new(&sheet_name);
        // Position of a cell that omits its `r` reference
        let mut next_row = 0usize;
        let mut next_col = 0usize;
        let mut current: Option<Cell> = None;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.parse_attribute::<usize>("r")?.filter(|number| *number > 0) {
                    next_row = number - 1;
                }
                next_col = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                next_row += 1;
                next_col = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                let (row, col) = event.attribute("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((next_row, next_col));
                next_col = col + 1;
                let kind = cell_kind(&event, number_formats, criteria.error_as_null)?;
                current = (kind != CellType::Empty).then(|| Cell {
                    row,
                    col,
                    kind,
                    value: String::new(),
                });
            }
            Event::Start(event) if current.is_some() && (event.name() == TAG_VALUE || event.name() == TAG_INLINE_STRING) => {
                let is_value = event.name() == TAG_VALUE;
                let end_tag = if is_value { TAG_VALUE } else { TAG_INLINE_STRING };
                let text = read_string_value(&mut reader, end_tag, is_value)?;
                if let Some(cell) = current.as_mut() {
                    cell.value = text;
                }
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if let Some(mut cell) = current.take().filter(|cell| !cell.value.is_empty()) {
                    if cell.kind == CellType::SharedString {
                        let index = cell.value.trim().parse::<usize>()?;
                        cell.value = shared_strings
                            .get(index)
                            .cloned()
                            .ok_or_else(|| SpreadsheetError::SharedStringError(sheet_name.to_owned(), index))?;
                    }
                    sheet.push(cell);
                }
            }
        });
        sheet.finish();
        log::debug!("Read {} cells from sheet '{}'", sheet.cells.len(), sheet.name);
        Ok(sheet)
    }
}

/// Resolves the type of a `<c>` element: the `t` attribute first, then the
/// number format of its style for plain numbers.
fn cell_kind(event: &BytesStart, number_formats: &[CellType], error_as_null: bool) -> Result<CellType, SalesMatrixError> {
    let kind = CellType::from_type_attribute(event.attribute("t")?.as_deref(), error_as_null);
    if kind != CellType::Number {
        return Ok(kind);
    }
    match event.attribute("s")?.filter(|style| !style.is_empty()) {
        Some(style) => {
            let index = style.parse::<usize>()?;
            Ok(number_formats.get(index).copied().unwrap_or(CellType::Number))
        }
        None => Ok(kind),
    }
}

/// Name and relationship id of a `<sheet>` element. The id is namespaced
/// (`r:id`), so attributes are matched by local name.
fn sheet_entry(event: &BytesStart) -> Result<Option<(String, String)>, SalesMatrixError> {
    let mut name = None::<String>;
    let mut id = None::<String>;
    for attribute in event.attributes() {
        let attribute = attribute?;
        match attribute.key.local_name().as_ref() {
            b"name" => name = Some(attribute.unescape_value()?.into_owned()),
            b"id" => id = Some(attribute.unescape_value()?.into_owned()),
            _ => (),
        }
    }
    Ok(name.zip(id))
}

/// Loads the sheet list and the date system from `xl/workbook.xml`
///
/// # Returns
/// Tuple of (worksheets, is_1904_date_system) where worksheets are (name, zip_path) pairs
fn load_workbook(zip: &mut WorkbookArchive) -> Result<(Vec<(String, String)>, bool), SalesMatrixError> {
    let relationships = load_relationships(zip, WORKBOOK_RELATIONSHIPS_PART)?;
    let mut reader = zip.xml_reader(WORKBOOK_PART)?
        .ok_or_else(|| SpreadsheetError::FileError(WORKBOOK_PART.to_owned()))?;

    let mut sheets = Vec::<(String, String)>::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            if let Some((name, id)) = sheet_entry(&event)? {
                match relationships.get(&id) {
                    Some(path) => sheets.push((name, path.to_owned())),
                    None => log::debug!("Sheet '{}' is not a worksheet", name),
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.attribute("date1904")?
                .is_some_and(|value| value == "1" || value == "true");
        }
    });
    Ok((sheets, is_1904))
}

/// Part of `xl/styles.xml` the reader is in
#[derive(Copy, Clone, PartialEq)]
enum StylesSection {
    Other,
    CustomFormats,
    CellFormats,
}

/// Loads the number format of every cell style from `xl/styles.xml`
///
/// # Returns
/// Vector of CellType values indexed by style id
fn load_number_formats(zip: &mut WorkbookArchive, is_1904: bool) -> Result<Vec<CellType>, SalesMatrixError> {
    let Some(mut reader) = zip.xml_reader(STYLES_PART)? else {
        return Ok(Vec::new());
    };

    let mut section = StylesSection::Other;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_ids = Vec::<String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => section = StylesSection::CustomFormats,
        Event::Start(event) if event.name() == TAG_CELL_FORMATS => section = StylesSection::CellFormats,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS || event.name() == TAG_CELL_FORMATS => {
            section = StylesSection::Other;
        }
        Event::Start(event) if section == StylesSection::CustomFormats && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.attribute("numFmtId")?;
            let code = event.attribute("formatCode")?;
            if let Some((id, code)) = id.zip(code) {
                custom_formats.insert(id.into_owned(), CellType::parse_custom_number_format(&code, is_1904));
            }
        }
        Event::Start(event) if section == StylesSection::CellFormats && event.name() == TAG_CELL_FORMAT => {
            let id = event.attribute("numFmtId")?;
            format_ids.push(id.map(|id| id.into_owned()).unwrap_or_else(|| "0".to_owned()));
        }
    });

    Ok(excel::load_number_formats(format_ids, custom_formats, is_1904))
}

/// Reads string content up to `end_tag`, skipping phonetic annotations
///
/// # Arguments
/// * `reader` - XML reader positioned inside the string element
/// * `end_tag` - XML tag that marks the end of the string content
/// * `is_text_content` - Whether text is collected outside `<t>` elements
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SalesMatrixError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => append_text(&mut text, &event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => append_reference(&mut text, &event)?,
    });
    Ok(text)
}
