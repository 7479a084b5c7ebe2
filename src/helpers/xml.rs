//! Pull-parser plumbing over `quick_xml` for the workbook parts.

use crate::error::SalesMatrixError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),

    #[error("Attribute '{name}' has an unexpected value '{value}'")]
    InvalidAttribute { name: String, value: String },
}

/// Reads a workbook part event by event into one reused buffer.
/// `<c/>` comes back as a start event followed by an end event.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.check_end_names = false;
        config.trim_text(false);
        Self {
            reader,
            buffer: Vec::new(),
        }
    }

    /// Next event, or `None` once the document ends
    pub(crate) fn next(&mut self) -> Result<Option<Event<'_>>, SalesMatrixError> {
        self.buffer.clear();
        let event = self.reader.read_event_into(&mut self.buffer)?;
        Ok((!matches!(event, Event::Eof)).then_some(event))
    }
}

/// Attribute lookup on start tags
pub(crate) trait StartTagExt {
    /// Unescaped value of the attribute with this qualified name
    fn attribute(&self, name: &str) -> Result<Option<Cow<'_, str>>, SalesMatrixError>;

    /// Attribute parsed into `T`. A present value that does not parse is an error.
    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, SalesMatrixError> {
        let Some(value) = self.attribute(name)? else {
            return Ok(None);
        };
        value.parse().map(Some).map_err(|_| {
            XmlError::InvalidAttribute {
                name: name.to_owned(),
                value: value.to_string(),
            }
            .into()
        })
    }
}

impl StartTagExt for BytesStart<'_> {
    fn attribute(&self, name: &str) -> Result<Option<Cow<'_, str>>, SalesMatrixError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }
}

pub(crate) fn append_text(buffer: &mut String, text: &BytesText) -> Result<(), SalesMatrixError> {
    buffer.push_str(&text.xml_content()?);
    Ok(())
}

/// Appends what `&amp;`, `&#10;` or `&#x41;` stands for
pub(crate) fn append_reference(buffer: &mut String, reference: &BytesRef) -> Result<(), SalesMatrixError> {
    let name = reference.xml_content()?;
    match name.strip_prefix('#') {
        Some(code) => buffer.extend(char_reference(code)?),
        None => {
            let entity = resolve_xml_entity(&name).ok_or_else(|| XmlError::UnknownEntity(name.to_string()))?;
            buffer.push_str(entity);
        }
    }
    Ok(())
}

/// Code points outside Unicode yield nothing
fn char_reference(code: &str) -> Result<Option<char>, SalesMatrixError> {
    let value = match code.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16)?,
        None => code.parse::<u32>()?,
    };
    Ok(char::from_u32(value))
}

/// Drives an `XmlReader` to the end of the document, handing each event to
/// the given arms. Events without an arm are skipped; an arm may `break`.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}
