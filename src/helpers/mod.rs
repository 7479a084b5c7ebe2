//! Low-level helpers shared by the workbook reader and the delimited loader.

pub(crate) mod encoding;
pub(crate) mod xml;
pub(crate) mod zip;
