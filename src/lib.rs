pub mod backend;
pub mod config;
pub mod convert;
pub mod docx;
mod error;
pub mod field;
mod fonts;
pub mod geometry;
pub mod group;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod sanitize;
pub mod token;
pub mod widget;

pub use config::{BorderStyle, Config, RadioHandling};
pub use convert::{ConversionReport, convert_document};
pub use error::{Error, FieldError};
pub use pdf::PdfForm;

use std::path::Path;

/// Convert a DOCX held in memory; returns the PDF bytes and what was placed.
pub fn convert_docx_bytes(data: &[u8], config: &Config) -> Result<(Vec<u8>, ConversionReport), Error> {
    let doc = docx::parse_bytes(data)?;
    let mut form = PdfForm::from_document(&doc);
    let report = convert_document(&mut form, config)?;
    Ok((form.finish()?, report))
}

pub fn convert_docx_to_fillable_pdf(
    input: &Path,
    output: &Path,
    config: &Config,
) -> Result<ConversionReport, Error> {
    let doc = docx::parse(input)?;
    let mut form = PdfForm::from_document(&doc);
    let report = convert_document(&mut form, config)?;
    let bytes = form.finish()?;
    std::fs::write(output, bytes).map_err(Error::Io)?;
    Ok(report)
}
