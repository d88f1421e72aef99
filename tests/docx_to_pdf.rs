use std::io::{Cursor, Write};

use docxside_forms::convert::PlacedKind;
use docxside_forms::model::Block;
use docxside_forms::{Config, Error, PdfForm, convert_docx_bytes, convert_document, docx, layout};
use zip::write::SimpleFileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

fn cell(width_twips: u32, text: &str) -> String {
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{width_twips}" w:type="dxa"/></w:tcPr>{}</w:tc>"#,
        paragraph(text)
    )
}

fn build_docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440"/></w:sectPr></w:body></w:document>"#
    );
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{W_NS}"><w:docDefaults><w:rPrDefault><w:rPr><w:sz w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259"/></w:pPr></w:pPrDefault></w:docDefaults></w:styles>"#
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.start_file("word/styles.xml", options).unwrap();
    zip.write_all(styles.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

fn form_body() -> String {
    let mut body = String::new();
    body.push_str(&paragraph("Application"));
    body.push_str(&paragraph("Name: {{textbox:fullname|required}}"));
    body.push_str(
        r#"<w:p><w:r><w:t xml:space="preserve">Gender: {{radio</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>button:gender|value:Male}}</w:t></w:r><w:r><w:t xml:space="preserve"> Male {{radiobutton:gender|value:Female}} Female</w:t></w:r></w:p>"#,
    );
    body.push_str(r#"<w:tbl><w:tblGrid><w:gridCol w:w="3000"/><w:gridCol w:w="6000"/></w:tblGrid>"#);
    body.push_str(&format!(
        "<w:tr>{}{}</w:tr>",
        cell(3000, "Country"),
        cell(6000, "{{combobox:country|options:Norway,Sweden|default:Sweden}}")
    ));
    body.push_str(&format!(
        "<w:tr>{}{}</w:tr>",
        cell(3000, "Email"),
        cell(6000, "{{emailfield:email}}")
    ));
    body.push_str("</w:tbl>");
    body.push_str(&paragraph("{{checkbox:agree|checked}} I agree"));
    body.push_str(&paragraph("{{signaturefield:signature}}"));
    body
}

#[test]
fn docx_reader_keeps_tables_and_run_styles() {
    let doc = docx::parse_bytes(&build_docx(&form_body())).unwrap();
    assert_eq!(doc.page_width, 612.0);
    assert_eq!(doc.margin_left, 72.0);

    let tables: Vec<_> = doc
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
        .collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].column_widths, [150.0, 300.0]);
    assert_eq!(tables[0].rows.len(), 2);

    let Block::Paragraph(gender) = &doc.blocks[2] else {
        panic!("expected a paragraph");
    };
    assert_eq!(gender.runs.len(), 3);
    assert!(gender.runs[1].bold);
    assert_eq!(gender.runs[0].font_size, 11.0);
}

#[test]
fn layout_records_table_cells() {
    let doc = docx::parse_bytes(&build_docx(&form_body())).unwrap();
    let pages = layout::layout(&doc);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].table_cells.len(), 4);
    let first = pages[0].table_cells[0];
    assert_eq!(first.x0, 72.0);
    assert_eq!(first.width(), 150.0);

    // A placeholder split over two runs stays as two adjacent spans.
    let spans = &pages[0].spans;
    let start = spans.iter().position(|s| s.text == "{{radio").unwrap();
    assert_eq!(spans[start + 1].text, "button:gender|value:Male}}");
    assert_eq!(spans[start].rect.x1, spans[start + 1].rect.x0);
}

#[test]
fn converts_docx_to_fillable_pdf() {
    let (bytes, report) = convert_docx_bytes(&build_docx(&form_body()), &Config::default()).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);

    let kinds: Vec<(&str, PlacedKind)> = report.fields.iter().map(|f| (f.name.as_str(), f.kind)).collect();
    assert_eq!(
        kinds,
        [
            ("fullname", PlacedKind::Text),
            ("gender", PlacedKind::Radio),
            ("gender", PlacedKind::Radio),
            ("country", PlacedKind::Choice),
            ("email", PlacedKind::Text),
            ("agree", PlacedKind::Checkbox),
            ("signature", PlacedKind::Signature),
        ]
    );

    let pdf = String::from_utf8_lossy(&bytes);
    assert!(pdf.contains("/NeedAppearances true"));
    assert!(pdf.contains("/SigFlags 1"));
    assert!(pdf.contains("/FT /Ch"));
    assert!(pdf.contains("(Sweden)"));
    assert!(pdf.contains("/JavaScript"));
    // Placeholder text is gone from the page content.
    assert!(!pdf.contains("textbox:fullname"));
    assert!(pdf.contains("(Application)"));
}

#[test]
fn converting_in_place_adds_one_widget_per_field() {
    let doc = docx::parse_bytes(&build_docx(&form_body())).unwrap();
    let mut form = PdfForm::from_document(&doc);
    let report = convert_document(&mut form, &Config::default()).unwrap();
    assert_eq!(form.widget_count(), report.fields.len());
    assert_eq!(form.widget_count(), 7);

    // Placeholder glyphs are gone, the labels around them stay.
    let texts: Vec<&str> = form.pages()[0].spans.iter().map(|s| s.text.as_str()).collect();
    assert!(texts.contains(&"Name:"));
    assert!(texts.contains(&"Country"));
    assert!(texts.iter().all(|t| !t.contains("{{")));
    assert!(!form.finish().unwrap().is_empty());
}

#[test]
fn rejects_non_docx_input() {
    match convert_docx_bytes(b"not a zip archive", &Config::default()) {
        Err(Error::Zip(_)) => {}
        other => panic!("expected a zip error, got {other:?}"),
    }

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("hello.txt", SimpleFileOptions::default()).unwrap();
    zip.write_all(b"hi").unwrap();
    let bytes = zip.finish().unwrap().into_inner();
    match convert_docx_bytes(&bytes, &Config::default()) {
        Err(Error::InvalidDocx(_)) => {}
        other => panic!("expected an invalid-docx error, got {other:?}"),
    }
}
