use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::Error;
use crate::model::{Alignment, Block, Document, Paragraph, Run, Table, TableCell};

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const DEFAULT_FONT: &str = "Helvetica";

fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    if val == "auto" || val.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

/// On/off run property (`<w:b/>`, `<w:b w:val="0"/>`).
fn toggle_prop(rpr: Option<roxmltree::Node>, name: &str) -> Option<bool> {
    let node = wml(rpr?, name)?;
    Some(!matches!(node.attribute((WML_NS, "val")), Some("0" | "false" | "off")))
}

struct StyleDefaults {
    font_size: f32,
    font_name: String,
    space_after: f32,
    line_spacing: f32, // multiplier from w:spacing @line / 240
}

struct ParagraphStyle {
    font_size: Option<f32>,
    font_name: Option<String>,
    bold: Option<bool>,
    italic: Option<bool>,
    color: Option<[u8; 3]>,
    space_before: f32,
    space_after: Option<f32>,
    alignment: Option<Alignment>,
}

struct StylesInfo {
    defaults: StyleDefaults,
    paragraph_styles: HashMap<String, ParagraphStyle>,
}

fn parse_alignment(val: &str) -> Alignment {
    match val {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        _ => Alignment::Left,
    }
}

fn read_part<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Option<String> {
    let mut file = zip.by_name(name).ok()?;
    let mut xml_content = String::new();
    file.read_to_string(&mut xml_content).ok()?;
    Some(xml_content)
}

fn font_from_node(rfonts: roxmltree::Node, default_font: &str) -> String {
    rfonts
        .attribute((WML_NS, "ascii"))
        .or_else(|| rfonts.attribute((WML_NS, "hAnsi")))
        .unwrap_or(default_font)
        .to_string()
}

fn parse_styles<R: Read + Seek>(zip: &mut ZipArchive<R>) -> StylesInfo {
    let mut defaults = StyleDefaults {
        font_size: 11.0,
        font_name: DEFAULT_FONT.to_string(),
        space_after: 8.0,
        line_spacing: 1.0,
    };
    let mut paragraph_styles = HashMap::new();

    let Some(xml_content) = read_part(zip, "word/styles.xml") else {
        return StylesInfo { defaults, paragraph_styles };
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        log::warn!("word/styles.xml is not well-formed, using default styles");
        return StylesInfo { defaults, paragraph_styles };
    };

    let root = xml.root_element();

    if let Some(doc_defaults) = wml(root, "docDefaults") {
        if let Some(rpr) = wml(doc_defaults, "rPrDefault").and_then(|n| wml(n, "rPr")) {
            if let Some(sz_val) = wml_attr(rpr, "sz").and_then(|v| v.parse::<f32>().ok()) {
                defaults.font_size = sz_val / 2.0;
            }
            if let Some(rfonts) = wml(rpr, "rFonts") {
                defaults.font_name = font_from_node(rfonts, DEFAULT_FONT);
            }
        }
        let default_spacing = wml(doc_defaults, "pPrDefault")
            .and_then(|n| wml(n, "pPr"))
            .and_then(|n| wml(n, "spacing"));
        if let Some(spacing) = default_spacing {
            if let Some(after_val) = twips_attr(spacing, "after") {
                defaults.space_after = after_val;
            }
            if let Some(line_val) = spacing
                .attribute((WML_NS, "line"))
                .and_then(|v| v.parse::<f32>().ok())
            {
                defaults.line_spacing = line_val / 240.0;
            }
        }
    }

    for style_node in root.children().filter(|n| is_wml(*n, "style")) {
        if style_node.attribute((WML_NS, "type")) != Some("paragraph") {
            continue;
        }
        let Some(style_id) = style_node.attribute((WML_NS, "styleId")) else {
            continue;
        };

        let ppr = wml(style_node, "pPr");
        let spacing = ppr.and_then(|n| wml(n, "spacing"));
        let rpr = wml(style_node, "rPr");

        paragraph_styles.insert(
            style_id.to_string(),
            ParagraphStyle {
                font_size: rpr
                    .and_then(|n| wml_attr(n, "sz"))
                    .and_then(|v| v.parse::<f32>().ok())
                    .map(|hp| hp / 2.0),
                font_name: rpr
                    .and_then(|n| wml(n, "rFonts"))
                    .map(|rfonts| font_from_node(rfonts, &defaults.font_name)),
                bold: toggle_prop(rpr, "b"),
                italic: toggle_prop(rpr, "i"),
                color: rpr.and_then(|n| wml_attr(n, "color")).and_then(parse_hex_color),
                space_before: spacing.and_then(|n| twips_attr(n, "before")).unwrap_or(0.0),
                space_after: spacing.and_then(|n| twips_attr(n, "after")),
                alignment: ppr.and_then(|ppr| wml_attr(ppr, "jc")).map(parse_alignment),
            },
        );
    }

    StylesInfo { defaults, paragraph_styles }
}

/// Text of one `w:r`. Tabs and breaks become spaces so neighbouring words
/// stay separate.
fn run_text(run_node: roxmltree::Node) -> String {
    let mut text = String::new();
    for child in run_node.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or_default()),
            "tab" | "br" | "cr" => text.push(' '),
            "noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    text
}

/// `w:r` elements of a paragraph in document order, including runs wrapped
/// in hyperlinks, smart tags and tracked insertions.
fn paragraph_runs<'a>(node: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut runs = Vec::new();
    for child in node.children() {
        if is_wml(child, "r") {
            runs.push(child);
        } else if ["hyperlink", "smartTag", "ins", "fldSimple"]
            .iter()
            .any(|name| is_wml(child, name))
        {
            runs.extend(paragraph_runs(child));
        }
    }
    runs
}

fn parse_paragraph(node: roxmltree::Node, styles: &StylesInfo) -> Paragraph {
    let ppr = wml(node, "pPr");
    let para_style = ppr
        .and_then(|ppr| wml_attr(ppr, "pStyle"))
        .and_then(|id| styles.paragraph_styles.get(id));

    let inline_spacing = ppr.and_then(|ppr| wml(ppr, "spacing"));

    let space_before = inline_spacing
        .and_then(|n| twips_attr(n, "before"))
        .or_else(|| para_style.map(|s| s.space_before))
        .unwrap_or(0.0);

    let space_after = inline_spacing
        .and_then(|n| twips_attr(n, "after"))
        .or_else(|| para_style.and_then(|s| s.space_after))
        .unwrap_or(styles.defaults.space_after);

    let style_font_size = para_style
        .and_then(|s| s.font_size)
        .unwrap_or(styles.defaults.font_size);

    let style_font_name = para_style
        .and_then(|s| s.font_name.as_deref())
        .unwrap_or(&styles.defaults.font_name)
        .to_string();

    let alignment = ppr
        .and_then(|ppr| wml_attr(ppr, "jc"))
        .map(parse_alignment)
        .or_else(|| para_style.and_then(|s| s.alignment))
        .unwrap_or(Alignment::Left);

    let indent_left = ppr
        .and_then(|ppr| wml(ppr, "ind"))
        .and_then(|ind| twips_attr(ind, "left").or_else(|| twips_attr(ind, "start")))
        .unwrap_or(0.0);

    let mut runs = Vec::new();
    for run_node in paragraph_runs(node) {
        let rpr = wml(run_node, "rPr");

        let text = run_text(run_node);
        if text.is_empty() {
            continue;
        }

        let font_size = rpr
            .and_then(|n| wml_attr(n, "sz"))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|hp| hp / 2.0)
            .unwrap_or(style_font_size);

        let font_name = rpr
            .and_then(|n| wml(n, "rFonts"))
            .map(|rfonts| font_from_node(rfonts, &style_font_name))
            .unwrap_or_else(|| style_font_name.clone());

        let bold = toggle_prop(rpr, "b")
            .or_else(|| para_style.and_then(|s| s.bold))
            .unwrap_or(false);
        let italic = toggle_prop(rpr, "i")
            .or_else(|| para_style.and_then(|s| s.italic))
            .unwrap_or(false);

        let color = rpr
            .and_then(|n| wml_attr(n, "color"))
            .and_then(parse_hex_color)
            .or_else(|| para_style.and_then(|s| s.color));

        runs.push(Run { text, font_size, font_name, bold, italic, color });
    }

    Paragraph { runs, space_before, space_after, alignment, indent_left }
}

fn parse_table(node: roxmltree::Node, styles: &StylesInfo) -> Table {
    let column_widths = wml(node, "tblGrid")
        .map(|grid| {
            grid.children()
                .filter(|n| is_wml(*n, "gridCol"))
                .filter_map(|n| twips_attr(n, "w"))
                .collect()
        })
        .unwrap_or_default();

    let rows = node
        .children()
        .filter(|n| is_wml(*n, "tr"))
        .map(|tr| {
            tr.children()
                .filter(|n| is_wml(*n, "tc"))
                .map(|tc| {
                    let span = wml(tc, "tcPr")
                        .and_then(|pr| wml_attr(pr, "gridSpan"))
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(1)
                        .max(1);
                    let paragraphs = tc
                        .children()
                        .filter(|n| is_wml(*n, "p"))
                        .map(|p| parse_paragraph(p, styles))
                        .collect();
                    TableCell { paragraphs, span }
                })
                .collect()
        })
        .collect();

    Table { column_widths, rows }
}

pub fn parse(path: &Path) -> Result<Document, Error> {
    let file = std::fs::File::open(path)?;
    parse_archive(ZipArchive::new(file)?)
}

/// Parse a DOCX held in memory.
pub fn parse_bytes(data: &[u8]) -> Result<Document, Error> {
    parse_archive(ZipArchive::new(Cursor::new(data))?)
}

fn parse_archive<R: Read + Seek>(mut zip: ZipArchive<R>) -> Result<Document, Error> {
    let styles = parse_styles(&mut zip);

    let xml_content = read_part(&mut zip, "word/document.xml")
        .ok_or_else(|| Error::InvalidDocx("missing word/document.xml".into()))?;

    let xml = roxmltree::Document::parse(&xml_content)?;
    let root = xml.root_element();

    let body = wml(root, "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;

    let sect = wml(body, "sectPr");
    let pg_sz = sect.and_then(|s| wml(s, "pgSz"));
    let pg_mar = sect.and_then(|s| wml(s, "pgMar"));

    let page_width = pg_sz.and_then(|n| twips_attr(n, "w")).unwrap_or(612.0);
    let page_height = pg_sz.and_then(|n| twips_attr(n, "h")).unwrap_or(792.0);
    let margin_top = pg_mar.and_then(|n| twips_attr(n, "top")).unwrap_or(72.0);
    let margin_bottom = pg_mar.and_then(|n| twips_attr(n, "bottom")).unwrap_or(72.0);
    let margin_left = pg_mar.and_then(|n| twips_attr(n, "left")).unwrap_or(72.0);
    let margin_right = pg_mar.and_then(|n| twips_attr(n, "right")).unwrap_or(72.0);

    let mut blocks = Vec::new();
    for node in body.children() {
        if is_wml(node, "p") {
            blocks.push(Block::Paragraph(parse_paragraph(node, &styles)));
        } else if is_wml(node, "tbl") {
            blocks.push(Block::Table(parse_table(node, &styles)));
        }
    }
    log::debug!("parsed {} block(s), page {page_width}x{page_height}", blocks.len());

    Ok(Document {
        page_width,
        page_height,
        margin_top,
        margin_bottom,
        margin_left,
        margin_right,
        line_spacing: styles.defaults.line_spacing,
        blocks,
    })
}
