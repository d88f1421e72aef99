use std::collections::BTreeMap;
use std::fmt;

use crate::error::FieldError;
use crate::token::{self, DEFAULT_FUZZY_THRESHOLD};

/// Every placeholder keyword the converter understands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    MultilineText,
    RichText,
    Password,
    Hidden,
    ReadonlyText,
    RequiredText,
    Numeric,
    Decimal,
    Currency,
    Percent,
    Date,
    Time,
    DateTime,
    Email,
    Phone,
    Calculated,
    Validated,
    Barcode,
    Checkbox,
    Radio,
    Combobox,
    Listbox,
    PushButton,
    SubmitButton,
    ResetButton,
    ImageButton,
    Signature,
    /// Keyword not in the table; rendered as a plain text field.
    Other(String),
}

/// Structural widget categories the kinds collapse onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetCategory {
    Text,
    Choice,
    Button,
    Signature,
}

/// keyword -> kind. The boolean marks keywords that anchor placeholder
/// detection in page text; `date` is too common in running text to anchor.
static KINDS: &[(&str, FieldKind, bool)] = &[
    ("textfield", FieldKind::Text, true),
    ("textbox", FieldKind::Text, true),
    ("multilinetextfield", FieldKind::MultilineText, true),
    ("passwordfield", FieldKind::Password, true),
    ("numericfield", FieldKind::Numeric, true),
    ("numberfield", FieldKind::Numeric, true),
    ("decimalfield", FieldKind::Decimal, true),
    ("currencyfield", FieldKind::Currency, true),
    ("percentfield", FieldKind::Percent, true),
    ("datefield", FieldKind::Date, true),
    ("timefield", FieldKind::Time, true),
    ("datetimefield", FieldKind::DateTime, true),
    ("emailfield", FieldKind::Email, true),
    ("phonefield", FieldKind::Phone, true),
    ("richtextfield", FieldKind::RichText, true),
    ("calculatedfield", FieldKind::Calculated, true),
    ("validationfield", FieldKind::Validated, true),
    ("hiddenfield", FieldKind::Hidden, true),
    ("readonlyfield", FieldKind::ReadonlyText, true),
    ("requiredfieldattribute", FieldKind::RequiredText, true),
    ("tooltipfieldattribute", FieldKind::Text, true),
    ("checkbox", FieldKind::Checkbox, true),
    ("radiobutton", FieldKind::Radio, true),
    ("combobox", FieldKind::Combobox, true),
    ("dropdownlist", FieldKind::Combobox, true),
    ("listbox", FieldKind::Listbox, true),
    ("pushbutton", FieldKind::PushButton, true),
    ("submitbutton", FieldKind::SubmitButton, true),
    ("resetbutton", FieldKind::ResetButton, true),
    ("imagebutton", FieldKind::ImageButton, true),
    ("imagefield", FieldKind::ImageButton, true),
    ("fileattachmentfield", FieldKind::ImageButton, true),
    ("signaturefield", FieldKind::Signature, true),
    ("digitalsignaturefield", FieldKind::Signature, true),
    ("barcodefield", FieldKind::Barcode, true),
    ("qrcodefield", FieldKind::Barcode, true),
    ("pdf417field", FieldKind::Barcode, true),
    ("code128field", FieldKind::Barcode, true),
    ("annotationwidget", FieldKind::Text, true),
    ("freetextannotation", FieldKind::Text, true),
    ("subformfield", FieldKind::Text, true),
    ("drawfield", FieldKind::Text, true),
    ("numericupdownfield", FieldKind::Numeric, true),
    ("validationgroup", FieldKind::Text, true),
    ("date", FieldKind::Date, false),
];

impl FieldKind {
    /// Case-insensitive keyword lookup; unknown keywords fall back to text.
    pub fn from_keyword(keyword: &str) -> FieldKind {
        let lower = keyword.to_lowercase();
        KINDS
            .iter()
            .find(|(name, _, _)| *name == lower)
            .map(|(_, kind, _)| kind.clone())
            .unwrap_or(FieldKind::Other(lower))
    }

    pub fn category(&self) -> WidgetCategory {
        match self {
            FieldKind::Combobox | FieldKind::Listbox => WidgetCategory::Choice,
            FieldKind::Checkbox
            | FieldKind::Radio
            | FieldKind::PushButton
            | FieldKind::SubmitButton
            | FieldKind::ResetButton
            | FieldKind::ImageButton => WidgetCategory::Button,
            FieldKind::Signature => WidgetCategory::Signature,
            _ => WidgetCategory::Text,
        }
    }
}

/// Keywords that may start a placeholder in page text.
pub fn anchor_keywords() -> impl Iterator<Item = &'static str> {
    KINDS.iter().filter(|(_, _, anchor)| *anchor).map(|(name, _, _)| *name)
}

/// Recognised option keys, in the order fuzzy matching prefers them on ties.
pub const OPTION_KEYWORDS: [&str; 19] = [
    "value",
    "default",
    "options",
    "format",
    "tooltip",
    "width",
    "height",
    "rowheight",
    "cellwidth",
    "columnwidth",
    "label",
    "url",
    "data",
    "calculation",
    "validation",
    "multi",
    "checked",
    "required",
    "readonly",
];

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    Value,
    Default,
    Options,
    Format,
    Tooltip,
    Width,
    Height,
    RowHeight,
    CellWidth,
    ColumnWidth,
    Label,
    Url,
    Data,
    Calculation,
    Validation,
    Multi,
    Checked,
    Required,
    Readonly,
    /// Unrecognised key, kept lower-cased for forward compatibility.
    Other(String),
}

enum ValueClass {
    Numeric,
    Text,
    Script,
    Compact,
}

impl OptionKey {
    /// Maps an already normalized (lower-case) key.
    pub fn from_normalized(key: &str) -> OptionKey {
        match key {
            "value" => OptionKey::Value,
            "default" => OptionKey::Default,
            "options" => OptionKey::Options,
            "format" => OptionKey::Format,
            "tooltip" => OptionKey::Tooltip,
            "width" => OptionKey::Width,
            "height" => OptionKey::Height,
            "rowheight" => OptionKey::RowHeight,
            "cellwidth" => OptionKey::CellWidth,
            "columnwidth" => OptionKey::ColumnWidth,
            "label" => OptionKey::Label,
            "url" => OptionKey::Url,
            "data" => OptionKey::Data,
            "calculation" => OptionKey::Calculation,
            "validation" => OptionKey::Validation,
            "multi" => OptionKey::Multi,
            "checked" => OptionKey::Checked,
            "required" => OptionKey::Required,
            "readonly" => OptionKey::Readonly,
            other => OptionKey::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OptionKey::Value => "value",
            OptionKey::Default => "default",
            OptionKey::Options => "options",
            OptionKey::Format => "format",
            OptionKey::Tooltip => "tooltip",
            OptionKey::Width => "width",
            OptionKey::Height => "height",
            OptionKey::RowHeight => "rowheight",
            OptionKey::CellWidth => "cellwidth",
            OptionKey::ColumnWidth => "columnwidth",
            OptionKey::Label => "label",
            OptionKey::Url => "url",
            OptionKey::Data => "data",
            OptionKey::Calculation => "calculation",
            OptionKey::Validation => "validation",
            OptionKey::Multi => "multi",
            OptionKey::Checked => "checked",
            OptionKey::Required => "required",
            OptionKey::Readonly => "readonly",
            OptionKey::Other(key) => key,
        }
    }

    pub fn is_dimension(&self) -> bool {
        matches!(
            self,
            OptionKey::Width
                | OptionKey::Height
                | OptionKey::RowHeight
                | OptionKey::CellWidth
                | OptionKey::ColumnWidth
        )
    }

    fn value_class(&self) -> ValueClass {
        match self {
            k if k.is_dimension() => ValueClass::Numeric,
            OptionKey::Value
            | OptionKey::Default
            | OptionKey::Label
            | OptionKey::Tooltip
            | OptionKey::Data
            | OptionKey::Url => ValueClass::Text,
            OptionKey::Calculation | OptionKey::Validation => ValueClass::Script,
            _ => ValueClass::Compact,
        }
    }

    fn clean_value(&self, raw: &str) -> String {
        match self.value_class() {
            ValueClass::Numeric => raw
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect(),
            ValueClass::Text => {
                let trimmed = raw.trim().trim_matches(|c| matches!(c, ')' | '}' | ']'));
                trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
            }
            ValueClass::Script => raw.to_string(),
            ValueClass::Compact => raw
                .trim_matches(|c| matches!(c, ')' | '}' | ']'))
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured form of one placeholder.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    /// Lower-cased keyword as written in the document.
    pub keyword: String,
    pub name: String,
    pub required: bool,
    pub readonly: bool,
    pub options: BTreeMap<OptionKey, String>,
}

impl FieldSpec {
    pub fn option(&self, key: &OptionKey) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn has_option(&self, key: &OptionKey) -> bool {
        self.options.contains_key(key)
    }

    /// `value`, then `default`, ignoring empty strings.
    pub fn value_or_default(&self) -> Option<&str> {
        self.option(&OptionKey::Value)
            .filter(|v| !v.is_empty())
            .or_else(|| self.option(&OptionKey::Default).filter(|v| !v.is_empty()))
    }

    pub fn category(&self) -> WidgetCategory {
        self.kind.category()
    }

    fn set_flag(&mut self, flag: &OptionKey) {
        match flag {
            OptionKey::Required => self.required = true,
            OptionKey::Readonly => self.readonly = true,
            _ => {}
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// A bare flag with label text glued on after whitespace was stripped,
/// e.g. `requiredGender` from `required  Gender:`.
fn glued_flag(key: &str) -> Option<OptionKey> {
    ["required", "readonly"]
        .into_iter()
        .find(|flag| key.len() > flag.len() && key.starts_with(flag))
        .map(OptionKey::from_normalized)
}

fn flag_value(raw: &str) -> bool {
    !matches!(raw.trim().to_lowercase().as_str(), "false" | "no" | "0" | "off")
}

/// Parse a placeholder such as `textbox:firstname|required|tooltip:First`.
/// The token is repaired first, so mangled separators are tolerated.
pub fn parse_placeholder(token: &str) -> Result<FieldSpec, FieldError> {
    parse_placeholder_with(token, DEFAULT_FUZZY_THRESHOLD)
}

pub fn parse_placeholder_with(token: &str, threshold: f64) -> Result<FieldSpec, FieldError> {
    let repaired = token::normalize_placeholder_token(token);
    let malformed = || FieldError::MalformedToken { raw: token.to_string() };

    let (keyword, rest) = repaired.split_once(':').ok_or_else(malformed)?;
    let keyword = keyword.to_lowercase();
    if keyword.is_empty() {
        return Err(malformed());
    }

    let name_len = rest.chars().take_while(|c| is_name_char(*c)).count();
    if name_len == 0 {
        return Err(malformed());
    }
    // Name chars are ASCII, so char count == byte count here.
    let (name, tail) = rest.split_at(name_len);

    let kind = FieldKind::from_keyword(&keyword);
    let mut spec = FieldSpec {
        required: kind == FieldKind::RequiredText,
        readonly: kind == FieldKind::ReadonlyText,
        kind,
        keyword,
        name: name.to_string(),
        options: BTreeMap::new(),
    };

    let subparts = tail
        .split('|')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty());

    for sub in subparts {
        match sub.split_once(':') {
            Some((raw_key, raw_value)) => {
                let raw_key = raw_key.trim().trim_matches(|c| matches!(c, ')' | '}' | ']'));
                let Some(key) = token::normalize_option_key_with(raw_key, threshold) else {
                    continue;
                };
                let key = OptionKey::from_normalized(&key);
                if let OptionKey::Other(other) = &key
                    && let Some(flag) = glued_flag(other)
                {
                    log::debug!("field '{}': flag '{flag}' read from '{sub}'", spec.name);
                    spec.set_flag(&flag);
                    continue;
                }
                match key {
                    OptionKey::Required => spec.required = flag_value(raw_value),
                    OptionKey::Readonly => spec.readonly = flag_value(raw_value),
                    key => {
                        let value = key.clean_value(raw_value);
                        spec.options.insert(key, value);
                    }
                }
            }
            None => {
                let bare = sub.trim_matches(|c| matches!(c, ')' | '}' | ']'));
                let Some(key) = token::normalize_option_key_with(bare, threshold) else {
                    continue;
                };
                match OptionKey::from_normalized(&key) {
                    OptionKey::Required => spec.required = true,
                    OptionKey::Readonly => spec.readonly = true,
                    OptionKey::Other(other) => match glued_flag(&other) {
                        Some(flag) => {
                            log::debug!("field '{}': flag '{flag}' read from '{sub}'", spec.name);
                            spec.set_flag(&flag);
                        }
                        None => log::debug!("ignoring unknown flag '{other}' on field '{}'", spec.name),
                    },
                    key => {
                        spec.options.insert(key, String::new());
                    }
                }
            }
        }
    }

    Ok(spec)
}
