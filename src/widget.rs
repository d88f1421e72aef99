//! Field specification + placement -> backend widget descriptor.

use crate::backend::WidgetHandle;
use crate::config::{BorderStyle, Config};
use crate::field::{FieldKind, FieldSpec, OptionKey, WidgetCategory};
use crate::geometry::{PlacementRegion, TextStyle};
use crate::group::GroupRegistry;
use crate::model::Rect;

/// Single-line text fields are this many font sizes tall.
const SINGLE_LINE_HEIGHT: f32 = 1.5;
/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.55;
const LINE_ADVANCE: f32 = 1.3;

#[derive(Clone, Debug, PartialEq)]
pub struct WidgetDescriptor {
    pub name: String,
    pub rect: Rect,
    pub required: bool,
    pub readonly: bool,
    pub tooltip: Option<String>,
    pub border: BorderStyle,
    pub kind: WidgetKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WidgetKind {
    Text(TextWidget),
    Choice(ChoiceWidget),
    Button(ButtonWidget),
    Signature(SignatureWidget),
    Radio(RadioWidget),
    Checkbox(CheckboxWidget),
}

/// JavaScript hooks of a text field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scripts {
    pub keystroke: Option<String>,
    pub format: Option<String>,
    pub validate: Option<String>,
    pub calculate: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextWidget {
    pub style: TextStyle,
    pub multiline: bool,
    pub rich_text: bool,
    pub password: bool,
    pub hidden: bool,
    pub do_not_scroll: bool,
    pub max_len: Option<u32>,
    pub value: Option<String>,
    pub scripts: Scripts,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceWidget {
    pub style: TextStyle,
    /// Drop-down (combo box) rather than list box.
    pub combo: bool,
    pub multi_select: bool,
    pub options: Vec<String>,
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ButtonAction {
    Push,
    Submit { url: Option<String> },
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ButtonWidget {
    pub action: ButtonAction,
    pub caption: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignatureWidget {
    pub digital: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckboxWidget {
    pub export_value: String,
    pub checked: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RadioWidget {
    pub group: String,
    pub export_value: String,
    pub parent: Option<WidgetHandle>,
    pub selected: bool,
}

impl WidgetDescriptor {
    pub fn is_radio(&self) -> bool {
        matches!(self.kind, WidgetKind::Radio(_))
    }

    /// Same widget re-issued as a checkbox with the radio's export value.
    /// `None` for anything but a radio.
    pub fn radio_as_checkbox(&self) -> Option<WidgetDescriptor> {
        let WidgetKind::Radio(radio) = &self.kind else {
            return None;
        };
        Some(WidgetDescriptor {
            kind: WidgetKind::Checkbox(CheckboxWidget {
                export_value: radio.export_value.clone(),
                checked: radio.selected,
            }),
            ..self.clone()
        })
    }
}

/// Alphanumeric, capitalised export token; `Yes` when nothing usable is left.
pub fn normalize_export_value(value: Option<&str>) -> String {
    let cleaned: String = value
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => "Yes".to_string(),
    }
}

/// Largest square centred in `rect`.
pub fn center_square(rect: Rect) -> Rect {
    let side = rect.width().min(rect.height());
    let cx = rect.x0 + rect.width() / 2.0;
    let cy = rect.y0 + rect.height() / 2.0;
    let half = side / 2.0;
    Rect::new(cx - half, cy - half, cx + half, cy + half)
}

/// Character capacity of a text field of this size.
pub fn estimate_max_length(rect: Rect, font_size: f32, multiline: bool) -> Option<u32> {
    if font_size <= 0.0 || rect.width() <= 0.0 {
        return None;
    }
    let usable_width = (rect.width() - 2.0).max(font_size);
    let mut chars = ((usable_width / (font_size * GLYPH_ADVANCE)) as u32).max(1);
    if multiline {
        let lines = ((rect.height() / (font_size * LINE_ADVANCE)) as u32).max(1);
        chars *= lines;
    }
    Some(chars)
}

/// Keystroke script rejecting input beyond `limit` chars. Several viewers
/// ignore `/MaxLen`, multiline fields in particular.
pub fn length_guard(limit: u32) -> String {
    format!(
        "if (!event.willCommit) {{
    var selection = event.selEnd - event.selStart;
    var replacement = event.change ? event.change.length : 0;
    var projected = event.value.length - selection + replacement;
    if (projected > {limit}) {{
        event.rc = false;
    }}
}}"
    )
}

const DATE_FORMAT: (&str, &str) = (
    "AFDate_FormatEx(\"yyyy-mm-dd\");",
    "AFDate_KeystrokeEx(\"yyyy-mm-dd\");",
);
const TIME_FORMAT: (&str, &str) = ("AFTime_FormatEx(\"HH:MM\");", "AFTime_KeystrokeEx(\"HH:MM\");");
const DATETIME_FORMAT: (&str, &str) = (
    "AFDate_FormatEx(\"yyyy-mm-dd HH:MM\");",
    "AFDate_KeystrokeEx(\"yyyy-mm-dd HH:MM\");",
);
const NUMBER_FORMAT: (&str, &str) = (
    "AFNumber_Format(0, 0, 0, 0, \"\", false);",
    "AFNumber_Keystroke(0, 0, 0, 0, \"\", false);",
);
const DECIMAL_FORMAT: (&str, &str) = (
    "AFNumber_Format(2, 0, 0, 0, \"\", false);",
    "AFNumber_Keystroke(2, 0, 0, 0, \"\", false);",
);
const CURRENCY_FORMAT: (&str, &str) = (
    "AFNumber_Format(2, 0, 0, 0, \"$\", false);",
    "AFNumber_Keystroke(2, 0, 0, 0, \"$\", false);",
);
const PERCENT_FORMAT: (&str, &str) = (
    "AFPercent_Format(2, 0, 0, 0, \"\", false);",
    "AFPercent_Keystroke(2, 0, 0, 0, \"\", false);",
);
const EMAIL_CHECK: &str = "event.rc = /^\\S+@\\S+\\.\\S+$/.test(event.value) || event.value == \"\";";
const PHONE_CHECK: &str =
    "event.rc = /^\\d{10}$/.test(event.value.replace(/\\D/g, \"\")) || event.value == \"\";";

/// Format/keystroke/validate scripts implied by a `format:` option or, when
/// there is none, by the field kind.
fn kind_scripts(spec: &FieldSpec) -> Scripts {
    let pair = |(format, keystroke): (&str, &str)| Scripts {
        format: Some(format.to_string()),
        keystroke: Some(keystroke.to_string()),
        ..Scripts::default()
    };
    let check = |script: &str| Scripts {
        validate: Some(script.to_string()),
        ..Scripts::default()
    };

    if let Some(format) = spec.option(&OptionKey::Format) {
        return match format.to_lowercase().as_str() {
            "date" => pair(DATE_FORMAT),
            "time" => pair(TIME_FORMAT),
            "datetime" => pair(DATETIME_FORMAT),
            "number" | "numeric" => pair(NUMBER_FORMAT),
            "decimal" => pair(DECIMAL_FORMAT),
            "currency" => pair(CURRENCY_FORMAT),
            "percent" => pair(PERCENT_FORMAT),
            "email" => check(EMAIL_CHECK),
            "phone" => check(PHONE_CHECK),
            other => {
                log::warn!("field '{}': unknown format '{other}'", spec.name);
                Scripts::default()
            }
        };
    }
    match spec.kind {
        FieldKind::Date => pair(DATE_FORMAT),
        FieldKind::Time => pair(TIME_FORMAT),
        FieldKind::DateTime => pair(DATETIME_FORMAT),
        FieldKind::Numeric => pair(NUMBER_FORMAT),
        FieldKind::Decimal => pair(DECIMAL_FORMAT),
        FieldKind::Currency => pair(CURRENCY_FORMAT),
        FieldKind::Percent => pair(PERCENT_FORMAT),
        FieldKind::Email => check(EMAIL_CHECK),
        FieldKind::Phone => check(PHONE_CHECK),
        _ => Scripts::default(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_dimension(spec: &FieldSpec, keys: &[OptionKey]) -> Option<f32> {
    keys.iter().find_map(|key| {
        let raw = spec.option(key)?;
        match raw.parse::<f32>() {
            Ok(v) if v > 0.0 => Some(v),
            _ => {
                log::warn!("field '{}': ignoring {key} '{raw}'", spec.name);
                None
            }
        }
    })
}

/// Explicit size options, else the table cell's size for fields placed in
/// a cell. Toggles keep their square unless sized explicitly.
fn dimension_override(spec: &FieldSpec, region: &PlacementRegion, rect: Rect) -> Rect {
    let width = parse_dimension(
        spec,
        &[OptionKey::CellWidth, OptionKey::ColumnWidth, OptionKey::Width],
    );
    let height = parse_dimension(spec, &[OptionKey::RowHeight, OptionKey::Height]);
    let explicit = spec.options.keys().any(OptionKey::is_dimension);

    if explicit {
        let sized = rect.with_size(width.unwrap_or(rect.width()), height.unwrap_or(rect.height()));
        log::debug!("field '{}': size override {rect:?} -> {sized:?}", spec.name);
        return sized;
    }
    let toggle = matches!(spec.kind, FieldKind::Checkbox | FieldKind::Radio);
    if region.is_table_cell && !toggle {
        let cell = region.placement_rect;
        return rect.with_size(cell.width(), cell.height());
    }
    rect
}

fn text_widget(spec: &FieldSpec, style: &TextStyle, rect: &mut Rect, region: &PlacementRegion) -> TextWidget {
    let multiline = matches!(spec.kind, FieldKind::MultilineText | FieldKind::RichText);
    if !multiline {
        rect.y1 = rect.y0 + style.font_size * SINGLE_LINE_HEIGHT;
    }
    *rect = dimension_override(spec, region, *rect);

    let max_len = match spec.option(&OptionKey::Other("maxlen".into())) {
        Some(raw) => raw.parse::<u32>().ok().filter(|n| *n > 0).or_else(|| {
            log::warn!("field '{}': ignoring maxlen '{raw}'", spec.name);
            estimate_max_length(*rect, style.font_size, multiline)
        }),
        None => estimate_max_length(*rect, style.font_size, multiline),
    };

    let mut value = non_empty(spec.option(&OptionKey::Default));
    if spec.kind == FieldKind::Barcode
        && let Some(data) = non_empty(spec.option(&OptionKey::Data))
    {
        value = Some(data);
    }

    let mut scripts = kind_scripts(spec);
    if let Some(calculation) = non_empty(spec.option(&OptionKey::Calculation)) {
        scripts.calculate = Some(calculation);
    }
    if let Some(validation) = non_empty(spec.option(&OptionKey::Validation)) {
        scripts.validate = Some(match scripts.validate.take() {
            Some(kind_check) => format!("{kind_check}\n{validation}"),
            None => validation,
        });
    }
    if let Some(limit) = max_len {
        let guard = length_guard(limit);
        scripts.keystroke = Some(match scripts.keystroke.take() {
            Some(existing) => format!("{existing}\n{guard}"),
            None => guard,
        });
    }

    TextWidget {
        style: style.clone(),
        multiline,
        rich_text: spec.kind == FieldKind::RichText,
        password: spec.kind == FieldKind::Password,
        hidden: spec.kind == FieldKind::Hidden,
        do_not_scroll: true,
        max_len,
        value,
        scripts,
    }
}

fn choice_widget(spec: &FieldSpec, style: &TextStyle) -> ChoiceWidget {
    let options: Vec<String> = spec
        .option(&OptionKey::Options)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let value = non_empty(spec.option(&OptionKey::Default)).or_else(|| options.first().cloned());
    ChoiceWidget {
        style: style.clone(),
        combo: spec.kind == FieldKind::Combobox,
        multi_select: spec.kind == FieldKind::Listbox && spec.has_option(&OptionKey::Multi),
        options,
        value,
    }
}

fn button_widget(spec: &FieldSpec) -> ButtonWidget {
    let (action, default_caption) = match spec.kind {
        FieldKind::SubmitButton => (
            ButtonAction::Submit { url: non_empty(spec.option(&OptionKey::Url)) },
            Some("Submit"),
        ),
        FieldKind::ResetButton => (ButtonAction::Reset, Some("Reset")),
        FieldKind::ImageButton => (ButtonAction::Push, None),
        _ => (ButtonAction::Push, Some("Button")),
    };
    let caption = non_empty(spec.option(&OptionKey::Label))
        .or_else(|| default_caption.map(str::to_string));
    ButtonWidget { action, caption }
}

/// `checked` present with anything but an explicit false value.
fn checked(spec: &FieldSpec) -> bool {
    spec.option(&OptionKey::Checked).is_some_and(|v| {
        !matches!(v.to_lowercase().as_str(), "false" | "no" | "0" | "off")
    })
}

fn toggled(spec: &FieldSpec) -> bool {
    checked(spec) || spec.has_option(&OptionKey::Default)
}

/// Build the descriptor for one field. `spec.name` must already be the
/// document-unique name.
pub fn synthesize(
    spec: &FieldSpec,
    region: &PlacementRegion,
    style: &TextStyle,
    config: &Config,
    groups: &GroupRegistry,
) -> WidgetDescriptor {
    let mut rect = region.placement_rect;
    let mut readonly = spec.readonly;
    let mut tooltip = non_empty(spec.option(&OptionKey::Tooltip));

    let kind = match (spec.category(), &spec.kind) {
        (WidgetCategory::Button, FieldKind::Checkbox) => {
            rect = dimension_override(spec, region, center_square(rect));
            WidgetKind::Checkbox(CheckboxWidget {
                export_value: normalize_export_value(spec.value_or_default()),
                checked: toggled(spec),
            })
        }
        (WidgetCategory::Button, FieldKind::Radio) => {
            rect = dimension_override(spec, region, center_square(rect));
            let requested =
                normalize_export_value(spec.value_or_default().or(Some(spec.name.as_str())));
            WidgetKind::Radio(RadioWidget {
                group: spec.name.clone(),
                export_value: groups.unique_export_value(&spec.name, &requested),
                parent: groups.parent(&spec.name),
                selected: checked(spec),
            })
        }
        (WidgetCategory::Button, _) => {
            rect = dimension_override(spec, region, rect);
            WidgetKind::Button(button_widget(spec))
        }
        (WidgetCategory::Choice, _) => {
            rect = dimension_override(spec, region, rect);
            WidgetKind::Choice(choice_widget(spec, style))
        }
        (WidgetCategory::Signature, _) => {
            rect = dimension_override(spec, region, rect);
            if readonly {
                log::debug!("signature '{}': readonly dropped", spec.name);
                readonly = false;
            }
            tooltip.get_or_insert_with(|| "Sign here".to_string());
            WidgetKind::Signature(SignatureWidget { digital: true })
        }
        (WidgetCategory::Text, _) => WidgetKind::Text(text_widget(spec, style, &mut rect, region)),
    };

    WidgetDescriptor {
        name: spec.name.clone(),
        rect,
        required: spec.required,
        readonly,
        tooltip,
        border: config.border(spec.required),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_values_are_capitalised_tokens() {
        assert_eq!(normalize_export_value(Some("male")), "Male");
        assert_eq!(normalize_export_value(Some("opt 1!")), "Opt1");
        assert_eq!(normalize_export_value(Some("--")), "Yes");
        assert_eq!(normalize_export_value(None), "Yes");
    }

    #[test]
    fn max_length_from_geometry() {
        let rect = Rect::new(0.0, 0.0, 70.0, 18.0);
        // (70 - 2) / (12 * 0.55) = 10.3
        assert_eq!(estimate_max_length(rect, 12.0, false), Some(10));
        let tall = Rect::new(0.0, 0.0, 70.0, 40.0);
        // two lines of 10
        assert_eq!(estimate_max_length(tall, 12.0, true), Some(20));
        assert_eq!(estimate_max_length(rect, 0.0, false), None);
    }

    #[test]
    fn center_square_fits_inside() {
        let sq = center_square(Rect::new(0.0, 0.0, 40.0, 10.0));
        assert_eq!(sq, Rect::new(15.0, 0.0, 25.0, 10.0));
    }
}
