use std::collections::HashMap;

use docxside_forms::backend::{
    BackendError, FormBackend, PageSource, TableDetector, ToggleHandle, WidgetHandle,
};
use docxside_forms::convert::PlacedKind;
use docxside_forms::model::{FontFace, Page, Rect, TextSpan};
use docxside_forms::widget::{WidgetDescriptor, WidgetKind};
use docxside_forms::{Config, Error, FieldError, PdfForm, RadioHandling, convert_document};

/// Records everything the converter asks of it.
#[derive(Default)]
struct MockDocument {
    pages: Vec<Vec<TextSpan>>,
    cells: Vec<Vec<Rect>>,
    reject_radios: bool,
    reject_signatures: bool,
    /// Every `set_on_state` call fails.
    fail_on_state: bool,
    /// States reported for every toggle instead of `[on, "Off"]`.
    offered_states: Option<Vec<String>>,
    on_state_calls: usize,
    widgets: Vec<(usize, WidgetDescriptor)>,
    on_states: HashMap<u32, String>,
    values: HashMap<u32, String>,
    parents: HashMap<u32, WidgetHandle>,
    redactions: Vec<(usize, Vec<Rect>)>,
}

impl MockDocument {
    fn with_pages(pages: Vec<Vec<TextSpan>>) -> Self {
        let cells = vec![Vec::new(); pages.len()];
        MockDocument { pages, cells, ..Default::default() }
    }

    fn names(&self) -> Vec<&str> {
        self.widgets.iter().map(|(_, w)| w.name.as_str()).collect()
    }
}

impl PageSource for MockDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn spans(&self, page: usize) -> Vec<TextSpan> {
        self.pages[page].clone()
    }
}

impl TableDetector for MockDocument {
    fn table_cells(&self, page: usize) -> Vec<Rect> {
        self.cells[page].clone()
    }
}

impl FormBackend for MockDocument {
    fn add_widget(&mut self, page: usize, widget: &WidgetDescriptor) -> Result<WidgetHandle, BackendError> {
        let rejected = match widget.kind {
            WidgetKind::Radio(_) => self.reject_radios,
            WidgetKind::Signature(_) => self.reject_signatures,
            _ => false,
        };
        if rejected {
            return Err(BackendError::Rejected("kind not supported".into()));
        }
        let id = self.widgets.len() as u32;
        match &widget.kind {
            WidgetKind::Checkbox(c) => {
                self.on_states.insert(id, c.export_value.clone());
            }
            WidgetKind::Radio(r) => {
                self.on_states.insert(id, r.export_value.clone());
            }
            _ => {}
        }
        self.widgets.push((page, widget.clone()));
        Ok(WidgetHandle::new(id))
    }

    fn toggle_states(&self, toggle: ToggleHandle) -> Result<Vec<String>, BackendError> {
        if let Some(states) = &self.offered_states {
            return Ok(states.clone());
        }
        let id = toggle.widget().id();
        let on = self.on_states.get(&id).ok_or(BackendError::UnknownWidget(toggle.widget()))?;
        Ok(vec![on.clone(), "Off".to_string()])
    }

    fn set_toggle_value(&mut self, toggle: ToggleHandle, value: &str) -> Result<(), BackendError> {
        self.values.insert(toggle.widget().id(), value.to_string());
        Ok(())
    }

    fn set_on_state(&mut self, toggle: ToggleHandle, state: &str) -> Result<(), BackendError> {
        self.on_state_calls += 1;
        if self.fail_on_state {
            return Err(BackendError::Failed("states are frozen".into()));
        }
        self.on_states.insert(toggle.widget().id(), state.to_string());
        Ok(())
    }

    fn link_radio_parent(&mut self, member: ToggleHandle, parent: WidgetHandle) -> Result<(), BackendError> {
        self.parents.insert(member.widget().id(), parent);
        Ok(())
    }

    fn redact(&mut self, page: usize, rects: &[Rect]) -> Result<(), BackendError> {
        self.redactions.push((page, rects.to_vec()));
        Ok(())
    }
}

/// One span per whitespace-separated word, laid out left to right on a line.
fn words(text: &str, y: f32) -> Vec<TextSpan> {
    let mut x = 72.0;
    text.split_whitespace()
        .map(|word| {
            let width = word.chars().count() as f32 * 5.5;
            let span = TextSpan {
                rect: Rect::new(x, y, x + width, y + 12.0),
                text: word.to_string(),
                font_family: "Helvetica".to_string(),
                face: FontFace::Regular,
                font_size: 10.0,
                color: 0,
            };
            x += width + 3.0;
            span
        })
        .collect()
}

const SCENARIO: &str = "Name: {{textbox:fullname|required}}  Gender: {{radiobutton:gender|value:Male}} {{radiobutton:gender|value:Female}}";

#[test]
fn scenario_yields_required_text_and_radio_group() {
    let mut doc = MockDocument::with_pages(vec![words(SCENARIO, 100.0)]);
    let report = convert_document(&mut doc, &Config::default()).unwrap();

    assert_eq!(doc.names(), ["fullname", "gender", "gender"]);
    let (_, fullname) = &doc.widgets[0];
    assert!(fullname.required);
    assert!(matches!(fullname.kind, WidgetKind::Text(_)));

    let exports: Vec<&str> = doc.widgets[1..]
        .iter()
        .map(|(_, w)| match &w.kind {
            WidgetKind::Radio(r) => r.export_value.as_str(),
            other => panic!("expected radio, got {other:?}"),
        })
        .collect();
    assert_eq!(exports, ["Male", "Female"]);

    // The second radio is created under the first and linked to it.
    match &doc.widgets[2].1.kind {
        WidgetKind::Radio(r) => assert_eq!(r.parent, Some(WidgetHandle::new(1))),
        _ => unreachable!(),
    }
    assert_eq!(doc.parents.get(&2), Some(&WidgetHandle::new(1)));
    assert!(!doc.parents.contains_key(&1));

    assert_eq!(report.fields.len(), 3);
    assert!(report.skipped.is_empty());
    assert_eq!(report.field("fullname").map(|f| f.required), Some(true));

    // One batched redaction covering all three placeholders.
    assert_eq!(doc.redactions.len(), 1);
    assert_eq!(doc.redactions[0].1.len(), 3);
}

#[test]
fn scenario_through_the_pdf_backend() {
    let page = Page { width: 612.0, height: 792.0, spans: words(SCENARIO, 100.0), table_cells: Vec::new() };
    let mut form = PdfForm::new(vec![page]);
    let report = convert_document(&mut form, &Config::default()).unwrap();

    assert_eq!(form.widget_count(), 3);
    let radios: Vec<_> = report.fields.iter().filter(|f| f.kind == PlacedKind::Radio).collect();
    assert_eq!(radios.len(), 2);
    assert!(radios.iter().all(|f| f.name == "gender"));
    assert_eq!(radios[0].export_value.as_deref(), Some("Male"));
    assert_eq!(radios[1].export_value.as_deref(), Some("Female"));

    let remaining: Vec<&str> = form.pages()[0].spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(remaining, ["Name:", "Gender:"]);

    let bytes = form.finish().unwrap();
    let pdf = String::from_utf8_lossy(&bytes);
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(pdf.contains("/AcroForm"));
    assert!(pdf.contains("/Ff 49152"));
    assert!(pdf.contains("(fullname)"));
    assert_eq!(pdf.matches("(gender)").count(), 1);
}

#[test]
fn repeated_names_get_page_and_occurrence_suffixes() {
    let mut doc = MockDocument::with_pages(vec![
        words("Work {{textbox:email}} Home {{textbox:email}}", 100.0),
        words("Other {{textbox:email}}", 100.0),
    ]);
    let report = convert_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(doc.names(), ["email", "email_P0_N2", "email_P1_N3"]);
    let pages: Vec<usize> = report.fields.iter().map(|f| f.page).collect();
    assert_eq!(pages, [0, 0, 1]);
}

#[test]
fn rejected_radio_falls_back_to_checkbox() {
    let mut doc = MockDocument::with_pages(vec![words(SCENARIO, 100.0)]);
    doc.reject_radios = true;
    let report = convert_document(&mut doc, &Config::default()).unwrap();

    assert_eq!(doc.names(), ["fullname", "gender", "gender_P0_N2"]);
    let exports: Vec<&str> = doc.widgets[1..]
        .iter()
        .map(|(_, w)| match &w.kind {
            WidgetKind::Checkbox(c) => c.export_value.as_str(),
            other => panic!("expected checkbox, got {other:?}"),
        })
        .collect();
    assert_eq!(exports, ["Male", "Female"]);
    assert!(report.fields[1..].iter().all(|f| f.kind == PlacedKind::Checkbox));
    assert_eq!(doc.redactions[0].1.len(), 3);
}

#[test]
fn rejected_radio_aborts_in_strict_mode() {
    let mut doc = MockDocument::with_pages(vec![words(SCENARIO, 100.0)]);
    doc.reject_radios = true;
    let config = Config { radio_handling: RadioHandling::Strict, ..Config::default() };
    match convert_document(&mut doc, &config) {
        Err(Error::RadioRejected { name, .. }) => assert_eq!(name, "gender"),
        other => panic!("expected strict failure, got {other:?}"),
    }
    assert!(doc.redactions.is_empty());
}

#[test]
fn rejected_radio_is_dropped_in_skip_mode() {
    let mut doc = MockDocument::with_pages(vec![words(SCENARIO, 100.0)]);
    doc.reject_radios = true;
    let config = Config { radio_handling: RadioHandling::Skip, ..Config::default() };
    let report = convert_document(&mut doc, &config).unwrap();

    assert_eq!(doc.names(), ["fullname"]);
    assert_eq!(report.skipped.len(), 2);
    assert!(
        report
            .skipped
            .iter()
            .all(|s| matches!(s.error, FieldError::WidgetCreationRejected { .. }))
    );
    // Dropped fields still have their placeholder text erased.
    assert_eq!(doc.redactions.len(), 1);
    assert_eq!(doc.redactions[0].1.len(), 3);
}

#[test]
fn other_rejections_skip_only_that_field() {
    let mut doc = MockDocument::with_pages(vec![words(
        "{{signaturefield:signer}} {{textbox:date_signed}}",
        300.0,
    )]);
    doc.reject_signatures = true;
    let report = convert_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(doc.names(), ["date_signed"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(doc.redactions[0].1.len(), 2);
}

#[test]
fn checked_checkbox_selects_its_on_state() {
    let mut doc = MockDocument::with_pages(vec![words(
        "{{checkbox:agree|checked}} {{checkbox:news|default:accepted}} {{checkbox:spam}}",
        100.0,
    )]);
    convert_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(doc.values.get(&0).map(String::as_str), Some("Yes"));
    assert_eq!(doc.values.get(&1).map(String::as_str), Some("Accepted"));
    assert!(!doc.values.contains_key(&2));
}

#[test]
fn unmatched_checkbox_state_takes_first_on_state() {
    let mut doc = MockDocument::with_pages(vec![words("{{checkbox:agree|checked|value:accepted}}", 100.0)]);
    doc.offered_states = Some(vec!["Off".to_string(), "On".to_string()]);
    let report = convert_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(doc.names(), ["agree"]);
    assert_eq!(doc.values.get(&0).map(String::as_str), Some("On"));
    assert!(report.warnings.is_empty());
}

#[test]
fn checkbox_without_on_state_gets_the_raw_value() {
    let mut doc = MockDocument::with_pages(vec![words("{{checkbox:agree|checked|value:accepted}}", 100.0)]);
    doc.offered_states = Some(vec!["Off".to_string()]);
    convert_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(doc.names(), ["agree"]);
    assert_eq!(doc.values.get(&0).map(String::as_str), Some("accepted"));
}

#[test]
fn failed_on_state_update_keeps_the_radio() {
    let mut doc = MockDocument::with_pages(vec![words("{{radiobutton:size|value:Large|checked}}", 100.0)]);
    doc.offered_states = Some(vec!["On".to_string(), "Off".to_string()]);
    doc.fail_on_state = true;
    let report = convert_document(&mut doc, &Config::default()).unwrap();

    assert_eq!(doc.names(), ["size"]);
    assert_eq!(report.fields.len(), 1);
    assert!(report.skipped.is_empty());
    // Retried before giving up.
    assert_eq!(doc.on_state_calls, 2);
    assert_eq!(report.warnings.len(), 1);
    match &report.warnings[0] {
        FieldError::BackendMutationFailed { name, .. } => assert_eq!(name, "size"),
        other => panic!("expected a mutation failure, got {other:?}"),
    }
    // Selection still goes through.
    assert_eq!(doc.values.get(&0).map(String::as_str), Some("Large"));
    assert_eq!(doc.redactions[0].1.len(), 1);
}

#[test]
fn radio_checked_false_is_not_selected() {
    let mut doc = MockDocument::with_pages(vec![words(
        "{{radiobutton:g|value:a|checked:false}} {{radiobutton:g|value:b}} {{radiobutton:h|value:c|checked:no}} {{radiobutton:h|value:d|checked}}",
        100.0,
    )]);
    convert_document(&mut doc, &Config::default()).unwrap();
    let selected: Vec<bool> = doc
        .widgets
        .iter()
        .map(|(_, w)| match &w.kind {
            WidgetKind::Radio(r) => r.selected,
            other => panic!("expected radio, got {other:?}"),
        })
        .collect();
    assert_eq!(selected, [false, false, false, true]);
    assert_eq!(doc.values.len(), 1);
    assert_eq!(doc.values.get(&3).map(String::as_str), Some("D"));

    let page = Page {
        width: 612.0,
        height: 792.0,
        spans: words("{{radiobutton:g|value:a|checked:false}} {{radiobutton:g|value:b}}", 100.0),
        table_cells: Vec::new(),
    };
    let mut form = PdfForm::new(vec![page]);
    convert_document(&mut form, &Config::default()).unwrap();
    let bytes = form.finish().unwrap();
    let pdf = String::from_utf8_lossy(&bytes);
    assert!(pdf.contains("/V /Off"));
    assert!(!pdf.contains("/AS /A"));
    assert!(!pdf.contains("/V /A"));
}

#[test]
fn unbraced_scenario_keeps_the_required_flag() {
    let unbraced = SCENARIO.replace("{{", "").replace("}}", "");
    let mut doc = MockDocument::with_pages(vec![words(&unbraced, 100.0)]);
    let report = convert_document(&mut doc, &Config::default()).unwrap();

    assert_eq!(doc.names(), ["fullname", "gender", "gender"]);
    assert!(doc.widgets[0].1.required);
    assert!(report.skipped.is_empty());
    assert_eq!(report.field("gender").and_then(|f| f.export_value.as_deref()), Some("Male"));
}

#[test]
fn fields_in_table_cells_take_the_cell_size() {
    let mut doc = MockDocument::with_pages(vec![words("{{textbox:qty}}", 205.0)]);
    let cell = Rect::new(60.0, 200.0, 260.0, 230.0);
    doc.cells = vec![vec![cell]];
    convert_document(&mut doc, &Config::default()).unwrap();
    let rect = doc.widgets[0].1.rect;
    assert!((rect.width() - cell.width()).abs() < 1e-3);
    assert!((rect.height() - cell.height()).abs() < 1e-3);
}

#[test]
fn borders_follow_the_required_flag() {
    let mut doc = MockDocument::with_pages(vec![words("{{textbox:a|required}} {{textbox:b}}", 100.0)]);
    let mut config = Config::default();
    config.required_border.color = [0.5, 0.0, 0.0];
    config.default_border.width = 2.0;
    convert_document(&mut doc, &config).unwrap();
    assert_eq!(doc.widgets[0].1.border.color, [0.5, 0.0, 0.0]);
    assert_eq!(doc.widgets[1].1.border.width, 2.0);
}

#[test]
fn runs_do_not_share_state() {
    let config = Config::default();
    for _ in 0..2 {
        let mut doc = MockDocument::with_pages(vec![words("{{textbox:email}} {{radiobutton:g|value:a}}", 100.0)]);
        convert_document(&mut doc, &config).unwrap();
        assert_eq!(doc.names(), ["email", "g"]);
        match &doc.widgets[1].1.kind {
            WidgetKind::Radio(r) => assert_eq!(r.parent, None),
            _ => unreachable!(),
        }
    }
}
