//! Page-by-page conversion: detect placeholders, place widgets, redact the
//! placeholder text.

use std::collections::{HashMap, HashSet};

use crate::backend::{FormBackend, FormDocument, ToggleHandle};
use crate::config::{Config, RadioHandling};
use crate::error::{Error, FieldError};
use crate::field::{self, FieldKind, FieldSpec};
use crate::geometry::{self, PageTextIndex, PlacementRegion, TextStyle};
use crate::group::GroupRegistry;
use crate::model::{Rect, TextSpan};
use crate::token::{self, RawToken};
use crate::widget::{self, WidgetDescriptor, WidgetKind};

/// Kind of widget that ended up in the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacedKind {
    Text,
    Choice,
    Button,
    Signature,
    Radio,
    Checkbox,
}

impl PlacedKind {
    fn of(kind: &WidgetKind) -> Self {
        match kind {
            WidgetKind::Text(_) => PlacedKind::Text,
            WidgetKind::Choice(_) => PlacedKind::Choice,
            WidgetKind::Button(_) => PlacedKind::Button,
            WidgetKind::Signature(_) => PlacedKind::Signature,
            WidgetKind::Radio(_) => PlacedKind::Radio,
            WidgetKind::Checkbox(_) => PlacedKind::Checkbox,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedField {
    pub page: usize,
    pub name: String,
    pub kind: PlacedKind,
    pub required: bool,
    pub export_value: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedField {
    pub page: usize,
    pub raw: String,
    pub error: FieldError,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversionReport {
    pub fields: Vec<PlacedField>,
    pub skipped: Vec<SkippedField>,
    /// Non-fatal failures on widgets that were created anyway.
    pub warnings: Vec<FieldError>,
}

impl ConversionReport {
    pub fn field(&self, name: &str) -> Option<&PlacedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Mutable state of one conversion run. Never shared between runs.
pub struct ConversionContext<'a> {
    pub config: &'a Config,
    pub groups: GroupRegistry,
    name_counts: HashMap<String, usize>,
    radio_names: HashMap<String, String>,
    fallback_names: HashSet<String>,
    pub report: ConversionReport,
}

impl<'a> ConversionContext<'a> {
    pub fn new(config: &'a Config) -> Self {
        ConversionContext {
            config,
            groups: GroupRegistry::new(),
            name_counts: HashMap::new(),
            radio_names: HashMap::new(),
            fallback_names: HashSet::new(),
            report: ConversionReport::default(),
        }
    }

    /// Document-unique field name. The first use of a base name keeps it;
    /// later uses become `<base>_P<page>_N<occurrence>`. Radio buttons of
    /// one group share the group's name.
    pub fn unique_name(&mut self, base: &str, page: usize, radio: bool) -> String {
        if radio && let Some(name) = self.radio_names.get(base) {
            return name.clone();
        }
        let count = self.name_counts.entry(base.to_string()).or_insert(0);
        *count += 1;
        let name = if *count > 1 {
            format!("{base}_P{page}_N{count}")
        } else {
            base.to_string()
        };
        if radio {
            self.radio_names.insert(base.to_string(), name.clone());
        }
        name
    }

    /// Name for a checkbox standing in for a rejected radio: the group name
    /// while the group has no other widget, a fresh unique name after that.
    fn fallback_name(&mut self, group: &str, page: usize) -> String {
        if !self.groups.has_members(group) && self.fallback_names.insert(group.to_string()) {
            return group.to_string();
        }
        self.unique_name(group, page, false)
    }

    fn skip(&mut self, page: usize, raw: &str, error: FieldError) {
        log::warn!("page {page}: skipping '{raw}': {error}");
        self.report.skipped.push(SkippedField { page, raw: raw.to_string(), error });
    }

    fn warn(&mut self, error: FieldError) {
        log::warn!("{error}");
        self.report.warnings.push(error);
    }
}

/// Run the whole conversion over `doc`. Only a strict-policy radio
/// rejection aborts; every other per-field problem is recorded and skipped.
pub fn convert_document<D: FormDocument>(doc: &mut D, config: &Config) -> Result<ConversionReport, Error> {
    let mut ctx = ConversionContext::new(config);
    for page in 0..doc.page_count() {
        convert_page(doc, &mut ctx, page)?;
    }
    log::info!(
        "placed {} field(s), skipped {}",
        ctx.report.fields.len(),
        ctx.report.skipped.len()
    );
    Ok(ctx.report)
}

/// One page: every placeholder is placed before the page's redactions are
/// applied in a single batch.
pub fn convert_page<D: FormDocument>(
    doc: &mut D,
    ctx: &mut ConversionContext<'_>,
    page: usize,
) -> Result<(), Error> {
    let spans = doc.spans(page);
    let cells = doc.table_cells(page);
    let index = geometry::build_index(&spans);
    if index.is_empty() {
        return Ok(());
    }
    let tokens = token::recognize(&index.concatenated_clean);
    log::debug!(
        "page {page}: placeholders {:?}",
        tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>()
    );

    let mut redactions: Vec<Rect> = Vec::new();
    for raw in &tokens {
        if let Some(region) = place_token(doc, ctx, page, &index, &spans, &cells, raw)? {
            redactions.extend(region.redact_rects);
        }
    }

    if !redactions.is_empty()
        && let Err(e) = doc.redact(page, &redactions)
    {
        log::warn!("page {page}: redaction failed: {e}");
    }
    log::info!("page {page}: {} placeholder(s)", tokens.len());
    Ok(())
}

/// Place one token. Returns the region whose text should be erased, which is
/// every token with resolved geometry whether or not a widget was placed.
fn place_token<D: FormDocument>(
    doc: &mut D,
    ctx: &mut ConversionContext<'_>,
    page: usize,
    index: &PageTextIndex,
    spans: &[TextSpan],
    cells: &[Rect],
    raw: &RawToken,
) -> Result<Option<PlacementRegion>, Error> {
    let mut spec = match field::parse_placeholder_with(&raw.text, ctx.config.fuzzy_threshold) {
        Ok(spec) => spec,
        Err(e) => {
            ctx.skip(page, &raw.text, e);
            return Ok(None);
        }
    };
    let Some(region) = index.resolve(raw.start..raw.end, ctx.config.detection_padding) else {
        ctx.skip(page, &raw.text, FieldError::GeometryUnresolved { raw: raw.text.clone() });
        return Ok(None);
    };
    let region = region.reconcile(cells, ctx.config.cell_margin);
    let style = index
        .source_span(raw.start)
        .and_then(|i| spans.get(i))
        .map(TextStyle::from_span)
        .unwrap_or_default();

    spec.name = ctx.unique_name(&spec.name, page, spec.kind == FieldKind::Radio);
    let descriptor = widget::synthesize(&spec, &region, &style, ctx.config, &ctx.groups);

    let placed = match doc.add_widget(page, &descriptor) {
        Ok(handle) => {
            finish_widget(doc, ctx, &spec, &descriptor, handle);
            descriptor
        }
        Err(e) if descriptor.is_radio() => {
            match radio_rejected(doc, ctx, page, &spec, &descriptor, e)? {
                Some(fallback) => fallback,
                None => return Ok(Some(region)),
            }
        }
        Err(e) => {
            let error = FieldError::WidgetCreationRejected { name: spec.name.clone(), reason: e.to_string() };
            ctx.skip(page, &raw.text, error);
            return Ok(Some(region));
        }
    };

    let export_value = match &placed.kind {
        WidgetKind::Radio(r) => Some(r.export_value.clone()),
        WidgetKind::Checkbox(c) => Some(c.export_value.clone()),
        _ => None,
    };
    ctx.report.fields.push(PlacedField {
        page,
        name: placed.name.clone(),
        kind: PlacedKind::of(&placed.kind),
        required: placed.required,
        export_value,
    });
    Ok(Some(region))
}

/// Apply the radio policy to a rejected radio. `Ok(Some)` carries the
/// checkbox that replaced it.
fn radio_rejected<D: FormDocument>(
    doc: &mut D,
    ctx: &mut ConversionContext<'_>,
    page: usize,
    spec: &FieldSpec,
    descriptor: &WidgetDescriptor,
    reason: crate::backend::BackendError,
) -> Result<Option<WidgetDescriptor>, Error> {
    let rejected = FieldError::WidgetCreationRejected { name: spec.name.clone(), reason: reason.to_string() };
    match ctx.config.radio_handling {
        RadioHandling::Strict => Err(Error::RadioRejected { name: spec.name.clone(), reason }),
        RadioHandling::Skip => {
            ctx.skip(page, &spec.name, rejected);
            Ok(None)
        }
        RadioHandling::Fallback => {
            let Some(mut checkbox) = descriptor.radio_as_checkbox() else {
                return Ok(None);
            };
            checkbox.name = ctx.fallback_name(&spec.name, page);
            log::warn!(
                "page {page}: radio '{}' rejected ({reason}), placing checkbox '{}'",
                spec.name,
                checkbox.name
            );
            match doc.add_widget(page, &checkbox) {
                Ok(handle) => {
                    finish_widget(doc, ctx, spec, &checkbox, handle);
                    Ok(Some(checkbox))
                }
                Err(e) => {
                    let error =
                        FieldError::WidgetCreationRejected { name: checkbox.name.clone(), reason: e.to_string() };
                    ctx.skip(page, &spec.name, error);
                    Ok(None)
                }
            }
        }
    }
}

/// Post-creation steps: toggle states and radio group linkage. Failures
/// here never undo the widget.
fn finish_widget<D: FormBackend>(
    doc: &mut D,
    ctx: &mut ConversionContext<'_>,
    spec: &FieldSpec,
    descriptor: &WidgetDescriptor,
    handle: crate::backend::WidgetHandle,
) {
    let Some(toggle) = ToggleHandle::of(handle, descriptor) else {
        return;
    };
    let mutation_failed = |reason: String| FieldError::BackendMutationFailed {
        name: descriptor.name.clone(),
        reason,
    };
    match &descriptor.kind {
        WidgetKind::Checkbox(checkbox) => {
            if checkbox.checked
                && let Err(e) = check_toggle(doc, toggle, spec, &checkbox.export_value)
            {
                ctx.warn(mutation_failed(e.to_string()));
            }
        }
        WidgetKind::Radio(radio) => {
            if let Err(e) = ctx.groups.register_member(doc, &radio.group, toggle, &radio.export_value) {
                ctx.warn(mutation_failed(format!("group link: {e}")));
            }
            if let Err(e) = ctx.groups.ensure_on_state(doc, toggle, &radio.export_value) {
                ctx.warn(mutation_failed(format!("on-state: {e}")));
            }
            if radio.selected
                && let Err(e) = doc.set_toggle_value(toggle, &radio.export_value)
            {
                ctx.warn(mutation_failed(e.to_string()));
            }
        }
        _ => {}
    }
}

fn state_key(name: &str) -> String {
    name.trim()
        .trim_start_matches('/')
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_off_state(name: &str) -> bool {
    matches!(state_key(name).as_str(), "off" | "normal")
}

/// Turn a checkbox on: the state matching the requested value, else the
/// first non-off state, else the raw requested value.
fn check_toggle<D: FormBackend>(
    doc: &mut D,
    toggle: ToggleHandle,
    spec: &FieldSpec,
    export_value: &str,
) -> Result<(), crate::backend::BackendError> {
    let states = doc.toggle_states(toggle).unwrap_or_default();
    let requested = spec.value_or_default().unwrap_or(export_value);
    let wanted = state_key(requested);

    let chosen = states
        .iter()
        .find(|s| state_key(s) == wanted)
        .or_else(|| states.iter().find(|s| !is_off_state(s)));
    match chosen {
        Some(state) => {
            log::debug!("checkbox '{}': states {states:?}, selecting '{state}'", spec.name);
            doc.set_toggle_value(toggle, state)
        }
        None => {
            log::warn!(
                "checkbox '{}': '{requested}' matches none of {states:?}, assigning it as is",
                spec.name
            );
            doc.set_toggle_value(toggle, requested)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_keys_ignore_case_and_punctuation() {
        assert_eq!(state_key("/Yes"), "yes");
        assert_eq!(state_key("Opt_1"), "opt1");
        assert!(is_off_state("Off"));
        assert!(!is_off_state("On"));
    }

    #[test]
    fn names_get_page_and_occurrence_suffix() {
        let config = Config::default();
        let mut ctx = ConversionContext::new(&config);
        assert_eq!(ctx.unique_name("email", 0, false), "email");
        assert_eq!(ctx.unique_name("email", 0, false), "email_P0_N2");
        assert_eq!(ctx.unique_name("email", 3, false), "email_P3_N3");
        assert_eq!(ctx.unique_name("gender", 1, true), "gender");
        assert_eq!(ctx.unique_name("gender", 2, true), "gender");
    }
}
