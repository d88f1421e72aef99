//! In-memory PDF form document: laid-out pages that widgets are added to and
//! text is redacted from, written out with an AcroForm at the end.

use std::collections::{BTreeMap, HashMap};

use pdf_writer::{Content, Dict, Name, Pdf, Ref, Str, TextStr};

use crate::backend::{BackendError, FormBackend, PageSource, TableDetector, ToggleHandle, WidgetHandle};
use crate::config::BorderStyle;
use crate::error::Error;
use crate::fonts;
use crate::geometry::unpack_color;
use crate::layout::{self, ASCENT};
use crate::model::{Document, Page, Rect, TextSpan};
use crate::widget::{ButtonAction, Scripts, WidgetDescriptor, WidgetKind, normalize_export_value};

const OFF: &str = "Off";

const FF_READ_ONLY: i32 = 1;
const FF_REQUIRED: i32 = 1 << 1;
const FF_MULTILINE: i32 = 1 << 12;
const FF_PASSWORD: i32 = 1 << 13;
const FF_NO_TOGGLE_TO_OFF: i32 = 1 << 14;
const FF_RADIO: i32 = 1 << 15;
const FF_PUSHBUTTON: i32 = 1 << 16;
const FF_COMBO: i32 = 1 << 17;
const FF_MULTI_SELECT: i32 = 1 << 21;
const FF_DO_NOT_SCROLL: i32 = 1 << 23;
const FF_RICH_TEXT: i32 = 1 << 25;

const ANNOT_HIDDEN: i32 = 2;
const ANNOT_PRINT: i32 = 4;

/// Padding between a field border and its text.
const TEXT_INSET: f32 = 2.0;

struct StoredWidget {
    page: usize,
    descriptor: WidgetDescriptor,
    /// On-state name of a checkbox or radio.
    on_state: Option<String>,
    /// Selected state; anything but the on-state reads as off.
    value: Option<String>,
    /// Radio group anchor this widget is a kid of.
    parent: Option<WidgetHandle>,
}

impl StoredWidget {
    fn is_on(&self) -> bool {
        self.value.is_some() && self.value == self.on_state
    }
}

pub struct PdfForm {
    pages: Vec<Page>,
    widgets: Vec<StoredWidget>,
}

impl PdfForm {
    pub fn new(pages: Vec<Page>) -> Self {
        PdfForm { pages, widgets: Vec::new() }
    }

    pub fn from_document(doc: &Document) -> Self {
        Self::new(layout::layout(doc))
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    fn widget(&self, handle: WidgetHandle) -> Result<&StoredWidget, BackendError> {
        self.widgets
            .get(handle.id() as usize)
            .ok_or(BackendError::UnknownWidget(handle))
    }

    fn widget_mut(&mut self, handle: WidgetHandle) -> Result<&mut StoredWidget, BackendError> {
        self.widgets
            .get_mut(handle.id() as usize)
            .ok_or(BackendError::UnknownWidget(handle))
    }

    /// Serialize pages, widgets and the AcroForm.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        let mut pdf = Pdf::new();
        let mut next_id = 1;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let acroform_id = alloc();
        let font_refs = fonts::write_fonts(&mut pdf, &mut alloc);
        let helv = font_refs[0];
        let zadb = alloc();
        fonts::write_dingbats(&mut pdf, zadb);

        let page_ids: Vec<Ref> = self.pages.iter().map(|_| alloc()).collect();
        let widget_ids: Vec<Ref> = self.widgets.iter().map(|_| alloc()).collect();

        // Radio kids hang off one field per group, keyed by the anchor.
        let mut group_fields: BTreeMap<usize, Ref> = BTreeMap::new();
        let mut group_kids: HashMap<usize, Vec<Ref>> = HashMap::new();
        let mut fields: Vec<Ref> = Vec::new();
        let mut calculated: Vec<Ref> = Vec::new();
        let mut annots: Vec<Vec<Ref>> = vec![Vec::new(); self.pages.len()];
        for (idx, w) in self.widgets.iter().enumerate() {
            annots[w.page].push(widget_ids[idx]);
            if matches!(w.descriptor.kind, WidgetKind::Radio(_)) {
                let anchor = w.parent.map_or(idx, |p| p.id() as usize);
                group_fields.entry(anchor).or_insert_with(|| {
                    let field = alloc();
                    fields.push(field);
                    field
                });
                group_kids.entry(anchor).or_default().push(widget_ids[idx]);
            } else {
                fields.push(widget_ids[idx]);
                if let WidgetKind::Text(text) = &w.descriptor.kind
                    && text.scripts.calculate.is_some()
                {
                    calculated.push(widget_ids[idx]);
                }
            }
        }

        for (idx, w) in self.widgets.iter().enumerate() {
            let page = &self.pages[w.page];
            let appearance = write_appearances(&mut pdf, &mut alloc, w, helv, zadb);
            let mut dict = pdf.indirect(widget_ids[idx]).dict();
            write_widget_annotation(&mut dict, w, page_ids[w.page], page.height, &appearance);
            match &w.descriptor.kind {
                WidgetKind::Radio(_) => {
                    let anchor = w.parent.map_or(idx, |p| p.id() as usize);
                    if let Some(field) = group_fields.get(&anchor) {
                        dict.pair(Name(b"Parent"), *field);
                    }
                }
                _ => write_field_entries(&mut dict, w),
            }
        }

        for (anchor, field) in &group_fields {
            let kids = group_kids.remove(anchor).unwrap_or_default();
            let root = &self.widgets[*anchor];
            let selected = self.widgets.iter().enumerate().find_map(|(i, w)| {
                let member_anchor = w.parent.map_or(i, |p| p.id() as usize);
                (member_anchor == *anchor && w.is_on()).then(|| w.on_state.clone()).flatten()
            });
            let mut dict = pdf.indirect(*field).dict();
            dict.pair(Name(b"FT"), Name(b"Btn"));
            dict.pair(Name(b"T"), TextStr(&root.descriptor.name));
            dict.pair(Name(b"Ff"), FF_RADIO | FF_NO_TOGGLE_TO_OFF | common_flags(&root.descriptor));
            dict.pair(Name(b"V"), Name(selected.as_deref().unwrap_or(OFF).as_bytes()));
            if let Some(tooltip) = &root.descriptor.tooltip {
                dict.pair(Name(b"TU"), TextStr(tooltip));
            }
            dict.insert(Name(b"Kids")).array().items(kids);
        }

        for (idx, page) in self.pages.iter().enumerate() {
            let content_id = alloc();
            pdf.stream(content_id, &page_content(page).finish());

            let mut dict = pdf.indirect(page_ids[idx]).dict();
            dict.pair(Name(b"Type"), Name(b"Page"));
            dict.pair(Name(b"Parent"), pages_id);
            dict.insert(Name(b"MediaBox")).array().items([0.0, 0.0, page.width, page.height]);
            dict.pair(Name(b"Contents"), content_id);
            if !annots[idx].is_empty() {
                dict.insert(Name(b"Annots")).array().items(annots[idx].iter().copied());
            }
            let mut resources = dict.insert(Name(b"Resources")).dict();
            let mut font_dict = resources.insert(Name(b"Font")).dict();
            for (face, font_ref) in fonts::ALL_FACES.iter().zip(font_refs) {
                font_dict.pair(Name(fonts::resource_name(*face).as_bytes()), font_ref);
            }
        }

        let page_count =
            i32::try_from(page_ids.len()).map_err(|_| Error::Pdf("too many pages".into()))?;
        pdf.pages(pages_id).kids(page_ids.iter().copied()).count(page_count);

        {
            let mut form = pdf.indirect(acroform_id).dict();
            form.insert(Name(b"Fields")).array().items(fields.iter().copied());
            form.pair(Name(b"NeedAppearances"), true);
            form.pair(Name(b"DA"), Str(b"/Helv 0 Tf 0 g"));
            if self
                .widgets
                .iter()
                .any(|w| matches!(w.descriptor.kind, WidgetKind::Signature(_)))
            {
                form.pair(Name(b"SigFlags"), 1);
            }
            if !calculated.is_empty() {
                form.insert(Name(b"CO")).array().items(calculated.iter().copied());
            }
            let mut dr = form.insert(Name(b"DR")).dict();
            let mut dr_fonts = dr.insert(Name(b"Font")).dict();
            dr_fonts.pair(Name(b"Helv"), helv);
            dr_fonts.pair(Name(b"ZaDb"), zadb);
        }

        {
            let mut catalog = pdf.indirect(catalog_id).dict();
            catalog.pair(Name(b"Type"), Name(b"Catalog"));
            catalog.pair(Name(b"Pages"), pages_id);
            catalog.pair(Name(b"AcroForm"), acroform_id);
        }

        log::debug!(
            "writing {} page(s), {} widget(s), {} field(s)",
            self.pages.len(),
            self.widgets.len(),
            fields.len()
        );
        Ok(pdf.finish())
    }
}

impl PageSource for PdfForm {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn spans(&self, page: usize) -> Vec<TextSpan> {
        self.pages.get(page).map(|p| p.spans.clone()).unwrap_or_default()
    }
}

impl TableDetector for PdfForm {
    fn table_cells(&self, page: usize) -> Vec<Rect> {
        self.pages.get(page).map(|p| p.table_cells.clone()).unwrap_or_default()
    }
}

impl FormBackend for PdfForm {
    fn add_widget(&mut self, page: usize, widget: &WidgetDescriptor) -> Result<WidgetHandle, BackendError> {
        if page >= self.pages.len() {
            return Err(BackendError::Rejected(format!("page {page} does not exist")));
        }
        if widget.name.trim().is_empty() {
            return Err(BackendError::Rejected("field name is empty".into()));
        }
        if widget.rect.is_empty() {
            return Err(BackendError::Rejected(format!("'{}' has an empty rectangle", widget.name)));
        }
        let (on_state, parent) = match &widget.kind {
            WidgetKind::Checkbox(checkbox) => (Some(normalize_export_value(Some(&checkbox.export_value))), None),
            WidgetKind::Radio(radio) => {
                if let Some(parent) = radio.parent {
                    self.widget(parent)?;
                }
                (Some(normalize_export_value(Some(&radio.export_value))), radio.parent)
            }
            _ => (None, None),
        };
        let id = u32::try_from(self.widgets.len())
            .map_err(|_| BackendError::Failed("widget limit reached".into()))?;
        self.widgets.push(StoredWidget {
            page,
            descriptor: widget.clone(),
            on_state,
            value: None,
            parent,
        });
        Ok(WidgetHandle::new(id))
    }

    fn toggle_states(&self, toggle: ToggleHandle) -> Result<Vec<String>, BackendError> {
        let widget = self.widget(toggle.widget())?;
        Ok(widget
            .on_state
            .iter()
            .cloned()
            .chain([OFF.to_string()])
            .collect())
    }

    fn set_toggle_value(&mut self, toggle: ToggleHandle, value: &str) -> Result<(), BackendError> {
        self.widget_mut(toggle.widget())?.value = Some(value.to_string());
        Ok(())
    }

    fn set_on_state(&mut self, toggle: ToggleHandle, state: &str) -> Result<(), BackendError> {
        if state.is_empty() || state == OFF {
            return Err(BackendError::Rejected(format!("'{state}' cannot be an on-state")));
        }
        self.widget_mut(toggle.widget())?.on_state = Some(state.to_string());
        Ok(())
    }

    fn link_radio_parent(&mut self, member: ToggleHandle, parent: WidgetHandle) -> Result<(), BackendError> {
        if !matches!(self.widget(parent)?.descriptor.kind, WidgetKind::Radio(_)) {
            return Err(BackendError::Rejected(format!("widget {} is not a radio button", parent.id())));
        }
        self.widget_mut(member.widget())?.parent = Some(parent);
        Ok(())
    }

    fn redact(&mut self, page: usize, rects: &[Rect]) -> Result<(), BackendError> {
        let missing = format!("page {page} does not exist");
        let page = self.pages.get_mut(page).ok_or(BackendError::Failed(missing))?;
        let spans = std::mem::take(&mut page.spans);
        page.spans = spans.into_iter().flat_map(|span| redact_span(span, rects)).collect();
        Ok(())
    }
}

fn contains_point(rect: &Rect, x: f32, y: f32) -> bool {
    x >= rect.x0 && x <= rect.x1 && y >= rect.y0 && y <= rect.y1
}

/// Drop every glyph whose centre lies in one of `rects`; what is left of the
/// span is split into pieces that keep their original positions. Glyph
/// advances are scaled so they fill the span's rectangle exactly.
fn redact_span(span: TextSpan, rects: &[Rect]) -> Vec<TextSpan> {
    let advances: Vec<f32> = span
        .text
        .chars()
        .map(|c| fonts::char_width(c, span.face, span.font_size))
        .collect();
    let total: f32 = advances.iter().sum();
    let scale = if total > 0.0 { span.rect.width() / total } else { 0.0 };

    let cy = (span.rect.y0 + span.rect.y1) / 2.0;
    let mut kept: Vec<TextSpan> = Vec::new();
    let mut current: Option<TextSpan> = None;
    let mut removed = false;
    let mut x = span.rect.x0;
    for (c, advance) in span.text.chars().zip(advances) {
        let w = advance * scale;
        if rects.iter().any(|r| contains_point(r, x + w / 2.0, cy)) {
            removed = true;
            kept.extend(current.take());
        } else {
            match current.as_mut() {
                Some(piece) => {
                    piece.text.push(c);
                    piece.rect.x1 = x + w;
                }
                None => {
                    current = Some(TextSpan {
                        rect: Rect::new(x, span.rect.y0, x + w, span.rect.y1),
                        text: c.to_string(),
                        ..span.clone()
                    })
                }
            }
        }
        x += w;
    }
    if !removed {
        return vec![span];
    }
    kept.extend(current);
    kept
}

fn pdf_rect(rect: Rect, page_height: f32) -> [f32; 4] {
    [rect.x0, page_height - rect.y1, rect.x1, page_height - rect.y0]
}

fn page_content(page: &Page) -> Content {
    let mut content = Content::new();
    if !page.table_cells.is_empty() {
        content.set_stroke_rgb(0.4, 0.4, 0.4).set_line_width(0.5);
        for cell in &page.table_cells {
            content
                .rect(cell.x0, page.height - cell.y1, cell.width(), cell.height())
                .stroke();
        }
    }
    for span in &page.spans {
        let bytes = fonts::to_winansi_bytes(&span.text);
        if bytes.is_empty() {
            continue;
        }
        let [r, g, b] = unpack_color(span.color);
        let baseline = page.height - (span.rect.y0 + span.font_size * ASCENT);
        content
            .begin_text()
            .set_font(Name(fonts::resource_name(span.face).as_bytes()), span.font_size)
            .set_fill_rgb(r, g, b)
            .next_line(span.rect.x0, baseline)
            .show(Str(&bytes))
            .end_text();
    }
    content
}

/// Normal appearance streams of a widget: one stream, or on/off pair for
/// toggles.
enum Appearance {
    Single(Ref),
    Toggle { on: Ref, on_name: String, off: Ref },
}

fn border(content: &mut Content, width: f32, height: f32, style: &BorderStyle) {
    let [r, g, b] = style.color;
    let inset = style.width / 2.0;
    content
        .set_stroke_rgb(r, g, b)
        .set_line_width(style.width)
        .rect(inset, inset, (width - style.width).max(0.0), (height - style.width).max(0.0))
        .stroke();
}

fn form_xobject(pdf: &mut Pdf, id: Ref, width: f32, height: f32, content: &[u8], font: (&str, Ref)) {
    let mut stream = pdf.stream(id, content);
    stream.pair(Name(b"Type"), Name(b"XObject"));
    stream.pair(Name(b"Subtype"), Name(b"Form"));
    stream.insert(Name(b"BBox")).array().items([0.0, 0.0, width, height]);
    let mut resources = stream.insert(Name(b"Resources")).dict();
    resources.insert(Name(b"Font")).dict().pair(Name(font.0.as_bytes()), font.1);
}

fn shown_text(kind: &WidgetKind) -> Option<&str> {
    match kind {
        WidgetKind::Text(text) if !text.password => text.value.as_deref(),
        WidgetKind::Choice(choice) => choice.value.as_deref(),
        WidgetKind::Button(button) => button.caption.as_deref(),
        _ => None,
    }
}

fn write_appearances(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    widget: &StoredWidget,
    helv: Ref,
    zadb: Ref,
) -> Appearance {
    let descriptor = &widget.descriptor;
    let (width, height) = (descriptor.rect.width(), descriptor.rect.height());

    if let Some(on_name) = &widget.on_state {
        let glyph: &[u8] = if matches!(descriptor.kind, WidgetKind::Radio(_)) { b"l" } else { b"4" };
        let size = width.min(height) * 0.8;
        let mut on = Content::new();
        border(&mut on, width, height, &descriptor.border);
        on.begin_text()
            .set_font(Name(b"ZaDb"), size)
            .set_fill_rgb(0.0, 0.0, 0.0)
            .next_line((width - size * 0.78) / 2.0, (height - size * 0.7) / 2.0)
            .show(Str(glyph))
            .end_text();
        let mut off = Content::new();
        border(&mut off, width, height, &descriptor.border);

        let (on_id, off_id) = (alloc(), alloc());
        form_xobject(pdf, on_id, width, height, &on.finish(), ("ZaDb", zadb));
        form_xobject(pdf, off_id, width, height, &off.finish(), ("ZaDb", zadb));
        return Appearance::Toggle { on: on_id, on_name: on_name.clone(), off: off_id };
    }

    let mut content = Content::new();
    border(&mut content, width, height, &descriptor.border);
    if let Some(text) = shown_text(&descriptor.kind) {
        let (size, [r, g, b]) = match &descriptor.kind {
            WidgetKind::Text(t) => (t.style.font_size, t.style.color),
            WidgetKind::Choice(c) => (c.style.font_size, c.style.color),
            _ => ((height * 0.6).min(12.0), [0.0, 0.0, 0.0]),
        };
        let baseline = ((height - size) / 2.0).max(0.0) + size * 0.2;
        content.begin_marked_content(Name(b"Tx"));
        content
            .begin_text()
            .set_font(Name(b"Helv"), size)
            .set_fill_rgb(r, g, b)
            .next_line(TEXT_INSET, baseline)
            .show(Str(&fonts::to_winansi_bytes(text)))
            .end_text();
        content.end_marked_content();
    }
    let id = alloc();
    form_xobject(pdf, id, width, height, &content.finish(), ("Helv", helv));
    Appearance::Single(id)
}

fn common_flags(descriptor: &WidgetDescriptor) -> i32 {
    let mut flags = 0;
    if descriptor.readonly {
        flags |= FF_READ_ONLY;
    }
    if descriptor.required {
        flags |= FF_REQUIRED;
    }
    flags
}

fn default_appearance(size: f32, color: [f32; 3]) -> String {
    let [r, g, b] = color;
    format!("/Helv {size:.1} Tf {r:.3} {g:.3} {b:.3} rg")
}

/// Entries every widget annotation carries, radio kids included.
fn write_widget_annotation(dict: &mut Dict, widget: &StoredWidget, page_ref: Ref, page_height: f32, appearance: &Appearance) {
    let descriptor = &widget.descriptor;
    dict.pair(Name(b"Type"), Name(b"Annot"));
    dict.pair(Name(b"Subtype"), Name(b"Widget"));
    dict.insert(Name(b"Rect")).array().items(pdf_rect(descriptor.rect, page_height));
    dict.pair(Name(b"P"), page_ref);
    let hidden = matches!(&descriptor.kind, WidgetKind::Text(t) if t.hidden);
    dict.pair(Name(b"F"), if hidden { ANNOT_HIDDEN } else { ANNOT_PRINT });

    {
        let mut mk = dict.insert(Name(b"MK")).dict();
        mk.insert(Name(b"BC")).array().items(descriptor.border.color);
        match &descriptor.kind {
            WidgetKind::Checkbox(_) => {
                mk.pair(Name(b"CA"), TextStr("4"));
            }
            WidgetKind::Radio(_) => {
                mk.pair(Name(b"CA"), TextStr("l"));
            }
            WidgetKind::Button(button) => {
                if let Some(caption) = &button.caption {
                    mk.pair(Name(b"CA"), TextStr(caption));
                }
            }
            _ => {}
        }
    }
    {
        let mut bs = dict.insert(Name(b"BS")).dict();
        bs.pair(Name(b"W"), descriptor.border.width);
        bs.pair(Name(b"S"), Name(b"S"));
    }

    let mut ap = dict.insert(Name(b"AP")).dict();
    match appearance {
        Appearance::Single(id) => {
            ap.pair(Name(b"N"), *id);
        }
        Appearance::Toggle { on, on_name, off } => {
            let mut normal = ap.insert(Name(b"N")).dict();
            normal.pair(Name(on_name.as_bytes()), *on);
            normal.pair(Name(OFF.as_bytes()), *off);
        }
    }
    drop(ap);

    if let Some(on_name) = &widget.on_state {
        let state = if widget.is_on() { on_name.as_str() } else { OFF };
        dict.pair(Name(b"AS"), Name(state.as_bytes()));
    }
}

fn write_scripts(dict: &mut Dict, scripts: &Scripts) {
    let hooks = [
        (b"K".as_slice(), scripts.keystroke.as_deref()),
        (b"F".as_slice(), scripts.format.as_deref()),
        (b"V".as_slice(), scripts.validate.as_deref()),
        (b"C".as_slice(), scripts.calculate.as_deref()),
    ];
    if hooks.iter().all(|(_, js)| js.is_none()) {
        return;
    }
    let mut aa = dict.insert(Name(b"AA")).dict();
    for (key, js) in hooks {
        if let Some(js) = js {
            let mut action = aa.insert(Name(key)).dict();
            action.pair(Name(b"S"), Name(b"JavaScript"));
            action.pair(Name(b"JS"), TextStr(js));
        }
    }
}

/// Field entries of a terminal (non-radio) widget.
fn write_field_entries(dict: &mut Dict, widget: &StoredWidget) {
    let descriptor = &widget.descriptor;
    dict.pair(Name(b"T"), TextStr(&descriptor.name));
    if let Some(tooltip) = &descriptor.tooltip {
        dict.pair(Name(b"TU"), TextStr(tooltip));
    }
    let mut flags = common_flags(descriptor);

    match &descriptor.kind {
        WidgetKind::Text(text) => {
            dict.pair(Name(b"FT"), Name(b"Tx"));
            dict.pair(Name(b"DA"), Str(default_appearance(text.style.font_size, text.style.color).as_bytes()));
            if text.multiline {
                flags |= FF_MULTILINE;
            }
            if text.password {
                flags |= FF_PASSWORD;
            }
            if text.rich_text {
                flags |= FF_RICH_TEXT;
            }
            if text.do_not_scroll {
                flags |= FF_DO_NOT_SCROLL;
            }
            if let Some(max_len) = text.max_len {
                dict.pair(Name(b"MaxLen"), i32::try_from(max_len).unwrap_or(i32::MAX));
            }
            if let Some(value) = &text.value {
                dict.pair(Name(b"V"), TextStr(value));
                dict.pair(Name(b"DV"), TextStr(value));
            }
            write_scripts(dict, &text.scripts);
        }
        WidgetKind::Choice(choice) => {
            dict.pair(Name(b"FT"), Name(b"Ch"));
            dict.pair(Name(b"DA"), Str(default_appearance(choice.style.font_size, choice.style.color).as_bytes()));
            if choice.combo {
                flags |= FF_COMBO;
            }
            if choice.multi_select {
                flags |= FF_MULTI_SELECT;
            }
            dict.insert(Name(b"Opt"))
                .array()
                .items(choice.options.iter().map(|o| TextStr(o)));
            if let Some(value) = &choice.value {
                dict.pair(Name(b"V"), TextStr(value));
                dict.pair(Name(b"DV"), TextStr(value));
            }
        }
        WidgetKind::Button(button) => {
            dict.pair(Name(b"FT"), Name(b"Btn"));
            dict.pair(Name(b"DA"), Str(b"/Helv 0 Tf 0 g"));
            flags |= FF_PUSHBUTTON;
            match &button.action {
                ButtonAction::Push => {}
                ButtonAction::Submit { url } => {
                    let mut action = dict.insert(Name(b"A")).dict();
                    action.pair(Name(b"S"), Name(b"SubmitForm"));
                    if let Some(url) = url {
                        let mut target = action.insert(Name(b"F")).dict();
                        target.pair(Name(b"FS"), Name(b"URL"));
                        target.pair(Name(b"F"), Str(url.as_bytes()));
                    }
                }
                ButtonAction::Reset => {
                    dict.insert(Name(b"A")).dict().pair(Name(b"S"), Name(b"ResetForm"));
                }
            }
        }
        WidgetKind::Signature(_) => {
            dict.pair(Name(b"FT"), Name(b"Sig"));
        }
        WidgetKind::Checkbox(_) => {
            dict.pair(Name(b"FT"), Name(b"Btn"));
            dict.pair(Name(b"DA"), Str(b"/ZaDb 0 Tf 0 g"));
            let value = match &widget.value {
                Some(v) if v != OFF => v.as_str(),
                _ => OFF,
            };
            dict.pair(Name(b"V"), Name(value.as_bytes()));
        }
        WidgetKind::Radio(_) => {}
    }
    dict.pair(Name(b"Ff"), flags);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontFace;

    fn span(text: &str, x0: f32) -> TextSpan {
        let width = fonts::text_width(text, FontFace::Regular, 10.0);
        TextSpan {
            rect: Rect::new(x0, 100.0, x0 + width, 112.0),
            text: text.to_string(),
            font_family: "Helvetica".to_string(),
            face: FontFace::Regular,
            font_size: 10.0,
            color: 0,
        }
    }

    #[test]
    fn redaction_keeps_text_outside_the_rect() {
        let s = span("ab{{x}}cd", 10.0);
        let start = 10.0 + fonts::text_width("ab", FontFace::Regular, 10.0);
        let end = start + fonts::text_width("{{x}}", FontFace::Regular, 10.0);
        let pieces = redact_span(s, &[Rect::new(start, 100.0, end, 112.0)]);
        let texts: Vec<&str> = pieces.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["ab", "cd"]);
        assert!((pieces[1].rect.x0 - end).abs() < 1e-3);
    }

    #[test]
    fn spans_outside_the_rect_are_untouched() {
        let s = span("hello", 10.0);
        let pieces = redact_span(s.clone(), &[Rect::new(200.0, 0.0, 300.0, 50.0)]);
        assert_eq!(pieces, vec![s]);
    }
}
