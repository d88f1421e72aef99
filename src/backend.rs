//! Seams to the collaborators the converter drives: text extraction, table
//! detection, widget persistence and redaction.

use std::fmt;

use crate::model::{Rect, TextSpan};
use crate::widget::{WidgetDescriptor, WidgetKind};

/// Identity the backend assigned to a persisted widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WidgetHandle(u32);

impl WidgetHandle {
    pub fn new(id: u32) -> Self {
        WidgetHandle(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Handle of a checkbox or radio widget. Only obtainable for a descriptor of
/// one of those kinds, so state operations cannot target other widgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ToggleHandle(WidgetHandle);

impl ToggleHandle {
    pub fn of(handle: WidgetHandle, widget: &WidgetDescriptor) -> Option<Self> {
        matches!(widget.kind, WidgetKind::Checkbox(_) | WidgetKind::Radio(_))
            .then_some(ToggleHandle(handle))
    }

    pub fn widget(&self) -> WidgetHandle {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BackendError {
    /// The backend refuses to create this widget.
    Rejected(String),
    UnknownWidget(WidgetHandle),
    Failed(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Rejected(reason) => write!(f, "rejected: {reason}"),
            BackendError::UnknownWidget(h) => write!(f, "unknown widget {}", h.id()),
            BackendError::Failed(reason) => f.write_str(reason),
        }
    }
}

impl std::error::Error for BackendError {}

/// Page text extraction: spans in reading order.
pub trait PageSource {
    fn page_count(&self) -> usize;
    fn spans(&self, page: usize) -> Vec<TextSpan>;
}

/// Table structure detection: candidate cell rectangles of a page.
pub trait TableDetector {
    fn table_cells(&self, page: usize) -> Vec<Rect>;
}

/// Widget persistence and redaction on one exclusively owned document.
pub trait FormBackend {
    fn add_widget(
        &mut self,
        page: usize,
        widget: &WidgetDescriptor,
    ) -> Result<WidgetHandle, BackendError>;

    /// State names the widget currently exposes, `Off` included.
    fn toggle_states(&self, toggle: ToggleHandle) -> Result<Vec<String>, BackendError>;

    /// Select a state. Names outside [`toggle_states`](Self::toggle_states)
    /// are stored as given.
    fn set_toggle_value(&mut self, toggle: ToggleHandle, value: &str) -> Result<(), BackendError>;

    /// Rename the widget's on-state.
    fn set_on_state(&mut self, toggle: ToggleHandle, state: &str) -> Result<(), BackendError>;

    fn link_radio_parent(
        &mut self,
        member: ToggleHandle,
        parent: WidgetHandle,
    ) -> Result<(), BackendError>;

    /// Permanently remove the content inside `rects` from `page`.
    fn redact(&mut self, page: usize, rects: &[Rect]) -> Result<(), BackendError>;
}

/// Everything a conversion run needs from its document.
pub trait FormDocument: PageSource + TableDetector + FormBackend {}

impl<T: PageSource + TableDetector + FormBackend> FormDocument for T {}
