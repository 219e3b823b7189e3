//! Recording implementations of the UI contract.
//!
//! Every call is captured in a shared log that tests (or a headless host)
//! can inspect through a [`ViewProbe`] or [`PanelProbe`].

use crate::ui::{Confirmation, PanelBuilder, ProcessView, Summary};
use parking_lot::Mutex;
use pd_protocol::process_models::{InteractionParameter, ProcessState};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A rendered field.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedField {
    pub value: Value,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct ViewLog {
    step: Option<String>,
    fields: BTreeMap<String, RecordedField>,
    busy: bool,
    rebuilds: usize,
    in_place_updates: usize,
    busy_toggles: usize,
    messages: Vec<String>,
    summaries: Vec<Summary>,
    confirmations: Vec<Confirmation>,
    children: Vec<ViewProbe>,
}

/// Read access to the log of a [`RecordingView`].
#[derive(Debug, Clone, Default)]
pub struct ViewProbe(Arc<Mutex<ViewLog>>);

impl ViewProbe {
    /// Step shown by the last full rebuild.
    pub fn step(&self) -> Option<String> {
        self.0.lock().step.clone()
    }

    pub fn field(&self, name: &str) -> Option<RecordedField> {
        self.0.lock().fields.get(name).cloned()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.lock().fields.keys().cloned().collect()
    }

    pub fn is_busy(&self) -> bool {
        self.0.lock().busy
    }

    /// Number of full panel rebuilds.
    pub fn rebuilds(&self) -> usize {
        self.0.lock().rebuilds
    }

    /// Number of successful in-place field updates.
    pub fn in_place_updates(&self) -> usize {
        self.0.lock().in_place_updates
    }

    pub fn busy_toggles(&self) -> usize {
        self.0.lock().busy_toggles
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.lock().messages.clone()
    }

    pub fn summaries(&self) -> Vec<Summary> {
        self.0.lock().summaries.clone()
    }

    pub fn confirmations(&self) -> Vec<Confirmation> {
        self.0.lock().confirmations.clone()
    }

    /// Probes of the child views created so far.
    pub fn children(&self) -> Vec<ViewProbe> {
        self.0.lock().children.clone()
    }
}

/// [`ProcessView`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingView {
    log: ViewProbe,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> ViewProbe {
        self.log.clone()
    }
}

impl ProcessView for RecordingView {
    fn render(&mut self, state: &ProcessState) {
        let mut log = self.log.0.lock();
        log.rebuilds += 1;
        log.step = Some(state.step.clone());
        log.fields = state
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    RecordedField {
                        value: p.value.clone(),
                        error: None,
                    },
                )
            })
            .collect();
    }

    fn update_field(&mut self, parameter: &InteractionParameter) -> bool {
        let mut log = self.log.0.lock();
        let Some(field) = log.fields.get_mut(&parameter.name) else {
            return false;
        };
        field.value = parameter.value.clone();
        field.error = None;
        log.in_place_updates += 1;
        true
    }

    fn show_field_error(&mut self, field: &str, message: &str) -> bool {
        let mut log = self.log.0.lock();
        match log.fields.get_mut(field) {
            Some(recorded) => {
                recorded.error = Some(message.to_string());
                true
            }
            None => false,
        }
    }

    fn show_message(&mut self, message: &str) {
        self.log.0.lock().messages.push(message.to_string());
    }

    fn set_busy(&mut self, busy: bool) {
        let mut log = self.log.0.lock();
        if log.busy != busy {
            log.busy_toggles += 1;
        }
        log.busy = busy;
    }

    fn show_summary(&mut self, summary: &Summary) {
        self.log.0.lock().summaries.push(summary.clone());
    }

    fn ask_confirmation(&mut self, confirmation: &Confirmation) {
        self.log.0.lock().confirmations.push(confirmation.clone());
    }

    fn child_view(&mut self, _state: &ProcessState) -> Box<dyn ProcessView> {
        let child = RecordingView::new();
        self.log.0.lock().children.push(child.probe());
        Box::new(child)
    }
}

/// An item added to a recorded panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelItem {
    Toolbar(String),
    Button {
        id: String,
        label: String,
        enabled: bool,
    },
    Label(String),
}

#[derive(Debug, Default)]
struct PanelLog {
    panels: BTreeMap<String, Vec<PanelItem>>,
    process_views: Vec<(String, ViewProbe)>,
}

/// Read access to the log of a [`RecordingPanels`] builder.
#[derive(Debug, Clone, Default)]
pub struct PanelProbe(Arc<Mutex<PanelLog>>);

impl PanelProbe {
    pub fn items(&self, panel: &str) -> Vec<PanelItem> {
        self.0.lock().panels.get(panel).cloned().unwrap_or_default()
    }

    /// Enabled flag of the button `id` in `panel`, if present.
    pub fn button_enabled(&self, panel: &str, id: &str) -> Option<bool> {
        self.items(panel).into_iter().find_map(|item| match item {
            PanelItem::Button { id: b, enabled, .. } if b == id => Some(enabled),
            _ => None,
        })
    }

    pub fn labels(&self, panel: &str) -> Vec<String> {
        self.items(panel)
            .into_iter()
            .filter_map(|item| match item {
                PanelItem::Label(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Probes of all process panels created, in creation order.
    pub fn process_views(&self) -> Vec<(String, ViewProbe)> {
        self.0.lock().process_views.clone()
    }

    /// Probe of the most recently created process panel.
    pub fn last_process_view(&self) -> Option<ViewProbe> {
        self.0.lock().process_views.last().map(|(_, p)| p.clone())
    }
}

/// [`PanelBuilder`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingPanels {
    log: PanelProbe,
}

impl RecordingPanels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> PanelProbe {
        self.log.clone()
    }

    fn push(&mut self, panel: &str, item: PanelItem) {
        self.log
            .0
            .lock()
            .panels
            .entry(panel.to_string())
            .or_default()
            .push(item);
    }
}

impl PanelBuilder for RecordingPanels {
    fn clear(&mut self, panel: &str) {
        self.log.0.lock().panels.remove(panel);
    }

    fn add_toolbar(&mut self, panel: &str, id: &str) {
        self.push(panel, PanelItem::Toolbar(id.to_string()));
    }

    fn add_button(&mut self, panel: &str, id: &str, label: &str, enabled: bool) {
        self.push(
            panel,
            PanelItem::Button {
                id: id.to_string(),
                label: label.to_string(),
                enabled,
            },
        );
    }

    fn add_label(&mut self, panel: &str, text: &str) {
        self.push(panel, PanelItem::Label(text.to_string()));
    }

    fn process_panel(&mut self, process_name: &str) -> Box<dyn ProcessView> {
        let view = RecordingView::new();
        self.log
            .0
            .lock()
            .process_views
            .push((process_name.to_string(), view.probe()));
        Box::new(view)
    }
}
