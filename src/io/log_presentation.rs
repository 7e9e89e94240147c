//! Presentation that narrates the tour into the log

use crate::domain::setting::{ContentDirective, DomNames};
use crate::domain::types::StopState;
use crate::io::ports::Presentation;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Logs what a UI would show, with each stop's identifier for context
pub struct LogPresentation {
    identifiers: Vec<String>,
    dom_names: DomNames,
}

impl LogPresentation {
    pub fn new(identifiers: Vec<String>, dom_names: DomNames) -> Self {
        Self {
            identifiers,
            dom_names,
        }
    }

    fn label(&self, step: usize) -> &str {
        self.identifiers
            .get(step)
            .map(String::as_str)
            .filter(|identifier| !identifier.is_empty())
            .unwrap_or("-")
    }
}

impl Presentation for LogPresentation {
    fn stop_state_changed(&mut self, step: usize, state: StopState) {
        info!(step, stop = self.label(step), state = state.as_str(), "ui_stop_state");
    }

    fn block_added(&mut self, step: usize, block: &str) {
        debug!(step, stop = self.label(step), block, "ui_block_added");
    }

    fn block_removed(&mut self, step: usize, block: &str) {
        debug!(step, stop = self.label(step), block, "ui_block_removed");
    }

    fn tour_style_enabled(&mut self, enabled: bool) {
        debug!(wrapper = %self.dom_names.wrapper_id, enabled, "ui_tour_style");
    }

    fn render_content(
        &mut self,
        step: usize,
        content: &BTreeMap<String, ContentDirective>,
    ) -> Vec<String> {
        for (class, directive) in content {
            match directive {
                ContentDirective::Html(html) => {
                    info!(step, stop = self.label(step), class = %class, html = %html, "ui_content");
                }
                ContentDirective::Fields(fields) => {
                    info!(
                        step,
                        stop = self.label(step),
                        class = %class,
                        text = fields.text.as_deref().unwrap_or(""),
                        src = fields.src.as_deref().unwrap_or(""),
                        href = fields.href.as_deref().unwrap_or(""),
                        "ui_content"
                    );
                }
            }
        }
        Vec::new()
    }

    fn exit_confirmation_visible(&mut self, visible: bool) {
        info!(visible, confirm = %self.dom_names.exit_confirm_class, "ui_exit_confirmation");
    }
}
