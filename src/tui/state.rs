use super::form::ServerForm;
use crate::model::{
    NotificationKind, Phase, ServerRecord, StatusFilter, UiSignal, ViewState,
};
use crate::orchestrator::DashboardView;
use crate::report::ReportFormat;
use std::path::PathBuf;

pub struct UiState {
    pub tab: usize,
    pub view: ViewState,
    pub selected_status: StatusFilter,
    pub loading: bool,
    pub pinging: Option<String>,
    pub info: String,
    pub info_is_error: bool,
    pub selected: usize, // Index of selected row in the rendered list
    pub scroll_offset: usize,
    pub form: ServerForm,
    pub form_open: bool,
    // Filter requested on the command line, applied once the first list arrives
    pub pending_filter: Option<StatusFilter>,
    pub base_url: String,
    pub report_dir: PathBuf,
    pub export_format: ReportFormat,
    pub last_exported_path: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            view: ViewState::loading(),
            selected_status: StatusFilter::All,
            loading: false,
            pinging: None,
            info: String::new(),
            info_is_error: false,
            selected: 0,
            scroll_offset: 0,
            form: ServerForm::default(),
            form_open: false,
            pending_filter: None,
            base_url: String::new(),
            report_dir: PathBuf::from("."),
            export_format: ReportFormat::Xls,
            last_exported_path: None,
        }
    }
}

impl UiState {
    /// Rows currently rendered.
    pub fn rows(&self) -> &[ServerRecord] {
        self.view.servers()
    }

    pub fn selected_server(&self) -> Option<&ServerRecord> {
        self.rows().get(self.selected)
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.info = message.into();
        self.info_is_error = false;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.info = message.into();
        self.info_is_error = true;
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.scroll_offset {
                self.scroll_offset = self.selected;
            }
        }
    }

    pub fn select_next(&mut self, visible_rows: usize) {
        if self.selected + 1 < self.rows().len() {
            self.selected += 1;
            let visible_rows = visible_rows.max(1);
            if self.selected >= self.scroll_offset + visible_rows {
                self.scroll_offset = self.selected + 1 - visible_rows;
            }
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            self.selected = 0;
            self.scroll_offset = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
        if self.scroll_offset > self.selected {
            self.scroll_offset = self.selected;
        }
    }

    /// Pull the latest observable outputs from the store.
    ///
    /// Returns a filter that should now be sent, if the command-line filter was
    /// waiting for the first loaded list.
    pub fn sync(&mut self, store: &mut DashboardView) -> Option<StatusFilter> {
        if store.view.has_changed().unwrap_or(false) {
            self.view = store.view.borrow_and_update().clone();
            self.clamp_selection();
        }
        if store.selected_status.has_changed().unwrap_or(false) {
            self.selected_status = *store.selected_status.borrow_and_update();
        }
        if store.loading.has_changed().unwrap_or(false) {
            self.loading = *store.loading.borrow_and_update();
        }
        if store.pinging.has_changed().unwrap_or(false) {
            self.pinging = store.pinging.borrow_and_update().clone();
        }

        while let Ok(signal) = store.signals.try_recv() {
            match signal {
                UiSignal::Notify(n) => match n.kind {
                    NotificationKind::Default => self.set_info(n.message),
                    NotificationKind::Error => self.set_error(n.message),
                },
                UiSignal::SaveCompleted { reset_status } => {
                    self.form.reset(reset_status);
                    self.form_open = false;
                }
            }
        }

        if self.view.phase == Phase::Loaded {
            self.pending_filter.take()
        } else {
            None
        }
    }
}
