//! Dashboard view-state store.
//!
//! Owns the last known-good server list and folds action results into it.
//! Every action is split into a synchronous `begin_*` step, which publishes
//! the interim state, and a `complete_*` step that takes the collaborator's
//! result. Presentation layers observe the store through [`DashboardView`].

use crate::error::ApiError;
use crate::model::{
    Empty, Envelope, Notification, ServerItem, ServerList, ServerStatus, StatusFilter, UiSignal,
    ViewState,
};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Status the new-server form is reset to after a successful save.
pub(crate) const FORM_RESET_STATUS: ServerStatus = ServerStatus::Down;

/// Identifies one action. Only the most recent ticket may publish a view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket(u64);

/// Observable outputs handed to presentation layers.
pub(crate) struct DashboardView {
    pub view: watch::Receiver<ViewState>,
    pub selected_status: watch::Receiver<StatusFilter>,
    pub loading: watch::Receiver<bool>,
    pub pinging: watch::Receiver<Option<String>>,
    pub signals: mpsc::UnboundedReceiver<UiSignal>,
}

pub(crate) struct DashboardStore {
    data: Option<Envelope<ServerList>>,
    generation: u64,
    view: watch::Sender<ViewState>,
    selected_status: watch::Sender<StatusFilter>,
    loading: watch::Sender<bool>,
    pinging: watch::Sender<Option<String>>,
    signals: mpsc::UnboundedSender<UiSignal>,
}

impl DashboardStore {
    pub fn new() -> (Self, DashboardView) {
        let (view_tx, view_rx) = watch::channel(ViewState::loading());
        let (status_tx, status_rx) = watch::channel(StatusFilter::All);
        let (loading_tx, loading_rx) = watch::channel(false);
        let (pinging_tx, pinging_rx) = watch::channel(None);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let store = Self {
            data: None,
            generation: 0,
            view: view_tx,
            selected_status: status_tx,
            loading: loading_tx,
            pinging: pinging_tx,
            signals: signal_tx,
        };
        let view = DashboardView {
            view: view_rx,
            selected_status: status_rx,
            loading: loading_rx,
            pinging: pinging_rx,
            signals: signal_rx,
        };
        (store, view)
    }

    /// Last successful server list, newest first.
    #[cfg(test)]
    pub fn data(&self) -> Option<&Envelope<ServerList>> {
        self.data.as_ref()
    }

    /// Copy of the cell, or an empty list before the first load.
    pub fn snapshot(&self) -> Envelope<ServerList> {
        self.data
            .clone()
            .unwrap_or_else(|| Envelope::ok("", ServerList::default()))
    }

    fn next_ticket(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    fn publish(&self, ticket: Ticket, state: ViewState) {
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                current = self.generation,
                "superseded action; view not updated"
            );
            return;
        }
        self.view.send_replace(state);
    }

    fn publish_cell(&self, ticket: Ticket) {
        self.publish(ticket, ViewState::loaded(self.snapshot()));
    }

    fn notify(&self, notification: Notification) {
        let _ = self.signals.send(UiSignal::Notify(notification));
    }

    /// Publish an error state for `ticket` and notify. The cell is left alone.
    pub fn fail(&mut self, ticket: Ticket, err: ApiError) {
        let message = err.to_string();
        debug!(ticket = ticket.0, %message, "action failed");
        self.notify(Notification::error(message.clone()));
        self.publish(ticket, ViewState::error(message));
    }

    pub fn begin_load(&mut self) -> Ticket {
        let ticket = self.next_ticket();
        self.publish(ticket, ViewState::loading());
        ticket
    }

    pub fn complete_load(&mut self, ticket: Ticket, result: Result<Envelope<ServerList>, ApiError>) {
        match result {
            Ok(mut env) => {
                env.data.servers.reverse();
                debug!(count = env.data.servers.len(), "server list loaded");
                self.notify(Notification::info(env.message.clone()));
                self.data = Some(env);
                self.publish_cell(ticket);
            }
            Err(e) => self.fail(ticket, e),
        }
    }

    pub fn begin_ping(&mut self, ip_address: &str) -> Ticket {
        let ticket = self.next_ticket();
        self.pinging.send_replace(Some(ip_address.to_string()));
        self.publish_cell(ticket);
        ticket
    }

    pub fn complete_ping(&mut self, ticket: Ticket, result: Result<Envelope<ServerItem>, ApiError>) {
        self.pinging.send_replace(None);
        match result {
            Ok(env) => {
                let server = env.data.server;
                if let Some(data) = self.data.as_mut() {
                    match data.data.servers.iter().position(|s| s.same_id(&server)) {
                        Some(idx) => data.data.servers[idx] = server,
                        None => debug!(id = ?server.id, "pinged server no longer listed"),
                    }
                }
                self.notify(Notification::info(env.message));
                self.publish_cell(ticket);
            }
            Err(e) => self.fail(ticket, e),
        }
    }

    /// Select `status` and return the list the filter should be applied to.
    pub fn begin_filter(&mut self, status: StatusFilter) -> (Ticket, Envelope<ServerList>) {
        let ticket = self.next_ticket();
        self.selected_status.send_replace(status);
        self.publish_cell(ticket);
        (ticket, self.snapshot())
    }

    /// Filtering is a projection: the cell keeps the unfiltered list.
    pub fn complete_filter(
        &mut self,
        ticket: Ticket,
        result: Result<Envelope<ServerList>, ApiError>,
    ) {
        match result {
            Ok(env) => {
                self.notify(Notification::info(env.message.clone()));
                self.publish(ticket, ViewState::loaded(env));
            }
            Err(e) => self.fail(ticket, e),
        }
    }

    pub fn begin_save(&mut self) -> Ticket {
        let ticket = self.next_ticket();
        self.loading.send_replace(true);
        self.publish_cell(ticket);
        ticket
    }

    pub fn complete_save(&mut self, ticket: Ticket, result: Result<Envelope<ServerItem>, ApiError>) {
        match result {
            Ok(env) => {
                let mut servers = vec![env.data.server.clone()];
                if let Some(data) = self.data.as_ref() {
                    servers.extend(data.data.servers.iter().cloned());
                }
                self.data = Some(env.with_data(ServerList { servers }));
                self.notify(Notification::info(env.message));
                self.loading.send_replace(false);
                let _ = self.signals.send(UiSignal::SaveCompleted {
                    reset_status: FORM_RESET_STATUS,
                });
                self.publish_cell(ticket);
            }
            Err(e) => {
                self.loading.send_replace(false);
                self.fail(ticket, e);
            }
        }
    }

    pub fn begin_delete(&mut self) -> Ticket {
        let ticket = self.next_ticket();
        self.publish_cell(ticket);
        ticket
    }

    pub fn complete_delete(
        &mut self,
        ticket: Ticket,
        id: i64,
        result: Result<Envelope<Empty>, ApiError>,
    ) {
        match result {
            Ok(env) => {
                let servers = self
                    .data
                    .as_ref()
                    .map(|d| {
                        d.data
                            .servers
                            .iter()
                            .filter(|s| s.id != Some(id))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                self.data = Some(env.with_data(ServerList { servers }));
                self.notify(Notification::info(env.message));
                self.publish_cell(ticket);
            }
            Err(e) => self.fail(ticket, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationKind, Phase, ServerRecord};

    fn server(id: i64, status: ServerStatus) -> ServerRecord {
        ServerRecord {
            id: Some(id),
            ip_address: format!("192.168.1.{id}"),
            name: format!("srv-{id}"),
            memory: "16 GB".into(),
            server_type: "Personal PC".into(),
            image_url: String::new(),
            status,
        }
    }

    fn list(servers: Vec<ServerRecord>) -> Envelope<ServerList> {
        Envelope::ok("Servers retrieved", ServerList { servers })
    }

    fn ids(servers: &[ServerRecord]) -> Vec<i64> {
        servers.iter().filter_map(|s| s.id).collect()
    }

    fn drain(view: &mut DashboardView) -> Vec<UiSignal> {
        let mut out = Vec::new();
        while let Ok(sig) = view.signals.try_recv() {
            out.push(sig);
        }
        out
    }

    fn loaded_store(servers: Vec<ServerRecord>) -> (DashboardStore, DashboardView) {
        let (mut store, mut view) = DashboardStore::new();
        let t = store.begin_load();
        store.complete_load(t, Ok(list(servers)));
        drain(&mut view);
        (store, view)
    }

    fn transport() -> ApiError {
        ApiError::Transport("connection refused".into())
    }

    #[test]
    fn load_publishes_loading_then_reversed_list() {
        let (mut store, mut view) = DashboardStore::new();
        let t = store.begin_load();
        assert_eq!(view.view.borrow_and_update().phase, Phase::Loading);

        store.complete_load(
            t,
            Ok(list(vec![
                server(1, ServerStatus::Up),
                server(2, ServerStatus::Down),
                server(3, ServerStatus::Up),
            ])),
        );

        let state = view.view.borrow_and_update().clone();
        assert_eq!(state.phase, Phase::Loaded);
        assert_eq!(ids(state.servers()), vec![3, 2, 1]);
        assert_eq!(ids(&store.data().unwrap().data.servers), vec![3, 2, 1]);
        assert_eq!(
            drain(&mut view),
            vec![UiSignal::Notify(Notification::info("Servers retrieved"))]
        );
    }

    #[test]
    fn load_failure_keeps_previous_cell() {
        let (mut store, mut view) = loaded_store(vec![server(1, ServerStatus::Up)]);
        let before = store.data().cloned();

        let t = store.begin_load();
        store.complete_load(t, Err(transport()));

        let state = view.view.borrow().clone();
        assert_eq!(state.phase, Phase::Error);
        assert_eq!(
            state.error.as_deref(),
            Some("An error occurred - connection refused")
        );
        assert_eq!(store.data().cloned(), before);
        let signals = drain(&mut view);
        assert!(matches!(
            &signals[..],
            [UiSignal::Notify(Notification { kind: NotificationKind::Error, .. })]
        ));
    }

    #[test]
    fn ping_marks_row_and_replaces_matching_record() {
        let (mut store, view) = loaded_store(vec![
            server(1, ServerStatus::Up),
            server(2, ServerStatus::Up),
            server(3, ServerStatus::Up),
        ]);

        let t = store.begin_ping("192.168.1.2");
        assert_eq!(view.pinging.borrow().as_deref(), Some("192.168.1.2"));
        let interim = view.view.borrow().clone();
        assert_eq!(interim.phase, Phase::Loaded);
        assert_eq!(ids(interim.servers()), vec![3, 2, 1]);

        let mut updated = server(2, ServerStatus::Down);
        updated.name = "renamed".into();
        store.complete_ping(t, Ok(Envelope::ok("Ping success", ServerItem { server: updated.clone() })));

        assert_eq!(*view.pinging.borrow(), None);
        let servers = &store.data().unwrap().data.servers;
        assert_eq!(ids(servers), vec![3, 2, 1]);
        assert_eq!(servers[1], updated);
        assert_eq!(servers[0], server(3, ServerStatus::Up));
        assert_eq!(servers[2], server(1, ServerStatus::Up));
        assert_eq!(view.view.borrow().servers(), servers.as_slice());
    }

    #[test]
    fn ping_single_server_flips_status() {
        let (mut store, _view) = loaded_store(vec![server(1, ServerStatus::Up)]);
        let t = store.begin_ping("192.168.1.1");
        store.complete_ping(
            t,
            Ok(Envelope::ok("Ping failed", ServerItem { server: server(1, ServerStatus::Down) })),
        );
        assert_eq!(store.data().unwrap().data.servers, vec![server(1, ServerStatus::Down)]);
    }

    #[test]
    fn ping_for_unknown_id_is_a_no_op() {
        let (mut store, view) = loaded_store(vec![server(1, ServerStatus::Up)]);
        let before = store.data().cloned();
        let t = store.begin_ping("10.9.9.9");
        store.complete_ping(
            t,
            Ok(Envelope::ok("Ping success", ServerItem { server: server(42, ServerStatus::Down) })),
        );
        assert_eq!(store.data().cloned(), before);
        assert_eq!(view.view.borrow().phase, Phase::Loaded);
    }

    #[test]
    fn ping_failure_clears_token_and_keeps_cell() {
        let (mut store, view) = loaded_store(vec![server(1, ServerStatus::Up)]);
        let before = store.data().cloned();
        let t = store.begin_ping("192.168.1.1");
        store.complete_ping(t, Err(ApiError::Status(503)));
        assert_eq!(*view.pinging.borrow(), None);
        assert_eq!(view.view.borrow().phase, Phase::Error);
        assert_eq!(
            view.view.borrow().error.as_deref(),
            Some("An error occurred - Error code: 503")
        );
        assert_eq!(store.data().cloned(), before);
    }

    #[test]
    fn filter_projects_without_touching_cell() {
        let (mut store, mut view) = loaded_store(vec![
            server(1, ServerStatus::Up),
            server(2, ServerStatus::Down),
        ]);
        let before = store.data().cloned();

        let (t, current) = store.begin_filter(StatusFilter::Down);
        assert_eq!(*view.selected_status.borrow(), StatusFilter::Down);
        assert_eq!(Some(&current), before.as_ref());

        let filtered = crate::api::filter_envelope(StatusFilter::Down, &current);
        store.complete_filter(t, Ok(filtered));

        assert_eq!(ids(view.view.borrow().servers()), vec![2]);
        assert_eq!(store.data().cloned(), before);
        assert_eq!(
            drain(&mut view),
            vec![UiSignal::Notify(Notification::info(
                "Servers filtered by SERVER DOWN status"
            ))]
        );
    }

    #[test]
    fn filter_failure_is_error_state() {
        let (mut store, view) = loaded_store(vec![server(1, ServerStatus::Up)]);
        let before = store.data().cloned();
        let (t, _) = store.begin_filter(StatusFilter::Up);
        store.complete_filter(t, Err(transport()));
        assert_eq!(view.view.borrow().phase, Phase::Error);
        assert_eq!(store.data().cloned(), before);
    }

    #[test]
    fn filter_before_first_load_uses_empty_list() {
        let (mut store, _view) = DashboardStore::new();
        let (_, current) = store.begin_filter(StatusFilter::Up);
        assert!(current.data.servers.is_empty());
        assert!(store.data().is_none());
    }

    #[test]
    fn save_prepends_and_signals_form_reset() {
        let (mut store, mut view) = loaded_store(vec![
            server(1, ServerStatus::Up),
            server(2, ServerStatus::Up),
        ]);
        let t = store.begin_save();
        assert!(*view.loading.borrow());

        store.complete_save(
            t,
            Ok(Envelope::ok("Server created", ServerItem { server: server(9, ServerStatus::Down) })),
        );

        assert!(!*view.loading.borrow());
        let servers = &store.data().unwrap().data.servers;
        assert_eq!(ids(servers), vec![9, 2, 1]);
        assert_eq!(store.data().unwrap().message, "Server created");
        assert_eq!(view.view.borrow().phase, Phase::Loaded);
        assert_eq!(
            drain(&mut view),
            vec![
                UiSignal::Notify(Notification::info("Server created")),
                UiSignal::SaveCompleted {
                    reset_status: ServerStatus::Down
                },
            ]
        );
    }

    #[test]
    fn save_failure_clears_loading_and_keeps_cell() {
        let (mut store, mut view) = loaded_store(vec![server(1, ServerStatus::Up)]);
        let before = store.data().cloned();
        let t = store.begin_save();
        store.complete_save(t, Err(transport()));
        assert!(!*view.loading.borrow());
        assert_eq!(view.view.borrow().phase, Phase::Error);
        assert_eq!(store.data().cloned(), before);
        assert!(!drain(&mut view)
            .iter()
            .any(|s| matches!(s, UiSignal::SaveCompleted { .. })));
    }

    #[test]
    fn delete_removes_every_matching_id() {
        let (mut store, _view) = loaded_store(vec![
            server(1, ServerStatus::Up),
            server(2, ServerStatus::Up),
            server(1, ServerStatus::Down),
            server(3, ServerStatus::Up),
        ]);
        let t = store.begin_delete();
        store.complete_delete(t, 1, Ok(Envelope::ok("Server deleted", Empty {})));
        let servers = &store.data().unwrap().data.servers;
        assert_eq!(ids(servers), vec![3, 2]);
    }

    #[test]
    fn delete_failure_keeps_cell() {
        let (mut store, view) = loaded_store(vec![server(1, ServerStatus::Up)]);
        let before = store.data().cloned();
        let t = store.begin_delete();
        store.complete_delete(t, 1, Err(transport()));
        assert_eq!(view.view.borrow().phase, Phase::Error);
        assert_eq!(store.data().cloned(), before);
    }

    #[test]
    fn superseded_completion_updates_cell_but_not_view() {
        let (mut store, view) = loaded_store(vec![server(1, ServerStatus::Up)]);

        let save = store.begin_save();
        let (filter, current) = store.begin_filter(StatusFilter::Up);
        store.complete_save(
            save,
            Ok(Envelope::ok("Server created", ServerItem { server: server(2, ServerStatus::Up) })),
        );

        // The filter is the latest action, so its interim state is still shown.
        assert_eq!(ids(view.view.borrow().servers()), vec![1]);
        assert_eq!(ids(&store.data().unwrap().data.servers), vec![2, 1]);

        store.complete_filter(filter, Ok(crate::api::filter_envelope(StatusFilter::Up, &current)));
        assert_eq!(view.view.borrow().phase, Phase::Loaded);
    }
}
