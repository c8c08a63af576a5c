//! Dashboard action controller.
//!
//! Turns UI commands into collaborator requests and feeds their completions
//! back into the [`DashboardStore`]. The controller task is the store's only
//! writer; requests run concurrently but completions are applied one at a time.

use super::store::{DashboardStore, Ticket};
use crate::api::ServerApi;
use crate::error::ApiError;
use crate::model::{
    Empty, Envelope, Phase, ServerItem, ServerList, ServerRecord, StatusFilter,
};
use anyhow::Result;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Reload,
    Ping(String),
    Filter(StatusFilter),
    Save(ServerRecord),
    Delete(ServerRecord),
    Quit,
}

/// A finished collaborator request, tagged with the action it belongs to.
enum Completion {
    Load(Ticket, Result<Envelope<ServerList>, ApiError>),
    Ping(Ticket, Result<Envelope<ServerItem>, ApiError>),
    Filter(Ticket, Result<Envelope<ServerList>, ApiError>),
    Save(Ticket, Result<Envelope<ServerItem>, ApiError>),
    Delete(Ticket, i64, Result<Envelope<Empty>, ApiError>),
}

type InFlight = FuturesUnordered<BoxFuture<'static, Completion>>;

fn start_load(api: &Arc<dyn ServerApi>, store: &mut DashboardStore) -> BoxFuture<'static, Completion> {
    let ticket = store.begin_load();
    let api = api.clone();
    async move { Completion::Load(ticket, api.list_servers().await) }.boxed()
}

/// Run the synchronous half of a command and return the request to await, if any.
fn dispatch(
    api: &Arc<dyn ServerApi>,
    store: &mut DashboardStore,
    cmd: UiCommand,
) -> Option<BoxFuture<'static, Completion>> {
    let api = api.clone();
    match cmd {
        UiCommand::Reload => Some(start_load(&api, store)),
        UiCommand::Ping(ip) => {
            let ticket = store.begin_ping(&ip);
            Some(async move { Completion::Ping(ticket, api.ping_server(&ip).await) }.boxed())
        }
        UiCommand::Filter(status) => {
            let (ticket, current) = store.begin_filter(status);
            Some(
                async move {
                    Completion::Filter(ticket, api.filter_servers(status, &current).await)
                }
                .boxed(),
            )
        }
        UiCommand::Save(server) => {
            let ticket = store.begin_save();
            Some(async move { Completion::Save(ticket, api.save_server(&server).await) }.boxed())
        }
        UiCommand::Delete(server) => {
            let ticket = store.begin_delete();
            match server.id {
                Some(id) => Some(
                    async move { Completion::Delete(ticket, id, api.delete_server(id).await) }
                        .boxed(),
                ),
                None => {
                    store.fail(
                        ticket,
                        ApiError::ServerReported(format!("Server {} has not been saved", server.name)),
                    );
                    None
                }
            }
        }
        // Handled by the controller loop.
        UiCommand::Quit => None,
    }
}

fn apply(store: &mut DashboardStore, done: Completion) {
    match done {
        Completion::Load(t, r) => store.complete_load(t, r),
        Completion::Ping(t, r) => store.complete_ping(t, r),
        Completion::Filter(t, r) => store.complete_filter(t, r),
        Completion::Save(t, r) => store.complete_save(t, r),
        Completion::Delete(t, id, r) => store.complete_delete(t, id, r),
    }
}

/// Process UI commands until `Quit` or until every command sender is dropped.
pub(crate) async fn run_controller(
    api: Arc<dyn ServerApi>,
    mut store: DashboardStore,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
    load_on_launch: bool,
) -> Result<()> {
    let mut in_flight = InFlight::new();
    if load_on_launch {
        in_flight.push(start_load(&api, &mut store));
    }

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Quit) | None => break Ok(()),
                    Some(cmd) => {
                        debug!(?cmd, "command received");
                        if let Some(fut) = dispatch(&api, &mut store, cmd) {
                            in_flight.push(fut);
                        }
                    }
                }
            }
            Some(done) = in_flight.next(), if !in_flight.is_empty() => {
                apply(&mut store, done);
            }
        }
    };

    if !in_flight.is_empty() {
        info!(pending = in_flight.len(), "dropping in-flight requests on shutdown");
    }
    res
}

/// Load the server list once, optionally filtered, for non-interactive output.
pub(crate) async fn load_once(api: &dyn ServerApi, filter: StatusFilter) -> Result<Envelope<ServerList>> {
    let (mut store, view) = DashboardStore::new();
    let ticket = store.begin_load();
    let listed = api.list_servers().await;
    store.complete_load(ticket, listed);

    if filter != StatusFilter::All && view.view.borrow().phase == Phase::Loaded {
        let (ticket, current) = store.begin_filter(filter);
        let filtered = api.filter_servers(filter, &current).await;
        store.complete_filter(ticket, filtered);
    }

    let state = view.view.borrow().clone();
    match (state.phase, state.payload) {
        (Phase::Loaded, Some(env)) => Ok(env),
        _ => Err(anyhow::anyhow!(state
            .error
            .unwrap_or_else(|| "server list unavailable".to_string()))),
    }
}
