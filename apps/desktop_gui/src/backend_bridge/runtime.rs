//! Runtime bridge: a dedicated thread running a tokio runtime, one session,
//! and a sequential command loop. Consuming one command at a time is the
//! in-process serialization point for pipelines.

use std::{sync::Arc, thread};

use client_core::{bootstrap_workspace, AppConfig, RenderEvent, Session};
use crossbeam_channel::{Receiver, Sender};
use item_store::HttpItemStore;
use shared::domain::AppId;
use tokio::sync::broadcast;

use crate::backend_bridge::commands::BackendCommand;
use crate::config::Settings;
use crate::controller::events::UiEvent;

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                std::process::exit(1);
            }
        };
        runtime.block_on(run(settings, cmd_rx, ui_tx));
    });
}

async fn run(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let store = match HttpItemStore::new(&settings.api_base_url, settings.api_token.clone()) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!("invalid item api base url: {err}");
            std::process::exit(1);
        }
    };
    let space_id = match bootstrap_workspace(store.as_ref()).await {
        Ok(space_id) => space_id,
        Err(err) => {
            tracing::error!("workspace bootstrap failed: {err}");
            std::process::exit(1);
        }
    };

    let mut session = Session::new(
        store,
        space_id,
        AppConfig {
            lists_app: AppId(settings.lists_app_id),
            tasks_app: AppId(settings.tasks_app_id),
            pending_status_option: settings.pending_status_option,
        },
    );
    let mut renders = session.subscribe();
    if let Err(err) = session.initial_load().await {
        tracing::error!("initial load failed: {err}");
        std::process::exit(1);
    }
    forward_renders(&mut renders, &ui_tx);

    while let Ok(command) = cmd_rx.recv() {
        let result = match command {
            BackendCommand::CreateList { title } => session.create_list(&title).await,
            BackendCommand::CreateTask { title } => session.create_task(&title).await,
            BackendCommand::ToggleTask { task_id } => session.toggle_task(task_id).await,
            BackendCommand::DeleteTask { task_id } => session.delete_task(task_id).await,
            BackendCommand::DeleteList { list_id } => session.delete_list(list_id).await,
            BackendCommand::SelectList { fragment } => session.navigate(&fragment).await,
            BackendCommand::Back => session.back().await,
            BackendCommand::Forward => session.forward().await,
            BackendCommand::Refresh => session.initial_load().await,
        };
        // failures stay on the diagnostic channel; the UI keeps its last
        // successfully rendered state
        if let Err(err) = result {
            tracing::error!(error = %err, "pipeline failed");
        }
        forward_renders(&mut renders, &ui_tx);
    }
}

fn forward_renders(renders: &mut broadcast::Receiver<RenderEvent>, ui_tx: &Sender<UiEvent>) {
    loop {
        match renders.try_recv() {
            Ok(RenderEvent::Lists(view)) => {
                let _ = ui_tx.try_send(UiEvent::Lists(view));
            }
            Ok(RenderEvent::Tasks(view)) => {
                let _ = ui_tx.try_send(UiEvent::Tasks(view));
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "render events lagged");
            }
            Err(_) => break,
        }
    }
}
