//! Command orchestration helpers from UI actions to the backend queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::CreateList { .. } => "create_list",
        BackendCommand::CreateTask { .. } => "create_task",
        BackendCommand::ToggleTask { .. } => "toggle_task",
        BackendCommand::DeleteTask { .. } => "delete_task",
        BackendCommand::DeleteList { .. } => "delete_list",
        BackendCommand::SelectList { .. } => "select_list",
        BackendCommand::Back => "back",
        BackendCommand::Forward => "forward",
        BackendCommand::Refresh => "refresh",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "Command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend worker disconnected; restart the app".to_string();
        }
    }
}
