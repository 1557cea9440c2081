//! Two-panel immediate-mode shell: lists on the left, tasks of the selected
//! list in the center. Each frame repaints both regions from the latest view
//! models, so a redraw always fully replaces prior content.

use std::time::Duration;

use client_core::{ListsView, TasksView};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;

pub struct TodoApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    lists: ListsView,
    tasks: TasksView,
    list_input: String,
    task_input: String,
    status: String,
}

impl TodoApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            lists: ListsView::default(),
            tasks: TasksView::NoSelection,
            list_input: String::new(),
            task_input: String::new(),
            status: String::new(),
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Lists(view) => self.lists = view,
                UiEvent::Tasks(view) => self.tasks = view,
            }
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn lists_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Lists");
        let input = ui.text_edit_singleline(&mut self.list_input);
        if input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            // the input clears immediately, before the pipeline settles
            let title = std::mem::take(&mut self.list_input);
            if !title.trim().is_empty() {
                self.dispatch(BackendCommand::CreateList { title });
            }
        }
        ui.separator();

        let rows = self.lists.rows.clone();
        if rows.is_empty() {
            ui.weak("No lists yet.");
        }
        for row in rows {
            ui.horizontal(|ui| {
                if ui.selectable_label(row.active, &row.title).clicked() {
                    self.dispatch(BackendCommand::SelectList {
                        fragment: row.fragment.clone(),
                    });
                }
                if ui.small_button("✖").clicked() {
                    self.dispatch(BackendCommand::DeleteList { list_id: row.id });
                }
            });
        }
    }

    fn tasks_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("⟵").clicked() {
                self.dispatch(BackendCommand::Back);
            }
            if ui.button("⟶").clicked() {
                self.dispatch(BackendCommand::Forward);
            }
            ui.heading("Tasks");
        });

        match self.tasks.clone() {
            TasksView::NoSelection => {
                ui.weak("Select a list.");
            }
            TasksView::NoTasks { .. } => {
                self.task_input_row(ui);
                ui.separator();
                ui.weak("(No tasks)");
            }
            TasksView::Rows { rows, .. } => {
                self.task_input_row(ui);
                ui.separator();
                for row in rows {
                    ui.horizontal(|ui| {
                        let mut done = row.done;
                        if ui.checkbox(&mut done, &row.title).changed() {
                            self.dispatch(BackendCommand::ToggleTask { task_id: row.id });
                        }
                        if ui.small_button("✖").clicked() {
                            self.dispatch(BackendCommand::DeleteTask { task_id: row.id });
                        }
                    });
                }
            }
        }
    }

    fn task_input_row(&mut self, ui: &mut egui::Ui) {
        let input = ui.text_edit_singleline(&mut self.task_input);
        if input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            let title = std::mem::take(&mut self.task_input);
            if !title.trim().is_empty() {
                self.dispatch(BackendCommand::CreateTask { title });
            }
        }
    }
}

impl eframe::App for TodoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        egui::SidePanel::left("lists_panel")
            .default_width(260.0)
            .show(ctx, |ui| self.lists_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.tasks_panel(ui);
            if !self.status.is_empty() {
                ui.separator();
                ui.label(&self.status);
            }
        });

        // backend renders arrive between frames
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}
