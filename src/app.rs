use egui::{Event, PointerButton, Pos2, Sense};
use futures::executor::block_on;
use image::RgbaImage;
use log::{debug, error, info};
use std::sync::Arc;

use crate::capture::{DirectoryFonts, FileExportSink};
use crate::command::{Command, CommandError, CommandResult};
use crate::export::ExportOptions;
use crate::renderer::Renderer;
use crate::state::{EditorContext, FileSessionStore, ToolConfig};
use crate::tools::ToolKind;

/// Storage key of the style settings
const CONFIG_KEY: &str = "tool_config";

/// Annotation overlay window: canvas, tool row and export button.
pub struct OverlayApp {
    editor: EditorContext,
    renderer: Renderer,
    sink: FileExportSink,
    /// A primary-button gesture started on the canvas
    pointer_down: bool,
    status: Option<String>,
}

impl OverlayApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, image: Option<RgbaImage>) -> Self {
        let config: ToolConfig = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, CONFIG_KEY))
            .unwrap_or_default();
        let store = Arc::new(FileSessionStore::new(std::env::temp_dir().join("annotation-overlay")));
        let initial_size = cc.egui_ctx.screen_rect().size();
        let mut editor = EditorContext::new(initial_size, config, store).with_fonts(Arc::new(DirectoryFonts::system()));
        editor.set_scale_factor(cc.egui_ctx.pixels_per_point());
        if let Some(image) = image {
            editor.open_image(image);
        }

        Self {
            editor,
            renderer: Renderer::new(&cc.egui_ctx),
            sink: FileExportSink::from_env(),
            pointer_down: false,
            status: None,
        }
    }

    /// Log rejected commands; they never reach the user as errors.
    fn report(&mut self, result: CommandResult) {
        match result {
            Ok(()) => {}
            Err(CommandError::NoSelection | CommandError::NotEditing) => {}
            Err(CommandError::History(e)) => debug!("{e}"),
            Err(e) => {
                debug!("Command rejected: {e}");
                self.status = Some(e.to_string());
            }
        }
    }

    fn execute(&mut self, command: Command) {
        let result = self.editor.execute(command);
        self.report(result);
    }

    /// Runs to completion on the UI thread; `export` borrows the editor
    /// mutably, so exports never overlap.
    fn export(&mut self, pixels_per_point: f32) {
        let options = ExportOptions {
            pixel_ratio: pixels_per_point,
            ..Default::default()
        };
        let result = block_on(self.editor.export(&self.sink, options));
        self.status = Some(match result {
            Ok(outcome) => format!("Saved {}x{} to {}", outcome.width, outcome.height, outcome.path.display()),
            Err(e) => {
                error!("Export failed: {e}");
                format!("Export failed: {e}")
            }
        });
    }

    fn tool_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let active = self.editor.active_tool();
            for kind in ToolKind::ALL {
                if ui.selectable_label(active == kind, kind.name()).clicked() {
                    self.editor.set_tool(kind);
                }
            }
            ui.separator();

            let config = self.editor.config_mut();
            egui::color_picker::color_edit_button_srgba(ui, &mut config.color, egui::color_picker::Alpha::Opaque);
            ui.add(egui::Slider::new(&mut config.stroke_width, 1.0..=30.0).text("Width"));
            ui.separator();

            if ui.add_enabled(self.editor.history().can_undo(), egui::Button::new("Undo")).clicked() {
                self.execute(Command::Undo);
            }
            if ui.add_enabled(self.editor.history().can_redo(), egui::Button::new("Redo")).clicked() {
                self.execute(Command::Redo);
            }
            if ui.add_enabled(self.editor.selection().is_some(), egui::Button::new("Apply style")).clicked() {
                self.execute(Command::ApplyStyle);
            }
            if ui.add_enabled(self.editor.crop().is_some(), egui::Button::new("Clear crop")).clicked() {
                self.execute(Command::ClearCrop);
            }
            if ui.add_enabled(!self.editor.overlays().holes.is_empty(), egui::Button::new("Clear spotlight")).clicked() {
                self.execute(Command::ClearSpotlight);
            }
            if ui.button("Clear all").clicked() {
                self.execute(Command::ClearAll);
            }
            if ui.button("Export").clicked() {
                self.export(ui.ctx().pixels_per_point());
            }
            if let Some(status) = &self.status {
                ui.label(status);
            }
        });
    }

    /// Feed this frame's raw input to the engine
    fn handle_events(&mut self, ctx: &egui::Context, canvas: egui::Rect) {
        let wants_keyboard = ctx.wants_keyboard_input();
        let events = ctx.input(|i| i.events.clone());
        let mut modifiers = ctx.input(|i| i.modifiers);
        let local = |pos: Pos2| pos - canvas.min.to_vec2();

        for event in events {
            match event {
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    modifiers: m,
                } => {
                    modifiers = m;
                    if pressed && canvas.contains(pos) {
                        self.pointer_down = true;
                        let result = self.editor.pointer_down(local(pos), m);
                        self.report(result);
                    } else if !pressed && self.pointer_down {
                        self.pointer_down = false;
                        let result = self.editor.pointer_up(local(pos), m);
                        self.report(result);
                    }
                }
                Event::PointerMoved(pos) if self.pointer_down => {
                    let result = self.editor.pointer_move(local(pos), modifiers);
                    self.report(result);
                }
                Event::Key {
                    key,
                    pressed: true,
                    modifiers: m,
                    ..
                } if !wants_keyboard => {
                    let result = self.editor.handle_key(key, m);
                    self.report(result);
                }
                Event::Text(text) if !wants_keyboard => {
                    let result = self.editor.insert_text(&text);
                    self.report(result);
                }
                Event::Copy if !wants_keyboard => self.execute(Command::Copy),
                Event::Cut if !wants_keyboard => self.execute(Command::Cut),
                Event::Paste(text) if !wants_keyboard => {
                    if self.editor.editing_text().is_some() {
                        let result = self.editor.insert_text(&text);
                        self.report(result);
                    } else {
                        self.execute(Command::Paste);
                    }
                }
                _ => {}
            }
        }
    }
}

impl eframe::App for OverlayApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, CONFIG_KEY, self.editor.config());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("tools").show(ctx, |ui| self.tool_row(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
                let canvas = response.rect;
                self.editor.set_canvas_size(canvas.size());
                self.editor.set_scale_factor(ctx.pixels_per_point());
                self.handle_events(ctx, canvas);

                if self.editor.has_pending_captures() {
                    let resolved = block_on(self.editor.process_pending_captures());
                    info!("Stored {resolved} blur patch(es)");
                }

                self.renderer.render(&painter, canvas.min.to_vec2(), &self.editor);
            });
    }
}
