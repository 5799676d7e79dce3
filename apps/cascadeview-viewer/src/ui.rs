use cascadeview_assets::AssetSource;
use cascadeview_common::RenderMode;
use cascadeview_scene::{Axis, ControlRange, POSITION_RANGE, ROTATION_RANGE, SCALE_RANGE, SceneEdit};
use egui::Context as EguiContext;

use crate::state::ViewerState;

const MIN_VIEWPORT: u32 = 64;

/// Pane shown instead of the view when nothing can be rendered.
pub fn draw_blocking_message(ctx: &EguiContext, message: &str) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.heading("Nothing to show");
            ui.label(message);
        });
    });
}

pub fn draw_ui<S: AssetSource>(state: &mut ViewerState<S>, ctx: &EguiContext, window: [u32; 2]) {
    if !state.has_scenes() {
        draw_blocking_message(
            ctx,
            "No scenes requested. Add `scene=<name>` to the query to load one.",
        );
        return;
    }

    egui::SidePanel::right("controls")
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.heading("cascadeview");
            ui.monospace(state.session.progress_readout());
            ui.label(state.stats.summary());
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                global_controls(state, ui, window);
                ui.separator();
                let names: Vec<String> = state.composer.scene_names().map(String::from).collect();
                for name in &names {
                    scene_controls(state, ui, name);
                }
                ui.separator();
                if ui.button("Save config URL").clicked() {
                    state.open_share_dialog();
                }
            });
        });

    share_dialog(state, ctx);
}

fn global_controls<S: AssetSource>(state: &mut ViewerState<S>, ui: &mut egui::Ui, window: [u32; 2]) {
    ui.label("Background");
    let mut rgb = state.background_rgb();
    if ui.color_edit_button_srgb(&mut rgb).changed() {
        state.set_background(rgb);
    }

    let [max_width, max_height] = state.viewport_limits(window);
    let (mut width, mut height) = state.view.global.viewport(window[0], window[1]);
    if ui
        .add(egui::Slider::new(&mut height, MIN_VIEWPORT..=max_height).text("H"))
        .changed()
    {
        state.set_viewport_height(height);
    }
    if ui
        .add(egui::Slider::new(&mut width, MIN_VIEWPORT..=max_width).text("W"))
        .changed()
    {
        state.set_viewport_width(width);
    }

    let global = &state.view.global;
    let (mut fovy, mut near, mut far) = (global.fovy, global.near, global.far);
    let mut lens = false;
    lens |= ui
        .add(egui::Slider::new(&mut fovy, 0.001..=180.0).text("fovy"))
        .changed();
    lens |= ui
        .add(egui::Slider::new(&mut near, 0.001..=10.0).text("near"))
        .changed();
    lens |= ui
        .add(egui::Slider::new(&mut far, 0.001..=1000.0).text("far"))
        .changed();
    if lens {
        state.set_lens(fovy, near, far);
    }
}

fn axis_sliders(
    ui: &mut egui::Ui,
    label: &str,
    values: [f32; 3],
    range: ControlRange,
    edit: fn(Axis, f32) -> SceneEdit,
    edits: &mut Vec<SceneEdit>,
) {
    for (axis, mut value) in Axis::ALL.into_iter().zip(values) {
        let text = format!("{label}_{}", axis.label());
        if ui
            .add(egui::Slider::new(&mut value, range.as_range()).text(text))
            .changed()
        {
            edits.push(edit(axis, value));
        }
    }
}

fn scene_controls<S: AssetSource>(state: &mut ViewerState<S>, ui: &mut egui::Ui, name: &str) {
    let Some(params) = state.composer.params(name) else {
        return;
    };
    let mut edits = Vec::new();

    egui::CollapsingHeader::new(name)
        .default_open(false)
        .show(ui, |ui| {
            ui.label(format!("objects: {}", state.composer.objects(name).len()));

            let mut mode = params.render_mode;
            egui::ComboBox::from_id_salt(("render_mode", name))
                .selected_text(mode.label())
                .show_ui(ui, |ui| {
                    for candidate in RenderMode::ALL {
                        ui.selectable_value(&mut mode, candidate, candidate.label());
                    }
                });
            if mode != params.render_mode {
                edits.push(SceneEdit::RenderMode(mode));
            }

            axis_sliders(
                ui,
                "pos",
                params.position.to_array(),
                POSITION_RANGE,
                SceneEdit::Position,
                &mut edits,
            );
            axis_sliders(
                ui,
                "scale",
                params.scale.to_array(),
                SCALE_RANGE,
                SceneEdit::Scale,
                &mut edits,
            );
            axis_sliders(
                ui,
                "rot",
                params.rotation_deg.to_array(),
                ROTATION_RANGE,
                SceneEdit::Rotation,
                &mut edits,
            );
        });

    for edit in edits {
        if let Err(e) = state.apply_edit(name, edit) {
            tracing::warn!("edit rejected: {e}");
        }
    }
}

fn share_dialog<S: AssetSource>(state: &mut ViewerState<S>, ctx: &EguiContext) {
    let Some(url) = state.share_dialog.as_mut() else {
        return;
    };
    let mut open = true;
    let mut copy = false;
    egui::Window::new("Configuration URL")
        .open(&mut open)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.add(
                egui::TextEdit::multiline(url)
                    .desired_width(f32::INFINITY)
                    .code_editor(),
            );
            copy = ui.button("Copy").clicked();
        });
    if copy {
        ctx.copy_text(url.clone());
    }
    if !open {
        state.share_dialog = None;
    }
}
