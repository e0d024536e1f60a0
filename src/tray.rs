//! The build and settings trays, described with EGUI. The host renders them; clicks come back as
//! `TrayAction`s for the session to apply.

use egui::{Align2, ComboBox, Context, Slider};

use crate::{
    config::{Preferences, RESOLUTIONS},
    types::EntityKind,
};

const TRAY_MARGIN: f32 = 10.;
const BUTTON_WIDTH: f32 = 90.;

#[derive(Clone, Debug, PartialEq)]
pub enum TrayAction {
    Create(EntityKind),
    /// Delete the selection.
    Remove,
    Undo,
    /// Deselect.
    Release,
    OpenSettings,
    /// Leave the settings tray, resuming the session.
    Return,
    SetFxVolume(f32),
    SetMusicVolume(f32),
    SetResolution(String),
}

/// What the build tray shows.
#[derive(Clone, Debug)]
pub struct Hud {
    pub cash: u32,
    /// `MM:SS`.
    pub clock: String,
    pub has_selection: bool,
    pub can_undo: bool,
}

fn button(ui: &mut egui::Ui, label: &str, enabled: bool) -> bool {
    ui.add_enabled(
        enabled,
        egui::Button::new(label).min_size(egui::vec2(BUTTON_WIDTH, 0.)),
    )
    .clicked()
}

/// Cash and time left along the top, and the build buttons down the left edge.
pub fn build_tray(ctx: &Context, hud: &Hud) -> Option<TrayAction> {
    let mut action = None;

    egui::Window::new("status")
        .title_bar(false)
        .resizable(false)
        .anchor(Align2::CENTER_TOP, [0., TRAY_MARGIN])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Cash: ${}", hud.cash));
                ui.add_space(20.);
                ui.label(format!("Time: {}", hud.clock));
            });
        });

    egui::Window::new("Build")
        .resizable(false)
        .collapsible(false)
        .anchor(Align2::LEFT_TOP, [TRAY_MARGIN, TRAY_MARGIN])
        .show(ctx, |ui| {
            for kind in [EntityKind::Rail, EntityKind::Decoration] {
                let label = match kind {
                    EntityKind::Rail => "New",
                    EntityKind::Decoration => kind.label(),
                };
                if button(ui, label, hud.cash >= kind.cost()) {
                    action = Some(TrayAction::Create(kind));
                }
            }

            if button(ui, "Remove", hud.has_selection) {
                action = Some(TrayAction::Remove);
            }
            if button(ui, "Undo", hud.can_undo) {
                action = Some(TrayAction::Undo);
            }
            if button(ui, "Release", hud.has_selection) {
                action = Some(TrayAction::Release);
            }

            ui.separator();
            if button(ui, "Settings", true) {
                action = Some(TrayAction::OpenSettings);
            }
        });

    action
}

/// Volume sliders and the resolution menu, centered over the paused scene.
pub fn settings_tray(ctx: &Context, prefs: &Preferences) -> Option<TrayAction> {
    let mut action = None;

    let mut fx = prefs.fx_volume;
    let mut music = prefs.music_volume;
    let mut resolution = prefs.resolution.clone();

    egui::Window::new("Settings")
        .resizable(false)
        .collapsible(false)
        .anchor(Align2::CENTER_CENTER, [0., 0.])
        .show(ctx, |ui| {
            if ui
                .add(Slider::new(&mut fx, 0.0..=1.0).step_by(0.05).text("FX volume"))
                .changed()
            {
                action = Some(TrayAction::SetFxVolume(fx));
            }
            if ui
                .add(
                    Slider::new(&mut music, 0.0..=1.0)
                        .step_by(0.05)
                        .text("Music volume"),
                )
                .changed()
            {
                action = Some(TrayAction::SetMusicVolume(music));
            }

            ComboBox::from_label("Resolution")
                .selected_text(resolution.as_str())
                .show_ui(ui, |ui| {
                    for res in RESOLUTIONS {
                        if ui
                            .selectable_value(&mut resolution, res.to_owned(), res)
                            .changed()
                        {
                            action = Some(TrayAction::SetResolution(res.to_owned()));
                        }
                    }
                });

            ui.separator();
            if button(ui, "Return", true) {
                action = Some(TrayAction::Return);
            }
        });

    action
}
