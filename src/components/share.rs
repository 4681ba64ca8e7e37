use eframe::egui;

/// What the user picked from the Share menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareAction {
    SavePng,
    CopyToClipboard,
}

/// Toolbar menu. Returns the chosen action, if any, this frame.
pub fn share_menu(ui: &mut egui::Ui, enabled: bool) -> Option<ShareAction> {
    let mut action = None;
    ui.add_enabled_ui(enabled, |ui| {
        ui.menu_button("\u{1F4E4} Share", |ui| {
            if ui.button("Save PNG\u{2026}").clicked() {
                action = Some(ShareAction::SavePng);
                ui.close_menu();
            }
            if ui.button("Copy to clipboard").clicked() {
                action = Some(ShareAction::CopyToClipboard);
                ui.close_menu();
            }
        });
    });
    action
}
