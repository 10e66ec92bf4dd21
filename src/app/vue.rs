// src/app/vue.rs
//
// Vue (UI egui): natif + web
// ---------------------------
// Deux colonnes :
// - gauche : la note (TextEdit multiligne, police code)
// - droite : un résultat par ligne, aligné sur la note
// Pied de page : compteurs du cache.
//
// Recalcul à chaque modification du texte (resp.changed()).

use eframe::egui;

use super::etat::AppCalepin;

/// Part de la largeur donnée à la note.
const PART_NOTE: f32 = 0.62;

impl AppCalepin {
    /// UI principale : à appeler depuis eframe::App::update(...)
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);

        ui.horizontal(|ui| {
            ui.heading("Calepin");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button("Effacer")
                    .on_hover_text("Vide la note")
                    .clicked()
                {
                    self.effacer();
                }
            });
        });
        ui.separator();

        egui::TopBottomPanel::bottom("pied_stats")
            .show_separator_line(true)
            .show_inside(ui, |ui| self.ui_stats(ui));

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.horizontal_top(|ui| {
                    let largeur = ui.available_width();
                    self.ui_note(ui, largeur * PART_NOTE);
                    ui.separator();
                    self.ui_resultats(ui);
                });
            });
    }

    fn ui_note(&mut self, ui: &mut egui::Ui, largeur: f32) {
        let resp = ui.add(
            egui::TextEdit::multiline(&mut self.texte)
                .id_salt("note_edit")
                .code_editor()
                .desired_width(largeur)
                .desired_rows(24)
                .hint_text("Ex: 100 km / 10 s, x = 2 m, 1 kg + 1 kg to g"),
        );

        if resp.changed() {
            self.recalculer();
        }
    }

    fn ui_resultats(&self, ui: &mut egui::Ui) {
        // Même police + même interligne que l’éditeur : les lignes s’alignent.
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.push_id("resultats_out", |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.monospace(self.resultats());
                });
            });
    }

    fn ui_stats(&self, ui: &mut egui::Ui) {
        let s = self.stats();
        ui.horizontal(|ui| {
            ui.small(format!("cache : {} hits, {} misses", s.hits, s.misses));
        });
    }
}
