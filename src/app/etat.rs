//! src/app/etat.rs
//!
//! État UI (sans vue).
//!
//! Rôle : contenir le texte de la note, les lignes rendues et la feuille
//! (qui possède le cache), et recalculer quand le texte change.
//!
//! Contrats :
//! - Une ligne rendue par ligne de texte, dans l’ordre.
//! - Le cache survit aux frappes : seule la ligne modifiée repart en recherche.

use calepin::noyau::{CacheStats, Feuille, LigneRendue};

/// Note affichée au premier lancement.
const NOTE_EXEMPLE: &str = "\
## Trajet
distance = 120 km
time = 1.5 h
distance / time to km/h # vitesse moyenne
50 km/h to m/s

## Courses
5 apples at 0.5 each: 5 * 0.5
bread 2.2 + milk 1.3
sum
";

pub struct AppCalepin {
    // --- entrée utilisateur ---
    pub texte: String,

    // --- sorties ---
    pub lignes: Vec<LigneRendue>,

    feuille: Feuille,
}

impl Default for AppCalepin {
    fn default() -> Self {
        let mut app = Self {
            texte: NOTE_EXEMPLE.to_string(),
            lignes: Vec::new(),
            feuille: Feuille::new(),
        };
        app.recalculer();
        app
    }
}

impl AppCalepin {
    /// Réévalue toute la note (le cache absorbe les lignes inchangées).
    pub fn recalculer(&mut self) {
        self.lignes = self.feuille.recalculate(&self.texte);
    }

    /// Efface la note.
    pub fn effacer(&mut self) {
        self.texte.clear();
        self.lignes.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.feuille.notes().stats()
    }

    /// Colonne de droite : un rendu par ligne, joint comme le texte.
    pub fn resultats(&self) -> String {
        self.lignes
            .iter()
            .map(|l| l.rendu.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
