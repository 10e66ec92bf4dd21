//! src/noyau/config.rs
//!
//! Réglages de l’extraction dans les notes.
//!
//! Contrats :
//! - Valeurs par défaut = comportement d’origine (pas de plafond).
//! - Garde-fou : le plafond de jetons pertinents est borné.

use std::time::Duration;

/// Au-delà, l’extraction d’une ligne est signalée comme lente.
pub const SEUIL_LENT_DEFAUT: Duration = Duration::from_millis(100);

/// La recherche est exponentielle : on borne le plafond configurable.
pub const PLAFOND_JETONS_MAX: usize = 24;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigNotes {
    /// Durée au-delà de laquelle on émet un avertissement "slow parse".
    pub seuil_lent: Duration,
    /// Nombre maximal de jetons pertinents gardés par ligne (None = tous).
    pub plafond_jetons: Option<usize>,
}

impl Default for ConfigNotes {
    fn default() -> Self {
        Self {
            seuil_lent: SEUIL_LENT_DEFAUT,
            plafond_jetons: None,
        }
    }
}

impl ConfigNotes {
    /// Garde-fou : le plafond reste dans [1, PLAFOND_JETONS_MAX].
    pub fn set_plafond_jetons(&mut self, plafond: Option<usize>) {
        self.plafond_jetons = plafond.map(|n| n.clamp(1, PLAFOND_JETONS_MAX));
    }

    pub fn set_seuil_lent(&mut self, seuil: Duration) {
        self.seuil_lent = seuil;
    }
}
