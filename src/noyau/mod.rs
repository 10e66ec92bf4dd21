//! Noyau du calepin : expressions avec unités + extraction dans les notes
//!
//! Organisation interne :
//! - erreur.rs   : erreurs par couche (unité, dimension, parse)
//! - unites.rs   : dimensions, unités, registre (trait SystemeUnites)
//! - quantite.rs : magnitude + unité, arithmétique, conversions
//! - format.rs   : affichage (%g, exposants, km/s)
//! - jetons.rs   : tables (opérateurs, fonctions) + tokenisation
//! - rpn.rs      : shunting-yard
//! - eval.rs     : pile RPN + ExpressionParser
//! - config.rs   : réglages de l’extraction
//! - cache.rs    : lignes mémorisées + compteurs
//! - notes.rs    : NoteParser (filtre, cache, recherche)
//! - feuille.rs  : note entière (en-têtes, affectations, sum)

pub mod cache;
pub mod config;
pub mod erreur;
pub mod eval;
pub mod feuille;
pub mod format;
pub mod jetons;
pub mod notes;
pub mod quantite;
pub mod rpn;
pub mod unites;

#[cfg(test)]
mod tests_proprietes;

// API publique
pub use cache::{CacheMatch, CacheStats};
pub use config::ConfigNotes;
pub use erreur::{DimensionError, ParseError, UniteError};
pub use eval::{parse, ExpressionParser};
pub use feuille::{Feuille, LigneRendue};
pub use jetons::Variables;
pub use notes::{Extraction, Issue, NoteParser};
pub use quantite::Quantity;
pub use unites::{registre, RegistreUnites, SystemeUnites, Unit};
