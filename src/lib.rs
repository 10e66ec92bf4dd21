//! Calepin : calculs avec unités au fil des notes.
//!
//! `noyau` ne dépend pas de l’interface : le binaire (eframe) n’est qu’une vue.

pub mod noyau;
