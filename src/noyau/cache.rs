// src/noyau/cache.rs
//
// Cache des lignes déjà évaluées.
//
// Une ligne peut changer de valeur sans changer de texte (ses variables
// changent) : on mémorise donc, avec le résultat, la valeur de chaque
// variable utilisée.

use std::collections::{BTreeMap, BTreeSet};

use super::jetons::Variables;
use super::quantite::Quantity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheMatch {
    /// Toutes les variables enregistrées sont inchangées.
    Hit,
    /// Une variable a changé de valeur : il faut relancer la recherche.
    Miss,
    /// Une variable a disparu : la ligne ne peut plus s’évaluer.
    HitNone,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CachedLine {
    pub result: Option<Quantity>,
    pub used_variable_values: BTreeMap<String, Quantity>,
}

impl CachedLine {
    /// Ligne sans résultat (aucune variable n’a servi à échouer).
    pub fn echec() -> Self {
        Self {
            result: None,
            used_variable_values: BTreeMap::new(),
        }
    }

    /// Résultat + empreinte des variables effectivement utilisées.
    pub fn succes(result: Quantity, utilisees: &BTreeSet<String>, variables: &Variables) -> Self {
        let used_variable_values = utilisees
            .iter()
            .filter_map(|nom| variables.get(nom).map(|v| (nom.clone(), v.clone())))
            .collect();
        Self {
            result: Some(result),
            used_variable_values,
        }
    }

    pub fn variables_match(&self, variables: &Variables) -> CacheMatch {
        for (nom, enregistree) in &self.used_variable_values {
            match variables.get(nom) {
                None => return CacheMatch::HitNone,
                Some(actuelle) if actuelle != enregistree => return CacheMatch::Miss,
                Some(_) => {}
            }
        }
        CacheMatch::Hit
    }
}

/// Compteurs observables (par instance de NoteParser).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, f64)]) -> Variables {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), Quantity::sans_dimension(*v)))
            .collect()
    }

    #[test]
    fn trois_issues() {
        let v = vars(&[("x", 1.0), ("y", 2.0)]);
        let utilisees: BTreeSet<String> = ["x".to_string()].into();
        let ligne = CachedLine::succes(Quantity::sans_dimension(3.0), &utilisees, &v);

        // y n’a pas servi : le changer ne compte pas
        assert_eq!(ligne.variables_match(&vars(&[("x", 1.0), ("y", 9.0)])), CacheMatch::Hit);
        assert_eq!(ligne.variables_match(&vars(&[("x", 5.0)])), CacheMatch::Miss);
        assert_eq!(ligne.variables_match(&vars(&[("y", 2.0)])), CacheMatch::HitNone);
    }

    #[test]
    fn echec_toujours_hit() {
        assert_eq!(CachedLine::echec().variables_match(&Variables::new()), CacheMatch::Hit);
    }
}
