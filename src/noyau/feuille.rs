//! Noyau: feuille de notes
//!
//! Évalue une note entière, ligne par ligne, avec une seule table de variables :
//! - `## titre`       : en-tête, remet la somme de section à zéro
//! - `nom = reste`    : affectation (si `reste` donne un résultat)
//! - `... # texte`    : commentaire, jamais évalué
//! - `sum`            : somme courante de la section (variable `sum` aussi)
//!
//! La feuille possède son `NoteParser` : le cache survit aux recalculs.

use once_cell::sync::Lazy;
use regex::Regex;

use super::jetons::{Variables, MOTIF_MOT};
use super::notes::NoteParser;
use super::quantite::Quantity;

/// Nom réservé à la somme courante.
pub const SOMME: &str = "sum";

pub const SOMME_INVALIDE: &str = "Invalid sum";

static AFFECTATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?P<nom>{MOTIF_MOT}) *= *")).expect("motif affectation constant")
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LigneRendue {
    pub rendu: String,
    pub resultat: Option<Quantity>,
    pub variable: Option<String>,
    pub commentaire: Option<String>,
}

fn est_en_tete(ligne: &str) -> bool {
    ligne.trim().starts_with("##")
}

/// Somme des résultats de la section ; `None` si les dimensions s’opposent.
/// Section vide : 0 sans dimension.
fn somme_section(resultats: &[Quantity]) -> Option<Quantity> {
    let mut iter = resultats.iter();
    let Some(premier) = iter.next() else {
        return Some(Quantity::sans_dimension(0.0));
    };
    iter.try_fold(premier.clone(), |acc, q| acc.ajouter(q).ok())
}

#[derive(Default)]
pub struct Feuille {
    notes: NoteParser,
}

impl Feuille {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn avec_notes(notes: NoteParser) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &NoteParser {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteParser {
        &mut self.notes
    }

    /// Une sortie par ligne d’entrée, dans l’ordre.
    pub fn recalculate(&mut self, texte: &str) -> Vec<LigneRendue> {
        let mut sorties = Vec::new();
        let mut variables = Variables::new();
        let mut section: Vec<Quantity> = Vec::new();

        for ligne in texte.lines() {
            if est_en_tete(ligne) {
                sorties.push(LigneRendue::default());
                section.clear();
                continue;
            }

            let somme = somme_section(&section);
            match &somme {
                Some(s) => {
                    variables.insert(SOMME.to_string(), s.clone());
                }
                None => {
                    variables.remove(SOMME);
                }
            }

            let rendue = self.ligne(ligne, somme.as_ref(), &variables);

            if let Some(q) = &rendue.resultat {
                section.push(q.clone());
                if let Some(nom) = &rendue.variable {
                    variables.insert(nom.clone(), q.clone());
                }
            }
            sorties.push(rendue);
        }

        sorties
    }

    fn ligne(&mut self, ligne: &str, somme: Option<&Quantity>, variables: &Variables) -> LigneRendue {
        if ligne == SOMME {
            let rendu = somme.map_or_else(|| SOMME_INVALIDE.to_string(), Quantity::to_string);
            return LigneRendue {
                rendu,
                ..LigneRendue::default()
            };
        }

        let (variable, contenu) = match AFFECTATION_RE.captures(ligne) {
            Some(c) => {
                let fin = c.get(0).map_or(0, |m| m.end());
                (c.name("nom").map(|m| m.as_str().to_string()), &ligne[fin..])
            }
            None => (None, ligne),
        };

        let (expression, commentaire) = match contenu.split_once('#') {
            Some((e, c)) => (e, Some(c.to_string())),
            None => (contenu, None),
        };

        let resultat = self.notes.parse_line(expression.trim(), variables);
        let rendu = match (&resultat, &variable) {
            (Some(q), Some(nom)) => format!("{nom} = {q}"),
            (Some(q), None) => q.to_string(),
            (None, _) => String::new(),
        };

        LigneRendue {
            rendu,
            resultat,
            variable,
            commentaire,
        }
    }
}
