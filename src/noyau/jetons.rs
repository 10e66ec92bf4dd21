// src/noyau/jetons.rs

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use super::erreur::{ParseError, Result};
use super::quantite::Quantity;
use super::unites::{SystemeUnites, Unit};

/// Variables connues au moment du parse (nom -> valeur).
pub type Variables = HashMap<String, Quantity>;

/// Nombre : entier, décimal ou notation scientifique.
pub const MOTIF_NOMBRE: &str = r"(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?";

/// Mot : fonction, variable ou unité.
pub const MOTIF_MOT: &str = r"[a-zA-Z_][a-zA-Z0-9_]*";

static NOMBRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{MOTIF_NOMBRE}")).expect("motif nombre constant")
});

static MOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{MOTIF_MOT}")).expect("motif mot constant"));

/* ------------------------ Opérateurs ------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assoc {
    Gauche,
    Droite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operateur {
    pub symbole: &'static str,
    pub precedence: u8,
    pub assoc: Assoc,
}

/// Table fixe. `to` (conversion) a la précédence la plus basse :
/// "1 g + 1 g to kg" = (1 g + 1 g) to kg.
pub const OPERATEURS: [Operateur; 6] = [
    Operateur { symbole: "to", precedence: 1, assoc: Assoc::Gauche },
    Operateur { symbole: "+", precedence: 2, assoc: Assoc::Gauche },
    Operateur { symbole: "-", precedence: 2, assoc: Assoc::Gauche },
    Operateur { symbole: "*", precedence: 3, assoc: Assoc::Gauche },
    Operateur { symbole: "/", precedence: 3, assoc: Assoc::Gauche },
    Operateur { symbole: "^", precedence: 4, assoc: Assoc::Droite },
];

/// Triés une fois, du plus long au plus court.
pub static OPERATEURS_TRIES: Lazy<Vec<Operateur>> = Lazy::new(|| {
    let mut ops = OPERATEURS.to_vec();
    ops.sort_by(|a, b| b.symbole.len().cmp(&a.symbole.len()));
    ops
});

pub fn est_operateur(s: &str) -> bool {
    OPERATEURS.iter().any(|o| o.symbole == s)
}

fn est_car_mot(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Un opérateur alphabétique ("to") ne doit pas entamer un mot ("tonne").
fn operateur_en_tete(reste: &str) -> Option<Operateur> {
    OPERATEURS_TRIES.iter().copied().find(|op| {
        if !reste.starts_with(op.symbole) {
            return false;
        }
        let alphabetique = op.symbole.chars().all(|c| c.is_ascii_alphabetic());
        !alphabetique || !reste[op.symbole.len()..].starts_with(est_car_mot)
    })
}

/* ------------------------ Fonctions ------------------------ */

#[derive(Clone, Copy, Debug)]
pub struct Fonction {
    pub nom: &'static str,
    pub f: fn(f64) -> f64,
}

pub const FONCTIONS: [Fonction; 11] = [
    Fonction { nom: "sin", f: f64::sin },
    Fonction { nom: "cos", f: f64::cos },
    Fonction { nom: "tan", f: f64::tan },
    Fonction { nom: "asin", f: f64::asin },
    Fonction { nom: "acos", f: f64::acos },
    Fonction { nom: "atan", f: f64::atan },
    Fonction { nom: "sqrt", f: f64::sqrt },
    Fonction { nom: "log", f: f64::ln },
    Fonction { nom: "log10", f: f64::log10 },
    Fonction { nom: "exp", f: f64::exp },
    Fonction { nom: "abs", f: f64::abs },
];

pub fn fonction(nom: &str) -> Option<&'static Fonction> {
    FONCTIONS.iter().find(|f| f.nom == nom)
}

/* ------------------------ Jetons ------------------------ */

#[derive(Clone, Debug)]
pub enum Tok {
    Num(f64),
    Var(String, Quantity),
    Op(Operateur),
    Func(&'static Fonction),
    LPar,
    RPar,
    Unit(Unit),
    Qty(Quantity),
}

/// Lit UN jeton en tête de `reste`.
/// Retourne (jeton éventuel, nombre d’octets consommés).
///
/// Ordre : espace, nombre, opérateur (plus long d’abord), mot
/// (fonction > variable > unité), parenthèses.
///
/// # Panics
/// Si `reste` est vide : c’est une faute de la boucle appelante, pas une
/// erreur de saisie.
pub fn next_token(
    reste: &str,
    variables: &Variables,
    unites: &dyn SystemeUnites,
) -> Result<(Option<Tok>, usize)> {
    let c = match reste.chars().next() {
        Some(c) => c,
        None => panic!("next_token appelé sur une entrée vide"),
    };

    if c.is_whitespace() {
        return Ok((None, c.len_utf8()));
    }

    if let Some(m) = NOMBRE_RE.find(reste) {
        let v: f64 = m
            .as_str()
            .parse()
            .map_err(|_| ParseError::JetonInconnu(reste.to_string()))?;
        // 1e999 : pas de littéral infini
        if !v.is_finite() {
            return Err(ParseError::JetonInconnu(m.as_str().to_string()));
        }
        return Ok((Some(Tok::Num(v)), m.end()));
    }

    if let Some(op) = operateur_en_tete(reste) {
        return Ok((Some(Tok::Op(op)), op.symbole.len()));
    }

    if let Some(m) = MOT_RE.find(reste) {
        let mot = m.as_str();
        let tok = if let Some(f) = fonction(mot) {
            Tok::Func(f)
        } else if let Some(v) = variables.get(mot) {
            Tok::Var(mot.to_string(), v.clone())
        } else {
            match unites.parse_unit(mot) {
                Ok(u) => Tok::Unit(u),
                Err(_) => return Err(ParseError::MotInconnu(mot.to_string())),
            }
        };
        return Ok((Some(tok), m.end()));
    }

    match c {
        '(' => Ok((Some(Tok::LPar), 1)),
        ')' => Ok((Some(Tok::RPar), 1)),
        _ => Err(ParseError::JetonInconnu(reste.to_string())),
    }
}

/// Tokenize une expression complète.
/// Retourne aussi l’ensemble des variables effectivement référencées.
pub fn tokenize(
    expression: &str,
    variables: &Variables,
    unites: &dyn SystemeUnites,
) -> Result<(Vec<Tok>, BTreeSet<String>)> {
    let mut out = Vec::new();
    let mut utilisees = BTreeSet::new();
    let mut reste = expression;

    while !reste.is_empty() {
        let (tok, n) = next_token(reste, variables, unites)?;
        if let Some(tok) = tok {
            if let Tok::Var(nom, _) = &tok {
                utilisees.insert(nom.clone());
            }
            out.push(tok);
        }
        reste = &reste[n..];
    }

    Ok((out, utilisees))
}

/// Liste de jetons en texte (diagnostics de tests).
#[cfg(test)]
pub(crate) fn format_tokens(tokens: &[Tok]) -> String {
    let mut out = Vec::new();
    for t in tokens {
        let s = match t {
            Tok::Num(v) => super::format::format_magnitude(*v),
            Tok::Var(nom, _) => nom.clone(),
            Tok::Op(op) => op.symbole.to_string(),
            Tok::Func(f) => f.nom.to_string(),
            Tok::LPar => "(".to_string(),
            Tok::RPar => ")".to_string(),
            Tok::Unit(u) => format!("[{u}]"),
            Tok::Qty(q) => format!("[{q}]"),
        };
        out.push(s);
    }
    out.join(" ")
}
