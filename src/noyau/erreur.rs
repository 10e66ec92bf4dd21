// src/noyau/erreur.rs
//
// Erreurs du noyau, par couche :
// - UniteError      : lecture d’une chaîne d’unité (registre)
// - DimensionError  : arithmétique de quantités (dimensions incompatibles…)
// - ParseError      : seule erreur visible à la frontière du parseur

use thiserror::Error;

/// Échec de lecture d’une chaîne d’unité.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniteError {
    #[error("undefined unit: {0}")]
    Indefinie(String),

    #[error("malformed unit string '{texte}': {raison}")]
    Malformee { texte: String, raison: &'static str },
}

/// Échec d’une opération entre quantités.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DimensionError {
    #[error("cannot convert from '{de}' to '{vers}'")]
    Incompatible { de: String, vers: String },

    #[error("exponent must be dimensionless, got '{0}'")]
    ExposantAvecUnite(String),

    #[error("exponent {0} cannot be applied to a unit")]
    ExposantNonRationnel(f64),

    #[error("unit exponent out of range")]
    ExposantHorsBornes,

    #[error("result is not finite")]
    NonFini,
}

/// Erreur unique remontée par `parse` / `evaluate`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown token in '{0}'")]
    JetonInconnu(String),

    #[error("unknown unit or undefined variable: {0}")]
    MotInconnu(String),

    #[error("mismatched parentheses")]
    Parentheses,

    #[error("unit '{0}' has no magnitude")]
    UniteSansValeur(String),

    #[error("not enough arguments for operator {0}")]
    ArgumentsOperateur(&'static str),

    #[error("not enough arguments for function {0}")]
    ArgumentsFonction(&'static str),

    #[error("cannot apply function {0} to a quantity with units")]
    FonctionAvecUnite(&'static str),

    #[error("math domain error in function {0}")]
    DomaineFonction(&'static str),

    #[error("division by zero")]
    DivisionParZero,

    #[error("incompatible units for operator {op}: {source}")]
    UnitesIncompatibles {
        op: &'static str,
        #[source]
        source: DimensionError,
    },

    /// Échec d’un opérateur hors incompatibilité de dimensions
    /// (exposant invalide, débordement).
    #[error("cannot apply operator {op}: {source}")]
    Operation {
        op: &'static str,
        #[source]
        source: DimensionError,
    },

    #[error("invalid expression")]
    ExpressionInvalide,

    #[error(transparent)]
    Unite(#[from] UniteError),
}

pub type Result<T> = std::result::Result<T, ParseError>;
