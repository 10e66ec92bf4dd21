//! Noyau: évaluation (pipeline réel)
//!
//! tokenize -> RPN -> pile de quantités -> une quantité
//!
//! Règle d’attachement des unités (jeton Unit) :
//! - pile vide             : erreur (une unité seule n’a pas de magnitude)
//! - sommet sans dimension : on le REMPLACE, même magnitude, nouvelle unité ("10 km")
//! - sinon                 : on EMPILE 1 <unité> (le "s" de "km / s", la cible de "to")

use std::collections::BTreeSet;

use super::erreur::{DimensionError, ParseError, Result};
use super::jetons::{tokenize, Fonction, Operateur, Tok, Variables};
use super::quantite::Quantity;
use super::rpn::to_rpn;
use super::unites::{registre, SystemeUnites};

fn applique_operateur(op: &Operateur, a: &Quantity, b: &Quantity) -> Result<Quantity> {
    let r = match op.symbole {
        "to" => a.to(b.unit()),
        "+" => a.ajouter(b),
        "-" => a.soustraire(b),
        "*" => a.multiplier(b),
        "/" => {
            if b.magnitude() == 0.0 {
                return Err(ParseError::DivisionParZero);
            }
            a.diviser(b)
        }
        "^" => a.puissance(b),
        _ => unreachable!("opérateur hors table: {}", op.symbole),
    };

    r.map_err(|source| match source {
        DimensionError::Incompatible { .. } => ParseError::UnitesIncompatibles {
            op: op.symbole,
            source,
        },
        _ => ParseError::Operation {
            op: op.symbole,
            source,
        },
    })
}

fn applique_fonction(f: &Fonction, arg: &Quantity) -> Result<Quantity> {
    if !arg.is_dimensionless() {
        return Err(ParseError::FonctionAvecUnite(f.nom));
    }
    // la fonction reçoit la magnitude telle qu’écrite : sin(90 deg) = sin(90)
    let v = (f.f)(arg.magnitude());
    if !v.is_finite() {
        return Err(ParseError::DomaineFonction(f.nom));
    }
    Ok(Quantity::sans_dimension(v))
}

/// Exécute une suite RPN sur une pile de quantités.
pub fn evaluate(rpn: &[Tok]) -> Result<Quantity> {
    let mut pile: Vec<Quantity> = Vec::new();

    for tok in rpn {
        match tok {
            Tok::Num(v) => pile.push(Quantity::sans_dimension(*v)),
            Tok::Var(_, q) | Tok::Qty(q) => pile.push(q.clone()),

            Tok::Unit(u) => match pile.last_mut() {
                None => return Err(ParseError::UniteSansValeur(u.to_string())),
                Some(sommet) if sommet.is_dimensionless() => {
                    *sommet = sommet.avec_unite(u.clone());
                }
                Some(_) => pile.push(Quantity::new(1.0, u.clone())),
            },

            Tok::Op(op) => {
                if pile.len() < 2 {
                    return Err(ParseError::ArgumentsOperateur(op.symbole));
                }
                let (Some(b), Some(a)) = (pile.pop(), pile.pop()) else {
                    return Err(ParseError::ArgumentsOperateur(op.symbole));
                };
                pile.push(applique_operateur(op, &a, &b)?);
            }

            Tok::Func(f) => {
                let arg = pile.pop().ok_or(ParseError::ArgumentsFonction(f.nom))?;
                pile.push(applique_fonction(f, &arg)?);
            }

            Tok::LPar | Tok::RPar => return Err(ParseError::Parentheses),
        }
    }

    if pile.len() != 1 {
        return Err(ParseError::ExpressionInvalide);
    }
    pile.pop().ok_or(ParseError::ExpressionInvalide)
}

/// Parseur d’expressions : tables fixes + système d’unités injecté.
pub struct ExpressionParser {
    unites: Box<dyn SystemeUnites>,
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self::avec_unites(Box::new(registre()))
    }
}

impl ExpressionParser {
    pub fn avec_unites(unites: Box<dyn SystemeUnites>) -> Self {
        Self { unites }
    }

    pub fn unites(&self) -> &dyn SystemeUnites {
        self.unites.as_ref()
    }

    /// API publique : évalue une expression et retourne la quantité
    /// ainsi que les noms de variables utilisées.
    pub fn parse(
        &self,
        expression: &str,
        variables: &Variables,
    ) -> Result<(Quantity, BTreeSet<String>)> {
        let (jetons, utilisees) = tokenize(expression, variables, self.unites())?;
        let rpn = to_rpn(&jetons)?;
        let q = evaluate(&rpn)?;
        Ok((q, utilisees))
    }
}

/// Raccourci sur le registre par défaut.
pub fn parse(expression: &str, variables: &Variables) -> Result<(Quantity, BTreeSet<String>)> {
    ExpressionParser::default().parse(expression, variables)
}
