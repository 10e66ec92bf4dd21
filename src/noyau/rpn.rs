// src/noyau/rpn.rs
//
// Shunting-yard -> RPN
//
// Règles:
// - Num / Var / Qty / Unit : sortie directe
// - Func : empilée, sortie après la parenthèse fermante de son appel
// - Op t : on dépile le sommet `top` (un opérateur) tant que
//     top gauche  et prec(t) <= prec(top)
//     top droite  et prec(t) <  prec(top)
//   => 8 - 4 - 2 = (8 - 4) - 2 ; 2 ^ 3 ^ 2 = 2 ^ (3 ^ 2)
// - Pas de moins unaire : "-5" est une expression invalide.

use super::erreur::{ParseError, Result};
use super::jetons::{Assoc, Tok};

fn doit_depiler(tok_prec: u8, top: &Tok) -> bool {
    match top {
        Tok::Op(op) => match op.assoc {
            Assoc::Gauche => tok_prec <= op.precedence,
            Assoc::Droite => tok_prec < op.precedence,
        },
        _ => false,
    }
}

/// Convertit une suite de jetons en RPN (notation polonaise inversée).
///
/// Exemple:
///   tokens: [Func(sin), LPar, Num(0), RPar, Op(+), Num(1)]
///   rpn:    [Num(0), Func(sin), Num(1), Op(+)]
pub fn to_rpn(tokens: &[Tok]) -> Result<Vec<Tok>> {
    let mut out: Vec<Tok> = Vec::with_capacity(tokens.len());
    let mut ops: Vec<Tok> = Vec::new();

    for tok in tokens.iter().cloned() {
        match tok {
            Tok::Num(_) | Tok::Var(..) | Tok::Qty(_) | Tok::Unit(_) => out.push(tok),

            Tok::Func(_) | Tok::LPar => ops.push(tok),

            Tok::Op(op) => {
                while let Some(top) = ops.last() {
                    if !doit_depiler(op.precedence, top) {
                        break;
                    }
                    if let Some(top) = ops.pop() {
                        out.push(top);
                    }
                }
                ops.push(Tok::Op(op));
            }

            Tok::RPar => {
                // dépile jusqu’à '('
                loop {
                    match ops.pop() {
                        Some(Tok::LPar) => break,
                        Some(top) => out.push(top),
                        None => return Err(ParseError::Parentheses),
                    }
                }

                // f(...) : la fonction exposée sort avec son argument
                if matches!(ops.last(), Some(Tok::Func(_))) {
                    if let Some(f) = ops.pop() {
                        out.push(f);
                    }
                }
            }
        }
    }

    // vide la pile ops
    while let Some(op) = ops.pop() {
        if matches!(op, Tok::LPar | Tok::RPar) {
            return Err(ParseError::Parentheses);
        }
        out.push(op);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::jetons::{format_tokens, tokenize, Variables};
    use crate::noyau::unites::registre;
    use pretty_assertions::assert_eq;

    fn rpn(s: &str) -> Result<String> {
        let (t, _) = tokenize(s, &Variables::new(), &registre())?;
        Ok(format_tokens(&to_rpn(&t)?))
    }

    #[test]
    fn precedence() {
        assert_eq!(rpn("2 + 3 * 4").unwrap(), "2 3 4 * +");
        assert_eq!(rpn("(2 + 3) * 4").unwrap(), "2 3 + 4 *");
    }

    #[test]
    fn associativite() {
        assert_eq!(rpn("8 - 4 - 2").unwrap(), "8 4 - 2 -");
        assert_eq!(rpn("2 ^ 3 ^ 2").unwrap(), "2 3 2 ^ ^");
    }

    #[test]
    fn to_le_plus_faible() {
        assert_eq!(rpn("1 g + 1 g to kg").unwrap(), "1 [g] 1 [g] + [kg] to");
    }

    #[test]
    fn appel_de_fonction() {
        assert_eq!(rpn("2 * sqrt(9)").unwrap(), "2 9 sqrt *");
        assert_eq!(rpn("3 * (sin(0) + 1) kg").unwrap(), "3 0 sin 1 + [kg] *");
    }

    #[test]
    fn parentheses_mal_appariees() {
        assert_eq!(rpn("(2 + 3"), Err(ParseError::Parentheses));
        assert_eq!(rpn("2 + 3)"), Err(ParseError::Parentheses));
    }
}
