// src/noyau/format.rs
//
// Affichage "joli" des quantités :
// - magnitude au format %g (6 chiffres significatifs, zéros retirés)
// - unité en symboles : m·s, km/s, m², kg/(m·s²), m^(1/2)

use super::quantite::Quantity;
use super::unites::{exposant_negatif, exposant_texte, Exposant, Unit};

/// Chiffres significatifs affichés.
const CHIFFRES: usize = 6;

/* ------------------------ Magnitude ------------------------ */

fn retire_zeros(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.')
}

/// Équivalent de `%g` : notation fixe entre 1e-4 et 1e6, scientifique sinon.
pub fn format_magnitude(x: f64) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    if !x.is_finite() {
        return format!("{x}");
    }

    // L’exposant se lit APRÈS arrondi (9.999999 -> 1e+01).
    let sci = format!("{:.*e}", CHIFFRES - 1, x);
    let (mantisse, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= CHIFFRES as i32 {
        let signe = if exp < 0 { '-' } else { '+' };
        return format!("{}e{signe}{:02}", retire_zeros(mantisse), exp.abs());
    }

    let decimales = (CHIFFRES as i32 - 1 - exp).max(0) as usize;
    retire_zeros(&format!("{x:.decimales$}")).to_string()
}

/* ------------------------ Unités ------------------------ */

fn exposant_joli(e: Exposant) -> String {
    const EXPOSANTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

    if !e.is_integer() {
        return format!("^({})", exposant_texte(e));
    }
    let n = *e.numer();
    if n == 1 {
        return String::new();
    }
    let mut out = String::new();
    if n < 0 {
        out.push('⁻');
    }
    for c in n.unsigned_abs().to_string().chars() {
        if let Some(d) = c.to_digit(10) {
            out.push(EXPOSANTS[d as usize]);
        }
    }
    out
}

/// Numérateur·… / (dénominateur·…) ; "" pour une unité vide.
pub fn format_unit(u: &Unit) -> String {
    let mut num = Vec::new();
    let mut den = Vec::new();

    for (symbole, e) in u.termes() {
        if exposant_negatif(e) {
            den.push(format!("{symbole}{}", exposant_joli(-e)));
        } else {
            num.push(format!("{symbole}{}", exposant_joli(e)));
        }
    }

    let groupe = |parts: &[String]| {
        let joint = parts.join("·");
        if parts.len() > 1 {
            format!("({joint})")
        } else {
            joint
        }
    };

    match (num.is_empty(), den.is_empty()) {
        (true, true) => String::new(),
        (false, true) => num.join("·"),
        (true, false) => format!("1/{}", groupe(&den)),
        (false, false) => format!("{}/{}", num.join("·"), groupe(&den)),
    }
}

/* ------------------------ Quantité ------------------------ */

/// "10 km/s", "6 m·s", "2" (sans unité).
pub fn format_quantite(q: &Quantity) -> String {
    let mag = format_magnitude(q.magnitude());
    let unite = format_unit(q.unit());
    if unite.is_empty() {
        mag
    } else {
        format!("{mag} {unite}")
    }
}
