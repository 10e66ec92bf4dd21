//! Tests de propriétés (campagne) : invariants du pipeline + extraction.
//!
//! - idempotence : même entrée, magnitude identique au bit près
//! - aller-retour : conversion puis conversion inverse = magnitude d’origine
//! - extraction : jamais de panique sur du texte arbitraire
//!
//! Budgets courts : les lignes générées restent petites (recherche exponentielle).

use std::time::{Duration, Instant};

use proptest::prelude::*;

use super::unites::{registre, SystemeUnites};
use super::{parse, NoteParser, Quantity, Variables};

fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

fn unite(s: &str) -> super::Unit {
    registre()
        .parse_unit(s)
        .unwrap_or_else(|e| panic!("unité {s:?}: {e}"))
}

/// Paires d’unités de même dimension.
const PAIRES: &[(&str, &str)] = &[
    ("m", "cm"),
    ("km", "mi"),
    ("ft", "in"),
    ("g", "lb"),
    ("h", "s"),
    ("km/h", "m/s"),
    ("deg", "rad"),
    ("kWh", "J"),
    ("bar", "atm"),
    ("L", "m^3"),
];

fn nombre() -> impl Strategy<Value = f64> {
    (-1.0e6..1.0e6f64).prop_filter("non nul", |x| x.abs() > 1e-6)
}

fn expression() -> impl Strategy<Value = String> {
    let feuille = prop_oneof![
        (0u32..1000).prop_map(|n| n.to_string()),
        (0u32..1000, prop::sample::select(vec!["m", "km", "s", "kg", "deg", "ft"]))
            .prop_map(|(n, u)| format!("{n} {u}")),
    ];
    feuille.prop_recursive(3, 12, 2, |inner| {
        (
            inner.clone(),
            prop::sample::select(vec!["+", "-", "*", "/", "to"]),
            inner,
        )
            .prop_map(|(a, op, b)| format!("({a}) {op} ({b})"))
    })
}

proptest! {
    #[test]
    fn prop_idempotence(expr in expression()) {
        let v = Variables::new();
        match (parse(&expr, &v), parse(&expr, &v)) {
            (Ok((a, ua)), Ok((b, ub))) => {
                prop_assert_eq!(a.magnitude().to_bits(), b.magnitude().to_bits());
                prop_assert_eq!(a.unit(), b.unit());
                prop_assert_eq!(ua, ub);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "résultats divergents: {a:?} / {b:?}"),
        }
    }

    #[test]
    fn prop_aller_retour(x in nombre(), i in 0..PAIRES.len()) {
        let (de, vers) = PAIRES[i];
        let q = Quantity::new(x, unite(de));
        let retour = q
            .to(&unite(vers))
            .and_then(|c| c.to(&unite(de)))
            .unwrap_or_else(|e| panic!("{de} <-> {vers}: {e}"));
        prop_assert!(
            (retour.magnitude() - x).abs() <= 1e-9 * x.abs(),
            "{} -> {} -> {}", x, vers, retour
        );
    }

    #[test]
    fn prop_extraction_sans_panique(mots in prop::collection::vec("[a-z]{1,6}|[0-9]{1,3}|[-+*/()]", 0..8)) {
        let ligne = mots.join(" ");
        let mut p = NoteParser::new();
        let premier = p.parse_line(&ligne, &Variables::new());
        // deuxième appel : servi par le cache, même réponse
        let second = p.parse_line(&ligne, &Variables::new());
        prop_assert_eq!(premier, second);
    }
}

/* ------------------------ Campagne : propriétés nommées ------------------------ */

#[test]
fn sci_campagne_expressions() {
    let start = Instant::now();
    let v = Variables::new();

    let cas: &[(&str, f64, &str)] = &[
        ("2 + 3 * 4", 14.0, ""),
        ("(2 + 3) * 4", 20.0, ""),
        ("8 - 4 - 2", 2.0, ""),
        ("2 ^ 3 ^ 2", 512.0, ""),
        ("10 m + 5 m", 15.0, "m"),
        ("100 km / 10 s", 10.0, "km/s"),
        ("1 m to cm", 100.0, "cm"),
        ("1000 g to kg", 1.0, "kg"),
        ("sqrt(16)", 4.0, ""),
    ];

    for (expr, m, u) in cas {
        let (q, _) = parse(expr, &v).unwrap_or_else(|e| panic!("expr={expr:?} err={e}"));
        let attendu = Quantity::new(*m, unite(if u.is_empty() { "1" } else { *u }));
        assert_eq!(q, attendu, "expr={expr:?}");
        budget(start, Duration::from_secs(2));
    }

    for expr in ["10 m + 5 kg", "sin(2 m)", "y + 1"] {
        assert!(parse(expr, &v).is_err(), "expr={expr:?} devrait échouer");
    }
}

#[test]
fn sci_campagne_notes() {
    let start = Instant::now();
    let mut p = NoteParser::new();
    let v = Variables::new();

    assert_eq!(p.parse_line("The result is 5m", &v), Some(Quantity::new(5.0, unite("m"))));
    assert_eq!(p.parse_line("no maths here", &v), None);
    assert_eq!(
        p.parse_line("1 (and i mean this) + 1", &v),
        Some(Quantity::sans_dimension(2.0))
    );

    // ligne longue mais plausible : doit rester rapide
    let longue = "rent 1200 + food 300 + transport 80 + phone 25 + misc 40";
    assert_eq!(p.parse_line(longue, &v), Some(Quantity::sans_dimension(1645.0)));
    budget(start, Duration::from_secs(5));
}
