//! Noyau: extraction dans les notes
//!
//! Trouve l’expression la plus plausible dans une ligne de texte libre :
//! "A simple calculation: 100 km / 10 s" -> 10 km/s.
//!
//! 1) filtre de pertinence : nombres, opérateurs, parenthèses, mots connus
//!    (fonction, variable, unité) ; le reste est de la prose
//! 2) cache (texte de la ligne + valeurs des variables utilisées)
//! 3) recherche : sous-suites ordonnées, de la plus longue à la plus courte ;
//!    la première qui s’évalue gagne
//!
//! La recherche est exponentielle en nombre de jetons pertinents : une ligne
//! lente est signalée (`tracing::warn!`), jamais interrompue.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace, warn};

use super::cache::{CacheMatch, CacheStats, CachedLine};
use super::config::ConfigNotes;
use super::eval::ExpressionParser;
use super::jetons::{est_operateur, fonction, Variables, MOTIF_MOT, MOTIF_NOMBRE, OPERATEURS_TRIES};
use super::quantite::Quantity;

/// Motif combiné : nombre | opérateur | mot | parenthèse.
/// Les opérateurs passent avant les mots ("to"), sauf s’ils entament un mot.
static JETON_RE: Lazy<Regex> = Lazy::new(|| {
    let ops = OPERATEURS_TRIES
        .iter()
        .map(|op| {
            let echappe = regex::escape(op.symbole);
            if op.symbole.chars().all(|c| c.is_ascii_alphabetic()) {
                format!(r"{echappe}\b")
            } else {
                echappe
            }
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?P<nombre>{MOTIF_NOMBRE})|(?P<op>{ops})|(?P<mot>{MOTIF_MOT})|(?P<par>[()])"
    ))
    .expect("motif de jetons constant")
});

/// D’où vient le résultat d’un appel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Issue {
    /// Aucun jeton pertinent : rien à chercher.
    RienDePertinent,
    /// Réponse tirée du cache (Hit ou HitNone).
    Cache(CacheMatch),
    /// Recherche complète, avec le nombre de candidats évalués.
    Recherche { candidats: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub resultat: Option<Quantity>,
    pub issue: Issue,
}

/* ------------------------ Combinaisons ordonnées ------------------------ */

/// Indices des combinaisons de `k` parmi `n`, ordre lexicographique.
struct Combinaisons {
    n: usize,
    indices: Vec<usize>,
    premiere: bool,
}

impl Combinaisons {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            premiere: true,
        }
    }
}

impl Iterator for Combinaisons {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let k = self.indices.len();
        if k > self.n {
            return None;
        }
        if self.premiere {
            self.premiere = false;
            return Some(self.indices.clone());
        }

        // indice le plus à droite qui peut encore avancer
        let i = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i)?;
        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}

/* ------------------------ Chrono (pas d’Instant en wasm32) ------------------------ */

#[cfg(not(target_arch = "wasm32"))]
struct Chrono(std::time::Instant);

#[cfg(not(target_arch = "wasm32"))]
impl Chrono {
    fn demarre() -> Self {
        Chrono(std::time::Instant::now())
    }

    fn ecoule(&self) -> Option<std::time::Duration> {
        Some(self.0.elapsed())
    }
}

#[cfg(target_arch = "wasm32")]
struct Chrono;

#[cfg(target_arch = "wasm32")]
impl Chrono {
    fn demarre() -> Self {
        Chrono
    }

    fn ecoule(&self) -> Option<std::time::Duration> {
        None
    }
}

/* ------------------------ NoteParser ------------------------ */

/// Parseur de lignes de notes. Possède son cache : une instance par éditeur.
#[derive(Default)]
pub struct NoteParser {
    parseur: ExpressionParser,
    config: ConfigNotes,
    cache: HashMap<String, CachedLine>,
    stats: CacheStats,
}

impl NoteParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn avec_parseur(parseur: ExpressionParser, config: ConfigNotes) -> Self {
        Self {
            parseur,
            config,
            cache: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn config(&self) -> &ConfigNotes {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigNotes {
        &mut self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn taille_cache(&self) -> usize {
        self.cache.len()
    }

    /// Jetons pertinents de la ligne, dans l’ordre (prose écartée).
    pub fn jetons_pertinents<'a>(&self, ligne: &'a str, variables: &Variables) -> Vec<&'a str> {
        let mut out: Vec<&str> = JETON_RE
            .captures_iter(ligne)
            .filter_map(|c| {
                let m = c.get(0)?;
                if c.name("mot").is_none() {
                    return Some(m.as_str());
                }
                let mot = m.as_str();
                let connu = fonction(mot).is_some()
                    || variables.contains_key(mot)
                    || self.parseur.unites().est_unite(mot);
                connu.then_some(mot)
            })
            .collect();

        if let Some(plafond) = self.config.plafond_jetons {
            out.truncate(plafond);
        }
        out
    }

    /// Résultat seul ; `None` si la ligne ne contient pas d’expression.
    pub fn parse_line(&mut self, ligne: &str, variables: &Variables) -> Option<Quantity> {
        self.extract(ligne, variables).resultat
    }

    /// Comme `parse_line`, avec l’issue (cache ou recherche) en métadonnée.
    pub fn extract(&mut self, ligne: &str, variables: &Variables) -> Extraction {
        let jetons = self.jetons_pertinents(ligne, variables);
        if jetons.is_empty() {
            return Extraction {
                resultat: None,
                issue: Issue::RienDePertinent,
            };
        }

        if let Some(cached) = self.cache.get(ligne) {
            match cached.variables_match(variables) {
                CacheMatch::Hit => {
                    self.stats.hits += 1;
                    debug!(ligne, "cache hit");
                    return Extraction {
                        resultat: cached.result.clone(),
                        issue: Issue::Cache(CacheMatch::Hit),
                    };
                }
                CacheMatch::HitNone => {
                    self.stats.hits += 1;
                    debug!(ligne, "cache hit (variable disparue)");
                    return Extraction {
                        resultat: None,
                        issue: Issue::Cache(CacheMatch::HitNone),
                    };
                }
                CacheMatch::Miss => debug!(ligne, "cache miss (variable modifiée)"),
            }
        }

        let chrono = Chrono::demarre();
        let (entree, candidats) = self.recherche(&jetons, variables);
        let resultat = entree.result.clone();

        self.cache.insert(ligne.to_string(), entree);
        self.stats.misses += 1;

        if let Some(duree) = chrono.ecoule().filter(|d| *d > self.config.seuil_lent) {
            warn!(
                ligne,
                duree_ms = duree.as_millis() as u64,
                jetons = jetons.len(),
                "slow parse"
            );
        }

        Extraction {
            resultat,
            issue: Issue::Recherche { candidats },
        }
    }

    /// Sous-suites de la plus longue à la plus courte ; la première qui
    /// s’évalue gagne. Retourne l’entrée de cache et le nombre de candidats
    /// évalués.
    fn recherche(&self, jetons: &[&str], variables: &Variables) -> (CachedLine, usize) {
        let mut candidats = 0;

        for longueur in (1..=jetons.len()).rev() {
            for indices in Combinaisons::new(jetons.len(), longueur) {
                let premier = jetons[indices[0]];
                let dernier = jetons[indices[longueur - 1]];
                // opérateur pendant : jamais valide, inutile de parser
                if est_operateur(premier) || est_operateur(dernier) {
                    continue;
                }

                let candidat = indices
                    .iter()
                    .map(|&i| jetons[i])
                    .collect::<Vec<_>>()
                    .join(" ");
                candidats += 1;

                match self.parseur.parse(&candidat, variables) {
                    Ok((q, utilisees)) => {
                        trace!(candidat = candidat.as_str(), resultat = %q, "candidat retenu");
                        return (CachedLine::succes(q, &utilisees, variables), candidats);
                    }
                    Err(e) => trace!(candidat = candidat.as_str(), erreur = %e, "candidat rejeté"),
                }
            }
        }

        (CachedLine::echec(), candidats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::unites::{registre, SystemeUnites};
    use pretty_assertions::assert_eq;

    fn q(m: f64, u: &str) -> Quantity {
        Quantity::new(m, registre().parse_unit(u).unwrap())
    }

    fn n(m: f64) -> Quantity {
        Quantity::sans_dimension(m)
    }

    fn ligne(s: &str) -> Option<Quantity> {
        NoteParser::new().parse_line(s, &Variables::new())
    }

    #[test]
    fn combinaisons_ordre_lexicographique() {
        let c: Vec<_> = Combinaisons::new(4, 2).collect();
        assert_eq!(
            c,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(Combinaisons::new(3, 3).count(), 1);
        assert_eq!(Combinaisons::new(2, 3).count(), 0);
    }

    #[test]
    fn filtre_de_pertinence() {
        let p = NoteParser::new();
        let v = Variables::new();
        assert_eq!(
            p.jetons_pertinents("A simple calculation: 100 km / 10 s", &v),
            vec!["A", "100", "km", "/", "10", "s"]
        );
        assert_eq!(p.jetons_pertinents("The result is 5m", &v), vec!["5", "m"]);
        assert!(p.jetons_pertinents("no maths here", &v).is_empty());
        assert_eq!(p.jetons_pertinents("a tomato to go", &v), vec!["to"]);
    }

    #[test]
    fn expressions_melangees() {
        let mut xy = Variables::new();
        xy.insert("x".into(), q(2.0, "m"));
        xy.insert("y".into(), q(3.0, "s"));
        let mut p = NoteParser::new();
        assert_eq!(p.parse_line("x * y is my favourite number", &xy), Some(q(6.0, "m*s")));

        let mut x1 = Variables::new();
        x1.insert("x".into(), n(1.0));
        assert_eq!(p.parse_line("what is 1 + 1", &x1), Some(n(2.0)));

        assert_eq!(ligne("The angle of the sun is 45 degrees"), Some(q(45.0, "deg")));
        assert_eq!(ligne("A simple calculation: 100 km / 10 s"), Some(q(10.0, "km/s")));
        assert_eq!(ligne("no maths here"), None);
        assert_eq!(ligne("2 plus 3"), Some(n(2.0)));
        assert_eq!(ligne("The result is 5m"), Some(q(5.0, "m")));
        assert_eq!(ligne("calculate 1g + (1g to kg)"), Some(q(2.0, "g")));
        assert_eq!(ligne("1kg + 1kg to g"), Some(q(2000.0, "g")));
        assert_eq!(ligne("5 people + 10 bananas"), Some(n(15.0)));
        assert_eq!(ligne("1 (and i mean this) + 1"), Some(n(2.0)));
        assert_eq!(ligne("5+5 from previous results + 10"), Some(n(20.0)));
    }

    #[test]
    fn affichage_du_resultat() {
        let r = ligne("The angle of the sun is 45 degrees").unwrap();
        assert_eq!(r.to_string(), "45 deg");
    }

    #[test]
    fn ligne_sans_expression_evaluable() {
        // jetons pertinents, mais aucun candidat valide
        let mut p = NoteParser::new();
        let e = p.extract("kg + s", &Variables::new());
        assert_eq!(e.resultat, None);
        assert!(matches!(e.issue, Issue::Recherche { .. }));
        assert_eq!(p.stats().misses, 1);
    }

    #[test]
    fn cache_hit_miss_hit_none() {
        let mut p = NoteParser::new();
        let mut vars = Variables::new();
        vars.insert("x".into(), n(2.0));

        // premier passage : recherche complète
        assert_eq!(p.parse_line("x * 3 apples", &vars), Some(n(6.0)));
        assert_eq!(p.stats(), CacheStats { hits: 0, misses: 1 });

        // mêmes variables : HIT
        let e = p.extract("x * 3 apples", &vars);
        assert_eq!(e.resultat, Some(n(6.0)));
        assert_eq!(e.issue, Issue::Cache(CacheMatch::Hit));
        assert_eq!(p.stats(), CacheStats { hits: 1, misses: 1 });

        // une variable non utilisée change : toujours HIT
        vars.insert("z".into(), n(9.0));
        assert_eq!(p.extract("x * 3 apples", &vars).issue, Issue::Cache(CacheMatch::Hit));

        // x change : MISS et réévaluation
        vars.insert("x".into(), n(5.0));
        let e = p.extract("x * 3 apples", &vars);
        assert_eq!(e.resultat, Some(n(15.0)));
        assert!(matches!(e.issue, Issue::Recherche { .. }));
        assert_eq!(p.stats(), CacheStats { hits: 2, misses: 2 });

        // x disparaît : HIT_NONE, sans recherche
        vars.remove("x");
        let e = p.extract("x * 3 apples", &vars);
        assert_eq!(e.resultat, None);
        assert_eq!(e.issue, Issue::Cache(CacheMatch::HitNone));
        assert_eq!(p.stats(), CacheStats { hits: 3, misses: 2 });
        assert_eq!(p.taille_cache(), 1);
    }

    #[test]
    fn plafond_de_jetons() {
        let mut config = ConfigNotes::default();
        config.set_plafond_jetons(Some(3));
        let mut p = NoteParser::avec_parseur(ExpressionParser::default(), config);
        assert_eq!(p.jetons_pertinents("1 + 2 + 3", &Variables::new()).len(), 3);
        assert_eq!(p.parse_line("1 + 2 + 3", &Variables::new()), Some(n(3.0)));

        // sous le plafond : comportement inchangé
        assert_eq!(p.parse_line("2 * 4", &Variables::new()), Some(n(8.0)));
    }

    #[test]
    fn exposants_enormes_sans_panique() {
        let mut p = NoteParser::new();
        let v = Variables::new();
        // l’expression complète déborde ; le premier candidat valide est
        // "(1 ^ 100000) ^ 100000"
        assert_eq!(p.parse_line("area is (1 m ^ 100000) ^ 100000 ok", &v), Some(n(1.0)));

        let e = p.extract("1 m ^ 2000000000 * 1 m ^ 2000000000", &v);
        assert!(matches!(e.issue, Issue::Recherche { .. }));
        // "1e308 * 10" déborde ; "1e308" seul reste valide
        assert_eq!(p.parse_line("1e308 * 10", &v), Some(n(1e308)));
    }

    /* --- journal : capture des avertissements --- */

    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    #[derive(Clone, Default)]
    struct Avertissements(Arc<Mutex<Vec<String>>>);

    struct Message<'a>(&'a mut String);

    impl Visit for Message<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Avertissements {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() != tracing::Level::WARN {
                return;
            }
            let mut message = String::new();
            event.record(&mut Message(&mut message));
            self.0.lock().unwrap().push(message);
        }
    }

    fn avertissements(seuil: Duration, ligne: &str) -> Vec<String> {
        let journal = Avertissements::default();
        let abonne = Registry::default().with(journal.clone());
        tracing::subscriber::with_default(abonne, || {
            let mut p = NoteParser::new();
            p.config_mut().set_seuil_lent(seuil);
            p.parse_line(ligne, &Variables::new());
            // servie par le cache : pas de nouvelle mesure
            p.parse_line(ligne, &Variables::new());
        });
        let messages = journal.0.lock().unwrap().clone();
        messages
    }

    #[test]
    fn ligne_lente_signalee() {
        let messages = avertissements(Duration::ZERO, "A simple calculation: 100 km / 10 s");
        assert_eq!(messages, vec!["slow parse".to_string()]);
    }

    #[test]
    fn ligne_rapide_silencieuse() {
        let messages = avertissements(Duration::from_secs(60), "what is 1 + 1");
        assert!(messages.is_empty(), "{messages:?}");
    }
}
