// src/noyau/unites.rs
//
// Registre d’unités (lecture seule, initialisé une fois).
// - Dimension : vecteur d’exposants rationnels sur les 7 grandeurs SI de base
// - Atome     : unité nommée (symbole + facteur vers SI + dimension)
// - Unit      : produit ordonné d’atomes avec exposants (km/s reste km/s)
//
// Le parseur ne voit que le trait `SystemeUnites` : on peut lui injecter
// un registre factice en test.

use std::collections::HashMap;
use std::fmt;

use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, One, Signed, Zero};
use once_cell::sync::Lazy;

use super::erreur::{DimensionError, UniteError};

/// Exposant d’unité (m², s⁻¹, m^(1/2)…).
pub type Exposant = Ratio<i32>;

/* ------------------------ Dimension ------------------------ */

pub const LONGUEUR: usize = 0;
pub const MASSE: usize = 1;
pub const TEMPS: usize = 2;
pub const COURANT: usize = 3;
pub const TEMPERATURE: usize = 4;
pub const QUANTITE_MATIERE: usize = 5;
pub const LUMINOSITE: usize = 6;

const NB_BASES: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimension(pub [Exposant; NB_BASES]);

impl Default for Dimension {
    fn default() -> Self {
        Self::sans()
    }
}

/// Exposant borné : pas d’i32::MIN, l’opposé existe toujours.
fn borne(e: Option<Exposant>) -> Result<Exposant, DimensionError> {
    match e {
        Some(e) if *e.numer() != i32::MIN && *e.denom() != i32::MIN => Ok(e),
        _ => Err(DimensionError::ExposantHorsBornes),
    }
}

impl Dimension {
    pub fn sans() -> Self {
        Dimension([Exposant::zero(); NB_BASES])
    }

    /// Dimension à partir de couples (grandeur de base, exposant entier).
    pub fn de(parts: &[(usize, i32)]) -> Self {
        let mut d = Self::sans();
        for &(base, exp) in parts {
            d.0[base] += Exposant::from_integer(exp);
        }
        d
    }

    pub fn est_sans(&self) -> bool {
        self.0.iter().all(Zero::is_zero)
    }

    pub fn puissance(self, e: Exposant) -> Result<Self, DimensionError> {
        let mut d = self;
        for x in d.0.iter_mut() {
            *x = borne(x.checked_mul(&e))?;
        }
        Ok(d)
    }

    pub fn produit(self, rhs: Self) -> Result<Self, DimensionError> {
        let mut d = self;
        for (a, b) in d.0.iter_mut().zip(rhs.0) {
            *a = borne(a.checked_add(&b))?;
        }
        Ok(d)
    }
}

/* ------------------------ Atome / Unit ------------------------ */

/// Unité nommée, éventuellement préfixée (km = k + m).
#[derive(Clone, Debug)]
pub struct Atome {
    pub symbole: String,
    /// Facteur multiplicatif vers l’unité SI de même dimension.
    pub facteur: f64,
    pub dimension: Dimension,
}

/// Handle opaque d’unité : produit d’atomes, dans l’ordre d’apparition.
///
/// Deux atomes de même symbole fusionnent leurs exposants ; un exposant nul
/// fait disparaître l’atome (s/s est sans dimension).
#[derive(Clone, Debug, Default)]
pub struct Unit {
    termes: Vec<(Atome, Exposant)>,
    /// Calculée (avec contrôle de débordement) à chaque construction.
    dimension: Dimension,
}

fn dimension_de(termes: &[(Atome, Exposant)]) -> Result<Dimension, DimensionError> {
    termes
        .iter()
        .try_fold(Dimension::sans(), |acc, (a, e)| acc.produit(a.dimension.puissance(*e)?))
}

fn exposant_f64(e: Exposant) -> f64 {
    if e.is_integer() {
        return f64::from(*e.numer());
    }
    f64::from(*e.numer()) / f64::from(*e.denom())
}

fn puissance_f64(x: f64, e: Exposant) -> f64 {
    if e.is_integer() {
        x.powi(*e.numer())
    } else {
        x.powf(exposant_f64(e))
    }
}

impl Unit {
    /// Unité formelle "dimensionless" (aucun atome).
    pub fn sans_dimension() -> Self {
        Self::default()
    }

    pub fn depuis_atome(atome: Atome) -> Self {
        Unit {
            dimension: atome.dimension,
            termes: vec![(atome, Exposant::one())],
        }
    }

    /// Vrai si aucun atome n’est porté (nombre nu).
    pub fn est_vide(&self) -> bool {
        self.termes.is_empty()
    }

    pub fn termes(&self) -> impl Iterator<Item = (&str, Exposant)> + '_ {
        self.termes.iter().map(|(a, e)| (a.symbole.as_str(), *e))
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// deg, rad, m/cm… sont sans dimension, même s’ils portent un atome.
    pub fn is_dimensionless(&self) -> bool {
        self.dimension().est_sans()
    }

    /// Facteur vers les unités SI de base.
    pub fn facteur(&self) -> f64 {
        self.termes
            .iter()
            .fold(1.0, |acc, (a, e)| acc * puissance_f64(a.facteur, *e))
    }

    /// Facteur de conversion self -> cible (valeur_cible = valeur * facteur).
    pub fn facteur_vers(&self, cible: &Unit) -> Result<f64, DimensionError> {
        if self.dimension() != cible.dimension() {
            return Err(DimensionError::Incompatible {
                de: self.to_string(),
                vers: cible.to_string(),
            });
        }
        if self == cible {
            return Ok(1.0);
        }
        Ok(self.facteur() / cible.facteur())
    }

    fn accumuler(&mut self, atome: &Atome, e: Exposant) -> Result<(), DimensionError> {
        if let Some(pos) = self
            .termes
            .iter()
            .position(|(a, _)| a.symbole == atome.symbole)
        {
            let somme = borne(self.termes[pos].1.checked_add(&e))?;
            if somme.is_zero() {
                self.termes.remove(pos);
            } else {
                self.termes[pos].1 = somme;
            }
        } else if !e.is_zero() {
            self.termes.push((atome.clone(), e));
        }
        Ok(())
    }

    fn combiner(&self, autre: &Unit, inverse: bool) -> Result<Unit, DimensionError> {
        let mut u = self.clone();
        for (a, e) in &autre.termes {
            let e = if inverse {
                borne(Exposant::zero().checked_sub(e))?
            } else {
                *e
            };
            u.accumuler(a, e)?;
        }
        u.dimension = dimension_de(&u.termes)?;
        Ok(u)
    }

    pub fn multiplier(&self, autre: &Unit) -> Result<Unit, DimensionError> {
        self.combiner(autre, false)
    }

    pub fn diviser(&self, autre: &Unit) -> Result<Unit, DimensionError> {
        self.combiner(autre, true)
    }

    pub fn puissance(&self, e: Exposant) -> Result<Unit, DimensionError> {
        if e.is_zero() {
            return Ok(Unit::sans_dimension());
        }
        let termes = self
            .termes
            .iter()
            .map(|(a, x)| Ok((a.clone(), borne(x.checked_mul(&e))?)))
            .collect::<Result<Vec<_>, DimensionError>>()?;
        let dimension = dimension_de(&termes)?;
        Ok(Unit { termes, dimension })
    }
}

/// Égalité structurelle : mêmes atomes avec mêmes exposants, ordre indifférent.
impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.termes.len() == other.termes.len()
            && self.termes.iter().all(|(a, e)| {
                other
                    .termes
                    .iter()
                    .any(|(b, f)| a.symbole == b.symbole && e == f)
            })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::format::format_unit(self))
    }
}

/* ------------------------ Contrat injecté ------------------------ */

/// Capacité "unités" requise par le parseur.
pub trait SystemeUnites {
    /// Lit une chaîne d’unité ("km", "km/s", "m^2", "degrees").
    fn parse_unit(&self, texte: &str) -> Result<Unit, UniteError>;

    fn est_unite(&self, mot: &str) -> bool {
        self.parse_unit(mot).is_ok()
    }
}

/* ------------------------ Registre par défaut ------------------------ */

#[derive(Clone, Copy, Debug)]
struct Definition {
    symbole: &'static str,
    noms: &'static [&'static str],
    facteur: f64,
    dim: &'static [(usize, i32)],
    prefixable: bool,
}

const fn def(
    symbole: &'static str,
    noms: &'static [&'static str],
    facteur: f64,
    dim: &'static [(usize, i32)],
    prefixable: bool,
) -> Definition {
    Definition {
        symbole,
        noms,
        facteur,
        dim,
        prefixable,
    }
}

const DEG: f64 = std::f64::consts::PI / 180.0;

const DEFINITIONS: &[Definition] = &[
    // Longueur
    def("m", &["meter", "metre"], 1.0, &[(LONGUEUR, 1)], true),
    def("in", &["inch", "inches"], 0.0254, &[(LONGUEUR, 1)], false),
    def("ft", &["foot", "feet"], 0.3048, &[(LONGUEUR, 1)], false),
    def("yd", &["yard"], 0.9144, &[(LONGUEUR, 1)], false),
    def("mi", &["mile"], 1609.344, &[(LONGUEUR, 1)], false),
    // Masse (SI : kg, donc g = 1e-3)
    def("g", &["gram", "gramme"], 1e-3, &[(MASSE, 1)], true),
    def("t", &["tonne"], 1e3, &[(MASSE, 1)], false),
    def("lb", &["pound"], 0.45359237, &[(MASSE, 1)], false),
    def("oz", &["ounce"], 0.028349523125, &[(MASSE, 1)], false),
    // Temps
    def("s", &["second"], 1.0, &[(TEMPS, 1)], true),
    def("min", &["minute"], 60.0, &[(TEMPS, 1)], false),
    def("h", &["hour", "hr"], 3600.0, &[(TEMPS, 1)], false),
    def("d", &["day"], 86_400.0, &[(TEMPS, 1)], false),
    def("week", &[], 604_800.0, &[(TEMPS, 1)], false),
    def("yr", &["year"], 31_557_600.0, &[(TEMPS, 1)], false),
    // Autres grandeurs de base
    def("A", &["ampere"], 1.0, &[(COURANT, 1)], true),
    def("K", &["kelvin"], 1.0, &[(TEMPERATURE, 1)], true),
    def("mol", &["mole"], 1.0, &[(QUANTITE_MATIERE, 1)], true),
    def("cd", &["candela"], 1.0, &[(LUMINOSITE, 1)], true),
    // Angles et rapports : sans dimension
    def("rad", &["radian"], 1.0, &[], false),
    def("deg", &["degree"], DEG, &[], false),
    def("percent", &[], 0.01, &[], false),
    // Dérivées
    def("Hz", &["hertz"], 1.0, &[(TEMPS, -1)], true),
    def("N", &["newton"], 1.0, &[(MASSE, 1), (LONGUEUR, 1), (TEMPS, -2)], true),
    def("J", &["joule"], 1.0, &[(MASSE, 1), (LONGUEUR, 2), (TEMPS, -2)], true),
    def("W", &["watt"], 1.0, &[(MASSE, 1), (LONGUEUR, 2), (TEMPS, -3)], true),
    def("Wh", &["watt_hour"], 3600.0, &[(MASSE, 1), (LONGUEUR, 2), (TEMPS, -2)], true),
    def("cal", &["calorie"], 4.184, &[(MASSE, 1), (LONGUEUR, 2), (TEMPS, -2)], true),
    def("Pa", &["pascal"], 1.0, &[(MASSE, 1), (LONGUEUR, -1), (TEMPS, -2)], true),
    def("bar", &[], 1e5, &[(MASSE, 1), (LONGUEUR, -1), (TEMPS, -2)], false),
    def("atm", &["atmosphere"], 101_325.0, &[(MASSE, 1), (LONGUEUR, -1), (TEMPS, -2)], false),
    def("C", &["coulomb"], 1.0, &[(COURANT, 1), (TEMPS, 1)], true),
    def(
        "V",
        &["volt"],
        1.0,
        &[(MASSE, 1), (LONGUEUR, 2), (TEMPS, -3), (COURANT, -1)],
        true,
    ),
    def(
        "ohm",
        &[],
        1.0,
        &[(MASSE, 1), (LONGUEUR, 2), (TEMPS, -3), (COURANT, -2)],
        true,
    ),
    def("L", &["liter", "litre", "l"], 1e-3, &[(LONGUEUR, 3)], true),
    def("mph", &[], 0.44704, &[(LONGUEUR, 1), (TEMPS, -1)], false),
];

/// Préfixes SI : (symbole, nom, facteur). Pas d’atto ni de hecto : "am" et
/// "h" restent de l’anglais et l’heure.
const PREFIXES: &[(&str, &str, f64)] = &[
    ("p", "pico", 1e-12),
    ("n", "nano", 1e-9),
    ("u", "micro", 1e-6),
    ("m", "milli", 1e-3),
    ("c", "centi", 1e-2),
    ("d", "deci", 1e-1),
    ("k", "kilo", 1e3),
    ("M", "mega", 1e6),
    ("G", "giga", 1e9),
    ("T", "tera", 1e12),
];

struct Table {
    par_symbole: HashMap<&'static str, Definition>,
    par_nom: HashMap<&'static str, Definition>,
}

static TABLE: Lazy<Table> = Lazy::new(|| {
    let mut par_symbole = HashMap::new();
    let mut par_nom = HashMap::new();
    for d in DEFINITIONS {
        par_symbole.insert(d.symbole, *d);
        for nom in d.noms {
            par_nom.insert(*nom, *d);
        }
    }
    Table {
        par_symbole,
        par_nom,
    }
});

/// Registre par défaut (table statique partagée, lecture seule).
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistreUnites;

impl RegistreUnites {
    fn atome(d: &Definition, prefixe: Option<(&str, f64)>) -> Atome {
        let (p, f) = prefixe.unwrap_or(("", 1.0));
        Atome {
            symbole: format!("{p}{}", d.symbole),
            facteur: f * d.facteur,
            dimension: Dimension::de(d.dim),
        }
    }

    /// Nom complet, au singulier ou au pluriel simple (degrees, meters).
    fn par_nom(table: &Table, mot: &str) -> Option<Definition> {
        if let Some(d) = table.par_nom.get(mot) {
            return Some(*d);
        }
        let singulier = mot.strip_suffix('s')?;
        table.par_nom.get(singulier).copied()
    }

    /// Un mot isolé : symbole, nom, puis combinaisons préfixe + unité.
    fn atome_depuis_mot(&self, mot: &str) -> Option<Atome> {
        let table = &*TABLE;

        if let Some(d) = table.par_symbole.get(mot) {
            return Some(Self::atome(d, None));
        }
        if let Some(d) = Self::par_nom(table, mot) {
            return Some(Self::atome(&d, None));
        }

        for &(psym, pnom, pfacteur) in PREFIXES {
            if let Some(reste) = mot.strip_prefix(psym) {
                if let Some(d) = table.par_symbole.get(reste).filter(|d| d.prefixable) {
                    return Some(Self::atome(d, Some((psym, pfacteur))));
                }
            }
            if let Some(reste) = mot.strip_prefix(pnom) {
                if let Some(d) = Self::par_nom(table, reste).filter(|d| d.prefixable) {
                    return Some(Self::atome(&d, Some((psym, pfacteur))));
                }
            }
        }

        None
    }

    /// terme := atome ( ('^' | '**') entier )?
    fn terme(&self, texte: &str, brut: &str) -> Result<Unit, UniteError> {
        let malformee = |raison| UniteError::Malformee {
            texte: brut.to_string(),
            raison,
        };

        let (base, exp) = match texte.split_once("**").or_else(|| texte.split_once('^')) {
            Some((b, e)) => {
                let e: i32 = e
                    .trim()
                    .parse()
                    .map_err(|_| malformee("exponent must be an integer"))?;
                (b.trim(), Exposant::from_integer(e))
            }
            None => (texte.trim(), Exposant::one()),
        };

        if base.is_empty() {
            return Err(malformee("empty unit term"));
        }
        if base == "1" || base == "dimensionless" {
            return Ok(Unit::sans_dimension());
        }

        let atome = self
            .atome_depuis_mot(base)
            .ok_or_else(|| UniteError::Indefinie(base.to_string()))?;
        Unit::depuis_atome(atome)
            .puissance(exp)
            .map_err(|_| malformee("exponent out of range"))
    }
}

impl SystemeUnites for RegistreUnites {
    /// unite := terme ( ('*' | '·' | '/') terme )*
    ///
    /// Le '/' ne porte que sur le terme suivant : kg/m/s = kg·m⁻¹·s⁻¹.
    fn parse_unit(&self, texte: &str) -> Result<Unit, UniteError> {
        let brut = texte.trim();
        if brut.is_empty() {
            return Err(UniteError::Malformee {
                texte: texte.to_string(),
                raison: "empty unit string",
            });
        }

        let mut unite = Unit::sans_dimension();
        let mut diviser = false;
        let mut debut = 0;
        let octets: Vec<(usize, char)> = brut.char_indices().collect();
        let mut i = 0;

        while i <= octets.len() {
            let (pos, c) = octets.get(i).copied().unwrap_or((brut.len(), '\0'));
            let separateur = match c {
                '\0' => true,
                '/' | '·' => true,
                '*' => {
                    // "**" est un exposant, pas un produit
                    let double = octets.get(i + 1).map(|&(_, n)| n) == Some('*')
                        || (i > 0 && octets[i - 1].1 == '*');
                    !double
                }
                _ => false,
            };

            if separateur {
                let terme = self.terme(&brut[debut..pos], brut)?;
                let combinee = if diviser {
                    unite.diviser(&terme)
                } else {
                    unite.multiplier(&terme)
                };
                unite = combinee.map_err(|_| UniteError::Malformee {
                    texte: brut.to_string(),
                    raison: "exponent out of range",
                })?;
                diviser = c == '/';
                debut = pos + c.len_utf8();
            }
            i += 1;
        }

        Ok(unite)
    }
}

/// Registre global (lecture seule).
pub fn registre() -> RegistreUnites {
    RegistreUnites
}

/// Approche rationnelle d’un exposant flottant (0.5 -> 1/2), si exacte.
pub fn exposant_depuis_f64(x: f64) -> Option<Exposant> {
    let r = Exposant::approximate_float(x)?;
    let retour = exposant_f64(r);
    if (retour - x).abs() <= 1e-12 * x.abs().max(1.0) {
        Some(r)
    } else {
        None
    }
}

/// Exposant affichable : entier nu ou fraction.
pub fn exposant_texte(e: Exposant) -> String {
    if e.is_integer() {
        e.numer().to_string()
    } else {
        format!("{}/{}", e.numer(), e.denom().abs())
    }
}

pub(crate) fn exposant_negatif(e: Exposant) -> bool {
    e.is_negative()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Unit {
        registre()
            .parse_unit(s)
            .unwrap_or_else(|e| panic!("parse_unit({s:?}) erreur: {e}"))
    }

    #[test]
    fn symboles_et_noms() {
        assert_eq!(u("m"), u("meter"));
        assert_eq!(u("deg"), u("degrees"));
        assert_eq!(u("ft"), u("feet"));
        assert!(registre().parse_unit("bananas").is_err());
        assert!(registre().parse_unit("people").is_err());
    }

    #[test]
    fn prefixes() {
        assert!((u("km").facteur() - 1000.0).abs() < 1e-9);
        assert!((u("mg").facteur() - 1e-6).abs() < 1e-18);
        assert_eq!(u("kilometers"), u("km"));
        // "min" est la minute, pas un milli-inch
        assert!((u("min").facteur() - 60.0).abs() < 1e-12);
        // unités non préfixables
        assert!(registre().parse_unit("kin").is_err());
    }

    #[test]
    fn mots_anglais_ignores() {
        for mot in ["The", "is", "of", "sun", "angle", "no", "maths", "here", "and", "plus"] {
            assert!(
                registre().parse_unit(mot).is_err(),
                "{mot:?} ne devrait pas être une unité"
            );
        }
    }

    #[test]
    fn composees() {
        let v = u("km/s");
        assert_eq!(v.dimension(), Dimension::de(&[(LONGUEUR, 1), (TEMPS, -1)]));
        let a = u("m^2");
        assert_eq!(a.dimension(), Dimension::de(&[(LONGUEUR, 2)]));
        assert_eq!(u("m**2"), a);
        assert_eq!(u("kg/m/s").dimension(), u("Pa*s").dimension());
        assert!(u("dimensionless").est_vide());
        assert!(registre().parse_unit("m^x").is_err());
        assert!(registre().parse_unit("m/").is_err());
    }

    #[test]
    fn sans_dimension_et_annulation() {
        assert!(u("deg").is_dimensionless());
        assert!(!u("deg").est_vide());
        assert!(u("s/s").est_vide());
        assert!(u("m/cm").is_dimensionless());
    }

    #[test]
    fn facteurs_de_conversion() {
        let f = u("m").facteur_vers(&u("cm")).unwrap();
        assert!((f - 100.0).abs() < 1e-9);
        assert!(u("m").facteur_vers(&u("kg")).is_err());
    }

    #[test]
    fn exposants_rationnels() {
        assert_eq!(exposant_depuis_f64(0.5), Some(Exposant::new(1, 2)));
        assert_eq!(exposant_depuis_f64(2.0), Some(Exposant::from_integer(2)));
        assert_eq!(exposant_texte(Exposant::new(-1, 2)), "-1/2");
    }
}
