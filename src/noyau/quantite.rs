// src/noyau/quantite.rs
//
// Quantité = magnitude (f64) + unité. Valeur immuable : chaque opération
// retourne une nouvelle quantité.
//
// Règles (alignées sur l’usage "calepin") :
// - + / - : l’opérande droit est converti dans l’unité du gauche
// - * / / : magnitudes multipliées, unités combinées telles qu’écrites
// - ^     : exposant sans dimension (sa magnitude), appliqué aussi aux
//           exposants d’unité
// - to    : conversion vers une unité de même dimension
// - résultat non fini (inf, NaN) : erreur, jamais une valeur

use std::fmt;

use super::erreur::DimensionError;
use super::format::format_quantite;
use super::unites::{exposant_depuis_f64, Unit};

/// Tolérance relative pour l’égalité entre unités différentes.
const EPSILON_RELATIF: f64 = 1e-12;

#[derive(Clone, Debug)]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Nombre nu (unité formelle "dimensionless").
    pub fn sans_dimension(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::sans_dimension())
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    /// Même magnitude, autre unité ("10" + km -> "10 km").
    pub fn avec_unite(&self, unit: Unit) -> Self {
        Self::new(self.magnitude, unit)
    }

    pub fn to(&self, cible: &Unit) -> Result<Quantity, DimensionError> {
        let facteur = self.unit.facteur_vers(cible)?;
        fini(self.magnitude * facteur, cible.clone())
    }

    pub fn ajouter(&self, autre: &Quantity) -> Result<Quantity, DimensionError> {
        let droite = autre.to(&self.unit)?;
        fini(self.magnitude + droite.magnitude, self.unit.clone())
    }

    pub fn soustraire(&self, autre: &Quantity) -> Result<Quantity, DimensionError> {
        let droite = autre.to(&self.unit)?;
        fini(self.magnitude - droite.magnitude, self.unit.clone())
    }

    /// Magnitudes multipliées, unités combinées telles qu’écrites.
    pub fn multiplier(&self, autre: &Quantity) -> Result<Quantity, DimensionError> {
        let unit = self.unit.multiplier(&autre.unit)?;
        fini(self.magnitude * autre.magnitude, unit)
    }

    /// Le diviseur nul est refusé par l’évaluateur avant d’arriver ici.
    pub fn diviser(&self, autre: &Quantity) -> Result<Quantity, DimensionError> {
        let unit = self.unit.diviser(&autre.unit)?;
        fini(self.magnitude / autre.magnitude, unit)
    }

    pub fn puissance(&self, exposant: &Quantity) -> Result<Quantity, DimensionError> {
        if !exposant.is_dimensionless() {
            return Err(DimensionError::ExposantAvecUnite(exposant.unit.to_string()));
        }
        let e = exposant.magnitude;

        let magnitude = if e.fract() == 0.0 && e.abs() <= f64::from(i32::MAX) {
            self.magnitude.powi(e as i32)
        } else {
            self.magnitude.powf(e)
        };

        if self.unit.est_vide() {
            return fini(magnitude, Unit::sans_dimension());
        }
        let r = exposant_depuis_f64(e).ok_or(DimensionError::ExposantNonRationnel(e))?;
        fini(magnitude, self.unit.puissance(r)?)
    }
}

fn fini(magnitude: f64, unit: Unit) -> Result<Quantity, DimensionError> {
    if magnitude.is_finite() {
        Ok(Quantity::new(magnitude, unit))
    } else {
        Err(DimensionError::NonFini)
    }
}

/// Égalité physique : mêmes unités -> magnitudes identiques ; unités
/// différentes de même dimension -> égalité après conversion (tolérance
/// relative).
impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        if self.unit == other.unit {
            return self.magnitude == other.magnitude;
        }
        match other.to(&self.unit) {
            Ok(o) => {
                let echelle = self.magnitude.abs().max(o.magnitude.abs()).max(1e-300);
                (self.magnitude - o.magnitude).abs() <= EPSILON_RELATIF * echelle
            }
            Err(_) => false,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_quantite(self))
    }
}
