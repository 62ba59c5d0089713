//! Análogos de S-adenosil-L-metionina (SAM) y su modelo de estabilidad.
//!
//! Un `SamAnalog` es un candidato estructural derivado de un análogo base:
//! fija un grupo alquilo y un isóstero del carboxilo, y deriva de este último
//! sus campos de estabilidad (vida media y resistencia a degradación). Las
//! derivaciones son funciones puras de tablas experimentales; re-evaluar un
//! candidato siempre crea un registro nuevo, nunca muta el existente.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::molecule::{Atom, Bond, MolecularStructure};
use crate::DomainError;

/// Tamaño relativo del grupo alquilo; gobierna compatibilidad enzimática y
/// la aplicabilidad de rutas de alquilación directa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlkylSize {
    Small,
    Medium,
    Large,
}

/// Grupos alquilo estándar para alquil-randomización.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlkylGroup {
    Methyl,
    Ethyl,
    Allyl,
    Propargyl,
    Benzyl,
    Azidobutyl,
}

impl AlkylGroup {
    pub const ALL: [AlkylGroup; 6] = [AlkylGroup::Methyl,
                                      AlkylGroup::Ethyl,
                                      AlkylGroup::Allyl,
                                      AlkylGroup::Propargyl,
                                      AlkylGroup::Benzyl,
                                      AlkylGroup::Azidobutyl];

    pub fn name(&self) -> &'static str {
        match self {
            AlkylGroup::Methyl => "methyl",
            AlkylGroup::Ethyl => "ethyl",
            AlkylGroup::Allyl => "allyl",
            AlkylGroup::Propargyl => "propargyl",
            AlkylGroup::Benzyl => "benzyl",
            AlkylGroup::Azidobutyl => "4-azidobutyl",
        }
    }

    pub fn size(&self) -> AlkylSize {
        match self {
            AlkylGroup::Methyl | AlkylGroup::Ethyl => AlkylSize::Small,
            AlkylGroup::Allyl | AlkylGroup::Propargyl => AlkylSize::Medium,
            AlkylGroup::Benzyl | AlkylGroup::Azidobutyl => AlkylSize::Large,
        }
    }

    /// Fragmento SMILES del grupo, como referencia para reportes.
    pub fn smiles_fragment(&self) -> &'static str {
        match self {
            AlkylGroup::Methyl => "C",
            AlkylGroup::Ethyl => "CC",
            AlkylGroup::Allyl => "CC=C",
            AlkylGroup::Propargyl => "CC#C",
            AlkylGroup::Benzyl => "Cc1ccccc1",
            AlkylGroup::Azidobutyl => "CCCCN=[N+]=[N-]",
        }
    }

    /// Apto para química bioortogonal (click handles).
    pub fn bioorthogonal(&self) -> bool {
        matches!(self, AlkylGroup::Allyl | AlkylGroup::Propargyl | AlkylGroup::Azidobutyl)
    }

    /// Átomos pesados aportados por el grupo al fragmento evaluable.
    fn heavy_atoms(&self) -> &'static [&'static str] {
        match self {
            AlkylGroup::Methyl => &["C"],
            AlkylGroup::Ethyl => &["C", "C"],
            AlkylGroup::Allyl | AlkylGroup::Propargyl => &["C", "C", "C"],
            AlkylGroup::Benzyl => &["C", "C", "C", "C", "C", "C", "C"],
            AlkylGroup::Azidobutyl => &["C", "C", "C", "C", "N", "N", "N"],
        }
    }
}

/// Isóstero del carboxilo. Determina vida media, resistencia a degradación y
/// la plantilla de ruta de síntesis especializada (tetrazol).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Isostere {
    Carboxylate,
    Tetrazole,
    Amide,
    Nitrile,
}

impl Isostere {
    /// Isósteros enumerados durante la generación combinatoria de candidatos.
    pub const CANDIDATE_SET: [Isostere; 3] = [Isostere::Carboxylate, Isostere::Tetrazole, Isostere::Amide];

    pub fn name(&self) -> &'static str {
        match self {
            Isostere::Carboxylate => "carboxylate",
            Isostere::Tetrazole => "tetrazole",
            Isostere::Amide => "amide",
            Isostere::Nitrile => "nitrile",
        }
    }

    /// Vida media en minutos a pH 8 y 37°C, según datos experimentales del
    /// paper de alquil-randomización (tSAM ~7x más estable que SAM nativo).
    pub fn half_life_minutes(&self) -> f64 {
        match self {
            Isostere::Carboxylate => 600.0,
            Isostere::Tetrazole => 4200.0,
            Isostere::Amide => 2000.0,
            Isostere::Nitrile => 1500.0,
        }
    }

    /// Mejora de resistencia a degradación relativa al SAM nativo.
    pub fn degradation_resistance(&self) -> f64 {
        match self {
            Isostere::Tetrazole => 7.0,
            Isostere::Amide => 3.0,
            Isostere::Carboxylate | Isostere::Nitrile => 1.0,
        }
    }

    fn heavy_atoms(&self) -> &'static [&'static str] {
        match self {
            Isostere::Carboxylate => &["C", "O", "O"],
            Isostere::Tetrazole => &["C", "N", "N", "N", "N"],
            Isostere::Amide => &["C", "O", "N"],
            Isostere::Nitrile => &["C", "N"],
        }
    }
}

/// Candidato estructural: análogo base + modificaciones + estabilidad derivada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamAnalog {
    pub id: String,
    /// Identificador del análogo base del que deriva este candidato.
    pub base_id: String,
    pub alkyl_group: AlkylGroup,
    pub carboxyl_isostere: Isostere,
    /// Variante con selenio en lugar de azufre en el centro de sulfonio.
    pub selenium_substituted: bool,
    /// Vida media en minutos (derivada, pH 8 / 37°C).
    pub half_life_min: f64,
    /// Factor de resistencia a degradación (derivado, vs SAM nativo).
    pub degradation_resistance: f64,
}

impl SamAnalog {
    /// Crea un candidato derivando los campos de estabilidad del isóstero.
    pub fn derive(base_id: &str, alkyl: AlkylGroup, isostere: Isostere, selenium: bool) -> Self {
        let id = format!("{}_{}_{}{}", base_id, alkyl.name(), isostere.name(), if selenium { "_Se" } else { "" });
        SamAnalog { id,
                    base_id: base_id.to_string(),
                    alkyl_group: alkyl,
                    carboxyl_isostere: isostere,
                    selenium_substituted: selenium,
                    half_life_min: isostere.half_life_minutes(),
                    degradation_resistance: isostere.degradation_resistance() }
    }

    /// Fragmento molecular evaluable: centro de sulfonio (o selenonio) con el
    /// alquilo y el isóstero como cadenas. Es una reducción deliberada del
    /// análogo completo para que el camino simulado del evaluador sea
    /// admisible (< 20 átomos); el orden de los átomos es determinista.
    pub fn to_structure(&self) -> Result<MolecularStructure, DomainError> {
        let center = if self.selenium_substituted { "Se" } else { "S" };
        let mut atoms = vec![Atom { element: center.to_string(),
                                    x: 0.0,
                                    y: 0.0,
                                    z: 0.0,
                                    formal_charge: 1 }];
        // Cadena alquilo a un lado, isóstero al otro, en una grilla sintética.
        for (i, el) in self.alkyl_group.heavy_atoms().iter().enumerate() {
            atoms.push(Atom::new(el, 1.5 * (i + 1) as f64, 0.0, 0.0));
        }
        for (i, el) in self.carboxyl_isostere.heavy_atoms().iter().enumerate() {
            atoms.push(Atom::new(el, -1.5 * (i + 1) as f64, 0.5, 0.0));
        }
        let mut bonds = Vec::new();
        let alkyl_len = self.alkyl_group.heavy_atoms().len();
        for i in 0..alkyl_len {
            bonds.push(Bond { atom1: if i == 0 { 0 } else { i }, atom2: i + 1, order: 1.0 });
        }
        for i in 0..self.carboxyl_isostere.heavy_atoms().len() {
            let prev = if i == 0 { 0 } else { alkyl_len + i };
            bonds.push(Bond { atom1: prev, atom2: alkyl_len + i + 1, order: 1.0 });
        }
        MolecularStructure::new(&self.id, &format!("SAM-{}-{}", self.alkyl_group.name(), self.carboxyl_isostere.name()), atoms, bonds, 1, 1)
    }

    /// Perfil de estabilidad predicho a partir de la estructura.
    pub fn stability_profile(&self) -> StabilityProfile {
        let mut multiplier = self.carboxyl_isostere.degradation_resistance();
        if self.selenium_substituted {
            // El selenio reduce ligeramente la estabilidad.
            multiplier *= 0.9;
        }
        let adjusted_half_life = 600.0 * multiplier;
        let mut degradation_products = vec!["adenine".to_string()];
        if self.carboxyl_isostere == Isostere::Carboxylate {
            degradation_products.push("homoserine lactone (HSL)".to_string());
            degradation_products.push("5'-methylthioadenosine (MTA)".to_string());
        }
        StabilityProfile { half_life_ph8_37c: adjusted_half_life,
                           degradation_products,
                           racemization_rate: 0.001 / multiplier,
                           depurination_rate: 0.01 / multiplier,
                           storage_conditions: if adjusted_half_life > 3000.0 {
                               "4°C, neutral pH".to_string()
                           } else {
                               "-80°C, acidic pH".to_string()
                           } }
    }
}

impl fmt::Display for SamAnalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<analog {}: {} / {}>", self.id, self.alkyl_group.name(), self.carboxyl_isostere.name())
    }
}

/// Perfil de estabilidad predicho para un análogo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityProfile {
    /// Vida media ajustada en minutos (pH 8, 37°C).
    pub half_life_ph8_37c: f64,
    pub degradation_products: Vec<String>,
    /// Tasa de racemización (min⁻¹).
    pub racemization_rate: f64,
    /// Tasa de depurinación (μM/s).
    pub depurination_rate: f64,
    pub storage_conditions: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_pulls_stability_from_isostere() {
        let a = SamAnalog::derive("SAM", AlkylGroup::Propargyl, Isostere::Tetrazole, false);
        assert_eq!(a.half_life_min, 4200.0);
        assert_eq!(a.degradation_resistance, 7.0);
        assert_eq!(a.id, "SAM_propargyl_tetrazole");
    }

    #[test]
    fn structure_fragment_is_admissible_size() {
        let a = SamAnalog::derive("SAM", AlkylGroup::Benzyl, Isostere::Tetrazole, false);
        let s = a.to_structure().unwrap();
        assert!(s.atom_count() <= 20, "fragment must stay below the simulation cutoff");
        assert_eq!(s.charge(), 1);
    }

    #[test]
    fn selenium_reduces_stability_profile() {
        let s = SamAnalog::derive("SAM", AlkylGroup::Methyl, Isostere::Tetrazole, false).stability_profile();
        let se = SamAnalog::derive("SAM", AlkylGroup::Methyl, Isostere::Tetrazole, true).stability_profile();
        assert!(se.half_life_ph8_37c < s.half_life_ph8_37c);
        assert_eq!(s.storage_conditions, "4°C, neutral pH");
    }

    #[test]
    fn native_analog_lists_hydrolysis_products() {
        let p = SamAnalog::derive("SAM", AlkylGroup::Methyl, Isostere::Carboxylate, false).stability_profile();
        assert!(p.degradation_products.iter().any(|d| d.contains("MTA")));
        assert_eq!(p.storage_conditions, "-80°C, acidic pH");
    }
}
