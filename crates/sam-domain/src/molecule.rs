//! Estructuras moleculares inmutables.
//!
//! Una `MolecularStructure` se valida al construirse (índices de enlaces
//! dentro de rango, elementos conocidos) y calcula una sola vez su hash
//! canónico sha256 sobre átomos + enlaces + carga. Ese hash es la identidad
//! usada por la cache del evaluador de energía: dos estructuras con el mismo
//! hash comparten resultado hasta que expire la entrada.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::DomainError;

/// Átomo con posición 3D y carga formal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub formal_charge: i32,
}

impl Atom {
    pub fn new(element: &str, x: f64, y: f64, z: f64) -> Self {
        Atom { element: element.to_string(), x, y, z, formal_charge: 0 }
    }

    /// Distancia euclídea entre dos átomos.
    pub fn distance(&self, other: &Atom) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

/// Enlace entre dos átomos referenciados por índice.
/// `order` admite 1.5 para enlaces aromáticos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolecularStructure {
    id: String,
    name: String,
    canonical_hash: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    charge: i32,
    spin_multiplicity: u32,
}

/// Número de electrones por elemento (neutro). La tabla cubre los elementos
/// presentes en análogos de SAM y sus reactivos.
fn electron_count_of(element: &str) -> Option<u32> {
    match element {
        "H" => Some(1),
        "C" => Some(6),
        "N" => Some(7),
        "O" => Some(8),
        "F" => Some(9),
        "P" => Some(15),
        "S" => Some(16),
        "Cl" => Some(17),
        "Se" => Some(34),
        "Br" => Some(35),
        _ => None,
    }
}

/// Número atómico, idéntico al recuento de electrones del átomo neutro.
pub fn atomic_number(element: &str) -> u32 {
    electron_count_of(element).unwrap_or(1)
}

impl MolecularStructure {
    /// Construye y valida una estructura. Los enlaces deben referenciar
    /// índices de átomos existentes y todos los elementos deben ser
    /// conocidos por la tabla periódica local.
    pub fn new(id: &str, name: &str, atoms: Vec<Atom>, bonds: Vec<Bond>, charge: i32, spin_multiplicity: u32) -> Result<Self, DomainError> {
        for atom in &atoms {
            if electron_count_of(&atom.element).is_none() {
                return Err(DomainError::UnknownElement(atom.element.clone()));
            }
        }
        for bond in &bonds {
            if bond.atom1 >= atoms.len() || bond.atom2 >= atoms.len() {
                return Err(DomainError::Validation(format!("bond references atom out of range: {}-{}", bond.atom1, bond.atom2)));
            }
        }
        let canonical_hash = Self::compute_hash(&atoms, &bonds, charge);
        Ok(MolecularStructure { id: id.to_string(),
                                name: name.to_string(),
                                canonical_hash,
                                atoms,
                                bonds,
                                charge,
                                spin_multiplicity })
    }

    /// Hash canónico sha256 sobre la representación serializada de átomos,
    /// enlaces y carga neta. Determinista: mismo contenido -> mismo hash.
    fn compute_hash(atoms: &[Atom], bonds: &[Bond], charge: i32) -> String {
        let mut hasher = Sha256::new();
        for a in atoms {
            hasher.update(a.element.as_bytes());
            hasher.update(a.x.to_le_bytes());
            hasher.update(a.y.to_le_bytes());
            hasher.update(a.z.to_le_bytes());
            hasher.update(a.formal_charge.to_le_bytes());
        }
        for b in bonds {
            hasher.update(b.atom1.to_le_bytes());
            hasher.update(b.atom2.to_le_bytes());
            hasher.update(b.order.to_le_bytes());
        }
        hasher.update(charge.to_le_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn canonical_hash(&self) -> &str { &self.canonical_hash }
    pub fn atoms(&self) -> &[Atom] { &self.atoms }
    pub fn bonds(&self) -> &[Bond] { &self.bonds }
    pub fn charge(&self) -> i32 { self.charge }
    pub fn spin_multiplicity(&self) -> u32 { self.spin_multiplicity }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Electrones totales de la estructura: suma por elemento menos la carga
    /// neta. Determina la admisibilidad del camino simulado del evaluador.
    pub fn electron_count(&self) -> i64 {
        let total: i64 = self.atoms.iter()
                                   .map(|a| electron_count_of(&a.element).unwrap_or(0) as i64)
                                   .sum();
        total - self.charge as i64
    }

    pub fn compare(&self, other: &MolecularStructure) -> bool {
        self.canonical_hash == other.canonical_hash
    }
}

impl fmt::Display for MolecularStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {} atoms, {} bonds, charge {}>", self.name, self.atoms.len(), self.bonds.len(), self.charge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> MolecularStructure {
        MolecularStructure::new("h2o",
                                "water",
                                vec![Atom::new("O", 0.0, 0.0, 0.0),
                                     Atom::new("H", 0.96, 0.0, 0.0),
                                     Atom::new("H", -0.24, 0.93, 0.0)],
                                vec![Bond { atom1: 0, atom2: 1, order: 1.0 }, Bond { atom1: 0, atom2: 2, order: 1.0 }],
                                0,
                                1).unwrap()
    }

    #[test]
    fn electron_count_sums_elements_minus_charge() {
        let w = water();
        assert_eq!(w.electron_count(), 10);
    }

    #[test]
    fn hash_is_stable_and_content_addressed() {
        let a = water();
        let b = water();
        assert_eq!(a.canonical_hash(), b.canonical_hash());
        assert!(a.compare(&b));
    }

    #[test]
    fn bond_out_of_range_is_rejected() {
        let err = MolecularStructure::new("bad",
                                          "bad",
                                          vec![Atom::new("H", 0.0, 0.0, 0.0)],
                                          vec![Bond { atom1: 0, atom2: 7, order: 1.0 }],
                                          0,
                                          1);
        assert!(err.is_err());
    }

    #[test]
    fn unknown_element_is_rejected() {
        let err = MolecularStructure::new("xx", "xx", vec![Atom::new("Xx", 0.0, 0.0, 0.0)], vec![], 0, 1);
        assert!(matches!(err, Err(DomainError::UnknownElement(_))));
    }
}
