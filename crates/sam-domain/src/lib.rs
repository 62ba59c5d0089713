//! SamFlow Domain Library
//!
//! Este crate define el modelo de dominio inmutable del motor de
//! descubrimiento:
//! - `molecule`: estructuras moleculares con hash canónico.
//! - `analog`: análogos de SAM y su modelo de estabilidad.
//! - `route`: rutas de síntesis con agregados de rendimiento/costo.
//!
//! Todos los tipos son serializables y nunca se mutan después de creados;
//! cada recalculo produce un registro nuevo.

pub mod analog;
pub mod error;
pub mod molecule;
pub mod route;

pub use analog::{AlkylGroup, AlkylSize, Isostere, SamAnalog, StabilityProfile};
pub use error::DomainError;
pub use molecule::{Atom, Bond, MolecularStructure};
pub use route::{Reagent, RouteStep, StepConditions, SynthesisRoute};
