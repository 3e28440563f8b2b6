//! Waarderings- en inzetengine voor pompaccumulatiecentrales.
//!
//! De kern bestaat uit twee gekoppelde delen: de planoptimalisatie met
//! dynamische programmering over het energieniveauraster, en de rollende
//! intrinsieke waardering die per dag over day-ahead, intraday-1 en
//! intraday-2 heen rolt en de uitgevoerde schema's op de centraletoestand
//! en het marktgrootboek boekt.

pub mod eendaags;
pub mod optimalisatie;
pub mod raster;
pub mod rollend;

pub use eendaags::{DagActiviteit, EendaagsResultaat, EendaagsWaardering};
pub use optimalisatie::{
    DynamischeProgrammering, OptimalisatieFout, PlanOptimalisatie, PlanResultaat,
};
pub use raster::{Niveauraster, RasterFout, PRECISIE};
pub use rollend::{
    RollendeIntrinsiekeWaardering, WaarderingFout, WaarderingParameters, WaarderingResultaat,
};
