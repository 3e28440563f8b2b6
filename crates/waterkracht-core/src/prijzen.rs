//! Prijsreeksen voor day-ahead en de twee intraday markten.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markt::IntradayMarkt;

/// Fouttype voor prijsreeksen.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrijsFout {
    #[error(
        "day-ahead reeks moet een geheel aantal dagen beslaan ({stappen_per_dag} prijzen per dag), kreeg {lengte}"
    )]
    OngeldigeDagLengte { lengte: usize, stappen_per_dag: usize },
    #[error("{markt} reeks heeft {lengte} prijzen, verwacht {verwacht} voor {dagen} dagen")]
    LengteMismatch {
        markt: IntradayMarkt,
        lengte: usize,
        verwacht: usize,
        dagen: usize,
    },
}

/// Prijzen voor de drie marktniveaus in EUR/MWh.
///
/// Day-ahead is uurlijks (24 per dag), beide intraday reeksen zijn op
/// kwartierbasis (96 per dag). De lengtes worden gevalideerd op het moment
/// dat de reeks aan een waardering wordt gegeven.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prijsreeks {
    /// Day-ahead prijzen, 24 per dag
    pub day_ahead: Vec<f64>,
    /// Intraday-1 prijzen, 96 per dag
    pub intraday_1: Vec<f64>,
    /// Intraday-2 prijzen, 96 per dag
    pub intraday_2: Vec<f64>,
}

impl Prijsreeks {
    /// Aantal volledige dagen in de day-ahead reeks.
    pub fn dagen(&self) -> usize {
        self.day_ahead.len() / 24
    }
}

/// Blokgemiddelde: verklein een reeks met factor `blok` door telkens `blok`
/// opeenvolgende waarden te middelen. Een onvolledig laatste blok wordt over
/// de resterende waarden gemiddeld.
pub fn blokgemiddelde(reeks: &[f64], blok: usize) -> Vec<f64> {
    assert!(blok > 0, "blokgrootte moet groter zijn dan 0");
    reeks
        .chunks(blok)
        .map(|deel| deel.iter().sum::<f64>() / deel.len() as f64)
        .collect()
}
