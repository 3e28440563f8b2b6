//! Marktgrootboek voor de drie opeenvolgende marktniveaus.
//!
//! Cashflows worden gesplitst in drie potten: de day-ahead basis, de winst
//! van het doorrollen naar intraday-1 en de winst van het doorrollen naar
//! intraday-2. Per dag wordt de cashflow per slot bewaard.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Intraday marktniveau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntradayMarkt {
    Id1,
    Id2,
}

impl std::fmt::Display for IntradayMarkt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id1 => write!(f, "intraday-1"),
            Self::Id2 => write!(f, "intraday-2"),
        }
    }
}

/// Grootboek van gerealiseerde cashflows.
///
/// Invariant: elke som is gelijk aan de som over alle dagen van de
/// bijbehorende historievectoren.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Markt {
    /// Som van de day-ahead basistransacties in EUR
    pub som_da_basis: f64,
    /// Som van de intraday-1 hertransacties boven day-ahead in EUR
    pub som_id1_over_da: f64,
    /// Som van de intraday-2 hertransacties boven intraday-1 in EUR
    pub som_id2_over_id1: f64,
    /// Day-ahead cashflow per dag, per slot
    pub historie_da: HashMap<usize, Vec<f64>>,
    /// Intraday-1 rolcashflow per dag, per slot
    pub historie_id1: HashMap<usize, Vec<f64>>,
    /// Intraday-2 rolcashflow per dag, per slot
    pub historie_id2: HashMap<usize, Vec<f64>>,
}

impl Markt {
    /// Leeg grootboek.
    pub fn nieuw() -> Self {
        Self::default()
    }

    /// Cashflow per slot: prijs maal verkochte hoeveelheid.
    ///
    /// `verkoop` is de verhandelde hoeveelheid per slot in MWh, negatief
    /// wanneer elektriciteit wordt gekocht.
    pub fn cashflow(prijzen: &[f64], verkoop: &[f64]) -> Vec<f64> {
        prijzen
            .iter()
            .zip_eq(verkoop)
            .map(|(prijs, hoeveelheid)| prijs * hoeveelheid)
            .collect()
    }

    /// Boek de day-ahead transacties van één dag in de basispot.
    pub fn transacties_da(&mut self, prijzen: &[f64], verkoop: &[f64], dag: usize) -> Vec<f64> {
        let cashflow = Self::cashflow(prijzen, verkoop);
        self.som_da_basis += cashflow.iter().sum::<f64>();
        self.historie_da.insert(dag, cashflow.clone());
        cashflow
    }

    /// Boek de roltransacties van één dag op het gegeven intraday-niveau.
    pub fn transacties_id(
        &mut self,
        prijzen: &[f64],
        verkoop: &[f64],
        dag: usize,
        markt: IntradayMarkt,
    ) -> Vec<f64> {
        let cashflow = Self::cashflow(prijzen, verkoop);
        let som = cashflow.iter().sum::<f64>();
        match markt {
            IntradayMarkt::Id1 => {
                self.som_id1_over_da += som;
                self.historie_id1.insert(dag, cashflow.clone());
            }
            IntradayMarkt::Id2 => {
                self.som_id2_over_id1 += som;
                self.historie_id2.insert(dag, cashflow.clone());
            }
        }
        cashflow
    }

    /// Totale (extrinsieke) waarde: basis plus beide rolwinsten.
    pub fn totale_waarde(&self) -> f64 {
        self.som_da_basis + self.som_id1_over_da + self.som_id2_over_id1
    }
}
