//! Energieniveauraster voor de inzetoptimalisatie.
//!
//! Het raster discretiseert het reservoirniveau in gehele veelvouden van één
//! kwantum. Het kwantum is zó gekozen dat zowel één pompstap als één
//! turbinestap van de kleinste tijdsduur op een geheel aantal rasterpunten
//! uitkomt: de GGD van beide energiestappen, bepaald op een vaste precisie.

use serde::{Deserialize, Serialize};
use waterkracht_core::Pompcentrale;

/// Vaste precisienoemer voor de kwantumafleiding.
pub const PRECISIE: i64 = 100_000;

/// Fouttype voor de rasterafleiding.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterFout {
    /// Pomp- of turbinekwantum is nul op de gebruikte precisie
    NulKwantum { pomp: i64, turbine: i64 },
}

impl std::fmt::Display for RasterFout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NulKwantum { pomp, turbine } => {
                write!(
                    f,
                    "rasterkwantum ontaardt: pomp={}, turbine={} (geschaald met {})",
                    pomp, turbine, PRECISIE
                )
            }
        }
    }
}

impl std::error::Error for RasterFout {}

fn ggd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Discretisatie van het energieniveau in rasterindices `0..n_niveaus`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Niveauraster {
    /// Kleinste niveauverandering in MWh
    pub kwantum: f64,
    /// Aantal rasterpunten
    pub n_niveaus: usize,
}

impl Niveauraster {
    /// Leid het raster af uit de centrale en de kleinste tijdstap in uren.
    pub fn afleiden(centrale: &Pompcentrale, min_stap_uur: f64) -> Result<Self, RasterFout> {
        Self::afleiden_met_precisie(centrale, min_stap_uur, PRECISIE)
    }

    /// Als [`Niveauraster::afleiden`], met een expliciete precisienoemer.
    pub fn afleiden_met_precisie(
        centrale: &Pompcentrale,
        min_stap_uur: f64,
        precisie: i64,
    ) -> Result<Self, RasterFout> {
        let pomp_energie =
            centrale.max_pomp_vermogen * min_stap_uur * centrale.pomp_rendement;
        let turbine_energie = centrale.max_turbine_vermogen * min_stap_uur;

        let pomp = (pomp_energie * precisie as f64) as i64;
        let turbine = (turbine_energie * precisie as f64) as i64;
        if pomp == 0 || turbine == 0 {
            return Err(RasterFout::NulKwantum { pomp, turbine });
        }

        let kwantum = ggd(pomp, turbine) as f64 / precisie as f64;
        let n_niveaus = (centrale.max_niveau / kwantum) as usize + 1;
        Ok(Self { kwantum, n_niveaus })
    }

    /// Niveau in MWh naar rasterindex, afgerond op het dichtstbijzijnde punt.
    /// `None` als het niveau buiten het raster valt.
    pub fn naar_index(&self, niveau_mwh: f64) -> Option<usize> {
        let index = (niveau_mwh / self.kwantum).round();
        if index < 0.0 || index as usize >= self.n_niveaus {
            None
        } else {
            Some(index as usize)
        }
    }

    /// Rasterindex terug naar MWh.
    pub fn naar_niveau(&self, index: usize) -> f64 {
        index as f64 * self.kwantum
    }

    /// Niveaustijging in rasterpunten van één pompslot van `duur_uur`.
    pub fn pomp_delta(&self, centrale: &Pompcentrale, duur_uur: f64) -> usize {
        (centrale.max_pomp_vermogen * centrale.pomp_rendement * duur_uur / self.kwantum).round()
            as usize
    }

    /// Niveaudaling in rasterpunten van één turbineslot van `duur_uur`.
    pub fn turbine_delta(&self, centrale: &Pompcentrale, duur_uur: f64) -> usize {
        (centrale.max_turbine_vermogen * duur_uur / self.kwantum).round() as usize
    }
}
