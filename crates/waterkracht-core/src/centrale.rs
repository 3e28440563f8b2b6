//! Pompaccumulatiecentrale: fysiek model en simulatietoestand.
//!
//! De `Pompcentrale` beschrijft de onveranderlijke fysieke eigenschappen van
//! de installatie. De `CentraleToestand` houdt tijdens een waarderingsrun het
//! energieniveau, de laatst uitgevoerde actie en de gerealiseerde schema's bij.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Actie van de centrale in één tijdslot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actie {
    /// Pompen: elektrische energie opnemen en in het reservoir opslaan
    Pompen,
    /// Geen actie
    Stil,
    /// Turbineren: energie uit het reservoir aan het net leveren
    Turbineren,
}

impl Actie {
    /// Compacte codering: pompen = 1, stil = 0, turbineren = -1.
    pub fn als_i8(self) -> i8 {
        match self {
            Self::Pompen => 1,
            Self::Stil => 0,
            Self::Turbineren => -1,
        }
    }

    /// Actie afgeleid van het teken van een verhandelde hoeveelheid
    /// (positief = verkoop aan het net, dus turbineren).
    pub fn van_verkoop_teken(mwh: f64) -> Self {
        if mwh > 0.0 {
            Self::Turbineren
        } else if mwh < 0.0 {
            Self::Pompen
        } else {
            Self::Stil
        }
    }
}

impl Default for Actie {
    fn default() -> Self {
        Self::Stil
    }
}

impl std::fmt::Display for Actie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pompen => write!(f, "pompen"),
            Self::Stil => write!(f, "stil"),
            Self::Turbineren => write!(f, "turbineren"),
        }
    }
}

/// Fouttype voor centraleparameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CentraleFout {
    #[error("Vermogen moet groter zijn dan 0, kreeg {waarde} MW")]
    OngeldigVermogen { waarde: f64 },
    #[error("Reservoircapaciteit moet groter zijn dan 0, kreeg {waarde} MWh")]
    OngeldigeCapaciteit { waarde: f64 },
    #[error("Pomprendement moet in (0, 1] liggen, kreeg {waarde}")]
    OngeldigRendement { waarde: f64 },
}

/// Vaste fysieke eigenschappen van een pompaccumulatiecentrale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pompcentrale {
    /// Maximaal turbinevermogen in MW (elektrisch)
    pub max_turbine_vermogen: f64,
    /// Maximaal pompvermogen in MW (elektrisch)
    pub max_pomp_vermogen: f64,
    /// Reservoircapaciteit in MWh elektrisch (na rendementsverliezen)
    pub max_niveau: f64,
    /// Rondgaand pomprendement, in (0, 1]
    pub pomp_rendement: f64,
}

impl Pompcentrale {
    /// Maak een centrale met gevalideerde parameters.
    pub fn nieuw(
        max_turbine_vermogen: f64,
        max_pomp_vermogen: f64,
        max_niveau: f64,
        pomp_rendement: f64,
    ) -> Result<Self, CentraleFout> {
        if max_turbine_vermogen <= 0.0 {
            return Err(CentraleFout::OngeldigVermogen {
                waarde: max_turbine_vermogen,
            });
        }
        if max_pomp_vermogen <= 0.0 {
            return Err(CentraleFout::OngeldigVermogen {
                waarde: max_pomp_vermogen,
            });
        }
        if max_niveau <= 0.0 {
            return Err(CentraleFout::OngeldigeCapaciteit { waarde: max_niveau });
        }
        if pomp_rendement <= 0.0 || pomp_rendement > 1.0 {
            return Err(CentraleFout::OngeldigRendement {
                waarde: pomp_rendement,
            });
        }
        Ok(Self {
            max_turbine_vermogen,
            max_pomp_vermogen,
            max_niveau,
            pomp_rendement,
        })
    }

    /// Testcentrale: 25 MW turbine, 25 MW pomp, 100 MWh, verliesvrij.
    pub fn testcentrale() -> Self {
        Self {
            max_turbine_vermogen: 25.0,
            max_pomp_vermogen: 25.0,
            max_niveau: 100.0,
            pomp_rendement: 1.0,
        }
    }

    /// PSW Limmern (CH): 4 × 250 MW, 38 670 MWh, rendement 40/47.
    pub fn limmern() -> Self {
        Self {
            max_turbine_vermogen: 1000.0,
            max_pomp_vermogen: 1000.0,
            max_niveau: 38_670.0,
            pomp_rendement: 0.85,
        }
    }

    /// Hongrin (CH): 480 MW, 125 121 MWh, rendement 42/56.
    pub fn hongrin() -> Self {
        Self {
            max_turbine_vermogen: 480.0,
            max_pomp_vermogen: 480.0,
            max_niveau: 125_121.0,
            pomp_rendement: 0.75,
        }
    }

    /// PSW Goldisthal (DE): 1060 MW, 10 698 MWh.
    pub fn goldisthal() -> Self {
        Self {
            max_turbine_vermogen: 1060.0,
            max_pomp_vermogen: 1060.0,
            max_niveau: 10_698.0,
            pomp_rendement: 0.8,
        }
    }
}

/// Veranderlijke toestand van de centrale tijdens een waarderingsrun.
///
/// Invariant: `energie_niveau` is gelijk aan minus de som van
/// `uitgevoerd_schema` (verkopen onttrekken energie, aankopen voegen toe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentraleToestand {
    /// De bijbehorende centrale
    pub centrale: Pompcentrale,
    /// Huidig energieniveau in MWh
    pub energie_niveau: f64,
    /// Laatst uitgevoerde actie
    pub laatste_actie: Actie,
    /// Uitgevoerde energie per slot in MWh, positief = levering aan het net.
    /// Aankopen staan er netto in: het reservoir slaat `pomp_rendement`
    /// van de gekochte energie op.
    pub uitgevoerd_schema: Vec<f64>,
    /// Gerealiseerde cashflow per slot in EUR, geboekt op bruto hoeveelheden
    pub cashflow_schema: Vec<f64>,
    /// Gerealiseerde prijzen per slot in EUR/MWh
    pub prijzen: Vec<f64>,
}

impl CentraleToestand {
    /// Lege toestand: leeg reservoir, geen actie, lege schema's.
    pub fn nieuw(centrale: Pompcentrale) -> Self {
        Self {
            centrale,
            energie_niveau: 0.0,
            laatste_actie: Actie::Stil,
            uitgevoerd_schema: Vec::new(),
            cashflow_schema: Vec::new(),
            prijzen: Vec::new(),
        }
    }

    /// Wis de toestand voor een nieuwe run. Alle bijgehouden reeksen,
    /// inclusief het cashflow-schema, worden leeggemaakt.
    pub fn wis(&mut self) {
        self.energie_niveau = 0.0;
        self.laatste_actie = Actie::Stil;
        self.uitgevoerd_schema.clear();
        self.cashflow_schema.clear();
        self.prijzen.clear();
    }

    /// Reserveer ruimte voor het verwachte totale aantal sloten van een run.
    pub fn reserveer(&mut self, sloten: usize) {
        self.uitgevoerd_schema.reserve(sloten);
        self.cashflow_schema.reserve(sloten);
        self.prijzen.reserve(sloten);
    }

    /// Voer het uiteindelijke dagschema uit.
    ///
    /// `schema` is de verhandelde hoeveelheid per slot in MWh
    /// (positief = verkoop). De cashflow wordt op de bruto hoeveelheden
    /// geboekt; in het reservoir komt van elke aankoop slechts het
    /// pomprendement terecht. De laatste actie volgt uit het teken van het
    /// laatste slot.
    pub fn voer_schema_uit(&mut self, prijzen: &[f64], dag: usize, schema: &[f64]) {
        debug_assert_eq!(
            self.prijzen.len(),
            dag * prijzen.len(),
            "dagindex past niet bij de al gerealiseerde sloten"
        );

        for (prijs, hoeveelheid) in prijzen.iter().zip_eq(schema) {
            self.cashflow_schema.push(prijs * hoeveelheid);
        }
        self.prijzen.extend_from_slice(prijzen);

        let mut dag_som = 0.0;
        for &hoeveelheid in schema {
            let netto = if hoeveelheid < 0.0 {
                hoeveelheid * self.centrale.pomp_rendement
            } else {
                hoeveelheid
            };
            self.uitgevoerd_schema.push(netto);
            dag_som += netto;
        }

        self.laatste_actie = Actie::van_verkoop_teken(schema.last().copied().unwrap_or(0.0));
        self.energie_niveau -= dag_som;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nieuw_valideert_parameters() {
        assert!(Pompcentrale::nieuw(25.0, 25.0, 100.0, 1.0).is_ok());
        assert!(matches!(
            Pompcentrale::nieuw(0.0, 25.0, 100.0, 1.0),
            Err(CentraleFout::OngeldigVermogen { .. })
        ));
        assert!(matches!(
            Pompcentrale::nieuw(25.0, 25.0, -1.0, 1.0),
            Err(CentraleFout::OngeldigeCapaciteit { .. })
        ));
        assert!(matches!(
            Pompcentrale::nieuw(25.0, 25.0, 100.0, 1.1),
            Err(CentraleFout::OngeldigRendement { .. })
        ));
        assert!(matches!(
            Pompcentrale::nieuw(25.0, 25.0, 100.0, 0.0),
            Err(CentraleFout::OngeldigRendement { .. })
        ));
    }

    #[test]
    fn test_actie_van_verkoop_teken() {
        assert_eq!(Actie::van_verkoop_teken(6.25), Actie::Turbineren);
        assert_eq!(Actie::van_verkoop_teken(-6.25), Actie::Pompen);
        assert_eq!(Actie::van_verkoop_teken(0.0), Actie::Stil);
    }

    #[test]
    fn test_voer_schema_uit_boekt_bruto_en_slaat_netto_op() {
        let centrale = Pompcentrale::nieuw(25.0, 25.0, 100.0, 0.8).unwrap();
        let mut toestand = CentraleToestand::nieuw(centrale);

        let prijzen = [50.0, 40.0, 60.0];
        // aankoop 10 MWh, stil, verkoop 5 MWh
        let schema = [-10.0, 0.0, 5.0];
        toestand.voer_schema_uit(&prijzen, 0, &schema);

        // Cashflow op bruto hoeveelheden
        assert!((toestand.cashflow_schema[0] - (-500.0)).abs() < 1e-9);
        assert!((toestand.cashflow_schema[2] - 300.0).abs() < 1e-9);
        // Opgeslagen energie na rendement
        assert!((toestand.uitgevoerd_schema[0] - (-8.0)).abs() < 1e-9);
        assert!((toestand.uitgevoerd_schema[2] - 5.0).abs() < 1e-9);
        // Niveau = -(som uitgevoerd): 8 opgeslagen, 5 geleverd
        assert!((toestand.energie_niveau - 3.0).abs() < 1e-9);
        assert_eq!(toestand.laatste_actie, Actie::Turbineren);
    }

    #[test]
    fn test_laatste_actie_volgt_laatste_slot() {
        let mut toestand = CentraleToestand::nieuw(Pompcentrale::testcentrale());
        toestand.voer_schema_uit(&[10.0, 10.0], 0, &[6.25, 0.0]);
        assert_eq!(toestand.laatste_actie, Actie::Stil);
        toestand.voer_schema_uit(&[10.0, 10.0], 1, &[0.0, -6.25]);
        assert_eq!(toestand.laatste_actie, Actie::Pompen);
    }

    #[test]
    fn test_wis_maakt_alles_leeg() {
        let mut toestand = CentraleToestand::nieuw(Pompcentrale::testcentrale());
        toestand.voer_schema_uit(&[50.0], 0, &[6.25]);
        assert!(!toestand.cashflow_schema.is_empty());

        toestand.wis();
        assert_eq!(toestand.energie_niveau, 0.0);
        assert_eq!(toestand.laatste_actie, Actie::Stil);
        assert!(toestand.uitgevoerd_schema.is_empty());
        assert!(toestand.cashflow_schema.is_empty());
        assert!(toestand.prijzen.is_empty());
    }

    #[test]
    fn test_energiebehoud_over_meerdere_dagen() {
        let mut toestand = CentraleToestand::nieuw(Pompcentrale::testcentrale());
        toestand.voer_schema_uit(&[20.0, 30.0], 0, &[-25.0, 0.0]);
        toestand.voer_schema_uit(&[80.0, 70.0], 1, &[25.0, 0.0]);

        let som: f64 = toestand.uitgevoerd_schema.iter().sum();
        assert!((som + toestand.energie_niveau).abs() < 1e-9);
    }

    #[test]
    fn test_toestand_serialiseert() {
        let toestand = CentraleToestand::nieuw(Pompcentrale::limmern());
        let json = serde_json::to_string(&toestand).unwrap();
        assert!(json.contains("38670"));
        let terug: CentraleToestand = serde_json::from_str(&json).unwrap();
        assert_eq!(terug, toestand);
    }
}
