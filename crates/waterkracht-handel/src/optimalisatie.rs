//! Inzetoptimalisatie van één prijsvenster met dynamische programmering.
//!
//! De toestandsruimte is (tijdslot, rasterindex). De waardefunctie wordt
//! achterwaarts opgebouwd met het eindniveau als randvoorwaarde: alleen de
//! eindindex start op 0, alle andere niveaus op min oneindig. Daardoor is de
//! waarde van een venster direct vergelijkbaar met een gesloten bedrijfscyclus.
//! De beslissing per cel is de actie die in dat slot vanaf dat niveau wordt
//! genomen; de beslissing van het volgende slot bepaalt welke overgangen de
//! pomp-turbine-wisselregel toestaat.

use serde::{Deserialize, Serialize};
use waterkracht_core::{Actie, Pompcentrale};

use crate::raster::{Niveauraster, RasterFout};

/// Fouttype voor de planoptimalisatie.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimalisatieFout {
    /// Raster kon niet worden afgeleid
    Raster(RasterFout),
    /// Beginniveau valt buiten het raster
    OngeldigBeginniveau { niveau: f64, max: f64 },
    /// Eindniveau valt buiten het raster
    OngeldigEindniveau { niveau: f64, max: f64 },
    /// Eindniveau is onbereikbaar vanaf het beginniveau
    OnbereikbaarEindniveau { begin: f64, eind: f64 },
    /// Prijzen en stapduren hebben verschillende lengtes
    StapduurMismatch { prijzen: usize, stapduren: usize },
    /// Interne invariant geschonden tijdens de reconstructie
    InvariantSchending { slot: usize, details: String },
}

impl std::fmt::Display for OptimalisatieFout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raster(fout) => write!(f, "{}", fout),
            Self::OngeldigBeginniveau { niveau, max } => {
                write!(f, "beginniveau {} MWh valt buiten [0, {}]", niveau, max)
            }
            Self::OngeldigEindniveau { niveau, max } => {
                write!(f, "eindniveau {} MWh valt buiten [0, {}]", niveau, max)
            }
            Self::OnbereikbaarEindniveau { begin, eind } => {
                write!(
                    f,
                    "eindniveau {} MWh is onbereikbaar vanaf {} MWh binnen dit venster",
                    eind, begin
                )
            }
            Self::StapduurMismatch { prijzen, stapduren } => {
                write!(
                    f,
                    "{} prijzen maar {} stapduren",
                    prijzen, stapduren
                )
            }
            Self::InvariantSchending { slot, details } => {
                write!(f, "invariant geschonden in slot {}: {}", slot, details)
            }
        }
    }
}

impl std::error::Error for OptimalisatieFout {}

impl From<RasterFout> for OptimalisatieFout {
    fn from(fout: RasterFout) -> Self {
        Self::Raster(fout)
    }
}

/// Resultaat van één planoptimalisatie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResultaat {
    /// Verkochte energie per slot in MWh (turbineren)
    pub verkoop_mwh: Vec<f64>,
    /// Gekochte energie per slot in MWh (pompen)
    pub aankoop_mwh: Vec<f64>,
    /// Energieniveau in MWh na afloop van elk slot
    pub niveau_mwh: Vec<f64>,
    /// Optimale totale cashflow in EUR
    pub totale_cashflow: f64,
}

impl PlanResultaat {
    /// Netto verkoop per slot: verkoop minus aankoop, positief = levering.
    pub fn netto_verkoop(&self) -> Vec<f64> {
        self.verkoop_mwh
            .iter()
            .zip(&self.aankoop_mwh)
            .map(|(verkoop, aankoop)| verkoop - aankoop)
            .collect()
    }
}

/// Optimalisatie van één inzetplan voor één prijsvenster.
///
/// Dit contract gaat over een enkel venster; het rollende proces over de
/// marktniveaus leeft in [`crate::rollend`].
pub trait PlanOptimalisatie: Send + Sync {
    /// Bereken het cashflow-maximale plan voor de gegeven prijzen.
    ///
    /// `stapduren` geeft de duur van elk slot in uren, zodat de resolutie
    /// per slot kan verschillen. Niveaus zijn in MWh elektrisch. In elk slot
    /// draait de centrale op vol vermogen of staat ze stil; pompen en
    /// turbineren mogen elkaar niet zonder stil slot opvolgen, ook niet over
    /// de venstergrens heen (`vorige_actie`).
    fn optimaal_plan(
        &self,
        prijzen: &[f64],
        stapduren: &[f64],
        begin_niveau: f64,
        vorige_actie: Actie,
        eind_niveau: f64,
    ) -> Result<PlanResultaat, OptimalisatieFout>;
}

const STIL: i8 = 0;
const POMP: i8 = 1;
const TURBINE: i8 = -1;

/// Planoptimalisatie met dynamische programmering over het niveauraster.
#[derive(Debug, Clone)]
pub struct DynamischeProgrammering {
    centrale: Pompcentrale,
    raster: Niveauraster,
}

impl DynamischeProgrammering {
    /// Standaard kleinste tijdstap voor de rasterafleiding, in uren.
    pub const MIN_STAP_UUR: f64 = 0.25;

    /// Maak een optimalisatie met de standaard kleinste tijdstap (kwartier).
    pub fn nieuw(centrale: Pompcentrale) -> Result<Self, OptimalisatieFout> {
        Self::met_min_stap(centrale, Self::MIN_STAP_UUR)
    }

    /// Maak een optimalisatie met een expliciete kleinste tijdstap.
    pub fn met_min_stap(
        centrale: Pompcentrale,
        min_stap_uur: f64,
    ) -> Result<Self, OptimalisatieFout> {
        let raster = Niveauraster::afleiden(&centrale, min_stap_uur)?;
        Ok(Self { centrale, raster })
    }

    /// Het afgeleide niveauraster.
    pub fn raster(&self) -> &Niveauraster {
        &self.raster
    }

    /// Achterwaartse inductie: waardevector op slot 0 en de beslissingsmatrix.
    ///
    /// De beslissingsmatrix heeft `t + 1` rijen van `n_niveaus` cellen; rij
    /// `i` bevat de actie die in slot `i` vanaf elk niveau wordt genomen.
    /// Rij `t` blijft stil, zodat het laatste slot geen wisselrestrictie
    /// ondervindt. De waardevectoren worden als ping-pong-paar hergebruikt.
    fn bouw_beslissingen(
        &self,
        prijzen: &[f64],
        stapduren: &[f64],
        vorige_actie: Actie,
        eind_index: usize,
    ) -> (Vec<f64>, Vec<i8>) {
        let n = self.raster.n_niveaus;
        let t = prijzen.len();

        let mut waarde_volgend = vec![f64::NEG_INFINITY; n];
        waarde_volgend[eind_index] = 0.0;
        let mut waarde_huidig = vec![f64::NEG_INFINITY; n];
        let mut beslissingen = vec![STIL; (t + 1) * n];

        for slot in (0..t).rev() {
            let duur = stapduren[slot];
            let prijs = prijzen[slot];
            let pomp_delta = self.raster.pomp_delta(&self.centrale, duur);
            let turbine_delta = self.raster.turbine_delta(&self.centrale, duur);
            let pomp_kas = -self.centrale.max_pomp_vermogen * duur * prijs;
            let turbine_kas = self.centrale.max_turbine_vermogen * duur * prijs;

            let (eerdere_rijen, latere_rijen) = beslissingen.split_at_mut((slot + 1) * n);
            let huidige_rij = &mut eerdere_rijen[slot * n..];
            let volgende_rij = &latere_rijen[..n];

            let mag_pompen = slot != 0 || vorige_actie != Actie::Turbineren;
            let mag_turbineren = slot != 0 || vorige_actie != Actie::Pompen;

            for niveau in 0..n {
                // Kandidaten in vaste volgorde: stil, pompen, turbineren.
                // Alleen een strikt betere kandidaat verdringt de vorige,
                // zodat gelijkspel deterministisch wordt beslecht.
                let mut beste = waarde_volgend[niveau];
                let mut actie = STIL;

                let na_pompen = niveau + pomp_delta;
                if mag_pompen && na_pompen < n && volgende_rij[na_pompen] != TURBINE {
                    let kandidaat = waarde_volgend[na_pompen] + pomp_kas;
                    if kandidaat > beste {
                        beste = kandidaat;
                        actie = POMP;
                    }
                }

                if mag_turbineren && niveau >= turbine_delta {
                    let na_turbineren = niveau - turbine_delta;
                    if volgende_rij[na_turbineren] != POMP {
                        let kandidaat = waarde_volgend[na_turbineren] + turbine_kas;
                        if kandidaat > beste {
                            beste = kandidaat;
                            actie = TURBINE;
                        }
                    }
                }

                waarde_huidig[niveau] = beste;
                huidige_rij[niveau] = actie;
            }

            std::mem::swap(&mut waarde_volgend, &mut waarde_huidig);
        }

        (waarde_volgend, beslissingen)
    }
}

impl PlanOptimalisatie for DynamischeProgrammering {
    fn optimaal_plan(
        &self,
        prijzen: &[f64],
        stapduren: &[f64],
        begin_niveau: f64,
        vorige_actie: Actie,
        eind_niveau: f64,
    ) -> Result<PlanResultaat, OptimalisatieFout> {
        if prijzen.len() != stapduren.len() {
            return Err(OptimalisatieFout::StapduurMismatch {
                prijzen: prijzen.len(),
                stapduren: stapduren.len(),
            });
        }
        let begin_index = self.raster.naar_index(begin_niveau).ok_or(
            OptimalisatieFout::OngeldigBeginniveau {
                niveau: begin_niveau,
                max: self.centrale.max_niveau,
            },
        )?;
        let eind_index = self.raster.naar_index(eind_niveau).ok_or(
            OptimalisatieFout::OngeldigEindniveau {
                niveau: eind_niveau,
                max: self.centrale.max_niveau,
            },
        )?;

        let (waarde, beslissingen) =
            self.bouw_beslissingen(prijzen, stapduren, vorige_actie, eind_index);
        let totale_cashflow = waarde[begin_index];
        if !totale_cashflow.is_finite() {
            return Err(OptimalisatieFout::OnbereikbaarEindniveau {
                begin: begin_niveau,
                eind: eind_niveau,
            });
        }

        // Voorwaartse reconstructie langs de beslissingsmatrix.
        let t = prijzen.len();
        let n = self.raster.n_niveaus;
        let mut verkoop_mwh = vec![0.0; t];
        let mut aankoop_mwh = vec![0.0; t];
        let mut niveau_mwh = Vec::with_capacity(t);
        let mut index = begin_index;
        let mut vorige = vorige_actie.als_i8();

        for slot in 0..t {
            let actie = beslissingen[slot * n + index];
            if (vorige == POMP && actie == TURBINE) || (vorige == TURBINE && actie == POMP) {
                return Err(OptimalisatieFout::InvariantSchending {
                    slot,
                    details: "pompen en turbineren in aangrenzende sloten".to_string(),
                });
            }
            match actie {
                POMP => {
                    aankoop_mwh[slot] = self.centrale.max_pomp_vermogen * stapduren[slot];
                    index += self.raster.pomp_delta(&self.centrale, stapduren[slot]);
                }
                TURBINE => {
                    verkoop_mwh[slot] = self.centrale.max_turbine_vermogen * stapduren[slot];
                    let delta = self.raster.turbine_delta(&self.centrale, stapduren[slot]);
                    index = index.checked_sub(delta).ok_or_else(|| {
                        OptimalisatieFout::InvariantSchending {
                            slot,
                            details: "niveauindex onder nul".to_string(),
                        }
                    })?;
                }
                _ => {}
            }
            if index >= n {
                return Err(OptimalisatieFout::InvariantSchending {
                    slot,
                    details: format!("niveauindex {} buiten raster van {}", index, n),
                });
            }
            niveau_mwh.push(self.raster.naar_niveau(index));
            vorige = actie;
        }

        if index != eind_index {
            return Err(OptimalisatieFout::InvariantSchending {
                slot: t,
                details: format!(
                    "reconstructie eindigt op index {} in plaats van {}",
                    index, eind_index
                ),
            });
        }

        Ok(PlanResultaat {
            verkoop_mwh,
            aankoop_mwh,
            niveau_mwh,
            totale_cashflow,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterkracht_core::Markt;

    fn optimalisatie() -> DynamischeProgrammering {
        DynamischeProgrammering::nieuw(Pompcentrale::testcentrale()).unwrap()
    }

    fn uurduren(t: usize) -> Vec<f64> {
        vec![1.0; t]
    }

    #[test]
    fn test_vlakke_prijzen_geven_stilstand() {
        let dp = optimalisatie();
        let prijzen = vec![50.0; 24];
        let plan = dp
            .optimaal_plan(&prijzen, &uurduren(24), 50.0, Actie::Stil, 50.0)
            .unwrap();

        assert!((plan.totale_cashflow).abs() < 1e-9);
        assert!(plan.verkoop_mwh.iter().all(|&v| v == 0.0));
        assert!(plan.aankoop_mwh.iter().all(|&a| a == 0.0));
        assert!(plan.niveau_mwh.iter().all(|&lvl| (lvl - 50.0).abs() < 1e-9));
    }

    #[test]
    fn test_enkele_slinger() {
        // Duur uur 3, goedkoop uur 15: turbineren op 3, terugpompen op 15.
        let dp = optimalisatie();
        let mut prijzen = vec![10.0; 24];
        prijzen[3] = 100.0;
        prijzen[15] = 1.0;
        let plan = dp
            .optimaal_plan(&prijzen, &uurduren(24), 50.0, Actie::Stil, 50.0)
            .unwrap();

        assert!((plan.totale_cashflow - 2475.0).abs() < 1e-9);
        // Zelfconsistentie: cashflow volgt uit het gereconstrueerde plan
        let netto = plan.netto_verkoop();
        let herberekend: f64 = Markt::cashflow(&prijzen, &netto).iter().sum();
        assert!((herberekend - plan.totale_cashflow).abs() < 1e-9);
        // Venster eindigt op het gevraagde niveau
        assert!((plan.niveau_mwh.last().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_wisselverbod_binnen_venster() {
        // Greedy zou uur 5 pompen en uur 6 turbineren; dat is verboden.
        let dp = optimalisatie();
        let mut prijzen = vec![50.0; 24];
        prijzen[5] = 1.0;
        prijzen[6] = 100.0;
        let plan = dp
            .optimaal_plan(&prijzen, &uurduren(24), 50.0, Actie::Stil, 50.0)
            .unwrap();

        let netto = plan.netto_verkoop();
        for paar in netto.windows(2) {
            assert!(
                !(paar[0] < 0.0 && paar[1] > 0.0),
                "pompen direct gevolgd door turbineren"
            );
            assert!(
                !(paar[0] > 0.0 && paar[1] < 0.0),
                "turbineren direct gevolgd door pompen"
            );
        }
        // Beste toegestane alternatief: turbineren op uur 6, pomp op een
        // 50-EUR uur: 2500 - 1250.
        assert!((plan.totale_cashflow - 1250.0).abs() < 1e-9);
    }

    #[test]
    fn test_wisselverbod_over_venstergrens() {
        // Na turbineren mag het venster niet met pompen beginnen.
        let dp = optimalisatie();
        let mut prijzen = vec![50.0; 4];
        prijzen[0] = 1.0;

        let vrij = dp
            .optimaal_plan(&prijzen, &uurduren(4), 50.0, Actie::Stil, 75.0)
            .unwrap();
        let netto_vrij = vrij.netto_verkoop();
        assert!(netto_vrij[0] < 0.0, "zonder restrictie pompt slot 0");

        let begrensd = dp
            .optimaal_plan(&prijzen, &uurduren(4), 50.0, Actie::Turbineren, 75.0)
            .unwrap();
        let netto_begrensd = begrensd.netto_verkoop();
        assert_eq!(netto_begrensd[0], 0.0);
        assert!(begrensd.totale_cashflow <= vrij.totale_cashflow);
    }

    #[test]
    fn test_heterogene_stapduren() {
        // Eerste vier sloten kwartier, daarna twee uursloten.
        let dp = optimalisatie();
        let prijzen = vec![1.0, 1.0, 1.0, 1.0, 100.0, 100.0];
        let stapduren = vec![0.25, 0.25, 0.25, 0.25, 1.0, 1.0];
        let plan = dp
            .optimaal_plan(&prijzen, &stapduren, 0.0, Actie::Stil, 0.0)
            .unwrap();

        // Vier kwartier pompen (25 MWh erin) en één uur turbineren eruit
        let netto = plan.netto_verkoop();
        assert!((netto[0..4].iter().sum::<f64>() + 25.0).abs() < 1e-9);
        assert!((netto[4..6].iter().sum::<f64>() - 25.0).abs() < 1e-9);
        assert!((plan.totale_cashflow - (25.0 * 100.0 - 25.0 * 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_onbereikbaar_eindniveau() {
        let dp = optimalisatie();
        let prijzen = vec![50.0; 2];
        // In twee uur kan maximaal 50 MWh worden geladen
        let resultaat = dp.optimaal_plan(&prijzen, &uurduren(2), 0.0, Actie::Stil, 100.0);
        assert!(matches!(
            resultaat,
            Err(OptimalisatieFout::OnbereikbaarEindniveau { .. })
        ));
    }

    #[test]
    fn test_niveau_buiten_raster() {
        let dp = optimalisatie();
        let prijzen = vec![50.0; 2];
        assert!(matches!(
            dp.optimaal_plan(&prijzen, &uurduren(2), 150.0, Actie::Stil, 0.0),
            Err(OptimalisatieFout::OngeldigBeginniveau { .. })
        ));
        assert!(matches!(
            dp.optimaal_plan(&prijzen, &uurduren(2), 0.0, Actie::Stil, 150.0),
            Err(OptimalisatieFout::OngeldigEindniveau { .. })
        ));
    }

    #[test]
    fn test_stapduur_mismatch() {
        let dp = optimalisatie();
        assert!(matches!(
            dp.optimaal_plan(&[50.0, 50.0], &[1.0], 0.0, Actie::Stil, 0.0),
            Err(OptimalisatieFout::StapduurMismatch { .. })
        ));
    }

    #[test]
    fn test_rendement_begrensd_niveaupad() {
        // Met rendement 0.8 levert één pompuur 20 MWh op in het reservoir,
        // maar kost het 25 MWh aan inkoop.
        let centrale = Pompcentrale::nieuw(25.0, 25.0, 100.0, 0.8).unwrap();
        let dp = DynamischeProgrammering::nieuw(centrale).unwrap();
        let prijzen = vec![1.0, 50.0];
        let plan = dp
            .optimaal_plan(&prijzen, &uurduren(2), 0.0, Actie::Stil, 20.0)
            .unwrap();

        assert!((plan.aankoop_mwh[0] - 25.0).abs() < 1e-9);
        assert!((plan.niveau_mwh[0] - 20.0).abs() < 1e-9);
        assert!((plan.totale_cashflow + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_determinisme() {
        let dp = optimalisatie();
        let prijzen: Vec<f64> = (0..48).map(|i| 50.0 + ((i * 17) % 23) as f64).collect();
        let eerste = dp
            .optimaal_plan(&prijzen, &uurduren(48), 25.0, Actie::Stil, 25.0)
            .unwrap();
        let tweede = dp
            .optimaal_plan(&prijzen, &uurduren(48), 25.0, Actie::Stil, 25.0)
            .unwrap();
        assert_eq!(eerste, tweede);
    }
}
