//! Eendaagse rollende waardering.
//!
//! Variant die elke dag afzonderlijk waardeert: begin- en eindniveau liggen
//! op een half reservoir en er is geen doorkoppeling tussen de dagen. Per dag
//! wordt over drie opeenvolgende marktniveaus gerold met dezelfde regel als
//! bij de meerdaagse waardering: een ruil wordt alleen aangenomen als de
//! delta-cashflow op de nieuwe prijzen strikt positief is.

use itertools::izip;
use serde::{Deserialize, Serialize};
use waterkracht_core::{Actie, Markt, Pompcentrale};

use crate::optimalisatie::PlanOptimalisatie;
use crate::rollend::WaarderingFout;

/// Activiteit van één dag op één marktniveau.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagActiviteit {
    /// Netto levering per slot in MWh, positief = verkoop
    pub uitwisseling: Vec<f64>,
    /// Energieniveau in MWh na elk slot
    pub niveau: Vec<f64>,
    /// Cashflow per slot in EUR
    pub cashflow: Vec<f64>,
    /// Winst geboekt door naar dit marktniveau te rollen, in EUR
    pub rolwinst: f64,
}

/// Resultaat van een eendaagse waardering over drie marktniveaus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EendaagsResultaat {
    /// Optimale activiteit per dag op marktniveau 1
    pub markt_1: Vec<DagActiviteit>,
    /// Optimale activiteit per dag op marktniveau 2
    pub markt_2: Vec<DagActiviteit>,
    /// Optimale activiteit per dag op marktniveau 3
    pub markt_3: Vec<DagActiviteit>,
    /// Positie per dag na de rolbeslissing van niveau 1 naar 2
    pub na_markt_2: Vec<DagActiviteit>,
    /// Positie per dag na de rolbeslissing naar niveau 3
    pub na_markt_3: Vec<DagActiviteit>,
}

impl EendaagsResultaat {
    /// Som van alle aangenomen rolwinsten in EUR.
    pub fn totale_rolwinst(&self) -> f64 {
        self.na_markt_2
            .iter()
            .chain(&self.na_markt_3)
            .map(|dag| dag.rolwinst)
            .sum()
    }
}

/// Eendaagse rollende waardering van één centrale.
pub struct EendaagsWaardering {
    centrale: Pompcentrale,
    optimalisatie: Box<dyn PlanOptimalisatie>,
    /// Duur van één slot in uren
    stap_uur: f64,
}

impl EendaagsWaardering {
    /// Maak een eendaagse waardering op kwartierbasis.
    pub fn nieuw(centrale: Pompcentrale, optimalisatie: Box<dyn PlanOptimalisatie>) -> Self {
        Self {
            centrale,
            optimalisatie,
            stap_uur: 0.25,
        }
    }

    /// Bereken per dag de optimale activiteit voor één marktniveau.
    ///
    /// Elke dag start en eindigt op een half reservoir, zonder restrictie
    /// uit de vorige dag.
    pub fn marktactiviteit(
        &self,
        dagprijzen: &[Vec<f64>],
    ) -> Result<Vec<DagActiviteit>, WaarderingFout> {
        let half_niveau = self.centrale.max_niveau / 2.0;
        dagprijzen
            .iter()
            .map(|prijzen| {
                let duren = vec![self.stap_uur; prijzen.len()];
                let plan = self.optimalisatie.optimaal_plan(
                    prijzen,
                    &duren,
                    half_niveau,
                    Actie::Stil,
                    half_niveau,
                )?;
                let uitwisseling = plan.netto_verkoop();
                let cashflow = Markt::cashflow(prijzen, &uitwisseling);
                Ok(DagActiviteit {
                    uitwisseling,
                    niveau: plan.niveau_mwh,
                    cashflow,
                    rolwinst: 0.0,
                })
            })
            .collect()
    }

    /// Rol per dag van een eerdere positie naar een nieuwer marktniveau.
    fn rol(
        vorige: &[DagActiviteit],
        nieuwe: &[DagActiviteit],
        prijzen: &[Vec<f64>],
    ) -> Vec<DagActiviteit> {
        izip!(vorige, nieuwe, prijzen)
            .map(|(oud, nieuw, dagprijs)| {
                let winst: f64 = izip!(&nieuw.uitwisseling, &oud.uitwisseling, dagprijs)
                    .map(|(na, voor, prijs)| prijs * (na - voor))
                    .sum();
                if winst > 0.0 {
                    DagActiviteit {
                        uitwisseling: nieuw.uitwisseling.clone(),
                        niveau: nieuw.niveau.clone(),
                        cashflow: nieuw.cashflow.clone(),
                        rolwinst: winst,
                    }
                } else {
                    DagActiviteit {
                        rolwinst: 0.0,
                        ..oud.clone()
                    }
                }
            })
            .collect()
    }

    /// Volledige eendaagse waardering over drie marktniveaus.
    ///
    /// De drie reeksen bevatten per dag één prijsvector op kwartierbasis en
    /// moeten evenveel dagen beslaan.
    pub fn waardeer(
        &self,
        markt_1: &[Vec<f64>],
        markt_2: &[Vec<f64>],
        markt_3: &[Vec<f64>],
    ) -> Result<EendaagsResultaat, WaarderingFout> {
        if markt_1.len() != markt_2.len() || markt_2.len() != markt_3.len() {
            return Err(WaarderingFout::OngeldigeParameters {
                details: format!(
                    "marktniveaus beslaan {}, {} en {} dagen",
                    markt_1.len(),
                    markt_2.len(),
                    markt_3.len()
                ),
            });
        }

        let activiteit_1 = self.marktactiviteit(markt_1)?;
        let activiteit_2 = self.marktactiviteit(markt_2)?;
        let na_2 = Self::rol(&activiteit_1, &activiteit_2, markt_2);

        let activiteit_3 = self.marktactiviteit(markt_3)?;
        let na_3 = Self::rol(&na_2, &activiteit_3, markt_3);

        Ok(EendaagsResultaat {
            markt_1: activiteit_1,
            markt_2: activiteit_2,
            markt_3: activiteit_3,
            na_markt_2: na_2,
            na_markt_3: na_3,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimalisatie::DynamischeProgrammering;

    fn waardering() -> EendaagsWaardering {
        let centrale = Pompcentrale::testcentrale();
        let optimalisatie = Box::new(DynamischeProgrammering::nieuw(centrale).unwrap());
        EendaagsWaardering::nieuw(centrale, optimalisatie)
    }

    #[test]
    fn test_vlakke_dagen_rollen_niet() {
        let waardering = waardering();
        let dagen = vec![vec![50.0; 96]; 2];
        let resultaat = waardering.waardeer(&dagen, &dagen, &dagen).unwrap();

        assert!((resultaat.totale_rolwinst()).abs() < 1e-9);
        for dag in &resultaat.na_markt_3 {
            assert!(dag.uitwisseling.iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_rol_naar_beter_marktniveau() {
        let waardering = waardering();
        let markt_1 = vec![vec![50.0; 96]];
        // Marktniveau 2 biedt een winstgevende slinger binnen de dag
        let mut dag = vec![50.0; 96];
        dag[10] = 200.0;
        dag[40] = 1.0;
        let markt_2 = vec![dag];
        let markt_3 = vec![vec![50.0; 96]];

        let resultaat = waardering.waardeer(&markt_1, &markt_2, &markt_3).unwrap();
        assert!(resultaat.na_markt_2[0].rolwinst > 0.0);
        // Terugrollen naar het vlakke niveau 3 levert niets op
        assert_eq!(resultaat.na_markt_3[0].rolwinst, 0.0);
        assert_eq!(
            resultaat.na_markt_3[0].uitwisseling,
            resultaat.na_markt_2[0].uitwisseling
        );
    }

    #[test]
    fn test_ongelijke_daglengtes() {
        let waardering = waardering();
        let een = vec![vec![50.0; 96]];
        let twee = vec![vec![50.0; 96]; 2];
        assert!(matches!(
            waardering.waardeer(&een, &twee, &een),
            Err(WaarderingFout::OngeldigeParameters { .. })
        ));
    }
}
