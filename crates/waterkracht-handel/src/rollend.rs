//! Rollende intrinsieke waardering over drie marktniveaus.
//!
//! Per dag wordt het inzetplan drie keer geoptimaliseerd: eerst op de
//! day-ahead prijzen over de hele tijdhorizon, daarna op intraday-1 en
//! intraday-2 waarbij de eerste dag op kwartierbasis wordt vervangen. Een
//! nieuwer marktniveau vervangt de eerdere positie alleen als de ruil op de
//! nieuwe prijzen strikt cash oplevert. Het uiteindelijke intraday-2 plan
//! van de dag wordt op de centraletoestand uitgevoerd.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use waterkracht_core::{
    CentraleToestand, IntradayMarkt, Markt, Pompcentrale, PrijsFout, Prijsreeks,
};

use crate::optimalisatie::{OptimalisatieFout, PlanOptimalisatie};

/// Fouttype voor de rollende waardering.
#[derive(Debug, Clone, PartialEq)]
pub enum WaarderingFout {
    /// Prijsvalidatie mislukt
    Prijs(PrijsFout),
    /// Planoptimalisatie mislukt
    Optimalisatie(OptimalisatieFout),
    /// Ongeldige waarderingsparameters
    OngeldigeParameters { details: String },
    /// Er zijn nog geen prijzen gezet
    GeenPrijzen,
}

impl std::fmt::Display for WaarderingFout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prijs(fout) => write!(f, "{}", fout),
            Self::Optimalisatie(fout) => write!(f, "{}", fout),
            Self::OngeldigeParameters { details } => {
                write!(f, "ongeldige parameters: {}", details)
            }
            Self::GeenPrijzen => write!(f, "er zijn nog geen prijzen gezet"),
        }
    }
}

impl std::error::Error for WaarderingFout {}

impl From<PrijsFout> for WaarderingFout {
    fn from(fout: PrijsFout) -> Self {
        Self::Prijs(fout)
    }
}

impl From<OptimalisatieFout> for WaarderingFout {
    fn from(fout: OptimalisatieFout) -> Self {
        Self::Optimalisatie(fout)
    }
}

/// Parameters voor een waarderingsrun.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaarderingParameters {
    /// Tijdhorizon in dagen waarvoor prijzen bekend worden verondersteld
    #[serde(default = "default_tijdhorizon")]
    pub tijdhorizon_dagen: usize,
    /// Gewenst reservoirniveau in MWh aan het eind van elk venster.
    /// `None` = het energieniveau van de toestand bij aanvang.
    #[serde(default)]
    pub eind_niveau_mwh: Option<f64>,
    /// Duur van één day-ahead slot in uren
    #[serde(default = "default_da_stap")]
    pub day_ahead_stap_uur: f64,
    /// Duur van één intraday slot in uren
    #[serde(default = "default_id_stap")]
    pub intraday_stap_uur: f64,
    /// Aantal uren per dag
    #[serde(default = "default_uren_per_dag")]
    pub uren_per_dag: usize,
}

fn default_tijdhorizon() -> usize {
    7
}

fn default_da_stap() -> f64 {
    1.0
}

fn default_id_stap() -> f64 {
    0.25
}

fn default_uren_per_dag() -> usize {
    24
}

impl Default for WaarderingParameters {
    fn default() -> Self {
        Self {
            tijdhorizon_dagen: default_tijdhorizon(),
            eind_niveau_mwh: None,
            day_ahead_stap_uur: default_da_stap(),
            intraday_stap_uur: default_id_stap(),
            uren_per_dag: default_uren_per_dag(),
        }
    }
}

/// Samenvatting van een volledige waarderingsrun.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaarderingResultaat {
    /// Aantal gewaardeerde dagen
    pub dagen: usize,
    /// Som van de day-ahead basistransacties in EUR
    pub som_da_basis: f64,
    /// Som van de intraday-1 rolwinsten in EUR
    pub som_id1_over_da: f64,
    /// Som van de intraday-2 rolwinsten in EUR
    pub som_id2_over_id1: f64,
    /// Extrinsieke (totale) waarde: som van de drie potten
    pub totale_waarde: f64,
    /// Intrinsieke waarde: som van het gerealiseerde cashflow-schema
    pub intrinsieke_waarde: f64,
    /// Energieniveau aan het einde van de run in MWh
    pub eind_energie_niveau: f64,
    /// Tijdstip van uitvoering
    pub uitgevoerd: DateTime<Utc>,
}

/// Rollende intrinsieke waardering van één centrale.
///
/// De waardering bezit de centraletoestand en het marktgrootboek en muteert
/// die uitsluitend zelf, in een vaste volgorde per dag.
pub struct RollendeIntrinsiekeWaardering {
    centrale: Pompcentrale,
    parameters: WaarderingParameters,
    optimalisatie: Box<dyn PlanOptimalisatie>,
    toestand: CentraleToestand,
    markt: Markt,
    prijzen: Option<Prijsreeks>,
    eind_niveau: f64,
    /// Aantal day-ahead sloten per dag
    n_stappen_da_dag: usize,
    /// Aantal intraday sloten per dag
    n_stappen_id_dag: usize,
}

impl RollendeIntrinsiekeWaardering {
    /// Maak een waardering voor de gegeven centrale en optimalisatie.
    pub fn nieuw(
        centrale: Pompcentrale,
        optimalisatie: Box<dyn PlanOptimalisatie>,
        parameters: WaarderingParameters,
    ) -> Result<Self, WaarderingFout> {
        if parameters.tijdhorizon_dagen < 1 {
            return Err(WaarderingFout::OngeldigeParameters {
                details: "tijdhorizon moet minstens 1 dag zijn".to_string(),
            });
        }
        let n_stappen_da_dag =
            stappen_per_dag(parameters.uren_per_dag, parameters.day_ahead_stap_uur)?;
        let n_stappen_id_dag =
            stappen_per_dag(parameters.uren_per_dag, parameters.intraday_stap_uur)?;

        let toestand = CentraleToestand::nieuw(centrale);
        let eind_niveau = parameters
            .eind_niveau_mwh
            .unwrap_or(toestand.energie_niveau);

        Ok(Self {
            centrale,
            parameters,
            optimalisatie,
            toestand,
            markt: Markt::nieuw(),
            prijzen: None,
            eind_niveau,
            n_stappen_da_dag,
            n_stappen_id_dag,
        })
    }

    /// De gewaardeerde centrale.
    pub fn centrale(&self) -> &Pompcentrale {
        &self.centrale
    }

    /// De centraletoestand na (of tijdens) de run.
    pub fn toestand(&self) -> &CentraleToestand {
        &self.toestand
    }

    /// Het marktgrootboek na (of tijdens) de run.
    pub fn markt(&self) -> &Markt {
        &self.markt
    }

    /// Zet de prijsreeksen voor de run en valideer de lengtes.
    pub fn zet_prijzen(&mut self, reeks: Prijsreeks) -> Result<(), WaarderingFout> {
        if reeks.day_ahead.is_empty() || reeks.day_ahead.len() % self.n_stappen_da_dag != 0 {
            return Err(PrijsFout::OngeldigeDagLengte {
                lengte: reeks.day_ahead.len(),
                stappen_per_dag: self.n_stappen_da_dag,
            }
            .into());
        }
        let dagen = reeks.day_ahead.len() / self.n_stappen_da_dag;
        let verwacht = dagen * self.n_stappen_id_dag;
        if reeks.intraday_1.len() != verwacht {
            return Err(PrijsFout::LengteMismatch {
                markt: IntradayMarkt::Id1,
                lengte: reeks.intraday_1.len(),
                verwacht,
                dagen,
            }
            .into());
        }
        if reeks.intraday_2.len() != verwacht {
            return Err(PrijsFout::LengteMismatch {
                markt: IntradayMarkt::Id2,
                lengte: reeks.intraday_2.len(),
                verwacht,
                dagen,
            }
            .into());
        }
        self.prijzen = Some(reeks);
        Ok(())
    }

    /// Voer de volledige waardering uit over alle dagen van de prijsreeks.
    ///
    /// De centraletoestand wordt eerst gewist; het grootboek groeit
    /// monotoon met de run mee.
    pub fn waardeer(&mut self) -> Result<WaarderingResultaat, WaarderingFout> {
        let reeks = self.prijzen.clone().ok_or(WaarderingFout::GeenPrijzen)?;
        let dagen = reeks.day_ahead.len() / self.n_stappen_da_dag;

        self.toestand.wis();
        self.toestand.reserveer(dagen * self.n_stappen_id_dag);

        for dag in 0..dagen {
            debug!(dag, dagen, "dagvenster berekenen");

            // 1. Day-ahead over de hele horizon
            let (da_prijzen, da_duren) = self.da_venster(&reeks.day_ahead, dag);
            let mut plan = self.dag_plan_da(&da_prijzen, &da_duren, dag)?;

            // 2. Intraday-1: eerste dag op kwartierbasis, rol bij winst
            let (id1_prijzen, id1_duren) =
                self.samengesteld_venster(&reeks.day_ahead, &reeks.intraday_1, dag);
            plan = self.splits_eerste_dag(&plan);
            plan = self.dag_plan_id(&id1_prijzen, &id1_duren, plan, dag, IntradayMarkt::Id1)?;

            // 3. Intraday-2: zelfde ruil tegen het dan geldende plan
            let (id2_prijzen, id2_duren) =
                self.samengesteld_venster(&reeks.day_ahead, &reeks.intraday_2, dag);
            plan = self.dag_plan_id(&id2_prijzen, &id2_duren, plan, dag, IntradayMarkt::Id2)?;

            // 4. Voer de eerste dag van het aangenomen plan uit
            let n_id = self.n_stappen_id_dag;
            self.toestand
                .voer_schema_uit(&id2_prijzen[..n_id], dag, &plan[..n_id]);
        }

        let resultaat = WaarderingResultaat {
            dagen,
            som_da_basis: self.markt.som_da_basis,
            som_id1_over_da: self.markt.som_id1_over_da,
            som_id2_over_id1: self.markt.som_id2_over_id1,
            totale_waarde: self.markt.totale_waarde(),
            intrinsieke_waarde: self.toestand.cashflow_schema.iter().sum(),
            eind_energie_niveau: self.toestand.energie_niveau,
            uitgevoerd: Utc::now(),
        };
        info!(
            dagen,
            totale_waarde = resultaat.totale_waarde,
            intrinsieke_waarde = resultaat.intrinsieke_waarde,
            "waardering afgerond"
        );
        Ok(resultaat)
    }

    /// Day-ahead plan voor de horizon vanaf `dag`; de eerste dag wordt als
    /// basistransactie geboekt.
    fn dag_plan_da(
        &mut self,
        prijzen: &[f64],
        duren: &[f64],
        dag: usize,
    ) -> Result<Vec<f64>, WaarderingFout> {
        let plan = self.optimalisatie.optimaal_plan(
            prijzen,
            duren,
            self.toestand.energie_niveau,
            self.toestand.laatste_actie,
            self.eind_niveau,
        )?;
        let verkoop = plan.netto_verkoop();
        let n = self.n_stappen_da_dag;
        self.markt.transacties_da(&prijzen[..n], &verkoop[..n], dag);
        Ok(verkoop)
    }

    /// Intraday plan tegen het samengestelde venster, met rolbeslissing.
    ///
    /// De ruil wordt alleen aangenomen als de delta-cashflow over de eerste
    /// dag strikt positief is; anders wordt een nulvector geboekt zodat elke
    /// dag een historie-item heeft en blijft het eerdere plan staan.
    fn dag_plan_id(
        &mut self,
        prijzen: &[f64],
        duren: &[f64],
        laatste_plan: Vec<f64>,
        dag: usize,
        markt: IntradayMarkt,
    ) -> Result<Vec<f64>, WaarderingFout> {
        let plan = self.optimalisatie.optimaal_plan(
            prijzen,
            duren,
            self.toestand.energie_niveau,
            self.toestand.laatste_actie,
            self.eind_niveau,
        )?;
        let verkoop = plan.netto_verkoop();
        let n = self.n_stappen_id_dag;

        let delta: Vec<f64> = verkoop[..n]
            .iter()
            .zip_eq(&laatste_plan[..n])
            .map(|(nieuw, oud)| nieuw - oud)
            .collect();
        let rol_cashflow: f64 = Markt::cashflow(&prijzen[..n], &delta).iter().sum();

        if rol_cashflow > 0.0 {
            debug!(dag, markt = %markt, winst = rol_cashflow, "rol aangenomen");
            self.markt.transacties_id(&prijzen[..n], &delta, dag, markt);
            Ok(verkoop)
        } else {
            self.markt
                .transacties_id(&prijzen[..n], &vec![0.0; n], dag, markt);
            Ok(laatste_plan)
        }
    }

    /// Day-ahead prijsvenster voor de horizon vanaf `dag`, afgekapt op het
    /// einde van de reeks.
    fn da_venster(&self, day_ahead: &[f64], dag: usize) -> (Vec<f64>, Vec<f64>) {
        let n_da = self.n_stappen_da_dag;
        let van = dag * n_da;
        let tot = ((dag + self.parameters.tijdhorizon_dagen) * n_da).min(day_ahead.len());
        let prijzen = day_ahead[van..tot].to_vec();
        let duren = vec![self.parameters.day_ahead_stap_uur; prijzen.len()];
        (prijzen, duren)
    }

    /// Samengesteld venster: de eerste dag uit de intradayreeks op
    /// kwartierbasis, gevolgd door de resterende day-ahead uren van de
    /// horizon.
    fn samengesteld_venster(
        &self,
        day_ahead: &[f64],
        intraday: &[f64],
        dag: usize,
    ) -> (Vec<f64>, Vec<f64>) {
        let n_da = self.n_stappen_da_dag;
        let n_id = self.n_stappen_id_dag;

        let id_van = dag * n_id;
        let id_tot = (dag + 1) * n_id;
        let da_van = ((dag + 1) * n_da).min(day_ahead.len());
        let da_tot = ((dag + self.parameters.tijdhorizon_dagen) * n_da).min(day_ahead.len());

        let mut prijzen = Vec::with_capacity((id_tot - id_van) + (da_tot - da_van));
        prijzen.extend_from_slice(&intraday[id_van..id_tot]);
        prijzen.extend_from_slice(&day_ahead[da_van..da_tot]);

        let mut duren = vec![self.parameters.intraday_stap_uur; id_tot - id_van];
        duren.extend(std::iter::repeat(self.parameters.day_ahead_stap_uur).take(da_tot - da_van));
        (prijzen, duren)
    }

    /// Splits de eerste dag van een uurlijks plan naar kwartiersloten.
    ///
    /// Slothoeveelheden zijn MWh per slot: één uurslot met hoeveelheid `x`
    /// wordt vier kwartiersloten van elk `x / 4`, het vermogen blijft dus
    /// constant over het uur. De staart blijft ongemoeid.
    fn splits_eerste_dag(&self, plan: &[f64]) -> Vec<f64> {
        let factor = (self.parameters.day_ahead_stap_uur / self.parameters.intraday_stap_uur)
            .round() as usize;
        let n_da = self.n_stappen_da_dag;

        let mut gesplitst = Vec::with_capacity(n_da * factor + plan.len() - n_da);
        for &hoeveelheid in &plan[..n_da] {
            for _ in 0..factor {
                gesplitst.push(hoeveelheid / factor as f64);
            }
        }
        gesplitst.extend_from_slice(&plan[n_da..]);
        gesplitst
    }
}

fn stappen_per_dag(uren_per_dag: usize, stap_uur: f64) -> Result<usize, WaarderingFout> {
    if stap_uur <= 0.0 {
        return Err(WaarderingFout::OngeldigeParameters {
            details: format!("stapduur moet positief zijn, kreeg {}", stap_uur),
        });
    }
    let stappen = uren_per_dag as f64 / stap_uur;
    if (stappen - stappen.round()).abs() > 1e-9 || stappen < 1.0 {
        return Err(WaarderingFout::OngeldigeParameters {
            details: format!(
                "stapduur {} uur past niet geheel in {} uur per dag",
                stap_uur, uren_per_dag
            ),
        });
    }
    Ok(stappen.round() as usize)
}
