// Voorbeeld van een volledige rollende waardering.
//
// Dit voorbeeld demonstreert:
// - Het opzetten van een centrale en de DP-optimalisatie
// - Synthetische prijsreeksen voor drie marktniveaus
// - De rollende waardering over meerdere dagen
// - De marktpotten en de intrinsieke waarde

use waterkracht_core::{blokgemiddelde, Pompcentrale, Prijsreeks};
use waterkracht_handel::{
    DynamischeProgrammering, RollendeIntrinsiekeWaardering, WaarderingParameters,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Rollende Waardering Voorbeeld ===\n");

    // Stap 1: centrale en optimalisatie
    println!("1. Centrale opzetten...");
    let centrale = Pompcentrale::testcentrale();
    let optimalisatie = DynamischeProgrammering::nieuw(centrale)?;
    println!("   Turbine: {} MW", centrale.max_turbine_vermogen);
    println!("   Reservoir: {} MWh", centrale.max_niveau);
    println!("   Rasterkwantum: {} MWh\n", optimalisatie.raster().kwantum);

    // Stap 2: synthetische prijzen voor 5 dagen
    println!("2. Prijsreeksen maken...");
    let dagen = 5;
    // Kwartierprijzen met een dagpatroon: duur overdag, goedkoop 's nachts
    let kwartier: Vec<f64> = (0..dagen * 96)
        .map(|i| {
            let kwartier_van_dag = i % 96;
            let piek = if (32..48).contains(&kwartier_van_dag) { 40.0 } else { 0.0 };
            let dal = if kwartier_van_dag < 24 { -25.0 } else { 0.0 };
            50.0 + piek + dal + ((i * 7) % 11) as f64
        })
        .collect();
    // Day-ahead is het uurlijkse blokgemiddelde van hetzelfde patroon
    let day_ahead = blokgemiddelde(&kwartier, 4);
    // De intradayniveaus wijken licht af van day-ahead
    let intraday_1: Vec<f64> = kwartier.iter().map(|p| p + 2.0).collect();
    let intraday_2: Vec<f64> = kwartier
        .iter()
        .enumerate()
        .map(|(i, p)| p + if i % 5 == 0 { -4.0 } else { 3.0 })
        .collect();
    println!("   {} dagen, {} day-ahead uren\n", dagen, day_ahead.len());

    // Stap 3: waardering uitvoeren
    println!("3. Waardering uitvoeren...");
    let mut waardering = RollendeIntrinsiekeWaardering::nieuw(
        centrale,
        Box::new(optimalisatie),
        WaarderingParameters {
            tijdhorizon_dagen: 3,
            ..WaarderingParameters::default()
        },
    )?;
    waardering.zet_prijzen(Prijsreeks {
        day_ahead,
        intraday_1,
        intraday_2,
    })?;
    let resultaat = waardering.waardeer()?;

    // Stap 4: resultaten
    println!("4. Resultaten:");
    println!("   Day-ahead basis:    {:>10.2} EUR", resultaat.som_da_basis);
    println!("   Intraday-1 rollen:  {:>10.2} EUR", resultaat.som_id1_over_da);
    println!("   Intraday-2 rollen:  {:>10.2} EUR", resultaat.som_id2_over_id1);
    println!("   Totale waarde:      {:>10.2} EUR", resultaat.totale_waarde);
    println!("   Intrinsieke waarde: {:>10.2} EUR", resultaat.intrinsieke_waarde);
    println!("   Eindniveau:         {:>10.2} MWh", resultaat.eind_energie_niveau);

    let toestand = waardering.toestand();
    println!("\n   Gerealiseerde sloten: {}", toestand.uitgevoerd_schema.len());
    println!("   Laatste actie: {}", toestand.laatste_actie);

    Ok(())
}
