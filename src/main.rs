//! Binario de demostración: corre el pipeline completo de descubrimiento
//! (cribado, optimización y predicción de propiedades) sobre un análogo
//! base de SAM y reporta el resumen final por stdout.

use sam_domain::{AlkylGroup, Isostere, SamAnalog};
use sam_engine::{OptimizationCriteria, WorkflowSpec};
use samflow_rust::build_orchestrator;
use samflow_rust::config::CONFIG;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .with_target(false)
                             .init();

    let orchestrator = build_orchestrator(&CONFIG)?;
    let base = SamAnalog::derive("SAM", AlkylGroup::Methyl, Isostere::Carboxylate, false);
    let spec = WorkflowSpec { methyltransferase: "DNMT1".to_string(),
                              base,
                              stages: vec!["screening".to_string(), "optimization".to_string(), "property-prediction".to_string()],
                              criteria: OptimizationCriteria { stability_min: 3000.0, turnover_min: 50.0, selectivity_target: 0.8 } };

    let workflow = orchestrator.run(spec).await?;

    println!("workflow {} -> {:?}", workflow.id, workflow.status);
    for stage in &workflow.stages {
        println!("  {:<20} {:?}", stage.name, stage.status());
    }
    if let Some(results) = &workflow.results {
        println!("{}", serde_json::to_string_pretty(results)?);
    }
    Ok(())
}
