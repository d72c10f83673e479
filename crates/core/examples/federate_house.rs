use std::path::PathBuf;
use twinfed::FederationEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug to follow each request through its stages
    env_logger::init();

    println!("=== twinfed - House Federation ===\n");

    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures");
    let engine = FederationEngine::builder()
        .graph_fixture(fixtures.join("home_graph.json"))
        .measurement_fixture(fixtures.join("sensor_data.json"))
        .build()?;

    let space = std::env::args().nth(1).unwrap_or_else(|| "House".to_string());
    let response = engine
        .execute(&space, "2025-06-15T00:00:00Z", "2025-06-15T06:00:00Z")
        .await?;

    println!("Spaces under '{}': {}\n", space, response.spaces.len());
    for result in &response.spaces {
        println!("{}", result.name);
        for sensor in &result.sensors {
            println!("   sensor    {} ({})", sensor.id, sensor.name.as_deref().unwrap_or("-"));
        }
        for document in &result.documents {
            println!("   document  {}", document.identity());
        }
        for image in &result.images {
            println!("   image     {}", image.identity());
        }
        for group in &result.measurements {
            match &group.summary {
                Some(s) => println!(
                    "   {:<12} {:>4} values  min {:.2} max {:.2} mean {:.2} {}",
                    group.name, s.count, s.min, s.max, s.mean, group.unit
                ),
                None => println!("   {:<12} no values", group.name),
            }
        }
        println!();
    }

    for failure in &response.failures {
        println!("FAILED {} ({}): {}", failure.sensor_id, failure.kind, failure.message);
    }

    Ok(())
}
