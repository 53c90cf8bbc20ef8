use anyhow::Result;

use grantscope::{PipelineConfig, run_rebuild};

fn main() -> Result<()> {
    println!("🗺️  GrantScope - Full Rebuild");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = PipelineConfig::default();
    println!(
        "State {} / counties {:?} → {}",
        config.state,
        config.counties,
        config.db_path.display()
    );

    let summary = run_rebuild(&config)?;

    if summary.tracts == 0 {
        // Zero geography is the one condition the UI must surface itself
        eprintln!("⚠️ No tracts available — store is empty until the next rebuild.");
    }

    Ok(())
}
