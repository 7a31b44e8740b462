use anyhow::Result;
use debatenet::DebateAnalysis;
use std::path::PathBuf;

const DATA_ROOT: &str = "./data";
const OUTPUT_ROOT: &str = "./output";

fn main() -> Result<()> {
    let data_dir = PathBuf::from(DATA_ROOT);
    let output_dir = PathBuf::from(OUTPUT_ROOT);

    let outcome = DebateAnalysis::new()
        .data_dir(&data_dir)
        .output_dir(&output_dir)
        .sample_thresholds(11, 11)
        .topics(10)
        .seed(1234)
        .activity_band(6, 16)
        .progress(true)
        .run()?;

    println!(
        "Modelled {} threads into {} topics; {} users in the {} network. Outputs in {}",
        outcome.model.doc_ids.len(),
        outcome.model.num_topics(),
        outcome.graph.node_count(),
        outcome.activity_year,
        output_dir.display()
    );

    Ok(())
}
