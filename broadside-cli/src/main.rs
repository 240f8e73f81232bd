use std::path::PathBuf;

use broadside::prelude::*;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario JSON file path
    #[arg(short, long, default_value = "scenario.json", value_name = "FILE")]
    scenario: PathBuf,

    /// Use a demo scenario instead of loading from file
    #[arg(long, default_value_t = false, conflicts_with = "scenario")]
    demo: bool,

    /// Only resolve the first attack of the salvo
    #[arg(long, default_value_t = false)]
    single: bool,

    /// Also draw one sampled outcome for comparison
    #[arg(long, default_value_t = false)]
    sample: bool,

    /// Random seed for the sampled outcome
    #[arg(long, default_value = None)]
    seed: Option<u64>,

    /// Percentiles to report, as fractions
    #[arg(short, long, value_delimiter = ',', default_values_t = vec![0.1, 0.5, 0.9])]
    percentiles: Vec<f64>,
}

fn load_scenario(args: &Args) -> anyhow::Result<Scenario> {
    if args.demo {
        log::info!("Using demo scenario");
        return Ok(Scenario::demo());
    }
    log::info!("Loading scenario from {}", args.scenario.display());
    let file = std::fs::File::open(&args.scenario)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn summarize(
    distribution: &ProbabilityDistribution<u32>,
    current_hp: u32,
    percentiles: &[f64],
) -> anyhow::Result<String> {
    use std::fmt::Write;

    let mut out = String::new();
    distribution.pretty_print(&mut out)?;
    writeln!(out)?;
    if let (Some(min), Some(max)) = (distribution.min_key(), distribution.max_key()) {
        writeln!(out, "min: {}  max: {}", min, max)?;
    }
    writeln!(out, "expected: {:.3}", ExpectedDamage.query(distribution)?)?;
    for &p in percentiles {
        writeln!(
            out,
            "p{:<5} {}",
            p * 100.0,
            Percentile(p).query(distribution)?
        )?;
    }
    writeln!(
        out,
        "sink probability: {:.4}%",
        SinkProbability::new(current_hp).query(distribution)? * 100.0
    )?;
    Ok(out)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::builder()
        .format_timestamp_secs()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    log::info!("Starting with args: {:?}", args);

    let mut scenario = load_scenario(&args)?;
    if args.single {
        scenario.count = 1;
    }
    log::info!("Scenario: {:?}", scenario);
    let model = scenario.salvo_model()?;

    let start = chrono::Utc::now();
    let distribution = model.to_distribution()?;
    let elapsed = chrono::Utc::now() - start;
    log::info!(
        "Resolved {} outcomes in {} ms",
        distribution.len(),
        elapsed.num_milliseconds()
    );

    print!(
        "{}",
        summarize(&distribution, scenario.defense.current_hp, &args.percentiles)?
    );

    if args.sample {
        let mut roller = match args.seed {
            Some(seed) => Roller::from_seed(seed),
            None => Roller::new(),
        };
        println!("sampled: {}", model.random(&mut roller)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["broadside-cli", "--demo", "--percentiles", "0.25,0.75"]);
        assert!(args.demo);
        assert_eq!(args.percentiles, vec![0.25, 0.75]);

        assert!(Args::try_parse_from(["broadside-cli", "--demo", "--scenario", "x.json"]).is_err());
    }

    #[test]
    fn test_summarize_demo() {
        let scenario = Scenario::demo();
        let dist = scenario.salvo_model().unwrap().to_distribution().unwrap();
        let out = summarize(&dist, scenario.defense.current_hp, &[0.5]).unwrap();
        assert!(out.contains("expected:"));
        assert!(out.contains("sink probability: 0.0000%"));
    }
}
