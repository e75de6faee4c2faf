use mudensity_qa::cache::QaCache;
use mudensity_qa::comparison::Comparison;
use mudensity_qa::config::compare::{load_config, CompareToolConfig};
use mudensity_qa::io::write_json_file;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config_path = Path::new(&config_path);
    let config = load_config(config_path)?;
    let base = config_path.parent().unwrap_or(Path::new("."));

    let reference = config.reference.load(base, "reference")?;
    let evaluation = config.evaluation.load(base, "evaluation")?;

    let comparison = Comparison::standard(config.gamma.clone())
        .map_err(|e| e.to_string())?
        .with_cache(QaCache::new(config.cache));
    let report = comparison
        .run(&reference, &evaluation)
        .map_err(|e| e.to_string())?;
    let summary = report.summary();

    let report_path = base.join(&config.output.report_json);
    if config.output.include_grids {
        write_json_file(&report_path, &report)?;
    } else {
        write_json_file(&report_path, &summary)?;
    }

    println!(
        "{} vs {}: gamma pass {:.2}% ({}/{} cells), mean {:.3}, max {:.3}",
        summary.reference_label,
        summary.evaluation_label,
        summary.gamma.pass_fraction * 100.0,
        summary.gamma.passed,
        summary.gamma.evaluated,
        summary.gamma.mean,
        summary.gamma.max
    );
    println!(
        "Max |difference| {:.3} MU, total {:.1} ms",
        summary.max_abs_difference, summary.timing.total_ms
    );
    println!("Saved report to {}", report_path.display());

    check_pass_fraction(&config, summary.gamma.pass_fraction)
}

fn check_pass_fraction(config: &CompareToolConfig, pass_fraction: f64) -> Result<(), String> {
    match config.output.min_pass_fraction {
        Some(min) if pass_fraction < min => Err(format!(
            "gamma pass fraction {:.4} below required {:.4}",
            pass_fraction, min
        )),
        _ => Ok(()),
    }
}

fn usage() -> String {
    "Usage: mudensity_compare <config.json>".to_string()
}
