//! Segmented Fit Example
//!
//! Splits the target into three time segments and scores every candidate
//! once per segment. The search becomes multi-objective: the study keeps a
//! Pareto front of per-segment correlations, and the winner is the trial
//! with a high mean score that also holds up across segments.
//!
//! The input is a polars frame indexed by minute timestamps, the way bars
//! usually arrive from a loader.
//!
//! Run with: `cargo run --example segmented_fit`

use tuneta::polars::prelude::{Column, DataFrame, NamedFrom, Series};
use tuneta::prelude::*;

const BARS: usize = 600;
const MINUTE: i64 = 60_000;

/// Close prices whose cycle length drifts over time, so no single
/// lookback is best everywhere.
fn drifting_cycle(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut phase: f64 = 0.0;
    (0..n)
        .map(|i| {
            let period = 30.0 + 20.0 * i as f64 / n as f64;
            phase += core::f64::consts::TAU / period;
            100.0 + 3.0 * phase.sin() + 0.4 * (rng.f64() - 0.5)
        })
        .collect()
}

fn main() -> tuneta::Result<()> {
    let start = 1_700_000_000_000_i64;
    let ts: Vec<i64> = (0..BARS as i64).map(|i| start + i * MINUTE).collect();
    let close = drifting_cycle(BARS, 11);
    let ahead: Vec<f64> = (0..BARS)
        .map(|i| close.get(i + 10).map_or(f64::NAN, |c| c - close[i]))
        .collect();

    let data = DataFrame::new(vec![
        Column::new("ts".into(), ts),
        Column::new("close".into(), close),
    ])?;
    let x = FeatureFrame::from_data_frame(data, "ts")?;
    let y = Target::from_columns(x.index(), &Column::from(Series::new("ahead".into(), ahead)))?;

    let boundaries = vec![0, BARS / 3, 2 * BARS / 3, BARS];
    let options = FitOptions::new()
        .segment_boundaries(boundaries.clone())
        .output_index(1)
        .patience(30);

    let mut optimizer = IndicatorOptimizer::builder(BollingerBands::new().length_range(5, 60))
        .n_trials(200)
        .seed(3)
        .build()?;
    optimizer.fit(&x, &y, &options)?;

    let study = optimizer.study()?;
    println!(
        "{} trials over {} segments, {} on the Pareto front",
        study.n_trials(),
        study.n_objectives(),
        study.best_trials().len(),
    );

    let winner = optimizer.winner()?;
    println!(
        "winner: trial {} length {} std {:.2}",
        winner.id,
        winner.params.int("length")?,
        winner.params.float("std")?,
    );
    for (bounds, score) in boundaries.windows(2).zip(&winner.values) {
        println!("  rows {:>3}..{:<3} |corr| {score:.4}", bounds[0], bounds[1]);
    }

    println!("\n{}", optimizer.transform(&x)?.head(Some(5)));
    Ok(())
}
