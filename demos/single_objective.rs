//! Single-Objective Fit Example
//!
//! Tunes the lookback of a few built-in indicators so that each one tracks
//! the forward return of a synthetic price series as closely as possible.
//! Every fit runs a seeded random search, stops early after a stretch of
//! trials without improvement, and then materializes the winning column.
//!
//! Run with: `cargo run --example single_objective`

use std::sync::Arc;

use tuneta::prelude::*;

const BARS: usize = 500;
const HORIZON: usize = 5;

/// A seeded random walk with a slow cycle, so trend indicators have
/// something to find.
fn synthetic_close(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let drift = 0.15 * (i as f64 / 40.0).sin();
            price += drift + (rng.f64() - 0.5);
            price
        })
        .collect()
}

/// Percentage change `horizon` bars ahead; the last bars have none.
fn forward_returns(close: &[f64], horizon: usize) -> Vec<f64> {
    (0..close.len())
        .map(|i| match close.get(i + horizon) {
            Some(ahead) => ahead / close[i] - 1.0,
            None => f64::NAN,
        })
        .collect()
}

fn main() -> tuneta::Result<()> {
    let close = synthetic_close(BARS, 42);
    let index: Vec<i64> = (0..BARS as i64).collect();
    let y = Target::new(index.clone(), forward_returns(&close, HORIZON))?;
    let x = FeatureFrame::new(index).with_column("close", close)?;

    let candidates: Vec<Arc<dyn Indicator>> = vec![
        Arc::new(Sma::new().length_range(2, 60)),
        Arc::new(Ema::new().length_range(2, 60)),
        Arc::new(Rsi::new().length_range(2, 40)),
    ];
    let options = FitOptions::new().patience(25);

    let mut features = Vec::new();
    for indicator in candidates {
        let name = indicator.name().to_owned();
        let mut optimizer = IndicatorOptimizerBuilder::new(indicator)
            .n_trials(150)
            .seed(7)
            .build()?;
        optimizer.fit(&x, &y, &options)?;

        let winner = optimizer.winner()?;
        let study = optimizer.study()?;
        println!(
            "{name:>4}: length {:>2}  |corr| {:.4}  ({} trials, {} scored)",
            winner.params.int("length")?,
            winner.values[0],
            study.n_trials(),
            study.n_complete_trials(),
        );
        features.push(optimizer.transform(&x)?);
    }

    for frame in &features {
        println!("\n{}", frame.head(Some(8)));
    }
    Ok(())
}
