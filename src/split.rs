use polars::prelude::{DataFrame, IdxCa, IdxSize};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::config::SplitConfig;
use crate::error::{PipelineError, Result};

/// Number of rows the test subset receives: the fraction rounded up.
pub fn test_row_count(n_rows: usize, test_size: f64) -> usize {
    (n_rows as f64 * test_size).ceil() as usize
}

/// Row positions of the (train, test) subsets. The row order is shuffled with
/// a generator seeded from `config.seed`; the first `test_row_count` positions
/// form the test subset. No stratification is done.
pub fn split_indices(n_rows: usize, config: &SplitConfig) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(PipelineError::invalid_split(format!(
            "test_size must be in (0, 1), got {}",
            config.test_size
        )));
    }

    let n_test = test_row_count(n_rows, config.test_size);
    if n_test == 0 || n_test >= n_rows {
        return Err(PipelineError::invalid_split(format!(
            "{n_rows} rows with test_size {} leave an empty subset",
            config.test_size
        )));
    }

    let mut order: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    Ok((train, order))
}

fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&i| i as IdxSize).collect();
    Ok(df.take(&IdxCa::from_vec("idx", idx))?)
}

/// Splits a table into (train, test).
pub fn split_data(df: &DataFrame, config: &SplitConfig) -> Result<(DataFrame, DataFrame)> {
    let (train_rows, test_rows) = split_indices(df.height(), config)?;
    let train = take_rows(df, &train_rows)?;
    let test = take_rows(df, &test_rows)?;

    debug!(
        train = train.height(),
        test = test.height(),
        seed = config.seed,
        "split table"
    );
    Ok((train, test))
}
