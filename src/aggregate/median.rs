use ndarray::{Array2, Zip};
use tracing::{debug, warn};

use crate::config::FailedDatePolicy;
use crate::error::{IceError, Result};
use crate::grid::{BoolGrid, Grid};

/// Per-cell majority vote of `grid >= thresh` over a sequence of grids.
///
/// A cell is true when the fraction of grids exceeding `thresh` there is at least
/// `occurrence` (ties count as occurrence). Failed items never enter the numerator; with
/// [`FailedDatePolicy::CountAsAbsent`] they still enlarge the denominator. Fails with
/// `EmptyRange` when no grid could be read and `Precondition` on mixed shapes.
pub fn temporal_median_occurrence<I>(
    grids: I,
    thresh: f32,
    no_observation: f32,
    occurrence: f64,
    policy: FailedDatePolicy,
) -> Result<BoolGrid>
where
    I: IntoIterator<Item = Result<Grid>>,
{
    let mut counts: Option<Array2<u32>> = None;
    let mut succeeded = 0_u32;
    let mut failed = 0_u32;

    for item in grids {
        let grid = match item {
            Ok(grid) => grid,
            Err(e) => {
                warn!(error = %e, "leaving grid out of median");
                failed += 1;
                continue;
            }
        };

        let counts = counts.get_or_insert_with(|| Array2::zeros(grid.dim()));
        if counts.dim() != grid.dim() {
            return Err(IceError::Precondition(format!(
                "grid shape {:?} differs from {:?}",
                grid.dim(),
                counts.dim()
            )));
        }

        Zip::from(&mut *counts).and(&grid).for_each(|count, &value| {
            if value != no_observation && value >= thresh {
                *count += 1;
            }
        });
        succeeded += 1;
    }

    let Some(counts) = counts else {
        return Err(IceError::EmptyRange);
    };

    let denominator = match policy {
        FailedDatePolicy::Exclude => succeeded,
        FailedDatePolicy::CountAsAbsent => succeeded + failed,
    } as f64;
    debug!(succeeded, failed, denominator, "median occurrence");

    Ok(counts.mapv(|count| count as f64 / denominator >= occurrence))
}
