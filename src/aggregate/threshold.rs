use ndarray::Zip;

use crate::error::{IceError, Result};
use crate::grid::{BoolGrid, Grid};

/// Inclusive concentration range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcentrationRange {
    pub min: f32,
    pub max: f32,
}

impl ConcentrationRange {
    pub fn new(min: f32, max: f32) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Everything at or above `min`, up to full cover.
    pub fn at_least(min: f32) -> Result<Self> {
        Self::new(min, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min.is_nan() || self.max.is_nan() || self.min > self.max {
            return Err(IceError::Precondition(format!(
                "concentration range [{}, {}] is inverted",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }
}

/// `grid >= thresh`, never true on the no-observation sentinel.
pub fn threshold_mask(grid: &Grid, thresh: f32, no_observation: f32) -> BoolGrid {
    grid.mapv(|v| v != no_observation && v >= thresh)
}

/// Cells inside `range`, never true on the no-observation sentinel.
pub fn range_mask(grid: &Grid, range: ConcentrationRange, no_observation: f32) -> BoolGrid {
    grid.mapv(|v| v != no_observation && range.contains(v))
}

/// Boundary cells of a mask: true where a cell differs from the cell before it along
/// either axis. Cells before the first row and column count as false.
pub fn ice_edge(mask: &BoolGrid) -> BoolGrid {
    let (rows, cols) = mask.dim();
    let mut edge = BoolGrid::from_elem((rows, cols), false);

    Zip::indexed(&mut edge).for_each(|(row, col), out| {
        let here = mask[[row, col]];
        let above = row > 0 && mask[[row - 1, col]];
        let left = col > 0 && mask[[row, col - 1]];
        *out = here != above || here != left;
    });

    edge
}

pub(crate) fn ensure_same_shape(a: &Grid, b: &Grid, what: &str) -> Result<()> {
    if a.dim() != b.dim() {
        return Err(IceError::Precondition(format!(
            "{} shapes differ: {:?} vs {:?}",
            what,
            a.dim(),
            b.dim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sentinel_never_passes_threshold() {
        let grid = array![[-1.0_f32, 0.0], [0.5, 1.0]];

        let mask = threshold_mask(&grid, -5.0, -1.0);
        assert_eq!(mask, array![[false, true], [true, true]]);

        let mask = threshold_mask(&grid, 0.5, -1.0);
        assert_eq!(mask, array![[false, false], [true, true]]);
    }

    #[test]
    fn test_threshold_is_monotone() {
        let grid = array![
            [-1.0_f32, 0.0, 0.1, 0.15],
            [0.18, 0.3, 0.5, 0.79],
            [0.8, 0.85, 0.99, 1.0]
        ];
        let thresholds = [-1.0_f32, 0.0, 0.15, 0.18, 0.5, 0.8, 1.0, 1.1];

        for (i, t1) in thresholds.iter().enumerate() {
            for t2 in &thresholds[i..] {
                let low = threshold_mask(&grid, *t1, -1.0);
                let high = threshold_mask(&grid, *t2, -1.0);
                for (l, h) in low.iter().zip(high.iter()) {
                    assert!(*l || !*h, "mask at {t2} not a subset of mask at {t1}");
                }
            }
        }
    }

    #[test]
    fn test_range_mask_is_inclusive() {
        let grid = array![[0.15_f32, 0.5, 0.8, 0.81]];
        let range = ConcentrationRange::new(0.5, 0.8).unwrap();
        assert_eq!(
            range_mask(&grid, range, -1.0),
            array![[false, true, true, false]]
        );
    }

    #[test]
    fn test_inverted_range_is_precondition() {
        assert!(matches!(
            ConcentrationRange::new(0.9, 0.1),
            Err(IceError::Precondition(_))
        ));
        assert!(ConcentrationRange::new(f32::NAN, 1.0).is_err());
        assert!(ConcentrationRange::new(0.3, 0.3).is_ok());
    }

    #[test]
    fn test_ice_edge_marks_transitions() {
        let mask = array![
            [false, false, false],
            [false, true, true],
            [false, true, true]
        ];
        let edge = ice_edge(&mask);

        assert_eq!(
            edge,
            array![
                [false, false, false],
                [false, true, true],
                [false, true, false]
            ]
        );
    }

    #[test]
    fn test_ice_edge_first_row_and_column_compare_to_false() {
        let mask = array![[true, true], [true, true]];
        assert_eq!(ice_edge(&mask), array![[true, true], [true, false]]);
    }
}
