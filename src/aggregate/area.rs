use ndarray::Zip;

use crate::aggregate::threshold::{ConcentrationRange, ensure_same_shape};
use crate::error::Result;
use crate::grid::Grid;

/// Cells of each grid inside its range, restricted to cells `co_mask` observes.
///
/// Returns the two cell counts; callers scale them by the cell area.
pub fn count_in_range(
    grid_a: &Grid,
    range_a: ConcentrationRange,
    grid_b: &Grid,
    range_b: ConcentrationRange,
    co_mask: &Grid,
) -> Result<(usize, usize)> {
    range_a.validate()?;
    range_b.validate()?;
    ensure_same_shape(grid_a, grid_b, "product")?;
    ensure_same_shape(grid_a, co_mask, "co-mask")?;

    let mut count_a = 0;
    let mut count_b = 0;
    Zip::from(grid_a)
        .and(grid_b)
        .and(co_mask)
        .for_each(|&a, &b, &reference| {
            if reference >= 0.0 {
                count_a += range_a.contains(a) as usize;
                count_b += range_b.contains(b) as usize;
            }
        });

    Ok((count_a, count_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IceError;
    use ndarray::array;

    #[test]
    fn test_counts_respect_ranges() {
        let a = array![[0.5_f32, 0.6], [0.9, 1.0], [0.2, 0.0]];
        let b = array![[0.18_f32, 0.8], [0.8, 0.8], [0.18, -1.0]];
        let co = b.clone();

        let (count_a, count_b) = count_in_range(
            &a,
            ConcentrationRange::new(0.5, 1.0).unwrap(),
            &b,
            ConcentrationRange::new(0.5, 1.0).unwrap(),
            &co,
        )
        .unwrap();

        assert_eq!(count_a, 4);
        assert_eq!(count_b, 3);
    }

    #[test]
    fn test_unobserved_reference_cells_excluded_for_both() {
        let a = array![[0.9_f32, 0.9]];
        let b = array![[0.8_f32, -1.0]];
        let full = ConcentrationRange::new(0.0, 1.0).unwrap();

        let (count_a, count_b) = count_in_range(&a, full, &b, full, &b).unwrap();
        assert_eq!((count_a, count_b), (1, 1));
    }

    #[test]
    fn test_shape_mismatch_is_precondition() {
        let a = array![[0.9_f32, 0.9]];
        let b = array![[0.9_f32], [0.9]];
        let full = ConcentrationRange::new(0.0, 1.0).unwrap();

        assert!(matches!(
            count_in_range(&a, full, &b, full, &a),
            Err(IceError::Precondition(_))
        ));
    }
}
