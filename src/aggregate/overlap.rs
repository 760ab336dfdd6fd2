use ndarray::{Array2, Zip};
use std::fmt;

use crate::grid::BoolGrid;

/// Agreement class of one cell between two thresholded products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum OverlapCategory {
    Both = 1,
    Neither = 2,
    OnlyA = 3,
    OnlyB = 4,
}

pub type CategoryGrid = Array2<OverlapCategory>;

impl OverlapCategory {
    pub const ALL: [OverlapCategory; 4] = [
        OverlapCategory::Both,
        OverlapCategory::Neither,
        OverlapCategory::OnlyA,
        OverlapCategory::OnlyB,
    ];

    pub fn classify(a: bool, b: bool) -> Self {
        match (a, b) {
            (true, true) => OverlapCategory::Both,
            (false, false) => OverlapCategory::Neither,
            (true, false) => OverlapCategory::OnlyA,
            (false, true) => OverlapCategory::OnlyB,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OverlapCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverlapCategory::Both => "both",
            OverlapCategory::Neither => "neither",
            OverlapCategory::OnlyA => "a only",
            OverlapCategory::OnlyB => "b only",
        };
        f.write_str(name)
    }
}

/// Combines two same-shape masks cell by cell.
pub fn classify_masks(a: &BoolGrid, b: &BoolGrid) -> CategoryGrid {
    let mut out = Array2::from_elem(a.dim(), OverlapCategory::Neither);
    Zip::from(&mut out)
        .and(a)
        .and(b)
        .for_each(|cell, &in_a, &in_b| *cell = OverlapCategory::classify(in_a, in_b));
    out
}

/// Number of cells in each category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapCounts {
    pub both: usize,
    pub neither: usize,
    pub only_a: usize,
    pub only_b: usize,
}

impl OverlapCounts {
    pub fn from_grid(grid: &CategoryGrid) -> Self {
        let mut counts = Self::default();
        for category in grid {
            match category {
                OverlapCategory::Both => counts.both += 1,
                OverlapCategory::Neither => counts.neither += 1,
                OverlapCategory::OnlyA => counts.only_a += 1,
                OverlapCategory::OnlyB => counts.only_b += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.both + self.neither + self.only_a + self.only_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_codes_are_stable() {
        let codes: Vec<u8> = OverlapCategory::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_every_cell_gets_one_category() {
        let a = array![[true, true], [false, false]];
        let b = array![[true, false], [true, false]];
        let grid = classify_masks(&a, &b);

        assert_eq!(
            grid,
            array![
                [OverlapCategory::Both, OverlapCategory::OnlyA],
                [OverlapCategory::OnlyB, OverlapCategory::Neither]
            ]
        );

        let counts = OverlapCounts::from_grid(&grid);
        assert_eq!(counts.total(), grid.len());
        assert_eq!((counts.both, counts.neither, counts.only_a, counts.only_b), (1, 1, 1, 1));
    }
}
