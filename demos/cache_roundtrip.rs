use chrono::NaiveDate;
use icegrid::utils::GridSummary;
use icegrid::{GridCache, GridKey, Hemisphere, Product};
use ndarray::Array2;

fn main() {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to create cache directory: {}", e);
            return;
        }
    };
    let cache = GridCache::new(dir.path());

    let Some(date) = NaiveDate::from_ymd_opt(2019, 1, 15) else {
        return;
    };
    let key = GridKey::new(date, Hemisphere::South, Product::Gridded);
    let grid = Array2::from_shape_fn((4, 5), |(row, col)| {
        if row == 0 { -1.0 } else { (row * col) as f32 / 12.0 }
    });

    let loaded = cache
        .get_or_compute(&key, || Ok(grid.clone()), false)
        .and_then(|_| cache.load(&key));
    match loaded {
        Ok(loaded) => {
            println!("{} -> {}", key, cache.path(&key).display());
            println!("identical: {}", loaded == grid);
            println!("{}", GridSummary::from_grid(&loaded, -1.0));
        }
        Err(e) => eprintln!("Cache round trip failed: {}", e),
    }

    match cache.cached_dates(Hemisphere::South, Product::Gridded) {
        Ok(dates) => println!("cached dates: {:?}", dates),
        Err(e) => eprintln!("Could not list cache: {}", e),
    }
}
