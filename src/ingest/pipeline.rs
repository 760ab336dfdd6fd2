use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::GridCache;
use crate::date_gen::DateGenerator;
use crate::error::{IceError, Result};
use crate::grid::{GridKey, Hemisphere};
use crate::ingest::report::{DateOutcome, DateResult, IngestionReport};
use crate::ingest::source::GridSource;

/// Runs per-date rasterization into the cache on a bounded worker pool.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    cache: GridCache,
    workers: usize,
}

impl IngestionPipeline {
    pub fn new(cache: GridCache, workers: usize) -> Self {
        Self {
            cache,
            workers: workers.max(1),
        }
    }

    pub fn cache(&self) -> &GridCache {
        &self.cache
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Ingests every date from `start` to `end` inclusive.
    ///
    /// A date counts as cached only when its artifact loads; a corrupt one is recomputed.
    /// Per-date failures end up in the report. Only a misconfigured call (inverted range,
    /// source for another hemisphere, pool creation) is an error.
    pub fn ingest_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        hemisphere: Hemisphere,
        source: &dyn GridSource,
        overwrite: bool,
    ) -> Result<IngestionReport> {
        if start > end {
            return Err(IceError::Precondition(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        if source.hemisphere() != hemisphere {
            return Err(IceError::Precondition(format!(
                "{} source cannot ingest {} dates",
                source.hemisphere(),
                hemisphere
            )));
        }

        let dates = DateGenerator::new(start, end).generate_date_series();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| IceError::Precondition(format!("failed to build worker pool: {}", e)))?;

        info!(
            hemisphere = %hemisphere,
            product = %source.product(),
            dates = dates.len(),
            workers = self.workers,
            "ingesting"
        );

        let results: Vec<DateResult> = pool.install(|| {
            dates
                .par_iter()
                .map(|date| self.ingest_date(*date, hemisphere, source, overwrite))
                .collect()
        });

        let report = IngestionReport::new(hemisphere, source.product(), results);
        info!(
            hemisphere = %hemisphere,
            product = %source.product(),
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "ingestion finished"
        );

        Ok(report)
    }

    fn ingest_date(
        &self,
        date: NaiveDate,
        hemisphere: Hemisphere,
        source: &dyn GridSource,
        overwrite: bool,
    ) -> DateResult {
        let key = GridKey::new(date, hemisphere, source.product());

        if !overwrite {
            match self.cache.load(&key) {
                Ok(_) => {
                    debug!(date = %date, key = %key, "already cached");
                    return DateResult {
                        date,
                        outcome: DateOutcome::Skipped,
                    };
                }
                Err(IceError::NotFound(_)) => {}
                Err(IceError::CacheCorruption { path, reason }) => {
                    warn!(key = %key, path = %path.display(), %reason, "recomputing corrupt cache artifact");
                }
                Err(e) => {
                    warn!(date = %date, key = %key, error = %e, "cache lookup failed");
                    return DateResult {
                        date,
                        outcome: DateOutcome::Failed(e),
                    };
                }
            }
        }

        let outcome = match source
            .compute(date)
            .and_then(|grid| self.cache.store(&key, &grid))
        {
            Ok(()) => {
                debug!(date = %date, key = %key, "ingested");
                DateOutcome::Succeeded
            }
            Err(e) => {
                warn!(date = %date, hemisphere = %hemisphere, product = %source.product(), error = %e, "ingestion failed");
                DateOutcome::Failed(e)
            }
        };

        DateResult { date, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, Product};
    use ndarray::Array2;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct FakeSource {
        missing: Option<NaiveDate>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(missing: Option<NaiveDate>) -> Self {
            Self {
                missing,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl GridSource for FakeSource {
        fn product(&self) -> Product {
            Product::Polygon
        }

        fn hemisphere(&self) -> Hemisphere {
            Hemisphere::South
        }

        fn compute(&self, date: NaiveDate) -> Result<Grid> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(date) == self.missing {
                return Err(IceError::SourceMissing {
                    path: format!("/data/{}.zip", date).into(),
                });
            }
            Ok(Array2::from_elem((3, 2), 0.8))
        }
    }

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 2, d).unwrap()
    }

    #[test]
    fn test_failed_date_does_not_abort_batch() {
        let dir = tempdir().unwrap();
        let pipeline = IngestionPipeline::new(GridCache::new(dir.path()), 3);
        let source = FakeSource::new(Some(ymd(3)));

        let report = pipeline
            .ingest_range(ymd(1), ymd(5), Hemisphere::South, &source, false)
            .unwrap();

        assert_eq!(report.succeeded(), 4);
        assert_eq!(report.failed(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, ymd(3));
        assert!(matches!(failures[0].1, IceError::SourceMissing { .. }));

        let cached = pipeline
            .cache()
            .cached_dates(Hemisphere::South, Product::Polygon)
            .unwrap();
        assert_eq!(cached, vec![ymd(1), ymd(2), ymd(4), ymd(5)]);
    }

    #[test]
    fn test_rerun_skips_cached_and_retries_failed() {
        let dir = tempdir().unwrap();
        let pipeline = IngestionPipeline::new(GridCache::new(dir.path()), 2);

        let first = FakeSource::new(Some(ymd(3)));
        pipeline
            .ingest_range(ymd(1), ymd(5), Hemisphere::South, &first, false)
            .unwrap();

        let second = FakeSource::new(None);
        let report = pipeline
            .ingest_range(ymd(1), ymd(5), Hemisphere::South, &second, false)
            .unwrap();

        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.skipped(), 4);
        assert_eq!(report.succeeded(), 1);
        assert!(matches!(report.outcome(ymd(3)), Some(DateOutcome::Succeeded)));
    }

    #[test]
    fn test_corrupt_artifact_is_recomputed() {
        let dir = tempdir().unwrap();
        let pipeline = IngestionPipeline::new(GridCache::new(dir.path()), 2);
        let key = GridKey::new(ymd(2), Hemisphere::South, Product::Polygon);
        let path = pipeline.cache().path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"half a tiff").unwrap();

        let source = FakeSource::new(None);
        let report = pipeline
            .ingest_range(ymd(1), ymd(2), Hemisphere::South, &source, false)
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(matches!(report.outcome(ymd(2)), Some(DateOutcome::Succeeded)));
        let grid = pipeline.cache().load(&key).unwrap();
        assert_eq!(grid.dim(), (3, 2));
        assert!(grid.iter().all(|v| *v == 0.8));

        let rerun = pipeline
            .ingest_range(ymd(1), ymd(2), Hemisphere::South, &source, false)
            .unwrap();
        assert_eq!(rerun.skipped(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_overwrite_recomputes_every_date() {
        let dir = tempdir().unwrap();
        let pipeline = IngestionPipeline::new(GridCache::new(dir.path()), 1);
        let source = FakeSource::new(None);

        pipeline
            .ingest_range(ymd(1), ymd(2), Hemisphere::South, &source, false)
            .unwrap();
        let report = pipeline
            .ingest_range(ymd(1), ymd(2), Hemisphere::South, &source, true)
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.skipped(), 0);
    }

    #[test]
    fn test_misconfigured_calls_are_rejected() {
        let dir = tempdir().unwrap();
        let pipeline = IngestionPipeline::new(GridCache::new(dir.path()), 0);
        let source = FakeSource::new(None);

        assert_eq!(pipeline.workers(), 1);
        assert!(matches!(
            pipeline.ingest_range(ymd(5), ymd(1), Hemisphere::South, &source, false),
            Err(IceError::Precondition(_))
        ));
        assert!(matches!(
            pipeline.ingest_range(ymd(1), ymd(5), Hemisphere::North, &source, false),
            Err(IceError::Precondition(_))
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
