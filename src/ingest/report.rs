use chrono::NaiveDate;
use std::fmt;

use crate::error::IceError;
use crate::grid::{Hemisphere, Product};

/// What happened to one date of a batch.
#[derive(Debug)]
pub enum DateOutcome {
    Succeeded,
    /// Already cached, nothing done.
    Skipped,
    Failed(IceError),
}

impl DateOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DateOutcome::Succeeded => "ok",
            DateOutcome::Skipped => "cached",
            DateOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Debug)]
pub struct DateResult {
    pub date: NaiveDate,
    pub outcome: DateOutcome,
}

/// Per-date outcomes of one ingestion batch, ordered by date.
#[derive(Debug)]
pub struct IngestionReport {
    pub hemisphere: Hemisphere,
    pub product: Product,
    results: Vec<DateResult>,
}

impl IngestionReport {
    pub fn new(hemisphere: Hemisphere, product: Product, mut results: Vec<DateResult>) -> Self {
        results.sort_by_key(|r| r.date);
        Self {
            hemisphere,
            product,
            results,
        }
    }

    pub fn results(&self) -> &[DateResult] {
        &self.results
    }

    pub fn outcome(&self, date: NaiveDate) -> Option<&DateOutcome> {
        self.results
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.results[i].outcome)
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, DateOutcome::Succeeded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DateOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DateOutcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (NaiveDate, &IceError)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            DateOutcome::Failed(e) => Some((r.date, e)),
            _ => None,
        })
    }

    /// Dates that now have a cache entry.
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        self.results
            .iter()
            .filter(|r| !matches!(r.outcome, DateOutcome::Failed(_)))
            .map(|r| r.date)
            .collect()
    }

    fn count(&self, pred: impl Fn(&DateOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for IngestionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} ingestion: {} ok, {} cached, {} failed",
            self.hemisphere,
            self.product,
            self.succeeded(),
            self.skipped(),
            self.failed()
        )?;
        writeln!(f, "{:<12} {:<8} cause", "date", "outcome")?;
        for result in &self.results {
            let cause = match &result.outcome {
                DateOutcome::Failed(e) => e.to_string(),
                _ => String::new(),
            };
            writeln!(
                f,
                "{:<12} {:<8} {}",
                result.date.format("%Y-%m-%d"),
                result.outcome.label(),
                cause
            )?;
        }
        Ok(())
    }
}
