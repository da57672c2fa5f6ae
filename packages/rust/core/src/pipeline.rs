//! Dataset pipeline: table in, enriched table out.
//!
//! Rows are processed strictly one after another: model call, parse, then a
//! fixed pause. Row failures never stop the run. A rejected credential stops
//! further model calls, and the remaining rows get defaults without pacing.
//! Either way the output has one result per input row, in input order.

use std::time::{Duration, Instant};

use gameenrich_shared::{
    Enrichment, EnrichmentResult, EnrichmentStatus, PipelineConfig, Result,
};
use tracing::{error, info, instrument, warn};

use crate::enricher::RowEnricher;
use crate::table::Table;

/// Progress callback for reporting pipeline status.
pub trait PipelineProgress: Send + Sync {
    /// Called before row `index` (1-based) of `total` is processed.
    fn row_started(&self, index: usize, total: usize, title: Option<&str>);
    /// Called once row `index` has a result.
    fn row_finished(&self, index: usize, total: usize, enrichment: &Enrichment);
    /// Called when every row has been processed.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl PipelineProgress for SilentProgress {
    fn row_started(&self, _index: usize, _total: usize, _title: Option<&str>) {}
    fn row_finished(&self, _index: usize, _total: usize, _enrichment: &Enrichment) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Counts of how the rows went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub complete: usize,
    pub partial: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
    /// Why model calls stopped early, if they did.
    pub aborted: Option<String>,
}

impl RunSummary {
    /// Rows that got at least some data from the model.
    pub fn succeeded(&self) -> usize {
        self.complete + self.partial
    }

    fn record(&mut self, status: EnrichmentStatus) {
        match status {
            EnrichmentStatus::Complete => self.complete += 1,
            EnrichmentStatus::Partial => self.partial += 1,
            EnrichmentStatus::Failed => self.failed += 1,
            EnrichmentStatus::Skipped => self.skipped += 1,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// One result per input row, in input order.
    pub results: Vec<EnrichmentResult>,
    pub summary: RunSummary,
}

/// Sequential row processor with a fixed pause between rows.
#[derive(Debug, Clone)]
pub struct DatasetPipeline {
    enricher: RowEnricher,
    pacing: Duration,
}

impl DatasetPipeline {
    /// Build a pipeline. Pacing comes from the config; the enricher carries
    /// the model client and parsing rules.
    pub fn new(enricher: RowEnricher, config: &PipelineConfig) -> Self {
        Self {
            enricher,
            pacing: config.pacing,
        }
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Enrich every row of `table`, in order.
    #[instrument(skip_all, fields(rows = table.len(), model = %self.enricher.model_name()))]
    pub async fn run(&self, table: &Table, progress: &dyn PipelineProgress) -> PipelineOutput {
        let start = Instant::now();
        let total = table.len();
        let mut results = Vec::with_capacity(total);
        let mut summary = RunSummary {
            total,
            ..RunSummary::default()
        };

        info!(total, pacing_ms = self.pacing.as_millis() as u64, "starting enrichment");

        for index in 0..total {
            let title = table.title(index);
            progress.row_started(index + 1, total, title);

            let stopped = summary.aborted.clone();
            let enrichment = match (title, stopped) {
                (None, _) => {
                    warn!(row = index + 1, "row has no game title, skipping model call");
                    Enrichment::skipped()
                }
                (Some(_), Some(reason)) => Enrichment::failed(format!("not attempted: {reason}")),
                (Some(title), None) => {
                    info!(row = index + 1, total, title, "processing");
                    match self.enricher.enrich(title).await {
                        Ok(enrichment) => enrichment,
                        Err(e) => {
                            error!(row = index + 1, error = %e, "stopping model calls");
                            let reason = e.to_string();
                            summary.aborted = Some(reason.clone());
                            Enrichment::failed(reason)
                        }
                    }
                }
            };

            summary.record(enrichment.status);
            progress.row_finished(index + 1, total, &enrichment);
            results.push(enrichment.result);

            if summary.aborted.is_none() && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        summary.elapsed = start.elapsed();
        info!(
            total = summary.total,
            complete = summary.complete,
            partial = summary.partial,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "enrichment complete"
        );
        progress.done(&summary);

        PipelineOutput { results, summary }
    }
}

/// Load `config.input`, enrich it, and write `config.output`.
///
/// Fatal errors (unreadable input, missing `game_title` column) surface
/// before any row is sent; once rows are processed the output is always
/// written.
#[instrument(skip_all, fields(input = %config.input.display(), output = %config.output.display()))]
pub async fn enrich_file(
    pipeline: &DatasetPipeline,
    config: &PipelineConfig,
    progress: &dyn PipelineProgress,
) -> Result<RunSummary> {
    let table = Table::from_path(&config.input, config.delimiter)?;
    let output = pipeline.run(&table, progress).await;
    table.write_enriched(&config.output, &output.results, config.delimiter)?;
    Ok(output.summary)
}
