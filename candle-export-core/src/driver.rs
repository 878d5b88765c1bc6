//! Run orchestrator: exports every configured (instrument, granularity) pair in order.

use crate::config::ExportConfig;
use crate::data::CandleProvider;
use crate::export::{export_pair, ExportError, ExportOptions, PairSummary};
use crate::progress::ExportObserver;

/// Export every pair, instruments outer and granularities inner, one at a time.
///
/// Fetch problems are absorbed per chunk; an output error stops the run.
pub fn run_export(
    provider: &dyn CandleProvider,
    config: &ExportConfig,
    options: &ExportOptions,
    observer: &dyn ExportObserver,
) -> Result<RunSummary, ExportError> {
    observer.on_run_start(provider.name(), config.pair_count());

    let mut pairs = Vec::with_capacity(config.pair_count());
    for instrument in &config.instruments {
        for granularity in &config.granularities {
            pairs.push(export_pair(
                provider,
                instrument,
                granularity,
                config,
                options,
                observer,
            )?);
        }
    }

    let summary = RunSummary { pairs };
    observer.on_run_complete(&summary);
    Ok(summary)
}

/// Summary of a whole export run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSummary {
    pub pairs: Vec<PairSummary>,
}

impl RunSummary {
    pub fn files_written(&self) -> usize {
        self.pairs.iter().filter(|p| p.output.is_some()).count()
    }

    pub fn empty_pairs(&self) -> usize {
        self.pairs.iter().filter(|p| p.output.is_none()).count()
    }

    pub fn chunks_skipped(&self) -> usize {
        self.pairs.iter().map(|p| p.chunks_skipped).sum()
    }

    pub fn rows_written(&self) -> usize {
        self.pairs.iter().map(|p| p.rows).sum()
    }
}
