use std::path::Path;

use futures::future;
use indicatif::MultiProgress;
use tokio::fs::File;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use crate::aggregator::spawn_aggregator;
use crate::chunk_source::ChunkSource;
use crate::config::PipelineConfig;
use crate::dispatcher::Dispatcher;
use crate::error::CountError;
use crate::progress_reporter::ProgressReporter;
use crate::shared_types::ByteCount;
use crate::worker::{spawn_parse_worker, ParseUpdate, WorkerSlot};

const PROGRESS_QUEUE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CountSummary {
    pub(crate) unique: u64,
    pub(crate) records: u64,
    pub(crate) chunks: u64,
    pub(crate) bytes: ByteCount,
}

/// Counts the distinct addresses in `path`, optionally drawing a progress bar.
pub(crate) async fn count_file(
    path: &Path,
    config: PipelineConfig,
    multi: Option<MultiProgress>,
) -> Result<CountSummary, CountError> {
    let open_failed = |source| CountError::SourceOpen {
        path: path.to_owned(),
        source,
    };
    let file = File::open(path).await.map_err(open_failed)?;
    let size = file.metadata().await.map_err(open_failed)?.len();
    debug!("counting {} ({size} bytes)", path.display());

    let (s_progress, reporter) = match multi {
        Some(multi) => {
            let (s_progress, r_progress) = mpsc::channel(PROGRESS_QUEUE_LEN);
            let reporter = ProgressReporter::new(r_progress, Some(size), multi).spawn();
            (Some(s_progress), Some(reporter))
        }
        None => (None, None),
    };

    let summary = count_unique(file, config, s_progress).await;
    if let Some(reporter) = reporter {
        reporter.await.ok();
    }
    summary
}

/// Runs the full pipeline over `reader`:
/// dispatcher -> per-worker job queue -> parse worker -> aggregator -> ready queue.
pub(crate) async fn count_unique<R>(
    reader: R,
    config: PipelineConfig,
    s_progress: Option<mpsc::Sender<ByteCount>>,
) -> Result<CountSummary, CountError>
where
    R: AsyncRead + Unpin,
{
    config.validate()?;
    debug!(
        "counting with {} workers and {} byte chunks",
        config.workers, config.chunk_size
    );

    let (s_ready, r_ready) = async_channel::bounded::<WorkerSlot>(config.workers);
    let (s_updates, r_updates) = mpsc::channel::<ParseUpdate>(config.workers);

    for id in 0..config.workers {
        s_ready
            .try_send(WorkerSlot::new(id, &config))
            .expect("ready queue holds every worker slot");
    }

    let mut worker_handles = vec![];
    let mut s_jobs = vec![];
    for id in 0..config.workers {
        let (s_job, r_job) = mpsc::channel::<WorkerSlot>(1);
        s_jobs.push(s_job);
        worker_handles.push(spawn_parse_worker(
            id,
            r_job,
            s_updates.clone(),
            config.strict,
        ));
    }
    drop(s_updates);

    let aggregator = spawn_aggregator(r_updates, s_ready);

    let dispatcher = Dispatcher::new(ChunkSource::new(reader), r_ready, s_jobs, s_progress);
    let dispatched = match dispatcher.run().await {
        Ok(stats) => stats,
        Err(e) => {
            error!("aborting pipeline: {e}");
            for handle in &worker_handles {
                handle.abort();
            }
            aggregator.abort();
            return Err(e);
        }
    };

    for joined in future::join_all(worker_handles).await {
        joined?;
    }
    let aggregate = aggregator.await??;
    debug!(
        "dispatched {} chunks, merged {} batches",
        dispatched.chunks, aggregate.batches
    );

    let set = aggregate.set;
    let unique = tokio::task::spawn_blocking(move || set.count()).await?;

    Ok(CountSummary {
        unique,
        records: aggregate.records,
        chunks: dispatched.chunks,
        bytes: dispatched.bytes,
    })
}
