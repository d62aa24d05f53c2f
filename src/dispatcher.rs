use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use crate::chunk_source::ChunkSource;
use crate::error::CountError;
use crate::shared_types::ByteCount;
use crate::worker::WorkerSlot;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DispatchStats {
    pub(crate) chunks: u64,
    pub(crate) bytes: ByteCount,
}

/// Drives the chunk source, filling whichever worker slot comes back idle.
pub(crate) struct Dispatcher<R> {
    source: ChunkSource<R>,
    r_ready: async_channel::Receiver<WorkerSlot>,
    s_jobs: Vec<mpsc::Sender<WorkerSlot>>,
    s_progress: Option<mpsc::Sender<ByteCount>>,
}

impl<R: AsyncRead + Unpin> Dispatcher<R> {
    pub(crate) fn new(
        source: ChunkSource<R>,
        r_ready: async_channel::Receiver<WorkerSlot>,
        s_jobs: Vec<mpsc::Sender<WorkerSlot>>,
        s_progress: Option<mpsc::Sender<ByteCount>>,
    ) -> Self {
        Self {
            source,
            r_ready,
            s_jobs,
            s_progress,
        }
    }

    /// Runs until the source is exhausted, then drops every job sender so the
    /// workers wind down once their last chunk is parsed.
    pub(crate) async fn run(mut self) -> Result<DispatchStats, CountError> {
        let mut stats = DispatchStats::default();

        while let Ok(mut slot) = self.r_ready.recv().await {
            slot.begin_fill();
            let fill = self.source.next_chunk(&mut slot.chunk).await?;
            stats.bytes = self.source.bytes_read();
            if let Some(s_progress) = &self.s_progress {
                s_progress.try_send(stats.bytes).ok();
            }

            if fill.len > 0 {
                slot.begin_parse();
                let id = slot.id;
                if self.s_jobs[id].send(slot).await.is_err() {
                    debug!("worker {id} hung up, stopping dispatch");
                    return Ok(stats);
                }
                stats.chunks += 1;
            }

            if !fill.more {
                debug!(
                    "source exhausted after {} bytes in {} chunks",
                    stats.bytes, stats.chunks
                );
                return Ok(stats);
            }
        }

        debug!("ready queue closed before the source was exhausted");
        Ok(stats)
    }
}
