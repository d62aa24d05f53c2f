use tokio::{sync::mpsc, task::JoinHandle};

use crate::chunk_source::Chunk;
use crate::codec::{parse_address, parse_address_checked, ParseError};
use crate::config::PipelineConfig;
use crate::error::CountError;
use crate::shared_types::{Address, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Idle,
    Filling,
    Parsing,
}

/// Buffers owned by one worker for the whole run.
///
/// A slot is moved, never shared: ready queue -> dispatcher -> worker ->
/// aggregator -> ready queue. Whoever holds it may touch its buffers.
#[derive(Debug)]
pub(crate) struct WorkerSlot {
    pub(crate) id: WorkerId,
    state: SlotState,
    pub(crate) chunk: Chunk,
    batch: Vec<Address>,
}

pub(crate) enum ParseUpdate {
    Batch(WorkerSlot),
    Failed(CountError),
}

impl WorkerSlot {
    pub(crate) fn new(id: WorkerId, config: &PipelineConfig) -> Self {
        Self {
            id,
            state: SlotState::Idle,
            chunk: Chunk::with_capacity(config.chunk_size),
            batch: Vec::with_capacity(config.batch_capacity()),
        }
    }

    pub(crate) fn state(&self) -> SlotState {
        self.state
    }

    pub(crate) fn batch(&self) -> &[Address] {
        &self.batch
    }

    pub(crate) fn begin_fill(&mut self) {
        debug_assert_eq!(self.state, SlotState::Idle, "slot {} refilled early", self.id);
        debug_assert!(self.batch.is_empty());
        self.state = SlotState::Filling;
    }

    pub(crate) fn begin_parse(&mut self) {
        debug_assert_eq!(self.state, SlotState::Filling);
        self.state = SlotState::Parsing;
    }

    /// Called once the batch has been merged; the slot may be refilled after this.
    pub(crate) fn release(&mut self) {
        self.batch.clear();
        self.state = SlotState::Idle;
    }

    /// Parses every record of the current chunk into the batch.
    pub(crate) fn parse(&mut self, strict: bool) -> Result<(), ParseError> {
        debug_assert_eq!(self.state, SlotState::Parsing);
        let records = self.chunk.records();
        let end = records.len();
        let mut index = 0;
        if strict {
            while index < end {
                let (next, address) = parse_address_checked(records, index)?;
                self.batch.push(address);
                index = next;
            }
        } else {
            while index < end {
                let (next, address) = parse_address(records, index);
                self.batch.push(address);
                index = next;
            }
        }
        Ok(())
    }
}

pub(crate) fn spawn_parse_worker(
    id: WorkerId,
    mut r_jobs: mpsc::Receiver<WorkerSlot>,
    s_updates: mpsc::Sender<ParseUpdate>,
    strict: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(mut slot) = r_jobs.recv().await {
            debug_assert_eq!(slot.id, id);
            let parsed = tokio::task::spawn_blocking(move || {
                let result = slot.parse(strict);
                (slot, result)
            })
            .await;

            let update = match parsed {
                Ok((slot, Ok(()))) => ParseUpdate::Batch(slot),
                Ok((_, Err(e))) => ParseUpdate::Failed(e.into()),
                Err(e) => ParseUpdate::Failed(e.into()),
            };
            if s_updates.send(update).await.is_err() {
                break;
            }
        }
        debug!("stopping parse worker {id}");
    })
}
