use tokio::{sync::mpsc, task::JoinHandle};

use crate::bitset::AddressSet;
use crate::error::CountError;
use crate::worker::{ParseUpdate, SlotState, WorkerSlot};

pub(crate) struct Aggregate {
    pub(crate) set: AddressSet,
    pub(crate) batches: u64,
    pub(crate) records: u64,
}

/// The only task that writes to the address set.
///
/// Batches are merged in arrival order, which may differ from dispatch order.
/// After each merge the slot goes back on the ready queue; once the
/// dispatcher has stopped listening the slot is simply retired.
pub(crate) fn spawn_aggregator(
    mut r_updates: mpsc::Receiver<ParseUpdate>,
    s_ready: async_channel::Sender<WorkerSlot>,
) -> JoinHandle<Result<Aggregate, CountError>> {
    tokio::spawn(async move {
        let mut set = AddressSet::new();
        let mut batches = 0;
        let mut records = 0;

        while let Some(update) = r_updates.recv().await {
            match update {
                ParseUpdate::Batch(mut slot) => {
                    debug_assert_eq!(slot.state(), SlotState::Parsing);
                    set.extend(slot.batch());
                    debug_assert!(slot.batch().iter().all(|&a| set.contains(a)));
                    batches += 1;
                    records += slot.batch().len() as u64;
                    slot.release();
                    s_ready.send(slot).await.ok();
                }
                ParseUpdate::Failed(e) => {
                    error!("aborting aggregation: {e}");
                    return Err(e);
                }
            }
        }

        debug!("merged {records} records from {batches} batches");
        Ok(Aggregate {
            set,
            batches,
            records,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_source::ChunkSource;
    use crate::codec::{ParseError, ParseErrorKind};
    use crate::config::PipelineConfig;
    use crate::test_utils::render_records;

    async fn parsed_slot(id: usize, addresses: &[u32]) -> WorkerSlot {
        let input = render_records(addresses);
        let mut slot = WorkerSlot::new(id, &PipelineConfig::default());
        slot.begin_fill();
        ChunkSource::new(&input[..])
            .next_chunk(&mut slot.chunk)
            .await
            .unwrap();
        slot.begin_parse();
        slot.parse(false).unwrap();
        slot
    }

    #[tokio::test]
    async fn merges_batches_and_recycles_slots() {
        let (s_updates, r_updates) = mpsc::channel(2);
        let (s_ready, r_ready) = async_channel::bounded(2);
        let handle = spawn_aggregator(r_updates, s_ready);

        // Worker 1 finishes before worker 0.
        let second = parsed_slot(1, &[0x0202_0202, 0x0303_0303]).await;
        let first = parsed_slot(0, &[0x0101_0101, 0x0101_0101, 0x0202_0202]).await;
        s_updates.send(ParseUpdate::Batch(second)).await.ok();
        s_updates.send(ParseUpdate::Batch(first)).await.ok();

        let recycled = r_ready.recv().await.unwrap();
        assert_eq!(recycled.id, 1);
        assert_eq!(recycled.state(), SlotState::Idle);
        assert!(recycled.batch().is_empty());
        assert_eq!(r_ready.recv().await.unwrap().id, 0);

        drop(s_updates);
        let aggregate = handle.await.unwrap().unwrap();
        assert_eq!(aggregate.batches, 2);
        assert_eq!(aggregate.records, 5);
        assert_eq!(aggregate.set.count(), 3);
        assert!(aggregate.set.contains(0x0303_0303));
    }

    #[tokio::test]
    async fn retires_slots_after_dispatch_ends() {
        let (s_updates, r_updates) = mpsc::channel(1);
        let (s_ready, r_ready) = async_channel::bounded(1);
        drop(r_ready);
        let handle = spawn_aggregator(r_updates, s_ready);

        s_updates
            .send(ParseUpdate::Batch(parsed_slot(0, &[7]).await))
            .await
            .ok();
        drop(s_updates);
        let aggregate = handle.await.unwrap().unwrap();
        assert_eq!(aggregate.set.count(), 1);
    }

    #[tokio::test]
    async fn first_failure_ends_aggregation() {
        let (s_updates, r_updates) = mpsc::channel(1);
        let (s_ready, _r_ready) = async_channel::bounded(1);
        let handle = spawn_aggregator(r_updates, s_ready);

        let failure = ParseError {
            offset: 3,
            kind: ParseErrorKind::EmptyOctet,
        };
        s_updates
            .send(ParseUpdate::Failed(failure.into()))
            .await
            .ok();
        assert!(matches!(
            handle.await.unwrap(),
            Err(CountError::Parse(e)) if e == failure
        ));
    }
}
