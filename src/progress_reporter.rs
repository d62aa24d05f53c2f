use std::sync::Arc;
use std::time::Duration;

use circular_buffer::CircularBuffer;

use indicatif::{MultiProgress, ProgressBar, ProgressState, ProgressStyle};

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::shared_types::ByteCount;

const UPDATE_INTERVAL: Duration = Duration::from_millis(500);

type ProgressPoint = (ByteCount, Instant);

pub(crate) struct ProgressReporter {
    rx_position: mpsc::Receiver<ByteCount>,
    total_size: Option<ByteCount>,
    multi_progress: MultiProgress,
}

impl ProgressReporter {
    pub(crate) fn new(
        rx_position: mpsc::Receiver<ByteCount>,
        total_size: Option<ByteCount>,
        multi_progress: MultiProgress,
    ) -> Self {
        Self {
            rx_position,
            total_size,
            multi_progress,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        spawn_progress_reporter(self.total_size, self.rx_position, self.multi_progress)
    }
}

fn format_speed(bytes_per_sec: f64) -> String {
    let (unit, speed) = if bytes_per_sec > 1024.0 * 1024.0 {
        ("MB/s", bytes_per_sec / (1024.0 * 1024.0))
    } else {
        ("kB/s", bytes_per_sec / 1024.0)
    };
    format!("{:.1} {}", speed, unit)
}

/// Tracks bytes read from the source.
///
/// Each message on `rx_position` is the cumulative byte count, so a dropped
/// update only delays the bar instead of skewing it.
pub(crate) fn spawn_progress_reporter(
    total_size: Option<ByteCount>,
    mut rx_position: mpsc::Receiver<ByteCount>,
    multi: MultiProgress,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let progress_q = Arc::new(RwLock::new(CircularBuffer::<50, ProgressPoint>::new()));
        let pb = total_size.map_or_else(ProgressBar::new_spinner, ProgressBar::new);
        let pb = multi.add(pb);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta}) ({msg})",
        ) {
            pb.set_style(
                style
                    .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                        write!(w, "{:.1}s", state.eta().as_secs_f64()).ok();
                    })
                    .progress_chars("#>-"),
            );
        }

        // Refresh the throughput readout until the bar is finished.
        {
            let progress_q = progress_q.clone();
            let pb = pb.clone();
            tokio::spawn(async move {
                while !pb.is_finished() {
                    tokio::time::sleep(UPDATE_INTERVAL).await;
                    let q = progress_q.read().await;
                    if let (
                        Some((latest_byte, latest_instant)),
                        Some((oldest_byte, oldest_instant)),
                    ) = (q.back(), q.front())
                    {
                        if latest_byte == oldest_byte {
                            continue;
                        }
                        let speed = (latest_byte - oldest_byte) as f64
                            / latest_instant.duration_since(*oldest_instant).as_secs_f64();
                        pb.set_message(format_speed(speed));
                    }
                }
            });
        }

        let mut position = 0;
        while let Some(latest) = rx_position.recv().await {
            position = latest;
            pb.set_position(position);
            let mut q = progress_q.write().await;
            q.push_back((position, Instant::now()));
        }
        let speed = position as f64 / pb.elapsed().as_secs_f64();
        pb.finish_with_message(format_speed(speed));
    })
}
