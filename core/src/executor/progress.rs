use async_trait::async_trait;

use super::types::SpecialistCategory;

/// Inclusive percentage range a pipeline stage reports within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBand {
    pub start: u8,
    pub end: u8,
}

impl StageBand {
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }
}

pub const RETRIEVAL_BAND: StageBand = StageBand::new(5, 20);
pub const EXPERT_BAND: StageBand = StageBand::new(20, 50);
pub const COUNSEL_BAND: StageBand = StageBand::new(50, 80);
pub const COMPILATION_BAND: StageBand = StageBand::new(80, 95);

/// Only `complete` ever reports this value.
pub const PROGRESS_COMPLETE: u8 = 100;

pub fn band_for(category: SpecialistCategory) -> StageBand {
    match category {
        SpecialistCategory::Expert => EXPERT_BAND,
        SpecialistCategory::Counsel => COUNSEL_BAND,
    }
}

/// Checkpoints for a batch of `count` items spread evenly over `[start, end]`.
///
/// One checkpoint per item start, then `end` once the batch is joined:
/// `band_increments(2, 50, 80) == [50, 65, 80]`. Empty batches report nothing.
pub fn band_increments(count: usize, start: u8, end: u8) -> Vec<u8> {
    if count == 0 {
        return Vec::new();
    }
    let end = end.max(start);
    let width = (end - start) as usize;

    let mut points: Vec<u8> = (0..count)
        .map(|i| start + (i * width / count) as u8)
        .collect();
    points.push(end);
    points
}

/// Receives stage transitions from a running orchestration.
///
/// Sinks never fail the run: an implementation that cannot record progress logs and moves on.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, stage: &str, percent: u8);
}

/// Discards all progress. Used by synchronous callers and tests.
pub struct NoopProgress;

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn report(&self, _stage: &str, _percent: u8) {}
}
