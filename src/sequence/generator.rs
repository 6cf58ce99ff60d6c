use std::collections::VecDeque;
use std::sync::Arc;

use rayon::prelude::*;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{WavecastError, WavecastResult};
use crate::render::frame::Frame;
use crate::render::{FrameCompositor, FrameRing};
use crate::sequence::context::EpisodeContext;

/// Frame-level parallelism of the generator.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderThreading {
    /// Render chunks of frames on a rayon pool.
    pub parallel: bool,
    /// Frames rendered ahead per parallel chunk.
    pub chunk_size: usize,
    /// Worker count; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

/// Lazy, ordered, single-pass stream of the frames of one episode.
///
/// Frames are yielded in strictly increasing index order, each with the fade envelope applied.
/// With [`RenderThreading::parallel`] the generator renders whole chunks ahead on a thread pool
/// and hands them out in order; otherwise one frame is rendered per pull. Dropping the generator
/// stops all work.
pub struct FrameSequenceGenerator {
    ctx: Arc<EpisodeContext>,
    compositor: FrameCompositor,
    pool: Option<rayon::ThreadPool>,
    chunk_size: u64,
    next: u64,
    ahead: VecDeque<(FrameIndex, WavecastResult<Frame>)>,
    ring: FrameRing,
    failed: bool,
}

impl std::fmt::Debug for FrameSequenceGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSequenceGenerator")
            .field("next", &self.next)
            .field("frame_count", &self.ctx.frame_count())
            .field("parallel", &self.pool.is_some())
            .finish()
    }
}

impl FrameSequenceGenerator {
    /// Generator over every frame of `ctx`, keeping the last `ring_capacity` frames.
    pub fn new(
        ctx: Arc<EpisodeContext>,
        threading: &RenderThreading,
        ring_capacity: usize,
    ) -> WavecastResult<Self> {
        let pool = if threading.parallel {
            Some(build_thread_pool(threading.threads)?)
        } else {
            None
        };
        Ok(Self {
            compositor: ctx.compositor(),
            ctx,
            pool,
            chunk_size: normalized_chunk_size(threading.chunk_size),
            next: 0,
            ahead: VecDeque::new(),
            ring: FrameRing::new(ring_capacity),
            failed: false,
        })
    }

    /// The episode being rendered.
    pub fn context(&self) -> &Arc<EpisodeContext> {
        &self.ctx
    }

    /// Index of the next frame [`Iterator::next`] yields.
    pub fn position(&self) -> FrameIndex {
        FrameIndex(self.next)
    }

    /// Frames not yet yielded.
    pub fn remaining(&self) -> u64 {
        if self.failed {
            return 0;
        }
        self.ctx.frame_count().saturating_sub(self.next)
    }

    /// Frame `idx`, served from the ring when it was produced recently.
    ///
    /// A future index advances the stream up to and including `idx`; the skipped frames still
    /// pass through the ring. An index that was already evicted cannot be produced again.
    pub fn frame_at(&mut self, idx: FrameIndex) -> WavecastResult<Arc<Frame>> {
        if let Some(frame) = self.ring.get(idx) {
            return Ok(frame);
        }
        if idx.0 < self.next {
            return Err(WavecastError::render(format!(
                "frame {} was evicted (oldest retained: {:?})",
                idx.0,
                self.ring.oldest().map(|i| i.0)
            )));
        }
        if idx.0 >= self.ctx.frame_count() {
            return Err(WavecastError::render(format!(
                "frame {} is outside the episode ({} frames)",
                idx.0,
                self.ctx.frame_count()
            )));
        }
        loop {
            match self.next() {
                Some(Ok((i, frame))) if i == idx => return Ok(frame),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(WavecastError::render(format!(
                        "stream ended before frame {}",
                        idx.0
                    )));
                }
            }
        }
    }

    fn fill_ahead(&mut self) {
        let total = self.ctx.frame_count();
        let start = self.next;
        let Some(pool) = self.pool.as_ref() else {
            let frame = self.ctx.render_frame(&mut self.compositor, FrameIndex(start));
            self.ahead.push_back((FrameIndex(start), frame));
            return;
        };

        let end = (start + self.chunk_size).min(total);
        let ctx = &self.ctx;
        let indices: Vec<u64> = (start..end).collect();
        let rendered = pool.install(|| {
            indices
                .par_iter()
                .map_init(
                    || ctx.compositor(),
                    |worker, &i| ctx.render_frame(worker, FrameIndex(i)),
                )
                .collect::<Vec<_>>()
        });
        tracing::trace!(start, end, "rendered chunk");
        self.ahead.extend(
            indices
                .into_iter()
                .map(FrameIndex)
                .zip(rendered),
        );
    }
}

impl Iterator for FrameSequenceGenerator {
    type Item = WavecastResult<(FrameIndex, Arc<Frame>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.ctx.frame_count() {
            return None;
        }
        if self.ahead.is_empty() {
            self.fill_ahead();
        }
        let (idx, result) = self.ahead.pop_front()?;
        match result {
            Ok(frame) => {
                let frame = Arc::new(frame);
                self.ring.push(idx, frame.clone());
                self.next = idx.0 + 1;
                Some(Ok((idx, frame)))
            }
            Err(e) => {
                tracing::warn!(frame = idx.0, error = %e, "frame generation failed");
                self.failed = true;
                self.ahead.clear();
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (0, Some(n))
    }
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> WavecastResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(WavecastError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| WavecastError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/generator.rs"]
mod tests;
