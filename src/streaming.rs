//! Memory-pressure policy for streaming chapter processing.
//!
//! The tokenizer consults a [`FlushPolicy`] after every word it emits. When
//! the accumulated paragraph grows too long, or the [`MemoryOracle`] reports
//! the heap running low, the paragraph is laid out early and its lines go to
//! the page sink before the paragraph has ended.

use core::cell::Cell;

/// Why a paragraph was laid out before its end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlushReason {
    /// Word count reached `max_words`.
    WordCount,
    /// Free heap below `low_heap_bytes` with at least `min_words` buffered.
    LowHeap,
    /// Free heap below `critical_heap_bytes`.
    CriticalHeap,
}

impl FlushReason {
    /// Whether the flush also emits the final, partial line.
    pub fn includes_last_line(self) -> bool {
        matches!(self, FlushReason::CriticalHeap)
    }
}

/// Flush watermarks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushPolicy {
    /// Words buffered before an unconditional flush.
    pub max_words: usize,
    /// Words required before a low-heap flush.
    pub min_words: usize,
    /// Free heap below which a flush happens once `min_words` are buffered.
    pub low_heap_bytes: usize,
    /// Free heap below which a flush always happens.
    pub critical_heap_bytes: usize,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            max_words: 400,
            min_words: 100,
            low_heap_bytes: 24 * 1024,
            critical_heap_bytes: 12 * 1024,
        }
    }
}

impl FlushPolicy {
    /// Watermarks for embedded targets.
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Watermarks that never trigger on heap; only `max_words` applies.
    pub fn desktop() -> Self {
        Self {
            low_heap_bytes: 0,
            critical_heap_bytes: 0,
            ..Self::default()
        }
    }

    /// Decide whether `words` buffered words must be flushed at `free_heap`.
    pub fn decide(&self, words: usize, free_heap: usize) -> Option<FlushReason> {
        if words == 0 {
            return None;
        }
        if free_heap < self.critical_heap_bytes {
            Some(FlushReason::CriticalHeap)
        } else if words >= self.max_words {
            Some(FlushReason::WordCount)
        } else if free_heap < self.low_heap_bytes && words >= self.min_words {
            Some(FlushReason::LowHeap)
        } else {
            None
        }
    }
}

/// Source of the free-heap reading.
pub trait MemoryOracle {
    /// Bytes of heap currently free.
    fn free_heap_bytes(&self) -> usize;
}

/// Oracle that always reports plenty of memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unbounded;

impl MemoryOracle for Unbounded {
    fn free_heap_bytes(&self) -> usize {
        usize::MAX
    }
}

/// Oracle with a settable reading, for tests and simulation.
#[derive(Debug)]
pub struct SimulatedHeap {
    free: Cell<usize>,
}

impl SimulatedHeap {
    /// Start with `free` bytes available.
    pub fn new(free: usize) -> Self {
        Self {
            free: Cell::new(free),
        }
    }

    /// Change the reported free heap.
    pub fn set_free(&self, free: usize) {
        self.free.set(free);
    }
}

impl MemoryOracle for SimulatedHeap {
    fn free_heap_bytes(&self) -> usize {
        self.free.get()
    }
}

impl<F: Fn() -> usize> MemoryOracle for F {
    fn free_heap_bytes(&self) -> usize {
        self()
    }
}

/// Statistics for streaming operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Total bytes read from source.
    pub bytes_read: usize,
    /// Words emitted into paragraphs.
    pub words: usize,
    /// Lines laid out.
    pub lines: usize,
    /// Pages handed to the sink.
    pub pages: usize,
    /// Flushes caused by word count.
    pub word_count_flushes: usize,
    /// Flushes caused by low heap.
    pub low_heap_flushes: usize,
    /// Flushes caused by critical heap.
    pub critical_heap_flushes: usize,
}

impl StreamingStats {
    /// Count one pressure flush.
    pub fn record_flush(&mut self, reason: FlushReason) {
        match reason {
            FlushReason::WordCount => self.word_count_flushes += 1,
            FlushReason::LowHeap => self.low_heap_flushes += 1,
            FlushReason::CriticalHeap => self.critical_heap_flushes += 1,
        }
    }

    /// Total pressure flushes.
    pub fn total_flushes(&self) -> usize {
        self.word_count_flushes + self.low_heap_flushes + self.critical_heap_flushes
    }
}
