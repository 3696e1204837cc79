/*!
 * Batch partitioning.
 *
 * Splits the queue of pending segments into contiguous, order-preserving
 * batches. No filtering happens here: callers pass only segments that
 * need translation.
 */

use crate::segment::Segment;

/// Split `segments` into batches of `batch_size`, the last one possibly shorter.
///
/// A `batch_size` of zero is treated as one so the partition is always defined.
pub fn build_batches(segments: &[Segment], batch_size: usize) -> Vec<Vec<Segment>> {
    let size = batch_size.max(1);
    segments.chunks(size).map(<[Segment]>::to_vec).collect()
}
