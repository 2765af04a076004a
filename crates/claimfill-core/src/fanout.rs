//! Bounded, order-preserving fan-out.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Drive `jobs` with at most `limit` in flight and return their outputs in
/// the order the jobs were given, regardless of completion order.
pub async fn ordered<I, F>(jobs: I, limit: usize) -> Vec<F::Output>
where
    I: IntoIterator<Item = F>,
    F: Future,
{
    stream::iter(jobs).buffered(limit.max(1)).collect().await
}
