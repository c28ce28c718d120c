//! Fee quote memoisation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

use ticketbooth_core::pricing::{FeeCalculator, FeeQuote, FeeRequest};

use crate::cache::TtlCache;

/// Shared cache of fee quotes keyed by request.
pub type FeeCache = TtlCache<FeeRequest, FeeQuote>;

/// Wraps a [`FeeCalculator`] and memoises its quotes in an injected cache.
///
/// Several sessions can share one cache by cloning the `Arc`.
pub struct CachingFeeCalculator<F> {
    inner: F,
    cache: Arc<FeeCache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Hit/miss counters since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeCacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl<F: FeeCalculator> CachingFeeCalculator<F> {
    pub fn new(inner: F, cache: Arc<FeeCache>) -> Self {
        CachingFeeCalculator {
            inner,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &Arc<FeeCache> {
        &self.cache
    }

    pub fn stats(&self) -> FeeCacheStats {
        FeeCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<F: FeeCalculator> FeeCalculator for CachingFeeCalculator<F> {
    fn quote(&self, request: &FeeRequest) -> FeeQuote {
        if let Some(quote) = self.cache.get(request) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return quote;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let quote = self.inner.quote(request);
        trace!(amount = %request.amount, fee = %quote.stripe_fee, "Fee quote cached");
        self.cache.insert(*request, quote);
        quote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use ticketbooth_core::pricing::CardRateFeeCalculator;
    use ticketbooth_core::Money;

    fn request(cents: i64) -> FeeRequest {
        FeeRequest {
            amount: Money::from_cents(cents),
            is_platform_fee: false,
            include_stripe_fees: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_quotes_hit_cache() {
        let cache = Arc::new(FeeCache::new(16, Duration::from_secs(300)));
        let fees = CachingFeeCalculator::new(CardRateFeeCalculator::default(), cache.clone());

        assert_eq!(fees.quote(&request(10_000)).stripe_fee.cents(), 320);
        assert_eq!(fees.quote(&request(10_000)).stripe_fee.cents(), 320);
        assert_eq!(fees.quote(&request(5_000)).stripe_fee.cents(), 175);

        assert_eq!(fees.stats(), FeeCacheStats { hits: 1, misses: 2 });
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_quote_is_recomputed() {
        let cache = Arc::new(FeeCache::new(16, Duration::from_secs(300)));
        let fees = CachingFeeCalculator::new(CardRateFeeCalculator::default(), cache);

        fees.quote(&request(10_000));
        tokio::time::advance(Duration::from_secs(301)).await;
        fees.quote(&request(10_000));

        assert_eq!(fees.stats(), FeeCacheStats { hits: 0, misses: 2 });
    }
}
