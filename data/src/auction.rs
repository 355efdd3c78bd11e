use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single bid as pushed by the feed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// unix timestamp in milliseconds
    pub time: u64,
    pub price: f64,
    pub by: String,
}

impl Bid {
    pub fn new(time: u64, price: f64, by: impl Into<String>) -> Self {
        Self {
            time,
            price,
            by: by.into(),
        }
    }
}

/// Time-ordered bids plus the completion flag.
///
/// Append-only while `done` is false. Once `done` flips, `prices` is expected
/// to be frozen, though a late update simply re-renders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceFeed {
    pub prices: Vec<Bid>,
    pub done: bool,
}

impl PriceFeed {
    pub fn new(prices: Vec<Bid>, done: bool) -> Self {
        Self { prices, done }
    }

    pub fn first(&self) -> Option<&Bid> {
        self.prices.first()
    }

    pub fn last(&self) -> Option<&Bid> {
        self.prices.last()
    }

    pub fn last_price(&self) -> f64 {
        self.last().map_or(0.0, |bid| bid.price)
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn is_time_ordered(&self) -> bool {
        self.prices.windows(2).all(|w| w[0].time <= w[1].time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuctionParameters {
    pub initial_price: f64,
    pub guaranteed_price: f64,
    /// e.g. 0.25 -> 25% of the upside to the guarantor, 75% to the seller
    pub guarantor_seller_split_percent: f64,
    pub auction_length: Duration,
}

impl AuctionParameters {
    pub fn new(
        initial_price: f64,
        guaranteed_price: f64,
        guarantor_seller_split_percent: f64,
        auction_length: Duration,
    ) -> Self {
        Self {
            initial_price,
            guaranteed_price,
            guarantor_seller_split_percent,
            auction_length,
        }
    }

    /// The split fraction clamped into `[0, 1]`.
    pub fn split(&self) -> f64 {
        if self.guarantor_seller_split_percent.is_finite() {
            self.guarantor_seller_split_percent.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn auction_length_ms(&self) -> u64 {
        u64::try_from(self.auction_length.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_feed_reports_zero_last_price() {
        let feed = PriceFeed::default();
        assert!(feed.is_empty());
        assert_eq!(feed.last_price(), 0.0);
        assert!(feed.is_time_ordered());
    }

    #[test]
    fn detects_out_of_order_bids() {
        let feed = PriceFeed::new(
            vec![Bid::new(2_000, 10.0, "a"), Bid::new(1_000, 20.0, "b")],
            false,
        );
        assert!(!feed.is_time_ordered());
    }

    #[test]
    fn split_is_clamped() {
        let mut params = AuctionParameters::new(150.0, 1000.0, 1.4, Duration::from_secs(5));
        assert_eq!(params.split(), 1.0);

        params.guarantor_seller_split_percent = f64::NAN;
        assert_eq!(params.split(), 0.0);
        assert_eq!(params.auction_length_ms(), 5_000);
    }
}
