use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use data::{AuctionParameters, Bid, PriceFeed};

pub const ABOVE_ENDING: [f64; 9] = [200.0, 450.0, 600.0, 620.0, 900.0, 940.0, 1100.0, 1400.0, 1610.0];
pub const BELOW_ENDING: [f64; 6] = [160.0, 450.0, 600.0, 620.0, 800.0, 900.0];

pub const BIDDER: &str = "0x14rPtntr7WEawK0jXHpKcRvFVPDfCkGPt";
pub const BID_INTERVAL: Duration = Duration::from_secs(1);

pub fn parameters() -> AuctionParameters {
    AuctionParameters::new(150.0, 1000.0, 0.2, Duration::from_secs(5))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    AboveEnding,
    BelowEnding,
}

impl Script {
    pub const ALL: [Script; 2] = [Script::AboveEnding, Script::BelowEnding];

    pub fn prices(self) -> &'static [f64] {
        match self {
            Script::AboveEnding => &ABOVE_ENDING,
            Script::BelowEnding => &BELOW_ENDING,
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Script::AboveEnding => write!(f, "Above ending"),
            Script::BelowEnding => write!(f, "Below ending"),
        }
    }
}

/// Simulated bidding: one scripted bid per tick, spread evenly over the
/// auction length, after a zero-priced opening bid.
#[derive(Debug, Clone)]
pub struct DemoFeed {
    script: Script,
    start_ms: u64,
    length_ms: u64,
    feed: PriceFeed,
    remaining: VecDeque<f64>,
}

impl DemoFeed {
    pub fn start(script: Script, now_ms: u64, params: &AuctionParameters) -> Self {
        log::info!("starting demo script '{script}'");

        Self {
            script,
            start_ms: now_ms,
            length_ms: params.auction_length_ms(),
            feed: PriceFeed::new(vec![Bid::new(now_ms, 0.0, "")], false),
            remaining: script.prices().iter().copied().collect(),
        }
    }

    pub fn script(&self) -> Script {
        self.script
    }

    pub fn feed(&self) -> &PriceFeed {
        &self.feed
    }

    pub fn is_running(&self) -> bool {
        !self.remaining.is_empty()
    }

    /// Appends the next scripted bid; `None` once the script is exhausted.
    pub fn tick(&mut self) -> Option<&PriceFeed> {
        let remaining = self.remaining.len();
        let price = self.remaining.pop_front()?;

        let placed = self.feed.prices.len();
        let fraction = placed as f64 / (placed + remaining - 1) as f64;
        let time = self.start_ms + (fraction * self.length_ms as f64) as u64;

        self.feed.prices.push(Bid::new(time, price, BIDDER));
        self.feed.done = self.remaining.is_empty();

        if self.feed.done {
            log::info!("demo script '{}' finished at {price}", self.script);
        }
        Some(&self.feed)
    }
}
