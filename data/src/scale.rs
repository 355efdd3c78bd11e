use crate::auction::{AuctionParameters, PriceFeed};
use crate::geometry::{Margin, Rect, Size};

/// Headroom above the guaranteed price kept in the price domain.
pub const PRICE_HEADROOM: f64 = 1.3;

/// Affine map from a numeric domain onto a pixel range.
///
/// Values outside the domain extrapolate. A degenerate domain maps every
/// value onto the middle of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = (f64::from(self.range.0), f64::from(self.range.1));

        let span = d1 - d0;
        let t = if span == 0.0 || !span.is_finite() {
            0.5
        } else {
            (value - d0) / span
        };

        (r0 + t * (r1 - r0)) as f32
    }
}

pub fn max_price(guaranteed_price: f64, last_price: f64) -> f64 {
    (guaranteed_price * PRICE_HEADROOM).max(last_price)
}

/// Time and price scales for one render of the visualizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub x: LinearScale,
    pub y: LinearScale,
    pub max_price: f64,
    pub time_range: (u64, u64),
    pub plot: Rect,
}

impl Scales {
    /// Time domain spans `[first bid, first bid + auction length]`, price
    /// domain spans `[0, max(guaranteed * 1.3, last price)]`.
    pub fn derive(params: &AuctionParameters, feed: &PriceFeed, size: Size, margin: Margin) -> Self {
        let start = feed.first().map_or(0, |bid| bid.time);
        let end = start.saturating_add(params.auction_length_ms());
        let max_price = max_price(params.guaranteed_price, feed.last_price());

        let x = LinearScale::new(
            (start as f64, end as f64),
            (margin.left, size.width - margin.right),
        );
        let y = LinearScale::new(
            (0.0, max_price),
            (size.height - margin.bottom, margin.top),
        );

        Self {
            x,
            y,
            max_price,
            time_range: (start, end),
            plot: margin.inner(size),
        }
    }

    pub fn time_to_x(&self, time: u64) -> f32 {
        self.x.map(time as f64)
    }

    pub fn price_to_y(&self, price: f64) -> f32 {
        self.y.map(price)
    }
}
