//! Profit split between the guarantor and the consignor once bidding stops.
//!
//! The guarantor's share is `max(0, last - guarantee) * split / last` of the
//! final price. When bidding ends at or below the guarantee the guarantor is
//! deemed to buy the asset at the guaranteed price and the consignor takes the
//! whole settlement height.

use crate::format::{CurrencyFormat, format_percent};

/// Width of both stacked bars, in pixels.
pub const BAR_WIDTH: f32 = 110.0;
/// Inset applied around each bar, in pixels.
pub const BAR_PADDING: f32 = 5.0;

pub const ENDED_BELOW_MESSAGE: [&str; 2] = ["Guarantor", "Buys NFT"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub last_price: f64,
    pub guaranteed_price: f64,
    pub split: f64,
    pub ended_below: bool,
    /// fraction of the settlement height given to the guarantor block, in `[0, 1]`
    pub split_offset: f64,
    pub guarantor_amount: f64,
    pub seller_amount: f64,
}

impl Settlement {
    pub fn compute(last_price: f64, guaranteed_price: f64, split: f64) -> Self {
        let ended_below = last_price <= guaranteed_price || last_price <= 0.0;

        let split_offset = if ended_below {
            0.0
        } else {
            ((last_price - guaranteed_price).max(0.0) * split / last_price).clamp(0.0, 1.0)
        };

        let guarantor_amount = split_offset * last_price;
        let seller_amount = guaranteed_price.max(last_price * (1.0 - split_offset));

        Self {
            last_price,
            guaranteed_price,
            split,
            ended_below,
            split_offset,
            guarantor_amount,
            seller_amount,
        }
    }

    /// The price the asset settles at: the guarantee when bidding fell short.
    pub fn final_price(&self) -> f64 {
        self.last_price.max(self.guaranteed_price)
    }

    pub fn message(&self) -> Option<[&'static str; 2]> {
        self.ended_below.then_some(ENDED_BELOW_MESSAGE)
    }

    /// Stacked bar geometry for a block `height` pixels tall.
    pub fn layout(&self, height: f32) -> BarLayout {
        let offset = self.split_offset as f32;
        let guarantor_share = height * offset;

        let guarantor = Bar {
            y: BAR_PADDING,
            height: (guarantor_share - BAR_PADDING * 2.0).max(0.0),
        };

        let consignor = if self.ended_below {
            Bar {
                y: BAR_PADDING,
                height: (height - BAR_PADDING * 2.0).max(0.0),
            }
        } else {
            Bar {
                y: guarantor_share + BAR_PADDING,
                height: (height * (1.0 - offset) - BAR_PADDING * 2.0).max(0.0),
            }
        };

        let above_floor = if self.last_price > 0.0 {
            let upside = (self.last_price - self.guaranteed_price) / self.last_price;
            ((upside - self.split_offset) as f32 * height - BAR_PADDING).max(0.0)
        } else {
            0.0
        };

        BarLayout {
            height: height.max(0.0),
            middle_y: guarantor_share,
            guarantor,
            consignor,
            consignor_above_floor: above_floor,
            guarantor_visible: !self.ended_below,
        }
    }

    pub fn labels(&self, currency: &CurrencyFormat) -> SettlementLabels {
        SettlementLabels {
            final_price: currency.format(self.final_price()),
            guarantor_value: currency.format(self.guarantor_amount),
            consignor_value: currency.format(self.seller_amount),
            guarantor_percent: format_percent(self.split),
            consignor_percent: format_percent(1.0 - self.split),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bar {
    pub y: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BarLayout {
    pub height: f32,
    /// offset of the "profit split" divider from the top of the block
    pub middle_y: f32,
    pub guarantor: Bar,
    pub consignor: Bar,
    /// part of the consignor bar earned above the guarantee
    pub consignor_above_floor: f32,
    pub guarantor_visible: bool,
}

impl BarLayout {
    /// The layout part-way through its entrance, every extent growing from 0.
    pub fn scaled(&self, progress: f32) -> BarLayout {
        let p = progress.clamp(0.0, 1.0);
        let bar = |bar: Bar| Bar {
            y: bar.y * p,
            height: bar.height * p,
        };

        BarLayout {
            height: self.height * p,
            middle_y: self.middle_y * p,
            guarantor: bar(self.guarantor),
            consignor: bar(self.consignor),
            consignor_above_floor: self.consignor_above_floor * p,
            guarantor_visible: self.guarantor_visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettlementLabels {
    pub final_price: String,
    pub guarantor_value: String,
    pub consignor_value: String,
    pub guarantor_percent: String,
    pub consignor_percent: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::{Bid, PriceFeed};

    #[test]
    fn ended_above_guarantee() {
        let feed = PriceFeed::new(
            vec![
                Bid::new(0, 150.0, "a"),
                Bid::new(1, 600.0, "b"),
                Bid::new(2, 1200.0, "c"),
            ],
            true,
        );
        let settlement = Settlement::compute(feed.last_price(), 1000.0, 0.25);

        assert!(!settlement.ended_below);
        assert!((settlement.split_offset - 200.0 * 0.25 / 1200.0).abs() < 1e-12);
        assert!((settlement.split_offset - 0.04167).abs() < 1e-5);
        assert!((settlement.guarantor_amount - 50.0).abs() < 1e-9);
        assert!((settlement.seller_amount - 1150.0).abs() < 1e-9);
        assert_eq!(settlement.final_price(), 1200.0);
        assert_eq!(settlement.message(), None);
    }

    #[test]
    fn ended_below_guarantee() {
        let settlement = Settlement::compute(800.0, 1000.0, 0.25);

        assert!(settlement.ended_below);
        assert_eq!(settlement.split_offset, 0.0);
        assert_eq!(settlement.guarantor_amount, 0.0);
        assert_eq!(settlement.seller_amount, 1000.0);
        assert_eq!(settlement.final_price(), 1000.0);
        assert_eq!(settlement.message(), Some(["Guarantor", "Buys NFT"]));

        let layout = settlement.layout(200.0);
        assert!(!layout.guarantor_visible);
        assert_eq!(layout.consignor, Bar { y: 5.0, height: 190.0 });
        assert_eq!(layout.consignor_above_floor, 0.0);
    }

    #[test]
    fn ending_exactly_at_guarantee_counts_as_below() {
        let settlement = Settlement::compute(1000.0, 1000.0, 0.5);
        assert!(settlement.ended_below);
        assert_eq!(settlement.split_offset, 0.0);
    }

    #[test]
    fn zero_price_is_guarded() {
        let settlement = Settlement::compute(0.0, 1000.0, 0.25);
        assert!(settlement.ended_below);
        assert_eq!(settlement.split_offset, 0.0);
        assert!(settlement.seller_amount.is_finite());

        let layout = settlement.layout(100.0);
        assert!(layout.consignor_above_floor.is_finite());

        let degenerate = Settlement::compute(0.0, 0.0, 0.25);
        assert!(degenerate.ended_below);
        assert_eq!(degenerate.split_offset, 0.0);
    }

    #[test]
    fn bar_heights_split_the_block() {
        let settlement = Settlement::compute(1200.0, 1000.0, 0.25);
        let height = 240.0;
        let layout = settlement.layout(height);
        let offset = settlement.split_offset as f32;

        assert!(layout.guarantor_visible);
        assert_eq!(layout.middle_y, height * offset);
        assert_eq!(layout.guarantor.y, BAR_PADDING);
        assert!((layout.guarantor.height - (height * offset - 10.0)).abs() < 1e-4);
        assert!((layout.consignor.y - (height * offset + 5.0)).abs() < 1e-4);
        assert!((layout.consignor.height - (height * (1.0 - offset) - 10.0)).abs() < 1e-4);

        let expected_above = ((200.0 / 1200.0 - settlement.split_offset) as f32) * height - 5.0;
        assert!((layout.consignor_above_floor - expected_above).abs() < 1e-4);
    }

    #[test]
    fn thin_blocks_never_go_negative() {
        let layout = Settlement::compute(1001.0, 1000.0, 0.1).layout(6.0);
        assert_eq!(layout.guarantor.height, 0.0);
        assert_eq!(layout.consignor_above_floor, 0.0);
    }

    #[test]
    fn entrance_grows_from_nothing() {
        let layout = Settlement::compute(1200.0, 1000.0, 0.25).layout(240.0);

        let start = layout.scaled(0.0);
        assert_eq!(start.height, 0.0);
        assert_eq!(start.consignor, Bar::default());
        assert_eq!(layout.scaled(1.0), layout);
        assert_eq!(layout.scaled(0.5).middle_y, layout.middle_y / 2.0);
    }

    #[test]
    fn labels_use_currency_and_percent_formats() {
        let labels = Settlement::compute(1200.0, 1000.0, 0.25).labels(&CurrencyFormat::default());
        assert_eq!(labels.final_price, "$1200");
        assert_eq!(labels.guarantor_value, "$50");
        assert_eq!(labels.consignor_value, "$1150");
        assert_eq!(labels.guarantor_percent, "25%");
        assert_eq!(labels.consignor_percent, "75%");
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let a = Settlement::compute(1610.0, 1000.0, 0.2);
        let b = Settlement::compute(1610.0, 1000.0, 0.2);
        assert_eq!(a, b);
        assert_eq!(a.layout(250.0), b.layout(250.0));
    }
}
