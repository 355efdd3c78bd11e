//! Target geometry of the visualizer for one input snapshot.
//!
//! A [`Scene`] is rebuilt from scratch on every feed update; animation towards
//! it lives in [`crate::visualizer`].

use crate::auction::{AuctionParameters, PriceFeed};
use crate::config::{EndMarkerConfig, VisualizerConfig};
use crate::curve::{AreaPath, CurvePath};
use crate::geometry::{Point, Rect, Size};
use crate::scale::Scales;
use crate::settlement::{BarLayout, Settlement, SettlementLabels};

/// Extra height of the above-floor clip so both curve passes meet the floor
/// line without a seam (half the stroke width).
pub const FLOOR_SEAM: f32 = 1.5;

pub const FLOOR_LABEL: &str = "Floor";
pub const INITIAL_PRICE_LABEL: &str = "Initial Price";
pub const PROFIT_SPLIT_LABEL: &str = "Profit split";
pub const GUARANTOR_LABEL: &str = "Guarantor";
pub const CONSIGNOR_LABEL: &str = "Consignor";

#[derive(Debug, Clone, PartialEq)]
pub struct FloorLine {
    pub y: f32,
    pub value: String,
    /// full-width line, `(x1, x2)`
    pub permanent: (f32, f32),
    pub active_start: f32,
    /// x of the last bid
    pub active_end: f32,
    /// x intervals where the curve lies at or under the floor
    pub spans: Vec<(f32, f32)>,
}

impl FloorLine {
    /// Visible pieces of the active line when it reaches `end`.
    pub fn active_segments(&self, end: f32) -> Vec<(f32, f32)> {
        let (lo, hi) = (self.active_start.min(end), self.active_start.max(end));

        self.spans
            .iter()
            .filter_map(|&(a, b)| {
                let (a, b) = (a.max(lo), b.min(hi));
                (b > a).then_some((a, b))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentBid {
    pub y: f32,
    pub x_start: f32,
    pub x_end: f32,
    pub label: String,
    pub label_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitialPriceBand {
    pub rect: Rect,
    pub value: String,
    pub label_x: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerTarget {
    pub center: Point,
    pub radius: f32,
    pub above_floor: bool,
    /// index of the bid in the feed
    pub bid: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndMarker {
    pub at: Point,
    pub scale: f32,
    pub config: EndMarkerConfig,
}

impl EndMarker {
    /// Marker bounds once translated to `at` and scaled by `scale`.
    pub fn bounds(&self, at: Point, scale: f32) -> Rect {
        let EndMarkerConfig {
            width,
            height,
            offset,
        } = self.config;

        Rect::new(
            at.x + offset.0 * scale,
            at.y + offset.1 * scale,
            width * scale,
            height * scale,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfitSplit {
    /// top-left anchor of the block
    pub origin: Point,
    pub settlement: Settlement,
    pub layout: BarLayout,
    pub labels: SettlementLabels,
    pub line_extend: f32,
}

impl ProfitSplit {
    pub fn message(&self) -> Option<[&'static str; 2]> {
        self.settlement.message()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub size: Size,
    pub scales: Scales,
    pub knots: Vec<Point>,
    pub curve: CurvePath,
    pub area: AreaPath,
    pub end_point: Point,
    pub above_clip_height: f32,
    pub floor: FloorLine,
    pub current_bid: CurrentBid,
    pub initial_price: InitialPriceBand,
    pub markers: Vec<MarkerTarget>,
    pub end_marker: EndMarker,
    pub profit_split: Option<ProfitSplit>,
}

impl Scene {
    pub fn build(params: &AuctionParameters, feed: &PriceFeed, config: &VisualizerConfig) -> Self {
        let size = config.size;
        let margin = config.margin;
        let scales = Scales::derive(params, feed, size, margin);
        let currency = &config.currency_format;

        let knots: Vec<Point> = feed
            .prices
            .iter()
            .map(|bid| Point::new(scales.time_to_x(bid.time), scales.price_to_y(bid.price)))
            .collect();

        let curve = CurvePath::build(&knots, config.curve_type);
        let area = AreaPath::build(&knots, config.curve_type, 0.0);
        let end_point = curve.end_point();

        let right_edge = size.width - margin.right;
        let floor_y = scales.price_to_y(params.guaranteed_price);

        let floor = FloorLine {
            y: floor_y,
            value: currency.format(params.guaranteed_price),
            permanent: (margin.left, right_edge),
            active_start: margin.left,
            active_end: feed
                .last()
                .map_or(margin.left, |bid| scales.time_to_x(bid.time)),
            spans: area.spans_at(floor_y),
        };

        let last_price = feed.last_price();

        let current_bid = CurrentBid {
            y: end_point.y,
            x_start: end_point.x,
            x_end: right_edge,
            label: currency.format(last_price),
            label_visible: !feed.done,
        };

        let initial_y = scales.price_to_y(params.initial_price);
        let initial_price = InitialPriceBand {
            rect: Rect::new(
                margin.left,
                initial_y,
                scales.plot.width,
                scales.plot.bottom() - initial_y,
            ),
            value: currency.format(params.initial_price),
            label_x: right_edge,
        };

        let markers = feed
            .prices
            .iter()
            .zip(&knots)
            .enumerate()
            .skip(1)
            .map(|(index, (bid, knot))| MarkerTarget {
                center: *knot,
                radius: config.marker.radius,
                above_floor: bid.price > params.guaranteed_price,
                bid: index,
            })
            .collect();

        let end_marker = EndMarker {
            at: end_point,
            scale: if last_price > params.guaranteed_price {
                1.0
            } else {
                0.0
            },
            config: config.end_marker,
        };

        let profit_split = feed.done.then(|| {
            let settlement =
                Settlement::compute(last_price, params.guaranteed_price, params.split());

            let top = scales.price_to_y(settlement.final_price());
            let height = size.height - margin.bottom - top;
            let profit_y = if settlement.ended_below {
                floor_y
            } else {
                end_point.y
            };

            ProfitSplit {
                origin: Point::new(right_edge, profit_y),
                layout: settlement.layout(height),
                labels: settlement.labels(currency),
                settlement,
                line_extend: config.line_extend,
            }
        });

        Scene {
            size,
            scales,
            knots,
            curve,
            area,
            end_point,
            above_clip_height: floor_y + FLOOR_SEAM,
            floor,
            current_bid,
            initial_price,
            markers,
            end_marker,
            profit_split,
        }
    }

    pub fn floor_y(&self) -> f32 {
        self.floor.y
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.profit_split.as_ref().map(|split| &split.settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::Bid;
    use std::time::Duration;

    fn params() -> AuctionParameters {
        AuctionParameters::new(150.0, 1000.0, 0.2, Duration::from_secs(5))
    }

    fn feed(prices: &[f64], done: bool) -> PriceFeed {
        let bids = prices
            .iter()
            .enumerate()
            .map(|(i, price)| Bid::new(1_000_000 + i as u64 * 1000, *price, "0xabc"))
            .collect();
        PriceFeed::new(bids, done)
    }

    #[test]
    fn markers_skip_the_first_bid() {
        let scene = Scene::build(&params(), &feed(&[0.0, 200.0, 1100.0], false), &VisualizerConfig::default());

        assert_eq!(scene.markers.len(), 2);
        assert_eq!(scene.markers[0].bid, 1);
        assert!(!scene.markers[0].above_floor);
        assert!(scene.markers[1].above_floor);
        assert_eq!(scene.markers[1].center, scene.knots[2]);
        assert_eq!(scene.markers[0].radius, 4.0);
    }

    #[test]
    fn floor_and_clip_follow_the_guarantee() {
        let scene = Scene::build(&params(), &feed(&[0.0, 450.0], false), &VisualizerConfig::default());

        // domain [0, 1300] on [395, 65]
        let expected = 395.0 - 330.0 * (1000.0 / 1300.0);
        assert!((scene.floor_y() - expected).abs() < 1e-3);
        assert_eq!(scene.above_clip_height, scene.floor_y() + FLOOR_SEAM);
        assert_eq!(scene.floor.permanent, (0.0, 310.0));
        assert_eq!(scene.floor.value, "$1000");
    }

    #[test]
    fn active_floor_is_clipped_by_the_curve() {
        let config = VisualizerConfig {
            curve_type: crate::curve::CurveType::Linear,
            ..VisualizerConfig::default()
        };
        // rises above the floor and comes back down
        let scene = Scene::build(&params(), &feed(&[0.0, 1300.0, 0.0], false), &config);
        let end = scene.floor.active_end;
        assert_eq!(end, 124.0);

        let segments = scene.floor.active_segments(end);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].0, 0.0);
        assert!((segments[1].1 - end).abs() < 1e-3);
        assert!(segments[0].1 < segments[1].0);

        // half-way through the reveal only the first piece shows
        assert_eq!(scene.floor.active_segments(end / 2.0).len(), 1);
    }

    #[test]
    fn end_marker_shows_only_above_the_floor() {
        let config = VisualizerConfig::default();
        let below = Scene::build(&params(), &feed(&[0.0, 1000.0], false), &config);
        assert_eq!(below.end_marker.scale, 0.0);

        let above = Scene::build(&params(), &feed(&[0.0, 1000.5], false), &config);
        assert_eq!(above.end_marker.scale, 1.0);
        assert_eq!(above.end_marker.at, above.end_point);

        let bounds = above.end_marker.bounds(Point::new(100.0, 100.0), 1.0);
        assert_eq!(bounds, Rect::new(83.0, 50.0, 35.0, 65.0));
    }

    #[test]
    fn current_bid_runs_to_the_right_edge() {
        let scene = Scene::build(&params(), &feed(&[0.0, 600.0], false), &VisualizerConfig::default());
        assert_eq!(scene.current_bid.x_start, scene.end_point.x);
        assert_eq!(scene.current_bid.x_end, 310.0);
        assert_eq!(scene.current_bid.label, "$600");
        assert!(scene.current_bid.label_visible);

        let done = Scene::build(&params(), &feed(&[0.0, 600.0], true), &VisualizerConfig::default());
        assert!(!done.current_bid.label_visible);
    }

    #[test]
    fn initial_price_band_reaches_plot_bottom() {
        let scene = Scene::build(&params(), &feed(&[0.0], false), &VisualizerConfig::default());
        let band = scene.initial_price.rect;

        assert_eq!(band.width, 310.0);
        assert!((band.bottom() - 395.0).abs() < 1e-3);
        assert_eq!(scene.initial_price.value, "$150");
    }

    #[test]
    fn no_settlement_until_done() {
        let config = VisualizerConfig::default();
        assert!(Scene::build(&params(), &feed(&[0.0, 1610.0], false), &config).profit_split.is_none());

        let scene = Scene::build(&params(), &feed(&[0.0, 1610.0], true), &config);
        let split = scene.profit_split.as_ref().unwrap();
        assert!(!split.settlement.ended_below);
        assert_eq!(split.origin, Point::new(310.0, scene.end_point.y));
        // last price is the domain max, so the block spans the full plot height
        assert!((split.layout.height - 330.0).abs() < 1e-3);
    }

    #[test]
    fn ended_below_anchors_at_the_floor() {
        let scene = Scene::build(&params(), &feed(&[0.0, 900.0], true), &VisualizerConfig::default());
        let split = scene.profit_split.as_ref().unwrap();

        assert!(split.settlement.ended_below);
        assert_eq!(split.origin.y, scene.floor_y());
        assert_eq!(split.message(), Some(["Guarantor", "Buys NFT"]));
        assert!((split.layout.height - (395.0 - scene.floor_y())).abs() < 1e-3);
    }

    #[test]
    fn empty_feed_builds_a_degenerate_scene() {
        let scene = Scene::build(&params(), &PriceFeed::default(), &VisualizerConfig::default());

        assert!(scene.curve.is_empty());
        assert!(scene.markers.is_empty());
        assert_eq!(scene.end_point, Point::ORIGIN);
        assert!(scene.floor.active_segments(scene.floor.active_end).is_empty());
        assert!(scene.profit_split.is_none());
    }

    #[test]
    fn identical_inputs_build_identical_scenes() {
        let config = VisualizerConfig::default();
        let a = Scene::build(&params(), &feed(&[0.0, 200.0, 450.0, 1400.0], true), &config);
        let b = Scene::build(&params(), &feed(&[0.0, 200.0, 450.0, 1400.0], true), &config);
        assert_eq!(a, b);
        assert_eq!(a.curve.to_string(), b.curve.to_string());
    }
}
