//! Controller driving one visualizer instance from its inputs.

use std::time::Instant;

use uuid::Uuid;

use crate::anim::{Timing, Tween};
use crate::auction::{AuctionParameters, PriceFeed};
use crate::config::VisualizerConfig;
use crate::curve::CurvePath;
use crate::geometry::{Point, Rect, Size};
use crate::scene::{MarkerTarget, Scene};
use crate::settlement::BarLayout;
use crate::tooltip::{RenderedMarkers, Tooltip, TooltipRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Live,
    Settled,
}

impl Phase {
    fn of(feed: &PriceFeed) -> Self {
        if feed.done {
            Phase::Settled
        } else if feed.is_empty() {
            Phase::Idle
        } else {
            Phase::Live
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AnimatedPoint {
    x: Tween,
    y: Tween,
}

impl AnimatedPoint {
    fn settled(at: Point) -> Self {
        Self {
            x: Tween::settled(at.x),
            y: Tween::settled(at.y),
        }
    }

    fn retarget(&mut self, to: Point, now: Instant, timing: Timing) {
        self.x.retarget(to.x, now, timing);
        self.y.retarget(to.y, now, timing);
    }

    fn value_at(&self, now: Instant) -> Point {
        Point::new(self.x.value_at(now), self.y.value_at(now))
    }

    fn is_running(&self, now: Instant) -> bool {
        self.x.is_running(now) || self.y.is_running(now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AnimatedMarker {
    center: AnimatedPoint,
    radius: Tween,
    above_floor: bool,
    bid: usize,
}

/// Sampled marker, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerFrame {
    pub center: Point,
    pub radius: f32,
    pub above_floor: bool,
    pub bid: usize,
}

/// Everything that animates, diffed against each new [`Scene`].
#[derive(Debug, Clone, PartialEq)]
struct AnimatedScene {
    knots: Vec<AnimatedPoint>,
    floor_y: Tween,
    active_end: Tween,
    above_clip_height: Tween,
    current_bid: AnimatedPoint,
    current_label_opacity: Tween,
    initial_y: Tween,
    initial_height: Tween,
    markers: Vec<AnimatedMarker>,
    end_marker: AnimatedPoint,
    end_scale: Tween,
    ending: Tween,
}

impl AnimatedScene {
    fn settled(scene: &Scene) -> Self {
        Self {
            knots: scene.knots.iter().copied().map(AnimatedPoint::settled).collect(),
            floor_y: Tween::settled(scene.floor.y),
            active_end: Tween::settled(scene.floor.active_end),
            above_clip_height: Tween::settled(scene.above_clip_height),
            current_bid: AnimatedPoint::settled(Point::new(
                scene.current_bid.x_start,
                scene.current_bid.y,
            )),
            current_label_opacity: Tween::settled(opacity(scene.current_bid.label_visible)),
            initial_y: Tween::settled(scene.initial_price.rect.y),
            initial_height: Tween::settled(scene.initial_price.rect.height),
            markers: scene
                .markers
                .iter()
                .map(|target| AnimatedMarker {
                    center: AnimatedPoint::settled(target.center),
                    radius: Tween::settled(target.radius),
                    above_floor: target.above_floor,
                    bid: target.bid,
                })
                .collect(),
            end_marker: AnimatedPoint::settled(scene.end_marker.at),
            end_scale: Tween::settled(scene.end_marker.scale),
            ending: Tween::settled(opacity(scene.profit_split.is_some())),
        }
    }

    fn retarget(&mut self, scene: &Scene, now: Instant, transition: Timing) {
        // new knots grow out of the current end of the curve
        let spawn_from = self.knots.last().map(|knot| knot.value_at(now));
        self.knots.truncate(scene.knots.len());
        for (i, target) in scene.knots.iter().enumerate() {
            match self.knots.get_mut(i) {
                Some(knot) => knot.retarget(*target, now, transition),
                None => {
                    let mut knot = AnimatedPoint::settled(spawn_from.unwrap_or(*target));
                    knot.retarget(*target, now, transition);
                    self.knots.push(knot);
                }
            }
        }

        self.floor_y.retarget(scene.floor.y, now, transition);
        self.active_end
            .retarget(scene.floor.active_end, now, transition);
        self.above_clip_height
            .retarget(scene.above_clip_height, now, transition);

        self.current_bid.retarget(
            Point::new(scene.current_bid.x_start, scene.current_bid.y),
            now,
            transition,
        );
        self.current_label_opacity.retarget(
            opacity(scene.current_bid.label_visible),
            now,
            transition,
        );

        self.initial_y
            .retarget(scene.initial_price.rect.y, now, transition);
        self.initial_height
            .retarget(scene.initial_price.rect.height, now, transition);

        self.retarget_markers(&scene.markers, now, transition);

        self.end_marker.retarget(scene.end_marker.at, now, transition);
        self.end_scale
            .retarget(scene.end_marker.scale, now, transition);
    }

    /// Markers keep their index; entering ones appear in place and grow once
    /// the move of the others has finished.
    fn retarget_markers(&mut self, targets: &[MarkerTarget], now: Instant, transition: Timing) {
        self.markers.truncate(targets.len());

        for (i, target) in targets.iter().enumerate() {
            match self.markers.get_mut(i) {
                Some(marker) => {
                    marker.center.retarget(target.center, now, transition);
                    marker.radius.retarget(target.radius, now, transition);
                    marker.above_floor = target.above_floor;
                    marker.bid = target.bid;
                }
                None => {
                    let mut radius = Tween::settled(0.0);
                    radius.retarget(
                        target.radius,
                        now,
                        transition.delayed(transition.duration),
                    );
                    self.markers.push(AnimatedMarker {
                        center: AnimatedPoint::settled(target.center),
                        radius,
                        above_floor: target.above_floor,
                        bid: target.bid,
                    });
                }
            }
        }
    }

    fn markers_at(&self, now: Instant) -> Vec<MarkerFrame> {
        self.markers
            .iter()
            .map(|marker| MarkerFrame {
                center: marker.center.value_at(now),
                radius: marker.radius.value_at(now),
                above_floor: marker.above_floor,
                bid: marker.bid,
            })
            .collect()
    }

    fn is_running(&self, now: Instant) -> bool {
        let tweens = [
            &self.floor_y,
            &self.active_end,
            &self.above_clip_height,
            &self.current_label_opacity,
            &self.initial_y,
            &self.initial_height,
            &self.end_scale,
            &self.ending,
        ];

        tweens.iter().any(|tween| tween.is_running(now))
            || self.current_bid.is_running(now)
            || self.end_marker.is_running(now)
            || self.knots.iter().any(|knot| knot.is_running(now))
            || self
                .markers
                .iter()
                .any(|marker| marker.center.is_running(now) || marker.radius.is_running(now))
    }
}

fn opacity(visible: bool) -> f32 {
    if visible { 1.0 } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentBidFrame {
    pub y: f32,
    pub x_start: f32,
    pub x_end: f32,
    pub label_opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndMarkerFrame {
    pub at: Point,
    pub scale: f32,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitSplitFrame {
    /// eased entrance progress, also the block's opacity
    pub progress: f32,
    pub layout: BarLayout,
}

/// The scene as it should be drawn at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    pub curve: CurvePath,
    pub floor_y: f32,
    pub floor_active: Vec<(f32, f32)>,
    pub above_clip_height: f32,
    pub current_bid: CurrentBidFrame,
    pub initial_price: Rect,
    pub markers: Vec<MarkerFrame>,
    pub end_marker: EndMarkerFrame,
    pub profit_split: Option<ProfitSplitFrame>,
}

/// One auction visualizer: inputs, target scene, animations and tooltip.
#[derive(Debug, Clone)]
pub struct Visualizer {
    id: Uuid,
    params: AuctionParameters,
    config: VisualizerConfig,
    feed: PriceFeed,
    phase: Phase,
    scene: Scene,
    animated: AnimatedScene,
    tooltip: Tooltip,
}

impl Visualizer {
    pub fn new(params: AuctionParameters, config: VisualizerConfig) -> Self {
        let feed = PriceFeed::default();
        let scene = Scene::build(&params, &feed, &config);
        let animated = AnimatedScene::settled(&scene);

        let id = Uuid::new_v4();
        let mut tooltip = Tooltip::new(
            config.tooltip_generator(),
            config.tooltip.offset,
            config.tooltip.color_scheme.clone(),
        );
        tooltip.bind(Some(id));

        Self {
            id,
            params,
            config,
            feed,
            phase: Phase::Idle,
            scene,
            animated,
            tooltip,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn params(&self) -> &AuctionParameters {
        &self.params
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn feed(&self) -> &PriceFeed {
        &self.feed
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn size(&self) -> Size {
        self.config.size
    }

    /// Rebuilds the scene for `feed` and retargets every animation.
    ///
    /// The settlement entrance restarts only when the settled data differs
    /// from what is already shown. Returns whether anything changed.
    pub fn update(&mut self, feed: PriceFeed, now: Instant) -> bool {
        if feed == self.feed {
            return false;
        }
        if !feed.is_time_ordered() {
            log::warn!("visualizer {}: feed is not time-ordered", self.id);
        }

        let phase = Phase::of(&feed);
        let scene = Scene::build(&self.params, &feed, &self.config);

        self.animated
            .retarget(&scene, now, self.config.transition());

        match scene.settlement() {
            Some(settlement) => {
                if self.scene.settlement() != Some(settlement) || self.phase != Phase::Settled {
                    log::info!(
                        "visualizer {}: settled at {} (ended below: {})",
                        self.id,
                        settlement.final_price(),
                        settlement.ended_below
                    );
                    self.animated.ending.restart(0.0, 1.0, now, self.config.ending());
                }
            }
            None => self.animated.ending.jump(0.0),
        }

        if phase != self.phase {
            log::debug!("visualizer {}: {:?} -> {:?}", self.id, self.phase, phase);
        }

        self.phase = phase;
        self.scene = scene;
        self.feed = feed;
        true
    }

    /// Unmounts the current feed and starts over with an empty one.
    ///
    /// The tooltip is unbound from the old instance id, so pointer events
    /// still in flight for it are ignored.
    pub fn reset(&mut self) {
        self.tooltip.bind(None);

        self.id = Uuid::new_v4();
        self.feed = PriceFeed::default();
        self.phase = Phase::Idle;
        self.scene = Scene::build(&self.params, &self.feed, &self.config);
        self.animated = AnimatedScene::settled(&self.scene);

        self.tooltip.bind(Some(self.id));
        log::debug!("visualizer reset, new instance {}", self.id);
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.animated.is_running(now)
    }

    pub fn sample(&self, now: Instant) -> SceneFrame {
        let animated = &self.animated;
        let scene = &self.scene;

        let knots: Vec<Point> = animated.knots.iter().map(|k| k.value_at(now)).collect();
        let current = animated.current_bid.value_at(now);
        let initial_y = animated.initial_y.value_at(now);
        let end_at = animated.end_marker.value_at(now);
        let end_scale = animated.end_scale.value_at(now);

        SceneFrame {
            curve: CurvePath::build(&knots, self.config.curve_type),
            floor_y: animated.floor_y.value_at(now),
            floor_active: scene
                .floor
                .active_segments(animated.active_end.value_at(now)),
            above_clip_height: animated.above_clip_height.value_at(now),
            current_bid: CurrentBidFrame {
                y: current.y,
                x_start: current.x,
                x_end: scene.current_bid.x_end,
                label_opacity: animated.current_label_opacity.value_at(now),
            },
            initial_price: Rect::new(
                scene.initial_price.rect.x,
                initial_y,
                scene.initial_price.rect.width,
                animated.initial_height.value_at(now),
            ),
            markers: animated.markers_at(now),
            end_marker: EndMarkerFrame {
                at: end_at,
                scale: end_scale,
                bounds: scene.end_marker.bounds(end_at, end_scale),
            },
            profit_split: scene.profit_split.as_ref().map(|split| {
                let progress = animated.ending.value_at(now);
                ProfitSplitFrame {
                    progress,
                    layout: split.layout.scaled(progress),
                }
            }),
        }
    }

    /// Pointer moved over the canvas of instance `source`.
    ///
    /// `pointer` is canvas-relative; markers are hit-tested where they are
    /// drawn at `now`. Returns whether the tooltip changed.
    pub fn pointer_moved<M>(&mut self, source: Uuid, pointer: Point, now: Instant, measure: M) -> bool
    where
        M: FnOnce(&[TooltipRow]) -> Size,
    {
        let size = self.config.size;
        let markers = self.animated.markers_at(now);

        let geometry = RenderedMarkers {
            container: Rect::new(0.0, 0.0, size.width, size.height),
            rects: markers
                .iter()
                .map(|marker| Rect::around(marker.center, marker.radius))
                .collect(),
            bids: markers
                .iter()
                .filter_map(|marker| self.feed.prices.get(marker.bid))
                .collect(),
        };

        self.tooltip.pointer_moved(source, pointer, &geometry, measure)
    }

    pub fn pointer_left(&mut self, source: Uuid) -> bool {
        self.tooltip.pointer_left(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::Bid;
    use crate::tooltip::estimate_box_size;
    use std::time::Duration;

    const SETTLE: Duration = Duration::from_secs(3);

    fn params() -> AuctionParameters {
        AuctionParameters::new(150.0, 1000.0, 0.2, Duration::from_secs(5))
    }

    fn feed(prices: &[f64], done: bool) -> PriceFeed {
        let bids = prices
            .iter()
            .enumerate()
            .map(|(i, price)| Bid::new(1_000_000 + i as u64 * 1000, *price, "0x14rPtntr7WEawK0jXHpKcRvFVPDfCkGPt"))
            .collect();
        PriceFeed::new(bids, done)
    }

    fn visualizer() -> Visualizer {
        Visualizer::new(params(), VisualizerConfig::default())
    }

    #[test]
    fn phases_follow_the_feed() {
        let mut vis = visualizer();
        let now = Instant::now();
        assert_eq!(vis.phase(), Phase::Idle);

        vis.update(feed(&[0.0, 200.0], false), now);
        assert_eq!(vis.phase(), Phase::Live);

        vis.update(feed(&[0.0, 200.0, 1200.0], true), now);
        assert_eq!(vis.phase(), Phase::Settled);
        assert!(vis.scene().settlement().is_some());
    }

    #[test]
    fn animations_settle_on_the_scene() {
        let mut vis = visualizer();
        let now = Instant::now();
        vis.update(feed(&[0.0, 450.0, 1100.0], false), now);
        assert!(vis.is_animating(now));

        let later = now + SETTLE;
        assert!(!vis.is_animating(later));

        let frame = vis.sample(later);
        assert_eq!(frame.curve, vis.scene().curve);
        assert_eq!(frame.floor_y, vis.scene().floor.y);
        assert_eq!(frame.markers.len(), 2);
        assert_eq!(frame.markers[1].center, vis.scene().markers[1].center);
        assert_eq!(frame.markers[1].radius, 4.0);
    }

    #[test]
    fn entering_markers_grow_after_the_move() {
        let mut vis = visualizer();
        let now = Instant::now();
        vis.update(feed(&[0.0, 450.0], false), now);

        let transition = vis.config().transition_duration;
        let marker = vis.sample(now + transition / 2).markers[0];
        assert_eq!(marker.radius, 0.0);
        assert_eq!(marker.center, vis.scene().markers[0].center);

        let grown = vis.sample(now + transition * 2).markers[0];
        assert_eq!(grown.radius, 4.0);
    }

    #[test]
    fn new_knots_start_from_the_curve_end() {
        let mut vis = visualizer();
        let now = Instant::now();
        vis.update(feed(&[0.0, 450.0], false), now);

        let settled = now + SETTLE;
        let end = vis.sample(settled).curve.end_point();
        vis.update(feed(&[0.0, 450.0, 600.0], false), settled);

        let frame = vis.sample(settled);
        assert_eq!(frame.curve.end_point(), end);
    }

    #[test]
    fn settlement_entrance_restarts_only_on_change() {
        let mut vis = visualizer();
        let now = Instant::now();
        vis.update(feed(&[0.0, 600.0, 1200.0], true), now);

        let ending = vis.config().ending_duration;
        let half = now + ending / 2;
        let progress = vis.sample(half).profit_split.unwrap().progress;
        assert!(progress > 0.0 && progress < 1.0);

        // identical data: no change, no restart
        assert!(!vis.update(feed(&[0.0, 600.0, 1200.0], true), half));
        assert_eq!(vis.sample(half).profit_split.unwrap().progress, progress);

        // different data: one fresh entrance
        vis.update(feed(&[0.0, 600.0, 1300.0], true), half);
        assert_eq!(vis.sample(half).profit_split.unwrap().progress, 0.0);
        assert_eq!(vis.sample(half + ending).profit_split.unwrap().progress, 1.0);
    }

    #[test]
    fn live_scene_has_no_profit_split() {
        let mut vis = visualizer();
        vis.update(feed(&[0.0, 600.0], false), Instant::now());
        assert!(vis.sample(Instant::now()).profit_split.is_none());
    }

    #[test]
    fn tooltip_follows_drawn_markers() {
        let mut vis = visualizer();
        let now = Instant::now();
        vis.update(feed(&[0.0, 450.0, 1100.0], false), now);
        let later = now + SETTLE;

        let target = vis.scene().markers[1].center;
        let id = vis.id();
        assert!(vis.pointer_moved(id, target, later, estimate_box_size));

        let state = vis.tooltip().state();
        assert!(state.visible);
        assert_eq!(state.focus, Some(1));
        assert_eq!(state.rows[0].label, "Bid #2");
        assert_eq!(state.rows[2].value, "$1100");

        assert!(vis.pointer_left(id));
        assert!(!vis.tooltip().state().visible);
    }

    #[test]
    fn tooltip_moves_with_a_rescaled_marker() {
        let mut vis = visualizer();
        let now = Instant::now();
        vis.update(feed(&[0.0, 1200.0], false), now);
        let id = vis.id();

        let settled = now + SETTLE;
        let before = vis.scene().markers[0].center;
        assert!(vis.pointer_moved(id, before, settled, estimate_box_size));
        let placed = vis.tooltip().state().position;

        // same pointer, same marker: nothing to redraw
        assert!(!vis.pointer_moved(id, before, settled, estimate_box_size));

        // a higher bid rescales the price axis and moves the first marker
        vis.update(feed(&[0.0, 1200.0, 1320.0], false), settled);
        let later = settled + SETTLE;
        let after = vis.scene().markers[0].center;
        assert_ne!(before, after);

        assert!(vis.pointer_moved(id, after, later, estimate_box_size));
        let state = vis.tooltip().state();
        assert_eq!(state.focus, Some(0));
        assert_ne!(state.position, placed);
        assert!(((state.position.y - placed.y) - (after.y - before.y)).abs() < 1e-3);
    }

    #[test]
    fn reset_ignores_the_old_instance() {
        let mut vis = visualizer();
        let now = Instant::now();
        vis.update(feed(&[0.0, 450.0], false), now);
        let later = now + SETTLE;

        let old = vis.id();
        let target = vis.scene().markers[0].center;
        assert!(vis.pointer_moved(old, target, later, estimate_box_size));

        vis.reset();
        assert_ne!(vis.id(), old);
        assert_eq!(vis.phase(), Phase::Idle);
        assert!(!vis.tooltip().state().visible);
        assert!(!vis.pointer_moved(old, target, later, estimate_box_size));
        assert_eq!(vis.tooltip().target(), Some(vis.id()));
    }
}
