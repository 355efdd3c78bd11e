//! Nearest-marker tooltip for the bidding markers.
//!
//! The host supplies the rendered marker geometry through [`MarkerGeometry`];
//! the engine only reads it and owns the overlay state.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::auction::Bid;
use crate::config::UserTimezone;
use crate::config::theme::Rgb;
use crate::format::{CurrencyFormat, abbreviate_address};
use crate::geometry::{Point, Rect, Size};

/// Pointer distance, in pixels, past which no marker is focused.
pub const FOCUS_THRESHOLD: f32 = 15.0;

const CHAR_WIDTH: f32 = 7.0;
const LINE_HEIGHT: f32 = 16.0;
const PAD_X: f32 = 16.0;
const PAD_Y: f32 = 10.0;
const COLUMN_GAP: f32 = 12.0;

type GeneratorFn = dyn Fn(&Bid, usize) -> Vec<(String, String)> + Send + Sync;

/// Turns a focused bid and its marker index into label/value rows.
#[derive(Clone)]
pub struct TooltipGenerator(Arc<GeneratorFn>);

impl TooltipGenerator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Bid, usize) -> Vec<(String, String)> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Bid number, time, amount and abbreviated bidder.
    ///
    /// Markers start at the second bid, so marker `index` is bid `index + 1`.
    pub fn standard(currency: CurrencyFormat, timezone: UserTimezone) -> Self {
        Self::new(move |bid, index| {
            vec![
                (format!("Bid #{}", index + 1), String::new()),
                (
                    "Time:".to_string(),
                    timezone.format_bid_time(bid.time).unwrap_or_default(),
                ),
                ("Bid amount:".to_string(), currency.format(bid.price)),
                ("Submitted by:".to_string(), abbreviate_address(&bid.by)),
            ]
        })
    }

    pub fn rows(&self, bid: &Bid, index: usize) -> Vec<(String, String)> {
        (self.0)(bid, index)
    }
}

impl fmt::Debug for TooltipGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TooltipGenerator(..)")
    }
}

/// Rendered geometry of the marker set, queried from the host renderer.
pub trait MarkerGeometry {
    /// Container rect in the same space as the marker rects.
    fn container(&self) -> Rect;

    fn marker_rects(&self) -> &[Rect];

    /// The bid bound to marker `index`.
    fn datum(&self, index: usize) -> Option<&Bid>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipFocus<'a> {
    pub distance: f32,
    pub element: &'a Bid,
    /// marker center relative to the container origin
    pub point: Point,
    pub index: usize,
}

/// Finds the marker closest to `pointer` (container-relative), if any lies
/// within [`FOCUS_THRESHOLD`]. Ties keep the earliest marker.
pub fn resolve<G: MarkerGeometry + ?Sized>(pointer: Point, geometry: &G) -> Option<TooltipFocus<'_>> {
    let container = geometry.container();

    let (index, point, distance) = geometry
        .marker_rects()
        .iter()
        .enumerate()
        .map(|(index, rect)| {
            let center = rect.center();
            let point = Point::new(center.x - container.x, center.y - container.y);
            (index, point, pointer.distance(point))
        })
        .fold(None, |acc: Option<(usize, Point, f32)>, candidate| match acc {
            Some(best) if best.2 <= candidate.2 => Some(best),
            _ => Some(candidate),
        })?;

    if distance >= FOCUS_THRESHOLD {
        return None;
    }

    geometry.datum(index).map(|element| TooltipFocus {
        distance,
        element,
        point,
        index,
    })
}

/// Places a `body` sized box at `point + offset`, pinned flush to the
/// container's right or bottom edge when it would overflow.
pub fn place(point: Point, offset: (f32, f32), body: Size, container: Size) -> Point {
    let x = if point.x + body.width + offset.0 > container.width {
        container.width - body.width
    } else {
        point.x + offset.0
    };
    let y = if point.y + body.height + offset.1 > container.height {
        container.height - body.height
    } else {
        point.y + offset.1
    };

    Point::new(x, y)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipRow {
    pub label: String,
    pub value: String,
    pub color: Rgb,
}

/// Text-metric estimate of the rendered tooltip box.
pub fn estimate_box_size(rows: &[TooltipRow]) -> Size {
    let label_cols = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
    let value_cols = rows.iter().map(|r| r.value.chars().count()).max().unwrap_or(0);

    let gap = if value_cols > 0 { COLUMN_GAP } else { 0.0 };
    let width = (label_cols + value_cols) as f32 * CHAR_WIDTH + gap + PAD_X;
    let height = rows.len().max(1) as f32 * LINE_HEIGHT + PAD_Y;

    Size::new(width, height)
}

/// x offset of the value column inside the box.
pub fn value_column_x(rows: &[TooltipRow]) -> f32 {
    let label_cols = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
    PAD_X / 2.0 + label_cols as f32 * CHAR_WIDTH + COLUMN_GAP
}

pub fn row_y(index: usize) -> f32 {
    PAD_Y / 2.0 + index as f32 * LINE_HEIGHT + LINE_HEIGHT / 2.0
}

pub fn text_x() -> f32 {
    PAD_X / 2.0
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TooltipState {
    pub visible: bool,
    pub rows: Vec<TooltipRow>,
    pub position: Point,
    pub size: Size,
    pub focus: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Tooltip {
    generator: TooltipGenerator,
    offset: (f32, f32),
    color_scheme: Vec<Rgb>,
    target: Option<Uuid>,
    state: TooltipState,
}

impl Tooltip {
    pub fn new(generator: TooltipGenerator, offset: (f32, f32), color_scheme: Vec<Rgb>) -> Self {
        Self {
            generator,
            offset,
            color_scheme,
            target: None,
            state: TooltipState::default(),
        }
    }

    /// Registers pointer handling for `target`; `None` unregisters and hides.
    pub fn bind(&mut self, target: Option<Uuid>) {
        if target.is_none() {
            self.hide();
        }
        self.target = target;
    }

    pub fn target(&self) -> Option<Uuid> {
        self.target
    }

    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    /// Returns whether the overlay changed.
    pub fn pointer_moved<G, M>(&mut self, source: Uuid, pointer: Point, geometry: &G, measure: M) -> bool
    where
        G: MarkerGeometry + ?Sized,
        M: FnOnce(&[TooltipRow]) -> Size,
    {
        if self.target != Some(source) {
            return false;
        }

        let Some(focus) = resolve(pointer, geometry) else {
            return self.hide();
        };

        let container = geometry.container();
        let container = Size::new(container.width, container.height);

        if self.state.visible && self.state.focus == Some(focus.index) {
            let position = place(focus.point, self.offset, self.state.size, container);
            if position == self.state.position {
                return false;
            }
            self.state.position = position;
            return true;
        }

        let rows = self.rows_for(focus.element, focus.index);
        let size = measure(&rows);

        self.state = TooltipState {
            visible: true,
            position: place(focus.point, self.offset, size, container),
            size,
            rows,
            focus: Some(focus.index),
        };
        true
    }

    pub fn pointer_left(&mut self, source: Uuid) -> bool {
        if self.target != Some(source) {
            return false;
        }
        self.hide()
    }

    fn hide(&mut self) -> bool {
        let was_visible = self.state.visible;
        self.state.visible = false;
        self.state.focus = None;
        was_visible
    }

    fn rows_for(&self, bid: &Bid, index: usize) -> Vec<TooltipRow> {
        self.generator
            .rows(bid, index)
            .into_iter()
            .enumerate()
            .map(|(i, (label, value))| TooltipRow {
                label,
                value,
                color: self.row_color(i),
            })
            .collect()
    }

    fn row_color(&self, row: usize) -> Rgb {
        if self.color_scheme.is_empty() {
            Rgb::new(255, 255, 255)
        } else {
            self.color_scheme[row % self.color_scheme.len()]
        }
    }
}

/// Marker geometry assembled by the host for one pointer event.
#[derive(Debug, Clone, Default)]
pub struct RenderedMarkers<'a> {
    pub container: Rect,
    pub rects: Vec<Rect>,
    pub bids: Vec<&'a Bid>,
}

impl MarkerGeometry for RenderedMarkers<'_> {
    fn container(&self) -> Rect {
        self.container
    }

    fn marker_rects(&self) -> &[Rect] {
        &self.rects
    }

    fn datum(&self, index: usize) -> Option<&Bid> {
        self.bids.get(index).copied()
    }
}
