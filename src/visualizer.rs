use std::time::Instant;

use data::curve::PathCommand;
use data::geometry;
use data::scene::{
    CONSIGNOR_LABEL, FLOOR_LABEL, GUARANTOR_LABEL, INITIAL_PRICE_LABEL, PROFIT_SPLIT_LABEL, Scene,
};
use data::settlement::{BAR_PADDING, BAR_WIDTH};
use data::tooltip::{TooltipState, estimate_box_size, row_y, text_x, value_column_x};
use data::visualizer::{EndMarkerFrame, SceneFrame};
use data::{AuctionParameters, PriceFeed, Visualizer, VisualizerConfig};

use iced::widget::canvas::{self, Cache, Canvas, Frame, LineDash, Path, Stroke, Text};
use iced::{Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Theme, Vector, mouse};
use uuid::Uuid;

use crate::style::{self, VisualizerColors};

const LABEL_GAP: f32 = 6.0;

#[derive(Debug, Clone, Copy)]
pub enum Message {
    PointerMoved { instance: Uuid, position: Point },
    PointerLeft { instance: Uuid },
}

/// Canvas host of one [`Visualizer`].
pub struct AuctionChart {
    visualizer: Visualizer,
    scene_cache: Cache,
    tooltip_cache: Cache,
    last_frame: Instant,
}

impl AuctionChart {
    pub fn new(params: AuctionParameters, config: VisualizerConfig) -> Self {
        Self {
            visualizer: Visualizer::new(params, config),
            scene_cache: Cache::default(),
            tooltip_cache: Cache::default(),
            last_frame: Instant::now(),
        }
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn update(&mut self, message: Message) {
        let changed = match message {
            Message::PointerMoved { instance, position } => self.visualizer.pointer_moved(
                instance,
                geometry::Point::new(position.x, position.y),
                self.last_frame,
                estimate_box_size,
            ),
            Message::PointerLeft { instance } => self.visualizer.pointer_left(instance),
        };

        if changed {
            self.tooltip_cache.clear();
        }
    }

    pub fn set_feed(&mut self, feed: PriceFeed, now: Instant) {
        self.last_frame = now;
        if self.visualizer.update(feed, now) {
            self.scene_cache.clear();
        }
    }

    pub fn reset(&mut self) {
        self.visualizer.reset();
        self.scene_cache.clear();
        self.tooltip_cache.clear();
    }

    /// Advances the animation clock to `now`.
    pub fn tick(&mut self, now: Instant) {
        self.last_frame = now;
        self.scene_cache.clear();
    }

    pub fn is_animating(&self) -> bool {
        self.visualizer.is_animating(self.last_frame)
    }

    pub fn view(&self) -> Element<'_, Message> {
        let size = self.visualizer.size();

        Canvas::new(self)
            .width(Length::Fixed(size.width))
            .height(Length::Fixed(size.height))
            .into()
    }
}

impl canvas::Program<Message> for AuctionChart {
    /// whether the cursor was over the canvas on the last event
    type State = bool;

    fn update(
        &self,
        hovered: &mut Self::State,
        event: &iced::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let iced::Event::Mouse(mouse::Event::CursorMoved { .. } | mouse::Event::CursorLeft) = event
        else {
            return None;
        };

        let instance = self.visualizer.id();

        match cursor.position_in(bounds) {
            Some(position) => {
                *hovered = true;
                Some(canvas::Action::publish(Message::PointerMoved {
                    instance,
                    position,
                }))
            }
            None if *hovered => {
                *hovered = false;
                Some(canvas::Action::publish(Message::PointerLeft { instance }))
            }
            None => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let colors = VisualizerColors::from_theme(theme);
        let scene = self.visualizer.scene();

        let content = self.scene_cache.draw(renderer, bounds.size(), |frame| {
            let sampled = self.visualizer.sample(self.last_frame);

            draw_floor(frame, scene, &sampled, &colors);
            draw_current_bid(frame, scene, &sampled, &colors);
            draw_curve(frame, &sampled, &colors, bounds.width);
            draw_end_marker(frame, &sampled.end_marker, &colors);
            draw_initial_price(frame, scene, &sampled, &colors);
            draw_profit_split(frame, scene, &sampled, &colors);
            draw_markers(frame, &sampled, &colors);
        });

        let tooltip = self.tooltip_cache.draw(renderer, bounds.size(), |frame| {
            draw_tooltip(frame, self.visualizer.tooltip().state(), &colors);
        });

        vec![content, tooltip]
    }
}

fn point(p: geometry::Point) -> Point {
    Point::new(p.x, p.y)
}

fn to_path(commands: &[PathCommand]) -> Path {
    Path::new(|builder| {
        for command in commands {
            match *command {
                PathCommand::MoveTo(to) => builder.move_to(point(to)),
                PathCommand::LineTo(to) => builder.line_to(point(to)),
                PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                    builder.bezier_curve_to(point(ctrl1), point(ctrl2), point(to));
                }
                PathCommand::Close => builder.close(),
            }
        }
    })
}

fn label(content: impl Into<String>, position: Point, color: Color, size: Pixels, align_x: Alignment) -> Text {
    Text {
        content: content.into(),
        position,
        size,
        font: style::MONO,
        color,
        align_x: align_x.into(),
        align_y: Alignment::Center.into(),
        ..Default::default()
    }
}

fn draw_floor(frame: &mut Frame, scene: &Scene, sampled: &SceneFrame, colors: &VisualizerColors) {
    let y = sampled.floor_y;
    let (x1, x2) = scene.floor.permanent;

    frame.stroke(
        &Path::line(Point::new(x1, y), Point::new(x2, y)),
        Stroke::with_color(
            Stroke {
                width: 1.0,
                ..Default::default()
            },
            colors.floor,
        ),
    );

    for (start, end) in &sampled.floor_active {
        frame.stroke(
            &Path::line(Point::new(*start, y), Point::new(*end, y)),
            Stroke::with_color(
                Stroke {
                    width: style::CURVE_WIDTH,
                    ..Default::default()
                },
                colors.floor_active,
            ),
        );
    }

    let x = x2 + LABEL_GAP;
    frame.fill_text(label(
        FLOOR_LABEL,
        Point::new(x, y - 8.0),
        colors.floor_active,
        style::TEXT_SIZE,
        Alignment::Start,
    ));
    frame.fill_text(label(
        scene.floor.value.as_str(),
        Point::new(x, y + 8.0),
        colors.text,
        style::LABEL_SIZE,
        Alignment::Start,
    ));
}

fn draw_current_bid(frame: &mut Frame, scene: &Scene, sampled: &SceneFrame, colors: &VisualizerColors) {
    if scene.curve.is_empty() {
        return;
    }

    let bid = sampled.current_bid;

    frame.stroke(
        &Path::line(Point::new(bid.x_start, bid.y), Point::new(bid.x_end, bid.y)),
        Stroke::with_color(
            Stroke {
                width: 1.0,
                line_dash: LineDash {
                    segments: &[3.0, 3.0],
                    offset: 0,
                },
                ..Default::default()
            },
            colors.current_bid,
        ),
    );

    if bid.label_opacity > 0.0 {
        frame.fill_text(label(
            scene.current_bid.label.as_str(),
            Point::new(bid.x_end + LABEL_GAP, bid.y),
            colors.text.scale_alpha(bid.label_opacity),
            style::PRICE_SIZE,
            Alignment::Start,
        ));
    }
}

/// Full curve in the below-floor style, then the part above the floor again on top.
fn draw_curve(frame: &mut Frame, sampled: &SceneFrame, colors: &VisualizerColors, width: f32) {
    if sampled.curve.is_empty() || sampled.curve.is_degenerate() {
        return;
    }

    let path = to_path(sampled.curve.commands());
    let stroke = |color: Color| {
        Stroke::with_color(
            Stroke {
                width: style::CURVE_WIDTH,
                ..Default::default()
            },
            color,
        )
    };

    frame.stroke(&path, stroke(colors.curve_below));

    if sampled.above_clip_height > 0.0 {
        let clip = Rectangle::new(Point::ORIGIN, Size::new(width, sampled.above_clip_height));
        frame.with_clip(clip, |frame| {
            frame.stroke(&path, stroke(colors.curve_above));
        });
    }
}

fn draw_end_marker(frame: &mut Frame, marker: &EndMarkerFrame, colors: &VisualizerColors) {
    if marker.scale <= 0.0 {
        return;
    }

    let bounds = marker.bounds;
    let head = Point::new(bounds.center().x, bounds.y + bounds.width / 2.0);
    let radius = bounds.width / 2.0 * 0.6;

    frame.stroke(
        &Path::line(head, point(marker.at)),
        Stroke::with_color(
            Stroke {
                width: 2.0 * marker.scale,
                ..Default::default()
            },
            colors.end_marker,
        ),
    );
    frame.fill(&Path::circle(head, radius), colors.end_marker);
}

fn draw_initial_price(frame: &mut Frame, scene: &Scene, sampled: &SceneFrame, colors: &VisualizerColors) {
    let rect = sampled.initial_price;
    let top_left = Point::new(rect.x, rect.y);

    frame.fill_rectangle(
        top_left,
        Size::new(rect.width, rect.height.max(0.0)),
        colors.initial_band,
    );
    frame.stroke(
        &Path::line(top_left, Point::new(rect.x + rect.width, rect.y)),
        Stroke::with_color(
            Stroke {
                width: 1.0,
                ..Default::default()
            },
            colors.initial_line,
        ),
    );

    let x = scene.initial_price.label_x + LABEL_GAP;
    frame.fill_text(label(
        INITIAL_PRICE_LABEL,
        Point::new(x, rect.y - 8.0),
        colors.weak_text,
        style::TEXT_SIZE,
        Alignment::Start,
    ));
    frame.fill_text(label(
        scene.initial_price.value.as_str(),
        Point::new(x, rect.y + 8.0),
        colors.weak_text,
        style::LABEL_SIZE,
        Alignment::Start,
    ));
}

fn draw_profit_split(frame: &mut Frame, scene: &Scene, sampled: &SceneFrame, colors: &VisualizerColors) {
    let (Some(split), Some(entrance)) = (&scene.profit_split, sampled.profit_split) else {
        return;
    };
    if entrance.progress <= 0.0 {
        return;
    }

    let alpha = entrance.progress;
    let layout = entrance.layout;
    let extend = split.line_extend;
    let line = |color: Color| {
        Stroke::with_color(
            Stroke {
                width: 1.0,
                ..Default::default()
            },
            color.scale_alpha(alpha),
        )
    };

    frame.with_save(|frame| {
        frame.translate(Vector::new(split.origin.x, split.origin.y));

        frame.stroke(&Path::line(Point::ORIGIN, Point::new(extend, 0.0)), line(colors.split_line));
        frame.stroke(
            &Path::line(Point::new(0.0, layout.height), Point::new(extend, layout.height)),
            line(colors.split_line),
        );
        frame.stroke(
            &Path::line(Point::new(extend / 2.0, 0.0), Point::new(extend / 2.0, layout.height)),
            line(colors.split_line),
        );

        frame.fill_text(label(
            split.labels.final_price.as_str(),
            Point::new((BAR_WIDTH + extend) / 2.0, -14.0),
            colors.text.scale_alpha(alpha),
            style::PRICE_SIZE,
            Alignment::Center,
        ));

        if layout.guarantor_visible {
            let y = layout.middle_y;
            frame.stroke(&Path::line(Point::new(0.0, y), Point::new(extend, y)), line(colors.split_line));
            frame.fill_text(label(
                PROFIT_SPLIT_LABEL,
                Point::new(extend + BAR_WIDTH + BAR_PADDING * 2.0 + LABEL_GAP, y),
                colors.weak_text.scale_alpha(alpha),
                style::TEXT_SIZE,
                Alignment::Start,
            ));
            frame.fill_text(label(
                split.labels.guarantor_percent.as_str(),
                Point::new(extend / 2.0 - LABEL_GAP, y - 8.0),
                colors.guarantor.scale_alpha(alpha),
                style::TEXT_SIZE,
                Alignment::End,
            ));
            frame.fill_text(label(
                split.labels.consignor_percent.as_str(),
                Point::new(extend / 2.0 - LABEL_GAP, y + 8.0),
                colors.consignor.scale_alpha(alpha),
                style::TEXT_SIZE,
                Alignment::End,
            ));
        }

        frame.translate(Vector::new(extend / 2.0, 0.0));

        let bar_label = |text: &str, bar_y: f32, bar_height: f32| {
            label(
                text,
                Point::new(BAR_WIDTH / 2.0 + BAR_PADDING, bar_y + bar_height / 2.0),
                colors.text.scale_alpha(alpha),
                style::TEXT_SIZE,
                Alignment::Center,
            )
        };
        let bar_value = |text: &str, bar_y: f32, bar_height: f32| {
            label(
                text,
                Point::new(BAR_WIDTH + BAR_PADDING + LABEL_GAP, bar_y + bar_height / 2.0),
                colors.text.scale_alpha(alpha),
                style::LABEL_SIZE,
                Alignment::Start,
            )
        };

        if layout.guarantor_visible {
            let bar = layout.guarantor;
            frame.fill_rectangle(
                Point::new(BAR_PADDING, bar.y),
                Size::new(BAR_WIDTH, bar.height),
                colors.guarantor.scale_alpha(alpha),
            );
            if bar.height > 0.0 {
                frame.fill_text(bar_label(GUARANTOR_LABEL, bar.y, bar.height));
                frame.fill_text(bar_value(&split.labels.guarantor_value, bar.y, bar.height));
            }
        }

        let bar = layout.consignor;
        frame.fill_rectangle(
            Point::new(BAR_PADDING, bar.y),
            Size::new(BAR_WIDTH, bar.height),
            colors.consignor.scale_alpha(alpha),
        );
        frame.fill_rectangle(
            Point::new(BAR_PADDING, bar.y),
            Size::new(BAR_WIDTH, layout.consignor_above_floor.min(bar.height)),
            colors.consignor_above_floor.scale_alpha(alpha),
        );
        frame.fill_text(bar_label(CONSIGNOR_LABEL, bar.y, bar.height));
        frame.fill_text(bar_value(&split.labels.consignor_value, bar.y, bar.height));

        if let Some([first, second]) = split.message() {
            let x = BAR_WIDTH + BAR_PADDING + LABEL_GAP;
            let top = BAR_PADDING + style::LABEL_SIZE.0 / 2.0;
            for (i, row) in [first, second].into_iter().enumerate() {
                frame.fill_text(label(
                    row,
                    Point::new(x, top + i as f32 * style::LABEL_SIZE.0),
                    colors.guarantor.scale_alpha(alpha),
                    style::LABEL_SIZE,
                    Alignment::Start,
                ));
            }
        }
    });
}

fn draw_markers(frame: &mut Frame, sampled: &SceneFrame, colors: &VisualizerColors) {
    for marker in &sampled.markers {
        if marker.radius <= 0.0 {
            continue;
        }

        let color = if marker.above_floor {
            colors.marker_above
        } else {
            colors.marker_below
        };
        frame.fill(&Path::circle(point(marker.center), marker.radius), color);
    }
}

fn draw_tooltip(frame: &mut Frame, state: &TooltipState, colors: &VisualizerColors) {
    if !state.visible {
        return;
    }

    let origin = point(state.position);
    let size = Size::new(state.size.width, state.size.height);

    let body = Path::rectangle(origin, size);
    frame.fill(&body, colors.tooltip_background);
    frame.stroke(
        &body,
        Stroke::with_color(
            Stroke {
                width: 1.0,
                ..Default::default()
            },
            colors.tooltip_border,
        ),
    );

    let value_x = value_column_x(&state.rows);
    for (i, row) in state.rows.iter().enumerate() {
        let y = origin.y + row_y(i);

        frame.fill_text(label(
            row.label.as_str(),
            Point::new(origin.x + text_x(), y),
            style::from_rgb(row.color),
            style::TEXT_SIZE,
            Alignment::Start,
        ));
        if !row.value.is_empty() {
            frame.fill_text(label(
                row.value.as_str(),
                Point::new(origin.x + value_x, y),
                colors.text,
                style::TEXT_SIZE,
                Alignment::Start,
            ));
        }
    }
}
