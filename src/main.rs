#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod demo;
mod logger;
mod style;
mod visualizer;

use data::{ConfigError, Phase, VisualizerConfig};
use demo::{DemoFeed, Script};
use visualizer::AuctionChart;

use iced::{
    Alignment, Element, Length, Subscription, Task, Theme,
    widget::{button, column, container, row, text},
};
use std::time::Instant;

fn main() {
    logger::setup(cfg!(debug_assertions)).expect("Failed to initialize logger");

    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map_or_else(
            || "unknown location".to_string(),
            |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
        );
        let msg = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        log::error!("PANIC at {location}: {msg}");
        eprintln!("PANIC at {location}: {msg}");
        let bt = std::backtrace::Backtrace::force_capture();
        eprintln!("Backtrace:\n{bt}");
    }));

    let _ = iced::application(AuctionDemo::new, AuctionDemo::update, AuctionDemo::view)
        .title(AuctionDemo::title)
        .theme(AuctionDemo::theme)
        .subscription(AuctionDemo::subscription)
        .antialiasing(true)
        .window_size(iced::Size::new(720.0, 600.0))
        .run();
}

struct AuctionDemo {
    chart: AuctionChart,
    demo: DemoFeed,
}

#[derive(Debug, Clone)]
enum Message {
    Chart(visualizer::Message),
    Start(Script),
    BidTick(Instant),
    Frame(Instant),
}

impl AuctionDemo {
    fn new() -> (Self, Task<Message>) {
        let params = demo::parameters();
        let mut chart = AuctionChart::new(params, load_config());

        let demo = DemoFeed::start(Script::AboveEnding, now_ms(), &params);
        chart.set_feed(demo.feed().clone(), Instant::now());

        (Self { chart, demo }, Task::none())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Chart(message) => self.chart.update(message),
            Message::Start(script) => {
                self.chart.reset();
                self.demo = DemoFeed::start(script, now_ms(), self.chart.visualizer().params());
                self.chart.set_feed(self.demo.feed().clone(), Instant::now());
            }
            Message::BidTick(_) => {
                if let Some(feed) = self.demo.tick() {
                    self.chart.set_feed(feed.clone(), Instant::now());
                }
            }
            Message::Frame(now) => self.chart.tick(now),
        }

        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let controls = row(Script::ALL.into_iter().map(|script| {
            button(text(script.to_string()))
                .on_press(Message::Start(script))
                .into()
        }))
        .spacing(8);

        let vis = self.chart.visualizer();
        let status = match vis.phase() {
            Phase::Idle => "Waiting for bids".to_string(),
            Phase::Live => format!("Live: {} bids", vis.feed().prices.len().saturating_sub(1)),
            Phase::Settled => format!("Settled: {}", self.demo.script()),
        };

        let content = column![
            controls,
            self.chart.view().map(Message::Chart),
            text(status).size(12),
        ]
        .spacing(12)
        .align_x(Alignment::Center);

        container(content).center(Length::Fill).into()
    }

    fn title(&self) -> String {
        "Auction Visualizer".to_string()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        let bids = if self.demo.is_running() {
            iced::time::every(demo::BID_INTERVAL).map(Message::BidTick)
        } else {
            Subscription::none()
        };

        let frames = if self.chart.is_animating() {
            iced::window::frames().map(Message::Frame)
        } else {
            Subscription::none()
        };

        Subscription::batch(vec![bids, frames])
    }
}

fn load_config() -> VisualizerConfig {
    match data::load_config(data::CONFIG_PATH) {
        Ok(config) => {
            log::info!("Loaded visualizer config from {:?}", data::data_path(Some(data::CONFIG_PATH)));
            config
        }
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No config file found, writing defaults");
            let config = VisualizerConfig::default();
            if let Err(e) = data::save_config(&config, data::CONFIG_PATH) {
                log::warn!("Failed to save default config: {e}");
            }
            config
        }
        Err(e) => {
            log::warn!("Failed to load config, using defaults: {e}");
            VisualizerConfig::default()
        }
    }
}

fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
