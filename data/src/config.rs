pub mod theme;
pub mod timezone;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::anim::{DEFAULT_TRANSITION, Easing, Timing};
use crate::curve::CurveType;
use crate::format::CurrencyFormat;
use crate::geometry::{Margin, Size};
use crate::tooltip::TooltipGenerator;
use theme::Rgb;
pub use timezone::UserTimezone;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid color '{0}'")]
    InvalidColor(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Display options of one visualizer. Every field falls back to its default
/// when missing from the serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub size: Size,
    pub margin: Margin,
    pub curve_type: CurveType,
    pub currency_format: CurrencyFormat,
    /// duration of the profit-split entrance
    pub ending_duration: Duration,
    pub ending_ease: Easing,
    /// duration of every other transition
    pub transition_duration: Duration,
    /// how far the profit-split lines extend past the plot on the right
    pub line_extend: f32,
    pub marker: MarkerConfig,
    pub end_marker: EndMarkerConfig,
    pub tooltip: TooltipConfig,
    pub timezone: UserTimezone,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        VisualizerConfig {
            size: Size::new(560.0, 460.0),
            margin: Margin::default(),
            curve_type: CurveType::default(),
            currency_format: CurrencyFormat::default(),
            ending_duration: Duration::from_millis(1500),
            ending_ease: Easing::CubicInOut,
            transition_duration: DEFAULT_TRANSITION,
            line_extend: 40.0,
            marker: MarkerConfig::default(),
            end_marker: EndMarkerConfig::default(),
            tooltip: TooltipConfig::default(),
            timezone: UserTimezone::default(),
        }
    }
}

impl VisualizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let plot = self.margin.inner(self.size);
        if plot.width <= 0.0 || plot.height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "margins {:?} leave no room inside {}x{}",
                self.margin, self.size.width, self.size.height
            )));
        }
        if self.marker.radius < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "negative marker radius {}",
                self.marker.radius
            )));
        }
        if self.tooltip.color_scheme.is_empty() {
            return Err(ConfigError::Invalid(
                "tooltip color scheme is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transition(&self) -> Timing {
        Timing::new(self.transition_duration, Easing::CubicInOut)
    }

    pub fn ending(&self) -> Timing {
        Timing::new(self.ending_duration, self.ending_ease)
    }

    /// The configured generator, or the standard rows in this config's formats.
    pub fn tooltip_generator(&self) -> TooltipGenerator {
        self.tooltip.generator.clone().unwrap_or_else(|| {
            TooltipGenerator::standard(self.currency_format.clone(), self.timezone)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub radius: f32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        MarkerConfig { radius: 4.0 }
    }
}

/// The marker riding the end of the curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndMarkerConfig {
    pub width: f32,
    pub height: f32,
    /// translation of the marker's top-left corner from the curve end
    pub offset: (f32, f32),
}

impl Default for EndMarkerConfig {
    fn default() -> Self {
        EndMarkerConfig {
            width: 35.0,
            height: 65.0,
            offset: (-17.0, -50.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    #[serde(skip)]
    pub generator: Option<TooltipGenerator>,
    pub offset: (f32, f32),
    pub color_scheme: Vec<Rgb>,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        TooltipConfig {
            generator: None,
            offset: (15.0, 0.0),
            color_scheme: theme::default_tooltip_scheme(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = VisualizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.curve_type, CurveType::BumpX);
        assert_eq!(config.ending().duration, Duration::from_millis(1500));
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let json = r##"{
            "size": { "width": 800.0, "height": 500.0 },
            "margin": { "top": 40.0, "right": 260.0, "bottom": 40.0, "left": 10.0 },
            "curve_type": "monotone_x",
            "currency_format": "$,.2f",
            "ending_ease": "linear",
            "marker": { "radius": 6.0 },
            "tooltip": { "color_scheme": ["#000000"] }
        }"##;
        let config: VisualizerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.size, Size::new(800.0, 500.0));
        assert_eq!(config.margin.left, 10.0);
        assert_eq!(config.curve_type, CurveType::MonotoneX);
        assert_eq!(config.currency_format.format(1000.0), "$1,000.00");
        assert_eq!(config.ending_ease, Easing::Linear);
        assert_eq!(config.marker.radius, 6.0);
        assert_eq!(config.tooltip.color_scheme, vec![Rgb::new(0, 0, 0)]);
        assert_eq!(config.tooltip.offset, (15.0, 0.0));
        assert_eq!(config.line_extend, 40.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_color_fails_to_parse() {
        let json = r##"{ "tooltip": { "color_scheme": ["#12"] } }"##;
        assert!(serde_json::from_str::<VisualizerConfig>(json).is_err());
    }

    #[test]
    fn oversized_margins_are_rejected() {
        let config = VisualizerConfig {
            size: Size::new(200.0, 460.0),
            ..VisualizerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn custom_generator_takes_precedence() {
        let mut config = VisualizerConfig::default();
        config.tooltip.generator = Some(TooltipGenerator::new(|bid, _| {
            vec![("Price".to_string(), bid.price.to_string())]
        }));

        let bid = crate::auction::Bid::new(0, 12.5, "x");
        assert_eq!(
            config.tooltip_generator().rows(&bid, 0),
            vec![("Price".to_string(), "12.5".to_string())]
        );
    }
}
