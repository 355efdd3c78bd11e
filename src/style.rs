use iced::{Color, Font, Pixels, Theme};
use palette::{Darken, Desaturate, Hsl, IntoColor, Lighten, Srgb};

pub const TEXT_SIZE: Pixels = Pixels(11.0);
pub const LABEL_SIZE: Pixels = Pixels(12.0);
pub const PRICE_SIZE: Pixels = Pixels(16.0);
pub const MONO: Font = Font::MONOSPACE;

pub const CURVE_WIDTH: f32 = 3.0;

pub fn from_rgb(color: data::Rgb) -> Color {
    Color::from_rgb8(color.r, color.g, color.b)
}

fn map_hsl(color: Color, f: impl FnOnce(Hsl) -> Hsl) -> Color {
    let hsl: Hsl = Srgb::new(color.r, color.g, color.b).into_color();
    let srgb: Srgb = f(hsl).into_color();

    Color {
        r: srgb.red.clamp(0.0, 1.0),
        g: srgb.green.clamp(0.0, 1.0),
        b: srgb.blue.clamp(0.0, 1.0),
        a: color.a,
    }
}

pub fn lighten(color: Color, amount: f32) -> Color {
    map_hsl(color, |hsl| hsl.lighten(amount))
}

pub fn darken(color: Color, amount: f32) -> Color {
    map_hsl(color, |hsl| hsl.darken(amount))
}

pub fn desaturate(color: Color, amount: f32) -> Color {
    map_hsl(color, |hsl| hsl.desaturate(amount))
}

/// Colors of every visualizer element, derived from the app theme.
#[derive(Debug, Clone, Copy)]
pub struct VisualizerColors {
    pub text: Color,
    pub weak_text: Color,
    pub curve_above: Color,
    pub curve_below: Color,
    pub floor: Color,
    pub floor_active: Color,
    pub current_bid: Color,
    pub initial_band: Color,
    pub initial_line: Color,
    pub marker_above: Color,
    pub marker_below: Color,
    pub end_marker: Color,
    pub guarantor: Color,
    pub consignor: Color,
    pub consignor_above_floor: Color,
    pub split_line: Color,
    pub tooltip_background: Color,
    pub tooltip_border: Color,
}

impl VisualizerColors {
    pub fn from_theme(theme: &Theme) -> Self {
        let palette = theme.extended_palette();

        let text = palette.background.base.text;
        let above = palette.success.base.color;
        let below = palette.primary.base.color;
        let floor = palette.danger.base.color;

        let shade = |color: Color, amount: f32| {
            if palette.is_dark {
                darken(color, amount)
            } else {
                lighten(color, amount)
            }
        };

        VisualizerColors {
            text,
            weak_text: text.scale_alpha(0.6),
            curve_above: above,
            curve_below: desaturate(below, 0.4),
            floor: floor.scale_alpha(0.4),
            floor_active: floor,
            current_bid: text.scale_alpha(0.5),
            initial_band: shade(palette.secondary.base.color, 0.2).scale_alpha(0.25),
            initial_line: palette.secondary.strong.color,
            marker_above: lighten(above, 0.1),
            marker_below: lighten(below, 0.1),
            end_marker: above,
            guarantor: shade(floor, 0.15),
            consignor: shade(below, 0.15),
            consignor_above_floor: above.scale_alpha(0.6),
            split_line: text.scale_alpha(0.7),
            tooltip_background: palette.background.weak.color.scale_alpha(0.95),
            tooltip_border: palette.background.strong.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_convert() {
        let color = from_rgb(data::Rgb::new(255, 0, 0));
        assert_eq!(color, Color::from_rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn shading_keeps_alpha() {
        let color = Color::from_rgba(0.2, 0.4, 0.6, 0.5);
        assert_eq!(lighten(color, 0.2).a, 0.5);
        assert_eq!(darken(color, 0.2).a, 0.5);

        let grey = desaturate(color, 1.0);
        assert!((grey.r - grey.g).abs() < 1e-4 && (grey.g - grey.b).abs() < 1e-4);
    }
}
