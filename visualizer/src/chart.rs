use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Theme,
};

const SMOKE_COLOR: Color = Color::from_rgb(0.95, 0.55, 0.2);
const TEMPERATURE_COLOR: Color = Color::from_rgb(0.18, 0.72, 0.89);

/// Two-trace line chart; each trace is scaled against its own threshold.
#[derive(Clone, Default)]
pub struct SensorChart {
    pub smoke: Vec<f64>,
    pub temperature: Vec<f64>,
    pub smoke_threshold: f64,
    pub temperature_threshold: f64,
}

impl SensorChart {
    pub fn smoke_color() -> Color {
        SMOKE_COLOR
    }

    pub fn temperature_color() -> Color {
        TEMPERATURE_COLOR
    }
}

/// Upper bound of the y axis: whichever of the data and the threshold is larger, plus headroom.
fn ceiling(values: &[f64], threshold: f64) -> f32 {
    let max = values.iter().cloned().fold(threshold, f64::max);
    (max * 1.15).max(1.0) as f32
}

fn trace(values: &[f64], ceiling: f32, bounds: Rectangle) -> Option<Path> {
    if values.len() < 2 {
        return None;
    }
    let step = bounds.width / (values.len() as f32 - 1.0);
    Some(Path::new(|builder| {
        for (i, value) in values.iter().enumerate() {
            let x = i as f32 * step;
            let y = bounds.height - (*value as f32 / ceiling).clamp(0.0, 1.0) * bounds.height;
            if i == 0 {
                builder.move_to(Point::new(x, y));
            } else {
                builder.line_to(Point::new(x, y));
            }
        }
    }))
}

fn threshold_line(threshold: f64, ceiling: f32, bounds: Rectangle) -> Path {
    let y = bounds.height - (threshold as f32 / ceiling).clamp(0.0, 1.0) * bounds.height;
    Path::line(Point::new(0.0, y), Point::new(bounds.width, y))
}

impl<Message> canvas::Program<Message> for SensorChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let series = [
            (&self.smoke, self.smoke_threshold, SMOKE_COLOR),
            (&self.temperature, self.temperature_threshold, TEMPERATURE_COLOR),
        ];
        for (values, threshold, color) in series {
            let top = ceiling(values, threshold);
            frame.stroke(
                &threshold_line(threshold, top, bounds),
                Stroke::default()
                    .with_width(1.0)
                    .with_color(Color { a: 0.35, ..color }),
            );
            if let Some(path) = trace(values, top, bounds) {
                frame.stroke(&path, Stroke::default().with_width(2.5).with_color(color));
            }
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_covers_threshold_and_peaks() {
        assert!(ceiling(&[10.0, 20.0], 60.0) > 60.0);
        assert!(ceiling(&[3000.0], 2600.0) > 3000.0);
        assert_eq!(ceiling(&[], 0.0), 1.0);
    }
}
