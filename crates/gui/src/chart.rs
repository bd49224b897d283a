//! Line chart drawn on an Iced canvas, plus the [`DisplaySurface`] the render
//! loop's frames are presented to.

use iced::widget::canvas::{self, Cache, Frame, Path, Stroke, Text};
use iced::{mouse, Pixels, Point, Rectangle};
use tempgraph_core::{DisplaySurface, Result};
use tempgraph_render::PLACEHOLDER;
use tempgraph_theme::Theme;

/// Horizontal grid lines (including top and bottom edges).
const GRID_DIVISIONS: usize = 5;
/// Left gutter reserved for y-axis labels.
const GUTTER: f32 = 44.0;
/// Line height of the y-axis labels.
const LABEL_HEIGHT: f32 = 14.0;

/// Latest-value label and chart, owned by the display task.
pub struct Surface {
    pub label: String,
    pub chart: Chart,
}

impl Surface {
    pub fn new(theme: &Theme, y_range: (f64, f64)) -> Self {
        Self {
            label: PLACEHOLDER.to_string(),
            chart: Chart::new(theme, y_range),
        }
    }
}

impl DisplaySurface for Surface {
    fn set_latest_value_label(&mut self, text: &str) -> Result<()> {
        if self.label != text {
            self.label = text.to_string();
        }
        Ok(())
    }

    fn set_series_points(&mut self, points: &[(f64, f64)]) -> Result<()> {
        if self.chart.points != points {
            self.chart.points = points.to_vec();
            self.chart.cache.clear();
        }
        Ok(())
    }

    fn set_axis_range(&mut self, x_min: f64, x_max: f64) -> Result<()> {
        if self.chart.x_range != (x_min, x_max) {
            self.chart.x_range = (x_min, x_max);
            self.chart.cache.clear();
        }
        Ok(())
    }

    fn set_value_range(&mut self, y_min: f64, y_max: f64) -> Result<()> {
        if self.chart.y_range != (y_min, y_max) {
            self.chart.y_range = (y_min, y_max);
            self.chart.cache.clear();
        }
        Ok(())
    }
}

/// Plotted series with its axis ranges.  Geometry is cached and only rebuilt
/// when the data, ranges or colours change, so an idle tick is a cheap
/// repaint.
pub struct Chart {
    points:  Vec<(f64, f64)>,
    x_range: (f64, f64),
    y_range: (f64, f64),
    line:    iced::Color,
    fill:    iced::Color,
    grid:    iced::Color,
    text:    iced::Color,
    cache:   Cache,
}

impl Chart {
    fn new(theme: &Theme, y_range: (f64, f64)) -> Self {
        let mut chart = Self {
            points:  Vec::new(),
            x_range: (0.0, 0.0),
            y_range,
            line:    iced::Color::BLACK,
            fill:    iced::Color::TRANSPARENT,
            grid:    iced::Color::BLACK,
            text:    iced::Color::BLACK,
            cache:   Cache::new(),
        };
        chart.set_palette(theme);
        chart
    }

    /// Re-colour after a theme reload.
    pub fn set_palette(&mut self, theme: &Theme) {
        self.line = theme.accent.to_iced();
        self.fill = theme.area_fill().to_iced();
        self.grid = theme.grid.to_iced();
        self.text = theme.foreground.with_alpha(0.7).to_iced();
        self.cache.clear();
    }

    fn paint(&self, frame: &mut Frame) {
        let size = frame.size();
        let plot = Rectangle {
            x:      GUTTER,
            y:      0.0,
            width:  (size.width - GUTTER).max(1.0),
            height: size.height,
        };

        frame.stroke(
            &Path::rectangle(plot.position(), plot.size()),
            Stroke::default().with_color(self.grid).with_width(1.0),
        );

        for i in 0..=GRID_DIVISIONS {
            let t = i as f64 / GRID_DIVISIONS as f64;
            let value = self.y_range.1 - t * (self.y_range.1 - self.y_range.0);
            let y = plot.y + t as f32 * plot.height;

            frame.stroke(
                &Path::line(Point::new(plot.x, y), Point::new(plot.x + plot.width, y)),
                Stroke::default().with_color(self.grid).with_width(0.5),
            );
            frame.fill_text(Text {
                content:  format!("{value:.0}"),
                position: Point::new(4.0, label_top(y, size.height)),
                color:    self.text,
                size:     Pixels(11.0),
                ..Text::default()
            });
        }

        let screen: Vec<Point> = self
            .points
            .iter()
            .map(|&(x, y)| to_screen((x, y), self.x_range, self.y_range, plot))
            .collect();

        let (Some(first), Some(last)) = (screen.first(), screen.last()) else {
            return;
        };

        let area = Path::new(|b| {
            b.move_to(Point::new(first.x, plot.y + plot.height));
            for p in &screen {
                b.line_to(*p);
            }
            b.line_to(Point::new(last.x, plot.y + plot.height));
            b.close();
        });
        frame.fill(&area, self.fill);

        let line = Path::new(|b| {
            b.move_to(*first);
            for p in &screen[1..] {
                b.line_to(*p);
            }
        });
        frame.stroke(&line, Stroke::default().with_color(self.line).with_width(2.0));
    }
}

impl<Message> canvas::Program<Message> for Chart {
    type State = ();

    fn draw(
        &self,
        _state: &(),
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        vec![self.cache.draw(renderer, bounds.size(), |frame| self.paint(frame))]
    }
}

/// Top of a y-axis label centred on grid line `y`, kept inside a canvas of
/// `height`.  A canvas shorter than one label pins it to the top edge.
fn label_top(y: f32, height: f32) -> f32 {
    (y - LABEL_HEIGHT / 2.0).clamp(0.0, (height - LABEL_HEIGHT).max(0.0))
}

/// Map a data point into `plot`, clamping values outside the y-range to its
/// edges.  A zero-width x-range puts every point on the left edge.
fn to_screen(
    (x, y): (f64, f64),
    (x_min, x_max): (f64, f64),
    (y_min, y_max): (f64, f64),
    plot: Rectangle,
) -> Point {
    let fx = if x_max > x_min { (x - x_min) / (x_max - x_min) } else { 0.0 };
    let fy = if y_max > y_min { (y - y_min) / (y_max - y_min) } else { 0.5 };

    Point::new(
        plot.x + fx.clamp(0.0, 1.0) as f32 * plot.width,
        plot.y + (1.0 - fy.clamp(0.0, 1.0)) as f32 * plot.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot() -> Rectangle {
        Rectangle { x: 0.0, y: 0.0, width: 100.0, height: 150.0 }
    }

    #[test]
    fn maps_corners() {
        let lo = to_screen((0.0, -50.0), (0.0, 10.0), (-50.0, 100.0), plot());
        let hi = to_screen((10.0, 100.0), (0.0, 10.0), (-50.0, 100.0), plot());
        assert_eq!(lo, Point::new(0.0, 150.0));
        assert_eq!(hi, Point::new(100.0, 0.0));
    }

    #[test]
    fn clamps_out_of_range_values() {
        let p = to_screen((5.0, 250.0), (0.0, 10.0), (-50.0, 100.0), plot());
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn zero_width_axis_does_not_divide_by_zero() {
        let p = to_screen((0.0, 25.0), (0.0, 0.0), (-50.0, 100.0), plot());
        assert_eq!(p.x, 0.0);
        assert!(p.y.is_finite());
    }

    #[test]
    fn labels_stay_inside_a_normal_canvas() {
        assert_eq!(label_top(0.0, 300.0), 0.0);
        assert_eq!(label_top(150.0, 300.0), 143.0);
        assert_eq!(label_top(300.0, 300.0), 286.0);
    }

    #[test]
    fn labels_on_a_canvas_shorter_than_one_line() {
        for i in 0..=GRID_DIVISIONS {
            let y = i as f32 / GRID_DIVISIONS as f32 * 10.0;
            assert_eq!(label_top(y, 10.0), 0.0);
        }
        assert_eq!(label_top(0.0, 0.0), 0.0);
    }

    #[test]
    fn surface_records_frame_parts() {
        let mut surface = Surface::new(&Theme::default(), (-50.0, 100.0));
        assert_eq!(surface.label, PLACEHOLDER);

        surface.set_latest_value_label("Current: 21.0°C").unwrap();
        surface.set_series_points(&[(0.0, 20.5), (1.0, 21.0)]).unwrap();
        surface.set_axis_range(0.0, 2.0).unwrap();
        surface.set_value_range(10.0, 30.0).unwrap();

        assert_eq!(surface.label, "Current: 21.0°C");
        assert_eq!(surface.chart.points, vec![(0.0, 20.5), (1.0, 21.0)]);
        assert_eq!(surface.chart.x_range, (0.0, 2.0));
        assert_eq!(surface.chart.y_range, (10.0, 30.0));
    }
}
