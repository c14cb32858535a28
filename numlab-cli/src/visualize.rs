use std::path::Path;

use numlab::{Interval, ScalarFunction};
use plotters::{coord::types::RangedCoordf64, prelude::*};

const CURVE_COLORS: [RGBColor; 3] = [
    RGBColor(0x58, 0x50, 0x8d),
    RGBColor(0xff, 0x63, 0x61),
    RGBColor(0xbc, 0x50, 0x90),
];
const MARKER_COLOR: RGBColor = RGBColor(0xff, 0xa6, 0x00);

const LABEL_STYLE: (&str, i32) = ("sans-serif", 30);

/// Points per sampled function curve.
const SAMPLES: usize = 400;

/// Curves and labelled points to draw on one chart.
#[derive(Debug, Default)]
pub struct Plot {
    pub(crate) curves: Vec<Curve>,
    pub(crate) markers: Vec<Marker>,
}

#[derive(Debug)]
pub(crate) struct Curve {
    pub(crate) label: String,
    pub(crate) points: Vec<(f64, f64)>,
}

#[derive(Debug)]
pub(crate) struct Marker {
    pub(crate) label: String,
    pub(crate) point: (f64, f64),
}

impl Plot {
    pub fn curve(mut self, label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        self.curves.push(Curve {
            label: label.into(),
            points,
        });
        self
    }

    /// Sample `f` across the interval. Points where it can't be evaluated are left out.
    pub fn function<F>(self, label: impl Into<String>, f: &F, interval: Interval) -> Self
    where
        F: ScalarFunction + ?Sized,
    {
        let points = (0..=SAMPLES)
            .filter_map(|i| {
                let x = interval.lo() + interval.length() * i as f64 / SAMPLES as f64;
                f.eval(x).ok().filter(|y| y.is_finite()).map(|y| (x, y))
            })
            .collect();
        self.curve(label, points)
    }

    pub fn marker(mut self, label: impl Into<String>, x: f64, y: f64) -> Self {
        self.markers.push(Marker {
            label: label.into(),
            point: (x, y),
        });
        self
    }

    fn bounds(&self) -> Bounds {
        let (xs, ys): (Vec<_>, Vec<_>) = self
            .curves
            .iter()
            .flat_map(|c| c.points.iter().copied())
            .chain(self.markers.iter().map(|m| m.point))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .unzip();
        let (min_x, max_x) = padded(&xs);
        let (min_y, max_y) = padded(&ys);
        Bounds {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

/// Span of the chart area
#[derive(Debug)]
struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

/// Smallest and largest value, widened by 5% of the span (or by 1 if there is no span).
fn padded(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = values.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let padding = if max > min { 0.05 * (max - min) } else { 1.0 };
    (min - padding, max + padding)
}

pub fn save_png(title: &str, plot: &Plot, output_path: &Path) -> anyhow::Result<()> {
    let bounds = plot.bounds();
    let width = 800;
    let height = 600;
    let dpi_scale = 2;
    let root = BitMapBackend::new(output_path, (width * dpi_scale, height * dpi_scale))
        .into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .caption(title, ("sans-serif", 50))
        .build_cartesian_2d(bounds.min_x..bounds.max_x, bounds.min_y..bounds.max_y)?;

    draw_axes(&mut chart)?;

    for (curve, color) in plot.curves.iter().zip(CURVE_COLORS.iter().copied().cycle()) {
        chart
            .draw_series(LineSeries::new(
                curve.points.iter().copied(),
                color.stroke_width(3),
            ))?
            .label(curve.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(3)));
    }

    for marker in &plot.markers {
        draw_marker(&mut chart, marker)?;
    }

    if !plot.curves.is_empty() {
        chart
            .configure_series_labels()
            .label_font(LABEL_STYLE)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    // Finished.
    root.present()?;
    Ok(())
}

fn draw_axes<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
) -> anyhow::Result<()>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    chart
        .configure_mesh()
        .label_style(LABEL_STYLE) // axis labels
        .axis_desc_style(LABEL_STYLE) // x/y axis captions
        .draw()?;

    // Overlay bold black axes at x=0 and y=0, where they're in view.
    let x_range = chart.as_coord_spec().x_spec().range();
    let y_range = chart.as_coord_spec().y_spec().range();

    if x_range.contains(&0.0) {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, y_range.start), (0.0, y_range.end)],
            BLACK.stroke_width(3),
        )))?;
    }
    if y_range.contains(&0.0) {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x_range.start, 0.0), (x_range.end, 0.0)],
            BLACK.stroke_width(3),
        )))?;
    }
    Ok(())
}

fn draw_marker<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    marker: &Marker,
) -> anyhow::Result<()>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    chart.draw_series(PointSeries::of_element(
        vec![marker.point],
        8,
        &MARKER_COLOR,
        &|coord, size, style| {
            EmptyElement::at(coord)
                + plotters::prelude::Circle::new((0, 0), size, style.filled())
                + Text::new(marker.label.clone(), (10, -10), LABEL_STYLE.into_font())
        },
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_curves_and_markers() {
        let plot = Plot::default()
            .curve("line", vec![(0.0, 0.0), (10.0, 5.0)])
            .marker("far", 20.0, -5.0);
        let bounds = plot.bounds();
        for (actual, expected) in [
            (bounds.min_x, -1.0),
            (bounds.max_x, 21.0),
            (bounds.min_y, -5.5),
            (bounds.max_y, 5.5),
        ] {
            assert!((actual - expected).abs() < 1e-9, "{bounds:?}");
        }
    }

    #[test]
    fn flat_data_still_has_a_span() {
        let plot = Plot::default().marker("only", 2.0, 3.0);
        let bounds = plot.bounds();
        assert!(bounds.min_x < 2.0 && 2.0 < bounds.max_x);
        assert!(bounds.min_y < 3.0 && 3.0 < bounds.max_y);
    }

    #[test]
    fn sampled_functions_skip_undefined_points() {
        let interval = Interval::new(-1.0, 1.0).unwrap();
        let plot = Plot::default().function("sqrt", &|x: f64| x.sqrt(), interval);
        let points = &plot.curves[0].points;
        // Only x >= 0 survives: the midpoint and everything right of it.
        assert_eq!(points.len(), SAMPLES / 2 + 1);
        assert!(points.iter().all(|&(x, _)| x >= 0.0));
    }
}
