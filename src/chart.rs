//! Daily price chart rendered as SVG

use plotters::prelude::*;

use crate::analysis::{DailySeries, PriceBand, Summary, TariffSection};
use crate::error::{PvpcError, Result};
use crate::report::spanish_title;
use crate::settings::ColorScheme;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

const RED: RGBColor = RGBColor(220, 40, 40);
const ORANGE: RGBColor = RGBColor(255, 152, 0);
const GREEN: RGBColor = RGBColor(76, 175, 80);

/// One colored marker group of the chart
struct MarkerGroup {
    legend: String,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

fn legend(name: &str, scheme: ColorScheme) -> String {
    match scheme {
        ColorScheme::Sections => format!("Horas {}", name),
        ColorScheme::Percentiles => format!("Horas {} según precios relativos", name),
    }
}

fn marker_groups(series: &DailySeries, summary: &Summary, scheme: ColorScheme) -> Vec<MarkerGroup> {
    let styles = [("Punta", RED), ("Llano", ORANGE), ("Valle", GREEN)];
    let mut groups: Vec<MarkerGroup> = styles
        .iter()
        .map(|(name, color)| MarkerGroup {
            legend: legend(name, scheme),
            color: *color,
            points: Vec::new(),
        })
        .collect();

    for point in series.points() {
        let slot = match scheme {
            ColorScheme::Sections => match point.tariff_section {
                TariffSection::Peak => 0,
                TariffSection::Mid => 1,
                TariffSection::Valley => 2,
            },
            ColorScheme::Percentiles => match summary.band(point.price) {
                PriceBand::High => 0,
                PriceBand::Mid => 1,
                PriceBand::Valley => 2,
            },
        };
        if let Some(group) = groups.get_mut(slot) {
            group.points.push((point.hour_index as f64, point.price));
        }
    }

    groups.retain(|g| !g.points.is_empty());
    groups
}

/// File name the chart is sent under, e.g. `percentiles_20220103.svg`
pub fn chart_file_name(series: &DailySeries, scheme: ColorScheme) -> String {
    let stem = match scheme {
        ColorScheme::Percentiles => "percentiles",
        ColorScheme::Sections => "sections",
    };
    format!("{}_{}.svg", stem, series.date().format("%Y%m%d"))
}

/// Render the price line, both percentile lines and the colored hourly
/// markers of a series
pub fn render_price_chart(
    series: &DailySeries,
    summary: &Summary,
    scheme: ColorScheme,
) -> Result<String> {
    if series.is_empty() {
        return Err(PvpcError::no_data(series.date().to_string()));
    }

    let prices: Vec<(f64, f64)> = series
        .points()
        .iter()
        .map(|p| (p.hour_index as f64, p.price))
        .collect();
    let max_price = prices.iter().map(|(_, p)| *p).fold(f64::NEG_INFINITY, f64::max);
    let min_price = prices.iter().map(|(_, p)| *p).fold(f64::INFINITY, f64::min);
    let padding = ((max_price - min_price) * 0.1).max(0.001);
    let x_max = prices.last().map_or(1.0, |(x, _)| x.max(1.0));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let title = spanish_title(series.date());
        let mut chart = ChartBuilder::on(&root)
            .caption(&title, ("monospace", 22).into_font().style(FontStyle::Italic))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..x_max, (min_price - padding)..(max_price + padding))
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_desc("Tiempo (horas)")
            .y_desc("Precio (€/kWh)")
            .x_labels(prices.len().max(2))
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("{:.3}", y))
            .label_style(("monospace", 12))
            .draw()
            .map_err(chart_error)?;

        for threshold in [summary.low_percentile, summary.high_percentile] {
            chart
                .draw_series(DashedLineSeries::new(
                    [(0.0, threshold), (x_max, threshold)],
                    4,
                    4,
                    BLACK.stroke_width(1),
                ))
                .map_err(chart_error)?;
        }

        chart
            .draw_series(LineSeries::new(prices.iter().copied(), BLACK.stroke_width(2)))
            .map_err(chart_error)?;

        for group in marker_groups(series, summary, scheme) {
            let color = group.color;
            chart
                .draw_series(
                    group
                        .points
                        .iter()
                        .map(move |&(x, y)| Circle::new((x, y), 5, color.filled())),
                )
                .map_err(chart_error)?
                .label(group.legend)
                .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("monospace", 12))
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    Ok(svg)
}

fn chart_error<E: std::fmt::Display>(e: E) -> PvpcError {
    PvpcError::chart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::summarize;
    use crate::esios::Zone;
    use chrono::NaiveDate;

    fn series() -> DailySeries {
        let hourly: Vec<(f64, TariffSection)> = (0..24u8)
            .map(|h| {
                let section = match h {
                    0..=7 => TariffSection::Valley,
                    10..=13 | 18..=21 => TariffSection::Peak,
                    _ => TariffSection::Mid,
                };
                (0.1 + f64::from(h) * 0.01, section)
            })
            .collect();
        DailySeries::from_hourly(
            NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
            Zone::Peninsula,
            &hourly,
        )
    }

    #[test]
    fn renders_svg_with_labels() {
        let s = series();
        let summary = summarize(&s, 25, 70).unwrap();
        let svg = render_price_chart(&s, &summary, ColorScheme::Sections).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Tiempo (horas)"));
        assert!(svg.contains("Horas Punta"));
    }

    #[test]
    fn legends_follow_scheme() {
        assert_eq!(legend("Valle", ColorScheme::Sections), "Horas Valle");
        assert_eq!(
            legend("Valle", ColorScheme::Percentiles),
            "Horas Valle según precios relativos"
        );
    }

    #[test]
    fn file_names_by_scheme() {
        assert_eq!(
            chart_file_name(&series(), ColorScheme::Percentiles),
            "percentiles_20220103.svg"
        );
    }

    #[test]
    fn empty_groups_are_dropped() {
        let s = series();
        let summary = summarize(&s, 25, 70).unwrap();
        let groups = marker_groups(&s, &summary, ColorScheme::Sections);
        assert_eq!(groups.len(), 3);
        let total: usize = groups.iter().map(|g| g.points.len()).sum();
        assert_eq!(total, 24);
    }
}
