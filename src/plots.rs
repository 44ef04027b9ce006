//! Chart rendering for the cleaned page view series
//!
//! Each renderer draws one PNG through plotters' bitmap backend. The backend
//! is owned by the drawing function, so the file is flushed by `present()` and
//! released when the function returns.

use std::path::{Path, PathBuf};

use chrono::Duration;
use clap::ValueEnum;
use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::aggregate;
use crate::models::{BoxStats, MonthlyAverages, PageViewTable, PartitionGroup, MONTH_NAMES};

const LINE_PLOT_SIZE: (u32, u32) = (1500, 500);
const BAR_PLOT_SIZE: (u32, u32) = (1200, 800);
const BOX_PLOT_SIZE: (u32, u32) = (1500, 600);

const LINE_TITLE: &str = "Daily freeCodeCamp Forum Page Views 5/2016-12/2019";
const YEAR_BOX_TITLE: &str = "Year-wise Box Plot (Trend)";
const MONTH_BOX_TITLE: &str = "Month-wise Box Plot (Seasonality)";

/// Fixed y ticks on the trend panel: 0, 20 000, ..., 200 000.
const YEAR_TICK_STEP: f64 = 20_000.0;
const YEAR_TICK_MAX: f64 = 200_000.0;

const CLUSTER_WIDTH: f64 = 0.8;
const BOX_HALF_WIDTH: f64 = 0.25;
const MEDIAN_COLOR: RGBColor = RGBColor(255, 127, 14);

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Chart {
    Line,
    Bar,
    Box,
}

impl Chart {
    pub const ALL: [Chart; 3] = [Chart::Line, Chart::Bar, Chart::Box];

    pub fn file_name(self) -> &'static str {
        match self {
            Chart::Line => "line_plot.png",
            Chart::Bar => "bar_plot.png",
            Chart::Box => "box_plot.png",
        }
    }
}

/// Derives whatever the chart needs from `cleaned` and writes it into `out_dir`.
pub fn render_chart(chart: Chart, cleaned: &PageViewTable, out_dir: &Path) -> Result<PathBuf> {
    let output_path = out_dir.join(chart.file_name());
    match chart {
        Chart::Line => draw_line_plot(cleaned, &output_path)?,
        Chart::Bar => draw_bar_plot(&aggregate::monthly_averages(cleaned), &output_path)?,
        Chart::Box => draw_box_plot(
            &aggregate::year_partition(cleaned),
            &aggregate::month_partition(cleaned),
            &output_path,
        )?,
    }
    info!(chart = ?chart, path = %output_path.display(), "chart written");
    Ok(output_path)
}

/// Plain integer tick labels, e.g. `120000` rather than `1.2e5`.
fn format_count(value: f64) -> String {
    format!("{:.0}", value)
}

/// Top of the trend panel and its tick count.
///
/// The axis always reaches 200 000 and grows with headroom when a whisker
/// goes past it; ticks stay on multiples of 20 000.
fn year_axis(whisker_top: f64) -> (f64, usize) {
    let top = (whisker_top * 1.05).max(YEAR_TICK_MAX);
    (top, (top / YEAR_TICK_STEP).floor() as usize + 1)
}

/// Label only the ticks that land on a multiple of `step`.
fn stepped_label(value: f64, step: f64) -> String {
    let ratio = value / step;
    if (ratio - ratio.round()).abs() > 1e-6 {
        String::new()
    } else {
        format_count(value)
    }
}

/// Maps a whole-number coordinate to its label; blank between slots.
fn slot_label(labels: &[String], x: f64, first_slot: f64) -> String {
    let offset = x - first_slot;
    if (offset - offset.round()).abs() > 1e-6 || offset < -1e-6 {
        return String::new();
    }
    labels
        .get(offset.round() as usize)
        .cloned()
        .unwrap_or_default()
}

/// Draws the cleaned series as a red line over time
///
/// The x axis counts days from the first entry; tick labels are rendered
/// back as `YYYY-MM` dates.
pub fn draw_line_plot(table: &PageViewTable, output_path: &Path) -> Result<()> {
    let (first, last) = match (table.first_date(), table.last_date()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(PlotError::InvalidData(
                "Page view series cannot be empty".to_string(),
            ))
        }
    };

    let points: Vec<(f64, f64)> = table
        .entries()
        .iter()
        .map(|entry| ((entry.date - first).num_days() as f64, entry.value as f64))
        .collect();
    let x_max = ((last - first).num_days() as f64).max(1.0);
    let y_max = (table.values().max().unwrap_or(0) as f64 * 1.05).max(1.0);

    let root = BitMapBackend::new(output_path, LINE_PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(LINE_TITLE, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Page Views")
        .x_label_formatter(&|x| {
            (first + Duration::days(x.round() as i64))
                .format("%Y-%m")
                .to_string()
        })
        .y_label_formatter(&|y| format_count(*y))
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(points, RED.stroke_width(1)))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// Grouped bar chart of monthly means, one cluster per year
///
/// Every cluster has twelve fixed slots in calendar order. A month with no
/// data leaves its slot empty.
pub fn draw_bar_plot(averages: &MonthlyAverages, output_path: &Path) -> Result<()> {
    let (first_year, last_year) = match (averages.rows.first(), averages.rows.last()) {
        (Some(first), Some(last)) => (first.year, last.year),
        _ => {
            return Err(PlotError::InvalidData(
                "Monthly averages cannot be empty".to_string(),
            ))
        }
    };

    let y_max = (averages.max_value().unwrap_or(0.0) * 1.1).max(1.0);
    let x_range = (first_year as f64 - 0.5)..(last_year as f64 + 0.5);
    let year_count = (last_year - first_year + 1) as usize;
    let slot_width = CLUSTER_WIDTH / MONTH_NAMES.len() as f64;

    let root = BitMapBackend::new(output_path, BAR_PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range, 0f64..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(year_count)
        .x_label_formatter(&|x| {
            if (x - x.round()).abs() < 1e-6 {
                format!("{:.0}", x)
            } else {
                String::new()
            }
        })
        .y_label_formatter(&|y| format_count(*y))
        .x_desc("Years")
        .y_desc("Average Page Views")
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    // Header row for the legend.
    chart
        .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())
        .map_err(|e| PlotError::Drawing(e.to_string()))?
        .label("Months")
        .legend(|(x, y)| Rectangle::new([(x, y), (x, y)], TRANSPARENT.filled()));

    for (month, name) in MONTH_NAMES.iter().enumerate() {
        let color = Palette99::pick(month).mix(0.9);
        let bars = averages.rows.iter().filter_map(|row| {
            row.months[month].map(|mean| {
                let x0 = row.year as f64 - CLUSTER_WIDTH / 2.0 + month as f64 * slot_width;
                Rectangle::new([(x0, 0.0), (x0 + slot_width, mean)], color.filled())
            })
        });

        chart
            .draw_series(bars)
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

/// Trend and seasonality box plots side by side in one image
pub fn draw_box_plot(
    years: &[PartitionGroup],
    months: &[PartitionGroup],
    output_path: &Path,
) -> Result<()> {
    if years.iter().all(|group| group.values.is_empty()) {
        return Err(PlotError::InvalidData(
            "Year partition cannot be empty".to_string(),
        ));
    }

    let root = BitMapBackend::new(output_path, BOX_PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let panels = root.split_evenly((1, 2));

    let year_boxes = panel_boxes(years);
    let (year_top, year_ticks) = year_axis(whisker_top(&year_boxes));
    draw_box_panel(
        &panels[0],
        &year_boxes,
        YEAR_BOX_TITLE,
        "Year",
        year_top,
        Some((YEAR_TICK_STEP, year_ticks)),
    )?;

    let month_boxes = panel_boxes(months);
    let month_top = (whisker_top(&month_boxes) * 1.05).max(1.0);
    draw_box_panel(
        &panels[1],
        &month_boxes,
        MONTH_BOX_TITLE,
        "Month",
        month_top,
        None,
    )?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

fn panel_boxes(groups: &[PartitionGroup]) -> Vec<(String, Option<BoxStats>)> {
    groups
        .iter()
        .map(|group| (group.label.clone(), aggregate::box_stats(&group.values)))
        .collect()
}

fn whisker_top(boxes: &[(String, Option<BoxStats>)]) -> f64 {
    boxes
        .iter()
        .filter_map(|(_, stats)| stats.map(|s| s.upper_whisker))
        .fold(0.0, f64::max)
}

/// One box per slot at x = 1, 2, ..., n. Points beyond the whiskers are not drawn.
fn draw_box_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    boxes: &[(String, Option<BoxStats>)],
    title: &str,
    x_label: &str,
    y_max: f64,
    y_ticks: Option<(f64, usize)>,
) -> Result<()> {
    let labels: Vec<String> = boxes.iter().map(|(label, _)| label.clone()).collect();
    let slot_count = labels.len().max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0.5f64..(slot_count as f64 + 0.5), 0f64..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let y_labels = y_ticks.map_or(10, |(_, count)| count);
    let y_formatter = |y: &f64| match y_ticks {
        Some((step, _)) => stepped_label(*y, step),
        None => format_count(*y),
    };
    let x_formatter = |x: &f64| slot_label(&labels, *x, 1.0);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slot_count)
        .x_label_formatter(&x_formatter)
        .y_labels(y_labels)
        .y_label_formatter(&y_formatter)
        .x_desc(x_label)
        .y_desc("Page Views")
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let placed: Vec<(f64, BoxStats)> = boxes
        .iter()
        .enumerate()
        .filter_map(|(i, (_, stats))| stats.map(|s| ((i + 1) as f64, s)))
        .collect();

    chart
        .draw_series(placed.iter().map(|&(x, s)| {
            Rectangle::new(
                [(x - BOX_HALF_WIDTH, s.q1), (x + BOX_HALF_WIDTH, s.q3)],
                BLACK.stroke_width(1),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(placed.iter().map(|&(x, s)| {
            PathElement::new(
                vec![(x - BOX_HALF_WIDTH, s.median), (x + BOX_HALF_WIDTH, s.median)],
                MEDIAN_COLOR.stroke_width(2),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let cap = BOX_HALF_WIDTH / 2.0;
    let whiskers = placed.iter().flat_map(|&(x, s)| {
        [
            vec![(x, s.q1), (x, s.lower_whisker)],
            vec![(x, s.q3), (x, s.upper_whisker)],
            vec![(x - cap, s.lower_whisker), (x + cap, s.lower_whisker)],
            vec![(x - cap, s.upper_whisker), (x + cap, s.upper_whisker)],
        ]
    });
    chart
        .draw_series(whiskers.map(|points| PathElement::new(points, BLACK.stroke_width(1))))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageView, YearRow};
    use chrono::NaiveDate;

    fn series(days: i64) -> PageViewTable {
        let start = NaiveDate::from_ymd_opt(2016, 5, 9).unwrap();
        let entries = (0..days)
            .map(|i| PageView {
                date: start + Duration::days(i),
                value: 20_000 + (i as u64 * 37) % 15_000,
            })
            .collect();
        PageViewTable::from_sorted(entries)
    }

    #[test]
    fn file_names_match_chart_kinds() {
        let names: Vec<&str> = Chart::ALL.iter().map(|c| c.file_name()).collect();
        assert_eq!(names, vec!["line_plot.png", "bar_plot.png", "box_plot.png"]);
    }

    #[test]
    fn tick_labels_are_plain_integers() {
        assert_eq!(format_count(120_000.0), "120000");
        assert_eq!(format_count(0.0), "0");
    }

    #[test]
    fn trend_axis_keeps_fixed_ticks_for_typical_data() {
        let (top, ticks) = year_axis(35_000.0);
        assert_eq!(top, 200_000.0);
        assert_eq!(ticks, 11);
    }

    #[test]
    fn trend_axis_grows_past_highest_whisker() {
        let (top, ticks) = year_axis(230_000.0);
        assert!(top > 230_000.0);
        assert_eq!(ticks, 13);
        assert_eq!(stepped_label(220_000.0, YEAR_TICK_STEP), "220000");
        assert_eq!(stepped_label(230_000.0, YEAR_TICK_STEP), "");
    }

    #[test]
    fn trend_ticks_between_steps_are_blank() {
        assert_eq!(stepped_label(10_000.0, YEAR_TICK_STEP), "");
        assert_eq!(stepped_label(0.0, YEAR_TICK_STEP), "0");
        assert_eq!(stepped_label(200_000.0, YEAR_TICK_STEP), "200000");
    }

    #[test]
    fn slot_labels_follow_slot_positions() {
        let labels: Vec<String> = ["Jan", "Feb", "Mar"].iter().map(|s| s.to_string()).collect();
        assert_eq!(slot_label(&labels, 1.0, 1.0), "Jan");
        assert_eq!(slot_label(&labels, 3.0, 1.0), "Mar");
        assert_eq!(slot_label(&labels, 1.5, 1.0), "");
        assert_eq!(slot_label(&labels, 0.0, 1.0), "");
        assert_eq!(slot_label(&labels, 4.0, 1.0), "");
    }

    #[test]
    fn empty_inputs_are_rejected_before_drawing() {
        let dir = tempfile::tempdir().unwrap();

        let result = draw_line_plot(&PageViewTable::default(), &dir.path().join("l.png"));
        assert!(matches!(result, Err(PlotError::InvalidData(_))));

        let result = draw_bar_plot(&MonthlyAverages { rows: vec![] }, &dir.path().join("b.png"));
        assert!(matches!(result, Err(PlotError::InvalidData(_))));

        let result = draw_box_plot(&[], &[], &dir.path().join("x.png"));
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn renders_all_three_charts() {
        let dir = tempfile::tempdir().unwrap();
        let table = series(600);

        for chart in Chart::ALL {
            let path = render_chart(chart, &table, dir.path()).unwrap();
            assert!(path.exists());
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }

    #[test]
    #[ignore = "Font rendering not available in test environment"]
    fn bar_plot_tolerates_sparse_months() {
        let dir = tempfile::tempdir().unwrap();
        let mut months = [None; 12];
        months[4] = Some(1200.0);
        months[11] = Some(3400.0);
        let averages = MonthlyAverages {
            rows: vec![YearRow { year: 2016, months }],
        };
        let path = dir.path().join("sparse_bar.png");
        draw_bar_plot(&averages, &path).unwrap();
        assert!(path.exists());
    }
}
