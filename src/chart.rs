use crate::{
    config::ChartConfig,
    ingest::{Density, ResultTable, SpaceColumns},
};
use itertools::Itertools;
use plotters::coord::{cartesian::Cartesian2d, ranged1d::Ranged, Shift};
use plotters::prelude::*;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

// bar geometry for the peak memory panel, in vertex count units
pub const BAR_WIDTH: i64 = 200;
pub const BAR_OFFSET: i64 = 100;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Tables were loaded without the '{0}' columns required by this chart")]
    SchemaMismatch(&'static str),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self::Draw(err.to_string())
    }
}

/// one chart, two line series of BFS time over vertex count
pub fn render_timing(
    sparse: &ResultTable,
    dense: &ResultTable,
    config: &ChartConfig,
) -> Result<(), ChartError> {
    let root = SVGBackend::new(&config.output, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let ticks = tick_positions(&sparse.sizes, &dense.sizes);
    let x_range = x_range(&ticks, 0);
    let y_range = padded_range(sparse.time_ms.iter().chain(dense.time_ms.iter()).copied());

    let mut chart = ChartBuilder::on(&root)
        .caption("BFS Performance", ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.with_key_points(ticks), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Number of Vertices")
        .y_desc("Time (ms)")
        .draw()?;

    for table in [sparse, dense] {
        draw_line_series(&mut chart, table, &table.time_ms)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;

    debug!("Timing chart written to {}", config.output.to_string_lossy());

    Ok(())
}

/// three side-by-side panels sharing one x tick set: time, static memory
/// size, and peak memory as grouped bars
pub fn render_memory(
    sparse: &ResultTable,
    dense: &ResultTable,
    config: &ChartConfig,
) -> Result<(), ChartError> {
    let (sparse_static, sparse_peak) = split_space(sparse)?;
    let (dense_static, dense_peak) = split_space(dense)?;

    let root = SVGBackend::new(&config.output, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 3));

    let ticks = tick_positions(&sparse.sizes, &dense.sizes);
    // leave room for the outermost bars in every panel
    let x_range = x_range(&ticks, BAR_OFFSET + BAR_WIDTH / 2);

    draw_line_panel(
        &panels[0],
        "BFS Time",
        "Time (ms)",
        &x_range,
        &ticks,
        [(sparse, &sparse.time_ms), (dense, &dense.time_ms)],
    )?;
    draw_line_panel(
        &panels[1],
        "Static Memory Size",
        "Static Space (bytes)",
        &x_range,
        &ticks,
        [(sparse, sparse_static), (dense, dense_static)],
    )?;
    draw_bar_panel(
        &panels[2],
        &x_range,
        &ticks,
        [(sparse, sparse_peak), (dense, dense_peak)],
    )?;

    root.present()?;

    debug!("Memory chart written to {}", config.output.to_string_lossy());

    Ok(())
}

/// x tick marks sit at every observed vertex count from both tables,
/// concatenated as-is: unsorted and with duplicates retained
pub fn tick_positions(sparse_sizes: &[u64], dense_sizes: &[u64]) -> Vec<i64> {
    sparse_sizes
        .iter()
        .chain(dense_sizes.iter())
        .map(|size| *size as i64)
        .collect_vec()
}

/// horizontal span of one peak memory bar: sparse bars are centered at
/// `v - 100`, dense bars at `v + 100`, both of width 200
pub fn bar_span(size: u64, density: Density) -> (i64, i64) {
    let center = match density {
        Density::Sparse => size as i64 - BAR_OFFSET,
        Density::Dense => size as i64 + BAR_OFFSET,
    };

    (center - BAR_WIDTH / 2, center + BAR_WIDTH / 2)
}

fn series_color(density: Density) -> RGBColor {
    match density {
        Density::Sparse => BLUE,
        Density::Dense => RED,
    }
}

/// x axis covering every tick plus `extra` slack on both ends,
/// empty tables still get a drawable dummy range
fn x_range(ticks: &[i64], extra: i64) -> Range<i64> {
    let (lo, hi) = match ticks.iter().copied().minmax().into_option() {
        Some(bounds) => bounds,
        None => return 0..1,
    };

    let pad = ((hi - lo) / 20).max(1) + extra;

    (lo - pad)..(hi + pad)
}

/// y axis from zero to slightly above the largest observed value
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let max = values.fold(f64::NEG_INFINITY, f64::max);

    if max.is_finite() && max > 0.0 {
        0.0..(max * 1.05)
    } else {
        0.0..1.0
    }
}

fn split_space(table: &ResultTable) -> Result<(&[f64], &[f64]), ChartError> {
    match &table.space {
        SpaceColumns::Split {
            static_bytes,
            peak_bytes,
        } => Ok((static_bytes, peak_bytes)),
        SpaceColumns::Flat(_) => Err(ChartError::SchemaMismatch(
            crate::ingest::COLUMN_STATIC_SPACE,
        )),
    }
}

fn draw_line_series<'a, DB, X, Y>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    table: &ResultTable,
    values: &[f64],
) -> Result<(), ChartError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = i64>,
    Y: Ranged<ValueType = f64>,
{
    let color = series_color(table.density);
    let points = table
        .sizes
        .iter()
        .zip(values.iter())
        .map(|(size, value)| (*size as i64, *value))
        .collect_vec();

    chart
        .draw_series(LineSeries::new(points, &color).point_size(3))?
        .label(table.density.label())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

    Ok(())
}

fn draw_line_panel<DB: DrawingBackend>(
    panel: &DrawingArea<DB, Shift>,
    caption: &str,
    y_desc: &str,
    x_range: &Range<i64>,
    ticks: &[i64],
    series: [(&ResultTable, &[f64]); 2],
) -> Result<(), ChartError>
where
    DB::ErrorType: 'static,
{
    let y_range = padded_range(
        series
            .iter()
            .flat_map(|(_, values)| values.iter())
            .copied(),
    );

    let mut chart = ChartBuilder::on(panel)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone().with_key_points(ticks.to_vec()), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Number of Vertices")
        .y_desc(y_desc)
        .draw()?;

    for (table, values) in series {
        draw_line_series(&mut chart, table, values)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_bar_panel<DB: DrawingBackend>(
    panel: &DrawingArea<DB, Shift>,
    x_range: &Range<i64>,
    ticks: &[i64],
    series: [(&ResultTable, &[f64]); 2],
) -> Result<(), ChartError>
where
    DB::ErrorType: 'static,
{
    let y_range = padded_range(
        series
            .iter()
            .flat_map(|(_, values)| values.iter())
            .copied(),
    );

    let mut chart = ChartBuilder::on(panel)
        .caption("Peak Memory Usage", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone().with_key_points(ticks.to_vec()), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Number of Vertices")
        .y_desc("Peak Memory (bytes)")
        .draw()?;

    for (table, values) in series {
        let color = series_color(table.density);

        chart
            .draw_series(table.sizes.iter().zip(values.iter()).map(|(size, peak)| {
                let (left, right) = bar_span(*size, table.density);

                Rectangle::new([(left, 0.0), (right, *peak)], color.filled())
            }))?
            .label(table.density.label())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn chart_config(name: &str) -> ChartConfig {
        ChartConfig {
            output: std::env::temp_dir().join(name),
            width: 640,
            height: 480,
        }
    }

    fn timing_table(density: Density, sizes: Vec<u64>, time_ms: Vec<f64>) -> ResultTable {
        let space = SpaceColumns::Flat(vec![0.0; sizes.len()]);

        ResultTable {
            density,
            sizes,
            time_ms,
            space,
        }
    }

    fn memory_table(density: Density, sizes: Vec<u64>) -> ResultTable {
        let rows = sizes.len();

        ResultTable {
            density,
            time_ms: vec![1.0; rows],
            space: SpaceColumns::Split {
                static_bytes: vec![256.0; rows],
                peak_bytes: vec![512.0; rows],
            },
            sizes,
        }
    }

    fn rendered_file(config: &ChartConfig) -> PathBuf {
        assert!(config.output.is_file());

        config.output.clone()
    }

    #[test]
    fn ticks_are_the_raw_concatenation_of_both_size_columns() {
        let ticks = tick_positions(&[100, 200, 300], &[100, 200, 300]);

        assert_eq!(ticks, vec![100, 200, 300, 100, 200, 300]);
    }

    #[test]
    fn ticks_keep_input_order_without_sorting() {
        let ticks = tick_positions(&[300, 100], &[200]);

        assert_eq!(ticks, vec![300, 100, 200]);
    }

    #[test]
    fn empty_tables_produce_an_empty_tick_set() {
        assert!(tick_positions(&[], &[]).is_empty());
    }

    #[test]
    fn sparse_bars_sit_left_of_the_tick() {
        let (left, right) = bar_span(1000, Density::Sparse);

        assert_eq!(left, 800);
        assert_eq!(right, 1000);
    }

    #[test]
    fn dense_bars_sit_right_of_the_tick() {
        let (left, right) = bar_span(1000, Density::Dense);

        assert_eq!(left, 1000);
        assert_eq!(right, 1200);
    }

    #[test]
    fn bar_width_is_fixed() {
        for size in [100u64, 500, 100_000] {
            for density in [Density::Sparse, Density::Dense] {
                let (left, right) = bar_span(size, density);

                assert_eq!(right - left, BAR_WIDTH);
            }
        }
    }

    #[test]
    fn empty_ticks_still_yield_a_drawable_x_range() {
        let range = x_range(&[], 0);

        assert!(range.start < range.end);
    }

    #[test]
    fn x_range_covers_all_ticks_and_bar_slack() {
        let ticks = vec![100, 500, 300];
        let range = x_range(&ticks, BAR_OFFSET + BAR_WIDTH / 2);

        assert!(range.start < 100 - BAR_OFFSET - BAR_WIDTH / 2);
        assert!(range.end > 500 + BAR_OFFSET + BAR_WIDTH / 2);
    }

    #[test]
    fn empty_series_yield_a_drawable_y_range() {
        let range = padded_range(std::iter::empty());

        assert_eq!(range, 0.0..1.0);
    }

    #[test]
    fn y_range_is_padded_above_the_maximum() {
        let range = padded_range([2.0, 8.0, 4.0].into_iter());

        assert_eq!(range.start, 0.0);
        assert!(range.end > 8.0);
    }

    #[test]
    fn timing_chart_renders_with_duplicated_ticks() {
        let config = chart_config("bfs_bench_timing.svg");
        let sparse = timing_table(Density::Sparse, vec![100, 200, 300], vec![0.5, 1.0, 2.0]);
        let dense = timing_table(Density::Dense, vec![100, 200, 300], vec![1.0, 3.0, 9.0]);

        render_timing(&sparse, &dense, &config).unwrap();

        std::fs::remove_file(rendered_file(&config)).unwrap();
    }

    #[test]
    fn header_only_tables_render_an_empty_timing_chart() {
        let config = chart_config("bfs_bench_timing_empty.svg");
        let sparse = timing_table(Density::Sparse, Vec::new(), Vec::new());
        let dense = timing_table(Density::Dense, Vec::new(), Vec::new());

        render_timing(&sparse, &dense, &config).unwrap();

        std::fs::remove_file(rendered_file(&config)).unwrap();
    }

    #[test]
    fn memory_chart_renders_all_three_panels() {
        let config = chart_config("bfs_bench_memory.svg");
        let sparse = memory_table(Density::Sparse, vec![1000, 2000]);
        let dense = memory_table(Density::Dense, vec![1000, 2000]);

        render_memory(&sparse, &dense, &config).unwrap();

        std::fs::remove_file(rendered_file(&config)).unwrap();
    }

    #[test]
    fn header_only_tables_render_an_empty_memory_chart() {
        let config = chart_config("bfs_bench_memory_empty.svg");
        let sparse = memory_table(Density::Sparse, Vec::new());
        let dense = memory_table(Density::Dense, Vec::new());

        render_memory(&sparse, &dense, &config).unwrap();

        std::fs::remove_file(rendered_file(&config)).unwrap();
    }

    #[test]
    fn timing_tables_cannot_feed_the_memory_chart() {
        let config = chart_config("bfs_bench_memory_mismatch.svg");
        let sparse = timing_table(Density::Sparse, vec![100], vec![1.0]);
        let dense = timing_table(Density::Dense, vec![100], vec![1.0]);

        assert!(matches!(
            render_memory(&sparse, &dense, &config),
            Err(ChartError::SchemaMismatch(_))
        ));
    }
}
