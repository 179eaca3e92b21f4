mod common;

use common::{date, prices_doc, sample_prices, sections_doc};
use pvpc_bot::analysis::{
    DailySeries, PriceBand, TariffSection, aggregate, classify, find_windows, mean, percentile,
    summarize,
};
use pvpc_bot::esios::Zone;

fn sample_series() -> DailySeries {
    let prices = sample_prices();
    aggregate(
        &prices_doc(date(), &prices),
        &sections_doc(date(), prices.len()),
        Zone::Peninsula,
        date(),
    )
    .unwrap()
}

/// 0.10, 0.12, ... shuffled deterministically
fn stepped_series() -> DailySeries {
    let hourly: Vec<(f64, TariffSection)> = (0..24u32)
        .map(|i| {
            let k = (i * 7) % 24;
            (0.10 + 0.02 * f64::from(k), TariffSection::Mid)
        })
        .collect();
    DailySeries::from_hourly(date(), Zone::Peninsula, &hourly)
}

#[test]
fn aggregated_series_is_ordered_and_in_kwh() {
    let series = sample_series();
    assert_eq!(series.len(), 24);
    for (i, p) in series.points().iter().enumerate() {
        assert_eq!(p.hour_index, i);
    }
    assert!((series.points()[0].price - 0.120).abs() < 1e-12);
    assert_eq!(series.points()[0].tariff_section, TariffSection::Valley);
    assert_eq!(series.points()[11].tariff_section, TariffSection::Peak);
    assert_eq!(series.points()[9].tariff_section, TariffSection::Mid);
}

#[test]
fn other_zone_gets_its_own_values() {
    let prices = sample_prices();
    let series = aggregate(
        &prices_doc(date(), &prices),
        &sections_doc(date(), prices.len()),
        Zone::Canarias,
        date(),
    )
    .unwrap();
    assert!(series.points().iter().all(|p| (p.price - 0.5).abs() < 1e-12));
}

#[test]
fn percentile_uses_nearest_rank() {
    let series = stepped_series();
    let mut sorted: Vec<f64> = series.points().iter().map(|p| p.price).collect();
    sorted.sort_by(f64::total_cmp);

    // ceil(24 * 0.25) = 6
    assert_eq!(percentile(&series, 25), Some(sorted[6]));
    for p in 0..=100u8 {
        let v = percentile(&series, p).unwrap();
        assert!(sorted.contains(&v));
    }
    assert!(percentile(&series, 0).unwrap() <= percentile(&series, 100).unwrap());
}

#[test]
fn section_means_and_missing_sections() {
    let series = stepped_series();
    assert_eq!(mean(&series, Some(TariffSection::Peak)), 0.0);
    assert_eq!(mean(&series, Some(TariffSection::Valley)), 0.0);
    assert!((mean(&series, Some(TariffSection::Mid)) - mean(&series, None)).abs() < 1e-12);
}

#[test]
fn summary_of_sample_day() {
    let series = sample_series();
    let summary = summarize(&series, 25, 70).unwrap();
    assert_eq!(summary.min.hour_index, 4);
    assert_eq!(summary.max.hour_index, 19);
    assert!(summary.low_percentile <= summary.high_percentile);
    assert_eq!(summary.band(summary.max.price), PriceBand::High);
    assert_eq!(summary.band(summary.min.price), PriceBand::Valley);
    assert!(summary.section_mean(TariffSection::Peak) > summary.section_mean(TariffSection::Valley));
}

#[test]
fn boundary_price_is_mid_and_high_wins_first() {
    assert_eq!(classify(0.2, 0.1, 0.2), PriceBand::Mid);
    assert_eq!(classify(0.2000001, 0.1, 0.2), PriceBand::High);
    assert_eq!(classify(0.0999999, 0.1, 0.2), PriceBand::Valley);
}

#[test]
fn windows_match_brute_force() {
    let series = stepped_series();
    let prices: Vec<f64> = series.points().iter().map(|p| p.price).collect();
    let windows = find_windows(3, &series);
    assert_eq!(windows.len(), 22);

    let mut brute: Vec<(usize, f64)> = (0..=prices.len() - 3)
        .map(|s| (s, prices[s..s + 3].iter().sum()))
        .collect();
    brute.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (w, (start, total)) in windows.iter().zip(&brute) {
        assert_eq!(w.start_hour, *start);
        assert!((w.total - total).abs() < 1e-9);
        assert_eq!(w.end_hour, (w.start_hour + 3) % 24);
    }
    assert!(windows.windows(2).all(|p| p[0].total <= p[1].total));
}

#[test]
fn window_count_for_every_width() {
    let series = sample_series();
    for w in 1..=26 {
        let expected = if w > 24 { 0 } else { 24 - w + 1 };
        assert_eq!(find_windows(w, &series).len(), expected);
    }
}
