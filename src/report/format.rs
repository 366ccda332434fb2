//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the index/model/ensemble code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use chrono::NaiveDate;

use crate::domain::{ConfidenceTier, EnsembleResult, MethodKind, VegetationIndices};
use crate::io::ingest::IngestedData;
use crate::models::CalibrationTable;
use crate::report::PixelStats;
use crate::series::{SeriesSummary, TimeSeries};

/// Format the run header (input stats + calibration + skipped acquisitions).
pub fn format_run_summary(ingest: &IngestedData, series: &TimeSeries, table: &CalibrationTable) -> String {
    let mut out = String::new();

    out.push_str("=== wheatn - Wheat Canopy Nitrogen Estimation ===\n");
    out.push_str(&format!(
        "Calibration: v{} ({} models)\n",
        table.version,
        table.models.len()
    ));
    out.push_str(&format!(
        "Rows: read={} used={} errors={} | masked cells={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len(),
        ingest.masked_values
    ));
    for err in ingest.row_errors.iter().take(5) {
        out.push_str(&format!("  line {}: {}\n", err.line, err.message));
    }
    if ingest.row_errors.len() > 5 {
        out.push_str(&format!("  ... {} more\n", ingest.row_errors.len() - 5));
    }

    out.push_str(&format!(
        "Acquisitions: {} | estimated={} skipped={}\n",
        ingest.acquisitions.len(),
        series.results().len(),
        series.skipped().len()
    ));
    for s in series.skipped() {
        out.push_str(&format!("  (skipped {}) {}\n", s.date, s.reason));
    }
    out.push('\n');

    out
}

/// Format one row per acquisition.
pub fn format_results_table(results: &[EnsembleResult]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:>6} {:>6} {:>5} {:>6} {:>5} {:>5} {:<20} {:<7} {:<24}\n",
            "date", "N%", "raw", "soil", "savi", "rmse", "r2", "quality", "clamp", "methods"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<10} {:-<6} {:-<6} {:-<5} {:-<6} {:-<5} {:-<5} {:-<20} {:-<7} {:-<24}\n",
            "", "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in results {
        let methods: Vec<&str> = r.estimates.iter().map(|w| w.estimate.method.display_name()).collect();
        out.push_str(
            format!(
                "{:<10} {:>6.2} {:>6.2} {:>5.2} {:>6} {:>5.2} {:>5.2} {:<20} {:<7} {:<24}\n",
                r.acquisition_date,
                r.final_n_percent,
                r.raw_n_percent,
                r.soil_factor,
                fmt_f(r.savi, 3),
                r.weighted_rmse,
                r.weighted_r2,
                r.confidence.display_name(),
                r.clamp.label(),
                truncate(&methods.join(","), 24),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// One-line headline for the most recent acquisition.
pub fn format_latest_estimate(latest: &EnsembleResult) -> String {
    let mut out = format!(
        "Latest ({}): N Content: {:.2}% \u{b1} {:.2} | {} | R2 {:.3}",
        latest.acquisition_date,
        latest.final_n_percent,
        latest.weighted_rmse,
        latest.confidence.display_name(),
        latest.weighted_r2
    );
    if latest.clamp.is_clamped() {
        out.push_str(&format!(
            " | clamped at {} (corrected {:.2}%)",
            latest.clamp.label(),
            latest.corrected_n_percent
        ));
    }
    out.push('\n');
    out
}

/// Format the series summary (levels, per-method contribution, tiers, trend).
pub fn format_series_summary(summary: &SeriesSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Series: {} .. {} | n={} (skipped {})\n",
        summary.start_date, summary.end_date, summary.observations, summary.skipped
    ));
    out.push_str(&format!(
        "N%: mean={:.2} min={:.2} max={:.2} | clamped={}\n",
        summary.mean_n_percent, summary.min_n_percent, summary.max_n_percent, summary.clamped
    ));
    out.push_str(&format!(
        "Accuracy: mean RMSE={:.3} mean R2={:.3}\n",
        summary.mean_rmse, summary.mean_r2
    ));

    out.push_str("\nMethods:\n");
    for m in &summary.methods {
        out.push_str(&format!(
            "  {:<12} n={:<3} mean={:.2} weight={:.3} (R2={:.2} RMSE={:.2})\n",
            m.method.display_name(),
            m.observations,
            m.mean_estimate,
            m.mean_weight,
            m.r2,
            m.rmse
        ));
    }

    out.push_str("\nConfidence:\n");
    for tier in ConfidenceTier::ALL {
        let count = summary.tiers.get(&tier).copied().unwrap_or(0);
        out.push_str(&format!(
            "  {:<20} {:>3} ({:.0}%)\n",
            tier.display_name(),
            count,
            summary.tier_share(tier)
        ));
    }

    match summary.trend {
        Some(t) => out.push_str(&format!(
            "\nTrend: {:+.4} %N/day ({:+.2} per 10 days)\n",
            t.slope_per_day,
            t.slope_per_day * 10.0
        )),
        None => out.push_str("\nTrend: n/a (single acquisition)\n"),
    }

    out
}

/// Format scene-mean indices per acquisition.
pub fn format_indices_table(rows: &[(NaiveDate, VegetationIndices)]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}\n",
        "date", "NDVI", "NDRE", "SAVI", "GNDVI", "MCARI", "CIre"
    ));
    for (date, ix) in rows {
        out.push_str(&format!(
            "{:<10} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}\n",
            date,
            fmt_f(ix.ndvi, 4),
            fmt_f(ix.ndre, 4),
            fmt_f(ix.savi, 4),
            fmt_f(ix.gndvi, 4),
            fmt_f(ix.mcari, 4),
            fmt_f(ix.ci_red_edge, 4),
        ));
    }
    out
}

/// Format per-pixel map statistics.
pub fn format_pixel_stats(stats: &[PixelStats]) -> String {
    let mut out = String::from("Pixel maps:\n");
    for s in stats {
        let range = match s.range {
            Some((lo, hi)) => format!("[{lo:.2}, {hi:.2}]"),
            None => "-".to_string(),
        };
        out.push_str(&format!(
            "  {} valid={}/{} insufficient={} clamped={} mean={} sd={} range={range}\n",
            s.date,
            s.valid,
            s.pixels,
            s.insufficient,
            s.clamped,
            fmt_f(s.mean, 2),
            fmt_f(s.std, 3),
        ));
    }
    out
}

/// Format the calibration table.
pub fn format_calibration(table: &CalibrationTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("Calibration table v{}\n", table.version));
    for m in &table.models {
        out.push_str(&format!(
            "  {:<12} N% = {:.2} * index + {:.2}  (R2={:.2} RMSE={:.2})",
            m.method.display_name(),
            m.slope,
            m.intercept,
            m.r2,
            m.rmse
        ));
        if !m.reference.is_empty() {
            out.push_str(&format!("  [{}]", m.reference));
        }
        out.push('\n');
    }
    let missing: Vec<&str> = MethodKind::ALL
        .iter()
        .filter(|k| table.model(**k).is_none())
        .map(|k| k.display_name())
        .collect();
    if !missing.is_empty() {
        out.push_str(&format!("  (no model for {})\n", missing.join(", ")));
    }

    let soil = &table.soil_correction;
    out.push_str(&format!(
        "Soil: SAVI < {} -> x{} | SAVI > {} -> x{}\n",
        soil.low_savi, soil.low_factor, soil.high_savi, soil.high_factor
    ));
    out.push_str(&format!(
        "Bounds: [{}, {}] %N\n",
        table.bounds.min_n_percent, table.bounds.max_n_percent
    ));
    let c = &table.confidence;
    out.push_str(&format!(
        "Confidence: high R2>{} & RMSE<{} | moderate R2>{} & RMSE<{}\n",
        c.high_r2, c.high_rmse, c.moderate_r2, c.moderate_rmse
    ));
    out
}

fn fmt_f(v: f64, decimals: usize) -> String {
    if v.is_nan() { "-".to_string() } else { format!("{v:.decimals$}") }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Acquisition, BandValues, SpectralSample};
    use crate::estimator::NitrogenEstimator;
    use crate::series::summarize;

    fn series() -> TimeSeries {
        let estimator = NitrogenEstimator::default();
        let good = BandValues {
            blue: 0.04,
            green: 0.08,
            red: 0.05,
            red_edge: 0.22,
            nir: 0.48,
        };
        let acquisitions = vec![
            Acquisition {
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                sample: SpectralSample::scalar(good),
            },
            Acquisition {
                date: NaiveDate::from_ymd_opt(2024, 2, 11).unwrap(),
                sample: SpectralSample::scalar(BandValues { nir: 0.52, ..good }),
            },
        ];
        estimator.estimate_series(&acquisitions)
    }

    #[test]
    fn results_table_has_one_line_per_acquisition() {
        let series = series();
        let table = format_results_table(series.results());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2 + 2);
        assert!(lines[0].starts_with("date"));
        assert!(lines[2].starts_with("2024-02-01"));
        assert!(lines[2].contains("High Confidence"));
        assert!(lines[2].contains("NDRE,CIred-edge,MCARI"));
    }

    #[test]
    fn latest_headline_uses_last_date() {
        let series = series();
        let latest = series.latest().unwrap();
        let line = format_latest_estimate(latest);
        assert!(line.starts_with("Latest (2024-02-11): N Content: "));
        assert!(line.contains("% \u{b1} "));
        assert!(line.contains("High Confidence"));
        assert!(!line.contains("clamped"));
    }

    #[test]
    fn series_summary_lists_every_tier() {
        let summary = summarize(&series()).unwrap();
        let text = format_series_summary(&summary);
        for tier in ConfidenceTier::ALL {
            assert!(text.contains(tier.display_name()));
        }
        assert!(text.contains("Trend: "));
        assert!(text.contains("(100%)"));
    }

    #[test]
    fn calibration_lists_models_and_bounds() {
        let text = format_calibration(&CalibrationTable::default());
        assert!(text.starts_with("Calibration table v2.0"));
        assert!(text.contains("N% = 4.14 * index + 0.42"));
        assert!(text.contains("Bounds: [1.5, 6] %N"));
    }

    #[test]
    fn nan_prints_as_dash() {
        assert_eq!(fmt_f(f64::NAN, 2), "-");
        assert_eq!(fmt_f(1.23456, 2), "1.23");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
