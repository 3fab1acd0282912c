//! Prometheus text exposition format

use crate::models::{MetricKind, MetricRow};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

/// Render one pass as Prometheus text
///
/// Each pass gets its own registry, so series from services that disappeared
/// since the previous pass are never carried over. Families with no rows are
/// omitted by the encoder.
pub fn render_exposition(rows: &[MetricRow]) -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    let mut families = Vec::with_capacity(MetricKind::ALL.len());

    for kind in MetricKind::ALL {
        let gauge = GaugeVec::new(Opts::new(kind.fq_name(), kind.help()), kind.label_names())?;
        registry.register(Box::new(gauge.clone()))?;
        families.push((kind, gauge));
    }

    for row in rows {
        let Some((_, gauge)) = families.iter().find(|(kind, _)| *kind == row.kind) else {
            continue;
        };
        let values: Vec<&str> = row.labels.iter().map(String::as_str).collect();
        gauge.get_metric_with_label_values(&values)?.set(row.value);
    }

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
