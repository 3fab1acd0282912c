//! Destinations for emitted rows

use crate::error::{CollectError, CollectResult};
use crate::models::MetricRow;
use std::sync::mpsc;

/// Receives rows one at a time, in emission order
pub trait MetricSink {
    fn send(&mut self, row: MetricRow) -> CollectResult<()>;
}

impl MetricSink for Vec<MetricRow> {
    fn send(&mut self, row: MetricRow) -> CollectResult<()> {
        self.push(row);
        Ok(())
    }
}

impl MetricSink for mpsc::Sender<MetricRow> {
    fn send(&mut self, row: MetricRow) -> CollectResult<()> {
        mpsc::Sender::send(self, row).map_err(|e| CollectError::Sink(e.to_string()))
    }
}

/// Adapts a closure into a [`MetricSink`]
pub struct FnSink<F>(pub F);

impl<F> MetricSink for FnSink<F>
where
    F: FnMut(MetricRow) -> CollectResult<()>,
{
    fn send(&mut self, row: MetricRow) -> CollectResult<()> {
        (self.0)(row)
    }
}
