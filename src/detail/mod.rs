use chrono::NaiveDate;
use std::sync::Mutex;
use tracing::debug;

use crate::core::MetricDetail;
use crate::playback::SelectionReset;
use crate::source::{MetricSource, SourceResult};

/// Identity of the region metric the viewer drilled into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub metric_id: String,
    pub region_code: String,
}

/// Detail-panel selection state
///
/// The playback scheduler clears this when a session starts over: a
/// selection made against a previous window may reference dates outside
/// the new axis.
pub struct SelectionStore {
    selection: Mutex<Option<Selection>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self {
            selection: Mutex::new(None),
        }
    }

    pub fn select(&self, metric_id: &str, region_code: &str) {
        let mut selection = self.selection.lock().unwrap();
        *selection = Some(Selection {
            metric_id: metric_id.to_string(),
            region_code: region_code.to_string(),
        });
        debug!("Region metric selected: {} ({})", metric_id, region_code);
    }

    pub fn selected(&self) -> Option<Selection> {
        self.selection.lock().unwrap().clone()
    }

    pub fn is_selected(&self) -> bool {
        self.selection.lock().unwrap().is_some()
    }

    /// Resolve the selected region's metric record for the given playback
    /// date; `None` when nothing is selected or the service has no record
    pub async fn current_metric(
        &self,
        source: &dyn MetricSource,
        date: NaiveDate,
    ) -> SourceResult<Option<MetricDetail>> {
        let selection = match self.selected() {
            Some(selection) => selection,
            None => return Ok(None),
        };
        source.region_metric(&selection.region_code, date).await
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionReset for SelectionStore {
    fn reset_selection(&self) {
        let mut selection = self.selection.lock().unwrap();
        if selection.take().is_some() {
            debug!("Detail selection cleared");
        }
    }
}
