//! Shared chart selection: one current value plus a bounded history.
//!
//! Charts publish what the user clicked; any number of views subscribe.
//! Subscribers hold a [`tokio::sync::watch::Receiver`] and see only the
//! latest selection.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::identity::Sex;

/// Number of past selections retained, most recent first.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    PyramidAgeGender,
    SalaryAgeGenderBand,
    PositionGender,
    GeneralFilter,
}

impl SelectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PyramidAgeGender => "pyramid_age_gender",
            Self::SalaryAgeGenderBand => "salary_age_gender_band",
            Self::PositionGender => "position_gender",
            Self::GeneralFilter => "general_filter",
        }
    }
}

/// Payload of a selection; the variant determines its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SelectionData {
    /// A bar in the population pyramid.
    PyramidAgeGender { age: u32, gender: Sex },
    /// A cell in the salary/age pyramid.
    SalaryAgeGenderBand { age: u32, gender: Sex, band: String },
    /// A bar in the position chart.
    PositionGender {
        position: String,
        gender: Sex,
        count: u64,
    },
    GeneralFilter { filter_type: String, value: String },
}

impl SelectionData {
    pub fn kind(&self) -> SelectionKind {
        match self {
            Self::PyramidAgeGender { .. } => SelectionKind::PyramidAgeGender,
            Self::SalaryAgeGenderBand { .. } => SelectionKind::SalaryAgeGenderBand,
            Self::PositionGender { .. } => SelectionKind::PositionGender,
            Self::GeneralFilter { .. } => SelectionKind::GeneralFilter,
        }
    }

    /// Inclusive age range selected, for views that filter by age.
    pub fn age_range(&self) -> Option<(u32, u32)> {
        match self {
            Self::PyramidAgeGender { age, .. } | Self::SalaryAgeGenderBand { age, .. } => {
                Some((*age, *age))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub data: SelectionData,
    /// Name of the publishing chart.
    pub source: String,
}

impl Selection {
    pub fn kind(&self) -> SelectionKind {
        self.data.kind()
    }
}

/// Single-writer publish/subscribe store for the current chart selection.
#[derive(Debug)]
pub struct SelectionBus {
    tx: watch::Sender<Option<Selection>>,
    history: VecDeque<Selection>,
    seq: u64,
}

impl Default for SelectionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionBus {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            seq: 0,
        }
    }

    /// Make `data` the current selection and push it onto the history.
    pub fn publish(&mut self, source: &str, data: SelectionData) -> &Selection {
        self.seq += 1;
        let timestamp = Utc::now();
        let selection = Selection {
            id: format!("selection-{}-{}", timestamp.timestamp_millis(), self.seq),
            timestamp,
            data,
            source: source.to_string(),
        };
        tracing::debug!(
            id = %selection.id,
            kind = selection.kind().as_str(),
            source,
            "selection published"
        );

        self.tx.send_replace(Some(selection.clone()));
        self.history.push_front(selection);
        self.history.truncate(HISTORY_LIMIT);
        &self.history[0]
    }

    /// Receiver that observes every subsequent publish.
    pub fn subscribe(&self) -> watch::Receiver<Option<Selection>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Selection> {
        self.tx.borrow().clone()
    }

    /// Most recent first, at most [`HISTORY_LIMIT`] entries.
    pub fn history(&self) -> impl Iterator<Item = &Selection> {
        self.history.iter()
    }
}
