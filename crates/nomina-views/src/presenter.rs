//! Per-view load state with stale-response protection.
//!
//! Every load is issued a [`Ticket`] carrying a sequence number. Only the
//! ticket from the most recent [`Presenter::begin`] may complete the view;
//! older responses are dropped no matter when they arrive.

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use nomina_core::filter::{FilterState, PageRequest, TableSort};
use tracing::{debug, error};

/// Derived data a view renders.
pub trait Aggregate {
    /// True when a well-formed query matched nothing.
    fn is_empty(&self) -> bool;
}

impl<T> Aggregate for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

/// What the view should show for its current state.
#[derive(Debug, PartialEq)]
pub enum Render<'a, T> {
    Nothing,
    Spinner,
    EmptyState,
    Data(&'a T),
    /// Error panel offering a manual retry.
    Failed(&'a str),
}

/// Everything that, when changed, forces a reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewParams {
    pub filters: FilterState,
    pub page: PageRequest,
    pub sort: TableSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct Presenter<T> {
    name: &'static str,
    state: ViewState<T>,
    latest: u64,
    params: Option<ViewParams>,
}

impl<T: Aggregate> Presenter<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ViewState::Idle,
            latest: 0,
            params: None,
        }
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    pub fn params(&self) -> Option<&ViewParams> {
        self.params.as_ref()
    }

    /// Start a load, clearing whatever was shown.
    pub fn begin(&mut self) -> Ticket {
        self.latest += 1;
        self.state = ViewState::Loading;
        debug!(view = self.name, seq = self.latest, "loading");
        Ticket(self.latest)
    }

    /// Record new parameters. Starts a load only if they changed.
    pub fn set_params(&mut self, params: ViewParams) -> Option<Ticket> {
        if self.params.as_ref() == Some(&params) {
            return None;
        }
        self.params = Some(params);
        Some(self.begin())
    }

    /// Reload with the current parameters after an error.
    pub fn retry(&mut self) -> Option<Ticket> {
        matches!(self.state, ViewState::Error(_)).then(|| self.begin())
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Apply the outcome of the load `ticket` started.
    ///
    /// Returns `false`, leaving the state untouched, when a newer load has
    /// been started since.
    pub fn complete<E: fmt::Display>(&mut self, ticket: Ticket, result: Result<T, E>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                view = self.name,
                seq = ticket.0,
                latest = self.latest,
                "discarding stale response"
            );
            return false;
        }
        self.state = match result {
            Ok(data) => ViewState::Ready(data),
            Err(e) => {
                error!(view = self.name, error = %e, "load failed");
                ViewState::Error(e.to_string())
            }
        };
        true
    }

    pub fn render(&self) -> Render<'_, T> {
        match &self.state {
            ViewState::Idle => Render::Nothing,
            ViewState::Loading => Render::Spinner,
            ViewState::Ready(data) if data.is_empty() => Render::EmptyState,
            ViewState::Ready(data) => Render::Data(data),
            ViewState::Error(message) => Render::Failed(message),
        }
    }
}

/// Run one load against a shared presenter.
///
/// The lock is only held to begin and to complete, never across the load.
/// Returns whether this load's result was applied.
pub async fn refresh<T, F, Fut, E>(presenter: &Mutex<Presenter<T>>, load: F) -> bool
where
    T: Aggregate,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let ticket = presenter
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .begin();
    let result = load().await;
    presenter
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .complete(ticket, result)
}
