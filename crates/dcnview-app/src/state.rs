//! Application state (Model in TEA pattern)

use dcnview_core::prelude::*;
use std::collections::HashMap;

use dcnview_core::{CommandRecord, Identifier};

use crate::bridge::WeakUi;
use crate::config::AppConfig;
use crate::directory::ServiceDirectory;
use crate::execution::{ExecutionPhase, ExecutionSurface, SurfaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
}

/// Current UI mode, derived from the execution surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// Service tree with command cursor
    Browse,
    /// Modal argument form
    ArgumentForm,
    /// Modal, waiting on the remote call
    Calling,
    /// Modal response or error view
    Response,
}

#[derive(Debug)]
pub struct AppState {
    pub phase: AppPhase,
    pub config: AppConfig,
    pub directory: ServiceDirectory,

    /// Selected command, kept by identity so tree churn does not move it
    pub selected: Option<Identifier>,

    /// The shown execution surface, if any
    pub execution: Option<ExecutionSurface>,

    /// Hidden surfaces awaiting teardown at the end of the message cycle
    deferred_teardown: Vec<ExecutionSurface>,

    /// One-line status message
    pub status: Option<String>,

    /// Latest applied bridge stamp per identifier
    applied_sequence: HashMap<Identifier, u64>,

    ui: WeakUi,
}

impl AppState {
    pub fn new(config: AppConfig, ui: WeakUi) -> Self {
        Self {
            phase: AppPhase::Running,
            config,
            directory: ServiceDirectory::new(),
            selected: None,
            execution: None,
            deferred_teardown: Vec::new(),
            status: None,
            applied_sequence: HashMap::new(),
            ui,
        }
    }

    /// Record `seq` for `identifier`. False if a later stamp was already applied.
    pub fn advance_sequence(&mut self, identifier: Identifier, seq: u64) -> bool {
        let latest = self.applied_sequence.entry(identifier).or_insert(seq);
        if *latest > seq {
            return false;
        }
        *latest = seq;
        true
    }

    /// Reference handed to bindings and background tasks
    pub fn ui(&self) -> &WeakUi {
        &self.ui
    }

    pub fn ui_mode(&self) -> UiMode {
        match self.execution.as_ref().map(|surface| &surface.phase) {
            None => UiMode::Browse,
            Some(ExecutionPhase::CollectingArguments) => UiMode::ArgumentForm,
            Some(ExecutionPhase::Calling) => UiMode::Calling,
            Some(ExecutionPhase::Response(_) | ExecutionPhase::Error(_)) => UiMode::Response,
        }
    }

    pub fn request_quit(&mut self) {
        self.phase = AppPhase::Quitting;
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }

    // ─────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────

    pub fn selected_command(&self) -> Option<&CommandRecord> {
        self.selected
            .as_ref()
            .and_then(|identifier| self.directory.command(identifier))
    }

    /// Position of the selection in display order
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.directory
            .commands()
            .position(|record| record.identifier() == *selected)
    }

    pub fn select_next(&mut self) {
        self.step_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.step_selection(-1);
    }

    fn step_selection(&mut self, delta: isize) {
        let identifiers: Vec<Identifier> = self
            .directory
            .commands()
            .map(CommandRecord::identifier)
            .collect();
        if identifiers.is_empty() {
            self.selected = None;
            return;
        }
        let len = identifiers.len() as isize;
        let next = match self.selected_index() {
            Some(index) => (index as isize + delta).rem_euclid(len),
            None => 0,
        };
        self.selected = identifiers.into_iter().nth(next as usize);
        self.status = None;
    }

    /// Fall back to the first command if the selection went away
    pub fn ensure_selection(&mut self) {
        if self.selected_command().is_none() {
            self.selected = self.directory.commands().next().map(CommandRecord::identifier);
        }
    }

    // ─────────────────────────────────────────────────────────
    // Execution Surface
    // ─────────────────────────────────────────────────────────

    pub fn show_execution(&mut self, surface: ExecutionSurface) {
        self.hide_execution();
        debug!("Showing execution surface {} for {}", surface.id, surface.title());
        self.execution = Some(surface);
    }

    /// Hide the shown surface.
    ///
    /// A suspended invocation is cancelled at once. The surface itself is
    /// only torn down by [`AppState::reap_deferred`].
    pub fn hide_execution(&mut self) -> Option<SurfaceId> {
        let mut surface = self.execution.take()?;
        surface.cancel_prompt();
        let id = surface.id;
        debug!("Hiding execution surface {}", id);
        self.deferred_teardown.push(surface);
        Some(id)
    }

    pub fn pending_teardown(&self) -> usize {
        self.deferred_teardown.len()
    }

    /// Destroy hidden surfaces. Returns how many were destroyed.
    pub fn reap_deferred(&mut self) -> usize {
        let count = self.deferred_teardown.len();
        if count > 0 {
            trace!("Tearing down {} execution surface(s)", count);
            self.deferred_teardown.clear();
        }
        count
    }
}
