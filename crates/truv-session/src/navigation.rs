// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Navigation and redirect tracking for one browsing surface.
//
// Browser engines report a redirect chain as a burst of page-start signals
// followed by terminal signals that may or may not belong to the page that
// finally shows.  The tracker collapses the chain into a single "settled"
// signal for the last page started:
//
//   Idle        --start-->          Loading
//   Loading     --start-->          Redirecting   (previous load superseded)
//   Redirecting --start-->          Redirecting   (target moves on)
//   Loading     --terminal-->       Idle + Settled
//   Redirecting --terminal(target)--> Idle + Settled
//   Redirecting --terminal(older)-->  Loading     (pending hop cleared)
//   any         --error-->          Idle + Failed
//
// Terminal signals while Idle are duplicates (commit-visible followed by
// page-finished) and are ignored.  Every URL seen is kept for the cookie
// harvest; the list only grows.

use std::collections::HashSet;

use tracing::debug;
use truv_core::types::{NavigationError, TerminalSignal};

/// Where the current navigation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    Idle,
    Loading,
    Redirecting,
}

/// What the surface owner should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSignal {
    /// A navigation began from idle; show the loading state.
    Started { url: String },
    /// The last started page is showing.
    Settled { url: Option<String> },
    /// The navigation failed.  Only connectivity failures get the retry UI.
    Failed { connectivity: bool },
}

/// Per-surface navigation state.
#[derive(Debug)]
pub struct NavigationTracker {
    phase: NavigationPhase,
    /// URL of the most recent page start.
    target: Option<String>,
    terminal: TerminalSignal,
    visited: Vec<String>,
    seen: HashSet<String>,
}

impl NavigationTracker {
    pub fn new(terminal: TerminalSignal) -> Self {
        Self {
            phase: NavigationPhase::Idle,
            target: None,
            terminal,
            visited: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn phase(&self) -> NavigationPhase {
        self.phase
    }

    /// Whether a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.phase != NavigationPhase::Idle
    }

    /// Whether an older hop of a redirect chain has not reported back yet.
    pub fn redirect_pending(&self) -> bool {
        self.phase == NavigationPhase::Redirecting
    }

    /// Distinct URLs seen on this surface, in first-seen order.
    pub fn visited_urls(&self) -> &[String] {
        &self.visited
    }

    /// Remember a URL for the cookie harvest.
    pub fn record_visit(&mut self, url: &str) {
        if url.is_empty() || !self.seen.insert(url.to_string()) {
            return;
        }
        self.visited.push(url.to_string());
    }

    /// A request the surface intercepted (header scrubbing, overrides).
    pub fn on_request_intercepted(&mut self, url: &str) {
        self.record_visit(url);
    }

    pub fn on_page_started(&mut self, url: &str) -> Option<NavigationSignal> {
        self.record_visit(url);
        self.target = Some(url.to_string());

        match self.phase {
            NavigationPhase::Idle => {
                self.phase = NavigationPhase::Loading;
                Some(NavigationSignal::Started {
                    url: url.to_string(),
                })
            }
            NavigationPhase::Loading | NavigationPhase::Redirecting => {
                debug!(url, "navigation superseded before completing");
                self.phase = NavigationPhase::Redirecting;
                None
            }
        }
    }

    pub fn on_commit_visible(&mut self, url: Option<&str>) -> Option<NavigationSignal> {
        if let Some(url) = url {
            self.record_visit(url);
        }
        match self.terminal {
            TerminalSignal::CommitVisible => self.on_terminal(url),
            TerminalSignal::PageFinished => None,
        }
    }

    pub fn on_page_finished(&mut self, url: Option<&str>) -> Option<NavigationSignal> {
        if let Some(url) = url {
            self.record_visit(url);
        }
        match self.terminal {
            TerminalSignal::PageFinished => self.on_terminal(url),
            TerminalSignal::CommitVisible => None,
        }
    }

    pub fn on_error(&mut self, error: &NavigationError) -> NavigationSignal {
        if let Some(url) = &error.url {
            self.record_visit(url);
        }
        self.phase = NavigationPhase::Idle;
        NavigationSignal::Failed {
            connectivity: error.kind.is_connectivity(),
        }
    }

    fn on_terminal(&mut self, url: Option<&str>) -> Option<NavigationSignal> {
        match self.phase {
            NavigationPhase::Idle => None,
            NavigationPhase::Loading => Some(self.settle()),
            NavigationPhase::Redirecting => {
                let for_target = url.is_none_or(|u| Some(u) == self.target.as_deref());
                if for_target {
                    Some(self.settle())
                } else {
                    debug!(url, "redirect hop finished; waiting for target");
                    self.phase = NavigationPhase::Loading;
                    None
                }
            }
        }
    }

    fn settle(&mut self) -> NavigationSignal {
        self.phase = NavigationPhase::Idle;
        NavigationSignal::Settled {
            url: self.target.clone(),
        }
    }
}

impl Default for NavigationTracker {
    fn default() -> Self {
        Self::new(TerminalSignal::default())
    }
}
