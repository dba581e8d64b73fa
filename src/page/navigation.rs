//! Page transitions: landing options, password modal, back buttons.
//!
//! The controller does not animate anything. Every input yields a list of
//! timed [`Step`]s that a renderer plays back.

use crate::error::DashError;
use crate::network::pages;
use crate::page::starfield::Viewport;
use std::str::FromStr;
use std::time::Duration;

pub const FADE: Duration = Duration::from_millis(800);
pub const NAVIGATE_AFTER_FADE: Duration = Duration::from_millis(900);
pub const OPTIONS_REVEAL: Duration = Duration::from_millis(2500);
pub const TBD_NOTICE_AFTER: Duration = Duration::from_millis(1000);
pub const TBD_NOTICE: &str = "Navigating to TBD...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    Btc,
    School,
}

impl Page {
    /// Delay before the page's main panel scales in.
    pub fn entrance_delay(&self) -> Duration {
        match self {
            Page::Landing => OPTIONS_REVEAL,
            Page::Btc => Duration::from_millis(300),
            Page::School => Duration::from_millis(100),
        }
    }
}

/// Landing page choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOption {
    Btc,
    School,
    Tbd,
}

impl FromStr for NavOption {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "btc" => Ok(Self::Btc),
            "school" => Ok(Self::School),
            "tbd" => Ok(Self::Tbd),
            other => Err(DashError::Validation(format!("unknown option: {}", other))),
        }
    }
}

/// Something the renderer does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Scale in the options panel or the dashboard.
    ShowPanel,
    /// Fade the panel to transparent and stop it taking clicks.
    HidePanel,
    RestorePanel,
    FadeOutStars(Duration),
    /// Darken the page behind the school dashboard.
    FadeOverlay(Duration),
    OpenPasswordModal,
    ClosePasswordModal,
    Notice(&'static str),
    Navigate(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub after: Duration,
    pub effect: Effect,
}

impl Step {
    fn now(effect: Effect) -> Self {
        Self::at(Duration::ZERO, effect)
    }

    fn at(after: Duration, effect: Effect) -> Self {
        Self { after, effect }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    Run(Vec<Step>),
    /// Not applicable on this page, or a transition is already running.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    ModalOpen,
    Leaving,
}

#[derive(Debug, Clone)]
pub struct NavigationController {
    page: Page,
    phase: Phase,
}

impl NavigationController {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            phase: Phase::Idle,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn is_leaving(&self) -> bool {
        self.phase == Phase::Leaving
    }

    /// Steps to run once the page has loaded.
    pub fn enter(&self) -> Vec<Step> {
        vec![Step::at(self.page.entrance_delay(), Effect::ShowPanel)]
    }

    /// Landing page option click.
    pub fn click(&mut self, option: NavOption) -> NavAction {
        if self.page != Page::Landing || self.phase != Phase::Idle {
            return NavAction::Ignored;
        }
        let steps = match option {
            NavOption::School => {
                self.phase = Phase::ModalOpen;
                vec![
                    Step::now(Effect::HidePanel),
                    Step::at(NAVIGATE_AFTER_FADE, Effect::OpenPasswordModal),
                ]
            }
            NavOption::Btc => {
                self.phase = Phase::Leaving;
                vec![
                    Step::now(Effect::HidePanel),
                    Step::now(Effect::FadeOutStars(FADE)),
                    Step::at(NAVIGATE_AFTER_FADE, Effect::Navigate(pages::BTC)),
                ]
            }
            NavOption::Tbd => {
                self.phase = Phase::Leaving;
                vec![
                    Step::now(Effect::HidePanel),
                    Step::now(Effect::FadeOutStars(FADE)),
                    Step::at(TBD_NOTICE_AFTER, Effect::Notice(TBD_NOTICE)),
                ]
            }
        };
        tracing::debug!(?option, "option selected");
        NavAction::Run(steps)
    }

    /// Click outside the password modal.
    pub fn close_modal(&mut self) -> NavAction {
        if self.phase != Phase::ModalOpen {
            return NavAction::Ignored;
        }
        self.phase = Phase::Idle;
        NavAction::Run(vec![
            Step::now(Effect::ClosePasswordModal),
            Step::now(Effect::RestorePanel),
        ])
    }

    /// The gate accepted the password; leave for `redirect`.
    pub fn gate_passed(&mut self, redirect: &'static str) -> NavAction {
        if self.phase != Phase::ModalOpen {
            return NavAction::Ignored;
        }
        self.phase = Phase::Leaving;
        NavAction::Run(vec![Step::now(Effect::Navigate(redirect))])
    }

    /// Back button of the BTC and school pages.
    pub fn back(&mut self) -> NavAction {
        if self.phase == Phase::Leaving {
            return NavAction::Ignored;
        }
        let steps = match self.page {
            Page::Landing => return NavAction::Ignored,
            Page::Btc => vec![
                Step::now(Effect::HidePanel),
                Step::now(Effect::FadeOutStars(FADE)),
                Step::at(NAVIGATE_AFTER_FADE, Effect::Navigate(pages::HOME)),
            ],
            Page::School => vec![
                Step::now(Effect::HidePanel),
                Step::at(Duration::from_millis(10), Effect::FadeOverlay(FADE)),
                Step::at(FADE, Effect::Navigate(pages::HOME)),
            ],
        };
        self.phase = Phase::Leaving;
        NavAction::Run(steps)
    }
}

/// Whether the visitor arrived from the BTC page.
pub fn is_returning(referrer: &str) -> bool {
    referrer.contains("btc.html")
}

/// Background position, in percent of each axis, for a mouse position.
pub fn parallax(mouse_x: f64, mouse_y: f64, viewport: Viewport) -> (f64, f64) {
    let norm = |v: f64, extent: f64| if extent > 0.0 { v / extent } else { 0.0 };
    (
        norm(mouse_x, viewport.width) * 5.0 + 45.0,
        norm(mouse_y, viewport.height) * 5.0 + 45.0,
    )
}
