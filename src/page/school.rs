//! School dashboard view model: sections, class heading, assignment filter,
//! mobile sidebar and the demo notices.

use crate::error::DashError;
use serde::{Deserialize, Serialize};

/// Widest viewport that gets the collapsible sidebar.
pub const MOBILE_MAX_WIDTH: f64 = 768.0;
pub const UPLOAD_NOTICE: &str = "File upload functionality would be implemented here.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub title: String,
    /// Status as displayed, e.g. `Pending` or `Submitted`.
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct SchoolDashboard {
    sections: Vec<String>,
    active: usize,
    heading: Option<String>,
    assignments: Vec<Assignment>,
    mobile: bool,
    sidebar_expanded: bool,
}

impl SchoolDashboard {
    /// The first section starts active.
    pub fn new(
        sections: Vec<String>,
        assignments: Vec<Assignment>,
        viewport_width: f64,
    ) -> Result<Self, DashError> {
        if sections.is_empty() {
            return Err(DashError::Validation("at least one section is required".into()));
        }
        Ok(Self {
            sections,
            active: 0,
            heading: None,
            assignments,
            mobile: viewport_width <= MOBILE_MAX_WIDTH,
            sidebar_expanded: false,
        })
    }

    pub fn active_section(&self) -> &str {
        &self.sections[self.active]
    }

    /// Whether `id` is the one visible section.
    pub fn is_visible(&self, id: &str) -> bool {
        self.active_section() == id
    }

    /// Show `id` and hide every other section. Collapses the mobile sidebar.
    pub fn select_section(&mut self, id: &str) -> Result<&str, DashError> {
        let index = self
            .sections
            .iter()
            .position(|s| s == id)
            .ok_or_else(|| DashError::Validation(format!("unknown section: {}", id)))?;
        self.active = index;
        self.sidebar_expanded = false;
        Ok(self.active_section())
    }

    /// Heading for the chosen class, e.g. `Assignments - Math`.
    pub fn select_class(&mut self, class: &str) -> &str {
        let heading = format!(
            "{} - {}",
            capitalize_first(self.active_section()),
            capitalize_first(class)
        );
        self.heading.insert(heading).as_str()
    }

    pub fn heading(&self) -> Option<&str> {
        self.heading.as_deref()
    }

    /// Assignments shown under `filter`: `all`, or a lowercase status.
    pub fn filter_assignments(&self, filter: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| filter == "all" || a.status.to_lowercase() == filter)
            .collect()
    }

    /// Tap on the sidebar header. Only mobile layouts collapse. Returns the
    /// new expanded state.
    pub fn toggle_sidebar(&mut self) -> bool {
        if self.mobile {
            self.sidebar_expanded = !self.sidebar_expanded;
        }
        self.sidebar_expanded
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub fn sidebar_expanded(&self) -> bool {
        self.sidebar_expanded
    }
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn download_notice(file: &str) -> String {
    format!("Downloading {}...", file)
}

pub fn review_notice(quiz: &str) -> String {
    format!("Opening review for {}", quiz)
}

pub fn start_quiz_notice(quiz: &str) -> String {
    format!("Starting quiz: {}", quiz)
}
