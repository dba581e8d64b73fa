//! Page-level behavior that needs no network: the starfield, transitions
//! between pages and the school dashboard.

pub mod navigation;
pub mod school;
pub mod starfield;

pub use navigation::{NavAction, NavOption, NavigationController, Page};
pub use school::SchoolDashboard;
pub use starfield::{PageProfile, ShootingStar, Starfield, Viewport};
