//! Genesis Dumper Core Library
//!
//! Scrapes the Genesis student portal's daily bell schedule and turns it into
//! an ICS calendar: extract rows from each day's page, anchor their times to
//! the day in the school's timezone, tag every course, and render the result.

pub mod calendar;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ics;
pub mod portal;
pub mod refine;
pub mod types;

// Re-export core types and error handling
pub use error::{Error, Result};
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{
        classify::*, config::*, extract::*, fetch::*, ics::*, portal::*, refine::*, types::*,
    };
}
