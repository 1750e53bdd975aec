pub mod base;
pub mod genesis;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{Credentials, Result, Session};

pub use base::*;
pub use genesis::GenesisPortal;

/// Where day schedules come from
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Source name, used in logs
    fn name(&self) -> &str;

    /// Log in and return the session every later request reuses
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session>;

    /// Raw schedule markup for one calendar date
    async fn fetch_day(&self, session: &Session, date: NaiveDate) -> Result<String>;
}
