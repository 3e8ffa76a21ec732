use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type StatusId = i64;
pub type AccountId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    /// Decode the integer column stored by the content database.
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Visibility::Public),
            1 => Some(Visibility::Unlisted),
            2 => Some(Visibility::Private),
            3 => Some(Visibility::Direct),
            _ => None,
        }
    }
}

/// Owner snapshot as seen by the trend engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub discoverable: bool,
    pub silenced: bool,
    /// Set once the owner's content has been sent to reviewers
    pub requested_review_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn requested_review(&self) -> bool {
        self.requested_review_at.is_some()
    }
}

/// Immutable status snapshot fetched from the content repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub id: StatusId,
    pub account: Account,
    pub created_at: DateTime<Utc>,
    pub visibility: Visibility,
    pub spoiler_text: String,
    pub sensitive: bool,
    pub in_reply_to_id: Option<StatusId>,
    pub reblogs_count: i64,
    pub favourites_count: i64,
    /// Moderator approval for public trending
    pub trendable: bool,
    /// Original status when this one is a reblog
    pub reblog: Option<Box<Status>>,
}

impl Status {
    /// The status engagement accrues to: the original for a reblog, itself otherwise.
    pub fn proper(&self) -> &Status {
        match &self.reblog {
            Some(original) => original.proper(),
            None => self,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to_id.is_some()
    }

    pub fn observed_engagement(&self) -> f64 {
        (self.reblogs_count + self.favourites_count) as f64
    }

    pub fn review_requested(&self) -> bool {
        self.account.requested_review()
    }
}

/// Staff member who receives trending review emails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reviewer {
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
}
