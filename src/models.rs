//! Data models for canvassing
//!
//! This module contains the records shared by the managers: the signed-in
//! user, the property rows from the bundled dataset, and the logged visits.

use crate::error::DoorknockError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Profile of the signed-in canvasser, as returned by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Provider-assigned user identifier
    pub id: String,
    /// Account email address
    pub email: String,
    /// Name shown in the header
    pub display_name: String,
    /// Profile picture, when the provider has one
    pub avatar_url: Option<String>,
}

/// One row of the property dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    /// Street address, never empty
    pub address: String,
    /// Owner of record, never empty
    pub owner_name: String,
    /// Number of bedrooms
    pub bedrooms: i64,
    /// Number of bathrooms (half baths allowed)
    pub bathrooms: f64,
    /// Year of construction
    pub year_built: i64,
    /// Living area in square feet
    pub square_feet: i64,
    /// Lot size as written in the dataset (e.g. "0.25 acres")
    pub lot_size: String,
    /// Years the current owner has held the property
    pub years_owned: i64,
    /// Last sale price in dollars
    pub sale_price: i64,
    /// Last sale date as written in the dataset
    pub sale_date: String,
}

/// Outcome of a door knock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityAction {
    /// A flyer was left at the door
    #[serde(rename = "Flyer Dropped")]
    FlyerDropped,
    /// Someone answered and talked
    #[serde(rename = "Conversation Had")]
    ConversationHad,
    /// The resident asked not to be contacted again
    #[serde(rename = "Do Not Contact")]
    DoNotContact,
}

impl ActivityAction {
    /// All buttons, in the order they appear on screen
    pub const ALL: [Self; 3] = [Self::FlyerDropped, Self::ConversationHad, Self::DoNotContact];

    /// Button label, also used verbatim in the CSV export
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FlyerDropped => "Flyer Dropped",
            Self::ConversationHad => "Conversation Had",
            Self::DoNotContact => "Do Not Contact",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActivityAction {
    type Err = DoorknockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flyer" | "flyer dropped" | "flyer-dropped" => Ok(Self::FlyerDropped),
            "conversation" | "conversation had" | "conversation-had" => Ok(Self::ConversationHad),
            "dnc" | "do not contact" | "do-not-contact" => Ok(Self::DoNotContact),
            _ => Err(DoorknockError::InvalidAction(s.to_string())),
        }
    }
}

/// A single logged visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Unique record identifier
    pub record_id: Uuid,
    /// When the button was pressed
    pub timestamp: DateTime<Local>,
    /// Resolved address at the time of the visit (free text, not a key)
    pub location_label: String,
    /// Which button was pressed
    pub action: ActivityAction,
}

impl ActivityRecord {
    /// Create a record with a fresh identifier
    #[must_use]
    pub fn new(location_label: impl Into<String>, action: ActivityAction, timestamp: DateTime<Local>) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            timestamp,
            location_label: location_label.into(),
            action,
        }
    }
}

/// Counts for the records logged today
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// All records from today
    pub total: usize,
    /// Flyer Dropped count
    pub flyers: usize,
    /// Conversation Had count
    pub conversations: usize,
    /// Do Not Contact count
    pub do_not_contact: usize,
}

impl DailyStats {
    /// Add one record to the tally
    pub fn tally(&mut self, action: ActivityAction) {
        self.total += 1;
        match action {
            ActivityAction::FlyerDropped => self.flyers += 1,
            ActivityAction::ConversationHad => self.conversations += 1,
            ActivityAction::DoNotContact => self.do_not_contact += 1,
        }
    }
}
