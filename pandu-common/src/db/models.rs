//! Database models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scope::Role;

/// Member gender, used to select the gendered troop identifier when
/// formatting document numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Parse from the stored string form; unknown values fall back to Other
    pub fn parse(s: &str) -> Gender {
        match s {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub guid: String,
    pub name: String,
    pub phone: String,
    pub institution_guid: Option<String>,
    pub member_number: Option<String>,
    pub parent_number: Option<String>,
    pub gender: Gender,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub religion: Option<String>,
    pub nationality: Option<String>,
    pub village: Option<String>,
    pub sub_district: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub parent_phone: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    pub guid: String,
    pub name: String,
    pub sub_district: Option<String>,
    pub address: Option<String>,
    pub troop_male: Option<String>,
    pub troop_female: Option<String>,
    pub troop_leader_male: Option<String>,
    pub troop_leader_female: Option<String>,
    pub troop_leader_number_male: Option<String>,
    pub troop_leader_number_female: Option<String>,
    pub headmaster_name: Option<String>,
    pub headmaster_number: Option<String>,
}

impl Institution {
    /// Gendered troop identifier embedded in document numbers; anything
    /// other than female resolves to the male troop.
    pub fn troop_for(&self, gender: Gender) -> &str {
        let troop = match gender {
            Gender::Female => self.troop_female.as_deref(),
            _ => self.troop_male.as_deref(),
        };
        troop.unwrap_or("")
    }
}

/// Rank-progression milestones, lowest to highest
///
/// Exactly one level describes a progression row at any point in time;
/// `RankProgression::current_level` is the single derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierLevel {
    None,
    Tier1,
    Tier2,
    Tier3,
}

impl TierLevel {
    /// Domain label recorded on top-honor awards
    pub fn label(&self) -> Option<&'static str> {
        match self {
            TierLevel::None => None,
            TierLevel::Tier1 => Some("MULA"),
            TierLevel::Tier2 => Some("BANTU"),
            TierLevel::Tier3 => Some("TATA"),
        }
    }
}

/// Per-member rank progression row ("Tku")
///
/// Invariant: tier3 implies tier2 implies tier1. Flags only move forward
/// except for the revert operation, which walks the current maximum level
/// back by exactly one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankProgression {
    pub guid: String,
    pub member_guid: String,
    pub tier1: bool,
    pub tier2: bool,
    pub tier3: bool,
    pub tier1_doc: String,
    pub tier2_doc: String,
    pub tier3_doc: String,
    pub tier1_date: Option<NaiveDate>,
    pub tier2_date: Option<NaiveDate>,
    pub tier3_date: Option<NaiveDate>,
}

impl RankProgression {
    /// Current maximum completed level
    pub fn current_level(&self) -> TierLevel {
        if self.tier3 {
            TierLevel::Tier3
        } else if self.tier2 {
            TierLevel::Tier2
        } else if self.tier1 {
            TierLevel::Tier1
        } else {
            TierLevel::None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeType {
    pub guid: String,
    pub name: String,
    pub category: Option<String>,
    pub color: Option<String>,
}

/// Proficiency badge award row ("Tkk")
///
/// Revocation clears the document number and date but keeps the row, so
/// numbering history stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeAward {
    pub guid: String,
    pub member_guid: String,
    pub badge_type_guid: String,
    pub doc_number: String,
    pub award_date: Option<NaiveDate>,
    pub examiner_name: Option<String>,
    pub examiner_position: Option<String>,
    pub examiner_address: Option<String>,
}

/// Top-honor award status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarudaStatus {
    Pending,
    Approved,
}

impl GarudaStatus {
    pub fn as_i64(&self) -> i64 {
        match self {
            GarudaStatus::Pending => 0,
            GarudaStatus::Approved => 1,
        }
    }

    pub fn from_i64(v: i64) -> GarudaStatus {
        if v == 1 {
            GarudaStatus::Approved
        } else {
            GarudaStatus::Pending
        }
    }
}

/// Top-honor award row, at most one per member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarudaAward {
    pub guid: String,
    pub member_guid: String,
    pub tier_label: String,
    pub badge_count: i64,
    pub status: GarudaStatus,
    pub approved_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub guid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub institution_guid: Option<String>,
    /// 0 = pending approval, 1 = approved
    pub status: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_guid: Option<String>,
    pub action: String,
    pub description: String,
    pub module: String,
    pub created_at: String,
}
