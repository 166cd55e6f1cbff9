#![deny(warnings)]

//! Progression, economy and acquisition rules for Warfront.
//!
//! Every operation is a plain function over `&Catalog`, `&RulesConfig` and
//! `&mut PlayerState`. Failures leave the state untouched.

pub mod acquisition;
pub mod income;
pub mod missions;
pub mod progression;

pub use acquisition::{can_buy_unit, can_research, purchase_unit, research, Purchase, ResearchReport};
pub use income::{collect_income, compute_income, income_breakdown, income_due, IncomeReport, IncomeStatus};
pub use missions::{claim_mission, mission_board, mission_progress, MissionClaim, MissionStatus};
pub use progression::{
    apply_experience, experience_to_level, standing, total_power, LevelUp, Standing,
};
