//! Arming mode and alarm escalation level.
//!
//! Both enums serialize with the upper-case names used in persisted state
//! (`ARMED_HOME`, `PENDING_ALARM`, ...) and display/parse in snake case for
//! logs and the command line.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Whether the system is disarmed or armed, and in which variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ArmingStatus {
    #[default]
    Disarmed,
    ArmedHome,
    ArmedAway,
}

impl ArmingStatus {
    /// Human readable label for status displays.
    pub fn description(self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "Disarmed",
            ArmingStatus::ArmedHome => "Armed - At Home",
            ArmingStatus::ArmedAway => "Armed - Away",
        }
    }

    pub fn is_armed(self) -> bool {
        self != ArmingStatus::Disarmed
    }
}

/// Current escalation level of the alarm.
///
/// Ordered `NoAlarm < PendingAlarm < Alarm`. The ordering only describes
/// severity; transitions between levels are decided by the controller rules
/// and may go down as well as up.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AlarmStatus {
    #[default]
    NoAlarm,
    PendingAlarm,
    Alarm,
}

impl AlarmStatus {
    /// Human readable label for status displays.
    pub fn description(self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "Cool and Good",
            AlarmStatus::PendingAlarm => "I'm in Danger...",
            AlarmStatus::Alarm => "Awooga!",
        }
    }
}
