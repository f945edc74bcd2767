//! Interrupt (distraction handling) model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::{new_record_id, normalize_text_option};

/// Trigger recorded when the user leaves the cause blank.
pub const DEFAULT_TRIGGER: &str = "distracted / wanted to escape";

/// How an interruption was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptOutcome {
    ReturnToToday,
    ShortBreak,
    Quit,
}

impl InterruptOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReturnToToday => "return_to_today",
            Self::ShortBreak => "short_break",
            Self::Quit => "quit",
        }
    }
}

impl fmt::Display for InterruptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterruptOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "return_to_today" => Ok(Self::ReturnToToday),
            "short_break" => Ok(Self::ShortBreak),
            "quit" => Ok(Self::Quit),
            other => Err(format!("unknown interrupt outcome '{other}'")),
        }
    }
}

/// One occurrence of the distraction-handling flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interrupt {
    /// Client-generated id, the merge key
    pub id: String,
    pub at: DateTime<Utc>,
    pub trigger: String,
    /// Whether the cooldown finished before the outcome was chosen
    pub cooldown_done: bool,
    pub outcome: InterruptOutcome,
}

impl Interrupt {
    /// Create an interrupt with a fresh client id, defaulting a blank trigger.
    #[must_use]
    pub fn new(
        at: DateTime<Utc>,
        trigger: Option<String>,
        cooldown_done: bool,
        outcome: InterruptOutcome,
    ) -> Self {
        Self {
            id: new_record_id("i"),
            at,
            trigger: normalize_text_option(trigger).unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
            cooldown_done,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_trigger_gets_default() {
        let interrupt = Interrupt::new(Utc::now(), Some("  ".to_string()), true, InterruptOutcome::Quit);
        assert_eq!(interrupt.trigger, DEFAULT_TRIGGER);
        assert!(interrupt.id.starts_with("i_"));

        let interrupt = Interrupt::new(
            Utc::now(),
            Some(" phone buzzed ".to_string()),
            false,
            InterruptOutcome::ShortBreak,
        );
        assert_eq!(interrupt.trigger, "phone buzzed");
    }

    #[test]
    fn outcome_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&InterruptOutcome::ReturnToToday).unwrap();
        assert_eq!(json, "\"return_to_today\"");
        assert_eq!(
            "short_break".parse::<InterruptOutcome>(),
            Ok(InterruptOutcome::ShortBreak)
        );
        assert!("snooze".parse::<InterruptOutcome>().is_err());
    }

    #[test]
    fn interrupt_serializes_camel_case() {
        let interrupt = Interrupt::new(Utc::now(), None, true, InterruptOutcome::Quit);
        let value = serde_json::to_value(&interrupt).unwrap();
        assert_eq!(value["cooldownDone"], true);
        assert_eq!(value["outcome"], "quit");
    }
}
