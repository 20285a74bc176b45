//! Email preference form. An unchecked checkbox is simply absent from the
//! request, so every missing field means "off".

use super::{checkbox, lenient_string};
use serde::{Deserialize, Serialize};

/// Raw preference input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSettingsForm {
    /// Checkbox value
    #[serde(default, deserialize_with = "lenient_string")]
    pub weekly_reminder_enabled: Option<String>,
    /// Checkbox value
    #[serde(default, deserialize_with = "lenient_string")]
    pub weekly_summary_enabled: Option<String>,
    /// Checkbox value
    #[serde(default, deserialize_with = "lenient_string")]
    pub monthly_summary_enabled: Option<String>,
    /// Checkbox value
    #[serde(default, deserialize_with = "lenient_string")]
    pub yearly_summary_enabled: Option<String>,
}

/// Cleaned preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmailPreferences {
    /// Weekly "log your expenses" nudge
    pub weekly_reminder_enabled: bool,
    /// Seven-day spending summary
    pub weekly_summary_enabled: bool,
    /// Monthly summary
    pub monthly_summary_enabled: bool,
    /// Year in review
    pub yearly_summary_enabled: bool,
}

impl UserSettingsForm {
    /// Reads the four checkboxes. This form has no invalid input.
    #[must_use]
    pub fn clean(&self) -> EmailPreferences {
        EmailPreferences {
            weekly_reminder_enabled: checkbox(self.weekly_reminder_enabled.as_deref()),
            weekly_summary_enabled: checkbox(self.weekly_summary_enabled.as_deref()),
            monthly_summary_enabled: checkbox(self.monthly_summary_enabled.as_deref()),
            yearly_summary_enabled: checkbox(self.yearly_summary_enabled.as_deref()),
        }
    }
}
