//! Typed views over Okta resources.
//!
//! # Design
//! Each type here is a `resource_type!` view: it owns no fields of its own
//! and reads and writes through the wrapped `Resource`, so unknown
//! properties returned by the API survive a read-modify-write cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource_type;

/// Lifecycle status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Staged,
    Provisioned,
    Active,
    Recovery,
    LockedOut,
    PasswordExpired,
    Suspended,
    Deprovisioned,
}

resource_type! {
    /// An Okta user.
    pub struct User;
}

impl User {
    pub fn id(&self) -> Option<String> {
        self.get_string("id")
    }

    pub fn status(&self) -> Option<UserStatus> {
        self.get_enum("status")
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.get_date_time("created")
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.get_date_time("lastLogin")
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.get_resource("profile")
    }

    pub fn set_profile(&self, profile: &UserProfile) {
        self.set_resource("profile", profile);
    }
}

resource_type! {
    /// The profile attributes of a user.
    pub struct UserProfile;
}

impl UserProfile {
    pub fn login(&self) -> Option<String> {
        self.get_string("login")
    }

    pub fn set_login(&self, value: &str) {
        self.set_property("login", value);
    }

    pub fn email(&self) -> Option<String> {
        self.get_string("email")
    }

    pub fn set_email(&self, value: &str) {
        self.set_property("email", value);
    }

    pub fn first_name(&self) -> Option<String> {
        self.get_string("firstName")
    }

    pub fn set_first_name(&self, value: &str) {
        self.set_property("firstName", value);
    }

    pub fn last_name(&self) -> Option<String> {
        self.get_string("lastName")
    }

    pub fn set_last_name(&self, value: &str) {
        self.set_property("lastName", value);
    }

    pub fn mobile_phone(&self) -> Option<String> {
        self.get_string("mobilePhone")
    }

    pub fn set_mobile_phone(&self, value: &str) {
        self.set_property("mobilePhone", value);
    }
}

resource_type! {
    /// A rule inside a password policy.
    pub struct PasswordPolicyRule;
}

impl PasswordPolicyRule {
    pub fn id(&self) -> Option<String> {
        self.get_string("id")
    }

    pub fn name(&self) -> Option<String> {
        self.get_string("name")
    }

    pub fn set_name(&self, value: &str) {
        self.set_property("name", value);
    }

    pub fn priority(&self) -> Option<i64> {
        self.get_i64("priority")
    }

    pub fn actions(&self) -> Option<PasswordPolicyRuleActions> {
        self.get_resource("actions")
    }

    pub fn set_actions(&self, value: &PasswordPolicyRuleActions) {
        self.set_resource("actions", value);
    }

    pub fn conditions(&self) -> Option<PasswordPolicyRuleConditions> {
        self.get_resource("conditions")
    }

    pub fn set_conditions(&self, value: &PasswordPolicyRuleConditions) {
        self.set_resource("conditions", value);
    }
}

resource_type! {
    pub struct PasswordPolicyRuleActions;
}

impl PasswordPolicyRuleActions {
    /// `passwordChange.access`, e.g. `ALLOW` or `DENY`.
    pub fn password_change_access(&self) -> Option<String> {
        self.get_resource::<crate::Resource>("passwordChange")?
            .get_string("access")
    }

    pub fn self_service_password_reset_access(&self) -> Option<String> {
        self.get_resource::<crate::Resource>("selfServicePasswordReset")?
            .get_string("access")
    }
}

resource_type! {
    pub struct PasswordPolicyRuleConditions;
}

impl PasswordPolicyRuleConditions {
    /// `network.connection`, e.g. `ANYWHERE` or `ZONE`.
    pub fn network_connection(&self) -> Option<String> {
        self.get_resource::<crate::Resource>("network")?
            .get_string("connection")
    }

    pub fn included_user_ids(&self) -> Vec<String> {
        self.get_resource::<crate::Resource>("people")
            .and_then(|people| people.get_resource::<crate::Resource>("users"))
            .map(|users| users.get_property::<Vec<String>>("include"))
            .unwrap_or_default()
    }
}

resource_type! {
    /// The body of an Okta error response.
    pub struct ErrorDetail;
}

impl ErrorDetail {
    pub fn error_code(&self) -> Option<String> {
        self.get_string("errorCode")
    }

    pub fn error_summary(&self) -> Option<String> {
        self.get_string("errorSummary")
    }

    pub fn error_link(&self) -> Option<String> {
        self.get_string("errorLink")
    }

    pub fn error_id(&self) -> Option<String> {
        self.get_string("errorId")
    }

    pub fn error_causes(&self) -> Vec<ErrorDetail> {
        self.get_list("errorCauses")
    }
}
