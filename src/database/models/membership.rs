use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of an organization membership.
///
/// ```text
/// invited ──accept──▶ active
///    │ ▲
/// refuse│ │reinvite
///    ▼ │
/// refused
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Invited,
    Active,
    Refused,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Invited => "invited",
            MembershipStatus::Active => "active",
            MembershipStatus::Refused => "refused",
        }
    }

    pub fn can_transition_to(&self, next: MembershipStatus) -> bool {
        matches!(
            (self, next),
            (MembershipStatus::Invited, MembershipStatus::Active)
                | (MembershipStatus::Invited, MembershipStatus::Refused)
                | (MembershipStatus::Refused, MembershipStatus::Invited)
        )
    }
}

impl Display for MembershipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = MembershipStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invited" => Ok(MembershipStatus::Invited),
            "active" => Ok(MembershipStatus::Active),
            "refused" => Ok(MembershipStatus::Refused),
            other => Err(MembershipStatusParseError(other.to_string())),
        }
    }
}

impl TryFrom<String> for MembershipStatus {
    type Error = MembershipStatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid membership status: {0}")]
pub struct MembershipStatusParseError(pub String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("membership cannot move from {from} to {to}")]
    InvalidTransition {
        from: MembershipStatus,
        to: MembershipStatus,
    },

    #[error("invitation expired")]
    InvitationExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationUser {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: MembershipStatus,
    pub invited_by: Option<Uuid>,
    pub invited_at: DateTime<Utc>,
    pub joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationUser {
    /// Pending membership awaiting the invitee's answer.
    pub fn invite(organization_id: Uuid, user_id: Uuid, role_id: Uuid, invited_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            role_id,
            status: MembershipStatus::Invited,
            invited_by: Some(invited_by),
            invited_at: now,
            joined_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Membership of an organization's creator, active from the start.
    pub fn founder(organization_id: Uuid, user_id: Uuid, role_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            role_id,
            status: MembershipStatus::Active,
            invited_by: None,
            invited_at: now,
            joined_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.status == MembershipStatus::Invited && now - self.invited_at > ttl
    }

    pub fn accept(&mut self, now: DateTime<Utc>, ttl: Duration) -> Result<(), MembershipError> {
        self.ensure_transition(MembershipStatus::Active)?;
        if self.is_expired(now, ttl) {
            return Err(MembershipError::InvitationExpired);
        }
        self.status = MembershipStatus::Active;
        self.joined_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn refuse(&mut self) -> Result<(), MembershipError> {
        self.ensure_transition(MembershipStatus::Refused)?;
        self.status = MembershipStatus::Refused;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Re-opens a refused or expired invitation, possibly with a different role.
    /// The invitation window restarts at `now`.
    pub fn reinvite(
        &mut self,
        role_id: Uuid,
        invited_by: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), MembershipError> {
        if !self.is_expired(now, ttl) {
            self.ensure_transition(MembershipStatus::Invited)?;
        }
        self.status = MembershipStatus::Invited;
        self.role_id = role_id;
        self.invited_by = Some(invited_by);
        self.invited_at = now;
        self.joined_at = None;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_role(&mut self, role_id: Uuid) {
        self.role_id = role_id;
        self.updated_at = Utc::now();
    }

    fn ensure_transition(&self, to: MembershipStatus) -> Result<(), MembershipError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(MembershipError::InvalidTransition { from: self.status, to })
        }
    }
}
