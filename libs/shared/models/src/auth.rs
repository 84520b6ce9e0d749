use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Which credential slot a verified token arrived through. A patient-kind
/// token and a clinician-kind token share the same identity space; the kind
/// is positional, not a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Patient,
    Clinician,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Patient => write!(f, "patient"),
            CredentialKind::Clinician => write!(f, "clinician"),
        }
    }
}

/// A caller whose credential has been verified. Identity comes from the
/// token's `sub` claim only, never from a caller-declared value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user: User,
    pub kind: CredentialKind,
}

impl Participant {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn is_patient(&self) -> bool {
        self.kind == CredentialKind::Patient
    }

    pub fn is_clinician(&self) -> bool {
        self.kind == CredentialKind::Clinician
    }
}
