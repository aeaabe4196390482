//! User data models

use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub id: usize,
    pub name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: usize,
    pub handle: String,
    pub party_id: usize,
}

/// What a logged in user sees about themselves.
#[derive(Serialize, Debug, Clone)]
pub struct UserProfile {
    pub id: usize,
    pub handle: String,
    pub party: Party,
}

#[derive(Serialize, Debug, Clone)]
pub struct PartyOverview {
    pub id: usize,
    pub name: String,
    pub members: Vec<String>,
}
