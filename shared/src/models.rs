use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::validate_player_name;

/// A squad member who can be picked for a spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// One completed spin. `player_name` is free text, not a reference to a
/// [`Player`], so history survives players being removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinResult {
    pub id: String,
    pub player_name: String,
    pub result: String,
    pub timestamp: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Guest,
}

impl Role {
    pub fn can_manage_players(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn mode_label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin Mode",
            Role::Guest => "User Mode",
        }
    }
}

// === API Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub role: Role,
    pub mode: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub username: String,
    pub role: Role,
    pub mode: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddPlayerRequest {
    #[validate(custom = "validate_player_name")]
    pub name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResultsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SoundSetting {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageSummary {
    pub tiers: Vec<String>,
    pub players: usize,
    pub results: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"guest\"").unwrap();
        assert_eq!(role, Role::Guest);
    }

    #[test]
    fn test_only_admin_manages_players() {
        assert!(Role::Admin.can_manage_players());
        assert!(!Role::Guest.can_manage_players());
        assert_eq!(Role::Guest.mode_label(), "User Mode");
    }

    #[test]
    fn test_add_player_request_validation() {
        let ok = AddPlayerRequest { name: "Sam Kerr".to_string() };
        assert!(ok.validate().is_ok());

        let blank = AddPlayerRequest { name: "   ".to_string() };
        assert!(blank.validate().is_err());
    }
}
