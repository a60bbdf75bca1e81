//! Role-based gating of dashboard actions.
//!
//! Everything that asks "may this user do X" goes through [`can`]. The
//! checks are cosmetic: the backend enforces authorization on its own.

use serde::Serialize;

// ---

/// User role, as stored in the backend's `tipoUsuario` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    #[serde(rename = "administrador")]
    Administrator,
    #[serde(rename = "estudiante")]
    Student,
    #[serde(rename = "mantenimiento")]
    Maintenance,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "administrador" => Some(Role::Administrator),
            "estudiante" => Some(Role::Student),
            "mantenimiento" => Some(Role::Maintenance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrador",
            Role::Student => "estudiante",
            Role::Maintenance => "mantenimiento",
        }
    }
}

/// A gated dashboard action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewDashboard,
    SelectProfile,
    ManageProfiles,
    ViewInactiveProfiles,
    ControlIrrigation,
    AccessReports,
    AccessConfiguration,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::ViewDashboard,
        Action::SelectProfile,
        Action::ManageProfiles,
        Action::ViewInactiveProfiles,
        Action::ControlIrrigation,
        Action::AccessReports,
        Action::AccessConfiguration,
    ];
}

/// Whether `role` may perform `action`. No role (no session) may do nothing.
pub fn can(action: Action, role: Option<Role>) -> bool {
    // ---
    let Some(role) = role else {
        return false;
    };

    match action {
        Action::ViewDashboard | Action::SelectProfile => true,
        Action::ManageProfiles | Action::ControlIrrigation | Action::AccessReports => {
            matches!(role, Role::Administrator | Role::Maintenance)
        }
        Action::ViewInactiveProfiles | Action::AccessConfiguration => role == Role::Administrator,
    }
}
