//! Request/form types (Deserialize)

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    pub project_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// `signup` switches the auth panel to account creation.
    #[serde(default)]
    pub mode: Option<String>,
}

impl IndexQuery {
    pub fn signup_mode(&self) -> bool {
        self.mode.as_deref() == Some("signup")
    }
}
