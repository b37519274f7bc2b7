use serde::Serialize;

/// Who the caller is according to the configured identity verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Stable subject id issued by the auth provider.
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub email_verified: bool,
    pub role: Option<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            name: None,
            email_verified: false,
            role: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Display name out of provider metadata (`full_name`, then `name`).
pub(crate) fn metadata_name(meta: &serde_json::Value) -> Option<String> {
    ["full_name", "name"]
        .iter()
        .filter_map(|key| meta.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_name_prefers_full_name() {
        let meta = json!({ "full_name": "Ada Lovelace", "name": "ada" });
        assert_eq!(metadata_name(&meta).as_deref(), Some("Ada Lovelace"));
        let meta = json!({ "full_name": "  ", "name": "ada" });
        assert_eq!(metadata_name(&meta).as_deref(), Some("ada"));
        assert_eq!(metadata_name(&json!({})), None);
    }
}
