use serde::{Deserialize, Serialize};

/// One version of a SendGrid dynamic template. SendGrid reports the active
/// flag as an integer (1 = active). The stored `html_content` is not
/// deserialized: the patch step only ever writes fresh HTML, and serde
/// skips unknown fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateVersion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    pub active: u8,
}

impl TemplateVersion {
    pub fn is_active(&self) -> bool {
        self.active == 1
    }
}

/// Template read response; only the versions list is consumed.
#[derive(Debug, Deserialize)]
pub struct TemplateResponse {
    pub versions: Vec<TemplateVersion>,
}

/// PATCH body for a version update. Name and subject are echoed back
/// unchanged; only the HTML is new.
#[derive(Debug, Serialize)]
pub struct VersionPatch<'a> {
    pub name: &'a str,
    pub subject: &'a str,
    pub html_content: &'a str,
}
