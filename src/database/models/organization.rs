use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Renaming also re-derives the slug.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.slug = slugify(&self.name);
        self.updated_at = Utc::now();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.updated_at = Utc::now();
    }
}

/// Lower-case ASCII alphanumerics separated by single hyphens. Names with no
/// ASCII alphanumerics fall back to a hash of the name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        return format!("org-{}", &hash[..12]);
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("  Acme -- Corp!! "), "acme-corp");
        assert_eq!(slugify("R&D 2024"), "r-d-2024");
    }

    #[test]
    fn slugify_hashes_non_ascii_names() {
        let slug = slugify("日本");
        assert!(slug.starts_with("org-"));
        assert_eq!(slug.len(), "org-".len() + 12);
        assert_eq!(slug, slugify("日本"));
        assert_ne!(slug, slugify("中国"));
    }

    #[test]
    fn rename_rederives_slug() {
        let mut org = Organization::new("Acme", None);
        assert_eq!(org.slug, "acme");
        org.set_name("Acme Labs");
        assert_eq!(org.slug, "acme-labs");
        assert!(org.updated_at >= org.created_at);
    }
}
