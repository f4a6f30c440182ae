use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registered marketplace user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub university: Option<String>,
    pub is_admin: bool,
    pub wallet_balance: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// What other users may see about a seller
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub university: Option<String>,
    pub member_since: NaiveDateTime,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub active_listing_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub university: Option<String>,
}

/// `username` also accepts the account email
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub university: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

impl RegisterRequest {
    /// Trim and lowercase what should be case-insensitive, then check shape
    pub fn normalized(self) -> Result<Self, String> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_lowercase();
        let full_name = trim_optional(self.full_name);
        let university = trim_optional(self.university);

        reject_nul(&email, "Email")?;
        reject_nul(full_name.as_deref().unwrap_or_default(), "Full name")?;
        reject_nul(university.as_deref().unwrap_or_default(), "University")?;

        if username.len() < 3 || username.len() > 32 {
            return Err("Username must be between 3 and 32 characters".to_string());
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err("Username may only contain letters, digits and underscores".to_string());
        }
        if !is_plausible_email(&email) {
            return Err("Invalid email address".to_string());
        }
        if self.password.chars().count() < 8 {
            return Err("Password must be at least 8 characters".to_string());
        }

        Ok(Self {
            username,
            email,
            password: self.password,
            full_name,
            university,
        })
    }
}

impl UpdateProfileRequest {
    /// Absent fields stay as they are; an empty string clears the field
    pub fn normalized(self) -> Result<Self, String> {
        let full_name = trim_field(self.full_name, "Full name")?;
        let bio = trim_field(self.bio, "Bio")?;
        if bio.as_ref().map_or(false, |b| b.chars().count() > 500) {
            return Err("Bio must be at most 500 characters".to_string());
        }
        let avatar_url = trim_field(self.avatar_url, "Avatar URL")?;
        if let Some(url) = avatar_url.as_deref().filter(|u| !u.is_empty()) {
            if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/')) {
                return Err("Avatar URL must be an http(s) URL or an absolute path".to_string());
            }
        }
        Ok(Self {
            full_name,
            bio,
            avatar_url,
            university: trim_field(self.university, "University")?,
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Postgres text cannot hold U+0000
pub(crate) fn reject_nul(value: &str, field: &str) -> Result<(), String> {
    if value.contains('\0') {
        return Err(format!("{} contains invalid characters", field));
    }
    Ok(())
}

/// Trimmed and NUL-checked; empty strings are kept
pub(crate) fn trim_field(value: Option<String>, field: &str) -> Result<Option<String>, String> {
    match value {
        Some(v) => {
            let v = v.trim().to_string();
            reject_nul(&v, field)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

pub(crate) fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            full_name: Some("  ".to_string()),
            university: None,
        }
    }

    #[test]
    fn test_register_normalization() {
        let req = request("  jane_doe ", " Jane@Campus.EDU ", "hunter2hunter2")
            .normalized()
            .unwrap();
        assert_eq!(req.username, "jane_doe");
        assert_eq!(req.email, "jane@campus.edu");
        assert!(req.full_name.is_none());
    }

    #[test]
    fn test_register_rejects_bad_input() {
        assert!(request("ab", "a@b.co", "password1").normalized().is_err());
        assert!(request("bad name", "a@b.co", "password1").normalized().is_err());
        assert!(request("jane", "not-an-email", "password1").normalized().is_err());
        assert!(request("jane", "jane@localhost", "password1").normalized().is_err());
        assert!(request("jane", "jane@campus.edu", "short").normalized().is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let now = chrono::Utc::now().naive_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: "jane".into(),
            email: "jane@campus.edu".into(),
            password_hash: "$argon2id$secret".into(),
            full_name: None,
            bio: None,
            avatar_url: None,
            university: None,
            is_admin: false,
            wallet_balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_profile_update_validation() {
        let update = UpdateProfileRequest {
            avatar_url: Some("javascript:alert(1)".into()),
            ..Default::default()
        };
        assert!(update.normalized().is_err());

        let update = UpdateProfileRequest {
            bio: Some(" CS major, selling my old books ".into()),
            ..Default::default()
        };
        assert_eq!(
            update.normalized().unwrap().bio.as_deref(),
            Some("CS major, selling my old books")
        );
    }

    #[test]
    fn test_profile_update_keeps_empty_fields_as_clears() {
        let update = UpdateProfileRequest {
            bio: Some("   ".into()),
            avatar_url: Some(String::new()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(update.bio.as_deref(), Some(""));
        assert_eq!(update.avatar_url.as_deref(), Some(""));
        assert!(update.university.is_none());
    }

    #[test]
    fn test_nul_characters_are_rejected() {
        let register = RegisterRequest {
            full_name: Some("Jane\u{0}Doe".into()),
            ..request("jane", "jane@campus.edu", "password1")
        };
        assert!(register.normalized().unwrap_err().contains("Full name"));

        let update = UpdateProfileRequest {
            bio: Some("hi\u{0}".into()),
            ..Default::default()
        };
        assert!(update.normalized().is_err());
    }
}
