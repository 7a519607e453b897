use crate::model::ids::UserId;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl AuthUser {
    #[must_use]
    pub fn new(uid: UserId) -> Self {
        Self {
            uid,
            display_name: None,
            email: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Name shown in the header and stored with results: the display name,
    /// falling back to the email. Empty strings count as missing.
    #[must_use]
    pub fn display_label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.email.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Role stored on a user's profile document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserRole {
    Admin,
    #[default]
    Member,
}

impl UserRole {
    /// Only the exact tag `admin` grants admin access.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag == "admin" {
            Self::Admin
        } else {
            Self::Member
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}
