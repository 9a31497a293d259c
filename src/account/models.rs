use chrono::{DateTime, Utc};

/// Stored account record. The identifier is assigned by the identity
/// provider at registration; credentials live there as well, with only the
/// bcrypt hash kept here for login verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<u8>, // 0 or 1 when set
    pub profile_picture: String,
    pub token_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a freshly registered account. Optional profile fields start
    /// unset and no token has been issued yet.
    pub fn new(
        id: String,
        name: String,
        email: String,
        password_hash: String,
        profile_picture: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            email,
            password_hash,
            phone: None,
            age: None,
            gender: None,
            profile_picture,
            token_version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update against an account record. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<u8>,
    pub profile_picture: Option<String>,
}

impl AccountUpdate {
    /// True when no field is set, meaning there is nothing to write
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.profile_picture.is_none()
    }

    /// Applies the set fields onto an account record
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(name) = &self.name {
            account.name = name.clone();
        }
        if let Some(email) = &self.email {
            account.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            account.phone = Some(phone.clone());
        }
        if let Some(age) = self.age {
            account.age = Some(age);
        }
        if let Some(gender) = self.gender {
            account.gender = Some(gender);
        }
        if let Some(url) = &self.profile_picture {
            account.profile_picture = url.clone();
        }
    }
}
