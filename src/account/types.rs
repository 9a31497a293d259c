use serde::{Deserialize, Serialize};

use super::models::{Account, AccountUpdate};

// Field names follow the wire contract the mobile clients already speak:
// `no_hp` for phone, `passwordLama`/`passwordBaru` for the password pair and
// `pictureProfile` for the upload field.

/// Registration request body. Fields default to empty so a missing key is
/// reported as an incomplete form rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Password change request body. The old password is verified only when the
/// client sends it.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "passwordLama")]
    pub old_password: Option<String>,
    #[serde(rename = "passwordBaru", default)]
    pub new_password: String,
}

/// Raw profile-edit fields as they arrive from the multipart form, before
/// validation and parsing
#[derive(Debug, Default)]
pub struct ProfileEdit {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub picture: Option<UploadedImage>,
}

/// An image file lifted out of the multipart request
#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Response for successful registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisteredUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
}

/// Response for successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Response for the profile dashboard
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub message: String,
    pub user: ProfileUser,
}

/// Profile fields exposed to the client. Optional fields render as null
/// until the user fills them in.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileUser {
    pub name: String,
    pub email: String,
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
    pub no_hp: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<u8>,
}

impl From<&Account> for ProfileUser {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            email: account.email.clone(),
            profile_picture: account.profile_picture.clone(),
            no_hp: account.phone.clone(),
            age: account.age,
            gender: account.gender,
        }
    }
}

/// Plain acknowledgement response used by logout and password change
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response for a profile-data update, echoing exactly the fields that
/// changed
#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeDataResponse {
    pub message: String,
    #[serde(rename = "updatedData")]
    pub updated_data: ProfileChanges,
}

/// The changed fields; untouched keys are omitted from the JSON entirely
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_hp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<u8>,
    #[serde(rename = "profilePicture", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl From<&AccountUpdate> for ProfileChanges {
    fn from(update: &AccountUpdate) -> Self {
        Self {
            name: update.name.clone(),
            email: update.email.clone(),
            no_hp: update.phone.clone(),
            age: update.age,
            gender: update.gender,
            profile_picture: update.profile_picture.clone(),
        }
    }
}
