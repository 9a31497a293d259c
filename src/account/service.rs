use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::models::{Account, AccountUpdate};
use super::repository::AccountStore;
use super::types::{
    ChangeDataResponse, ChangePasswordRequest, DashboardResponse, LoginRequest, LoginResponse,
    LoginUser, MessageResponse, ProfileChanges, ProfileEdit, ProfileUser, RegisterRequest,
    RegisterResponse, RegisteredUser, UploadedImage,
};
use crate::auth::TokenIssuer;
use crate::blob::BlobStore;
use crate::identity::IdentityProvider;
use crate::shared::{AppError, AppState};

// Matches the cost the existing password hashes were created with
const BCRYPT_COST: u32 = 10;

const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];

/// Service for handling account business logic
pub struct AccountService {
    accounts: Arc<dyn AccountStore + Send + Sync>,
    identity: Arc<dyn IdentityProvider>,
    blobs: Arc<dyn BlobStore>,
    tokens: TokenIssuer,
    default_profile_picture: String,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountStore + Send + Sync>,
        identity: Arc<dyn IdentityProvider>,
        blobs: Arc<dyn BlobStore>,
        tokens: TokenIssuer,
        default_profile_picture: String,
    ) -> Self {
        Self {
            accounts,
            identity,
            blobs,
            tokens,
            default_profile_picture,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.accounts),
            Arc::clone(&state.identity),
            Arc::clone(&state.blobs),
            state.tokens.clone(),
            state.default_profile_picture.clone(),
        )
    }

    /// Registers a new account: identity record first, then the stored
    /// document. If the document write fails the identity record is deleted
    /// again so no half-registered account remains.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AppError> {
        if request.name.is_empty() || request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "Registration form is incomplete".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(&request.password, BCRYPT_COST)
            .map_err(|e| AppError::Dependency(format!("password hashing failed: {e}")))?;

        let id = self
            .identity
            .create_user(&request.email, &request.password)
            .await?;

        let account = Account::new(
            id.clone(),
            request.name,
            request.email,
            password_hash,
            self.default_profile_picture.clone(),
        );

        if let Err(store_err) = self.accounts.create_account(&account).await {
            // Compensate so the identity provider does not keep a record the
            // store never saw
            warn!(id = %id, error = %store_err, "Account store write failed, deleting identity record");
            if let Err(cleanup_err) = self.identity.delete_user(&id).await {
                warn!(id = %id, error = %cleanup_err, "Compensation failed, identity record orphaned");
            }
            return Err(store_err);
        }

        info!(id = %id, "Account registered");
        Ok(RegisterResponse {
            message: "Registration successful".to_string(),
            user: RegisteredUser {
                id: account.id,
                name: account.name,
                email: account.email,
                profile_picture: account.profile_picture,
            },
        })
    }

    /// Verifies credentials and issues a fresh access token. Bumping the
    /// token version first means any previously issued token stops working
    /// the moment this one is created.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        if request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation("Login form is incomplete".to_string()));
        }

        let account = self
            .accounts
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("Email or password incorrect".to_string()))?;

        let password_match = bcrypt::verify(&request.password, &account.password_hash)
            .map_err(|e| AppError::Dependency(format!("password verification failed: {e}")))?;
        if !password_match {
            return Err(AppError::Authentication(
                "Email or password incorrect".to_string(),
            ));
        }

        let version = self.accounts.bump_token_version(&account.id).await?;
        let token = self
            .tokens
            .issue(account.id.clone(), account.email.clone(), version)?;

        info!(id = %account.id, token_version = version, "Login successful");
        Ok(LoginResponse {
            message: "Login successful".to_string(),
            user: LoginUser {
                id: account.id,
                email: account.email,
                token,
            },
        })
    }

    /// Invalidates the caller's current token by bumping the version
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: &str) -> Result<MessageResponse, AppError> {
        self.accounts.bump_token_version(user_id).await?;

        info!(id = %user_id, "Logout successful");
        Ok(MessageResponse {
            message: "Logout successful".to_string(),
        })
    }

    /// Returns the profile fields for the dashboard view
    #[instrument(skip(self))]
    pub async fn dashboard(&self, user_id: &str) -> Result<DashboardResponse, AppError> {
        let account = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User data not found".to_string()))?;

        Ok(DashboardResponse {
            message: "Dashboard data retrieved successfully".to_string(),
            user: ProfileUser::from(&account),
        })
    }

    /// Replaces the account password. The old password is only checked when
    /// the client provides it. Already-issued tokens stay valid; only the
    /// credential changes.
    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: &str,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        if request.new_password.is_empty() {
            return Err(AppError::Validation(
                "New password is required".to_string(),
            ));
        }

        let account = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User data not found".to_string()))?;

        if let Some(old_password) = &request.old_password {
            let old_match = bcrypt::verify(old_password, &account.password_hash)
                .map_err(|e| AppError::Dependency(format!("password verification failed: {e}")))?;
            if !old_match {
                return Err(AppError::Authentication(
                    "Old password is incorrect".to_string(),
                ));
            }
        }

        let new_hash = bcrypt::hash(&request.new_password, BCRYPT_COST)
            .map_err(|e| AppError::Dependency(format!("password hashing failed: {e}")))?;

        // Provider first: if it rejects the change, the stored hash still
        // matches the credential that actually works
        self.identity
            .update_password(user_id, &request.new_password)
            .await?;
        self.accounts
            .update_password_hash(user_id, &new_hash)
            .await?;

        info!(id = %user_id, "Password changed");
        Ok(MessageResponse {
            message: "Password updated successfully".to_string(),
        })
    }

    /// Applies a partial profile edit. Text fields are validated and parsed,
    /// an uploaded picture is stored first, and an edit that changes nothing
    /// is rejected.
    #[instrument(skip(self, edit))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        edit: ProfileEdit,
    ) -> Result<ChangeDataResponse, AppError> {
        let mut update = AccountUpdate {
            name: non_empty(edit.name),
            email: non_empty(edit.email),
            phone: non_empty(edit.phone),
            ..Default::default()
        };

        if let Some(raw) = non_empty(edit.age) {
            let age: u32 = raw
                .parse()
                .map_err(|_| AppError::Validation("Age must be a number".to_string()))?;
            update.age = Some(age);
        }

        if let Some(raw) = non_empty(edit.gender) {
            match raw.parse::<u8>() {
                Ok(gender @ (0 | 1)) => update.gender = Some(gender),
                _ => {
                    return Err(AppError::Validation(
                        "Gender must be 0 or 1".to_string(),
                    ))
                }
            }
        }

        if let Some(image) = edit.picture {
            let url = self.upload_profile_picture(image).await?;
            update.profile_picture = Some(url);
        }

        if update.is_empty() {
            return Err(AppError::Validation("No changes submitted".to_string()));
        }

        self.accounts.update_fields(user_id, &update).await?;

        // The identity provider owns the email credential, so an email edit
        // has to reach it too
        if let Some(new_email) = &update.email {
            self.identity.update_email(user_id, new_email).await?;
        }

        info!(id = %user_id, "Profile data updated");
        Ok(ChangeDataResponse {
            message: "Data updated successfully".to_string(),
            updated_data: ProfileChanges::from(&update),
        })
    }

    async fn upload_profile_picture(&self, image: UploadedImage) -> Result<String, AppError> {
        if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
            return Err(AppError::Validation(
                "Only JPEG or PNG images are allowed".to_string(),
            ));
        }

        let extension = Path::new(&image.file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let path = format!("userProfile/{}{}", Uuid::new_v4(), extension);

        self.blobs
            .put(&path, image.bytes, &image.content_type)
            .await
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
