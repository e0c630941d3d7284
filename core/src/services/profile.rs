//! Own profile and logout.
//!
//! # Design
//! Reads and writes refresh the cached `userInfo`, and a failed read falls
//! back to it. Logout always clears the local session, whatever the server
//! answers.

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::services::Api;
use crate::types::{ProfileUpdate, UserInfo};

/// The signed-in user's own profile and server-side logout.
#[derive(Clone)]
pub struct ProfileService {
    api: Api,
}

impl ProfileService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Fetch the profile and refresh the cached copy.
    ///
    /// When the server cannot be reached or rejects the call for a reason
    /// other than an expired session, the cached profile is returned
    /// instead, if there is one.
    pub async fn fetch_profile(&self) -> Envelope<UserInfo> {
        let result = async {
            let token = self.api.token()?;
            let req = self.api.client().build_profile(&token);
            let resp = self.api.send(req).await?;
            self.api.client().parse_profile(resp)
        }
        .await;

        match result {
            Ok(info) => {
                self.cache(&info);
                Envelope::ok(info, "Profile retrieved successfully")
            }
            Err(err) if err.status() != Some(401) => match self.api.session().user_info() {
                Some(cached) => {
                    tracing::warn!(error = %err, "profile fetch failed, using cached profile");
                    Envelope::ok(cached, "Showing saved profile")
                }
                None => Envelope::from_result(Err(err), ""),
            },
            Err(err) => Envelope::from_result(Err(err), ""),
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Envelope<UserInfo> {
        let result = async {
            let token = self.api.token()?;
            let req = self.api.client().build_update_profile(&token, update)?;
            let resp = self.api.send(req).await?;
            self.api.client().parse_profile(resp)
        }
        .await;
        if let Ok(info) = &result {
            self.cache(info);
        }
        Envelope::from_result(result, "Profile updated successfully")
    }

    /// Tell the server to revoke the token, then clear the local session
    /// whatever the server answered.
    pub async fn logout_remote(&self) -> Envelope<()> {
        let result = async {
            let token = self.api.token()?;
            let req = self.api.client().build_logout(&token);
            let resp = self.api.send(req).await?;
            self.api.client().parse_logout(resp)
        }
        .await;
        match &result {
            // send() already signed out on the 401
            Err(ApiError::Unauthorized) => {}
            Err(err) => {
                tracing::warn!(error = %err, "remote logout failed, clearing local session anyway");
                self.api.session().sign_out();
            }
            Ok(()) => self.api.session().sign_out(),
        }
        Envelope::ok((), "Logged out successfully")
    }

    fn cache(&self, info: &UserInfo) {
        if let Err(e) = self.api.session().set_user_info(info) {
            tracing::warn!(error = %e, "failed to cache user profile");
        }
    }
}
