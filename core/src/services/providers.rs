//! Provider lookups by category, subcategory and id.
//!
//! The search endpoint takes both ids in the path; a missing subcategory is
//! sent as `null`.

use crate::envelope::Envelope;
use crate::services::Api;
use crate::types::{Provider, ProviderFilters};

#[derive(Clone)]
pub struct ProviderService {
    api: Api,
}

impl ProviderService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Providers in a category, optionally narrowed to one subcategory.
    ///
    /// A category is required; without one the call fails locally.
    pub async fn providers(&self, filters: ProviderFilters) -> Envelope<Vec<Provider>> {
        let result = async {
            let req = self.api.client().build_providers(&filters)?;
            let resp = self.api.send(req).await?;
            self.api.client().parse_providers(resp)
        }
        .await;
        match result {
            Ok(list) => {
                let message = format!("{} providers found", list.len());
                Envelope::ok(list, message)
            }
            Err(err) => Envelope::from_result(Err(err), ""),
        }
    }

    pub async fn provider_by_id(&self, id: u64) -> Envelope<Provider> {
        let result = async {
            let req = self.api.client().build_provider(id);
            let resp = self.api.send(req).await?;
            self.api.client().parse_provider(resp)
        }
        .await;
        Envelope::from_result(result, "Provider retrieved successfully")
    }

    pub async fn by_subcategory(&self, category_id: u64, subcategory_id: u64) -> Envelope<Vec<Provider>> {
        self.providers(ProviderFilters {
            category_id: Some(category_id),
            subcategory_id: Some(subcategory_id),
        })
        .await
    }

    pub async fn by_category(&self, category_id: u64) -> Envelope<Vec<Provider>> {
        self.providers(ProviderFilters {
            category_id: Some(category_id),
            subcategory_id: None,
        })
        .await
    }
}
