//! Public category tree.

use crate::envelope::Envelope;
use crate::services::Api;
use crate::types::Category;

#[derive(Clone)]
pub struct CategoryService {
    api: Api,
}

impl CategoryService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Every category with its subcategories. Public endpoint.
    pub async fn categories(&self) -> Envelope<Vec<Category>> {
        let result = async {
            let req = self.api.client().build_categories();
            let resp = self.api.send(req).await?;
            self.api.client().parse_categories(resp)
        }
        .await;
        Envelope::from_result(result, "Categories retrieved successfully")
    }
}
