//! Distance search over providers.

use crate::envelope::Envelope;
use crate::services::Api;
use crate::types::{GeoSearchParams, Provider};

/// Radius search around a point plus the saved radius preference.
#[derive(Clone)]
pub struct GeoSearchService {
    api: Api,
}

impl GeoSearchService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    pub async fn search(&self, params: &GeoSearchParams) -> Envelope<Vec<Provider>> {
        let result = async {
            let req = self.api.client().build_geo_search(params)?;
            let resp = self.api.send(req).await?;
            self.api.client().parse_geo_search(resp)
        }
        .await;
        match result {
            Ok(list) => {
                tracing::debug!(count = list.len(), range_km = params.range_km, "geo search done");
                let message = format!("{} providers found within {} km", list.len(), params.range_km);
                Envelope::ok(list, message)
            }
            Err(err) => Envelope::from_result(Err(err), ""),
        }
    }

    pub fn saved_search_radius(&self) -> u32 {
        self.api.session().search_radius()
    }

    /// Store `km` if it lies in `1..=100`; returns whether it was stored.
    pub fn save_search_radius(&self, km: u32) -> bool {
        self.api
            .session()
            .set_search_radius(km)
            .unwrap_or_else(|e| {
                tracing::warn!(km, error = %e, "failed to save search radius");
                false
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::services::testing::api;
    use crate::types::UserLocation;

    #[tokio::test]
    async fn search_posts_params() {
        let (api, transport, _session) = api();
        transport.reply(200, "[]");
        let mut params = GeoSearchParams::around(
            UserLocation {
                latitude: 10.5,
                longitude: -85.4,
            },
            25.0,
        );
        params.subcategories_id = Some(vec![3]);

        let env = GeoSearchService::new(api).search(&params).await;

        assert!(env.success);
        assert!(env.data.unwrap().is_empty());
        let req = &transport.requests.lock()[0];
        assert_eq!(req.method, HttpMethod::Post);
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["range_km"], 25.0);
        assert_eq!(body["lat"], 10.5);
        assert_eq!(body["subcategories_id"], serde_json::json!([3]));
        assert!(body.get("experience_years").is_none());
    }

    #[tokio::test]
    async fn null_body_is_empty_result() {
        let (api, transport, _session) = api();
        transport.reply(200, "null");
        let params = GeoSearchParams::around(
            UserLocation {
                latitude: 0.0,
                longitude: 0.0,
            },
            5.0,
        );
        let env = GeoSearchService::new(api).search(&params).await;
        assert!(env.success);
        assert_eq!(env.data.unwrap().len(), 0);
    }

    #[test]
    fn radius_preference() {
        let (api, _transport, _session) = api();
        let service = GeoSearchService::new(api);
        assert_eq!(service.saved_search_radius(), 30);
        assert!(service.save_search_radius(80));
        assert!(!service.save_search_radius(150));
        assert_eq!(service.saved_search_radius(), 80);
    }
}
