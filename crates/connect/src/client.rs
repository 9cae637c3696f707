//! HTTP client for the remote ad platform API.
//!
//! Every request carries `Authorization: Bearer <access credential>` and JSON
//! content negotiation. Non-2xx responses are returned as
//! [`RemoteApiError`] with the status, the JSON body and any `Retry-After`
//! hint, so the error classifier can work from them.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

use adsync_core::campaigns::CampaignStatus;
use adsync_core::errors::{Error, RemoteApiError, Result};

use crate::ads::{
    AdPlatformApi, AnalyticsParams, ApiClientProvider, CampaignFilters, CreatedCampaign,
    RemoteAdAccount, RemoteCampaignRequest, RemotePage, RemoteStatusUpdate,
    RemoteUserAccount, ANALYTICS_COLUMNS, CAMPAIGN_PAGE_SIZE,
};
use crate::config::ConnectConfig;

/// Builds the shared `reqwest` client used by every API and token client.
pub fn build_http_client(config: &ConnectConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))
}

/// Turns a non-2xx response into a [`RemoteApiError`]; passes 2xx through.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    let payload = serde_json::from_str::<Value>(&body).ok();

    let message = payload
        .as_ref()
        .and_then(|p| p.get("message").or_else(|| p.get("error")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Ad platform API error")
                .to_string()
        });

    debug!("[AdPlatformApi] HTTP {} - {}", status.as_u16(), message);
    Err(RemoteApiError::new(status.as_u16(), message, payload)
        .with_retry_after(retry_after)
        .into())
}

/// HTTP client for the ad platform API, bound to one access credential.
#[derive(Debug, Clone)]
pub struct AdPlatformApiClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderValue,
}

impl AdPlatformApiClient {
    /// Creates a client with its own connection pool.
    pub fn new(base_url: &str, access_credential: &str) -> Result<Self> {
        let client = build_http_client(&ConnectConfig::default())?;
        Self::with_client(client, base_url, access_credential)
    }

    /// Creates a client reusing an existing connection pool.
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        access_credential: &str,
    ) -> Result<Self> {
        let mut auth_header = HeaderValue::from_str(&format!("Bearer {}", access_credential))
            .map_err(|e| Error::Unexpected(format!("Invalid access credential format: {}", e)))?;
        auth_header.set_sensitive(true);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, self.auth_header.clone());
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| Error::Unexpected(format!("Request failed: {}", e)))?;
        let response = check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::Unexpected(format!("Failed to read response: {}", e)))?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Unexpected(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl AdPlatformApi for AdPlatformApiClient {
    async fn get_user_account(&self) -> Result<RemoteUserAccount> {
        debug!("[AdPlatformApi] GET /user_account");
        self.send(self.client.get(self.url("/user_account"))).await
    }

    async fn list_ad_accounts(&self, owner_user_id: &str) -> Result<RemotePage<RemoteAdAccount>> {
        debug!("[AdPlatformApi] GET /ad_accounts");
        let page: RemotePage<RemoteAdAccount> = self
            .send(self.client.get(self.url("/ad_accounts")).query(&[
                ("owner_user_id", owner_user_id),
                ("include_shared_accounts", "true"),
            ]))
            .await?;
        info!("[AdPlatformApi] Fetched {} ad accounts", page.items.len());
        Ok(page)
    }

    async fn create_campaign(
        &self,
        ad_account_id: &str,
        request: &RemoteCampaignRequest,
    ) -> Result<CreatedCampaign> {
        let path = format!("/ad_accounts/{}/campaigns", urlencoding::encode(ad_account_id));
        debug!("[AdPlatformApi] POST {}", path);
        let created: CreatedCampaign = self
            .send(self.client.post(self.url(&path)).json(request))
            .await?;
        info!(
            "[AdPlatformApi] Created campaign {} in {}",
            created.id, ad_account_id
        );
        Ok(created)
    }

    async fn list_campaigns(
        &self,
        ad_account_id: &str,
        filters: &CampaignFilters,
    ) -> Result<RemotePage<Value>> {
        let path = format!("/ad_accounts/{}/campaigns", urlencoding::encode(ad_account_id));
        debug!("[AdPlatformApi] GET {}", path);

        let page_size = CAMPAIGN_PAGE_SIZE.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("page_size", page_size.as_str()),
            ("order", filters.order_or_default()),
            ("sort_by", filters.sort_by_or_default()),
        ];
        if let Some(status) = filters.status.as_deref() {
            query.push(("status", status));
        }

        let page: RemotePage<Value> = self
            .send(self.client.get(self.url(&path)).query(&query))
            .await?;
        info!(
            "[AdPlatformApi] Fetched {} campaigns for {}",
            page.items.len(),
            ad_account_id
        );
        Ok(page)
    }

    async fn update_campaign_status(
        &self,
        ad_account_id: &str,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<()> {
        let path = format!("/ad_accounts/{}/campaigns", urlencoding::encode(ad_account_id));
        debug!("[AdPlatformApi] PATCH {} ({})", path, campaign_id);
        let body = [RemoteStatusUpdate {
            id: campaign_id.to_string(),
            status: status.as_remote().to_string(),
        }];
        let response: Value = self
            .send(self.client.patch(self.url(&path)).json(&body))
            .await?;

        // Batch endpoints report per-item failures inside a 200 response.
        let rejected = response
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("exceptions"))
            .find(|exceptions| exceptions.as_array().is_some_and(|e| !e.is_empty()));
        if let Some(exceptions) = rejected {
            return Err(RemoteApiError::new(
                400,
                format!("Status update rejected for campaign {}", campaign_id),
                Some(json!({ "exceptions": exceptions })),
            )
            .into());
        }
        Ok(())
    }

    async fn get_analytics(&self, ad_account_id: &str, params: &AnalyticsParams) -> Result<Value> {
        let path = format!("/ad_accounts/{}/analytics", urlencoding::encode(ad_account_id));
        debug!("[AdPlatformApi] GET {}", path);

        let start_date = params.start_date.format("%Y-%m-%d").to_string();
        let end_date = params.end_date.format("%Y-%m-%d").to_string();
        let columns = ANALYTICS_COLUMNS.join(",");
        let click_window = params.click_window_or_default().to_string();

        self.send(self.client.get(self.url(&path)).query(&[
            ("start_date", start_date.as_str()),
            ("end_date", end_date.as_str()),
            ("columns", columns.as_str()),
            ("level", params.level_or_default()),
            ("click_window_days", click_window.as_str()),
        ]))
        .await
    }
}

/// Hands out API clients that share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClientProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClientProvider {
    pub fn new(config: &ConnectConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.api_base_url.clone(),
        })
    }
}

impl ApiClientProvider for HttpClientProvider {
    fn for_credential(&self, access_credential: &str) -> Result<Arc<dyn AdPlatformApi>> {
        Ok(Arc::new(AdPlatformApiClient::with_client(
            self.client.clone(),
            &self.base_url,
            access_credential,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AdPlatformApiClient {
        AdPlatformApiClient::new(&server.uri(), "test-token").unwrap()
    }

    #[test]
    fn test_client_url_normalization() {
        let client = AdPlatformApiClient::new("https://api.example.com/v5/", "test-token").unwrap();
        assert_eq!(client.base_url, "https://api.example.com/v5");
    }

    #[test]
    fn test_debug_output_hides_credential() {
        let client = AdPlatformApiClient::new("https://api.example.com", "secret-token").unwrap();
        assert!(!format!("{:?}", client).contains("secret-token"));
    }

    #[tokio::test]
    async fn test_user_account_sends_bearer_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user_account"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "remote-1", "username": "shop" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let account = client_for(&server).get_user_account().await.unwrap();
        assert_eq!(account.remote_id(), "remote-1");
        assert_eq!(account.username, "shop");
    }

    #[tokio::test]
    async fn test_list_campaigns_uses_default_paging_and_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ad_accounts/act_1/campaigns"))
            .and(query_param("page_size", "100"))
            .and(query_param("order", "DESCENDING"))
            .and(query_param("sort_by", "CREATED_TIME"))
            .and(query_param("status", "ACTIVE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "id": "cmp_9",
                    "status": "ACTIVE",
                    "summary_stats": { "impressions": 200, "clicks": 10 }
                }],
                "bookmark": null
            })))
            .mount(&server)
            .await;

        let filters = CampaignFilters {
            status: Some("ACTIVE".to_string()),
            ..Default::default()
        };
        let page = client_for(&server)
            .list_campaigns("act_1", &filters)
            .await
            .unwrap();
        assert_eq!(
            page.items,
            vec![json!({
                "id": "cmp_9",
                "status": "ACTIVE",
                "summary_stats": { "impressions": 200, "clicks": 10 }
            })]
        );
    }

    #[tokio::test]
    async fn test_ad_account_id_is_escaped_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ad_accounts/act%2F..%2F1/campaigns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;

        let page = client_for(&server)
            .list_campaigns("act/../1", &CampaignFilters::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_keeps_status_payload_and_retry_after() {
        let server = MockServer::start().await;
        let error_body = json!({ "code": 8, "message": "Too many requests" });
        Mock::given(method("GET"))
            .and(path("/ad_accounts"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "17")
                    .set_body_json(&error_body),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .list_ad_accounts("remote-1")
            .await
            .unwrap_err();
        match err {
            Error::Remote(remote) => {
                assert_eq!(remote.status, 429);
                assert_eq!(remote.message, "Too many requests");
                assert_eq!(remote.retry_after, Some(17));
                assert_eq!(remote.payload, Some(error_body));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_falls_back_to_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user_account"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        match client_for(&server).get_user_account().await.unwrap_err() {
            Error::Remote(remote) => {
                assert_eq!(remote.status, 502);
                assert_eq!(remote.message, "Bad Gateway");
                assert!(remote.payload.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_update_patches_single_item() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/ad_accounts/act_1/campaigns"))
            .and(body_json(json!([{ "id": "cmp_9", "status": "PAUSED" }])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "data": { "id": "cmp_9", "status": "PAUSED" }, "exceptions": [] }]
            })))
            .mount(&server)
            .await;

        client_for(&server)
            .update_campaign_status("act_1", "cmp_9", CampaignStatus::Paused)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_update_surfaces_item_exceptions() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/ad_accounts/act_1/campaigns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "exceptions": [{ "code": 2, "message": "archived" }] }]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .update_campaign_status("act_1", "cmp_9", CampaignStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote(ref remote) if remote.status == 400));
    }

    #[tokio::test]
    async fn test_analytics_sends_fixed_columns_and_defaults() {
        let server = MockServer::start().await;
        let payload = json!([{ "DATE": "2030-04-01", "SPEND_IN_DOLLAR": 4.2 }]);
        Mock::given(method("GET"))
            .and(path("/ad_accounts/act_1/analytics"))
            .and(query_param("start_date", "2030-04-01"))
            .and(query_param("end_date", "2030-04-30"))
            .and(query_param(
                "columns",
                "SPEND,IMPRESSION,CLICK,CTR,ENGAGEMENT,ENGAGEMENT_RATE,CONVERSION,COST_PER_CONVERSION",
            ))
            .and(query_param("level", "CAMPAIGN"))
            .and(query_param("click_window_days", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
            .mount(&server)
            .await;

        let params = AnalyticsParams {
            start_date: NaiveDate::from_ymd_opt(2030, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2030, 4, 30).unwrap(),
            level: None,
            click_window_days: None,
        };
        let result = client_for(&server)
            .get_analytics("act_1", &params)
            .await
            .unwrap();
        assert_eq!(result, payload);
    }
}
