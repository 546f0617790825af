// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider API boundary: DNS zone records and the redirect ruleset.
//!
//! The core depends only on the capability set expressed by [`ZoneApi`]:
//! list records (paginated), create/update/delete one record by id, and
//! list/create/read/replace the redirect ruleset. [`HttpZoneApi`] is the
//! production implementation over the provider's HTTP API; tests substitute
//! an in-memory fake.
//!
//! Every request/response body is an explicit struct; the provider wraps all
//! responses in a success/errors envelope, which is unwrapped here so callers
//! only ever see typed results or an [`ApiError`].

use crate::constants::{RECORDS_PAGE_SIZE, REDIRECT_STATUS_CODE, RULESET_KIND, RULESET_NAME, RULESET_PHASE};
use crate::errors::ApiError;
use crate::payload::RecordPayload;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A DNS record as the provider reports it.
///
/// `id` is provider-assigned and opaque; matching against desired state uses
/// `(type, name)` only.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteRecord {
    /// Provider-assigned opaque id
    pub id: String,
    /// Record type, uppercase (A, AAAA, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Simple record content, absent for structured types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Structured data block for SRV/CAA/DS/TLSA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Whether the record is proxied through the provider's edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    /// MX preference value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    /// Record TTL; 1 means automatic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// Ruleset descriptor as returned by the ruleset listing endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RulesetSummary {
    /// Provider-assigned ruleset id
    pub id: String,
    /// Ruleset name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Execution phase
    pub phase: String,
    /// Ruleset kind
    pub kind: String,
}

/// A full ruleset, including its ordered rule list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Ruleset {
    /// Provider-assigned ruleset id
    pub id: String,
    /// Execution phase
    pub phase: String,
    /// Ruleset kind
    pub kind: String,
    /// Ordered rules; the provider omits the field when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RedirectRule>>,
}

/// One redirect rule inside the shared ruleset.
///
/// The hostname embedded in the expression is the rule's identity for this
/// system: a hostname's rules are owned and replaced as a unit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RedirectRule {
    /// Provider-assigned rule id, absent on rules built locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable rule description
    pub description: String,
    /// Hostname match predicate, e.g. `http.host eq "blog.example.com"`
    pub expression: String,
    /// Always `redirect` for rules this system manages
    pub action: String,
    /// Redirect target and semantics
    pub action_parameters: RedirectParameters,
}

impl RedirectRule {
    /// Build the redirect rule for one URL record.
    ///
    /// The expression matches the hostname exactly; the redirect is permanent
    /// and preserves the query string.
    #[must_use]
    pub fn for_hostname(hostname: &str, target: &str) -> Self {
        Self {
            id: None,
            description: format!("subzone: redirect {hostname}"),
            expression: format!("http.host eq \"{hostname}\""),
            action: "redirect".to_string(),
            action_parameters: RedirectParameters {
                from_value: RedirectTarget {
                    target_url: TargetUrl {
                        value: target.to_string(),
                    },
                    status_code: REDIRECT_STATUS_CODE,
                    preserve_query_string: true,
                },
            },
        }
    }

    /// Whether this rule belongs to the given hostname scope.
    ///
    /// This is a textual test on the expression, not a structural parse: a
    /// rule is owned if its expression quotes the hostname itself or any
    /// child label of it. The opening quote anchors the hostname start, so a
    /// strict-suffix collision (`go.example.com` vs `argo.example.com`)
    /// cannot mis-assign ownership.
    #[must_use]
    pub fn owned_by(&self, hostname: &str) -> bool {
        self.expression.contains(&format!("\"{hostname}\""))
            || self.expression.contains(&format!(".{hostname}\""))
    }
}

/// Parameters of a redirect action.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RedirectParameters {
    /// Static redirect definition
    pub from_value: RedirectTarget,
}

/// Target and semantics of a static redirect.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RedirectTarget {
    /// Where to send the visitor
    pub target_url: TargetUrl,
    /// HTTP status code, 301 for the rules this system writes
    pub status_code: u16,
    /// Whether the incoming query string is carried over
    pub preserve_query_string: bool,
}

/// Redirect target URL wrapper, matching the provider's body shape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TargetUrl {
    /// The target URL
    pub value: String,
}

/// Envelope every provider response is wrapped in.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

/// One error entry of a provider envelope.
#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Body for creating the redirect ruleset when none exists yet.
#[derive(Debug, Serialize)]
struct CreateRulesetRequest<'a> {
    name: &'a str,
    phase: &'a str,
    kind: &'a str,
    rules: &'a [RedirectRule],
}

/// Body for replacing a ruleset's full rule list.
#[derive(Debug, Serialize)]
struct ReplaceRulesRequest<'a> {
    rules: &'a [RedirectRule],
}

/// Result shape of a record deletion.
#[derive(Debug, Deserialize)]
struct DeletedId {
    #[allow(dead_code)]
    id: String,
}

/// The provider capability set the reconciler depends on.
///
/// Paginated listing is exposed page-by-page; [`list_all_records`] drives
/// the accumulation loop on top of it.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// Fetch one page of zone records.
    async fn list_records(&self, page: u32, per_page: u32) -> Result<Vec<RemoteRecord>, ApiError>;

    /// Create one record.
    async fn create_record(&self, payload: &RecordPayload) -> Result<(), ApiError>;

    /// Replace one record by id with the full payload.
    async fn update_record(&self, id: &str, payload: &RecordPayload) -> Result<(), ApiError>;

    /// Delete one record by id.
    async fn delete_record(&self, id: &str) -> Result<(), ApiError>;

    /// List ruleset descriptors for the zone.
    async fn list_rulesets(&self) -> Result<Vec<RulesetSummary>, ApiError>;

    /// Create the redirect ruleset with an empty rule list.
    async fn create_ruleset(&self) -> Result<Ruleset, ApiError>;

    /// Fetch one ruleset including its rules.
    async fn get_ruleset(&self, id: &str) -> Result<Ruleset, ApiError>;

    /// Replace a ruleset's full rule list in one call.
    async fn replace_ruleset_rules(
        &self,
        id: &str,
        rules: &[RedirectRule],
    ) -> Result<(), ApiError>;
}

/// HTTP implementation of [`ZoneApi`] with bearer-token authentication.
pub struct HttpZoneApi {
    client: HttpClient,
    base_url: String,
    zone_id: String,
    token: String,
}

impl HttpZoneApi {
    /// Build a client for one zone.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Provider API base, e.g. `https://api.cloudflare.com/client/v4`
    /// * `zone_id` - Provider zone id
    /// * `token` - Bearer token
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: &str, zone_id: &str, token: &str) -> anyhow::Result<Self> {
        let client = HttpClient::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            zone_id: zone_id.to_string(),
            token: token.to_string(),
        })
    }

    /// Issue one request and unwrap the provider envelope.
    ///
    /// No retries: any failure aborts the run, and re-running converges.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, ApiError> {
        let url = format!("{}/zones/{}{}", self.base_url, self.zone_id, path);
        let method_name = method_name(&method);
        debug!(method = %method_name, url = %url, "Provider API request");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ApiError::Transport {
            method: method_name,
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| ApiError::Transport {
            method: method_name,
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                method: method_name,
                url,
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode {
                method: method_name,
                url: url.clone(),
                reason: e.to_string(),
            })?;
        if !envelope.success {
            let messages = envelope
                .errors
                .iter()
                .map(|m| format!("{} ({})", m.message, m.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ApiError::Unsuccessful {
                method: method_name,
                url,
                messages,
            });
        }
        envelope.result.ok_or(ApiError::Decode {
            method: method_name,
            url,
            reason: "envelope is missing 'result'".to_string(),
        })
    }
}

#[async_trait]
impl ZoneApi for HttpZoneApi {
    async fn list_records(&self, page: u32, per_page: u32) -> Result<Vec<RemoteRecord>, ApiError> {
        self.request(
            Method::GET,
            &format!("/dns_records?page={page}&per_page={per_page}"),
            None::<&()>,
        )
        .await
    }

    async fn create_record(&self, payload: &RecordPayload) -> Result<(), ApiError> {
        let _: RemoteRecord = self
            .request(Method::POST, "/dns_records", Some(payload))
            .await?;
        Ok(())
    }

    async fn update_record(&self, id: &str, payload: &RecordPayload) -> Result<(), ApiError> {
        let _: RemoteRecord = self
            .request(Method::PUT, &format!("/dns_records/{id}"), Some(payload))
            .await?;
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> Result<(), ApiError> {
        let _: DeletedId = self
            .request(Method::DELETE, &format!("/dns_records/{id}"), None::<&()>)
            .await?;
        Ok(())
    }

    async fn list_rulesets(&self) -> Result<Vec<RulesetSummary>, ApiError> {
        self.request(Method::GET, "/rulesets", None::<&()>).await
    }

    async fn create_ruleset(&self) -> Result<Ruleset, ApiError> {
        let body = CreateRulesetRequest {
            name: RULESET_NAME,
            phase: RULESET_PHASE,
            kind: RULESET_KIND,
            rules: &[],
        };
        info!(phase = RULESET_PHASE, "Creating redirect ruleset");
        self.request(Method::POST, "/rulesets", Some(&body)).await
    }

    async fn get_ruleset(&self, id: &str) -> Result<Ruleset, ApiError> {
        self.request(Method::GET, &format!("/rulesets/{id}"), None::<&()>)
            .await
    }

    async fn replace_ruleset_rules(
        &self,
        id: &str,
        rules: &[RedirectRule],
    ) -> Result<(), ApiError> {
        let body = ReplaceRulesRequest { rules };
        let _: Ruleset = self
            .request(Method::PUT, &format!("/rulesets/{id}"), Some(&body))
            .await?;
        Ok(())
    }
}

/// Fetch the full zone record list, page by page.
///
/// The provider gives no total count up front, so pages are requested until
/// one comes back shorter than the page size.
///
/// # Errors
///
/// Propagates the first failed page request.
pub async fn list_all_records(api: &dyn ZoneApi) -> Result<Vec<RemoteRecord>, ApiError> {
    let mut all = Vec::new();
    let mut page = 1;
    loop {
        let batch = api.list_records(page, RECORDS_PAGE_SIZE).await?;
        let short_page = (batch.len() as u32) < RECORDS_PAGE_SIZE;
        all.extend(batch);
        if short_page {
            break;
        }
        page += 1;
    }
    debug!(count = all.len(), pages = page, "Fetched zone records");
    Ok(all)
}

/// Filter zone records down to one hostname scope.
///
/// A record is in scope when its name equals the hostname or is a child
/// label of it.
#[must_use]
pub fn records_for_hostname(hostname: &str, all: &[RemoteRecord]) -> Vec<RemoteRecord> {
    let child_suffix = format!(".{hostname}");
    all.iter()
        .filter(|r| r.name == hostname || r.name.ends_with(&child_suffix))
        .cloned()
        .collect()
}

/// Find the id of the shared redirect ruleset, if the zone has one.
///
/// # Errors
///
/// Propagates any provider failure.
pub async fn find_redirect_ruleset(api: &dyn ZoneApi) -> Result<Option<String>, ApiError> {
    let rulesets = api.list_rulesets().await?;
    Ok(rulesets
        .into_iter()
        .find(|r| r.phase == RULESET_PHASE && r.kind == RULESET_KIND)
        .map(|r| r.id))
}

/// Locate the shared redirect ruleset and fetch its current rules.
///
/// The ruleset is created lazily with an empty rule list if no ruleset of
/// the expected phase and kind exists yet, so URL records work on a fresh
/// zone.
///
/// # Errors
///
/// Propagates any provider failure.
pub async fn current_redirect_rules(
    api: &dyn ZoneApi,
) -> Result<(String, Vec<RedirectRule>), ApiError> {
    match find_redirect_ruleset(api).await? {
        Some(id) => {
            let ruleset = api.get_ruleset(&id).await?;
            Ok((ruleset.id, ruleset.rules.unwrap_or_default()))
        }
        None => {
            let created = api.create_ruleset().await?;
            Ok((created.id, created.rules.unwrap_or_default()))
        }
    }
}

fn method_name(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        _ => "OTHER",
    }
}

/// Keep diagnostic bodies readable in single-line error messages.
fn truncate(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
