// # RU-CENTER DNS-master Registrar
//
// Registrar client for the RU-CENTER (nic.ru) DNS-master API.
//
// ## Session
//
// A client is created by `RuCenterClient::authenticate`, which exchanges the
// application credentials and account login for an OAuth bearer token. The
// token lives as long as the client; one hook invocation uses one client.
//
// ## Two-phase writes
//
// Record writes (add, delete) are staged on the registrar side and become
// visible in DNS only after `commit` for that zone. Record listings return
// committed records only.
//
// ## Security Requirements
//
// - App secret, password and bearer token NEVER appear in logs or errors
// - Debug output redacts all of them
//
// ## API Reference
//
// - Token: POST `/oauth/token` (HTTP Basic app credentials, form body)
// - List zones: GET `/dns-master/zones`
// - Add record: PUT `/dns-master/services/:service/zones/:zone/records`
// - List records: GET `/dns-master/services/:service/zones/:zone/records`
// - Delete record: DELETE `/dns-master/services/:service/zones/:zone/records/:id`
// - Commit: POST `/dns-master/services/:service/zones/:zone/commit`

pub mod xml;

use async_trait::async_trait;
use dns01_core::config::RegistrarConfig;
use dns01_core::traits::Registrar;
use dns01_core::{Error, Result, TxtRecord, Zone};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

/// OAuth scope requested for the session
const TOKEN_SCOPE: &str = "(GET|PUT|POST|DELETE):/dns-master/.+";

/// Name reported by `Registrar::registrar_name`
const REGISTRAR_NAME: &str = "rucenter";

/// Token endpoint response; only the access token matters
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Authenticated RU-CENTER API session
pub struct RuCenterClient {
    /// HTTP client with the configured timeout
    client: reqwest::Client,

    /// API base URL without trailing slash
    api_base: String,

    /// OAuth bearer token
    /// ⚠️ NEVER log this value
    token: String,
}

// Custom Debug implementation that hides the bearer token
impl std::fmt::Debug for RuCenterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuCenterClient")
            .field("api_base", &self.api_base)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl RuCenterClient {
    /// Open a session with the credentials in `config`
    ///
    /// # Errors
    ///
    /// - `Error::Config`: invalid configuration or HTTP client setup failure
    /// - `Error::Authentication`: token request failed or returned no token
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /oauth/token
    /// Authorization: Basic base64(app_id:app_secret)
    /// Content-Type: application/x-www-form-urlencoded
    ///
    /// grant_type=password&username=...&password=...&scope=...
    /// ```
    pub async fn authenticate(config: &RegistrarConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let api_base = config.api_base.trim_end_matches('/').to_string();
        let token = Self::request_token(&client, &api_base, config).await?;

        tracing::debug!("Authenticated against {}", api_base);

        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    async fn request_token(
        client: &reqwest::Client,
        api_base: &str,
        config: &RegistrarConfig,
    ) -> Result<String> {
        let response = client
            .post(format!("{}/oauth/token", api_base))
            .basic_auth(&config.app_id, Some(&config.app_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", config.user.as_str()),
                ("password", config.password.as_str()),
                ("scope", TOKEN_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| Error::auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                400 | 401 | 403 => Error::auth(format!(
                    "credentials rejected. Status: {}",
                    status
                )),
                _ => Error::auth(format!("token request failed. Status: {}", status)),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("Failed to parse token response: {}", e)))?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::auth("token response has no access_token")),
        }
    }

    fn zone_url(&self, zone: &Zone, suffix: &str) -> String {
        format!(
            "{}/dns-master/services/{}/zones/{}{}",
            self.api_base, zone.service, zone.name, suffix
        )
    }

    /// Send an authorized request and return the body of a 2xx response
    ///
    /// Failures are reported as the cause only; callers attach the
    /// operation context.
    async fn send(&self, request: RequestBuilder) -> std::result::Result<String, String> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        if status.is_success() {
            Ok(body)
        } else {
            Err(status_message(status, &body))
        }
    }

    /// Send a zone-scoped request; failures become `Error::Registrar`
    async fn send_for_zone(
        &self,
        request: RequestBuilder,
        zone: &Zone,
        operation: &str,
    ) -> Result<String> {
        self.send(request)
            .await
            .map_err(|message| Error::registrar(zone.to_string(), operation, message))
    }
}

/// Describe a non-2xx response
fn status_message(status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: token rejected or insufficient scope. Status: {}",
            status
        ),
        404 => format!("Not found. Status: {}", status),
        429 => format!("Rate limit exceeded. Status: {}", status),
        500..=599 => format!("RU-CENTER server error: {} - {}", status, body.trim()),
        _ => format!("Request failed: {} - {}", status, body.trim()),
    }
}

#[async_trait]
impl Registrar for RuCenterClient {
    /// ```http
    /// GET /dns-master/zones
    /// ```
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let url = format!("{}/dns-master/zones", self.api_base);
        let body = self
            .send(self.client.get(&url))
            .await
            .map_err(Error::zone_discovery)?;

        let zones = xml::parse_zones(body.as_bytes()).map_err(Error::zone_discovery)?;
        tracing::debug!("Registrar lists {} primary zone(s)", zones.len());
        Ok(zones)
    }

    /// ```http
    /// PUT /dns-master/services/:service/zones/:zone/records
    /// Content-Type: text/xml
    /// ```
    async fn add_txt_record(&self, zone: &Zone, fqdn: &str, value: &str) -> Result<String> {
        let operation = "add record";
        let payload = xml::txt_record_request(fqdn, value)
            .map_err(|e| Error::registrar(zone.to_string(), operation, e))?;

        let request = self
            .client
            .put(self.zone_url(zone, "/records"))
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(payload);
        let body = self.send_for_zone(request, zone, operation).await?;

        let id = xml::parse_created_id(body.as_bytes())
            .map_err(|e| Error::registrar(zone.to_string(), operation, e))?;
        tracing::debug!("Staged TXT record {} for {} in {}", id, fqdn, zone);
        Ok(id)
    }

    /// ```http
    /// GET /dns-master/services/:service/zones/:zone/records
    /// ```
    async fn list_records(&self, zone: &Zone) -> Result<Vec<TxtRecord>> {
        let operation = "list records";
        let request = self.client.get(self.zone_url(zone, "/records"));
        let body = self.send_for_zone(request, zone, operation).await?;

        xml::parse_records(body.as_bytes())
            .map_err(|e| Error::registrar(zone.to_string(), operation, e))
    }

    /// ```http
    /// DELETE /dns-master/services/:service/zones/:zone/records/:id
    /// ```
    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.zone_url(zone, &format!("/records/{}", record_id)));
        self.send_for_zone(request, zone, "delete record").await?;

        tracing::debug!("Staged deletion of record {} in {}", record_id, zone);
        Ok(())
    }

    /// ```http
    /// POST /dns-master/services/:service/zones/:zone/commit
    /// ```
    async fn commit(&self, zone: &Zone) -> Result<()> {
        let request = self.client.post(self.zone_url(zone, "/commit"));
        self.send_for_zone(request, zone, "commit changes").await?;

        tracing::debug!("Committed changes in {}", zone);
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        REGISTRAR_NAME
    }
}
