use std::net::IpAddr;

use gblock_common::GblockError;
use gblock_core::global_blocks::RequestError;
use gblock_core::identity::Actor;
use gblock_core::resolution::{parse_forwarded_for, BlockStatus, RequestBlockCache};
use gblock_core::Services;
use poem::web::Data;
use poem_openapi::param::{Header, Query};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Enum, Object, OpenApi};

use super::errors::ErrorList;
use super::models::{BlockInfo, ExemptionInfo, TargetKind};

pub struct Api;

#[derive(Enum, Debug, PartialEq, Eq)]
#[oai(rename_all = "snake_case")]
enum StatusKind {
    NotBlocked,
    Blocked,
    BlockedViaForwardedFor,
}

#[derive(Object)]
struct BlockStatusResult {
    status: StatusKind,
    target_kind: Option<TargetKind>,
    /// The forwarded-for entry that matched
    forwarded_address: Option<String>,
    block: Option<BlockInfo>,
    message: Option<String>,
}

impl From<BlockStatus> for BlockStatusResult {
    fn from(status: BlockStatus) -> Self {
        match status {
            BlockStatus::NotBlocked => Self {
                status: StatusKind::NotBlocked,
                target_kind: None,
                forwarded_address: None,
                block: None,
                message: None,
            },
            BlockStatus::Blocked(notice) => Self {
                status: StatusKind::Blocked,
                target_kind: Some(notice.kind.into()),
                forwarded_address: None,
                block: Some(notice.block.into()),
                message: Some(notice.message),
            },
            BlockStatus::BlockedViaForwardedFor(notice) => Self {
                status: StatusKind::BlockedViaForwardedFor,
                target_kind: None,
                forwarded_address: Some(notice.address.to_string()),
                block: Some(notice.block.into()),
                message: Some(notice.message),
            },
        }
    }
}

#[derive(ApiResponse)]
enum BlockStatusResponse {
    #[oai(status = 200)]
    Ok(Json<BlockStatusResult>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorList>),
}

#[derive(Object)]
struct WhitelistStatusResult {
    exempted: bool,
    exemption: Option<ExemptionInfo>,
}

#[derive(ApiResponse)]
enum WhitelistStatusResponse {
    #[oai(status = 200)]
    Ok(Json<WhitelistStatusResult>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorList>),
}

#[OpenApi]
impl Api {
    #[oai(
        path = "/global-blocks/status",
        method = "get",
        operation_id = "get_block_status"
    )]
    async fn api_get_block_status(
        &self,
        services: Data<&Services>,
        ip: Query<String>,
        user: Query<Option<String>>,
        ip_block_exempt: Query<Option<bool>>,
        #[oai(name = "X-Forwarded-For")] forwarded_for: Header<Option<String>>,
    ) -> Result<BlockStatusResponse, GblockError> {
        if ip.trim().parse::<IpAddr>().is_err() {
            return Ok(BlockStatusResponse::BadRequest(Json(ErrorList::single(
                "invalid_target",
                format!("{:?} is not a valid IP address", ip.0),
            ))));
        }

        let actor = Actor {
            ip: ip.trim().to_owned(),
            user_name: user.0.filter(|u| !u.trim().is_empty()),
            ip_block_exempt: ip_block_exempt.unwrap_or(false),
        };
        let chain = forwarded_for
            .as_deref()
            .map(parse_forwarded_for)
            .unwrap_or_default();

        let cache = RequestBlockCache::new();
        let status = services
            .resolver
            .resolve_actor(&actor, &chain, &cache)
            .await?;

        Ok(BlockStatusResponse::Ok(Json(status.into())))
    }

    #[oai(
        path = "/global-blocks/whitelist",
        method = "get",
        operation_id = "get_whitelist_status"
    )]
    async fn api_get_whitelist_status(
        &self,
        services: Data<&Services>,
        target: Query<String>,
    ) -> Result<WhitelistStatusResponse, GblockError> {
        match services.global_blocks.whitelist_status(&target).await {
            Ok(exemption) => Ok(WhitelistStatusResponse::Ok(Json(WhitelistStatusResult {
                exempted: exemption.is_some(),
                exemption: exemption.map(Into::into),
            }))),
            Err(RequestError::Internal(error)) => Err(error),
            Err(error) => Ok(WhitelistStatusResponse::BadRequest(Json((&error).into()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use poem::http::StatusCode;
    use poem::test::TestClient;
    use serde_json::json;

    use crate::test_helpers::test_app;

    async fn block(cli: &TestClient<impl poem::Endpoint>, target: &str, anon_only: bool) {
        cli.post("/api/global-blocks")
            .header("X-Performer", "Steward")
            .body_json(&json!({
                "target": target,
                "expiry": "infinite",
                "reason": "abuse",
                "anon_only": anon_only,
            }))
            .send()
            .await
            .assert_status_is_ok();
    }

    #[tokio::test]
    async fn test_not_blocked() {
        let cli = TestClient::new(test_app().await);
        let resp = cli
            .get("/api/global-blocks/status")
            .query("ip", &"192.0.2.1")
            .send()
            .await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        let status = json.value().object();
        status.get("status").assert_string("not_blocked");
        status.get("block").assert_null();
    }

    #[tokio::test]
    async fn test_most_specific_block_is_reported() {
        let cli = TestClient::new(test_app().await);
        block(&cli, "203.0.113.0/24", false).await;
        block(&cli, "203.0.113.5/32", false).await;

        let resp = cli
            .get("/api/global-blocks/status")
            .query("ip", &"203.0.113.5")
            .send()
            .await;
        let json = resp.json().await;
        let status = json.value().object();
        status.get("status").assert_string("blocked");
        status.get("target_kind").assert_string("range");
        status
            .get("block")
            .object()
            .get("target")
            .assert_string("203.0.113.5/32");
    }

    #[tokio::test]
    async fn test_anon_only_and_account_blocks() {
        let cli = TestClient::new(test_app().await);
        block(&cli, "203.0.113.5", true).await;
        block(&cli, "Example", false).await;

        let resp = cli
            .get("/api/global-blocks/status")
            .query("ip", &"203.0.113.5")
            .query("user", &"Other user")
            .send()
            .await;
        let json = resp.json().await;
        json.value()
            .object()
            .get("status")
            .assert_string("not_blocked");

        let resp = cli
            .get("/api/global-blocks/status")
            .query("ip", &"192.0.2.1")
            .query("user", &"Example")
            .send()
            .await;
        let json = resp.json().await;
        json.value()
            .object()
            .get("target_kind")
            .assert_string("user");
    }

    #[tokio::test]
    async fn test_forwarded_for_chain() {
        let cli = TestClient::new(test_app().await);
        block(&cli, "203.0.113.5", false).await;

        let resp = cli
            .get("/api/global-blocks/status")
            .query("ip", &"192.0.2.1")
            .header("X-Forwarded-For", "198.51.100.9, 203.0.113.5")
            .send()
            .await;
        let json = resp.json().await;
        let status = json.value().object();
        status
            .get("status")
            .assert_string("blocked_via_forwarded_for");
        status
            .get("forwarded_address")
            .assert_string("203.0.113.5");
    }

    #[tokio::test]
    async fn test_invalid_ip() {
        let cli = TestClient::new(test_app().await);
        let resp = cli
            .get("/api/global-blocks/status")
            .query("ip", &"not-an-ip")
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_whitelist_status() {
        let cli = TestClient::new(test_app().await);
        block(&cli, "203.0.113.5", false).await;

        let resp = cli
            .get("/api/global-blocks/whitelist")
            .query("target", &"203.0.113.5")
            .send()
            .await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        let status = json.value().object();
        status.get("exempted").assert_bool(false);
        status.get("exemption").assert_null();

        let resp = cli
            .get("/api/global-blocks/whitelist")
            .query("target", &"bad|name")
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }
}
