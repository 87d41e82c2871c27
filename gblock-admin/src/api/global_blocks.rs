use std::collections::HashSet;

use gblock_common::GblockError;
use gblock_core::global_blocks::{
    BlockListQuery, GlobalBlockOutcome, GlobalBlockRequest, HiddenBlockKind, ListedBlock,
    Performer, RequestError,
};
use gblock_core::resolution::BlockDetails;
use gblock_core::Services;
use poem::web::Data;
use poem_openapi::param::{Header, Query};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use super::errors::ErrorList;
use super::models::{BlockInfo, ExemptionInfo};
use super::pagination::PaginatedResponse;

pub struct Api;

#[derive(Object)]
struct GlobalBlockRequestBody {
    /// IP address, CIDR range or user name
    target: String,
    expiry: Option<String>,
    #[oai(default)]
    unblock: bool,
    reason: String,
    #[oai(default)]
    anon_only: bool,
    #[oai(default)]
    modify: bool,
    #[oai(default)]
    also_local_block: bool,
    #[oai(default)]
    local_block_talk_edit: bool,
    #[oai(default)]
    local_anon_only: bool,
}

impl From<GlobalBlockRequestBody> for GlobalBlockRequest {
    fn from(body: GlobalBlockRequestBody) -> Self {
        Self {
            target: body.target,
            expiry: body.expiry,
            unblock: body.unblock,
            reason: body.reason,
            anon_only: body.anon_only,
            modify: body.modify,
            also_local_block: body.also_local_block,
            local_block_talk_edit: body.local_block_talk_edit,
            local_anon_only: body.local_anon_only,
        }
    }
}

#[derive(Object)]
struct GlobalBlockResult {
    target: String,
    blocked: bool,
    unblocked: bool,
    anon_only: bool,
    expiry: Option<String>,
    blocked_locally: bool,
}

impl From<GlobalBlockOutcome> for GlobalBlockResult {
    fn from(outcome: GlobalBlockOutcome) -> Self {
        match outcome {
            GlobalBlockOutcome::Blocked {
                target,
                anon_only,
                expiry,
                blocked_locally,
            } => Self {
                target,
                blocked: true,
                unblocked: false,
                anon_only,
                expiry: Some(expiry.to_string()),
                blocked_locally,
            },
            GlobalBlockOutcome::Unblocked { target } => Self {
                target,
                blocked: false,
                unblocked: true,
                anon_only: false,
                expiry: None,
                blocked_locally: false,
            },
        }
    }
}

#[derive(ApiResponse)]
enum GlobalBlockResponse {
    #[oai(status = 200)]
    Ok(Json<GlobalBlockResult>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorList>),
}

#[derive(Object)]
struct ListedGlobalBlock {
    block: BlockInfo,
    /// Set when the local site has exempted this block
    exemption: Option<ExemptionInfo>,
}

impl From<ListedBlock> for ListedGlobalBlock {
    fn from(listed: ListedBlock) -> Self {
        Self {
            block: BlockDetails::from(&listed.record).into(),
            exemption: listed.exemption.map(Into::into),
        }
    }
}

#[derive(ApiResponse)]
enum GetGlobalBlocksResponse {
    #[oai(status = 200)]
    Ok(Json<PaginatedResponse<ListedGlobalBlock>>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorList>),
}

/// Comma or pipe separated hide flags.
fn parse_hide(hide: Option<&str>) -> Result<HashSet<HiddenBlockKind>, String> {
    hide.into_iter()
        .flat_map(|h| h.split([',', '|']))
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| match h {
            "temporary" => Ok(HiddenBlockKind::Temporary),
            "indefinite" => Ok(HiddenBlockKind::Indefinite),
            "address" => Ok(HiddenBlockKind::Address),
            "range" => Ok(HiddenBlockKind::Range),
            "user" => Ok(HiddenBlockKind::User),
            other => Err(format!("unknown hide flag {other:?}")),
        })
        .collect()
}

async fn performer(services: &Services, name: &str) -> Result<Performer, GblockError> {
    let name = services
        .identity
        .canonicalize_name(name)
        .await?
        .unwrap_or_else(|| name.trim().to_owned());
    let central_id = services.identity.central_id_from_name(&name).await?;
    Ok(Performer { name, central_id })
}

#[OpenApi]
impl Api {
    #[oai(path = "/global-blocks", method = "post", operation_id = "global_block")]
    async fn api_global_block(
        &self,
        services: Data<&Services>,
        #[oai(name = "X-Performer")] performer_name: Header<String>,
        body: Json<GlobalBlockRequestBody>,
    ) -> Result<GlobalBlockResponse, GblockError> {
        if performer_name.trim().is_empty() {
            return Ok(GlobalBlockResponse::BadRequest(Json(ErrorList::single(
                "invalid_parameters",
                "X-Performer must name the acting user",
            ))));
        }
        let performer = performer(services.0, &performer_name).await?;

        match services
            .global_blocks
            .handle_request(body.0.into(), &performer)
            .await
        {
            Ok(outcome) => Ok(GlobalBlockResponse::Ok(Json(outcome.into()))),
            Err(RequestError::Internal(error)) => Err(error),
            Err(error) => Ok(GlobalBlockResponse::BadRequest(Json((&error).into()))),
        }
    }

    #[oai(path = "/global-blocks", method = "get", operation_id = "get_global_blocks")]
    async fn api_get_global_blocks(
        &self,
        services: Data<&Services>,
        target: Query<Option<String>>,
        hide: Query<Option<String>>,
        offset: Query<Option<u64>>,
        limit: Query<Option<u64>>,
    ) -> Result<GetGlobalBlocksResponse, GblockError> {
        let hide = match parse_hide(hide.as_deref()) {
            Ok(hide) => hide,
            Err(message) => {
                return Ok(GetGlobalBlocksResponse::BadRequest(Json(
                    ErrorList::single("invalid_parameters", message),
                )))
            }
        };

        let query = BlockListQuery {
            target: target.0,
            hide,
            offset: offset.unwrap_or(0),
            limit: *limit,
        };
        match services.global_blocks.list_blocks(query).await {
            Ok(page) => Ok(GetGlobalBlocksResponse::Ok(Json(
                PaginatedResponse::from_page(page, Into::into),
            ))),
            Err(RequestError::Internal(error)) => Err(error),
            Err(error) => Ok(GetGlobalBlocksResponse::BadRequest(Json((&error).into()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use poem::http::StatusCode;
    use poem::test::TestClient;
    use serde_json::json;

    use super::*;
    use crate::test_helpers::test_app;

    #[test]
    fn test_hide_flags_parse() {
        let hide = parse_hide(Some("temporary, user|range")).unwrap();
        assert_eq!(hide.len(), 3);
        assert!(hide.contains(&HiddenBlockKind::User));
        assert!(parse_hide(None).unwrap().is_empty());
        assert!(parse_hide(Some("everything")).is_err());
    }

    #[tokio::test]
    async fn test_block_echo_and_conflict() {
        let cli = TestClient::new(test_app().await);

        let resp = cli
            .post("/api/global-blocks")
            .header("X-Performer", "Steward")
            .body_json(&json!({
                "target": "203.0.113.5",
                "expiry": "infinite",
                "reason": "abuse",
            }))
            .send()
            .await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        let body = body.value().object();
        body.get("target").assert_string("203.0.113.5");
        body.get("blocked").assert_bool(true);
        body.get("expiry").assert_string("infinite");
        body.get("blocked_locally").assert_bool(false);

        let resp = cli
            .post("/api/global-blocks")
            .header("X-Performer", "Steward")
            .body_json(&json!({
                "target": "203.0.113.5",
                "expiry": "1 day",
                "reason": "abuse",
            }))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body = resp.json().await;
        let errors = body.value().object().get("errors").array();
        errors.assert_len(1);
        errors
            .get(0)
            .object()
            .get("code")
            .assert_string("already_blocked");
    }

    #[tokio::test]
    async fn test_invalid_requests_report_codes() {
        let cli = TestClient::new(test_app().await);

        for (body, code) in [
            (
                json!({"target": "10.0.0.0/8", "expiry": "infinite", "reason": "x"}),
                "range_too_broad",
            ),
            (
                json!({"target": "Nobody", "expiry": "infinite", "reason": "x"}),
                "invalid_target",
            ),
            (
                json!({"target": "203.0.113.5", "expiry": "soonish", "reason": "x"}),
                "invalid_expiry",
            ),
            (
                json!({"target": "203.0.113.5", "reason": "x"}),
                "invalid_parameters",
            ),
            (
                json!({"target": "203.0.113.5", "unblock": true, "reason": "x"}),
                "not_blocked",
            ),
        ] {
            let resp = cli
                .post("/api/global-blocks")
                .header("X-Performer", "Steward")
                .body_json(&body)
                .send()
                .await;
            resp.assert_status(StatusCode::BAD_REQUEST);
            let json = resp.json().await;
            json.value()
                .object()
                .get("errors")
                .array()
                .get(0)
                .object()
                .get("code")
                .assert_string(code);
        }
    }

    #[tokio::test]
    async fn test_reason_is_required() {
        let cli = TestClient::new(test_app().await);

        cli.post("/api/global-blocks")
            .header("X-Performer", "Steward")
            .body_json(&json!({"target": "203.0.113.5", "expiry": "infinite"}))
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let resp = cli.get("/api/global-blocks").send().await;
        resp.assert_status_is_ok();
        resp.json()
            .await
            .value()
            .object()
            .get("total")
            .assert_i64(0);
    }

    #[tokio::test]
    async fn test_listing() {
        let cli = TestClient::new(test_app().await);
        for (target, expiry) in [
            ("203.0.113.0/24", "infinite"),
            ("Example", "3 days"),
            ("198.51.100.7", "infinite"),
        ] {
            cli.post("/api/global-blocks")
                .header("X-Performer", "Steward")
                .body_json(&json!({"target": target, "expiry": expiry, "reason": "abuse"}))
                .send()
                .await
                .assert_status_is_ok();
        }

        let resp = cli.get("/api/global-blocks").send().await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        let page = json.value().object();
        page.get("total").assert_i64(3);
        let items = page.get("items").array();
        items.assert_len(3);
        items
            .get(0)
            .object()
            .get("block")
            .object()
            .get("target")
            .assert_string("198.51.100.7");
        items.get(0).object().get("exemption").assert_null();

        let resp = cli
            .get("/api/global-blocks")
            .query("hide", &"indefinite")
            .send()
            .await;
        let json = resp.json().await;
        let items = json.value().object().get("items").array();
        items.assert_len(1);
        items
            .get(0)
            .object()
            .get("block")
            .object()
            .get("target")
            .assert_string("Example");

        let resp = cli
            .get("/api/global-blocks")
            .query("target", &"203.0.113.9")
            .send()
            .await;
        let json = resp.json().await;
        json.value().object().get("total").assert_i64(1);

        let resp = cli
            .get("/api/global-blocks")
            .query("hide", &"bogus")
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }
}
