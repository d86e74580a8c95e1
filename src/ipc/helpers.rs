use serde::de::DeserializeOwned;

use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::session::Role;

pub fn param_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn param_i64(req: &Request, key: &str) -> Option<i64> {
    req.params.get(key).and_then(|v| v.as_i64())
}

pub fn param_bool(req: &Request, key: &str) -> bool {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Deserializes a structured params field, mapping failures to a
/// `bad_params` response.
pub fn parse_param<T: DeserializeOwned>(
    req: &Request,
    key: &str,
) -> Result<T, serde_json::Value> {
    let Some(value) = req.params.get(key) else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("missing params.{key}"),
            None,
        ));
    };
    serde_json::from_value(value.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid params.{key}: {e}"),
            None,
        )
    })
}

/// Role gate for screens the backend also protects. Returns the refusal
/// response when the current role is not allowed.
pub fn require_role(req: &Request, current: Role, allowed: &[Role]) -> Option<serde_json::Value> {
    if allowed.contains(&current) {
        return None;
    }
    let allowed_names = allowed
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(" or ");
    Some(err(
        &req.id,
        "forbidden",
        format!("{allowed_names} role required"),
        None,
    ))
}
