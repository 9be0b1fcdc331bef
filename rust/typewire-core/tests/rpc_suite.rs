//! Procedure registration and JSON-RPC dispatch.

use serde_json::{json, Value as Json};
use typewire_core::metadata::MetadataProvider;
use typewire_core::rpc::{AsyncFnProcedure, BoxFuture, FnProcedure, Rpc, RpcError};
use typewire_core::{TypeDescriptor, Value};

struct Session {
    admin: bool,
}

fn user_params() -> TypeDescriptor {
    TypeDescriptor::record("UserParams", [("uid", TypeDescriptor::string())])
}

fn user_details() -> TypeDescriptor {
    TypeDescriptor::record(
        "UserDetails",
        [("uid", TypeDescriptor::string()), ("name", TypeDescriptor::string())],
    )
}

fn get_user(input: Value, _ctx: &Session) -> Result<Value, RpcError> {
    let uid = input
        .as_record()
        .and_then(|r| r.get("uid"))
        .cloned()
        .unwrap_or(Value::Null);
    Ok(Value::record("UserDetails", [("uid", uid), ("name", Value::string("John"))]))
}

fn admin_only(ctx: &Session) -> Result<(), RpcError> {
    if ctx.admin {
        Ok(())
    } else {
        Err(RpcError::PermissionDenied("admin required".into()))
    }
}

fn count_users(_input: Value, ctx: &Session) -> BoxFuture<'_, Result<Value, RpcError>> {
    Box::pin(async move {
        tokio::task::yield_now().await;
        Ok(Value::Int(if ctx.admin { 12 } else { 3 }))
    })
}

fn admin_checked(ctx: &Session) -> BoxFuture<'_, Result<(), RpcError>> {
    Box::pin(async move {
        tokio::task::yield_now().await;
        admin_only(ctx)
    })
}

fn rpc() -> Rpc<Session> {
    let mut rpc = Rpc::new();
    rpc.register(FnProcedure::new("GetUser", user_params(), user_details(), get_user))
        .unwrap()
        .register(
            FnProcedure::new("DeleteUser", user_params(), TypeDescriptor::bool(), |_input, _ctx: &Session| {
                Ok(Value::Bool(true))
            })
            .with_permission(admin_only),
        )
        .unwrap();
    rpc
}

/// Blocking and async procedures side by side.
fn mixed_rpc() -> Rpc<Session> {
    let mut rpc = rpc();
    rpc.register_async(AsyncFnProcedure::new(
        "CountUsers",
        TypeDescriptor::none(),
        TypeDescriptor::int(),
        count_users,
    ))
    .unwrap()
    .register_async(
        AsyncFnProcedure::new("PurgeUsers", TypeDescriptor::none(), TypeDescriptor::int(), count_users)
            .with_async_permission(admin_checked),
    )
    .unwrap();
    rpc
}

async fn call_async(rpc: &Rpc<Session>, request: Json, admin: bool) -> Result<Json, RpcError> {
    let raw = serde_json::to_vec(&request).unwrap();
    let out = rpc.call_async(&raw, &Session { admin }).await?;
    Ok(serde_json::from_slice(&out).unwrap())
}

fn call(rpc: &Rpc<Session>, request: Json, admin: bool) -> Result<Json, RpcError> {
    let raw = serde_json::to_vec(&request).unwrap();
    let out = rpc.call(&raw, &Session { admin })?;
    Ok(serde_json::from_slice(&out).unwrap())
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn rpc_duplicate_registration_is_rejected() {
    let mut rpc = rpc();
    let err = rpc
        .register(FnProcedure::new("GetUser", user_params(), user_details(), get_user))
        .err()
        .expect("duplicate must fail");
    assert!(matches!(err, RpcError::DuplicateProcedure(ref name) if name == "GetUser"));
    assert_eq!(rpc.len(), 2);
}

#[test]
fn rpc_metadata_follows_registration_order() {
    let names: Vec<String> = rpc().procedures().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["GetUser", "DeleteUser"]);
    assert_eq!(rpc().procedures()[0].output, user_details());
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn rpc_success_envelope() {
    let out = call(&rpc(), json!({"id": 1, "method": "GetUser", "params": {"uid": "7fa8d"}}), false).unwrap();
    assert_eq!(
        out,
        json!({"jsonrpc": "2.0", "result": {"uid": "7fa8d", "name": "John"}, "id": 1})
    );
}

#[test]
fn rpc_unknown_method() {
    let out = call(&rpc(), json!({"id": 4, "method": "missing", "params": {}}), false).unwrap();
    assert_eq!(
        out,
        json!({"jsonrpc": "2.0", "error": {"code": -32601, "message": "Method not found"}, "id": 4})
    );
}

#[test]
fn rpc_params_validation_error() {
    let out = call(&rpc(), json!({"id": 1, "method": "GetUser", "params": {}}), false).unwrap();
    assert_eq!(out["id"], json!(1));
    assert_eq!(out["error"]["code"], json!(-32600));
    assert_eq!(out["error"]["message"], json!("Validation error"));
    assert_eq!(out["error"]["details"][0]["loc"], json!(["params", "uid"]));
    assert_eq!(out["error"]["details"][0]["type"], json!("missing"));
}

#[test]
fn rpc_invalid_envelope_has_null_id() {
    let out = call(&rpc(), json!({}), false).unwrap();
    assert_eq!(out["id"], Json::Null);
    assert_eq!(out["error"]["code"], json!(-32600));

    let raw = rpc().call(b"not json", &Session { admin: false }).unwrap();
    let out: Json = serde_json::from_slice(&raw).unwrap();
    assert_eq!(out["error"]["code"], json!(-32600));
}

#[test]
fn rpc_permission_errors_propagate_by_default() {
    let err = call(&rpc(), json!({"id": 2, "method": "DeleteUser", "params": {"uid": "x"}}), false).unwrap_err();
    assert!(matches!(err, RpcError::PermissionDenied(_)));

    let out = call(&rpc(), json!({"id": 2, "method": "DeleteUser", "params": {"uid": "x"}}), true).unwrap();
    assert_eq!(out["result"], json!(true));
}

#[test]
fn rpc_custom_error_mapper() {
    fn mapper(err: &RpcError, _ctx: &Session) -> Option<Json> {
        Some(json!({"code": -32000, "message": err.to_string()}))
    }
    let rpc = rpc().with_error_mapper(mapper);
    let out = call(&rpc, json!({"id": 9, "method": "DeleteUser", "params": {"uid": "x"}}), false).unwrap();
    assert_eq!(out["error"]["code"], json!(-32000));
    assert_eq!(out["error"]["message"], json!("permission denied: admin required"));
    assert_eq!(out["id"], json!(9));
}

// =============================================================================
// Async dispatch
// =============================================================================

#[tokio::test]
async fn rpc_async_dispatch_runs_both_kinds() {
    let rpc = mixed_rpc();
    let out = call_async(&rpc, json!({"id": 5, "method": "CountUsers", "params": null}), false)
        .await
        .unwrap();
    assert_eq!(out, json!({"jsonrpc": "2.0", "result": 3, "id": 5}));

    let out = call_async(&rpc, json!({"id": 6, "method": "GetUser", "params": {"uid": "a1"}}), false)
        .await
        .unwrap();
    assert_eq!(out["result"], json!({"uid": "a1", "name": "John"}));

    let out = call_async(&rpc, json!({"id": 7, "method": "missing", "params": {}}), false)
        .await
        .unwrap();
    assert_eq!(out["error"]["code"], json!(-32601));
}

#[tokio::test]
async fn rpc_async_permissions_are_awaited() {
    let rpc = mixed_rpc();
    let err = call_async(&rpc, json!({"id": 1, "method": "PurgeUsers", "params": null}), false)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::PermissionDenied(_)));

    let out = call_async(&rpc, json!({"id": 1, "method": "PurgeUsers", "params": null}), true)
        .await
        .unwrap();
    assert_eq!(out["result"], json!(12));
}

#[tokio::test]
async fn rpc_async_validation_uses_the_error_mapper() {
    let out = call_async(&mixed_rpc(), json!({"id": 3, "method": "GetUser", "params": {}}), false)
        .await
        .unwrap();
    assert_eq!(out["error"]["code"], json!(-32600));
    assert_eq!(out["id"], json!(3));

    let raw = mixed_rpc().call_async(b"{", &Session { admin: false }).await.unwrap();
    let out: Json = serde_json::from_slice(&raw).unwrap();
    assert_eq!(out["id"], Json::Null);
}

#[test]
fn rpc_blocking_call_refuses_async_procedures() {
    let rpc = mixed_rpc();
    let err = call(&rpc, json!({"id": 1, "method": "CountUsers", "params": null}), false).unwrap_err();
    assert!(matches!(err, RpcError::AsyncOnly(ref name) if name == "CountUsers"));
    assert!(rpc.get("CountUsers").is_none());
    assert!(rpc.get_async("CountUsers").is_some());
}

#[test]
fn rpc_async_registration_shares_names_and_metadata() {
    let mut rpc = mixed_rpc();
    let err = rpc
        .register_async(AsyncFnProcedure::new(
            "GetUser",
            TypeDescriptor::none(),
            TypeDescriptor::int(),
            count_users,
        ))
        .err()
        .expect("duplicate must fail");
    assert!(matches!(err, RpcError::DuplicateProcedure(_)));

    let names: Vec<String> = rpc.procedures().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["GetUser", "DeleteUser", "CountUsers", "PurgeUsers"]);
}
