//! Procedure registry and JSON-RPC dispatcher.
//!
//! The dispatcher is plumbing around the marshaller: it reads a
//! `{"id", "method", "params"}` envelope, runs the procedure's permission
//! hooks, converts params with the procedure's input descriptor, invokes it
//! and converts the result with the output descriptor.
//!
//! Procedures are either blocking ([`Procedure`]) or asynchronous
//! ([`AsyncProcedure`]). Both kinds share one registry; [`Rpc::call_async`]
//! dispatches to either, while [`Rpc::call`] refuses asynchronous ones.

use crate::descriptor::TypeDescriptor;
use crate::marshal::{from_primitive_under, to_primitive_under, MarshalError};
use crate::metadata::{MetadataProvider, ProcedureInfo};
use crate::values::Value;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::{debug, warn};

/// JSON-RPC code for an unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC code used for envelope and params validation failures.
pub const INVALID_REQUEST: i64 = -32600;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("non unique procedure name '{0}'")]
    DuplicateProcedure(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("validation error: {0}")]
    Validation(#[from] MarshalError),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("procedure '{procedure}' failed: {message}")]
    Failed { procedure: String, message: String },
    #[error("procedure '{0}' is asynchronous; dispatch it with call_async")]
    AsyncOnly(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A permission hook; returning an error aborts the call.
pub type Permission<C> = fn(&C) -> Result<(), RpcError>;

/// An awaited permission hook, run after the blocking ones.
pub type AsyncPermission<C> = for<'a> fn(&'a C) -> BoxFuture<'a, Result<(), RpcError>>;

/// Turns a dispatch error into a JSON-RPC error object, or `None` to let the
/// error propagate to the caller of [`Rpc::call`].
pub type ErrorMapper<C> = fn(&RpcError, &C) -> Option<serde_json::Value>;

/// A typed remote procedure.
pub trait Procedure<C>: Send + Sync {
    fn name(&self) -> &str;
    fn input(&self) -> TypeDescriptor;
    fn output(&self) -> TypeDescriptor;

    fn permissions(&self) -> &[Permission<C>] {
        &[]
    }

    fn call(&self, input: Value, context: &C) -> Result<Value, RpcError>;
}

/// A [`Procedure`] backed by a closure.
pub struct FnProcedure<C, F> {
    name: String,
    input: TypeDescriptor,
    output: TypeDescriptor,
    permissions: Vec<Permission<C>>,
    handler: F,
}

impl<C, F> FnProcedure<C, F>
where
    F: Fn(Value, &C) -> Result<Value, RpcError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, input: TypeDescriptor, output: TypeDescriptor, handler: F) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            permissions: Vec::new(),
            handler,
        }
    }

    pub fn with_permission(mut self, permission: Permission<C>) -> Self {
        self.permissions.push(permission);
        self
    }
}

impl<C, F> Procedure<C> for FnProcedure<C, F>
where
    F: Fn(Value, &C) -> Result<Value, RpcError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn input(&self) -> TypeDescriptor {
        self.input.clone()
    }

    fn output(&self) -> TypeDescriptor {
        self.output.clone()
    }

    fn permissions(&self) -> &[Permission<C>] {
        &self.permissions
    }

    fn call(&self, input: Value, context: &C) -> Result<Value, RpcError> {
        (self.handler)(input, context)
    }
}

/// A typed remote procedure whose body is awaited.
pub trait AsyncProcedure<C>: Send + Sync {
    fn name(&self) -> &str;
    fn input(&self) -> TypeDescriptor;
    fn output(&self) -> TypeDescriptor;

    fn permissions(&self) -> &[Permission<C>] {
        &[]
    }

    fn async_permissions(&self) -> &[AsyncPermission<C>] {
        &[]
    }

    fn call<'a>(&'a self, input: Value, context: &'a C) -> BoxFuture<'a, Result<Value, RpcError>>;
}

/// An [`AsyncProcedure`] backed by a function returning a boxed future.
pub struct AsyncFnProcedure<C, F> {
    name: String,
    input: TypeDescriptor,
    output: TypeDescriptor,
    permissions: Vec<Permission<C>>,
    async_permissions: Vec<AsyncPermission<C>>,
    handler: F,
}

impl<C, F> AsyncFnProcedure<C, F>
where
    F: for<'a> Fn(Value, &'a C) -> BoxFuture<'a, Result<Value, RpcError>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, input: TypeDescriptor, output: TypeDescriptor, handler: F) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            permissions: Vec::new(),
            async_permissions: Vec::new(),
            handler,
        }
    }

    pub fn with_permission(mut self, permission: Permission<C>) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn with_async_permission(mut self, permission: AsyncPermission<C>) -> Self {
        self.async_permissions.push(permission);
        self
    }
}

impl<C, F> AsyncProcedure<C> for AsyncFnProcedure<C, F>
where
    F: for<'a> Fn(Value, &'a C) -> BoxFuture<'a, Result<Value, RpcError>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn input(&self) -> TypeDescriptor {
        self.input.clone()
    }

    fn output(&self) -> TypeDescriptor {
        self.output.clone()
    }

    fn permissions(&self) -> &[Permission<C>] {
        &self.permissions
    }

    fn async_permissions(&self) -> &[AsyncPermission<C>] {
        &self.async_permissions
    }

    fn call<'a>(&'a self, input: Value, context: &'a C) -> BoxFuture<'a, Result<Value, RpcError>> {
        (self.handler)(input, context)
    }
}

#[derive(Deserialize)]
struct RpcRequest {
    id: i64,
    method: String,
    params: serde_json::Value,
}

/// Maps envelope and marshalling failures to a `-32600` validation error and
/// propagates everything else.
pub fn validation_errors<C>(err: &RpcError, _context: &C) -> Option<serde_json::Value> {
    let details = match err {
        RpcError::InvalidRequest(msg) => vec![json!({"loc": [], "msg": msg, "type": "invalid_request"})],
        RpcError::Validation(e) => vec![e.to_detail()],
        _ => return None,
    };
    Some(json!({
        "code": INVALID_REQUEST,
        "message": "Validation error",
        "details": details,
    }))
}

enum Outcome {
    Result(serde_json::Value),
    MethodNotFound,
}

enum Registered<C> {
    Blocking(Box<dyn Procedure<C>>),
    Async(Box<dyn AsyncProcedure<C>>),
}

impl<C> Registered<C> {
    fn name(&self) -> &str {
        match self {
            Registered::Blocking(p) => p.name(),
            Registered::Async(p) => p.name(),
        }
    }

    fn info(&self) -> ProcedureInfo {
        match self {
            Registered::Blocking(p) => ProcedureInfo::new(p.name(), p.input(), p.output()),
            Registered::Async(p) => ProcedureInfo::new(p.name(), p.input(), p.output()),
        }
    }
}

/// Registered procedures, in registration order.
pub struct Rpc<C> {
    procedures: Vec<Registered<C>>,
    index: HashMap<String, usize>,
    error_mapper: ErrorMapper<C>,
}

impl<C: 'static> Default for Rpc<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> Rpc<C> {
    pub fn new() -> Self {
        Self {
            procedures: Vec::new(),
            index: HashMap::new(),
            error_mapper: validation_errors::<C>,
        }
    }

    pub fn with_error_mapper(mut self, mapper: ErrorMapper<C>) -> Self {
        self.error_mapper = mapper;
        self
    }

    /// Register a procedure under its transport name.
    pub fn register(&mut self, procedure: impl Procedure<C> + 'static) -> Result<&mut Self, RpcError> {
        self.insert(Registered::Blocking(Box::new(procedure)))
    }

    /// Register an asynchronous procedure; only [`Rpc::call_async`] runs it.
    pub fn register_async(&mut self, procedure: impl AsyncProcedure<C> + 'static) -> Result<&mut Self, RpcError> {
        self.insert(Registered::Async(Box::new(procedure)))
    }

    fn insert(&mut self, procedure: Registered<C>) -> Result<&mut Self, RpcError> {
        let name = procedure.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RpcError::DuplicateProcedure(name));
        }
        debug!(procedure = %name, "registered procedure");
        self.index.insert(name, self.procedures.len());
        self.procedures.push(procedure);
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The blocking procedure registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Procedure<C>> {
        match self.lookup(name)? {
            Registered::Blocking(p) => Some(p.as_ref()),
            Registered::Async(_) => None,
        }
    }

    /// The asynchronous procedure registered under `name`.
    pub fn get_async(&self, name: &str) -> Option<&dyn AsyncProcedure<C>> {
        match self.lookup(name)? {
            Registered::Async(p) => Some(p.as_ref()),
            Registered::Blocking(_) => None,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Registered<C>> {
        self.index.get(name).map(|&i| &self.procedures[i])
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    // =========================================================================
    // Blocking dispatch
    // =========================================================================

    /// Handle one raw request body and produce the response body.
    pub fn call(&self, raw: &[u8], context: &C) -> Result<Vec<u8>, RpcError> {
        let response = match serde_json::from_slice::<serde_json::Value>(raw) {
            Ok(request) => self.call_value(&request, context)?,
            Err(e) => self.error_response(RpcError::InvalidRequest(e.to_string()), context, serde_json::Value::Null)?,
        };
        Ok(serde_json::to_vec(&response)?)
    }

    /// Handle an already-parsed request envelope.
    pub fn call_value(&self, request: &serde_json::Value, context: &C) -> Result<serde_json::Value, RpcError> {
        let mut id = serde_json::Value::Null;
        let outcome = self.dispatch(request, context, &mut id);
        self.respond(outcome, context, id)
    }

    fn dispatch(&self, request: &serde_json::Value, context: &C, id: &mut serde_json::Value) -> Result<Outcome, RpcError> {
        let Some((procedure, params)) = self.resolve(request, id)? else {
            return Ok(Outcome::MethodNotFound);
        };
        match procedure {
            Registered::Blocking(p) => invoke(p.as_ref(), &params, context).map(Outcome::Result),
            Registered::Async(p) => Err(RpcError::AsyncOnly(p.name().to_string())),
        }
    }

    // =========================================================================
    // Async dispatch
    // =========================================================================

    /// Like [`Rpc::call`], awaiting asynchronous procedures and permission
    /// hooks. Blocking procedures run inline.
    pub async fn call_async(&self, raw: &[u8], context: &C) -> Result<Vec<u8>, RpcError> {
        let response = match serde_json::from_slice::<serde_json::Value>(raw) {
            Ok(request) => self.call_value_async(&request, context).await?,
            Err(e) => self.error_response(RpcError::InvalidRequest(e.to_string()), context, serde_json::Value::Null)?,
        };
        Ok(serde_json::to_vec(&response)?)
    }

    pub async fn call_value_async(
        &self,
        request: &serde_json::Value,
        context: &C,
    ) -> Result<serde_json::Value, RpcError> {
        let mut id = serde_json::Value::Null;
        let outcome = self.dispatch_async(request, context, &mut id).await;
        self.respond(outcome, context, id)
    }

    async fn dispatch_async(
        &self,
        request: &serde_json::Value,
        context: &C,
        id: &mut serde_json::Value,
    ) -> Result<Outcome, RpcError> {
        let Some((procedure, params)) = self.resolve(request, id)? else {
            return Ok(Outcome::MethodNotFound);
        };
        let procedure = match procedure {
            Registered::Blocking(p) => return invoke(p.as_ref(), &params, context).map(Outcome::Result),
            Registered::Async(p) => p.as_ref(),
        };

        for permission in procedure.permissions() {
            permission(context)?;
        }
        for permission in procedure.async_permissions() {
            permission(context).await?;
        }

        let input = from_primitive_under(&procedure.input(), &params, "params")?;
        let output = procedure.call(input, context).await?;
        let result = to_primitive_under(&procedure.output(), &output, "result")?;
        Ok(Outcome::Result(result))
    }

    // =========================================================================
    // Shared
    // =========================================================================

    /// Read the envelope, recording its id, and find the procedure.
    fn resolve(
        &self,
        request: &serde_json::Value,
        id: &mut serde_json::Value,
    ) -> Result<Option<(&Registered<C>, serde_json::Value)>, RpcError> {
        let request = RpcRequest::deserialize(request).map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
        *id = json!(request.id);

        match self.lookup(&request.method) {
            Some(procedure) => Ok(Some((procedure, request.params))),
            None => {
                warn!(method = %request.method, "method not found");
                Ok(None)
            }
        }
    }

    fn respond(
        &self,
        outcome: Result<Outcome, RpcError>,
        context: &C,
        id: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        match outcome {
            Ok(Outcome::Result(result)) => Ok(json!({"jsonrpc": "2.0", "result": result, "id": id})),
            Ok(Outcome::MethodNotFound) => Ok(json!({
                "jsonrpc": "2.0",
                "error": {"code": METHOD_NOT_FOUND, "message": "Method not found"},
                "id": id,
            })),
            Err(err) => self.error_response(err, context, id),
        }
    }

    fn error_response(&self, err: RpcError, context: &C, id: serde_json::Value) -> Result<serde_json::Value, RpcError> {
        match (self.error_mapper)(&err, context) {
            Some(error) => {
                warn!(error = %err, "request rejected");
                Ok(json!({"jsonrpc": "2.0", "error": error, "id": id}))
            }
            None => Err(err),
        }
    }
}

fn invoke<C>(procedure: &dyn Procedure<C>, params: &serde_json::Value, context: &C) -> Result<serde_json::Value, RpcError> {
    for permission in procedure.permissions() {
        permission(context)?;
    }
    let input = from_primitive_under(&procedure.input(), params, "params")?;
    let output = procedure.call(input, context)?;
    Ok(to_primitive_under(&procedure.output(), &output, "result")?)
}

impl<C: 'static> MetadataProvider for Rpc<C> {
    fn procedures(&self) -> Vec<ProcedureInfo> {
        self.procedures.iter().map(Registered::info).collect()
    }
}
