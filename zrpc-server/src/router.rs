//! Method registry and routing
//!
//! The router maps method names to handlers. It is filled while the server
//! is being built and only read afterwards, so it is shared behind an `Arc`
//! and cloned freely.
//!
//! Routing a call:
//!
//! 1. look the method up (`Error::MethodNotFound` if absent)
//! 2. check the params against the method's [`ParamsSpec`]
//! 3. run the handler, turning a panic into `Error::Internal`
//!
//! # Examples
//!
//! ```rust
//! use zrpc_server::{from_fn, ParamsSpec, Router};
//!
//! let mut router = Router::new();
//! router.register("ping", from_fn(|_| async { Ok(serde_json::json!("pong")) }));
//! router.register_with_spec(
//!     "echo",
//!     ParamsSpec::Required,
//!     from_fn(|params| async move { Ok(params.into_value().unwrap_or_default()) }),
//! );
//!
//! assert!(router.has_method("echo"));
//! ```

use crate::handler::Handler;
use crate::params::ParamsSpec;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use zrpc_core::{Error, Params, Result};

#[derive(Clone)]
struct Method {
    handler: Arc<dyn Handler>,
    spec: ParamsSpec,
}

/// Registry of JSON-RPC methods
#[derive(Clone)]
pub struct Router {
    methods: Arc<HashMap<String, Method>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            methods: Arc::new(HashMap::new()),
        }
    }

    /// Register a handler that accepts any params
    ///
    /// Registering the same name again replaces the earlier handler.
    pub fn register(&mut self, method: impl Into<String>, handler: Box<dyn Handler>) {
        self.register_with_spec(method, ParamsSpec::Any, handler);
    }

    /// Register a handler whose params are checked against `spec` first
    pub fn register_with_spec(
        &mut self,
        method: impl Into<String>,
        spec: ParamsSpec,
        handler: Box<dyn Handler>,
    ) {
        let methods = Arc::make_mut(&mut self.methods);
        methods.insert(
            method.into(),
            Method {
                handler: Arc::from(handler),
                spec,
            },
        );
    }

    pub fn get(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.methods.get(method).map(|m| Arc::clone(&m.handler))
    }

    /// Declared params shape of a method
    pub fn spec(&self, method: &str) -> Option<ParamsSpec> {
        self.methods.get(method).map(|m| m.spec)
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Route a call to its handler
    pub async fn route(&self, method: &str, params: Params) -> Result<Value> {
        let entry = self
            .methods
            .get(method)
            .ok_or_else(|| Error::MethodNotFound(method.to_string()))?;

        entry.spec.check(&params)?;

        let handler = Arc::clone(&entry.handler);
        AssertUnwindSafe(async move { handler.handle(params).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let reason = panic_message(panic.as_ref());
                tracing::error!(method = %method, reason = %reason, "Handler panicked");
                Err(Error::Internal(format!("handler panicked: {}", reason)))
            })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Fluent construction of a [`Router`]
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    pub fn handler(mut self, method: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        self.router.register(method, handler);
        self
    }

    pub fn handler_with_spec(
        mut self,
        method: impl Into<String>,
        spec: ParamsSpec,
        handler: Box<dyn Handler>,
    ) -> Self {
        self.router.register_with_spec(method, spec, handler);
        self
    }

    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use serde_json::json;

    #[tokio::test]
    async fn test_router_basic() {
        let mut router = Router::new();
        router.register("test", from_fn(|_| async { Ok(json!({"status": "ok"})) }));

        assert!(router.has_method("test"));
        assert!(!router.has_method("unknown"));
        assert!(router.get("test").is_some());
        assert_eq!(router.spec("test"), Some(ParamsSpec::Any));

        let result = router.route("test", Params::None).await.unwrap();
        assert_eq!(result, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_router_method_not_found() {
        let router = Router::new();
        let result = router.route("foobar", Params::None).await;
        assert!(matches!(result, Err(Error::MethodNotFound(m)) if m == "foobar"));
    }

    #[tokio::test]
    async fn test_spec_checked_before_handler() {
        let router = RouterBuilder::new()
            .handler_with_spec(
                "strict",
                ParamsSpec::Positional,
                from_fn(|_| async { Ok(json!("handler ran")) }),
            )
            .build();

        let result = router.route("strict", Params::None).await;
        assert!(matches!(result, Err(Error::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_internal_error() {
        let router = RouterBuilder::new()
            .handler(
                "boom",
                from_fn(|params: Params| async move {
                    if params.is_none() {
                        panic!("kaboom");
                    }
                    Ok(json!(null))
                }),
            )
            .build();

        match router.route("boom", Params::None).await {
            Err(Error::Internal(msg)) => assert!(msg.contains("kaboom")),
            other => panic!("expected internal error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_replaces_and_lists_sorted() {
        let mut router = Router::new();
        router.register("b", from_fn(|_| async { Ok(json!(1)) }));
        router.register("a", from_fn(|_| async { Ok(json!(1)) }));
        router.register("b", from_fn(|_| async { Ok(json!(2)) }));

        assert_eq!(router.methods(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(router.route("b", Params::None).await.unwrap(), json!(2));
    }
}
