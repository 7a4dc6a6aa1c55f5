//! Method handlers
//!
//! A handler is the implementation of one JSON-RPC method. It receives the
//! call's [`Params`] exactly as decoded (absent, positional or named) and
//! resolves to a JSON value or an [`Error`].
//!
//! How a handler's error reaches the wire:
//!
//! - `Error::InvalidParams` becomes Invalid params (-32602)
//! - `Error::JsonRpc(data)` is sent as-is, which is how a method reports a
//!   server-defined error in `-32000..=-32099`
//! - anything else becomes Internal error (-32603)
//!
//! # Creating Handlers
//!
//! - [`from_fn`]: an async closure over raw [`Params`]
//! - [`from_typed_fn`]: an async closure over a `Deserialize` type; params
//!   that do not deserialize are rejected with Invalid params before the
//!   closure runs
//!
//! Handlers are plain trait objects, so a method with its own state (a
//! counter, a connection pool) can implement [`Handler`] directly.
//!
//! # Examples
//!
//! ```rust
//! use zrpc_server::{from_fn, from_typed_fn};
//! use serde::Deserialize;
//!
//! let echo = from_fn(|params| async move {
//!     Ok(params.into_value().unwrap_or_default())
//! });
//!
//! #[derive(Deserialize)]
//! struct Operands { minuend: i64, subtrahend: i64 }
//!
//! // Accepts both {"minuend": 42, "subtrahend": 23} and [42, 23]
//! let subtract = from_typed_fn(|p: Operands| async move {
//!     Ok(p.minuend - p.subtrahend)
//! });
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use zrpc_core::{Error, Params, Result};

/// Boxed future returned by every handler
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Implementation of a JSON-RPC method
pub trait Handler: Send + Sync {
    fn handle(&self, params: Params) -> HandlerResult;
}

/// Handler backed by an async closure
pub struct AsyncHandler<F> {
    func: F,
}

impl<F, Fut> AsyncHandler<F>
where
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Handler for AsyncHandler<F>
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn handle(&self, params: Params) -> HandlerResult {
        Box::pin((self.func)(params))
    }
}

/// Wrap an async closure over raw params
pub fn from_fn<F, Fut>(func: F) -> Box<dyn Handler>
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(AsyncHandler::new(func))
}

/// Wrap an async closure over typed params and a serializable result
///
/// Absent params deserialize from `null`, so `()` and `Option<T>` work for
/// methods that take none.
pub fn from_typed_fn<P, R, F, Fut>(func: F) -> Box<dyn Handler>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    from_fn(move |params: Params| {
        let func = Arc::clone(&func);
        async move {
            let params: P = params.parse()?;
            let result = func(params).await?;
            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Operands {
        minuend: i64,
        subtrahend: i64,
    }

    fn subtract() -> Box<dyn Handler> {
        from_typed_fn(|p: Operands| async move { Ok(p.minuend - p.subtrahend) })
    }

    #[tokio::test]
    async fn test_raw_handler_sees_params_variant() {
        let handler = from_fn(|params| async move {
            Ok(json!(match params {
                Params::None => "none",
                Params::Positional(_) => "positional",
                Params::Named(_) => "named",
            }))
        });

        assert_eq!(handler.handle(Params::None).await.unwrap(), json!("none"));
        assert_eq!(
            handler.handle(Params::from(vec![json!(1)])).await.unwrap(),
            json!("positional")
        );
    }

    #[tokio::test]
    async fn test_typed_handler_named_and_positional() {
        let named = Params::from_serializable(json!({"minuend": 42, "subtrahend": 23})).unwrap();
        let positional = Params::from_serializable(json!([23, 42])).unwrap();

        assert_eq!(subtract().handle(named).await.unwrap(), json!(19));
        assert_eq!(subtract().handle(positional).await.unwrap(), json!(-19));
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_bad_params() {
        let result = subtract().handle(Params::from(vec![json!("a")])).await;
        assert!(matches!(result, Err(Error::InvalidParams(_))));

        let result = subtract().handle(Params::None).await;
        assert!(matches!(result, Err(Error::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_typed_handler_unit_params() {
        let handler = from_typed_fn(|_: ()| async { Ok("pong") });
        assert_eq!(handler.handle(Params::None).await.unwrap(), json!("pong"));
    }
}
