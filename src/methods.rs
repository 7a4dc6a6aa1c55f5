//! Demonstration method set
//!
//! Small methods served by the `zrpc-server` binary and used by the
//! conformance tests. Each is registered with the params shape it expects.
//!
//! | Method         | Params                                    | Result                          |
//! |----------------|-------------------------------------------|---------------------------------|
//! | `echo`         | anything                                  | the params, unchanged           |
//! | `subtract`     | `[minuend, subtrahend]` or named          | the difference                  |
//! | `sum`          | array of numbers                          | their sum                       |
//! | `counter`      | none                                      | 1, 2, 3, ... per call           |
//! | `iterate`      | anything                                  | number of items walked          |
//! | `foreach`      | anything                                  | number of items walked          |
//! | `notify_hello` | array                                     | its first argument              |
//! | `get_data`     | none                                      | `["hello", 5]`                  |
//!
//! Integer inputs give integer results; any non-integer input switches the
//! arithmetic to floating point.

use serde::Deserialize;
use serde_json::{json, Number, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use zrpc_core::{Error, Params, Result};
use zrpc_server::{from_fn, Handler, HandlerResult, ParamsSpec, Router, RouterBuilder};

/// Router with every demonstration method registered
pub fn demo_router() -> Router {
    RouterBuilder::new()
        .handler_with_spec("echo", ParamsSpec::Required, echo())
        .handler_with_spec("subtract", ParamsSpec::Required, subtract())
        .handler_with_spec("sum", ParamsSpec::Positional, sum())
        .handler_with_spec("counter", ParamsSpec::NoParams, Box::new(Counter::default()))
        .handler_with_spec("iterate", ParamsSpec::Required, walk("iterate"))
        .handler_with_spec("foreach", ParamsSpec::Required, walk("foreach"))
        .handler_with_spec("notify_hello", ParamsSpec::Positional, notify_hello())
        .handler_with_spec("get_data", ParamsSpec::NoParams, get_data())
        .build()
}

fn echo() -> Box<dyn Handler> {
    from_fn(|params: Params| async move { Ok(params.into_value().unwrap_or(Value::Null)) })
}

#[derive(Deserialize)]
struct Operands {
    minuend: Number,
    subtrahend: Number,
}

fn subtract() -> Box<dyn Handler> {
    from_fn(|params: Params| async move {
        let Operands {
            minuend,
            subtrahend,
        } = params.parse()?;

        if let (Some(a), Some(b)) = (minuend.as_i64(), subtrahend.as_i64()) {
            if let Some(difference) = a.checked_sub(b) {
                return Ok(json!(difference));
            }
        }
        float_result(as_f64(&minuend)? - as_f64(&subtrahend)?)
    })
}

fn sum() -> Box<dyn Handler> {
    from_fn(|params: Params| async move {
        let Params::Positional(items) = params else {
            return Err(Error::InvalidParams("expected params as an Array".to_string()));
        };

        let numbers = items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Number(n) => Ok(n),
                other => Err(Error::InvalidParams(format!(
                    "item {} is not a number: {}",
                    index, other
                ))),
            })
            .collect::<Result<Vec<&Number>>>()?;

        let integers: Option<i64> = numbers
            .iter()
            .try_fold(0i64, |acc, n| n.as_i64().and_then(|n| acc.checked_add(n)));
        if let Some(total) = integers {
            return Ok(json!(total));
        }

        let mut total = 0.0;
        for n in numbers {
            total += as_f64(n)?;
        }
        float_result(total)
    })
}

fn as_f64(n: &Number) -> Result<f64> {
    n.as_f64()
        .ok_or_else(|| Error::InvalidParams(format!("{} is not representable as a float", n)))
}

fn float_result(value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| Error::Internal(format!("result {} is not a finite number", value)))
}

/// Process-wide call counter
#[derive(Default)]
struct Counter {
    calls: AtomicU64,
}

impl Handler for Counter {
    fn handle(&self, _params: Params) -> HandlerResult {
        let value = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Box::pin(async move { Ok(json!(value)) })
    }
}

fn walk(name: &'static str) -> Box<dyn Handler> {
    from_fn(move |params: Params| async move {
        let visited = match params {
            Params::Positional(items) => {
                for (index, item) in items.iter().enumerate() {
                    tracing::info!(method = name, index, item = %item, "Visited item");
                }
                items.len()
            }
            Params::Named(members) => {
                for (key, item) in &members {
                    tracing::info!(method = name, key = %key, item = %item, "Visited member");
                }
                members.len()
            }
            Params::None => 0,
        };
        Ok(json!(visited))
    })
}

fn notify_hello() -> Box<dyn Handler> {
    from_fn(|params: Params| async move {
        let argument = match params {
            Params::Positional(items) => items.into_iter().next().unwrap_or(Value::Null),
            _ => Value::Null,
        };
        tracing::info!(argument = %argument, "Hello");
        Ok(argument)
    })
}

fn get_data() -> Box<dyn Handler> {
    from_fn(|_| async { Ok(json!(["hello", 5])) })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn call(method: &str, params: Value) -> Result<Value> {
        let params = Params::from_serializable(params)?;
        demo_router().route(method, params).await
    }

    #[tokio::test]
    async fn test_subtract_shapes() {
        assert_eq!(call("subtract", json!([42, 23])).await.unwrap(), json!(19));
        assert_eq!(call("subtract", json!([23, 42])).await.unwrap(), json!(-19));
        assert_eq!(
            call("subtract", json!({"subtrahend": 23, "minuend": 42})).await.unwrap(),
            json!(19)
        );
        assert_eq!(call("subtract", json!([1.5, 1])).await.unwrap(), json!(0.5));
    }

    #[tokio::test]
    async fn test_subtract_bad_params() {
        for params in [json!([1]), json!([1, 2, 3]), json!(["a", 1]), json!({"minuend": 1})] {
            assert!(matches!(
                call("subtract", params).await,
                Err(Error::InvalidParams(_))
            ));
        }
        assert!(matches!(
            call("subtract", Value::Null).await,
            Err(Error::InvalidParams(_))
        ));
    }

    #[tokio::test]
    async fn test_sum() {
        assert_eq!(call("sum", json!([1, 2, 4])).await.unwrap(), json!(7));
        assert_eq!(call("sum", json!([])).await.unwrap(), json!(0));
        assert_eq!(call("sum", json!([0.5, 1])).await.unwrap(), json!(1.5));
        assert!(matches!(call("sum", json!([1, "2"])).await, Err(Error::InvalidParams(_))));
        assert!(matches!(call("sum", json!({"a": 1})).await, Err(Error::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_counter_increments() {
        let router = demo_router();
        for expected in 1..=3 {
            let value = router.route("counter", Params::None).await.unwrap();
            assert_eq!(value, json!(expected));
        }
        assert!(matches!(
            router.route("counter", Params::from(vec![json!(1)])).await,
            Err(Error::InvalidParams(_))
        ));
    }

    #[tokio::test]
    async fn test_walks_count_items() {
        assert_eq!(call("iterate", json!([1, 2, 3])).await.unwrap(), json!(3));
        assert_eq!(call("foreach", json!({"a": 1, "b": 2})).await.unwrap(), json!(2));
        assert!(matches!(call("iterate", Value::Null).await, Err(Error::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_echo_notify_hello_get_data() {
        assert_eq!(call("echo", json!({"k": [1]})).await.unwrap(), json!({"k": [1]}));
        assert_eq!(call("notify_hello", json!([7])).await.unwrap(), json!(7));
        assert_eq!(call("get_data", Value::Null).await.unwrap(), json!(["hello", 5]));
    }
}
