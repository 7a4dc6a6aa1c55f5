//! Declared parameter shapes
//!
//! A method can be registered with a [`ParamsSpec`]. The router checks the
//! call's params against it before the handler runs and answers a mismatch
//! with Invalid params (-32602), so handlers only see the shapes they
//! declared.

use std::fmt;
use zrpc_core::{Error, Params, Result};

/// Shape a method's params must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamsSpec {
    /// No check
    #[default]
    Any,
    /// Params absent, or an empty array
    NoParams,
    /// Params present (array or object)
    Required,
    /// Params must be an array
    Positional,
    /// Params must be an object
    Named,
    /// Exactly `n` positional items or named members
    Arity(usize),
}

impl ParamsSpec {
    /// Check `params` against this shape
    pub fn check(&self, params: &Params) -> Result<()> {
        let ok = match (self, params) {
            (ParamsSpec::Any, _) => true,
            (ParamsSpec::NoParams, Params::None) => true,
            (ParamsSpec::NoParams, Params::Positional(items)) => items.is_empty(),
            (ParamsSpec::NoParams, Params::Named(_)) => false,
            (ParamsSpec::Required, p) => !p.is_none(),
            (ParamsSpec::Positional, p) => matches!(p, Params::Positional(_)),
            (ParamsSpec::Named, p) => matches!(p, Params::Named(_)),
            (ParamsSpec::Arity(n), p) => !p.is_none() && p.len() == *n,
        };

        if ok {
            Ok(())
        } else {
            Err(Error::InvalidParams(format!("expected {}", self)))
        }
    }
}

impl fmt::Display for ParamsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsSpec::Any => write!(f, "any params"),
            ParamsSpec::NoParams => write!(f, "no params"),
            ParamsSpec::Required => write!(f, "params"),
            ParamsSpec::Positional => write!(f, "params as an Array"),
            ParamsSpec::Named => write!(f, "params as an Object"),
            ParamsSpec::Arity(n) => write!(f, "exactly {} params", n),
        }
    }
}
