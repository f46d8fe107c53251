// File: src/rule.rs
// Purpose: Validation rules (regex pattern or predicate) and their evaluation

use crate::error::{Result, ValidatorError};
use crate::validity::Validity;
use futures::future::{self, BoxFuture, FutureExt};
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by every rule evaluation
pub type RuleFuture = BoxFuture<'static, Result<Validity>>;

type PredicateFn = dyn Fn(&str) -> RuleFuture + Send + Sync;

/// A rule computes the validity of a field value
///
/// Patterns yield `Valid` when the regex matches anywhere in the value and
/// `Invalid` otherwise. Predicates may return any validity, synchronously or
/// through a future.
#[derive(Clone)]
pub enum Rule {
    Pattern(Regex),
    Predicate(Arc<PredicateFn>),
}

impl Rule {
    /// Compile a regex pattern rule
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Rule::Pattern)
            .map_err(|source| ValidatorError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Synchronous rule that cannot fail
    ///
    /// # Example
    ///
    /// ```
    /// use rusty_field_validator::Rule;
    ///
    /// let rule = Rule::predicate(|value: &str| value.len() > 3);
    /// ```
    pub fn predicate<F, V>(f: F) -> Self
    where
        F: Fn(&str) -> V + Send + Sync + 'static,
        V: Into<Validity> + 'static,
    {
        Rule::Predicate(Arc::new(move |value: &str| -> RuleFuture {
            future::ready(Ok(f(value).into())).boxed()
        }))
    }

    /// Synchronous rule that may fail
    pub fn try_predicate<F, V, E>(f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<V, E> + Send + Sync + 'static,
        V: Into<Validity> + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        Rule::Predicate(Arc::new(move |value: &str| -> RuleFuture {
            let outcome = f(value)
                .map(Into::into)
                .map_err(ValidatorError::rule_failed);
            future::ready(outcome).boxed()
        }))
    }

    /// Asynchronous rule, e.g. a uniqueness lookup
    ///
    /// The closure receives an owned copy of the value so the returned
    /// future can outlive the triggering event.
    pub fn from_async<F, Fut, V, E>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        V: Into<Validity> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        Rule::Predicate(Arc::new(move |value: &str| -> RuleFuture {
            let pending = f(value.to_string());
            async move {
                pending
                    .await
                    .map(Into::into)
                    .map_err(ValidatorError::rule_failed)
            }
            .boxed()
        }))
    }

    /// Evaluate the rule against a value
    pub fn evaluate(&self, value: &str) -> RuleFuture {
        match self {
            Rule::Pattern(regex) => future::ready(Ok(Validity::from(regex.is_match(value)))).boxed(),
            Rule::Predicate(f) => f(value),
        }
    }
}

impl From<Regex> for Rule {
    fn from(regex: Regex) -> Self {
        Rule::Pattern(regex)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Rule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
