// File: src/validator.rs
// Purpose: Reactive field validator bound to input and blur events

use crate::config::{InputOrdering, RuleErrorCallback, ValidatorConfig, ValidityCallback};
use crate::error::{Result, ValidatorError};
use crate::rule::{Rule, RuleFuture};
use crate::validity::Validity;
use futures::future::{self, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

/// Handle to the latest blur-time validation
///
/// Cloneable; every clone resolves to the same outcome. Resolving it does
/// not re-run the rule.
#[derive(Clone)]
pub struct PendingResult(Shared<RuleFuture>);

impl PendingResult {
    fn new(evaluation: RuleFuture) -> Self {
        Self(evaluation.shared())
    }

    /// An already-resolved result
    pub fn ready(validity: Validity) -> Self {
        Self::new(future::ready(Ok(validity)).boxed())
    }

    fn failed(err: ValidatorError) -> Self {
        Self::new(future::ready(Err(err)).boxed())
    }

    /// Outcome, if the evaluation has finished
    pub fn peek(&self) -> Option<&Result<Validity>> {
        self.0.peek()
    }
}

impl Future for PendingResult {
    type Output = Result<Validity>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl fmt::Debug for PendingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PendingResult").field(&self.peek()).finish()
    }
}

/// Partial replacement of a validator's rules
///
/// Slots that are not mentioned keep their current rule.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    input: Option<Option<Rule>>,
    blur: Option<Option<Rule>>,
}

impl RuleUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, rule: impl Into<Rule>) -> Self {
        self.input = Some(Some(rule.into()));
        self
    }

    pub fn blur(mut self, rule: impl Into<Rule>) -> Self {
        self.blur = Some(Some(rule.into()));
        self
    }

    /// Remove the input rule
    pub fn clear_input(mut self) -> Self {
        self.input = Some(None);
        self
    }

    /// Remove the blur rule
    pub fn clear_blur(mut self) -> Self {
        self.blur = Some(None);
        self
    }
}

struct ValidatorState {
    input_rule: Option<Rule>,
    blur_rule: Option<Rule>,
    validity: Validity,
    /// Last value handed to the blur rule; cleared once the field is edited
    last_checked: Option<String>,
    pending: Option<PendingResult>,
    input_seq: u64,
    applied_input_seq: u64,
}

struct Inner {
    state: Mutex<ValidatorState>,
    on_validity_change: ValidityCallback,
    on_rule_error: Option<RuleErrorCallback>,
    input_ordering: InputOrdering,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ValidatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, validity: &Validity) {
        (self.on_validity_change)(validity);
    }

    fn apply_input(&self, validity: Validity, seq: u64) {
        {
            let mut state = self.lock();
            if self.input_ordering == InputOrdering::LatestWins {
                if seq < state.applied_input_seq {
                    debug!(
                        seq,
                        applied = state.applied_input_seq,
                        "Discarding stale input validation result"
                    );
                    return;
                }
                state.applied_input_seq = seq;
            }

            if state.validity == validity {
                trace!(%validity, "Input validation result unchanged");
                return;
            }
            state.validity = validity.clone();
        }
        self.notify(&validity);
    }

    fn apply_blur(&self, validity: &Validity, force: bool) {
        {
            let mut state = self.lock();
            if !force && state.validity == *validity {
                trace!(%validity, "Blur validation result unchanged");
                return;
            }
            state.validity = validity.clone();
        }
        self.notify(validity);
    }

    fn report_rule_error(&self, trigger: &'static str, err: &ValidatorError) {
        warn!(trigger, error = %err, "Validation rule failed");
        if let Some(ref on_rule_error) = self.on_rule_error {
            on_rule_error(err);
        }
    }
}

/// Validates a single input field as the user types and leaves it
///
/// The UI layer forwards input events to [`handle_input`](Self::handle_input)
/// and blur events to [`handle_blur`](Self::handle_blur); validity changes
/// come back through the configured callback. Cloning yields another handle
/// to the same validator.
///
/// Rule evaluation is spawned onto the current Tokio runtime. Outside of one
/// nothing is evaluated: the handlers report [`ValidatorError::NoRuntime`]
/// to the `on_rule_error` hook and [`check`](Self::check) returns a failed
/// result.
///
/// # Example
///
/// ```no_run
/// use rusty_field_validator::{presets, FieldValidator, ValidatorConfig};
///
/// # async fn run() {
/// let validator = FieldValidator::new(
///     ValidatorConfig::new(|validity| println!("now {}", validity))
///         .blur_rule(presets::digits()),
/// );
///
/// validator.handle_input("12");
/// let outcome = validator.check_now("123").unwrap().await;
/// # }
/// ```
#[derive(Clone)]
pub struct FieldValidator {
    inner: Arc<Inner>,
}

impl FieldValidator {
    /// Create a validator with unknown validity and nothing checked yet
    pub fn new(config: ValidatorConfig) -> Self {
        let state = ValidatorState {
            input_rule: config.input_rule,
            blur_rule: config.blur_rule,
            validity: Validity::Unknown,
            last_checked: None,
            pending: None,
            input_seq: 0,
            applied_input_seq: 0,
        };

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                on_validity_change: config.on_validity_change,
                on_rule_error: config.on_rule_error,
                input_ordering: config.input_ordering,
            }),
        }
    }

    /// Input event handler
    ///
    /// Runs the input rule in the background. Does nothing without an input
    /// rule, or when `value` is the one the blur rule last checked.
    pub fn handle_input(&self, value: &str) {
        let Ok(runtime) = Handle::try_current() else {
            if self.has_input_rule() {
                self.inner.report_rule_error("input", &ValidatorError::NoRuntime);
            }
            return;
        };

        let (rule, seq) = {
            let mut state = self.inner.lock();
            let Some(rule) = state.input_rule.clone() else {
                return;
            };
            if state.last_checked.as_deref() == Some(value) {
                trace!(value, "Input matches last blur-checked value");
                return;
            }
            state.last_checked = None;
            state.input_seq += 1;
            (rule, state.input_seq)
        };

        debug!(value, seq, "Running input validation");
        let inner = Arc::clone(&self.inner);
        let value = value.to_string();
        runtime.spawn(async move {
            match rule.evaluate(&value).await {
                Ok(validity) => inner.apply_input(validity, seq),
                Err(err) => inner.report_rule_error("input", &err),
            }
        });
    }

    /// Blur event handler; a non-forced [`check`](Self::check)
    ///
    /// Nobody awaits the result here, so rule failures go to the
    /// `on_rule_error` hook like input-time failures do.
    pub fn handle_blur(&self, value: &str) {
        let _ = self.start_check(value, false, true);
    }

    /// Run the blur rule against `value`
    ///
    /// If there is no blur rule, or `value` was already checked, the rule is
    /// not re-run: with `force` the callback is re-announced with the current
    /// validity, and the previous pending result (if any) is returned.
    ///
    /// Otherwise the new evaluation is stored as the pending result before it
    /// resolves. On resolution the validity is updated and the callback fires
    /// if it changed, or always when `force` is set. Rule failures leave the
    /// validity untouched and surface through the returned result.
    pub fn check(&self, value: &str, force: bool) -> Option<PendingResult> {
        self.start_check(value, force, false)
    }

    /// [`check`](Self::check) with `force` set
    pub fn check_now(&self, value: &str) -> Option<PendingResult> {
        self.check(value, true)
    }

    fn start_check(&self, value: &str, force: bool, report_failures: bool) -> Option<PendingResult> {
        let runtime = Handle::try_current();
        let (pending, runtime) = {
            let mut state = self.inner.lock();
            let rule = match state.blur_rule.clone() {
                Some(rule) if state.last_checked.as_deref() != Some(value) => rule,
                _ => {
                    let previous = state.pending.clone();
                    let current = state.validity.clone();
                    drop(state);
                    trace!(value, force, "Skipping blur validation");
                    if force {
                        self.inner.notify(&current);
                    }
                    return previous;
                }
            };

            let Ok(runtime) = runtime else {
                drop(state);
                let err = ValidatorError::NoRuntime;
                if report_failures {
                    self.inner.report_rule_error("blur", &err);
                }
                return Some(PendingResult::failed(err));
            };

            state.last_checked = Some(value.to_string());
            let evaluation = self.blur_evaluation(rule, value.to_string(), force, report_failures);
            let pending = PendingResult::new(evaluation);
            state.pending = Some(pending.clone());
            (pending, runtime)
        };

        debug!(value, force, "Running blur validation");
        runtime.spawn(pending.clone().map(|_| ()));
        Some(pending)
    }

    fn blur_evaluation(
        &self,
        rule: Rule,
        value: String,
        force: bool,
        report_failures: bool,
    ) -> RuleFuture {
        let inner = Arc::clone(&self.inner);
        async move {
            match rule.evaluate(&value).await {
                Ok(validity) => {
                    inner.apply_blur(&validity, force);
                    Ok(validity)
                }
                Err(err) => {
                    if report_failures {
                        inner.report_rule_error("blur", &err);
                    } else {
                        debug!(error = %err, "Blur validation rule failed");
                    }
                    Err(err)
                }
            }
        }
        .boxed()
    }

    /// Replace some or all rules
    ///
    /// Forgets the last checked value so the next interaction re-validates.
    /// Validity is left as is and the callback is not invoked.
    pub fn set_rules(&self, update: RuleUpdate) {
        let mut state = self.inner.lock();
        if let Some(input) = update.input {
            state.input_rule = input;
        }
        if let Some(blur) = update.blur {
            state.blur_rule = blur;
        }
        state.last_checked = None;
        debug!(
            input = state.input_rule.is_some(),
            blur = state.blur_rule.is_some(),
            "Validation rules replaced"
        );
    }

    /// Override validity, e.g. after a server-side check
    ///
    /// No-op when `validity` equals the current one. Otherwise the pending
    /// result becomes an already-resolved one and the callback runs before
    /// this returns.
    pub fn set_validity(&self, validity: impl Into<Validity>) {
        let validity = validity.into();
        {
            let mut state = self.inner.lock();
            if state.validity == validity {
                return;
            }
            state.validity = validity.clone();
            state.pending = Some(PendingResult::ready(validity.clone()));
        }
        self.inner.notify(&validity);
    }

    /// Back to the initial unknown state
    pub fn reset_validity(&self) {
        self.set_validity(Validity::Unknown);
    }

    pub fn validity(&self) -> Validity {
        self.inner.lock().validity.clone()
    }

    /// Latest pending result from [`check`](Self::check) or [`set_validity`](Self::set_validity)
    pub fn pending(&self) -> Option<PendingResult> {
        self.inner.lock().pending.clone()
    }

    pub fn last_checked(&self) -> Option<String> {
        self.inner.lock().last_checked.clone()
    }

    pub fn has_input_rule(&self) -> bool {
        self.inner.lock().input_rule.is_some()
    }

    pub fn has_blur_rule(&self) -> bool {
        self.inner.lock().blur_rule.is_some()
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("FieldValidator")
            .field("input_rule", &state.input_rule)
            .field("blur_rule", &state.blur_rule)
            .field("validity", &state.validity)
            .field("last_checked", &state.last_checked)
            .field("input_ordering", &self.inner.input_ordering)
            .finish()
    }
}
