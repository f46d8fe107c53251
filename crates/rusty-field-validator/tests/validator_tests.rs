//! Integration tests for rusty-field-validator
//!
//! Covers the event-driven behaviour end to end:
//! - blur checks, forced re-announcement and caching of the checked value
//! - rule replacement and manual validity overrides
//! - out-of-order input evaluations in both ordering modes
//! - input-time rule failures

use pretty_assertions::assert_eq;
use rusty_field_validator::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

fn recording_config() -> (ValidatorConfig, mpsc::UnboundedReceiver<Validity>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let config = ValidatorConfig::new(move |validity| {
        let _ = tx.send(validity.clone());
    });
    (config, rx)
}

async fn next_change(rx: &mut mpsc::UnboundedReceiver<Validity>) -> Validity {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("validity change within a second")
        .expect("callback channel open")
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// Input rule whose evaluation for each value waits on its own gate and
/// then reports the value's length
fn gated_length_rule() -> (Rule, Arc<Mutex<HashMap<String, oneshot::Receiver<()>>>>) {
    let gates: Arc<Mutex<HashMap<String, oneshot::Receiver<()>>>> = Arc::default();
    let rule_gates = Arc::clone(&gates);
    let rule = Rule::from_async(move |value: String| {
        let gate = rule_gates.lock().unwrap().remove(&value);
        async move {
            if let Some(gate) = gate {
                gate.await?;
            }
            Ok::<_, anyhow::Error>(value.len() as u64)
        }
    });
    (rule, gates)
}

fn open_gate(
    gates: &Arc<Mutex<HashMap<String, oneshot::Receiver<()>>>>,
    value: &str,
) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    gates.lock().unwrap().insert(value.to_string(), rx);
    tx
}

#[tokio::test]
async fn test_digits_blur_scenario() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.blur_rule(Rule::pattern(r"^\d+$").unwrap()));
    assert_eq!(validator.validity(), Validity::Unknown);

    let first = validator.check_now("123").unwrap().await.unwrap();
    assert_eq!(first, Validity::Valid);
    assert_eq!(rx.try_recv().unwrap(), Validity::Valid);

    // Default force re-announces without re-running the rule
    let second = validator.check_now("123").unwrap().await.unwrap();
    assert_eq!(second, Validity::Valid);
    assert_eq!(rx.try_recv().unwrap(), Validity::Valid);

    // The blur handler does not force
    validator.handle_blur("123");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_check_normalizes_missing_result_to_unknown() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.blur_rule(Rule::predicate(|_: &str| Option::<bool>::None)));
    validator.set_validity(true);
    assert_eq!(rx.try_recv().unwrap(), Validity::Valid);

    let outcome = validator.check_now("anything").unwrap().await.unwrap();
    assert_eq!(outcome, Validity::Unknown);
    assert_eq!(rx.try_recv().unwrap(), Validity::Unknown);
    assert_eq!(validator.validity(), Validity::Unknown);
}

#[tokio::test]
async fn test_blur_handler_notifies_only_on_change() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.blur_rule(presets::digits()));

    validator.handle_blur("12");
    assert_eq!(next_change(&mut rx).await, Validity::Valid);

    validator.handle_blur("34");
    validator.pending().unwrap().await.unwrap();
    assert!(rx.try_recv().is_err());

    validator.handle_blur("x");
    assert_eq!(next_change(&mut rx).await, Validity::Invalid);
}

#[tokio::test]
async fn test_forced_check_notifies_even_when_unchanged() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.blur_rule(presets::digits()));

    validator.check("1", false).unwrap().await.unwrap();
    assert_eq!(rx.try_recv().unwrap(), Validity::Valid);

    validator.check("2", true).unwrap().await.unwrap();
    assert_eq!(rx.try_recv().unwrap(), Validity::Valid);
}

#[tokio::test]
async fn test_set_rules_forces_reevaluation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let (config, _rx) = recording_config();
    let validator = FieldValidator::new(config.blur_rule(Rule::predicate(move |_: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    })));

    validator.check("same", false).unwrap().await.unwrap();
    validator.check("same", false).unwrap().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    validator.set_rules(RuleUpdate::new().blur(presets::digits()));
    let outcome = validator.check("same", false).unwrap().await.unwrap();
    assert_eq!(outcome, Validity::Invalid);
    assert_eq!(validator.validity(), Validity::Invalid);
}

#[tokio::test]
async fn test_set_rules_does_not_notify() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config);
    validator.set_rules(RuleUpdate::new().input(presets::required()).blur(presets::email()));
    assert!(rx.try_recv().is_err());
    assert!(validator.has_input_rule());
    assert!(validator.has_blur_rule());
}

#[tokio::test]
async fn test_input_notifies_on_change_only() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.input_rule(Rule::predicate(|v: &str| v.len() > 3)));

    validator.handle_input("a");
    assert_eq!(next_change(&mut rx).await, Validity::Invalid);

    validator.handle_input("ab");
    settle().await;
    assert!(rx.try_recv().is_err());

    validator.handle_input("abcd");
    assert_eq!(next_change(&mut rx).await, Validity::Valid);
}

#[tokio::test]
async fn test_input_without_rule_is_noop() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.blur_rule(presets::digits()));
    validator.check("5", false).unwrap().await.unwrap();
    let _ = rx.try_recv();

    validator.handle_input("6");
    settle().await;
    assert!(rx.try_recv().is_err());
    // Without an input rule the blur cache is not cleared either
    assert_eq!(validator.last_checked().as_deref(), Some("5"));
}

#[tokio::test]
async fn test_out_of_order_input_last_resolved_wins() {
    let (rule, gates) = gated_length_rule();
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.input_rule(rule));

    let release_a = open_gate(&gates, "a");
    let release_ab = open_gate(&gates, "ab");
    validator.handle_input("a");
    validator.handle_input("ab");

    release_ab.send(()).unwrap();
    assert_eq!(next_change(&mut rx).await, Validity::from(2u64));

    release_a.send(()).unwrap();
    assert_eq!(next_change(&mut rx).await, Validity::from(1u64));
    assert_eq!(validator.validity(), Validity::from(1u64));
}

#[tokio::test]
async fn test_out_of_order_input_latest_wins() {
    let (rule, gates) = gated_length_rule();
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(
        config
            .input_rule(rule)
            .input_ordering(InputOrdering::LatestWins),
    );

    let release_a = open_gate(&gates, "a");
    let release_ab = open_gate(&gates, "ab");
    validator.handle_input("a");
    validator.handle_input("ab");

    release_ab.send(()).unwrap();
    assert_eq!(next_change(&mut rx).await, Validity::from(2u64));

    release_a.send(()).unwrap();
    settle().await;
    assert!(rx.try_recv().is_err());
    assert_eq!(validator.validity(), Validity::from(2u64));
}

#[tokio::test]
async fn test_input_rule_failure_reaches_hook() {
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(
        config
            .input_rule(Rule::from_async(|_: String| async {
                Err::<bool, _>(anyhow::anyhow!("service down"))
            }))
            .on_rule_error(move |err| {
                let _ = err_tx.send(err.to_string());
            }),
    );

    validator.handle_input("x");
    let message = timeout(Duration::from_secs(1), err_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message, "Validation rule failed: service down");
    assert!(rx.try_recv().is_err());
    assert_eq!(validator.validity(), Validity::Unknown);
}

#[tokio::test]
async fn test_set_validity_overrides_pending() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.blur_rule(presets::digits()));

    validator.check_now("9").unwrap().await.unwrap();
    assert_eq!(rx.try_recv().unwrap(), Validity::Valid);

    validator.set_validity("username taken");
    assert_eq!(rx.try_recv().unwrap(), Validity::from("username taken"));

    // Same value again: the cached check returns the override
    let outcome = validator.check("9", false).unwrap().await.unwrap();
    assert_eq!(outcome, Validity::from("username taken"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_password_strength_custom_validity() {
    let (config, mut rx) = recording_config();
    let validator = FieldValidator::new(config.input_rule(presets::password_strength()));

    validator.handle_input("abc");
    assert_eq!(next_change(&mut rx).await, Validity::from(0u8));

    validator.handle_input("Abcdefg1!");
    assert_eq!(next_change(&mut rx).await, Validity::from(4u8));

    validator.handle_input("");
    assert_eq!(next_change(&mut rx).await, Validity::Unknown);
}

#[tokio::test]
async fn test_validator_from_settings() {
    let settings = ValidatorSettings::from_toml_str(
        r#"
            blur_preset = "email"
        "#,
    )
    .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = settings
        .into_config(move |validity: &Validity| {
            let _ = tx.send(validity.clone());
        })
        .unwrap();
    let validator = FieldValidator::new(config);

    let outcome = validator.check_now("user@example.com").unwrap().await.unwrap();
    assert_eq!(outcome, Validity::Valid);
    assert_eq!(rx.try_recv().unwrap(), Validity::Valid);
}
