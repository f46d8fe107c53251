// Simulates a signup form's username field: a live length check while typing
// and a (fake) server-side availability lookup when the field loses focus.
//
// Run with: cargo run -p rusty-field-validator --example field_demo

use rusty_field_validator::{presets, FieldValidator, InputOrdering, Rule, ValidatorConfig, Validity};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let availability = Rule::from_async(|name: String| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if name == "admin" {
            Ok::<_, anyhow::Error>(Validity::custom("Username is taken"))
        } else {
            Ok(Validity::Valid)
        }
    });

    let validator = FieldValidator::new(
        ValidatorConfig::new(|validity| println!("-> validity: {}", validity))
            .input_rule(presets::min_length(3))
            .blur_rule(availability)
            .input_ordering(InputOrdering::LatestWins)
            .on_rule_error(|err| eprintln!("rule error: {}", err)),
    );

    for typed in ["a", "ad", "adm", "admi", "admin"] {
        validator.handle_input(typed);
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    validator.handle_blur("admin");

    // Submit: wait for the full check and re-announce the result
    if let Some(pending) = validator.check_now("admin") {
        println!("submit blocked by: {}", pending.await?);
    }

    validator.handle_input("admin2");
    if let Some(pending) = validator.check_now("admin2") {
        println!("submit with: {}", pending.await?);
    }

    Ok(())
}
