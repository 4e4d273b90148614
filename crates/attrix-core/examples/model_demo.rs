//! Model Lifecycle Demonstration
//!
//! Walks one model through the main features of attrix-core.
//!
//! Key concepts illustrated:
//! 1. Typed per-attribute and coarse change events
//! 2. Atomic validation
//! 3. Optimistic vs wait saves against a deferred transport
//! 4. Configuration loaded from TOML

use attrix_core::logging_facility::{init, Profile};
use attrix_core::{
    Attributes, MemoryTransport, Model, ModelConfig, ModelEvent, Options, Topic, TransportError,
    ValidationError,
};
use std::rc::Rc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let profile = std::env::var("ATTRIX_LOG_PROFILE")
        .unwrap_or_else(|_| "development".to_string())
        .parse::<Profile>()?;
    init(profile);

    println!("=== Attrix Model Demo ===\n");

    // ===== Part 1: Configuration and construction =====
    println!("## Part 1: Construction\n");

    let config = ModelConfig::from_toml_str(
        r#"
        url_root = "/api/notes"

        [defaults]
        title = "untitled"
        done = false
        "#,
    )?;
    let backend = Rc::new(MemoryTransport::deferred());
    let note = Model::builder()
        .config(config)
        .transport(backend.clone())
        .validator(|attrs: &Attributes| match attrs.get("title") {
            Some(title) if title == "" => {
                Err(ValidationError::for_attribute("title", "must not be empty"))
            }
            _ => Ok(()),
        })
        .build()?;
    println!("Created {} with {}", note.client_id(), note.to_json());

    note.on(Topic::AnyAttribute, |_, event| {
        if let ModelEvent::AttributeChanged { attr, value } = event {
            println!("  changed:{attr} -> {value:?}");
        }
    });
    note.on(Topic::Changed, |m, _| {
        println!("  changed (all: {:?})", m.changed_attributes());
    });
    note.on(Topic::Error, |_, event| println!("  error: {}", event.name()));
    note.on(Topic::Synced, |_, event| println!("  {}", event.name()));

    // ===== Part 2: Change events =====
    println!("\n## Part 2: Change events\n");

    note.set(
        Attributes::new().with("title", "Groceries").with("done", true),
        &Options::new(),
    )?;
    println!("previous title: {:?}", note.previous("title"));

    // ===== Part 3: Validation =====
    println!("\n## Part 3: Validation\n");

    if let Err(err) = note.set_attr("title", "", &Options::new()) {
        println!("rejected: {err}");
    }
    println!("title still {:?}", note.get("title"));

    // ===== Part 4: Persistence =====
    println!("\n## Part 4: Persistence\n");

    note.save(None, Options::new())?;
    println!("in flight: {}", backend.in_flight());
    backend.complete_all();
    println!("saved at {}", note.url()?);

    note.save_attr("title", "Groceries (weekly)", Options::new().wait())?;
    println!("waiting, title is {:?}", note.get("title"));
    backend.complete_all();
    println!("confirmed, title is {:?}", note.get("title"));

    backend.fail_next(TransportError::with_status(503, "maintenance"));
    note.save_attr("done", false, Options::new().wait())?;
    backend.complete_all();
    println!("after failed save, done is {:?}", note.get("done"));

    note.destroy(Options::new().wait())?;
    backend.complete_all();
    println!("records left: {}", backend.record_count());

    Ok(())
}
