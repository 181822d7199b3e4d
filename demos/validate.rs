//! Validating event streams against the document grammar.
//!
//! Run with: cargo run --example validate

use concise_encoding::{
    validate_events, validate_events_with_options, ArrayType, Event, EventReceiver, NullReceiver,
    RuleOptions, Rules,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // A map with one string key, split across two chunks.
    let good = vec![
        Event::Version(1),
        Event::Map,
        Event::ArrayBegin(ArrayType::String),
        Event::ArrayChunk { length: 3, is_final: false },
        Event::ArrayData(b"gre".to_vec()),
        Event::ArrayChunk { length: 5, is_final: true },
        Event::ArrayData(b"eting".to_vec()),
        Event::Bool(true),
        Event::End,
        Event::EndDocument,
    ];
    validate_events(&good)?;
    println!("well-formed document: ok");

    let cases: Vec<(&str, Vec<Event>)> = vec![
        (
            "key without value",
            vec![Event::Version(1), Event::Map, Event::Bool(true), Event::End],
        ),
        (
            "float as map key",
            vec![Event::Version(1), Event::Map, Event::Float(0.5)],
        ),
        (
            "under-filled array",
            vec![
                Event::Version(1),
                Event::ArrayBegin(ArrayType::Bytes),
                Event::ArrayChunk { length: 5, is_final: true },
                Event::ArrayData(vec![1, 2, 3, 4]),
                Event::EndDocument,
            ],
        ),
        (
            "reference before marker",
            vec![
                Event::Version(1),
                Event::List,
                Event::Reference,
                Event::PositiveInt(1),
            ],
        ),
    ];
    for (name, events) in cases {
        match validate_events(&events) {
            Ok(()) => println!("{}: unexpectedly accepted", name),
            Err(e) => println!("{}: {}", name, e),
        }
    }

    // Limits are checked as soon as the quantity is known.
    let options = RuleOptions::new().with_max_container_depth(2);
    let deep = vec![Event::Version(1), Event::List, Event::List, Event::List];
    if let Err(e) = validate_events_with_options(&deep, options) {
        println!("depth limit: {}", e);
    }

    // Driving the rules directly, one event at a time.
    let mut rules = Rules::new(NullReceiver, RuleOptions::default());
    rules.on_version(1)?;
    rules.on_comment()?;
    if let Err(e) = rules.on_string("comments may not contain \u{7}") {
        println!("comment text: {}", e);
    }
    Ok(())
}
