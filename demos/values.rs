//! Building values and turning them into event streams.
//!
//! Run with: cargo run --example values

use concise_encoding::{from_events, to_events, Event, Identifier, Key, Value, ValueMap};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let author = Identifier::String("author".to_string());
    let document = Value::from(ValueMap::from([
        (
            Key::from("created_by"),
            Value::Marker {
                id: author.clone(),
                value: Box::new(Value::from(ValueMap::from([
                    (Key::from("name"), Value::from("Alice")),
                    (Key::from("id"), Value::from(42)),
                ]))),
            },
        ),
        (Key::from("edited_by"), Value::Reference(author)),
        (
            Key::from("body"),
            Value::Markup {
                name: Key::from("p"),
                attributes: ValueMap::new(),
                contents: vec![Value::from("Hello, world")],
            },
        ),
    ]));

    let events = to_events(&document)?;
    println!("{} events:", events.len());
    for event in &events {
        match event {
            Event::ArrayData(data) => println!("  ArrayData({:?})", String::from_utf8_lossy(data)),
            other => println!("  {:?}", other),
        }
    }

    let rebuilt = from_events(&events)?;
    assert_eq!(rebuilt, document);

    if let Some(Value::Reference(id)) = rebuilt.get(&Key::from("edited_by")) {
        println!("edited_by refers to marker '{}'", id);
    }
    Ok(())
}
