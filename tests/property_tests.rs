//! Property-based tests for the guarantees the rules make about any stream:
//! valid documents pass through untouched, chunking is invisible downstream,
//! and structural mistakes fail at the exact offending event.

use concise_encoding::{
    from_events, to_events, validate_events_with_options, ArrayType, Event, EventRecorder, Key,
    RuleOptions, Rules, Value,
};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z ]{0,12}".prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..6).prop_map(|entries| {
                Value::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (Key::from(k), v))
                        .collect(),
                )
            }),
        ]
    })
}

/// Splits `data` into chunks at the given cut points.
fn chunked(kind: ArrayType, data: &[u8], cuts: &[usize]) -> Vec<Event> {
    let mut bounds: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
    bounds.push(0);
    bounds.push(data.len());
    bounds.sort_unstable();
    bounds.dedup();

    let mut events = vec![Event::Version(1), Event::ArrayBegin(kind)];
    if data.is_empty() {
        events.push(Event::ArrayChunk {
            length: 0,
            is_final: true,
        });
    }
    for (i, pair) in bounds.windows(2).enumerate() {
        let chunk = &data[pair[0]..pair[1]];
        events.push(Event::ArrayChunk {
            length: chunk.len(),
            is_final: i + 2 == bounds.len(),
        });
        // Split each chunk's data once more, possibly inside a code point.
        let mid = chunk.len() / 2;
        for part in [&chunk[..mid], &chunk[mid..]] {
            if !part.is_empty() {
                events.push(Event::ArrayData(part.to_vec()));
            }
        }
    }
    events.push(Event::EndDocument);
    events
}

fn nested_lists(depth: usize) -> Vec<Event> {
    let mut events = vec![Event::Version(1)];
    events.extend(std::iter::repeat(Event::List).take(depth));
    events.push(Event::Nil);
    events.extend(std::iter::repeat(Event::End).take(depth));
    events.push(Event::EndDocument);
    events
}

fn first_failure(events: &[Event]) -> Option<usize> {
    let mut rules = Rules::new(EventRecorder::new(), RuleOptions::default());
    events
        .iter()
        .position(|event| event.dispatch(&mut rules).is_err())
}

proptest! {
    #[test]
    fn prop_valid_documents_forwarded_unchanged(value in value()) {
        let events = to_events(&value).unwrap();
        let mut rules = Rules::new(EventRecorder::new(), RuleOptions::default());
        for event in &events {
            event.dispatch(&mut rules).unwrap();
        }
        prop_assert!(rules.is_document_complete());
        let recorder = rules.into_inner();
        prop_assert_eq!(recorder.events(), events.as_slice());
    }

    #[test]
    fn prop_chunking_invisible_for_bytes(
        data in prop::collection::vec(any::<u8>(), 0..64),
        cuts in prop::collection::vec(any::<usize>(), 0..6),
    ) {
        let whole = from_events(&chunked(ArrayType::Bytes, &data, &[])).unwrap();
        let split = from_events(&chunked(ArrayType::Bytes, &data, &cuts)).unwrap();
        prop_assert_eq!(&whole, &split);
        prop_assert_eq!(split, Value::Bytes(data));
    }

    #[test]
    fn prop_chunking_invisible_for_strings(
        text in any::<String>(),
        cuts in prop::collection::vec(any::<usize>(), 0..6),
    ) {
        let split = from_events(&chunked(ArrayType::String, text.as_bytes(), &cuts)).unwrap();
        prop_assert_eq!(split, Value::from(text));
    }

    #[test]
    fn prop_reset_is_idempotent(value in value()) {
        let events = to_events(&value).unwrap();
        let mut rules = Rules::new(EventRecorder::new(), RuleOptions::default());
        let mut runs = Vec::new();
        for _ in 0..2 {
            rules.reset();
            rules.receiver_mut().clear();
            for event in &events {
                event.dispatch(&mut rules).unwrap();
            }
            runs.push(rules.receiver().events().to_vec());
        }
        prop_assert_eq!(&runs[0], &runs[1]);
    }

    #[test]
    fn prop_depth_boundary(depth in 1usize..64) {
        let options = RuleOptions::new().with_max_container_depth(depth);
        prop_assert!(validate_events_with_options(&nested_lists(depth), options.clone()).is_ok());
        prop_assert!(validate_events_with_options(&nested_lists(depth + 1), options).is_err());
    }

    #[test]
    fn prop_extra_end_fails_immediately(depth in 1usize..16, at in 0usize..16) {
        let mut events = nested_lists(depth);
        // Wherever it is inserted, the surplus End is the one after the outermost close.
        let first_end = depth + 2;
        events.insert(first_end + at % (depth + 1), Event::End);
        prop_assert_eq!(first_failure(&events), Some(first_end + depth));
    }

    #[test]
    fn prop_missing_end_fails_at_end_document(depth in 1usize..16, at in 0usize..16) {
        let mut events = nested_lists(depth);
        events.remove(depth + 2 + at % depth);
        prop_assert_eq!(first_failure(&events), Some(events.len() - 1));
    }
}
