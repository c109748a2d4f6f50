//! Property-based tests for the engine's quantified invariants.

use proptest::prelude::*;

use sifter::{compile, json, run, run_streaming, Value};

/// Arbitrary finite JSON values, a few levels deep.
fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e9..1.0e9f64).prop_map(Value::Number),
        (-1000i64..1000).prop_map(|n| Value::Number(n as f64)),
        "[a-z0-9 _-]{0,8}".prop_map(Value::string),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z_]{1,6}", inner), 0..6)
                .prop_map(Value::object_from),
        ]
    })
}

/// Arbitrary scalar-only arrays (for sort, whose order within composite
/// types is implementation-defined).
fn arb_scalar_array() -> impl Strategy<Value = Value> {
    let scalar = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000.0..1000.0f64).prop_map(Value::Number),
        "[a-z]{0,5}".prop_map(Value::string),
    ];
    prop::collection::vec(scalar, 0..12).prop_map(Value::Array)
}

/// Filters drawn from the compilable subset.
fn arb_supported_filter() -> impl Strategy<Value = String> {
    let segment = prop_oneof![
        Just(".".to_string()),
        // The f_ prefix keeps generated names clear of keywords.
        "f_[a-z]{0,5}".prop_map(|f| format!(".{}", f)),
        (0i64..10).prop_map(|i| format!(".[{}]", i)),
        "[a-z_]{1,6}".prop_map(|k| format!(".[\"{}\"]", k)),
        Just(".[]".to_string()),
        (1i64..100).prop_map(|k| format!(". + {}", k)),
        Just("type".to_string()),
        Just("length".to_string()),
    ];
    prop::collection::vec(segment, 1..5).prop_map(|segments| segments.join(" | "))
}

proptest! {
    /// Serializing a value and re-parsing it yields an equal value.
    #[test]
    fn prop_round_trip(value in arb_value()) {
        let text = value.to_json();
        let reparsed = json::parse(&text).expect("serialized JSON must re-parse");
        prop_assert_eq!(reparsed, value);
    }

    /// `run(".", J)` reproduces the input exactly (modulo formatting, which
    /// to_json already normalizes).
    #[test]
    fn prop_identity(value in arb_value()) {
        let text = value.to_json();
        prop_assert_eq!(run(".", &text).unwrap(), text);
    }

    /// `.[]` on an array of length n yields exactly its n elements in order.
    #[test]
    fn prop_iteration_completeness(items in prop::collection::vec(arb_value(), 0..8)) {
        let array = Value::Array(items.clone());
        let outputs = run_streaming(".[]", &array.to_json()).unwrap();
        let expected: Vec<String> = items.iter().map(Value::to_json).collect();
        prop_assert_eq!(outputs, expected);
    }

    /// Field access never fails: it yields the field's value on objects
    /// that have it and null in every other case.
    #[test]
    fn prop_field_totality(value in arb_value(), field in "f_[a-z]{0,5}") {
        let filter = format!(".{}", field);
        let got = run(&filter, &value.to_json()).unwrap();
        let expected = match value.get_field(&field) {
            Some(v) => v.to_json(),
            None => "null".to_string(),
        };
        prop_assert_eq!(got, expected);
    }

    /// Everything compile() accepts passes Program::validate.
    #[test]
    fn prop_pool_integrity(filter in arb_supported_filter()) {
        let program = compile(&filter).unwrap();
        prop_assert_eq!(program.validate(), Ok(()));
    }

    /// sort(sort(A)) == sort(A).
    #[test]
    fn prop_sort_idempotent(array in arb_scalar_array()) {
        let text = array.to_json();
        let once = run("sort", &text).unwrap();
        let twice = run("sort | sort", &text).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// reverse(reverse(X)) == X for arrays.
    #[test]
    fn prop_reverse_involution_array(items in prop::collection::vec(arb_value(), 0..8)) {
        let array = Value::Array(items);
        let text = array.to_json();
        prop_assert_eq!(run("reverse | reverse", &text).unwrap(), text);
    }

    /// reverse(reverse(X)) == X for strings.
    #[test]
    fn prop_reverse_involution_string(s in "[a-z0-9 ]{0,16}") {
        let text = Value::string(s).to_json();
        prop_assert_eq!(run("reverse | reverse", &text).unwrap(), text);
    }

    /// Rebuilding an object from to_entries(O) yields O, key order intact.
    #[test]
    fn prop_to_entries_round_trip(
        pairs in prop::collection::vec(("[a-z_]{1,6}", arb_value()), 0..6)
    ) {
        let object = Value::object_from(pairs);
        let entries_json = run("to_entries", &object.to_json()).unwrap();
        let entries = json::parse(&entries_json).unwrap();

        let mut rebuilt = Vec::new();
        for entry in entries.as_array().unwrap() {
            let key = entry.get_field("key").unwrap().as_str().unwrap().to_string();
            let value = entry.get_field("value").unwrap().clone();
            rebuilt.push((key, value));
        }
        prop_assert_eq!(Value::object_from(rebuilt), object);
    }

    /// Two executions of the same filter against equal inputs produce
    /// equal output sequences.
    #[test]
    fn prop_determinism(value in arb_value(), filter in arb_supported_filter()) {
        let text = value.to_json();
        let first = run_streaming(&filter, &text);
        let second = run_streaming(&filter, &text);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            (a, b) => prop_assert!(false, "diverged: {:?} vs {:?}", a, b),
        }
    }
}

/// A manually assembled program with an out-of-range pool operand fails
/// validation naming the program counter.
#[test]
fn pool_integrity_rejects_bad_operands() {
    use sifter::{ConstantPool, Instruction, OpCode, Program, ValidateError};

    let program = Program {
        code: vec![
            Instruction::new(OpCode::LoadIdentity),
            Instruction::with_operand(OpCode::GetField, 7),
        ],
        pool: ConstantPool::default(),
    };
    let err = program.validate().unwrap_err();
    assert_eq!(err, ValidateError::StringPool { pc: 1 });
    assert_eq!(
        err.to_string(),
        "Invalid string pool index in instruction at pc=1"
    );

    let program = Program {
        code: vec![Instruction::with_operand(OpCode::AddConst, 0)],
        pool: ConstantPool::default(),
    };
    assert_eq!(
        program.validate().unwrap_err().to_string(),
        "Invalid number pool index in instruction at pc=0"
    );
}
