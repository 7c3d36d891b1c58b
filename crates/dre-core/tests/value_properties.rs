//! Property-based tests for value comparison and the operator table

use dre_core::runtime::{Logger, VisitCounter};
use dre_core::{FunctionContext, Library, Operator, Value};
use proptest::prelude::*;

/// Strategy for generating values of every tag
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<f64>().prop_map(Value::Number),
        // Small ranges so equal pairs actually show up
        (-3i32..3).prop_map(Value::from),
        "[a-c0-2]{0,2}".prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

fn invoke(
    library: &Library,
    operator: Operator,
    args: &[Value],
) -> Result<Value, dre_core::DreError> {
    let visits = VisitCounter::new();
    let logger = Logger::default();
    let ctx = FunctionContext {
        current_node: None,
        program: None,
        visits: &visits,
        logger: &logger,
    };
    library.invoke(operator.name(), &ctx, args)
}

proptest! {
    /// NotEqualTo is the negation of EqualTo for every pair, mixed tags included
    #[test]
    fn not_equal_negates_equal(a in value_strategy(), b in value_strategy()) {
        let library = Library::new();
        let args = [a, b];
        let equal = invoke(&library, Operator::EqualTo, &args).unwrap();
        let not_equal = invoke(&library, Operator::NotEqualTo, &args).unwrap();
        prop_assert_eq!(not_equal, Value::Bool(!equal.as_bool()));
    }

    /// Equality is symmetric
    #[test]
    fn equality_is_symmetric(a in value_strategy(), b in value_strategy()) {
        prop_assert_eq!(a.equals(&b), b.equals(&a));
    }

    /// Arithmetic never panics; it either yields a number or a typed error
    #[test]
    fn arithmetic_is_total(a in value_strategy(), b in value_strategy()) {
        let library = Library::new();
        let arithmetic = [
            Operator::Add,
            Operator::Minus,
            Operator::Multiply,
            Operator::Divide,
            Operator::Modulo,
        ];
        for operator in arithmetic {
            if let Ok(result) = invoke(&library, operator, &[a.clone(), b.clone()]) {
                let is_number_or_text = matches!(result, Value::Number(_) | Value::String(_));
                prop_assert!(is_number_or_text);
            }
        }
    }
}
