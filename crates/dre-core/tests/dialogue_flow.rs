use std::sync::{Arc, Mutex};

use dre_core::{
    DialogueRuntime, DreError, DreResult, ExecutionResult, MemoryVariableStorage, Program,
    ProgramBuilder, RuntimeConfig, Value, VariableStorage,
};
use pretty_assertions::assert_eq;

struct Fixture {
    runtime: DialogueRuntime,
    errors: Arc<Mutex<Vec<String>>>,
}

fn fixture(program: Program) -> Fixture {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let mut runtime = DialogueRuntime::new(MemoryVariableStorage::new());
    runtime.set_debug_handler(|_| {});
    runtime.set_error_handler(move |m| sink.lock().unwrap().push(m.to_string()));
    runtime.load_program(program);
    Fixture { runtime, errors }
}

fn run_all(runtime: &mut DialogueRuntime, start: &str) -> Vec<ExecutionResult> {
    runtime
        .run(Some(start))
        .expect("run failed")
        .collect::<DreResult<_>>()
        .expect("execution failed")
}

/// Pushes `visitCount`/`visited` for `node` (or the running node) into `var`
fn store_visit_query(
    n: dre_core::bytecode::NodeBuilder,
    function: &str,
    node: Option<&str>,
    var: &str,
) -> dre_core::bytecode::NodeBuilder {
    let n = match node {
        Some(name) => n.push_string(name).push_number(1.0),
        None => n.push_number(0.0),
    };
    n.call(function).store_variable(var)
}

fn two_lines() -> Program {
    ProgramBuilder::new("lines")
        .string("l1", "First")
        .string("l2", "Second")
        .node("Start", |n| n.line("l1").line("l2").stop())
        .build()
        .unwrap()
}

fn one_option(label: &str) -> Program {
    ProgramBuilder::new("choice")
        .string("o1", label)
        .node("Start", |n| {
            n.push_null()
                .option("o1", "only")
                .show_options()
                .jump()
                .label("only")
                .stop()
        })
        .build()
        .unwrap()
}

#[test]
fn start_to_end_completes_twice() {
    let program = ProgramBuilder::new("flow")
        .node("Start", |n| n.run_node("End"))
        .node("End", |n| n.stop())
        .build()
        .unwrap();
    let mut f = fixture(program);

    let results = run_all(&mut f.runtime, "Start");
    let next_nodes: Vec<Option<String>> = results
        .into_iter()
        .map(|r| match r {
            ExecutionResult::NodeComplete { next_node } => next_node,
            other => panic!("unexpected result: {:?}", other),
        })
        .collect();
    assert_eq!(next_nodes, vec![Some("End".to_string()), None]);
    assert_eq!(f.runtime.visit_counts().count("Start"), 1);
    assert_eq!(f.runtime.visit_counts().count("End"), 1);
    assert!(f.runtime.current_node_name().is_none());
}

#[test]
fn visits_accumulate_across_runs() {
    let program = ProgramBuilder::new("visits")
        .node("A", |n| n.stop())
        .node("Check", |n| {
            let n = store_visit_query(n, "visited", Some("A"), "$seen");
            store_visit_query(n, "visitCount", Some("A"), "$count").stop()
        })
        .build()
        .unwrap();
    let mut f = fixture(program);

    run_all(&mut f.runtime, "Check");
    assert_eq!(f.runtime.variable_storage().get_value("$seen"), Value::Bool(false));
    assert_eq!(f.runtime.variable_storage().get_value("$count"), Value::Number(0.0));

    run_all(&mut f.runtime, "A");
    run_all(&mut f.runtime, "Check");
    assert_eq!(f.runtime.variable_storage().get_value("$seen"), Value::Bool(true));
    assert_eq!(f.runtime.variable_storage().get_value("$count"), Value::Number(1.0));

    run_all(&mut f.runtime, "A");
    assert_eq!(f.runtime.visit_counts().count("A"), 2);
}

#[test]
fn implicit_visit_count_matches_named_node() {
    let program = ProgramBuilder::new("implicit")
        .node("A", |n| {
            let n = store_visit_query(n, "visitCount", None, "$implicit");
            store_visit_query(n, "visitCount", Some("A"), "$named").stop()
        })
        .build()
        .unwrap();
    let mut f = fixture(program);

    for _ in 0..3 {
        run_all(&mut f.runtime, "A");
        let storage = f.runtime.variable_storage();
        assert_eq!(storage.get_value("$implicit"), storage.get_value("$named"));
    }
    assert_eq!(f.runtime.variable_storage().get_value("$named"), Value::Number(2.0));
}

#[test]
fn unknown_nodes_do_not_exist_and_count_zero() {
    let program = ProgramBuilder::new("unknown")
        .node("Start", |n| store_visit_query(n, "visitCount", Some("Nowhere"), "$n").stop())
        .build()
        .unwrap();
    let mut f = fixture(program);

    assert!(!f.runtime.node_exists("Nowhere"));
    run_all(&mut f.runtime, "Start");
    assert_eq!(f.runtime.variable_storage().get_value("$n"), Value::Number(0.0));
    assert!(f.errors.lock().unwrap().iter().any(|e| e.contains("Nowhere")));
}

#[test]
fn stop_command_ends_the_run() {
    let program = ProgramBuilder::new("stop")
        .string("l1", "Before")
        .string("l2", "After")
        .node("Start", |n| n.line("l1").command("stop").line("l2").run_node("End"))
        .node("End", |n| n.stop())
        .build()
        .unwrap();
    let mut f = fixture(program);

    let results = run_all(&mut f.runtime, "Start");
    assert_eq!(results.len(), 2);
    match results.last() {
        Some(ExecutionResult::Command { text }) => assert_eq!(text, "stop"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(f.runtime.visit_counts().count("End"), 0);
}

#[test]
fn seeded_visits_read_back() {
    let program = ProgramBuilder::new("seed")
        .node("A", |n| n.stop())
        .build()
        .unwrap();
    let mut f = fixture(program);
    f.runtime.set_visited_node_names(["A", "B"]);

    let counts: Vec<(String, u32)> = f
        .runtime
        .visit_counts()
        .iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    assert_eq!(counts, vec![("A".to_string(), 1), ("B".to_string(), 1)]);
    assert_eq!(f.runtime.visited_node_names(), vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn options_block_until_chosen() {
    let program = ProgramBuilder::new("options")
        .string("o1", "Red")
        .string("o2", "Green")
        .string("o3", "Blue")
        .string("picked", "Picked green")
        .node("Start", |n| {
            n.option("o1", "red")
                .option("o2", "green")
                .option("o3", "blue")
                .show_options()
                .jump()
                .label("red")
                .stop()
                .label("green")
                .line("picked")
                .stop()
                .label("blue")
                .stop()
        })
        .build()
        .unwrap();
    let mut f = fixture(program);
    let mut run = f.runtime.run(None).unwrap();

    let choose = match run.next() {
        Some(Ok(ExecutionResult::Options { options, choose })) => {
            assert_eq!(options, vec!["Red", "Green", "Blue"]);
            choose
        }
        other => panic!("unexpected result: {:?}", other),
    };
    assert_eq!(choose.count(), 3);

    assert!(matches!(run.next(), Some(Err(DreError::OptionNotSelected))));
    assert!(matches!(
        choose.choose(3),
        Err(DreError::InvalidOptionIndex { index: 3, count: 3 })
    ));
    assert!(matches!(run.next(), Some(Err(DreError::OptionNotSelected))));

    choose.choose(1).unwrap();
    assert!(matches!(choose.choose(2), Err(DreError::OptionAlreadySelected)));

    match run.next() {
        Some(Ok(ExecutionResult::Line { text })) => assert_eq!(text, "Picked green"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(run.next(), Some(Ok(ExecutionResult::NodeComplete { next_node: None }))));
    assert!(run.next().is_none());
}

#[test]
fn jump_to_missing_node_is_an_error() {
    let program = ProgramBuilder::new("missing")
        .node("Start", |n| n.run_node("Elsewhere"))
        .build()
        .unwrap();
    let mut f = fixture(program);
    let mut run = f.runtime.run(None).unwrap();
    assert!(matches!(run.next(), Some(Err(DreError::UnknownNode(name))) if name == "Elsewhere"));
    assert!(run.next().is_none());
}

#[test]
fn run_requires_both_log_handlers() {
    let mut runtime = DialogueRuntime::new(MemoryVariableStorage::new());
    assert!(matches!(runtime.run(None), Err(DreError::MissingLogHandler("debug"))));
    runtime.set_debug_handler(|_| {});
    assert!(matches!(runtime.run(None), Err(DreError::MissingLogHandler("error"))));
    runtime.set_error_handler(|_| {});
    // No program: logged, and the run is empty
    assert!(runtime.run(None).unwrap().next().is_none());
}

#[test]
fn runtime_stop_ends_the_sequence_at_the_next_pull() {
    let mut f = fixture(two_lines());
    let mut run = f.runtime.run(None).unwrap();

    assert!(matches!(run.next(), Some(Ok(ExecutionResult::Line { .. }))));
    run.runtime().stop();
    run.runtime().stop();
    assert!(run.next().is_none());
    assert!(run.next().is_none());
    drop(run);
    assert_eq!(f.runtime.visit_counts().count("Start"), 0);
}

#[test]
fn stop_handle_and_run_stop_end_the_sequence() {
    let mut f = fixture(two_lines());
    let handle = f.runtime.stop_handle();

    let mut run = f.runtime.run(None).unwrap();
    assert!(run.next().is_some());
    handle.stop();
    assert!(run.next().is_none());
    drop(run);

    let mut run = f.runtime.run(None).unwrap();
    assert!(run.next().is_some());
    run.stop();
    assert!(run.is_finished());
    assert!(run.current_node_name().is_none());
    assert!(run.next().is_none());
}

#[test]
fn stop_without_a_run_does_not_affect_the_next_run() {
    let mut f = fixture(two_lines());
    f.runtime.stop();
    f.runtime.stop();

    let results = run_all(&mut f.runtime, "Start");
    assert_eq!(results.len(), 3);
    assert!(results[2].is_node_complete());
}

#[test]
fn stop_while_options_are_pending() {
    let mut f = fixture(one_option("Only"));
    let mut run = f.runtime.run(None).unwrap();

    let choose = match run.next() {
        Some(Ok(ExecutionResult::Options { choose, .. })) => choose,
        other => panic!("unexpected result: {:?}", other),
    };
    run.runtime().stop();
    assert!(run.next().is_none());

    // A late choice changes nothing
    choose.choose(0).unwrap();
    assert!(run.next().is_none());
}

#[test]
fn failed_selection_ends_the_run() {
    let config = RuntimeConfig {
        max_stack_size: 1,
        ..RuntimeConfig::default()
    };
    let mut runtime = DialogueRuntime::with_config(MemoryVariableStorage::new(), config);
    runtime.set_debug_handler(|_| {});
    runtime.set_error_handler(|_| {});
    runtime.load_program(one_option("Only"));
    let mut run = runtime.run(None).unwrap();

    match run.next() {
        Some(Ok(ExecutionResult::Options { choose, .. })) => choose.choose(0).unwrap(),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(run.next(), Some(Err(DreError::StackOverflow))));
    assert!(run.next().is_none());
}
