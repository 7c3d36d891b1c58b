//! Node visitation counters
//!
//! Counts completed executions per node and exposes them to scripts through
//! the `visitCount` and `visited` functions.

use indexmap::IndexMap;

use crate::library::{Arity, FunctionContext, Library};
use crate::value::Value;

/// Script function returning how often a node has completed
pub const VISIT_COUNT_FUNCTION: &str = "visitCount";

/// Script function returning whether a node has completed at least once
pub const VISITED_FUNCTION: &str = "visited";

/// Per-node completion counts. Counts only ever grow.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VisitCounter {
    counts: IndexMap<String, u32>,
}

impl VisitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, node: &str) -> u32 {
        self.counts.get(node).copied().unwrap_or(0)
    }

    /// Record one completion of `node`, returning the new count
    pub fn record(&mut self, node: &str) -> u32 {
        let count = self.counts.entry(node.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Replace all counts; every listed node starts at one visit
    pub fn replace_with<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.counts = nodes.into_iter().map(|n| (n.into(), 1)).collect();
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Register `visitCount` and `visited` in `library`
pub(crate) fn install(library: &mut Library) {
    library.register(VISIT_COUNT_FUNCTION, Arity::Variadic, |ctx, args| {
        Ok(Value::from(resolve_count(VISIT_COUNT_FUNCTION, ctx, args)))
    });
    library.register(VISITED_FUNCTION, Arity::Variadic, |ctx, args| {
        Ok(Value::from(resolve_count(VISITED_FUNCTION, ctx, args) > 0))
    });
}

/// No arguments means the running node. Anything unresolvable logs an
/// error and counts as zero.
fn resolve_count(function: &str, ctx: &FunctionContext<'_>, args: &[Value]) -> u32 {
    match args {
        [] => match ctx.current_node {
            Some(node) => ctx.visits.count(node),
            None => {
                ctx.logger.error(&format!("{}() called while no node is running", function));
                0
            }
        },
        [Value::String(node)] => {
            if ctx.node_exists(node) {
                ctx.visits.count(node)
            } else {
                ctx.logger.error(&format!("{}: no node named '{}'", function, node));
                0
            }
        }
        [other] => {
            ctx.logger.error(&format!(
                "{} expects a node name, got a {}",
                function,
                other.type_name()
            ));
            0
        }
        _ => {
            ctx.logger.error(&format!(
                "{} expects 0 or 1 arguments, got {}",
                function,
                args.len()
            ));
            0
        }
    }
}
