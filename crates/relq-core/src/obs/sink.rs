use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

///
/// ObsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum ObsEvent {
    FilterCompiled { nodes: usize },
    OrderingCompiled { terms: usize, joins: usize },
    IncludeResolved { paths: usize },
    SerializeFinished { entities: usize, relations: usize },
}

///
/// ObsSink
///

pub trait ObsSink {
    fn record(&self, event: ObsEvent);
}

///
/// CounterSink
/// Default sink writing into the thread-local counter state; active when no
/// scoped override is installed.
///

struct CounterSink;

impl ObsSink for CounterSink {
    fn record(&self, event: ObsEvent) {
        metrics::with_state_mut(|counters| match event {
            ObsEvent::FilterCompiled { nodes } => {
                counters.filters_compiled = counters.filters_compiled.saturating_add(1);
                counters.filter_nodes = counters.filter_nodes.saturating_add(nodes as u64);
            }
            ObsEvent::OrderingCompiled { terms, joins } => {
                counters.orderings_compiled = counters.orderings_compiled.saturating_add(1);
                counters.order_terms = counters.order_terms.saturating_add(terms as u64);
                counters.order_joins = counters.order_joins.saturating_add(joins as u64);
            }
            ObsEvent::IncludeResolved { paths } => {
                counters.includes_resolved = counters.includes_resolved.saturating_add(1);
                counters.include_paths = counters.include_paths.saturating_add(paths as u64);
            }
            ObsEvent::SerializeFinished {
                entities,
                relations,
            } => {
                counters.serialize_calls = counters.serialize_calls.saturating_add(1);
                counters.entities_serialized =
                    counters.entities_serialized.saturating_add(entities as u64);
                counters.relations_serialized = counters
                    .relations_serialized
                    .saturating_add(relations as u64);
            }
        });
    }
}

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn ObsSink>>> = const { RefCell::new(None) };
}

pub(crate) fn record(event: ObsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => CounterSink.record(event),
    }
}

/// Run a closure with a temporary sink override. The previous override is
/// restored on all exits, including unwind.
pub fn with_obs_sink<T>(sink: Rc<dyn ObsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn ObsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0.take();
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    struct CountingSink {
        calls: Rc<Cell<usize>>,
    }

    impl ObsSink for CountingSink {
        fn record(&self, _: ObsEvent) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn override_routes_and_restores() {
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::new(CountingSink {
            calls: Rc::clone(&calls),
        });

        with_obs_sink(sink, || {
            record(ObsEvent::FilterCompiled { nodes: 1 });
            record(ObsEvent::IncludeResolved { paths: 2 });
        });
        assert_eq!(calls.get(), 2);

        // Override is gone; this event lands in the counters instead.
        metrics::reset_all();
        record(ObsEvent::FilterCompiled { nodes: 3 });
        assert_eq!(calls.get(), 2);
        assert_eq!(metrics::report().filter_nodes, 3);
    }

    #[test]
    fn override_restores_on_panic() {
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::new(CountingSink {
            calls: Rc::clone(&calls),
        });

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_obs_sink(sink, || {
                record(ObsEvent::FilterCompiled { nodes: 1 });
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();
        assert!(panicked);
        assert_eq!(calls.get(), 1);

        metrics::reset_all();
        record(ObsEvent::FilterCompiled { nodes: 1 });
        assert_eq!(calls.get(), 1);
        assert_eq!(metrics::report().filters_compiled, 1);
    }

    #[test]
    fn counters_accumulate_per_event_kind() {
        metrics::reset_all();

        record(ObsEvent::OrderingCompiled { terms: 2, joins: 1 });
        record(ObsEvent::SerializeFinished {
            entities: 5,
            relations: 2,
        });

        let counters = metrics::report();
        assert_eq!(counters.orderings_compiled, 1);
        assert_eq!(counters.order_terms, 2);
        assert_eq!(counters.order_joins, 1);
        assert_eq!(counters.serialize_calls, 1);
        assert_eq!(counters.entities_serialized, 5);
        assert_eq!(counters.relations_serialized, 2);
    }
}
