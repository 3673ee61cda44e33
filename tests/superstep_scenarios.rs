mod util;
use std::sync::atomic::{AtomicUsize, Ordering};
use superstep::prelude::*;
use util::*;

/// Increments `count` at superstep 0 only and halts at superstep 1.
struct CountOnce;

impl VertexProgram for CountOnce {
    type Message = ();

    fn memory_keys(&self) -> Vec<MemoryKey> {
        vec![MemoryKey::integer("count")]
    }

    fn execute(&self, _v: &mut Vertex, ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
        if ctx.is_initial_iteration() {
            ctx.memory().incr("count", 1)?;
        }
        Ok(())
    }

    fn terminate(&self, memory: &Memory) -> Result<bool, BoxError> {
        Ok(memory.iteration() == 1)
    }
}

#[test]
fn five_vertices_count_to_five() {
    let result = GraphComputer::new(InMemoryGraph::with_vertices(5))
        .program(CountOnce)
        .submit()
        .expect("run succeeds");
    assert_eq!(result.memory.get_integer("count").unwrap(), 5);
    assert_eq!(result.memory.iteration(), 1);
    assert!(result.memory.is_complete());
}

#[test]
fn count_is_independent_of_worker_count() {
    for workers in [1, 2, 8] {
        let result = GraphComputer::new(ring(37))
            .program(CountingProgram { supersteps: 3 })
            .workers(workers)
            .submit()
            .unwrap();
        assert_eq!(result.memory.get_integer("count").unwrap(), 37 * 3);
    }
}

/// Every vertex halts immediately; termination is still checked each superstep.
struct HaltAll {
    checks: AtomicUsize,
}

impl VertexProgram for HaltAll {
    type Message = ();

    fn execute(&self, v: &mut Vertex, _ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
        v.vote_to_halt();
        Ok(())
    }

    fn terminate(&self, memory: &Memory) -> Result<bool, BoxError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(memory.iteration() == 3)
    }
}

#[test]
fn empty_active_set_still_checks_termination() {
    let mut run = GraphComputer::new(InMemoryGraph::with_vertices(4))
        .program(HaltAll {
            checks: AtomicUsize::new(0),
        })
        .start()
        .unwrap();
    run.run_to_halt().unwrap();
    assert_eq!(run.program().checks.load(Ordering::SeqCst), 4);
    assert!(run.graph().vertices().iter().all(Vertex::is_halted));
    assert_eq!(run.phase(), RunPhase::Halted);
}

#[test]
fn empty_graph_runs_to_termination() {
    let result = GraphComputer::new(InMemoryGraph::new())
        .program(CountingProgram { supersteps: 2 })
        .submit()
        .unwrap();
    assert!(matches!(
        result.memory.get("count"),
        Err(MemoryError::KeyNotFound(_))
    ));
    assert_eq!(result.memory.iteration(), 1);
}

/// Forwards a token along out-edges; only the holder stays active.
struct Token {
    hops: usize,
}

impl VertexProgram for Token {
    type Message = u64;

    fn memory_keys(&self) -> Vec<MemoryKey> {
        vec![MemoryKey::integer("visits")]
    }

    fn execute(&self, v: &mut Vertex, ctx: &VertexContext<'_, u64>) -> Result<(), BoxError> {
        let holding = if ctx.is_initial_iteration() {
            v.id() == vid(0)
        } else {
            !ctx.messages().is_empty()
        };
        if holding {
            ctx.memory().incr("visits", 1)?;
            let seen = ctx.messages().first().copied().unwrap_or(0) + 1;
            v.set_property("seen", seen as i64);
            ctx.send_all(v.out_edges(), seen);
        }
        v.vote_to_halt();
        Ok(())
    }

    fn terminate(&self, memory: &Memory) -> Result<bool, BoxError> {
        Ok(memory.iteration() + 1 >= self.hops)
    }
}

#[test]
fn messages_arrive_next_superstep_and_reactivate() {
    let result = GraphComputer::new(ring(4))
        .program(Token { hops: 6 })
        .submit()
        .unwrap();
    // One vertex holds the token per superstep.
    assert_eq!(result.memory.get_integer("visits").unwrap(), 6);
    let seen = |i: u64| {
        result
            .graph
            .vertex(vid(i))
            .and_then(|v| v.property("seen"))
            .and_then(PropertyValue::as_i64)
    };
    // Supersteps 0..=5 visit vertices 0,1,2,3,0,1.
    assert_eq!(seen(0), Some(5));
    assert_eq!(seen(1), Some(6));
    assert_eq!(seen(2), Some(3));
    assert_eq!(seen(3), Some(4));
}

/// Sends to a vertex that does not exist.
struct StraySender;

impl VertexProgram for StraySender {
    type Message = ();

    fn execute(&self, _v: &mut Vertex, ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
        ctx.send(vid(1_000), ());
        Ok(())
    }

    fn terminate(&self, memory: &Memory) -> Result<bool, BoxError> {
        Ok(memory.iteration() == 1)
    }
}

#[test]
fn messages_to_unknown_vertices_are_dropped() {
    let result = GraphComputer::new(InMemoryGraph::with_vertices(3))
        .program(StraySender)
        .submit();
    assert!(result.is_ok());
}

/// Seeds memory in setup.
struct Seeded;

impl VertexProgram for Seeded {
    type Message = ();

    fn memory_keys(&self) -> Vec<MemoryKey> {
        vec![MemoryKey::integer("base"), MemoryKey::integer("seen")]
    }

    fn setup(&self, memory: &Memory) -> Result<(), BoxError> {
        memory.set("base", 40i64)?;
        Ok(())
    }

    fn execute(&self, _v: &mut Vertex, ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
        let base = ctx.memory().get_integer("base")?;
        ctx.memory().set("seen", base + 2)?;
        Ok(())
    }

    fn terminate(&self, _memory: &Memory) -> Result<bool, BoxError> {
        Ok(true)
    }
}

#[test]
fn setup_writes_are_visible_at_superstep_zero() {
    let result = GraphComputer::new(InMemoryGraph::with_vertices(2))
        .program(Seeded)
        .submit()
        .unwrap();
    assert_eq!(result.memory.get_integer("seen").unwrap(), 42);
    assert_eq!(result.memory.iteration(), 0);
}

#[test]
fn superstep_limit_aborts_the_run() {
    let mut run = GraphComputer::new(InMemoryGraph::with_vertices(2))
        .program(CountingProgram { supersteps: 100 })
        .max_supersteps(3)
        .start()
        .unwrap();
    let err = run.run_to_halt().unwrap_err();
    assert!(matches!(err, ComputeError::SuperstepLimit(3)));
    assert_eq!(run.phase(), RunPhase::Failed);
    assert_eq!(run.memory().get_integer("count").unwrap(), 6);
}

#[test]
fn side_effect_keys_are_not_writable_during_execute() {
    struct WritesCount;
    impl VertexProgram for WritesCount {
        type Message = ();
        fn execute(&self, _v: &mut Vertex, ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
            ctx.memory().set("count", 1i64)?;
            Ok(())
        }
        fn terminate(&self, _memory: &Memory) -> Result<bool, BoxError> {
            Ok(true)
        }
    }
    let err = GraphComputer::new(InMemoryGraph::with_vertices(1))
        .program(WritesCount)
        .map_reduce(CountMapReduce::new())
        .submit()
        .err()
        .expect("write to a job key must fail");
    match err {
        ComputeError::Vertex { source, .. } => {
            let cause = source.downcast_ref::<MemoryError>().expect("memory error");
            assert_eq!(cause, &MemoryError::UnrecognizedKey("count".into()));
        }
        other => panic!("unexpected error {other}"),
    }
}
