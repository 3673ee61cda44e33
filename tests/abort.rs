mod util;
use superstep::prelude::*;
use util::*;

#[test]
fn failure_in_superstep_k_leaves_memory_at_k_minus_one() {
    let mut run = GraphComputer::new(InMemoryGraph::with_vertices(8))
        .program(FailingProgram {
            victim: vid(5),
            at: 2,
        })
        .workers(4)
        .start()
        .unwrap();

    assert_eq!(run.step().unwrap(), StepOutcome::Continue);
    assert_eq!(run.step().unwrap(), StepOutcome::Continue);
    assert_eq!(run.memory().get_integer("count").unwrap(), 16);

    let err = run.step().unwrap_err();
    match &err {
        ComputeError::Vertex {
            vertex, superstep, ..
        } => {
            assert_eq!(*vertex, vid(5));
            assert_eq!(*superstep, 2);
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(err.to_string().contains("superstep 2"), "{err}");
    assert_eq!(run.phase(), RunPhase::Failed);
    // Partial writes of superstep 2 are gone.
    assert_eq!(run.memory().get_integer("count").unwrap(), 16);
    assert_eq!(run.memory().iteration(), 2);
    assert!(!run.memory().is_complete());

    assert!(matches!(
        run.step(),
        Err(ComputeError::InvalidPhase {
            phase: RunPhase::Failed,
            ..
        })
    ));
}

#[test]
fn failure_at_superstep_zero_commits_nothing() {
    let err = GraphComputer::new(InMemoryGraph::with_vertices(3))
        .program(FailingProgram { victim: vid(0), at: 0 })
        .map_reduce(CountMapReduce::new().with_memory_key("vertices"))
        .submit()
        .err()
        .expect("run must fail");
    let source = match err {
        ComputeError::Vertex { source, .. } => source,
        other => panic!("unexpected error {other}"),
    };
    assert!(source.downcast_ref::<GaveUp>().is_some());
}

#[test]
fn setup_failure_is_reported_as_setup() {
    struct BadSetup;
    impl VertexProgram for BadSetup {
        type Message = ();
        fn setup(&self, memory: &Memory) -> Result<(), BoxError> {
            memory.set("nope", 1i64)?;
            Ok(())
        }
        fn execute(&self, _v: &mut Vertex, _ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
            Ok(())
        }
        fn terminate(&self, _memory: &Memory) -> Result<bool, BoxError> {
            Ok(true)
        }
    }
    let err = GraphComputer::new(InMemoryGraph::with_vertices(1))
        .program(BadSetup)
        .start()
        .err()
        .expect("setup must fail");
    assert!(matches!(err, ComputeError::Setup { .. }), "{err}");
}

#[test]
fn terminate_failure_aborts_after_barrier() {
    struct BadTerminate;
    impl VertexProgram for BadTerminate {
        type Message = ();
        fn memory_keys(&self) -> Vec<MemoryKey> {
            vec![MemoryKey::integer("n")]
        }
        fn execute(&self, _v: &mut Vertex, ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
            ctx.memory().incr("n", 1)?;
            Ok(())
        }
        fn terminate(&self, memory: &Memory) -> Result<bool, BoxError> {
            memory.get_boolean("missing")?;
            Ok(false)
        }
    }
    let mut run = GraphComputer::new(InMemoryGraph::with_vertices(2))
        .program(BadTerminate)
        .start()
        .unwrap();
    let err = run.step().unwrap_err();
    assert!(matches!(err, ComputeError::Terminate { superstep: 0, .. }), "{err}");
    assert_eq!(run.phase(), RunPhase::Failed);
    assert_eq!(run.memory().get_integer("n").unwrap(), 2);
}

#[test]
fn failing_job_aborts_finish() {
    #[derive(Clone)]
    struct Broken;
    impl MapReduce for Broken {
        type MapKey = ();
        type MapValue = i64;
        type ReduceKey = ();
        type ReduceValue = i64;
        type Output = i64;
        fn memory_key(&self) -> &str {
            "broken"
        }
        fn do_stage(&self, _stage: Stage) -> bool {
            true
        }
        fn map(&self, v: &Vertex, e: &mut MapEmitter<(), i64>) -> Result<(), BoxError> {
            if v.id() == vid(2) {
                return Err("bad vertex".into());
            }
            e.emit((), 1);
            Ok(())
        }
        fn finalize(&self, r: Vec<KeyValue<(), i64>>) -> Result<i64, ProtocolViolation> {
            Ok(r.len() as i64)
        }
    }
    let err = GraphComputer::new(InMemoryGraph::with_vertices(4))
        .map_reduce(Broken)
        .submit()
        .err()
        .expect("job must fail");
    assert!(
        matches!(err, ComputeError::MapReduce { stage: Stage::Map, .. }),
        "{err}"
    );
}

#[test]
fn failed_superstep_restores_vertex_state() {
    struct Stamping;
    impl VertexProgram for Stamping {
        type Message = ();
        fn memory_keys(&self) -> Vec<MemoryKey> {
            vec![MemoryKey::integer("count")]
        }
        fn execute(&self, v: &mut Vertex, ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
            ctx.memory().incr("count", 1)?;
            v.set_property("stamp", ctx.iteration() as i64);
            if ctx.iteration() == 1 {
                v.vote_to_halt();
                if v.id() == vid(7) {
                    return Err(Box::new(GaveUp));
                }
            }
            Ok(())
        }
        fn terminate(&self, _memory: &Memory) -> Result<bool, BoxError> {
            Ok(false)
        }
    }
    // One worker runs vertices in order, so 0..=6 write before 7 fails.
    let mut run = GraphComputer::new(InMemoryGraph::with_vertices(8))
        .program(Stamping)
        .workers(1)
        .start()
        .unwrap();
    assert_eq!(run.step().unwrap(), StepOutcome::Continue);
    assert!(matches!(
        run.step(),
        Err(ComputeError::Vertex { superstep: 1, .. })
    ));
    assert_eq!(run.memory().get_integer("count").unwrap(), 8);
    for v in run.graph().vertices() {
        let stamp = v.property("stamp").and_then(PropertyValue::as_i64);
        assert_eq!(stamp, Some(0), "vertex {}", v.id());
        assert!(!v.is_halted(), "vertex {}", v.id());
    }
}
