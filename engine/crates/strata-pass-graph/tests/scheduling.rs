mod common;

use common::{BufferDesc, BufferPool, record, timeline};
use strata_crate_tools::init_log::init_test_log;
use strata_pass_graph::{FrameGraph, GraphError};

#[test]
fn test_chain_acquire_release_timing() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut graph = FrameGraph::<BufferPool>::new();

    let mut p1 = graph.add_pass("p1");
    let r0 = p1.creates_internal("r", BufferDesc::new("r", 4));
    p1.executes(record(&timeline, "p1"));

    let mut p2 = graph.add_pass("p2");
    let r1 = p2.reads_and_writes(r0).unwrap();
    p2.executes(record(&timeline, "p2"));

    let mut p3 = graph.add_pass("p3");
    p3.reads(r1).unwrap();
    p3.disable_culling();
    p3.executes(record(&timeline, "p3"));

    graph.execute(&mut pool).unwrap();

    assert_eq!(*timeline.borrow(), vec!["acquire r", "run p1", "run p2", "run p3", "release r"]);
    assert_eq!(pool.live, 0);
}

#[test]
fn test_unused_creator_never_runs() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut graph = FrameGraph::<BufferPool>::new();

    let mut unused = graph.add_pass("unused");
    unused.creates_internal("u", BufferDesc::new("u", 1));
    unused.executes(record(&timeline, "unused"));

    let mut kept = graph.add_pass("kept");
    kept.disable_culling();
    kept.executes(record(&timeline, "kept"));

    let plan = graph.compile().unwrap();
    assert_eq!(plan.culled().len(), 1);
    assert_eq!(graph.passes()[plan.culled()[0].index()].name(), "unused");

    graph.execute(&mut pool).unwrap();
    assert_eq!(*timeline.borrow(), vec!["run kept"]);
}

#[test]
fn test_explicit_requires_keeps_pass() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut graph = FrameGraph::<BufferPool>::new();

    // 两个 Pass 都不涉及任何资源，只有显式依赖能让 side 保留下来
    let mut side = graph.add_pass("side");
    side.executes(record(&timeline, "side"));
    let side = side.id();

    let mut orphan = graph.add_pass("orphan");
    orphan.executes(record(&timeline, "orphan"));
    let orphan = orphan.id();

    let mut sink = graph.add_pass("sink");
    sink.requires(side).unwrap();
    sink.disable_culling();
    sink.executes(record(&timeline, "sink"));

    let plan = graph.compile().unwrap();
    assert_eq!(plan.culled(), &[orphan]);

    graph.execute(&mut pool).unwrap();
    assert_eq!(*timeline.borrow(), vec!["run side", "run sink"]);
}

#[test]
fn test_external_output_is_retained() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut swapchain = vec![0u32; 2];
    let mut graph = FrameGraph::<BufferPool>::new();
    let target = graph.import_external("swapchain", &mut swapchain);

    // 没有任何 graph 内的读取者
    let mut output = graph.add_pass("output");
    let target = output.reads_and_writes(target).unwrap();
    output.executes(move |ctx| {
        ctx.get_mut(target)?.fill(7);
        Ok(())
    });

    graph.execute(&mut pool).unwrap();
    assert_eq!(swapchain, vec![7, 7]);
    assert!(timeline.borrow().is_empty());
}

#[test]
fn test_cycle_aborts_before_any_body() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut graph = FrameGraph::<BufferPool>::new();

    let mut a = graph.add_pass("a");
    let r0 = a.creates_internal("r", BufferDesc::new("r", 1));
    let r1 = a.reads_and_writes(r0).unwrap();
    a.executes(record(&timeline, "a"));
    let a = a.id();

    let mut b = graph.add_pass("b");
    b.reads(r1).unwrap();
    b.disable_culling();
    b.executes(record(&timeline, "b"));
    let b = b.id();

    graph.edit_pass(a).unwrap().requires(b).unwrap();

    match graph.execute(&mut pool) {
        Err(GraphError::CycleDetected { visiting, cycle }) => {
            assert!(visiting.contains(&"a".to_string()));
            assert!(visiting.contains(&"b".to_string()));
            assert_eq!(cycle.first(), cycle.last());
        }
        other => panic!("expected cycle, got {other:?}"),
    }
    assert!(timeline.borrow().is_empty());
}

#[test]
fn test_superseded_handle_rejected_at_build() {
    init_test_log();
    let mut graph = FrameGraph::<BufferPool>::new();

    let mut writer = graph.add_pass("writer");
    let r0 = writer.creates_internal("r", BufferDesc::new("r", 1));
    let r1 = writer.reads_and_writes(r0).unwrap();

    let mut late = graph.add_pass("late");
    match late.reads(r0) {
        Err(GraphError::StaleHandleUse { handle, superseded_by, .. }) => {
            assert_eq!(handle, r0);
            assert_eq!(superseded_by, r1);
        }
        other => panic!("expected stale handle, got {other:?}"),
    }
    assert!(matches!(late.reads_and_writes(r0), Err(GraphError::StaleHandleUse { .. })));
}

#[test]
fn test_superseded_handle_rejected_in_body() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut graph = FrameGraph::<BufferPool>::new();

    let r0 = graph.add_pass("p1").creates_internal("r", BufferDesc::new("r", 1));
    let r1 = graph.add_pass("p2").reads_and_writes(r0).unwrap();

    let mut p3 = graph.add_pass("p3");
    p3.reads(r1).unwrap();
    p3.disable_culling();
    // p2 执行完之后 r0 已经过期
    p3.executes(move |ctx| {
        ctx.get(r0)?;
        Ok(())
    });

    match graph.execute(&mut pool) {
        Err(GraphError::PassFailed { pass, source }) => {
            assert_eq!(pass, "p3");
            assert!(matches!(
                source.downcast_ref::<GraphError>(),
                Some(GraphError::StaleHandleUse { superseded_by, .. }) if *superseded_by == r1
            ));
        }
        other => panic!("expected PassFailed, got {other:?}"),
    }
}

#[test]
fn test_body_failure_aborts_remaining_passes() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut graph = FrameGraph::<BufferPool>::new();

    let mut first = graph.add_pass("first");
    let r = first.creates_internal("r", BufferDesc::new("r", 1));
    first.executes(|_| {
        anyhow::bail!("device lost");
    });

    let mut second = graph.add_pass("second");
    second.reads(r).unwrap();
    second.disable_culling();
    second.executes(record(&timeline, "second"));

    let err = graph.execute(&mut pool).unwrap_err();
    assert!(matches!(err, GraphError::PassFailed { ref pass, .. } if pass == "first"));
    assert_eq!(std::error::Error::source(&err).map(|e| e.to_string()), Some("device lost".to_string()));

    // 不做清理：r 已经 acquire，但不会再被 release
    assert_eq!(*timeline.borrow(), vec!["acquire r"]);
    assert_eq!(pool.live, 1);
}

#[test]
fn test_allocator_failure_aborts() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    pool.fail_on = Some("huge");
    let mut graph = FrameGraph::<BufferPool>::new();

    let mut pass = graph.add_pass("pass");
    pass.creates_internal("huge", BufferDesc::new("huge", 1 << 20));
    pass.disable_culling();
    pass.executes(record(&timeline, "pass"));

    match graph.execute(&mut pool) {
        Err(GraphError::AllocatorFailure { resource, source }) => {
            assert_eq!(resource, "huge");
            assert!(source.to_string().contains("huge"));
        }
        other => panic!("expected AllocatorFailure, got {other:?}"),
    }
    assert!(timeline.borrow().is_empty());
}

#[test]
fn test_reader_of_old_version_runs_before_writer() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut graph = FrameGraph::<BufferPool>::new();

    let r0 = graph.create_internal("history", BufferDesc::new("history", 1));

    // writer 的 id 更小，但它覆盖的版本还有其他读取者
    let mut writer = graph.add_pass("writer");
    writer.disable_culling();
    writer.executes(record(&timeline, "writer"));
    let writer = writer.id();

    let mut reader = graph.add_pass("reader");
    reader.reads(r0).unwrap();
    reader.disable_culling();
    reader.executes(record(&timeline, "reader"));

    graph.edit_pass(writer).unwrap().reads_and_writes(r0).unwrap();

    graph.execute(&mut pool).unwrap();
    assert_eq!(
        *timeline.borrow(),
        vec!["acquire history", "run reader", "run writer", "release history"]
    );
}

#[test]
fn test_late_reader_must_use_new_version() {
    init_test_log();
    let timeline = timeline();
    let mut pool = BufferPool::new(&timeline);
    let mut graph = FrameGraph::<BufferPool>::new();

    let r0 = graph.create_internal("history", BufferDesc::new("history", 1));

    let mut writer = graph.add_pass("writer");
    let r1 = writer.reads_and_writes(r0).unwrap();
    writer.executes(record(&timeline, "writer"));

    let mut reader = graph.add_pass("reader");
    reader.disable_culling();
    reader.executes(record(&timeline, "reader"));
    let reader = reader.id();

    assert!(matches!(
        graph.edit_pass(reader).unwrap().reads(r0),
        Err(GraphError::StaleHandleUse { .. })
    ));
    graph.edit_pass(reader).unwrap().reads(r1).unwrap();

    graph.execute(&mut pool).unwrap();
    assert_eq!(
        *timeline.borrow(),
        vec!["acquire history", "run writer", "run reader", "release history"]
    );
}
