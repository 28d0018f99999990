use lograft::testing::ep;
use lograft::LeaveController;
use lograft::QuorumDecision;
use lograft::ServerState;
use pretty_assertions::assert_eq;

use crate::fixtures::init_ut_tracing;
use crate::fixtures::Cluster;
use crate::fixtures::MAX_TICKS;

/// A member leaves through the leader; the leader stops replicating to it.
#[test]
fn leave_through_leader() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut cluster = Cluster::new(&[1, 2, 3]);
    assert_eq!(QuorumDecision::Succeeded, cluster.elect(1)?);
    cluster.settle()?;

    let mut leave = LeaveController::new();
    let mut rx = leave.open_async(&ep(3), &[ep(2), ep(1), ep(3)])?;

    for _ in 0..MAX_TICKS {
        if leave.is_left() {
            break;
        }
        leave.do_work(&mut cluster.node_mut(3).ctx());
        cluster.tick();
    }
    leave.do_work(&mut cluster.node_mut(3).ctx());

    assert!(leave.is_left(), "leave state: {}", leave.state());
    assert_eq!(ServerState::Left, cluster.node(3).state.server_state());

    let configuration = rx.try_recv()??;
    assert!(!configuration.contains(&ep(3)));

    assert!(!cluster.node(1).state.configuration().contains(&ep(3)));
    assert_eq!(vec![ep(2)], cluster.leader_state.replication_targets());
    assert!(cluster.node(1).state.member(&ep(3)).is_none());

    Ok(())
}
