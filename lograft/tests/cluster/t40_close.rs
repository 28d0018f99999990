use lograft::testing::ep;
use lograft::JoinController;
use lograft::QuorumDecision;
use pretty_assertions::assert_eq;

use crate::fixtures::init_ut_tracing;
use crate::fixtures::Cluster;

/// Closing is idempotent and cancels the requests in flight.
#[test]
fn close_is_idempotent() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut cluster = Cluster::new(&[1, 2, 3]);
    assert_eq!(QuorumDecision::Succeeded, cluster.elect(1)?);
    cluster.settle()?;

    tracing::info!("--- close the leader twice");
    {
        let leader = &mut cluster.leader_state;
        leader.close();
        leader.close();

        let node = cluster.nodes.get_mut(&ep(1)).expect("leader node");
        leader.do_work(&mut node.ctx());
        assert!(leader.is_closed());
        assert!(leader.replication_targets().is_empty());

        leader.close_forcibly(&mut node.ctx());
        assert!(leader.is_closed());
        assert_eq!(0, leader.do_work(&mut node.ctx()));
    }

    tracing::info!("--- closing a join drops its request and resolves its handle");
    {
        cluster.add_node(4, &[]);

        let mut join = JoinController::new();
        let mut rx = join.open_async(&ep(4), &[ep(1)])?;
        join.do_work(&mut cluster.node_mut(4).ctx());

        let sent = cluster.node_mut(4).network.joins.pop_front().expect("join request sent");

        join.close();
        join.close();
        join.do_work(&mut cluster.node_mut(4).ctx());

        assert!(join.is_closed());
        assert!(sent.responder.is_closed());
        assert!(rx.try_recv()?.is_err());
    }

    Ok(())
}
