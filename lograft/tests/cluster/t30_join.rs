use lograft::testing::ep;
use lograft::JoinController;
use lograft::QuorumDecision;
use lograft::RaftLog;
use lograft::ServerState;
use pretty_assertions::assert_eq;

use crate::fixtures::init_ut_tracing;
use crate::fixtures::Cluster;
use crate::fixtures::MAX_TICKS;

/// A new node asks a follower first, is rejected with the follower's view of the cluster and
/// retries through that view until the leader adds it.
#[test]
fn join_through_rejection() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut cluster = Cluster::new(&[1, 2, 3]);
    assert_eq!(QuorumDecision::Succeeded, cluster.elect(1)?);
    cluster.settle()?;
    cluster.run_until("node 2 configured", |c| c.node(2).state.configuration().entry().is_some())?;

    cluster.add_node(4, &[]);

    let mut join = JoinController::new();
    let mut rx = join.open_async(&ep(4), &[ep(2), ep(5)])?;

    tracing::info!("--- first attempt is rejected by node 2");
    {
        join.do_work(&mut cluster.node_mut(4).ctx());
        assert_eq!(ServerState::Joining, cluster.node(4).state.server_state());

        cluster.tick();
        join.do_work(&mut cluster.node_mut(4).ctx());

        assert_eq!(&[ep(1), ep(2), ep(3)], join.candidates().as_slice());
    }

    tracing::info!("--- retry until the leader answers");
    {
        for _ in 0..MAX_TICKS {
            if join.is_joined() || join.is_failed() {
                break;
            }
            cluster.tick();
            join.do_work(&mut cluster.node_mut(4).ctx());
        }

        assert!(join.is_joined(), "join state: {}", join.state());

        let configuration = rx.try_recv()??;
        assert!(configuration.contains(&ep(4)));
        assert_eq!(ServerState::Follower, cluster.node(4).state.server_state());
        assert_eq!(&configuration, cluster.node(4).state.configuration().as_ref());
    }

    tracing::info!("--- the leader replicates to the new member");
    {
        cluster.settle()?;

        let leader_last = cluster.node(1).log.appended_position();
        assert_eq!(leader_last, cluster.node(4).log.appended_position());
        assert!(cluster.leader_state.replication(&ep(4)).is_some());
    }

    Ok(())
}
