use lograft::testing::ep;
use lograft::EntryPayload;
use lograft::QuorumDecision;
use lograft::RaftLog;
use pretty_assertions::assert_eq;

use crate::fixtures::init_ut_tracing;
use crate::fixtures::Cluster;

/// Entries keep committing through a majority while one follower is unreachable; the follower
/// counts failures and catches up once it is reachable again.
#[test]
fn replication_retry_on_loss() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut cluster = Cluster::new(&[1, 2, 3]);
    assert_eq!(QuorumDecision::Succeeded, cluster.elect(1)?);
    cluster.settle()?;

    tracing::info!("--- node 3 becomes unreachable from the leader");
    {
        cluster.node_mut(1).network.set_unreachable(&ep(3), true);

        let term = cluster.node(1).state.term();
        for i in 0..3u8 {
            cluster.node_mut(1).log.try_write(term, EntryPayload::Normal(vec![i]))?;
        }

        cluster.run_until("commit through node 2", |c| c.node(1).state.commit_position() == Some(4))?;
        cluster.run_until("failures counted", |c| {
            c.node(1).state.member(&ep(3)).map(|m| m.failures()) >= Some(1)
        })?;

        assert_eq!(Some(4), cluster.node(2).log.appended_position());
        assert_eq!(Some(1), cluster.node(3).log.appended_position());
    }

    tracing::info!("--- the replication loop keeps running while sends fail");
    {
        cluster.tick();
        cluster.tick();

        let replication = cluster.leader_state.replication(&ep(3)).expect("replication to node 3");
        assert!(!replication.is_closed());
        assert_eq!(Some(1), cluster.node(3).log.appended_position());
    }

    tracing::info!("--- node 3 is reachable again and catches up");
    {
        cluster.node_mut(1).network.set_unreachable(&ep(3), false);

        cluster.run_until("node 3 catches up", |c| c.node(3).log.appended_position() == Some(4))?;

        let member = cluster.node(1).state.member(&ep(3)).cloned();
        assert_eq!(Some(0), member.as_ref().map(|m| m.failures()));
        assert_eq!(Some(Some(4)), member.as_ref().map(|m| m.match_position()));

        let entries = cluster.node(3).log.entries().map(|e| e.payload.clone()).collect::<Vec<_>>();
        assert_eq!(EntryPayload::Normal(vec![2]), entries[4]);
    }

    Ok(())
}
