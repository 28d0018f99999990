use lograft::testing::ep;
use lograft::EntryId;
use lograft::QuorumDecision;
use lograft::ServerState;
use maplit::btreeset;
use pretty_assertions::assert_eq;

use crate::fixtures::init_ut_tracing;
use crate::fixtures::Cluster;

/// A candidate of a 3 member cluster wins with the votes of the two others, becomes leader and
/// brings every member up to date with its initial entries.
#[test]
fn elect_and_initialize() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut cluster = Cluster::new(&[1, 2, 3]);

    tracing::info!("--- elect node 1");
    {
        let decision = cluster.elect(1)?;
        assert_eq!(QuorumDecision::Succeeded, decision);

        assert_eq!(ServerState::Leader, cluster.node(1).state.server_state());
        assert_eq!(1, cluster.node(1).state.term());

        for p in [2, 3] {
            assert_eq!(1, cluster.node(p).state.term());
            assert_eq!(Some(&ep(1)), cluster.node(p).state.voted_for());
        }
    }

    tracing::info!("--- blank entry and configuration are replicated and committed");
    {
        cluster.settle()?;

        assert_eq!(Some(1), cluster.node(1).state.commit_position());
        assert_eq!(Some(EntryId::new(1, 1)), cluster.node(1).state.configuration().entry());

        let targets = cluster.leader_state.replication_targets().into_iter().collect();
        assert_eq!(btreeset! {ep(2), ep(3)}, targets);
    }

    tracing::info!("--- followers learn the commit position and the configuration");
    {
        cluster.run_until("followers commit", |c| {
            [2, 3].iter().all(|p| c.node(*p).state.commit_position() == Some(1))
        })?;

        cluster.run_until("followers configured", |c| {
            [2, 3].iter().all(|p| c.node(*p).state.configuration().entry() == Some(EntryId::new(1, 1)))
        })?;

        for p in [2, 3] {
            assert_eq!(Some(&ep(1)), cluster.node(p).state.leader());
            assert_eq!(ServerState::Follower, cluster.node(p).state.server_state());
        }
    }

    Ok(())
}

/// A single member cluster elects itself without sending a request.
#[test]
fn elect_single_member() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut cluster = Cluster::new(&[1]);

    assert_eq!(QuorumDecision::Succeeded, cluster.elect(1)?);
    assert!(cluster.node(1).network.votes.is_empty());

    cluster.tick();

    assert!(cluster.leader_state.is_initialized());
    assert_eq!(Some(1), cluster.node(1).state.commit_position());

    Ok(())
}
