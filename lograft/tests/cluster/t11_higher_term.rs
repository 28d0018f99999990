use lograft::QuorumDecision;
use lograft::ServerState;
use pretty_assertions::assert_eq;

use crate::fixtures::init_ut_tracing;
use crate::fixtures::Cluster;

/// A vote answered with a higher term steps the round down; a poll answered with the same term
/// only fails, leaving the role alone. Both adopt the term.
#[test]
fn vote_steps_down_poll_does_not() -> anyhow::Result<()> {
    init_ut_tracing();

    tracing::info!("--- vote");
    {
        let mut cluster = Cluster::new(&[1, 2, 3]);
        cluster.node_mut(2).state.update_term(5);

        let decision = cluster.elect(1)?;

        assert_eq!(QuorumDecision::SteppedDown, decision);
        assert_eq!(5, cluster.node(1).state.term());
        assert_eq!(5, cluster.node(1).meta.term);
        assert!(cluster.leader.is_none());
    }

    tracing::info!("--- poll");
    {
        let mut cluster = Cluster::new(&[1, 2, 3]);
        cluster.node_mut(2).state.update_term(5);

        let decision = cluster.poll(1)?;

        assert_eq!(QuorumDecision::Failed, decision);
        assert_eq!(5, cluster.node(1).state.term());
        assert_eq!(ServerState::Follower, cluster.node(1).state.server_state());
    }

    Ok(())
}

/// A candidate whose log is behind does not get the votes.
#[test]
fn stale_candidate_loses() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut cluster = Cluster::new(&[1, 2, 3]);
    assert_eq!(QuorumDecision::Succeeded, cluster.elect(1)?);
    cluster.settle()?;

    tracing::info!("--- node 3 loses its log and campaigns");
    {
        cluster.leader = None;
        cluster.add_node(3, &[1, 2, 3]);
        cluster.node_mut(3).state.update_term(1);

        assert_eq!(QuorumDecision::Failed, cluster.elect(3)?);
        assert_eq!(2, cluster.node(3).state.term());
    }

    Ok(())
}
