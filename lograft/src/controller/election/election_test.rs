use pretty_assertions::assert_eq;

use crate::controller::ElectionState;
use crate::controller::PollController;
use crate::controller::VoteController;
use crate::error::NetworkError;
use crate::message::PollResponse;
use crate::message::VoteRequest;
use crate::message::VoteResponse;
use crate::quorum::Quorum;
use crate::quorum::QuorumDecision;
use crate::testing::ep;
use crate::testing::init_ut_tracing;
use crate::testing::TestNode;
use crate::EntryId;
use crate::EntryPayload;
use crate::RaftLog;

fn node(term: u64) -> TestNode {
    let mut node = TestNode::new(ep(1), vec![ep(1), ep(2), ep(3)]);
    node.state.update_term(term);
    node
}

#[test]
fn test_vote_request_content() -> anyhow::Result<()> {
    let mut node = node(5);
    node.log.try_write(4, EntryPayload::Blank)?;

    let mut q = Quorum::new(3);
    let mut c = VoteController::new(ep(2));
    c.open()?;
    c.do_work(&mut node.ctx(), &mut q);

    assert_eq!(ElectionState::AwaitResponse, c.state());

    let sent = node.network.votes.pop_front().unwrap();
    assert_eq!(ep(2), sent.target);
    assert_eq!(
        VoteRequest {
            term: 5,
            candidate: ep(1),
            last_entry: Some(EntryId::new(4, 0)),
        },
        sent.request
    );

    Ok(())
}

#[test]
fn test_vote_majority_without_third_peer() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut node = node(5);
    let mut q = Quorum::new(3);

    let mut controllers = vec![VoteController::new(ep(2)), VoteController::new(ep(3))];
    for c in controllers.iter_mut() {
        c.open()?;
        c.do_work(&mut node.ctx(), &mut q);
    }

    tracing::info!("--- first grant: not yet decided");
    {
        let sent = node.network.votes.pop_front().unwrap();
        sent.responder.respond(VoteResponse { term: 5, granted: true });

        controllers[0].do_work(&mut node.ctx(), &mut q);
        assert!(controllers[0].is_response_available());
        assert_eq!(None, q.decision());
    }

    tracing::info!("--- second grant decides the round");
    {
        let sent = node.network.votes.pop_front().unwrap();
        sent.responder.respond(VoteResponse { term: 5, granted: true });

        controllers[1].do_work(&mut node.ctx(), &mut q);
        assert_eq!(Some(QuorumDecision::Succeeded), q.decision());
        assert_eq!(2, q.succeeded());
    }

    Ok(())
}

#[test]
fn test_vote_denied_or_stale_term_fails() -> anyhow::Result<()> {
    let mut node = node(5);
    let mut q = Quorum::new(5);

    let mut denied = VoteController::new(ep(2));
    let mut stale = VoteController::new(ep(3));

    denied.open()?;
    denied.do_work(&mut node.ctx(), &mut q);
    stale.open()?;
    stale.do_work(&mut node.ctx(), &mut q);

    let sent = node.network.votes.pop_front().unwrap();
    sent.responder.respond(VoteResponse { term: 5, granted: false });
    let sent = node.network.votes.pop_front().unwrap();
    sent.responder.respond(VoteResponse { term: 4, granted: true });

    denied.do_work(&mut node.ctx(), &mut q);
    stale.do_work(&mut node.ctx(), &mut q);

    assert_eq!(2, q.failed());
    assert_eq!(0, q.succeeded());
    assert_eq!(None, q.decision());
    assert_eq!(5, node.state.term());

    Ok(())
}

#[test]
fn test_vote_higher_term_steps_down() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut node = node(5);
    let mut q = Quorum::new(3);

    let mut c = VoteController::new(ep(2));
    c.open()?;
    c.do_work(&mut node.ctx(), &mut q);

    let sent = node.network.votes.pop_front().unwrap();
    sent.responder.respond(VoteResponse { term: 7, granted: false });
    c.do_work(&mut node.ctx(), &mut q);

    assert_eq!(Some(QuorumDecision::SteppedDown), q.decision());
    assert_eq!(7, node.state.term());
    assert_eq!(7, node.meta.term);

    Ok(())
}

#[test]
fn test_poll_higher_term_does_not_step_down() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut node = node(5);
    let mut q = Quorum::new(3);

    let mut c = PollController::new(ep(2));
    c.open()?;
    c.do_work(&mut node.ctx(), &mut q);

    let sent = node.network.polls.pop_front().unwrap();
    assert_eq!(5, sent.request.term);
    sent.responder.respond(PollResponse { term: 7, accepted: true });
    c.do_work(&mut node.ctx(), &mut q);

    assert_eq!(None, q.decision());
    assert_eq!(1, q.failed());
    assert_eq!(0, q.succeeded());
    assert_eq!(7, node.state.term());
    assert!(c.is_response_available());

    Ok(())
}

#[test]
fn test_poll_accepted() -> anyhow::Result<()> {
    let mut node = node(5);
    let mut q = Quorum::new(1);

    let mut c = PollController::new(ep(2));
    c.open()?;
    c.do_work(&mut node.ctx(), &mut q);

    let sent = node.network.polls.pop_front().unwrap();
    sent.responder.respond(PollResponse { term: 5, accepted: true });
    c.do_work(&mut node.ctx(), &mut q);

    assert_eq!(Some(QuorumDecision::Succeeded), q.decision());
    assert_eq!(Some(&PollResponse { term: 5, accepted: true }), c.response());

    Ok(())
}

#[test]
fn test_transport_failure_fails_quorum() -> anyhow::Result<()> {
    let mut node = node(5);
    let mut q = Quorum::new(3);

    tracing::info!("--- unreachable peer");
    {
        node.network.set_unreachable(&ep(2), true);

        let mut c = VoteController::new(ep(2));
        c.open()?;
        c.do_work(&mut node.ctx(), &mut q);

        assert!(c.is_failed());
        assert_eq!(1, q.failed());
    }

    tracing::info!("--- request failed after sending");
    {
        let mut c = VoteController::new(ep(3));
        c.open()?;
        c.do_work(&mut node.ctx(), &mut q);

        let sent = node.network.votes.pop_front().unwrap();
        sent.responder.fail(NetworkError::Closed);
        c.do_work(&mut node.ctx(), &mut q);

        assert!(c.is_failed());
        assert_eq!(Some(QuorumDecision::Failed), q.decision());
    }

    Ok(())
}

#[test]
fn test_close_drops_pending_request() -> anyhow::Result<()> {
    let mut node = node(5);
    let mut q = Quorum::new(3);

    let mut c = VoteController::new(ep(2));
    c.open()?;
    c.do_work(&mut node.ctx(), &mut q);
    assert!(c.open().is_err());

    let sent = node.network.votes.pop_front().unwrap();
    assert!(!sent.responder.is_closed());

    c.close();
    c.close();
    c.do_work(&mut node.ctx(), &mut q);
    assert!(c.is_closed());
    assert!(sent.responder.is_closed());

    c.close_forcibly(&mut node.ctx(), &mut q);
    assert!(c.is_closed());

    assert_eq!(None, q.decision());
    assert_eq!(0, q.failed());

    tracing::info!("--- can be reopened");
    {
        c.open()?;
        c.do_work(&mut node.ctx(), &mut q);
        assert_eq!(ElectionState::AwaitResponse, c.state());
        assert_eq!(1, node.network.votes.len());
    }

    Ok(())
}
