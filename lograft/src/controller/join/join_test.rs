use pretty_assertions::assert_eq;

use crate::controller::JoinController;
use crate::controller::JoinState;
use crate::error::JoinError;
use crate::error::NetworkError;
use crate::membership::Configuration;
use crate::message::JoinResponse;
use crate::testing::ep;
use crate::testing::init_ut_tracing;
use crate::testing::TestNode;
use crate::EntryId;
use crate::ServerState;

fn joining() -> TestNode {
    TestNode::new(ep(9), vec![])
}

#[test]
fn test_join_success() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut node = joining();
    let mut c = JoinController::new();
    let mut rx = c.open_async(&ep(9), &[ep(1), ep(2)])?;

    c.do_work(&mut node.ctx());
    assert_eq!(JoinState::AwaitResponse, c.state());
    assert_eq!(ServerState::Joining, node.state.server_state());

    let sent = node.network.joins.pop_front().unwrap();
    assert_eq!(ep(1), sent.target);
    assert_eq!(ep(9), sent.request.member);

    let configuration = Configuration::new(Some(EntryId::new(3, 10)), vec![ep(1), ep(2), ep(9)]);
    sent.responder.respond(JoinResponse {
        term: 3,
        succeeded: true,
        configuration: configuration.clone(),
    });
    c.do_work(&mut node.ctx());

    assert!(c.is_joined());
    assert_eq!(Some(&configuration), c.configuration());
    assert_eq!(3, node.state.term());
    assert_eq!(ServerState::Follower, node.state.server_state());
    assert_eq!(&configuration, node.state.configuration().as_ref());
    assert_eq!(Some(configuration.clone()), node.meta.configuration);
    assert_eq!(Ok(configuration), rx.try_recv()?);

    Ok(())
}

#[test]
fn test_join_storage_failure_keeps_configuration() -> anyhow::Result<()> {
    let mut node = joining();
    node.meta.fail = true;

    let mut c = JoinController::new();
    let mut rx = c.open_async(&ep(9), &[ep(1)])?;
    c.do_work(&mut node.ctx());

    node.network.joins.pop_front().unwrap().responder.respond(JoinResponse {
        term: 3,
        succeeded: true,
        configuration: Configuration::new(Some(EntryId::new(3, 10)), vec![ep(1), ep(9)]),
    });
    c.do_work(&mut node.ctx());

    assert!(c.is_failed());
    assert!(matches!(rx.try_recv()?, Err(JoinError::Storage(_))));
    assert_eq!(ServerState::Joining, node.state.server_state());
    assert_eq!(&Configuration::new(None, vec![]), node.state.configuration().as_ref());
    assert!(node.state.member(&ep(1)).is_none());

    Ok(())
}

#[test]
fn test_join_rejection_merges_membership() -> anyhow::Result<()> {
    init_ut_tracing();

    let mut node = joining();
    let mut c = JoinController::new();
    c.open(&ep(9), &[ep(1), ep(4)])?;

    c.do_work(&mut node.ctx());
    let sent = node.network.joins.pop_front().unwrap();
    assert_eq!(ep(1), sent.target);

    sent.responder.respond(JoinResponse {
        term: 3,
        succeeded: false,
        configuration: Configuration::new(Some(EntryId::new(3, 10)), vec![ep(1), ep(2), ep(3)]),
    });
    c.do_work(&mut node.ctx());

    assert_eq!(&[ep(1), ep(2), ep(3)], c.candidates().as_slice());
    assert_eq!(JoinState::AwaitResponse, c.state());

    let sent = node.network.joins.pop_front().unwrap();
    assert_eq!(ep(2), sent.target);

    Ok(())
}

#[test]
fn test_join_success_without_me_is_a_rejection() -> anyhow::Result<()> {
    let mut node = joining();
    let mut c = JoinController::new();
    c.open(&ep(9), &[ep(1), ep(2)])?;

    c.do_work(&mut node.ctx());
    let sent = node.network.joins.pop_front().unwrap();
    sent.responder.respond(JoinResponse {
        term: 3,
        succeeded: true,
        configuration: Configuration::new(None, vec![ep(1), ep(2)]),
    });
    c.do_work(&mut node.ctx());

    assert!(!c.is_joined());
    assert_eq!(ServerState::Joining, node.state.server_state());
    assert_eq!(ep(2), node.network.joins.pop_front().unwrap().target);

    Ok(())
}

#[test]
fn test_join_gives_up_when_nobody_answers() -> anyhow::Result<()> {
    let mut node = joining();
    let mut c = JoinController::new();
    let mut rx = c.open_async(&ep(9), &[ep(1), ep(2)])?;

    c.do_work(&mut node.ctx());
    node.network.joins.pop_front().unwrap().responder.fail(NetworkError::Closed);
    c.do_work(&mut node.ctx());
    assert_eq!(JoinState::AwaitResponse, c.state());

    node.network.set_unreachable(&ep(1), true);
    node.network.joins.pop_front().unwrap().responder.fail(NetworkError::Closed);
    c.do_work(&mut node.ctx());

    assert!(c.is_failed());
    assert_eq!(Some(&JoinError::Unreachable { attempts: 2 }), c.failure());
    assert_eq!(Err(JoinError::Unreachable { attempts: 2 }), rx.try_recv()?);

    Ok(())
}

#[test]
fn test_join_retry_interval() -> anyhow::Result<()> {
    let mut node = joining();
    node.config.membership_retry_interval = 50;
    node.config.max_join_rounds = 10;

    let mut c = JoinController::new();
    c.open(&ep(9), &[ep(1), ep(2)])?;
    c.do_work(&mut node.ctx());

    node.network.joins.pop_front().unwrap().responder.fail(NetworkError::Closed);
    c.do_work(&mut node.ctx());
    assert_eq!(JoinState::OpenRequest, c.state());
    assert!(node.network.joins.is_empty());

    node.advance_ms(50);
    c.do_work(&mut node.ctx());
    assert_eq!(ep(2), node.network.joins.pop_front().unwrap().target);

    Ok(())
}

#[test]
fn test_join_with_unbounded_rounds_keeps_retrying() -> anyhow::Result<()> {
    let mut node = joining();
    node.config.membership_retry_interval = 0;
    node.config.max_join_rounds = u64::MAX;

    let mut c = JoinController::new();
    c.open(&ep(9), &[ep(1), ep(2)])?;
    c.do_work(&mut node.ctx());

    for _ in 0..4 {
        node.network.joins.pop_front().unwrap().responder.fail(NetworkError::Closed);
        c.do_work(&mut node.ctx());
        assert!(!c.is_failed());
    }

    assert_eq!(JoinState::AwaitResponse, c.state());
    assert_eq!(1, node.network.joins.len());

    Ok(())
}

#[test]
fn test_join_without_candidates_fails() -> anyhow::Result<()> {
    let mut node = joining();
    let mut c = JoinController::new();
    c.open(&ep(9), &[ep(9)])?;

    c.do_work(&mut node.ctx());
    assert!(c.is_failed());
    assert_eq!(Some(&JoinError::NoCandidates), c.failure());

    Ok(())
}

#[test]
fn test_join_close_resolves_handle() -> anyhow::Result<()> {
    let mut node = joining();
    let mut c = JoinController::new();
    let mut rx = c.open_async(&ep(9), &[ep(1)])?;
    c.do_work(&mut node.ctx());
    assert!(c.open(&ep(9), &[ep(1)]).is_err());

    c.close();
    c.close();
    c.do_work(&mut node.ctx());

    assert!(c.is_closed());
    assert_eq!(Err(JoinError::Closed), rx.try_recv()?);
    assert!(node.network.joins.pop_front().unwrap().responder.is_closed());

    Ok(())
}
