//! An in-process cluster of test nodes, with a router that plays the follower side of every
//! request the controllers send.

#![allow(dead_code)]

use std::collections::BTreeMap;

use lograft::candidate::Election;
use lograft::controller::Ballot;
use lograft::controller::Poll;
use lograft::controller::Vote;
use lograft::error::NetworkError;
use lograft::message::AppendRequest;
use lograft::message::AppendResponse;
use lograft::message::ConfigureRequest;
use lograft::message::ConfigureResponse;
use lograft::message::JoinResponse;
use lograft::message::LeaveResponse;
use lograft::message::PollRequest;
use lograft::message::PollResponse;
use lograft::message::VoteRequest;
use lograft::message::VoteResponse;
use lograft::testing::ep;
use lograft::testing::Responder;
use lograft::testing::TestNode;
use lograft::Endpoint;
use lograft::LeaderState;
use lograft::LogPosition;
use lograft::QuorumDecision;
use lograft::RaftLog;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

pub use lograft::testing::init_ut_tracing;

/// Time that passes on every node per tick.
pub const TICK_MS: u64 = 50;

/// Upper bound of ticks for anything a test waits for.
pub const MAX_TICKS: usize = 100;

/// Nodes keyed by endpoint, and the leader of the current term if one was elected.
pub struct Cluster {
    pub nodes: BTreeMap<Endpoint, TestNode>,

    pub leader: Option<Endpoint>,
    pub leader_state: LeaderState,

    /// Join and leave requests handed to the leader, waiting for its answer.
    joins: Vec<(oneshot::Receiver<JoinResponse>, Responder<JoinResponse>)>,
    leaves: Vec<(oneshot::Receiver<LeaveResponse>, Responder<LeaveResponse>)>,
}

impl Cluster {
    /// A cluster whose members are `ports`, each knowing the full member list.
    pub fn new(ports: &[u16]) -> Self {
        let mut cluster = Self {
            nodes: BTreeMap::new(),
            leader: None,
            leader_state: LeaderState::new(),
            joins: vec![],
            leaves: vec![],
        };

        for p in ports {
            cluster.add_node(*p, ports);
        }

        cluster
    }

    /// Add a node that believes the members are `members`.
    pub fn add_node(&mut self, port: u16, members: &[u16]) {
        let node = TestNode::new(ep(port), members.iter().copied().map(ep).collect());
        self.nodes.insert(ep(port), node);
    }

    pub fn node(&self, port: u16) -> &TestNode {
        &self.nodes[&ep(port)]
    }

    pub fn node_mut(&mut self, port: u16) -> &mut TestNode {
        self.nodes.get_mut(&ep(port)).expect("node exists")
    }

    /// Run a vote round from `port`: it becomes a candidate of the next term and, on success,
    /// the leader.
    pub fn elect(&mut self, port: u16) -> anyhow::Result<QuorumDecision> {
        self.node_mut(port).state.become_candidate();

        let decision = self.run_election::<Vote>(port)?;

        if decision == QuorumDecision::Succeeded {
            self.node_mut(port).state.become_leader();

            self.leader = Some(ep(port));
            self.leader_state = LeaderState::new();
            self.leader_state.open()?;
        }

        Ok(decision)
    }

    /// Run a poll round from `port`, without changing its role.
    pub fn poll(&mut self, port: u16) -> anyhow::Result<QuorumDecision> {
        self.run_election::<Poll>(port)
    }

    fn run_election<B: Ballot>(&mut self, port: u16) -> anyhow::Result<QuorumDecision> {
        let mut election = Election::<B>::start(&mut self.node_mut(port).ctx())?;

        for _ in 0..MAX_TICKS {
            if let Some(d) = election.do_work(&mut self.node_mut(port).ctx()) {
                election.close_forcibly(&mut self.node_mut(port).ctx());
                return Ok(d);
            }

            self.deliver();
        }

        anyhow::bail!("election of {} is not decided", ep(port))
    }

    /// Advance the clock, drive the leader and deliver every message sent.
    pub fn tick(&mut self) {
        for node in self.nodes.values_mut() {
            node.advance_ms(TICK_MS);
        }

        if let Some(leader) = self.leader.clone() {
            if let Some(node) = self.nodes.get_mut(&leader) {
                self.leader_state.do_work(&mut node.ctx());
            }
        }

        self.deliver();
    }

    /// Tick until `f` holds.
    pub fn run_until(&mut self, msg: &str, f: impl Fn(&Cluster) -> bool) -> anyhow::Result<()> {
        for _ in 0..MAX_TICKS {
            if f(self) {
                return Ok(());
            }
            self.tick();
        }

        if f(self) {
            return Ok(());
        }

        anyhow::bail!("timeout waiting for: {}", msg)
    }

    /// Tick until the leader is initialized, its configuration committed and every member holds
    /// the leader's log.
    pub fn settle(&mut self) -> anyhow::Result<()> {
        self.run_until("cluster settles", |c| {
            let Some(leader) = c.leader.as_ref() else {
                return false;
            };
            let leader_node = &c.nodes[leader];
            let last = leader_node.log.appended_position();

            c.leader_state.is_initialized()
                && !c.leader_state.is_reconfiguring()
                && leader_node.state.commit_position() == last
                && leader_node
                    .state
                    .configuration()
                    .members()
                    .iter()
                    .all(|m| c.nodes.get(m).map(|n| n.log.appended_position()) == Some(last))
        })
    }

    /// Route every request sent by any node to its target and answer it.
    pub fn deliver(&mut self) {
        let endpoints = self.nodes.keys().cloned().collect::<Vec<_>>();

        for from in endpoints {
            let Some(node) = self.nodes.get_mut(&from) else {
                continue;
            };

            let votes = node.network.votes.drain(..).collect::<Vec<_>>();
            let polls = node.network.polls.drain(..).collect::<Vec<_>>();
            let appends = node.network.take_appends();
            let configures = node.network.configures.drain(..).collect::<Vec<_>>();
            let joins = node.network.joins.drain(..).collect::<Vec<_>>();
            let leaves = node.network.leaves.drain(..).collect::<Vec<_>>();

            for sent in votes {
                match self.nodes.get_mut(&sent.target) {
                    Some(target) => sent.responder.respond(handle_vote(target, &sent.request)),
                    None => sent.responder.fail(NetworkError::unreachable(&sent.target)),
                }
            }

            for sent in polls {
                match self.nodes.get_mut(&sent.target) {
                    Some(target) => sent.responder.respond(handle_poll(target, &sent.request)),
                    None => sent.responder.fail(NetworkError::unreachable(&sent.target)),
                }
            }

            for sent in appends {
                let Some(target) = self.nodes.get_mut(&sent.target) else {
                    continue;
                };

                let resp = handle_append(target, &sent.request);

                if self.leader.as_ref() == Some(&from) {
                    if let Some(leader_node) = self.nodes.get_mut(&from) {
                        self.leader_state.handle_append_response(&mut leader_node.ctx(), &sent.target, resp);
                    }
                }
            }

            for sent in configures {
                match self.nodes.get_mut(&sent.target) {
                    Some(target) => sent.responder.respond(handle_configure(target, &sent.request)),
                    None => sent.responder.fail(NetworkError::unreachable(&sent.target)),
                }
            }

            for sent in joins {
                if self.leader.as_ref() == Some(&sent.target) {
                    if let Some(leader_node) = self.nodes.get_mut(&sent.target) {
                        let rx = self.leader_state.handle_join(&mut leader_node.ctx(), sent.request);
                        self.joins.push((rx, sent.responder));
                    }
                    continue;
                }

                match self.nodes.get(&sent.target) {
                    Some(target) => sent.responder.respond(JoinResponse {
                        term: target.state.term(),
                        succeeded: false,
                        configuration: target.state.configuration().as_ref().clone(),
                    }),
                    None => sent.responder.fail(NetworkError::unreachable(&sent.target)),
                }
            }

            for sent in leaves {
                if self.leader.as_ref() == Some(&sent.target) {
                    if let Some(leader_node) = self.nodes.get_mut(&sent.target) {
                        let rx = self.leader_state.handle_leave(&mut leader_node.ctx(), sent.request);
                        self.leaves.push((rx, sent.responder));
                    }
                    continue;
                }

                match self.nodes.get(&sent.target) {
                    Some(target) => sent.responder.respond(LeaveResponse {
                        term: target.state.term(),
                        succeeded: false,
                        configuration: target.state.configuration().as_ref().clone(),
                    }),
                    None => sent.responder.fail(NetworkError::unreachable(&sent.target)),
                }
            }
        }

        forward_answers(&mut self.joins);
        forward_answers(&mut self.leaves);
    }
}

/// Pass the leader's answers on to the requesters.
fn forward_answers<T>(pending: &mut Vec<(oneshot::Receiver<T>, Responder<T>)>) {
    for (mut rx, responder) in std::mem::take(pending) {
        match rx.try_recv() {
            Ok(resp) => responder.respond(resp),
            Err(TryRecvError::Empty) => pending.push((rx, responder)),
            Err(TryRecvError::Closed) => responder.fail(NetworkError::Closed),
        }
    }
}

fn handle_vote(node: &mut TestNode, req: &VoteRequest) -> VoteResponse {
    node.state.update_term(req.term);

    let up_to_date = req.last_entry >= node.log.last_entry_id();
    let free = node.state.voted_for().map_or(true, |v| v == &req.candidate);
    let granted = req.term == node.state.term() && free && up_to_date;

    if granted {
        node.state.vote_for(req.candidate.clone());
    }

    VoteResponse {
        term: node.state.term(),
        granted,
    }
}

fn handle_poll(node: &mut TestNode, req: &PollRequest) -> PollResponse {
    let up_to_date = req.last_entry >= node.log.last_entry_id();

    PollResponse {
        term: node.state.term(),
        accepted: req.term >= node.state.term() && up_to_date,
    }
}

fn handle_append(node: &mut TestNode, req: &AppendRequest) -> AppendResponse {
    if req.term < node.state.term() {
        return reject(&*node, node.log.appended_position());
    }

    node.state.update_term(req.term);
    if !node.state.server_state().is_joining() && node.state.leader() != Some(&req.leader) {
        node.state.become_follower(Some(req.leader.clone()));
    }

    if let Some(prev) = req.prev_entry {
        let held = node.log.entry_at(prev.position).map(|e| e.id);
        if held != Some(prev) {
            let last = match (node.log.appended_position(), prev.position.checked_sub(1)) {
                (Some(a), Some(b)) => Some(a.min(b)),
                _ => None,
            };
            return reject(&*node, last);
        }
    }

    let mut last_position = req.prev_entry.map(|e| e.position);

    if let Some(entry) = &req.entry {
        match node.log.entry_at(entry.id.position) {
            Some(held) if held.id == entry.id => {}
            Some(_) => return reject(&*node, last_position),
            None => {
                if node.log.try_write(entry.id.term, entry.payload.clone()).is_err() {
                    return reject(&*node, last_position);
                }
            }
        }
        last_position = Some(entry.id.position);
    }

    if let (Some(commit), Some(last)) = (req.commit_position, last_position) {
        node.state.set_commit_position(commit.min(last));
    }

    AppendResponse {
        term: node.state.term(),
        succeeded: true,
        last_position,
    }
}

fn reject(node: &TestNode, last_position: Option<LogPosition>) -> AppendResponse {
    AppendResponse {
        term: node.state.term(),
        succeeded: false,
        last_position,
    }
}

fn handle_configure(node: &mut TestNode, req: &ConfigureRequest) -> ConfigureResponse {
    if req.term < node.state.term() {
        return ConfigureResponse {
            term: node.state.term(),
            succeeded: false,
            configuration_entry: node.state.configuration().entry(),
        };
    }

    node.state.update_term(req.term);

    if req.configuration.entry() > node.state.configuration().entry() {
        node.state.apply_configuration(req.configuration.clone());
    }

    ConfigureResponse {
        term: node.state.term(),
        succeeded: true,
        configuration_entry: node.state.configuration().entry(),
    }
}
