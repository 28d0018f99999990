//! Replaces the member list by appending and committing a configuration entry.

mod state;


use tokio::sync::oneshot;

pub use self::state::ConfigurationState;
use crate::controller::AppendController;
use crate::controller::RaftContext;
use crate::controller::StateMachine;
use crate::controller::Transition;
use crate::display_ext::DisplaySliceExt;
use crate::error::ConfigurationError;
use crate::error::ControllerError;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::EntryPayload;
use crate::RaftMetaStore;
use crate::RaftTypeConfig;

/// Orchestrates one configuration change.
///
/// The member list is written as a configuration entry through an internal
/// [`AppendController`] that waits for commit. As soon as the entry is durable in the local log
/// the new configuration becomes the node's current one, before the entry commits, so that the
/// controllers of this node stop talking to removed members right away.
pub struct ConfigurationController {
    sm: StateMachine<ConfigurationState>,

    append: AppendController,

    members: Vec<Endpoint>,
    payload: Option<EntryPayload>,
    configuration: Option<Configuration>,

    failure: Option<ConfigurationError>,
    result_tx: Option<oneshot::Sender<Result<Configuration, ConfigurationError>>>,
}

impl Default for ConfigurationController {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationController {
    pub fn new() -> Self {
        Self {
            sm: StateMachine::new("ConfigurationController"),
            append: AppendController::new(),
            members: vec![],
            payload: None,
            configuration: None,
            failure: None,
            result_tx: None,
        }
    }

    pub fn open(&mut self, members: Vec<Endpoint>) -> Result<(), ControllerError> {
        if !self.sm.is_closed() {
            return Err(ControllerError::not_closed(self.sm.name(), self.sm.current()));
        }

        tracing::info!(members = display(members.display()), "open configuration change");

        self.reset();
        self.members = members;
        self.sm.take(Transition::Open);
        Ok(())
    }

    /// Like [`open`](Self::open), and return a handle that resolves when the change is committed
    /// or has failed.
    ///
    /// The handle always resolves: closing the controller before completion resolves it with
    /// [`ConfigurationError::Closed`].
    pub fn open_async(
        &mut self,
        members: Vec<Endpoint>,
    ) -> Result<oneshot::Receiver<Result<Configuration, ConfigurationError>>, ControllerError> {
        self.open(members)?;

        let (tx, rx) = oneshot::channel();
        self.result_tx = Some(tx);
        Ok(rx)
    }

    pub fn close(&mut self) {
        self.sm.take(Transition::Close);
    }

    pub fn close_forcibly<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        self.close();
        while !self.is_closed() {
            if self.do_work(ctx) == 0 {
                break;
            }
        }
    }

    pub fn do_work<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> usize {
        let mut work = 0;

        loop {
            let transition = match self.sm.current() {
                ConfigurationState::Closed => None,
                ConfigurationState::PrepareConfigurationEntry => self.prepare_configuration_entry(),
                ConfigurationState::OpenAppendController => self.open_append_controller(),
                ConfigurationState::AppendConfiguration => self.append_configuration(ctx),
                ConfigurationState::ApplyConfiguration => self.apply_configuration(ctx),
                ConfigurationState::CommitConfiguration => self.commit_configuration(ctx),
                ConfigurationState::Configured | ConfigurationState::Failed => None,
                ConfigurationState::CloseAppendController => self.close_append_controller(ctx),
                ConfigurationState::Closing => self.closing(),
            };

            match transition {
                Some(t) if self.sm.take(t) => work += 1,
                _ => return work,
            }
        }
    }

    pub fn state(&self) -> ConfigurationState {
        self.sm.current()
    }

    pub fn is_closed(&self) -> bool {
        self.sm.is_closed()
    }

    pub fn is_failed(&self) -> bool {
        self.sm.current() == ConfigurationState::Failed
    }

    /// Whether the configuration entry is durable in the local log.
    pub fn is_appended(&self) -> bool {
        matches!(
            self.sm.current(),
            ConfigurationState::CommitConfiguration | ConfigurationState::Configured
        )
    }

    pub fn is_configured(&self) -> bool {
        self.sm.current() == ConfigurationState::Configured
    }

    /// The member list of the change in progress.
    pub fn members(&self) -> &[Endpoint] {
        &self.members
    }

    /// The new configuration, once its entry was written.
    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    pub fn failure(&self) -> Option<&ConfigurationError> {
        self.failure.as_ref()
    }

    fn reset(&mut self) {
        self.members = vec![];
        self.payload = None;
        self.configuration = None;
        self.failure = None;
        self.result_tx = None;
    }

    fn prepare_configuration_entry(&mut self) -> Option<Transition> {
        self.payload = Some(EntryPayload::Configuration(self.members.clone()));
        Some(Transition::Default)
    }

    fn open_append_controller(&mut self) -> Option<Transition> {
        let payload = self.payload.clone()?;

        match self.append.open(payload, true) {
            Ok(()) => Some(Transition::Default),
            Err(e) => {
                tracing::warn!(error = display(&e), "append controller busy, retry on next tick");
                None
            }
        }
    }

    fn append_configuration<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        self.append.do_work(ctx);

        if self.append.is_failed() {
            return Some(self.append_failed());
        }

        if !self.append.is_appended() {
            return None;
        }

        self.configuration = Some(Configuration::new(self.append.entry(), self.members.clone()));
        Some(Transition::Default)
    }

    fn apply_configuration<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let configuration = self.configuration.clone()?;

        // Persisted first: a member list that failed to save never becomes live.
        if let Err(e) = ctx.meta.save_configuration(&configuration) {
            tracing::warn!(error = display(&e), "failed to persist configuration");
            return Some(self.fail(ConfigurationError::Storage(e)));
        }

        ctx.state.apply_configuration(configuration);

        Some(Transition::Default)
    }

    fn commit_configuration<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        self.append.do_work(ctx);

        if self.append.is_failed() {
            return Some(self.append_failed());
        }

        if !self.append.is_committed() {
            return None;
        }

        let configuration = self.configuration.clone()?;
        tracing::info!(configuration = display(&configuration), "configuration committed");

        self.resolve(Ok(configuration));
        Some(Transition::Default)
    }

    fn close_append_controller<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        self.append.close();
        self.append.do_work(ctx);

        if self.append.is_closed() {
            Some(Transition::Default)
        } else {
            None
        }
    }

    fn closing(&mut self) -> Option<Transition> {
        self.resolve(Err(ConfigurationError::Closed));
        self.payload = None;
        Some(Transition::Default)
    }

    fn append_failed(&mut self) -> Transition {
        let err = match self.append.failure() {
            Some(e) => ConfigurationError::Append(e.clone()),
            None => ConfigurationError::Closed,
        };

        self.fail(err)
    }

    fn fail(&mut self, err: ConfigurationError) -> Transition {
        tracing::warn!(error = display(&err), members = display(self.members.display()), "configuration change failed");

        self.resolve(Err(err.clone()));
        self.failure = Some(err);
        Transition::Fail
    }

    /// Complete the caller's handle, if there is one that is still pending.
    fn resolve(&mut self, res: Result<Configuration, ConfigurationError>) {
        if let Some(tx) = self.result_tx.take() {
            let _ = tx.send(res);
        }
    }
}
