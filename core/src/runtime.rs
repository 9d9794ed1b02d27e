use crate::config::DashboardConfig;
use crate::prelude::{Clock, SystemClock, TransportError, TransportResult};
use crate::reconciler::{DashboardState, Inbound, Reconciler};
use crate::rig_interface::{Command, CommandKind, CommandReply, PushEvent};
use crate::transport::{CommandTransport, HttpTransport, PushChannel};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

type Completion = (CommandKind, TransportResult<CommandReply>);

/// GUI-side handle: send commands in, watch state come out.
#[derive(Clone)]
pub struct DashboardHandle {
    pub intents: mpsc::UnboundedSender<Command>,
    pub state: watch::Receiver<DashboardState>,
}

/// Owns the reconciler and is the only task that mutates it.
pub struct DashboardDriver<T, C: Clock = SystemClock> {
    reconciler: Reconciler<C>,
    transport: T,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl<T: CommandTransport> DashboardDriver<T, SystemClock> {
    pub fn new(config: &DashboardConfig, transport: T) -> Self {
        Self::with_reconciler(config, transport, Reconciler::new(config))
    }
}

impl<T: CommandTransport, C: Clock> DashboardDriver<T, C> {
    pub fn with_reconciler(config: &DashboardConfig, transport: T, reconciler: Reconciler<C>) -> Self {
        Self {
            reconciler,
            transport,
            poll_interval: config.poll_interval(),
            request_timeout: config.request_timeout(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        self.reconciler.state()
    }

    /// Runs until the intent channel closes and every in-flight command has resolved.
    pub async fn run(
        mut self,
        mut push: mpsc::Receiver<TransportResult<PushEvent>>,
        mut intents: mpsc::UnboundedReceiver<Command>,
        state_tx: watch::Sender<DashboardState>,
    ) -> DashboardState {
        let mut in_flight: FuturesUnordered<BoxFuture<'static, Completion>> =
            FuturesUnordered::new();
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut push_open = true;
        let mut intents_open = true;

        self.dispatch(Command::FetchStatus, &mut in_flight);
        state_tx.send_replace(self.reconciler.state().clone());

        while intents_open || !in_flight.is_empty() {
            let changed = tokio::select! {
                item = push.recv(), if push_open => match item {
                    Some(Ok(event)) => self.reconciler.apply(Inbound::Push(event)),
                    Some(Err(err)) => self.reconciler.apply(Inbound::PushFailed(err)),
                    None => {
                        push_open = false;
                        self.reconciler.apply(Inbound::PushFailed(TransportError::ChannelLost(
                            "push reader stopped".into(),
                        )))
                    }
                },
                intent = intents.recv(), if intents_open => match intent {
                    Some(command) => self.dispatch(command, &mut in_flight),
                    None => {
                        intents_open = false;
                        false
                    }
                },
                Some((command, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.reconciler.apply(Inbound::Resolved { command, outcome })
                }
                _ = ticker.tick() => {
                    if self.reconciler.should_poll() {
                        self.dispatch(Command::FetchStatus, &mut in_flight)
                    } else {
                        false
                    }
                }
            };

            if changed {
                state_tx.send_replace(self.reconciler.state().clone());
            }
        }

        self.reconciler.state().clone()
    }

    /// Runs the guard and, if it passes, starts the request. Returns whether state changed.
    fn dispatch(
        &mut self,
        command: Command,
        in_flight: &mut FuturesUnordered<BoxFuture<'static, Completion>>,
    ) -> bool {
        let kind = command.kind();
        let before = self.reconciler.state().revision;
        if let Err(rejection) = self.reconciler.begin(&command) {
            log::debug!("guard refused {}: {rejection}", kind.describe());
            return self.reconciler.state().revision != before;
        }

        let request = self.transport.send(command);
        let timeout = self.request_timeout;
        in_flight.push(
            async move {
                let outcome = match tokio::time::timeout(timeout, request).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(TransportError::Network("request timed out".into())),
                };
                (kind, outcome)
            }
            .boxed(),
        );
        true
    }
}

/// Wires the HTTP transport, the push channel and a driver for `config`.
///
/// The returned future must be polled (spawned or awaited) for anything to happen.
pub fn connect(
    config: &DashboardConfig,
) -> (DashboardHandle, impl std::future::Future<Output = DashboardState>) {
    let (intents_tx, intents_rx) = mpsc::unbounded_channel();
    let driver = DashboardDriver::new(config, HttpTransport::new(config.backend_url.clone()));
    let (state_tx, state_rx) = watch::channel(driver.state().clone());
    let push_url = config.push_url.clone();
    let reconnect = config.reconnect_delay();

    let run = async move {
        let (push_rx, push_task) = PushChannel::spawn(push_url, reconnect);
        let last = driver.run(push_rx, intents_rx, state_tx).await;
        push_task.abort();
        last
    };

    (
        DashboardHandle {
            intents: intents_tx,
            state: state_rx,
        },
        run,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig_interface::SensorSnapshot;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_label(&self) -> String {
            "09:00:00".into()
        }
    }

    /// Records every command and answers with a canned reply.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        calls: Arc<Mutex<Vec<Command>>>,
    }

    impl ScriptedTransport {
        fn calls(&self) -> Vec<Command> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandTransport for ScriptedTransport {
        fn send(
            &self,
            command: Command,
        ) -> impl Future<Output = TransportResult<CommandReply>> + Send + 'static {
            self.calls.lock().unwrap().push(command.clone());
            let reply = match command {
                Command::StartMonitoring => Ok(CommandReply::Started),
                Command::StopMonitoring => Ok(CommandReply::Stopped),
                Command::StopAlarm => Ok(CommandReply::AlarmStop { success: true }),
                Command::FetchStatus => Ok(CommandReply::Status(SensorSnapshot {
                    smoke_level: 150.0,
                    ..Default::default()
                })),
                Command::LoadSettings | Command::UpdateSettings(_) => {
                    Err(TransportError::Network("settings offline".into()))
                }
            };
            async move { reply }
        }
    }

    fn driver(transport: ScriptedTransport) -> DashboardDriver<ScriptedTransport, FixedClock> {
        let config = DashboardConfig {
            poll_interval_secs: 3600,
            ..Default::default()
        };
        let reconciler = Reconciler::with_clock(&config, FixedClock);
        DashboardDriver::with_reconciler(&config, transport, reconciler)
    }

    #[tokio::test]
    async fn duplicate_start_never_reaches_the_network() {
        let transport = ScriptedTransport::default();
        let (_push_tx, push_rx) = mpsc::channel(4);
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(DashboardState::default());

        intents_tx.send(Command::StartMonitoring).unwrap();
        intents_tx.send(Command::StartMonitoring).unwrap();
        intents_tx.send(Command::StopAlarm).unwrap();
        drop(intents_tx);

        let last = driver(transport.clone())
            .run(push_rx, intents_rx, state_tx)
            .await;

        assert_eq!(
            transport.calls(),
            vec![Command::FetchStatus, Command::StartMonitoring]
        );
        assert!(last.session.running);
        assert_eq!(last.snapshot.smoke_level, 150.0);
        assert_eq!(*state_rx.borrow(), last);
    }

    #[tokio::test]
    async fn push_events_are_published() {
        let transport = ScriptedTransport::default();
        let (push_tx, push_rx) = mpsc::channel(4);
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (state_tx, mut state_rx) = watch::channel(DashboardState::default());

        let task = tokio::spawn(driver(transport).run(push_rx, intents_rx, state_tx));

        push_tx.send(Ok(PushEvent::AlarmTriggered)).await.unwrap();
        state_rx
            .wait_for(|state| state.alert.active)
            .await
            .unwrap();

        push_tx.send(Ok(PushEvent::AlarmStopped)).await.unwrap();
        state_rx
            .wait_for(|state| !state.alert.active && !state.session.alarm_armed)
            .await
            .unwrap();

        drop(intents_tx);
        let last = task.await.unwrap();
        assert!(!last.alert.active);
    }

    #[tokio::test]
    async fn failed_settings_load_is_logged_and_state_kept() {
        let transport = ScriptedTransport::default();
        let (_push_tx, push_rx) = mpsc::channel(4);
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (state_tx, _state_rx) = watch::channel(DashboardState::default());

        intents_tx.send(Command::LoadSettings).unwrap();
        drop(intents_tx);
        let last = driver(transport).run(push_rx, intents_rx, state_tx).await;

        assert!(last.settings.is_none());
        assert!(last
            .log
            .iter()
            .any(|entry| entry.message == "Failed to load settings: network error: settings offline"));
    }

    #[tokio::test]
    async fn closed_push_channel_marks_connection_lost() {
        let transport = ScriptedTransport::default();
        let (push_tx, push_rx) = mpsc::channel(4);
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (state_tx, mut state_rx) = watch::channel(DashboardState::default());

        let task = tokio::spawn(driver(transport).run(push_rx, intents_rx, state_tx));
        push_tx.send(Ok(PushEvent::Connected)).await.unwrap();
        drop(push_tx);
        state_rx
            .wait_for(|state| state.system.text == "Connection Lost")
            .await
            .unwrap();

        drop(intents_tx);
        task.await.unwrap();
    }
}
