//! The polling loop that ties the pane bridge, the classifier and the idle
//! detector together.
//!
//! Lifecycle: [`DriverState::Starting`] launches the assistant in a fresh
//! tmux session, [`DriverState::Monitoring`] scans the pane every
//! `check_interval` and answers prompts or sends the auto-prompt, and
//! [`DriverState::Stopped`] kills the session once shutdown is requested.

use crate::{
    agent::{PromptDecision, ReadySignal, classify, detect_idle, detect_ready},
    clock::{Clock, Cooldowns},
    config::Config,
    event::DriverEvent,
    tmux::PaneBridge,
};
use anyhow::{Context, Result};
use std::{
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

/// Granularity of the polling loop and of shutdown checks.
pub const TICK: Duration = Duration::from_secs(1);

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Extra wait after the welcome banner, before the input box is drawn.
const BANNER_SETTLE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Starting,
    Monitoring,
    Stopped,
}

/// What one scan did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Answered(String),
    AutoPrompted,
    /// Something was due but the send failed.
    SendFailed,
    Nothing,
}

#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub check_interval: Duration,
    pub auto_prompt_interval: Duration,
    pub auto_prompt: String,
    pub command: String,
    pub start_dir: Option<PathBuf>,
    pub ready_timeout: Duration,
    pub initial_prompt: Option<String>,
}

impl DriverSettings {
    pub fn from_config(config: &Config, initial_prompt: Option<String>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            check_interval: config.check_interval(),
            auto_prompt_interval: config.auto_prompt_interval(),
            auto_prompt: config.auto_prompt.clone(),
            command: config.session.command.clone(),
            start_dir: config.session.resolved_start_dir()?,
            ready_timeout: config.session.ready_timeout(),
            initial_prompt: initial_prompt.filter(|p| !p.trim().is_empty()),
        })
    }
}

pub struct Driver<'a> {
    bridge: PaneBridge<'a>,
    clock: &'a dyn Clock,
    settings: DriverSettings,
    on_event: &'a mut dyn FnMut(DriverEvent),
    state: DriverState,
    cooldowns: Cooldowns,
    last_check: Instant,
}

impl<'a> Driver<'a> {
    pub fn new(
        bridge: PaneBridge<'a>,
        clock: &'a dyn Clock,
        settings: DriverSettings,
        on_event: &'a mut dyn FnMut(DriverEvent),
    ) -> Self {
        let now = clock.now();
        Self {
            bridge,
            clock,
            settings,
            on_event,
            state: DriverState::Starting,
            cooldowns: Cooldowns::new(now),
            last_check: now,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn cooldowns(&self) -> &Cooldowns {
        &self.cooldowns
    }

    fn emit(&mut self, event: DriverEvent) {
        (self.on_event)(event);
    }

    /// Starts the session, polls until `shutdown` is set, then cleans up.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        if let Err(e) = self.start(shutdown) {
            self.bridge.destroy_session();
            self.state = DriverState::Stopped;
            return Err(e);
        }
        while !shutdown.load(Ordering::SeqCst) {
            self.tick();
        }
        self.stop();
        Ok(())
    }

    /// Replaces any stale session with a fresh one running the assistant.
    /// A shutdown requested meanwhile cuts the readiness wait short and
    /// skips the initial prompt.
    pub fn start(&mut self, shutdown: &AtomicBool) -> Result<()> {
        let tmux_version = self.bridge.tmux().check_installed()?;
        let session = self.bridge.session().to_string();
        self.emit(DriverEvent::Starting {
            session: session.clone(),
            tmux_version,
        });

        self.bridge.destroy_session();
        self.bridge
            .create_session(self.settings.start_dir.as_deref())?;
        self.emit(DriverEvent::SessionCreated {
            session: session.clone(),
        });

        let command = self.settings.command.clone();
        self.bridge
            .send(&command, true)
            .with_context(|| format!("failed to launch '{command}' in session '{session}'"))?;
        self.emit(DriverEvent::Launching { command });

        self.wait_for_ready(shutdown);

        if let Some(text) = self.settings.initial_prompt.clone()
            && !shutdown.load(Ordering::SeqCst)
        {
            match self.bridge.send(&text, true) {
                Ok(()) => self.emit(DriverEvent::InitialPromptSent { text }),
                Err(e) => self.send_failed("initial prompt", &e),
            }
        }

        let now = self.clock.now();
        self.cooldowns = Cooldowns::new(now);
        self.last_check = now;
        self.state = DriverState::Monitoring;
        self.emit(DriverEvent::Monitoring { session });
        Ok(())
    }

    /// Best effort: gives up after the ready timeout and carries on.
    fn wait_for_ready(&mut self, shutdown: &AtomicBool) -> Option<ReadySignal> {
        let started = self.clock.now();
        while self.clock.now().saturating_duration_since(started) < self.settings.ready_timeout {
            if let Some(signal) = detect_ready(&self.bridge.read_pane()) {
                if signal == ReadySignal::WelcomeBanner {
                    self.clock.sleep(BANNER_SETTLE);
                }
                log::debug!("assistant ready: {signal:?}");
                self.emit(DriverEvent::Ready(signal));
                return Some(signal);
            }
            if shutdown.load(Ordering::SeqCst) {
                log::info!("shutdown requested while waiting for the assistant");
                return None;
            }
            self.clock.sleep(READY_POLL_INTERVAL);
        }

        let waited = self.settings.ready_timeout;
        log::warn!("assistant not ready after {waited:?}, continuing anyway");
        self.emit(DriverEvent::ReadyTimeout { waited });
        None
    }

    /// Waits one tick and scans the pane if a scan is due.
    pub fn tick(&mut self) -> Option<PollOutcome> {
        self.clock.sleep(TICK);
        let now = self.clock.now();
        if now.saturating_duration_since(self.last_check) < self.settings.check_interval {
            return None;
        }
        let outcome = self.poll_once();
        self.last_check = now;
        Some(outcome)
    }

    /// One scan: answer a visible prompt, otherwise nudge an idle assistant.
    pub fn poll_once(&mut self) -> PollOutcome {
        let now = self.clock.now();
        self.emit(DriverEvent::Scanning {
            idle_for: self.cooldowns.idle_for(now),
        });

        let snapshot = self.bridge.read_pane();

        let decision = classify(&snapshot, &self.cooldowns, now);
        log::debug!("prompt check: {decision:?}");
        self.emit(DriverEvent::PromptChecked(decision.clone()));
        if let PromptDecision::Select {
            choices,
            response,
            rule,
            ..
        } = decision
        {
            return match self.bridge.send(&response, true) {
                Ok(()) => {
                    self.cooldowns.record_response(self.clock.now());
                    log::info!("answered prompt with {response} ({rule:?})");
                    self.emit(DriverEvent::PromptAnswered {
                        choices,
                        response: response.clone(),
                        rule,
                    });
                    PollOutcome::Answered(response)
                }
                Err(e) => {
                    self.send_failed("prompt answer", &e);
                    PollOutcome::SendFailed
                }
            };
        }

        let verdict = detect_idle(
            &snapshot,
            &self.cooldowns,
            now,
            self.settings.auto_prompt_interval,
        );
        log::debug!("idle check: {verdict:?}");
        self.emit(DriverEvent::IdleChecked(verdict.clone()));
        if !verdict.is_idle() {
            return PollOutcome::Nothing;
        }

        let text = self.settings.auto_prompt.clone();
        match self.bridge.send(&text, true) {
            Ok(()) => {
                self.cooldowns.record_auto_prompt(self.clock.now());
                log::info!("sent auto-prompt");
                self.emit(DriverEvent::AutoPromptSent { text });
                PollOutcome::AutoPrompted
            }
            Err(e) => {
                self.send_failed("auto-prompt", &e);
                PollOutcome::SendFailed
            }
        }
    }

    /// Kills the session. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.state == DriverState::Stopped {
            return;
        }
        self.bridge.destroy_session();
        self.state = DriverState::Stopped;
        self.emit(DriverEvent::Stopped {
            session: self.bridge.session().to_string(),
        });
    }

    fn send_failed(&mut self, what: &'static str, error: &anyhow::Error) {
        log::warn!("{what} not delivered: {error:#}");
        self.emit(DriverEvent::SendFailed {
            what,
            error: format!("{error:#}"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::{IdleSignal, IdleVerdict, NotIdleReason, SelectionRule},
        clock::ManualClock,
        tmux::{
            CONFIRM_KEY, TmuxProvider,
            mock::{MockTmuxProvider, SentInput},
        },
    };

    const SESSION: &str = "claude-auto";
    const READY_PANE: &str = "Welcome to Claude Code!\n\n>";
    const PROMPT_PANE: &str = "Do you want to proceed?\n❯ 1. Yes\n  2. No";

    fn settings() -> DriverSettings {
        DriverSettings {
            check_interval: Duration::from_secs(20),
            auto_prompt_interval: Duration::from_secs(60),
            auto_prompt: "- keep going\n- run the tests".to_string(),
            command: "claude".to_string(),
            start_dir: None,
            ready_timeout: Duration::from_secs(10),
            initial_prompt: None,
        }
    }

    fn running() -> AtomicBool {
        AtomicBool::new(false)
    }

    fn bridge(tmux: &MockTmuxProvider) -> PaneBridge<'_> {
        PaneBridge::new(tmux, SESSION).with_confirm_delay(Duration::ZERO)
    }

    fn text(s: &str) -> SentInput {
        SentInput::Text(s.to_string())
    }

    fn enter() -> SentInput {
        SentInput::Keys(vec![CONFIRM_KEY.to_string()])
    }

    #[test]
    fn start_replaces_stale_session_and_launches_assistant() {
        let tmux = MockTmuxProvider::with_pane(READY_PANE);
        tmux.sessions.lock().unwrap().push(SESSION.to_string());
        let clock = ManualClock::new();
        let mut events = Vec::new();
        let mut on_event = |e: DriverEvent| events.push(e);

        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);
        driver.start(&running()).unwrap();
        assert_eq!(driver.state(), DriverState::Monitoring);
        drop(driver);

        assert_eq!(*tmux.killed_sessions.lock().unwrap(), vec![SESSION]);
        assert_eq!(tmux.created_sessions.lock().unwrap().len(), 1);
        assert_eq!(tmux.sent(), vec![text("claude"), enter()]);
        assert!(events.contains(&DriverEvent::Ready(ReadySignal::InputGlyph)));
        assert_eq!(
            events.last(),
            Some(&DriverEvent::Monitoring {
                session: SESSION.to_string()
            })
        );
    }

    #[test]
    fn start_fails_without_tmux() {
        let tmux = MockTmuxProvider::default();
        let clock = ManualClock::new();
        let mut on_event = |_: DriverEvent| {};
        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);

        assert!(driver.start(&running()).is_err());
        assert!(tmux.created_sessions.lock().unwrap().is_empty());
        assert!(tmux.sent().is_empty());
    }

    #[test]
    fn ready_timeout_is_not_fatal() {
        let tmux = MockTmuxProvider::with_pane("user@host:~$ claude");
        let clock = ManualClock::new();
        let started = clock.now();
        let mut events = Vec::new();
        let mut on_event = |e: DriverEvent| events.push(e);

        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);
        driver.start(&running()).unwrap();
        assert_eq!(driver.state(), DriverState::Monitoring);
        drop(driver);

        assert!(events.contains(&DriverEvent::ReadyTimeout {
            waited: Duration::from_secs(10)
        }));
        assert!(clock.now() - started >= Duration::from_secs(10));
    }

    #[test]
    fn welcome_banner_waits_for_input_box() {
        let tmux = MockTmuxProvider::with_pane("✻ Welcome to Claude Code!");
        let clock = ManualClock::new();
        let started = clock.now();
        let mut on_event = |_: DriverEvent| {};

        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);
        driver.start(&running()).unwrap();

        assert_eq!(clock.now() - started, BANNER_SETTLE);
    }

    #[test]
    fn initial_prompt_is_sent_once_after_launch() {
        let tmux = MockTmuxProvider::with_pane(READY_PANE);
        let clock = ManualClock::new();
        let mut on_event = |_: DriverEvent| {};
        let settings = DriverSettings {
            initial_prompt: Some("Implement\nthe plan".to_string()),
            ..settings()
        };

        let mut driver = Driver::new(bridge(&tmux), &clock, settings, &mut on_event);
        driver.start(&running()).unwrap();

        assert_eq!(
            tmux.sent(),
            vec![text("claude"), enter(), text("Implement the plan"), enter()]
        );
    }

    #[test]
    fn two_option_prompt_is_answered_once() {
        let tmux = MockTmuxProvider::with_pane(READY_PANE);
        let clock = ManualClock::new();
        let mut events = Vec::new();
        let mut on_event = |e: DriverEvent| events.push(e);

        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);
        driver.start(&running()).unwrap();
        tmux.push_pane(PROMPT_PANE);
        clock.advance(Duration::from_secs(120));

        assert_eq!(driver.poll_once(), PollOutcome::Answered("1".to_string()));
        let answered_at = clock.now();
        assert_eq!(driver.cooldowns().last_response, answered_at);

        // The same prompt is still on screen on the next, overlapping scan.
        clock.advance(Duration::from_secs(2));
        assert_eq!(driver.poll_once(), PollOutcome::Nothing);
        drop(driver);

        assert_eq!(
            tmux.sent(),
            vec![text("claude"), enter(), text("1"), enter()]
        );
        assert!(events.iter().any(|e| matches!(
            e,
            DriverEvent::PromptAnswered { rule: SelectionRule::YesNo, choices, .. } if choices.len() == 2
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            DriverEvent::IdleChecked(IdleVerdict::NotIdle(NotIdleReason::ResponseCooldown { .. }))
        )));
    }

    #[test]
    fn three_option_prompt_selects_second() {
        let tmux = MockTmuxProvider::with_pane(READY_PANE);
        let clock = ManualClock::new();
        let mut on_event = |_: DriverEvent| {};

        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);
        driver.start(&running()).unwrap();
        tmux.push_pane(
            "Do you want to make this edit?\n❯ 1. Yes\n  2. Yes, and don't ask again\n  3. No",
        );
        clock.advance(Duration::from_secs(120));

        assert_eq!(driver.poll_once(), PollOutcome::Answered("2".to_string()));
    }

    #[test]
    fn idle_assistant_gets_flattened_auto_prompt() {
        let tmux = MockTmuxProvider::with_pane(READY_PANE);
        let clock = ManualClock::new();
        let mut events = Vec::new();
        let mut on_event = |e: DriverEvent| events.push(e);

        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);
        driver.start(&running()).unwrap();
        tmux.push_pane("⏺ Wrote 3 files\nTask completed successfully\n>");
        clock.advance(Duration::from_secs(61));
        // The tool marker is still within the recent window.
        assert_eq!(driver.poll_once(), PollOutcome::Nothing);

        tmux.push_pane(
            &(0..25)
                .map(|i| format!("log {i}"))
                .chain(["Task completed successfully".to_string(), ">".to_string()])
                .collect::<Vec<_>>()
                .join("\n"),
        );
        assert_eq!(driver.poll_once(), PollOutcome::AutoPrompted);
        let sent_at = clock.now();
        assert_eq!(driver.cooldowns().last_auto_prompt, sent_at);
        assert_eq!(driver.cooldowns().last_response, sent_at);

        // Still idle-looking, but the auto-prompt cooldown now applies.
        clock.advance(Duration::from_secs(30));
        assert_eq!(driver.poll_once(), PollOutcome::Nothing);
        drop(driver);

        assert_eq!(
            tmux.sent_texts(),
            vec!["claude", "- keep going - run the tests"]
        );
        assert!(events.iter().any(|e| matches!(
            e,
            DriverEvent::IdleChecked(IdleVerdict::Idle(IdleSignal::InputPrompt(_)))
        )));
    }

    #[test]
    fn failed_send_leaves_cooldowns_untouched() {
        let failing = MockTmuxProvider {
            fail_sends: true,
            ..MockTmuxProvider::installed()
        };
        failing.sessions.lock().unwrap().push(SESSION.to_string());
        failing.push_pane(PROMPT_PANE);
        let clock = ManualClock::new();
        let mut events = Vec::new();
        let mut on_event = |e: DriverEvent| events.push(e);

        let mut driver = Driver::new(bridge(&failing), &clock, settings(), &mut on_event);
        let before = *driver.cooldowns();
        clock.advance(Duration::from_secs(120));

        assert_eq!(driver.poll_once(), PollOutcome::SendFailed);
        assert_eq!(*driver.cooldowns(), before);
        drop(driver);
        assert!(events.iter().any(|e| matches!(
            e,
            DriverEvent::SendFailed { what: "prompt answer", .. }
        )));
    }

    #[test]
    fn tick_scans_only_when_interval_elapsed() {
        let tmux = MockTmuxProvider::with_pane(READY_PANE);
        let clock = ManualClock::new();
        let mut on_event = |_: DriverEvent| {};

        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);
        driver.start(&running()).unwrap();
        for _ in 0..19 {
            assert_eq!(driver.tick(), None);
        }
        assert!(driver.tick().is_some());
        assert_eq!(driver.tick(), None);
    }

    #[test]
    fn shutdown_while_starting_skips_wait_and_initial_prompt() {
        let tmux = MockTmuxProvider::with_pane("user@host:~$ claude");
        let clock = ManualClock::new();
        let started = clock.now();
        let shutdown = AtomicBool::new(true);
        let mut events = Vec::new();
        let mut on_event = |e: DriverEvent| events.push(e);
        let settings = DriverSettings {
            initial_prompt: Some("start here".to_string()),
            ready_timeout: Duration::from_secs(3600),
            ..settings()
        };

        let mut driver = Driver::new(bridge(&tmux), &clock, settings, &mut on_event);
        driver.run(&shutdown).unwrap();
        assert_eq!(driver.state(), DriverState::Stopped);
        drop(driver);

        assert_eq!(clock.now(), started);
        assert_eq!(tmux.sent(), vec![text("claude"), enter()]);
        assert!(!tmux.session_exists(SESSION));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, DriverEvent::ReadyTimeout { .. }))
        );
    }

    #[test]
    fn run_stops_and_kills_session_on_shutdown() {
        let tmux = MockTmuxProvider::with_pane(READY_PANE);
        tmux.push_pane("Build finished, all tests pass\n>");
        let clock = ManualClock::new();
        let shutdown = AtomicBool::new(false);
        let mut events = Vec::new();
        let mut on_event = |e: DriverEvent| {
            if matches!(e, DriverEvent::AutoPromptSent { .. }) {
                shutdown.store(true, Ordering::SeqCst);
            }
            events.push(e);
        };

        let mut driver = Driver::new(bridge(&tmux), &clock, settings(), &mut on_event);
        driver.run(&shutdown).unwrap();
        assert_eq!(driver.state(), DriverState::Stopped);
        drop(driver);

        assert!(!tmux.session_exists(SESSION));
        assert_eq!(
            events.last(),
            Some(&DriverEvent::Stopped {
                session: SESSION.to_string()
            })
        );
        assert_eq!(
            tmux.sent_texts(),
            vec!["claude", "- keep going - run the tests"]
        );
    }
}
