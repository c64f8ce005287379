//! Handshake and run state machines.
//!
//! The handshake loop waits for `begin keymap`, `begin params` or
//! `begin run`. Keymap and params are closed phases: anything other than
//! their own lines and terminator is fatal. `begin run` hands over to the
//! run loop, which dispatches to the animation until `end run`, the animation
//! asks to stop, or the host closes input.

use crate::animation::{Animation, Frame};
use crate::error::EngineError;
use crate::keymap::{KeyMap, Point};
use crate::resolver;
use ckb_transport::{Command, Incoming, ProtocolError, Transport};
use tracing::{debug, info, trace, warn};

/// Key state used when the host omits it
pub const DEFAULT_KEY_STATE: &str = "up";

/// Protocol phase of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    AwaitingPhase,
    KeymapPhase,
    ParamsPhase,
    Running,
    Terminated,
}

/// Why the engine stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The host sent `end run`
    EndRun,
    /// The animation returned `false` from a frame
    AnimationFinished,
    /// The host closed input
    InputClosed,
}

impl RunOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> u8 {
        0
    }
}

/// Drives one animation over one transport
pub struct Engine<T, A> {
    transport: T,
    animation: A,
    keymap: KeyMap,
    state: RunState,
}

impl<T: Transport, A: Animation> Engine<T, A> {
    pub fn new(transport: T, animation: A) -> Self {
        Self {
            transport,
            animation,
            keymap: KeyMap::new(),
            state: RunState::AwaitingPhase,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn animation(&self) -> &A {
        &self.animation
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_parts(self) -> (T, A) {
        (self.transport, self.animation)
    }

    /// Answer an info query with the animation's descriptor.
    pub fn write_info(&mut self) -> Result<(), EngineError> {
        self.animation
            .descriptor()
            .write_info(&mut self.transport)?;
        Ok(())
    }

    /// Run the handshake loop until the run loop finishes or input ends.
    pub fn run(&mut self) -> Result<RunOutcome, EngineError> {
        loop {
            match self.transport.read_command()? {
                Incoming::Eof => {
                    debug!("Input closed before run");
                    self.state = RunState::Terminated;
                    return Ok(RunOutcome::InputClosed);
                }
                Incoming::Malformed { line, error } => {
                    warn!("Unknown command: {line:?} ({error})");
                }
                Incoming::Command(cmd) if cmd.is("begin", "keymap") => self.read_keymap()?,
                Incoming::Command(cmd) if cmd.is("begin", "params") => self.read_params()?,
                Incoming::Command(cmd) if cmd.is("begin", "run") => {
                    self.state = RunState::Running;
                    let outcome = self.run_loop()?;
                    self.state = RunState::Terminated;
                    info!("Run finished: {outcome:?}");
                    return Ok(outcome);
                }
                Incoming::Command(cmd) => unknown(&cmd),
            }
        }
    }

    // ── Closed phases ────────────────────────────────────────────────

    /// Next command inside a keymap/params phase. EOF and undecodable
    /// lines are fatal here.
    fn read_in_phase(&mut self, phase: &'static str) -> Result<Command, EngineError> {
        match self.transport.read_command()? {
            Incoming::Command(cmd) => Ok(cmd),
            Incoming::Malformed { error, .. } => Err(ProtocolError::MalformedInPhase {
                phase,
                source: Box::new(error),
            }
            .into()),
            Incoming::Eof => Err(ProtocolError::EofInPhase { phase }.into()),
        }
    }

    fn read_keymap(&mut self) -> Result<(), EngineError> {
        let previous = self.state;
        self.state = RunState::KeymapPhase;

        let first = self.read_in_phase("keymap")?;
        if first.verb() != "keycount" {
            return Err(ProtocolError::KeymapWithoutKeycount {
                found: first.to_string(),
            }
            .into());
        }
        let count = first
            .param()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .ok_or_else(|| ProtocolError::InvalidKeycount(first.to_string()))?;

        let mut keymap = KeyMap::with_declared_count(count);
        loop {
            let cmd = self.read_in_phase("keymap")?;
            if cmd.verb() == "key" {
                let (Some(name), Some(pos)) = (cmd.param(), cmd.value()) else {
                    return Err(ProtocolError::InvalidCoordinate(cmd.to_string()).into());
                };
                let pos: Point = pos.parse()?;
                keymap.insert(name, pos);
            } else if cmd.is("end", "keymap") {
                break;
            } else {
                return Err(ProtocolError::UnterminatedPhase {
                    phase: "keymap",
                    found: cmd.to_string(),
                }
                .into());
            }
        }

        if keymap.len() != count {
            warn!("keycount announced {count} keys, received {}", keymap.len());
        }
        debug!(
            "Keymap loaded: {} keys, extent {}x{}",
            keymap.len(),
            keymap.max_x(),
            keymap.max_y()
        );
        self.keymap = keymap;
        self.state = previous;
        Ok(())
    }

    fn read_params(&mut self) -> Result<(), EngineError> {
        let previous = self.state;
        self.state = RunState::ParamsPhase;

        loop {
            let cmd = self.read_in_phase("params")?;
            if cmd.verb() == "param" {
                match cmd.param() {
                    Some(name) => {
                        let value = cmd.value().unwrap_or_default();
                        debug!("param {name} = {value:?}");
                        self.animation.on_param_changed(name, value);
                    }
                    None => warn!("param line without a name"),
                }
            } else if cmd.is("end", "params") {
                break;
            } else {
                return Err(ProtocolError::UnterminatedPhase {
                    phase: "params",
                    found: cmd.to_string(),
                }
                .into());
            }
        }

        self.state = previous;
        Ok(())
    }

    // ── Run loop ─────────────────────────────────────────────────────

    fn run_loop(&mut self) -> Result<RunOutcome, EngineError> {
        self.transport.send_command(&["begin", "run"])?;

        let outcome = loop {
            let cmd = match self.transport.read_command()? {
                Incoming::Command(cmd) => cmd,
                Incoming::Malformed { line, error } => {
                    warn!("Unknown command: {line:?} ({error})");
                    continue;
                }
                Incoming::Eof => {
                    debug!("Input closed during run");
                    return Ok(RunOutcome::InputClosed);
                }
            };

            if cmd.is("end", "run") {
                break RunOutcome::EndRun;
            }
            if cmd.is("begin", "params") {
                self.read_params()?;
                continue;
            }

            match cmd.verb() {
                "start" => self.animation.on_start(),
                "stop" => self.animation.on_stop(),
                "time" => match cmd.param() {
                    Some(delta) => self.animation.on_tick(delta),
                    None => unknown(&cmd),
                },
                "frame" => {
                    if !self.frame()? {
                        debug!("Animation finished");
                        break RunOutcome::AnimationFinished;
                    }
                }
                "key" => self.key_event(&cmd)?,
                _ => unknown(&cmd),
            }
        };

        self.transport.send_command(&["end", "run"])?;
        Ok(outcome)
    }

    fn frame(&mut self) -> Result<bool, EngineError> {
        self.transport.send_command(&["begin", "frame"])?;
        let keep_going = {
            let mut frame = Frame::new(&self.keymap, &mut self.transport);
            let keep_going = self.animation.on_frame(&mut frame)?;
            trace!("frame: {} of {} keys colored", frame.emitted(), self.keymap.len());
            keep_going
        };
        self.transport.send_command(&["end", "frame"])?;
        Ok(keep_going)
    }

    fn key_event(&mut self, cmd: &Command) -> Result<(), EngineError> {
        let Some(pos) = cmd.param().and_then(|p| p.parse::<Point>().ok()) else {
            unknown(cmd);
            return Ok(());
        };
        let key = resolver::nearest(&self.keymap, pos.x, pos.y)?;
        let state = cmd.value().unwrap_or(DEFAULT_KEY_STATE);
        self.animation.on_key_press(key, pos.x, pos.y, state);
        Ok(())
    }
}

fn unknown(cmd: &Command) {
    warn!("Unknown command: {cmd}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AnimationDescriptor;
    use ckb_transport::LineTransport;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        descriptor: AnimationDescriptor,
        calls: Vec<String>,
    }

    impl Animation for Recorder {
        fn descriptor(&self) -> &AnimationDescriptor {
            &self.descriptor
        }
        fn on_param_changed(&mut self, name: &str, value: &str) {
            self.calls.push(format!("param {name}={value}"));
        }
        fn on_start(&mut self) {
            self.calls.push("start".into());
        }
        fn on_stop(&mut self) {
            self.calls.push("stop".into());
        }
        fn on_tick(&mut self, delta: &str) {
            self.calls.push(format!("tick {delta}"));
        }
        fn on_key_press(&mut self, key: &str, x: i32, y: i32, state: &str) {
            self.calls.push(format!("key {key} {x},{y} {state}"));
        }
    }

    type TestEngine = Engine<LineTransport<Cursor<Vec<u8>>, Vec<u8>>, Recorder>;

    fn engine(input: &str) -> TestEngine {
        let transport = LineTransport::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        Engine::new(transport, Recorder::default())
    }

    fn output(engine: TestEngine) -> String {
        let (transport, _) = engine.into_parts();
        String::from_utf8(transport.into_writer()).unwrap()
    }

    #[test]
    fn test_frame_before_run_is_unknown() {
        let mut e = engine("frame\nframe\nbegin keymap\nkeycount 0\nend keymap\n");
        assert_eq!(e.state(), RunState::AwaitingPhase);
        assert_eq!(e.run().unwrap(), RunOutcome::InputClosed);
        // The keymap phase after the stray frames was still honoured
        assert_eq!(e.keymap().declared_count(), Some(0));
        assert_eq!(output(e), "");
    }

    #[test]
    fn test_keymap_phase_replaces_map() {
        let mut e = engine(
            "begin keymap\nkeycount 2\nkey a 1,2\nkey b 30,4\nend keymap\n\
             begin keymap\nkeycount 1\nkey z 5,5\nend keymap\n",
        );
        e.run().unwrap();
        assert_eq!(e.keymap().len(), 1);
        assert_eq!(e.keymap().get("z"), Some(Point::new(5, 5)));
        assert!(!e.keymap().contains("a"));
        assert_eq!(e.keymap().declared_count(), Some(1));
    }

    #[test]
    fn test_keymap_requires_keycount() {
        let mut e = engine("begin keymap\nkey a 1,2\nend keymap\n");
        let err = e.run().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Protocol(ProtocolError::KeymapWithoutKeycount { .. })
        ));
        assert_eq!(e.state(), RunState::KeymapPhase);
    }

    #[test]
    fn test_keymap_wrong_terminator_is_fatal() {
        let mut e = engine("begin keymap\nkeycount 1\nkey a 1,2\nend params\n");
        assert!(matches!(
            e.run().unwrap_err(),
            EngineError::Protocol(ProtocolError::UnterminatedPhase { phase: "keymap", .. })
        ));
    }

    #[test]
    fn test_keymap_eof_is_fatal() {
        let mut e = engine("begin keymap\nkeycount 1\nkey a 1,2\n");
        assert!(matches!(
            e.run().unwrap_err(),
            EngineError::Protocol(ProtocolError::EofInPhase { phase: "keymap" })
        ));
    }

    #[test]
    fn test_keymap_bad_keycount() {
        let mut e = engine("begin keymap\nkeycount lots\nend keymap\n");
        assert!(matches!(
            e.run().unwrap_err(),
            EngineError::Protocol(ProtocolError::InvalidKeycount(_))
        ));
    }

    #[test]
    fn test_params_forwarded_in_order() {
        let mut e = engine("begin params\nparam speed 2.5\nparam color ff00ff00\nend params\n");
        e.run().unwrap();
        assert_eq!(e.animation().calls, vec!["param speed=2.5", "param color=ff00ff00"]);
        assert_eq!(e.state(), RunState::Terminated);
    }

    #[test]
    fn test_params_wrong_terminator_is_fatal() {
        let mut e = engine("begin params\nparam a 1\nframe\n");
        assert!(matches!(
            e.run().unwrap_err(),
            EngineError::Protocol(ProtocolError::UnterminatedPhase { phase: "params", .. })
        ));
    }

    #[test]
    fn test_malformed_line_in_phase_is_fatal() {
        let mut e = engine("begin params\nparam a %zz\nend params\n");
        assert!(matches!(
            e.run().unwrap_err(),
            EngineError::Protocol(ProtocolError::MalformedInPhase { phase: "params", .. })
        ));
    }

    #[test]
    fn test_run_dispatches_callbacks() {
        let mut e = engine(
            "begin keymap\nkeycount 2\nkey a 0,0\nkey b 10,0\nend keymap\n\
             begin run\nstart\ntime 0.25\nkey 9,1 down\nkey 1,0\nstop\nend run\n",
        );
        assert_eq!(e.run().unwrap(), RunOutcome::EndRun);
        assert_eq!(
            e.animation().calls,
            vec![
                "start",
                "tick 0.25",
                "key b 9,1 down",
                "key a 1,0 up",
                "stop"
            ]
        );
        assert_eq!(output(e), "begin run\nend run\n");
    }

    #[test]
    fn test_params_inside_run_resume_running() {
        let mut e = engine("begin run\nbegin params\nparam x 1\nend params\nstart\nend run\n");
        assert_eq!(e.run().unwrap(), RunOutcome::EndRun);
        assert_eq!(e.animation().calls, vec!["param x=1", "start"]);
    }

    #[test]
    fn test_key_without_keymap_is_resolution_error() {
        let mut e = engine("begin run\nkey 1,1 down\n");
        assert!(matches!(e.run().unwrap_err(), EngineError::Resolution(_)));
    }

    #[test]
    fn test_bad_coordinate_in_run_is_skipped() {
        let mut e = engine(
            "begin keymap\nkeycount 1\nkey a 0,0\nend keymap\nbegin run\nkey nowhere\ntime\nstart\nend run\n",
        );
        assert_eq!(e.run().unwrap(), RunOutcome::EndRun);
        assert_eq!(e.animation().calls, vec!["start"]);
    }

    #[test]
    fn test_eof_mid_run_skips_end_run() {
        let mut e = engine("begin run\nframe\n");
        assert_eq!(e.run().unwrap(), RunOutcome::InputClosed);
        assert_eq!(e.state(), RunState::Terminated);
        assert_eq!(e.transport().lines_written(), 3);
        assert_eq!(e.transport().lines_read(), 2);
        assert_eq!(output(e), "begin run\nbegin frame\nend frame\n");
    }

    #[test]
    fn test_write_info_defaults() {
        let mut e = engine("");
        e.write_info().unwrap();
        let out = output(e);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "name %3Cname%3E");
        assert_eq!(lines[5], "guid {E0BBA19E-C328-4C0E-8E3C-A06D5722B4FB}");
        assert_eq!(lines[6], "description A%20generic%20animation%20plugin");
        assert_eq!(&lines[7..], &["kpmode position", "time duration", "parammode live", "preempt on"]);
    }
}
