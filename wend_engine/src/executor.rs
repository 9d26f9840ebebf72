//! Cooperative interpreter for parsed transitions.
//!
//! One executor call runs one transition to completion or failure against
//! an [`ActionContext`]. Scripts are linear action sequences; the only
//! suspension points are pattern waits, sleeps, and roundtime waits, and
//! those belong to the context implementation. Nothing here retries:
//! retry idioms (multi-send prompts, conditional probes) are expressed in
//! the snippets themselves, and failures always propagate to the caller.

use std::time::Duration;

use log::debug;
use thiserror::Error;

use wend_script::Action;

use crate::context::{ActionContext, ContextError};
use crate::id::{MapId, NodeId};
use crate::registry::{LookupError, MapRegistry};
use crate::transition::Transition;

/// Bound on chained cross-map calls; exceeding it is an error, not a hang.
pub const MAX_CALL_DEPTH: usize = 8;

/// A transition that did not run to completion, carrying the action that
/// failed and its cause.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecuteError {
    /// A bounded pattern wait elapsed without the expected text.
    #[error("{action}: timed out after {timeout_secs}s waiting for {pattern}")]
    Timeout {
        action: String,
        pattern: String,
        timeout_secs: f64,
    },
    /// A context primitive failed outright.
    #[error("{action}: {source}")]
    Failed {
        action: String,
        #[source]
        source: ContextError,
    },
    /// A cross-map call addressed an edge the registry cannot resolve.
    #[error(transparent)]
    CrossCall(#[from] LookupError),
    /// A cross-map call used a non-numeric target key.
    #[error("cross-call target `{0}` is not a node id")]
    CrossCallTarget(String),
    /// Cross-map calls chained past [`MAX_CALL_DEPTH`].
    #[error("cross-call chain exceeded {0} levels")]
    CallDepth(usize),
}

/// Executes transitions against an [`ActionContext`], resolving cross-map
/// calls through an injected registry.
#[derive(Debug, Clone, Copy)]
pub struct Executor<'a> {
    registry: &'a MapRegistry,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a MapRegistry) -> Self {
        Executor { registry }
    }

    /// Run one transition to completion.
    ///
    /// Direction transitions are issued as a single command line; script
    /// transitions run their action sequence in order.
    ///
    /// # Errors
    /// Returns an [`ExecuteError`] naming the first action that did not
    /// complete and why.
    pub fn execute<C: ActionContext + ?Sized>(
        &self,
        transition: &Transition,
        ctx: &mut C,
    ) -> Result<(), ExecuteError> {
        self.execute_at(transition, ctx, 0)
    }

    fn execute_at<C: ActionContext + ?Sized>(
        &self,
        transition: &Transition,
        ctx: &mut C,
        depth: usize,
    ) -> Result<(), ExecuteError> {
        match transition {
            Transition::Direction(direction) => {
                debug!("└─ direction: {direction}");
                ctx.send(direction.as_str()).map_err(|source| ExecuteError::Failed {
                    action: format!("move `{direction}`"),
                    source,
                })
            },
            Transition::Script(script) => self.run_actions(script.actions(), ctx, depth),
        }
    }

    fn run_actions<C: ActionContext + ?Sized>(
        &self,
        actions: &[Action],
        ctx: &mut C,
        depth: usize,
    ) -> Result<(), ExecuteError> {
        for action in actions {
            self.run_action(action, ctx, depth)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn run_action<C: ActionContext + ?Sized>(
        &self,
        action: &Action,
        ctx: &mut C,
        depth: usize,
    ) -> Result<(), ExecuteError> {
        match action {
            Action::NoOp => {
                debug!("└─ action: no-op");
                Ok(())
            },
            Action::Send(line) => {
                debug!("└─ action: send `{line}`");
                ctx.send(line).map_err(|source| ExecuteError::Failed {
                    action: format!("send `{line}`"),
                    source,
                })
            },
            Action::MultiSend(lines) => {
                for line in lines {
                    debug!("└─ action: send `{line}`");
                    ctx.send(line).map_err(|source| ExecuteError::Failed {
                        action: format!("send `{line}`"),
                        source,
                    })?;
                }
                Ok(())
            },
            Action::WaitFor {
                pattern,
                timeout_secs,
            } => {
                debug!("└─ action: waitfor {pattern}");
                let timeout = timeout_secs.map(Duration::from_secs_f64);
                match ctx.wait_for_pattern(pattern, timeout) {
                    Ok(matched) => {
                        debug!("└─ matched: {matched}");
                        Ok(())
                    },
                    Err(err) => Err(wait_error(format!("waitfor {pattern}"), err)),
                }
            },
            Action::Sleep { seconds } => {
                debug!("└─ action: sleep {seconds}s");
                ctx.sleep(Duration::from_secs_f64(*seconds))
                    .map_err(|source| ExecuteError::Failed {
                        action: format!("sleep {seconds}s"),
                        source,
                    })
            },
            Action::WaitRoundtime => {
                debug!("└─ action: wait for roundtime to clear");
                if ctx.action_delay_active() {
                    ctx.wait_for_action_delay_clear()
                        .map_err(|source| ExecuteError::Failed {
                            action: "wait for roundtime".to_string(),
                            source,
                        })?;
                }
                Ok(())
            },
            Action::Conditional {
                command,
                timeout_secs,
                pattern,
            } => {
                // probe first: when the desired state is already reported
                // the send would be redundant
                let timeout = Duration::from_secs_f64(*timeout_secs);
                match ctx.wait_for_pattern(pattern, Some(timeout)) {
                    Ok(matched) => {
                        debug!("└─ action: `{command}` skipped, already satisfied by: {matched}");
                        Ok(())
                    },
                    Err(ContextError::Timeout { .. }) => {
                        debug!("└─ action: send `{command}` (probe for {pattern} came up empty)");
                        ctx.send(command).map_err(|source| ExecuteError::Failed {
                            action: format!("send `{command}`"),
                            source,
                        })
                    },
                    Err(source) => Err(ExecuteError::Failed {
                        action: format!("probe for {pattern}"),
                        source,
                    }),
                }
            },
            Action::Repeat { count, body } => {
                debug!("└─ action: repeat x{count}");
                for _ in 0..*count {
                    self.run_actions(body, ctx, depth)?;
                }
                Ok(())
            },
            Action::CrossCall { map, target } => {
                if depth + 1 > MAX_CALL_DEPTH {
                    return Err(ExecuteError::CallDepth(MAX_CALL_DEPTH));
                }
                let target_id: NodeId = target
                    .parse()
                    .map_err(|_| ExecuteError::CrossCallTarget(target.clone()))?;
                let map_id = MapId::from(map.as_str());
                debug!("└─ action: cross-call Map[{map_id}].wayto[{target_id}]");
                let transition = self.registry.resolve(&map_id, target_id)?;
                self.execute_at(transition, ctx, depth + 1)
            },
            Action::SetVar { key, value } => {
                debug!("└─ action: set {key} = {value}");
                ctx.set_var(key, value);
                Ok(())
            },
        }
    }
}

fn wait_error(action: String, err: ContextError) -> ExecuteError {
    match err {
        ContextError::Timeout {
            pattern,
            timeout_secs,
        } => ExecuteError::Timeout {
            action,
            pattern,
            timeout_secs,
        },
        other => ExecuteError::Failed {
            action,
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MapNode;
    use std::collections::{HashMap, VecDeque};
    use wend_script::Pattern;

    /// Scripted stand-in for a live session.
    #[derive(Debug, Default)]
    struct MockContext {
        sent: Vec<String>,
        incoming: VecDeque<String>,
        delay_active: bool,
        delay_waits: usize,
        slept: Vec<Duration>,
        vars: HashMap<String, String>,
        sends_fail: bool,
    }

    impl MockContext {
        fn with_incoming(lines: &[&str]) -> Self {
            MockContext {
                incoming: lines.iter().map(ToString::to_string).collect(),
                ..MockContext::default()
            }
        }
    }

    impl ActionContext for MockContext {
        fn send(&mut self, line: &str) -> Result<(), ContextError> {
            if self.sends_fail {
                return Err(ContextError::Unavailable("connection lost".into()));
            }
            self.sent.push(line.to_string());
            Ok(())
        }

        fn wait_for_pattern(
            &mut self,
            pattern: &Pattern,
            timeout: Option<Duration>,
        ) -> Result<String, ContextError> {
            while let Some(line) = self.incoming.pop_front() {
                if pattern.matches(&line) {
                    return Ok(line);
                }
            }
            match timeout {
                Some(bound) => Err(ContextError::Timeout {
                    pattern: pattern.to_string(),
                    timeout_secs: bound.as_secs_f64(),
                }),
                None => Err(ContextError::Unavailable(
                    "unbounded wait with no scripted output".into(),
                )),
            }
        }

        fn sleep(&mut self, duration: Duration) -> Result<(), ContextError> {
            self.slept.push(duration);
            Ok(())
        }

        fn action_delay_active(&self) -> bool {
            self.delay_active
        }

        fn wait_for_action_delay_clear(&mut self) -> Result<(), ContextError> {
            self.delay_waits += 1;
            self.delay_active = false;
            Ok(())
        }

        fn get_var(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }

        fn set_var(&mut self, key: &str, value: &str) {
            self.vars.insert(key.to_string(), value.to_string());
        }
    }

    fn registry() -> MapRegistry {
        MapRegistry::new()
    }

    fn run(registry: &MapRegistry, text: &str, ctx: &mut MockContext) -> Result<(), ExecuteError> {
        let transition = Transition::parse(text).unwrap();
        Executor::new(registry).execute(&transition, ctx)
    }

    #[test]
    fn direction_executes_as_single_send() {
        let registry = registry();
        let mut ctx = MockContext::default();
        run(&registry, "northeast", &mut ctx).unwrap();
        assert_eq!(ctx.sent, vec!["northeast"]);
    }

    #[test]
    fn noop_script_succeeds_without_side_effects() {
        let registry = registry();
        let mut ctx = MockContext::default();
        run(&registry, ";e true", &mut ctx).unwrap();
        assert!(ctx.sent.is_empty());
    }

    #[test]
    fn multi_send_preserves_order_then_waits() {
        let registry = registry();
        let mut ctx = MockContext::with_incoming(&[
            "The portmaster nods.",
            "A crew member escorts you off the ship.",
        ]);
        run(
            &registry,
            ";e multifput 'ask portmaster about travel 2','ask portmaster about travel 2';waitfor 'A crew member escorts you off the ship.'",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(
            ctx.sent,
            vec![
                "ask portmaster about travel 2",
                "ask portmaster about travel 2",
            ]
        );
    }

    #[test]
    fn unbounded_waitfor_completes_when_text_arrives() {
        let registry = registry();
        let mut ctx = MockContext::with_incoming(&["X"]);
        run(&registry, ";e waitfor 'X'", &mut ctx).unwrap();
    }

    #[test]
    fn bounded_wait_timeout_surfaces_as_timeout_error() {
        let registry = registry();
        let mut ctx = MockContext::default();
        let action = Action::WaitFor {
            pattern: Pattern::literal("X"),
            timeout_secs: Some(5.0),
        };
        let err = Executor::new(&registry)
            .run_action(&action, &mut ctx, 0)
            .unwrap_err();
        match err {
            ExecuteError::Timeout {
                action,
                pattern,
                timeout_secs,
            } => {
                assert_eq!(action, "waitfor 'X'");
                assert_eq!(pattern, "'X'");
                assert!((timeout_secs - 5.0).abs() < f64::EPSILON);
            },
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn conditional_skips_send_when_pattern_already_satisfied() {
        let registry = registry();
        let mut ctx = MockContext::with_incoming(&["You head over to the ghost table."]);
        run(
            &registry,
            ";e fput \"go ghost table\" if dothistimeout(\"go ghost table\", 25, /head over to|inviting you/) =~ /inviting you/",
            &mut ctx,
        )
        .unwrap();
        assert!(ctx.sent.is_empty());
    }

    #[test]
    fn conditional_sends_when_probe_times_out() {
        let registry = registry();
        let mut ctx = MockContext::default();
        run(
            &registry,
            ";e fput \"go ghost table\" if dothistimeout(\"go ghost table\", 25, /head over to|inviting you/) =~ /inviting you/",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(ctx.sent, vec!["go ghost table"]);
    }

    #[test]
    fn repeat_runs_body_count_times() {
        let registry = registry();
        let mut ctx = MockContext::default();
        run(&registry, ";e 2.times{fput \"quest transport duskruin\"}", &mut ctx).unwrap();
        assert_eq!(
            ctx.sent,
            vec!["quest transport duskruin", "quest transport duskruin"]
        );
    }

    #[test]
    fn roundtime_wait_drains_delay_state() {
        let registry = registry();
        let mut ctx = MockContext {
            delay_active: true,
            ..MockContext::default()
        };
        run(&registry, ";e move 'northeast'; waitrt?", &mut ctx).unwrap();
        assert_eq!(ctx.sent, vec!["northeast"]);
        assert_eq!(ctx.delay_waits, 1);
        assert!(!ctx.delay_active);
    }

    #[test]
    fn roundtime_wait_is_a_noop_when_no_delay() {
        let registry = registry();
        let mut ctx = MockContext::default();
        run(&registry, ";e waitrt?", &mut ctx).unwrap();
        assert_eq!(ctx.delay_waits, 0);
    }

    #[test]
    fn sleep_suspends_for_requested_duration() {
        let registry = registry();
        let mut ctx = MockContext::default();
        run(&registry, ";e sleep 0.5", &mut ctx).unwrap();
        assert_eq!(ctx.slept, vec![Duration::from_millis(500)]);
    }

    #[test]
    fn set_var_lands_in_context_store() {
        let registry = registry();
        let mut ctx = MockContext::default();
        run(
            &registry,
            ";e 2.times{fput \"quest transport duskruin\"};UserVars.mapdb_duskruin_origin = 28908;",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(
            ctx.get_var("mapdb_duskruin_origin").as_deref(),
            Some("28908")
        );
    }

    #[test]
    fn cross_call_executes_foreign_transition() {
        let mut registry = MapRegistry::new();
        let mut node = MapNode::default();
        node.wayto.insert(
            NodeId::new(3668),
            Transition::parse(";e fput 'go gate'").unwrap(),
        );
        registry.insert_map(MapId::from("7"), node);

        let mut ctx = MockContext::default();
        run(&registry, ";e Map[7].wayto['3668'].call", &mut ctx).unwrap();
        assert_eq!(ctx.sent, vec!["go gate"]);
    }

    #[test]
    fn cross_call_to_missing_edge_is_a_lookup_error() {
        let mut registry = MapRegistry::new();
        registry.insert_map(MapId::from("7"), MapNode::default());

        let mut ctx = MockContext::default();
        let err = run(&registry, ";e Map[7].wayto['3668'].call", &mut ctx).unwrap_err();
        assert_eq!(
            err,
            ExecuteError::CrossCall(LookupError::NotFound {
                map: MapId::from("7"),
                target: NodeId::new(3668),
            })
        );
    }

    #[test]
    fn self_referential_cross_calls_hit_the_depth_bound() {
        let mut registry = MapRegistry::new();
        let mut node = MapNode::default();
        node.wayto.insert(
            NodeId::new(1),
            Transition::parse(";e Map[7].wayto['1'].call").unwrap(),
        );
        registry.insert_map(MapId::from("7"), node);

        let mut ctx = MockContext::default();
        let err = run(&registry, ";e Map[7].wayto['1'].call", &mut ctx).unwrap_err();
        assert_eq!(err, ExecuteError::CallDepth(MAX_CALL_DEPTH));
    }

    #[test]
    fn send_failure_surfaces_action_and_cause() {
        let registry = registry();
        let mut ctx = MockContext {
            sends_fail: true,
            ..MockContext::default()
        };
        let err = run(&registry, ";e fput 'go gate'", &mut ctx).unwrap_err();
        match err {
            ExecuteError::Failed { action, source } => {
                assert_eq!(action, "send `go gate`");
                assert_eq!(source, ContextError::Unavailable("connection lost".into()));
            },
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
