use std::time::Duration;

use quote_core::{CloseOutcome, LinkMachine, LinkStatus, ReconnectPolicy};

#[test]
fn default_policy_backs_off_linearly_five_times() {
    let policy = ReconnectPolicy::default();
    let delays: Vec<_> = (1..=6).map(|attempt| policy.delay_for(attempt)).collect();

    assert_eq!(
        delays,
        vec![
            Some(Duration::from_millis(1000)),
            Some(Duration::from_millis(2000)),
            Some(Duration::from_millis(3000)),
            Some(Duration::from_millis(4000)),
            Some(Duration::from_millis(5000)),
            None,
        ]
    );
    assert_eq!(policy.delay_for(0), None);
}

#[test]
fn repeated_failures_give_up_after_budget() {
    let mut machine = LinkMachine::default();
    machine.connect("J1");
    assert_eq!(machine.status(), LinkStatus::Connecting);

    let mut delays = Vec::new();
    loop {
        match machine.closed() {
            CloseOutcome::Reconnect { delay, .. } => {
                delays.push(delay.as_millis());
                assert_eq!(machine.reconnect_due().as_deref(), Some("J1"));
            }
            CloseOutcome::GiveUp => break,
            CloseOutcome::Idle => panic!("job was targeted"),
        }
    }

    assert_eq!(delays, vec![1000, 2000, 3000, 4000, 5000]);
    assert_eq!(machine.status(), LinkStatus::Failed);
    assert_eq!(machine.reconnect_due(), None);
}

#[test]
fn open_resets_attempts() {
    let mut machine = LinkMachine::default();
    machine.connect("J1");
    machine.opened();
    assert_eq!(machine.closed(), CloseOutcome::Reconnect { attempt: 1, delay: Duration::from_millis(1000) });
    machine.reconnect_due();
    assert_eq!(machine.closed(), CloseOutcome::Reconnect { attempt: 2, delay: Duration::from_millis(2000) });
    machine.reconnect_due();
    machine.opened();

    assert_eq!(machine.attempts(), 0);
    assert_eq!(machine.status(), LinkStatus::Open);
    assert_eq!(machine.closed(), CloseOutcome::Reconnect { attempt: 1, delay: Duration::from_millis(1000) });
}

#[test]
fn disconnect_is_terminal() {
    let mut machine = LinkMachine::default();
    machine.connect("J1");
    machine.opened();
    assert!(matches!(machine.closed(), CloseOutcome::Reconnect { .. }));

    machine.disconnect();

    // A timer scheduled before the disconnect finds nothing to dial.
    assert_eq!(machine.reconnect_due(), None);
    assert_eq!(machine.closed(), CloseOutcome::Idle);
    assert_eq!(machine.status(), LinkStatus::Disconnected);
    assert_eq!(machine.job_id(), None);
}

#[test]
fn connect_after_failure_starts_fresh() {
    let policy = ReconnectPolicy {
        max_attempts: 1,
        base_delay: Duration::from_millis(10),
    };
    let mut machine = LinkMachine::new(policy);
    machine.connect("J1");
    assert!(matches!(machine.closed(), CloseOutcome::Reconnect { attempt: 1, .. }));
    machine.reconnect_due();
    assert_eq!(machine.closed(), CloseOutcome::GiveUp);

    machine.connect("J2");
    assert_eq!(machine.attempts(), 0);
    assert_eq!(machine.job_id(), Some("J2"));
    assert!(matches!(machine.closed(), CloseOutcome::Reconnect { attempt: 1, .. }));
}
