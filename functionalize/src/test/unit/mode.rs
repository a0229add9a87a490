use crate::mode::{Mode, ModeStack};

#[test]
fn empty_stack_means_concrete() {
    let stack = ModeStack::new();
    assert_eq!(stack.current(), Mode::Concrete);
}

#[test]
fn guards_restore_on_drop() {
    let stack = ModeStack::new();
    {
        let _outer = stack.enter(Mode::Trace);
        assert_eq!(stack.current(), Mode::Trace);
        {
            let _inner = stack.enter(Mode::Abstract);
            assert_eq!(stack.current(), Mode::Abstract);
        }
        assert_eq!(stack.current(), Mode::Trace);
    }
    assert_eq!(stack.current(), Mode::Concrete);
    assert_eq!(stack.depth(), 0);
}

#[test]
fn suspend_top_restores_the_suspended_mode() {
    let stack = ModeStack::new();
    let _trace = stack.enter(Mode::Trace);
    {
        let _suspended = stack.suspend_top();
        assert_eq!(stack.current(), Mode::Concrete);
    }
    assert_eq!(stack.current(), Mode::Trace);
}

#[test]
fn suspend_if_only_matches_the_topmost_mode() {
    let stack = ModeStack::new();
    let _trace = stack.enter(Mode::Trace);

    // Top is Trace, not Functionalize: nothing suspended.
    {
        let _noop = stack.suspend_if(Mode::Functionalize);
        assert_eq!(stack.current(), Mode::Trace);
    }
    assert_eq!(stack.current(), Mode::Trace);

    let _func = stack.enter(Mode::Functionalize);
    {
        let _suspended = stack.suspend_if(Mode::Functionalize);
        assert_eq!(stack.current(), Mode::Trace);
    }
    assert_eq!(stack.current(), Mode::Functionalize);
}

#[test]
fn guards_restore_across_early_exits() {
    let stack = ModeStack::new();

    fn fails_under_abstract(stack: &ModeStack) -> Result<(), ()> {
        let _guard = stack.enter(Mode::Abstract);
        Err(())
    }

    let _trace = stack.enter(Mode::Trace);
    assert!(fails_under_abstract(&stack).is_err());
    // The abstract guard unwound; the outer mode is intact.
    assert_eq!(stack.current(), Mode::Trace);
    assert_eq!(stack.depth(), 1);
}
