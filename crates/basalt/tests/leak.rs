//! Text ownership discipline.
//!
//! Every text-returning operation deep-copies the native buffer and then
//! releases it. The stub backend counts its live text allocations, so
//! repeated calls must leave the count where it started. This lives in its
//! own test binary because the counter is process-global.

#![cfg(feature = "stub")]

use basalt::{Basalt, SatResult};

#[test]
fn test_repeated_text_returns_leave_no_native_buffers() {
    let basalt = Basalt::stub();
    let config = basalt.config().unwrap();
    let env = basalt.env(&config).unwrap();

    let ty = env.bool_type().unwrap();
    let p = env.make_constant(env.declare("p", ty).unwrap()).unwrap();
    let n = env.make_number("355/113").unwrap();
    env.assert_formula(p).unwrap();
    assert_eq!(env.solve().unwrap(), SatResult::Sat);

    let before = basalt_sys::stub::outstanding_text_buffers();
    for _ in 0..1000 {
        let printed = p.to_smtlib2().unwrap();
        assert_eq!(printed, "p");
        let value = n.to_rational().unwrap();
        assert_eq!(value.to_string(), "355/113");
        // Error paths claim and release diagnostics text too.
        assert!(env.parse_smtlib2("(and nope true)").is_err());
    }
    let after = basalt_sys::stub::outstanding_text_buffers();
    assert_eq!(after, before, "native text buffers leaked");
}
