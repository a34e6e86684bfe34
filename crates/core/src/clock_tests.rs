// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_is_past_2020() {
    // 2020-01-01 in epoch ms
    assert!(SystemClock.now_ms() > 1_577_836_800_000);
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let start = clock.now_ms();

    clock.advance(Duration::from_millis(1500));

    assert_eq!(clock.now_ms(), start + 1500);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();

    clock.set_ms(42_000);

    assert_eq!(other.now_ms(), 42_000);
}
