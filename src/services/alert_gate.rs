//! Deduplicating gate for opportunity alerts.
//!
//! Remembers the last emitted direction, price and time. A directional
//! call passes when the direction changed, or when the cooldown has
//! elapsed and price moved by at least the minimum delta. Indecisive calls
//! never pass and never touch the memory.

use crate::config::Settings;
use crate::types::{AggregateCall, Direction};
use chrono::{DateTime, Duration, Utc};

/// Last emitted alert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertMemory {
    pub direction: Direction,
    pub price: f64,
    pub at: DateTime<Utc>,
}

/// Repeat-suppression parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatePolicy {
    pub cooldown: Duration,
    pub min_price_delta: f64,
}

impl GatePolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            cooldown: settings.alert_cooldown(),
            min_price_delta: settings.alert_min_price_delta,
        }
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Why an alert was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitReason {
    /// Nothing emitted since startup.
    First,
    DirectionChanged,
    /// Same direction, but the cooldown elapsed and price moved enough.
    Refresh,
}

#[derive(Debug, Default)]
pub struct AlertGate {
    last: Option<AlertMemory>,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&AlertMemory> {
        self.last.as_ref()
    }

    /// Decide whether `call` at `price` should be emitted, without recording.
    pub fn check(
        &self,
        call: AggregateCall,
        price: f64,
        now: DateTime<Utc>,
        policy: &GatePolicy,
    ) -> Option<EmitReason> {
        let direction = call.direction()?;

        let Some(last) = self.last else {
            return Some(EmitReason::First);
        };

        if last.direction != direction {
            return Some(EmitReason::DirectionChanged);
        }

        let cooled_down = now - last.at > policy.cooldown;
        let moved = (price - last.price).abs() >= policy.min_price_delta;
        if cooled_down && moved {
            Some(EmitReason::Refresh)
        } else {
            None
        }
    }

    /// Check and, when the alert passes, record it as the last emission.
    pub fn admit(
        &mut self,
        call: AggregateCall,
        price: f64,
        now: DateTime<Utc>,
        policy: &GatePolicy,
    ) -> Option<EmitReason> {
        let reason = self.check(call, price, now, policy)?;
        let direction = call.direction()?;
        self.last = Some(AlertMemory {
            direction,
            price,
            at: now,
        });
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn policy(minutes: i64, delta: f64) -> GatePolicy {
        GatePolicy {
            cooldown: Duration::minutes(minutes),
            min_price_delta: delta,
        }
    }

    #[test]
    fn test_indecisive_never_emits() {
        let mut gate = AlertGate::new();
        let p = policy(30, 0.0);
        for hours in 0..5 {
            let now = t0() + Duration::hours(hours);
            assert_eq!(gate.admit(AggregateCall::Indecisive, 2000.0, now, &p), None);
        }
        assert!(gate.last().is_none());
    }

    #[test]
    fn test_first_directional_call_emits() {
        let mut gate = AlertGate::new();
        assert_eq!(
            gate.admit(AggregateCall::Buy, 2000.0, t0(), &GatePolicy::default()),
            Some(EmitReason::First)
        );
        let last = gate.last().unwrap();
        assert_eq!(last.direction, Direction::Buy);
        assert_eq!(last.price, 2000.0);
        assert_eq!(last.at, t0());
    }

    #[test]
    fn test_repeated_call_within_cooldown_emits_once() {
        let mut gate = AlertGate::new();
        let p = policy(30, 3.0);
        let emitted = (0..10)
            .filter(|i| {
                let now = t0() + Duration::minutes(*i);
                gate.admit(AggregateCall::Sell, 2000.0 + *i as f64 * 0.1, now, &p)
                    .is_some()
            })
            .count();
        assert_eq!(emitted, 1);
    }

    #[test]
    fn test_direction_change_emits_immediately() {
        let mut gate = AlertGate::new();
        let p = policy(30, 3.0);
        gate.admit(AggregateCall::Buy, 2000.0, t0(), &p);
        assert_eq!(
            gate.admit(AggregateCall::Sell, 2000.0, t0() + Duration::minutes(1), &p),
            Some(EmitReason::DirectionChanged)
        );
        assert_eq!(gate.last().unwrap().direction, Direction::Sell);
    }

    #[test]
    fn test_refresh_needs_cooldown_and_move() {
        let mut gate = AlertGate::new();
        let p = policy(30, 3.0);
        gate.admit(AggregateCall::Buy, 2000.0, t0(), &p);

        // Cooldown elapsed, price flat
        let later = t0() + Duration::minutes(31);
        assert_eq!(gate.check(AggregateCall::Buy, 2001.0, later, &p), None);

        // Price moved, cooldown not elapsed
        let soon = t0() + Duration::minutes(10);
        assert_eq!(gate.check(AggregateCall::Buy, 2010.0, soon, &p), None);

        // Exactly at the cooldown boundary is not enough
        let boundary = t0() + Duration::minutes(30);
        assert_eq!(gate.check(AggregateCall::Buy, 2010.0, boundary, &p), None);

        assert_eq!(
            gate.admit(AggregateCall::Buy, 2003.0, later, &p),
            Some(EmitReason::Refresh)
        );
        assert_eq!(gate.last().unwrap().at, later);
    }

    #[test]
    fn test_zero_delta_refreshes_after_cooldown() {
        let mut gate = AlertGate::new();
        let p = policy(20, 0.0);
        gate.admit(AggregateCall::Sell, 2000.0, t0(), &p);
        assert_eq!(
            gate.admit(AggregateCall::Sell, 2000.0, t0() + Duration::minutes(21), &p),
            Some(EmitReason::Refresh)
        );
    }

    #[test]
    fn test_indecisive_keeps_memory() {
        let mut gate = AlertGate::new();
        let p = policy(30, 0.0);
        gate.admit(AggregateCall::Buy, 2000.0, t0(), &p);
        gate.admit(AggregateCall::Indecisive, 1990.0, t0() + Duration::minutes(5), &p);
        // Still suppressed: same direction as the remembered one, within cooldown
        assert_eq!(
            gate.admit(AggregateCall::Buy, 2000.0, t0() + Duration::minutes(6), &p),
            None
        );
    }

    #[test]
    fn test_policy_from_settings() {
        let mut settings = Settings::default();
        settings.alert_cooldown_minutes = 20.0;
        settings.alert_min_price_delta = 3.0;
        let p = GatePolicy::from_settings(&settings);
        assert_eq!(p.cooldown, Duration::minutes(20));
        assert_eq!(p.min_price_delta, 3.0);
    }
}
