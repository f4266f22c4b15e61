//! # Balance Change Interceptor
//!
//! Replays module-side balance notifications onto the EVM ledger.
//!
//! Each precompile frame opens a scope anchored at the notification-log
//! length visible when the frame began. Closing the scope walks everything
//! appended since, turns `coin_spent` / `coin_received` records into
//! [`LedgerDelta`]s and applies them atomically.
//!
//! ## Nesting
//!
//! Scopes live in an arena indexed by frame depth. When an inner scope
//! closes successfully, the log range it replayed is recorded on its parent
//! so the parent never applies the same notification twice.
//!
//! ```text
//! log:    [ .. | a b | c d e | f ]
//!              ^outer  ^inner
//! inner replays c d e, outer replays a b f
//! ```

use crate::config::BridgeConfig;
use crate::domain::entities::{
    notification_attrs, notification_kinds, BalanceChangeReason, DeltaDirection, LedgerDelta,
    Notification,
};
use crate::domain::services::{amount_of, parse_address, parse_coins, to_evm_amount};
use crate::errors::InterceptError;
use crate::ports::outbound::{EvmLedger, NotificationLog};
use std::ops::Range;
use tracing::{debug, trace};

// =============================================================================
// SCOPES
// =============================================================================

/// Token for one open scope. Must be closed exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an open scope must be closed with end_scope or discard_scope"]
pub struct ScopeHandle {
    depth: usize,
}

impl ScopeHandle {
    /// Arena index of the scope.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[derive(Debug, Clone)]
struct Scope {
    start: usize,
    /// Log ranges already replayed by closed inner scopes, in order.
    consumed: Vec<Range<usize>>,
}

/// Scope arena for one call chain.
#[derive(Debug, Default)]
pub struct BalanceInterceptor {
    scopes: Vec<Scope>,
}

impl BalanceInterceptor {
    /// Creates an interceptor with no open scopes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Opens a scope anchored at `log_len`.
    pub fn begin_scope(&mut self, log_len: usize) -> ScopeHandle {
        let depth = self.scopes.len();
        self.scopes.push(Scope {
            start: log_len,
            consumed: Vec::new(),
        });
        trace!(depth, start = log_len, "Interception scope opened");
        ScopeHandle { depth }
    }

    /// Closes the innermost scope and replays its notifications.
    ///
    /// Deltas are applied under a ledger snapshot: on any failure the
    /// snapshot is reverted and no delta from this scope remains applied.
    /// The scope is popped whether or not replay succeeds.
    pub fn end_scope<L>(
        &mut self,
        handle: ScopeHandle,
        log: &L,
        ledger: &mut dyn EvmLedger,
        config: &BridgeConfig,
    ) -> Result<Vec<LedgerDelta>, InterceptError>
    where
        L: NotificationLog + ?Sized,
    {
        let scope = self.pop(handle)?;
        let end = log.len();

        let deltas = collect_deltas(&scope, log, config)?;
        apply_deltas(&deltas, ledger)?;

        if let Some(parent) = self.scopes.last_mut() {
            if scope.start < end {
                parent.consumed.push(scope.start..end);
            }
        }

        debug!(
            depth = self.scopes.len(),
            deltas = deltas.len(),
            "Interception scope reconciled"
        );
        Ok(deltas)
    }

    /// Closes the innermost scope without replaying it.
    pub fn discard_scope(&mut self, handle: ScopeHandle) -> Result<(), InterceptError> {
        self.pop(handle).map(|_| ())
    }

    /// Drops every scope at or above `depth`.
    pub fn unwind_to(&mut self, depth: usize) {
        if self.scopes.len() > depth {
            debug!(from = self.scopes.len(), to = depth, "Unwinding interception scopes");
            self.scopes.truncate(depth);
        }
    }

    /// Forgets consumed ranges past `log_len` after the log was rolled back.
    pub fn truncate_log(&mut self, log_len: usize) {
        for scope in &mut self.scopes {
            scope.consumed.retain_mut(|range| {
                range.end = range.end.min(log_len);
                range.start < range.end
            });
        }
    }

    fn pop(&mut self, handle: ScopeHandle) -> Result<Scope, InterceptError> {
        let open = self.scopes.len();
        if handle.depth + 1 != open {
            return Err(InterceptError::ScopeOrderViolation {
                closing: handle.depth,
                open,
            });
        }
        self.scopes
            .pop()
            .ok_or(InterceptError::ScopeOrderViolation {
                closing: handle.depth,
                open,
            })
    }
}

// =============================================================================
// REPLAY
// =============================================================================

fn collect_deltas<L>(
    scope: &Scope,
    log: &L,
    config: &BridgeConfig,
) -> Result<Vec<LedgerDelta>, InterceptError>
where
    L: NotificationLog + ?Sized,
{
    let mut deltas = Vec::new();
    for (i, notification) in log.records_since(scope.start).iter().enumerate() {
        let position = scope.start + i;
        if scope.consumed.iter().any(|range| range.contains(&position)) {
            continue;
        }
        if let Some(delta) = parse_notification(notification, config)? {
            deltas.push(delta);
        }
    }
    Ok(deltas)
}

/// Interprets one notification as a ledger delta.
///
/// Returns `None` for unrecognised kinds and for zero amounts of the
/// designated denomination.
pub fn parse_notification(
    notification: &Notification,
    config: &BridgeConfig,
) -> Result<Option<LedgerDelta>, InterceptError> {
    let (direction, address_attr, kind) = match notification.kind.as_str() {
        notification_kinds::COIN_SPENT => (
            DeltaDirection::Debit,
            notification_attrs::SPENDER,
            notification_kinds::COIN_SPENT,
        ),
        notification_kinds::COIN_RECEIVED => (
            DeltaDirection::Credit,
            notification_attrs::RECEIVER,
            notification_kinds::COIN_RECEIVED,
        ),
        _ => return Ok(None),
    };

    let raw_address =
        notification
            .attribute(address_attr)
            .ok_or(InterceptError::MissingAttribute {
                kind,
                attribute: address_attr,
            })?;
    let raw_amount = notification
        .attribute(notification_attrs::AMOUNT)
        .ok_or(InterceptError::MissingAttribute {
            kind,
            attribute: notification_attrs::AMOUNT,
        })?;

    let address = parse_address(raw_address, config)?;
    let coins = parse_coins(raw_amount)?;
    let amount = to_evm_amount(amount_of(&coins, &config.evm_denom)?, config)?;

    if amount.is_zero() {
        trace!(%address, kind, "Skipping zero-amount delta");
        return Ok(None);
    }

    Ok(Some(LedgerDelta {
        address,
        amount,
        direction,
        denom: config.evm_denom.clone(),
    }))
}

fn apply_deltas(deltas: &[LedgerDelta], ledger: &mut dyn EvmLedger) -> Result<(), InterceptError> {
    if deltas.is_empty() {
        return Ok(());
    }

    let snapshot = ledger.snapshot();
    for delta in deltas {
        trace!(address = %delta.address, amount = %delta.amount, direction = ?delta.direction, "Replaying delta");
        let applied = match delta.direction {
            DeltaDirection::Credit => {
                ledger.add_balance(delta.address, delta.amount, BalanceChangeReason::Precompile)
            }
            DeltaDirection::Debit => {
                ledger.sub_balance(delta.address, delta.amount, BalanceChangeReason::Precompile)
            }
        };
        if let Err(err) = applied {
            ledger.revert_to_snapshot(snapshot)?;
            return Err(err.into());
        }
    }
    ledger.discard_snapshot(snapshot)?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
