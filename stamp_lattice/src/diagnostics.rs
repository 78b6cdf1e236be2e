//! Precision diagnostics for stamp computations.
//!
//! Transfer functions are allowed to give up and return the unrestricted
//! stamp. When they do, or when operands of different kinds are collapsed to
//! Illegal, a diagnostic records why. This makes it possible to see where
//! range and null-check elimination lose information.
//!
//! # Usage
//!
//! Diagnostics are disabled by default. Control them via:
//! - `DiagnosticsCollector::enable()` / `DiagnosticsCollector::disable()`
//! - `DiagnosticsCollector::take()` - retrieve and clear collected diagnostics
//!
//! In debug builds every emitted diagnostic is also written to stderr when
//! the `STAMP_LATTICE_DEBUG` environment variable is set.

use crate::kind::MachineKind;
use std::cell::RefCell;

/// Why a result lost precision or collapsed.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticReason {
    /// An integer operation overflowed and fell back to the full range.
    /// Contains the operation name.
    OverflowCollapse(String),

    /// A shift amount ranged over more values than the iteration limit.
    /// Contains the number of candidate amounts.
    ShiftRangeTooWide(u64),

    /// Operands of different kinds met or joined.
    KindMismatch(MachineKind, MachineKind),

    /// A join produced the empty set.
    /// Contains the stamp family involved.
    Contradiction(String),

    /// No transfer function is registered for the operation.
    UnknownOperation(String),

    /// Wrong number of operands for an operation.
    /// Contains (operation, expected, actual).
    ArityMismatch(String, usize, usize),

    /// Generic fallback.
    Other(String),
}

impl std::fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticReason::OverflowCollapse(op) => {
                write!(f, "'{}' may overflow", op)
            }
            DiagnosticReason::ShiftRangeTooWide(n) => {
                write!(f, "shift amount ranges over {} values", n)
            }
            DiagnosticReason::KindMismatch(left, right) => {
                write!(f, "kind mismatch {} vs {}", left, right)
            }
            DiagnosticReason::Contradiction(family) => {
                write!(f, "contradictory {} stamps", family)
            }
            DiagnosticReason::UnknownOperation(name) => {
                write!(f, "unknown operation '{}'", name)
            }
            DiagnosticReason::ArityMismatch(op, expected, actual) => {
                write!(
                    f,
                    "'{}' expects {} operands, got {}",
                    op, expected, actual
                )
            }
            DiagnosticReason::Other(desc) => write!(f, "{}", desc),
        }
    }
}

/// A single diagnostic.
#[derive(Clone, Debug)]
pub struct LatticeDiagnostic {
    pub reason: DiagnosticReason,
    /// Optional description of the operands involved.
    pub context: Option<String>,
    /// The stamp the result was widened or collapsed to.
    pub widened_to: String,
}

impl LatticeDiagnostic {
    pub fn new(reason: DiagnosticReason) -> Self {
        Self {
            reason,
            context: None,
            widened_to: "unrestricted".to_string(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_widened_to(mut self, stamp: impl Into<String>) -> Self {
        self.widened_to = stamp.into();
        self
    }
}

impl std::fmt::Display for LatticeDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stamp precision: {}", self.reason)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        write!(f, " -> {}", self.widened_to)
    }
}

thread_local! {
    static DIAGNOSTICS_ENABLED: RefCell<bool> = const { RefCell::new(false) };
    static DIAGNOSTICS: RefCell<Vec<LatticeDiagnostic>> = const { RefCell::new(Vec::new()) };
}

/// Thread-local collector for lattice diagnostics.
///
/// Each compiler thread sees only its own diagnostics.
#[derive(Debug)]
pub struct DiagnosticsCollector;

impl DiagnosticsCollector {
    pub fn enable() {
        DIAGNOSTICS_ENABLED.with(|enabled| {
            *enabled.borrow_mut() = true;
        });
    }

    pub fn disable() {
        DIAGNOSTICS_ENABLED.with(|enabled| {
            *enabled.borrow_mut() = false;
        });
    }

    pub fn is_enabled() -> bool {
        DIAGNOSTICS_ENABLED.with(|enabled| *enabled.borrow())
    }

    /// Records a diagnostic if collection is enabled.
    pub fn emit(diagnostic: LatticeDiagnostic) {
        #[cfg(debug_assertions)]
        if lattice_debug_enabled() {
            lattice_debug_log(format_args!("[STAMP] {}", diagnostic));
        }
        if Self::is_enabled() {
            DIAGNOSTICS.with(|diags| {
                diags.borrow_mut().push(diagnostic);
            });
        }
    }

    /// Takes all collected diagnostics, clearing the collection.
    pub fn take() -> Vec<LatticeDiagnostic> {
        DIAGNOSTICS.with(|diags| std::mem::take(&mut *diags.borrow_mut()))
    }

    pub fn clear() {
        DIAGNOSTICS.with(|diags| {
            diags.borrow_mut().clear();
        });
    }

    pub fn count() -> usize {
        DIAGNOSTICS.with(|diags| diags.borrow().len())
    }
}

/// Check if lattice debug logging is enabled via `STAMP_LATTICE_DEBUG`.
#[cfg(debug_assertions)]
pub(crate) fn lattice_debug_enabled() -> bool {
    use std::sync::OnceLock;
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("STAMP_LATTICE_DEBUG").is_ok())
}

/// Write a debug line without relying on `eprintln!`.
#[cfg(debug_assertions)]
pub(crate) fn lattice_debug_log(args: std::fmt::Arguments<'_>) {
    use std::io::Write;
    let _ = writeln!(std::io::stderr(), "{args}");
}

/// Whether an emitted diagnostic would be recorded or logged.
fn is_observed() -> bool {
    #[cfg(debug_assertions)]
    if lattice_debug_enabled() {
        return true;
    }
    DiagnosticsCollector::is_enabled()
}

/// `context` runs only when the diagnostic is observed.
pub fn emit_overflow_collapse(op: &str, context: impl FnOnce() -> String) {
    if !is_observed() {
        return;
    }
    DiagnosticsCollector::emit(
        LatticeDiagnostic::new(DiagnosticReason::OverflowCollapse(op.to_string()))
            .with_context(context()),
    );
}

pub fn emit_shift_range_too_wide(amounts: u64) {
    DiagnosticsCollector::emit(LatticeDiagnostic::new(
        DiagnosticReason::ShiftRangeTooWide(amounts),
    ));
}

pub fn emit_kind_mismatch(left: MachineKind, right: MachineKind) {
    DiagnosticsCollector::emit(
        LatticeDiagnostic::new(DiagnosticReason::KindMismatch(left, right))
            .with_widened_to("illegal"),
    );
}

pub fn emit_contradiction(family: &str, context: impl FnOnce() -> String) {
    if !is_observed() {
        return;
    }
    DiagnosticsCollector::emit(
        LatticeDiagnostic::new(DiagnosticReason::Contradiction(family.to_string()))
            .with_context(context())
            .with_widened_to("illegal"),
    );
}

pub fn emit_unknown_operation(name: &str) {
    DiagnosticsCollector::emit(LatticeDiagnostic::new(DiagnosticReason::UnknownOperation(
        name.to_string(),
    )));
}

pub fn emit_arity_mismatch(op: &str, expected: usize, actual: usize) {
    DiagnosticsCollector::emit(LatticeDiagnostic::new(DiagnosticReason::ArityMismatch(
        op.to_string(),
        expected,
        actual,
    )));
}
