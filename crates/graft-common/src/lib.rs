//! Common types and utilities for the graft transformation engine.
//!
//! This crate provides foundational types used across all graft crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`) and stable codes

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

/// Stable diagnostic codes for the transformation engine. Hosts key
/// suppression and test assertions off these, so they never get reused.
pub mod diagnostic_codes {
    /// Annotation argument could not be constant-folded.
    pub const VALUE_DECODE: u32 = 9001;
    /// Marker placed on an AST location where it is not legal.
    pub const ILLEGAL_SITE: u32 = 9002;
    /// Conflicting or malformed marker options.
    pub const BAD_OPTIONS: u32 = 9003;
    /// A handler failed unexpectedly; the rest of the unit was processed.
    pub const HANDLER_FAULT: u32 = 9004;
    /// A generated member collides with a user-written one.
    pub const MEMBER_EXISTS: u32 = 9005;
    /// Internal engine inconsistency (wrapper/native shape mismatch).
    pub const ENGINE_BUG: u32 = 9006;
    /// Tree dump requested by the diagnostic marker.
    pub const TREE_DUMP: u32 = 9007;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            file: file.into(),
            start: span.start,
            length: span.len(),
            message_text: message.into(),
        }
    }

    pub fn warning(
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            code,
            file: file.into(),
            start: span.start,
            length: span.len(),
            message_text: message.into(),
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.start + self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_round_trips_span() {
        let d = Diagnostic::error("a.java", Span::new(10, 14), "bad", 9001);
        assert_eq!(d.span(), Span::new(10, 14));
        assert_eq!(d.length, 4);
    }

    #[test]
    fn diagnostic_serializes_for_tool_consumers() {
        let d = Diagnostic::warning("a.java", Span::new(0, 3), "careful", 9003);
        let json = serde_json::to_string(&d).expect("serialize");
        assert!(json.contains("\"category\":\"Warning\""));
        assert!(json.contains("\"code\":9003"));
        let back: Diagnostic = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, d);
    }
}
