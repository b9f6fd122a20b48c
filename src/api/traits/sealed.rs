// ABOUTME: Sealed trait pattern for control-plane capability traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Sealed trait to prevent external implementations.
///
/// Only types that implement Sealed (our API clients) can implement the
/// capability traits. Tests substitute the transport underneath instead.
pub trait Sealed {}
