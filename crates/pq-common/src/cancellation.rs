use crate::error::CommonError;

/// The cancellation-token collaborator (§6 "Consumed").
///
/// Out of scope per spec.md §1 ("Cancellation token source"); only the
/// `check()` operation is consumed by the parser and by the recursive
/// type-inference walk.
pub trait CancellationToken {
    /// Returns `Ok(())` if parsing/inspection may continue, or
    /// `Err(CommonError::Cancellation)` if the caller asked to stop.
    fn check(&self) -> Result<(), CommonError>;
}

/// A token that never cancels. The default when `Settings` carries none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn check(&self) -> Result<(), CommonError> {
        Ok(())
    }
}

/// A token backed by a plain flag, useful for tests and simple embedders
/// that poll from another thread.
#[derive(Debug, Default, Clone)]
pub struct FlagCancellationToken {
    cancelled: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl FlagCancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl CancellationToken for FlagCancellationToken {
    fn check(&self) -> Result<(), CommonError> {
        if self.cancelled.load(std::sync::atomic::Ordering::SeqCst) {
            Err(CommonError::Cancellation)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_cancelled_always_ok() {
        assert!(NeverCancelled.check().is_ok());
    }

    #[test]
    fn flag_token_cancels_after_flip() {
        let token = FlagCancellationToken::new();
        assert!(token.check().is_ok());
        token.cancel();
        assert_eq!(token.check(), Err(CommonError::Cancellation));
    }
}
