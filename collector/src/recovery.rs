use subweave_core::{CoreError, RedditApiError};

/// How much of the run a contained failure throws away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainmentScope {
    Post,
    Community,
}

/// What the run loop does with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    Skip(ContainmentScope),
    Abort,
}

/// Maps a collection failure to the action the run loop takes.
///
/// Credential and output failures abort the run. Everything else costs
/// only the current post or community.
pub fn containment_action(error: &CoreError, scope: ContainmentScope) -> RunAction {
    match error {
        CoreError::Config(_) | CoreError::Io(_) | CoreError::Dataset(_) => RunAction::Abort,
        CoreError::RedditApi(
            RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken,
        ) => RunAction::Abort,
        _ => RunAction::Skip(scope),
    }
}
