//! Classification of git commit and push output.
//!
//! git reports conflicts only as human-readable text, so this is pattern
//! matching against known phrases (with output forced to the C locale by
//! [`ProcessRunner`](crate::ProcessRunner)). Anything unrecognised falls back
//! to the exit status, and a push is only `Accepted` when git itself exited
//! successfully and printed none of the rejection phrases.

use crate::runner::GitOutput;
use semslot_engine::{SlotError, WriteOutcome};

/// Printed by `git commit` when the index matches HEAD.
pub const NOTHING_TO_COMMIT: &str = "nothing to commit";

/// Push output meaning the remote branch moved since the last fetch, or that
/// nothing was published.
pub const PUSH_CONFLICT_MARKERS: &[&str] = &[
    "Everything up-to-date",
    "[rejected]",
    "[remote rejected]",
    "non-fast-forward",
    "fetch first",
    "cannot lock ref",
];

/// Push output meaning the remote refuses the update outright. Checked
/// before [`PUSH_CONFLICT_MARKERS`], since these also print `[remote rejected]`.
pub const PUSH_REFUSAL_MARKERS: &[&str] = &["hook declined", "protected branch"];

/// Result of `git commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitClass {
    /// A new commit was created.
    Committed,
    /// The file already held the value.
    NothingToCommit,
    /// The commit failed.
    Failed(String),
}

/// Classifies `git commit` output.
///
/// A successful exit is always `Committed`: the commit message is echoed
/// on success and may contain any text.
pub fn classify_commit(output: &GitOutput) -> CommitClass {
    if output.success {
        return CommitClass::Committed;
    }
    let text = output.combined();
    if text.contains(NOTHING_TO_COMMIT) {
        CommitClass::NothingToCommit
    } else {
        CommitClass::Failed(text.trim().to_string())
    }
}

/// Classifies `git push` output.
pub fn classify_push(output: &GitOutput) -> WriteOutcome {
    let text = output.combined();
    if PUSH_REFUSAL_MARKERS.iter().any(|marker| text.contains(marker)) {
        WriteOutcome::Failed(SlotError::transport(format!(
            "push refused: {}",
            text.trim()
        )))
    } else if PUSH_CONFLICT_MARKERS.iter().any(|marker| text.contains(marker)) {
        WriteOutcome::ConflictDetected
    } else if output.success {
        WriteOutcome::Accepted
    } else {
        WriteOutcome::Failed(SlotError::transport(format!(
            "push failed: {}",
            text.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_nothing_to_commit() {
        let output = GitOutput {
            success: false,
            code: Some(1),
            stdout: "On branch master\nnothing to commit, working tree clean\n".into(),
            stderr: String::new(),
        };
        assert_eq!(classify_commit(&output), CommitClass::NothingToCommit);
    }

    #[test]
    fn commit_success_and_failure() {
        assert_eq!(
            classify_commit(&GitOutput::ok("[master 1a2b3c4] bump to 1.0.1\n")),
            CommitClass::Committed
        );
        let failed = classify_commit(&GitOutput::failed(
            128,
            "Author identity unknown\n*** Please tell me who you are.",
        ));
        assert!(matches!(failed, CommitClass::Failed(ref msg) if msg.contains("Author identity")));
    }

    #[test]
    fn commit_message_mentioning_nothing_to_commit() {
        let output = GitOutput::ok("[master 1a2b3c4] nothing to commit? bump to 1.0.1\n");
        assert_eq!(classify_commit(&output), CommitClass::Committed);
    }

    #[test]
    fn push_rejections_are_conflicts() {
        let rejected = GitOutput::failed(
            1,
            "To github.com:org/repo.git\n ! [rejected]        HEAD -> master (fetch first)\n\
             error: failed to push some refs",
        );
        assert!(matches!(
            classify_push(&rejected),
            WriteOutcome::ConflictDetected
        ));

        let remote_rejected = GitOutput::failed(
            1,
            " ! [remote rejected] HEAD -> master (cannot lock ref 'refs/heads/master')",
        );
        assert!(matches!(
            classify_push(&remote_rejected),
            WriteOutcome::ConflictDetected
        ));
    }

    #[test]
    fn up_to_date_push_is_not_accepted() {
        // Exit status zero, but nothing was published.
        let output = GitOutput {
            success: true,
            code: Some(0),
            stdout: String::new(),
            stderr: "Everything up-to-date\n".into(),
        };
        assert!(matches!(
            classify_push(&output),
            WriteOutcome::ConflictDetected
        ));
    }

    #[test]
    fn refused_push_is_failed() {
        for stderr in [
            " ! [remote rejected] HEAD -> master (pre-receive hook declined)",
            " ! [remote rejected] HEAD -> master (protected branch hook declined)",
            "remote: GitLab: You are not allowed to push code to protected branches on this project.\n\
             ! [remote rejected] HEAD -> master (pre-receive hook declined)",
            " ! [remote rejected] HEAD -> main (protected branch update failed)",
        ] {
            match classify_push(&GitOutput::failed(1, stderr)) {
                WriteOutcome::Failed(err) => assert!(err.to_string().contains("push refused")),
                other => panic!("unexpected outcome {other:?} for {stderr}"),
            }
        }
    }

    #[test]
    fn push_success() {
        let output = GitOutput {
            success: true,
            code: Some(0),
            stdout: String::new(),
            stderr: "To /srv/repo.git\n   1a2b3c4..5d6e7f8  HEAD -> master\n".into(),
        };
        assert!(matches!(classify_push(&output), WriteOutcome::Accepted));
    }

    #[test]
    fn unknown_push_failure_is_failed() {
        let output = GitOutput::failed(128, "fatal: Could not read from remote repository.");
        match classify_push(&output) {
            WriteOutcome::Failed(err) => {
                assert!(err.is_transport());
                assert!(err.to_string().contains("Could not read"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
