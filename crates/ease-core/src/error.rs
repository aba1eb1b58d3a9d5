use std::fmt;

/// Machine-readable error codes surfaced by the CLI and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    WorryNotFound,
    ChallengeNotFound,
    InvalidInput,
    InvalidEnumValue,
    WizardMissingContext,
    WizardStepBlocked,
    NoActiveChallenge,
    ChallengeAlreadyCompleted,
    CorruptStore,
    StoreWriteFailed,
    LockContention,
    RemoteNotConfigured,
    RemoteUnauthorized,
    RemoteRejected,
    RemoteUnreachable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::WorryNotFound => "E2001",
            Self::ChallengeNotFound => "E2002",
            Self::InvalidInput => "E2003",
            Self::InvalidEnumValue => "E2004",
            Self::WizardMissingContext => "E2101",
            Self::WizardStepBlocked => "E2102",
            Self::NoActiveChallenge => "E2103",
            Self::ChallengeAlreadyCompleted => "E2104",
            Self::CorruptStore => "E3001",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::RemoteNotConfigured => "E6001",
            Self::RemoteUnauthorized => "E6002",
            Self::RemoteRejected => "E6003",
            Self::RemoteUnreachable => "E6004",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Journal not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::WorryNotFound => "Worry not found",
            Self::ChallengeNotFound => "Challenge not found",
            Self::InvalidInput => "Invalid input",
            Self::InvalidEnumValue => "Invalid category/distortion/status value",
            Self::WizardMissingContext => "Missing worry information",
            Self::WizardStepBlocked => "Challenge step cannot proceed",
            Self::NoActiveChallenge => "No challenge in progress",
            Self::ChallengeAlreadyCompleted => "Challenge already completed",
            Self::CorruptStore => "Corrupt local store",
            Self::StoreWriteFailed => "Local store write failed",
            Self::LockContention => "Lock contention",
            Self::RemoteNotConfigured => "Remote sync not configured",
            Self::RemoteUnauthorized => "Remote session rejected",
            Self::RemoteRejected => "Remote request rejected",
            Self::RemoteUnreachable => "Remote service unreachable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `ease init` to create a journal in this directory."),
            Self::ConfigParseError => Some("Fix syntax in .ease/config.toml and retry."),
            Self::WorryNotFound => Some("Run `ease worry list --all` to see worry IDs."),
            Self::ChallengeNotFound => Some("Run `ease challenge list` to see challenge IDs."),
            Self::InvalidInput | Self::WizardStepBlocked => None,
            Self::InvalidEnumValue => Some("Run `ease distortions` for the accepted tags."),
            Self::WizardMissingContext => {
                Some("Return to your worries (`ease worry list`) and start again.")
            }
            Self::NoActiveChallenge => Some("Start one with `ease challenge start <worry-id>`."),
            Self::ChallengeAlreadyCompleted => {
                Some("Completed challenges are final; start a new challenge instead.")
            }
            Self::CorruptStore => Some("Restore .ease/ease.db from a backup or re-run `ease init --force`."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `ease` process releases its lock."),
            Self::RemoteNotConfigured => Some("Set [remote].base_url in .ease/config.toml."),
            Self::RemoteUnauthorized => Some("Sign in again and update EASE_SESSION or session_token."),
            Self::RemoteRejected => None,
            Self::RemoteUnreachable => Some("Your changes are saved locally; repeat the action later."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 18] = [
        ErrorCode::NotInitialized,
        ErrorCode::ConfigParseError,
        ErrorCode::WorryNotFound,
        ErrorCode::ChallengeNotFound,
        ErrorCode::InvalidInput,
        ErrorCode::InvalidEnumValue,
        ErrorCode::WizardMissingContext,
        ErrorCode::WizardStepBlocked,
        ErrorCode::NoActiveChallenge,
        ErrorCode::ChallengeAlreadyCompleted,
        ErrorCode::CorruptStore,
        ErrorCode::StoreWriteFailed,
        ErrorCode::LockContention,
        ErrorCode::RemoteNotConfigured,
        ErrorCode::RemoteUnauthorized,
        ErrorCode::RemoteRejected,
        ErrorCode::RemoteUnreachable,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::WorryNotFound.to_string(), "E2001");
    }
}
