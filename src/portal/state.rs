use crate::error::SessionError;

/// 门户会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    AwaitingCaptcha,
    Submitted,
    Authenticated,
    CaptchaRejected,
    CredentialsRejected,
    Unknown,
    RetriesExhausted,
    Closed,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "Unauthenticated",
            SessionState::AwaitingCaptcha => "AwaitingCaptcha",
            SessionState::Submitted => "Submitted",
            SessionState::Authenticated => "Authenticated",
            SessionState::CaptchaRejected => "CaptchaRejected",
            SessionState::CredentialsRejected => "CredentialsRejected",
            SessionState::Unknown => "Unknown",
            SessionState::RetriesExhausted => "RetriesExhausted",
            SessionState::Closed => "Closed",
        }
    }

    /// 登录流程不会再离开的状态（除了关闭）
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Authenticated
                | SessionState::CredentialsRejected
                | SessionState::Unknown
                | SessionState::RetriesExhausted
                | SessionState::Closed
        )
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;

        if next == Closed {
            return self != Closed;
        }
        matches!(
            (self, next),
            (Unauthenticated, AwaitingCaptcha)
                | (AwaitingCaptcha, Submitted)
                // 验证码无法识别，本次尝试作废
                | (AwaitingCaptcha, CaptchaRejected)
                | (Submitted, Authenticated)
                | (Submitted, CaptchaRejected)
                | (Submitted, CredentialsRejected)
                | (Submitted, Unknown)
                | (CaptchaRejected, AwaitingCaptcha)
                | (CaptchaRejected, RetriesExhausted)
        )
    }

    /// 检查后返回新状态
    pub fn transition(self, next: SessionState) -> Result<SessionState, SessionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else if self == SessionState::Closed {
            Err(SessionError::Closed)
        } else {
            Err(SessionError::InvalidTransition {
                from: self.name(),
                to: next.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;

    #[test]
    fn happy_path_is_legal() {
        let mut state = Unauthenticated;
        for next in [AwaitingCaptcha, Submitted, Authenticated, Closed] {
            state = state.transition(next).unwrap();
        }
        assert_eq!(state, Closed);
    }

    #[test]
    fn captcha_retry_loops_back() {
        assert!(Submitted.can_transition_to(CaptchaRejected));
        assert!(CaptchaRejected.can_transition_to(AwaitingCaptcha));
        assert!(CaptchaRejected.can_transition_to(RetriesExhausted));
    }

    #[test]
    fn fatal_states_only_close() {
        for state in [CredentialsRejected, Unknown, RetriesExhausted, Authenticated] {
            assert!(state.is_terminal());
            assert!(!state.can_transition_to(AwaitingCaptcha));
            assert!(state.can_transition_to(Closed));
        }
    }

    #[test]
    fn closed_rejects_everything() {
        assert!(matches!(Closed.transition(Closed), Err(SessionError::Closed)));
        assert!(matches!(Closed.transition(AwaitingCaptcha), Err(SessionError::Closed)));
    }

    #[test]
    fn skipping_steps_is_rejected() {
        assert!(matches!(
            Unauthenticated.transition(Authenticated),
            Err(SessionError::InvalidTransition {
                from: "Unauthenticated",
                to: "Authenticated"
            })
        ));
    }
}
