use super::constants::*;

pub(crate) fn greeting() -> Option<String> {
    Some(GREETING.to_string())
}

pub(crate) fn log_level() -> Option<String> {
    Some("warn".to_string())
}

pub(crate) fn endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

pub(crate) fn idle_timeout_secs() -> Option<u16> {
    Some(DEFAULT_IDLE_TIMEOUT_SECS)
}
