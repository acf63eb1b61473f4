/// Shown above an empty transcript.
pub const GREETING: &str = "Hi there! How are you feeling today?";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:54321/functions/v1/empathy-chat";

pub const DEFAULT_IDLE_TIMEOUT_SECS: u16 = 60;

pub const QUIT_COMMAND: &str = "/quit";

pub const CLEAR_COMMAND: &str = "/clear";
