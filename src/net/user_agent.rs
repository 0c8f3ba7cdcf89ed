//! User-Agent catalogue and selection modes

use std::fmt;

use clap::ValueEnum;

/// Googlebot (2), Bingbot, Chrome, Firefox
pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
    "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; Googlebot/2.1; +http://www.google.com/bot.html) Chrome/131.0.6778.135 Safari/537.36",
    "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:134.0) Gecko/20100101 Firefox/134.0",
];

/// How a target's User-Agent is picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UserAgentMode {
    /// Alternate the two Googlebot strings
    #[default]
    Googlebot,
    Bingbot,
    Chrome,
    Firefox,
    /// Cycle through every string
    Rotate,
}

impl UserAgentMode {
    /// User-Agent for the target at `index` in dispatch order
    pub fn select(self, index: usize) -> &'static str {
        match self {
            UserAgentMode::Googlebot => USER_AGENTS[index % 2],
            UserAgentMode::Bingbot => USER_AGENTS[2],
            UserAgentMode::Chrome => USER_AGENTS[3],
            UserAgentMode::Firefox => USER_AGENTS[4],
            UserAgentMode::Rotate => USER_AGENTS[index % USER_AGENTS.len()],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserAgentMode::Googlebot => "googlebot",
            UserAgentMode::Bingbot => "bingbot",
            UserAgentMode::Chrome => "chrome",
            UserAgentMode::Firefox => "firefox",
            UserAgentMode::Rotate => "rotate",
        }
    }
}

impl fmt::Display for UserAgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
