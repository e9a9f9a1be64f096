use serde::{Deserialize, Serialize};

/// A browser identity: display name, JA3 fingerprint, and the User-Agent
/// header the client facade applies when the caller supplied none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Browser {
    pub name: String,
    pub ja3: String,
    pub user_agent: String,
}

impl Browser {
    pub fn new(name: &str, ja3: &str, user_agent: &str) -> Self {
        Self {
            name: name.to_string(),
            ja3: ja3.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn chrome() -> Self {
        Self::new(
            "Chrome",
            "771,4865-4866-4867-49196-49195-49188-49187-49162-49161-52393-49200-49199-49192-49191-49172-49171-52392-157-156-61-60-53-47-49160-49170-10,65281-0-23-13-5-18-16-11-51-45-43-10-21,29-23-24-25,0",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )
    }

    pub fn firefox() -> Self {
        Self::new(
            "Firefox",
            "771,4865-4867-4866-49195-49199-52393-52392-49196-49200-49162-49161-49171-49172-51-57-47-53-10,0-23-65281-10-11-35-16-5-51-43-13-45-28-21,29-23-24-25-256-257,0",
            "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0",
        )
    }

    pub fn safari() -> Self {
        Self::new(
            "Safari",
            "771,4865-4866-4867-49196-49195-52393-49200-49199-52392-49162-49161-49172-49171-157-156-53-47-49160-49170-10,65281-0-23-13-5-18-16-11-51-45-43-10-21,29-23-24-25,0",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Safari/605.1.15",
        )
    }
}
