use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    // 한 번의 전파에서 허용하는 최대 tick, 넘으면 발진하는 회로로 본다
    pub max_ticks: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self { max_ticks: 1024 }
    }
}

impl CircuitConfig {
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
