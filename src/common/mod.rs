use std::ops::Not;

pub mod error;

pub use error::PortError;

// 포트 인덱스, 입력과 출력은 서로 다른 공간을 가진다
pub type Port = usize;

// 게이트 식별자, 회로 안에서 유일하며 재사용되지 않는다
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
)]
pub struct GateId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum PortSide {
    #[strum(serialize = "input")]
    Input,
    #[strum(serialize = "output")]
    Output,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum State {
    #[default]
    Low,
    High,
}

pub const INITIAL_STATE: State = State::Low;

impl State {
    pub fn is_high(&self) -> bool {
        matches!(self, State::High)
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        if value {
            State::High
        } else {
            State::Low
        }
    }
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        value.is_high()
    }
}

impl Not for State {
    type Output = State;

    fn not(self) -> Self::Output {
        match self {
            State::Low => State::High,
            State::High => State::Low,
        }
    }
}

// 다른 게이트의 특정 포트를 가리키는 연결
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub id: GateId,
    pub port: Port,
}

impl Connection {
    pub fn new(id: GateId, port: Port) -> Self {
        Self { id, port }
    }
}

#[cfg(test)]
mod tests {
    use super::{Connection, GateId, State, INITIAL_STATE};

    #[test]
    fn unittest_state_conversions() {
        assert_eq!(State::from(true), State::High);
        assert_eq!(State::from(false), State::Low);
        assert!(bool::from(State::High));
        assert_eq!(!State::Low, State::High);
        assert_eq!(State::default(), INITIAL_STATE);
    }

    #[test]
    fn unittest_connection_structural_eq() {
        assert_eq!(Connection::new(GateId(3), 1), Connection::new(GateId::from(3usize), 1));
        assert_ne!(Connection::new(GateId(3), 1), Connection::new(GateId(3), 0));
        assert_ne!(Connection::new(GateId(2), 1), Connection::new(GateId(3), 1));
    }
}
